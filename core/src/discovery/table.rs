//! Discovery Table Builder (spec §4.B).
//!
//! Idempotent, single-shot population of the N-gamepad device tree. `DiscoveryTable`
//! itself is an immutable snapshot (spec §9 "Global mutable state... Represent them as
//! immutable snapshots published once at initialization"); [`table`] publishes exactly
//! one behind a `OnceLock`, satisfying spec §5's "guaranteed to happen at most once and
//! to happen-before any query call that observes it" under arbitrary host threading.

use std::sync::OnceLock;

use super::node::{DeviceNode, NodeVariant};
use crate::config::{event_devnode, event_socket_path, js_devnode, js_socket_path};
use crate::identity;

/// Real xpad-family `capabilities/abs` bitmap: ABS_X, ABS_Y, ABS_Z, ABS_RX, ABS_RY,
/// ABS_RZ, ABS_HAT0X, ABS_HAT0Y (bits 0-5, 16-17).
const CAP_ABS: &str = "3003f";
/// `capabilities/ev`: EV_SYN | EV_KEY | EV_ABS (per spec §4.B).
const CAP_EV: &str = "1b";
/// Gamepad `capabilities/key` bitmap (BTN_GAMEPAD range) as reported by real xpad
/// hardware: three 64-bit hex words, kernel sysfs order (highest word first).
const CAP_KEY: &str = "10000 7cdb000000000000 0";

/// One fully populated device tree: `slot_count * 4` nodes (JS, EVENT, INPUT_PARENT,
/// USB_PARENT per slot), in slot order.
#[derive(Debug)]
pub struct DiscoveryTable {
    pub nodes: Vec<DeviceNode>,
    pub slot_count: usize,
}

impl DiscoveryTable {
    pub fn find_by_syspath(&self, syspath: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.syspath == syspath)
    }

    pub fn find_by_subsystem_sysname(&self, subsystem: &str, sysname: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.subsystem == subsystem && n.sysname == sysname)
    }
}

/// Builds the complete table for `slot_count` slots (spec §4.B derived values, §6
/// paths). Node order per slot: JS, EVENT, INPUT_PARENT, USB_PARENT; the USB_PARENT's
/// `parent` field is always `None`.
fn build(slot_count: usize) -> DiscoveryTable {
    let mut nodes = Vec::with_capacity(slot_count * 4);

    for i in 0..slot_count {
        let input_sysname = format!("selkies_pad{i}");
        let input_syspath = format!("/sys/devices/virtual/{input_sysname}/input/input{}", 10 + i);
        let usb_sysname = format!("selkies_usb_ctrl{i}_dev");
        let usb_syspath = format!("/sys/devices/virtual/usb/{usb_sysname}");

        let phys = format!("selkies/virtpad{i}/input0");
        let uniq = format!("SGVP{i:04}");
        let serial = format!("SELKIESUSB{i:04}");

        let usb_parent_idx = nodes.len() + 3;
        let input_parent_idx = nodes.len() + 2;

        let devpath = input_syspath.strip_prefix("/sys").unwrap_or(&input_syspath).to_string();

        // JS node
        let js_devnode_path = js_devnode(i);
        nodes.push(DeviceNode {
            variant_slot: Some((NodeVariant::Js, i)),
            syspath: format!("{input_syspath}/js{i}"),
            sysname: format!("js{i}"),
            subsystem: "input".to_string(),
            devnode: Some(js_devnode_path.clone()),
            devtype: None,
            sysattrs: Vec::new(),
            properties: vec![
                ("DEVNAME".to_string(), js_devnode_path.clone()),
                ("ID_INPUT_JOYSTICK".to_string(), "1".to_string()),
                ("ID_INPUT".to_string(), "1".to_string()),
            ],
            devlinks: vec![js_devnode_path],
            parent: Some(input_parent_idx),
        });

        // EVENT node
        let event_num = 1000 + i;
        let event_devnode_path = event_devnode(i);
        nodes.push(DeviceNode {
            variant_slot: Some((NodeVariant::Event, i)),
            syspath: format!("{input_syspath}/event{event_num}"),
            sysname: format!("event{event_num}"),
            subsystem: "input".to_string(),
            devnode: Some(event_devnode_path.clone()),
            devtype: None,
            sysattrs: Vec::new(),
            properties: vec![
                ("DEVNAME".to_string(), event_devnode_path.clone()),
                ("ID_INPUT_EVENT_JOYSTICK".to_string(), "1".to_string()),
                ("ID_INPUT_JOYSTICK".to_string(), "1".to_string()),
                ("ID_INPUT_GAMEPAD".to_string(), "1".to_string()),
                ("ID_INPUT".to_string(), "1".to_string()),
            ],
            devlinks: vec![event_devnode_path],
            parent: Some(input_parent_idx),
        });

        // INPUT_PARENT
        nodes.push(DeviceNode {
            variant_slot: Some((NodeVariant::InputParent, i)),
            syspath: input_syspath.clone(),
            sysname: input_sysname,
            subsystem: "input".to_string(),
            devnode: None,
            devtype: None,
            sysattrs: vec![
                ("id/vendor".to_string(), format!("0x{:04x}", identity::VENDOR_ID)),
                ("id/product".to_string(), format!("0x{:04x}", identity::PRODUCT_ID)),
                ("id/version".to_string(), format!("0x{:04x}", identity::VERSION)),
                ("id/bustype".to_string(), format!("0x{:04x}", identity::BUS_USB)),
                ("name".to_string(), identity::DEVICE_NAME.to_string()),
                ("phys".to_string(), phys),
                ("uniq".to_string(), uniq),
                ("capabilities/ev".to_string(), CAP_EV.to_string()),
                ("capabilities/key".to_string(), CAP_KEY.to_string()),
                ("capabilities/abs".to_string(), CAP_ABS.to_string()),
            ],
            properties: vec![
                ("ID_INPUT".to_string(), "1".to_string()),
                ("ID_INPUT_JOYSTICK".to_string(), "1".to_string()),
                ("DEVPATH".to_string(), devpath),
            ],
            devlinks: Vec::new(),
            parent: Some(usb_parent_idx),
        });

        // USB_PARENT
        nodes.push(DeviceNode {
            variant_slot: Some((NodeVariant::UsbParent, i)),
            syspath: usb_syspath,
            sysname: usb_sysname,
            subsystem: "usb".to_string(),
            devnode: None,
            devtype: Some("usb_device".to_string()),
            sysattrs: vec![
                ("idVendor".to_string(), format!("0x{:04x}", identity::VENDOR_ID)),
                ("idProduct".to_string(), format!("0x{:04x}", identity::PRODUCT_ID)),
                ("manufacturer".to_string(), "Microsoft".to_string()),
                ("product".to_string(), identity::DEVICE_NAME.to_string()),
                ("bcdDevice".to_string(), format!("{:04x}", identity::VERSION)),
                ("serial".to_string(), serial),
            ],
            properties: Vec::new(),
            devlinks: Vec::new(),
            parent: None,
        });
    }

    DiscoveryTable {
        nodes,
        slot_count,
    }
}

static TABLE: OnceLock<DiscoveryTable> = OnceLock::new();

/// Returns the process-global discovery table, building it on first call.
pub fn table() -> &'static DiscoveryTable {
    TABLE.get_or_init(|| build(crate::config::DEFAULT_SLOT_COUNT))
}

#[cfg(test)]
pub(crate) fn build_for_test(slot_count: usize) -> DiscoveryTable {
    build(slot_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_four_nodes_per_slot() {
        let t = build_for_test(4);
        assert_eq!(t.nodes.len(), 16);
    }

    #[test]
    fn slot0_syspaths_match_spec() {
        let t = build_for_test(4);
        let js = &t.nodes[0];
        assert_eq!(js.syspath, "/sys/devices/virtual/selkies_pad0/input/input10/js0");
        let event = &t.nodes[1];
        assert_eq!(
            event.syspath,
            "/sys/devices/virtual/selkies_pad0/input/input10/event1000"
        );
        let input_parent = &t.nodes[2];
        assert_eq!(
            input_parent.syspath,
            "/sys/devices/virtual/selkies_pad0/input/input10"
        );
        let usb_parent = &t.nodes[3];
        assert_eq!(
            usb_parent.syspath,
            "/sys/devices/virtual/usb/selkies_usb_ctrl0_dev"
        );
    }

    #[test]
    fn parent_chain_is_js_to_input_to_usb() {
        let t = build_for_test(4);
        let js = &t.nodes[0];
        let input_parent_idx = js.parent.unwrap();
        assert_eq!(t.nodes[input_parent_idx].variant(), Some(NodeVariant::InputParent));
        let usb_parent_idx = t.nodes[input_parent_idx].parent.unwrap();
        assert_eq!(t.nodes[usb_parent_idx].variant(), Some(NodeVariant::UsbParent));
        assert!(t.nodes[usb_parent_idx].parent.is_none());
    }

    #[test]
    fn usb_parent_identity_sysattrs() {
        let t = build_for_test(4);
        let usb_parent = &t.nodes[3];
        assert_eq!(usb_parent.sysattr("idVendor"), Some("0x045e"));
        assert_eq!(usb_parent.sysattr("serial"), Some("SELKIESUSB0000"));
    }

    #[test]
    fn input_parent_identity_sysattrs() {
        let t = build_for_test(4);
        let input_parent = &t.nodes[2];
        assert_eq!(input_parent.sysattr("name"), Some(identity::DEVICE_NAME));
        assert_eq!(input_parent.sysattr("phys"), Some("selkies/virtpad0/input0"));
    }

    #[test]
    fn find_by_syspath_round_trips_for_every_node() {
        let t = build_for_test(4);
        for (idx, node) in t.nodes.iter().enumerate() {
            assert_eq!(t.find_by_syspath(&node.syspath), Some(idx));
            assert_eq!(
                t.find_by_subsystem_sysname(&node.subsystem, &node.sysname),
                Some(idx)
            );
        }
    }
}
