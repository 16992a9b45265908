//! The four discovery device-node variants (spec §3 "Device node").
//!
//! Modeled as a tagged sum per spec §9 ("Polymorphism over device variants... Do not
//! use inheritance; the fixed variant set is exhaustive"), following the same flat,
//! no-inheritance style the teacher uses for its `UdevDevice` struct
//! (`udev/device.rs`): one struct, fields populated differently per origin, accessors
//! that return an empty/null sentinel when the field doesn't apply to this variant.

/// Which of the four fixed device-tree shapes a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVariant {
    Js,
    Event,
    InputParent,
    UsbParent,
}

/// One node in the static discovery tree. Every field that doesn't apply to a given
/// [`NodeVariant`] is left at its default (empty string / `None` / empty vec); the
/// [`crate::discovery::query`] accessors turn those into the "missing" sentinels spec
/// §4.C describes.
#[derive(Debug, Clone, Default)]
pub struct DeviceNode {
    pub variant_slot: Option<(NodeVariant, usize)>,
    pub syspath: String,
    pub sysname: String,
    pub subsystem: String,
    pub devnode: Option<String>,
    pub devtype: Option<String>,
    /// `(sysattr, value)` pairs; only `InputParent` and `UsbParent` carry any.
    pub sysattrs: Vec<(String, String)>,
    /// `(property, value)` pairs in table order.
    pub properties: Vec<(String, String)>,
    /// `devlinks` entries (spec §4.C "devlinks list entry"): one devnode for JS/EVENT.
    pub devlinks: Vec<String>,
    /// Index of the parent node within the owning [`crate::discovery::table::DiscoveryTable`].
    pub parent: Option<usize>,
}

impl DeviceNode {
    pub fn variant(&self) -> Option<NodeVariant> {
        self.variant_slot.map(|(v, _)| v)
    }

    pub fn slot(&self) -> Option<usize> {
        self.variant_slot.map(|(_, s)| s)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn sysattr(&self, key: &str) -> Option<&str> {
        self.sysattrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Property-filter match per spec §4.C: every `(name, v?)` filter must have a
    /// corresponding entry in this node's property table, where `v? == None` matches
    /// any value. A node with no properties at all (the parents have some, but an
    /// empty filter list always matches vacuously) fails whenever filters is non-empty
    /// and it has no matching entries.
    pub fn matches_property_filters(&self, filters: &[(String, Option<String>)]) -> bool {
        filters.iter().all(|(name, want)| {
            self.properties.iter().any(|(k, v)| {
                k == name && want.as_deref().map(|w| w == v).unwrap_or(true)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> DeviceNode {
        DeviceNode {
            variant_slot: Some((NodeVariant::Event, 0)),
            properties: vec![
                ("ID_INPUT".into(), "1".into()),
                ("ID_INPUT_GAMEPAD".into(), "1".into()),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn property_lookup_misses_return_none() {
        let n = node();
        assert_eq!(n.property("ID_INPUT"), Some("1"));
        assert_eq!(n.property("NOPE"), None);
    }

    #[test]
    fn empty_filters_match_vacuously() {
        let n = node();
        assert!(n.matches_property_filters(&[]));
    }

    #[test]
    fn value_restricted_filter_requires_exact_value() {
        let n = node();
        assert!(n.matches_property_filters(&[("ID_INPUT_GAMEPAD".into(), Some("1".into()))]));
        assert!(!n.matches_property_filters(&[("ID_INPUT_GAMEPAD".into(), Some("0".into()))]));
    }

    #[test]
    fn value_free_filter_matches_any_value_if_present() {
        let n = node();
        assert!(n.matches_property_filters(&[("ID_INPUT".into(), None)]));
        assert!(!n.matches_property_filters(&[("MISSING".into(), None)]));
    }

    #[test]
    fn node_without_properties_fails_nonempty_filters() {
        let n = DeviceNode {
            variant_slot: Some((NodeVariant::UsbParent, 0)),
            ..Default::default()
        };
        assert!(!n.matches_property_filters(&[("ID_INPUT".into(), None)]));
        assert!(n.matches_property_filters(&[]));
    }
}
