//! The Hardcoded Identity Contract (spec §4.A, §6).
//!
//! Every emulated gamepad, regardless of which node a consumer opens it through,
//! must report the exact same `(name, vendor, product, version, bus)` tuple. Both
//! `selkies-fake-udev` (discovery) and `selkies-input-interposer` (ioctl emulation)
//! import these constants rather than each declaring their own copy, because a
//! single digit of drift here causes consumers that cross-check discovery metadata
//! against `EVIOCGID`/`EVIOCGNAME` to reject the device (spec §4.A rationale).

/// Display name reported by udev's `name` sysattr, `JSIOCGNAME` and `EVIOCGNAME`.
pub const DEVICE_NAME: &str = "Microsoft X-Box 360 pad";

pub const VENDOR_ID: u16 = 0x045E;
pub const PRODUCT_ID: u16 = 0x028E;
pub const VERSION: u16 = 0x0114;

/// `BUS_USB` from `<linux/input.h>`.
pub const BUS_USB: u16 = 0x0003;

/// `EVIOCGID` reply payload (`struct input_id`): bustype, vendor, product, version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

pub const IDENTITY: InputId = InputId {
    bustype: BUS_USB,
    vendor: VENDOR_ID,
    product: PRODUCT_ID,
    version: VERSION,
};

impl InputId {
    /// Serializes in the kernel's native-endian, native-alignment layout (8 bytes).
    pub fn to_le_bytes(self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf[0..2].copy_from_slice(&self.bustype.to_le_bytes());
        buf[2..4].copy_from_slice(&self.vendor.to_le_bytes());
        buf[4..6].copy_from_slice(&self.product.to_le_bytes());
        buf[6..8].copy_from_slice(&self.version.to_le_bytes());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matches_contract() {
        assert_eq!(IDENTITY.bustype, 0x0003);
        assert_eq!(IDENTITY.vendor, 0x045E);
        assert_eq!(IDENTITY.product, 0x028E);
        assert_eq!(IDENTITY.version, 0x0114);
    }

    #[test]
    fn input_id_serializes_little_endian() {
        let bytes = IDENTITY.to_le_bytes();
        assert_eq!(bytes, [0x03, 0x00, 0x5E, 0x04, 0x8E, 0x02, 0x14, 0x01]);
    }
}
