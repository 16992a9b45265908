//! Linux joystick/evdev kernel ABI: ioctl request-number decoding and the on-wire
//! record layouts, grounded in `<linux/joystick.h>` / `<linux/input.h>` (the ABI the
//! teacher's `evdev`/`nix` dependencies wrap at a higher level; here we synthesize it
//! by hand, because the whole point of this layer is to answer these ioctls
//! ourselves instead of going through a real device node).
//!
//! Request numbers are decoded rather than matched as opaque magic constants, using
//! the generic `_IOC(dir, type, nr, size)` encoding from `<asm-generic/ioctl.h>`
//! (dir: 2 bits, size: 14 bits, type ('j'/'E'): 8 bits, nr: 8 bits). Matching on
//! `(type, nr)` is more robust than matching on the fully-encoded constant, because
//! some consumers build the request with a locally-declared (but equivalent) struct
//! whose size differs by padding.

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;
const IOC_DIRBITS: u32 = 2;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

pub const IOC_NONE: u8 = 0;
pub const IOC_WRITE: u8 = 1;
pub const IOC_READ: u8 = 2;

pub const JS_IOC_TYPE: u8 = b'j';
pub const EV_IOC_TYPE: u8 = b'E';

/// A decoded ioctl request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IocRequest {
    pub dir: u8,
    pub ty: u8,
    pub nr: u8,
    pub size: u16,
}

pub fn decode(request: u64) -> IocRequest {
    let mask_nr = (1u64 << IOC_NRBITS) - 1;
    let mask_type = (1u64 << IOC_TYPEBITS) - 1;
    let mask_size = (1u64 << IOC_SIZEBITS) - 1;
    let mask_dir = (1u64 << IOC_DIRBITS) - 1;
    IocRequest {
        nr: ((request >> IOC_NRSHIFT) & mask_nr) as u8,
        ty: ((request >> IOC_TYPESHIFT) & mask_type) as u8,
        size: ((request >> IOC_SIZESHIFT) & mask_size) as u16,
        dir: ((request >> IOC_DIRSHIFT) & mask_dir) as u8,
    }
}

/// Builds a request number; used by tests to construct well-known ioctl requests and
/// cross-check them against the documented kernel constants.
pub fn encode(dir: u8, ty: u8, nr: u8, size: u16) -> u64 {
    ((dir as u64) << IOC_DIRSHIFT)
        | ((ty as u64) << IOC_TYPESHIFT)
        | ((size as u64) << IOC_SIZESHIFT)
        | ((nr as u64) << IOC_NRSHIFT)
}

/// Joystick ioctl `nr` values (`<linux/joystick.h>`).
pub mod js_nr {
    pub const GVERSION: u8 = 0x01;
    pub const GAXES: u8 = 0x11;
    pub const GBUTTONS: u8 = 0x12;
    pub const GNAME: u8 = 0x13;
    pub const SCORR: u8 = 0x21;
    pub const GCORR: u8 = 0x22;
    pub const SAXMAP: u8 = 0x31;
    pub const GAXMAP: u8 = 0x32;
    pub const SBTNMAP: u8 = 0x33;
    pub const GBTNMAP: u8 = 0x34;
}

/// Evdev ioctl `nr` values (`<linux/input.h>`). `GBIT_BASE`/`GABS_BASE` are added to
/// the event-type / abs-code argument to form the final `nr`.
pub mod ev_nr {
    pub const GVERSION: u8 = 0x01;
    pub const GID: u8 = 0x02;
    pub const GNAME: u8 = 0x06;
    pub const GPROP: u8 = 0x09;
    pub const GKEY: u8 = 0x18;
    pub const GBIT_BASE: u8 = 0x20;
    pub const GABS_BASE: u8 = 0x40;
    pub const SFF: u8 = 0x80;
    pub const RMFF: u8 = 0x81;
    pub const GEFFECTS: u8 = 0x84;
    pub const GRAB: u8 = 0x90;
}

/// `<linux/joystick.h>` `JS_VERSION`.
pub const JS_VERSION: u32 = 0x020100;

/// `<linux/input-event-codes.h>` event types referenced by ioctl emulation.
pub mod ev_type {
    pub const EV_SYN: u32 = 0x00;
    pub const EV_KEY: u32 = 0x01;
    pub const EV_ABS: u32 = 0x03;
    pub const EV_FF: u32 = 0x15;
}

/// `<linux/input.h>` `FF_RUMBLE`.
pub const FF_RUMBLE: u32 = 0x50;

/// `<linux/input-event-codes.h>` abs axis codes needed by the abs-info table.
pub mod abs_code {
    pub const ABS_X: u32 = 0x00;
    pub const ABS_Y: u32 = 0x01;
    pub const ABS_Z: u32 = 0x02;
    pub const ABS_RX: u32 = 0x03;
    pub const ABS_RY: u32 = 0x04;
    pub const ABS_RZ: u32 = 0x05;
    pub const ABS_HAT0X: u32 = 0x10;
    pub const ABS_HAT0Y: u32 = 0x11;
}

/// Legacy `/dev/input/jsX` 8-byte event record (spec §6: "timestamp u32, value i16,
/// type u8, number u8").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsEvent {
    pub time: u32,
    pub value: i16,
    pub ev_type: u8,
    pub number: u8,
}

pub const JS_EVENT_SIZE: usize = 8;

impl JsEvent {
    pub fn to_le_bytes(self) -> [u8; JS_EVENT_SIZE] {
        let mut buf = [0u8; JS_EVENT_SIZE];
        buf[0..4].copy_from_slice(&self.time.to_le_bytes());
        buf[4..6].copy_from_slice(&self.value.to_le_bytes());
        buf[6] = self.ev_type;
        buf[7] = self.number;
        buf
    }

    pub fn from_le_bytes(buf: [u8; JS_EVENT_SIZE]) -> Self {
        JsEvent {
            time: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            value: i16::from_le_bytes(buf[4..6].try_into().unwrap()),
            ev_type: buf[6],
            number: buf[7],
        }
    }
}

/// `struct input_event` on a 64-bit kernel: 16-byte `timeval` + type/code/value.
pub const INPUT_EVENT_SIZE: usize = 24;

/// `struct input_absinfo`: six `i32` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputAbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

pub const INPUT_ABSINFO_SIZE: usize = 24;

impl InputAbsInfo {
    pub fn to_le_bytes(self) -> [u8; INPUT_ABSINFO_SIZE] {
        let mut buf = [0u8; INPUT_ABSINFO_SIZE];
        buf[0..4].copy_from_slice(&self.value.to_le_bytes());
        buf[4..8].copy_from_slice(&self.minimum.to_le_bytes());
        buf[8..12].copy_from_slice(&self.maximum.to_le_bytes());
        buf[12..16].copy_from_slice(&self.fuzz.to_le_bytes());
        buf[16..20].copy_from_slice(&self.flat.to_le_bytes());
        buf[20..24].copy_from_slice(&self.resolution.to_le_bytes());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsiocgversion_matches_known_kernel_constant() {
        let req = encode(IOC_READ, JS_IOC_TYPE, js_nr::GVERSION, 4);
        assert_eq!(req, 0x80046a01);
        assert_eq!(decode(req), IocRequest { dir: IOC_READ, ty: JS_IOC_TYPE, nr: js_nr::GVERSION, size: 4 });
    }

    #[test]
    fn eviocgid_matches_known_kernel_constant() {
        let req = encode(IOC_READ, EV_IOC_TYPE, ev_nr::GID, 8);
        assert_eq!(req, 0x80084502);
    }

    #[test]
    fn eviocgrab_matches_known_kernel_constant() {
        let req = encode(IOC_WRITE, EV_IOC_TYPE, ev_nr::GRAB, 4);
        assert_eq!(req, 0x40044590);
    }

    #[test]
    fn decode_recovers_variable_size_js_getname() {
        let req = encode(IOC_READ, JS_IOC_TYPE, js_nr::GNAME, 128);
        let decoded = decode(req);
        assert_eq!(decoded.ty, JS_IOC_TYPE);
        assert_eq!(decoded.nr, js_nr::GNAME);
        assert_eq!(decoded.size, 128);
    }

    #[test]
    fn js_event_round_trips() {
        let ev = JsEvent { time: 123456, value: -500, ev_type: 0x81, number: 2 };
        let bytes = ev.to_le_bytes();
        assert_eq!(bytes.len(), JS_EVENT_SIZE);
        assert_eq!(JsEvent::from_le_bytes(bytes), ev);
    }

    #[test]
    fn abs_info_layout_is_six_i32_fields() {
        let info = InputAbsInfo { value: 0, minimum: -32767, maximum: 32767, fuzz: 16, flat: 128, resolution: 0 };
        let bytes = info.to_le_bytes();
        assert_eq!(i32::from_le_bytes(bytes[4..8].try_into().unwrap()), -32767);
        assert_eq!(i32::from_le_bytes(bytes[8..12].try_into().unwrap()), 32767);
    }
}
