//! `/dev/input/eventY` ioctl emulation (`<linux/input.h>`).

use crate::error::IoctlError;
use crate::identity::IDENTITY;
use crate::ioctl::joystick::truncated_name;
use crate::ioctl::IoctlOutcome;
use crate::kernel_abi::{abs_code, ev_nr, ev_type, InputAbsInfo, IocRequest, FF_RUMBLE, INPUT_ABSINFO_SIZE};
use crate::slot::OpenSlot;

const EV_VERSION: u32 = 0x010001;

pub fn dispatch(slot: &mut OpenSlot, req: IocRequest, input: &[u8]) -> Result<IoctlOutcome, IoctlError> {
    if req.nr >= ev_nr::GABS_BASE && req.nr < ev_nr::GABS_BASE + 0x40 {
        let abs = (req.nr - ev_nr::GABS_BASE) as u32;
        return Ok(IoctlOutcome::data(gabs(abs).to_le_bytes().to_vec()));
    }
    if req.nr >= ev_nr::GBIT_BASE && req.nr < ev_nr::GBIT_BASE + 0x20 {
        let requested_type = (req.nr - ev_nr::GBIT_BASE) as u32;
        let out = gbit(slot, requested_type, req.size as usize);
        let retval = out.len() as i32;
        return Ok(IoctlOutcome::data_with_retval(out, retval));
    }

    match req.nr {
        ev_nr::GVERSION => Ok(IoctlOutcome::data(EV_VERSION.to_le_bytes().to_vec())),
        ev_nr::GID => Ok(IoctlOutcome::data(IDENTITY.to_le_bytes().to_vec())),
        ev_nr::GNAME => {
            let (out, written) = truncated_name(req.size as usize);
            Ok(IoctlOutcome::data_with_retval(out, written as i32))
        }
        ev_nr::GPROP => Ok(IoctlOutcome::data(vec![0u8; req.size as usize])),
        ev_nr::GKEY => {
            let len = req.size as usize;
            Ok(IoctlOutcome::data_with_retval(vec![0u8; len], len as i32))
        }
        ev_nr::GRAB => Ok(IoctlOutcome::data(Vec::new())),
        ev_nr::SFF => {
            let (out, assigned_id) = upload_effect(input)?;
            Ok(IoctlOutcome::data_with_retval(out, assigned_id as i32))
        }
        ev_nr::RMFF => Ok(IoctlOutcome::data(Vec::new())),
        ev_nr::GEFFECTS => Ok(IoctlOutcome::data(1u32.to_le_bytes().to_vec())),
        _ => Err(IoctlError::NoSuchIoctl),
    }
}

/// `EVIOCGABS`: per-axis range/fuzz/flat table. Hats are digital (-1/0/1); the
/// sticks use the standard Xbox 360 pad analog range; any other code falls back to
/// that same standard range (spec §4.F "Any other code: defaults as for standard
/// axes (and log a warning)").
fn gabs(code: u32) -> InputAbsInfo {
    match code {
        abs_code::ABS_HAT0X | abs_code::ABS_HAT0Y => {
            InputAbsInfo { value: 0, minimum: -1, maximum: 1, fuzz: 0, flat: 0, resolution: 0 }
        }
        abs_code::ABS_Z | abs_code::ABS_RZ => {
            InputAbsInfo { value: 0, minimum: 0, maximum: 255, fuzz: 0, flat: 0, resolution: 0 }
        }
        abs_code::ABS_X | abs_code::ABS_Y | abs_code::ABS_RX | abs_code::ABS_RY => standard_axis(),
        other => {
            log::warn!("EVIOCGABS requested for unconfigured abs code {other}; defaulting to standard axis range");
            standard_axis()
        }
    }
}

fn standard_axis() -> InputAbsInfo {
    InputAbsInfo { value: 0, minimum: -32767, maximum: 32767, fuzz: 16, flat: 128, resolution: 0 }
}

/// `EVIOCGBIT`: supported-event/key/abs/ff-effect bitmaps.
fn gbit(slot: &OpenSlot, requested_type: u32, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    let mut set = |bit: u32| {
        let byte = (bit / 8) as usize;
        if byte < out.len() {
            out[byte] |= 1 << (bit % 8);
        }
    };
    match requested_type {
        ev_type::EV_SYN => {
            set(ev_type::EV_SYN);
            set(ev_type::EV_KEY);
            set(ev_type::EV_ABS);
            set(ev_type::EV_FF);
        }
        ev_type::EV_KEY => {
            for &code in &slot.config.btn_map[..slot.config.num_btns as usize] {
                set(code as u32);
            }
        }
        ev_type::EV_ABS => {
            for &code in &slot.config.axes_map[..slot.config.num_axes as usize] {
                set(code as u32);
            }
        }
        ev_type::EV_FF => set(FF_RUMBLE),
        _ => {}
    }
    out
}

/// `EVIOCSFF`: the kernel assigns effect id `1` the first time a slot uploads an
/// effect (`id == -1`), and preserves the caller's id on replace; the ioctl's return
/// value is the resulting id (spec §4.F "Return the resulting id"). `struct
/// ff_effect` puts `type` at offset 0 (`u16`) and `id` at offset 2 (`s16`).
fn upload_effect(input: &[u8]) -> Result<(Vec<u8>, i16), IoctlError> {
    if input.len() < INPUT_ABSINFO_SIZE.min(4) || input.len() < 4 {
        return Err(IoctlError::InvalidArgument);
    }
    let mut out = input.to_vec();
    let id = i16::from_le_bytes([out[2], out[3]]);
    let assigned = if id == -1 { 1 } else { id };
    out[2..4].copy_from_slice(&assigned.to_le_bytes());
    Ok((out, assigned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel_abi::{decode, encode, ev_nr, EV_IOC_TYPE, IOC_READ, IOC_WRITE};
    use crate::protocol::DeviceConfig;

    fn slot_with_buttons(codes: &[u16]) -> OpenSlot {
        let mut config = DeviceConfig { num_btns: codes.len() as u16, ..Default::default() };
        config.btn_map[..codes.len()].copy_from_slice(codes);
        OpenSlot { fd: -1, config, open_flags: 0, correction: Vec::new() }
    }

    #[test]
    fn gversion_and_gid_are_fixed() {
        let mut slot = slot_with_buttons(&[]);
        let v_req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GVERSION, 4));
        let v_out = dispatch(&mut slot, v_req, &[]).unwrap();
        assert_eq!(u32::from_le_bytes(v_out.data.try_into().unwrap()), EV_VERSION);
        assert_eq!(v_out.retval, 0);

        let id_req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GID, 8));
        let out = dispatch(&mut slot, id_req, &[]).unwrap().data;
        assert_eq!(u16::from_le_bytes([out[0], out[1]]), IDENTITY.bustype);
        assert_eq!(u16::from_le_bytes([out[2], out[3]]), IDENTITY.vendor);
    }

    #[test]
    fn gname_is_truncated_and_null_terminated_with_length_retval() {
        let mut slot = slot_with_buttons(&[]);
        let req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GNAME, 8));
        let out = dispatch(&mut slot, req, &[]).unwrap();
        assert_eq!(out.data.len(), 8);
        assert_eq!(out.data[7], 0);
        assert_eq!(out.retval, 7);
    }

    #[test]
    fn gkey_and_gbit_report_len_as_retval() {
        let mut slot = slot_with_buttons(&[0x130]);
        let gkey_req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GKEY, 96));
        let gkey_out = dispatch(&mut slot, gkey_req, &[]).unwrap();
        assert_eq!(gkey_out.retval, 96);

        let gbit_req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GBIT_BASE + ev_type::EV_KEY as u8, 64));
        let gbit_out = dispatch(&mut slot, gbit_req, &[]).unwrap();
        assert_eq!(gbit_out.retval, 64);
    }

    #[test]
    fn gbit_ev_syn_reports_supported_event_types() {
        let mut slot = slot_with_buttons(&[]);
        let req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GBIT_BASE + ev_type::EV_SYN as u8, 4));
        let out = dispatch(&mut slot, req, &[]).unwrap().data;
        assert_ne!(out[0] & 1, 0); // EV_SYN bit
    }

    #[test]
    fn gbit_ev_key_reports_configured_buttons() {
        let mut slot = slot_with_buttons(&[0x130]); // BTN_A
        let req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GBIT_BASE + ev_type::EV_KEY as u8, 64));
        let out = dispatch(&mut slot, req, &[]).unwrap().data;
        let byte = 0x130 / 8;
        assert_ne!(out[byte] & (1 << (0x130 % 8)), 0);
    }

    #[test]
    fn gabs_hat_axes_are_digital() {
        let info = gabs(abs_code::ABS_HAT0X);
        assert_eq!(info.minimum, -1);
        assert_eq!(info.maximum, 1);
    }

    #[test]
    fn gabs_sticks_use_documented_asymmetric_range() {
        let info = gabs(abs_code::ABS_X);
        assert_eq!(info.minimum, -32767);
        assert_eq!(info.maximum, 32767);
    }

    #[test]
    fn gabs_unconfigured_code_falls_back_to_standard_axis_range() {
        let info = gabs(0x06); // ABS_THROTTLE, not in the configured code table
        assert_eq!(info.minimum, -32767);
        assert_eq!(info.maximum, 32767);
        assert_eq!(info.fuzz, 16);
        assert_eq!(info.flat, 128);
    }

    #[test]
    fn sff_assigns_id_one_when_requested_is_unset() {
        let mut effect = vec![0u8; 24];
        effect[2..4].copy_from_slice(&(-1i16).to_le_bytes());
        let (out, assigned) = upload_effect(&effect).unwrap();
        assert_eq!(assigned, 1);
        assert_eq!(i16::from_le_bytes([out[2], out[3]]), 1);
    }

    #[test]
    fn sff_preserves_existing_id() {
        let mut effect = vec![0u8; 24];
        effect[2..4].copy_from_slice(&(5i16).to_le_bytes());
        let (out, assigned) = upload_effect(&effect).unwrap();
        assert_eq!(assigned, 5);
        assert_eq!(i16::from_le_bytes([out[2], out[3]]), 5);
    }

    #[test]
    fn sff_dispatch_returns_assigned_id_as_retval() {
        let mut slot = slot_with_buttons(&[]);
        let mut effect = vec![0u8; 24];
        effect[2..4].copy_from_slice(&(-1i16).to_le_bytes());
        let req = decode(encode(IOC_WRITE, EV_IOC_TYPE, ev_nr::SFF, 24));
        let out = dispatch(&mut slot, req, &effect).unwrap();
        assert_eq!(out.retval, 1);
    }

    #[test]
    fn geffects_reports_one_slot() {
        let mut slot = slot_with_buttons(&[]);
        let req = decode(encode(IOC_READ, EV_IOC_TYPE, ev_nr::GEFFECTS, 4));
        let out = dispatch(&mut slot, req, &[]).unwrap().data;
        assert_eq!(u32::from_le_bytes(out.try_into().unwrap()), 1);
    }
}
