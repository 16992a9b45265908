//! `/dev/input/jsX` ioctl emulation (`<linux/joystick.h>`).

use crate::error::IoctlError;
use crate::identity::DEVICE_NAME;
use crate::ioctl::IoctlOutcome;
use crate::kernel_abi::{js_nr, IocRequest, JS_VERSION};
use crate::slot::OpenSlot;

pub fn dispatch(slot: &mut OpenSlot, req: IocRequest, input: &[u8]) -> Result<IoctlOutcome, IoctlError> {
    match req.nr {
        js_nr::GVERSION => Ok(IoctlOutcome::data(JS_VERSION.to_le_bytes().to_vec())),
        js_nr::GAXES => Ok(IoctlOutcome::data(vec![slot.config.num_axes as u8])),
        js_nr::GBUTTONS => Ok(IoctlOutcome::data(vec![slot.config.num_btns as u8])),
        js_nr::GNAME => {
            let (out, written) = truncated_name(req.size as usize);
            Ok(IoctlOutcome::data_with_retval(out, written as i32))
        }
        js_nr::SCORR => {
            slot.correction = input[..req.size as usize].to_vec();
            Ok(IoctlOutcome::data(Vec::new()))
        }
        js_nr::GCORR => {
            let mut out = vec![0u8; req.size as usize];
            let copy_len = slot.correction.len().min(out.len());
            out[..copy_len].copy_from_slice(&slot.correction[..copy_len]);
            Ok(IoctlOutcome::data(out))
        }
        js_nr::SAXMAP | js_nr::SBTNMAP => Err(IoctlError::NotPermitted),
        js_nr::GAXMAP => {
            let needed = slot.config.num_axes as usize;
            if (req.size as usize) < needed {
                return Err(IoctlError::InvalidArgument);
            }
            let mut out = vec![0u8; req.size as usize];
            out[..needed].copy_from_slice(&slot.config.axes_map[..needed]);
            Ok(IoctlOutcome::data(out))
        }
        js_nr::GBTNMAP => {
            let needed = slot.config.num_btns as usize * 2;
            if (req.size as usize) < needed {
                return Err(IoctlError::InvalidArgument);
            }
            let mut out = vec![0u8; req.size as usize];
            for (i, &code) in slot.config.btn_map[..slot.config.num_btns as usize].iter().enumerate() {
                out[i * 2..i * 2 + 2].copy_from_slice(&code.to_le_bytes());
            }
            Ok(IoctlOutcome::data(out))
        }
        _ => Err(IoctlError::NoSuchIoctl),
    }
}

/// Copies the Identity Table name truncated and null-terminated to `cap` bytes
/// (spec §4.F "Get name(len) ... truncated and null-terminated to `len`, returns the
/// length written excluding the null"). Reserving the last byte whenever the name
/// would otherwise fill the buffer guarantees a NUL always lands inside `cap`.
pub fn truncated_name(cap: usize) -> (Vec<u8>, usize) {
    let name = DEVICE_NAME.as_bytes();
    let written = if cap == 0 { 0 } else { name.len().min(cap - 1) };
    let mut out = vec![0u8; cap];
    out[..written].copy_from_slice(&name[..written]);
    (out, written)
}
