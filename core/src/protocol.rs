//! Socket wire protocol (spec §6 "Socket wire protocol", §4.D Configuration
//! Handshake).
//!
//! `DeviceConfig` is the per-device configuration record the server writes once, at
//! connect time, over the device's Unix socket. Layout is fixed, little-endian,
//! native-aligned, exactly as spec.md lays it out field-by-field.

pub const NAME_FIELD_LEN: usize = 255;
pub const MAX_BUTTONS: usize = 512;
pub const MAX_AXES: usize = 64;
const PADDING_LEN: usize = 6;

/// Total wire size of [`DeviceConfig`]: `255 (name) + 2*3 (vendor/product/version) +
/// 2*2 (num_btns/num_axes) + 512*2 (btn_map) + 64*1 (axes_map) + 6 (padding)`.
pub const CONFIG_RECORD_SIZE: usize =
    NAME_FIELD_LEN + 2 * 3 + 2 * 2 + MAX_BUTTONS * 2 + MAX_AXES + PADDING_LEN;

/// Per-device configuration received from the server during the handshake
/// (spec §3 "Interposer per-slot state: Device configuration received from the
/// server").
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    pub num_btns: u16,
    pub num_axes: u16,
    pub btn_map: [u16; MAX_BUTTONS],
    pub axes_map: [u8; MAX_AXES],
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            name: String::new(),
            vendor: 0,
            product: 0,
            version: 0,
            num_btns: 0,
            num_axes: 0,
            btn_map: [0u16; MAX_BUTTONS],
            axes_map: [0u8; MAX_AXES],
        }
    }
}

impl DeviceConfig {
    /// Parses the wire record. Always succeeds: there's no variable-length data and
    /// no checksum, so the only defensive step is clamping the name field to its
    /// first NUL (spec §4.D "Force-null-terminate the name field").
    pub fn from_wire(buf: &[u8; CONFIG_RECORD_SIZE]) -> Self {
        let mut offset = 0;

        let name_bytes = &buf[offset..offset + NAME_FIELD_LEN];
        offset += NAME_FIELD_LEN;
        let nul_at = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        let name = String::from_utf8_lossy(&name_bytes[..nul_at]).into_owned();

        let vendor = read_u16(buf, &mut offset);
        let product = read_u16(buf, &mut offset);
        let version = read_u16(buf, &mut offset);
        let num_btns = read_u16(buf, &mut offset);
        let num_axes = read_u16(buf, &mut offset);

        let mut btn_map = [0u16; MAX_BUTTONS];
        for slot in btn_map.iter_mut() {
            *slot = read_u16(buf, &mut offset);
        }

        let mut axes_map = [0u8; MAX_AXES];
        axes_map.copy_from_slice(&buf[offset..offset + MAX_AXES]);
        offset += MAX_AXES;

        debug_assert_eq!(offset + PADDING_LEN, CONFIG_RECORD_SIZE);

        DeviceConfig {
            name,
            vendor,
            product,
            version,
            num_btns,
            num_axes,
            btn_map,
            axes_map,
        }
    }

    /// Serializes back to wire format. Only used by tests and by the in-process
    /// fake-server test harness (spec §4.J) to stand in for the real server.
    pub fn to_wire(&self) -> [u8; CONFIG_RECORD_SIZE] {
        let mut buf = [0u8; CONFIG_RECORD_SIZE];
        let mut offset = 0;

        let name_bytes = self.name.as_bytes();
        let copy_len = name_bytes.len().min(NAME_FIELD_LEN - 1);
        buf[offset..offset + copy_len].copy_from_slice(&name_bytes[..copy_len]);
        offset += NAME_FIELD_LEN;

        write_u16(&mut buf, &mut offset, self.vendor);
        write_u16(&mut buf, &mut offset, self.product);
        write_u16(&mut buf, &mut offset, self.version);
        write_u16(&mut buf, &mut offset, self.num_btns);
        write_u16(&mut buf, &mut offset, self.num_axes);

        for &b in &self.btn_map {
            write_u16(&mut buf, &mut offset, b);
        }
        buf[offset..offset + MAX_AXES].copy_from_slice(&self.axes_map);
        offset += MAX_AXES;

        debug_assert_eq!(offset + PADDING_LEN, CONFIG_RECORD_SIZE);
        buf
    }
}

fn read_u16(buf: &[u8], offset: &mut usize) -> u16 {
    let value = u16::from_le_bytes([buf[*offset], buf[*offset + 1]]);
    *offset += 2;
    value
}

fn write_u16(buf: &mut [u8], offset: &mut usize, value: u16) {
    buf[*offset..*offset + 2].copy_from_slice(&value.to_le_bytes());
    *offset += 2;
}

/// Client -> server handshake byte (spec §4.D step 4): local pointer size in bytes.
pub fn word_size_byte() -> u8 {
    std::mem::size_of::<usize>() as u8
}

/// spec §4.D connect algorithm bounds.
pub const CONNECT_RETRY_INTERVAL_MS: u64 = 10;
pub const CONNECT_TIMEOUT_MS: u64 = 250;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_format() {
        let mut cfg = DeviceConfig {
            name: "Ignored".to_string(),
            vendor: 0x1234,
            product: 0x5678,
            version: 0x0001,
            num_btns: 11,
            num_axes: 8,
            ..Default::default()
        };
        cfg.btn_map[0] = 0x130; // BTN_A
        cfg.axes_map[0] = 0x00; // ABS_X

        let wire = cfg.to_wire();
        assert_eq!(wire.len(), CONFIG_RECORD_SIZE);
        let parsed = DeviceConfig::from_wire(&wire);
        assert_eq!(parsed.name, "Ignored");
        assert_eq!(parsed.num_btns, 11);
        assert_eq!(parsed.num_axes, 8);
        assert_eq!(parsed.btn_map[0], 0x130);
        assert_eq!(parsed.axes_map[0], 0x00);
    }

    #[test]
    fn name_field_is_forced_null_terminated_even_without_a_nul_byte() {
        let mut wire = [0x41u8; CONFIG_RECORD_SIZE]; // fill with 'A', no NUL anywhere
        // Leave the rest of the record zeroed past the name field for determinism.
        for b in wire.iter_mut().skip(NAME_FIELD_LEN) {
            *b = 0;
        }
        let parsed = DeviceConfig::from_wire(&wire);
        assert_eq!(parsed.name.len(), NAME_FIELD_LEN);
        assert!(parsed.name.chars().all(|c| c == 'A'));
    }

    #[test]
    fn config_record_size_matches_field_layout() {
        assert_eq!(CONFIG_RECORD_SIZE, 1359);
    }

    #[test]
    fn word_size_byte_is_the_pointer_width() {
        assert_eq!(word_size_byte() as usize, std::mem::size_of::<usize>());
    }
}
