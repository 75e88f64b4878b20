//! AdLib instrument bank (BNK) encoder.

use std::collections::HashSet;

use crate::binutil::{write_fixed_str, write_u16, write_u32, write_slice};
use crate::opl2::instrument::{Instrument, PARAMS_LEN};

const SIGNATURE: &[u8; 6] = b"ADLIB-";
const DIRECTORY_ENTRY_LEN: usize = 12;
const DATA_ENTRY_LEN: usize = 2 + PARAMS_LEN;
const NAME_FIELD_LEN: usize = 9;

mod offset {
    pub const VERSION: usize = 0;
    pub const SIGNATURE: usize = 2;
    pub const INS_MAX_NUM: usize = 8;
    pub const INS_LIST_OFF: usize = 12;
    pub const INS_DATA_OFF: usize = 16;
    pub const HEADER_LEN: usize = 20;
}

/// Serialize the interned instrument table into a full BNK byte buffer.
pub fn encode(instruments: &[Instrument]) -> Vec<u8> {
    let n = instruments.len();
    let list_off = offset::HEADER_LEN;
    let data_off = list_off + DIRECTORY_ENTRY_LEN * n;
    let total_len = data_off + DATA_ENTRY_LEN * n;

    let mut buf = vec![0u8; total_len];
    write_u16(&mut buf, offset::VERSION, 1);
    write_slice(&mut buf, offset::SIGNATURE, SIGNATURE);
    write_u16(&mut buf, offset::INS_MAX_NUM, n as u16);
    write_u32(&mut buf, offset::INS_LIST_OFF, list_off as u32);
    write_u32(&mut buf, offset::INS_DATA_OFF, data_off as u32);

    let names = unique_names(instruments);
    let mut directory: Vec<(String, u16)> = names
        .into_iter()
        .zip(instruments.iter().map(|i| i.id))
        .collect();
    directory.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));

    for (i, (name, ins_index)) in directory.iter().enumerate() {
        let entry_off = list_off + i * DIRECTORY_ENTRY_LEN;
        write_u16(&mut buf, entry_off, *ins_index);
        buf[entry_off + 2] = 0x01;
        write_fixed_str(&mut buf, entry_off + 3, NAME_FIELD_LEN, name);
    }

    for instrument in instruments {
        let entry_off = data_off + instrument.id as usize * DATA_ENTRY_LEN;
        buf[entry_off] = 0; // percussion
        buf[entry_off + 1] = instrument.id as u8; // voiceNumber
        buf[entry_off + 2..entry_off + 2 + PARAMS_LEN].copy_from_slice(&instrument.params);
    }

    buf
}

/// Disambiguate instrument names so the directory never has a
/// case-insensitive collision.
fn unique_names(instruments: &[Instrument]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(instruments.len());
    for ins in instruments {
        let mut candidate = ins.name.clone();
        let mut suffix = 2;
        while used.contains(&candidate.to_lowercase()) {
            candidate = format!("{}{}", ins.name, suffix);
            suffix += 1;
        }
        used.insert(candidate.to_lowercase());
        result.push(candidate);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(id: u16, name: &str) -> Instrument {
        Instrument {
            id,
            name: name.to_string(),
            params: [0u8; PARAMS_LEN],
            hash: String::new(),
        }
    }

    #[test]
    fn empty_bank_is_header_only() {
        let buf = encode(&[]);
        assert_eq!(buf.len(), 20);
        let insmax = u16::from_le_bytes(buf[8..10].try_into().unwrap());
        assert_eq!(insmax, 0);
    }

    #[test]
    fn directory_sorted_case_insensitively() {
        let instruments = vec![instrument(0, "inst_01"), instrument(1, "inst_00")];
        let buf = encode(&instruments);
        let first_index = u16::from_le_bytes(buf[20..22].try_into().unwrap());
        let second_index = u16::from_le_bytes(buf[32..34].try_into().unwrap());
        assert_eq!(first_index, 1); // "inst_00" sorts first
        assert_eq!(second_index, 0);
    }

    #[test]
    fn colliding_names_get_numeric_suffix() {
        let instruments = vec![instrument(0, "lead"), instrument(1, "lead")];
        let buf = encode(&instruments);
        let name_at = |entry: usize| -> String {
            let off = 20 + entry * DIRECTORY_ENTRY_LEN + 3;
            let raw = &buf[off..off + NAME_FIELD_LEN];
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            String::from_utf8_lossy(&raw[..end]).into_owned()
        };
        assert_ne!(name_at(0), name_at(1));
    }
}
