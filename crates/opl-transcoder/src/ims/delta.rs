//! Base-240 variable-length delta-time encoding.
//!
//! `0xF8` is a continuation sentinel meaning "240 more ticks, read
//! another byte"; the terminal byte carries the remainder and is always
//! in `0x00..=0xF7`, so it can never collide with the reserved range
//! `0xF9..=0xFF` (of which `0xFC` is the loop marker appended once after
//! the whole music-data stream, not a per-event delta).

/// Encode `t` as a sequence of `0xF8` continuation bytes followed by one
/// terminal byte in `0x00..=0xF7`.
pub fn encode_delta(t: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut remaining = t;
    while remaining >= 0xF8 {
        bytes.push(0xF8);
        remaining -= 240;
    }
    bytes.push(remaining as u8);
    bytes
}

/// Decode a delta starting at `bytes[off]`. Returns the decoded value and
/// the number of bytes consumed.
pub fn decode_delta(bytes: &[u8], off: usize) -> Option<(u32, usize)> {
    let mut total: u32 = 0;
    let mut i = 0usize;
    loop {
        let b = *bytes.get(off + i)?;
        i += 1;
        if b == 0xF8 {
            total += 240;
        } else {
            total += b as u32;
            break;
        }
    }
    Some((total, i))
}
