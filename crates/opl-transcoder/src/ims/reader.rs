//! Read-side IMS contract, implemented only so round-trip tests can
//! check the encoder's layout against an independent reader.

use std::fmt;

use crate::binutil::{read_u16_le_at, read_u32_le_at, OffsetOutOfRange};
use crate::ims::delta::decode_delta;

/// Readers page the music-data region at this boundary.
pub const PAGE_SIZE: usize = 32 * 1024;

mod offset {
    pub const SONG_NAME: usize = 6;
    pub const BYTE_SIZE: usize = 42;
    pub const D_MODE: usize = 58;
    pub const BASIC_TEMPO: usize = 60;
    pub const HEADER_LEN: usize = 71;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    Truncated(OffsetOutOfRange),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Truncated(e) => write!(f, "truncated IMS input: {e}"),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<OffsetOutOfRange> for ReadError {
    fn from(e: OffsetOutOfRange) -> Self {
        ReadError::Truncated(e)
    }
}

/// A single decoded music-data record: status byte, payload, and the
/// absolute tick it lands on (deltas already integrated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub status: u8,
    pub payload: Vec<u8>,
    pub abs_tick: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImsFile {
    pub song_name: String,
    pub byte_size: u32,
    pub d_mode: u8,
    pub basic_tempo: u16,
    /// Music-data region (including the trailing `0xFC` loop marker),
    /// split into 32 KiB pages as a reader would see them.
    pub pages: Vec<Vec<u8>>,
    pub instrument_names: Vec<String>,
}

pub fn read(bytes: &[u8]) -> Result<ImsFile, ReadError> {
    let song_name = read_nul_padded_str(bytes, offset::SONG_NAME, 30)?;
    let byte_size = read_u32_le_at(bytes, offset::BYTE_SIZE)?;
    let d_mode = *bytes
        .get(offset::D_MODE)
        .ok_or(OffsetOutOfRange { offset: offset::D_MODE, needed: 1, available: 0 })?;
    let basic_tempo = read_u16_le_at(bytes, offset::BASIC_TEMPO)?;

    let data_start = offset::HEADER_LEN;
    let data_end = data_start + byte_size as usize;
    let music_data = bytes
        .get(data_start..data_end)
        .ok_or(OffsetOutOfRange { offset: data_start, needed: byte_size as usize, available: bytes.len().saturating_sub(data_start) })?;
    let pages = music_data.chunks(PAGE_SIZE).map(|c| c.to_vec()).collect();

    let footer_start = data_end;
    let insnum = read_u16_le_at(bytes, footer_start + 1)?;
    let mut instrument_names = Vec::with_capacity(insnum as usize);
    let mut name_off = footer_start + 3;
    for _ in 0..insnum {
        instrument_names.push(read_nul_padded_str(bytes, name_off, 9)?);
        name_off += 9;
    }

    Ok(ImsFile {
        song_name,
        byte_size,
        d_mode,
        basic_tempo,
        pages,
        instrument_names,
    })
}

/// Payload byte counts for each status nibble, mirroring the encoder's table.
fn payload_len_for_status(status: u8) -> usize {
    match status & 0xF0 {
        0x80 | 0x90 | 0xE0 => 2,
        0xA0 | 0xC0 => 1,
        0xF0 => 5,
        _ => 0,
    }
}

/// Decode the music-data stream (sans trailing loop marker) back into a
/// flat list of events with running status expanded and deltas integrated.
pub fn decode_events(music_data: &[u8]) -> Vec<DecodedEvent> {
    let mut events = Vec::new();
    let mut off = 0usize;
    let mut tick: u32 = 0;
    let mut status: Option<u8> = None;

    while off < music_data.len() {
        if music_data[off] == 0xFC {
            break;
        }

        let byte = music_data[off];
        let current_status = if byte & 0x80 != 0 {
            off += 1;
            status = Some(byte);
            byte
        } else {
            match status {
                Some(s) => s,
                // Running status used before any status byte was seen:
                // the buffer is malformed, return what's been decoded so far.
                None => break,
            }
        };

        let want = payload_len_for_status(current_status);
        let Some(payload) = music_data.get(off..off + want) else {
            break;
        };
        let payload = payload.to_vec();
        off += want;

        let Some((delta, consumed)) = decode_delta(music_data, off) else {
            break;
        };
        off += consumed;
        tick += delta;

        events.push(DecodedEvent {
            status: current_status,
            payload,
            abs_tick: tick.saturating_sub(delta),
        });
    }

    events
}

fn read_nul_padded_str(bytes: &[u8], off: usize, len: usize) -> Result<String, OffsetOutOfRange> {
    let slice = bytes
        .get(off..off + len)
        .ok_or(OffsetOutOfRange { offset: off, needed: len, available: bytes.len().saturating_sub(off) })?;
    let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
    Ok(String::from_utf8_lossy(&slice[..end]).into_owned())
}
