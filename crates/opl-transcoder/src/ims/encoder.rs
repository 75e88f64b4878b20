//! IMS file encoder.
//!
//! Fixed 71-byte header, a flat music-data stream (running-status
//! compressed, base-240 delta-timed, terminated by one `0xFC` loop
//! marker), a single zero separator byte, then the instrument-name
//! footer. Readers page the music-data region at 32 KiB; this writer
//! does not insert page boundaries of its own.

use crate::binutil::{write_fixed_str, write_u16, write_u32};
use crate::ims::delta::encode_delta;
use crate::ims::event::{sort_events, ImsEvent};

/// Loop marker appended once after the last event's trailing delta.
const LOOP_MARKER: u8 = 0xFC;

mod offset {
    pub const SONG_NAME: usize = 6;
    pub const BYTE_SIZE: usize = 42;
    pub const D_MODE: usize = 58;
    pub const BASIC_TEMPO: usize = 60;
    pub const HEADER_LEN: usize = 71;
}

const SONG_NAME_LEN: usize = 30;
const INSTRUMENT_NAME_LEN: usize = 9;
const MAX_INSTRUMENT_NAME_CHARS: usize = 8;

fn payload_len(kind: crate::ims::event::EventKind) -> usize {
    use crate::ims::event::EventKind::*;
    match kind {
        NoteOnAlways | NoteOnCond | PitchBend => 2,
        Volume | Instrument => 1,
        Tempo => 5,
    }
}

/// Serialize an already-built event list, song name, tempo, drum-mode
/// flag, and instrument names into a full IMS byte buffer.
pub fn encode(
    events: &[ImsEvent],
    song_name: &str,
    tempo: u8,
    d_mode: u8,
    instrument_names: &[String],
) -> Vec<u8> {
    let mut sorted = events.to_vec();
    sort_events(&mut sorted);

    let music_data = encode_music_data(&sorted);
    let byte_size = music_data.len() as u32;

    let insnum: u16 = instrument_names.len() as u16;
    let footer_len = 1 + 2 + instrument_names.len() * INSTRUMENT_NAME_LEN;

    let mut buf = vec![0u8; offset::HEADER_LEN + music_data.len() + footer_len];

    write_fixed_str(&mut buf, offset::SONG_NAME, SONG_NAME_LEN, song_name);
    write_u32(&mut buf, offset::BYTE_SIZE, byte_size);
    buf[offset::D_MODE] = d_mode;
    write_u16(&mut buf, offset::BASIC_TEMPO, tempo as u16);

    let data_start = offset::HEADER_LEN;
    buf[data_start..data_start + music_data.len()].copy_from_slice(&music_data);

    let footer_start = data_start + music_data.len();
    // buf[footer_start] is the zeroed separator byte; already zero.
    write_u16(&mut buf, footer_start + 1, insnum);

    let mut name_off = footer_start + 3;
    for name in instrument_names {
        let truncated: String = name.chars().take(MAX_INSTRUMENT_NAME_CHARS).collect();
        write_fixed_str(&mut buf, name_off, INSTRUMENT_NAME_LEN, &truncated);
        name_off += INSTRUMENT_NAME_LEN;
    }

    buf
}

fn encode_music_data(sorted: &[ImsEvent]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut prev_status: Option<u8> = None;

    for (i, event) in sorted.iter().enumerate() {
        let status = event.status_byte();
        if prev_status != Some(status) {
            out.push(status);
            prev_status = Some(status);
        }

        let want = payload_len(event.kind);
        out.extend(event.data.iter().take(want).copied());

        let delta = match sorted.get(i + 1) {
            Some(next) => next.abs_tick.saturating_sub(event.abs_tick),
            None => 0,
        };
        out.extend(encode_delta(delta));
    }

    out.push(LOOP_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ims::event::EventKind;

    #[test]
    fn empty_event_list_is_just_the_loop_marker() {
        let buf = encode(&[], "", 120, 0, &[]);
        let byte_size = u32::from_le_bytes(buf[42..46].try_into().unwrap());
        assert_eq!(byte_size, 1);
        assert_eq!(buf[offset::HEADER_LEN], LOOP_MARKER);
        let insnum = u16::from_le_bytes(buf[72 + 1..72 + 3].try_into().unwrap());
        assert_eq!(insnum, 0);
    }

    #[test]
    fn running_status_is_omitted_for_repeats() {
        let events = vec![
            ImsEvent::new(EventKind::NoteOnCond, 0, vec![60, 127], 0, 0),
            ImsEvent::new(EventKind::NoteOnCond, 0, vec![60, 0], 480, 1),
        ];
        let buf = encode(&events, "song", 120, 0, &[]);
        let byte_size = u32::from_le_bytes(buf[42..46].try_into().unwrap()) as usize;
        let data = &buf[71..71 + byte_size];
        // status(1) + payload(2) + delta-to-next(2: F8,F0... actually 480 ticks
        // = two 240-chunks + remainder 0) + payload(2, no repeated status) + delta(1, zero) + loop marker.
        assert_eq!(data[0], 0x90);
        assert_eq!(&data[1..3], &[60, 127]);
    }

    #[test]
    fn header_fields_land_at_spec_offsets() {
        let buf = encode(&[], "Boss Theme", 140, 1, &["inst_00".to_string()]);
        assert_eq!(&buf[6..16], b"Boss Theme");
        assert_eq!(buf[58], 1);
        let tempo = u16::from_le_bytes(buf[60..62].try_into().unwrap());
        assert_eq!(tempo, 140);
    }
}
