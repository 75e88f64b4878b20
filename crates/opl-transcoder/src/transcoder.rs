//! The transcoder facade: wires the VGM parser into the OPL2 tracker,
//! converts sample positions to ticks via tempo, and hands the resulting
//! event list and instrument table to the IMS and BNK encoders.

use crate::bnk;
use crate::error::TranscodeError;
use crate::ims::{self, EventKind, ImsEvent};
use crate::opl2::{OplEvent, Opl2State, CHANNELS};
use crate::vgm::{self, VgmCommand, Warning};

/// Caller-supplied knobs the core facade needs; everything else (input
/// path, output paths, arg parsing) is the CLI's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOptions {
    pub song_name: String,
    /// Beats per minute; ticks run at `4 * tempo` per second. Validity
    /// (`1..=255`) is a CLI-layer concern.
    pub tempo: u8,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        TranscodeOptions {
            song_name: String::new(),
            tempo: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutput {
    pub ims_bytes: Vec<u8>,
    pub bnk_bytes: Vec<u8>,
    pub instrument_count: usize,
    pub event_count: usize,
    pub warnings: Vec<Warning>,
}

/// Run the full VGM -> IMS/BNK pipeline over an in-memory VGM buffer.
pub fn transcode(
    vgm_bytes: &[u8],
    options: &TranscodeOptions,
) -> Result<TranscodeOutput, TranscodeError> {
    let (_header, commands, warnings) = vgm::parse(vgm_bytes)?;

    let mut state = Opl2State::new();
    let mut events: Vec<ImsEvent> = Vec::new();
    let mut channel_instruments: [Option<u16>; CHANNELS] = [None; CHANNELS];
    let mut current_sample: u64 = 0;
    let mut order: u32 = 0;

    for command in &commands {
        match command {
            VgmCommand::Wait { abs_sample, .. } => {
                current_sample = *abs_sample;
            }
            VgmCommand::Write { register, value, .. } => {
                if let Some(event) = state.on_write(*register, *value)? {
                    let tick = sample_to_tick(current_sample, options.tempo);
                    push_lifted_event(
                        &mut events,
                        &mut channel_instruments,
                        &mut order,
                        event,
                        tick,
                    );
                }
            }
            VgmCommand::End { .. } => break,
        }
    }

    let event_count = events.len();
    let d_mode = if state.percussion_mode() { 1 } else { 0 };
    let instruments = state.take_instruments();
    let instrument_names: Vec<String> = instruments.iter().map(|i| i.name.clone()).collect();
    let instrument_count = instruments.len();

    let ims_bytes = ims::encode(&events, &options.song_name, options.tempo, d_mode, &instrument_names);
    let bnk_bytes = bnk::encode(&instruments);

    Ok(TranscodeOutput {
        ims_bytes,
        bnk_bytes,
        instrument_count,
        event_count,
        warnings,
    })
}

fn sample_to_tick(current_sample: u64, tempo: u8) -> u32 {
    let ticks = (current_sample as f64) * 4.0 * (tempo as f64) / 44_100.0;
    ticks.round() as u32
}

fn push_lifted_event(
    events: &mut Vec<ImsEvent>,
    channel_instruments: &mut [Option<u16>; CHANNELS],
    order: &mut u32,
    event: OplEvent,
    tick: u32,
) {
    match event {
        OplEvent::NoteOn {
            channel,
            note,
            instrument_index,
        } => {
            if channel_instruments[channel as usize] != Some(instrument_index) {
                events.push(ImsEvent::new(
                    EventKind::Instrument,
                    channel,
                    vec![instrument_index as u8],
                    tick,
                    *order,
                ));
                *order += 1;
                channel_instruments[channel as usize] = Some(instrument_index);
            }
            events.push(ImsEvent::new(
                EventKind::NoteOnCond,
                channel,
                vec![note, 127],
                tick,
                *order,
            ));
            *order += 1;
        }
        OplEvent::NoteOff { channel, note } => {
            events.push(ImsEvent::new(
                EventKind::NoteOnCond,
                channel,
                vec![note, 0],
                tick,
                *order,
            ));
            *order += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vgm_with_commands(body: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x40];
        bytes[0..4].copy_from_slice(b"Vgm ");
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn minimal_vgm_produces_header_only_ims_and_empty_bnk() {
        let vgm = vgm_with_commands(&[0x66]);
        let options = TranscodeOptions {
            song_name: String::new(),
            tempo: 120,
        };
        let output = transcode(&vgm, &options).unwrap();
        assert_eq!(output.instrument_count, 0);
        assert_eq!(output.event_count, 0);
        assert_eq!(output.bnk_bytes.len(), 20);

        let ims = ims::read(&output.ims_bytes).unwrap();
        assert_eq!(ims.byte_size, 1);
        assert_eq!(ims.basic_tempo, 120);
        assert_eq!(ims.d_mode, 0);
    }

    #[test]
    fn single_note_emits_instrument_change_then_note_on_then_note_off() {
        let vgm = vgm_with_commands(&[
            0x5A, 0xA0, 0x72, // fnum low
            0x5A, 0xB0, 0x2E, // key on, block 3, fnum high 2
            0x61, 0x44, 0xAC, // wait 44100
            0x5A, 0xB0, 0x0E, // key off
            0x66,
        ]);
        let options = TranscodeOptions {
            song_name: String::new(),
            tempo: 120,
        };
        let output = transcode(&vgm, &options).unwrap();
        assert_eq!(output.instrument_count, 1);
        assert_eq!(output.event_count, 3);
    }

    #[test]
    fn rhythm_write_sets_percussion_mode_in_header() {
        let vgm = vgm_with_commands(&[0x5A, 0xBD, 0x20, 0x66]);
        let options = TranscodeOptions::default();
        let output = transcode(&vgm, &options).unwrap();
        let ims = ims::read(&output.ims_bytes).unwrap();
        assert_eq!(ims.d_mode, 1);
    }

    #[test]
    fn identical_patch_on_two_channels_shares_one_instrument() {
        let vgm = vgm_with_commands(&[
            0x5A, 0xB0, 0x20, // channel 0 key on
            0x5A, 0xB1, 0x20, // channel 1 key on, same default patch
            0x66,
        ]);
        let output = transcode(&vgm, &TranscodeOptions::default()).unwrap();
        assert_eq!(output.instrument_count, 1);
    }
}
