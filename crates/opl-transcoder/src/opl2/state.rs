//! YM3812 (OPL2) shadow-register tracker.
//!
//! This is a plain-old-data model of the chip: 9 channels, 2 operators
//! each, no dynamic dispatch, no generic register-storage abstraction.
//! One chip with one fixed layout is better served by fixed arrays than by
//! a multi-chip `ChipState`/`RegisterStorage` trait hierarchy built to
//! cover chips this transcoder never touches.

use crate::opl2::event::OplEvent;
use crate::opl2::instrument::{InstrumentTable, Instrument, PARAMS_LEN};
use crate::opl2::pitch::midi_note;
use crate::error::TranscodeError;

/// Number of melodic channels on a YM3812.
pub const CHANNELS: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operator {
    pub am: bool,
    pub vib: bool,
    pub egt: bool,
    pub ksr: bool,
    pub mult: u8,
    pub ksl: u8,
    pub level: u8,
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    pub waveform: u8,
}

impl Operator {
    fn new() -> Self {
        Operator {
            level: 63,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub fnum: u16,
    pub block: u8,
    pub key_on: bool,
    pub feedback: u8,
    /// 0 = FM, 1 = AM (register `0xC0..0xC8`).
    pub connection: u8,
    pub operators: [Operator; 2],
}

impl Channel {
    fn new() -> Self {
        Channel {
            fnum: 0,
            block: 0,
            key_on: false,
            feedback: 0,
            connection: 0,
            operators: [Operator::new(), Operator::new()],
        }
    }
}

/// Maps a valid OPL2 register offset (within `0x20..=0x35` etc.) to its
/// `(channel, operator)` slot. Offsets outside the 18 physical slots
/// return `None` and are silently ignored by every caller.
fn slot_for_offset(offset: u8) -> Option<(usize, usize)> {
    match offset {
        0 => Some((0, 0)),
        1 => Some((1, 0)),
        2 => Some((2, 0)),
        3 => Some((0, 1)),
        4 => Some((1, 1)),
        5 => Some((2, 1)),
        8 => Some((3, 0)),
        9 => Some((4, 0)),
        10 => Some((5, 0)),
        11 => Some((3, 1)),
        12 => Some((4, 1)),
        13 => Some((5, 1)),
        16 => Some((6, 0)),
        17 => Some((7, 0)),
        18 => Some((8, 0)),
        19 => Some((6, 1)),
        20 => Some((7, 1)),
        21 => Some((8, 1)),
        _ => None,
    }
}

/// Shadow state of a single YM3812 chip instance.
#[derive(Debug, Clone)]
pub struct Opl2State {
    channels: [Channel; CHANNELS],
    percussion_mode: bool,
    instruments: InstrumentTable,
}

impl Opl2State {
    pub fn new() -> Self {
        Opl2State {
            channels: std::array::from_fn(|_| Channel::new()),
            percussion_mode: false,
            instruments: InstrumentTable::new(),
        }
    }

    pub fn percussion_mode(&self) -> bool {
        self.percussion_mode
    }

    pub fn instruments(&self) -> &[Instrument] {
        self.instruments.instruments()
    }

    /// Consume the tracker, handing ownership of the interned instrument
    /// table to the caller (the transcoder facade, to pass on to C5).
    pub fn take_instruments(self) -> Vec<Instrument> {
        self.instruments.instruments().to_vec()
    }

    /// Advance shadow state for a single register write, returning a
    /// lifted event if the write triggered one.
    pub fn on_write(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<Option<OplEvent>, TranscodeError> {
        match register {
            0xBD => {
                self.percussion_mode = (value & 0x20) != 0;
                Ok(None)
            }
            0xB0..=0xB8 => self.handle_key_on(register - 0xB0, value),
            0xA0..=0xA8 => {
                let ch = (register - 0xA0) as usize;
                self.channels[ch].fnum = (self.channels[ch].fnum & 0x300) | value as u16;
                Ok(None)
            }
            0xC0..=0xC8 => {
                let ch = (register - 0xC0) as usize;
                self.channels[ch].feedback = (value >> 1) & 0x07;
                self.channels[ch].connection = value & 0x01;
                Ok(None)
            }
            0x20..=0x35 => {
                if let Some((ch, op)) = slot_for_offset(register - 0x20) {
                    let o = &mut self.channels[ch].operators[op];
                    o.am = (value & 0x80) != 0;
                    o.vib = (value & 0x40) != 0;
                    o.egt = (value & 0x20) != 0;
                    o.ksr = (value & 0x10) != 0;
                    o.mult = value & 0x0F;
                }
                Ok(None)
            }
            0x40..=0x55 => {
                if let Some((ch, op)) = slot_for_offset(register - 0x40) {
                    let o = &mut self.channels[ch].operators[op];
                    o.ksl = (value >> 6) & 0x03;
                    o.level = value & 0x3F;
                }
                Ok(None)
            }
            0x60..=0x75 => {
                if let Some((ch, op)) = slot_for_offset(register - 0x60) {
                    let o = &mut self.channels[ch].operators[op];
                    o.attack = (value >> 4) & 0x0F;
                    o.decay = value & 0x0F;
                }
                Ok(None)
            }
            0x80..=0x95 => {
                if let Some((ch, op)) = slot_for_offset(register - 0x80) {
                    let o = &mut self.channels[ch].operators[op];
                    o.sustain = (value >> 4) & 0x0F;
                    o.release = value & 0x0F;
                }
                Ok(None)
            }
            0xE0..=0xF5 => {
                if let Some((ch, op)) = slot_for_offset(register - 0xE0) {
                    self.channels[ch].operators[op].waveform = value & 0x03;
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn handle_key_on(
        &mut self,
        channel: u8,
        value: u8,
    ) -> Result<Option<OplEvent>, TranscodeError> {
        let ch = channel as usize;
        let prev_key_on = self.channels[ch].key_on;
        let new_key_on = (value & 0x20) != 0;

        self.channels[ch].block = (value >> 2) & 0x07;
        self.channels[ch].fnum =
            (self.channels[ch].fnum & 0x0FF) | (((value & 0x03) as u16) << 8);
        self.channels[ch].key_on = new_key_on;

        match (prev_key_on, new_key_on) {
            (false, true) => {
                let params = build_patch(&self.channels[ch]);
                let instrument_index = self.instruments.intern(params)?;
                let note = midi_note(self.channels[ch].block, self.channels[ch].fnum);
                Ok(Some(OplEvent::NoteOn {
                    channel,
                    note,
                    instrument_index,
                }))
            }
            (true, false) => {
                let note = midi_note(self.channels[ch].block, self.channels[ch].fnum);
                Ok(Some(OplEvent::NoteOff { channel, note }))
            }
            _ => Ok(None),
        }
    }
}

impl Default for Opl2State {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the 28-byte BNK instrument patch for a channel's current shadow
/// state.
fn build_patch(channel: &Channel) -> [u8; PARAMS_LEN] {
    let mut p = [0u8; PARAMS_LEN];
    let op0 = &channel.operators[0];
    let op1 = &channel.operators[1];

    p[0] = op0.ksl;
    p[1] = op0.mult;
    p[2] = channel.feedback;
    p[3] = op0.attack;
    p[4] = op0.sustain;
    p[5] = op0.egt as u8;
    p[6] = op0.decay;
    p[7] = op0.release;
    p[8] = op0.level;
    p[9] = op0.am as u8;
    p[10] = op0.vib as u8;
    p[11] = op0.ksr as u8;

    p[12] = 1 - channel.connection;

    p[13] = op1.ksl;
    p[14] = op1.mult;
    p[15] = 0;
    p[16] = op1.attack;
    p[17] = op1.sustain;
    p[18] = op1.egt as u8;
    p[19] = op1.decay;
    p[20] = op1.release;
    p[21] = op1.level;
    p[22] = op1.am as u8;
    p[23] = op1.vib as u8;
    p[24] = op1.ksr as u8;

    p[25] = 0;
    p[26] = op0.waveform;
    p[27] = op1.waveform;

    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_on_emits_note_on_with_pitch() {
        let mut state = Opl2State::new();
        state.on_write(0xA0, 0x72).unwrap();
        let event = state.on_write(0xB0, 0x2E).unwrap();
        match event {
            Some(OplEvent::NoteOn {
                channel,
                note,
                instrument_index,
            }) => {
                assert_eq!(channel, 0);
                assert_eq!(instrument_index, 0);
                // fnum = 0x272 = 626, nearest table entry is 611 (index 10)
                assert_eq!(note, 3 * 12 + 10 + 12);
            }
            other => panic!("expected NoteOn, got {other:?}"),
        }
    }

    #[test]
    fn key_off_emits_note_off() {
        let mut state = Opl2State::new();
        state.on_write(0xA0, 0x72).unwrap();
        state.on_write(0xB0, 0x2E).unwrap();
        let event = state.on_write(0xB0, 0x0E).unwrap();
        assert!(matches!(event, Some(OplEvent::NoteOff { channel: 0, .. })));
        assert!(!state.channels[0].key_on);
    }

    #[test]
    fn repeated_key_on_without_transition_emits_nothing() {
        let mut state = Opl2State::new();
        state.on_write(0xB0, 0x20).unwrap();
        let event = state.on_write(0xB0, 0x20).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn rhythm_register_sets_flag_without_event() {
        let mut state = Opl2State::new();
        assert!(!state.percussion_mode());
        let event = state.on_write(0xBD, 0x20).unwrap();
        assert!(event.is_none());
        assert!(state.percussion_mode());
    }

    #[test]
    fn invalid_slot_offsets_are_ignored() {
        let mut state = Opl2State::new();
        // 0x26 = 0x20 + 6: offset 6 is not one of the 18 valid slots.
        let event = state.on_write(0x26, 0xFF).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn connection_inversion_matches_spec() {
        let mut state = Opl2State::new();
        state.on_write(0xC0, 0x00).unwrap(); // connection = FM (0)
        state.on_write(0xB0, 0x20).unwrap(); // key on channel 0, note-on
        let params = state.instruments()[0].params;
        assert_eq!(params[12], 1);
        assert_eq!(params[25], 0);

        let mut state2 = Opl2State::new();
        state2.on_write(0xC0, 0x01).unwrap(); // connection = AM (1)
        state2.on_write(0xB0, 0x20).unwrap();
        let params2 = state2.instruments()[0].params;
        assert_eq!(params2[12], 0);
    }

    #[test]
    fn identical_patches_across_channels_share_one_instrument() {
        let mut state = Opl2State::new();
        state.on_write(0xB0, 0x20).unwrap(); // channel 0 note on, default patch
        state.on_write(0xB1, 0x20).unwrap(); // channel 1 note on, default patch
        assert_eq!(state.instruments().len(), 1);
    }
}
