//! Events lifted out of YM3812 shadow-state transitions.
//!
//! A multi-chip state tracker also reports tone changes while a key stays
//! on, for chips where pitch bends matter. This transcoder only ever
//! needs the two transitions the IMS format can express: a note starting
//! and a note stopping. Tone changes while a key is held are out of
//! scope.

/// An event lifted from a YM3812 register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OplEvent {
    /// A channel transitioned from key-off to key-on.
    NoteOn {
        channel: u8,
        note: u8,
        /// Index into the instrument table interned for this note's patch.
        instrument_index: u16,
    },
    /// A channel transitioned from key-on to key-off.
    NoteOff { channel: u8, note: u8 },
}
