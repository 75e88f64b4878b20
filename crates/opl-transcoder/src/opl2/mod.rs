//! YM3812 (OPL2) register shadow-state tracking.

pub mod event;
pub mod instrument;
pub mod pitch;
pub mod state;

pub use event::OplEvent;
pub use instrument::{Instrument, InstrumentTable, PARAMS_LEN};
pub use pitch::{midi_note, nearest_note, FREQ_NUMS};
pub use state::{Channel, Operator, Opl2State, CHANNELS};
