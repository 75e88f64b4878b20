//! IMS event-stream encoding and its read-side contract.

pub mod delta;
pub mod encoder;
pub mod event;
pub mod reader;

pub use delta::{decode_delta, encode_delta};
pub use encoder::encode;
pub use event::{sort_events, EventKind, ImsEvent};
pub use reader::{read, DecodedEvent, ImsFile, ReadError};
