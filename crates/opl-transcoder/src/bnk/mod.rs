//! AdLib Instrument Bank encoding and its read-side contract.

pub mod encoder;
pub mod reader;

pub use encoder::encode;
pub use reader::{read, BnkFile, DirectoryEntry, ReadError};
