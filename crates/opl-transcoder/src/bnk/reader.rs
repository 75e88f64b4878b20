//! Read-side BNK contract: header parse + case-insensitive binary search
//! over the directory, for round-trip tests only.

use std::fmt;

use crate::binutil::{read_slice, read_u16_le_at, read_u32_le_at, OffsetOutOfRange};
use crate::opl2::instrument::PARAMS_LEN;

mod offset {
    pub const INS_MAX_NUM: usize = 8;
    pub const INS_LIST_OFF: usize = 12;
    pub const INS_DATA_OFF: usize = 16;
}

const DIRECTORY_ENTRY_LEN: usize = 12;
const NAME_FIELD_LEN: usize = 9;
const DATA_ENTRY_LEN: usize = 2 + PARAMS_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    Truncated(OffsetOutOfRange),
    NotFound,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Truncated(e) => write!(f, "truncated BNK input: {e}"),
            ReadError::NotFound => write!(f, "instrument name not found in directory"),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<OffsetOutOfRange> for ReadError {
    fn from(e: OffsetOutOfRange) -> Self {
        ReadError::Truncated(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub ins_index: u16,
    pub name: String,
}

pub struct BnkFile<'a> {
    bytes: &'a [u8],
    pub directory: Vec<DirectoryEntry>,
    data_off: usize,
}

pub fn read(bytes: &[u8]) -> Result<BnkFile<'_>, ReadError> {
    let ins_max_num = read_u16_le_at(bytes, offset::INS_MAX_NUM)?;
    let list_off = read_u32_le_at(bytes, offset::INS_LIST_OFF)? as usize;
    let data_off = read_u32_le_at(bytes, offset::INS_DATA_OFF)? as usize;

    let mut directory = Vec::with_capacity(ins_max_num as usize);
    for i in 0..ins_max_num as usize {
        let entry_off = list_off + i * DIRECTORY_ENTRY_LEN;
        let ins_index = read_u16_le_at(bytes, entry_off)?;
        let name_bytes = read_slice(bytes, entry_off + 3, NAME_FIELD_LEN)?;
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        let name = String::from_utf8_lossy(&name_bytes[..end]).into_owned();
        directory.push(DirectoryEntry { ins_index, name });
    }

    Ok(BnkFile { bytes, directory, data_off })
}

impl<'a> BnkFile<'a> {
    /// Case-insensitive binary search over the (pre-sorted) directory.
    pub fn find(&self, name: &str) -> Result<&DirectoryEntry, ReadError> {
        let needle = name.to_lowercase();
        self.directory
            .binary_search_by(|entry| entry.name.to_lowercase().cmp(&needle))
            .map(|i| &self.directory[i])
            .map_err(|_| ReadError::NotFound)
    }

    /// Load the 28-byte patch for a directory entry's instrument index.
    pub fn load_patch(&self, ins_index: u16) -> Result<[u8; PARAMS_LEN], ReadError> {
        let entry_off = self.data_off + ins_index as usize * DATA_ENTRY_LEN + 2;
        let slice = read_slice(self.bytes, entry_off, PARAMS_LEN)?;
        let mut params = [0u8; PARAMS_LEN];
        params.copy_from_slice(slice);
        Ok(params)
    }
}
