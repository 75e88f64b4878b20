//! Extracted-instrument interning.
//!
//! A hash map keyed directly on the fixed-size patch bytes, with a
//! parallel vector holding the interned instruments in insertion order
//! (their order *is* their id, so no separate id allocator is needed).

use std::collections::HashMap;

use crate::error::TranscodeError;

/// Width of a BNK instrument patch.
pub const PARAMS_LEN: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub id: u16,
    pub name: String,
    pub params: [u8; PARAMS_LEN],
    /// Human-readable hex digest of `params`, for debugging/display only;
    /// instrument identity is decided by `params` equality, not this field.
    pub hash: String,
}

/// Interns 28-byte instrument patches, deduplicating byte-identical ones.
#[derive(Debug, Clone, Default)]
pub struct InstrumentTable {
    by_params: HashMap<[u8; PARAMS_LEN], u16>,
    instruments: Vec<Instrument>,
}

impl InstrumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `params`, returning the existing index if an identical patch
    /// was already seen, or appending a new entry otherwise.
    pub fn intern(&mut self, params: [u8; PARAMS_LEN]) -> Result<u16, TranscodeError> {
        if let Some(&id) = self.by_params.get(&params) {
            return Ok(id);
        }

        let id = self.instruments.len();
        let id: u16 = id
            .try_into()
            .map_err(|_| TranscodeError::InstrumentOverflow)?;

        let name = format!("inst_{:02}", id);
        if self.instruments.iter().any(|ins| ins.name == name) {
            return Err(TranscodeError::NameCollision { name });
        }

        let hash = hex_digest(&params);
        self.instruments.push(Instrument {
            id,
            name,
            params,
            hash,
        });
        self.by_params.insert(params, id);
        Ok(id)
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

fn hex_digest(params: &[u8; PARAMS_LEN]) -> String {
    let mut s = String::with_capacity(PARAMS_LEN * 2);
    for b in params {
        s.push_str(&format!("{b:02x}"));
    }
    s
}
