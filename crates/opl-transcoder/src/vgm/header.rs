//! VGM header fields this transcoder actually consumes.
//!
//! A general-purpose VGM reader models the full ~90-field header (every
//! chip clock the format has ever defined) so it can round-trip arbitrary
//! VGM files. This transcoder only ever reads YM3812 logs, so `VgmHeader`
//! is trimmed to the fields it actually uses; unused clock slots would
//! just be dead weight here.

use crate::binutil::{read_u32_le_at, OffsetOutOfRange};

/// Offset, within the VGM header, of each field this crate reads.
mod offset {
    pub const IDENT: usize = 0x00;
    pub const EOF: usize = 0x04;
    pub const VERSION: usize = 0x08;
    pub const GD3: usize = 0x14;
    pub const TOTAL_SAMPLES: usize = 0x18;
    pub const LOOP_OFFSET: usize = 0x1C;
    pub const LOOP_SAMPLES: usize = 0x20;
    pub const DATA_OFFSET: usize = 0x34;
    pub const YM3812_CLOCK: usize = 0x50;
}

/// VGM v1.00+ magic identifier.
pub const VGM_MAGIC: [u8; 4] = *b"Vgm ";

/// Legacy data-start offset used when the header's `data_offset` field is
/// zero (VGM v1.00 had no such field).
const LEGACY_DATA_START: usize = 0x40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgmHeader {
    pub eof_offset: u32,
    pub version: u32,
    pub gd3_offset: u32,
    pub total_samples: u32,
    pub loop_offset: u32,
    pub loop_samples: u32,
    pub ym3812_clock: u32,
    /// Absolute byte offset of the first command opcode.
    pub data_start: usize,
    /// Absolute byte offset of the GD3 tag, if any (`gd3_offset != 0`).
    pub gd3_start: Option<usize>,
}

impl VgmHeader {
    /// Parse the fields this crate cares about out of a VGM header.
    ///
    /// Returns the header and whether the YM3812-clock field (offset
    /// 0x54) was present; a missing field is not fatal, the clock is
    /// simply taken as 0 and the caller decides whether to surface a
    /// warning.
    pub(crate) fn parse(bytes: &[u8]) -> Result<(VgmHeader, bool), OffsetOutOfRange> {
        let ident = bytes.get(offset::IDENT..offset::IDENT + 4);
        // Ident mismatch is handled by the caller (it maps to
        // `VgmError::InvalidMagic`, a distinct error from a short buffer).
        let eof_offset = read_u32_le_at(bytes, offset::EOF).unwrap_or(0);
        let version = read_u32_le_at(bytes, offset::VERSION).unwrap_or(0);
        let gd3_offset = read_u32_le_at(bytes, offset::GD3).unwrap_or(0);
        let total_samples = read_u32_le_at(bytes, offset::TOTAL_SAMPLES).unwrap_or(0);
        let loop_offset = read_u32_le_at(bytes, offset::LOOP_OFFSET).unwrap_or(0);
        let loop_samples = read_u32_le_at(bytes, offset::LOOP_SAMPLES).unwrap_or(0);

        let relative_data_offset = read_u32_le_at(bytes, offset::DATA_OFFSET).unwrap_or(0);
        let data_start = if relative_data_offset == 0 {
            LEGACY_DATA_START
        } else {
            offset::DATA_OFFSET + relative_data_offset as usize
        };

        let (ym3812_clock, clock_present) = match read_u32_le_at(bytes, offset::YM3812_CLOCK) {
            Ok(v) => (v, true),
            Err(_) => (0, false),
        };

        let gd3_start = (gd3_offset != 0).then(|| offset::GD3 + gd3_offset as usize);

        let _ = ident; // magic is validated by the caller, not here.

        Ok((
            VgmHeader {
                eof_offset,
                version,
                gd3_offset,
                total_samples,
                loop_offset,
                loop_samples,
                ym3812_clock,
                data_start,
                gd3_start,
            },
            clock_present,
        ))
    }
}
