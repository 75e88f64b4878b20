//! VGM command-stream decoder.
//!
//! Walks the heterogeneous, variable-width opcode stream starting at the
//! header's data offset, emitting `VgmCommand::{Write,Wait,End}` records
//! with the sample clock resolved to an absolute, monotone `u64`.

use std::fmt;

use crate::binutil::{read_slice, read_u16_le_at, read_u32_le_at, read_u8_at};
use crate::vgm::command::{VgmCommand, Warning};
use crate::vgm::header::{VgmHeader, VGM_MAGIC};

/// Errors `parse` can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VgmError {
    /// The 4-byte ident at offset 0 was not `"Vgm "`.
    InvalidMagic,
    /// An opcode read past the end of the buffer.
    Truncated { context: &'static str },
    /// A `0x67` data-block command did not carry the expected `0x66`
    /// compatibility marker byte.
    UnknownDataBlock { offset: usize },
}

impl fmt::Display for VgmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VgmError::InvalidMagic => write!(f, "not a VGM file (bad magic at offset 0)"),
            VgmError::Truncated { context } => write!(f, "truncated VGM input: {context}"),
            VgmError::UnknownDataBlock { offset } => {
                write!(f, "unrecognized data block at offset 0x{offset:X}")
            }
        }
    }
}

impl std::error::Error for VgmError {}

/// Parse a full VGM byte buffer into its header and command stream.
pub fn parse(bytes: &[u8]) -> Result<(VgmHeader, Vec<VgmCommand>, Vec<Warning>), VgmError> {
    if bytes.len() < 4 || bytes[0..4] != VGM_MAGIC {
        return Err(VgmError::InvalidMagic);
    }

    let (header, clock_present) =
        VgmHeader::parse(bytes).map_err(|_| VgmError::Truncated { context: "header" })?;

    let mut warnings = Vec::new();
    if !clock_present {
        warnings.push(Warning::MissingYm3812Clock);
    }

    let commands = decode_commands(bytes, &header)?;
    Ok((header, commands, warnings))
}

fn decode_commands(bytes: &[u8], header: &VgmHeader) -> Result<Vec<VgmCommand>, VgmError> {
    let mut commands = Vec::new();
    let mut off = header.data_start;
    let mut clock: u64 = 0;

    while off < bytes.len() {
        if let Some(gd3_start) = header.gd3_start {
            if off >= gd3_start {
                break;
            }
        }

        let opcode = read_u8_at(bytes, off).map_err(|_| VgmError::Truncated { context: "opcode" })?;
        off += 1;

        match opcode {
            0x5A => {
                let pair = read_slice(bytes, off, 2)
                    .map_err(|_| VgmError::Truncated { context: "0x5A write operands" })?;
                commands.push(VgmCommand::Write {
                    register: pair[0],
                    value: pair[1],
                    abs_sample: clock,
                });
                off += 2;
            }
            0x61 => {
                let n = read_u16_le_at(bytes, off)
                    .map_err(|_| VgmError::Truncated { context: "0x61 wait operand" })?;
                off += 2;
                clock += n as u64;
                commands.push(VgmCommand::Wait {
                    samples: n as u32,
                    abs_sample: clock,
                });
            }
            0x62 => {
                clock += 735;
                commands.push(VgmCommand::Wait { samples: 735, abs_sample: clock });
            }
            0x63 => {
                clock += 882;
                commands.push(VgmCommand::Wait { samples: 882, abs_sample: clock });
            }
            0x66 => {
                commands.push(VgmCommand::End { abs_sample: clock });
                break;
            }
            0x70..=0x7F => {
                let n = ((opcode & 0x0F) + 1) as u32;
                clock += n as u64;
                commands.push(VgmCommand::Wait { samples: n, abs_sample: clock });
            }
            0x4F | 0x50 => {
                off += 1;
                check_available(bytes, off)?;
            }
            0x51..=0x5F => {
                // 0x5A is handled above; every other opcode in this range
                // takes a 2-byte (reg, val) pair that we do not care about.
                off += 2;
                check_available(bytes, off)?;
            }
            0x67 => {
                off = skip_data_block(bytes, off)?;
            }
            0x80..=0x8F => {
                let n = (opcode & 0x0F) as u32;
                clock += n as u64;
                commands.push(VgmCommand::Wait { samples: n, abs_sample: clock });
            }
            0xE0 => {
                off += 4;
                check_available(bytes, off)?;
            }
            _ => {
                // Unknown opcode: best-effort, no operand bytes consumed.
            }
        }
    }

    Ok(commands)
}

/// Skip a `0x67` data block: `0x66 tt ss(u32) data[ss]`, `off` pointing just
/// past the `0x67` opcode byte. Returns the offset just past the block.
fn skip_data_block(bytes: &[u8], off: usize) -> Result<usize, VgmError> {
    let marker = read_u8_at(bytes, off).map_err(|_| VgmError::Truncated { context: "data block marker" })?;
    if marker != 0x66 {
        return Err(VgmError::UnknownDataBlock { offset: off });
    }
    let _data_type = read_u8_at(bytes, off + 1)
        .map_err(|_| VgmError::Truncated { context: "data block type" })?;
    let size = read_u32_le_at(bytes, off + 2)
        .map_err(|_| VgmError::Truncated { context: "data block size" })? as usize;
    let end = off + 2 + 4 + size;
    check_available(bytes, end)?;
    Ok(end)
}

fn check_available(bytes: &[u8], off: usize) -> Result<(), VgmError> {
    if off > bytes.len() {
        Err(VgmError::Truncated { context: "opcode operand" })
    } else {
        Ok(())
    }
}
