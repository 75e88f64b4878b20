//! CLI front end for the VGM-to-IMS/BNK transcoder.
//!
//! Argument parsing, file I/O, and exit codes live here; everything
//! about the actual format semantics lives in `opl_transcoder`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use opl_transcoder::{transcode, TranscodeOptions};

/// Convert a YM3812 (OPL2) VGM register log into an IMS event stream and
/// a companion BNK instrument bank.
#[derive(Debug, Parser)]
#[command(name = "vgm-to-ims", version)]
struct Args {
    /// Input VGM file.
    input: PathBuf,

    /// Output IMS path. Defaults to the input path with its extension
    /// replaced by `.ims`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Playback tempo in BPM, 1..=255.
    #[arg(long, default_value_t = 120, value_parser = parse_tempo)]
    tempo: u8,

    /// Song name embedded in the IMS header (truncated to 30 bytes).
    #[arg(long)]
    name: Option<String>,
}

fn parse_tempo(s: &str) -> Result<u8, String> {
    let value: u32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (1..=255).contains(&value) {
        Ok(value as u8)
    } else {
        Err(format!("tempo must be in 1..=255, got {value}"))
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let vgm_bytes = fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let ims_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let bnk_path = bnk_path_for(&ims_path);

    let song_name = args
        .name
        .clone()
        .unwrap_or_else(|| default_song_name(&args.input));

    let options = TranscodeOptions {
        song_name,
        tempo: args.tempo,
    };

    let output = transcode(&vgm_bytes, &options)
        .map_err(|e| anyhow::anyhow!("conversion failed: {e}"))?;

    fs::write(&ims_path, &output.ims_bytes)
        .with_context(|| format!("writing {}", ims_path.display()))?;
    fs::write(&bnk_path, &output.bnk_bytes)
        .with_context(|| format!("writing {}", bnk_path.display()))?;

    println!("{} + {}", ims_path.display(), bnk_path.display());
    println!("instruments: {}", output.instrument_count);
    println!("events: {}", output.event_count);

    if !output.warnings.is_empty() {
        for warning in &output.warnings {
            eprintln!("warning: {warning:?}");
        }
    }

    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut combined = strip_vgm_extension(input);
    combined.push(".ims");
    input.with_file_name(combined)
}

/// Strip a trailing `.vgm` (case-insensitive) off the input's file name,
/// leaving any other dots in the basename (e.g. `my.song.vgm`) untouched.
fn strip_vgm_extension(input: &Path) -> std::ffi::OsString {
    let name = input.file_name().unwrap_or_default().to_string_lossy().into_owned();
    // Compare a lower-cased copy (same byte length as `name`, since ASCII
    // case-folding never changes a multi-byte char's encoding) so the
    // suffix match never requires probing a byte offset that isn't a
    // UTF-8 char boundary in `name`.
    if name.to_ascii_lowercase().ends_with(".vgm") {
        std::ffi::OsString::from(&name[..name.len() - 4])
    } else {
        std::ffi::OsString::from(name)
    }
}

fn bnk_path_for(ims_path: &Path) -> PathBuf {
    match ims_path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("ims") => ims_path.with_extension("bnk"),
        _ => {
            let mut combined = ims_path.as_os_str().to_owned();
            combined.push(".bnk");
            PathBuf::from(combined)
        }
    }
}

fn default_song_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
