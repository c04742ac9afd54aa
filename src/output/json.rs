//! JSON output writer and profile reader.
//!
//! Speedscope documents and call-tree dumps are written compact by
//! default; `pretty` is for files meant to be read by people.

use crate::parser::{Profile, ProfileInterface};
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write any serializable value to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `value` - Data to write
/// * `output_path` - Path to output JSON file
/// * `pretty` - Indent the output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_json<T: Serialize>(
    value: &T,
    output_path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing JSON to: {}", output_path.display());

    super::validate_path(output_path)?;
    super::create_parent_dirs(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush().map_err(OutputError::WriteFailed)?;

    info!(
        "JSON written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a profile in either supported format
///
/// **Public** - used by every command that takes a profile file
///
/// # Errors
/// * `OutputError::ReadFailed` - File cannot be read
/// * `OutputError::InvalidProfile` - JSON is not a recognizable profile
pub fn read_profile(input_path: impl AsRef<Path>) -> Result<Profile, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading profile from: {}", input_path.display());

    let bytes = std::fs::read(input_path).map_err(OutputError::ReadFailed)?;
    let mut profile = Profile::from_slice(&bytes)?;
    profile.normalize();

    debug!(
        "Profile loaded: {} ({} format, {} samples)",
        profile.id(),
        profile.format_name(),
        profile.sample_count()
    );

    Ok(profile)
}
