use crate::output::read_profile;
use crate::parser::{Metadata, ProfileInterface};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a profile JSON file
pub fn validate_profile_file(file_path: PathBuf) -> Result<()> {
    println!("Validating profile: {}", file_path.display());

    let profile = read_profile(&file_path)?;
    let call_trees = profile
        .call_trees()
        .context("Profile references stacks or frames it does not contain")?;

    println!("✓ Valid profile JSON");
    println!("  Format: {}", profile.format_name());
    for line in metadata_lines(&profile.metadata()) {
        println!("  {}", line);
    }
    println!("  Threads: {}", call_trees.len());
    println!("  Storage Path: {}", profile.storage_path());

    Ok(())
}

/// Render profile metadata as `Label: value` lines, skipping unset fields
pub fn metadata_lines(metadata: &Metadata) -> Vec<String> {
    let mut lines = vec![
        format!("Profile: {}", metadata.id),
        format!("Platform: {}", metadata.platform),
    ];

    if let Some(transaction) = &metadata.transaction_name {
        lines.push(format!("Transaction: {}", transaction));
    }
    if let Some(release) = &metadata.release {
        lines.push(format!("Release: {}", release));
    }
    if let Some(environment) = &metadata.environment {
        lines.push(format!("Environment: {}", environment));
    }
    if let Some(timestamp) = metadata.timestamp {
        lines.push(format!("Timestamp: {}", timestamp.to_rfc3339()));
    }
    if let Some(received) = metadata.received {
        lines.push(format!("Received: {}", received.to_rfc3339()));
    }

    lines.push(format!("Samples: {}", metadata.sample_count));
    lines.push(format!("Duration: {} ns", metadata.duration_ns));
    lines
}

/// Display version information
pub fn display_version() {
    println!("sampletree v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Call tree, flamegraph and speedscope generation for sampled profiles.");
}
