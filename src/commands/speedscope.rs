//! Speedscope command: convert one profile to speedscope JSON.

use super::models::SpeedscopeArgs;
use crate::output::{read_profile, write_json};
use crate::parser::ProfileInterface;
use anyhow::{Context, Result};
use log::info;

/// Execute the speedscope command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Profile file unreadable or not a profile
/// * Profile references stacks or frames it does not have
/// * Output file write errors
pub fn execute_speedscope(args: SpeedscopeArgs) -> Result<()> {
    let profile = read_profile(&args.file)
        .with_context(|| format!("Failed to read profile {}", args.file.display()))?;

    let output = profile
        .speedscope()
        .with_context(|| format!("Failed to build call trees for profile {}", profile.id()))?;

    write_json(&output, &args.output, false).context("Failed to write speedscope JSON")?;

    info!(
        "✓ Speedscope for {} ({} threads) written to: {}",
        profile.id(),
        output.profiles.len(),
        args.output.display()
    );

    Ok(())
}
