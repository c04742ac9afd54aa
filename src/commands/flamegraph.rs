//! Flamegraph command implementation.
//!
//! The flamegraph command:
//! 1. Reads every profile file, in argument order
//! 2. Builds and (optionally) collapses each main-thread call tree
//! 3. Merges them into one flamegraph
//! 4. Writes speedscope JSON, and SVG if requested

use super::models::FlamegraphArgs;
use crate::flamegraph::{generate_text_summary, render_svg, Flamegraph, FlamegraphAggregator};
use crate::output::{encode_flamegraph, read_profile, write_json, write_svg};
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;

/// Merge the profile files named in `args`
///
/// A file that cannot be read or parsed is listed as a failed profile
/// under its file stem and contributes no samples.
pub fn aggregate_files(args: &FlamegraphArgs) -> Flamegraph {
    let mut aggregator = FlamegraphAggregator::new();

    for path in &args.files {
        match read_profile(path) {
            Ok(profile) => aggregator.add_profile(&profile, args.config.collapse),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                aggregator.add_failed_profile(file_stem(path));
            }
        }
    }

    aggregator.finish()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Validate flamegraph arguments
pub fn validate_args(args: &FlamegraphArgs) -> Result<()> {
    if args.files.is_empty() {
        anyhow::bail!("At least one profile file is required");
    }

    if args.config.width == 0 {
        anyhow::bail!("Flamegraph width must be greater than 0");
    }

    Ok(())
}

/// Execute the flamegraph command
///
/// **Public** - main entry point called from main.rs
pub fn execute_flamegraph(args: FlamegraphArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Merging {} profiles", args.files.len());
    let flamegraph = aggregate_files(&args);

    if flamegraph.failed_profiles.len() == flamegraph.profile_ids.len() {
        warn!("No profile could be read; the flamegraph is empty");
    }

    write_json(&encode_flamegraph(&flamegraph), &args.output, false)
        .context("Failed to write flamegraph JSON")?;
    info!("✓ Flamegraph written to: {}", args.output.display());

    if let Some(svg_path) = &args.output_svg {
        let svg = render_svg(&flamegraph, &args.config).context("Failed to render flamegraph")?;
        write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
        info!("✓ SVG written to: {}", svg_path.display());
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("FLAMEGRAPH SUMMARY");
        println!("{}", "=".repeat(80));
        println!("{}", generate_text_summary(&flamegraph, 10));
        println!("{}", "=".repeat(80));
    }

    info!(
        "Flamegraph completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_args_requires_files() {
        assert!(validate_args(&FlamegraphArgs::default()).is_err());
    }

    #[test]
    fn test_validate_args_rejects_zero_width() {
        let mut args = FlamegraphArgs {
            files: vec![PathBuf::from("a.json")],
            ..Default::default()
        };
        args.config.width = 0;
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_unreadable_file_is_failed_profile() {
        let args = FlamegraphArgs {
            files: vec![PathBuf::from("/nonexistent/4f2a.json")],
            ..Default::default()
        };

        let flamegraph = aggregate_files(&args);
        assert_eq!(flamegraph.profile_ids, vec!["4f2a"]);
        assert_eq!(flamegraph.failed_profiles, vec![0]);
        assert!(flamegraph.samples.is_empty());
        assert_eq!(flamegraph.end_value, 0);
    }
}
