//! sampletree CLI
//!
//! Builds call trees, speedscope documents and aggregated flamegraphs
//! from sampled profile JSON files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use sampletree::commands::{
    display_version, execute_calltree, execute_flamegraph, execute_speedscope, validate_args,
    validate_profile_file, CalltreeArgs, FlamegraphArgs, SpeedscopeArgs,
};
use sampletree::flamegraph::FlamegraphConfig;
use sampletree::utils::config::DEFAULT_FLAMEGRAPH_WIDTH;

/// sampletree - call trees and flamegraphs for sampled profiles
#[derive(Parser, Debug)]
#[command(name = "sampletree")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the call trees of one profile
    Calltree {
        /// Path to profile JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Collapse trees before printing
        #[arg(long)]
        collapse: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert one profile to speedscope JSON
    Speedscope {
        /// Path to profile JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Output path for speedscope JSON
        #[arg(short, long, default_value = "speedscope.json")]
        output: PathBuf,
    },

    /// Merge several profiles into one flamegraph
    Flamegraph {
        /// Profile JSON files, merged in order
        #[arg(long, num_args = 1.., required = true)]
        files: Vec<PathBuf>,

        /// Output path for speedscope JSON
        #[arg(short, long, env = "SAMPLETREE_OUTPUT", default_value = "flamegraph.json")]
        output: PathBuf,

        /// Merge raw call trees without collapsing them first
        #[arg(long)]
        no_collapse: bool,

        /// Output path for SVG flamegraph (optional)
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Flamegraph title
        #[arg(long)]
        title: Option<String>,

        /// Flamegraph width in pixels
        #[arg(long, default_value_t = DEFAULT_FLAMEGRAPH_WIDTH)]
        width: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a profile JSON file
    Validate {
        /// Path to profile JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Calltree {
            file,
            collapse,
            output,
        } => {
            execute_calltree(CalltreeArgs {
                file,
                collapse,
                output,
            })?;
        }

        Commands::Speedscope { file, output } => {
            execute_speedscope(SpeedscopeArgs { file, output })?;
        }

        Commands::Flamegraph {
            files,
            output,
            no_collapse,
            svg,
            title,
            width,
            summary,
        } => {
            let mut config = FlamegraphConfig::new().with_collapse(!no_collapse);
            if let Some(title_str) = title {
                config = config.with_title(title_str);
            }
            config.width = width;

            let args = FlamegraphArgs {
                files,
                output,
                output_svg: svg,
                config,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_flamegraph(args)?;
        }

        Commands::Validate { file } => {
            validate_profile_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
