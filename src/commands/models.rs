use crate::flamegraph::FlamegraphConfig;
use std::path::PathBuf;

/// Arguments for the calltree command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct CalltreeArgs {
    /// Profile JSON file
    pub file: PathBuf,

    /// Collapse every thread's forest before printing
    pub collapse: bool,

    /// Write to this file instead of stdout
    pub output: Option<PathBuf>,
}

/// Arguments for the speedscope command
#[derive(Debug, Clone)]
pub struct SpeedscopeArgs {
    pub file: PathBuf,
    pub output: PathBuf,
}

impl Default for SpeedscopeArgs {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            output: PathBuf::from("speedscope.json"),
        }
    }
}

/// Arguments for the flamegraph command
#[derive(Debug, Clone)]
pub struct FlamegraphArgs {
    /// Profile files, merged in this order
    pub files: Vec<PathBuf>,

    /// Output path for the merged speedscope JSON
    pub output: PathBuf,

    /// Output path for an SVG rendering (optional)
    pub output_svg: Option<PathBuf>,

    /// Collapse toggle plus SVG title and width
    pub config: FlamegraphConfig,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for FlamegraphArgs {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            output: PathBuf::from("flamegraph.json"),
            output_svg: None,
            config: FlamegraphConfig::default(),
            print_summary: false,
        }
    }
}
