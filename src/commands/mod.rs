//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the library components and own all stdout output.

pub mod calltree;
pub mod flamegraph;
pub mod models;
pub mod speedscope;
pub mod utils;

// Re-export main command functions
pub use calltree::execute_calltree;
pub use flamegraph::{execute_flamegraph, validate_args};
pub use models::{CalltreeArgs, FlamegraphArgs, SpeedscopeArgs};
pub use speedscope::execute_speedscope;
pub use utils::{display_version, validate_profile_file};
