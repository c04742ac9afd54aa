//! Configuration and constants for the CLI and the encoders.

/// Speedscope profile type emitted for every sampled profile
pub const SAMPLED_PROFILE_TYPE: &str = "sampled";

/// Speedscope unit: weights are sample counts, not time
pub const SAMPLED_PROFILE_UNIT: &str = "count";

/// Default flamegraph SVG title and width
pub const DEFAULT_FLAMEGRAPH_TITLE: &str = "Aggregated Flamegraph";
pub const DEFAULT_FLAMEGRAPH_WIDTH: usize = 1200;

/// Thread key used when a sample carries no thread id
pub const DEFAULT_THREAD_ID: u64 = 0;

// Image path prefixes that mark a frame as system code when the profile
// does not say whether it is application code.
pub const SYSTEM_IMAGE_PREFIXES: &[&str] = &[
    "/usr/lib/",
    "/usr/libexec/",
    "/System/",
    "/Library/",
    "/lib/",
    "/lib64/",
    "/system/",
    "/apex/",
    "C:\\Windows\\",
];
