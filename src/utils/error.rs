//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// A profile references a stack or frame that does not exist.
///
/// Fatal to the construction of that one profile's call trees. The caller
/// decides whether to reject the request or skip the profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedTraceError {
    #[error("sample {sample} references stack {stack_id}, but the profile only has {stack_count} stacks")]
    StackOutOfRange {
        sample: usize,
        stack_id: usize,
        stack_count: usize,
    },

    #[error("stack {stack_id} references frame {frame_index}, but the profile only has {frame_count} frames")]
    FrameOutOfRange {
        stack_id: usize,
        frame_index: usize,
        frame_count: usize,
    },
}

/// Errors that can occur during profile parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid profile format: {0}")]
    InvalidFormat(String),
}

/// Errors that can occur during flamegraph rendering
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Empty stack data")]
    EmptyStacks,

    #[error("SVG rendering failed: {0}")]
    RenderFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to read file: {0}")]
    ReadFailed(std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ParseError),
}
