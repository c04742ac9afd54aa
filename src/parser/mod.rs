//! Profile parsing.
//!
//! This module handles:
//! - The sample-based and legacy input formats
//! - Format detection and the shared capability interface
//! - Lenient numeric field decoding

pub mod legacy;
pub mod profile;
pub mod sample;
pub mod value;

// Re-export main types
pub use legacy::LegacyProfile;
pub use profile::{main_thread_id, storage_path, Metadata, Profile, ProfileInterface};
pub use sample::{Sample, SampleProfile, Trace, Transaction};
