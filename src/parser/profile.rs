//! Profile capability interface and format dispatch.
//!
//! Both supported formats expose the same capabilities through
//! `ProfileInterface`. `Profile` picks the variant while deserializing,
//! based on the `version` field: a non-empty string means the
//! sample-based format, a missing, null or empty one the legacy format.
//! Any other `version` value is rejected.

use super::legacy::LegacyProfile;
use super::sample::{SampleProfile, Transaction};
use crate::aggregator::collapse_call_trees;
use crate::model::CallTrees;
use crate::output::speedscope::{encode_call_trees, Output};
use crate::utils::error::{MalformedTraceError, ParseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Capabilities shared by every profile format
pub trait ProfileInterface {
    fn id(&self) -> &str;
    fn organization_id(&self) -> u64;
    fn project_id(&self) -> u64;
    fn platform(&self) -> &str;

    /// Thread the profiled transaction ran on, if recorded
    fn active_thread_id(&self) -> Option<u64>;

    fn transaction(&self) -> Option<Transaction>;
    fn release(&self) -> Option<&str>;
    fn environment(&self) -> Option<&str>;

    /// When the profile was recorded
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// When the profile was ingested
    fn received(&self) -> Option<DateTime<Utc>>;

    /// Time between the earliest and the latest sample
    fn duration_ns(&self) -> u64;

    fn sample_count(&self) -> usize;

    /// Build one call tree forest per execution context
    fn call_trees(&self) -> Result<CallTrees, MalformedTraceError>;

    /// Fill in frame metadata the producer left out
    fn normalize(&mut self);

    fn storage_path(&self) -> String {
        storage_path(self.organization_id(), self.project_id(), self.id())
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            id: self.id().to_string(),
            organization_id: self.organization_id(),
            project_id: self.project_id(),
            platform: self.platform().to_string(),
            release: self.release().map(str::to_string),
            environment: self.environment().map(str::to_string),
            transaction_name: self.transaction().map(|transaction| transaction.name),
            timestamp: self.timestamp(),
            received: self.received(),
            duration_ns: self.duration_ns(),
            sample_count: self.sample_count(),
        }
    }

    /// Collapsed call trees of every thread as speedscope output
    fn speedscope(&self) -> Result<Output, MalformedTraceError> {
        let call_trees = collapse_call_trees(&self.call_trees()?);
        let main_thread = main_thread_id(self.active_thread_id(), &call_trees);
        Ok(encode_call_trees(self.id(), &call_trees, main_thread))
    }
}

/// Descriptive fields of a profile, independent of its format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub id: String,
    pub organization_id: u64,
    pub project_id: u64,
    pub platform: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<DateTime<Utc>>,

    pub duration_ns: u64,
    pub sample_count: usize,
}

/// Object key of a profile: `org/project/id` with dashes removed from the id
pub fn storage_path(organization_id: u64, project_id: u64, profile_id: &str) -> String {
    format!(
        "{}/{}/{}",
        organization_id,
        project_id,
        profile_id.replace('-', "")
    )
}

/// Pick the main execution context of a profile
///
/// The recorded active thread wins when it has a forest; otherwise the
/// smallest thread id is used.
pub fn main_thread_id(active_thread_id: Option<u64>, call_trees: &CallTrees) -> Option<u64> {
    active_thread_id
        .filter(|id| call_trees.contains_key(id))
        .or_else(|| call_trees.keys().next().copied())
}

/// A profile in any supported format
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Legacy(LegacyProfile),
    Sample(SampleProfile),
}

impl Profile {
    /// Select the format from the `version` discriminant and parse
    pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
        if !value.is_object() {
            return Err(ParseError::InvalidFormat(
                "Profile must be a JSON object".to_string(),
            ));
        }

        let is_sample_format = match value.get("version") {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(version)) => !version.is_empty(),
            Some(other) => {
                return Err(ParseError::InvalidFormat(format!(
                    "version must be a string, got {}",
                    other
                )))
            }
        };

        if is_sample_format {
            Ok(Self::Sample(serde_json::from_value(value)?))
        } else {
            Ok(Self::Legacy(serde_json::from_value(value)?))
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Human-readable format name
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Legacy(_) => "legacy",
            Self::Sample(_) => "sample",
        }
    }

    fn inner(&self) -> &dyn ProfileInterface {
        match self {
            Self::Legacy(p) => p,
            Self::Sample(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ProfileInterface {
        match self {
            Self::Legacy(p) => p,
            Self::Sample(p) => p,
        }
    }
}

impl From<SampleProfile> for Profile {
    fn from(profile: SampleProfile) -> Self {
        Self::Sample(profile)
    }
}

impl From<LegacyProfile> for Profile {
    fn from(profile: LegacyProfile) -> Self {
        Self::Legacy(profile)
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl ProfileInterface for Profile {
    fn id(&self) -> &str {
        self.inner().id()
    }

    fn organization_id(&self) -> u64 {
        self.inner().organization_id()
    }

    fn project_id(&self) -> u64 {
        self.inner().project_id()
    }

    fn platform(&self) -> &str {
        self.inner().platform()
    }

    fn active_thread_id(&self) -> Option<u64> {
        self.inner().active_thread_id()
    }

    fn transaction(&self) -> Option<Transaction> {
        self.inner().transaction()
    }

    fn release(&self) -> Option<&str> {
        self.inner().release()
    }

    fn environment(&self) -> Option<&str> {
        self.inner().environment()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.inner().timestamp()
    }

    fn received(&self) -> Option<DateTime<Utc>> {
        self.inner().received()
    }

    fn duration_ns(&self) -> u64 {
        self.inner().duration_ns()
    }

    fn sample_count(&self) -> usize {
        self.inner().sample_count()
    }

    fn call_trees(&self) -> Result<CallTrees, MalformedTraceError> {
        self.inner().call_trees()
    }

    fn normalize(&mut self) {
        self.inner_mut().normalize();
    }
}
