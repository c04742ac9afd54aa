//! Calltree command: dump a profile's call trees as JSON.

use super::models::CalltreeArgs;
use crate::aggregator::collapse_call_trees;
use crate::model::CallTrees;
use crate::output::{read_profile, write_json};
use crate::parser::ProfileInterface;
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

/// Wire shape of the dump, keyed by thread id
#[derive(Debug, Serialize)]
pub struct CallTreeDump {
    pub call_trees: CallTrees,
}

/// Build the dump for one profile file
///
/// **Public** - shared by the command and tests
pub fn build_dump(args: &CalltreeArgs) -> Result<CallTreeDump> {
    let profile = read_profile(&args.file)
        .with_context(|| format!("Failed to read profile {}", args.file.display()))?;

    let mut call_trees = profile
        .call_trees()
        .with_context(|| format!("Failed to build call trees for profile {}", profile.id()))?;

    if args.collapse {
        call_trees = collapse_call_trees(&call_trees);
    }

    info!(
        "Built call trees for {} threads of profile {}",
        call_trees.len(),
        profile.id()
    );

    Ok(CallTreeDump { call_trees })
}

/// Execute the calltree command
///
/// **Public** - main entry point called from main.rs
pub fn execute_calltree(args: CalltreeArgs) -> Result<()> {
    let dump = build_dump(&args)?;

    match &args.output {
        Some(path) => {
            write_json(&dump, path, true).context("Failed to write call trees")?;
            info!("✓ Call trees written to: {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&dump)
                .context("Failed to serialize call trees")?;
            println!("{}", json);
        }
    }

    Ok(())
}
