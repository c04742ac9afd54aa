//! SVG rendering of an aggregated flamegraph using inferno.
//!
//! The merged samples are turned back into collapsed-stack lines
//! (`root;child;leaf weight`), which is the input format inferno expects.

use super::generator::{Flamegraph, FlamegraphConfig};
use crate::utils::error::FlamegraphError;
use inferno::flamegraph::{from_lines, Options};
use log::info;

/// Collapsed-stack lines for every merged sample, in sample order
pub fn to_collapsed_lines(flamegraph: &Flamegraph) -> Vec<String> {
    flamegraph
        .samples
        .iter()
        .zip(&flamegraph.weights)
        .map(|(stack, weight)| {
            let names: Vec<String> = stack
                .iter()
                .map(|&index| {
                    flamegraph
                        .frames
                        .get(index)
                        .map(|frame| frame_label(&frame.name))
                        .unwrap_or_else(|| format!("frame-{}", index))
                })
                .collect();
            format!("{} {}", names.join(";"), weight)
        })
        .collect()
}

// `;` separates frames in the collapsed format and cannot appear in a name.
fn frame_label(name: &str) -> String {
    if name.is_empty() {
        "<unknown>".to_string()
    } else {
        name.replace(';', ":")
    }
}

/// Render a flamegraph as an SVG document
///
/// # Errors
/// * `FlamegraphError::EmptyStacks` - the flamegraph has no samples
/// * `FlamegraphError::RenderFailed` - inferno failed to render
/// * `FlamegraphError::IoError` - the rendered SVG is not valid UTF-8
pub fn render_svg(
    flamegraph: &Flamegraph,
    config: &FlamegraphConfig,
) -> Result<String, FlamegraphError> {
    if flamegraph.samples.is_empty() {
        return Err(FlamegraphError::EmptyStacks);
    }

    info!(
        "Rendering flamegraph with {} stacks ({} samples)",
        flamegraph.samples.len(),
        flamegraph.end_value
    );

    let lines = to_collapsed_lines(flamegraph);

    let mut options = Options::default();
    options.title = config.title.clone();
    options.count_name = "samples".to_string();
    options.image_width = Some(config.width);

    let mut svg = Vec::new();
    from_lines(&mut options, lines.iter().map(String::as_str), &mut svg)
        .map_err(|e| FlamegraphError::RenderFailed(e.to_string()))?;

    String::from_utf8(svg).map_err(|e| {
        FlamegraphError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
