//! Plain-text summary of the heaviest merged stacks.

use super::generator::Flamegraph;

/// Render the `max_lines` heaviest stacks as a text table
///
/// Ties keep sample order, so the summary is as deterministic as the
/// flamegraph itself.
pub fn generate_text_summary(flamegraph: &Flamegraph, max_lines: usize) -> String {
    let mut order: Vec<usize> = (0..flamegraph.samples.len()).collect();
    order.sort_by(|&a, &b| flamegraph.weights[b].cmp(&flamegraph.weights[a]));

    let mut lines = Vec::new();
    lines.push(format!(
        "Flamegraph: {} profiles, {} unique stacks, {} samples",
        flamegraph.profile_ids.len(),
        flamegraph.samples.len(),
        flamegraph.end_value
    ));
    if !flamegraph.failed_profiles.is_empty() {
        let failed: Vec<&str> = flamegraph
            .failed_profiles
            .iter()
            .filter_map(|&i| flamegraph.profile_ids.get(i).map(String::as_str))
            .collect();
        lines.push(format!("Failed profiles: {}", failed.join(", ")));
    }
    lines.push(String::new());
    lines.push(format!("{:>8}  {:>6}  {:>8}  Stack (leaf)", "SAMPLES", "%", "PROFILES"));

    for &i in order.iter().take(max_lines) {
        let weight = flamegraph.weights[i];
        let percentage = if flamegraph.end_value > 0 {
            weight as f64 / flamegraph.end_value as f64 * 100.0
        } else {
            0.0
        };
        let leaf = flamegraph.samples[i]
            .last()
            .and_then(|&frame| flamegraph.frames.get(frame))
            .map(|frame| frame.name.as_str())
            .unwrap_or("<unknown>");

        lines.push(format!(
            "{:>8}  {:>5.1}%  {:>8}  {} (depth {})",
            weight,
            percentage,
            flamegraph.sample_origins[i].len(),
            leaf,
            flamegraph.samples[i].len()
        ));
    }

    if flamegraph.samples.len() > max_lines {
        lines.push(String::new());
        lines.push(format!(
            "(Showing top {} of {} unique stacks)",
            max_lines,
            flamegraph.samples.len()
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Frame;

    #[test]
    fn test_summary_orders_by_weight() {
        let flamegraph = Flamegraph {
            frames: vec![Frame::new("main", "app"), Frame::new("hot", "app")],
            profile_ids: vec!["p1".to_string(), "p2".to_string()],
            samples: vec![vec![0], vec![0, 1]],
            weights: vec![1, 9],
            sample_origins: vec![vec![0], vec![0, 1]],
            end_value: 10,
            failed_profiles: vec![1],
        };

        let summary = generate_text_summary(&flamegraph, 1);
        let hot = summary.find("hot (depth 2)").unwrap();
        assert!(summary.contains("90.0%"));
        assert!(summary.contains("Failed profiles: p2"));
        assert!(summary.contains("(Showing top 1 of 2 unique stacks)"));
        assert!(!summary[hot..].contains("main (depth 1)"));
    }
}
