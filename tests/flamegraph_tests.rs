use pretty_assertions::assert_eq;
use sampletree::aggregator::collapse_forest;
use sampletree::flamegraph::{
    generate_flamegraph, render_svg, FlamegraphAggregator, FlamegraphConfig,
};
use sampletree::model::Node;
use sampletree::output::{encode_flamegraph, to_json_bytes};
use sampletree::parser::{main_thread_id, Profile, ProfileInterface};
use serde_json::json;

fn profile_ab1() -> Profile {
    Profile::from_slice(
        br#"{
            "event_id": "ab1",
            "organization_id": 1,
            "project_id": 1,
            "platform": "cocoa",
            "version": "1",
            "profile": {
                "frames": [
                    {"function": "a", "package": "test.package", "in_app": false},
                    {"function": "b", "package": "test.package", "in_app": false},
                    {"function": "c", "package": "test.package", "in_app": true}
                ],
                "stacks": [[1, 0], [2], [0]],
                "samples": [
                    {"elapsed_since_start_ns": 0, "stack_id": 0},
                    {"elapsed_since_start_ns": 10, "stack_id": 1},
                    {"elapsed_since_start_ns": 20, "stack_id": 0},
                    {"elapsed_since_start_ns": 30, "stack_id": 2}
                ]
            }
        }"#,
    )
    .unwrap()
}

fn profile_cd2() -> Profile {
    Profile::from_slice(
        br#"{
            "event_id": "cd2",
            "organization_id": 1,
            "project_id": 1,
            "platform": "cocoa",
            "version": "1",
            "profile": {
                "frames": [
                    {"function": "a", "package": "test.package", "in_app": false},
                    {"function": "c", "package": "test.package", "in_app": true},
                    {"function": "e", "package": "test.package", "in_app": false},
                    {"function": "b", "package": "test.package", "in_app": false}
                ],
                "stacks": [[0, 1], [2], [3, 0]],
                "samples": [
                    {"elapsed_since_start_ns": 0, "stack_id": 0},
                    {"elapsed_since_start_ns": 10, "stack_id": 1},
                    {"elapsed_since_start_ns": 20, "stack_id": 2}
                ]
            }
        }"#,
    )
    .unwrap()
}

fn broken_profile() -> Profile {
    Profile::from_slice(
        br#"{
            "event_id": "bad",
            "version": "1",
            "profile": {
                "frames": [{"function": "a", "package": "test.package"}],
                "stacks": [[0, 9]],
                "samples": [{"elapsed_since_start_ns": 0, "stack_id": 0}]
            }
        }"#,
    )
    .unwrap()
}

fn uncollapsed() -> FlamegraphConfig {
    FlamegraphConfig::new().with_collapse(false)
}

#[test]
fn test_two_profile_speedscope_output() {
    let flamegraph = generate_flamegraph(&[profile_ab1(), profile_cd2()], &uncollapsed());
    let output = serde_json::to_value(encode_flamegraph(&flamegraph)).unwrap();

    assert_eq!(
        output,
        json!({
            "shared": {
                "frames": [
                    {"name": "a", "image": "test.package"},
                    {"name": "b", "image": "test.package"},
                    {"name": "c", "image": "test.package", "isApplication": true},
                    {"name": "e", "image": "test.package"}
                ],
                "profileIDs": ["ab1", "cd2"]
            },
            "profiles": [{
                "type": "sampled",
                "unit": "count",
                "endValue": 7,
                "isMainThread": true,
                "samples": [[0, 1], [0], [2, 0], [2], [3]],
                "samplesProfiles": [[0, 1], [0], [1], [0], [1]],
                "weights": [3, 1, 1, 1, 1]
            }]
        })
    );
}

#[test]
fn test_weights_sum_to_sample_count() {
    let flamegraph = generate_flamegraph(&[profile_ab1(), profile_cd2()], &uncollapsed());

    assert_eq!(flamegraph.weights.iter().sum::<u64>(), 7);
    assert_eq!(flamegraph.end_value, 7);
    assert_eq!(flamegraph.samples.len(), flamegraph.weights.len());
    assert_eq!(flamegraph.samples.len(), flamegraph.sample_origins.len());
    assert!(flamegraph.weights.iter().all(|&w| w > 0));
}

#[test]
fn test_output_is_deterministic() {
    let profiles = [profile_ab1(), profile_cd2()];
    let first = to_json_bytes(&encode_flamegraph(&generate_flamegraph(
        &profiles,
        &FlamegraphConfig::new(),
    )))
    .unwrap();
    let second = to_json_bytes(&encode_flamegraph(&generate_flamegraph(
        &profiles,
        &FlamegraphConfig::new(),
    )))
    .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_profile_order_decides_frame_order() {
    let flamegraph = generate_flamegraph(&[profile_cd2(), profile_ab1()], &uncollapsed());
    let names: Vec<&str> = flamegraph.frames.iter().map(|f| f.name.as_str()).collect();

    assert_eq!(names, vec!["c", "a", "e", "b"]);
    assert_eq!(flamegraph.profile_ids, vec!["cd2", "ab1"]);
    assert_eq!(flamegraph.end_value, 7);
}

#[test]
fn test_failed_profile_contributes_nothing() {
    let alone = generate_flamegraph(&[profile_ab1()], &uncollapsed());
    let with_failure = generate_flamegraph(&[profile_ab1(), broken_profile()], &uncollapsed());

    assert_eq!(with_failure.profile_ids, vec!["ab1", "bad"]);
    assert_eq!(with_failure.failed_profiles, vec![1]);
    assert_eq!(with_failure.samples, alone.samples);
    assert_eq!(with_failure.weights, alone.weights);
    assert_eq!(with_failure.sample_origins, alone.sample_origins);
}

#[test]
fn test_empty_input_gives_empty_flamegraph() {
    let flamegraph = generate_flamegraph(&[], &FlamegraphConfig::new());
    let output = encode_flamegraph(&flamegraph);

    assert!(output.shared.frames.is_empty());
    assert!(output.shared.profile_ids.is_empty());
    assert_eq!(output.profiles.len(), 1);
    assert_eq!(output.profiles[0].end_value, 0);
    assert!(output.profiles[0].samples.is_empty());
}

/// Self sample counts left in each profile's main-thread forest after collapse
fn collapsed_self_samples(profile: &Profile) -> u64 {
    let call_trees = profile.call_trees().unwrap();
    let forest = main_thread_id(profile.active_thread_id(), &call_trees)
        .map(|thread_id| collapse_forest(&call_trees[&thread_id]))
        .unwrap_or_default();

    let mut total = 0;
    for root in &forest {
        root.walk(&mut |node: &Node, _| total += node.self_sample_count());
    }
    total
}

#[test]
fn test_collapsed_two_profile_output() {
    let profiles = [profile_ab1(), profile_cd2()];
    let flamegraph = generate_flamegraph(&profiles, &FlamegraphConfig::new());
    let output = serde_json::to_value(encode_flamegraph(&flamegraph)).unwrap();

    // c is a singleton in ab1 and every node of cd2 is one.
    assert_eq!(
        output,
        json!({
            "shared": {
                "frames": [
                    {"name": "a", "image": "test.package"},
                    {"name": "b", "image": "test.package"}
                ],
                "profileIDs": ["ab1", "cd2"]
            },
            "profiles": [{
                "type": "sampled",
                "unit": "count",
                "endValue": 3,
                "isMainThread": true,
                "samples": [[0, 1], [0]],
                "samplesProfiles": [[0], [0]],
                "weights": [2, 1]
            }]
        })
    );
    assert!(flamegraph.failed_profiles.is_empty());

    let surviving: u64 = profiles.iter().map(collapsed_self_samples).sum();
    assert_eq!(surviving, 3);
    assert_eq!(flamegraph.end_value, surviving);
    assert_eq!(flamegraph.weights.iter().sum::<u64>(), surviving);
}

#[test]
fn test_aggregator_add_profile_matches_pipeline() {
    let mut aggregator = FlamegraphAggregator::new();
    aggregator.add_profile(&profile_ab1(), false);
    aggregator.add_profile(&profile_cd2(), false);

    assert_eq!(
        aggregator.finish(),
        generate_flamegraph(&[profile_ab1(), profile_cd2()], &uncollapsed())
    );
}

#[test]
fn test_render_merged_svg() {
    let config = uncollapsed().with_title("Merged");
    let flamegraph = generate_flamegraph(&[profile_ab1(), profile_cd2()], &config);

    let svg = render_svg(&flamegraph, &config).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Merged"));
}
