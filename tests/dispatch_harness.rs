use std::fs::File;
use std::path::Path;

use hand_dispatch::harness::{load_fixture, run_fixture, HarnessOutput};

#[test]
fn hand_handoff_fixture_matches_golden() {
    assert_fixture_matches(
        "tests/fixtures/dispatch_harness/hand_handoff.json",
        "tests/fixtures/dispatch_harness/hand_handoff.golden.json",
    );
}

#[test]
fn hand_handoff_fixture_is_stable_across_runs() {
    let fixture = load_fixture("tests/fixtures/dispatch_harness/hand_handoff.json").expect("load fixture");
    let first = run_fixture(&fixture).expect("run fixture first time");
    let second = run_fixture(&fixture).expect("run fixture second time");
    assert_eq!(first, second, "replays should produce identical transcripts");
}

#[test]
fn disabled_modules_drop_out_of_the_replay() {
    let mut fixture = load_fixture("tests/fixtures/dispatch_harness/hand_handoff.json").expect("load fixture");
    fixture.config.modules.insert(
        "RightFarTriggerEntity".to_string(),
        serde_json::from_str(r#"{"enabled":false}"#).expect("module override"),
    );
    let output = run_fixture(&fixture).expect("run fixture");
    assert_eq!(output.modules.len(), 5);
    assert!(output.ticks[0].calls.is_empty());
    assert!(output.ticks[0].holders.is_empty());
}

fn assert_fixture_matches(fixture_path: &str, golden_path: &str) {
    let fixture = load_fixture(fixture_path).expect("load fixture");
    let output = run_fixture(&fixture).expect("run fixture");
    let golden_file = File::open(Path::new(golden_path)).expect("open golden");
    let golden: HarnessOutput = serde_json::from_reader(golden_file).expect("parse golden");
    assert_eq!(output, golden, "fixture {} diverged from golden {}", fixture_path, golden_path);
}
