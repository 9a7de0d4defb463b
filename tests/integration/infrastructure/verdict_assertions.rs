//! Verdict-specific assertions for integration tests

use super::process_harness::{RunOutput, Verdict};

/// Assert that `test` was reported with `verdict` and `detail`
pub fn assert_verdict(output: &RunOutput, test: &str, verdict: &str, detail: &str) -> Verdict {
    let found = output
        .verdict_of(test)
        .unwrap_or_else(|| panic!("no verdict for {test} in:\n{}", output.stdout));
    assert_eq!(found.verdict, verdict, "verdict of {test}");
    assert_eq!(found.detail, detail, "detail of {test}");
    found
}

/// Assert the exit status of a run reporting its failure count
pub fn assert_failures(output: &RunOutput, expected: i32) {
    assert_eq!(
        output.code(),
        Some(expected),
        "unexpected failure count, stdout:\n{}\nstderr:\n{}",
        output.stdout,
        output.stderr
    );
}

/// Assert the set of reported tests regardless of order
pub fn assert_reported_tests(output: &RunOutput, expected: &[&str]) {
    let mut reported: Vec<String> = output.verdicts().into_iter().map(|v| v.test).collect();
    reported.sort();
    let mut expected: Vec<&str> = expected.to_vec();
    expected.sort();
    assert_eq!(reported, expected);
}
