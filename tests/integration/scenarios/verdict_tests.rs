use crate::infrastructure::{assert_failures, assert_reported_tests, assert_verdict, ProcessTestHarness};
use anyhow::Result;

/// Success and failure in sequence, reported in registration order
#[tokio::test]
async fn test_success_and_failure_sequential() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let harness = ProcessTestHarness::new()?;
    let output = harness.run_testfw(&["-R", "test", "-c"]).await?;

    assert_failures(&output, 1);
    let verdicts = output.verdicts();
    assert_eq!(verdicts.len(), 2);
    assert_eq!(verdicts[0].test, "test.success");
    assert_eq!(verdicts[1].test, "test.failure");
    assert_verdict(&output, "test.success", "SUCCESS", "status 0");
    assert_verdict(&output, "test.failure", "FAILURE", "status 1");

    // The child inherits stdout when no sink is configured
    assert!(output.stdout_lines().contains(&"hello world"));
    Ok(())
}

/// Without -c the failure count does not leak into the exit status
#[tokio::test]
async fn test_exit_status_without_count() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness.run_testfw(&["-a"]).await?;

    assert_failures(&output, 0);
    assert_eq!(output.verdicts().len(), 2);
    Ok(())
}

/// Invalid memory access is reported as a kill by SIGSEGV
#[tokio::test]
async fn test_segfault_is_killed() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness.run_testfw(&["-p", "crash", "-r", "segfault", "-c"]).await?;

    assert_failures(&output, 1);
    assert_verdict(&output, "crash.segfault", "KILLED", "signal \"SIGSEGV\"");
    Ok(())
}

/// A failed assertion aborts the isolated child
#[tokio::test]
async fn test_assert_is_killed_by_abort() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness.run_testfw(&["-R", "crash", "-c"]).await?;

    assert_failures(&output, 2);
    assert_reported_tests(&output, &["crash.segfault", "crash.assert"]);
    assert_verdict(&output, "crash.assert", "KILLED", "signal \"SIGABRT\"");
    assert!(output.stderr.contains("one is not two"));
    Ok(())
}

/// Exit codes are reported as seen by the parent
#[tokio::test]
async fn test_exit_codes() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness.run_testfw(&["-R", "misc", "-c"]).await?;

    assert_failures(&output, 2);
    assert_verdict(&output, "misc.negret", "FAILURE", "status 255");
    assert_verdict(&output, "misc.posret", "FAILURE", "status 2");
    assert_verdict(&output, "misc.args", "SUCCESS", "status 0");
    Ok(())
}

/// Arguments after -- reach the test entry point
#[tokio::test]
async fn test_arguments_are_forwarded() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness
        .run_testfw(&["-p", "misc", "-r", "args", "-c", "--", "one", "two"])
        .await?;

    assert_failures(&output, 1);
    assert_verdict(&output, "misc.args", "FAILURE", "status 2");
    assert!(output.stdout_lines().contains(&"arg: one"));
    assert!(output.stdout_lines().contains(&"arg: two"));
    Ok(())
}

/// An empty suite runs nothing and fails nothing
#[tokio::test]
async fn test_empty_suite() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness.run_testfw(&["-R", "nothing", "-c"]).await?;

    assert_failures(&output, 0);
    assert!(output.verdicts().is_empty());
    assert!(output.stdout.is_empty());
    Ok(())
}

/// Naming a test that does not exist is fatal
#[tokio::test]
async fn test_unknown_test_is_fatal() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness.run_testfw(&["-r", "missing"]).await?;

    assert_ne!(output.code(), Some(0));
    assert!(output.verdicts().is_empty());
    assert!(output.stderr.contains("test_missing"));
    Ok(())
}
