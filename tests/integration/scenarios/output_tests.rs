use crate::infrastructure::{assert_failures, assert_verdict, ProcessTestHarness};
use anyhow::Result;

/// Test output goes to the log file, appended run after run
#[tokio::test]
async fn test_log_file_appends() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let harness = ProcessTestHarness::new()?;
    let log = harness.temp_path().join("test.log");
    let log_arg = log.to_string_lossy().into_owned();

    for _ in 0..2 {
        let output = harness.run_testfw(&["-R", "output", "-o", &log_arg, "-c"]).await?;
        assert_failures(&output, 0);
        assert_eq!(output.verdicts().len(), 2);
        assert!(!output.stdout.contains("hello world"));
        assert!(!output.stderr.contains("hello stderr"));
    }

    let content = std::fs::read_to_string(&log)?;
    assert_eq!(content.matches("hello world\n").count(), 2);
    assert_eq!(content.matches("hello stderr\n").count(), 2);
    Ok(())
}

/// Parallel runs share the log file without truncating each other
#[tokio::test]
async fn test_parallel_log_file() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let log = harness.temp_path().join("parallel.log");
    let log_arg = log.to_string_lossy().into_owned();

    let output = harness
        .run_testfw(&["-R", "output", "-j", "-o", &log_arg, "-c"])
        .await?;
    assert_failures(&output, 0);

    let content = std::fs::read_to_string(&log)?;
    assert!(content.contains("hello world\n"));
    assert!(content.contains("hello stderr\n"));
    Ok(())
}

/// In process, output is redirected around the call and restored after it
#[tokio::test]
async fn test_in_process_log_file() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let log = harness.temp_path().join("inproc.log");
    let log_arg = log.to_string_lossy().into_owned();

    let output = harness.run_testfw(&["-n", "-R", "output", "-o", &log_arg]).await?;
    assert_failures(&output, 0);
    assert_verdict(&output, "output.hello", "SUCCESS", "status 0");
    assert_verdict(&output, "output.stderr", "SUCCESS", "status 0");
    assert!(!output.stdout.contains("hello world"));

    let content = std::fs::read_to_string(&log)?;
    assert!(content.contains("hello world\n"));
    assert!(content.contains("hello stderr\n"));
    Ok(())
}

/// Test output can be piped into a command, one consumer per test
#[tokio::test]
async fn test_pipe_to_command() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let log = harness.temp_path().join("piped.log");
    let command = format!("cat >> {}", log.display());

    let output = harness.run_testfw(&["-R", "output", "--cmd", &command, "-c"]).await?;
    assert_failures(&output, 0);
    assert!(!output.stdout.contains("hello world"));

    let content = std::fs::read_to_string(&log)?;
    assert!(content.contains("hello world\n"));
    assert!(content.contains("hello stderr\n"));
    Ok(())
}

/// In parallel mode every test gets its own consumer and none loses output
#[tokio::test]
async fn test_pipe_to_command_in_parallel() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let log = harness.temp_path().join("parallel-piped.log");
    let command = format!("cat >> {}", log.display());

    let output = harness
        .run_testfw(&["-R", "output", "-j", "--cmd", &command, "-c"])
        .await?;
    assert_failures(&output, 0);
    assert_eq!(output.verdicts().len(), 2);

    let content = std::fs::read_to_string(&log)?;
    assert_eq!(content.matches("hello world\n").count(), 1);
    assert_eq!(content.matches("hello stderr\n").count(), 1);
    Ok(())
}

/// A failing consumer turns a successful test into a failure
#[tokio::test]
async fn test_failing_pipe_consumer() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let output = harness
        .run_testfw(&["-R", "test", "--cmd", "cat > /dev/null; exit 3", "-c"])
        .await?;

    assert_failures(&output, 2);
    assert_verdict(&output, "test.success", "FAILURE", "status 3");
    assert_verdict(&output, "test.failure", "FAILURE", "status 1");
    Ok(())
}

/// An unopenable log file aborts the run before any test
#[tokio::test]
async fn test_unopenable_log_file_is_fatal() -> Result<()> {
    let harness = ProcessTestHarness::new()?;
    let log = harness.temp_path().join("missing-dir").join("test.log");
    let log_arg = log.to_string_lossy().into_owned();

    let output = harness.run_testfw(&["-R", "test", "-o", &log_arg, "-c"]).await?;
    assert_ne!(output.code(), Some(0));
    assert!(output.verdicts().is_empty());
    Ok(())
}

/// Silent modes suppress verdict lines but keep the count
#[tokio::test]
async fn test_silent_modes() -> Result<()> {
    let harness = ProcessTestHarness::new()?;

    let silent = harness.run_testfw(&["-R", "test", "-s", "-c"]).await?;
    assert_failures(&silent, 1);
    assert!(silent.verdicts().is_empty());
    assert!(silent.stdout.contains("hello world"));

    let full_silent = harness.run_testfw(&["-R", "test", "-S", "-c"]).await?;
    assert_failures(&full_silent, 1);
    assert!(full_silent.stdout.is_empty());
    Ok(())
}

/// Logs go to stderr and never disturb the verdict lines
#[tokio::test]
async fn test_logging_stays_off_stdout() -> Result<()> {
    let mut harness = ProcessTestHarness::new()?;
    harness.set_environment("RUST_LOG", "debug");

    let output = harness.run_testfw(&["-R", "test", "-O", "-c"]).await?;
    assert_failures(&output, 1);
    assert_eq!(output.stdout_lines().len(), 2);
    assert_eq!(output.verdicts().len(), 2);
    assert!(output.stderr.contains("Spawning isolated run for test.success"));
    Ok(())
}

/// Runner logs never reach the test output sink
#[tokio::test]
async fn test_logging_stays_out_of_sink() -> Result<()> {
    let mut harness = ProcessTestHarness::new()?;
    harness.set_environment("RUST_LOG", "debug");
    let log = harness.temp_path().join("quiet.log");
    let log_arg = log.to_string_lossy().into_owned();

    let output = harness.run_testfw(&["-R", "output", "-o", &log_arg, "-c"]).await?;
    assert_failures(&output, 0);

    let content = std::fs::read_to_string(&log)?;
    let mut lines: Vec<&str> = content.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["hello stderr", "hello world"]);
    Ok(())
}
