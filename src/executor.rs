use super::Result;
use crate::child::IsolatedTarget;
use crate::config::RunConfig;
use crate::error::Error;
use crate::outcome::{TerminationRecord, TIMEOUT_SENTINEL};
use crate::output::{self, Destination, StdioSwap};
use crate::registry::TestCase;
use crate::signals::{reset_signal_mask, signal_group};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Lifecycle of an isolated run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunState {
    /// Child process exists and has not been reaped
    Running,
    /// Child process has been reaped
    Reaped,
}

/// A test executing in its own child process.
///
/// The child re-executes the configured program image with the test identity
/// in its environment, and leads its own process group so that a forced kill
/// also takes down anything the test spawned.
pub struct IsolatedRun<'a> {
    test: &'a TestCase,
    child: Child,
    pid: Pid,
    started: Instant,
    destination: Option<Destination>,
    state: RunState,
}

impl<'a> IsolatedRun<'a> {
    /// Creates the child process for the test at `index` in the registry and
    /// returns as soon as it exists.
    ///
    /// Fails when the output destination cannot be opened or the process
    /// cannot be created; both are fatal for the run.
    pub fn spawn(index: usize, test: &'a TestCase, config: &RunConfig) -> Result<Self> {
        let destination = Destination::open(&config.output)?;
        let (stdout, stderr) = destination.child_stdio()?;

        let mut command = Command::new(&config.program);
        command.args(&config.program_args);
        command.envs(IsolatedTarget::of(index, test).env());
        command.process_group(0);
        command.kill_on_drop(true);
        command.stdout(stdout);
        command.stderr(stderr);

        unsafe {
            command.pre_exec(reset_signal_mask);
        }

        info!("Spawning isolated run for {}", test.full_name());
        let started = Instant::now();
        let child = command.spawn().map_err(|source| Error::Spawn {
            test: test.full_name(),
            source,
        })?;
        // Parent copies of the output handles must close before the consumer
        // can see end of file.
        drop(command);

        let pid = match child.id() {
            Some(pid) => Pid::from_raw(pid as i32),
            None => {
                return Err(Error::UnexpectedStatus {
                    test: test.full_name(),
                    status: "reaped before registration".to_string(),
                })
            }
        };
        debug!("Isolated run {} has PID {}", test.full_name(), pid);

        Ok(Self {
            test,
            child,
            pid,
            started,
            destination: Some(destination),
            state: RunState::Running,
        })
    }

    pub fn test(&self) -> &'a TestCase {
        self.test
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// When the child was created.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time since the child was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Waits for the child to terminate on its own.
    ///
    /// Cancel-safe: dropping the future leaves the child running and a later
    /// call resumes the wait.
    pub async fn wait(&mut self) -> Result<TerminationRecord> {
        let status = self.child.wait().await.map_err(|source| Error::Wait {
            test: self.test.full_name(),
            source,
        })?;
        self.state = RunState::Reaped;
        info!("{} exited with status: {:?}", self.test.full_name(), status);
        TerminationRecord::from_status(status).ok_or_else(|| Error::UnexpectedStatus {
            test: self.test.full_name(),
            status: format!("{status:?}"),
        })
    }

    /// Kills the child's process group and reaps the child.
    ///
    /// The child may already be gone; that is not an error.
    pub async fn force_kill(&mut self) -> Result<()> {
        info!("Force killing {} (PID {})", self.test.full_name(), self.pid);
        if self.state == RunState::Running {
            let delivered = signal_group(self.pid, Signal::SIGKILL).map_err(|source| Error::Kill {
                test: self.test.full_name(),
                source,
            })?;
            if !delivered {
                debug!("Process group {} already gone", self.pid);
            }
        }
        let status = self.wait().await;
        debug!("Reaped killed run: {:?}", status);
        status.map(|_| ())
    }

    /// Closes the output destination and folds the consumer's termination into
    /// the test's.
    pub async fn finish(&mut self, record: TerminationRecord) -> Result<TerminationRecord> {
        let consumer = match self.destination.take() {
            Some(destination) => destination.close().await?,
            None => None,
        };
        Ok(output::with_consumer(record, consumer))
    }
}

impl Drop for IsolatedRun<'_> {
    fn drop(&mut self) {
        if self.state == RunState::Running {
            warn!(
                "Isolated run {} dropped with running child (PID: {}), emergency cleanup",
                self.test.full_name(),
                self.pid
            );
            if let Err(e) = signal_group(self.pid, Signal::SIGKILL) {
                warn!("Failed to kill process group {}: {}", self.pid, e);
            }
        }
    }
}

/// How an in-process call ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InProcessRun {
    pub record: TerminationRecord,
    pub elapsed: Duration,
    /// The entry outlived its time limit and its thread is still running
    pub expired: bool,
}

/// Runs a test's entry point in the calling process.
///
/// Output is redirected by swapping fds 1 and 2 around the call. With a time
/// limit the entry runs on a watchdog thread that is abandoned on expiry,
/// since a thread cannot be killed; the caller must not start another test
/// after an expired run. A panic in the entry resumes in the caller: nothing
/// is contained in this mode.
pub async fn run_in_process(
    test: &TestCase,
    args: &[String],
    config: &RunConfig,
) -> Result<InProcessRun> {
    let destination = Destination::open(&config.output)?;
    let swap = match destination.redirect_target() {
        Some(target) => Some(StdioSwap::redirect(target)?),
        None => None,
    };

    debug!("Running {} in process", test.full_name());
    let started = Instant::now();
    let returned = match config.time_limit() {
        None => Some((test.entry)(args)),
        Some(limit) => call_with_watchdog(test, args, limit).await?,
    };
    let elapsed = started.elapsed();
    let record = match returned {
        Some(code) => {
            if code == TIMEOUT_SENTINEL {
                warn!("{} returned the reserved timeout code", test.full_name());
            }
            TerminationRecord::ExitedWith(code & 0xff)
        }
        None => TerminationRecord::timeout(),
    };

    if let Some(swap) = swap {
        swap.restore()?;
    }
    let consumer = destination.close().await?;
    Ok(InProcessRun {
        record: output::with_consumer(record, consumer),
        elapsed,
        expired: returned.is_none(),
    })
}

/// The entry's return code, or `None` when the limit expired first.
async fn call_with_watchdog(
    test: &TestCase,
    args: &[String],
    limit: Duration,
) -> Result<Option<i32>> {
    let (tx, rx) = oneshot::channel();
    let entry = test.entry;
    let args = args.to_vec();
    std::thread::spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(|| entry(&args)));
        let _ = tx.send(result);
    });

    match tokio::time::timeout(limit, rx).await {
        Ok(Ok(Ok(code))) => Ok(Some(code)),
        Ok(Ok(Err(payload))) => panic::resume_unwind(payload),
        Ok(Err(_)) => Err(Error::UnexpectedStatus {
            test: test.full_name(),
            status: "watchdog thread ended without a result".to_string(),
        }),
        Err(_) => {
            warn!(
                "{} exceeded {:?} in process, abandoning its thread",
                test.full_name(),
                limit
            );
            Ok(None)
        }
    }
}
