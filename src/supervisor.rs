use super::Result;
use crate::config::RunConfig;
use crate::executor::IsolatedRun;
use crate::outcome::{TerminationRecord, TIMEOUT_SENTINEL};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Bounds the wall-clock time of isolated runs.
///
/// The wait for a child is raced against a deadline counted from the child's
/// creation, so a run that is awaited late still gets exactly its limit. The
/// deadline only exists once the child does, so expiry always has a process
/// to kill. On
/// expiry the child's group is killed and reaped, and the run is recorded as
/// having exited with the timeout sentinel whatever the OS reported.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutSupervisor {
    limit: Option<Duration>,
}

impl TimeoutSupervisor {
    pub fn new(limit: Option<Duration>) -> Self {
        Self { limit }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.time_limit())
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Waits for `run` under the time limit, then closes its output.
    ///
    /// Returns the termination record and the time from creation to
    /// termination of the child.
    pub async fn supervise(&self, run: &mut IsolatedRun<'_>) -> Result<(TerminationRecord, Duration)> {
        let record = match self.limit {
            None => self.natural(run).await?,
            Some(limit) => {
                let deadline = Instant::from_std(run.started() + limit);
                match timeout_at(deadline, self.natural(run)).await {
                    Ok(record) => record?,
                    Err(_) => {
                        warn!(
                            "{} exceeded time limit of {:?}",
                            run.test().full_name(),
                            limit
                        );
                        run.force_kill().await?;
                        TerminationRecord::timeout()
                    }
                }
            }
        };
        let elapsed = run.elapsed();
        debug!(
            "{} terminated after {:?}: {:?}",
            run.test().full_name(),
            elapsed,
            record
        );
        let record = run.finish(record).await?;
        Ok((record, elapsed))
    }

    /// Waits for the child to end on its own.
    async fn natural(&self, run: &mut IsolatedRun<'_>) -> Result<TerminationRecord> {
        let record = run.wait().await?;
        if record == TerminationRecord::ExitedWith(TIMEOUT_SENTINEL) {
            warn!(
                "{} exited with the reserved timeout code",
                run.test().full_name()
            );
        }
        Ok(record)
    }
}
