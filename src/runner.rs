use super::Result;
use crate::child::{self, IsolatedTarget};
use crate::config::{ExecutionMode, RunConfig};
use crate::error::Error;
use crate::executor::{self, IsolatedRun};
use crate::outcome::TerminationRecord;
use crate::registry::{Registry, TestCase};
use crate::reporter::Reporter;
use crate::supervisor::TimeoutSupervisor;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tracing::{debug, info};

/// Drives runs end to end and computes the aggregate failure count.
///
/// Every registered test runs exactly once; no outcome stops the iteration.
/// Only fatal errors (output destination, process creation, invariant
/// violations) abort a run.
pub struct Runner {
    config: RunConfig,
    reporter: Reporter,
    supervisor: TimeoutSupervisor,
}

impl Runner {
    /// Runner reporting to standard output.
    pub fn new(config: RunConfig) -> Self {
        let reporter = Reporter::new(config.silent, config.verbose).color(config.color);
        Self::with_reporter(config, reporter)
    }

    pub fn with_reporter(config: RunConfig, reporter: Reporter) -> Self {
        let supervisor = TimeoutSupervisor::from_config(&config);
        Self {
            config,
            reporter,
            supervisor,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every registered test and returns how many did not succeed.
    ///
    /// `args` reach the entry points directly in process. Isolated children
    /// get theirs from their own invocation, which repeats `program_args`.
    /// In an isolated child this runs the single selected test and exits.
    pub async fn run_all(
        &mut self,
        registry: &Registry,
        args: &[String],
        mode: ExecutionMode,
    ) -> Result<usize> {
        reenter_if_child(registry, args)?;

        info!("Running {} tests ({:?})", registry.len(), mode);
        let tests: Vec<(usize, &TestCase)> = registry.iter().enumerate().collect();
        let failures = match mode {
            ExecutionMode::ParallelIsolated => self.run_parallel(&tests).await?,
            _ => self.run_sequential(&tests, args, mode).await?,
        };
        info!("Run finished: {} of {} tests failed", failures, registry.len());
        Ok(failures)
    }

    /// Runs the registered test `(suite, name)` alone.
    pub async fn run_one(
        &mut self,
        registry: &Registry,
        suite: &str,
        name: &str,
        args: &[String],
        mode: ExecutionMode,
    ) -> Result<usize> {
        reenter_if_child(registry, args)?;

        let index = registry
            .position(suite, name)
            .ok_or_else(|| Error::UnknownTest {
                suite: suite.to_string(),
                name: name.to_string(),
            })?;
        let tests = [(index, registry.get(index)?)];
        match mode {
            ExecutionMode::ParallelIsolated => self.run_parallel(&tests).await,
            _ => self.run_sequential(&tests, args, mode).await,
        }
    }

    /// One test at a time. An in-process test that outlives its limit ends
    /// the run once reported, since its thread cannot be stopped.
    async fn run_sequential(
        &mut self,
        tests: &[(usize, &TestCase)],
        args: &[String],
        mode: ExecutionMode,
    ) -> Result<usize> {
        let mut failures = 0;
        for &(index, test) in tests {
            self.reporter.announce(test)?;
            if mode == ExecutionMode::InProcess {
                let run = executor::run_in_process(test, args, &self.config).await?;
                failures += self.conclude(test, run.record, run.elapsed)?;
                if run.expired {
                    return Err(Error::InProcessTimeout {
                        test: test.full_name(),
                        limit: self.config.time_limit().unwrap_or_default(),
                    });
                }
            } else {
                let mut run = IsolatedRun::spawn(index, test, &self.config)?;
                let (record, elapsed) = self.supervisor.supervise(&mut run).await?;
                failures += self.conclude(test, record, elapsed)?;
            }
        }
        Ok(failures)
    }

    /// Starts every test first, then reaps them in completion order.
    async fn run_parallel(&mut self, tests: &[(usize, &TestCase)]) -> Result<usize> {
        let mut runs = Vec::with_capacity(tests.len());
        for &(index, test) in tests {
            self.reporter.announce(test)?;
            runs.push(IsolatedRun::spawn(index, test, &self.config)?);
        }
        debug!("{} isolated runs started", runs.len());

        let supervisor = self.supervisor;
        let mut pending: FuturesUnordered<_> = runs
            .into_iter()
            .map(|mut run| async move {
                let result = supervisor.supervise(&mut run).await;
                (run.test(), result)
            })
            .collect();

        let mut failures = 0;
        while let Some((test, result)) = pending.next().await {
            let (record, elapsed) = result?;
            failures += self.conclude(test, record, elapsed)?;
        }
        Ok(failures)
    }

    fn conclude(
        &mut self,
        test: &TestCase,
        record: TerminationRecord,
        elapsed: Duration,
    ) -> Result<usize> {
        let outcome = self.reporter.report(test, record, elapsed)?;
        debug!("{} -> {}", test.full_name(), outcome);
        Ok(usize::from(!outcome.is_success()))
    }
}

fn reenter_if_child(registry: &Registry, args: &[String]) -> Result<()> {
    match IsolatedTarget::from_env()? {
        Some(target) => match child::enter(&target, registry, args)? {},
        None => Ok(()),
    }
}
