use std::path::PathBuf;
use std::time::Duration;

/// Historical default time limit, in seconds, for callers that want one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

/// Isolation strategy applied uniformly to every test of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One child process per test, each awaited before the next starts.
    #[default]
    SequentialIsolated,
    /// One child process per test, all started before any is awaited.
    ParallelIsolated,
    /// Entry points called in the runner itself, without crash containment.
    InProcess,
}

/// Where the standard output and error of tests go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSink {
    /// Inherit the runner's own streams.
    #[default]
    None,
    /// Append to a file, opened once per test execution.
    LogFile(PathBuf),
    /// Feed the standard input of `sh -c <command>`, spawned per test execution.
    Pipe(String),
}

/// Read-only settings for a whole run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Per-test time limit in seconds, 0 disables it
    pub timeout_secs: u64,
    /// Destination of test output
    pub output: OutputSink,
    /// Suppress diagnostic lines
    pub silent: bool,
    /// Print a banner before each test
    pub verbose: bool,
    /// Color the verdict tags
    pub color: bool,
    /// Program image re-executed for isolated runs
    pub program: PathBuf,
    /// Arguments passed to `program` for isolated runs
    pub program_args: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            output: OutputSink::None,
            silent: false,
            verbose: false,
            color: false,
            program: std::env::current_exe()
                .unwrap_or_else(|_| PathBuf::from(std::env::args().next().unwrap_or_default())),
            program_args: std::env::args().skip(1).collect(),
        }
    }
}

impl RunConfig {
    /// The time limit, or `None` when unbounded.
    pub fn time_limit(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}
