use clap::{ArgGroup, Parser};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{ExecutionMode, OutputSink, RunConfig};
use crate::registry::Registry;
use crate::runner::Runner;
use crate::symbols::SymbolTable;

type Result<T> = color_eyre::eyre::Result<T>;

/// Run registered tests in isolation with time limits
#[derive(Parser, Debug)]
#[command(name = "testfw")]
#[command(about = "Run registered tests in isolation with time limits")]
#[command(version)]
#[command(group(ArgGroup::new("action").args(["all", "run", "suite", "list"])))]
pub struct Cli {
    /// Run all tests of the prefix suite one by one [default]
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Run a single test of the prefix suite
    #[arg(short = 'r', long, value_name = "TESTNAME")]
    pub run: Option<String>,

    /// Run every test of a suite
    #[arg(short = 'R', long, value_name = "SUITE")]
    pub suite: Option<String>,

    /// List the tests of the prefix suite
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Suite prefix used by --all, --run and --list
    #[arg(short = 'p', long, default_value = "test")]
    pub prefix: String,

    /// Append test stdout & stderr to a log file
    #[arg(short = 'o', long = "output", value_name = "LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// Redirect test stdout & stderr to /dev/null
    #[arg(short = 'O', long)]
    pub discard: bool,

    /// Pipe test stdout & stderr into a shell command
    #[arg(long, value_name = "COMMAND", conflicts_with_all = ["logfile", "discard", "full_silent"])]
    pub cmd: Option<String>,

    /// Time limit for each test (seconds, 0 for none)
    #[arg(short = 't', long, value_name = "SECONDS", default_value = "0")]
    pub timeout: u64,

    /// No time limit [default]
    #[arg(short = 'T', long)]
    pub no_timeout: bool,

    /// Exit with the number of test failures
    #[arg(short = 'c', long)]
    pub count: bool,

    /// Do not print verdict lines
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Silent mode, with test output discarded as well
    #[arg(short = 'S', long)]
    pub full_silent: bool,

    /// Run tests inside the runner process (no isolation)
    #[arg(short = 'n', long = "no-fork", conflicts_with = "parallel")]
    pub in_process: bool,

    /// Run all isolated tests concurrently
    #[arg(short = 'j', long)]
    pub parallel: bool,

    /// Print a banner before each test
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Arguments passed to every test
    #[arg(last = true)]
    pub test_args: Vec<String>,
}

/// What the invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    RunAll,
    RunOne(String),
    RunSuite(String),
    List,
}

/// Configuration of one invocation
#[derive(Debug, Clone)]
pub struct Config {
    pub action: Action,
    /// Suite used by `RunAll`, `RunOne` and `List`
    pub prefix: String,
    pub mode: ExecutionMode,
    /// Report the failure count through the exit status
    pub count: bool,
    pub test_args: Vec<String>,
    pub run: RunConfig,
}

impl Config {
    /// Parse command line arguments into configuration
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let action = if cli.list {
            Action::List
        } else if let Some(name) = cli.run {
            Action::RunOne(name)
        } else if let Some(suite) = cli.suite {
            Action::RunSuite(suite)
        } else {
            Action::RunAll
        };

        let mode = if cli.in_process {
            ExecutionMode::InProcess
        } else if cli.parallel {
            ExecutionMode::ParallelIsolated
        } else {
            ExecutionMode::SequentialIsolated
        };

        let output = if cli.full_silent || cli.discard {
            OutputSink::LogFile(PathBuf::from("/dev/null"))
        } else if let Some(path) = cli.logfile {
            OutputSink::LogFile(path)
        } else if let Some(command) = cli.cmd {
            OutputSink::Pipe(command)
        } else {
            OutputSink::None
        };

        Ok(Config {
            action,
            prefix: cli.prefix,
            mode,
            count: cli.count,
            test_args: cli.test_args,
            run: RunConfig {
                timeout_secs: if cli.no_timeout { 0 } else { cli.timeout },
                output,
                silent: cli.silent || cli.full_silent,
                verbose: cli.verbose,
                color: std::io::stdout().is_terminal(),
                ..Default::default()
            },
        })
    }

    /// Exit status for a run that ended with `failures` failed tests.
    ///
    /// The count is only reported when asked for, or in process where a
    /// nonzero status is the only sign of failure once output is discarded.
    pub fn exit_code(&self, failures: usize) -> u8 {
        if self.count || self.mode == ExecutionMode::InProcess {
            failures.min(u8::MAX as usize) as u8
        } else {
            0
        }
    }
}

/// Parses the process arguments and runs the requested action against
/// `symbols`. Returns the exit status.
pub async fn main(symbols: &SymbolTable) -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;
    execute(config, symbols).await
}

pub async fn execute(config: Config, symbols: &SymbolTable) -> Result<u8> {
    let mut registry = Registry::new();
    match &config.action {
        Action::List | Action::RunAll => {
            registry.register_suite(symbols, &config.prefix)?;
        }
        Action::RunOne(name) => {
            registry.register_symb(symbols, &config.prefix, name)?;
        }
        Action::RunSuite(suite) => {
            registry.register_suite(symbols, suite)?;
        }
    }
    debug!("{} tests registered for {:?}", registry.len(), config.action);

    if config.action == Action::List {
        for test in registry.iter() {
            println!("{}", test.name);
        }
        return Ok(0);
    }

    let mut runner = Runner::new(config.run.clone());
    let failures = match &config.action {
        Action::RunOne(name) => {
            runner
                .run_one(&registry, &config.prefix, name, &config.test_args, config.mode)
                .await?
        }
        _ => {
            runner
                .run_all(&registry, &config.test_args, config.mode)
                .await?
        }
    };
    info!("{} test failures", failures);
    Ok(config.exit_code(failures))
}
