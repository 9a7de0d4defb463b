use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use crate::signals::signal_name;

/// Exit code reserved for runs that were killed on timeout.
pub const TIMEOUT_SENTINEL: i32 = 124;

/// How a test execution ended at the OS level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationRecord {
    ExitedWith(i32),
    KilledBySignal(i32),
}

impl TerminationRecord {
    /// Record synthesized for a run that outlived its time budget.
    pub fn timeout() -> Self {
        TerminationRecord::ExitedWith(TIMEOUT_SENTINEL)
    }

    /// Converts a reaped status. Stopped or continued states have neither an
    /// exit code nor a terminating signal and yield `None`.
    pub fn from_status(status: ExitStatus) -> Option<Self> {
        if let Some(code) = status.code() {
            Some(TerminationRecord::ExitedWith(code))
        } else {
            status.signal().map(TerminationRecord::KilledBySignal)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TerminationRecord::ExitedWith(0))
    }

    pub fn outcome(&self) -> Outcome {
        match *self {
            TerminationRecord::ExitedWith(TIMEOUT_SENTINEL) => Outcome::Timeout,
            TerminationRecord::ExitedWith(0) => Outcome::Success,
            TerminationRecord::ExitedWith(code) => Outcome::Failure(code),
            TerminationRecord::KilledBySignal(signal) => Outcome::Killed(signal),
        }
    }
}

/// Classified result of one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(i32),
    Timeout,
    Killed(i32),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failure(_) => "FAILURE",
            Outcome::Timeout => "TIMEOUT",
            Outcome::Killed(_) => "KILLED",
        }
    }

    /// `status <code>` for exit-based verdicts, `signal "<name>"` otherwise.
    pub fn detail(&self) -> String {
        match self {
            Outcome::Success => "status 0".to_string(),
            Outcome::Failure(code) => format!("status {code}"),
            Outcome::Timeout => format!("status {TIMEOUT_SENTINEL}"),
            Outcome::Killed(signal) => format!("signal \"{}\"", signal_name(*signal)),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.verdict(), self.detail())
    }
}
