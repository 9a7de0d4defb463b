use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions that abort a whole run.
///
/// Per-test outcomes (failures, timeouts, crashes) are never errors; they are
/// reported through [`crate::Outcome`] and the aggregate failure count.
#[derive(Error, Debug)]
pub enum Error {
    #[error("test index {index} out of range (registry holds {len} tests)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("symbol \"{0}\" not found")]
    SymbolNotFound(String),

    #[error("test \"{suite}.{name}\" is not registered")]
    UnknownTest { suite: String, name: String },

    #[error("invalid isolated child target: {0}")]
    InvalidTarget(String),

    #[error("test index {index} holds \"{found}\", not \"{expected}\"")]
    TargetMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("cannot open output destination {path:?}: {source}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot spawn output command \"{command}\": {source}")]
    OpenPipe {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot spawn isolated run for \"{test}\": {source}")]
    Spawn {
        test: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for \"{test}\": {source}")]
    Wait {
        test: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to kill \"{test}\": {source}")]
    Kill {
        test: String,
        #[source]
        source: nix::Error,
    },

    #[error("\"{test}\" terminated with unexpected status {status}")]
    UnexpectedStatus { test: String, status: String },

    #[error("\"{test}\" exceeded its {limit:?} time limit in process and is still running")]
    InProcessTimeout {
        test: String,
        limit: std::time::Duration,
    },

    #[error("stdio redirection failed: {0}")]
    Redirect(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
