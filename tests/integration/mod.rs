//! Integration testing framework for the testfw binary
//!
//! The harness drives the compiled `testfw` binary and its sample suites,
//! then inspects verdict lines and exit status.

pub mod scenarios;

// Re-export commonly used types for convenience
pub use infrastructure::{ProcessTestHarness, RunOutput, Verdict};
