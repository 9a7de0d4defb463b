//! Isolated test execution engine.
//!
//! Tests are plain functions registered into a [`Registry`], either directly
//! or by name through a [`SymbolTable`]. A [`Runner`] executes them in one of
//! three [`ExecutionMode`]s, bounds their running time, classifies how each
//! one ended and returns the number of tests that did not succeed.
//!
//! Isolated modes re-execute the current program for every test. The child
//! rebuilds the same registry, reaches the runner again and runs only the
//! test named in its environment, so a program must build its registry the
//! same way on every invocation.

pub mod child;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod outcome;
mod output;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod signals;
pub mod supervisor;
pub mod symbols;

pub type Result<T> = std::result::Result<T, Error>;

pub use config::{ExecutionMode, OutputSink, RunConfig, DEFAULT_TIMEOUT_SECS};
pub use error::Error;
pub use outcome::{Outcome, TerminationRecord, TIMEOUT_SENTINEL};
pub use registry::{Registry, TestCase, TestFn};
pub use reporter::Reporter;
pub use runner::Runner;
pub use supervisor::TimeoutSupervisor;
pub use symbols::{SuiteEnumerator, SymbolResolver, SymbolTable};
