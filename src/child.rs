//! Re-entry of the test program as an isolated child.
//!
//! Isolated runs re-execute the current program with the target test named in
//! its environment. When the program reaches the runner again it sees the
//! variables, runs exactly that test and exits with its code.

use super::Result;
use crate::error::Error;
use crate::registry::{Registry, TestCase};
use std::convert::Infallible;
use std::panic;
use tracing::debug;

pub const SUITE_VAR: &str = "TESTFW_SUITE";
pub const NAME_VAR: &str = "TESTFW_NAME";
pub const INDEX_VAR: &str = "TESTFW_INDEX";

/// Whether the current process was spawned as an isolated child.
///
/// Children write only test output: their stderr belongs to the test's sink.
pub fn is_isolated_child() -> bool {
    std::env::var_os(SUITE_VAR).is_some()
}

/// Identity of the test an isolated child must run.
///
/// The registry index selects the entry; the name pair guards against a
/// child whose registry was built differently from its parent's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedTarget {
    pub index: usize,
    pub suite: String,
    pub name: String,
}

impl IsolatedTarget {
    pub fn of(index: usize, test: &TestCase) -> Self {
        Self {
            index,
            suite: test.suite.clone(),
            name: test.name.clone(),
        }
    }

    /// Environment variables that make the child select this test.
    pub fn env(&self) -> [(&'static str, String); 3] {
        [
            (SUITE_VAR, self.suite.clone()),
            (NAME_VAR, self.name.clone()),
            (INDEX_VAR, self.index.to_string()),
        ]
    }

    /// The target of the current process, if it was spawned as a child.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_vars(
            std::env::var(SUITE_VAR).ok(),
            std::env::var(NAME_VAR).ok(),
            std::env::var(INDEX_VAR).ok(),
        )
    }

    fn from_vars(
        suite: Option<String>,
        name: Option<String>,
        index: Option<String>,
    ) -> Result<Option<Self>> {
        match (suite, name, index) {
            (None, None, None) => Ok(None),
            (Some(suite), Some(name), Some(index)) => {
                let index = index
                    .parse()
                    .map_err(|_| Error::InvalidTarget(format!("{INDEX_VAR}={index:?}")))?;
                Ok(Some(Self { index, suite, name }))
            }
            _ => Err(Error::InvalidTarget(format!(
                "{SUITE_VAR}, {NAME_VAR} and {INDEX_VAR} must be set together"
            ))),
        }
    }

    /// The registry entry at the target's index, which must carry the
    /// target's identity.
    pub fn resolve<'r>(&self, registry: &'r Registry) -> Result<&'r TestCase> {
        let test = registry.get(self.index)?;
        if !test.is(&self.suite, &self.name) {
            return Err(Error::TargetMismatch {
                index: self.index,
                expected: format!("{}.{}", self.suite, self.name),
                found: test.full_name(),
            });
        }
        Ok(test)
    }
}

/// Runs the target test and exits the process with its code.
///
/// A panic aborts the process, so a failed assertion terminates the child
/// with `SIGABRT` instead of unwinding into the runner.
pub fn enter(
    target: &IsolatedTarget,
    registry: &Registry,
    args: &[String],
) -> Result<Infallible> {
    let test = target.resolve(registry)?;
    debug!("Running {} as isolated child", test.full_name());

    let builtin_panic_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        builtin_panic_hook(info);
        std::process::abort();
    }));

    std::process::exit((test.entry)(args))
}
