use super::Result;
use crate::error::Error;
use crate::symbols::{SuiteEnumerator, SymbolResolver};
use tracing::debug;

/// Entry point of a test: receives the test arguments, returns an exit code.
///
/// `0` means success, anything else is a failure. `124` is reserved for
/// timeouts and must not be returned voluntarily.
pub type TestFn = fn(&[String]) -> i32;

/// A single registered test, identified by its `(suite, name)` pair.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub suite: String,
    pub name: String,
    pub entry: TestFn,
}

impl TestCase {
    /// `"<suite>.<name>"`, the form used in diagnostics.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.suite, self.name)
    }

    /// `"<suite>_<name>"`, the symbol naming convention.
    pub fn symbol(&self) -> String {
        symbol_name(&self.suite, &self.name)
    }

    pub fn is(&self, suite: &str, name: &str) -> bool {
        self.suite == suite && self.name == name
    }
}

pub(crate) fn symbol_name(suite: &str, name: &str) -> String {
    format!("{suite}_{name}")
}

/// Ordered, append-only collection of tests.
///
/// Registration order is the iteration order for sequential runs. Duplicate
/// identities are accepted but make reporting ambiguous.
#[derive(Debug, Default)]
pub struct Registry {
    tests: Vec<TestCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self { tests: Vec::new() }
    }

    /// Registers a test by direct reference to its entry point.
    pub fn register_func(
        &mut self,
        suite: impl Into<String>,
        name: impl Into<String>,
        entry: TestFn,
    ) -> &TestCase {
        let test = TestCase {
            suite: suite.into(),
            name: name.into(),
            entry,
        };
        debug!("registered test {}", test.full_name());
        self.tests.push(test);
        &self.tests[self.tests.len() - 1]
    }

    /// Registers a test by resolving `"<suite>_<name>"`.
    ///
    /// An unresolvable symbol is fatal for registration.
    pub fn register_symb<R>(&mut self, resolver: &R, suite: &str, name: &str) -> Result<&TestCase>
    where
        R: SymbolResolver + ?Sized,
    {
        let symbol = symbol_name(suite, name);
        let entry = resolver
            .resolve(&symbol)
            .ok_or(Error::SymbolNotFound(symbol))?;
        Ok(self.register_func(suite, name, entry))
    }

    /// Registers every member of `suite` known to `table`, in enumeration
    /// order. Returns how many tests were added; an unknown suite adds none.
    pub fn register_suite<T>(&mut self, table: &T, suite: &str) -> Result<usize>
    where
        T: SymbolResolver + SuiteEnumerator + ?Sized,
    {
        let names = table.enumerate(suite);
        for name in &names {
            self.register_symb(table, suite, name)?;
        }
        debug!("registered {} tests from suite {}", names.len(), suite);
        Ok(names.len())
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&TestCase> {
        self.tests.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.tests.len(),
        })
    }

    /// First test registered under `(suite, name)`.
    pub fn find(&self, suite: &str, name: &str) -> Option<&TestCase> {
        self.tests.iter().find(|t| t.is(suite, name))
    }

    /// Index of the first test registered under `(suite, name)`.
    pub fn position(&self, suite: &str, name: &str) -> Option<usize> {
        self.tests.iter().position(|t| t.is(suite, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.iter()
    }
}
