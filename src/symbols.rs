//! Name-based lookup of test entry points.
//!
//! Tests can be registered by name instead of by reference. The table is
//! populated explicitly at startup, usually with [`symbol_table!`], and every
//! symbol follows the `"<suite>_<name>"` convention.

use crate::registry::TestFn;

/// Resolves a symbol such as `"test_success"` to its entry point.
pub trait SymbolResolver {
    fn resolve(&self, symbol: &str) -> Option<TestFn>;
}

/// Lists the members of a suite, without the `"<suite>_"` prefix.
///
/// An unknown suite yields an empty list, never an error.
pub trait SuiteEnumerator {
    fn enumerate(&self, suite: &str) -> Vec<String>;
}

/// Ordered symbol to entry point mapping.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<(String, TestFn)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
        }
    }

    /// Adds a symbol. The first definition of a name wins on lookup.
    pub fn define(&mut self, symbol: impl Into<String>, entry: TestFn) {
        self.symbols.push((symbol.into(), entry));
    }

    pub fn with(mut self, symbol: impl Into<String>, entry: TestFn) -> Self {
        self.define(symbol, entry);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, symbol: &str) -> Option<TestFn> {
        self.symbols
            .iter()
            .find(|(name, _)| name == symbol)
            .map(|(_, entry)| *entry)
    }
}

impl SuiteEnumerator for SymbolTable {
    fn enumerate(&self, suite: &str) -> Vec<String> {
        let prefix = format!("{suite}_");
        let mut names: Vec<String> = Vec::new();
        for (symbol, _) in &self.symbols {
            if let Some(name) = symbol.strip_prefix(&prefix) {
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}

/// Builds a [`SymbolTable`] from function identifiers, each one registered
/// under its own name.
///
/// ```
/// fn test_ok(_args: &[String]) -> i32 { 0 }
/// fn test_ko(_args: &[String]) -> i32 { 1 }
///
/// let table = testfw::symbol_table![test_ok, test_ko];
/// assert_eq!(table.len(), 2);
/// ```
#[macro_export]
macro_rules! symbol_table {
    ($($func:ident),* $(,)?) => {{
        let mut table = $crate::SymbolTable::new();
        $( table.define(stringify!($func), $func as $crate::TestFn); )*
        table
    }};
}
