//! Import collection for generated files.

use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Tracks `use` declarations and deduplicates them.
///
/// Modules keep insertion order; symbols within a module are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportCollector {
    imports: IndexMap<String, BTreeSet<String>>,
}

impl ImportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a symbol import from a module.
    pub fn add(&mut self, module: &str, symbol: &str) {
        self.imports
            .entry(module.to_string())
            .or_default()
            .insert(symbol.to_string());
    }

    /// Reserves a full path such as `crate::runtime::Context`. A path with no
    /// module part imports nothing.
    pub fn reserve(&mut self, path: &str) {
        if let Some((module, symbol)) = path.rsplit_once("::") {
            self.add(module, symbol);
        }
    }

    pub fn merge(&mut self, other: &ImportCollector) {
        for (module, symbols) in &other.imports {
            self.imports
                .entry(module.clone())
                .or_default()
                .extend(symbols.iter().cloned());
        }
    }

    #[must_use]
    pub fn has_symbol(&self, module: &str, symbol: &str) -> bool {
        self.imports
            .get(module)
            .is_some_and(|symbols| symbols.contains(symbol))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.imports.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Renders one `use` line per module.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (module, symbols) in self.iter() {
            let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
            match symbols.as_slice() {
                [single] => out.push_str(&format!("use {module}::{single};\n")),
                many => out.push_str(&format!("use {module}::{{{}}};\n", many.join(", "))),
            }
        }
        out
    }
}
