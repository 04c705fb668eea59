//! Format registry for syntax tree serialization
//!
//! Each output format implements the [`Formatter`] trait and is looked up by name in a
//! [`FormatRegistry`].

use crate::transmuter::parsing::tree::SyntaxTree;
use std::collections::HashMap;
use thiserror::Error;

/// Free-form rendering parameters, e.g. `show-spans = true`.
pub type FormatParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// A named way of rendering a syntax tree as text.
pub trait Formatter: Send + Sync {
    /// The name of this format (e.g., "treeviz", "json")
    fn name(&self) -> &str;

    fn serialize(&self, tree: &SyntaxTree, params: &FormatParams) -> Result<String, FormatError>;

    fn description(&self) -> &str {
        ""
    }
}

pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter, replacing any previous one with the same name.
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    pub fn serialize(
        &self,
        tree: &SyntaxTree,
        format: &str,
        params: &FormatParams,
    ) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(tree, params)
    }

    /// All registered format names, sorted.
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(super::TreevizFormatter);
        registry.register(super::JsonFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmuter::parsing::tree::Branch;
    use crate::transmuter::range::Span;

    struct CountFormatter;

    impl Formatter for CountFormatter {
        fn name(&self) -> &str {
            "count"
        }

        fn serialize(&self, tree: &SyntaxTree, _params: &FormatParams) -> Result<String, FormatError> {
            Ok(tree.children().len().to_string())
        }
    }

    fn empty_tree() -> SyntaxTree {
        SyntaxTree::new(Branch {
            rule: "Root".to_string(),
            span: Span::default(),
            children: vec![],
        })
    }

    #[test]
    fn test_registry_register_and_serialize() {
        let mut registry = FormatRegistry::new();
        registry.register(CountFormatter);

        assert!(registry.has("count"));
        assert_eq!(
            registry.serialize(&empty_tree(), "count", &FormatParams::new()),
            Ok("0".to_string())
        );
    }

    #[test]
    fn test_registry_defaults() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.list_formats(), vec!["json", "treeviz"]);
    }

    #[test]
    fn test_registry_unknown_format() {
        let registry = FormatRegistry::with_defaults();
        assert_eq!(
            registry.serialize(&empty_tree(), "yaml", &FormatParams::new()),
            Err(FormatError::FormatNotFound("yaml".to_string()))
        );
    }
}
