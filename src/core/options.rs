//! Parse options
//!
//! Caller configuration applied before the first line is read. Attributes
//! given here are hard: document text cannot override them, and nested
//! cell documents inherit them as hard as well.

use indexmap::IndexMap;

use crate::core::scope::AttributeScope;
use crate::data::constants::{DEFAULT_MAX_INCLUDE_DEPTH, SECURE_LOCKED_ATTRIBUTES};

/// A caller-supplied attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerAttribute {
    /// Hard-set to a value
    Set(String),
    /// Hard-unset
    Unset,
}

impl CallerAttribute {
    /// Parse `name=value`, `name` or `name!`
    pub fn parse(spec: &str) -> Option<(String, CallerAttribute)> {
        let spec = spec.trim();
        let (name, attr) = match spec.split_once('=') {
            Some((name, value)) => (name.trim(), CallerAttribute::Set(value.to_string())),
            None => match spec.strip_suffix('!') {
                Some(name) => (name.trim(), CallerAttribute::Unset),
                None => (spec, CallerAttribute::Set(String::new())),
            },
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }
        Some((name.to_lowercase(), attr))
    }
}

/// How much the document is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafeMode {
    Unsafe,
    #[default]
    Safe,
    /// Locks attributes that expose the environment
    Secure,
}

/// Options for a parse
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Name reported in diagnostics for the top-level source
    /// Default: None
    pub file_name: Option<String>,

    /// Caller attributes, applied in order
    pub attributes: IndexMap<String, CallerAttribute>,

    /// Attributes document text may not set
    pub locked: Vec<String>,

    /// Default: Safe
    pub safe_mode: SafeMode,

    /// Propagate a failed nested cell parse instead of degrading the cell
    /// Default: false
    pub abort_on_cell_failure: bool,

    /// Maximum nesting of include directives
    /// Default: 64
    pub max_include_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            attributes: IndexMap::new(),
            locked: Vec::new(),
            safe_mode: SafeMode::Safe,
            abort_on_cell_failure: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for untrusted input
    pub fn secure() -> Self {
        Self {
            safe_mode: SafeMode::Secure,
            ..Self::default()
        }
    }

    /// Stop at the first failed cell
    pub fn strict() -> Self {
        Self {
            abort_on_cell_failure: true,
            ..Self::default()
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn set_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.to_lowercase(), CallerAttribute::Set(value.into()));
        self
    }

    pub fn unset_attribute(mut self, name: &str) -> Self {
        self.attributes
            .insert(name.to_lowercase(), CallerAttribute::Unset);
        self
    }

    pub fn lock_attribute(mut self, name: &str) -> Self {
        self.locked.push(name.to_lowercase());
        self
    }

    /// Build the root document scope
    pub fn initial_scope(&self) -> AttributeScope {
        let mut scope = AttributeScope::new();

        if self.safe_mode != SafeMode::Secure {
            if let Some(file) = &self.file_name {
                scope.soft_set("docfile", file.as_str());
            }
        }

        for (name, attr) in &self.attributes {
            match attr {
                CallerAttribute::Set(value) => scope.hard_set(name, value.as_str()),
                CallerAttribute::Unset => scope.hard_unset(name),
            }
        }

        for name in &self.locked {
            scope.lock(name);
        }

        if self.safe_mode == SafeMode::Secure {
            for name in SECURE_LOCKED_ATTRIBUTES.iter() {
                scope.lock(name);
            }
        }

        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("toc=left", "toc", CallerAttribute::Set("left".into()))]
    #[case("toc", "toc", CallerAttribute::Set(String::new()))]
    #[case("toc!", "toc", CallerAttribute::Unset)]
    #[case("Icons=font", "icons", CallerAttribute::Set("font".into()))]
    fn test_caller_attribute_parse(
        #[case] spec: &str,
        #[case] name: &str,
        #[case] expected: CallerAttribute,
    ) {
        assert_eq!(CallerAttribute::parse(spec), Some((name.to_string(), expected)));
    }

    #[test]
    fn test_caller_attribute_rejects_empty() {
        assert_eq!(CallerAttribute::parse("=x"), None);
        assert_eq!(CallerAttribute::parse("!"), None);
    }

    #[test]
    fn test_initial_scope_is_hard() {
        let options = ParseOptions::new()
            .set_attribute("icons", "font")
            .unset_attribute("toc");
        let mut scope = options.initial_scope();
        assert_eq!(scope.get("icons"), Some("font"));
        assert!(!scope.soft_set("icons", "image"));
        assert!(!scope.soft_set("toc", ""));
    }

    #[test]
    fn test_secure_mode_locks() {
        let scope = ParseOptions::secure()
            .with_file_name("doc.adoc")
            .initial_scope();
        assert!(scope.is_locked("docfile"));
        assert!(!scope.is_set("docfile"));
    }

    #[test]
    fn test_presets() {
        assert!(ParseOptions::strict().abort_on_cell_failure);
        assert!(!ParseOptions::default().abort_on_cell_failure);
        assert_eq!(ParseOptions::default().max_include_depth, 64);
    }
}
