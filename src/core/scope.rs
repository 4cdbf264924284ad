//! Document attribute scope
//!
//! Each document (the outer one and every nested cell document) owns one
//! [`AttributeScope`]. Entries remember how they were set:
//!
//! - `Soft`: set by document text, freely changeable
//! - `Hard` / `HardUnset`: fixed by the caller, document text cannot touch
//!   them
//! - `locked`: document text cannot set the attribute even if it is
//!   merely unset
//!
//! A nested cell document starts from [`AttributeScope::nested`], a copy of
//! its parent with the title, table of contents and doctype reset.

use indexmap::IndexMap;

use crate::data::constants::{
    doctype_flag, BASELINE_DOCTYPE, COMPAT_MODE, DEFAULT_ATTRIBUTES, DOCTITLE, DOCTYPES,
    TOC_ATTRIBUTES,
};

/// How an attribute got its current value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", content = "value", rename_all = "snake_case"))]
pub enum AttributeState {
    #[default]
    Unset,
    Soft(String),
    Hard(String),
    HardUnset,
}

impl AttributeState {
    pub fn value(&self) -> Option<&str> {
        match self {
            AttributeState::Soft(v) | AttributeState::Hard(v) => Some(v),
            AttributeState::Unset | AttributeState::HardUnset => None,
        }
    }

    pub fn is_hard(&self) -> bool {
        matches!(self, AttributeState::Hard(_) | AttributeState::HardUnset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScopedAttribute {
    pub state: AttributeState,
    pub locked: bool,
}

impl ScopedAttribute {
    /// Whether document text may change this attribute
    pub fn is_writable(&self) -> bool {
        !self.locked && !self.state.is_hard()
    }
}

/// Attribute table of one document
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AttributeScope {
    entries: IndexMap<String, ScopedAttribute>,
}

impl AttributeScope {
    /// Scope with the built-in attributes and the baseline doctype
    pub fn new() -> Self {
        let mut scope = Self::default();
        for (name, value) in DEFAULT_ATTRIBUTES {
            scope.entries.insert(
                name.to_string(),
                ScopedAttribute {
                    state: AttributeState::Soft(value.to_string()),
                    locked: false,
                },
            );
        }
        scope.write_doctype(BASELINE_DOCTYPE, false);
        scope
    }

    /// Value of a set attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|e| e.state.value())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn entry(&self, name: &str) -> Option<&ScopedAttribute> {
        self.entries.get(name)
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.entries.get(name).map(|e| e.locked).unwrap_or(false)
    }

    pub fn is_writable(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .map(ScopedAttribute::is_writable)
            .unwrap_or(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScopedAttribute)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set from document text
    ///
    /// Returns `false`, leaving the scope unchanged, when the attribute is
    /// hard or locked.
    pub fn soft_set(&mut self, name: &str, value: impl Into<String>) -> bool {
        if !self.is_writable(name) {
            tracing::debug!(name, "attribute is fixed, ignoring assignment");
            return false;
        }
        let value = value.into();
        if name == "doctype" {
            self.write_doctype(&value, false);
        } else {
            self.entry_mut(name).state = AttributeState::Soft(value);
        }
        true
    }

    /// Unset from document text
    pub fn soft_unset(&mut self, name: &str) -> bool {
        if !self.is_writable(name) {
            tracing::debug!(name, "attribute is fixed, ignoring unset");
            return false;
        }
        if name == "doctype" {
            self.write_doctype(BASELINE_DOCTYPE, false);
        } else if let Some(entry) = self.entries.get_mut(name) {
            entry.state = AttributeState::Unset;
        }
        true
    }

    /// Set by the caller; document text can no longer change it
    pub fn hard_set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name == "doctype" {
            self.write_doctype(&value, true);
        } else {
            self.entry_mut(name).state = AttributeState::Hard(value);
        }
    }

    /// Unset by the caller; document text can no longer set it
    pub fn hard_unset(&mut self, name: &str) {
        self.entry_mut(name).state = AttributeState::HardUnset;
    }

    pub fn lock(&mut self, name: &str) {
        self.entry_mut(name).locked = true;
    }

    fn entry_mut(&mut self, name: &str) -> &mut ScopedAttribute {
        self.entries.entry(name.to_string()).or_default()
    }

    /// Write the doctype and its mutually exclusive `doctype-<name>` flags
    fn write_doctype(&mut self, doctype: &str, hard: bool) {
        let wrap = |v: String| {
            if hard {
                AttributeState::Hard(v)
            } else {
                AttributeState::Soft(v)
            }
        };
        self.entry_mut("doctype").state = wrap(doctype.to_string());
        for known in DOCTYPES {
            let flag = self.entry_mut(&doctype_flag(known));
            flag.state = if *known == doctype {
                wrap(String::new())
            } else {
                AttributeState::Unset
            };
        }
        if !DOCTYPES.contains(&doctype) {
            self.entry_mut(&doctype_flag(doctype)).state = wrap(String::new());
        }
    }

    /// Initial scope of a nested cell document
    ///
    /// Everything is copied except:
    /// - the document title, which is removed
    /// - table of contents attributes, reset to unset (locks survive)
    /// - `compat-mode`, downgraded from hard to an ordinary soft value
    /// - the doctype, reset to the baseline unless the caller fixed it
    pub fn nested(&self) -> AttributeScope {
        let mut scope = self.clone();

        scope.entries.shift_remove(DOCTITLE);

        for name in TOC_ATTRIBUTES.iter() {
            if let Some(entry) = scope.entries.get_mut(*name) {
                entry.state = AttributeState::Unset;
            }
        }

        if let Some(entry) = scope.entries.get_mut(COMPAT_MODE) {
            entry.state = match std::mem::take(&mut entry.state) {
                AttributeState::Hard(v) | AttributeState::Soft(v) => AttributeState::Soft(v),
                AttributeState::HardUnset | AttributeState::Unset => AttributeState::Unset,
            };
        }

        let doctype_is_hard = scope
            .entries
            .get("doctype")
            .map(|e| e.state.is_hard())
            .unwrap_or(false);
        if !doctype_is_hard {
            // drop flags of doctypes set by the parent text
            let stale: Vec<String> = scope
                .entries
                .keys()
                .filter(|k| k.starts_with("doctype-") && !DOCTYPES.iter().any(|d| doctype_flag(d) == **k))
                .cloned()
                .collect();
            for key in stale {
                scope.entries.shift_remove(&key);
            }
            scope.write_doctype(BASELINE_DOCTYPE, false);
        }

        scope
    }
}
