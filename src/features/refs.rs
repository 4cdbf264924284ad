//! Anchor catalog and cross-reference tracking
//!
//! Every anchor found while parsing (section ids, block anchors, inline
//! anchors, anchors at the start of table cells and inside nested cell
//! documents) is registered in a single [`RefCatalog`] owned by the
//! outermost parse. Cross-references are recorded as they are found and
//! checked against the catalog once the whole document has been read.

use fxhash::FxHashMap;

use crate::utils::diagnostics::SourcePosition;

/// Kind of element an anchor points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RefKind {
    /// Section title
    Section,
    /// Table block
    Table,
    /// Any other block with an id
    Block,
    /// Inline anchor, including anchors at the start of a table cell
    Inline,
}

/// A registered anchor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RefEntry {
    pub id: String,
    pub kind: RefKind,
    /// Text used when a cross-reference has no label of its own
    pub reftext: Option<String>,
    pub position: SourcePosition,
}

/// A cross-reference seen in the text
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CrossReference {
    pub target: String,
    pub position: SourcePosition,
}

/// Anchor catalog for a whole parse
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RefCatalog {
    /// Entries in registration order
    entries: Vec<RefEntry>,
    #[cfg_attr(feature = "serde", serde(skip))]
    index: FxHashMap<String, usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    references: Vec<CrossReference>,
}

impl RefCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an anchor
    ///
    /// Returns `false` if the id is already taken; the first registration
    /// is kept.
    pub fn register(&mut self, entry: RefEntry) -> bool {
        if self.index.contains_key(&entry.id) {
            return false;
        }
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Look up an anchor
    pub fn get(&self, id: &str) -> Option<&RefEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Check if an anchor exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefEntry> {
        self.entries.iter()
    }

    /// Record a cross-reference for later validation
    pub fn record_reference(&mut self, target: impl Into<String>, position: SourcePosition) {
        self.references.push(CrossReference {
            target: target.into(),
            position,
        });
    }

    pub fn references(&self) -> &[CrossReference] {
        &self.references
    }

    /// Cross-references whose target was never registered
    pub fn unresolved(&self) -> impl Iterator<Item = &CrossReference> {
        self.references
            .iter()
            .filter(move |r| !self.contains(&r.target))
    }

    /// Generate an id that does not collide with a registered one
    pub fn unique_id(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Build a section id from its title: `_` followed by the lowercased words
/// joined with `_`
pub fn section_id(title: &str) -> String {
    let mut id = String::from("_");
    let mut pending_sep = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_sep && id.len() > 1 {
                id.push('_');
            }
            pending_sep = false;
            id.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    id
}
