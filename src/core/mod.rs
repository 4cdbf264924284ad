//! Core parsing modules
//!
//! This module contains the document engine shared by the outer source and
//! every nested cell document:
//! - `document`: block grammar and the nested parse entry point
//! - `context`: state shared across the parse recursion
//! - `scope`: per-document attribute scope with hard/soft/locked entries
//! - `inlines`: normal substitutions
//! - `ast`: the document tree

pub mod ast;
pub mod context;
pub mod document;
pub mod inlines;
pub mod options;
pub mod scope;
pub mod value;

// Re-export main types
pub use ast::{Document, Element, Footnote, Inline};
pub use context::ParseContext;
pub use document::{parse_nested, parse_root, SourceLine};
pub use options::{CallerAttribute, ParseOptions, SafeMode};
pub use scope::{AttributeScope, AttributeState};
pub use value::MaybeSet;
