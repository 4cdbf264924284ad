//! Constants and lookup tables for the document attribute engine
//!
//! This module contains:
//! - Known doctypes and the doctype-derived flag names
//! - Built-in character replacement attributes
//! - Attribute sets with special inheritance or locking rules
//! - Cell style letters used by the column and cell specifiers

use lazy_static::lazy_static;
use phf::phf_map;
use std::collections::HashSet;

// ============================================================================
// Doctypes
// ============================================================================

/// Doctype a document falls back to when nothing sets one
pub const BASELINE_DOCTYPE: &str = "article";

/// All doctypes the engine derives a `doctype-<name>` flag for
pub const DOCTYPES: &[&str] = &["article", "book", "manpage", "inline"];

/// Name of the flag attribute derived from a doctype
pub fn doctype_flag(doctype: &str) -> String {
    format!("doctype-{}", doctype)
}

// ============================================================================
// Default Attributes
// ============================================================================

/// Attributes every document starts with (soft-set, overridable by text)
pub const DEFAULT_ATTRIBUTES: &[(&str, &str)] = &[
    ("table-caption", "Table"),
    ("toc-title", "Table of Contents"),
    ("empty", ""),
    ("blank", ""),
    ("sp", " "),
    ("nbsp", "\u{00a0}"),
    ("zwsp", "\u{200b}"),
    ("wj", "\u{2060}"),
    ("apos", "'"),
    ("quot", "\""),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("deg", "\u{00b0}"),
    ("plus", "+"),
    ("brvbar", "\u{00a6}"),
    ("vbar", "|"),
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("startsb", "["),
    ("endsb", "]"),
    ("caret", "^"),
    ("asterisk", "*"),
    ("tilde", "~"),
    ("backslash", "\\"),
    ("backtick", "`"),
    ("two-colons", "::"),
    ("two-semicolons", ";;"),
    ("cpp", "C++"),
];

lazy_static! {
    /// Attributes describing the table of contents; never inherited by a
    /// nested cell document
    pub static ref TOC_ATTRIBUTES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("toc");
        s.insert("toc-placement");
        s.insert("toc-position");
        s
    };

    /// Attributes locked (and unset) when parsing in secure mode
    pub static ref SECURE_LOCKED_ATTRIBUTES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("allow-uri-read");
        s.insert("docdir");
        s.insert("docfile");
        s.insert("max-include-depth");
        s
    };
}

/// Attribute holding the document title
pub const DOCTITLE: &str = "doctitle";

/// Attribute switching the legacy (compat) quoting rules
pub const COMPAT_MODE: &str = "compat-mode";

/// Attribute recognized inside cell content to set the cell background
pub const CELL_BACKGROUND: &str = "cellbgcolor";

/// Default upper bound for nested include directives
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

// ============================================================================
// Cell Styles
// ============================================================================

/// Style letters accepted at the end of a column or cell specifier
pub static STYLE_LETTERS: phf::Map<char, &'static str> = phf_map! {
    'a' => "asciidoc",
    'd' => "default",
    'e' => "emphasis",
    'h' => "header",
    'l' => "literal",
    'm' => "monospace",
    's' => "strong",
};

/// Look up the style name for a specifier letter
pub fn style_name(letter: char) -> Option<&'static str> {
    STYLE_LETTERS.get(&letter).copied()
}
