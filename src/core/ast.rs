//! Document tree produced by the parser
//!
//! A [`Document`] owns its blocks exclusively. Nested cell documents are
//! complete documents of their own, stored inside the table cell that
//! produced them.

use crate::core::scope::AttributeScope;
use crate::features::refs::RefCatalog;
use crate::features::table::Table;
use crate::utils::diagnostics::SourcePosition;

/// Root node of a parse
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    /// Title set by a level-0 heading or the `doctitle` attribute
    pub title: Option<String>,
    /// Attribute state at the end of the parse
    pub attributes: AttributeScope,
    /// Block content in source order
    pub blocks: Vec<Element>,
    /// Footnotes defined in this document (never shared with nested ones)
    pub footnotes: Vec<Footnote>,
    /// Anchor catalog; only populated on the outermost document
    pub references: RefCatalog,
}

impl Document {
    /// Look up an attribute value as seen at the end of the document
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Whether the document enabled a table of contents
    pub fn has_toc(&self) -> bool {
        self.attributes.is_set("toc")
    }

    /// Effective doctype of this document
    pub fn doctype(&self) -> &str {
        self.attributes
            .get("doctype")
            .unwrap_or(crate::data::constants::BASELINE_DOCTYPE)
    }

    /// Every table in the document, in order, without descending into cells
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Element::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Depth-first walk over every element, including nested cell documents
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        fn walk_elements<'a>(elements: &'a [Element], visit: &mut dyn FnMut(&'a Element)) {
            for element in elements {
                visit(element);
                if let Element::Table(table) = element {
                    for row in table.all_rows() {
                        for cell in row.cells.iter().filter_map(|c| c.as_cell()) {
                            walk_elements(cell.elements(), visit);
                        }
                    }
                }
            }
        }
        walk_elements(&self.blocks, visit);
    }
}

/// Block-level node
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Element {
    Heading(Heading),
    Paragraph(Paragraph),
    Literal(LiteralBlock),
    Listing(ListingBlock),
    CalloutList(CalloutList),
    List(List),
    Table(Table),
    TableOfContents(TableOfContents),
}

impl Element {
    /// Source position of the first line of the element
    pub fn location(&self) -> &SourcePosition {
        match self {
            Element::Heading(h) => &h.location,
            Element::Paragraph(p) => &p.location,
            Element::Literal(l) => &l.location,
            Element::Listing(l) => &l.location,
            Element::CalloutList(c) => &c.location,
            Element::List(l) => &l.location,
            Element::Table(t) => &t.location,
            Element::TableOfContents(t) => &t.location,
        }
    }
}

/// Section title
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Heading {
    /// 1 for `==`, up to 5 for `======`
    pub level: usize,
    pub id: String,
    pub title: Vec<Inline>,
    pub location: SourcePosition,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Paragraph {
    pub title: Option<String>,
    pub content: Vec<Inline>,
    pub location: SourcePosition,
}

/// Verbatim text with only character escaping applied
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LiteralBlock {
    pub title: Option<String>,
    pub content: String,
    pub location: SourcePosition,
}

/// Delimited listing block with callout markers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListingBlock {
    pub title: Option<String>,
    pub lines: Vec<ListingLine>,
    pub location: SourcePosition,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListingLine {
    pub text: String,
    pub callouts: Vec<Callout>,
}

/// A callout marker such as `<1>` at the end of a listing line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Callout {
    /// Number as written (or assigned for `<.>`)
    pub number: u32,
    /// Position in the single callout sequence shared by every document of
    /// the parse, starting at 1
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalloutList {
    pub items: Vec<CalloutListItem>,
    pub location: SourcePosition,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalloutListItem {
    pub number: u32,
    pub content: Vec<Inline>,
}

/// Single-level list
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct List {
    pub ordered: bool,
    pub items: Vec<Vec<Inline>>,
    pub location: SourcePosition,
}

/// Placement of a `toc::[]` block macro
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableOfContents {
    pub location: SourcePosition,
}

/// A footnote definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Footnote {
    /// 1-based, per document
    pub number: usize,
    pub id: Option<String>,
    pub content: Vec<Inline>,
}

/// Inline node
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Monospace(Vec<Inline>),
    Anchor {
        id: String,
        reftext: Option<String>,
    },
    CrossReference {
        target: String,
        label: Option<String>,
    },
    /// Reference to an entry of the owning document's footnote list
    FootnoteRef {
        number: usize,
        id: Option<String>,
    },
    LineBreak,
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// Plain text with all formatting removed
    pub fn plain_text(nodes: &[Inline]) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                Inline::Text(t) => out.push_str(t),
                Inline::Strong(c) | Inline::Emphasis(c) | Inline::Monospace(c) => {
                    out.push_str(&Inline::plain_text(c))
                }
                Inline::CrossReference { target, label } => {
                    out.push_str(label.as_deref().unwrap_or(target))
                }
                Inline::LineBreak => out.push('\n'),
                Inline::Anchor { .. } | Inline::FootnoteRef { .. } => {}
            }
        }
        out
    }
}
