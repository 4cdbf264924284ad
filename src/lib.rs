//! # tabledoc
//!
//! AsciiDoc table parser with full nested cell documents, written in Rust.
//!
//! ## Features
//!
//! - **Three Body Formats**: pipe (PSV), colon (DSV) and comma (CSV) separated
//!   tables, with per-format escaping and quoting
//! - **Column Specifiers**: multipliers, widths, alignment and style letters
//! - **Spans**: column and row spans reconciled against the column count
//! - **Header Detection**: explicit `header`/`footer` options or an implicit
//!   header inferred from a blank line
//! - **Nested Documents**: `a|` cells are parsed as independent documents
//!   with inherited, hard and locked attributes
//! - **Accurate Diagnostics**: positions are translated through every level
//!   of nesting and every included file
//!
//! ## Usage Examples
//!
//! ```rust
//! use tabledoc::{parse_document, CellContent, Element};
//!
//! let output = parse_document("[cols=\"1,a\"]\n|===\n|plain |* item\n|===").unwrap();
//! let Element::Table(table) = &output.document.blocks[0] else { panic!() };
//! let cell = table.body[0].cells[1].as_cell().unwrap();
//! assert!(matches!(cell.content, CellContent::Document(_)));
//! ```
//!
//! ### Caller Attributes
//!
//! ```rust
//! use tabledoc::{parse_document_with_options, ParseOptions};
//!
//! let options = ParseOptions::new().set_attribute("product", "Widget");
//! let output = parse_document_with_options(":product: Gadget\n\n{product}", options).unwrap();
//! assert_eq!(output.document.attribute("product"), Some("Widget"));
//! ```

/// Core parsing modules
pub mod core;

/// Data layer - static tables and constants
pub mod data;

/// Feature modules - attribute lists, tables and references
pub mod features;

/// Utility modules
pub mod utils;

// Re-export core types
pub use core::ast::{
    Callout, CalloutList, Document, Element, Footnote, Heading, Inline, List, ListingBlock,
    LiteralBlock, Paragraph,
};
pub use core::context::ParseContext;
pub use core::options::{CallerAttribute, ParseOptions, SafeMode};
pub use core::scope::AttributeScope;
pub use core::value::MaybeSet;

// Re-export table model
pub use features::table::{
    Cell, CellContent, CellStyle, ColumnWidth, HeaderMode, HorizontalAlign, Table, TableCell,
    TableCellFormat, TableColumn, TableFormat, TableOptions, TableRow, VerticalAlign,
};

// Re-export data modules
pub use data::constants;

// Re-export feature modules
pub use features::attributes;
pub use features::refs;
pub use features::table;

// Re-export utilities
pub use utils::diagnostics;
pub use utils::error::{ParseError, ParseOutput, ParseResult};
pub use utils::files;
pub use utils::files::{FileResolver, MemoryFileResolver, NoopFileResolver, StdFileResolver};

/// Parse a document with default options and includes disabled
pub fn parse_document(source: &str) -> ParseResult<ParseOutput> {
    parse_document_with_options(source, ParseOptions::default())
}

/// Parse a document with custom options and includes disabled
pub fn parse_document_with_options(source: &str, options: ParseOptions) -> ParseResult<ParseOutput> {
    parse_document_with_resolver(source, &NoopFileResolver, options)
}

/// Parse a document, reading include targets through `resolver`
///
/// # Returns
/// The document with its diagnostics, or the first fatal error that was
/// not absorbed by a table cell
pub fn parse_document_with_resolver(
    source: &str,
    resolver: &dyn FileResolver,
    options: ParseOptions,
) -> ParseResult<ParseOutput> {
    let mut ctx = ParseContext::new(resolver, options);
    let document = core::document::parse_root(&mut ctx, source)?;
    let fatal = ctx.take_fatal();
    Ok(ParseOutput {
        document,
        diagnostics: ctx.diagnostics,
        fatal,
    })
}
