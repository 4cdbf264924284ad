//! Feature modules - block attribute and table grammar
//!
//! This module contains the sub-grammars the block parser hands off to:
//! - Block attribute lists (`[cols="1,2",options="header"]`)
//! - Tables (PSV, DSV and CSV bodies, spans, nested cell documents)
//! - The anchor catalog and cross-reference validation

pub mod attributes;
pub mod refs;
pub mod table;

// Re-export commonly used types
pub use attributes::{parse_attribute_list, Attribute, AttributeList};
pub use refs::{RefCatalog, RefEntry, RefKind};
pub use table::{Cell, CellContent, CellStyle, Table, TableCell, TableColumn, TableRow};
