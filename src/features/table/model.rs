//! Table data model

use crate::core::ast::{Document, Element};
use crate::core::value::MaybeSet;
use crate::data::constants::style_name;
use crate::features::attributes::AttributeList;
use crate::utils::diagnostics::SourcePosition;

/// Record format of the table body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TableFormat {
    /// Pipe (or `!`) separated values
    #[default]
    Psv,
    /// Colon separated values
    Dsv,
    /// Comma separated values
    Csv,
}

impl TableFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "psv" => Some(TableFormat::Psv),
            "dsv" => Some(TableFormat::Dsv),
            "csv" => Some(TableFormat::Csv),
            _ => None,
        }
    }

    /// Format implied by the first character of the block delimiter
    pub fn from_delimiter(c: char) -> Self {
        match c {
            ':' => TableFormat::Dsv,
            ',' => TableFormat::Csv,
            _ => TableFormat::Psv,
        }
    }

    pub fn default_separator(&self) -> char {
        match self {
            TableFormat::Psv => '|',
            TableFormat::Dsv => ':',
            TableFormat::Csv => ',',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableFormat::Psv => "psv",
            TableFormat::Dsv => "dsv",
            TableFormat::Csv => "csv",
        }
    }
}

/// Horizontal cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(HorizontalAlign::Left),
            '^' => Some(HorizontalAlign::Center),
            '>' => Some(HorizontalAlign::Right),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            HorizontalAlign::Left => '<',
            HorizontalAlign::Center => '^',
            HorizontalAlign::Right => '>',
        }
    }
}

/// Vertical cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(VerticalAlign::Top),
            '^' => Some(VerticalAlign::Middle),
            '>' => Some(VerticalAlign::Bottom),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            VerticalAlign::Top => '<',
            VerticalAlign::Middle => '^',
            VerticalAlign::Bottom => '>',
        }
    }
}

/// Content style of a cell or column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CellStyle {
    #[default]
    Default,
    Emphasis,
    Strong,
    Monospace,
    Header,
    Literal,
    AsciiDoc,
}

impl CellStyle {
    pub fn from_letter(letter: char) -> Option<Self> {
        style_name(letter).and_then(Self::from_name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(CellStyle::Default),
            "emphasis" => Some(CellStyle::Emphasis),
            "strong" => Some(CellStyle::Strong),
            "monospace" => Some(CellStyle::Monospace),
            "header" => Some(CellStyle::Header),
            "literal" => Some(CellStyle::Literal),
            "asciidoc" => Some(CellStyle::AsciiDoc),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            CellStyle::Default => 'd',
            CellStyle::Emphasis => 'e',
            CellStyle::Strong => 's',
            CellStyle::Monospace => 'm',
            CellStyle::Header => 'h',
            CellStyle::Literal => 'l',
            CellStyle::AsciiDoc => 'a',
        }
    }
}

/// Width of a column as written in the column specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "unit", content = "value", rename_all = "lowercase"))]
pub enum ColumnWidth {
    /// Relative units (`3`)
    Proportional(u32),
    /// Explicit percentage (`25%`)
    Percentage(u32),
    /// Sized to content (`~`)
    Auto,
}

/// Column defaults resolved from the column specifier
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableColumn {
    /// Expansion count of the specifier token this column came from
    pub multiplier: usize,
    pub halign: MaybeSet<HorizontalAlign>,
    pub valign: MaybeSet<VerticalAlign>,
    pub width: MaybeSet<ColumnWidth>,
    /// Share of the table width, `None` for autowidth columns
    pub percentage: Option<f64>,
    pub style: MaybeSet<CellStyle>,
}

impl TableColumn {
    pub fn new() -> Self {
        Self {
            multiplier: 1,
            ..Default::default()
        }
    }

    pub fn is_autowidth(&self) -> bool {
        matches!(self.width, MaybeSet::Set(ColumnWidth::Auto))
    }
}

/// Column and row span of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CellSpan {
    pub column: MaybeSet<usize>,
    pub row: MaybeSet<usize>,
}

/// Format prefix written in front of a cell separator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableCellFormat {
    /// Repeat count (`3*`)
    pub multiplier: MaybeSet<usize>,
    pub span: CellSpan,
    pub horizontal_align: MaybeSet<HorizontalAlign>,
    pub vertical_align: MaybeSet<VerticalAlign>,
    pub style: MaybeSet<CellStyle>,
}

impl TableCellFormat {
    pub fn colspan(&self) -> usize {
        self.span.column.unwrap_or(1)
    }

    pub fn rowspan(&self) -> usize {
        self.span.row.unwrap_or(1)
    }

    pub fn repeat(&self) -> usize {
        self.multiplier.unwrap_or(1)
    }

    /// Number of grid columns the cells written with this prefix cover
    pub fn width(&self) -> usize {
        self.repeat() * self.colspan()
    }
}

/// Parsed content of a real cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum CellContent {
    /// Blocks produced by the non-asciidoc styles
    Elements(Vec<Element>),
    /// Independent document of an asciidoc cell
    Document(Box<Document>),
    /// The nested parse of an asciidoc cell failed
    Failed { message: String },
}

/// A cell with content
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cell {
    /// Format prefix as written
    pub format: TableCellFormat,
    /// Effective style after column and header resolution
    pub style: CellStyle,
    pub halign: HorizontalAlign,
    pub valign: VerticalAlign,
    pub content: CellContent,
    /// `cellbgcolor` in effect after the cell's content was read
    pub background: Option<String>,
    /// Raw cell text
    pub source: String,
    pub location: SourcePosition,
}

impl Cell {
    pub fn colspan(&self) -> usize {
        self.format.colspan()
    }

    pub fn rowspan(&self) -> usize {
        self.format.rowspan()
    }

    /// Top level blocks of the cell, whatever its style
    pub fn elements(&self) -> &[Element] {
        match &self.content {
            CellContent::Elements(elements) => elements,
            CellContent::Document(doc) => &doc.blocks,
            CellContent::Failed { .. } => &[],
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.content {
            CellContent::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Grid position: a real cell or the position covered by a span
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "cell", rename_all = "snake_case"))]
pub enum TableCell {
    Real(Cell),
    Placeholder,
}

impl TableCell {
    pub fn is_blank(&self) -> bool {
        matches!(self, TableCell::Placeholder)
    }

    pub fn as_cell(&self) -> Option<&Cell> {
        match self {
            TableCell::Real(cell) => Some(cell),
            TableCell::Placeholder => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    /// A blank source line followed the row
    pub followed_by_blank: bool,
}

impl TableRow {
    pub fn real_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter_map(TableCell::as_cell)
    }
}

/// How the header row was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeaderMode {
    #[default]
    NoHeader,
    /// Inferred from a blank line after the first row
    ImplicitHeader,
    /// Requested through the `header` option
    ExplicitHeader,
}

/// Boolean table options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableOptions {
    pub header: bool,
    pub footer: bool,
    pub noheader: bool,
    pub autowidth: bool,
    pub breakable: bool,
    pub unbreakable: bool,
}

impl TableOptions {
    /// Read the options from `%opt` shorthands and `options=`/`opts=`
    pub fn from_attributes(attrs: &AttributeList) -> Self {
        Self {
            header: attrs.has_option("header"),
            footer: attrs.has_option("footer"),
            noheader: attrs.has_option("noheader"),
            autowidth: attrs.has_option("autowidth"),
            breakable: attrs.has_option("breakable"),
            unbreakable: attrs.has_option("unbreakable"),
        }
    }
}

/// A parsed table block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    pub attributes: AttributeList,
    pub format: TableFormat,
    pub separator: char,
    pub column_count: usize,
    pub columns: Vec<TableColumn>,
    pub header_mode: HeaderMode,
    pub header: Option<TableRow>,
    pub body: Vec<TableRow>,
    pub footer: Option<TableRow>,
    pub location: SourcePosition,
}

impl Table {
    /// Header, body and footer rows in source order
    pub fn all_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.header
            .iter()
            .chain(self.body.iter())
            .chain(self.footer.iter())
    }

    pub fn row_count(&self) -> usize {
        self.all_rows().count()
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn options(&self) -> TableOptions {
        TableOptions::from_attributes(&self.attributes)
    }

    /// Frame value exactly as written
    pub fn frame(&self) -> Option<&str> {
        self.attributes.named("frame")
    }

    pub fn grid(&self) -> Option<&str> {
        self.attributes.named("grid")
    }

    pub fn stripes(&self) -> Option<&str> {
        self.attributes.named("stripes")
    }

    pub fn float(&self) -> Option<&str> {
        self.attributes.named("float")
    }

    pub fn width(&self) -> Option<&str> {
        self.attributes.named("width")
    }

    /// `caption=""` disables the caption label; a missing caption does not
    pub fn caption(&self) -> MaybeSet<String> {
        self.attributes.named("caption").map(str::to_string).into()
    }

    pub fn title(&self) -> Option<&str> {
        self.attributes.title()
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.id()
    }
}
