//! Regression tests for table parsing

use super::*;
use crate::core::ast::{Element, Inline};
use crate::utils::error::ParseOutput;
use crate::{parse_document, parse_document_with_options, ParseOptions};
use pretty_assertions::assert_eq;

fn parse(source: &str) -> ParseOutput {
    parse_document(source).unwrap()
}

fn first_table(output: &ParseOutput) -> &Table {
    output.document.tables().next().expect("no table parsed")
}

/// Plain text of a cell, placeholders as `~`
fn cell_text(cell: &TableCell) -> String {
    let Some(cell) = cell.as_cell() else {
        return "~".to_string();
    };
    cell.elements()
        .iter()
        .map(|e| match e {
            Element::Paragraph(p) => Inline::plain_text(&p.content),
            Element::Literal(l) => l.content.clone(),
            other => format!("{:?}", other),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn row_texts(row: &TableRow) -> Vec<String> {
    row.cells.iter().map(cell_text).collect()
}

fn body_texts(table: &Table) -> Vec<Vec<String>> {
    table.body.iter().map(row_texts).collect()
}

#[test]
fn test_implicit_header() {
    let output = parse("|===\n|A|B|C\n\n|x|y|z\n|1|2|3\n|===");
    let table = first_table(&output);

    assert_eq!(table.header_mode, HeaderMode::ImplicitHeader);
    assert_eq!(row_texts(table.header.as_ref().unwrap()), vec!["A", "B", "C"]);
    assert_eq!(
        body_texts(table),
        vec![vec!["x", "y", "z"], vec!["1", "2", "3"]]
    );
    assert!(table.header.as_ref().unwrap().real_cells().all(|c| c.style == CellStyle::Header));
}

#[test]
fn test_no_header_without_blank_line() {
    let output = parse("|===\n|A|B\n|x|y\n|===");
    let table = first_table(&output);
    assert_eq!(table.header_mode, HeaderMode::NoHeader);
    assert_eq!(table.body.len(), 2);
}

#[test]
fn test_header_disqualified_by_multiline_cell() {
    let output = parse("[cols=\"2*\"]\n|===\n|A\n|B\n\n|x\n|y\n|===");
    let table = first_table(&output);
    // the first row spans two lines
    assert_eq!(table.header_mode, HeaderMode::NoHeader);
}

#[test]
fn test_noheader_option() {
    let output = parse("[%noheader]\n|===\n|A|B\n\n|x|y\n|===");
    assert_eq!(first_table(&output).header_mode, HeaderMode::NoHeader);
}

#[test]
fn test_explicit_header_and_footer() {
    let output = parse("[options=\"header,footer\"]\n|===\n|H|H\n|x|y\n|F|F\n|===");
    let table = first_table(&output);
    assert_eq!(table.header_mode, HeaderMode::ExplicitHeader);
    assert_eq!(row_texts(table.header.as_ref().unwrap()), vec!["H", "H"]);
    assert_eq!(body_texts(table), vec![vec!["x", "y"]]);
    assert_eq!(row_texts(table.footer.as_ref().unwrap()), vec!["F", "F"]);
}

#[test]
fn test_colspan_placeholders() {
    let output = parse("|===\n2+|wide |c\n|1 |2 |3\n|===");
    let table = first_table(&output);
    assert_eq!(table.column_count, 3);
    assert_eq!(
        body_texts(table),
        vec![vec!["wide", "~", "c"], vec!["1", "2", "3"]]
    );
    assert_eq!(table.body[0].cells[0].as_cell().unwrap().colspan(), 2);
}

#[test]
fn test_rowspan_reserves_columns_below() {
    let output = parse("[cols=\"3*\"]\n|===\n.2+|A |B |C\n|D |E\n|F |G |H\n|===");
    let table = first_table(&output);
    assert_eq!(
        body_texts(table),
        vec![
            vec!["A", "B", "C"],
            vec!["~", "D", "E"],
            vec!["F", "G", "H"]
        ]
    );
    assert!(output.is_clean());
}

#[test]
fn test_combined_span() {
    let output = parse("[cols=\"3*\"]\n|===\n2.2+|X |a\n|b\n|c |d |e\n|===");
    let table = first_table(&output);
    assert_eq!(
        body_texts(table),
        vec![
            vec!["X", "~", "a"],
            vec!["~", "~", "b"],
            vec!["c", "d", "e"]
        ]
    );
}

#[test]
fn test_colspan_overflow_drops_row() {
    let output = parse("[cols=\"2*\"]\n|===\n|a 3+|b\n|c |d\n|===");
    let table = first_table(&output);
    assert_eq!(body_texts(table), vec![vec!["c", "d"]]);
    assert_eq!(output.diagnostics.errors, 1);
    assert_eq!(output.diagnostics.diagnostics[0].line, Some(3));
}

#[test]
fn test_overflow_on_last_cell() {
    let output = parse("[cols=\"2*\"]\n|===\n|a |b\n|c 2+|d\n|===");
    let table = first_table(&output);
    assert_eq!(body_texts(table), vec![vec!["a", "b"]]);
    assert_eq!(output.diagnostics.errors, 1);
}

#[test]
fn test_incomplete_final_row() {
    let output = parse("[cols=\"2*\"]\n|===\n|a |b\n|c\n|===");
    let table = first_table(&output);
    assert_eq!(body_texts(table), vec![vec!["a", "b"]]);
    assert_eq!(
        output.diagnostics.matching("incomplete row").count(),
        1
    );
}

#[test]
fn test_multiplier_repeats_cell() {
    let output = parse("[cols=\"3*\"]\n|===\n3*|x\n|===");
    let table = first_table(&output);
    assert_eq!(body_texts(table), vec![vec!["x", "x", "x"]]);
}

#[test]
fn test_missing_leading_separator() {
    let output = parse("|===\nfoo|bar\n|===");
    let table = first_table(&output);
    assert_eq!(body_texts(table), vec![vec!["foo", "bar"]]);
    let warnings: Vec<_> = output
        .diagnostics
        .matching("missing leading separator")
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].source_text.as_deref(), Some("foo|bar"));
    assert!(warnings[0].suggestion.as_deref().unwrap().contains('|'));
}

#[test]
fn test_dsv_table() {
    let output = parse(":===\na:b\nc\\:d:e\n:===");
    let table = first_table(&output);
    assert_eq!(table.format(), TableFormat::Dsv);
    assert_eq!(body_texts(table), vec![vec!["a", "b"], vec!["c:d", "e"]]);
}

#[test]
fn test_dsv_trailing_delimiter() {
    let output = parse(":===\na:b:\nc:d:e\n:===");
    let table = first_table(&output);
    assert_eq!(table.column_count, 3);
    assert_eq!(body_texts(table), vec![vec!["a", "b", ""], vec!["c", "d", "e"]]);
}

#[test]
fn test_csv_quotes() {
    let output = parse(",===\n\"a, b\",\"say \"\"hi\"\"\"\n\"multi\nline\",x\n,===");
    let table = first_table(&output);
    assert_eq!(
        body_texts(table),
        vec![vec!["a, b", "say \"hi\""], vec!["multi\nline", "x"]]
    );
}

#[test]
fn test_csv_unclosed_quote() {
    let output = parse(",===\na,\"open\nstill open\n,===");
    let table = first_table(&output);
    assert_eq!(output.diagnostics.errors, 1);
    assert_eq!(body_texts(table), vec![vec!["a", "open\nstill open"]]);
}

#[test]
fn test_format_attribute_and_separator() {
    let output = parse("[format=csv,separator=;]\n|===\na;b\n|===");
    let table = first_table(&output);
    assert_eq!(table.format(), TableFormat::Csv);
    assert_eq!(table.separator(), ';');
    assert_eq!(body_texts(table), vec![vec!["a", "b"]]);
}

#[test]
fn test_custom_psv_separator() {
    let output = parse("[separator=¦]\n|===\n¦x¦y\n|===");
    let table = first_table(&output);
    assert_eq!(table.separator(), '¦');
    assert_eq!(body_texts(table), vec![vec!["x", "y"]]);
}

#[test]
fn test_cell_style_wins_over_column_style() {
    let output = parse("[cols=\"e,e\"]\n|===\n|x s|y\n|===");
    let table = first_table(&output);
    let styles: Vec<CellStyle> = table.body[0].real_cells().map(|c| c.style).collect();
    assert_eq!(styles, vec![CellStyle::Emphasis, CellStyle::Strong]);
    let cell = table.body[0].cells[1].as_cell().unwrap();
    let Element::Paragraph(p) = &cell.elements()[0] else {
        panic!("expected paragraph");
    };
    assert!(matches!(p.content[0], Inline::Strong(_)));
}

#[test]
fn test_header_ignores_column_style() {
    let output = parse("[cols=\"a,l\"]\n|===\n|*A* |B\n\n|* item |  kept\n|===");
    let table = first_table(&output);
    let header = table.header.as_ref().unwrap();
    assert!(header.real_cells().all(|c| c.style == CellStyle::Header));
    let body = &table.body[0];
    assert_eq!(body.cells[0].as_cell().unwrap().style, CellStyle::AsciiDoc);
    assert_eq!(body.cells[1].as_cell().unwrap().style, CellStyle::Literal);
}

#[test]
fn test_alignment_resolution() {
    let output = parse("[cols=\"^,>.^\"]\n|===\n|a <|b\n|===");
    let table = first_table(&output);
    let cells: Vec<&Cell> = table.body[0].real_cells().collect();
    assert_eq!(cells[0].halign, HorizontalAlign::Center);
    assert_eq!(cells[1].halign, HorizontalAlign::Left);
    assert_eq!(cells[1].valign, VerticalAlign::Middle);
}

#[test]
fn test_literal_cell() {
    let output = parse("|===\nl|\n  keep  *this*\n    indented\n|===");
    let table = first_table(&output);
    assert_eq!(body_texts(table), vec![vec!["  keep  *this*\n    indented"]]);
}

#[test]
fn test_default_cell_paragraphs() {
    let output = parse("|===\n|first para\n\nsecond para\n|===");
    let table = first_table(&output);
    let cell = table.body[0].cells[0].as_cell().unwrap();
    assert_eq!(cell.elements().len(), 2);
}

#[test]
fn test_attribute_only_line_does_not_split_paragraph() {
    let output = parse(":empty-attr:\n\n|===\n|one\n{empty-attr}\ntwo\n|===");
    let table = first_table(&output);
    let cell = table.body[0].cells[0].as_cell().unwrap();
    assert_eq!(cell.elements().len(), 1);
    assert_eq!(cell_text(&table.body[0].cells[0]), "one\ntwo");
}

#[test]
fn test_cell_background_persists() {
    let output = parse("|===\n|{set:cellbgcolor:#ff0000}red |still\n|{set:cellbgcolor!}plain |x\n|===");
    let table = first_table(&output);
    let backgrounds: Vec<Option<&str>> = table
        .body
        .iter()
        .flat_map(|r| r.real_cells())
        .map(|c| c.background.as_deref())
        .collect();
    assert_eq!(
        backgrounds,
        vec![Some("#ff0000"), Some("#ff0000"), None, None]
    );
}

#[test]
fn test_column_percentages() {
    let output = parse("[cols=\"1,2,1\"]\n|===\n|a |b |c\n|===");
    let table = first_table(&output);
    let percentages: Vec<Option<f64>> = table.columns.iter().map(|c| c.percentage).collect();
    assert_eq!(percentages, vec![Some(25.0), Some(50.0), Some(25.0)]);
}

#[test]
fn test_autowidth_has_no_percentages() {
    let output = parse("[%autowidth]\n|===\n|a |b\n|===");
    let table = first_table(&output);
    assert!(table.columns.iter().all(|c| c.percentage.is_none()));
}

#[test]
fn test_table_properties() {
    let output = parse(
        ".Prices\n[#price-table,frame=ends,grid=rows,stripes=even,caption=\"\",width=50%]\n|===\n|a\n|===",
    );
    let table = first_table(&output);
    assert_eq!(table.title(), Some("Prices"));
    assert_eq!(table.id(), Some("price-table"));
    assert_eq!(table.frame(), Some("ends"));
    assert_eq!(table.grid(), Some("rows"));
    assert_eq!(table.stripes(), Some("even"));
    assert_eq!(table.width(), Some("50%"));
    assert_eq!(table.caption(), crate::core::value::MaybeSet::Set(String::new()));
    assert!(output.document.references.contains("price-table"));
}

#[test]
fn test_caption_absent_is_unset() {
    let output = parse("|===\n|a\n|===");
    assert!(!first_table(&output).caption().is_set());
}

#[test]
fn test_unterminated_table() {
    let output = parse("|===\n|a |b\n|c |d");
    let table = first_table(&output);
    assert_eq!(table.body.len(), 2);
    assert_eq!(output.diagnostics.matching("unterminated table").count(), 1);
}

#[test]
fn test_nested_table() {
    let output = parse("|===\na|\n!===\n!x !y\n!===\n|===");
    let table = first_table(&output);
    let doc = table.body[0].cells[0].as_cell().unwrap().document().unwrap();
    let inner = doc.tables().next().unwrap();
    assert_eq!(inner.separator(), '!');
    assert_eq!(body_texts(inner), vec![vec!["x", "y"]]);
}

#[test]
fn test_nested_diagnostic_position() {
    // cell text starts on line 3, the bad row is on line 5 of the outer source
    let output = parse("|===\na|\n[cols=\"2*\"]\n!===\n!a 3+!b\n!===\n|===");
    let diag = output
        .diagnostics
        .iter()
        .find(|d| d.message.contains("dropping row"))
        .unwrap();
    assert_eq!(diag.line, Some(5));
}

#[test]
fn test_lenient_cell_failure() {
    let output = parse("|===\na|include::gone.adoc[] |ok\n|===");
    let table = first_table(&output);
    let cell = table.body[0].cells[0].as_cell().unwrap();
    assert!(matches!(cell.content, CellContent::Failed { .. }));
    assert_eq!(cell_text(&table.body[0].cells[1]), "ok");
    assert!(output.fatal.is_some());

    let strict = parse_document_with_options(
        "|===\na|include::gone.adoc[] |ok\n|===",
        ParseOptions::strict(),
    );
    assert!(strict.is_err());
}

#[test]
fn test_empty_table() {
    let output = parse("|===\n|===");
    let table = first_table(&output);
    assert_eq!(table.column_count, 0);
    assert!(table.body.is_empty());
}
