//! Integration tests for tabledoc document and table parsing

use rstest::rstest;
use tabledoc::table::{columns_to_spec, parse_column_spec};
use tabledoc::{
    parse_document, parse_document_with_options, parse_document_with_resolver, CellContent,
    Document, Element, HeaderMode, Inline, MemoryFileResolver, ParseOptions, ParseOutput, Table,
    TableCell, TableRow,
};

fn parse(source: &str) -> ParseOutput {
    parse_document(source).unwrap()
}

fn first_table(doc: &Document) -> &Table {
    doc.tables().next().expect("no table parsed")
}

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

/// The nested document of the first cell of the first body row
fn first_cell_document(doc: &Document) -> &Document {
    first_table(doc).body[0].cells[0]
        .as_cell()
        .and_then(|c| c.document())
        .expect("first cell is not an asciidoc cell")
}

// ============================================================================
// Header Detection
// ============================================================================

mod headers {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_line_makes_implicit_header() {
        let output = parse("[cols=\"3*\"]\n|===\n|A|B|C\n\n|x|y|z\n|1|2|3\n|===");
        let table = first_table(&output.document);

        assert_eq!(table.header_mode, HeaderMode::ImplicitHeader);
        assert_eq!(row_texts(table.header.as_ref().unwrap()), vec!["A", "B", "C"]);
        assert_eq!(table.body.len(), 2);
        assert_eq!(row_texts(&table.body[1]), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_adjacent_rows_have_no_header() {
        let output = parse("|===\n|A|B\n|1|2\n|===");
        let table = first_table(&output.document);
        assert_eq!(table.header_mode, HeaderMode::NoHeader);
        assert!(table.header.is_none());
        assert_eq!(table.body.len(), 2);
    }

    #[test]
    fn test_header_and_footer_options() {
        let output = parse("[%header%footer]\n|===\n|H1|H2\n|x|y\n|F1|F2\n|===");
        let table = first_table(&output.document);
        assert_eq!(table.header_mode, HeaderMode::ExplicitHeader);
        assert_eq!(row_texts(table.footer.as_ref().unwrap()), vec!["F1", "F2"]);
        assert_eq!(table.body.len(), 1);
    }
}

// ============================================================================
// Body Formats
// ============================================================================

mod formats {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_quoted_field_keeps_commas() {
        let output = parse(",===\n1997,Ford,E350,\"ac, abs, moon\",3000.00\n,===");
        let table = first_table(&output.document);
        assert_eq!(table.column_count, 5);
        assert_eq!(
            row_texts(&table.body[0]),
            vec!["1997", "Ford", "E350", "ac, abs, moon", "3000.00"]
        );
    }

    #[test]
    fn test_dsv_rows() {
        let output = parse(":===\nroot:x:0\nbin:x:1\n:===");
        let table = first_table(&output.document);
        assert_eq!(table.column_count, 3);
        assert_eq!(row_texts(&table.body[1]), vec!["bin", "x", "1"]);
    }

    #[test]
    fn test_escaped_separators() {
        let output = parse("|===\n|a\\|b |c \\|\n|===");
        let table = first_table(&output.document);
        assert_eq!(row_texts(&table.body[0]), vec!["a|b", "c \\|"]);
    }

    #[test]
    fn test_csv_doubled_quote() {
        let output = parse("[format=csv]\n|===\n\"say \"\"hi\"\"\",plain\n|===");
        let table = first_table(&output.document);
        assert_eq!(row_texts(&table.body[0]), vec!["say \"hi\"", "plain"]);
    }
}

// ============================================================================
// Spans and Grid Assembly
// ============================================================================

mod spans {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case("[cols=\"3*\"]\n|===\n|a1 |a2 |a3\n|b1 2+|b2\n|===")]
    #[case("[cols=\"3*\"]\n|===\n.2+|tall |x |y\n|p |q\n|===")]
    #[case("[cols=\"3*\"]\n|===\n2.2+|block |x\n|y\n|z |w |v\n|===")]
    #[case("[cols=\"3*\"]\n|===\n3*|same\n|===")]
    fn test_rows_fill_every_column(#[case] source: &str) {
        let output = parse(source);
        let table = first_table(&output.document);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        for row in table.all_rows() {
            let width: usize = row.cells.len();
            assert_eq!(width, 3, "{:?}", row_texts(row));
        }
    }

    #[test]
    fn test_colspan_leaves_placeholders() {
        let output = parse("[cols=\"4*\"]\n|===\n|x 3+|wide\n|===");
        let row = &first_table(&output.document).body[0];
        assert_eq!(row_texts(row), vec!["x", "wide", "~", "~"]);
    }

    #[test]
    fn test_span_overflow_drops_only_that_row() {
        let output = parse("[cols=\"2*\"]\n|===\n|a1 |a2\n3+|too wide\n|c1 |c2\n|===");
        let table = first_table(&output.document);
        let rows: Vec<_> = table.body.iter().map(row_texts).collect();
        assert_eq!(rows, vec![vec!["a1", "a2"], vec!["c1", "c2"]]);
        assert_eq!(output.diagnostics.matching("dropping row").count(), 1);
    }
}

// ============================================================================
// Nested Cell Documents
// ============================================================================

mod nested_documents {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOC_IN_CELL: &str = "|===\na|:toc:\n\ncell text\n|===";

    #[test]
    fn test_cell_enables_toc_unset_by_caller() {
        let options = ParseOptions::new().unset_attribute("toc");
        let output = parse_document_with_options(TOC_IN_CELL, options).unwrap();
        assert!(!output.document.has_toc());
        assert!(first_cell_document(&output.document).has_toc());
    }

    #[test]
    fn test_locked_toc_stays_unset_in_cell() {
        let options = ParseOptions::new()
            .unset_attribute("toc")
            .lock_attribute("toc");
        let output = parse_document_with_options(TOC_IN_CELL, options).unwrap();
        assert!(!first_cell_document(&output.document).has_toc());
    }

    #[test]
    fn test_hard_attribute_survives_cell_assignment() {
        let options = ParseOptions::new().set_attribute("product", "Widget");
        let source = "|===\na|:product: Gadget\n\n{product}\n|===";
        let output = parse_document_with_options(source, options).unwrap();
        let cell = first_cell_document(&output.document);
        assert_eq!(cell.attribute("product"), Some("Widget"));
    }

    #[test]
    fn test_cell_inherits_soft_attributes_without_leaking_back() {
        let source = ":version: 1.0\n\n|===\na|:version: 2.0\n\n{version}\n|===\n\n{version}";
        let output = parse(source);
        let cell = first_cell_document(&output.document);
        assert_eq!(cell.attribute("version"), Some("2.0"));
        assert_eq!(output.document.attribute("version"), Some("1.0"));

        let Element::Paragraph(after) = &output.document.blocks[1] else {
            panic!("expected a paragraph after the table");
        };
        assert_eq!(Inline::plain_text(&after.content), "1.0");
    }

    #[test]
    fn test_doctype_resets_in_cell() {
        let output = parse(":doctype: book\n\n|===\na|text\n|===");
        assert_eq!(output.document.doctype(), "book");
        let cell = first_cell_document(&output.document);
        assert_eq!(cell.doctype(), "article");
        assert!(cell.attributes.is_set("doctype-article"));
        assert!(!cell.attributes.is_set("doctype-book"));
    }

    #[test]
    fn test_caller_doctype_applies_to_cells() {
        let options = ParseOptions::new().set_attribute("doctype", "book");
        let output = parse_document_with_options("|===\na|text\n|===", options).unwrap();
        assert_eq!(first_cell_document(&output.document).doctype(), "book");
    }

    #[test]
    fn test_compat_mode_can_be_cleared_in_cell() {
        let options = ParseOptions::new().set_attribute("compat-mode", "");
        let source = "|===\na|:compat-mode!:\n\ntext\n|===";
        let output = parse_document_with_options(source, options).unwrap();
        assert!(output.document.attributes.is_set("compat-mode"));
        assert!(!first_cell_document(&output.document)
            .attributes
            .is_set("compat-mode"));
    }

    #[test]
    fn test_cell_has_no_title() {
        let output = parse("= Outer Title\n\n|===\na|text\n|===");
        assert_eq!(output.document.title.as_deref(), Some("Outer Title"));
        let cell = first_cell_document(&output.document);
        assert!(cell.title.is_none());
        assert!(!cell.attributes.is_set("doctitle"));
    }

    #[test]
    fn test_table_inside_cell() {
        let source = "[cols=\"1,a\"]\n|===\n|outer\n|\n[cols=\"2*\"]\n!===\n!x !y\n!===\n|===";
        let output = parse(source);
        let table = first_table(&output.document);
        let inner_doc = table.body[0].cells[1].as_cell().unwrap().document().unwrap();
        let inner = first_table(inner_doc);
        assert_eq!(inner.separator, '!');
        assert_eq!(row_texts(&inner.body[0]), vec!["x", "y"]);
    }

    #[test]
    fn test_cell_documents_compare_by_content() {
        let source = "[[top]]\n[cols=\"2*a\"]\n|===\n|see <<top>> |other\n|===";
        let first = parse(source);
        let second = parse(source);
        assert_eq!(first.document, second.document);

        let table = first_table(&first.document);
        let left = &table.body[0].cells[0].as_cell().unwrap().content;
        let right = &table.body[0].cells[1].as_cell().unwrap().content;
        assert_ne!(left, right);
    }
}

// ============================================================================
// Anchors and Cross References
// ============================================================================

mod references {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_anchor_joins_outer_catalog() {
        let source = "|===\na|[[cell-anchor]]\nInside.\n|===\n\nSee <<cell-anchor>>.";
        let output = parse(source);
        assert!(output.document.references.contains("cell-anchor"));
        assert_eq!(
            output.diagnostics.matching("possible invalid reference").count(),
            0
        );
    }

    #[test]
    fn test_cell_can_reference_outer_section() {
        let source = "== Setup\n\n|===\na|See <<_setup>>.\n|===";
        let output = parse(source);
        assert_eq!(
            output.diagnostics.matching("possible invalid reference").count(),
            0
        );
    }

    #[test]
    fn test_duplicate_anchor_across_cells_warns() {
        let source = "|===\na|[[dup]]\nOne.\na|[[dup]]\nTwo.\n|===";
        let output = parse(source);
        assert_eq!(output.diagnostics.matching("already in use").count(), 1);
    }

    #[test]
    fn test_nested_catalog_is_empty() {
        let output = parse("|===\na|[[inside]]\ntext\n|===");
        assert!(first_cell_document(&output.document).references.is_empty());
    }
}

// ============================================================================
// Footnotes
// ============================================================================

mod footnotes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_footnotes_are_separate() {
        let source = "Outer.footnote:[outer note]\n\n|===\na|Inner.footnote:[inner note]\n|===";
        let output = parse(source);
        assert_eq!(output.document.footnotes.len(), 1);

        let cell = first_cell_document(&output.document);
        assert_eq!(cell.footnotes.len(), 1);
        assert_eq!(cell.footnotes[0].number, 1);
        assert_eq!(
            Inline::plain_text(&cell.footnotes[0].content),
            "inner note"
        );
    }

    #[test]
    fn test_plain_cell_footnotes_belong_to_outer_document() {
        let output = parse("First.footnote:[one]\n\n|===\n|Cell.footnote:[two]\n|===");
        let numbers: Vec<usize> = output.document.footnotes.iter().map(|f| f.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}

// ============================================================================
// Callouts
// ============================================================================

mod callouts {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_callouts_numbered_across_cells() {
        let source = "\
== One

|===
a|
----
first <1>
----
|===

== Two

|===
a|
----
second <1>
----
|===

----
third <1>
----
";
        let output = parse(source);
        let mut ordinals = Vec::new();
        output.document.walk(&mut |element| {
            if let Element::Listing(listing) = element {
                for line in &listing.lines {
                    ordinals.extend(line.callouts.iter().map(|c| c.ordinal));
                }
            }
        });
        assert_eq!(ordinals, vec![1, 2, 3]);
    }
}

// ============================================================================
// Includes and Positions
// ============================================================================

mod includes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_diagnostic_points_into_included_file() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("rows.adoc", "|===\na|first\n\n----\nnever closed\n|===");
        let options = ParseOptions::new().with_file_name("main.adoc");
        let output =
            parse_document_with_resolver("= Main\n\ninclude::rows.adoc[]", &resolver, options)
                .unwrap();

        let diag = output
            .diagnostics
            .matching("unterminated")
            .next()
            .expect("expected an unterminated block warning");
        assert_eq!(diag.file.as_deref(), Some("rows.adoc"));
        assert_eq!(diag.line, Some(4));
    }

    #[test]
    fn test_included_rows_become_table_rows() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("body.adoc", "|x |y\n|z |w");
        let source = "|===\n|A |B\n\ninclude::body.adoc[]\n|===";
        let output =
            parse_document_with_resolver(source, &resolver, ParseOptions::default()).unwrap();
        let table = first_table(&output.document);
        assert_eq!(table.header_mode, HeaderMode::ImplicitHeader);
        assert_eq!(table.body.len(), 2);
    }

    #[test]
    fn test_missing_include_in_cell_is_contained() {
        let output = parse("|===\na|include::missing.adoc[]\n|ok\n|===");
        let table = first_table(&output.document);
        let cell = table.body[0].cells[0].as_cell().unwrap();
        assert!(matches!(cell.content, CellContent::Failed { .. }));
        assert_eq!(cell_text(&table.body[1].cells[0]), "ok");
        assert!(output.fatal.is_some());
    }

    #[test]
    fn test_missing_include_on_line_after_cell_prefix() {
        let output = parse("intro\n\n|===\na|\ninclude::missing.adoc[]\n|ok\n|===\n\nafter");
        let table = first_table(&output.document);
        let cell = table.body[0].cells[0].as_cell().unwrap();
        assert!(matches!(cell.content, CellContent::Failed { .. }));
        assert_eq!(cell_text(&table.body[1].cells[0]), "ok");
        assert_eq!(output.document.blocks.len(), 3);
        assert!(matches!(output.document.blocks[2], Element::Paragraph(_)));

        let position = output.fatal.as_ref().and_then(|e| e.position()).unwrap();
        assert_eq!((position.line, position.column), (5, 1));
        assert_eq!(output.diagnostics.matching("in table body").count(), 1);
    }

    #[test]
    fn test_missing_include_position_in_outer_source() {
        let output = parse("intro\n\n|===\n|x\na|include::missing.adoc[]\n|===");
        let position = output.fatal.as_ref().and_then(|e| e.position()).unwrap();
        assert_eq!(position.file, None);
        assert_eq!((position.line, position.column), (5, 3));
    }

    #[test]
    fn test_missing_include_position_in_doubly_nested_cell() {
        let source = "|===\na|outer cell\n\n!===\n!x\na!include::missing.adoc[]\n!===\n|===";
        let output = parse(source);

        let outer = first_table(&output.document).body[0].cells[0]
            .as_cell()
            .unwrap();
        assert!(matches!(outer.content, CellContent::Document(_)));

        let position = output.fatal.as_ref().and_then(|e| e.position()).unwrap();
        assert_eq!((position.line, position.column), (6, 3));
    }
}

// ============================================================================
// Column Specifiers
// ============================================================================

mod column_specs {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case("1,2,3")]
    #[case("3*")]
    #[case("<1,^2m,>.>3s")]
    #[case("2*25%,50%a")]
    #[case("~,~,1h")]
    #[case("1;2;e")]
    #[case("4*^.^l, 2")]
    fn test_canonical_spec_is_stable(#[case] spec: &str) {
        let columns = parse_column_spec(spec).unwrap();
        let canonical = columns_to_spec(&columns);
        let reparsed = parse_column_spec(&canonical).unwrap();
        assert_eq!(reparsed, columns);
        assert_eq!(columns_to_spec(&reparsed), canonical);
    }

    #[test]
    fn test_cols_attribute_sets_column_count() {
        let output = parse("[cols=\"1,1,2\"]\n|===\n|x |y |z\n|===");
        let table = first_table(&output.document);
        assert_eq!(table.column_count, 3);
        let total: f64 = table.columns.iter().filter_map(|c| c.percentage).sum();
        assert!((total - 100.0).abs() < 1e-6);
    }
}
