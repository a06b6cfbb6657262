//! Table assembly through the full typed-input and import pipelines.

use canvas_core::document::Document;
use canvas_core::markdown::default_rules;

use crate::common;

#[test]
fn typed_rows_assemble_between_prose_blocks() {
    let rules = default_rules();
    let mut doc = Document::new();

    common::type_line(&mut doc, &rules, "intro notes");
    common::type_line(&mut doc, &rules, "| a | b |");
    common::type_line(&mut doc, &rules, "| c | d |");
    common::type_line(&mut doc, &rules, "closing notes");

    assert_eq!(common::block_kinds(&doc), vec!["paragraph", "table", "paragraph"]);
}

#[test]
fn typed_table_with_divider_exports_with_header() {
    let rules = default_rules();
    let mut doc = Document::new();

    common::type_line(&mut doc, &rules, "| Name | Age |");
    common::type_line(&mut doc, &rules, "| --- | --- |");
    common::type_line(&mut doc, &rules, "| Bob | 30 |");

    let exported = common::export(&doc, &rules);
    assert_eq!(exported, "| Name | Age |\n| --- | --- |\n| Bob | 30 |");
}

#[test]
fn typed_row_joins_the_table_above_when_widths_match() {
    let rules = default_rules();
    let mut doc = Document::new();

    common::type_line(&mut doc, &rules, "| a | b |");
    common::type_line(&mut doc, &rules, "| c | d |");

    let blocks = doc.children(doc.root()).to_vec();
    assert_eq!(blocks.len(), 1);
    assert!(doc.kind(blocks[0]).is_table());
    assert_eq!(doc.child_count(blocks[0]), 2);
}

#[test]
fn typed_row_of_a_different_width_starts_a_new_table() {
    let rules = default_rules();
    let mut doc = Document::new();

    common::type_line(&mut doc, &rules, "| a | b |");
    common::type_line(&mut doc, &rules, "| x | y | z |");

    let blocks = doc.children(doc.root()).to_vec();
    assert_eq!(blocks.len(), 2);
    assert!(doc.kind(blocks[0]).is_table());
    assert!(doc.kind(blocks[1]).is_table());
    assert_eq!(doc.child_count(doc.children(blocks[0])[0]), 2);
    assert_eq!(doc.child_count(doc.children(blocks[1])[0]), 3);
}

#[test]
fn pasted_rows_promote_on_import_and_round_trip() {
    let source = "intro\n\n| a | b |\n| c | d |\n\nafter";
    let (doc, rules) = common::import(source);

    assert_eq!(common::block_kinds(&doc), vec!["paragraph", "table", "paragraph"]);
    assert_eq!(common::export(&doc, &rules), source);
}

#[test]
fn native_table_keeps_its_header_through_the_trip() {
    let source = "| Name | Age |\n| --- | --- |\n| Bob | 30 |";
    let (doc, rules) = common::import(source);

    assert_eq!(common::block_kinds(&doc), vec!["table"]);
    assert_eq!(common::export(&doc, &rules), source);
}
