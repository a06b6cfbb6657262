//! Selection-scoped export driven by plain-text offsets, the way the quote
//! command resolves user-facing positions.

use canvas_core::document::{Point, Selection};
use canvas_core::markdown::selected_markdown;

use crate::common;

#[test]
fn offsets_select_across_heading_and_paragraph() {
    let (doc, rules) = common::import("# Title\n\nHello **world** now");

    // Plain projection: "Title\n\nHello world now".
    let start = doc.resolve_text_point(3).expect("start point");
    let end = doc.resolve_text_point(12).expect("end point");
    let selection = Selection::new(start, end);

    assert_eq!(
        selected_markdown(&doc, &selection, &rules).unwrap(),
        "# le\n\nHello"
    );
}

#[test]
fn offsets_around_a_styled_run_keep_its_markers() {
    let (doc, rules) = common::import("Hello **world** now");

    let start = doc.resolve_text_point(6).expect("start point");
    let end = doc.resolve_text_point(11).expect("end point");
    let selection = Selection::new(start, end);

    assert_eq!(
        selected_markdown(&doc, &selection, &rules).unwrap(),
        "**world**"
    );
}

#[test]
fn selecting_everything_matches_the_full_export() {
    let source = "# Title\n\nHello **world**\n\n- one\n- two";
    let (doc, rules) = common::import(source);

    let start = doc.resolve_text_point(0).expect("start point");
    let last = doc.last_leaf(doc.root());
    let end_offset = doc.text_content(last).chars().count();
    let selection = Selection::new(start, Point::new(last, end_offset));

    assert_eq!(
        selected_markdown(&doc, &selection, &rules).unwrap(),
        common::export(&doc, &rules)
    );
}

#[test]
fn past_end_offsets_clamp_to_the_last_leaf() {
    let (doc, rules) = common::import("Hello world");

    let start = doc.resolve_text_point(0).expect("start point");
    let end = doc.resolve_text_point(999).expect("clamped end point");
    let selection = Selection::new(start, end);

    assert_eq!(
        selected_markdown(&doc, &selection, &rules).unwrap(),
        "Hello world"
    );
}

#[test]
fn empty_documents_have_no_resolvable_points() {
    let (doc, _) = common::import("");
    assert!(doc.resolve_text_point(0).is_none());
}
