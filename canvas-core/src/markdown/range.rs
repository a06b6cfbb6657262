//! Selection-scoped markdown
//!
//! Serializes just the content a selection covers, with exact character
//! offsets at both boundary nodes. The source document is never touched:
//! the in-range nodes are projected into a scratch document (boundary text
//! runs sliced by offset) and the ordinary exporter runs over that, so
//! rule-owned shapes like table rows come out the same way they would in a
//! full export.

use crate::document::{Document, NodeId, NodeKind, Point, Selection};
use crate::error::CanvasError;
use crate::markdown::export::export_markdown;
use crate::markdown::rule::RuleSet;

/// Markdown for the content a selection covers. A collapsed selection
/// yields the empty string; direction does not matter.
pub fn selected_markdown(
    doc: &Document,
    selection: &Selection,
    rules: &RuleSet,
) -> Result<String, CanvasError> {
    validate_point(doc, &selection.anchor)?;
    validate_point(doc, &selection.focus)?;
    if selection.is_collapsed() {
        return Ok(String::new());
    }
    let (start, end) = selection.normalized(doc);
    export_range(doc, Some(start), Some(end), rules)
}

/// Markdown for everything strictly before `point`, used to locate a quoted
/// selection inside the serialized artifact.
pub fn markdown_up_to(doc: &Document, point: Point, rules: &RuleSet) -> Result<String, CanvasError> {
    validate_point(doc, &point)?;
    export_range(doc, None, Some(point), rules)
}

fn validate_point(doc: &Document, point: &Point) -> Result<(), CanvasError> {
    if !doc.contains(point.node) {
        return Err(CanvasError::NodeNotFound(point.node));
    }
    Ok(())
}

fn export_range(
    doc: &Document,
    start: Option<Point>,
    end: Option<Point>,
    rules: &RuleSet,
) -> Result<String, CanvasError> {
    let scratch = project_range(doc, start.as_ref(), end.as_ref());
    export_markdown(&scratch, rules)
}

/// Copy the in-range slice of `doc` into a fresh document.
///
/// A node is in range when its tree path is not ordered before the start
/// path (ancestors of the start node count as in range) and not ordered
/// after the end path. Boundary text runs are sliced by character offset;
/// a boundary run that slices to nothing is dropped so it cannot leave an
/// empty marker pair behind.
fn project_range(doc: &Document, start: Option<&Point>, end: Option<&Point>) -> Document {
    let start_path = start.map(|point| doc.path(point.node));
    let end_path = end.map(|point| doc.path(point.node));
    let mut scratch = Document::new();
    let scratch_root = scratch.root();
    let mut path = Vec::new();
    copy_children(
        doc,
        doc.root(),
        &mut scratch,
        scratch_root,
        start,
        start_path.as_deref(),
        end,
        end_path.as_deref(),
        &mut path,
    );
    scratch
}

#[allow(clippy::too_many_arguments)]
fn copy_children(
    src: &Document,
    src_node: NodeId,
    dst: &mut Document,
    dst_node: NodeId,
    start: Option<&Point>,
    start_path: Option<&[usize]>,
    end: Option<&Point>,
    end_path: Option<&[usize]>,
    path: &mut Vec<usize>,
) {
    let children: Vec<NodeId> = src.children(src_node).to_vec();
    for (index, child) in children.into_iter().enumerate() {
        path.push(index);
        copy_node(src, child, dst, dst_node, start, start_path, end, end_path, path);
        path.pop();
    }
}

#[allow(clippy::too_many_arguments)]
fn copy_node(
    src: &Document,
    node: NodeId,
    dst: &mut Document,
    dst_parent: NodeId,
    start: Option<&Point>,
    start_path: Option<&[usize]>,
    end: Option<&Point>,
    end_path: Option<&[usize]>,
    path: &mut Vec<usize>,
) {
    if let Some(end_path) = end_path {
        if path.as_slice() > end_path {
            return;
        }
    }
    if let Some(start_path) = start_path {
        if path.as_slice() < start_path && !start_path.starts_with(path) {
            return;
        }
    }

    let starts_here = start.is_some_and(|point| point.node == node);
    let ends_here = end.is_some_and(|point| point.node == node);

    match src.kind(node) {
        NodeKind::Text { text, format } => {
            let sliced = slice_run(text, starts_here.then(|| start_offset(start)), ends_here.then(|| end_offset(end)));
            if sliced.is_empty() && (starts_here || ends_here) {
                return;
            }
            let copy = dst.create_node(NodeKind::Text { text: sliced, format: *format });
            dst.append_child(dst_parent, copy);
        }
        NodeKind::CodeText { text } => {
            let sliced = slice_run(text, starts_here.then(|| start_offset(start)), ends_here.then(|| end_offset(end)));
            if sliced.is_empty() && (starts_here || ends_here) {
                return;
            }
            let copy = dst.create_node(NodeKind::code_text(sliced));
            dst.append_child(dst_parent, copy);
        }
        kind => {
            let copy = dst.create_node(kind.clone());
            dst.append_child(dst_parent, copy);
            copy_children(src, node, dst, copy, start, start_path, end, end_path, path);
        }
    }
}

fn start_offset(start: Option<&Point>) -> usize {
    start.map(|point| point.offset).unwrap_or(0)
}

fn end_offset(end: Option<&Point>) -> usize {
    end.map(|point| point.offset).unwrap_or(usize::MAX)
}

/// Slice a text run by character offsets, `from` inclusive, `to` exclusive.
fn slice_run(text: &str, from: Option<usize>, to: Option<usize>) -> String {
    let total = text.chars().count();
    let from = from.unwrap_or(0).min(total);
    let to = to.unwrap_or(total).min(total).max(from);
    text.chars().skip(from).take(to - from).collect()
}
