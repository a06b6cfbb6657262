//! Content extraction for arbitrary node lists
//!
//! The toolbar and the table transform both need markdown for a handful of
//! nodes at a time rather than the whole document: a run of inline text, a
//! slice of code lines, one table cell's content. `markdown_content` covers
//! those shapes without touching the tree.

use crate::document::{Document, NodeId, NodeKind, TextFormat};
use crate::error::CanvasError;
use crate::markdown::export::render_block;
use crate::markdown::rule::RuleSet;

/// Produce markdown for an ordered list of nodes.
///
/// Three shapes fall out of the node kinds:
/// - a run of code lines emits an open fence, the owning block's language,
///   and the raw text with no closing fence (the caret is mid-block, so the
///   run has no natural end);
/// - a run of plain inline nodes goes through the inline formatter and
///   concatenates with no separator;
/// - anything containing a block node renders blocks through the serializer,
///   with consecutive inline nodes grouped into one synthetic run, all
///   joined by blank lines.
pub fn markdown_content(
    doc: &Document,
    nodes: &[NodeId],
    rules: &RuleSet,
) -> Result<String, CanvasError> {
    if nodes.is_empty() {
        return Ok(String::new());
    }

    let has_block = nodes.iter().any(|&node| doc.kind(node).is_block());
    if !has_block {
        if is_code_run(doc, nodes) {
            return Ok(code_run_markdown(doc, nodes));
        }
        let mut out = String::new();
        for &node in nodes {
            out.push_str(&inline_markdown(doc, node));
        }
        return Ok(out);
    }

    let mut blocks: Vec<String> = Vec::new();
    let mut run = String::new();
    for &node in nodes {
        if doc.kind(node).is_block() {
            if !run.is_empty() {
                blocks.push(std::mem::take(&mut run));
            }
            let rendered = render_block(doc, node, rules)?;
            if !rendered.is_empty() {
                blocks.push(rendered);
            }
        } else {
            run.push_str(&inline_markdown(doc, node));
        }
    }
    if !run.is_empty() {
        blocks.push(run);
    }
    Ok(blocks.join("\n\n"))
}

/// A run of code lines: code text nodes, optionally separated by line
/// breaks.
fn is_code_run(doc: &Document, nodes: &[NodeId]) -> bool {
    nodes.iter().any(|&node| doc.kind(node).is_code_text())
        && nodes
            .iter()
            .all(|&node| doc.kind(node).is_code_text() || doc.kind(node).is_line_break())
}

/// Open fence + language + raw text, no closing fence.
fn code_run_markdown(doc: &Document, nodes: &[NodeId]) -> String {
    let language = nodes
        .iter()
        .find(|&&node| doc.kind(node).is_code_text())
        .and_then(|&node| doc.parent(node))
        .and_then(|parent| match doc.kind(parent) {
            NodeKind::CodeBlock { language } => language.clone(),
            _ => None,
        })
        .unwrap_or_default();

    let mut text = String::new();
    for &node in nodes {
        match doc.kind(node) {
            NodeKind::CodeText { text: line } => text.push_str(line),
            NodeKind::LineBreak => text.push('\n'),
            _ => {}
        }
    }
    format!("```{language}\n{text}")
}

/// Markdown for a single inline node.
pub(crate) fn inline_markdown(doc: &Document, node: NodeId) -> String {
    match doc.kind(node) {
        NodeKind::Text { text, format } => apply_inline_format(text, *format),
        NodeKind::CodeText { text } => text.clone(),
        NodeKind::LineBreak => "\n".to_string(),
        NodeKind::Link { url } => {
            let mut inner = String::new();
            for &child in doc.children(node) {
                inner.push_str(&inline_markdown(doc, child));
            }
            format!("[{inner}]({url})")
        }
        _ => doc.text_content(node),
    }
}

/// Wrap a text run in markers for its active formats, outermost to
/// innermost: bold, italic, strikethrough, code. Closing markers mirror the
/// opening ones, and code sits innermost so its span stays literal. Leading
/// and trailing whitespace stays outside the markers; a whitespace-only run
/// comes back untouched.
pub fn apply_inline_format(text: &str, format: TextFormat) -> String {
    if format.is_empty() {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    let core = &text[start..end];
    if core.is_empty() {
        return text.to_string();
    }

    let mut wrapped = core.to_string();
    if format.contains(TextFormat::CODE) {
        wrapped = format!("`{wrapped}`");
    }
    if format.contains(TextFormat::STRIKETHROUGH) {
        wrapped = format!("~~{wrapped}~~");
    }
    if format.contains(TextFormat::ITALIC) {
        wrapped = format!("*{wrapped}*");
    }
    if format.contains(TextFormat::BOLD) {
        wrapped = format!("**{wrapped}**");
    }
    format!("{}{}{}", &text[..start], wrapped, &text[end..])
}
