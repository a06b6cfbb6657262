//! CLI-specific document views
//!
//! This module defines the views available to the `inspect` command. Each
//! view imports the markdown source into a document tree and renders that
//! tree in a different shape.
//!
//! ## Views
//!
//! - `tree`:   One node per line with indentation for depth. Shows node ids,
//!   attributes (heading level, code language, header cells), text previews,
//!   and style bits.
//! - `blocks`: Top-level blocks as pretty-printed JSON, one object per block
//!   with its kind, child count, and a text excerpt.
//! - `text`:   The plain-text projection of the whole document.
//!
//! ## Extra Parameters
//!
//! Views honor the `[inspect]` configuration section, and the CLI layer maps
//! `--extra-*` flags onto it:
//!
//! - `node-ids`: show or hide the numeric node id per line (tree view)
//! - `show-formats`: show or hide style bits on text nodes (tree view)
//! - `preview-length`: longest text excerpt before truncation
//!
//! Example: `canvas inspect draft.md tree --extra-node-ids false`

use canvas_config::{CanvasConfig, InspectConfig};
use canvas_core::document::{Document, NodeId, NodeKind, TextFormat};
use canvas_core::markdown::{default_rules, import_markdown, RuleSet};

/// All available inspect views
pub const AVAILABLE_VIEWS: &[&str] = &["tree", "blocks", "text"];

/// Render a named view of a markdown source.
///
/// The source is imported with the block transform rules when
/// `format.promote` is set, so typed-style table rows show up as native
/// tables, the same way the editor would hold them.
pub fn render_view(
    source: &str,
    view_name: &str,
    config: &CanvasConfig,
) -> Result<String, String> {
    let rules = if config.format.promote {
        default_rules()
    } else {
        RuleSet::new()
    };
    let doc = import_markdown(source, &rules);

    match view_name {
        "tree" => Ok(render_tree(&doc, &config.inspect)),
        "blocks" => serde_json::to_string_pretty(&blocks_to_json(&doc))
            .map_err(|e| format!("JSON serialization failed: {e}")),
        "text" => Ok(doc.text_content(doc.root())),
        _ => Err(format!("Unknown view: {view_name}")),
    }
}

fn render_tree(doc: &Document, config: &InspectConfig) -> String {
    let mut out = String::new();
    render_tree_node(doc, doc.root(), 0, config, &mut out);
    out
}

fn render_tree_node(
    doc: &Document,
    id: NodeId,
    depth: usize,
    config: &InspectConfig,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push_str(doc.kind(id).label());
    if config.tree.show_node_ids {
        out.push(' ');
        out.push_str(&id.to_string());
    }

    match doc.kind(id) {
        NodeKind::Heading { level } => out.push_str(&format!(" level={level}")),
        NodeKind::CodeBlock {
            language: Some(language),
        } => out.push_str(&format!(" lang={language}")),
        NodeKind::List { ordered, start } => {
            if *ordered {
                out.push_str(&format!(" ordered start={start}"));
            } else {
                out.push_str(" unordered");
            }
        }
        NodeKind::TableCell { header: true } => out.push_str(" header"),
        NodeKind::Link { url } => out.push_str(&format!(" url={url}")),
        NodeKind::Text { text, format } => {
            let preview = truncate_chars(text, config.preview.max_text_length);
            out.push_str(&format!(" {preview:?}"));
            if config.tree.show_formats && !format.is_empty() {
                out.push_str(&format!(" [{}]", format_names(*format)));
            }
        }
        NodeKind::CodeText { text } => {
            let preview = truncate_chars(text, config.preview.max_text_length);
            out.push_str(&format!(" {preview:?}"));
        }
        _ => {}
    }
    out.push('\n');

    for child in doc.children(id) {
        render_tree_node(doc, *child, depth + 1, config, out);
    }
}

fn format_names(format: TextFormat) -> String {
    let mut names = Vec::new();
    if format.contains(TextFormat::BOLD) {
        names.push("bold");
    }
    if format.contains(TextFormat::ITALIC) {
        names.push("italic");
    }
    if format.contains(TextFormat::CODE) {
        names.push("code");
    }
    if format.contains(TextFormat::STRIKETHROUGH) {
        names.push("strike");
    }
    names.join(",")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push('…');
        out
    }
}

/// Top-level block summary, one JSON object per block.
fn blocks_to_json(doc: &Document) -> serde_json::Value {
    use serde_json::json;

    json!(doc
        .children(doc.root())
        .iter()
        .map(|id| {
            let text = doc.text_content(*id);
            json!({
                "kind": doc.kind(*id).label(),
                "children": doc.child_count(*id),
                "text": truncate_chars(&text, 80),
            })
        })
        .collect::<Vec<_>>())
}
