//! Markdown parsing (markdown → document tree)
//!
//! Converts CommonMark markdown to a canvas document.
//! Pipeline: markdown string → comrak AST → document tree → promotion pass.

use crate::document::{Document, NodeId, NodeKind, TextFormat};
use crate::markdown::default_comrak_options;
use crate::markdown::rule::RuleSet;
use crate::markdown::table;
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena};

/// Parse markdown into a fresh document.
///
/// Parsing cannot fail: comrak accepts any input as markdown. After the tree
/// is built, top-level paragraphs run through the promotion pass so
/// rule-owned line shapes (divider-less pipe tables) become real nodes.
pub fn import_markdown(source: &str, rules: &RuleSet) -> Document {
    let mut doc = Document::new();
    import_fragment(&mut doc, doc.root(), source);
    promote_paragraphs(&mut doc, rules);
    tracing::debug!(nodes = doc.node_count(), "imported markdown");
    doc
}

/// Parse markdown and append the resulting blocks under `parent`.
///
/// Used for whole-document import and for table cell content, which is
/// arbitrary markdown of its own.
pub(crate) fn import_fragment(doc: &mut Document, parent: NodeId, source: &str) {
    let arena = Arena::new();
    let options = default_comrak_options();
    let ast = parse_document(&arena, source, &options);
    for child in ast.children() {
        build_node(doc, parent, child);
    }
}

fn promote_paragraphs(doc: &mut Document, rules: &RuleSet) {
    let blocks: Vec<NodeId> = doc.children(doc.root()).to_vec();
    for block in blocks {
        if doc.contains(block) && doc.kind(block).is_paragraph() {
            rules.promote_paragraph(doc, block);
        }
    }
}

fn build_node<'a>(doc: &mut Document, parent: NodeId, node: &'a AstNode<'a>) {
    match &node.data.borrow().value {
        NodeValue::Paragraph => {
            build_paragraph(doc, parent, node);
        }

        NodeValue::Heading(heading) => {
            let block = doc.create_node(NodeKind::Heading { level: heading.level });
            doc.append_child(parent, block);
            build_inlines(doc, block, node, TextFormat::empty(), false);
            merge_adjacent_text(doc, block);
        }

        NodeValue::BlockQuote => {
            let block = doc.create_node(NodeKind::Quote);
            doc.append_child(parent, block);
            for child in node.children() {
                build_node(doc, block, child);
            }
        }

        NodeValue::CodeBlock(code) => {
            let language = if code.info.is_empty() {
                None
            } else {
                Some(code.info.clone())
            };
            let block = doc.create_node(NodeKind::CodeBlock { language });
            doc.append_child(parent, block);
            append_code_lines(doc, block, &code.literal);
        }

        NodeValue::List(list) => {
            let block = doc.create_node(NodeKind::List {
                ordered: list.list_type == ListType::Ordered,
                start: list.start,
            });
            doc.append_child(parent, block);
            for child in node.children() {
                build_node(doc, block, child);
            }
        }

        NodeValue::Item(_) | NodeValue::TaskItem(_) => {
            let item = doc.create_node(NodeKind::ListItem);
            doc.append_child(parent, item);
            for child in node.children() {
                build_node(doc, item, child);
            }
        }

        NodeValue::ThematicBreak => {
            let block = doc.create_node(NodeKind::HorizontalRule);
            doc.append_child(parent, block);
        }

        NodeValue::Table(_) => {
            let block = doc.create_node(NodeKind::Table);
            doc.append_child(parent, block);
            for child in node.children() {
                build_node(doc, block, child);
            }
        }

        NodeValue::TableRow(header) => {
            let row = doc.create_node(NodeKind::TableRow);
            doc.append_child(parent, row);
            for child in node.children() {
                let cell = doc.create_node(NodeKind::TableCell { header: *header });
                doc.append_child(row, cell);
                // comrak cells hold inlines; ours hold block content, so the
                // inline run gets an implicit paragraph.
                let para = doc.create_node(NodeKind::Paragraph);
                doc.append_child(cell, para);
                build_inlines(doc, para, child, TextFormat::empty(), false);
                merge_adjacent_text(doc, para);
            }
        }

        // Raw HTML carries no tree structure for us; it degrades to text.
        NodeValue::HtmlBlock(html) => {
            let text = html.literal.trim_end_matches('\n').to_string();
            if !text.is_empty() {
                let block = doc.create_node(NodeKind::Paragraph);
                doc.append_child(parent, block);
                let leaf = doc.create_node(NodeKind::text(text));
                doc.append_child(block, leaf);
            }
        }

        _ => {
            for child in node.children() {
                build_node(doc, parent, child);
            }
        }
    }
}

/// Paragraphs get one wrinkle: when every line is a table row or divider,
/// soft breaks import as hard line breaks so the promotion pass can see the
/// row boundaries. Everywhere else a soft break is a space.
fn build_paragraph<'a>(doc: &mut Document, parent: NodeId, node: &'a AstNode<'a>) {
    let row_mode = paragraph_is_row_block(node);
    let paragraph = doc.create_node(NodeKind::Paragraph);
    doc.append_child(parent, paragraph);
    build_inlines(doc, paragraph, node, TextFormat::empty(), row_mode);
    merge_adjacent_text(doc, paragraph);
}

fn paragraph_is_row_block<'a>(node: &'a AstNode<'a>) -> bool {
    let mut lines = Vec::new();
    let mut current = String::new();
    collect_text_lines(node, &mut lines, &mut current);
    lines.push(current);
    !lines.is_empty()
        && lines.iter().all(|line| {
            let line = line.trim();
            table::is_row_line(line) || table::is_divider_line(line)
        })
}

fn collect_text_lines<'a>(node: &'a AstNode<'a>, lines: &mut Vec<String>, current: &mut String) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => current.push_str(text),
            NodeValue::Code(code) => current.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => lines.push(std::mem::take(current)),
            _ => collect_text_lines(child, lines, current),
        }
    }
}

fn build_inlines<'a>(
    doc: &mut Document,
    parent: NodeId,
    node: &'a AstNode<'a>,
    format: TextFormat,
    row_mode: bool,
) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => {
                let leaf = doc.create_node(NodeKind::styled_text(text.clone(), format));
                doc.append_child(parent, leaf);
            }

            NodeValue::Code(code) => {
                let leaf = doc.create_node(NodeKind::styled_text(
                    code.literal.clone(),
                    format | TextFormat::CODE,
                ));
                doc.append_child(parent, leaf);
            }

            NodeValue::Strong => {
                build_inlines(doc, parent, child, format | TextFormat::BOLD, row_mode);
            }

            NodeValue::Emph => {
                build_inlines(doc, parent, child, format | TextFormat::ITALIC, row_mode);
            }

            NodeValue::Strikethrough => {
                build_inlines(doc, parent, child, format | TextFormat::STRIKETHROUGH, row_mode);
            }

            NodeValue::Link(link) | NodeValue::Image(link) => {
                let leaf = doc.create_node(NodeKind::Link { url: link.url.clone() });
                doc.append_child(parent, leaf);
                build_inlines(doc, leaf, child, format, false);
                merge_adjacent_text(doc, leaf);
            }

            NodeValue::SoftBreak => {
                if row_mode {
                    let leaf = doc.create_node(NodeKind::LineBreak);
                    doc.append_child(parent, leaf);
                } else {
                    let leaf = doc.create_node(NodeKind::styled_text(" ", format));
                    doc.append_child(parent, leaf);
                }
            }

            NodeValue::LineBreak => {
                let leaf = doc.create_node(NodeKind::LineBreak);
                doc.append_child(parent, leaf);
            }

            NodeValue::HtmlInline(html) => {
                let leaf = doc.create_node(NodeKind::styled_text(html.clone(), format));
                doc.append_child(parent, leaf);
            }

            _ => {
                build_inlines(doc, parent, child, format, row_mode);
            }
        }
    }
}

/// Fold consecutive text runs with identical format into one node, so a
/// soft break inside a styled span does not split the span on export.
fn merge_adjacent_text(doc: &mut Document, parent: NodeId) {
    let mut index = 0;
    while index + 1 < doc.child_count(parent) {
        let current = doc.children(parent)[index];
        let next = doc.children(parent)[index + 1];
        let merged = match (doc.kind(current).clone(), doc.kind(next).clone()) {
            (
                NodeKind::Text { text: mut left, format: left_format },
                NodeKind::Text { text: right, format: right_format },
            ) if left_format == right_format => {
                left.push_str(&right);
                doc.set_kind(current, NodeKind::Text { text: left, format: left_format });
                doc.remove(next);
                true
            }
            _ => false,
        };
        if !merged {
            index += 1;
        }
    }
}

fn append_code_lines(doc: &mut Document, block: NodeId, literal: &str) {
    let trimmed = literal.strip_suffix('\n').unwrap_or(literal);
    if trimmed.is_empty() {
        return;
    }
    for (index, line) in trimmed.split('\n').enumerate() {
        if index > 0 {
            let brk = doc.create_node(NodeKind::LineBreak);
            doc.append_child(block, brk);
        }
        let leaf = doc.create_node(NodeKind::code_text(line));
        doc.append_child(block, leaf);
    }
}
