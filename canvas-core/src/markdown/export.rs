//! Markdown serialization (document tree → markdown)
//!
//! Converts canvas documents to CommonMark markdown.
//! Pipeline: document tree → comrak AST → markdown string, with transform
//! rules getting first refusal on every block so rule-owned shapes (pipe
//! tables) never reach comrak's own serializer.

use crate::document::{Document, NodeId, NodeKind, TextFormat};
use crate::error::CanvasError;
use crate::markdown::default_comrak_options;
use crate::markdown::rule::RuleSet;
use comrak::nodes::{
    Ast, AstNode, ListDelimType, ListType, NodeCode, NodeCodeBlock, NodeHeading, NodeHtmlBlock,
    NodeLink, NodeList, NodeTable, NodeValue, TableAlignment,
};
use comrak::{format_commonmark, Arena};
use std::cell::RefCell;

/// Serialize a whole document to markdown.
pub fn export_markdown(doc: &Document, rules: &RuleSet) -> Result<String, CanvasError> {
    export_nodes(doc, doc.children(doc.root()), rules)
}

/// Serialize a sequence of block nodes, joined by blank lines.
///
/// Blocks that render to nothing (empty paragraphs) are dropped from the
/// join so they never produce runs of blank lines.
pub fn export_nodes(
    doc: &Document,
    nodes: &[NodeId],
    rules: &RuleSet,
) -> Result<String, CanvasError> {
    let mut blocks = Vec::new();
    for &node in nodes {
        let rendered = render_block(doc, node, rules)?;
        if !rendered.is_empty() {
            blocks.push(rendered);
        }
    }
    Ok(blocks.join("\n\n"))
}

/// Render a single block, rule-owned shapes first, comrak for the rest.
pub(crate) fn render_block(
    doc: &Document,
    node: NodeId,
    rules: &RuleSet,
) -> Result<String, CanvasError> {
    if let Some(owned) = rules.export_node(doc, node) {
        return Ok(owned);
    }

    let arena = Arena::new();
    let root = arena.alloc(AstNode::new(RefCell::new(Ast::new(
        NodeValue::Document,
        (0, 0).into(),
    ))));
    build_block(&arena, root, doc, node, rules);

    let mut output = Vec::new();
    let options = default_comrak_options();
    format_commonmark(root, &options, &mut output).map_err(|e| {
        CanvasError::SerializationError(format!("Comrak serialization failed: {e}"))
    })?;

    let markdown = String::from_utf8(output)
        .map_err(|e| CanvasError::SerializationError(format!("UTF-8 conversion failed: {e}")))?;

    Ok(markdown.trim_end_matches('\n').to_string())
}

/// Build the comrak node for `node` and append it to `parent`.
///
/// Nested blocks go back through the rule set first, so a table inside a
/// quote still renders in its rule-owned shape (spliced in as a verbatim
/// HTML block, which comrak emits untouched).
fn build_block<'a>(
    arena: &'a Arena<AstNode<'a>>,
    parent: &'a AstNode<'a>,
    doc: &Document,
    node: NodeId,
    rules: &RuleSet,
) {
    if let Some(owned) = rules.export_node(doc, node) {
        let html_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
            NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: format!("{owned}\n"),
            }),
            (0, 0).into(),
        ))));
        parent.append(html_node);
        return;
    }

    match doc.kind(node) {
        NodeKind::Paragraph => {
            let para_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::Paragraph,
                (0, 0).into(),
            ))));
            parent.append(para_node);
            for &child in doc.children(node) {
                build_inline(arena, para_node, doc, child);
            }
        }

        NodeKind::Heading { level } => {
            let heading_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::Heading(NodeHeading {
                    level: (*level).clamp(1, 6),
                    setext: false,
                }),
                (0, 0).into(),
            ))));
            parent.append(heading_node);
            for &child in doc.children(node) {
                build_inline(arena, heading_node, doc, child);
            }
        }

        NodeKind::Quote => {
            let quote_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::BlockQuote,
                (0, 0).into(),
            ))));
            parent.append(quote_node);
            for &child in doc.children(node) {
                build_block(arena, quote_node, doc, child, rules);
            }
        }

        NodeKind::CodeBlock { language } => {
            let text = doc.text_content(node);
            let literal = if text.is_empty() { text } else { format!("{text}\n") };
            let code_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::CodeBlock(NodeCodeBlock {
                    fenced: true,
                    fence_char: b'`',
                    fence_length: 3,
                    fence_offset: 0,
                    info: language.clone().unwrap_or_default(),
                    literal,
                }),
                (0, 0).into(),
            ))));
            parent.append(code_node);
        }

        NodeKind::List { ordered, start } => {
            let list_data = NodeList {
                list_type: if *ordered { ListType::Ordered } else { ListType::Bullet },
                marker_offset: 0,
                padding: 0,
                start: *start,
                delimiter: ListDelimType::Period,
                bullet_char: b'-',
                tight: true,
            };
            let list_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::List(list_data),
                (0, 0).into(),
            ))));
            parent.append(list_node);
            for &child in doc.children(node) {
                let item_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                    NodeValue::Item(list_data),
                    (0, 0).into(),
                ))));
                list_node.append(item_node);
                for &grandchild in doc.children(child) {
                    build_block(arena, item_node, doc, grandchild, rules);
                }
            }
        }

        NodeKind::ListItem => {
            // Items outside a list render their children directly.
            for &child in doc.children(node) {
                build_block(arena, parent, doc, child, rules);
            }
        }

        NodeKind::HorizontalRule => {
            let break_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::ThematicBreak,
                (0, 0).into(),
            ))));
            parent.append(break_node);
        }

        NodeKind::Table => {
            // Only reached when no rule owns tables; falls back to comrak's
            // divider-style rendering.
            build_plain_table(arena, parent, doc, node);
        }

        NodeKind::TableRow | NodeKind::TableCell { .. } => {
            for &child in doc.children(node) {
                build_block(arena, parent, doc, child, rules);
            }
        }

        NodeKind::Root => {
            for &child in doc.children(node) {
                build_block(arena, parent, doc, child, rules);
            }
        }

        // A stray inline at block position gets wrapped in a paragraph.
        NodeKind::Text { .. } | NodeKind::CodeText { .. } | NodeKind::LineBreak
        | NodeKind::Link { .. } => {
            let para_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::Paragraph,
                (0, 0).into(),
            ))));
            parent.append(para_node);
            build_inline(arena, para_node, doc, node);
        }
    }
}

fn build_plain_table<'a>(
    arena: &'a Arena<AstNode<'a>>,
    parent: &'a AstNode<'a>,
    doc: &Document,
    table: NodeId,
) {
    let rows = doc.children(table);
    let columns = rows
        .first()
        .map(|&row| doc.child_count(row))
        .unwrap_or(0);
    let table_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
        NodeValue::Table(NodeTable {
            alignments: vec![TableAlignment::None; columns],
            num_columns: columns,
            num_rows: rows.len(),
            num_nonempty_cells: 0,
        }),
        (0, 0).into(),
    ))));
    parent.append(table_node);

    for &row in rows {
        let header = doc
            .first_child(row)
            .map(|cell| matches!(doc.kind(cell), NodeKind::TableCell { header: true }))
            .unwrap_or(false);
        let row_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
            NodeValue::TableRow(header),
            (0, 0).into(),
        ))));
        table_node.append(row_node);

        for &cell in doc.children(row) {
            let cell_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::TableCell,
                (0, 0).into(),
            ))));
            row_node.append(cell_node);
            // Cells hold block content; comrak cells hold inlines, so the
            // blocks are flattened.
            for &block in doc.children(cell) {
                for &inline in doc.children(block) {
                    build_inline(arena, cell_node, doc, inline);
                }
            }
        }
    }
}

/// Build the comrak inline for `node`, wrapping formatted text runs in
/// marker nodes from the outside in: strong, emphasis, strikethrough.
fn build_inline<'a>(
    arena: &'a Arena<AstNode<'a>>,
    parent: &'a AstNode<'a>,
    doc: &Document,
    node: NodeId,
) {
    match doc.kind(node) {
        NodeKind::Text { text, format } => {
            let leaf = if format.contains(TextFormat::CODE) {
                arena.alloc(AstNode::new(RefCell::new(Ast::new(
                    NodeValue::Code(NodeCode {
                        num_backticks: 1,
                        literal: text.clone(),
                    }),
                    (0, 0).into(),
                ))))
            } else {
                arena.alloc(AstNode::new(RefCell::new(Ast::new(
                    NodeValue::Text(text.clone()),
                    (0, 0).into(),
                ))))
            };

            let mut wrapped = leaf;
            if format.contains(TextFormat::STRIKETHROUGH) {
                let strike_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                    NodeValue::Strikethrough,
                    (0, 0).into(),
                ))));
                strike_node.append(wrapped);
                wrapped = strike_node;
            }
            if format.contains(TextFormat::ITALIC) {
                let emph_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                    NodeValue::Emph,
                    (0, 0).into(),
                ))));
                emph_node.append(wrapped);
                wrapped = emph_node;
            }
            if format.contains(TextFormat::BOLD) {
                let strong_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                    NodeValue::Strong,
                    (0, 0).into(),
                ))));
                strong_node.append(wrapped);
                wrapped = strong_node;
            }
            parent.append(wrapped);
        }

        NodeKind::CodeText { text } => {
            let code_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::Code(NodeCode {
                    num_backticks: 1,
                    literal: text.clone(),
                }),
                (0, 0).into(),
            ))));
            parent.append(code_node);
        }

        NodeKind::LineBreak => {
            let break_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::LineBreak,
                (0, 0).into(),
            ))));
            parent.append(break_node);
        }

        NodeKind::Link { url } => {
            let link_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::Link(NodeLink {
                    url: url.clone(),
                    title: String::new(),
                }),
                (0, 0).into(),
            ))));
            parent.append(link_node);
            for &child in doc.children(node) {
                build_inline(arena, link_node, doc, child);
            }
        }

        // Block nodes at inline position contribute their text.
        _ => {
            let text_node = arena.alloc(AstNode::new(RefCell::new(Ast::new(
                NodeValue::Text(doc.text_content(node)),
                (0, 0).into(),
            ))));
            parent.append(text_node);
        }
    }
}
