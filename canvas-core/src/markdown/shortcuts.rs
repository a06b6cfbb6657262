//! Typed-line block shortcuts
//!
//! Heading and quote markers rewrite the paragraph they were typed into.
//! Unlike the table rule these never run on import: the parser already
//! built real heading and quote nodes, so a paragraph still carrying the
//! marker text was escaped on purpose and stays plain.

use crate::document::{Document, NodeId, NodeKind};
use crate::markdown::rule::{RuleOutcome, RuleSet, TransformRule};
use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s(.*)$").expect("heading pattern"));

static QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>\s(.*)$").expect("quote pattern"));

pub struct HeadingRule;

impl TransformRule for HeadingRule {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn matches_line(&self, line: &str) -> bool {
        HEADING.is_match(line)
    }

    fn applies_on_import(&self) -> bool {
        false
    }

    fn replace(
        &self,
        doc: &mut Document,
        paragraph: NodeId,
        _line: &str,
        _rules: &RuleSet,
    ) -> RuleOutcome {
        let Some(level) = strip_marker(doc, paragraph, &HEADING, 1) else {
            return RuleOutcome::NotHandled;
        };
        let heading = doc.create_node(NodeKind::Heading { level });
        move_children(doc, paragraph, heading);
        doc.replace(paragraph, heading);
        doc.select_node_end(heading);
        RuleOutcome::Handled
    }
}

pub struct QuoteRule;

impl TransformRule for QuoteRule {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn matches_line(&self, line: &str) -> bool {
        QUOTE.is_match(line)
    }

    fn applies_on_import(&self) -> bool {
        false
    }

    fn replace(
        &self,
        doc: &mut Document,
        paragraph: NodeId,
        _line: &str,
        _rules: &RuleSet,
    ) -> RuleOutcome {
        if strip_marker(doc, paragraph, &QUOTE, 0).is_none() {
            return RuleOutcome::NotHandled;
        }
        let quote = doc.create_node(NodeKind::Quote);
        let inner = doc.create_node(NodeKind::Paragraph);
        doc.append_child(quote, inner);
        move_children(doc, paragraph, inner);
        doc.replace(paragraph, quote);
        doc.select_node_end(quote);
        RuleOutcome::Handled
    }
}

/// Strip a matched marker from the paragraph's first text child. Returns the
/// heading level taken from capture group `level_group` (or 1 when the
/// pattern has no such group), `None` when the first child does not carry
/// the marker.
fn strip_marker(
    doc: &mut Document,
    paragraph: NodeId,
    pattern: &Regex,
    level_group: usize,
) -> Option<u8> {
    let first = doc.first_child(paragraph)?;
    let (text, format) = match doc.kind(first) {
        NodeKind::Text { text, format } => (text.clone(), *format),
        _ => return None,
    };
    let captures = pattern.captures(&text)?;
    let level = if level_group > 0 {
        captures.get(level_group)?.as_str().len() as u8
    } else {
        1
    };
    let rest = captures
        .get(captures.len() - 1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    if rest.is_empty() {
        doc.remove(first);
    } else {
        doc.set_kind(first, NodeKind::Text { text: rest, format });
    }
    Some(level)
}

fn move_children(doc: &mut Document, from: NodeId, to: NodeId) {
    let children: Vec<NodeId> = doc.children(from).to_vec();
    for child in children {
        doc.append_child(to, child);
    }
}
