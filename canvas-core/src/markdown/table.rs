//! Pipe table transform
//!
//! Owns both directions of the pipe-table shape. Export emits one
//! `| cell | cell |` line per row, with a divider line after any row whose
//! cells are header cells. Import assembles tables from row-shaped lines,
//! looking backward through committed sibling paragraphs and forward through
//! line breaks inside the triggering paragraph, because markdown table
//! syntax cannot be recognized one line at a time: the divider arrives as
//! its own line and pasted tables arrive as one multi-line block.

use crate::document::{Document, NodeId, NodeKind};
use crate::markdown::extract::markdown_content;
use crate::markdown::import::import_fragment;
use crate::markdown::rule::{RuleOutcome, RuleSet, TransformRule};
use regex::Regex;
use std::sync::LazyLock;

static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|\s*(.+?)\s*\|\s?$").expect("table row pattern"));

static TABLE_DIVIDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\|\s?:?-*:?\s?)+\|\s?$").expect("table divider pattern"));

pub(crate) fn is_row_line(line: &str) -> bool {
    TABLE_ROW.is_match(line)
}

pub(crate) fn is_divider_line(line: &str) -> bool {
    TABLE_DIVIDER.is_match(line)
}

/// Split a row line into trimmed cell texts.
pub(crate) fn row_cells(line: &str) -> Option<Vec<String>> {
    let captures = TABLE_ROW.captures(line)?;
    let inner = captures.get(1)?.as_str();
    Some(inner.split('|').map(|cell| cell.trim().to_string()).collect())
}

pub struct TableRule;

impl TransformRule for TableRule {
    fn name(&self) -> &'static str {
        "table"
    }

    fn export(&self, doc: &Document, node: NodeId, rules: &RuleSet) -> Option<String> {
        if !doc.kind(node).is_table() {
            return None;
        }
        Some(export_table(doc, node, rules))
    }

    fn matches_line(&self, line: &str) -> bool {
        is_row_line(line) || is_divider_line(line)
    }

    fn replace(
        &self,
        doc: &mut Document,
        paragraph: NodeId,
        line: &str,
        rules: &RuleSet,
    ) -> RuleOutcome {
        // A divider typed right under a table marks that table's last row as
        // the header row. With no preceding sibling at all there is nothing
        // to act on, so the line stays a paragraph.
        if is_divider_line(line) {
            return match doc.prev_sibling(paragraph) {
                Some(prev) if doc.kind(prev).is_table() => {
                    if let Some(&last_row) = doc.children(prev).last() {
                        toggle_row_header(doc, last_row);
                    }
                    doc.remove(paragraph);
                    RuleOutcome::Handled
                }
                Some(_) => {
                    doc.remove(paragraph);
                    RuleOutcome::Handled
                }
                None => RuleOutcome::NotHandled,
            };
        }

        let current = match row_cells(line) {
            Some(cells) => cells,
            None => return RuleOutcome::NotHandled,
        };

        // Backward: single-child sibling paragraphs that parse as rows are
        // rows of the same table, typed or pasted before this line landed.
        let mut rows_above: Vec<Vec<String>> = Vec::new();
        while let Some(prev) = doc.prev_sibling(paragraph) {
            if !doc.kind(prev).is_paragraph() || doc.child_count(prev) != 1 {
                break;
            }
            let only_child = doc.children(prev)[0];
            let content = node_markdown(doc, only_child, rules);
            match row_cells(&content) {
                Some(cells) => {
                    rows_above.push(cells);
                    doc.remove(prev);
                }
                None => break,
            }
        }
        rows_above.reverse();

        // Forward: the rest of the triggering paragraph, split on line
        // breaks. A divider as the first segment marks the trigger row as
        // the header row; scanning stops at the first segment that is not a
        // row.
        let children: Vec<NodeId> = doc.children(paragraph).to_vec();
        let first_break = children.iter().position(|&child| doc.kind(child).is_line_break());
        let mut consumed_through = match first_break {
            Some(index) => index + 1,
            None => children.len(),
        };
        let mut rows_below: Vec<Vec<String>> = Vec::new();
        let mut header_on_current = false;

        if let Some(first_break) = first_break {
            let mut segment = String::new();
            let mut halted = false;
            for (offset, &child) in children[first_break + 1..].iter().enumerate() {
                let position = first_break + 1 + offset;
                if !doc.kind(child).is_line_break() {
                    segment.push_str(&node_markdown(doc, child, rules));
                    continue;
                }
                let text = std::mem::take(&mut segment);
                if rows_below.is_empty() && is_divider_line(text.trim()) {
                    header_on_current = true;
                    consumed_through = position + 1;
                    continue;
                }
                match row_cells(&text) {
                    Some(cells) => {
                        rows_below.push(cells);
                        consumed_through = position + 1;
                    }
                    None => {
                        halted = true;
                        break;
                    }
                }
            }
            if !halted && !segment.is_empty() {
                if rows_below.is_empty() && is_divider_line(segment.trim()) {
                    header_on_current = true;
                    consumed_through = children.len();
                } else if let Some(cells) = row_cells(&segment) {
                    rows_below.push(cells);
                    consumed_through = children.len();
                }
            }
        }

        // Assemble, padding short rows to the widest.
        let current_index = rows_above.len();
        let mut all_rows = rows_above;
        all_rows.push(current);
        all_rows.extend(rows_below);
        let columns = all_rows.iter().map(Vec::len).max().unwrap_or(0);

        let table = doc.create_node(NodeKind::Table);
        for cells in &all_rows {
            let row = doc.create_node(NodeKind::TableRow);
            doc.append_child(table, row);
            for index in 0..columns {
                let text = cells.get(index).map(String::as_str).unwrap_or("");
                let cell = doc.create_node(NodeKind::TableCell { header: false });
                doc.append_child(row, cell);
                fill_cell(doc, cell, text);
            }
        }
        if header_on_current {
            let marked = doc.children(table)[current_index];
            toggle_row_header(doc, marked);
        }

        // Nodes past the last parsed row stay behind in the paragraph.
        let leftovers = consumed_through < children.len();
        if leftovers {
            for &child in &children[..consumed_through] {
                doc.remove(child);
            }
        }

        let merge_target = doc
            .prev_sibling(paragraph)
            .filter(|&prev| doc.kind(prev).is_table() && table_columns(doc, prev) == columns);
        let merged = merge_target.is_some();
        match merge_target {
            Some(existing) => {
                let rows: Vec<NodeId> = doc.children(table).to_vec();
                for row in rows {
                    doc.append_child(existing, row);
                }
                doc.remove(table);
                if !leftovers {
                    doc.remove(paragraph);
                }
                doc.select_node_end(existing);
            }
            None => {
                if leftovers {
                    doc.insert_before(paragraph, table);
                } else {
                    doc.replace(paragraph, table);
                }
                doc.select_node_end(table);
            }
        }
        tracing::debug!(rows = all_rows.len(), columns, merged, "assembled table");
        RuleOutcome::Handled
    }
}

fn export_table(doc: &Document, table: NodeId, rules: &RuleSet) -> String {
    let mut lines = Vec::new();
    for &row in doc.children(table) {
        let mut cells = Vec::new();
        let mut header = false;
        for &cell in doc.children(row) {
            if matches!(doc.kind(cell), NodeKind::TableCell { header: true }) {
                header = true;
            }
            let content = match markdown_content(doc, doc.children(cell), rules) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(%err, "table cell serialization failed");
                    String::new()
                }
            };
            cells.push(content);
        }
        lines.push(format!("| {} |", cells.join(" | ")));
        if header {
            let dashes = vec!["---"; cells.len()];
            lines.push(format!("| {} |", dashes.join(" | ")));
        }
    }
    lines.join("\n")
}

/// Cell text is markdown of its own, so formatted spans survive the trip
/// through a row line.
fn fill_cell(doc: &mut Document, cell: NodeId, text: &str) {
    import_fragment(doc, cell, text);
    if doc.children(cell).is_empty() {
        let para = doc.create_node(NodeKind::Paragraph);
        doc.append_child(cell, para);
    }
}

fn toggle_row_header(doc: &mut Document, row: NodeId) {
    let cells: Vec<NodeId> = doc.children(row).to_vec();
    for cell in cells {
        if let NodeKind::TableCell { header } = doc.kind(cell) {
            let flipped = !header;
            doc.set_kind(cell, NodeKind::TableCell { header: flipped });
        }
    }
}

fn table_columns(doc: &Document, table: NodeId) -> usize {
    doc.first_child(table).map(|row| doc.child_count(row)).unwrap_or(0)
}

fn node_markdown(doc: &Document, node: NodeId, rules: &RuleSet) -> String {
    match markdown_content(doc, &[node], rules) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(%err, "node serialization failed during table assembly");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::default_rules;

    fn row_paragraph(doc: &mut Document, text: &str) -> NodeId {
        let paragraph = doc.create_node(NodeKind::Paragraph);
        let leaf = doc.create_node(NodeKind::text(text));
        doc.append_child(paragraph, leaf);
        doc.append_child(doc.root(), paragraph);
        paragraph
    }

    fn cell_text(doc: &Document, table: NodeId, row: usize, column: usize) -> String {
        let row = doc.children(table)[row];
        let cell = doc.children(row)[column];
        doc.text_content(cell)
    }

    #[test]
    fn row_pattern_requires_both_pipes() {
        assert!(is_row_line("| a | b |"));
        assert!(is_row_line("| single |"));
        assert!(!is_row_line("| a | b"));
        assert!(!is_row_line("a | b |"));
        assert!(!is_row_line("plain text"));
    }

    #[test]
    fn divider_pattern_accepts_alignment_colons() {
        assert!(is_divider_line("| --- | --- |"));
        assert!(is_divider_line("| :-- | --: |"));
        assert!(!is_divider_line("| a | b |"));
    }

    #[test]
    fn row_cells_split_and_trim() {
        assert_eq!(
            row_cells("|  a |b  | c |").unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn export_emits_one_line_per_row() {
        let rules = default_rules();
        let doc = crate::markdown::import_markdown("| a | b |\n| c | d |", &rules);
        let table = doc.children(doc.root())[0];
        assert_eq!(
            export_table(&doc, table, &rules),
            "| a | b |\n| c | d |"
        );
    }

    #[test]
    fn export_adds_divider_after_header_row() {
        let rules = default_rules();
        let doc = crate::markdown::import_markdown("| a | b |\n| --- | --- |\n| c | d |", &rules);
        let table = doc.children(doc.root())[0];
        assert_eq!(
            export_table(&doc, table, &rules),
            "| a | b |\n| --- | --- |\n| c | d |"
        );
    }

    #[test]
    fn typed_lines_grow_one_table() {
        let rules = default_rules();
        let mut doc = Document::new();

        let first = row_paragraph(&mut doc, "| Name | Age |");
        assert!(rules.apply_line(&mut doc, first));

        let divider = row_paragraph(&mut doc, "| --- | --- |");
        assert!(rules.apply_line(&mut doc, divider));

        let second = row_paragraph(&mut doc, "| Bob | 30 |");
        assert!(rules.apply_line(&mut doc, second));

        let blocks = doc.children(doc.root());
        assert_eq!(blocks.len(), 1);
        let table = blocks[0];
        assert!(doc.kind(table).is_table());
        assert_eq!(doc.child_count(table), 2);
        for &cell in doc.children(doc.children(table)[0]) {
            assert!(matches!(doc.kind(cell), NodeKind::TableCell { header: true }));
        }
        assert_eq!(cell_text(&doc, table, 0, 0), "Name");
        assert_eq!(cell_text(&doc, table, 1, 1), "30");
    }

    #[test]
    fn backward_pass_consumes_row_paragraphs() {
        let mut rules = RuleSet::new();
        rules.register(Box::new(TableRule));
        let mut doc = Document::new();

        row_paragraph(&mut doc, "| a |");
        let trigger = row_paragraph(&mut doc, "| b |");
        assert!(rules.apply_line(&mut doc, trigger));

        let blocks = doc.children(doc.root());
        assert_eq!(blocks.len(), 1);
        let table = blocks[0];
        assert_eq!(doc.child_count(table), 2);
        assert_eq!(cell_text(&doc, table, 0, 0), "a");
        assert_eq!(cell_text(&doc, table, 1, 0), "b");
    }

    #[test]
    fn forward_pass_pads_short_rows() {
        let rules = default_rules();
        let mut doc = Document::new();
        let paragraph = doc.create_node(NodeKind::Paragraph);
        for (index, text) in ["| a | b |", "| c |"].iter().enumerate() {
            if index > 0 {
                let brk = doc.create_node(NodeKind::LineBreak);
                doc.append_child(paragraph, brk);
            }
            let leaf = doc.create_node(NodeKind::text(*text));
            doc.append_child(paragraph, leaf);
        }
        doc.append_child(doc.root(), paragraph);

        assert!(rules.apply_line(&mut doc, paragraph));
        let table = doc.children(doc.root())[0];
        assert_eq!(doc.child_count(table), 2);
        assert_eq!(doc.child_count(doc.children(table)[1]), 2);
        assert_eq!(cell_text(&doc, table, 1, 0), "c");
        assert_eq!(cell_text(&doc, table, 1, 1), "");
    }

    #[test]
    fn leading_divider_in_forward_pass_marks_trigger_row() {
        let rules = default_rules();
        let mut doc = Document::new();
        let paragraph = doc.create_node(NodeKind::Paragraph);
        for (index, text) in ["| a |", "| --- |", "| b |"].iter().enumerate() {
            if index > 0 {
                let brk = doc.create_node(NodeKind::LineBreak);
                doc.append_child(paragraph, brk);
            }
            let leaf = doc.create_node(NodeKind::text(*text));
            doc.append_child(paragraph, leaf);
        }
        doc.append_child(doc.root(), paragraph);

        assert!(rules.apply_line(&mut doc, paragraph));
        let table = doc.children(doc.root())[0];
        assert_eq!(doc.child_count(table), 2);
        for &cell in doc.children(doc.children(table)[0]) {
            assert!(matches!(doc.kind(cell), NodeKind::TableCell { header: true }));
        }
        for &cell in doc.children(doc.children(table)[1]) {
            assert!(matches!(doc.kind(cell), NodeKind::TableCell { header: false }));
        }
    }

    #[test]
    fn non_row_tail_survives_as_paragraph() {
        let rules = default_rules();
        let mut doc = Document::new();
        let paragraph = doc.create_node(NodeKind::Paragraph);
        let row = doc.create_node(NodeKind::text("| a |"));
        let brk = doc.create_node(NodeKind::LineBreak);
        let tail = doc.create_node(NodeKind::text("closing remark"));
        doc.append_child(paragraph, row);
        doc.append_child(paragraph, brk);
        doc.append_child(paragraph, tail);
        doc.append_child(doc.root(), paragraph);

        assert!(rules.apply_line(&mut doc, paragraph));
        let blocks = doc.children(doc.root());
        assert_eq!(blocks.len(), 2);
        assert!(doc.kind(blocks[0]).is_table());
        assert_eq!(doc.text_content(blocks[1]), "closing remark");
    }

    #[test]
    fn divider_without_preceding_sibling_declines() {
        let rules = default_rules();
        let mut doc = Document::new();
        let paragraph = row_paragraph(&mut doc, "| --- | --- |");
        assert!(!rules.apply_line(&mut doc, paragraph));
        assert!(doc.contains(paragraph));
    }

    #[test]
    fn formatted_cell_content_survives_assembly() {
        let mut rules = RuleSet::new();
        rules.register(Box::new(TableRule));
        let mut doc = Document::new();

        let paragraph = doc.create_node(NodeKind::Paragraph);
        let leaf = doc.create_node(NodeKind::text("| **bold** | plain |"));
        doc.append_child(paragraph, leaf);
        doc.append_child(doc.root(), paragraph);

        assert!(rules.apply_line(&mut doc, paragraph));
        let table = doc.children(doc.root())[0];
        let cell = doc.children(doc.children(table)[0])[0];
        let para = doc.children(cell)[0];
        let inner = doc.children(para)[0];
        match doc.kind(inner) {
            NodeKind::Text { text, format } => {
                assert_eq!(text, "bold");
                assert!(format.contains(crate::document::TextFormat::BOLD));
            }
            other => panic!("unexpected cell content {other:?}"),
        }
    }

    #[test]
    fn selection_lands_at_table_end_after_assembly() {
        let rules = default_rules();
        let mut doc = Document::new();
        let paragraph = row_paragraph(&mut doc, "| a | b |");
        assert!(rules.apply_line(&mut doc, paragraph));

        let table = doc.children(doc.root())[0];
        let selection = doc.selection().expect("selection placed");
        assert!(selection.is_collapsed());
        assert!(doc.is_ancestor_of(table, selection.anchor.node));
    }
}
