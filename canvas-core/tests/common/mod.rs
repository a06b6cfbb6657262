//! Shared helpers for the integration tests.

use canvas_core::document::{Document, NodeKind};
use canvas_core::markdown::{default_rules, export_markdown, import_markdown, RuleSet};

/// Import `source` with the default rule set, the way the editor loads a
/// document.
pub fn import(source: &str) -> (Document, RuleSet) {
    let rules = default_rules();
    let doc = import_markdown(source, &rules);
    (doc, rules)
}

pub fn export(doc: &Document, rules: &RuleSet) -> String {
    export_markdown(doc, rules).expect("export should succeed")
}

/// Append `line` as a paragraph and run the line rules over it, the way a
/// typed line of input arrives.
pub fn type_line(doc: &mut Document, rules: &RuleSet, line: &str) {
    let root = doc.root();
    let paragraph = doc.create_node(NodeKind::Paragraph);
    doc.append_child(root, paragraph);
    if !line.is_empty() {
        let leaf = doc.create_node(NodeKind::text(line));
        doc.append_child(paragraph, leaf);
    }
    rules.apply_line(doc, paragraph);
}

/// Labels of the root's direct children, in order.
pub fn block_kinds(doc: &Document) -> Vec<&'static str> {
    doc.children(doc.root())
        .iter()
        .map(|id| doc.kind(*id).label())
        .collect()
}
