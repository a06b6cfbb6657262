//! Transform rule trait and registry
//!
//! Rules own the markdown shapes the stock serializer does not produce the
//! way we want (pipe tables) and the typed-line shortcuts that rewrite a
//! paragraph in place. The registry offers every exported block to each rule
//! in registration order and dispatches matching lines the same way.

use crate::document::{Document, NodeId};

/// What a rule did with a matching line.
///
/// `Handled` means the rule consumed the paragraph (it may no longer exist).
/// `HandledContinue` means the rule rewrote the paragraph but left it in
/// place, so later rules still get a look at the updated line. `NotHandled`
/// passes the line to the next rule unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Handled,
    HandledContinue,
    NotHandled,
}

/// A markdown transform rule.
///
/// Rules hook into two places. `export` intercepts block serialization: the
/// first rule returning `Some` owns the block's markdown. `matches_line` and
/// `replace` drive line dispatch, both for lines typed into the editor and
/// for the promotion pass over freshly imported paragraphs.
pub trait TransformRule {
    fn name(&self) -> &'static str;

    /// Serialize `node` if this rule owns its shape.
    fn export(&self, doc: &Document, node: NodeId, rules: &RuleSet) -> Option<String> {
        let _ = (doc, node, rules);
        None
    }

    /// Quick check against the first line of a paragraph's text.
    fn matches_line(&self, line: &str) -> bool;

    /// Rewrite `paragraph` in response to a matching `line`.
    fn replace(&self, doc: &mut Document, paragraph: NodeId, line: &str, rules: &RuleSet)
        -> RuleOutcome;

    /// Whether the promotion pass over imported paragraphs should run this
    /// rule. Typed-line shortcuts opt out: the parser already built their
    /// block shapes, so a paragraph still carrying the marker text was
    /// escaped on purpose.
    fn applies_on_import(&self) -> bool {
        true
    }
}

/// Ordered collection of transform rules.
pub struct RuleSet {
    rules: Vec<Box<dyn TransformRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Box<dyn TransformRule>) {
        tracing::debug!(rule = rule.name(), "registering transform rule");
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// First rule that claims `node` serializes it.
    pub fn export_node(&self, doc: &Document, node: NodeId) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.export(doc, node, self))
    }

    /// Dispatch a paragraph whose text just changed.
    ///
    /// Rules run in registration order against the paragraph's first line.
    /// `HandledContinue` re-reads the line (the rule rewrote the paragraph)
    /// and keeps going; `Handled` stops. Returns `true` if any rule handled
    /// the line.
    pub fn apply_line(&self, doc: &mut Document, paragraph: NodeId) -> bool {
        self.dispatch(doc, paragraph, false)
    }

    /// Dispatch for the import promotion pass, skipping rules that only make
    /// sense for typed input.
    pub fn promote_paragraph(&self, doc: &mut Document, paragraph: NodeId) -> bool {
        self.dispatch(doc, paragraph, true)
    }

    fn dispatch(&self, doc: &mut Document, paragraph: NodeId, importing: bool) -> bool {
        let mut handled = false;
        let mut line = match first_line(doc, paragraph) {
            Some(line) => line,
            None => return false,
        };
        for rule in &self.rules {
            if importing && !rule.applies_on_import() {
                continue;
            }
            if !rule.matches_line(&line) {
                continue;
            }
            tracing::trace!(rule = rule.name(), %line, "line matched");
            match rule.replace(doc, paragraph, &line, self) {
                RuleOutcome::Handled => return true,
                RuleOutcome::HandledContinue => {
                    handled = true;
                    line = match first_line(doc, paragraph) {
                        Some(line) => line,
                        None => return true,
                    };
                }
                RuleOutcome::NotHandled => {}
            }
        }
        handled
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of the paragraph up to its first line break, or `None` when the
/// paragraph is gone or empty.
fn first_line(doc: &Document, paragraph: NodeId) -> Option<String> {
    if !doc.contains(paragraph) {
        return None;
    }
    let text = doc.text_content(paragraph);
    let line = match text.split_once('\n') {
        Some((first, _)) => first.to_string(),
        None => text,
    };
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}
