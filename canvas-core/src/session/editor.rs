//! Canvas editing session
//!
//! Owns a document plus its transform rules and batches change
//! notifications: every edit restarts a quiet-period timer, and
//! [`CanvasEditor::poll_markdown`] serializes once the timer runs out. A
//! burst of keystrokes therefore produces one notification, not one per
//! keystroke.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::document::{Document, NodeKind, Selection};
use crate::error::CanvasError;
use crate::markdown::{
    default_rules, export_markdown, import_markdown, markdown_up_to, selected_markdown, RuleSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    /// Quiet period after the last edit before a change notification fires.
    pub debounce: Duration,
}

impl Default for EditorOptions {
    fn default() -> Self {
        EditorOptions {
            debounce: Duration::from_millis(300),
        }
    }
}

pub struct CanvasEditor {
    doc: Document,
    rules: RuleSet,
    options: EditorOptions,
    pending_since: Option<Instant>,
}

impl CanvasEditor {
    pub fn new(options: EditorOptions) -> Self {
        CanvasEditor {
            doc: Document::new(),
            rules: default_rules(),
            options,
            pending_since: None,
        }
    }

    /// Editor seeded from markdown, with import promotions already applied.
    /// Loading does not count as a change.
    pub fn from_markdown(source: &str, options: EditorOptions) -> Self {
        let rules = default_rules();
        let doc = import_markdown(source, &rules);
        CanvasEditor {
            doc,
            rules,
            options,
            pending_since: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn options(&self) -> EditorOptions {
        self.options
    }

    /// Mutate the document and restart the quiet period.
    pub fn update<T>(&mut self, edit: impl FnOnce(&mut Document) -> T) -> T {
        let result = edit(&mut self.doc);
        self.mark_changed();
        result
    }

    /// Append `text` as a new paragraph and run the line rules on it, the
    /// way a typed line enters the canvas.
    pub fn append_line(&mut self, text: &str) {
        let root = self.doc.root();
        let paragraph = self.doc.create_node(NodeKind::Paragraph);
        self.doc.append_child(root, paragraph);
        if !text.is_empty() {
            let leaf = self.doc.create_node(NodeKind::text(text));
            self.doc.append_child(paragraph, leaf);
            self.rules.apply_line(&mut self.doc, paragraph);
        }
        self.mark_changed();
    }

    /// Serialize the whole canvas. Does not touch the change timer.
    pub fn markdown(&self) -> Result<String, CanvasError> {
        export_markdown(&self.doc, &self.rules)
    }

    /// Markdown for the current or given selection.
    pub fn selected_markdown(&self, selection: &Selection) -> Result<String, CanvasError> {
        selected_markdown(&self.doc, selection, &self.rules)
    }

    /// Byte offset and length of a selection inside [`CanvasEditor::markdown`]
    /// output, for quoting a canvas excerpt in a chat message.
    ///
    /// The markdown serialized up to the selection start loses the separator
    /// whitespace the full document keeps there (a space before the
    /// selection, the blank line between blocks), so the selected text is
    /// located in the full serialization from the prefix end forward. When
    /// the selection does not reappear verbatim (a slice of a code block or
    /// table re-serializes with its own fences), the offset falls back to
    /// the prefix length; consumers slice with [`str::get`] and drop the
    /// quote when the bounds do not line up.
    pub fn quoted_bounds(&self, selection: &Selection) -> Result<(usize, usize), CanvasError> {
        let (start, _) = selection.normalized(&self.doc);
        let prefix = markdown_up_to(&self.doc, start, &self.rules)?;
        let selected = selected_markdown(&self.doc, selection, &self.rules)?;
        let full = self.markdown()?;
        let offset = full
            .get(prefix.len()..)
            .and_then(|tail| tail.find(&selected))
            .map(|found| prefix.len() + found)
            .unwrap_or(prefix.len());
        Ok((offset, selected.len()))
    }

    pub fn is_dirty(&self) -> bool {
        self.pending_since.is_some()
    }

    fn mark_changed(&mut self) {
        trace!("canvas changed, quiet period restarted");
        self.pending_since = Some(Instant::now());
    }

    /// True once the quiet period after the last edit has elapsed. Consumes
    /// the pending change.
    pub fn take_change_ready(&mut self) -> bool {
        match self.pending_since {
            Some(since) if since.elapsed() >= self.options.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Fresh serialization once per settled burst of edits, `None` while
    /// edits are still arriving or nothing changed.
    pub fn poll_markdown(&mut self) -> Result<Option<String>, CanvasError> {
        if self.take_change_ready() {
            self.markdown().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Serialize immediately, discarding any pending quiet period.
    pub fn flush(&mut self) -> Result<String, CanvasError> {
        self.pending_since = None;
        self.markdown()
    }
}

impl Default for CanvasEditor {
    fn default() -> Self {
        CanvasEditor::new(EditorOptions::default())
    }
}
