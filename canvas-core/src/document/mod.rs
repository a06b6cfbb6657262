//! Abstract document tree for the canvas editor
//!
//! This module defines the minimal node-tree model the transforms operate on:
//! an arena of typed nodes with ordered children, a single root, and an
//! explicit selection. Sibling relationships are derived from the parent's
//! child order rather than stored, so they cannot drift out of sync.

pub mod selection;

pub use selection::{Point, Selection};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Identifier of a node within a [`Document`] arena.
///
/// Ids are unique per document and never reused. An id from one document
/// must not be used with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw numeric value, for display and diagnostics.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Character style bitset carried by [`NodeKind::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextFormat(u8);

impl TextFormat {
    pub const BOLD: TextFormat = TextFormat(1);
    pub const ITALIC: TextFormat = TextFormat(1 << 1);
    pub const CODE: TextFormat = TextFormat(1 << 2);
    pub const STRIKETHROUGH: TextFormat = TextFormat(1 << 3);

    /// No styles set.
    pub fn empty() -> Self {
        TextFormat(0)
    }

    pub fn contains(self, other: TextFormat) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bit value, for display and diagnostics.
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for TextFormat {
    type Output = TextFormat;

    fn bitor(self, rhs: TextFormat) -> TextFormat {
        TextFormat(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TextFormat {
    fn bitor_assign(&mut self, rhs: TextFormat) {
        self.0 |= rhs.0;
    }
}

/// Node variants of the document tree.
///
/// Block kinds structure the document; `Text`, `CodeText`, `LineBreak` and
/// `Link` are inline content. `CodeText` is one verbatim line inside a
/// [`NodeKind::CodeBlock`]; lines are separated by `LineBreak` nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading { level: u8 },
    Quote,
    CodeBlock { language: Option<String> },
    List { ordered: bool, start: usize },
    ListItem,
    HorizontalRule,
    Table,
    TableRow,
    TableCell { header: bool },
    Link { url: String },
    Text { text: String, format: TextFormat },
    CodeText { text: String },
    LineBreak,
}

impl NodeKind {
    /// Plain text node with no styling.
    pub fn text(content: impl Into<String>) -> NodeKind {
        NodeKind::Text {
            text: content.into(),
            format: TextFormat::empty(),
        }
    }

    /// Styled text node.
    pub fn styled_text(content: impl Into<String>, format: TextFormat) -> NodeKind {
        NodeKind::Text {
            text: content.into(),
            format,
        }
    }

    /// Verbatim code line node.
    pub fn code_text(content: impl Into<String>) -> NodeKind {
        NodeKind::CodeText {
            text: content.into(),
        }
    }

    /// True for structural kinds that occupy their own vertical space.
    pub fn is_block(&self) -> bool {
        !matches!(
            self,
            NodeKind::Text { .. }
                | NodeKind::CodeText { .. }
                | NodeKind::LineBreak
                | NodeKind::Link { .. }
        )
    }

    pub fn is_root(&self) -> bool {
        matches!(self, NodeKind::Root)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, NodeKind::Table)
    }

    pub fn is_table_row(&self) -> bool {
        matches!(self, NodeKind::TableRow)
    }

    pub fn is_table_cell(&self) -> bool {
        matches!(self, NodeKind::TableCell { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NodeKind::List { .. })
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, NodeKind::ListItem)
    }

    pub fn is_code_block(&self) -> bool {
        matches!(self, NodeKind::CodeBlock { .. })
    }

    pub fn is_code_text(&self) -> bool {
        matches!(self, NodeKind::CodeText { .. })
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, NodeKind::Paragraph)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self, NodeKind::LineBreak)
    }

    /// Short kind label used by inspection output.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Quote => "quote",
            NodeKind::CodeBlock { .. } => "code-block",
            NodeKind::List { .. } => "list",
            NodeKind::ListItem => "list-item",
            NodeKind::HorizontalRule => "horizontal-rule",
            NodeKind::Table => "table",
            NodeKind::TableRow => "table-row",
            NodeKind::TableCell { .. } => "table-cell",
            NodeKind::Link { .. } => "link",
            NodeKind::Text { .. } => "text",
            NodeKind::CodeText { .. } => "code-text",
            NodeKind::LineBreak => "line-break",
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Projection of one text leaf into the document's plain-text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub node: NodeId,
    /// Char offset of the leaf's first character in the projection.
    pub start: usize,
    /// Length of the leaf's text in chars.
    pub len: usize,
}

/// A rooted tree of nodes plus the current selection.
///
/// The tree is stored as an arena keyed by [`NodeId`]; `Clone` produces a
/// full snapshot that can later be handed back to [`Document::restore`].
#[derive(Debug, Clone)]
pub struct Document {
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
    next_id: u64,
    selection: Option<Selection>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    /// Empty document containing only the root node.
    pub fn new() -> Document {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Document {
            nodes,
            root,
            next_id: 1,
            selection: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Creates a detached node. Attach it with [`Document::append_child`],
    /// [`Document::insert_after`] or [`Document::replace`].
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            NodeData {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[&id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    /// Replaces the variant data of an existing node in place.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        if let Some(data) = self.nodes.get_mut(&id) {
            data.kind = kind;
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).children.last().copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.data(id).children.len()
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.data(id).parent?;
        let index = self
            .data(parent)
            .children
            .iter()
            .position(|child| *child == id)?;
        Some((parent, index))
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        if index == 0 {
            None
        } else {
            Some(self.data(parent).children[index - 1])
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        self.data(parent).children.get(index + 1).copied()
    }

    /// Depth-first pre-order listing of `id` and its descendants.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.data(current).children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Child-index path from the root down to `id`. The root's path is empty.
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some((parent, index)) = self.index_in_parent(current) {
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Document-order comparison. An ancestor orders before its descendants.
    pub fn cmp_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.path(a).cmp(&self.path(b))
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Detaches `id` from its parent without dropping the subtree.
    fn detach(&mut self, id: NodeId) {
        if let Some((parent, index)) = self.index_in_parent(id) {
            if let Some(data) = self.nodes.get_mut(&parent) {
                data.children.remove(index);
            }
        }
        if let Some(data) = self.nodes.get_mut(&id) {
            data.parent = None;
        }
    }

    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if child == self.root || !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children.push(child);
        }
        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
    }

    /// Inserts `node` as the next sibling of `anchor`. No-op when `anchor`
    /// has no parent.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        if node == self.root || node == anchor || !self.contains(node) {
            return;
        }
        self.detach(node);
        let Some((parent, index)) = self.index_in_parent(anchor) else {
            return;
        };
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children.insert(index + 1, node);
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = Some(parent);
        }
    }

    /// Inserts `node` as the previous sibling of `anchor`. No-op when
    /// `anchor` has no parent.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        if node == self.root || node == anchor || !self.contains(node) {
            return;
        }
        self.detach(node);
        let Some((parent, index)) = self.index_in_parent(anchor) else {
            return;
        };
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children.insert(index, node);
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = Some(parent);
        }
    }

    /// Removes `id` and its whole subtree. The selection is cleared when it
    /// referenced a removed node. Removing the root is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.contains(id) {
            return;
        }
        self.detach(id);
        let dropped = self.descendants(id);
        for node in &dropped {
            self.nodes.remove(node);
        }
        if let Some(selection) = self.selection {
            if dropped.contains(&selection.anchor.node) || dropped.contains(&selection.focus.node)
            {
                self.selection = None;
            }
        }
    }

    /// Puts `new` in `old`'s tree position and drops `old`'s subtree.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        if old == self.root || new == self.root || old == new || !self.contains(new) {
            return;
        }
        let Some((parent, index)) = self.index_in_parent(old) else {
            return;
        };
        self.detach(new);
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children[index] = new;
        }
        if let Some(data) = self.nodes.get_mut(&new) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.nodes.get_mut(&old) {
            data.parent = None;
        }
        let dropped = self.descendants(old);
        for node in &dropped {
            self.nodes.remove(node);
        }
        if let Some(selection) = self.selection {
            if dropped.contains(&selection.anchor.node) || dropped.contains(&selection.focus.node)
            {
                self.selection = None;
            }
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Collapses the selection at the very end of `id`'s subtree.
    pub fn select_node_end(&mut self, id: NodeId) {
        let leaf = self.last_leaf(id);
        let offset = match self.kind(leaf) {
            NodeKind::Text { text, .. } | NodeKind::CodeText { text } => text.chars().count(),
            _ => 0,
        };
        self.selection = Some(Selection::collapsed(Point::new(leaf, offset)));
    }

    /// Deepest last descendant of `id` (or `id` itself when childless).
    pub fn last_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(last) = self.last_child(current) {
            current = last;
        }
        current
    }

    /// Full snapshot of the document state, selection included.
    pub fn snapshot(&self) -> Document {
        self.clone()
    }

    /// Replaces the document state with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: Document) {
        *self = snapshot;
    }

    /// Plain text of `id`'s subtree: text leaves verbatim, line breaks as
    /// `\n`, block siblings separated by a blank line.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text { text, .. } | NodeKind::CodeText { text } => out.push_str(text),
            NodeKind::LineBreak => out.push('\n'),
            _ => {
                let children = &self.data(id).children;
                for (index, child) in children.iter().enumerate() {
                    self.collect_text(*child, out);
                    if self.kind(*child).is_block() && index + 1 < children.len() {
                        out.push_str("\n\n");
                    }
                }
            }
        }
    }

    /// Text leaves of the whole document with their char offsets into
    /// [`Document::text_content`] of the root.
    pub fn text_spans(&self) -> Vec<TextSpan> {
        let mut spans = Vec::new();
        let mut pos = 0usize;
        self.collect_spans(self.root, &mut pos, &mut spans);
        spans
    }

    fn collect_spans(&self, id: NodeId, pos: &mut usize, spans: &mut Vec<TextSpan>) {
        match self.kind(id) {
            NodeKind::Text { text, .. } | NodeKind::CodeText { text } => {
                let len = text.chars().count();
                spans.push(TextSpan {
                    node: id,
                    start: *pos,
                    len,
                });
                *pos += len;
            }
            NodeKind::LineBreak => *pos += 1,
            _ => {
                let children = &self.data(id).children;
                for (index, child) in children.iter().enumerate() {
                    self.collect_spans(*child, pos, spans);
                    if self.kind(*child).is_block() && index + 1 < children.len() {
                        *pos += 2;
                    }
                }
            }
        }
    }

    /// Maps a char offset in the plain-text projection to a selection point.
    ///
    /// Offsets on a leaf boundary resolve to the start of the following
    /// leaf; the document-end offset resolves to the last leaf's end.
    /// Returns `None` when the document has no text leaves.
    pub fn resolve_text_point(&self, offset: usize) -> Option<Point> {
        let spans = self.text_spans();
        for span in &spans {
            if offset < span.start + span.len {
                let local = offset.saturating_sub(span.start);
                return Some(Point::new(span.node, local));
            }
        }
        spans
            .last()
            .map(|span| Point::new(span.node, span.len))
    }
}
