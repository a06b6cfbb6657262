//! Selection state over the document tree
//!
//! A selection is an anchor and a focus point, each addressing a node and a
//! character offset inside it. Direction is derived from document order, so
//! callers normalize before slicing.

use super::{Document, NodeId};

/// One end of a selection: a node and a char offset within its text.
///
/// For non-text nodes the offset is a child index; the transforms in this
/// crate only produce points on text leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Point {
        Point { node, offset }
    }
}

/// Anchor/focus pair. Forward when the anchor precedes the focus in
/// document order, backward otherwise, collapsed when both are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Selection {
        Selection { anchor, focus }
    }

    /// Selection with both ends on the same point.
    pub fn collapsed(point: Point) -> Selection {
        Selection {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// True when the focus precedes the anchor in document order.
    pub fn is_backward(&self, doc: &Document) -> bool {
        use std::cmp::Ordering;
        match doc.cmp_order(self.anchor.node, self.focus.node) {
            Ordering::Less => false,
            Ordering::Greater => true,
            Ordering::Equal => self.anchor.offset > self.focus.offset,
        }
    }

    /// Returns `(start, end)` in document order regardless of direction.
    pub fn normalized(&self, doc: &Document) -> (Point, Point) {
        if self.is_backward(doc) {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }
}
