use alder_grammar::Grammar;
use text_size::{TextRange, TextSize};

use crate::cursor::TreeCursor;
use crate::green::{Green, GreenNode, NodeOrToken};
use crate::node::Node;
use crate::point::{Point, PointDelta};

/// An immutable snapshot of one parse.
///
/// Trees are cheap to clone and share green subtrees with the trees they were
/// derived from. A tree never stores source text; nodes describe positions in
/// a source the caller owns.
#[derive(Clone)]
pub struct Tree {
    grammar: Grammar,
    root: Green,
    version: u64,
    /// Byte ranges (in current coordinates) invalidated by edits since the
    /// last parse. Empty on freshly parsed trees.
    damaged: Vec<TextRange>,
}

impl Tree {
    /// Wraps a freshly parsed root. Used by the parser, not by editors.
    pub fn new(grammar: Grammar, root: GreenNode, version: u64) -> Self {
        Self { grammar, root: NodeOrToken::Node(root), version, damaged: Vec::new() }
    }

    pub(crate) fn with_damage(
        grammar: Grammar,
        root: Green,
        version: u64,
        damaged: Vec<TextRange>,
    ) -> Self {
        Self { grammar, root, version, damaged }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Monotonically increasing across `edit` and reparse.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The shared green root.
    pub fn green_root(&self) -> &Green {
        &self.root
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::new_root(self)
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.root.text_len()
    }

    /// The point just past the last byte of the tree.
    pub fn end_point(&self) -> Point {
        Point::ZERO.advance(self.root.point_len())
    }

    pub fn point_len(&self) -> PointDelta {
        self.root.point_len()
    }

    /// Whether any ERROR node or missing token exists in the tree.
    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    /// Whether the tree has been edited since it was parsed.
    pub fn has_changes(&self) -> bool {
        !self.damaged.is_empty() || self.root.has_changes()
    }

    /// Byte ranges invalidated by edits since the last parse, merged and in
    /// current (post-edit) coordinates.
    pub fn damaged_ranges(&self) -> &[TextRange] {
        &self.damaged
    }

    /// A cursor positioned on the root.
    pub fn walk(&self) -> TreeCursor<'_> {
        TreeCursor::new(self.root_node())
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("grammar", &self.grammar.name())
            .field("version", &self.version)
            .field("text_len", &self.text_len())
            .field("has_error", &self.has_error())
            .finish()
    }
}
