use std::fmt;

use alder_grammar::{LexStateId, Symbol};
use text_size::TextSize;
use triomphe::{Arc, ThinArc};

use crate::point::PointDelta;

/// Cost accounting used to rank candidate interpretations of broken input.
/// Lower is better; a cost of zero means no errors at all.
pub mod error_costs {
    pub const ERROR_COST_PER_MISSING_TREE: u32 = 110;
    pub const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;
    pub const ERROR_COST_PER_SKIPPED_LINE: u32 = 30;
    pub const ERROR_COST_PER_SKIPPED_CHAR: u32 = 1;
}

/// Either a node or a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

/// A green subtree: node or token, shared and immutable.
pub type Green = NodeOrToken<GreenNode, GreenToken>;

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct NodeFlags(u8);

impl NodeFlags {
    pub(crate) const EMPTY: Self = Self(0);
    /// An ERROR or missing token somewhere in the subtree.
    pub(crate) const HAS_ERROR: Self = Self(1 << 0);
    /// An edit landed in or next to the subtree since it was parsed.
    pub(crate) const HAS_CHANGES: Self = Self(1 << 1);
    /// A zero-width token fabricated by error recovery.
    pub(crate) const MISSING: Self = Self(1 << 2);
    /// An extra, shifted outside any rule.
    pub(crate) const EXTRA: Self = Self(1 << 3);
    /// An external-scanner token somewhere in the subtree.
    pub(crate) const CONTAINS_EXTERNAL: Self = Self(1 << 4);

    #[inline]
    pub(crate) fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub(crate) fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// The flags of `self` that propagate from child to parent.
    #[inline]
    fn inherited(self) -> Self {
        Self(self.0 & (Self::HAS_ERROR.0 | Self::HAS_CHANGES.0 | Self::CONTAINS_EXTERNAL.0))
    }
}

struct GreenTokenData {
    kind: Symbol,
    flags: NodeFlags,
    text_len: TextSize,
    point_len: PointDelta,
    /// Bytes beyond `text_len` the lexer examined to settle this token.
    lookahead_len: TextSize,
    /// Lex state the token was recognized in.
    lex_state: LexStateId,
}

/// A token leaf. Stores lengths, never text: the tree describes positions in
/// a source the caller owns.
#[derive(Clone)]
pub struct GreenToken {
    data: Arc<GreenTokenData>,
}

impl GreenToken {
    /// A token recognized by the lexer or an external scanner.
    #[allow(clippy::too_many_arguments)]
    pub fn leaf(
        kind: Symbol,
        text_len: TextSize,
        point_len: PointDelta,
        lookahead_len: TextSize,
        lex_state: LexStateId,
        extra: bool,
        external: bool,
    ) -> Self {
        let mut flags = NodeFlags::EMPTY;
        if extra {
            flags = flags.union(NodeFlags::EXTRA);
        }
        if external {
            flags = flags.union(NodeFlags::CONTAINS_EXTERNAL);
        }
        Self {
            data: Arc::new(GreenTokenData {
                kind,
                flags,
                text_len,
                point_len,
                lookahead_len,
                lex_state,
            }),
        }
    }

    /// A zero-width token fabricated where the grammar required one.
    pub fn missing(kind: Symbol, lex_state: LexStateId) -> Self {
        Self {
            data: Arc::new(GreenTokenData {
                kind,
                flags: NodeFlags::MISSING.union(NodeFlags::HAS_ERROR),
                text_len: TextSize::new(0),
                point_len: PointDelta::ZERO,
                lookahead_len: TextSize::new(0),
                lex_state,
            }),
        }
    }

    /// The same token with its span remapped by an edit.
    pub(crate) fn remapped(&self, text_len: TextSize, point_len: PointDelta) -> Self {
        Self {
            data: Arc::new(GreenTokenData {
                kind: self.data.kind,
                flags: self.data.flags.union(NodeFlags::HAS_CHANGES),
                text_len,
                point_len,
                lookahead_len: self.data.lookahead_len,
                lex_state: self.data.lex_state,
            }),
        }
    }

    #[inline]
    pub fn kind(&self) -> Symbol {
        self.data.kind
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.data.text_len
    }

    #[inline]
    pub fn point_len(&self) -> PointDelta {
        self.data.point_len
    }

    #[inline]
    pub fn lookahead_len(&self) -> TextSize {
        self.data.lookahead_len
    }

    #[inline]
    pub fn lex_state(&self) -> LexStateId {
        self.data.lex_state
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.data.flags.contains(NodeFlags::MISSING)
    }

    #[inline]
    pub fn is_extra(&self) -> bool {
        self.data.flags.contains(NodeFlags::EXTRA)
    }

    #[inline]
    pub fn has_changes(&self) -> bool {
        self.data.flags.contains(NodeFlags::HAS_CHANGES)
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.data.flags.contains(NodeFlags::HAS_ERROR)
    }

    #[inline]
    pub fn contains_external(&self) -> bool {
        self.data.flags.contains(NodeFlags::CONTAINS_EXTERNAL)
    }

    pub fn error_cost(&self) -> u32 {
        if self.is_missing() { error_costs::ERROR_COST_PER_MISSING_TREE } else { 0 }
    }

    pub(crate) fn flags(&self) -> NodeFlags {
        self.data.flags
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn ptr(&self) -> *const () {
        (&raw const *self.data).cast()
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenToken")
            .field("kind", &self.kind())
            .field("text_len", &self.text_len())
            .finish()
    }
}

impl PartialEq for GreenToken {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenToken {}

/// A child subtree plus its offsets relative to the parent's start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GreenChild {
    pub green: Green,
    pub rel_offset: TextSize,
    pub rel_point: PointDelta,
}

struct GreenNodeHead {
    kind: Symbol,
    flags: NodeFlags,
    text_len: TextSize,
    point_len: PointDelta,
    error_cost: u32,
    /// Lex state of the first token in the subtree.
    first_lex_state: LexStateId,
    /// Lookahead of the last token in the subtree, past the subtree's end.
    trailing_lookahead: TextSize,
}

/// An interior green node: a kind plus shared children.
#[derive(Clone)]
pub struct GreenNode {
    data: ThinArc<GreenNodeHead, GreenChild>,
}

impl GreenNode {
    pub fn new(kind: Symbol, children: Vec<Green>) -> Self {
        Self::with_flags(kind, children, NodeFlags::EMPTY)
    }

    pub(crate) fn with_flags(kind: Symbol, children: Vec<Green>, extra_flags: NodeFlags) -> Self {
        let mut flags = extra_flags;
        let mut text_len = TextSize::new(0);
        let mut point_len = PointDelta::ZERO;
        let mut error_cost = 0u32;
        let mut first_lex_state = 0;
        let mut trailing_lookahead = TextSize::new(0);

        let positioned: Vec<GreenChild> = children
            .into_iter()
            .map(|green| {
                let child = GreenChild { rel_offset: text_len, rel_point: point_len, green };
                flags = flags.union(child.green.flags().inherited());
                text_len += child.green.text_len();
                point_len = point_len.concat(child.green.point_len());
                error_cost += child.green.error_cost();
                trailing_lookahead = child.green.trailing_lookahead();
                child
            })
            .collect();

        if let Some(first) = positioned.first() {
            first_lex_state = first.green.first_lex_state();
        }
        if kind == Symbol::ERROR {
            flags = flags.union(NodeFlags::HAS_ERROR);
            error_cost += error_costs::ERROR_COST_PER_SKIPPED_TREE
                + error_costs::ERROR_COST_PER_SKIPPED_CHAR * u32::from(text_len)
                + error_costs::ERROR_COST_PER_SKIPPED_LINE * point_len.rows;
        }

        let head = GreenNodeHead {
            kind,
            flags,
            text_len,
            point_len,
            error_cost,
            first_lex_state,
            trailing_lookahead,
        };
        Self { data: ThinArc::from_header_and_iter(head, positioned.into_iter()) }
    }

    #[inline]
    pub fn kind(&self) -> Symbol {
        self.data.header.header.kind
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.data.header.header.text_len
    }

    #[inline]
    pub fn point_len(&self) -> PointDelta {
        self.data.header.header.point_len
    }

    #[inline]
    pub fn children(&self) -> &[GreenChild] {
        &self.data.slice
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.data.slice.len()
    }

    #[inline]
    pub fn error_cost(&self) -> u32 {
        self.data.header.header.error_cost
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.data.header.header.flags.contains(NodeFlags::HAS_ERROR)
    }

    #[inline]
    pub fn has_changes(&self) -> bool {
        self.data.header.header.flags.contains(NodeFlags::HAS_CHANGES)
    }

    #[inline]
    pub fn contains_external(&self) -> bool {
        self.data.header.header.flags.contains(NodeFlags::CONTAINS_EXTERNAL)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind() == Symbol::ERROR
    }

    #[inline]
    pub fn first_lex_state(&self) -> LexStateId {
        self.data.header.header.first_lex_state
    }

    #[inline]
    pub fn trailing_lookahead(&self) -> TextSize {
        self.data.header.header.trailing_lookahead
    }

    pub(crate) fn flags(&self) -> NodeFlags {
        self.data.header.header.flags
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr() == other.ptr()
    }

    pub(crate) fn ptr(&self) -> *const () {
        (&raw const *self.data).cast()
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("text_len", &self.text_len())
            .field("children", &self.child_count())
            .finish()
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenNode {}

impl Green {
    #[inline]
    pub fn kind(&self) -> Symbol {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.text_len(),
            NodeOrToken::Token(token) => token.text_len(),
        }
    }

    #[inline]
    pub fn point_len(&self) -> PointDelta {
        match self {
            NodeOrToken::Node(node) => node.point_len(),
            NodeOrToken::Token(token) => token.point_len(),
        }
    }

    pub fn error_cost(&self) -> u32 {
        match self {
            NodeOrToken::Node(node) => node.error_cost(),
            NodeOrToken::Token(token) => token.error_cost(),
        }
    }

    pub fn has_changes(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.has_changes(),
            NodeOrToken::Token(token) => token.has_changes(),
        }
    }

    pub fn has_error(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.has_error(),
            NodeOrToken::Token(token) => token.has_error(),
        }
    }

    pub fn contains_external(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.contains_external(),
            NodeOrToken::Token(token) => token.contains_external(),
        }
    }

    pub fn is_extra(&self) -> bool {
        match self {
            NodeOrToken::Node(_) => false,
            NodeOrToken::Token(token) => token.is_extra(),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            NodeOrToken::Node(_) => false,
            NodeOrToken::Token(token) => token.is_missing(),
        }
    }

    pub fn first_lex_state(&self) -> LexStateId {
        match self {
            NodeOrToken::Node(node) => node.first_lex_state(),
            NodeOrToken::Token(token) => token.lex_state(),
        }
    }

    pub fn trailing_lookahead(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.trailing_lookahead(),
            NodeOrToken::Token(token) => token.lookahead_len(),
        }
    }

    pub fn as_node(&self) -> Option<&GreenNode> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&GreenToken> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr() == other.ptr()
    }

    pub(crate) fn ptr(&self) -> *const () {
        match self {
            NodeOrToken::Node(node) => node.ptr(),
            NodeOrToken::Token(token) => token.ptr(),
        }
    }

    pub(crate) fn flags(&self) -> NodeFlags {
        match self {
            NodeOrToken::Node(node) => node.flags(),
            NodeOrToken::Token(token) => token.flags(),
        }
    }
}
