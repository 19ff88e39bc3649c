use alder_grammar::Symbol;
use text_size::{TextRange, TextSize};

use crate::cursor::TreeCursor;
use crate::green::{Green, GreenChild, NodeOrToken};
use crate::point::{Point, PointRange};
use crate::tree::Tree;

/// A node in a syntax tree: a cheap, copyable view over shared green data.
///
/// Tokens are leaves; they answer the same questions as interior nodes and
/// report a `child_count` of zero.
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    green: &'tree Green,
    start_byte: TextSize,
    start_point: Point,
}

impl<'tree> Node<'tree> {
    pub(crate) fn new_root(tree: &'tree Tree) -> Self {
        Self {
            tree,
            green: tree.green_root(),
            start_byte: TextSize::new(0),
            start_point: Point::ZERO,
        }
    }

    pub(crate) fn from_child(tree: &'tree Tree, child: &'tree GreenChild, parent: &Self) -> Self {
        Self {
            tree,
            green: &child.green,
            start_byte: parent.start_byte + child.rel_offset,
            start_point: parent.start_point.advance(child.rel_point),
        }
    }

    pub(crate) fn from_parts(
        tree: &'tree Tree,
        green: &'tree Green,
        start_byte: TextSize,
        start_point: Point,
    ) -> Self {
        Self { tree, green, start_byte, start_point }
    }

    pub fn tree(self) -> &'tree Tree {
        self.tree
    }

    pub(crate) fn green(self) -> &'tree Green {
        self.green
    }

    #[inline]
    pub fn kind(self) -> Symbol {
        self.green.kind()
    }

    /// The grammar-assigned name of this node's kind.
    pub fn kind_name(self) -> &'tree str {
        self.tree.grammar().symbol_name(self.kind())
    }

    /// An identifier stable for as long as the underlying subtree is shared.
    /// Two nodes of different trees share an id exactly when the subtree was
    /// reused verbatim between them.
    pub fn id(self) -> usize {
        self.green.ptr() as usize
    }

    #[inline]
    pub fn start_byte(self) -> TextSize {
        self.start_byte
    }

    #[inline]
    pub fn end_byte(self) -> TextSize {
        self.start_byte + self.green.text_len()
    }

    pub fn byte_range(self) -> TextRange {
        TextRange::new(self.start_byte(), self.end_byte())
    }

    #[inline]
    pub fn start_point(self) -> Point {
        self.start_point
    }

    pub fn end_point(self) -> Point {
        self.start_point.advance(self.green.point_len())
    }

    pub fn point_range(self) -> PointRange {
        PointRange::new(self.start_point(), self.end_point())
    }

    /// Whether the node's kind is named. Anonymous nodes (operators,
    /// punctuation) are skipped by named traversals and s-expressions.
    pub fn is_named(self) -> bool {
        self.tree.grammar().is_named(self.kind())
    }

    pub fn is_extra(self) -> bool {
        self.green.is_extra()
    }

    /// Whether this is a zero-width token fabricated by error recovery.
    pub fn is_missing(self) -> bool {
        self.green.is_missing()
    }

    /// Whether this node is an ERROR container.
    pub fn is_error(self) -> bool {
        self.kind() == Symbol::ERROR
    }

    /// Whether any ERROR node or missing token exists in this subtree.
    pub fn has_error(self) -> bool {
        self.green.has_error()
    }

    /// Whether an edit invalidated this subtree since it was parsed.
    pub fn has_changes(self) -> bool {
        self.green.has_changes()
    }

    pub fn is_token(self) -> bool {
        matches!(self.green, NodeOrToken::Token(_))
    }

    pub fn child_count(self) -> usize {
        match self.green {
            NodeOrToken::Node(node) => node.child_count(),
            NodeOrToken::Token(_) => 0,
        }
    }

    fn green_children(self) -> &'tree [GreenChild] {
        match self.green {
            NodeOrToken::Node(node) => node.children(),
            NodeOrToken::Token(_) => &[],
        }
    }

    pub fn child(self, index: usize) -> Option<Node<'tree>> {
        let child = self.green_children().get(index)?;
        Some(Self::from_child(self.tree, child, &self))
    }

    pub fn children(self) -> Children<'tree> {
        Children { parent: self, children: self.green_children().iter() }
    }

    /// Direct children with named kinds, in order.
    pub fn named_children(self) -> impl Iterator<Item = Node<'tree>> {
        self.children().filter(|child| child.is_named())
    }

    /// The parent node, found by walking down from the root.
    ///
    /// O(depth · width); prefer [`TreeCursor`] when walking repeatedly.
    pub fn parent(self) -> Option<Node<'tree>> {
        let root = self.tree.root_node();
        if self == root {
            return None;
        }
        let mut stack: Vec<(Node<'tree>, Children<'tree>)> = vec![(root, root.children())];
        while let Some((node, children)) = stack.last_mut() {
            let node = *node;
            match children.next() {
                Some(child) => {
                    if child == self {
                        return Some(node);
                    }
                    if child.start_byte() <= self.start_byte
                        && self.end_byte() <= child.end_byte()
                        && !child.is_token()
                    {
                        stack.push((child, child.children()));
                    }
                }
                None => {
                    stack.pop();
                }
            }
        }
        None
    }

    pub fn next_sibling(self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let index = parent.children().position(|child| child == self)?;
        parent.child(index + 1)
    }

    pub fn prev_sibling(self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let index = parent.children().position(|child| child == self)?;
        index.checked_sub(1).and_then(|index| parent.child(index))
    }

    /// The deepest node whose span contains `byte`.
    ///
    /// Descends by binary search over child offsets, so lookups cost
    /// O(log width) per level.
    pub fn descendant_for_byte(self, byte: TextSize) -> Node<'tree> {
        let mut node = self;
        while let Some(child) = node.child_containing_byte(byte) {
            node = child;
        }
        node
    }

    fn child_containing_byte(self, byte: TextSize) -> Option<Node<'tree>> {
        let children = self.green_children();
        if children.is_empty() || byte < self.start_byte {
            return None;
        }
        let rel = byte - self.start_byte;
        let idx = children.partition_point(|child| child.rel_offset + child.green.text_len() <= rel);
        let child = children.get(idx)?;
        (child.rel_offset <= rel).then(|| Self::from_child(self.tree, child, &self))
    }

    /// The smallest node whose span contains `range`.
    pub fn descendant_for_byte_range(self, range: TextRange) -> Node<'tree> {
        let mut node = self;
        'descend: loop {
            for child in node.children() {
                if child.start_byte() <= range.start() && range.end() <= child.end_byte() {
                    node = child;
                    continue 'descend;
                }
            }
            return node;
        }
    }

    /// A cursor rooted at this node: `goto_parent` will not walk above it.
    pub fn walk(self) -> TreeCursor<'tree> {
        TreeCursor::new(self)
    }

    /// Renders the named structure of this subtree as an s-expression.
    pub fn to_sexp(self) -> String {
        let mut out = String::new();
        let mut work = vec![SexpStep::Enter(self)];
        while let Some(step) = work.pop() {
            match step {
                SexpStep::Enter(node) => {
                    if node.is_missing() {
                        if !out.is_empty() && !out.ends_with('(') {
                            out.push(' ');
                        }
                        if node.is_named() {
                            out.push_str(&format!("(MISSING {})", node.kind_name()));
                        } else {
                            out.push_str(&format!("(MISSING \"{}\")", node.kind_name()));
                        }
                        continue;
                    }
                    if !node.is_named() {
                        continue;
                    }
                    if !out.is_empty() && !out.ends_with('(') {
                        out.push(' ');
                    }
                    out.push('(');
                    out.push_str(node.kind_name());
                    work.push(SexpStep::Leave);
                    for child in node.children().rev() {
                        work.push(SexpStep::Enter(child));
                    }
                }
                SexpStep::Leave => out.push(')'),
            }
        }
        out
    }
}

enum SexpStep<'tree> {
    Enter(Node<'tree>),
    Leave,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.green.ptr_eq(other.green) && self.start_byte == other.start_byte
    }
}

impl Eq for Node<'_> {}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:?}", self.kind_name(), self.byte_range())
    }
}

/// Iterator over a node's direct children.
pub struct Children<'tree> {
    parent: Node<'tree>,
    children: std::slice::Iter<'tree, GreenChild>,
}

impl<'tree> Iterator for Children<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Self::Item> {
        let child = self.children.next()?;
        Some(Node::from_child(self.parent.tree, child, &self.parent))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.children.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let child = self.children.next_back()?;
        Some(Node::from_child(self.parent.tree, child, &self.parent))
    }
}

impl ExactSizeIterator for Children<'_> {}
