use alder_tree::{Green, GreenNode, NodeOrToken, Tree};
use text_size::TextSize;

/// Walks the previous (edited) tree in step with the new parse, offering up
/// subtrees that can be shifted whole instead of re-lexed.
///
/// The cursor only moves forward. [`current`](ReuseCursor::current) names the
/// next unconsumed subtree; the parser either descends into it, skips past
/// it, or takes it.
pub(crate) struct ReuseCursor<'tree> {
    /// Ancestors of `current`: node, its absolute start, index of the child
    /// the walk is at.
    stack: Vec<(&'tree GreenNode, TextSize, usize)>,
    current: Option<(&'tree Green, TextSize)>,
}

impl<'tree> ReuseCursor<'tree> {
    pub(crate) fn new(tree: &'tree Tree) -> Self {
        Self { stack: Vec::new(), current: Some((tree.green_root(), TextSize::new(0))) }
    }

    pub(crate) fn current(&self) -> Option<(&'tree Green, TextSize)> {
        self.current
    }

    /// Moves into the current node's first child. Returns false on tokens and
    /// childless nodes, leaving the cursor in place.
    pub(crate) fn descend(&mut self) -> bool {
        let Some((green, start)) = self.current else { return false };
        let NodeOrToken::Node(node) = green else { return false };
        let Some(first) = node.children().first() else { return false };
        self.stack.push((node, start, 0));
        self.current = Some((&first.green, start + first.rel_offset));
        true
    }

    /// Moves to the subtree after the current one: the next sibling, or an
    /// ancestor's next sibling.
    pub(crate) fn advance_past(&mut self) {
        while let Some((node, node_start, index)) = self.stack.last_mut() {
            *index += 1;
            if let Some(child) = node.children().get(*index) {
                self.current = Some((&child.green, *node_start + child.rel_offset));
                return;
            }
            self.stack.pop();
        }
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use alder_grammar::{GrammarBuilder, Production, Symbol};
    use alder_tree::{GreenToken, PointDelta};

    use super::*;

    fn leaf(symbol: Symbol, len: u32) -> Green {
        NodeOrToken::Token(GreenToken::leaf(
            symbol,
            TextSize::new(len),
            PointDelta::new(0, len),
            TextSize::new(0),
            0,
            false,
            false,
        ))
    }

    fn fixture() -> Tree {
        let mut builder = GrammarBuilder::new("reuse-fixture");
        let word = builder.terminal("word");
        let item = builder.non_terminal("item");
        let list = builder.non_terminal("list");
        builder.set_root(list);
        let accepting = builder.lex_state();
        builder.lex_transition(0, 'a', 'z', accepting);
        builder.lex_accept(accepting, word);
        builder.production(Production::new(item, 1));
        builder.production(Production::new(list, 2));
        let start = builder.state();
        let done = builder.state();
        builder.shift(start, word, done);
        builder.goto(start, list, done);
        builder.accept(done);
        let grammar = builder.finish().expect("valid grammar");

        let item_sym = grammar.symbol_named("item").unwrap();
        let first = GreenNode::new(item_sym, vec![leaf(word, 2)]);
        let second = GreenNode::new(item_sym, vec![leaf(word, 3)]);
        let root = GreenNode::new(
            grammar.root(),
            vec![NodeOrToken::Node(first), NodeOrToken::Node(second)],
        );
        Tree::new(grammar, root, 0)
    }

    #[test]
    fn walks_preorder_by_position() {
        let tree = fixture();
        let mut cursor = ReuseCursor::new(&tree);

        let (root, start) = cursor.current().unwrap();
        assert_eq!(start, TextSize::new(0));
        assert_eq!(root.text_len(), TextSize::new(5));

        assert!(cursor.descend());
        let (first, start) = cursor.current().unwrap();
        assert_eq!(start, TextSize::new(0));
        assert_eq!(first.text_len(), TextSize::new(2));

        cursor.advance_past();
        let (second, start) = cursor.current().unwrap();
        assert_eq!(start, TextSize::new(2));
        assert_eq!(second.text_len(), TextSize::new(3));

        assert!(cursor.descend());
        let (word, start) = cursor.current().unwrap();
        assert_eq!(start, TextSize::new(2));
        assert!(word.as_token().is_some());
        assert!(!cursor.descend());

        cursor.advance_past();
        assert!(cursor.current().is_none());
    }
}
