use text_size::{TextRange, TextSize};

use crate::green::{Green, NodeOrToken};
use crate::tree::Tree;

impl Tree {
    /// Byte ranges, in `newer`'s coordinates, whose syntactic interpretation
    /// differs between the two trees.
    ///
    /// The result is a conservative superset: every real change is covered,
    /// and structural sharing keeps the ranges narrow. Ranges come back
    /// sorted and merged.
    pub fn changed_ranges(&self, newer: &Self) -> Vec<TextRange> {
        let mut ranges = Vec::new();
        let mut work: Vec<(&Green, &Green, TextSize)> =
            vec![(self.green_root(), newer.green_root(), TextSize::new(0))];

        while let Some((old, new, new_start)) = work.pop() {
            if old.ptr_eq(new) {
                continue;
            }
            if let (NodeOrToken::Node(old), NodeOrToken::Node(new)) = (old, new)
                && old.kind() == new.kind()
                && old.child_count() == new.child_count()
            {
                for (old_child, new_child) in old.children().iter().zip(new.children()) {
                    work.push((
                        &old_child.green,
                        &new_child.green,
                        new_start + new_child.rel_offset,
                    ));
                }
                continue;
            }
            ranges.push(TextRange::new(new_start, new_start + new.text_len()));
        }

        crate::edit::merge_ranges(&mut ranges);
        ranges
    }
}

#[cfg(test)]
mod tests {
    use alder_grammar::{GrammarBuilder, Production, Symbol};
    use text_size::{TextRange, TextSize};

    use crate::green::{GreenNode, GreenToken, NodeOrToken};
    use crate::point::PointDelta;
    use crate::tree::Tree;

    fn grammar() -> alder_grammar::Grammar {
        let mut builder = GrammarBuilder::new("changes");
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
        builder.finish().expect("valid grammar")
    }

    fn leaf(kind: Symbol, len: u32) -> NodeOrToken<GreenNode, GreenToken> {
        NodeOrToken::Token(GreenToken::leaf(
            kind,
            TextSize::new(len),
            PointDelta::new(0, len),
            TextSize::new(0),
            0,
            false,
            false,
        ))
    }

    #[test]
    fn shared_subtrees_report_no_changes() {
        let grammar = grammar();
        let word = grammar.symbol_named("word").unwrap();
        let item = grammar.symbol_named("item").unwrap();
        let list = grammar.root();

        let first = NodeOrToken::Node(GreenNode::new(item, vec![leaf(word, 2)]));
        let second = NodeOrToken::Node(GreenNode::new(item, vec![leaf(word, 3)]));
        let replacement = NodeOrToken::Node(GreenNode::new(item, vec![leaf(word, 4)]));

        let old_root = GreenNode::new(list, vec![first.clone(), second]);
        let new_root = GreenNode::new(list, vec![first, replacement]);
        let old = Tree::new(grammar.clone(), old_root, 0);
        let new = Tree::new(grammar, new_root, 1);

        assert_eq!(old.changed_ranges(&old.clone()), Vec::<TextRange>::new());
        assert_eq!(
            old.changed_ranges(&new),
            [TextRange::new(TextSize::new(2), TextSize::new(6))]
        );
    }

    #[test]
    fn shifted_but_shared_subtrees_are_quiet() {
        let grammar = grammar();
        let word = grammar.symbol_named("word").unwrap();
        let item = grammar.symbol_named("item").unwrap();
        let list = grammar.root();

        let tail = NodeOrToken::Node(GreenNode::new(item, vec![leaf(word, 2)]));
        let old_root = GreenNode::new(
            list,
            vec![NodeOrToken::Node(GreenNode::new(item, vec![leaf(word, 1)])), tail.clone()],
        );
        let new_root = GreenNode::new(
            list,
            vec![NodeOrToken::Node(GreenNode::new(item, vec![leaf(word, 3)])), tail],
        );
        let old = Tree::new(grammar.clone(), old_root, 0);
        let new = Tree::new(grammar, new_root, 1);

        // Only the rewritten head is reported, not the shifted shared tail.
        assert_eq!(
            old.changed_ranges(&new),
            [TextRange::new(TextSize::new(0), TextSize::new(3))]
        );
    }
}
