use alder_grammar::{Assoc, Grammar, GrammarBuilder, Production, Symbol};
use alder_tree::{InputEdit, Node, Point};
use expect_test::{Expect, expect};
use text_size::{TextRange, TextSize};

use crate::Parser;

/// Sums of numbers: `expr := expr "+" term | term`, `term := number`, with
/// spaces as extras.
fn sums() -> Grammar {
    let mut builder = GrammarBuilder::new("sums");
    let number = builder.terminal("number");
    let plus = builder.token("+");
    let ws = builder.token("ws");
    builder.mark_extra(ws);
    let expr = builder.non_terminal("expr");
    let term = builder.non_terminal("term");
    builder.set_root(expr);

    let digits = builder.lex_state();
    builder.lex_transition(0, '0', '9', digits);
    builder.lex_transition(digits, '0', '9', digits);
    builder.lex_accept(digits, number);
    let after_plus = builder.lex_state();
    builder.lex_transition(0, '+', '+', after_plus);
    builder.lex_accept(after_plus, plus);
    let spaces = builder.lex_state();
    builder.lex_transition(0, ' ', ' ', spaces);
    builder.lex_transition(spaces, ' ', ' ', spaces);
    builder.lex_accept(spaces, ws);

    let add = builder.production(Production::new(expr, 3));
    let lift = builder.production(Production::new(expr, 1));
    let leaf = builder.production(Production::new(term, 1));

    let start = builder.state();
    let after_number = builder.state();
    let after_expr = builder.state();
    let after_term = builder.state();
    let rhs = builder.state();
    let after_rhs = builder.state();

    builder.shift(start, number, after_number);
    builder.goto(start, expr, after_expr);
    builder.goto(start, term, after_term);

    builder.reduce(after_number, plus, leaf);
    builder.reduce(after_number, Symbol::END, leaf);

    builder.shift(after_expr, plus, rhs);
    builder.accept(after_expr);

    builder.reduce(after_term, plus, lift);
    builder.reduce(after_term, Symbol::END, lift);

    builder.shift(rhs, number, after_number);
    builder.goto(rhs, term, after_rhs);

    builder.reduce(after_rhs, plus, add);
    builder.reduce(after_rhs, Symbol::END, add);

    builder.finish().expect("valid grammar")
}

/// Differences of numbers through the ambiguous rule `expr := expr "-" expr`.
/// With `resolved` the conflict is settled statically as left-associative;
/// without it every `-` forks the stack.
fn differences(resolved: bool) -> Grammar {
    let mut builder = GrammarBuilder::new("differences");
    let number = builder.terminal("number");
    let minus = builder.token("-");
    let expr = builder.non_terminal("expr");
    builder.set_root(expr);

    let digits = builder.lex_state();
    builder.lex_transition(0, '0', '9', digits);
    builder.lex_transition(digits, '0', '9', digits);
    builder.lex_accept(digits, number);
    let after_minus = builder.lex_state();
    builder.lex_transition(0, '-', '-', after_minus);
    builder.lex_accept(after_minus, minus);

    let mut subtract = Production::new(expr, 3);
    if resolved {
        builder.set_precedence(minus, 1);
        subtract = subtract.with_precedence(1).with_assoc(Assoc::Left);
    }
    let subtract = builder.production(subtract);
    let leaf = builder.production(Production::new(expr, 1));

    let start = builder.state();
    let after_number = builder.state();
    let after_expr = builder.state();
    let rhs = builder.state();
    let after_rhs = builder.state();

    builder.shift(start, number, after_number);
    builder.goto(start, expr, after_expr);

    builder.reduce(after_number, minus, leaf);
    builder.reduce(after_number, Symbol::END, leaf);

    builder.shift(after_expr, minus, rhs);
    builder.accept(after_expr);

    builder.shift(rhs, number, after_number);
    builder.goto(rhs, expr, after_rhs);

    builder.shift(after_rhs, minus, rhs);
    builder.reduce(after_rhs, minus, subtract);
    builder.reduce(after_rhs, Symbol::END, subtract);

    builder.finish().expect("valid grammar")
}

/// A reduce/reduce conflict settled by dynamic precedence: a lone word is
/// both an `alias` and a `binding`, and `alias` carries the higher weight.
fn words() -> Grammar {
    let mut builder = GrammarBuilder::new("words");
    let word = builder.terminal("word");
    let phrase = builder.non_terminal("phrase");
    let alias = builder.non_terminal("alias");
    let binding = builder.non_terminal("binding");
    builder.set_root(phrase);

    let letters = builder.lex_state();
    builder.lex_transition(0, 'a', 'z', letters);
    builder.lex_transition(letters, 'a', 'z', letters);
    builder.lex_accept(letters, word);

    let as_alias = builder.production(Production::new(alias, 1).with_dynamic_precedence(10));
    let as_binding = builder.production(Production::new(binding, 1));
    let from_alias = builder.production(Production::new(phrase, 1));
    let from_binding = builder.production(Production::new(phrase, 1));

    let start = builder.state();
    let after_word = builder.state();
    let done = builder.state();
    let after_alias = builder.state();
    let after_binding = builder.state();

    builder.shift(start, word, after_word);
    builder.goto(start, phrase, done);
    builder.goto(start, alias, after_alias);
    builder.goto(start, binding, after_binding);

    builder.reduce(after_word, Symbol::END, as_alias);
    builder.reduce(after_word, Symbol::END, as_binding);

    builder.accept(done);
    builder.reduce(after_alias, Symbol::END, from_alias);
    builder.reduce(after_binding, Symbol::END, from_binding);

    builder.finish().expect("valid grammar")
}

fn check(grammar: Grammar, text: &str, expect: Expect) {
    let tree = Parser::new(grammar).parse(text, None);
    expect.assert_eq(&tree.root_node().to_sexp());
}

fn assert_same_shape(left: Node<'_>, right: Node<'_>) {
    assert_eq!(left.kind_name(), right.kind_name());
    assert_eq!(left.byte_range(), right.byte_range());
    assert_eq!(left.child_count(), right.child_count());
    for (left, right) in left.children().zip(right.children()) {
        assert_same_shape(left, right);
    }
}

/// Replaces `old` at `at` with `new`, returning the edited text and the edit
/// descriptor. Single-line texts only.
fn splice(text: &str, at: usize, old: &str, new: &str) -> (String, InputEdit) {
    assert_eq!(&text[at..at + old.len()], old);
    let edited = format!("{}{}{}", &text[..at], new, &text[at + old.len()..]);
    let edit = InputEdit {
        start_byte: TextSize::new(at as u32),
        old_end_byte: TextSize::new((at + old.len()) as u32),
        new_end_byte: TextSize::new((at + new.len()) as u32),
        start_point: Point::new(0, at as u32),
        old_end_point: Point::new(0, (at + old.len()) as u32),
        new_end_point: Point::new(0, (at + new.len()) as u32),
    };
    (edited, edit)
}

#[test]
fn parses_sums() {
    check(
        sums(),
        "1+2",
        expect!["(expr (expr (term (number))) (term (number)))"],
    );
    check(
        sums(),
        "1+2+3",
        expect!["(expr (expr (expr (term (number))) (term (number))) (term (number)))"],
    );
}

#[test]
fn extras_do_not_disturb_structure() {
    let mut parser = Parser::new(sums());
    let spaced = parser.parse("1 + 2", None);
    let dense = parser.parse("1+2", None);
    assert_eq!(spaced.root_node().to_sexp(), dense.root_node().to_sexp());
    assert_eq!(spaced.text_len(), TextSize::new(5));
    assert!(!spaced.has_error());
}

#[test]
fn parsing_is_deterministic() {
    let mut parser = Parser::new(sums());
    let first = parser.parse("1+2+3", None);
    let second = parser.parse("1+2+3", None);
    assert_same_shape(first.root_node(), second.root_node());
}

#[test]
fn tree_spans_tile_the_input() {
    let tree = Parser::new(sums()).parse("1 + 2+3", None);
    let root = tree.root_node();
    assert_eq!(root.start_byte(), TextSize::new(0));
    assert_eq!(root.end_byte(), TextSize::new(7));
    // Every interior node is tiled by its children.
    fn visit(node: Node<'_>) {
        if node.child_count() == 0 {
            return;
        }
        let mut at = node.start_byte();
        for child in node.children() {
            assert_eq!(child.start_byte(), at);
            at = child.end_byte();
            visit(child);
        }
        assert_eq!(at, node.end_byte());
    }
    visit(root);
}

#[test]
fn trailing_operator_fabricates_a_missing_operand() {
    let tree = Parser::new(sums()).parse("1+", None);
    assert!(tree.has_error());
    expect!["(expr (expr (term (number))) (term (MISSING number)))"]
        .assert_eq(&tree.root_node().to_sexp());

    let operand = tree.root_node().child(2).unwrap();
    let missing = operand.child(0).unwrap();
    assert!(missing.is_missing());
    assert_eq!(missing.byte_range(), TextRange::empty(TextSize::new(2)));
}

#[test]
fn unparsable_suffix_is_skipped_into_an_error() {
    let tree = Parser::new(sums()).parse("1?2", None);
    assert!(tree.has_error());
    expect!["(expr (expr (term (number))) (ERROR))"].assert_eq(&tree.root_node().to_sexp());
    // The skipped region still covers its bytes.
    assert_eq!(tree.text_len(), TextSize::new(3));
}

#[test]
fn recovery_always_reaches_the_end_of_input() {
    for text in ["?", "???", "1??", "?1", "+", "++1++", "1+?+2"] {
        let tree = Parser::new(sums()).parse(text, None);
        assert!(tree.has_error(), "{text:?} must carry an error");
        assert_eq!(tree.text_len(), TextSize::of(text), "{text:?} must be fully covered");
    }
}

#[test]
fn empty_input_yields_a_missing_root() {
    let tree = Parser::new(sums()).parse("", None);
    assert!(tree.has_error());
    assert_eq!(tree.text_len(), TextSize::new(0));
}

#[test]
fn static_precedence_settles_shift_reduce_conflicts() {
    // Left associativity groups from the left.
    check(
        differences(true),
        "1-2-3",
        expect!["(expr (expr (expr (number)) (expr (number))) (expr (number)))"],
    );
}

#[test]
fn unresolved_conflicts_fork_and_still_parse() {
    let mut parser = Parser::new(differences(false));
    let first = parser.parse("1-2-3-4", None);
    assert!(!first.has_error());
    assert_eq!(first.root_node().kind_name(), "expr");

    let second = parser.parse("1-2-3-4", None);
    assert_same_shape(first.root_node(), second.root_node());
}

#[test]
fn dynamic_precedence_picks_among_reductions() {
    check(words(), "hello", expect!["(phrase (alias (word)))"]);
}

#[test]
fn edited_reparse_matches_a_fresh_parse() {
    let mut parser = Parser::new(sums());
    let source = "1+2+3";
    let old = parser.parse(source, None);

    for (at, was, now) in [(2, "2", "42"), (2, "2+3", "7"), (0, "1", "10"), (3, "", " ")] {
        let (edited, edit) = splice(source, at, was, now);
        let old = old.edit(&edit).expect("edit is in bounds");
        let incremental = parser.parse(&edited, Some(&old));
        let fresh = parser.parse(&edited, None);
        assert_same_shape(incremental.root_node(), fresh.root_node());
        assert!(!incremental.has_error(), "{edited:?}");
    }
}

#[test]
fn undamaged_subtrees_are_shared_with_the_old_tree() {
    let mut parser = Parser::new(sums());
    let old = parser.parse("1+2", None);
    let (edited, edit) = splice("1+2", 2, "2", "3");
    let old = old.edit(&edit).expect("edit is in bounds");
    let new = parser.parse(&edited, Some(&old));

    assert_eq!(new.version(), old.version() + 1);
    let old_root = old.root_node();
    let new_root = new.root_node();
    // The left operand and the operator survive by pointer identity.
    assert_eq!(new_root.child(0).unwrap().id(), old_root.child(0).unwrap().id());
    assert_eq!(new_root.child(1).unwrap().id(), old_root.child(1).unwrap().id());
    // The edited operand was reparsed.
    assert_ne!(new_root.child(2).unwrap().id(), old_root.child(2).unwrap().id());
}

#[test]
fn appending_digits_invalidates_the_trailing_number() {
    let mut parser = Parser::new(sums());
    let old = parser.parse("1+2", None);
    let (edited, edit) = splice("1+2", 3, "", "4");
    let old = old.edit(&edit).expect("edit is in bounds");
    let new = parser.parse(&edited, Some(&old));

    // "2" examined the byte after it, so "24" must be one reparsed token.
    expect!["(expr (expr (term (number))) (term (number)))"]
        .assert_eq(&new.root_node().to_sexp());
    let number = new.root_node().descendant_for_byte(TextSize::new(2));
    assert_eq!(number.byte_range(), TextRange::new(TextSize::new(2), TextSize::new(4)));
}

#[test]
fn edits_accumulate_across_reparses() {
    let mut parser = Parser::new(sums());
    let mut text = String::from("1+2");
    let mut tree = parser.parse(&text, None);

    for (at, was, now) in [(0, "1", "9"), (2, "2", "8"), (3, "", "+7")] {
        let (edited, edit) = splice(&text, at, was, now);
        let old = tree.edit(&edit).expect("edit is in bounds");
        tree = parser.parse(&edited, Some(&old));
        text = edited;
    }

    expect!["(expr (expr (expr (term (number))) (term (number))) (term (number)))"]
        .assert_eq(&tree.root_node().to_sexp());
    let fresh = parser.parse(&text, None);
    assert_same_shape(tree.root_node(), fresh.root_node());
}
