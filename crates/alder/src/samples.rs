//! Small complete grammars assembled with [`GrammarBuilder`].
//!
//! Real table sets come from an external generator through
//! [`Grammar::from_bytes`](alder_grammar::Grammar::from_bytes); these three
//! are hand-built fixtures that cover the engine's surface: a plain SLR
//! automaton, a grammar whose conflicts exercise forking, and a grammar with
//! an external scanner.

use alder_grammar::{
    Assoc, Grammar, GrammarBuilder, ParseStateId, Production, ProductionId, Symbol, SymbolSet,
};
use alder_lexer::{ExternalScanner, ScanCursor};

fn reduce_on(
    builder: &mut GrammarBuilder,
    state: ParseStateId,
    production: ProductionId,
    lookaheads: &[Symbol],
) {
    for &symbol in lookaheads {
        builder.reduce(state, symbol, production);
    }
}

/// Sums, products and parenthesized groups over numbers:
///
/// ```text
/// expr   := expr "+" term | term
/// term   := term "*" factor | factor
/// factor := "(" expr ")" | number
/// ```
///
/// The tables are a conflict-free SLR automaton; spaces and tabs are extras.
pub fn arithmetic() -> Grammar {
    let mut builder = GrammarBuilder::new("arithmetic");
    let number = builder.terminal("number");
    let plus = builder.token("+");
    let star = builder.token("*");
    let lparen = builder.token("(");
    let rparen = builder.token(")");
    let ws = builder.token("ws");
    builder.mark_extra(ws);
    let expr = builder.non_terminal("expr");
    let term = builder.non_terminal("term");
    let factor = builder.non_terminal("factor");
    builder.set_root(expr);

    let digits = builder.lex_state();
    builder.lex_transition(0, '0', '9', digits);
    builder.lex_transition(digits, '0', '9', digits);
    builder.lex_accept(digits, number);
    for (ch, symbol) in [('+', plus), ('*', star), ('(', lparen), (')', rparen)] {
        let state = builder.lex_state();
        builder.lex_transition(0, ch, ch, state);
        builder.lex_accept(state, symbol);
    }
    let spaces = builder.lex_state();
    for ch in [' ', '\t'] {
        builder.lex_transition(0, ch, ch, spaces);
        builder.lex_transition(spaces, ch, ch, spaces);
    }
    builder.lex_accept(spaces, ws);

    let add = builder.production(Production::new(expr, 3));
    let expr_term = builder.production(Production::new(expr, 1));
    let mul = builder.production(Production::new(term, 3));
    let term_factor = builder.production(Production::new(term, 1));
    let group = builder.production(Production::new(factor, 3));
    let factor_number = builder.production(Production::new(factor, 1));

    let s: [ParseStateId; 12] = std::array::from_fn(|_| builder.state());
    let follow_factor = [plus, star, rparen, Symbol::END];
    let follow_term = [plus, rparen, Symbol::END];

    // Operand positions: `(`, a number, or a finished non-terminal.
    for (state, expr_goto, term_goto, factor_goto) in [
        (s[0], Some(s[1]), Some(s[2]), s[3]),
        (s[4], Some(s[8]), Some(s[2]), s[3]),
        (s[6], None, Some(s[9]), s[3]),
        (s[7], None, None, s[10]),
    ] {
        builder.shift(state, number, s[5]);
        builder.shift(state, lparen, s[4]);
        if let Some(target) = expr_goto {
            builder.goto(state, expr, target);
        }
        if let Some(target) = term_goto {
            builder.goto(state, term, target);
        }
        builder.goto(state, factor, factor_goto);
    }

    builder.shift(s[1], plus, s[6]);
    builder.accept(s[1]);

    reduce_on(&mut builder, s[2], expr_term, &follow_term);
    builder.shift(s[2], star, s[7]);

    reduce_on(&mut builder, s[3], term_factor, &follow_factor);
    reduce_on(&mut builder, s[5], factor_number, &follow_factor);

    builder.shift(s[8], plus, s[6]);
    builder.shift(s[8], rparen, s[11]);

    reduce_on(&mut builder, s[9], add, &follow_term);
    builder.shift(s[9], star, s[7]);

    reduce_on(&mut builder, s[10], mul, &follow_factor);
    reduce_on(&mut builder, s[11], group, &follow_factor);

    builder.finish().expect("the arithmetic tables are consistent")
}

/// Two binary operators over numbers through the ambiguous rule shape
/// `expr := expr OP expr`:
///
/// ```text
/// expr := expr "-" expr    (precedence 1, left associative)
///       | expr "~" expr    (no precedence)
///       | number
/// ```
///
/// `-` conflicts are settled statically by the metadata; every `~` forks the
/// stack and the interpretations merge back once they converge.
pub fn ambiguous_expressions() -> Grammar {
    let mut builder = GrammarBuilder::new("ambiguous-expressions");
    let number = builder.terminal("number");
    let minus = builder.token("-");
    let tilde = builder.token("~");
    let ws = builder.token("ws");
    builder.mark_extra(ws);
    let expr = builder.non_terminal("expr");
    builder.set_root(expr);
    builder.set_precedence(minus, 1);

    let digits = builder.lex_state();
    builder.lex_transition(0, '0', '9', digits);
    builder.lex_transition(digits, '0', '9', digits);
    builder.lex_accept(digits, number);
    for (ch, symbol) in [('-', minus), ('~', tilde)] {
        let state = builder.lex_state();
        builder.lex_transition(0, ch, ch, state);
        builder.lex_accept(state, symbol);
    }
    let spaces = builder.lex_state();
    builder.lex_transition(0, ' ', ' ', spaces);
    builder.lex_transition(spaces, ' ', ' ', spaces);
    builder.lex_accept(spaces, ws);

    let subtract =
        builder.production(Production::new(expr, 3).with_precedence(1).with_assoc(Assoc::Left));
    let join = builder.production(Production::new(expr, 3));
    let lift = builder.production(Production::new(expr, 1));

    let start = builder.state();
    let after_number = builder.state();
    let after_expr = builder.state();
    let minus_rhs = builder.state();
    let tilde_rhs = builder.state();
    let after_subtract = builder.state();
    let after_join = builder.state();

    builder.shift(start, number, after_number);
    builder.goto(start, expr, after_expr);

    reduce_on(&mut builder, after_number, lift, &[minus, tilde, Symbol::END]);

    builder.shift(after_expr, minus, minus_rhs);
    builder.shift(after_expr, tilde, tilde_rhs);
    builder.accept(after_expr);

    for (rhs, done) in [(minus_rhs, after_subtract), (tilde_rhs, after_join)] {
        builder.shift(rhs, number, after_number);
        builder.goto(rhs, expr, done);
    }

    for (done, production) in [(after_subtract, subtract), (after_join, join)] {
        builder.shift(done, minus, minus_rhs);
        builder.shift(done, tilde, tilde_rhs);
        reduce_on(&mut builder, done, production, &[minus, tilde, Symbol::END]);
    }

    builder.finish().expect("the expression tables are consistent")
}

/// Word sequences with nested block comments:
///
/// ```text
/// document := document word | word
/// ```
///
/// Whitespace and `block_comment` are extras; the comment is recognized by
/// [`BlockCommentScanner`], since nesting is beyond a DFA.
pub fn documents() -> Grammar {
    let mut builder = GrammarBuilder::new("documents");
    let word = builder.terminal("word");
    let ws = builder.token("ws");
    builder.mark_extra(ws);
    let block_comment = builder.external("block_comment");
    builder.mark_extra(block_comment);
    let document = builder.non_terminal("document");
    builder.set_root(document);

    let letters = builder.lex_state();
    builder.lex_transition(0, 'a', 'z', letters);
    builder.lex_transition(letters, 'a', 'z', letters);
    builder.lex_accept(letters, word);
    let spaces = builder.lex_state();
    for ch in [' ', '\t', '\n'] {
        builder.lex_transition(0, ch, ch, spaces);
        builder.lex_transition(spaces, ch, ch, spaces);
    }
    builder.lex_accept(spaces, ws);

    let append = builder.production(Production::new(document, 2));
    let first = builder.production(Production::new(document, 1));

    let start = builder.state();
    let after_word = builder.state();
    let after_document = builder.state();
    let after_append = builder.state();

    builder.shift(start, word, after_word);
    builder.goto(start, document, after_document);
    reduce_on(&mut builder, after_word, first, &[word, Symbol::END]);
    builder.shift(after_document, word, after_append);
    builder.accept(after_document);
    reduce_on(&mut builder, after_append, append, &[word, Symbol::END]);

    builder.finish().expect("the document tables are consistent")
}

/// Recognizes `/* ... */` comments that nest, for the [`documents`] grammar.
///
/// The scanner is stateless between tokens: a comment is consumed whole, so
/// nothing carries over and `serialize` stays empty.
#[derive(Debug, Clone, Copy)]
pub struct BlockCommentScanner {
    symbol: Symbol,
}

impl BlockCommentScanner {
    pub fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }

    /// A scanner wired to the `block_comment` symbol of `grammar`.
    pub fn for_grammar(grammar: &Grammar) -> Option<Self> {
        grammar.symbol_named("block_comment").map(Self::new)
    }
}

impl ExternalScanner for BlockCommentScanner {
    fn scan(&mut self, cursor: &mut ScanCursor<'_>, valid: &SymbolSet) -> Option<Symbol> {
        if !valid.contains(self.symbol) || cursor.lookahead() != '/' {
            return None;
        }
        cursor.advance();
        if cursor.lookahead() != '*' {
            return None;
        }
        cursor.advance();

        let mut depth = 1u32;
        while depth > 0 {
            if cursor.eof() {
                // Unterminated comment; the token never materializes.
                return None;
            }
            match cursor.lookahead() {
                '/' => {
                    cursor.advance();
                    if cursor.lookahead() == '*' {
                        cursor.advance();
                        depth += 1;
                    }
                }
                '*' => {
                    cursor.advance();
                    if cursor.lookahead() == '/' {
                        cursor.advance();
                        depth -= 1;
                    }
                }
                _ => cursor.advance(),
            }
        }
        cursor.mark_end();
        Some(self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use alder_parse::Parser;
    use expect_test::expect;

    use super::*;

    #[test]
    fn arithmetic_parses_with_the_expected_shape() {
        let mut parser = Parser::new(arithmetic());
        let tree = parser.parse("1+2*3", None);
        assert!(!tree.has_error());
        expect![
            "(expr (expr (term (factor (number)))) (term (term (factor (number))) (factor (number))))"
        ]
        .assert_eq(&tree.root_node().to_sexp());
    }

    #[test]
    fn arithmetic_groups_by_parentheses() {
        let mut parser = Parser::new(arithmetic());
        let tree = parser.parse("(1+2)*3", None);
        assert!(!tree.has_error());
        expect![
            "(expr (term (term (factor (expr (expr (term (factor (number)))) (term (factor (number)))))) (factor (number))))"
        ]
        .assert_eq(&tree.root_node().to_sexp());
    }

    #[test]
    fn subtraction_is_left_associative() {
        let mut parser = Parser::new(ambiguous_expressions());
        let tree = parser.parse("7-2-1", None);
        assert!(!tree.has_error());
        expect!["(expr (expr (expr (number)) (expr (number))) (expr (number)))"]
            .assert_eq(&tree.root_node().to_sexp());
    }

    #[test]
    fn comments_nest_and_stay_extras() {
        let mut parser = Parser::new(documents());
        let scanner = BlockCommentScanner::for_grammar(parser.grammar()).unwrap();
        parser.set_external_scanner(Box::new(scanner));
        let tree = parser.parse("aa /* x /* y */ z */ bb", None);
        assert!(!tree.has_error());
        expect!["(document (document (word) (block_comment)) (word))"]
            .assert_eq(&tree.root_node().to_sexp());
    }
}
