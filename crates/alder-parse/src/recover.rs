use alder_grammar::{ParseAction, Symbol};
use alder_lexer::Token;
use alder_tree::{GreenNode, GreenToken, NodeOrToken, error_costs};

use crate::parser::ParseRun;
use crate::stack::StackVersion;

impl ParseRun<'_> {
    /// Handles a lookahead with no action in the current state.
    ///
    /// Three kinds of candidates fork off, each with an error cost, and the
    /// regular merge/prune machinery picks the cheapest interpretation:
    ///
    /// 1. fabricate a zero-width missing token the state can shift (at most
    ///    one fabrication per position per version),
    /// 2. pop stack frames into an ERROR container until an ancestor state
    ///    can act on the lookahead,
    /// 3. skip the lookahead into a pending ERROR container.
    ///
    /// Skipping consumes the token, so recovery always makes progress; end
    /// of input is never skipped, and a version that can neither mend nor
    /// pop there is abandoned.
    pub(crate) fn recover(
        &mut self,
        mut version: StackVersion,
        token: &Token,
        work: &mut Vec<StackVersion>,
    ) {
        tracing::debug!(
            offset = u32::from(version.position),
            symbol = self.grammar.symbol_name(token.symbol),
            state = version.top_state(),
            "recover"
        );
        let state = version.top_state();
        let mut forked = false;

        if version.last_insertion != Some(version.position) {
            for (symbol, actions) in self.grammar.state_actions(state) {
                if *symbol == Symbol::END || *symbol == Symbol::ERROR {
                    continue;
                }
                let Some(target) = actions.iter().find_map(|action| match action {
                    ParseAction::Shift { state } => Some(*state),
                    _ => None,
                }) else {
                    continue;
                };
                tracing::trace!(missing = self.grammar.symbol_name(*symbol), "fabricate token");
                let mut fork = version.clone();
                self.flush_pending(&mut fork);
                fork.last_insertion = Some(fork.position);
                fork.error_cost += error_costs::ERROR_COST_PER_MISSING_TREE;
                let missing = GreenToken::missing(*symbol, self.grammar.lex_state(state));
                fork.push(NodeOrToken::Token(missing), target);
                work.push(fork);
                forked = true;
            }
        }

        for depth in 1..=version.depth() {
            let exposed = version.state_below(depth);
            if self.grammar.actions(exposed, token.symbol).is_empty() {
                continue;
            }
            tracing::trace!(depth, "pop into error container");
            let mut fork = version.clone();
            let mut popped = Vec::with_capacity(depth);
            let mut popped_len = 0u32;
            for _ in 0..depth {
                let green = fork.pop().expect("depth is within the stack");
                popped_len += u32::from(green.text_len());
                popped.push(green);
            }
            popped.reverse();
            // Popping discards parsed structure and still leaves the current
            // rule unfinished, so it carries a missing tree on top of the
            // skipped ones.
            fork.error_cost += error_costs::ERROR_COST_PER_MISSING_TREE
                + error_costs::ERROR_COST_PER_SKIPPED_TREE * depth as u32
                + error_costs::ERROR_COST_PER_SKIPPED_CHAR * popped_len;
            fork.push_extra(NodeOrToken::Node(GreenNode::new(Symbol::ERROR, popped)));
            work.push(fork);
            forked = true;
            break;
        }

        if !token.is_end() {
            tracing::trace!(symbol = self.grammar.symbol_name(token.symbol), "skip token");
            version.error_cost += error_costs::ERROR_COST_PER_SKIPPED_CHAR
                * u32::from(token.len())
                + error_costs::ERROR_COST_PER_SKIPPED_LINE
                    * (token.points.end.row - token.points.start.row);
            let green = self.token_green(token);
            version.pending_skips.push(green);
            version.consume_to(token.range.end(), token.points.end);
            self.push_stepped(version);
        } else if !forked {
            tracing::debug!("version abandoned at end of input");
            self.halted.push(version);
        }
    }
}
