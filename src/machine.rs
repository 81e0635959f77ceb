// Copyright (c) 2018 Fabian Schuiki

//! Representation of a parsing state machine.
//!
//! Converts the canonical item sets into the action and goto tables executed
//! by the runtime parser.

use std::fmt;

use log::debug;

use crate::grammar::{Grammar, Symbol};
use crate::item_set::ItemSets;
use crate::runtime::{Action, StateIndex, Tables, END};
use crate::token::TokenKindId;
use crate::Pretty;

/// A state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateMachine {
    tables: Tables,
    conflicts: Vec<Conflict>,
}

/// Two different actions computed for the same state and terminal.
///
/// The later action replaces the earlier one in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conflict {
    /// The state.
    pub state: StateIndex,
    /// The lookahead terminal.
    pub kind: TokenKindId,
    /// The action that was overwritten.
    pub replaced: Action,
    /// The action that is in the table.
    pub action: Action,
}

impl StateMachine {
    /// Create a state machine from a list of item sets.
    ///
    /// Entries are written state by state. Within a state, items are visited
    /// in order: a complete item writes an accept or reduce action on its
    /// lookahead, and the first item to expect a symbol writes the shift or
    /// goto for it. A later action for the same key wins.
    pub fn from_item_sets(grammar: &Grammar, item_sets: &ItemSets) -> StateMachine {
        let mut sm = StateMachine {
            tables: Tables::new(),
            conflicts: Vec::new(),
        };
        sm.tables.rules = grammar.runtime_rules();

        for item_set in item_sets {
            let state = item_set.id().as_usize();
            let mut seen = Vec::new();
            for item in item_set.items() {
                match item.next_symbol(grammar) {
                    None if item.rule().as_usize() == 0 && item.lookahead() == END => {
                        sm.set_action(state, END, Action::Accept);
                    }
                    None => {
                        let reduce = Action::Reduce(item.rule().as_usize());
                        sm.set_action(state, item.lookahead(), reduce);
                    }
                    Some(symbol) => {
                        if seen.contains(&symbol) {
                            continue;
                        }
                        seen.push(symbol);
                        let target = match item_set.transition(symbol) {
                            Some(target) => target.as_usize(),
                            None => continue,
                        };
                        match symbol {
                            Symbol::Nonterminal(id) => {
                                sm.tables.set_goto(state, id, target);
                            }
                            Symbol::Terminal(id) => {
                                sm.set_action(state, id, Action::Shift(target));
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "{} states, {} conflicts",
            item_sets.len(),
            sm.conflicts.len()
        );
        for conflict in &sm.conflicts {
            debug!("{}", conflict.pretty(grammar));
        }
        sm
    }

    fn set_action(&mut self, state: StateIndex, kind: TokenKindId, action: Action) {
        if let Some(replaced) = self.tables.set_action(state, kind, action) {
            if replaced != action {
                self.conflicts.push(Conflict {
                    state: state,
                    kind: kind,
                    replaced: replaced,
                    action: action,
                });
            }
        }
    }

    /// The generated tables.
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Consume the state machine and return its tables.
    pub fn into_tables(self) -> Tables {
        self.tables
    }

    /// The conflicts encountered while filling the tables.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Get a pretty printer for the tables.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a StateMachine> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tables = &self.item.tables;
        let mut first = true;
        for (state, row) in &tables.actions {
            for (&kind, action) in row {
                if !first {
                    write!(f, "\n")?;
                }
                first = false;
                write!(f, "action[{}, {}] = {}", state, self.ctx.name(kind), action)?;
            }
        }
        for (state, row) in &tables.gotos {
            for (&kind, target) in row {
                if !first {
                    write!(f, "\n")?;
                }
                first = false;
                write!(f, "goto[{}, {}] = {}", state, self.ctx.name(kind), target)?;
            }
        }
        Ok(())
    }
}

impl Conflict {
    /// Get a pretty printer for this conflict.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Conflict> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "conflict in state {} on {}: {} replaced by {}",
            self.item.state,
            self.ctx.name(self.item.kind),
            self.item.replaced,
            self.item.action
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first::FirstSets;
    use crate::grammar::Rule;
    use crate::grammar::Symbol::*;

    const S: TokenKindId = 100;
    const E: TokenKindId = 101;
    const PLUS: TokenKindId = 1;
    const N: TokenKindId = 2;

    fn machine(g: &Grammar) -> StateMachine {
        let fs = FirstSets::compute(g);
        StateMachine::from_item_sets(g, &ItemSets::compute(g, &fs))
    }

    #[test]
    fn sums() {
        let mut g = Grammar::new();
        g.add_rule(Rule::new(S, vec![Nonterminal(E)], 0));
        g.add_rule(Rule::new(E, vec![Nonterminal(E), Terminal(PLUS), Terminal(N)], 0));
        g.add_rule(Rule::new(E, vec![Terminal(N)], 0));
        let sm = machine(&g);
        let t = sm.tables();
        assert!(sm.conflicts().is_empty());
        assert_eq!(t.action(0, N), Some(Action::Shift(2)));
        assert_eq!(t.goto(0, E), Some(1));
        assert_eq!(t.action(1, END), Some(Action::Accept));
        assert_eq!(t.action(1, PLUS), Some(Action::Shift(3)));
        assert_eq!(t.action(2, PLUS), Some(Action::Reduce(2)));
        assert_eq!(t.action(2, END), Some(Action::Reduce(2)));
        assert_eq!(t.action(4, END), Some(Action::Reduce(1)));
        assert_eq!(t.rules.len(), 3);
        assert_eq!(t.rules[1].rhs_len, 3);
    }

    #[test]
    fn ambiguous_grammar_records_conflicts() {
        // S -> E; E -> E + E | n
        let mut g = Grammar::new();
        g.add_rule(Rule::new(S, vec![Nonterminal(E)], 0));
        g.add_rule(Rule::new(
            E,
            vec![Nonterminal(E), Terminal(PLUS), Nonterminal(E)],
            0,
        ));
        g.add_rule(Rule::new(E, vec![Terminal(N)], 0));
        let sm = machine(&g);
        assert!(!sm.conflicts().is_empty());
        for conflict in sm.conflicts() {
            assert_eq!(sm.tables().action(conflict.state, conflict.kind), Some(conflict.action));
            assert_ne!(conflict.replaced, conflict.action);
        }
    }
}
