// Copyright (c) 2018 Fabian Schuiki

//! Compile grammar rules into parser tables.

use std::rc::Rc;

use log::{debug, info};

use crate::checkers::OperatorSet;
use crate::first::FirstSets;
use crate::grammar::{Grammar, RuleText};
use crate::item_set::ItemSets;
use crate::machine::{Conflict, StateMachine};
use crate::parser::{GrammarError, GrammarParser};
use crate::runtime::{Parser, Tables};
use crate::token::{kind, Category, TokenKindId, TokenKindInfo};

/// Turns textual grammar rules into a parser.
///
/// Symbol names must be registered before the rules that use them are
/// loaded. The token kind ids of terminals should match the ids produced by
/// the lexer whose tokens the parser will consume.
///
/// ```
/// use lrkit::builder::ParserBuilder;
/// use lrkit::token::kind;
///
/// let mut builder = ParserBuilder::new();
/// builder.add_nonterminal("S", kind::NONTERMINAL_BASE);
/// builder.add_nonterminal("E", kind::NONTERMINAL_BASE + 1);
/// builder
///     .load_grammar(&["S -> E".into(), "E -> E + int".into(), "E -> int".into()])
///     .unwrap();
/// assert!(builder.conflicts().is_empty());
/// let parser = builder.build();
/// assert_eq!(parser.tables().rules.len(), 3);
/// ```
#[derive(Debug)]
pub struct ParserBuilder {
    reader: GrammarParser,
    next_nonterminal: TokenKindId,
    grammar: Grammar,
    first_sets: FirstSets,
    item_sets: ItemSets,
    machine: StateMachine,
}

impl Default for ParserBuilder {
    fn default() -> ParserBuilder {
        ParserBuilder::new()
    }
}

impl ParserBuilder {
    /// Create a builder whose rules may use the standard operators.
    pub fn new() -> ParserBuilder {
        ParserBuilder::with_operators(OperatorSet::standard())
    }

    /// Create a builder with a custom operator set.
    pub fn with_operators(operators: OperatorSet) -> ParserBuilder {
        ParserBuilder {
            reader: GrammarParser::with_operators(operators),
            next_nonterminal: kind::NONTERMINAL_BASE,
            grammar: Grammar::new(),
            first_sets: FirstSets::default(),
            item_sets: ItemSets::default(),
            machine: StateMachine::default(),
        }
    }

    /// Register a symbol name.
    pub fn add_symbol(&mut self, name: &str, info: TokenKindInfo) -> Rc<TokenKindInfo> {
        if info.category == Category::Nonterminal && info.id >= self.next_nonterminal {
            self.next_nonterminal = info.id + 1;
        }
        self.reader.add_symbol(name, info)
    }

    /// Register a terminal name.
    pub fn add_terminal(&mut self, name: &str, id: TokenKindId) -> Rc<TokenKindInfo> {
        self.add_symbol(name, TokenKindInfo::terminal(id))
    }

    /// Register a nonterminal name.
    pub fn add_nonterminal(&mut self, name: &str, id: TokenKindId) -> Rc<TokenKindInfo> {
        self.add_symbol(name, TokenKindInfo::nonterminal(id))
    }

    /// Register every left-hand side name that is not known yet as a
    /// nonterminal, numbered from `kind::NONTERMINAL_BASE` upwards.
    pub fn declare_nonterminals(&mut self, rules: &[RuleText]) -> Result<(), GrammarError> {
        for name in self.reader.lhs_names(rules)? {
            if self.reader.lexer().get_static(&name).is_none() {
                let id = self.next_nonterminal;
                debug!("declaring nonterminal {} as {}", name, id);
                self.add_nonterminal(&name, id);
            }
        }
        Ok(())
    }

    /// Read the rules and compute the parser tables.
    ///
    /// The first rule is the start production. On error the previously
    /// loaded grammar is kept.
    pub fn load_grammar(&mut self, rules: &[RuleText]) -> Result<(), GrammarError> {
        let grammar = self.reader.parse(rules)?;
        let first_sets = FirstSets::compute(&grammar);
        let item_sets = ItemSets::compute(&grammar, &first_sets);
        let machine = StateMachine::from_item_sets(&grammar, &item_sets);
        info!(
            "{} rules, {} states, {} conflicts",
            grammar.len(),
            item_sets.len(),
            machine.conflicts().len()
        );
        self.grammar = grammar;
        self.first_sets = first_sets;
        self.item_sets = item_sets;
        self.machine = machine;
        Ok(())
    }

    /// The grammar parser used to read rules.
    pub fn reader(&self) -> &GrammarParser {
        &self.reader
    }

    /// The loaded grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The first sets of the loaded grammar.
    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    /// The canonical item sets of the loaded grammar.
    pub fn item_sets(&self) -> &ItemSets {
        &self.item_sets
    }

    /// The state machine of the loaded grammar.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// The table conflicts of the loaded grammar.
    pub fn conflicts(&self) -> &[Conflict] {
        self.machine.conflicts()
    }

    /// The parser tables of the loaded grammar.
    pub fn tables(&self) -> &Tables {
        self.machine.tables()
    }

    /// Create a parser running the current tables.
    pub fn build(&self) -> Parser {
        Parser::new(self.tables().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Action, END};

    #[test]
    fn declared_nonterminals() {
        let rules: Vec<RuleText> = vec!["S -> A".into(), "A -> b A".into(), "A -> NONE".into()];
        let mut builder = ParserBuilder::new();
        builder.add_nonterminal("S", kind::NONTERMINAL_BASE + 5);
        builder.declare_nonterminals(&rules).unwrap();
        let a = builder.reader().lexer().get_static("A").cloned().unwrap();
        assert_eq!(a.id, kind::NONTERMINAL_BASE + 6);
        assert_eq!(a.category, Category::Nonterminal);
        builder.load_grammar(&rules).unwrap();
        assert_eq!(builder.grammar().len(), 3);
        assert!(builder.first_sets().get(a.id).unwrap().has_epsilon());
        assert!(builder.conflicts().is_empty());
    }

    #[test]
    fn epsilon_start() {
        // S -> A; A -> ε accepts the empty input right away.
        let rules: Vec<RuleText> = vec!["S -> A".into(), "A -> NONE".into()];
        let mut builder = ParserBuilder::new();
        builder.declare_nonterminals(&rules).unwrap();
        builder.load_grammar(&rules).unwrap();
        assert_eq!(builder.tables().action(0, END), Some(Action::Reduce(1)));
        assert_eq!(builder.tables().rules[1].rhs_len, 0);
    }

    #[test]
    fn failed_load_keeps_grammar() {
        let mut builder = ParserBuilder::new();
        builder.add_nonterminal("S", kind::NONTERMINAL_BASE);
        builder.load_grammar(&["S -> x".into()]).unwrap();
        assert!(builder.load_grammar(&["S - x".into()]).is_err());
        assert!(builder.load_grammar(&[]).is_err());
        assert_eq!(builder.grammar().len(), 1);
        assert_eq!(builder.item_sets().len(), 2);
    }
}
