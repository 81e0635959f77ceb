// Copyright (c) 2018 Fabian Schuiki

//! A parser for grammar descriptions.
//!
//! Each rule is a line of the form `LHS -> RHS...`. The rules are scanned
//! with a private lexer that knows three states: `kind::ID` for the
//! left-hand side, `kind::OP` for the arrow, and `kind::ANY` for the
//! whitespace-separated symbols on the right-hand side. Symbol names resolve
//! against the kinds registered with `GrammarParser::add_symbol`; unknown
//! names fall back to the `id` class.

use std::iter::once;
use std::rc::Rc;

use log::debug;
use thiserror::Error;

use crate::checkers::{self, OperatorSet};
use crate::grammar::{Grammar, Rule, RuleText, Symbol};
use crate::lexer::{Lexer, ScanError, ScanResultInfo};
use crate::source::StringSource;
use crate::token::{kind, Category, Token, TokenKindInfo};

/// An error encountered while reading grammar rules.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("rule {rule}: {source}")]
    Scan { rule: usize, source: ScanError },
    #[error("rule {rule}: missing left-hand side")]
    MissingLhs { rule: usize },
    #[error("rule {rule}: missing '->'")]
    MissingArrow { rule: usize },
    #[error("rule {rule}: left-hand side `{name}` is not a nonterminal")]
    TerminalLhs { rule: usize, name: String },
    #[error("grammar has no rules")]
    Empty,
}

/// Reads grammar rules into a `Grammar`.
#[derive(Debug)]
pub struct GrammarParser {
    lexer: Lexer,
}

impl Default for GrammarParser {
    fn default() -> GrammarParser {
        GrammarParser::new()
    }
}

impl GrammarParser {
    /// Create a parser that knows the standard operators.
    pub fn new() -> GrammarParser {
        GrammarParser::with_operators(OperatorSet::standard())
    }

    /// Create a parser with a custom operator set.
    ///
    /// The operators end a left-hand side symbol and are registered as
    /// terminals.
    pub fn with_operators(operators: OperatorSet) -> GrammarParser {
        let ops = Rc::new(operators.clone());
        let lexer = checkers::LexerBuilder::new()
            .with_operators(operators)
            .add_static("->", TokenKindInfo::terminal(kind::OP))
            .add_dynamic("id", TokenKindInfo::terminal(kind::ID))
            .add_static("int", TokenKindInfo::terminal(kind::INTEGER))
            .add_static("real", TokenKindInfo::terminal(kind::REAL))
            .add_static("NONE", TokenKindInfo::terminal(kind::NONE))
            .with_standard_operators()
            .add_state(kind::ID, checkers::skip_blanks)
            .add_state(kind::ID, checkers::symbol(ops))
            .add_state(kind::OP, checkers::arrow)
            .add_state(kind::ANY, checkers::any_visible)
            .build();
        GrammarParser { lexer: lexer }
    }

    /// Register a symbol name.
    pub fn add_symbol(&mut self, name: &str, info: TokenKindInfo) -> Rc<TokenKindInfo> {
        self.lexer.add_static(name, info)
    }

    /// The lexer used to scan rules.
    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    /// Scan a rule into its left-hand side and right-hand side tokens.
    ///
    /// `index` is only used to label errors.
    pub fn tokenize(&self, index: usize, text: &str) -> Result<(Token, Vec<Token>), GrammarError> {
        let scan = |source| GrammarError::Scan {
            rule: index,
            source: source,
        };
        let mut source = StringSource::new(text);
        let mut info = ScanResultInfo::default();

        let lhs = self.lexer
            .next(&mut source, &mut info, kind::ID)
            .map_err(scan)?
            .filter(|token| !token.value().is_empty())
            .ok_or(GrammarError::MissingLhs { rule: index })?;
        self.lexer
            .next(&mut source, &mut info, kind::OP)
            .map_err(scan)?
            .ok_or(GrammarError::MissingArrow { rule: index })?;
        let mut rhs = Vec::new();
        while let Some(token) = self.lexer
            .next(&mut source, &mut info, kind::ANY)
            .map_err(scan)?
        {
            rhs.push(token);
        }
        Ok((lhs, rhs))
    }

    /// The left-hand side names of a list of rules, as written.
    pub fn lhs_names(&self, rules: &[RuleText]) -> Result<Vec<String>, GrammarError> {
        rules
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let mut source = StringSource::new(text.rule.as_str());
                let mut info = ScanResultInfo::default();
                match self.lexer.next(&mut source, &mut info, kind::ID) {
                    Ok(Some(ref token)) if !token.value().is_empty() => {
                        Ok(token.value().to_string())
                    }
                    Ok(_) => Err(GrammarError::MissingLhs { rule: index }),
                    Err(source) => Err(GrammarError::Scan {
                        rule: index,
                        source: source,
                    }),
                }
            })
            .collect()
    }

    /// Read a single rule.
    ///
    /// Epsilon symbols (`NONE`) are dropped from the right-hand side.
    pub fn parse_rule(&self, index: usize, text: &RuleText) -> Result<Rule, GrammarError> {
        let (lhs, rhs) = self.tokenize(index, &text.rule)?;
        make_rule(index, &lhs, &rhs, text)
    }

    /// Read a list of rules into a grammar. The first rule is the start
    /// production.
    pub fn parse(&self, rules: &[RuleText]) -> Result<Grammar, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::Empty);
        }
        let mut grammar = Grammar::new();
        for (index, text) in rules.iter().enumerate() {
            let (lhs, rhs) = self.tokenize(index, &text.rule)?;
            let rule = make_rule(index, &lhs, &rhs, text)?;
            for token in once(&lhs).chain(&rhs) {
                grammar.add_name(token.id(), token.info().value.as_str());
            }
            let id = grammar.add_rule(rule);
            debug!("rule {}: {}", index, id.pretty(&grammar));
        }
        Ok(grammar)
    }
}

fn make_rule(index: usize, lhs: &Token, rhs: &[Token], text: &RuleText) -> Result<Rule, GrammarError> {
    if lhs.info().category != Category::Nonterminal {
        return Err(GrammarError::TerminalLhs {
            rule: index,
            name: lhs.value().to_string(),
        });
    }
    let symbols = rhs.iter()
        .filter(|token| token.id() != kind::NONE)
        .map(|token| Symbol::from_info(token.info()))
        .collect();
    Ok(Rule::new(lhs.id(), symbols, text.tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKindId;

    const E: TokenKindId = kind::NONTERMINAL_BASE;
    const T: TokenKindId = kind::NONTERMINAL_BASE + 1;

    fn parser() -> GrammarParser {
        let mut p = GrammarParser::new();
        p.add_symbol("E", TokenKindInfo::nonterminal(E));
        p.add_symbol("T", TokenKindInfo::nonterminal(T));
        p
    }

    fn rhs(p: &GrammarParser, text: &str) -> Vec<String> {
        p.tokenize(0, text)
            .unwrap()
            .1
            .iter()
            .map(|t| t.value().to_string())
            .collect()
    }

    #[test]
    fn spacing() {
        let p = parser();
        for text in &["E -> T + E", "  E   ->   T  +   E  ", "E ->\tT +\tE\n"] {
            assert_eq!(rhs(&p, text), vec!["T", "+", "E"], "{:?}", text);
        }
        let (lhs, tokens) = p.tokenize(0, "E -> T + E").unwrap();
        assert_eq!(lhs.id(), E);
        let ids: Vec<_> = tokens.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![T, kind::PLUS, E]);
    }

    #[test]
    fn broken_arrow() {
        let p = parser();
        match p.tokenize(3, "E - T") {
            Err(GrammarError::Scan { rule: 3, .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(p.tokenize(0, "E ->T").is_err());
        assert_eq!(p.tokenize(0, "E").unwrap_err(), GrammarError::MissingArrow { rule: 0 });
        assert_eq!(p.tokenize(1, "   ").unwrap_err(), GrammarError::MissingLhs { rule: 1 });
    }

    #[test]
    fn epsilon_and_classes() {
        let p = parser();
        let rule = p.parse_rule(0, &RuleText::new("E -> NONE", 4)).unwrap();
        assert!(rule.symbols().is_empty());
        assert_eq!(rule.tag(), 4);
        let rule = p.parse_rule(0, &"T -> int x real".into()).unwrap();
        assert_eq!(
            rule.symbols(),
            &[
                Symbol::Terminal(kind::INTEGER),
                Symbol::Terminal(kind::ID),
                Symbol::Terminal(kind::REAL),
            ]
        );
    }

    #[test]
    fn terminal_lhs() {
        let p = parser();
        assert_eq!(
            p.parse_rule(2, &"x -> E".into()).unwrap_err(),
            GrammarError::TerminalLhs {
                rule: 2,
                name: "x".into(),
            }
        );
    }

    #[test]
    fn whole_grammar() {
        let p = parser();
        assert_eq!(p.parse(&[]).unwrap_err(), GrammarError::Empty);
        let g = p.parse(&["E -> E + T".into(), "E -> T".into(), "T -> int".into()])
            .unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.name(T), "T");
        assert_eq!(g.name(kind::INTEGER), "int");
        assert_eq!(g.rules_for_nonterminal(E).count(), 2);
    }

    #[test]
    fn lhs_names() {
        let p = GrammarParser::new();
        let names = p.lhs_names(&["S -> A".into(), " A -> b".into()]).unwrap();
        assert_eq!(names, vec!["S", "A"]);
    }

    #[test]
    fn nameless_lhs() {
        let p = parser();
        match p.tokenize(1, "-> x") {
            Err(GrammarError::Scan { rule: 1, .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(p.lhs_names(&["E -> T".into(), "-> b".into()]).is_err());
        assert!(p.parse(&["E -> T".into(), " -> b".into()]).is_err());
    }
}
