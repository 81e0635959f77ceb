// Copyright (c) 2018 Fabian Schuiki

//! Data structures representing a grammar.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;

use crate::runtime::{GrammarRule, RuleTag, END};
use crate::token::{Category, TokenKindId, TokenKindInfo};
use crate::Pretty;

/// The textual form of a rule, `LHS -> RHS...`, and its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleText {
    /// The rule text.
    pub rule: String,
    /// The tag handed to the value stack when the rule is reduced.
    pub tag: RuleTag,
}

impl RuleText {
    /// Create a tagged rule.
    pub fn new<S: Into<String>>(rule: S, tag: RuleTag) -> RuleText {
        RuleText {
            rule: rule.into(),
            tag: tag,
        }
    }
}

impl<'a> From<&'a str> for RuleText {
    fn from(rule: &'a str) -> RuleText {
        RuleText::new(rule, 0)
    }
}

/// A grammar.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    rules: Vec<Rule>,
    nonterm_rules: IndexMap<TokenKindId, Vec<RuleId>>,
    names: HashMap<TokenKindId, String>,
}

/// A single rule within a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    name: TokenKindId,
    symbols: Vec<Symbol>,
    tag: RuleTag,
}

/// A symbol of a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// A terminal.
    Terminal(TokenKindId),
    /// A nonterminal.
    Nonterminal(TokenKindId),
}

/// A unique rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(usize);

/// An iterator over the rules of a grammar.
pub type RulesIter<'a> = std::slice::Iter<'a, Rule>;

/// An iterator over the rule IDs of a grammar.
pub type RuleIdsIter<'a> = std::slice::Iter<'a, RuleId>;

impl Grammar {
    /// Create a new empty grammar.
    pub fn new() -> Grammar {
        Grammar::default()
    }

    /// Give a symbol a human-readable name.
    pub fn add_name<S: Into<String>>(&mut self, id: TokenKindId, name: S) {
        self.names.entry(id).or_insert_with(|| name.into());
    }

    /// Get the name of a symbol.
    pub fn name(&self, id: TokenKindId) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None if id == END => "$end".to_string(),
            None => format!("#{}", id),
        }
    }

    /// Add a rule to the grammar.
    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let id = RuleId::from_usize(self.rules.len());
        self.nonterm_rules
            .entry(rule.name())
            .or_insert_with(Vec::new)
            .push(id);
        self.rules.push(rule);
        id
    }

    /// The rules in this grammar.
    pub fn rules(&self) -> RulesIter<'_> {
        self.rules.iter()
    }

    /// The number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the grammar has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rules for a specific nonterminal in the grammar.
    pub fn rules_for_nonterminal(&self, id: TokenKindId) -> RuleIdsIter<'_> {
        match self.nonterm_rules.get(&id) {
            Some(rules) => rules.iter(),
            None => [].iter(),
        }
    }

    /// The nonterminals that have at least one rule, in order of first
    /// appearance.
    pub fn nonterminals<'a>(&'a self) -> impl Iterator<Item = TokenKindId> + 'a {
        self.nonterm_rules.keys().cloned()
    }

    /// Access a single rule of this grammar.
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.as_usize()]
    }

    /// The rules as seen by the parser runtime.
    pub fn runtime_rules(&self) -> Vec<GrammarRule> {
        self.rules
            .iter()
            .map(|rule| GrammarRule {
                lhs: rule.name,
                rhs_len: rule.symbols.len(),
                tag: rule.tag,
            })
            .collect()
    }
}

impl Index<RuleId> for Grammar {
    type Output = Rule;

    fn index(&self, id: RuleId) -> &Rule {
        self.rule(id)
    }
}

impl Rule {
    /// Create a new rule.
    pub fn new(name: TokenKindId, symbols: Vec<Symbol>, tag: RuleTag) -> Rule {
        Rule {
            name: name,
            symbols: symbols,
            tag: tag,
        }
    }

    /// The name of this rule.
    pub fn name(&self) -> TokenKindId {
        self.name
    }

    /// The symbols in this production.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The tag of this rule.
    pub fn tag(&self) -> RuleTag {
        self.tag
    }
}

impl Symbol {
    /// Classify a token kind. Everything but a nonterminal is a terminal.
    pub fn from_info(info: &TokenKindInfo) -> Symbol {
        match info.category {
            Category::Nonterminal => Symbol::Nonterminal(info.id),
            _ => Symbol::Terminal(info.id),
        }
    }

    /// The kind id of the symbol.
    pub fn id(self) -> TokenKindId {
        match self {
            Symbol::Terminal(id) | Symbol::Nonterminal(id) => id,
        }
    }

    /// Whether this is a nonterminal.
    pub fn is_nonterminal(self) -> bool {
        match self {
            Symbol::Nonterminal(_) => true,
            Symbol::Terminal(_) => false,
        }
    }

    /// Get a pretty printer for this symbol.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Symbol> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ctx.name(self.item.id()))
    }
}

impl RuleId {
    /// Create a rule id from a usize.
    pub fn from_usize(id: usize) -> RuleId {
        RuleId(id)
    }

    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Get a pretty printer for this rule.
    pub fn pretty(self, grammar: &Grammar) -> Pretty<&Grammar, Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, RuleId> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rule = &self.ctx[self.item];
        write!(f, "{} ->", self.ctx.name(rule.name()))?;
        for symbol in rule.symbols() {
            write!(f, " {}", symbol.pretty(self.ctx))?;
        }
        if rule.symbols().is_empty() {
            write!(f, " <empty>")?;
        }
        Ok(())
    }
}
