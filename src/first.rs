// Copyright (c) 2018 Fabian Schuiki

//! First set computation.
//!
//! This module implements computation of the first sets for a grammar. The
//! first set of a nonterminal states all terminals that can appear as the
//! first symbol of something it derives. Since rules may refer to other rules
//! and to empty productions, computation is a fixed-point iteration.

use std::collections::BTreeSet;
use std::fmt;

use bit_set::BitSet;
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::grammar::{Grammar, Symbol};
use crate::runtime::END;
use crate::token::TokenKindId;
use crate::Pretty;

/// All first sets of a grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSets {
    /// Dense index of the terminals. Bit `i` of a set stands for entry `i`.
    terminals: IndexSet<TokenKindId>,
    /// The first set of each nonterminal that has rules.
    sets: IndexMap<TokenKindId, FirstSet>,
}

/// The first set of a nonterminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FirstSet {
    /// The first symbols.
    symbols: BitSet,
    /// Whether the nonterminal can derive the empty sequence.
    has_epsilon: bool,
}

impl FirstSet {
    /// Whether the nonterminal can derive the empty sequence.
    pub fn has_epsilon(&self) -> bool {
        self.has_epsilon
    }
}

impl FirstSets {
    /// Compute the first sets of a grammar.
    pub fn compute(grammar: &Grammar) -> FirstSets {
        let mut terminals = IndexSet::new();
        terminals.insert(END);
        for rule in grammar.rules() {
            for symbol in rule.symbols() {
                if let Symbol::Terminal(id) = *symbol {
                    terminals.insert(id);
                }
            }
        }
        let mut fs = FirstSets {
            terminals: terminals,
            sets: grammar
                .nonterminals()
                .map(|id| (id, FirstSet::default()))
                .collect(),
        };

        let mut passes = 1;
        while fs.update(grammar) {
            passes += 1;
        }
        debug!("first sets stable after {} passes", passes);
        for id in grammar.nonterminals() {
            debug!(
                "first({}) = {}",
                grammar.name(id),
                fs.pretty_set(grammar, id)
            );
        }
        fs
    }

    /// Perform one pass over all rules of the grammar.
    ///
    /// Returns whether any set changed. Once `compute` is done, further
    /// passes never change anything.
    pub fn update(&mut self, grammar: &Grammar) -> bool {
        let mut changed = false;
        for rule in grammar.rules() {
            let current = match self.sets.get(&rule.name()) {
                Some(set) => set,
                None => continue,
            };
            let mut new_fs = current.clone();
            let tight = self.collect(rule.symbols(), &mut new_fs.symbols);
            new_fs.has_epsilon |= !tight;
            if let Some(slot) = self.sets.get_mut(&rule.name()) {
                if *slot != new_fs {
                    *slot = new_fs;
                    changed = true;
                }
            }
        }
        changed
    }

    /// The first set of a nonterminal.
    pub fn get(&self, id: TokenKindId) -> Option<&FirstSet> {
        self.sets.get(&id)
    }

    /// The terminals in the first set of a nonterminal, in id order.
    pub fn first(&self, id: TokenKindId) -> BTreeSet<TokenKindId> {
        match self.sets.get(&id) {
            Some(set) => self.resolve(&set.symbols),
            None => BTreeSet::new(),
        }
    }

    /// The terminals that can start `symbols` followed by `lookahead`.
    ///
    /// If the whole sequence can derive the empty sequence, `lookahead` is
    /// part of the result.
    pub fn sequence(&self, symbols: &[Symbol], lookahead: TokenKindId) -> BTreeSet<TokenKindId> {
        let mut bits = BitSet::new();
        let tight = self.collect(symbols, &mut bits);
        let mut result = self.resolve(&bits);
        if !tight {
            result.insert(lookahead);
        }
        result
    }

    /// Add the first symbols of a sequence to `into`. Returns `true` if the
    /// sequence is *tight*, that is, it cannot derive the empty sequence.
    fn collect(&self, symbols: &[Symbol], into: &mut BitSet) -> bool {
        for symbol in symbols {
            let tight = match *symbol {
                Symbol::Terminal(id) => {
                    if let Some((index, _)) = self.terminals.get_full(&id) {
                        into.insert(index);
                    }
                    true
                }
                // A nonterminal without rules derives nothing.
                Symbol::Nonterminal(id) => match self.sets.get(&id) {
                    Some(set) => {
                        into.union_with(&set.symbols);
                        !set.has_epsilon
                    }
                    None => true,
                },
            };
            if tight {
                return true;
            }
        }
        false
    }

    fn resolve(&self, bits: &BitSet) -> BTreeSet<TokenKindId> {
        bits.iter()
            .filter_map(|index| self.terminals.get_index(index).cloned())
            .collect()
    }

    fn pretty_set(&self, grammar: &Grammar, id: TokenKindId) -> String {
        let mut names: Vec<_> = self.first(id).into_iter().map(|t| grammar.name(t)).collect();
        if self.get(id).map_or(false, |s| s.has_epsilon) {
            names.push("ε".to_string());
        }
        format!("{{{}}}", names.join(", "))
    }

    /// Get a pretty printer for these first sets.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a FirstSets> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, &id) in self.item.sets.keys().enumerate() {
            if index > 0 {
                write!(f, "\n")?;
            }
            write!(
                f,
                "{}: {}",
                self.ctx.name(id),
                self.item.pretty_set(self.ctx, id)
            )?;
        }
        Ok(())
    }
}
