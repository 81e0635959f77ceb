// Copyright (c) 2018 Fabian Schuiki

//! Item sets derived from a grammar.
//!
//! The canonical LR(1) collection: every item carries exactly one lookahead
//! terminal and states are only merged if their item sets are equal.

use std::collections::BTreeSet;
use std::fmt;
use std::iter::once;
use std::ops::Index;

use indexmap::IndexSet;
use log::debug;

use crate::first::FirstSets;
use crate::grammar::{Grammar, RuleId, Symbol};
use crate::runtime::END;
use crate::token::TokenKindId;
use crate::Pretty;

/// All item sets of a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemSets(Vec<ItemSet>);

impl ItemSets {
    /// Compute the canonical item sets of a grammar.
    ///
    /// Rule 0 is the start production. State 0 is the closure of its initial
    /// item with the end-of-input lookahead; all further states are found
    /// breadth-first and numbered in discovery order.
    pub fn compute(grammar: &Grammar, first: &FirstSets) -> ItemSets {
        if grammar.is_empty() {
            return ItemSets::default();
        }
        let start = Item::new(RuleId::from_usize(0), 0, END);
        let mut seen = IndexSet::new();
        seen.insert(closure(grammar, first, once(start).collect()));

        let mut transitions = Vec::new();
        let mut index = 0;
        while let Some(items) = seen.get_index(index).cloned() {
            let mut edges = Vec::new();
            let mut done = BTreeSet::new();
            for item in &items {
                let symbol = match item.next_symbol(grammar) {
                    Some(symbol) => symbol,
                    None => continue,
                };
                if !done.insert(symbol) {
                    continue;
                }
                let target = goto(grammar, first, &items, symbol);
                let (target_index, _) = seen.insert_full(target);
                edges.push((symbol, ItemSetId::from_usize(target_index)));
            }
            transitions.push(edges);
            index += 1;
        }
        debug!("{} item sets", seen.len());

        ItemSets(
            seen.into_iter()
                .zip(transitions)
                .enumerate()
                .map(|(index, (items, transitions))| ItemSet {
                    id: ItemSetId::from_usize(index),
                    items: items,
                    transitions: transitions,
                })
                .collect(),
        )
    }

    /// Get the item sets in the collection.
    pub fn all(&self) -> &[ItemSet] {
        &self.0
    }

    /// The number of item sets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a pretty printer for these item sets.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl Index<ItemSetId> for ItemSets {
    type Output = ItemSet;

    fn index(&self, index: ItemSetId) -> &ItemSet {
        &self.0[index.as_usize()]
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a ItemSets> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, item_set) in self.item.0.iter().enumerate() {
            if index > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{}", item_set.pretty(self.ctx))?;
        }
        Ok(())
    }
}

/// Compute the closure of a set of items.
///
/// For every item whose marker precedes a nonterminal, the productions of
/// that nonterminal are added with every lookahead that can follow the
/// nonterminal in the item.
pub fn closure(grammar: &Grammar, first: &FirstSets, items: BTreeSet<Item>) -> BTreeSet<Item> {
    let mut set = items;
    let mut todo: Vec<Item> = set.iter().cloned().collect();
    while let Some(item) = todo.pop() {
        let symbols = grammar[item.rule].symbols();
        let id = match symbols.get(item.marker) {
            Some(&Symbol::Nonterminal(id)) => id,
            _ => continue,
        };
        let lookaheads = first.sequence(&symbols[item.marker + 1..], item.lookahead);
        for &rule in grammar.rules_for_nonterminal(id) {
            for &lookahead in &lookaheads {
                let new = Item::new(rule, 0, lookahead);
                if set.insert(new) {
                    todo.push(new);
                }
            }
        }
    }
    set
}

/// Compute the set reached from `items` by moving the marker over `symbol`.
pub fn goto(
    grammar: &Grammar,
    first: &FirstSets,
    items: &BTreeSet<Item>,
    symbol: Symbol,
) -> BTreeSet<Item> {
    let kernel = items
        .iter()
        .filter(|item| item.next_symbol(grammar) == Some(symbol))
        .map(|item| item.advance())
        .collect();
    closure(grammar, first, kernel)
}

/// An item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSet {
    /// The index of this set within the collection.
    id: ItemSetId,
    /// The items in the set.
    items: BTreeSet<Item>,
    /// The outgoing transitions, in the order the symbols were first seen.
    transitions: Vec<(Symbol, ItemSetId)>,
}

impl ItemSet {
    /// Get the id of this item set.
    pub fn id(&self) -> ItemSetId {
        self.id
    }

    /// Get the items in the set.
    pub fn items(&self) -> &BTreeSet<Item> {
        &self.items
    }

    /// Get the outgoing transitions.
    pub fn transitions(&self) -> &[(Symbol, ItemSetId)] {
        &self.transitions
    }

    /// The set reached on `symbol`, if any.
    pub fn transition(&self, symbol: Symbol) -> Option<ItemSetId> {
        self.transitions
            .iter()
            .find(|&&(s, _)| s == symbol)
            .map(|&(_, target)| target)
    }

    /// Get a pretty printer for this item set.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a ItemSet> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "State {}:", self.item.id)?;
        for item in &self.item.items {
            write!(f, "\n    {}", item.pretty(self.ctx))?;
        }
        for &(symbol, target) in &self.item.transitions {
            write!(f, "\n    {} -> {}", symbol.pretty(self.ctx), target)?;
        }
        Ok(())
    }
}

/// A single item.
///
/// Items order by rule, then marker, then lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    /// The rule of the item.
    rule: RuleId,
    /// The position of the marker within the rule.
    marker: usize,
    /// The lookahead terminal.
    lookahead: TokenKindId,
}

impl Item {
    /// Create a new item.
    pub fn new(rule: RuleId, marker: usize, lookahead: TokenKindId) -> Item {
        Item {
            rule: rule,
            marker: marker,
            lookahead: lookahead,
        }
    }

    /// Get the rule this item represents.
    pub fn rule(&self) -> RuleId {
        self.rule
    }

    /// Get the position of the marker within the rule.
    pub fn marker(&self) -> usize {
        self.marker
    }

    /// Get the lookahead terminal of this item.
    pub fn lookahead(&self) -> TokenKindId {
        self.lookahead
    }

    /// The symbol right after the marker, or `None` if the item is complete.
    pub fn next_symbol(&self, grammar: &Grammar) -> Option<Symbol> {
        grammar[self.rule].symbols().get(self.marker).cloned()
    }

    fn advance(&self) -> Item {
        Item::new(self.rule, self.marker + 1, self.lookahead)
    }

    /// Get a pretty printer for this item.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Item> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rule = &self.ctx[self.item.rule];
        write!(f, "[{} ->", self.ctx.name(rule.name()))?;
        let symbols = rule.symbols();
        for symbol in &symbols[0..self.item.marker] {
            write!(f, " {}", symbol.pretty(self.ctx))?;
        }
        write!(f, " .")?;
        for symbol in &symbols[self.item.marker..] {
            write!(f, " {}", symbol.pretty(self.ctx))?;
        }
        write!(f, ", {}]", self.ctx.name(self.item.lookahead))?;
        Ok(())
    }
}

/// A unique item set identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemSetId(usize);

impl ItemSetId {
    /// Create an item set id from a usize.
    pub fn from_usize(id: usize) -> ItemSetId {
        ItemSetId(id)
    }

    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ItemSetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An iterator over the item sets of a collection.
pub type ItemSetsIter<'a> = std::slice::Iter<'a, ItemSet>;

impl<'a> IntoIterator for &'a ItemSets {
    type Item = &'a ItemSet;
    type IntoIter = ItemSetsIter<'a>;

    fn into_iter(self) -> ItemSetsIter<'a> {
        self.0.iter()
    }
}
