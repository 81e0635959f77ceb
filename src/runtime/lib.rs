// Copyright (c) 2018 Fabian Schuiki

//! A collection of facilities required by lrkit-generated parsers.
//!
//! The parser generator emits an action table indexed by terminals, a goto
//! table indexed by nonterminals, and a flat list of rules. This crate
//! executes those tables against a stream of tokens. It knows nothing about
//! how tokens are produced or what their values mean: the former is the job of
//! a `ParserInput`, the latter the job of a `ValueStack`.

#![deny(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use log::trace;
use thiserror::Error;

/// A token or grammar symbol kind.
pub type KindId = i64;

/// The index of a parser state.
pub type StateIndex = usize;

/// An opaque tag attached to a rule by the grammar author.
pub type RuleTag = i64;

/// The reserved kind of the end-of-input marker.
pub const END: KindId = -2;

/// An action to be taken upon encountering a terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Shift the terminal and go to the given state.
    Shift(StateIndex),
    /// Reduce with the rule at the given index.
    Reduce(usize),
    /// Accept the input.
    Accept,
    /// Reject the input.
    Error,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Action::Shift(s) => write!(f, "s{}", s),
            Action::Reduce(r) => write!(f, "r{}", r),
            Action::Accept => write!(f, "acc"),
            Action::Error => write!(f, "err"),
        }
    }
}

/// Mapping from `(state, terminal)` to the action to take.
pub type ActionTable = BTreeMap<StateIndex, BTreeMap<KindId, Action>>;

/// Mapping from `(state, nonterminal)` to the state to go to after a
/// reduction.
pub type GotoTable = BTreeMap<StateIndex, BTreeMap<KindId, StateIndex>>;

/// The runtime view of a grammar rule.
///
/// Only the information needed to perform a reduction survives table
/// construction: which nonterminal is produced, how many stack entries the
/// right-hand side covers, and the tag passed on to the value stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GrammarRule {
    /// The nonterminal on the left-hand side.
    pub lhs: KindId,
    /// The number of symbols on the right-hand side.
    pub rhs_len: usize,
    /// The caller-defined tag of the rule.
    pub tag: RuleTag,
}

/// The tables a parser is driven by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    /// The action table.
    pub actions: ActionTable,
    /// The goto table.
    pub gotos: GotoTable,
    /// The rules, indexed by the operand of `Action::Reduce`.
    pub rules: Vec<GrammarRule>,
}

impl Tables {
    /// Create empty tables.
    pub fn new() -> Tables {
        Tables::default()
    }

    /// Look up the action for a terminal in a state.
    pub fn action(&self, state: StateIndex, kind: KindId) -> Option<Action> {
        self.actions.get(&state).and_then(|row| row.get(&kind)).cloned()
    }

    /// Look up the goto target for a nonterminal in a state.
    pub fn goto(&self, state: StateIndex, kind: KindId) -> Option<StateIndex> {
        self.gotos.get(&state).and_then(|row| row.get(&kind)).cloned()
    }

    /// Set the action for a terminal in a state.
    ///
    /// Returns the action previously stored under the same key, if any.
    pub fn set_action(
        &mut self,
        state: StateIndex,
        kind: KindId,
        action: Action,
    ) -> Option<Action> {
        self.actions
            .entry(state)
            .or_insert_with(BTreeMap::new)
            .insert(kind, action)
    }

    /// Set the goto target for a nonterminal in a state.
    ///
    /// Returns the target previously stored under the same key, if any.
    pub fn set_goto(
        &mut self,
        state: StateIndex,
        kind: KindId,
        target: StateIndex,
    ) -> Option<StateIndex> {
        self.gotos
            .entry(state)
            .or_insert_with(BTreeMap::new)
            .insert(kind, target)
    }
}

/// A stream of tokens that can be used as parser input.
pub trait ParserInput {
    /// The token type produced by the stream.
    type Token;
    /// The error produced when the stream fails to recognize a token.
    type Error: fmt::Display;

    /// Peek at the next token without consuming it.
    ///
    /// Returns `Ok(None)` at the end of the input.
    fn peek(&mut self) -> Result<Option<Self::Token>, Self::Error>;

    /// Consume the next token.
    ///
    /// Returns `Ok(None)` at the end of the input.
    fn next(&mut self) -> Result<Option<Self::Token>, Self::Error>;

    /// The kind of a token, as used to index the action table.
    fn kind(token: &Self::Token) -> KindId;
}

/// The semantic side of a parse.
///
/// The parser notifies the value stack of every shifted token and every
/// reduction. All semantic values and the way they are combined live here.
pub trait ValueStack<T> {
    /// A token has been shifted.
    fn push_term(&mut self, token: &T);

    /// The right-hand side of `rule` has been reduced.
    ///
    /// Return `false` to reject the reduction, which aborts the parse.
    fn push_reduced(&mut self, rule: &GrammarRule) -> bool;

    /// Drop the topmost value. Returns `false` if the stack is empty.
    fn pop(&mut self) -> bool;
}

/// The outcome of a successful parser step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// The step shifted or reduced; call again.
    Continue,
    /// The input has been accepted.
    Accept,
}

/// An error encountered while parsing.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("scan error: {0}")]
    Scan(String),
    #[error("no action for kind {kind} in state {state}")]
    MissingAction { state: StateIndex, kind: KindId },
    #[error("no goto for kind {kind} in state {state}")]
    MissingGoto { state: StateIndex, kind: KindId },
    #[error("error action for kind {kind} in state {state}")]
    ErrorAction { state: StateIndex, kind: KindId },
    #[error("rule {rule} out of range ({count} rules)")]
    RuleOutOfRange { rule: usize, count: usize },
    #[error("reduction of rule {rule} would underflow the state stack")]
    StackUnderflow { rule: usize },
    #[error("reduction of rule {rule} rejected by the value stack")]
    Rejected { rule: usize },
    #[error("input ended while shifting in state {state}")]
    UnexpectedEnd { state: StateIndex },
}

/// A table-driven shift/reduce parser.
///
/// The parser owns its tables and a stack of state indices. The stack lives
/// for one parse: it is seeded with the start state on the first step and
/// cleared once the input is accepted or an error occurs.
#[derive(Debug, Clone)]
pub struct Parser {
    tables: Tables,
    stack: Vec<StateIndex>,
}

impl Parser {
    /// Create a parser from a set of tables.
    pub fn new(tables: Tables) -> Parser {
        Parser {
            tables: tables,
            stack: Vec::new(),
        }
    }

    /// The tables driving this parser.
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// The current state stack, bottom first.
    pub fn stack(&self) -> &[StateIndex] {
        &self.stack
    }

    /// Abandon the current parse.
    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Perform one shift, reduce, or accept step.
    pub fn parse_next<I, V>(
        &mut self,
        input: &mut I,
        values: &mut V,
        start: StateIndex,
    ) -> Result<Step, ParseError>
    where
        I: ParserInput,
        V: ValueStack<I::Token> + ?Sized,
    {
        let result = self.step(input, values, start);
        if result != Ok(Step::Continue) {
            self.stack.clear();
        }
        result
    }

    /// Run the parser until the input is accepted or an error occurs.
    pub fn parse<I, V>(
        &mut self,
        input: &mut I,
        values: &mut V,
        start: StateIndex,
    ) -> Result<(), ParseError>
    where
        I: ParserInput,
        V: ValueStack<I::Token> + ?Sized,
    {
        loop {
            if self.parse_next(input, values, start)? == Step::Accept {
                return Ok(());
            }
        }
    }

    fn step<I, V>(
        &mut self,
        input: &mut I,
        values: &mut V,
        start: StateIndex,
    ) -> Result<Step, ParseError>
    where
        I: ParserInput,
        V: ValueStack<I::Token> + ?Sized,
    {
        let lookahead = input.peek().map_err(|e| ParseError::Scan(e.to_string()))?;
        let kind = lookahead.as_ref().map(I::kind).unwrap_or(END);

        if self.stack.is_empty() {
            trace!("starting in state {}", start);
            self.stack.push(start);
        }
        let state = self.stack[self.stack.len() - 1];

        let action = match self.tables.action(state, kind) {
            Some(action) => action,
            None => return Err(ParseError::MissingAction { state, kind }),
        };
        match action {
            Action::Shift(next) => {
                trace!("state {}: shift {} and go to {}", state, kind, next);
                self.stack.push(next);
                let token = match input.next().map_err(|e| ParseError::Scan(e.to_string()))? {
                    Some(token) => token,
                    None => return Err(ParseError::UnexpectedEnd { state }),
                };
                values.push_term(&token);
                Ok(Step::Continue)
            }
            Action::Reduce(index) => {
                let rule = match self.tables.rules.get(index) {
                    Some(&rule) => rule,
                    None => {
                        return Err(ParseError::RuleOutOfRange {
                            rule: index,
                            count: self.tables.rules.len(),
                        })
                    }
                };
                if rule.rhs_len >= self.stack.len() {
                    return Err(ParseError::StackUnderflow { rule: index });
                }
                trace!(
                    "state {}: reduce r{} ({} symbols) on {}",
                    state,
                    index,
                    rule.rhs_len,
                    kind
                );
                let at = self.stack.len() - rule.rhs_len;
                self.stack.truncate(at);
                if !values.push_reduced(&rule) {
                    return Err(ParseError::Rejected { rule: index });
                }
                let top = self.stack[self.stack.len() - 1];
                let next = match self.tables.goto(top, rule.lhs) {
                    Some(next) => next,
                    None => {
                        return Err(ParseError::MissingGoto {
                            state: top,
                            kind: rule.lhs,
                        })
                    }
                };
                self.stack.push(next);
                Ok(Step::Continue)
            }
            Action::Accept => {
                trace!("state {}: accept", state);
                Ok(Step::Accept)
            }
            Action::Error => Err(ParseError::ErrorAction { state, kind }),
        }
    }
}
