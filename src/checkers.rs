// Copyright (c) 2018 Fabian Schuiki

//! The default checker catalogue and a builder to set up lexers with it.
//!
//! The default configuration recognizes integers, reals, identifiers, and
//! single-character operators:
//!
//! - In the start state blanks are skipped, a digit moves to `kind::INTEGER`,
//!   a letter to `kind::ID`, and an operator character resolves immediately
//!   and moves to `kind::LEXER_END`, which finishes the token.
//! - Identifiers and numbers end at a blank or an operator character.
//!   Identifiers resolve to the static kind of their exact text if there is
//!   one (keywords), and to the `id` class otherwise.
//! - A `.` inside an integer turns it into a real.

use std::rc::Rc;

use crate::lexer::{Check, Lexer, Switch};
use crate::token::{kind, Table, TokenKindId, TokenKindInfo};

/// The operator characters of the standard set, in the order of their kinds.
const STANDARD_CHARS: &str = "+-*/:;,!@#%^&()[]{}.~'\"><$|";

/// The kinds assigned to `STANDARD_CHARS`.
const STANDARD_KINDS: [TokenKindId; 27] = [
    kind::PLUS,
    kind::MINUS,
    kind::MUL,
    kind::DIV,
    kind::COLON,
    kind::SEMICOLON,
    kind::COMMA,
    kind::NOT,
    kind::AT,
    kind::SHARP,
    kind::PERC,
    kind::CIRC,
    kind::AND,
    kind::BRACKET_OPEN,
    kind::BRACKET_CLOSE,
    kind::SQR_OPEN,
    kind::SQR_CLOSE,
    kind::BRACE_OPEN,
    kind::BRACE_CLOSE,
    kind::DOT,
    kind::TILDA,
    kind::QUOTE,
    kind::DQUOTE,
    kind::GREATER,
    kind::LESS,
    kind::DOLLAR,
    kind::VBAR,
];

/// A set of single-character operators and their kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorSet {
    ops: Vec<(char, TokenKindId)>,
}

impl OperatorSet {
    /// Create an empty operator set.
    pub fn new() -> OperatorSet {
        OperatorSet::default()
    }

    /// The standard operators `+-*/:;,!@#%^&()[]{}.~'"><$|`.
    pub fn standard() -> OperatorSet {
        OperatorSet {
            ops: STANDARD_CHARS
                .chars()
                .zip(STANDARD_KINDS.iter().cloned())
                .collect(),
        }
    }

    /// Add an operator, or change the kind of an existing one.
    pub fn with(mut self, ch: char, id: TokenKindId) -> OperatorSet {
        match self.ops.iter_mut().find(|op| op.0 == ch) {
            Some(op) => op.1 = id,
            None => self.ops.push((ch, id)),
        }
        self
    }

    /// Check whether a character is an operator.
    pub fn contains(&self, ch: char) -> bool {
        self.kind(ch).is_some()
    }

    /// The kind of an operator character.
    pub fn kind(&self, ch: char) -> Option<TokenKindId> {
        self.ops.iter().find(|op| op.0 == ch).map(|op| op.1)
    }

    /// Iterate over the operators and their kinds.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (char, TokenKindId)> + 'a {
        self.ops.iter().cloned()
    }
}

/// Whitespace and control characters, including the `'\0'` seen at the end
/// of the input.
pub fn is_blank(ch: char) -> bool {
    ch.is_ascii_whitespace() || ch.is_control()
}

/// The start state of the default configuration.
pub fn start(ops: Rc<OperatorSet>) -> impl Fn(&Switch) -> Check {
    move |s| {
        if is_blank(s.ch) {
            Check::skip()
        } else if s.ch.is_ascii_digit() {
            Check::proceed().goto(kind::INTEGER)
        } else if s.ch.is_ascii_alphabetic() {
            Check::proceed().goto(kind::ID)
        } else if ops.contains(s.ch) {
            let mut buf = [0; 4];
            Check::proceed()
                .goto(kind::LEXER_END)
                .resolve(s.resolve(s.ch.encode_utf8(&mut buf), Table::Static))
        } else {
            Check::error(format!("unexpected character `{}`", s.ch.escape_default()))
        }
    }
}

/// Identifiers and keywords. An operator cannot start a symbol.
pub fn symbol(ops: Rc<OperatorSet>) -> impl Fn(&Switch) -> Check {
    move |s| {
        if s.ch.is_ascii_alphanumeric() {
            Check::proceed()
        } else if s.value.is_empty() && ops.contains(s.ch) {
            Check::error(format!("expected a symbol, found `{}`", s.ch))
        } else if is_blank(s.ch) || ops.contains(s.ch) {
            Check::finish().resolve(s.resolve_or_class("id"))
        } else {
            Check::proceed()
        }
    }
}

/// Integers. A `.` switches to the real state.
pub fn integer(ops: Rc<OperatorSet>) -> impl Fn(&Switch) -> Check {
    move |s| {
        if s.ch.is_ascii_digit() {
            Check::proceed()
        } else if s.ch == '.' {
            Check::proceed().goto(kind::REAL)
        } else if is_blank(s.ch) || ops.contains(s.ch) {
            Check::finish().resolve(s.resolve("int", Table::Dynamic))
        } else {
            Check::error(format!("malformed number `{}{}`", s.value, s.ch))
        }
    }
}

/// The fractional part of reals.
pub fn real(ops: Rc<OperatorSet>) -> impl Fn(&Switch) -> Check {
    move |s| {
        if s.ch.is_ascii_digit() {
            Check::proceed()
        } else if is_blank(s.ch) || ops.contains(s.ch) {
            Check::finish().resolve(s.resolve("real", Table::Dynamic))
        } else {
            Check::error(format!("malformed number `{}{}`", s.value, s.ch))
        }
    }
}

/// Ends the token unconditionally.
pub fn finish(_: &Switch) -> Check {
    Check::finish()
}

/// Skips blanks until the first character of a token has been seen.
pub fn skip_blanks(s: &Switch) -> Check {
    if s.value.is_empty() && is_blank(s.ch) {
        Check::skip()
    } else {
        Check::proceed()
    }
}

/// Any run of visible characters, delimited by blanks.
pub fn any_visible(s: &Switch) -> Check {
    if is_blank(s.ch) {
        if s.value.is_empty() {
            Check::skip()
        } else {
            Check::finish().resolve(s.resolve_or_class("id"))
        }
    } else {
        Check::proceed()
    }
}

/// The `->` of a grammar rule, which must be followed by a blank.
pub fn arrow(s: &Switch) -> Check {
    let blank = is_blank(s.ch);
    match s.value {
        "->" if blank => Check::finish().resolve(s.resolve("->", Table::Static)),
        "->" => Check::error("unexpected character next to '->'"),
        "-" if s.ch == '>' => Check::proceed(),
        "-" => Check::error("expected '->'"),
        "" if blank => Check::skip(),
        "" if s.ch == '-' => Check::proceed(),
        _ => Check::error("expected '->'"),
    }
}

/// A fluent builder for lexers.
#[derive(Debug)]
pub struct LexerBuilder {
    lexer: Lexer,
    operators: Rc<OperatorSet>,
}

impl Default for LexerBuilder {
    fn default() -> LexerBuilder {
        LexerBuilder::new()
    }
}

impl LexerBuilder {
    /// Create a builder using the standard operator set.
    pub fn new() -> LexerBuilder {
        LexerBuilder {
            lexer: Lexer::new(),
            operators: Rc::new(OperatorSet::standard()),
        }
    }

    /// Use a different operator set.
    ///
    /// Affects the checkers installed by subsequent calls to
    /// `with_default_states` and the kinds registered by
    /// `with_standard_operators`.
    pub fn with_operators(mut self, operators: OperatorSet) -> LexerBuilder {
        self.operators = Rc::new(operators);
        self
    }

    /// The operator set in use.
    pub fn operators(&self) -> &OperatorSet {
        &self.operators
    }

    /// Append a checker to the chain of a state.
    pub fn add_state<F>(mut self, state: TokenKindId, checker: F) -> LexerBuilder
    where
        F: Fn(&Switch) -> Check + 'static,
    {
        self.lexer.add_switch(state, checker);
        self
    }

    /// Register a literal as a terminal kind.
    pub fn add_operator(mut self, op: &str, id: TokenKindId) -> LexerBuilder {
        self.lexer.add_static(op, TokenKindInfo::terminal(id));
        self
    }

    /// Register a kind under the literal text it matches.
    pub fn add_static(mut self, value: &str, info: TokenKindInfo) -> LexerBuilder {
        self.lexer.add_static(value, info);
        self
    }

    /// Register a kind under a class name.
    pub fn add_dynamic(mut self, name: &str, info: TokenKindInfo) -> LexerBuilder {
        self.lexer.add_dynamic(name, info);
        self
    }

    /// Install the default state chains and the `int`, `real`, and `id`
    /// classes.
    pub fn with_default_states(mut self) -> LexerBuilder {
        let ops = &self.operators;
        self.lexer.add_switch(kind::NONE, start(ops.clone()));
        self.lexer.add_switch(kind::LEXER_END, finish);
        self.lexer.add_switch(kind::ID, symbol(ops.clone()));
        self.lexer.add_switch(kind::INTEGER, integer(ops.clone()));
        self.lexer.add_switch(kind::REAL, real(ops.clone()));
        self.lexer
            .add_dynamic("int", TokenKindInfo::terminal(kind::INTEGER));
        self.lexer
            .add_dynamic("real", TokenKindInfo::terminal(kind::REAL));
        self.lexer.add_dynamic("id", TokenKindInfo::terminal(kind::ID));
        self
    }

    /// Register every character of the operator set as a static kind.
    pub fn with_standard_operators(mut self) -> LexerBuilder {
        for (ch, id) in self.operators.iter() {
            self.lexer
                .add_static(&ch.to_string(), TokenKindInfo::terminal(id));
        }
        self
    }

    /// Finish the lexer.
    pub fn build(self) -> Lexer {
        self.lexer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{ScanError, ScanResultInfo};
    use crate::source::StringSource;

    fn default_lexer() -> Lexer {
        LexerBuilder::new()
            .with_default_states()
            .with_standard_operators()
            .build()
    }

    fn kinds(lexer: &Lexer, input: &str) -> Result<Vec<(TokenKindId, String)>, ScanError> {
        let mut src = StringSource::new(input);
        let mut info = ScanResultInfo::default();
        let mut out = Vec::new();
        while let Some(token) = lexer.next(&mut src, &mut info, kind::NONE)? {
            out.push((token.id(), token.value().to_string()));
        }
        Ok(out)
    }

    #[test]
    fn standard_set() {
        let ops = OperatorSet::standard();
        assert_eq!(ops.iter().count(), 27);
        assert_eq!(ops.kind('+'), Some(kind::PLUS));
        assert_eq!(ops.kind('|'), Some(kind::VBAR));
        assert_eq!(ops.kind('"'), Some(kind::DQUOTE));
        assert!(!ops.contains('_'));
    }

    #[test]
    fn expression() {
        assert_eq!(
            kinds(&default_lexer(), "1343+ 0.434 * gffg/4").unwrap(),
            vec![
                (kind::INTEGER, "1343".to_string()),
                (kind::PLUS, "+".to_string()),
                (kind::REAL, "0.434".to_string()),
                (kind::MUL, "*".to_string()),
                (kind::ID, "gffg".to_string()),
                (kind::DIV, "/".to_string()),
                (kind::INTEGER, "4".to_string()),
            ]
        );
    }

    #[test]
    fn keywords() {
        let lexer = LexerBuilder::new()
            .add_operator("let", 100)
            .with_default_states()
            .with_standard_operators()
            .build();
        let seq: Vec<_> = kinds(&lexer, "let lettuce")
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(seq, vec![100, kind::ID]);
    }

    #[test]
    fn unrecognized_character() {
        match kinds(&default_lexer(), "1 ` 2") {
            Err(ScanError::Rejected { line: 0, col: 2, .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_numbers() {
        assert!(kinds(&default_lexer(), "12a").is_err());
        assert!(kinds(&default_lexer(), "1.5x").is_err());
        let seq: Vec<_> = kinds(&default_lexer(), "1.5.2")
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(seq, vec![kind::REAL, kind::DOT, kind::INTEGER]);
    }

    #[test]
    fn custom_operators() {
        let lexer = LexerBuilder::new()
            .with_operators(OperatorSet::new().with('+', kind::PLUS).with('=', 200))
            .with_default_states()
            .with_standard_operators()
            .build();
        let seq: Vec<_> = kinds(&lexer, "a=b+1")
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(seq, vec![kind::ID, 200, kind::ID, kind::PLUS, kind::INTEGER]);
        assert!(kinds(&lexer, "a + *b").is_err());
    }

    #[test]
    fn arrow() {
        let lexer = LexerBuilder::new()
            .add_static("->", TokenKindInfo::terminal(kind::OP))
            .add_state(kind::OP, super::arrow)
            .build();
        let scan = |input: &str| {
            let mut src = StringSource::new(input);
            let mut info = ScanResultInfo::default();
            lexer.next(&mut src, &mut info, kind::OP)
        };
        assert_eq!(scan("  -> x").unwrap().map(|t| t.id()), Some(kind::OP));
        assert_eq!(scan("->").unwrap().map(|t| t.id()), Some(kind::OP));
        assert!(scan("- > x").is_err());
        assert!(scan("->x").is_err());
        assert!(scan("=> x").is_err());
    }

    #[test]
    fn symbol_needs_a_name() {
        let ops = Rc::new(OperatorSet::standard());
        let lexer = LexerBuilder::new()
            .add_dynamic("id", TokenKindInfo::terminal(kind::ID))
            .add_state(kind::ID, skip_blanks)
            .add_state(kind::ID, symbol(ops))
            .build();
        let scan = |input: &str| {
            let mut src = StringSource::new(input);
            let mut info = ScanResultInfo::default();
            lexer.next(&mut src, &mut info, kind::ID)
        };
        assert_eq!(scan(" ab+").unwrap().map(|t| t.value().to_string()), Some("ab".into()));
        match scan("  -> x") {
            Err(ScanError::Rejected { line: 0, col: 2, .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn any_visible_runs() {
        let lexer = LexerBuilder::new()
            .with_standard_operators()
            .add_dynamic("id", TokenKindInfo::terminal(kind::ID))
            .add_state(kind::ANY, any_visible)
            .build();
        let mut src = StringSource::new("  +  foo_bar\t(x) ");
        let mut info = ScanResultInfo::default();
        let mut out = Vec::new();
        while let Some(token) = lexer.next(&mut src, &mut info, kind::ANY).unwrap() {
            out.push((token.id(), token.value().to_string()));
        }
        assert_eq!(
            out,
            vec![
                (kind::PLUS, "+".to_string()),
                (kind::ID, "foo_bar".to_string()),
                (kind::ID, "(x)".to_string()),
            ]
        );
    }
}
