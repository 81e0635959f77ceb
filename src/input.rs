// Copyright (c) 2018 Fabian Schuiki

//! Feeding lexer output to the parser runtime.

use crate::lexer::{Lexer, ScanError, ScanResultInfo};
use crate::runtime::{KindId, ParserInput};
use crate::source::Source;
use crate::token::{kind, Token, TokenKindId};

/// A lexer scanning a source, presented as parser input.
///
/// Every token is scanned starting in the same state, `kind::NONE` unless
/// configured otherwise.
#[derive(Debug)]
pub struct TokenInput<'a, S> {
    lexer: &'a Lexer,
    source: S,
    info: ScanResultInfo,
    state: TokenKindId,
}

impl<'a, S: Source> TokenInput<'a, S> {
    /// Scan `source` with `lexer`.
    pub fn new(lexer: &'a Lexer, source: S) -> TokenInput<'a, S> {
        TokenInput {
            lexer: lexer,
            source: source,
            info: ScanResultInfo::default(),
            state: kind::NONE,
        }
    }

    /// Start every token in a different state.
    pub fn with_state(mut self, state: TokenKindId) -> TokenInput<'a, S> {
        self.state = state;
        self
    }

    /// The information carried between scans.
    pub fn info(&self) -> &ScanResultInfo {
        &self.info
    }

    /// The source being scanned.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Give up the source.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<'a, S: Source> ParserInput for TokenInput<'a, S> {
    type Token = Token;
    type Error = ScanError;

    fn peek(&mut self) -> Result<Option<Token>, ScanError> {
        self.lexer.peek(&mut self.source, &mut self.info, self.state)
    }

    fn next(&mut self) -> Result<Option<Token>, ScanError> {
        self.lexer.next(&mut self.source, &mut self.info, self.state)
    }

    fn kind(token: &Token) -> KindId {
        token.id()
    }
}
