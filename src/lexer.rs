// Copyright (c) 2018 Fabian Schuiki

//! The tokenizer engine.
//!
//! A lexer holds one chain of checkers per state. Scanning peeks at the next
//! character, asks the chain of the current state what to do with it, and
//! only then consumes it. A checker may move the lexer into another state,
//! resolve the kind of the token being built, or end the token. The first
//! checker in a chain that returns anything other than `Signal::Continue`
//! decides the fate of the character.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::trace;
use thiserror::Error;

use crate::source::{Fetch, Source};
use crate::token::{Registry, Table, Token, TokenKindId, TokenKindInfo};

/// What a checker wants done with the current character.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signal {
    /// No objection. If every checker agrees, the character is consumed and
    /// appended to the token.
    Continue,
    /// Consume the character without appending it.
    Skip,
    /// The token is complete. The character is left in the source.
    Finish,
    /// Abort the scan.
    Error(String),
}

/// The verdict of a checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// What to do with the current character.
    pub signal: Signal,
    /// The state to switch to, if any.
    pub state: Option<TokenKindId>,
    /// The kind the token resolves to, if decided.
    pub result: Option<Rc<TokenKindInfo>>,
}

impl Check {
    fn with_signal(signal: Signal) -> Check {
        Check {
            signal: signal,
            state: None,
            result: None,
        }
    }

    /// Accept the character.
    pub fn proceed() -> Check {
        Check::with_signal(Signal::Continue)
    }

    /// Consume the character without appending it.
    pub fn skip() -> Check {
        Check::with_signal(Signal::Skip)
    }

    /// Complete the token.
    pub fn finish() -> Check {
        Check::with_signal(Signal::Finish)
    }

    /// Abort the scan with a message.
    pub fn error<S: Into<String>>(message: S) -> Check {
        Check::with_signal(Signal::Error(message.into()))
    }

    /// Also switch to another state.
    pub fn goto(mut self, state: TokenKindId) -> Check {
        self.state = Some(state);
        self
    }

    /// Also resolve the token kind. `None` leaves the kind untouched.
    pub fn resolve(mut self, info: Option<Rc<TokenKindInfo>>) -> Check {
        if info.is_some() {
            self.result = info;
        }
        self
    }
}

/// The arguments passed to a checker.
pub struct Switch<'a> {
    registry: &'a Registry,
    /// The current state.
    pub state: TokenKindId,
    /// The text accumulated for the token so far.
    pub value: &'a str,
    /// The character under consideration. `'\0'` once the source is
    /// exhausted.
    pub ch: char,
    /// The kind resolved so far, if any.
    pub result: Option<&'a Rc<TokenKindInfo>>,
}

impl<'a> Switch<'a> {
    /// The registry of the lexer running the checker.
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Look up a kind by name in one of the registry tables.
    pub fn resolve(&self, name: &str, table: Table) -> Option<Rc<TokenKindInfo>> {
        self.registry.lookup(name, table).cloned()
    }

    /// Look up the accumulated text as a static literal, falling back to the
    /// given class name.
    pub fn resolve_or_class(&self, class: &str) -> Option<Rc<TokenKindInfo>> {
        self.resolve(self.value, Table::Static)
            .or_else(|| self.resolve(class, Table::Dynamic))
    }
}

/// A checker callback.
pub type Checker = Box<dyn Fn(&Switch) -> Check>;

/// Information carried from one scan to the next.
///
/// The line and column counters continue where the previous scan left off.
/// On failure `message` holds the diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResultInfo {
    /// Zero-based line of the cursor.
    pub line: usize,
    /// Zero-based column of the cursor.
    pub col: usize,
    /// The kind of the last token recognized.
    pub last: Option<Rc<TokenKindInfo>>,
    /// The state the last scan ended in.
    pub state: TokenKindId,
    /// The text of the last token recognized.
    pub value: String,
    /// The message left by the last failed scan.
    pub message: String,
}

/// An error encountered while scanning.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("no checker registered for state {state}")]
    NoChecker { state: TokenKindId },
    #[error("{line}:{col}: {message}")]
    Rejected {
        message: String,
        line: usize,
        col: usize,
    },
    #[error("{line}:{col}: token complete but its kind was never resolved")]
    Unresolved { line: usize, col: usize },
    #[error("{line}:{col}: unexpected end of input")]
    UnexpectedEnd { line: usize, col: usize },
    #[error("source refused to seek back to {pos}")]
    Seek { pos: usize },
}

/// A configurable lexer.
pub struct Lexer {
    checkers: HashMap<TokenKindId, Vec<Checker>>,
    registry: Registry,
}

impl fmt::Debug for Lexer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut states: Vec<_> = self.checkers
            .iter()
            .map(|(state, chain)| (*state, chain.len()))
            .collect();
        states.sort();
        f.debug_struct("Lexer")
            .field("checkers", &states)
            .field("registry", &self.registry)
            .finish()
    }
}

impl Default for Lexer {
    fn default() -> Lexer {
        Lexer::new()
    }
}

impl Lexer {
    /// Create a lexer without any states or kinds.
    pub fn new() -> Lexer {
        Lexer {
            checkers: HashMap::new(),
            registry: Registry::new(),
        }
    }

    /// Append a checker to the chain of a state.
    pub fn add_switch<F>(&mut self, state: TokenKindId, checker: F)
    where
        F: Fn(&Switch) -> Check + 'static,
    {
        self.checkers
            .entry(state)
            .or_insert_with(Vec::new)
            .push(Box::new(checker));
    }

    /// Check whether a state has any checkers.
    pub fn has_state(&self, state: TokenKindId) -> bool {
        self.checkers.get(&state).map_or(false, |c| !c.is_empty())
    }

    /// The registry of token kinds.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a kind under the literal text it matches.
    pub fn add_static(&mut self, value: &str, info: TokenKindInfo) -> Rc<TokenKindInfo> {
        self.registry.add_static(value, info)
    }

    /// Register a kind under a class name.
    pub fn add_dynamic(&mut self, name: &str, info: TokenKindInfo) -> Rc<TokenKindInfo> {
        self.registry.add_dynamic(name, info)
    }

    /// Look up a kind by literal text.
    pub fn get_static(&self, value: &str) -> Option<&Rc<TokenKindInfo>> {
        self.registry.get_static(value)
    }

    /// Look up a kind by class name.
    pub fn get_dynamic(&self, name: &str) -> Option<&Rc<TokenKindInfo>> {
        self.registry.get_dynamic(name)
    }

    /// Scan the next token, starting in `state`.
    ///
    /// Returns `Ok(None)` if the source is exhausted before any token text
    /// has been accumulated.
    pub fn next<S: Source + ?Sized>(
        &self,
        source: &mut S,
        info: &mut ScanResultInfo,
        state: TokenKindId,
    ) -> Result<Option<Token>, ScanError> {
        if !self.has_state(state) {
            let (line, col) = (info.line, info.col);
            return Err(fail(info, ScanError::NoChecker { state }, line, col));
        }
        if source.peek_char() == Fetch::End {
            return Ok(None);
        }

        let mut line = info.line;
        let mut col = info.col;
        let mut state = state;
        let mut value = String::new();
        let mut result: Option<Rc<TokenKindInfo>> = None;

        loop {
            let (ch, at_end) = match source.peek_char() {
                Fetch::Char(c) => (c, false),
                Fetch::Skip(c) => {
                    source.next_char();
                    advance(&mut line, &mut col, c);
                    continue;
                }
                Fetch::End => ('\0', true),
            };

            let signal = match self.call_checkers(&mut state, &value, ch, &mut result) {
                Ok(signal) => signal,
                Err(e) => return Err(fail(info, e, line, col)),
            };

            match signal {
                Signal::Continue | Signal::Skip if at_end => {
                    if value.is_empty() {
                        info.line = line;
                        info.col = col;
                        return Ok(None);
                    }
                    return Err(fail(info, ScanError::UnexpectedEnd { line, col }, line, col));
                }
                Signal::Continue => {
                    source.next_char();
                    advance(&mut line, &mut col, ch);
                    value.push(ch);
                }
                Signal::Skip => {
                    source.next_char();
                    advance(&mut line, &mut col, ch);
                }
                Signal::Finish => {
                    let kind = match result {
                        Some(kind) => kind,
                        None => {
                            return Err(fail(info, ScanError::Unresolved { line, col }, line, col))
                        }
                    };
                    trace!("scanned {} `{}` in state {}", kind.id, value, state);
                    let token = Token::new(kind.clone(), value.as_str());
                    info.line = line;
                    info.col = col;
                    info.last = Some(kind);
                    info.state = state;
                    info.value = value;
                    info.message.clear();
                    return Ok(Some(token));
                }
                Signal::Error(message) => {
                    let err = ScanError::Rejected { message, line, col };
                    return Err(fail(info, err, line, col));
                }
            }
        }
    }

    /// Scan the next token without consuming it.
    ///
    /// The source position and the carried info are restored afterwards,
    /// except that a failure still leaves its message behind. A source that
    /// cannot seek back yields `ScanError::Seek`.
    pub fn peek<S: Source + ?Sized>(
        &self,
        source: &mut S,
        info: &mut ScanResultInfo,
        state: TokenKindId,
    ) -> Result<Option<Token>, ScanError> {
        let pos = source.tell();
        let mut scratch = info.clone();
        let result = self.next(source, &mut scratch, state);
        if !source.seek(pos) {
            let err = ScanError::Seek { pos };
            info.message = err.to_string();
            return Err(err);
        }
        if result.is_err() {
            info.message = scratch.message;
        }
        result
    }

    /// Run the chain of `state` over one character.
    fn call_checkers(
        &self,
        state: &mut TokenKindId,
        value: &str,
        ch: char,
        result: &mut Option<Rc<TokenKindInfo>>,
    ) -> Result<Signal, ScanError> {
        let chain = match self.checkers.get(state) {
            Some(chain) if !chain.is_empty() => chain,
            _ => return Err(ScanError::NoChecker { state: *state }),
        };
        for checker in chain {
            let check = checker(&Switch {
                registry: &self.registry,
                state: *state,
                value: value,
                ch: ch,
                result: result.as_ref(),
            });
            if let Some(next) = check.state {
                *state = next;
            }
            if check.result.is_some() {
                *result = check.result;
            }
            if check.signal != Signal::Continue {
                return Ok(check.signal);
            }
        }
        Ok(Signal::Continue)
    }
}

/// Update the line and column counters for a consumed character.
fn advance(line: &mut usize, col: &mut usize, ch: char) {
    if ch == '\n' {
        *col = 0;
        *line += 1;
    } else {
        *col += 1;
    }
}

/// Record a failure in the carried info.
fn fail(info: &mut ScanResultInfo, err: ScanError, line: usize, col: usize) -> ScanError {
    info.line = line;
    info.col = col;
    info.message = match err {
        ScanError::Rejected { ref message, .. } => message.clone(),
        ref other => other.to_string(),
    };
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StringSource;

    const WORD: TokenKindId = 1;

    /// A lexer that splits lowercase words on spaces.
    fn words() -> Lexer {
        let mut lexer = Lexer::new();
        lexer.add_dynamic("word", TokenKindInfo::terminal(WORD));
        lexer.add_switch(0, |s| {
            let blank = s.ch == ' ' || s.ch == '\n' || s.ch == '\0';
            if s.value.is_empty() && blank {
                Check::skip()
            } else {
                Check::proceed()
            }
        });
        lexer.add_switch(0, |s| {
            if s.ch.is_ascii_lowercase() {
                Check::proceed()
            } else if s.ch == ' ' || s.ch == '\n' || s.ch == '\0' {
                Check::finish().resolve(s.resolve("word", Table::Dynamic))
            } else {
                Check::error(format!("unexpected `{}`", s.ch))
            }
        });
        lexer
    }

    fn lex(lexer: &Lexer, input: &str) -> Vec<String> {
        let mut src = StringSource::new(input);
        let mut info = ScanResultInfo::default();
        let mut out = Vec::new();
        while let Some(token) = lexer.next(&mut src, &mut info, 0).unwrap() {
            out.push(token.value().to_string());
        }
        out
    }

    #[test]
    fn chain_order() {
        assert_eq!(lex(&words(), "  ab cd  ef"), vec!["ab", "cd", "ef"]);
        assert_eq!(lex(&words(), "ab   "), vec!["ab"]);
        assert!(lex(&words(), "").is_empty());
    }

    #[test]
    fn missing_chain() {
        let lexer = words();
        let mut src = StringSource::new("ab");
        let mut info = ScanResultInfo::default();
        assert_eq!(
            lexer.next(&mut src, &mut info, 7),
            Err(ScanError::NoChecker { state: 7 })
        );
        assert!(!lexer.has_state(7));
        assert!(lexer.has_state(0));
        let mut empty = StringSource::new("");
        assert_eq!(
            lexer.next(&mut empty, &mut info, 7),
            Err(ScanError::NoChecker { state: 7 })
        );
    }

    #[test]
    fn unresolved_finish() {
        let mut lexer = Lexer::new();
        lexer.add_switch(0, |_| Check::finish());
        let mut src = StringSource::new("x");
        let mut info = ScanResultInfo::default();
        assert_eq!(
            lexer.next(&mut src, &mut info, 0),
            Err(ScanError::Unresolved { line: 0, col: 0 })
        );
    }

    #[test]
    fn error_message_is_carried() {
        let lexer = words();
        let mut src = StringSource::new("ab C");
        let mut info = ScanResultInfo::default();
        assert!(lexer.next(&mut src, &mut info, 0).unwrap().is_some());
        let err = lexer.next(&mut src, &mut info, 0).unwrap_err();
        assert_eq!(
            err,
            ScanError::Rejected {
                message: "unexpected `C`".into(),
                line: 0,
                col: 3,
            }
        );
        assert_eq!(info.message, "unexpected `C`");
    }

    #[test]
    fn state_switch_applies_to_later_checkers() {
        let mut lexer = Lexer::new();
        lexer.add_static("x", TokenKindInfo::terminal(5));
        lexer.add_switch(0, |_| Check::proceed().goto(1));
        lexer.add_switch(0, |s| {
            assert_eq!(s.state, 1);
            Check::proceed()
        });
        lexer.add_switch(1, |s| {
            if s.ch == '\0' {
                Check::finish().resolve(s.resolve("x", Table::Static))
            } else {
                Check::error("only one character")
            }
        });
        let mut src = StringSource::new("x");
        let mut info = ScanResultInfo::default();
        let token = lexer.next(&mut src, &mut info, 0).unwrap().unwrap();
        assert_eq!(token.id(), 5);
        assert_eq!(info.state, 1);
    }

    #[test]
    fn peek_restores_position() {
        let lexer = words();
        let mut src = StringSource::new("ab cd");
        let mut info = ScanResultInfo::default();
        let before = src.tell();
        let peeked = lexer.peek(&mut src, &mut info, 0).unwrap().unwrap();
        assert_eq!(src.tell(), before);
        assert_eq!(info, ScanResultInfo::default());
        let next = lexer.next(&mut src, &mut info, 0).unwrap().unwrap();
        assert_eq!(peeked, next);
        assert_eq!(info.col, 2);
    }

    #[test]
    fn peek_reports_refused_seek() {
        /// Forgets everything it has consumed.
        struct Forgetful(StringSource);

        impl Source for Forgetful {
            fn peek_char(&mut self) -> Fetch {
                self.0.peek_char()
            }

            fn next_char(&mut self) -> Fetch {
                self.0.next_char()
            }

            fn tell(&self) -> usize {
                self.0.tell()
            }

            fn seek(&mut self, pos: usize) -> bool {
                pos >= self.0.tell() && self.0.seek(pos)
            }
        }

        let lexer = words();
        let mut src = Forgetful(StringSource::new("ab cd"));
        let mut info = ScanResultInfo::default();
        assert_eq!(
            lexer.peek(&mut src, &mut info, 0),
            Err(ScanError::Seek { pos: 0 })
        );
        assert!(!info.message.is_empty());
    }

    #[test]
    fn lines_and_columns() {
        let lexer = words();
        let mut src = StringSource::new("ab\ncd");
        let mut info = ScanResultInfo::default();
        lexer.next(&mut src, &mut info, 0).unwrap();
        assert_eq!((info.line, info.col), (0, 2));
        // The newline finishes `ab` and is left in the source.
        let token = lexer.next(&mut src, &mut info, 0).unwrap().unwrap();
        assert_eq!(token.value(), "cd");
        assert_eq!((info.line, info.col), (1, 2));
    }

    #[test]
    fn source_level_skips() {
        /// Hides everything between `#` and the end of the line.
        struct Commented(StringSource, bool);

        impl Source for Commented {
            fn peek_char(&mut self) -> Fetch {
                match self.0.peek_char() {
                    Fetch::Char('#') => Fetch::Skip('#'),
                    Fetch::Char('\n') if self.1 => Fetch::Skip('\n'),
                    Fetch::Char(c) if self.1 => Fetch::Skip(c),
                    other => other,
                }
            }

            fn next_char(&mut self) -> Fetch {
                let fetched = self.peek_char();
                match fetched {
                    Fetch::Skip('#') => self.1 = true,
                    Fetch::Skip('\n') => self.1 = false,
                    _ => (),
                }
                self.0.next_char();
                fetched
            }

            fn tell(&self) -> usize {
                self.0.tell()
            }

            fn seek(&mut self, pos: usize) -> bool {
                self.0.seek(pos)
            }
        }

        let lexer = words();
        let mut src = Commented(StringSource::new("ab#xy\ncd"), false);
        let mut info = ScanResultInfo::default();
        let token = lexer.next(&mut src, &mut info, 0).unwrap().unwrap();
        assert_eq!(token.value(), "abcd");
        assert_eq!((info.line, info.col), (1, 2));
    }

    #[test]
    fn trailing_text_at_end() {
        let mut lexer = Lexer::new();
        lexer.add_switch(0, |_| Check::proceed());
        let mut src = StringSource::new("abc");
        let mut info = ScanResultInfo::default();
        assert_eq!(
            lexer.next(&mut src, &mut info, 0),
            Err(ScanError::UnexpectedEnd { line: 0, col: 3 })
        );
    }
}
