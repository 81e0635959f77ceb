// Copyright (c) 2018 Fabian Schuiki

//! Character sources the lexer reads from.

/// The result of fetching a character from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// A regular character.
    Char(char),
    /// A character the source wants the lexer to step over without showing
    /// it to any checker, e.g. the body of a comment.
    Skip(char),
    /// The source is exhausted.
    End,
}

/// A sequential, seekable character cursor.
///
/// `peek_char` must not move the cursor; `next_char` returns the same thing
/// and then advances past it.
pub trait Source {
    /// Look at the character under the cursor.
    fn peek_char(&mut self) -> Fetch;
    /// Consume the character under the cursor.
    fn next_char(&mut self) -> Fetch;
    /// The current cursor position.
    fn tell(&self) -> usize;
    /// Move the cursor to a position previously obtained from `tell`.
    fn seek(&mut self, pos: usize) -> bool;
}

/// A source reading from an in-memory string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSource {
    text: String,
    pos: usize,
}

impl StringSource {
    /// Create a source positioned at the start of `text`.
    pub fn new<S: Into<String>>(text: S) -> StringSource {
        StringSource {
            text: text.into(),
            pos: 0,
        }
    }

    /// The text that has not been consumed yet.
    pub fn rest(&self) -> &str {
        &self.text[self.pos..]
    }
}

impl Source for StringSource {
    fn peek_char(&mut self) -> Fetch {
        match self.rest().chars().next() {
            Some(c) => Fetch::Char(c),
            None => Fetch::End,
        }
    }

    fn next_char(&mut self) -> Fetch {
        let fetched = self.peek_char();
        if let Fetch::Char(c) = fetched {
            self.pos += c.len_utf8();
        }
        fetched
    }

    fn tell(&self) -> usize {
        self.pos
    }

    /// Positions past the end clamp to the end. Positions inside a multi-byte
    /// character are refused.
    fn seek(&mut self, pos: usize) -> bool {
        let pos = pos.min(self.text.len());
        if !self.text.is_char_boundary(pos) {
            return false;
        }
        self.pos = pos;
        true
    }
}
