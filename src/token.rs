// Copyright (c) 2018 Fabian Schuiki

//! Token kinds, tokens, and the registry that maps names to kinds.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

pub use lrkit_runtime::KindId as TokenKindId;

/// Built-in token kinds.
///
/// The same ids double as tokenizer states: the default start state is
/// `NONE`, and a checker that recognizes an identifier moves the tokenizer
/// into state `ID`.
#[allow(missing_docs)]
pub mod kind {
    use super::TokenKindId;

    /// The end-of-input marker, also used as the "token complete" state.
    pub const LEXER_END: TokenKindId = ::lrkit_runtime::END;
    /// The start state. Doubles as the epsilon symbol in grammars.
    pub const NONE: TokenKindId = 0;
    pub const PLUS: TokenKindId = 1;
    pub const MINUS: TokenKindId = 2;
    pub const MUL: TokenKindId = 3;
    pub const DIV: TokenKindId = 4;
    pub const COLON: TokenKindId = 5;
    pub const SEMICOLON: TokenKindId = 6;
    pub const COMMA: TokenKindId = 7;
    pub const NOT: TokenKindId = 8;
    pub const AT: TokenKindId = 9;
    pub const SHARP: TokenKindId = 10;
    pub const PERC: TokenKindId = 11;
    pub const CIRC: TokenKindId = 12;
    pub const AND: TokenKindId = 13;
    pub const BRACKET_OPEN: TokenKindId = 14;
    pub const BRACKET_CLOSE: TokenKindId = 15;
    pub const SQR_OPEN: TokenKindId = 16;
    pub const SQR_CLOSE: TokenKindId = 17;
    pub const BRACE_OPEN: TokenKindId = 18;
    pub const BRACE_CLOSE: TokenKindId = 19;
    pub const DOT: TokenKindId = 20;
    pub const TILDA: TokenKindId = 21;
    pub const ID: TokenKindId = 22;
    pub const INTEGER: TokenKindId = 23;
    pub const REAL: TokenKindId = 24;
    pub const QUOTE: TokenKindId = 25;
    pub const DQUOTE: TokenKindId = 26;
    pub const GREATER: TokenKindId = 27;
    pub const LESS: TokenKindId = 28;
    pub const DOLLAR: TokenKindId = 29;
    pub const VBAR: TokenKindId = 30;
    pub const OR: TokenKindId = 31;
    pub const OP: TokenKindId = 32;
    pub const ANY: TokenKindId = 33;
    pub const NEW_LINE: TokenKindId = 34;

    /// First id of the range conventionally used for grammar nonterminals.
    pub const NONTERMINAL_BASE: TokenKindId = 10_000_000;
}

/// The role a token kind plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// A leaf symbol produced by scanning.
    Terminal,
    /// A symbol defined by grammar rules.
    Nonterminal,
    /// A semantic action marker.
    Action,
    /// A character class such as "identifier" or "integer".
    Class,
}

impl Default for Category {
    fn default() -> Category {
        Category::Terminal
    }
}

/// Information about a registered token kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TokenKindInfo {
    /// The kind id.
    pub id: TokenKindId,
    /// The category of the kind.
    pub category: Category,
    /// The name the kind was registered under.
    pub value: String,
}

impl TokenKindInfo {
    /// Create a terminal kind.
    pub fn terminal(id: TokenKindId) -> TokenKindInfo {
        TokenKindInfo::new(id, Category::Terminal)
    }

    /// Create a nonterminal kind.
    pub fn nonterminal(id: TokenKindId) -> TokenKindInfo {
        TokenKindInfo::new(id, Category::Nonterminal)
    }

    /// Create a kind with an explicit category.
    pub fn new(id: TokenKindId, category: Category) -> TokenKindInfo {
        TokenKindInfo {
            id: id,
            category: category,
            value: String::new(),
        }
    }
}

/// A recognized token.
///
/// The kind information is shared with the registry of the lexer that
/// produced the token, so the token stays valid even if the lexer goes away.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    info: Rc<TokenKindInfo>,
    value: String,
    flags: u64,
}

impl Token {
    /// Create a new token.
    pub fn new<S: Into<String>>(info: Rc<TokenKindInfo>, value: S) -> Token {
        Token {
            info: info,
            value: value.into(),
            flags: 0,
        }
    }

    /// The kind of this token.
    pub fn info(&self) -> &TokenKindInfo {
        &self.info
    }

    /// Shorthand for `info().id`.
    pub fn id(&self) -> TokenKindId {
        self.info.id
    }

    /// The text the token was scanned from.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The caller-defined flags.
    pub fn flags(&self) -> u64 {
        self.flags
    }

    /// Replace the flags.
    pub fn set_flags(&mut self, flags: u64) {
        self.flags = flags;
    }

    /// Set additional flags.
    pub fn add_flags(&mut self, flags: u64) {
        self.flags |= flags;
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} `{}`", self.info.id, self.value)
    }
}

/// Selects one of the two tables of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Kinds keyed by the exact literal text they match.
    Static,
    /// Kinds keyed by a class name assigned after scanning.
    Dynamic,
}

/// The token kinds known to a lexer.
///
/// Entries are only ever added. Registering a name twice replaces the entry
/// for future lookups; tokens created earlier keep the old entry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    statics: IndexMap<String, Rc<TokenKindInfo>>,
    dynamics: IndexMap<String, Rc<TokenKindInfo>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Register a kind under the literal text it matches.
    pub fn add_static(&mut self, value: &str, info: TokenKindInfo) -> Rc<TokenKindInfo> {
        Registry::insert(&mut self.statics, value, info)
    }

    /// Register a kind under a class name.
    pub fn add_dynamic(&mut self, name: &str, info: TokenKindInfo) -> Rc<TokenKindInfo> {
        Registry::insert(&mut self.dynamics, name, info)
    }

    /// Look up a kind by literal text.
    pub fn get_static(&self, value: &str) -> Option<&Rc<TokenKindInfo>> {
        self.statics.get(value)
    }

    /// Look up a kind by class name.
    pub fn get_dynamic(&self, name: &str) -> Option<&Rc<TokenKindInfo>> {
        self.dynamics.get(name)
    }

    /// Look up a kind in either table.
    pub fn lookup(&self, name: &str, table: Table) -> Option<&Rc<TokenKindInfo>> {
        match table {
            Table::Static => self.get_static(name),
            Table::Dynamic => self.get_dynamic(name),
        }
    }

    /// Find the first static entry with the given id.
    pub fn static_by_id(&self, id: TokenKindId) -> Option<&Rc<TokenKindInfo>> {
        self.statics.values().find(|info| info.id == id)
    }

    /// Find the first dynamic entry with the given id.
    pub fn dynamic_by_id(&self, id: TokenKindId) -> Option<&Rc<TokenKindInfo>> {
        self.dynamics.values().find(|info| info.id == id)
    }

    fn insert(
        map: &mut IndexMap<String, Rc<TokenKindInfo>>,
        name: &str,
        mut info: TokenKindInfo,
    ) -> Rc<TokenKindInfo> {
        if info.value.is_empty() {
            info.value = name.to_string();
        }
        let info = Rc::new(info);
        map.insert(name.to_string(), info.clone());
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_independent() {
        let mut reg = Registry::new();
        reg.add_static("+", TokenKindInfo::terminal(kind::PLUS));
        reg.add_dynamic("id", TokenKindInfo::terminal(kind::ID));
        assert_eq!(reg.get_static("+").map(|i| i.id), Some(kind::PLUS));
        assert!(reg.get_dynamic("+").is_none());
        assert_eq!(reg.lookup("id", Table::Dynamic).map(|i| i.id), Some(kind::ID));
        assert!(reg.lookup("id", Table::Static).is_none());
    }

    #[test]
    fn names_fill_in_value() {
        let mut reg = Registry::new();
        let info = reg.add_static("E", TokenKindInfo::nonterminal(kind::NONTERMINAL_BASE));
        assert_eq!(info.value, "E");
        assert_eq!(info.category, Category::Nonterminal);
        assert_eq!(reg.static_by_id(kind::NONTERMINAL_BASE).map(|i| i.value.as_str()), Some("E"));
    }

    #[test]
    fn tokens_survive_reregistration() {
        let mut reg = Registry::new();
        let old = reg.add_static("x", TokenKindInfo::terminal(1));
        let mut token = Token::new(old, "x");
        reg.add_static("x", TokenKindInfo::terminal(2));
        assert_eq!(token.id(), 1);
        assert_eq!(reg.get_static("x").map(|i| i.id), Some(2));
        token.set_flags(0b01);
        token.add_flags(0b10);
        assert_eq!(token.flags(), 0b11);
    }
}
