// src/lexer/mod.rs
//! Table-driven maximal-munch lexer with nested lexical groups.
//!
//! [`Lexer::peek_token`] runs the DFA from the current cursor without
//! consuming anything. [`Lexer::read_token`] layers group handling on top:
//! a group-start symbol opens a group, everything up to the matching end
//! symbol is folded into one token of the group's container symbol.

pub mod source;

use std::{fmt, io::Read};

pub use source::{DEFAULT_CHUNK, Encoding};
use source::CharSource;

use crate::{
    config::ParseOptions,
    grammar::{AdvanceMode, DfaOutcome, EndingMode, GrammarTable, GroupId, SymbolId, SymbolKind},
};

/// 1-based line and column of a character in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: SymbolId,
    pub lexeme: String,
    /// Where the first character of `lexeme` sits.
    pub position: Position,
}

/// An open lexical group and the text accumulated for it so far.
#[derive(Debug, Clone)]
struct GroupFrame {
    group: GroupId,
    text: String,
    position: Position,
}

pub struct Lexer<'g, R> {
    grammar: &'g GrammarTable,
    source: CharSource<R>,
    position: Position,
    groups: Vec<GroupFrame>,
    chunk: usize,
}

impl<'g, 's> Lexer<'g, &'s [u8]> {
    /// Lexes an in-memory string.
    pub fn from_text(grammar: &'g GrammarTable, text: &'s str) -> Self {
        Self::new(grammar, text.as_bytes())
    }
}

impl<'g, R: Read> Lexer<'g, R> {
    pub fn new(grammar: &'g GrammarTable, reader: R) -> Self {
        Self::with_encoding(grammar, reader, Encoding::Utf8)
    }

    pub fn with_encoding(grammar: &'g GrammarTable, reader: R, encoding: Encoding) -> Self {
        Self::build(grammar, reader, encoding, DEFAULT_CHUNK)
    }

    pub fn with_options(grammar: &'g GrammarTable, reader: R, options: &ParseOptions) -> Self {
        Self::build(grammar, reader, options.encoding, options.chunk_size)
    }

    fn build(grammar: &'g GrammarTable, reader: R, encoding: Encoding, chunk: usize) -> Self {
        Self {
            grammar,
            source: CharSource::new(reader, encoding, chunk),
            position: Position::START,
            groups: Vec::new(),
            chunk,
        }
    }

    /// Starts over on a new source. Position and open groups are reset.
    pub fn attach(&mut self, reader: R, encoding: Encoding) {
        self.source = CharSource::new(reader, encoding, self.chunk);
        self.position = Position::START;
        self.groups.clear();
    }

    pub fn grammar(&self) -> &'g GrammarTable {
        self.grammar
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Number of groups currently open.
    pub fn open_groups(&self) -> usize {
        self.groups.len()
    }

    /// Matches the longest token at the cursor without consuming it.
    ///
    /// Returns the end-of-file token when no input remains. If no prefix is
    /// accepted, the result is an error-symbol token whose lexeme runs up to
    /// and including the first character the DFA rejected.
    pub fn peek_token(&mut self) -> std::io::Result<Token> {
        let g = self.grammar;
        let mut state = g.dfa_state(g.dfa_init());
        let mut scanned = 0usize;
        let mut hit: Option<(SymbolId, usize)> = None;

        while let Some(c) = self.source.get(scanned)? {
            scanned += 1;
            match state.next(c as u32) {
                None => break,
                Some(DfaOutcome::LoopNonAccepting) => {}
                Some(DfaOutcome::LoopAccepting) => {
                    if let Some(sym) = state.accept {
                        hit = Some((sym, scanned));
                    }
                }
                Some(DfaOutcome::Goto(next)) => {
                    state = g.dfa_state(next);
                    if let Some(sym) = state.accept {
                        hit = Some((sym, scanned));
                    }
                }
            }
        }

        let (symbol, len) = match hit {
            Some(h) => h,
            None if scanned == 0 => (g.eof_symbol(), 0),
            None => (g.error_symbol(), scanned),
        };
        Ok(Token {
            symbol,
            lexeme: self.source.text(len),
            position: self.position,
        })
    }

    /// Reads the next token, folding lexical groups into a single token of
    /// their container symbol.
    ///
    /// End of input inside an open group yields the end-of-file token and
    /// leaves the group open.
    pub fn read_token(&mut self) -> std::io::Result<Token> {
        let g = self.grammar;
        loop {
            let token = self.peek_token()?;
            let len = token.lexeme.chars().count();

            if let Some(group) = self.opens_group(token.symbol) {
                log::trace!("open group {} at {}", g.group(group).name, token.position);
                self.consume(len);
                self.groups.push(GroupFrame {
                    group,
                    text: token.lexeme,
                    position: token.position,
                });
                continue;
            }

            let Some(top) = self.groups.last() else {
                self.consume(len);
                log::trace!(
                    "token {} {:?} at {}",
                    g.symbol(token.symbol).name,
                    token.lexeme,
                    token.position
                );
                return Ok(token);
            };
            let group = g.group(top.group);

            if token.symbol == group.end {
                if let Some(mut frame) = self.groups.pop() {
                    if group.ending_mode == EndingMode::Closed {
                        frame.text.push_str(&token.lexeme);
                        self.consume(len);
                    }
                    log::trace!("close group {} at {}", group.name, self.position);
                    match self.groups.last_mut() {
                        Some(outer) => outer.text.push_str(&frame.text),
                        None => {
                            return Ok(Token {
                                symbol: group.container,
                                lexeme: frame.text,
                                position: frame.position,
                            });
                        }
                    }
                }
                continue;
            }

            if token.symbol == g.eof_symbol() {
                log::warn!(
                    "end of input inside group {} opened at {}",
                    group.name,
                    top.position
                );
                return Ok(token);
            }

            match group.advance_mode {
                AdvanceMode::Token => {
                    self.consume(len);
                    if let Some(top) = self.groups.last_mut() {
                        top.text.push_str(&token.lexeme);
                    }
                }
                AdvanceMode::Character => {
                    self.consume(1);
                    if let (Some(top), Some(c)) = (self.groups.last_mut(), token.lexeme.chars().next())
                    {
                        top.text.push(c);
                    }
                }
            }
        }
    }

    /// Reads tokens up to and including the first end-of-file or error token.
    pub fn read_all_tokens(&mut self) -> std::io::Result<Vec<Token>> {
        let (eof, error) = (self.grammar.eof_symbol(), self.grammar.error_symbol());
        let mut out = Vec::new();
        loop {
            let tok = self.read_token()?;
            let done = tok.symbol == eof || tok.symbol == error;
            out.push(tok);
            if done {
                return Ok(out);
            }
        }
    }

    /// The group `symbol` would open here: it must start a group, and any
    /// currently open group must allow that group to nest inside it.
    fn opens_group(&self, symbol: SymbolId) -> Option<GroupId> {
        let g = self.grammar;
        if g.symbol(symbol).kind != SymbolKind::GroupStart {
            return None;
        }
        let group = g.group_for_start(symbol)?;
        match self.groups.last() {
            None => Some(group),
            Some(top) => g.group(top.group).nesting.contains(&group).then_some(group),
        }
    }

    fn consume(&mut self, n: usize) {
        for &c in self.source.advance(n) {
            if c == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
    }
}
