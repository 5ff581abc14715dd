// src/error.rs
use std::fmt;

use thiserror::Error;

use crate::{
    grammar::{GrammarTable, LalrStateId, SymbolId},
    lexer::{Position, Token},
};

/// Failure to load or link a grammar table. Apart from `Io` and `Json`, every
/// variant means the table itself is malformed.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read grammar table: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode grammar table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected table header {found:?}")]
    BadHeader { found: String },

    #[error("table truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("unknown field tag {tag:#04x} at byte {offset}")]
    UnknownFieldTag { tag: u8, offset: usize },

    #[error("unknown record kind {kind:?}")]
    UnknownRecord { kind: char },

    #[error("malformed {record} record: {reason}")]
    BadRecord { record: &'static str, reason: String },

    #[error("missing {0} record")]
    MissingRecord(&'static str),

    #[error("table count mismatch: declared {declared:?}, read {read:?}")]
    CountMismatch {
        declared: crate::grammar::raw::TableCounts,
        read: crate::grammar::raw::TableCounts,
    },

    #[error("{len} {kind} entries do not fit a 16-bit count")]
    TooManyEntries { kind: &'static str, len: usize },

    #[error("duplicate {kind} index {index}")]
    DuplicateIndex { kind: &'static str, index: u16 },

    #[error("{kind} index {index} does not resolve")]
    Dangling { kind: &'static str, index: u16 },

    #[error("LALR state {state} has more than one action for symbol {symbol}")]
    DuplicateAction { state: u16, symbol: u16 },

    #[error("table must contain exactly one {0} symbol")]
    SpecialSymbol(&'static str),

    #[error("no production matches {0:?}")]
    UnknownProduction(String),
}

impl TableError {
    pub fn is_malformed(&self) -> bool {
        !matches!(
            self,
            TableError::Io(_) | TableError::Json(_) | TableError::UnknownProduction(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The lexer could not match the input.
    Lexical,
    /// No action exists for the lookahead in the current state.
    Syntax,
    /// The tables are inconsistent (missing goto, goto on a terminal).
    Internal,
    /// The source could not be read.
    Input,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParseErrorKind::Lexical => "lexical error",
            ParseErrorKind::Syntax => "syntax error",
            ParseErrorKind::Internal => "internal error",
            ParseErrorKind::Input => "input error",
        })
    }
}

/// A parse-time failure, returned as a value from the step functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
    pub state: LalrStateId,
    /// The offending lookahead; absent for input errors.
    pub token: Option<Token>,
    /// Symbols with an action in `state`; only filled for syntax errors.
    pub expected: Vec<SymbolId>,
    pub detail: Option<String>,
}

impl ParseError {
    /// Renders the error with symbol names resolved against `grammar`.
    pub fn describe(&self, grammar: &GrammarTable) -> String {
        let mut out = format!("{} at {}", self.kind, self.position);
        if let Some(tok) = &self.token {
            out.push_str(&format!(
                ": {} {:?}",
                grammar.symbol(tok.symbol).name,
                tok.lexeme
            ));
        }
        match self.kind {
            ParseErrorKind::Syntax => {
                let names: Vec<&str> = self
                    .expected
                    .iter()
                    .map(|&s| grammar.symbol(s).name.as_str())
                    .collect();
                out.push_str(&format!(" (expected: {})", names.join(", ")));
            }
            ParseErrorKind::Internal => {
                out.push_str(&format!(" (state {})", self.state));
            }
            _ => {}
        }
        if let Some(detail) = &self.detail {
            out.push_str(": ");
            out.push_str(detail);
        }
        out
    }
}
