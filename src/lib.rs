// src/lib.rs
//! Runtime for precompiled LALR grammar tables.
//!
//! A [`GrammarTable`] is loaded once from the binary table format and shared
//! by reference. A [`Lexer`] scans input with the table's DFA, a [`Parser`]
//! drives its LALR automaton, and event handlers such as [`TreeBuilder`]
//! turn the parse into a value.

pub mod config;
pub mod driver;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod tree;

pub use config::ParseOptions;
pub use driver::{
    parse_path_to_simplified_tree, parse_path_to_tree, parse_reader, parse_str,
    parse_str_to_simplified_tree, parse_str_to_tree,
};
pub use error::{ParseError, ParseErrorKind, TableError};
pub use grammar::{GrammarTable, RawGrammar};
pub use lexer::{Encoding, Lexer, Position, Token};
pub use parser::{Child, Event, EventHandler, ParseItem, Parser, ProductionHandler, Step};
pub use tree::{SimplifiedTreeBuilder, TreeBuilder, TreeNode};
