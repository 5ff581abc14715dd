// src/driver.rs
//! One-call helpers that wire a lexer, parser and handler together.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};

use crate::{
    config::ParseOptions,
    error::{ParseError, ParseErrorKind},
    grammar::GrammarTable,
    lexer::Lexer,
    parser::{EventHandler, Parser},
    tree::{SimplifiedTreeBuilder, TreeBuilder, TreeNode},
};

/// Parses `text`, passing every event to `handler`.
pub fn parse_str<T, H>(grammar: &GrammarTable, text: &str, handler: &mut H) -> Result<(), ParseError>
where
    H: EventHandler<T> + ?Sized,
{
    parse_reader(grammar, text.as_bytes(), &ParseOptions::default(), handler)
}

/// Parses everything `reader` yields under `options`.
pub fn parse_reader<R, T, H>(
    grammar: &GrammarTable,
    reader: R,
    options: &ParseOptions,
    handler: &mut H,
) -> Result<(), ParseError>
where
    R: std::io::Read,
    H: EventHandler<T> + ?Sized,
{
    let mut parser: Parser<'_, R, T> = Parser::new(Lexer::with_options(grammar, reader, options));
    parser.set_trim_reductions(options.trim_reductions);
    parser.run_with(handler)
}

pub fn parse_str_to_tree(grammar: &GrammarTable, text: &str) -> Result<TreeNode, ParseError> {
    let mut builder = TreeBuilder::new();
    parse_str::<TreeNode, _>(grammar, text, &mut builder)?;
    builder.into_tree().ok_or_else(|| missing_tree(grammar))
}

pub fn parse_str_to_simplified_tree(
    grammar: &GrammarTable,
    text: &str,
) -> Result<TreeNode, ParseError> {
    let mut builder = SimplifiedTreeBuilder::new();
    parse_str::<TreeNode, _>(grammar, text, &mut builder)?;
    builder.into_tree().ok_or_else(|| missing_tree(grammar))
}

pub fn parse_path_to_tree(
    grammar: &GrammarTable,
    path: &Path,
    options: &ParseOptions,
) -> Result<TreeNode> {
    let mut builder = TreeBuilder::new();
    parse_path(grammar, path, options, &mut builder)?;
    builder
        .into_tree()
        .ok_or_else(|| anyhow!("{}: accepted without a tree", path.display()))
}

pub fn parse_path_to_simplified_tree(
    grammar: &GrammarTable,
    path: &Path,
    options: &ParseOptions,
) -> Result<TreeNode> {
    let mut builder = SimplifiedTreeBuilder::new();
    parse_path(grammar, path, options, &mut builder)?;
    builder
        .into_tree()
        .ok_or_else(|| anyhow!("{}: accepted without a tree", path.display()))
}

fn parse_path<H>(
    grammar: &GrammarTable,
    path: &Path,
    options: &ParseOptions,
    handler: &mut H,
) -> Result<()>
where
    H: EventHandler<TreeNode>,
{
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_reader::<_, TreeNode, _>(grammar, BufReader::new(file), options, handler).map_err(|e| {
        let msg = e.describe(grammar);
        anyhow::Error::new(e).context(format!("parsing {}: {msg}", path.display()))
    })
}

fn missing_tree(grammar: &GrammarTable) -> ParseError {
    ParseError {
        kind: ParseErrorKind::Internal,
        position: Default::default(),
        state: grammar.lalr_init(),
        token: None,
        expected: Vec::new(),
        detail: Some("accepted without a tree".to_string()),
    }
}
