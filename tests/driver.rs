//! One-call driver helpers.

mod common;

use std::io::{self, Read};

use common::{group_grammar, operator_grammar};
use lalrpt::{
    Encoding, GrammarTable, ParseErrorKind, ParseOptions, ProductionHandler, Step, TreeBuilder,
    TreeNode, parse_reader, parse_str,
};

#[test]
fn closure_handler_counts_events() {
    let g = operator_grammar();
    let (mut shifts, mut reduces) = (0, 0);
    let mut handler = |_g: &GrammarTable, step: Step<'_, ()>| match step {
        Step::Shift(_) => shifts += 1,
        Step::Reduce(_) => reduces += 1,
        _ => {}
    };
    parse_str::<(), _>(&g, "-(1+2)-3*4", &mut handler).unwrap();
    assert_eq!((shifts, reduces), (10, 19));
}

#[test]
fn reader_options_are_honored() {
    let g = operator_grammar();
    let mut reduces = 0;
    let mut handler = |_g: &GrammarTable, step: Step<'_, ()>| {
        if let Step::Reduce(_) = step {
            reduces += 1;
        }
    };
    let opts = ParseOptions {
        trim_reductions: true,
        chunk_size: 2,
        ..ParseOptions::default()
    };
    parse_reader::<_, (), _>(&g, "-(1+2)-3*4".as_bytes(), &opts, &mut handler).unwrap();
    assert_eq!(reduces, 9);
}

#[test]
fn latin1_reader_builds_a_tree() {
    let g = group_grammar();
    let opts = ParseOptions {
        encoding: Encoding::Latin1,
        ..ParseOptions::default()
    };
    let mut builder = TreeBuilder::new();
    let bytes: &[u8] = b"a /* \xe9 */ true";
    parse_reader::<_, TreeNode, _>(&g, bytes, &opts, &mut builder).unwrap();
    let tree = builder.into_tree().unwrap();
    assert_eq!(tree.lexemes(), vec!["a", "true"]);
}

#[test]
fn evaluation_through_parse_str() {
    let g = group_grammar();
    let mut h = ProductionHandler::new()
        .on(&g, "<Item> ::= Id", |c| c[0].token().map_or(0, |t| t.lexeme.len()))
        .unwrap()
        .on(&g, "<Items> ::= <Items> <Item>", |c| {
            c.iter().filter_map(|c| c.value()).sum()
        })
        .unwrap();
    parse_str(&g, "abc de f", &mut h).unwrap();
    assert_eq!(h.into_value(), Some(6));
}

/// Yields `good`, then fails.
struct Broken<'a> {
    good: &'a [u8],
}

impl Read for Broken<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.good.is_empty() {
            return Err(io::Error::other("disk on fire"));
        }
        let n = self.good.len().min(buf.len());
        buf[..n].copy_from_slice(&self.good[..n]);
        self.good = &self.good[n..];
        Ok(n)
    }
}

#[test]
fn read_failure_is_an_input_error() {
    let g = operator_grammar();
    let mut handler = |_g: &GrammarTable, _step: Step<'_, ()>| {};
    let err = parse_reader::<_, (), _>(&g, Broken { good: b"1+" }, &ParseOptions::default(), &mut handler)
        .unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Input);
    assert!(err.token.is_none());
    assert!(err.describe(&g).contains("disk on fire"));
}
