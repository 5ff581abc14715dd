//! Fixture grammars, built as raw records and serialized to the binary table
//! format so every test goes through the real loader.
#![allow(dead_code)]

use lalrpt::{
    GrammarTable,
    grammar::raw::{
        ACTION_ACCEPT, ACTION_GOTO, ACTION_REDUCE, ACTION_SHIFT, RawAction, RawCharSet, RawDfaEdge,
        RawDfaState, RawGrammar, RawGroup, RawLalrState, RawProduction, RawProperty, RawSymbol,
    },
};

pub fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

fn props(name: &str) -> Vec<RawProperty> {
    [("Name", name), ("Author", "lalrpt")]
        .iter()
        .enumerate()
        .map(|(i, (n, v))| RawProperty {
            index: i as u16,
            name: n.to_string(),
            value: v.to_string(),
        })
        .collect()
}

fn symbols(list: &[(&str, u16)]) -> Vec<RawSymbol> {
    list.iter()
        .enumerate()
        .map(|(i, &(name, kind))| RawSymbol {
            index: i as u16,
            name: name.to_string(),
            kind,
        })
        .collect()
}

fn charsets(list: &[&[(u16, u16)]]) -> Vec<RawCharSet> {
    list.iter()
        .enumerate()
        .map(|(i, ranges)| RawCharSet {
            index: i as u16,
            plane: 0,
            ranges: ranges.to_vec(),
        })
        .collect()
}

fn productions(list: &[(u16, &[u16])]) -> Vec<RawProduction> {
    list.iter()
        .enumerate()
        .map(|(i, &(head, handles))| RawProduction {
            index: i as u16,
            head,
            handles: handles.to_vec(),
        })
        .collect()
}

fn dfa(list: &[(Option<u16>, &[(u16, u16)])]) -> Vec<RawDfaState> {
    list.iter()
        .enumerate()
        .map(|(i, &(accept, edges))| RawDfaState {
            index: i as u16,
            accept,
            edges: edges
                .iter()
                .map(|&(charset, target)| RawDfaEdge { charset, target })
                .collect(),
        })
        .collect()
}

/// Builds one LALR state's actions.
#[derive(Default)]
struct Acts(Vec<RawAction>);

impl Acts {
    fn push(mut self, symbol: u16, kind: u16, target: u16) -> Self {
        self.0.push(RawAction {
            symbol,
            kind,
            target,
        });
        self
    }
    fn shift(self, symbol: u16, state: u16) -> Self {
        self.push(symbol, ACTION_SHIFT, state)
    }
    fn goto(self, symbol: u16, state: u16) -> Self {
        self.push(symbol, ACTION_GOTO, state)
    }
    fn accept(self, symbol: u16) -> Self {
        self.push(symbol, ACTION_ACCEPT, 0)
    }
    fn reduce(mut self, on: &[u16], production: u16) -> Self {
        for &s in on {
            self = self.push(s, ACTION_REDUCE, production);
        }
        self
    }
}

fn lalr(states: Vec<Acts>) -> Vec<RawLalrState> {
    states
        .into_iter()
        .enumerate()
        .map(|(i, a)| RawLalrState {
            index: i as u16,
            actions: a.0,
        })
        .collect()
}

// -------------------- Operator grammar --------------------
//
//   <E> ::= <E> + <M> | <E> - <M> | <M>
//   <M> ::= <M> * <N> | <M> / <N> | <N>
//   <N> ::= - <V> | <V>
//   <V> ::= Num | ( <E> )

pub mod op {
    pub const EOF: u16 = 0;
    pub const ERROR: u16 = 1;
    pub const WHITESPACE: u16 = 2;
    pub const MINUS: u16 = 3;
    pub const LPAREN: u16 = 4;
    pub const RPAREN: u16 = 5;
    pub const TIMES: u16 = 6;
    pub const DIVIDE: u16 = 7;
    pub const PLUS: u16 = 8;
    pub const NUM: u16 = 9;
    pub const E: u16 = 10;
    pub const M: u16 = 11;
    pub const N: u16 = 12;
    pub const V: u16 = 13;
}

pub fn operator_raw() -> RawGrammar {
    use op::*;
    // Lookaheads that follow a complete <M>/<N>/<V>.
    const ALL: &[u16] = &[EOF, MINUS, RPAREN, TIMES, DIVIDE, PLUS];
    // Lookaheads that follow a complete <E>.
    const ADD: &[u16] = &[EOF, MINUS, RPAREN, PLUS];

    let operand = |m: u16, n: u16| {
        Acts::default()
            .shift(MINUS, 1)
            .shift(LPAREN, 2)
            .shift(NUM, 3)
            .goto(M, m)
            .goto(N, n)
            .goto(V, 7)
    };

    RawGrammar {
        properties: props("Operator"),
        counts: None,
        charsets: charsets(&[
            &[(9, 10), (13, 13), (32, 32)],
            &[(45, 45)],
            &[(40, 40)],
            &[(41, 41)],
            &[(42, 42)],
            &[(47, 47)],
            &[(43, 43)],
            &[(48, 57)],
        ]),
        symbols: symbols(&[
            ("EOF", 3),
            ("Error", 7),
            ("Whitespace", 2),
            ("-", 1),
            ("(", 1),
            (")", 1),
            ("*", 1),
            ("/", 1),
            ("+", 1),
            ("Num", 1),
            ("E", 0),
            ("M", 0),
            ("N", 0),
            ("V", 0),
        ]),
        groups: Vec::new(),
        productions: productions(&[
            (E, &[E, PLUS, M]),
            (E, &[E, MINUS, M]),
            (E, &[M]),
            (M, &[M, TIMES, N]),
            (M, &[M, DIVIDE, N]),
            (M, &[N]),
            (N, &[MINUS, V]),
            (N, &[V]),
            (V, &[NUM]),
            (V, &[LPAREN, E, RPAREN]),
        ]),
        initial: Some((0, 0)),
        dfa_states: dfa(&[
            (
                None,
                &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 7), (7, 8)],
            ),
            (Some(WHITESPACE), &[(0, 1)]),
            (Some(MINUS), &[]),
            (Some(LPAREN), &[]),
            (Some(RPAREN), &[]),
            (Some(TIMES), &[]),
            (Some(DIVIDE), &[]),
            (Some(PLUS), &[]),
            (Some(NUM), &[(7, 8)]),
        ]),
        lalr_states: lalr(vec![
            // 0
            Acts::default()
                .shift(MINUS, 1)
                .shift(LPAREN, 2)
                .shift(NUM, 3)
                .goto(E, 4)
                .goto(M, 5)
                .goto(N, 6)
                .goto(V, 7),
            // 1
            Acts::default().shift(LPAREN, 2).shift(NUM, 3).goto(V, 8),
            // 2
            Acts::default()
                .shift(MINUS, 1)
                .shift(LPAREN, 2)
                .shift(NUM, 3)
                .goto(E, 9)
                .goto(M, 5)
                .goto(N, 6)
                .goto(V, 7),
            // 3
            Acts::default().reduce(ALL, 8),
            // 4
            Acts::default()
                .accept(EOF)
                .shift(MINUS, 10)
                .shift(PLUS, 11),
            // 5
            Acts::default()
                .reduce(ADD, 2)
                .shift(TIMES, 12)
                .shift(DIVIDE, 13),
            // 6
            Acts::default().reduce(ALL, 5),
            // 7
            Acts::default().reduce(ALL, 7),
            // 8
            Acts::default().reduce(ALL, 6),
            // 9
            Acts::default()
                .shift(MINUS, 10)
                .shift(RPAREN, 14)
                .shift(PLUS, 11),
            // 10, 11
            operand(15, 6),
            operand(16, 6),
            // 12
            Acts::default()
                .shift(MINUS, 1)
                .shift(LPAREN, 2)
                .shift(NUM, 3)
                .goto(N, 17)
                .goto(V, 7),
            // 13
            Acts::default()
                .shift(MINUS, 1)
                .shift(LPAREN, 2)
                .shift(NUM, 3)
                .goto(N, 18)
                .goto(V, 7),
            // 14
            Acts::default().reduce(ALL, 9),
            // 15
            Acts::default()
                .reduce(ADD, 1)
                .shift(TIMES, 12)
                .shift(DIVIDE, 13),
            // 16
            Acts::default()
                .reduce(ADD, 0)
                .shift(TIMES, 12)
                .shift(DIVIDE, 13),
            // 17, 18
            Acts::default().reduce(ALL, 3),
            Acts::default().reduce(ALL, 4),
        ]),
    }
    .with_counts()
}

pub fn operator_bytes() -> Vec<u8> {
    operator_raw().to_egt_bytes().expect("operator grammar serializes")
}

pub fn operator_grammar() -> GrammarTable {
    GrammarTable::load_bytes(&operator_bytes()).expect("operator grammar loads")
}

// -------------------- Group grammar --------------------
//
//   <Items> ::= <Items> <Item> | <Item>
//   <Item>  ::= Id | true
//
// with nestable block comments `/* */` (character advance, closed end) and
// line comments `//` ending before the newline (token advance, open end).

pub mod gr {
    pub const EOF: u16 = 0;
    pub const ERROR: u16 = 1;
    pub const WHITESPACE: u16 = 2;
    pub const COMMENT: u16 = 3;
    pub const NEWLINE: u16 = 4;
    pub const COMMENT_START: u16 = 5;
    pub const COMMENT_END: u16 = 6;
    pub const COMMENT_LINE: u16 = 7;
    pub const ID: u16 = 8;
    pub const TRUE: u16 = 9;
    pub const ITEMS: u16 = 10;
    pub const ITEM: u16 = 11;
}

pub fn group_raw() -> RawGrammar {
    use gr::*;
    const FOLLOW: &[u16] = &[EOF, ID, TRUE];

    RawGrammar {
        properties: props("Groups"),
        counts: None,
        charsets: charsets(&[
            &[(9, 9), (13, 13), (32, 32)],
            &[(10, 10)],
            &[(47, 47)],
            &[(42, 42)],
            &[(116, 116)],
            &[(97, 115), (117, 122)],
            &[(114, 114)],
            &[(97, 113), (115, 122)],
            &[(117, 117)],
            &[(97, 116), (118, 122)],
            &[(101, 101)],
            &[(97, 100), (102, 122)],
            &[(97, 122)],
        ]),
        symbols: symbols(&[
            ("EOF", 3),
            ("Error", 7),
            ("Whitespace", 2),
            ("Comment", 2),
            ("NewLine", 2),
            ("Comment Start", 4),
            ("Comment End", 5),
            ("Comment Line", 4),
            ("Id", 1),
            ("true", 1),
            ("Items", 0),
            ("Item", 0),
        ]),
        groups: vec![
            RawGroup {
                index: 0,
                name: "Comment Block".to_string(),
                container: COMMENT,
                start: COMMENT_START,
                end: COMMENT_END,
                advance_mode: 1,
                ending_mode: 1,
                nesting: vec![0],
            },
            RawGroup {
                index: 1,
                name: "Comment Line".to_string(),
                container: COMMENT,
                start: COMMENT_LINE,
                end: NEWLINE,
                advance_mode: 0,
                ending_mode: 0,
                nesting: Vec::new(),
            },
        ],
        productions: productions(&[
            (ITEMS, &[ITEMS, ITEM]),
            (ITEMS, &[ITEM]),
            (ITEM, &[ID]),
            (ITEM, &[TRUE]),
        ]),
        initial: Some((0, 0)),
        dfa_states: dfa(&[
            (None, &[(0, 1), (1, 2), (2, 3), (3, 5), (4, 7), (5, 11)]),
            (Some(WHITESPACE), &[(0, 1)]),
            (Some(NEWLINE), &[]),
            (None, &[(3, 4), (2, 6)]),
            (Some(COMMENT_START), &[]),
            (None, &[(2, 12)]),
            (Some(COMMENT_LINE), &[]),
            (Some(ID), &[(6, 8), (7, 11)]),
            (Some(ID), &[(8, 9), (9, 11)]),
            (Some(ID), &[(10, 10), (11, 11)]),
            (Some(TRUE), &[(12, 11)]),
            (Some(ID), &[(12, 11)]),
            (Some(COMMENT_END), &[]),
        ]),
        lalr_states: lalr(vec![
            Acts::default()
                .shift(ID, 1)
                .shift(TRUE, 2)
                .goto(ITEMS, 3)
                .goto(ITEM, 4),
            Acts::default().reduce(FOLLOW, 2),
            Acts::default().reduce(FOLLOW, 3),
            Acts::default()
                .accept(EOF)
                .shift(ID, 1)
                .shift(TRUE, 2)
                .goto(ITEM, 5),
            Acts::default().reduce(FOLLOW, 1),
            Acts::default().reduce(FOLLOW, 0),
        ]),
    }
    .with_counts()
}

pub fn group_grammar() -> GrammarTable {
    GrammarTable::load_bytes(&group_raw().to_egt_bytes().expect("group grammar serializes"))
        .expect("group grammar loads")
}

pub fn sym(g: &GrammarTable, index: u16) -> lalrpt::grammar::SymbolId {
    g.symbols()[index as usize].index
}

// -------------------- List grammar --------------------
//
//   <L> ::= <L> Id | <empty>

pub mod ls {
    pub const EOF: u16 = 0;
    pub const ERROR: u16 = 1;
    pub const WHITESPACE: u16 = 2;
    pub const ID: u16 = 3;
    pub const L: u16 = 4;
}

pub fn list_raw() -> RawGrammar {
    use ls::*;

    RawGrammar {
        properties: props("List"),
        counts: None,
        charsets: charsets(&[&[(9, 10), (13, 13), (32, 32)], &[(97, 122)]]),
        symbols: symbols(&[
            ("EOF", 3),
            ("Error", 7),
            ("Whitespace", 2),
            ("Id", 1),
            ("L", 0),
        ]),
        groups: Vec::new(),
        productions: productions(&[(L, &[L, ID]), (L, &[])]),
        initial: Some((0, 0)),
        dfa_states: dfa(&[
            (None, &[(0, 1), (1, 2)]),
            (Some(WHITESPACE), &[(0, 1)]),
            (Some(ID), &[(1, 2)]),
        ]),
        lalr_states: lalr(vec![
            Acts::default().reduce(&[EOF, ID], 1).goto(L, 1),
            Acts::default().accept(EOF).shift(ID, 2),
            Acts::default().reduce(&[EOF, ID], 0),
        ]),
    }
    .with_counts()
}

pub fn list_grammar() -> GrammarTable {
    GrammarTable::load_bytes(&list_raw().to_egt_bytes().expect("list grammar serializes"))
        .expect("list grammar loads")
}

// -------------------- Literal grammar --------------------
//
// Lexer-only: numbers, floats (`12.5`) and strings (`"abc"`). The DFA passes
// through non-accepting states after `.` and inside a string.

pub mod lit {
    pub const EOF: u16 = 0;
    pub const ERROR: u16 = 1;
    pub const WHITESPACE: u16 = 2;
    pub const NUM: u16 = 3;
    pub const FLOAT: u16 = 4;
    pub const STR: u16 = 5;
    pub const VALUE: u16 = 6;
}

pub fn literal_raw() -> RawGrammar {
    use lit::*;

    RawGrammar {
        properties: props("Literals"),
        counts: None,
        charsets: charsets(&[
            &[(9, 10), (13, 13), (32, 32)],
            &[(48, 57)],
            &[(46, 46)],
            &[(34, 34)],
            &[(97, 122)],
        ]),
        symbols: symbols(&[
            ("EOF", 3),
            ("Error", 7),
            ("Whitespace", 2),
            ("Num", 1),
            ("Float", 1),
            ("Str", 1),
            ("Value", 0),
        ]),
        groups: Vec::new(),
        productions: productions(&[(VALUE, &[NUM]), (VALUE, &[FLOAT]), (VALUE, &[STR])]),
        initial: Some((0, 0)),
        dfa_states: dfa(&[
            (None, &[(0, 1), (1, 2), (3, 5)]),
            (Some(WHITESPACE), &[(0, 1)]),
            (Some(NUM), &[(1, 2), (2, 3)]),
            (None, &[(1, 4)]),
            (Some(FLOAT), &[(1, 4)]),
            // Inside a string: letters loop without accepting.
            (None, &[(4, 5), (3, 6)]),
            (Some(STR), &[]),
        ]),
        lalr_states: lalr(vec![
            Acts::default()
                .shift(NUM, 1)
                .shift(FLOAT, 3)
                .shift(STR, 4)
                .goto(VALUE, 2),
            Acts::default().reduce(&[EOF], 0),
            Acts::default().accept(EOF),
            Acts::default().reduce(&[EOF], 1),
            Acts::default().reduce(&[EOF], 2),
        ]),
    }
    .with_counts()
}

pub fn literal_grammar() -> GrammarTable {
    GrammarTable::load_bytes(&literal_raw().to_egt_bytes().expect("literal grammar serializes"))
        .expect("literal grammar loads")
}
