// src/grammar/mod.rs
//! Loaded grammar tables: the linked entity arena the lexer and parser run on.
//!
//! A table is read in two phases. [`raw`] decodes records into [`RawGrammar`]
//! with plain `u16` cross references; [`link`](raw::RawGrammar::link) checks
//! every reference and moves the records into index-addressed arenas keyed by
//! the typed ids below. The analyses in [`analysis`] then run once over the
//! linked arenas.

pub mod analysis;
pub mod dump;
pub mod egt;
pub mod io;
pub mod raw;

use std::{fmt, path::Path};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub use io::{load_json_bytes, save_json};
pub use raw::RawGrammar;

use crate::error::TableError;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u16);

        impl $name {
            #[inline]
            pub fn idx(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`Symbol`].
    SymbolId
);
arena_id!(
    /// Index of a [`CharacterSet`].
    CharSetId
);
arena_id!(
    /// Index of a [`SymbolGroup`].
    GroupId
);
arena_id!(
    /// Index of a [`Production`].
    ProductionId
);
arena_id!(
    /// Index of a [`DfaState`].
    DfaStateId
);
arena_id!(
    /// Index of a [`LalrState`].
    LalrStateId
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub index: u16,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SymbolKind {
    NonTerminal = 0,
    Terminal = 1,
    Noise = 2,
    EndOfFile = 3,
    GroupStart = 4,
    GroupEnd = 5,
    /// Legacy line-comment kind; still present in old tables.
    Decremented = 6,
    Error = 7,
}

impl SymbolKind {
    pub fn from_raw(v: u16) -> Option<Self> {
        use SymbolKind::*;
        Some(match v {
            0 => NonTerminal,
            1 => Terminal,
            2 => Noise,
            3 => EndOfFile,
            4 => GroupStart,
            5 => GroupEnd,
            6 => Decremented,
            7 => Error,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        use SymbolKind::*;
        match self {
            NonTerminal => "NonTerminal",
            Terminal => "Terminal",
            Noise => "Noise",
            EndOfFile => "EndOfFile",
            GroupStart => "GroupStart",
            GroupEnd => "GroupEnd",
            Decremented => "Decremented",
            Error => "Error",
        }
    }

    /// Kinds that count as "expected" input when reporting a syntax error.
    pub fn is_expectable(self) -> bool {
        matches!(
            self,
            SymbolKind::Terminal
                | SymbolKind::EndOfFile
                | SymbolKind::GroupStart
                | SymbolKind::GroupEnd
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub index: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Every match of this terminal is the same literal text.
    pub single_lexeme: bool,
}

impl Symbol {
    /// The id string used for lookups: `<Name>`, `Name` or `(Name)`.
    pub fn id(&self) -> String {
        match self.kind {
            SymbolKind::NonTerminal => format!("<{}>", self.name),
            SymbolKind::Terminal => self.name.clone(),
            _ => format!("({})", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSet {
    pub index: CharSetId,
    pub plane: u16,
    /// Inclusive `(start, end)` offsets within `plane`.
    pub ranges: Vec<(u16, u16)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceMode {
    /// Group content is consumed one whole token at a time.
    Token,
    /// Group content is consumed one character at a time.
    Character,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndingMode {
    /// The end delimiter is left in the input.
    Open,
    /// The end delimiter becomes part of the group's lexeme.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolGroup {
    pub index: GroupId,
    pub name: String,
    pub container: SymbolId,
    pub start: SymbolId,
    pub end: SymbolId,
    pub advance_mode: AdvanceMode,
    pub ending_mode: EndingMode,
    pub nesting: Vec<GroupId>,
}

/// Tree-shaping switches consumed by the simplified tree builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyFlags {
    pub forward_child: bool,
    pub merge_child: bool,
    pub listify_recursion: bool,
    pub remove_single_lexeme: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub index: ProductionId,
    pub head: SymbolId,
    pub handles: Vec<SymbolId>,
    pub flags: SimplifyFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfaEdge {
    pub charset: CharSetId,
    pub target: DfaStateId,
}

/// What the lexer does with a character that falls into a dispatch range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfaOutcome {
    Goto(DfaStateId),
    /// Self-loop on an accepting state: consume and extend the match.
    LoopAccepting,
    /// Self-loop on a non-accepting state: consume and keep scanning.
    LoopNonAccepting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchEntry {
    pub lo: u32,
    pub hi: u32,
    pub outcome: DfaOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfaState {
    pub index: DfaStateId,
    pub accept: Option<SymbolId>,
    pub edges: Vec<DfaEdge>,
    /// Edges flattened to codepoint ranges, sorted by `lo`.
    pub dispatch: Vec<DispatchEntry>,
}

impl DfaState {
    /// Finds the outcome for codepoint `c`, if any edge covers it.
    #[inline]
    pub fn next(&self, c: u32) -> Option<DfaOutcome> {
        let i = self.dispatch.partition_point(|e| e.lo <= c);
        if i == 0 {
            return None;
        }
        let e = &self.dispatch[i - 1];
        (c <= e.hi).then_some(e.outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(LalrStateId),
    Reduce(ProductionId),
    Goto(LalrStateId),
    Accept,
}

impl Action {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Action::Shift(_) => "Shift",
            Action::Reduce(_) => "Reduce",
            Action::Goto(_) => "Goto",
            Action::Accept => "Accept",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LalrAction {
    pub symbol: SymbolId,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LalrState {
    pub index: LalrStateId,
    /// Sorted by symbol, at most one entry per symbol.
    pub actions: Vec<LalrAction>,
}

impl LalrState {
    #[inline]
    pub fn action(&self, symbol: SymbolId) -> Option<Action> {
        self.actions
            .binary_search_by_key(&symbol, |a| a.symbol)
            .ok()
            .map(|i| self.actions[i].action)
    }
}

/// A fully linked and analysed grammar table.
///
/// Read-only during a parse; the only post-load mutation is adjusting
/// [`SimplifyFlags`] through [`GrammarTable::production_flags_mut`], which
/// needs `&mut self` and therefore cannot race a parser holding `&self`.
#[derive(Debug, Clone)]
pub struct GrammarTable {
    pub(crate) properties: Vec<Property>,
    pub(crate) charsets: Vec<CharacterSet>,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) groups: Vec<SymbolGroup>,
    pub(crate) productions: Vec<Production>,
    pub(crate) dfa_states: Vec<DfaState>,
    pub(crate) lalr_states: Vec<LalrState>,
    pub(crate) dfa_init: DfaStateId,
    pub(crate) lalr_init: LalrStateId,
    pub(crate) eof: SymbolId,
    pub(crate) error: SymbolId,
    pub(crate) symbol_lookup: HashMap<String, SymbolId>,
    pub(crate) production_lookup: HashMap<String, ProductionId>,
    pub(crate) group_by_start: HashMap<SymbolId, GroupId>,
}

impl GrammarTable {
    /// Reads a binary table from `reader`.
    pub fn load(mut reader: impl std::io::Read) -> Result<Self, TableError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    pub fn load_bytes(data: &[u8]) -> Result<Self, TableError> {
        egt::read_egt(data)?.link()
    }

    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        log::debug!("loading grammar table from {}", path.display());
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }
    pub fn charsets(&self) -> &[CharacterSet] {
        &self.charsets
    }
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
    pub fn groups(&self) -> &[SymbolGroup] {
        &self.groups
    }
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }
    pub fn dfa_states(&self) -> &[DfaState] {
        &self.dfa_states
    }
    pub fn lalr_states(&self) -> &[LalrState] {
        &self.lalr_states
    }

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.idx()]
    }
    #[inline]
    pub fn charset(&self, id: CharSetId) -> &CharacterSet {
        &self.charsets[id.idx()]
    }
    #[inline]
    pub fn group(&self, id: GroupId) -> &SymbolGroup {
        &self.groups[id.idx()]
    }
    #[inline]
    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.idx()]
    }
    #[inline]
    pub fn dfa_state(&self, id: DfaStateId) -> &DfaState {
        &self.dfa_states[id.idx()]
    }
    #[inline]
    pub fn lalr_state(&self, id: LalrStateId) -> &LalrState {
        &self.lalr_states[id.idx()]
    }

    pub fn dfa_init(&self) -> DfaStateId {
        self.dfa_init
    }
    pub fn lalr_init(&self) -> LalrStateId {
        self.lalr_init
    }
    pub fn eof_symbol(&self) -> SymbolId {
        self.eof
    }
    pub fn error_symbol(&self) -> SymbolId {
        self.error
    }

    /// Looks a symbol up by its id string, e.g. `"<Expr>"` or `"Num"`.
    pub fn symbol_by_id(&self, id: &str) -> Option<SymbolId> {
        self.symbol_lookup.get(id).copied()
    }

    /// Looks a production up by its id string, e.g. `"<E> ::= <E> + <M>"`.
    pub fn production_by_id(&self, id: &str) -> Option<ProductionId> {
        self.production_lookup.get(id).copied()
    }

    /// The group opened by `start`, if `start` is a group-start symbol.
    pub fn group_for_start(&self, start: SymbolId) -> Option<GroupId> {
        self.group_by_start.get(&start).copied()
    }

    /// The `<Head> ::= a b c` id string of a production.
    pub fn production_id(&self, id: ProductionId) -> String {
        let p = self.production(id);
        let mut s = format!("{} ::=", self.symbol(p.head).id());
        for &h in &p.handles {
            s.push(' ');
            s.push_str(&self.symbol(h).id());
        }
        s
    }

    /// Mutable access to a production's tree-shaping flags. Only call this
    /// between parses.
    pub fn production_flags_mut(&mut self, id: ProductionId) -> &mut SimplifyFlags {
        &mut self.productions[id.idx()].flags
    }

    /// Toggles `merge_child` on the production with id string `id`.
    pub fn set_merge_child(&mut self, id: &str, on: bool) -> Result<(), TableError> {
        let pid = self
            .production_by_id(id)
            .ok_or_else(|| TableError::UnknownProduction(id.to_string()))?;
        self.production_flags_mut(pid).merge_child = on;
        Ok(())
    }
}
