// src/grammar/raw.rs
//! Unlinked table records, as decoded from (or written to) a table file.
//!
//! Cross references are plain `u16` indices here. [`RawGrammar::link`] is the
//! only place they are checked and turned into arena ids.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{
    Action, AdvanceMode, CharSetId, CharacterSet, DfaEdge, DfaState, DfaStateId, EndingMode,
    GrammarTable, GroupId, LalrAction, LalrState, LalrStateId, Production, ProductionId, Property,
    SimplifyFlags, Symbol, SymbolGroup, SymbolId, SymbolKind, analysis,
};
use crate::error::TableError;

pub const ACTION_SHIFT: u16 = 1;
pub const ACTION_REDUCE: u16 = 2;
pub const ACTION_GOTO: u16 = 3;
pub const ACTION_ACCEPT: u16 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub symbols: u16,
    pub charsets: u16,
    pub productions: u16,
    pub dfa_states: u16,
    pub lalr_states: u16,
    pub groups: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProperty {
    pub index: u16,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCharSet {
    pub index: u16,
    pub plane: u16,
    pub ranges: Vec<(u16, u16)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSymbol {
    pub index: u16,
    pub name: String,
    pub kind: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGroup {
    pub index: u16,
    pub name: String,
    pub container: u16,
    pub start: u16,
    pub end: u16,
    pub advance_mode: u16,
    pub ending_mode: u16,
    pub nesting: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProduction {
    pub index: u16,
    pub head: u16,
    pub handles: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDfaEdge {
    pub charset: u16,
    pub target: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDfaState {
    pub index: u16,
    pub accept: Option<u16>,
    pub edges: Vec<RawDfaEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAction {
    pub symbol: u16,
    pub kind: u16,
    pub target: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLalrState {
    pub index: u16,
    pub actions: Vec<RawAction>,
}

/// Every record of a table, in file order, before linking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrammar {
    pub properties: Vec<RawProperty>,
    pub counts: Option<TableCounts>,
    pub charsets: Vec<RawCharSet>,
    pub symbols: Vec<RawSymbol>,
    pub groups: Vec<RawGroup>,
    pub productions: Vec<RawProduction>,
    /// `(dfa, lalr)` initial states.
    pub initial: Option<(u16, u16)>,
    pub dfa_states: Vec<RawDfaState>,
    pub lalr_states: Vec<RawLalrState>,
}

/// Places records into a dense arena by their own index.
fn arrange<R, T>(
    kind: &'static str,
    count: u16,
    records: &[R],
    index_of: impl Fn(&R) -> u16,
    mut build: impl FnMut(&R) -> Result<T, TableError>,
) -> Result<Vec<T>, TableError> {
    let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();
    for r in records {
        let index = index_of(r);
        let slot = slots
            .get_mut(index as usize)
            .ok_or(TableError::Dangling { kind, index })?;
        if slot.is_some() {
            return Err(TableError::DuplicateIndex { kind, index });
        }
        *slot = Some(build(r)?);
    }
    // Counts were already checked, so a hole means a duplicate took its place.
    slots
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            s.ok_or(TableError::Dangling {
                kind,
                index: i as u16,
            })
        })
        .collect()
}

/// `len` as a 16-bit table count.
pub(crate) fn section_len(kind: &'static str, len: usize) -> Result<u16, TableError> {
    u16::try_from(len).map_err(|_| TableError::TooManyEntries { kind, len })
}

fn resolve(kind: &'static str, index: u16, len: usize) -> Result<u16, TableError> {
    if (index as usize) < len {
        Ok(index)
    } else {
        Err(TableError::Dangling { kind, index })
    }
}

impl RawGrammar {
    pub fn read_counts(&self) -> Result<TableCounts, TableError> {
        Ok(TableCounts {
            symbols: section_len("symbol", self.symbols.len())?,
            charsets: section_len("charset", self.charsets.len())?,
            productions: section_len("production", self.productions.len())?,
            dfa_states: section_len("dfa state", self.dfa_states.len())?,
            lalr_states: section_len("lalr state", self.lalr_states.len())?,
            groups: section_len("group", self.groups.len())?,
        })
    }

    /// Fills `counts` from the records actually present. A section too large
    /// to count leaves `counts` unset; `link` reports it.
    pub fn with_counts(mut self) -> Self {
        self.counts = self.read_counts().ok();
        self
    }

    /// Resolves every raw index and runs the post-link analyses.
    pub fn link(&self) -> Result<GrammarTable, TableError> {
        let read = self.read_counts()?;
        let declared = self.counts.ok_or(TableError::MissingRecord("table counts"))?;
        if declared != read {
            return Err(TableError::CountMismatch { declared, read });
        }
        let (dfa_init, lalr_init) = self
            .initial
            .ok_or(TableError::MissingRecord("initial states"))?;

        let n_sym = declared.symbols as usize;
        let n_cs = declared.charsets as usize;
        let n_prod = declared.productions as usize;
        let n_dfa = declared.dfa_states as usize;
        let n_lalr = declared.lalr_states as usize;
        let n_grp = declared.groups as usize;

        let charsets = arrange("charset", declared.charsets, &self.charsets, |r| r.index, |r| {
            Ok(CharacterSet {
                index: CharSetId(r.index),
                plane: r.plane,
                ranges: r.ranges.clone(),
            })
        })?;

        let symbols = arrange("symbol", declared.symbols, &self.symbols, |r| r.index, |r| {
            let kind = SymbolKind::from_raw(r.kind).ok_or_else(|| TableError::BadRecord {
                record: "symbol",
                reason: format!("unknown symbol kind {}", r.kind),
            })?;
            Ok(Symbol {
                index: SymbolId(r.index),
                name: r.name.clone(),
                kind,
                single_lexeme: false,
            })
        })?;

        let groups = arrange("group", declared.groups, &self.groups, |r| r.index, |r| {
            let advance_mode = match r.advance_mode {
                0 => AdvanceMode::Token,
                1 => AdvanceMode::Character,
                v => {
                    return Err(TableError::BadRecord {
                        record: "group",
                        reason: format!("unknown advance mode {v}"),
                    });
                }
            };
            let ending_mode = match r.ending_mode {
                0 => EndingMode::Open,
                1 => EndingMode::Closed,
                v => {
                    return Err(TableError::BadRecord {
                        record: "group",
                        reason: format!("unknown ending mode {v}"),
                    });
                }
            };
            let nesting = r
                .nesting
                .iter()
                .map(|&g| resolve("group", g, n_grp).map(GroupId))
                .collect::<Result<_, _>>()?;
            Ok(SymbolGroup {
                index: GroupId(r.index),
                name: r.name.clone(),
                container: SymbolId(resolve("symbol", r.container, n_sym)?),
                start: SymbolId(resolve("symbol", r.start, n_sym)?),
                end: SymbolId(resolve("symbol", r.end, n_sym)?),
                advance_mode,
                ending_mode,
                nesting,
            })
        })?;

        let productions = arrange(
            "production",
            declared.productions,
            &self.productions,
            |r| r.index,
            |r| {
                let handles = r
                    .handles
                    .iter()
                    .map(|&h| resolve("symbol", h, n_sym).map(SymbolId))
                    .collect::<Result<_, _>>()?;
                Ok(Production {
                    index: ProductionId(r.index),
                    head: SymbolId(resolve("symbol", r.head, n_sym)?),
                    handles,
                    flags: SimplifyFlags::default(),
                })
            },
        )?;

        let dfa_states = arrange("dfa state", declared.dfa_states, &self.dfa_states, |r| r.index, |r| {
            let accept = r
                .accept
                .map(|a| resolve("symbol", a, n_sym).map(SymbolId))
                .transpose()?;
            let edges = r
                .edges
                .iter()
                .map(|e| -> Result<DfaEdge, TableError> {
                    Ok(DfaEdge {
                        charset: CharSetId(resolve("charset", e.charset, n_cs)?),
                        target: DfaStateId(resolve("dfa state", e.target, n_dfa)?),
                    })
                })
                .collect::<Result<_, _>>()?;
            Ok(DfaState {
                index: DfaStateId(r.index),
                accept,
                edges,
                dispatch: Vec::new(),
            })
        })?;

        let lalr_states = arrange(
            "lalr state",
            declared.lalr_states,
            &self.lalr_states,
            |r| r.index,
            |r| {
                let mut actions = Vec::with_capacity(r.actions.len());
                for a in &r.actions {
                    let symbol = SymbolId(resolve("symbol", a.symbol, n_sym)?);
                    let action = match a.kind {
                        ACTION_SHIFT => {
                            Action::Shift(LalrStateId(resolve("lalr state", a.target, n_lalr)?))
                        }
                        ACTION_REDUCE => {
                            Action::Reduce(ProductionId(resolve("production", a.target, n_prod)?))
                        }
                        ACTION_GOTO => {
                            Action::Goto(LalrStateId(resolve("lalr state", a.target, n_lalr)?))
                        }
                        ACTION_ACCEPT => Action::Accept,
                        v => {
                            return Err(TableError::BadRecord {
                                record: "lalr state",
                                reason: format!("unknown action kind {v}"),
                            });
                        }
                    };
                    actions.push(LalrAction { symbol, action });
                }
                actions.sort_by_key(|a| a.symbol);
                if let Some(w) = actions.windows(2).find(|w| w[0].symbol == w[1].symbol) {
                    return Err(TableError::DuplicateAction {
                        state: r.index,
                        symbol: w[0].symbol.0,
                    });
                }
                Ok(LalrState {
                    index: LalrStateId(r.index),
                    actions,
                })
            },
        )?;

        let properties = self
            .properties
            .iter()
            .map(|p| Property {
                index: p.index,
                name: p.name.clone(),
                value: p.value.clone(),
            })
            .collect();

        let eof = unique_symbol(&symbols, SymbolKind::EndOfFile, "end-of-file")?;
        let error = unique_symbol(&symbols, SymbolKind::Error, "error")?;

        let mut table = GrammarTable {
            properties,
            charsets,
            symbols,
            groups,
            productions,
            dfa_states,
            lalr_states,
            dfa_init: DfaStateId(resolve("dfa state", dfa_init, n_dfa)?),
            lalr_init: LalrStateId(resolve("lalr state", lalr_init, n_lalr)?),
            eof,
            error,
            symbol_lookup: HashMap::new(),
            production_lookup: HashMap::new(),
            group_by_start: HashMap::new(),
        };

        for s in &table.symbols {
            table.symbol_lookup.insert(s.id(), s.index);
        }
        for i in 0..table.productions.len() {
            let id = ProductionId(i as u16);
            let key = table.production_id(id);
            table.production_lookup.insert(key, id);
        }
        for g in &table.groups {
            table.group_by_start.entry(g.start).or_insert(g.index);
        }

        analysis::build_dfa_dispatch(&mut table);
        analysis::mark_single_lexeme_symbols(&mut table);
        analysis::set_simplify_flags(&mut table);

        log::debug!(
            "linked grammar table: {} symbols, {} charsets, {} productions, {} dfa states, {} lalr states, {} groups",
            n_sym,
            n_cs,
            n_prod,
            n_dfa,
            n_lalr,
            n_grp
        );
        Ok(table)
    }
}

fn unique_symbol(
    symbols: &[Symbol],
    kind: SymbolKind,
    what: &'static str,
) -> Result<SymbolId, TableError> {
    let mut found = symbols.iter().filter(|s| s.kind == kind);
    match (found.next(), found.next()) {
        (Some(s), None) => Ok(s.index),
        _ => Err(TableError::SpecialSymbol(what)),
    }
}

impl GrammarTable {
    /// Converts the linked table back into records, e.g. for re-serialization.
    pub fn to_raw(&self) -> RawGrammar {
        RawGrammar {
            properties: self
                .properties
                .iter()
                .map(|p| RawProperty {
                    index: p.index,
                    name: p.name.clone(),
                    value: p.value.clone(),
                })
                .collect(),
            counts: None,
            charsets: self
                .charsets
                .iter()
                .map(|c| RawCharSet {
                    index: c.index.0,
                    plane: c.plane,
                    ranges: c.ranges.clone(),
                })
                .collect(),
            symbols: self
                .symbols
                .iter()
                .map(|s| RawSymbol {
                    index: s.index.0,
                    name: s.name.clone(),
                    kind: s.kind as u16,
                })
                .collect(),
            groups: self
                .groups
                .iter()
                .map(|g| RawGroup {
                    index: g.index.0,
                    name: g.name.clone(),
                    container: g.container.0,
                    start: g.start.0,
                    end: g.end.0,
                    advance_mode: match g.advance_mode {
                        AdvanceMode::Token => 0,
                        AdvanceMode::Character => 1,
                    },
                    ending_mode: match g.ending_mode {
                        EndingMode::Open => 0,
                        EndingMode::Closed => 1,
                    },
                    nesting: g.nesting.iter().map(|n| n.0).collect(),
                })
                .collect(),
            productions: self
                .productions
                .iter()
                .map(|p| RawProduction {
                    index: p.index.0,
                    head: p.head.0,
                    handles: p.handles.iter().map(|h| h.0).collect(),
                })
                .collect(),
            initial: Some((self.dfa_init.0, self.lalr_init.0)),
            dfa_states: self
                .dfa_states
                .iter()
                .map(|s| RawDfaState {
                    index: s.index.0,
                    accept: s.accept.map(|a| a.0),
                    edges: s
                        .edges
                        .iter()
                        .map(|e| RawDfaEdge {
                            charset: e.charset.0,
                            target: e.target.0,
                        })
                        .collect(),
                })
                .collect(),
            lalr_states: self
                .lalr_states
                .iter()
                .map(|s| RawLalrState {
                    index: s.index.0,
                    actions: s
                        .actions
                        .iter()
                        .map(|a| {
                            let (kind, target) = match a.action {
                                Action::Shift(t) => (ACTION_SHIFT, t.0),
                                Action::Reduce(p) => (ACTION_REDUCE, p.0),
                                Action::Goto(t) => (ACTION_GOTO, t.0),
                                Action::Accept => (ACTION_ACCEPT, 0),
                            };
                            RawAction {
                                symbol: a.symbol.0,
                                kind,
                                target,
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
        .with_counts()
    }
}
