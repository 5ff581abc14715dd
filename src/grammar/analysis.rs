// src/grammar/analysis.rs
// Passes that run once over a freshly linked table.

use std::collections::VecDeque;

use hashbrown::HashMap;

use super::{DfaOutcome, DispatchEntry, GrammarTable, SimplifyFlags, SymbolId, SymbolKind};

/// Flattens each DFA state's edges into a sorted codepoint dispatch table.
pub(crate) fn build_dfa_dispatch(table: &mut GrammarTable) {
    for si in 0..table.dfa_states.len() {
        let state = &table.dfa_states[si];
        let mut dispatch = Vec::new();
        for edge in &state.edges {
            let outcome = if edge.target == state.index {
                if state.accept.is_some() {
                    DfaOutcome::LoopAccepting
                } else {
                    DfaOutcome::LoopNonAccepting
                }
            } else {
                DfaOutcome::Goto(edge.target)
            };
            let cs = &table.charsets[edge.charset.idx()];
            let base = cs.plane as u32 * 0x10000;
            dispatch.extend(cs.ranges.iter().map(|&(lo, hi)| DispatchEntry {
                lo: base + lo as u32,
                hi: base + hi as u32,
                outcome,
            }));
        }
        dispatch.sort_by_key(|e| e.lo);
        table.dfa_states[si].dispatch = dispatch;
    }
}

/// Marks terminals whose only accepting DFA state is reached by exactly one
/// acyclic path from the initial state.
pub(crate) fn mark_single_lexeme_symbols(table: &mut GrammarTable) {
    const MULTI: u8 = 2;
    let n = table.dfa_states.len();
    // 0 = unseen, 1 = one path, 2 = many paths
    let mut paths = vec![0u8; n];
    let init = table.dfa_init.idx();
    paths[init] = 1;

    let mut queue = VecDeque::from([init]);
    while let Some(s) = queue.pop_front() {
        for edge in &table.dfa_states[s].edges {
            let t = edge.target.idx();
            match paths[t] {
                1 => {
                    // A second way in: everything downstream is ambiguous too.
                    let mut multi = VecDeque::from([t]);
                    while let Some(m) = multi.pop_front() {
                        paths[m] = MULTI;
                        for e in &table.dfa_states[m].edges {
                            if paths[e.target.idx()] != MULTI {
                                multi.push_back(e.target.idx());
                            }
                        }
                    }
                }
                0 => {
                    paths[t] = 1;
                    queue.push_back(t);
                }
                _ => {}
            }
        }
    }

    let mut tally: HashMap<SymbolId, u32> = HashMap::new();
    for (state, &count) in table.dfa_states.iter().zip(&paths) {
        if count == 1 {
            if let Some(sym) = state.accept {
                *tally.entry(sym).or_insert(0) += 1;
            }
        }
    }
    for sym in &mut table.symbols {
        sym.single_lexeme = tally.get(&sym.index) == Some(&1);
    }
    log::debug!(
        "single-lexeme symbols: {:?}",
        table
            .symbols
            .iter()
            .filter(|s| s.single_lexeme)
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
    );
}

/// Derives each production's default tree-shaping flags.
pub(crate) fn set_simplify_flags(table: &mut GrammarTable) {
    for pi in 0..table.productions.len() {
        let p = &table.productions[pi];
        let mut nts = 0usize;
        let mut ts = 0usize;
        let mut its = 0usize;
        let mut recursive = false;
        for &h in &p.handles {
            let sym = &table.symbols[h.idx()];
            match sym.kind {
                SymbolKind::NonTerminal => {
                    nts += 1;
                    recursive |= h == p.head;
                }
                SymbolKind::Terminal => {
                    ts += 1;
                    if !sym.single_lexeme {
                        its += 1;
                    }
                }
                _ => {}
            }
        }
        table.productions[pi].flags = SimplifyFlags {
            forward_child: (nts == 1 && ts == 0) || (nts == 0 && its == 1) || (nts == 0 && ts == 1),
            merge_child: false,
            listify_recursion: recursive,
            remove_single_lexeme: (nts > 0 || its > 0) && ts > its,
        };
    }
}
