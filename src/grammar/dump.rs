// src/grammar/dump.rs
// Deterministic text rendering of a linked table.

use std::fmt::{self, Write};

use super::{Action, AdvanceMode, EndingMode, GrammarTable};

impl GrammarTable {
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // fmt::Write for String never fails.
        let _ = self.write_dump(&mut out);
        out
    }

    pub fn write_dump(&self, f: &mut impl Write) -> fmt::Result {
        writeln!(f, "* properties")?;
        for p in &self.properties {
            writeln!(f, "\t{}:{}={}", p.index, p.name, p.value)?;
        }
        writeln!(f)?;

        writeln!(f, "* charsets")?;
        for c in &self.charsets {
            let ranges: Vec<String> = c
                .ranges
                .iter()
                .map(|(lo, hi)| format!("({lo}, {hi})"))
                .collect();
            writeln!(f, "\t{}:P={} R=[{}]", c.index, c.plane, ranges.join(", "))?;
        }
        writeln!(f)?;

        writeln!(f, "* symbols")?;
        for s in &self.symbols {
            writeln!(f, "\t{}:{} ({})", s.index, s.name, s.kind.name())?;
        }
        writeln!(f)?;

        writeln!(f, "* symbolgroups")?;
        for g in &self.groups {
            let nesting: Vec<String> = g.nesting.iter().map(|n| n.to_string()).collect();
            writeln!(
                f,
                "\t{}:{}={} {} {} {} {} [{}]",
                g.index,
                g.name,
                self.symbol(g.container).id(),
                self.symbol(g.start).id(),
                self.symbol(g.end).id(),
                match g.advance_mode {
                    AdvanceMode::Token => "Token",
                    AdvanceMode::Character => "Character",
                },
                match g.ending_mode {
                    EndingMode::Open => "Open",
                    EndingMode::Closed => "Closed",
                },
                nesting.join(", ")
            )?;
        }
        writeln!(f)?;

        writeln!(f, "* productions")?;
        for p in &self.productions {
            writeln!(f, "\t{}:{}", p.index, self.production_id(p.index))?;
        }
        writeln!(f)?;

        writeln!(f, "* initial states")?;
        writeln!(f, "\tdfainit = {}", self.dfa_init)?;
        writeln!(f, "\tlalrinit = {}", self.lalr_init)?;
        writeln!(f)?;

        writeln!(f, "* dfastates")?;
        for s in &self.dfa_states {
            let accept = s.accept.map(|a| self.symbol(a).id()).unwrap_or_default();
            let edges: Vec<String> = s
                .edges
                .iter()
                .map(|e| format!("{} -> {}", e.charset, e.target))
                .collect();
            writeln!(f, "\t{}: Accept({}) Edges({})", s.index, accept, edges.join("; "))?;
        }
        writeln!(f)?;

        writeln!(f, "* lalrstates")?;
        for s in &self.lalr_states {
            let actions: Vec<String> = s
                .actions
                .iter()
                .map(|a| {
                    let target = match a.action {
                        Action::Shift(t) | Action::Goto(t) => t.to_string(),
                        Action::Reduce(p) => p.to_string(),
                        Action::Accept => String::new(),
                    };
                    format!(
                        "{} -> {} : {}",
                        self.symbol(a.symbol).id(),
                        a.action.kind_name(),
                        target
                    )
                })
                .collect();
            writeln!(f, "\t{}: {}", s.index, actions.join("; "))?;
        }
        writeln!(f)
    }
}
