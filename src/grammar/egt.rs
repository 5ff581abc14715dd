// src/grammar/egt.rs
// Binary table codec ("GOLD Parser Tables/v5.0" record stream):
//   header: UTF-16LE string, zero terminated
//   record: b'M', u16 field count, fields...
//   field:  b'E' | b'b' u8 | b'B' u8 | b'I' u16 | b'S' UTF-16LE zero terminated
// The first field of each record is a byte naming the record kind.

use std::io::{self, BufWriter, Write};

use super::raw::{
    RawAction, RawCharSet, RawDfaEdge, RawDfaState, RawGrammar, RawGroup, RawLalrState,
    RawProduction, RawProperty, RawSymbol, TableCounts, section_len,
};
use crate::error::TableError;

pub const HEADER: &str = "GOLD Parser Tables/v5.0";

const RECORD_MARK: u8 = b'M';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Empty,
    Byte(u8),
    Bool(bool),
    Int(u16),
    Str(String),
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take_u8(&mut self) -> Result<u8, TableError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(TableError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn take_u16(&mut self) -> Result<u16, TableError> {
        if self.data.len() < self.pos + 2 {
            return Err(TableError::Truncated { offset: self.pos });
        }
        let v = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    fn take_string(&mut self) -> Result<String, TableError> {
        let mut units = Vec::new();
        loop {
            match self.take_u16()? {
                0 => break,
                u => units.push(u),
            }
        }
        Ok(String::from_utf16_lossy(&units))
    }

    fn take_field(&mut self) -> Result<Field, TableError> {
        let offset = self.pos;
        Ok(match self.take_u8()? {
            b'E' => Field::Empty,
            b'b' => Field::Byte(self.take_u8()?),
            b'B' => Field::Bool(self.take_u8()? == 1),
            b'I' => Field::Int(self.take_u16()?),
            b'S' => Field::Str(self.take_string()?),
            tag => return Err(TableError::UnknownFieldTag { tag, offset }),
        })
    }

    fn at_record(&self) -> bool {
        self.data.get(self.pos) == Some(&RECORD_MARK)
    }
}

/// Typed, in-order access to one record's fields.
struct Record {
    kind: &'static str,
    fields: std::vec::IntoIter<Field>,
}

impl Record {
    fn bad(&self, reason: impl Into<String>) -> TableError {
        TableError::BadRecord {
            record: self.kind,
            reason: reason.into(),
        }
    }

    fn next(&mut self, want: &str) -> Result<Field, TableError> {
        self.fields
            .next()
            .ok_or_else(|| self.bad(format!("missing {want} field")))
    }

    fn int(&mut self) -> Result<u16, TableError> {
        match self.next("integer")? {
            Field::Int(v) => Ok(v),
            other => Err(self.bad(format!("expected integer, found {other:?}"))),
        }
    }

    fn string(&mut self) -> Result<String, TableError> {
        match self.next("string")? {
            Field::Str(s) => Ok(s),
            other => Err(self.bad(format!("expected string, found {other:?}"))),
        }
    }

    fn boolean(&mut self) -> Result<bool, TableError> {
        match self.next("boolean")? {
            Field::Bool(b) => Ok(b),
            other => Err(self.bad(format!("expected boolean, found {other:?}"))),
        }
    }

    /// Reserved slots are written as empty fields; their content is ignored.
    fn reserved(&mut self) -> Result<(), TableError> {
        self.next("reserved").map(|_| ())
    }

    fn remaining(&self) -> usize {
        self.fields.len()
    }

    fn finish(self) -> Result<(), TableError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(self.bad(format!("{n} unexpected trailing fields"))),
        }
    }
}

/// Decodes a binary table into unlinked records.
pub fn read_egt(data: &[u8]) -> Result<RawGrammar, TableError> {
    let mut cur = Cursor { data, pos: 0 };
    let header = cur.take_string()?;
    if header != HEADER {
        return Err(TableError::BadHeader { found: header });
    }

    let mut g = RawGrammar::default();
    while cur.at_record() {
        cur.pos += 1;
        let n = cur.take_u16()? as usize;
        let mut fields = Vec::with_capacity(n);
        for _ in 0..n {
            fields.push(cur.take_field()?);
        }
        let mut fields = fields.into_iter();
        let kind = match fields.next() {
            Some(Field::Byte(k)) => k,
            other => {
                return Err(TableError::BadRecord {
                    record: "unknown",
                    reason: format!("record must start with a kind byte, found {other:?}"),
                });
            }
        };
        read_record(&mut g, kind, fields)?;
    }
    Ok(g)
}

fn read_record(
    g: &mut RawGrammar,
    kind: u8,
    fields: std::vec::IntoIter<Field>,
) -> Result<(), TableError> {
    let r = match kind {
        b'p' => {
            let mut r = Record { kind: "property", fields };
            g.properties.push(RawProperty {
                index: r.int()?,
                name: r.string()?,
                value: r.string()?,
            });
            r
        }
        b't' => {
            let mut r = Record { kind: "table counts", fields };
            g.counts = Some(TableCounts {
                symbols: r.int()?,
                charsets: r.int()?,
                productions: r.int()?,
                dfa_states: r.int()?,
                lalr_states: r.int()?,
                groups: r.int()?,
            });
            r
        }
        b'c' => {
            let mut r = Record { kind: "charset", fields };
            let index = r.int()?;
            let plane = r.int()?;
            let count = r.int()? as usize;
            r.reserved()?;
            let mut ranges = Vec::with_capacity(count);
            for _ in 0..count {
                ranges.push((r.int()?, r.int()?));
            }
            g.charsets.push(RawCharSet {
                index,
                plane,
                ranges,
            });
            r
        }
        b'S' => {
            let mut r = Record { kind: "symbol", fields };
            g.symbols.push(RawSymbol {
                index: r.int()?,
                name: r.string()?,
                kind: r.int()?,
            });
            r
        }
        b'g' => {
            let mut r = Record { kind: "group", fields };
            let index = r.int()?;
            let name = r.string()?;
            let container = r.int()?;
            let start = r.int()?;
            let end = r.int()?;
            let advance_mode = r.int()?;
            let ending_mode = r.int()?;
            r.reserved()?;
            let count = r.int()? as usize;
            let mut nesting = Vec::with_capacity(count);
            for _ in 0..count {
                nesting.push(r.int()?);
            }
            g.groups.push(RawGroup {
                index,
                name,
                container,
                start,
                end,
                advance_mode,
                ending_mode,
                nesting,
            });
            r
        }
        b'R' => {
            let mut r = Record { kind: "production", fields };
            let index = r.int()?;
            let head = r.int()?;
            r.reserved()?;
            let mut handles = Vec::with_capacity(r.remaining());
            while r.remaining() > 0 {
                handles.push(r.int()?);
            }
            g.productions.push(RawProduction {
                index,
                head,
                handles,
            });
            r
        }
        b'I' => {
            let mut r = Record { kind: "initial states", fields };
            g.initial = Some((r.int()?, r.int()?));
            r
        }
        b'D' => {
            let mut r = Record { kind: "dfa state", fields };
            let index = r.int()?;
            let accepting = r.boolean()?;
            let accept_symbol = r.int()?;
            r.reserved()?;
            if r.remaining() % 3 != 0 {
                return Err(r.bad("edge fields must come in triples"));
            }
            let mut edges = Vec::with_capacity(r.remaining() / 3);
            while r.remaining() > 0 {
                let charset = r.int()?;
                let target = r.int()?;
                r.reserved()?;
                edges.push(RawDfaEdge { charset, target });
            }
            g.dfa_states.push(RawDfaState {
                index,
                accept: accepting.then_some(accept_symbol),
                edges,
            });
            r
        }
        b'L' => {
            let mut r = Record { kind: "lalr state", fields };
            let index = r.int()?;
            r.reserved()?;
            if r.remaining() % 4 != 0 {
                return Err(r.bad("action fields must come in quadruples"));
            }
            let mut actions = Vec::with_capacity(r.remaining() / 4);
            while r.remaining() > 0 {
                let symbol = r.int()?;
                let kind = r.int()?;
                let target = r.int()?;
                r.reserved()?;
                actions.push(RawAction {
                    symbol,
                    kind,
                    target,
                });
            }
            g.lalr_states.push(RawLalrState { index, actions });
            r
        }
        k => return Err(TableError::UnknownRecord { kind: k as char }),
    };
    r.finish()
}

/// Accumulates the fields of one record before it is framed.
struct RecordWriter {
    count: usize,
    bytes: Vec<u8>,
}

impl RecordWriter {
    fn new(kind: u8) -> Self {
        let mut w = Self {
            count: 0,
            bytes: Vec::new(),
        };
        w.byte(kind);
        w
    }

    fn byte(&mut self, v: u8) -> &mut Self {
        self.count += 1;
        self.bytes.extend_from_slice(&[b'b', v]);
        self
    }

    fn boolean(&mut self, v: bool) -> &mut Self {
        self.count += 1;
        self.bytes.extend_from_slice(&[b'B', v as u8]);
        self
    }

    fn int(&mut self, v: u16) -> &mut Self {
        self.count += 1;
        self.bytes.push(b'I');
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn string(&mut self, s: &str) -> &mut Self {
        self.count += 1;
        self.bytes.push(b'S');
        push_utf16z(&mut self.bytes, s);
        self
    }

    fn empty(&mut self) -> &mut Self {
        self.count += 1;
        self.bytes.push(b'E');
        self
    }

    fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        let count = fits("field", self.count)?;
        w.write_all(&[RECORD_MARK])?;
        w.write_all(&count.to_le_bytes())?;
        w.write_all(&self.bytes)
    }
}

fn fits(kind: &'static str, len: usize) -> io::Result<u16> {
    section_len(kind, len).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

fn push_utf16z(out: &mut Vec<u8>, s: &str) {
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
}

impl RawGrammar {
    /// Writes the records in the binary table format.
    ///
    /// Counts are written as read from the records themselves when `counts`
    /// is unset.
    pub fn write_egt(&self, w: impl Write) -> io::Result<()> {
        let mut w = BufWriter::new(w);

        let mut header = Vec::new();
        push_utf16z(&mut header, HEADER);
        w.write_all(&header)?;

        for p in &self.properties {
            RecordWriter::new(b'p')
                .int(p.index)
                .string(&p.name)
                .string(&p.value)
                .write_to(&mut w)?;
        }

        let c = match self.counts {
            Some(c) => c,
            None => self
                .read_counts()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
        };
        RecordWriter::new(b't')
            .int(c.symbols)
            .int(c.charsets)
            .int(c.productions)
            .int(c.dfa_states)
            .int(c.lalr_states)
            .int(c.groups)
            .write_to(&mut w)?;

        for cs in &self.charsets {
            let mut rec = RecordWriter::new(b'c');
            rec.int(cs.index)
                .int(cs.plane)
                .int(fits("charset range", cs.ranges.len())?)
                .empty();
            for &(lo, hi) in &cs.ranges {
                rec.int(lo).int(hi);
            }
            rec.write_to(&mut w)?;
        }

        for s in &self.symbols {
            RecordWriter::new(b'S')
                .int(s.index)
                .string(&s.name)
                .int(s.kind)
                .write_to(&mut w)?;
        }

        for g in &self.groups {
            let mut rec = RecordWriter::new(b'g');
            rec.int(g.index)
                .string(&g.name)
                .int(g.container)
                .int(g.start)
                .int(g.end)
                .int(g.advance_mode)
                .int(g.ending_mode)
                .empty()
                .int(fits("group nesting", g.nesting.len())?);
            for &n in &g.nesting {
                rec.int(n);
            }
            rec.write_to(&mut w)?;
        }

        for p in &self.productions {
            let mut rec = RecordWriter::new(b'R');
            rec.int(p.index).int(p.head).empty();
            for &h in &p.handles {
                rec.int(h);
            }
            rec.write_to(&mut w)?;
        }

        if let Some((dfa, lalr)) = self.initial {
            RecordWriter::new(b'I')
                .int(dfa)
                .int(lalr)
                .write_to(&mut w)?;
        }

        for s in &self.dfa_states {
            let mut rec = RecordWriter::new(b'D');
            rec.int(s.index)
                .boolean(s.accept.is_some())
                .int(s.accept.unwrap_or(0))
                .empty();
            for e in &s.edges {
                rec.int(e.charset).int(e.target).empty();
            }
            rec.write_to(&mut w)?;
        }

        for s in &self.lalr_states {
            let mut rec = RecordWriter::new(b'L');
            rec.int(s.index).empty();
            for a in &s.actions {
                rec.int(a.symbol).int(a.kind).int(a.target).empty();
            }
            rec.write_to(&mut w)?;
        }

        w.flush()
    }

    /// Fails only when a section or record is too large for the format.
    pub fn to_egt_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_egt(&mut out)?;
        Ok(out)
    }
}
