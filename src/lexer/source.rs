// src/lexer/source.rs
// Chunked character buffer over an `io::Read`.

use std::{
    io::{self, ErrorKind, Read},
    str::FromStr,
};

pub const DEFAULT_CHUNK: usize = 4096;

/// How source bytes map to characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Invalid sequences decode to U+FFFD.
    #[default]
    Utf8,
    /// One byte per codepoint (ISO-8859-1).
    Latin1,
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(format!("unsupported encoding {other:?}")),
        }
    }
}

pub(crate) struct CharSource<R> {
    reader: R,
    encoding: Encoding,
    chunk: usize,
    scratch: Vec<u8>,
    buf: Vec<char>,
    cur: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    eof: bool,
}

impl<R: Read> CharSource<R> {
    pub fn new(reader: R, encoding: Encoding, chunk: usize) -> Self {
        let chunk = chunk.max(1);
        Self {
            reader,
            encoding,
            chunk,
            scratch: vec![0; chunk],
            buf: Vec::new(),
            cur: 0,
            pending: Vec::new(),
            eof: false,
        }
    }

    /// The character `offset` places past the cursor, or `None` at end of input.
    pub fn get(&mut self, offset: usize) -> io::Result<Option<char>> {
        while self.cur + offset >= self.buf.len() {
            if !self.fill()? {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[self.cur + offset]))
    }

    /// The next `n` buffered characters as a string, without consuming them.
    pub fn text(&self, n: usize) -> String {
        let end = (self.cur + n).min(self.buf.len());
        self.buf[self.cur..end].iter().collect()
    }

    /// Consumes up to `n` buffered characters and returns them.
    pub fn advance(&mut self, n: usize) -> &[char] {
        let start = self.cur;
        self.cur = (self.cur + n).min(self.buf.len());
        &self.buf[start..self.cur]
    }

    /// Reads one more chunk. Returns false once input is exhausted and no
    /// characters were added.
    fn fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.cur >= self.chunk {
            self.buf.drain(..self.cur);
            self.cur = 0;
        }

        let n = loop {
            match self.reader.read(&mut self.scratch) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        let before = self.buf.len();
        if n == 0 {
            self.eof = true;
            if !self.pending.is_empty() {
                self.pending.clear();
                self.buf.push(char::REPLACEMENT_CHARACTER);
            }
        } else {
            match self.encoding {
                Encoding::Latin1 => self
                    .buf
                    .extend(self.scratch[..n].iter().map(|&b| b as char)),
                Encoding::Utf8 => self.decode_utf8(n),
            }
        }
        Ok(self.buf.len() > before || !self.eof)
    }

    fn decode_utf8(&mut self, n: usize) {
        self.pending.extend_from_slice(&self.scratch[..n]);
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    self.buf.extend(s.chars());
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.buf.extend(String::from_utf8_lossy(valid).chars());
                    match e.error_len() {
                        Some(bad) => {
                            self.buf.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        // Incomplete sequence at the chunk boundary.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        let keep = rest.len();
        let done = self.pending.len() - keep;
        self.pending.drain(..done);
    }
}
