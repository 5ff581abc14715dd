// src/config.rs
//! Parse options, with environment overrides for the driver helpers.

use crate::lexer::{DEFAULT_CHUNK, Encoding};

pub const ENV_TRIM_REDUCTIONS: &str = "LALRPT_TRIM_REDUCTIONS";
pub const ENV_ENCODING: &str = "LALRPT_ENCODING";
pub const ENV_CHUNK_SIZE: &str = "LALRPT_CHUNK_SIZE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Eliminate single-nonterminal reductions in place.
    pub trim_reductions: bool,
    pub encoding: Encoding,
    /// Characters read from the source per refill.
    pub chunk_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            trim_reductions: false,
            encoding: Encoding::Utf8,
            chunk_size: DEFAULT_CHUNK,
        }
    }
}

impl ParseOptions {
    pub fn trimmed() -> Self {
        Self {
            trim_reductions: true,
            ..Self::default()
        }
    }

    /// Defaults overridden by `LALRPT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    /// Unparseable values fall back to the default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        opts.trim_reductions = flag_true(lookup(ENV_TRIM_REDUCTIONS), opts.trim_reductions);
        if let Some(v) = lookup(ENV_ENCODING) {
            match v.parse() {
                Ok(enc) => opts.encoding = enc,
                Err(e) => log::warn!("{ENV_ENCODING}: {e}; using {:?}", opts.encoding),
            }
        }
        if let Some(v) = lookup(ENV_CHUNK_SIZE) {
            match v.parse::<usize>() {
                Ok(n) if n > 0 => opts.chunk_size = n,
                _ => log::warn!("{ENV_CHUNK_SIZE}: bad value {v:?}; using {}", opts.chunk_size),
            }
        }
        opts
    }
}

/// Treat any value other than "0"/"false" (case-insensitive) as true.
fn flag_true(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
        .unwrap_or(default)
}
