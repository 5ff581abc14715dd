// src/parser/handler.rs
//! Bottom-up evaluation with per-production callbacks.

use hashbrown::HashMap;

use super::{EventHandler, ItemValue, Step};
use crate::{
    error::TableError,
    grammar::{GrammarTable, ProductionId},
    lexer::Token,
};

/// One handle of a reduction as seen by a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Child<T> {
    Token(Token),
    Value(T),
    /// A reduced handle that produced no value.
    Empty,
}

impl<T> Child<T> {
    pub fn token(&self) -> Option<&Token> {
        match self {
            Child::Token(t) => Some(t),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Child::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Child::Value(v) => Some(v),
            _ => None,
        }
    }
}

type Callback<'f, T> = Box<dyn FnMut(Vec<Child<T>>) -> T + 'f>;

/// Computes a value per reduction by calling the callback registered for
/// the reduced production. Without a callback the first child's value is
/// passed through unchanged.
pub struct ProductionHandler<'f, T> {
    callbacks: HashMap<ProductionId, Callback<'f, T>>,
    result: Option<T>,
}

impl<T> Default for ProductionHandler<'_, T> {
    fn default() -> Self {
        Self {
            callbacks: HashMap::new(),
            result: None,
        }
    }
}

impl<'f, T> ProductionHandler<'f, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` for the production with id string `id`, e.g.
    /// `"<E> ::= <E> + <M>"`.
    pub fn on(
        self,
        grammar: &GrammarTable,
        id: &str,
        f: impl FnMut(Vec<Child<T>>) -> T + 'f,
    ) -> Result<Self, TableError> {
        let pid = grammar
            .production_by_id(id)
            .ok_or_else(|| TableError::UnknownProduction(id.to_string()))?;
        Ok(self.on_index(pid, f))
    }

    pub fn on_index(mut self, pid: ProductionId, f: impl FnMut(Vec<Child<T>>) -> T + 'f) -> Self {
        self.callbacks.insert(pid, Box::new(f));
        self
    }

    /// The value attached to the start symbol at accept.
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.result
    }
}

impl<T> EventHandler<T> for ProductionHandler<'_, T> {
    fn handle(&mut self, _grammar: &GrammarTable, step: Step<'_, T>) {
        match step {
            Step::Reduce(r) => {
                let children: Vec<Child<T>> = r
                    .handles
                    .iter_mut()
                    .map(|h| match &h.value {
                        ItemValue::Shifted(tok) => Child::Token(tok.clone()),
                        _ => h.data.take().map_or(Child::Empty, Child::Value),
                    })
                    .collect();
                r.head.data = match self.callbacks.get_mut(&r.production.index) {
                    Some(f) => Some(f(children)),
                    None => children.into_iter().next().and_then(Child::into_value),
                };
            }
            Step::Accept(top) => self.result = top.data.take(),
            _ => {}
        }
    }
}
