// src/parser/mod.rs
//! LALR(1) shift/reduce engine driven one step at a time.
//!
//! The parser pulls tokens from a [`Lexer`] on demand, skipping noise. Each
//! [`Parser::step`] performs exactly one shift, reduce, accept or error and
//! reports it as an [`Event`]. [`Parser::run_with`] loops over `step` and
//! hands every event to an [`EventHandler`], which is how the tree builders
//! and [`ProductionHandler`] attach values to stack items.

pub mod handler;

use std::io::Read;

pub use handler::{Child, ProductionHandler};

use crate::{
    error::{ParseError, ParseErrorKind},
    grammar::{
        Action, GrammarTable, LalrStateId, Production, ProductionId, SymbolId, SymbolKind,
    },
    lexer::{Lexer, Position, Token},
};

/// What a stack item stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValue {
    /// The bottom item, pushed before any input is read.
    Start,
    Shifted(Token),
    Reduced(ProductionId),
}

#[derive(Debug, Clone)]
pub struct ParseItem<T> {
    pub state: LalrStateId,
    pub value: ItemValue,
    /// Slot for a value computed by an event handler.
    pub data: Option<T>,
}

impl<T> ParseItem<T> {
    fn new(state: LalrStateId, value: ItemValue) -> Self {
        Self {
            state,
            value,
            data: None,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match &self.value {
            ItemValue::Shifted(t) => Some(t),
            _ => None,
        }
    }

    pub fn production(&self) -> Option<ProductionId> {
        match self.value {
            ItemValue::Reduced(p) => Some(p),
            _ => None,
        }
    }
}

/// Outcome of a single [`Parser::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Shift,
    Reduce(ProductionId),
    /// A unit reduction applied in place to the top item (trim mode only).
    ReduceEliminated(ProductionId),
    Accept,
    Error(ParseError),
}

impl Event {
    pub fn is_structural(&self) -> bool {
        matches!(self, Event::Reduce(_) | Event::Accept | Event::Error(_))
    }
}

/// The items touched by a non-trimmed reduction.
pub struct Reduction<'a, T> {
    pub production: &'a Production,
    /// The freshly pushed item for the production's head.
    pub head: &'a mut ParseItem<T>,
    /// The popped handle items, leftmost first.
    pub handles: &'a mut [ParseItem<T>],
}

/// Event payload passed to an [`EventHandler`].
pub enum Step<'a, T> {
    /// The item just pushed for the shifted token.
    Shift(&'a mut ParseItem<T>),
    Reduce(Reduction<'a, T>),
    /// The top item, now labelled with the eliminated production.
    ReduceEliminated(&'a mut ParseItem<T>),
    /// The top item, holding the start symbol's value.
    Accept(&'a mut ParseItem<T>),
    Error(&'a ParseError),
}

pub trait EventHandler<T> {
    fn handle(&mut self, grammar: &GrammarTable, step: Step<'_, T>);
}

impl<T, F> EventHandler<T> for F
where
    F: FnMut(&GrammarTable, Step<'_, T>),
{
    fn handle(&mut self, grammar: &GrammarTable, step: Step<'_, T>) {
        self(grammar, step)
    }
}

pub struct Parser<'g, R, T = ()> {
    grammar: &'g GrammarTable,
    lexer: Lexer<'g, R>,
    state: LalrStateId,
    stack: Vec<ParseItem<T>>,
    lookahead: Option<Token>,
    /// Handles popped by the most recent reduction.
    handles: Vec<ParseItem<T>>,
    reduction: Option<ProductionId>,
    error: Option<ParseError>,
    trim_reductions: bool,
}

impl<'g, 's, T> Parser<'g, &'s [u8], T> {
    pub fn from_text(grammar: &'g GrammarTable, text: &'s str) -> Self {
        Self::new(Lexer::from_text(grammar, text))
    }
}

impl<'g, R: Read, T> Parser<'g, R, T> {
    pub fn new(lexer: Lexer<'g, R>) -> Self {
        let grammar = lexer.grammar();
        let state = grammar.lalr_init();
        Self {
            grammar,
            lexer,
            state,
            stack: vec![ParseItem::new(state, ItemValue::Start)],
            lookahead: None,
            handles: Vec::new(),
            reduction: None,
            error: None,
            trim_reductions: false,
        }
    }

    /// Starts a fresh parse over `lexer`. The trim setting is kept.
    pub fn attach(&mut self, lexer: Lexer<'g, R>) {
        self.grammar = lexer.grammar();
        self.lexer = lexer;
        self.state = self.grammar.lalr_init();
        self.stack.clear();
        self.stack.push(ParseItem::new(self.state, ItemValue::Start));
        self.lookahead = None;
        self.handles.clear();
        self.reduction = None;
        self.error = None;
    }

    pub fn set_trim_reductions(&mut self, on: bool) {
        self.trim_reductions = on;
    }

    pub fn trim_reductions(&self) -> bool {
        self.trim_reductions
    }

    pub fn grammar(&self) -> &'g GrammarTable {
        self.grammar
    }

    pub fn state(&self) -> LalrStateId {
        self.state
    }

    pub fn position(&self) -> Position {
        self.lexer.position()
    }

    pub fn stack(&self) -> &[ParseItem<T>] {
        &self.stack
    }

    pub fn top(&self) -> Option<&ParseItem<T>> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut ParseItem<T>> {
        self.stack.last_mut()
    }

    /// Production of the most recent non-trimmed reduction.
    pub fn reduction(&self) -> Option<ProductionId> {
        self.reduction
    }

    /// Handles popped by the most recent non-trimmed reduction.
    pub fn reduction_handles(&self) -> &[ParseItem<T>] {
        &self.handles
    }

    /// The most recent error.
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Performs one shift, reduce, accept or error.
    ///
    /// After `Accept` or `Error` further calls report the same outcome again
    /// (an input error retries the read).
    pub fn step(&mut self) -> Event {
        let g = self.grammar;
        let token = match self.lookahead.take() {
            Some(t) => t,
            None => match self.next_significant() {
                Ok(t) => t,
                Err(e) => {
                    return self.fail(ParseErrorKind::Input, None, Vec::new(), Some(e.to_string()));
                }
            },
        };
        let symbol = token.symbol;

        if g.symbol(symbol).kind == SymbolKind::Error {
            self.lookahead = Some(token.clone());
            return self.fail(ParseErrorKind::Lexical, Some(token), Vec::new(), None);
        }

        let state = g.lalr_state(self.state);
        match state.action(symbol) {
            None => {
                let expected = state
                    .actions
                    .iter()
                    .filter(|a| g.symbol(a.symbol).kind.is_expectable())
                    .map(|a| a.symbol)
                    .collect();
                self.lookahead = Some(token.clone());
                self.fail(ParseErrorKind::Syntax, Some(token), expected, None)
            }
            Some(Action::Shift(target)) => {
                log::trace!(
                    "state {}: shift {} {:?} -> {}",
                    self.state,
                    g.symbol(symbol).name,
                    token.lexeme,
                    target
                );
                self.state = target;
                self.stack
                    .push(ParseItem::new(target, ItemValue::Shifted(token)));
                Event::Shift
            }
            Some(Action::Reduce(production)) => {
                self.lookahead = Some(token);
                self.reduce(production)
            }
            Some(Action::Goto(_)) => {
                self.lookahead = Some(token.clone());
                self.fail(
                    ParseErrorKind::Internal,
                    Some(token),
                    Vec::new(),
                    Some("goto action on a lookahead symbol".to_string()),
                )
            }
            Some(Action::Accept) => {
                log::trace!("state {}: accept", self.state);
                self.lookahead = Some(token);
                Event::Accept
            }
        }
    }

    /// Steps until a reduce, accept or error.
    pub fn step_until_structural(&mut self) -> Event {
        loop {
            let event = self.step();
            if event.is_structural() {
                return event;
            }
        }
    }

    /// Runs to completion without a handler.
    pub fn run(&mut self) -> Result<(), ParseError> {
        loop {
            match self.step() {
                Event::Accept => return Ok(()),
                Event::Error(e) => return Err(e),
                _ => {}
            }
        }
    }

    /// Runs to completion, passing every event to `handler`.
    pub fn run_with<H>(&mut self, handler: &mut H) -> Result<(), ParseError>
    where
        H: EventHandler<T> + ?Sized,
    {
        loop {
            let event = self.step();
            self.dispatch(&event, handler);
            match event {
                Event::Accept => return Ok(()),
                Event::Error(e) => return Err(e),
                _ => {}
            }
        }
    }

    /// Hands the payload of `event` to `handler`.
    pub fn dispatch<H>(&mut self, event: &Event, handler: &mut H)
    where
        H: EventHandler<T> + ?Sized,
    {
        let g = self.grammar;
        match event {
            Event::Error(e) => handler.handle(g, Step::Error(e)),
            Event::Reduce(p) => {
                if let Some(head) = self.stack.last_mut() {
                    handler.handle(
                        g,
                        Step::Reduce(Reduction {
                            production: g.production(*p),
                            head,
                            handles: self.handles.as_mut_slice(),
                        }),
                    );
                }
            }
            Event::Shift | Event::ReduceEliminated(_) | Event::Accept => {
                if let Some(top) = self.stack.last_mut() {
                    let step = match event {
                        Event::Shift => Step::Shift(top),
                        Event::ReduceEliminated(_) => Step::ReduceEliminated(top),
                        _ => Step::Accept(top),
                    };
                    handler.handle(g, step);
                }
            }
        }
    }

    fn reduce(&mut self, pid: ProductionId) -> Event {
        let g = self.grammar;
        let production = g.production(pid);
        let n = production.handles.len();
        let trimmed = self.trim_reductions
            && n == 1
            && g.symbol(production.handles[0]).kind == SymbolKind::NonTerminal;

        let below = if trimmed {
            self.stack.len().checked_sub(2)
        } else {
            self.stack.len().checked_sub(n + 1)
        };
        let Some(below) = below else {
            return self.fail_internal(format!("stack too shallow to reduce {}", g.production_id(pid)));
        };
        let from = self.stack[below].state;
        let target = match g.lalr_state(from).action(production.head) {
            Some(Action::Goto(t)) => t,
            _ => {
                return self.fail_internal(format!(
                    "no goto on {} in state {}",
                    g.symbol(production.head).id(),
                    from
                ));
            }
        };

        log::trace!(
            "state {}: reduce {}{} -> {}",
            self.state,
            g.production_id(pid),
            if trimmed { " (trimmed)" } else { "" },
            target
        );
        self.state = target;
        if trimmed {
            if let Some(top) = self.stack.last_mut() {
                top.state = target;
                top.value = ItemValue::Reduced(pid);
            }
            Event::ReduceEliminated(pid)
        } else {
            self.handles = self.stack.split_off(self.stack.len() - n);
            self.stack
                .push(ParseItem::new(target, ItemValue::Reduced(pid)));
            self.reduction = Some(pid);
            Event::Reduce(pid)
        }
    }

    fn next_significant(&mut self) -> std::io::Result<Token> {
        loop {
            let tok = self.lexer.read_token()?;
            if self.grammar.symbol(tok.symbol).kind != SymbolKind::Noise {
                return Ok(tok);
            }
        }
    }

    fn fail_internal(&mut self, detail: String) -> Event {
        let token = self.lookahead.clone();
        self.fail(ParseErrorKind::Internal, token, Vec::new(), Some(detail))
    }

    fn fail(
        &mut self,
        kind: ParseErrorKind,
        token: Option<Token>,
        expected: Vec<SymbolId>,
        detail: Option<String>,
    ) -> Event {
        let position = token
            .as_ref()
            .map(|t| t.position)
            .unwrap_or_else(|| self.lexer.position());
        let err = ParseError {
            kind,
            position,
            state: self.state,
            token,
            expected,
            detail,
        };
        log::trace!("state {}: {}", self.state, err);
        self.error = Some(err.clone());
        Event::Error(err)
    }
}
