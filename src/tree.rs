// src/tree.rs
//! Parse-tree builders driven by parser events.

use std::fmt::Write;

use crate::{
    grammar::{GrammarTable, ProductionId},
    lexer::Token,
    parser::{EventHandler, ItemValue, Step},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Leaf(Token),
    Branch {
        production: ProductionId,
        children: Vec<TreeNode>,
    },
}

impl TreeNode {
    pub fn token(&self) -> Option<&Token> {
        match self {
            TreeNode::Leaf(t) => Some(t),
            TreeNode::Branch { .. } => None,
        }
    }

    pub fn production(&self) -> Option<ProductionId> {
        match self {
            TreeNode::Branch { production, .. } => Some(*production),
            TreeNode::Leaf(_) => None,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Branch { children, .. } => children,
            TreeNode::Leaf(_) => &[],
        }
    }

    /// Leaf lexemes in source order.
    pub fn lexemes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_lexemes(&mut out);
        out
    }

    fn collect_lexemes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TreeNode::Leaf(t) => out.push(&t.lexeme),
            TreeNode::Branch { children, .. } => {
                for c in children {
                    c.collect_lexemes(out);
                }
            }
        }
    }

    /// Indented rendering: production ids for branches, `name 'lexeme'` for
    /// leaves, two spaces per level.
    pub fn dump(&self, grammar: &GrammarTable) -> String {
        let mut out = String::new();
        self.dump_into(grammar, 0, &mut out);
        out
    }

    fn dump_into(&self, grammar: &GrammarTable, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        // fmt::Write for String never fails.
        match self {
            TreeNode::Leaf(t) => {
                let _ = writeln!(out, "{indent}{} '{}'", grammar.symbol(t.symbol).name, t.lexeme);
            }
            TreeNode::Branch {
                production,
                children,
            } => {
                let _ = writeln!(out, "{indent}{}", grammar.production_id(*production));
                for c in children {
                    c.dump_into(grammar, depth + 1, out);
                }
            }
        }
    }
}

/// Builds the literal parse tree: one leaf per shifted token, one branch per
/// reduction.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    result: Option<TreeNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> Option<&TreeNode> {
        self.result.as_ref()
    }

    pub fn into_tree(self) -> Option<TreeNode> {
        self.result
    }
}

impl EventHandler<TreeNode> for TreeBuilder {
    fn handle(&mut self, _grammar: &GrammarTable, step: Step<'_, TreeNode>) {
        match step {
            Step::Shift(item) => {
                if let ItemValue::Shifted(tok) = &item.value {
                    item.data = Some(TreeNode::Leaf(tok.clone()));
                }
            }
            Step::Reduce(r) => {
                let children = r.handles.iter_mut().filter_map(|h| h.data.take()).collect();
                r.head.data = Some(TreeNode::Branch {
                    production: r.production.index,
                    children,
                });
            }
            Step::Accept(top) => self.result = top.data.take(),
            Step::ReduceEliminated(_) | Step::Error(_) => {}
        }
    }
}

/// A child candidate: the node plus the production of the handle it came
/// from. Nodes spliced in from a grandchild carry no origin.
struct Candidate {
    origin: Origin,
    node: TreeNode,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Origin {
    Token,
    Reduced(ProductionId),
    Spliced,
}

/// Builds a simplified tree, shaped by each production's
/// [`SimplifyFlags`](crate::grammar::SimplifyFlags).
#[derive(Debug, Default)]
pub struct SimplifiedTreeBuilder {
    result: Option<TreeNode>,
}

impl SimplifiedTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> Option<&TreeNode> {
        self.result.as_ref()
    }

    pub fn into_tree(self) -> Option<TreeNode> {
        self.result
    }
}

impl EventHandler<TreeNode> for SimplifiedTreeBuilder {
    fn handle(&mut self, grammar: &GrammarTable, step: Step<'_, TreeNode>) {
        match step {
            Step::Reduce(r) => {
                let p = r.production;
                let flags = p.flags;

                let mut ccs: Vec<Candidate> = Vec::with_capacity(r.handles.len());
                for h in r.handles.iter_mut() {
                    match &h.value {
                        ItemValue::Shifted(tok) => {
                            if flags.remove_single_lexeme
                                && grammar.symbol(tok.symbol).single_lexeme
                            {
                                continue;
                            }
                            ccs.push(Candidate {
                                origin: Origin::Token,
                                node: TreeNode::Leaf(tok.clone()),
                            });
                        }
                        ItemValue::Reduced(pid) => {
                            if let Some(node) = h.data.take() {
                                ccs.push(Candidate {
                                    origin: Origin::Reduced(*pid),
                                    node,
                                });
                            }
                        }
                        ItemValue::Start => {}
                    }
                }

                if flags.forward_child && ccs.len() == 1 {
                    r.head.data = ccs.pop().map(|c| c.node);
                    return;
                }

                if flags.listify_recursion {
                    let hit = ccs.iter().enumerate().find_map(|(i, c)| match c.origin {
                        Origin::Reduced(cp) if grammar.production(cp).head == p.head => {
                            Some((i, cp))
                        }
                        _ => None,
                    });
                    if let Some((i, cp)) = hit {
                        if cp == p.index && matches!(ccs[i].node, TreeNode::Branch { .. }) {
                            splice(&mut ccs, i);
                        } else if grammar.production(cp).handles.is_empty() {
                            ccs.remove(i);
                        }
                    }
                }

                if flags.merge_child {
                    let hit = ccs.iter().enumerate().find_map(|(i, c)| match c.origin {
                        Origin::Reduced(cp) => Some((i, cp)),
                        _ => None,
                    });
                    if let Some((i, cp)) = hit {
                        if ccs[i].node.production() == Some(cp) {
                            splice(&mut ccs, i);
                        }
                    }
                }

                r.head.data = Some(TreeNode::Branch {
                    production: p.index,
                    children: ccs.into_iter().map(|c| c.node).collect(),
                });
            }
            Step::Accept(top) => self.result = top.data.take(),
            Step::Shift(_) | Step::ReduceEliminated(_) | Step::Error(_) => {}
        }
    }
}

/// Replaces the branch candidate at `i` by its children.
fn splice(ccs: &mut Vec<Candidate>, i: usize) {
    let c = ccs.remove(i);
    if let TreeNode::Branch { children, .. } = c.node {
        let spliced = children.into_iter().map(|node| Candidate {
            origin: Origin::Spliced,
            node,
        });
        ccs.splice(i..i, spliced);
    }
}
