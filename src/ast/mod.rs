//! Syntax tree read from the front end's indented-text dump.
//!
//! Nodes are binary: each holds its token lexeme, a [`NodeKind`] decided once
//! at parse time, and optional left/right children. The whole tree lives in
//! the compilation session's arena and is dropped after lowering.

use crate::tac::{BinaryOp, Operand};

pub mod parser;

pub use parser::{parse_ast, ParseConfig};

/// Syntactic form of a node, derived from its lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `D`: function definition.
    FunctionDef,
    /// `apply`: call, or the built-in `print`.
    Apply,
    If,
    /// `=`
    Assignment,
    Return,
    Binary(BinaryOp),
    /// Constructs the lowering refuses (`else`, `while`).
    Unsupported,
    /// Any other interior node (`;`, `~`, `,`, declarators...).
    Structural,
    Leaf,
}

impl NodeKind {
    pub fn classify(lexeme: &str, has_children: bool) -> NodeKind {
        if !has_children {
            return if lexeme == "return" {
                NodeKind::Return
            } else {
                NodeKind::Leaf
            };
        }
        match lexeme {
            "D" => NodeKind::FunctionDef,
            "apply" => NodeKind::Apply,
            "if" => NodeKind::If,
            "=" => NodeKind::Assignment,
            "return" => NodeKind::Return,
            "else" | "while" => NodeKind::Unsupported,
            _ => BinaryOp::from_symbol(lexeme)
                .map(NodeKind::Binary)
                .unwrap_or(NodeKind::Structural),
        }
    }
}

/// A node of the syntax tree. Children are exclusively owned by their parent.
#[derive(Debug)]
pub struct AstNode<'a> {
    pub lexeme: &'a str,
    pub kind: NodeKind,
    pub lhs: Option<&'a AstNode<'a>>,
    pub rhs: Option<&'a AstNode<'a>>,
}

impl<'a> AstNode<'a> {
    pub fn is_leaf(&self) -> bool {
        self.lhs.is_none() && self.rhs.is_none()
    }

    /// The node's token as an operand.
    pub fn operand(&self) -> Operand {
        Operand::parse(self.lexeme)
    }

    /// Nodes in in-order traversal (left subtree, self, right subtree).
    pub fn in_order(&'a self) -> Vec<&'a AstNode<'a>> {
        let mut out = Vec::new();
        self.collect_in_order(&mut out);
        out
    }

    fn collect_in_order(&'a self, out: &mut Vec<&'a AstNode<'a>>) {
        if let Some(lhs) = self.lhs {
            lhs.collect_in_order(out);
        }
        out.push(self);
        if let Some(rhs) = self.rhs {
            rhs.collect_in_order(out);
        }
    }

    /// Leaf lexemes in in-order traversal.
    pub fn leaves(&'a self) -> Vec<&'a str> {
        self.in_order()
            .into_iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.lexeme)
            .collect()
    }

    /// Flatten a `,`-separated argument tree into its argument expressions,
    /// left to right.
    pub fn call_args(&'a self) -> Vec<&'a AstNode<'a>> {
        let mut out = Vec::new();
        self.collect_args(&mut out);
        out
    }

    fn collect_args(&'a self, out: &mut Vec<&'a AstNode<'a>>) {
        if self.lexeme == "," {
            for child in [self.lhs, self.rhs].into_iter().flatten() {
                child.collect_args(out);
            }
        } else {
            out.push(self);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.lhs.map_or(0, |n| n.node_count()) + self.rhs.map_or(0, |n| n.node_count())
    }
}
