//! Indented-text AST parser.
//!
//! Each input line holds one token; its leading whitespace gives the depth.
//! A node's children are the lines exactly one indentation step deeper within
//! the node's span: the first is the left child, the second the right child.
//!
//! ```text
//! =
//!   x
//!   +
//!     y
//!     1
//! ```

use super::{AstNode, NodeKind};
use crate::core::{CompilationSession, CompileError, CompileResult};
use crate::tac::is_numeric;

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Columns per depth level. The front end prints two.
    pub indent_step: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self { indent_step: 2 }
    }
}

/// Parse AST text into a tree allocated in the session arena.
pub fn parse_ast<'arena>(
    session: &CompilationSession<'arena>,
    text: &str,
    config: &ParseConfig,
) -> CompileResult<&'arena AstNode<'arena>> {
    let parser = Parser::new(session, text, config.indent_step.max(1));
    let root = parser.parse()?;
    session.record_ast_nodes(root.node_count());
    Ok(root)
}

#[derive(Debug)]
struct AstLine<'a> {
    indent: usize,
    lexeme: &'a str,
}

struct Parser<'s, 'arena> {
    session: &'s CompilationSession<'arena>,
    lines: Vec<AstLine<'arena>>,
    step: usize,
}

impl<'s, 'arena> Parser<'s, 'arena> {
    fn new(session: &'s CompilationSession<'arena>, text: &str, step: usize) -> Self {
        let lines = text
            .lines()
            .filter_map(|line| {
                let token = line.trim_start();
                let lexeme = token.trim_end();
                if lexeme.is_empty() {
                    return None;
                }
                Some(AstLine {
                    indent: line.len() - token.len(),
                    lexeme: session.alloc_str(lexeme),
                })
            })
            .collect();

        Self {
            session,
            lines,
            step,
        }
    }

    fn parse(self) -> CompileResult<&'arena AstNode<'arena>> {
        if self.lines.is_empty() {
            return Err(CompileError::EmptyAst);
        }
        if let Some(line) = self
            .lines
            .iter()
            .find(|line| is_numeric(line.lexeme) && line.lexeme.parse::<i32>().is_err())
        {
            return Err(CompileError::malformed(format!(
                "integer '{}' does not fit in 32 bits",
                line.lexeme
            )));
        }
        log::debug!("parsing AST: {} lines", self.lines.len());
        Ok(self.build(0, self.lines.len()))
    }

    /// Build the node at `start`, whose span runs up to `end` (exclusive).
    fn build(&self, start: usize, end: usize) -> &'arena AstNode<'arena> {
        let head = &self.lines[start];
        let child_indent = head.indent + self.step;

        let mut children = (start + 1..end).filter(|&i| self.lines[i].indent == child_indent);
        let left = children.next();
        let right = children.next();

        let lhs = left.map(|l| self.build(l, right.unwrap_or(end)));
        let rhs = right.map(|r| self.build(r, end));

        let kind = NodeKind::classify(head.lexeme, lhs.is_some() || rhs.is_some());
        log::trace!("node {:?} ({:?}) at line {}", head.lexeme, kind, start);

        self.session.alloc(AstNode {
            lexeme: head.lexeme,
            kind,
            lhs,
            rhs,
        })
    }
}
