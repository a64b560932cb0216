//! Lowering from the syntax tree to three-address code.
//!
//! The builder walks the tree recursively and appends to one flat instruction
//! list. Each lowering step returns the operand holding the value of its
//! subtree so that nested expressions compose without re-walking.
//! Temporaries (`t0`, `t1`, ...) and labels (`L0`, `L1`, ...) are numbered
//! from zero per compilation, so a given tree always lowers to the same list.

use super::{Instruction, Label, Operand};
use crate::ast::{AstNode, NodeKind};
use crate::core::{CompileError, CompileResult};

/// Lower a whole tree.
pub fn build_tac(root: &AstNode<'_>) -> CompileResult<Vec<Instruction>> {
    TacBuilder::new().build(root)
}

/// Lowering state for one compilation.
#[derive(Debug, Default)]
pub struct TacBuilder {
    instructions: Vec<Instruction>,
    next_temp: u32,
    next_label: u32,
}

impl TacBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self, root: &AstNode<'_>) -> CompileResult<Vec<Instruction>> {
        self.lower(root)?;
        log::debug!(
            "lowered {} TAC instructions ({} temporaries, {} labels)",
            self.instructions.len(),
            self.next_temp,
            self.next_label
        );
        Ok(self.instructions)
    }

    fn fresh_temp(&mut self) -> Operand {
        let temp = Operand::temporary(self.next_temp);
        self.next_temp += 1;
        temp
    }

    fn fresh_label(&mut self) -> Label {
        let label = Label::new(format!("L{}", self.next_label));
        self.next_label += 1;
        label
    }

    fn emit(&mut self, instruction: Instruction) {
        log::trace!("emit {}", instruction);
        self.instructions.push(instruction);
    }

    /// Lower `node` and return the operand holding its value.
    fn lower(&mut self, node: &AstNode<'_>) -> CompileResult<Operand> {
        match node.kind {
            NodeKind::FunctionDef => self.lower_function(node),
            NodeKind::Apply => self.lower_apply(node),
            NodeKind::If => self.lower_if(node),
            NodeKind::Assignment => self.lower_assignment(node),
            NodeKind::Return => self.lower_return(node),
            NodeKind::Binary(op) => {
                let lhs_node = required(node.lhs, node, "left operand")?;
                let rhs_node = required(node.rhs, node, "right operand")?;
                // Right operand first.
                let rhs = self.lower(rhs_node)?;
                let lhs = self.lower(lhs_node)?;
                let dest = self.fresh_temp();
                self.emit(Instruction::BinOp {
                    dest: dest.clone(),
                    op,
                    lhs,
                    rhs,
                });
                Ok(dest)
            }
            NodeKind::Unsupported => Err(CompileError::Unsupported {
                construct: node.lexeme.to_string(),
            }),
            NodeKind::Structural => {
                for child in [node.lhs, node.rhs].into_iter().flatten() {
                    self.lower(child)?;
                }
                Ok(self.fresh_temp())
            }
            NodeKind::Leaf => Ok(node.operand()),
        }
    }

    /// `D` -> (`d` -> type, (`F` -> name, signature)), body
    fn lower_function(&mut self, node: &AstNode<'_>) -> CompileResult<Operand> {
        let declarator = required(node.lhs, node, "declarator")?;
        let header = required(declarator.rhs, declarator, "function header")?;
        let name = required(header.lhs, header, "function name")?;
        let label = Label::new(name.lexeme);

        self.emit(Instruction::StartFunc {
            label: label.clone(),
        });

        let params: Vec<(Operand, Operand)> = header
            .rhs
            .map(|signature| {
                signature
                    .leaves()
                    .chunks_exact(2)
                    .map(|pair| (Operand::parse(pair[0]), Operand::parse(pair[1])))
                    .collect()
            })
            .unwrap_or_default();

        if !params.is_empty() {
            self.emit(Instruction::ParamCount {
                count: params.len(),
            });
            for (ty, name) in params {
                self.emit(Instruction::Param { ty, name });
            }
        }

        if let Some(body) = node.rhs {
            self.lower(body)?;
        }

        self.emit(Instruction::EndFunc { label });
        Ok(name.operand())
    }

    fn lower_apply(&mut self, node: &AstNode<'_>) -> CompileResult<Operand> {
        let callee = required(node.lhs, node, "callee")?;

        if callee.lexeme == "print" {
            let arg = required(node.rhs, node, "print argument")?;
            let value = self.lower(arg)?;
            self.emit(Instruction::Print {
                value: value.clone(),
            });
            return Ok(value);
        }

        // Lower every argument before pushing any, so nested calls cannot
        // interleave their pushes with ours.
        let args = node.rhs.map(|list| list.call_args()).unwrap_or_default();
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.lower(arg)?);
        }
        for value in values {
            self.emit(Instruction::Arg { value });
        }

        let dest = self.fresh_temp();
        if !self.is_defined(callee.lexeme) {
            return Err(CompileError::UndefinedFunction {
                name: callee.lexeme.to_string(),
            });
        }
        self.emit(Instruction::Call {
            dest: dest.clone(),
            label: Label::new(callee.lexeme),
        });
        Ok(dest)
    }

    fn lower_if(&mut self, node: &AstNode<'_>) -> CompileResult<Operand> {
        let label = self.fresh_label();
        let condition = required(node.lhs, node, "condition")?;
        let pred = self.lower(condition)?;

        self.emit(Instruction::IfGoto {
            pred,
            label: label.clone(),
        });
        if let Some(consequent) = node.rhs {
            self.lower(consequent)?;
        }
        self.emit(Instruction::Label { name: label });
        Ok(self.fresh_temp())
    }

    fn lower_assignment(&mut self, node: &AstNode<'_>) -> CompileResult<Operand> {
        let target = required(node.lhs, node, "assignment target")?;
        let value_node = required(node.rhs, node, "assigned value")?;
        let value = self.lower(value_node)?;
        self.emit(Instruction::Assign {
            dest: target.operand(),
            src: value.clone(),
        });
        Ok(value)
    }

    fn lower_return(&mut self, node: &AstNode<'_>) -> CompileResult<Operand> {
        let value = match node.lhs {
            Some(expr) => self.lower(expr)?,
            None => Operand::constant(0),
        };
        self.emit(Instruction::Return {
            value: value.clone(),
        });
        Ok(value)
    }

    /// Whether `name` was already emitted as a function entry.
    fn is_defined(&self, name: &str) -> bool {
        self.instructions.iter().any(|instruction| {
            matches!(instruction, Instruction::StartFunc { label } if label.as_str() == name)
        })
    }
}

fn required<'a>(
    child: Option<&'a AstNode<'a>>,
    parent: &AstNode<'_>,
    what: &str,
) -> CompileResult<&'a AstNode<'a>> {
    child.ok_or_else(|| CompileError::malformed(format!("'{}' node has no {}", parent.lexeme, what)))
}
