//! TAC to MIPS translation.
//!
//! The generator walks the list once, in order. Every IR name gets a
//! register the first time it is written and keeps it for the rest of the
//! compilation; registers are never freed, so distinct functions never share
//! one and calls need no save/restore. A temporary assigned a constant is
//! kept as a deferred immediate and only loaded when an instruction needs it
//! in a register.

use super::calling_convention::{Source, SpimConvention};
use super::{CodegenConfig, Program};
use crate::core::{
    AsmReg, Binding, BindingKey, CompileError, CompileResult, RegAllocError, RegPool, RegisterFile,
    ValueAssignmentManager,
};
use crate::tac::{BinaryOp, Instruction, Operand};

/// Translate a TAC list into a program.
pub fn generate(instructions: &[Instruction], config: &CodegenConfig) -> CompileResult<Program> {
    let mut generator = CodeGenerator::new(config);
    for instruction in instructions {
        generator.lower(instruction)?;
    }
    Ok(generator.finish())
}

/// MIPS mnemonic of a TAC operator.
pub fn mnemonic(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::Div => "div",
        BinaryOp::Rem => "rem",
        BinaryOp::Eq => "seq",
        BinaryOp::Ne => "sne",
        BinaryOp::Gt => "sgt",
        BinaryOp::Lt => "slt",
        BinaryOp::Ge => "sge",
        BinaryOp::Le => "sle",
    }
}

/// Code generation state for one compilation.
pub struct CodeGenerator {
    convention: SpimConvention,
    bootstrap: bool,
    registers: RegisterFile,
    bindings: ValueAssignmentManager,
    /// Function whose body is being emitted; scopes identifier bindings.
    current_function: String,
    /// Arguments pushed since the last call.
    pending_args: usize,
    body: Vec<String>,
}

impl CodeGenerator {
    pub fn new(config: &CodegenConfig) -> Self {
        Self {
            convention: SpimConvention::new(config.frame_size),
            bootstrap: config.bootstrap,
            registers: RegisterFile::new(config.pool_sizes),
            bindings: ValueAssignmentManager::new(),
            current_function: String::new(),
            pending_args: 0,
            body: Vec::new(),
        }
    }

    /// Emit the code of one instruction.
    pub fn lower(&mut self, instruction: &Instruction) -> CompileResult<()> {
        log::trace!("codegen {}: {}", instruction.kind_name(), instruction);
        match instruction {
            Instruction::StartFunc { label } => {
                self.current_function = label.as_str().to_string();
                self.pending_args = 0;
                let lines = self.convention.prologue(label.as_str());
                self.emit_all(lines);
            }
            Instruction::ParamCount { count } => {
                let lines = self.convention.rewind_params(*count);
                self.emit_all(lines);
            }
            Instruction::Param { name, .. } => {
                let key = self.key_of(name).ok_or_else(|| {
                    CompileError::malformed(format!("parameter '{}' is not a name", name))
                })?;
                let reg = self.allocate(RegPool::Saved, name)?;
                self.bindings.bind(key, Binding::Register(reg));
                let lines = self.convention.load_param(&reg.to_string());
                self.emit_all(lines);
            }
            Instruction::EndFunc { .. } => {
                let line = self.convention.jump_return();
                self.emit(line);
            }
            Instruction::BinOp { dest, op, lhs, rhs } => {
                let lhs = self.in_register(lhs)?;
                let rhs = match self.resolve(rhs)? {
                    Source::Immediate(value) => value.to_string(),
                    Source::Register(reg) => reg,
                };
                let dest = self.destination(dest, RegPool::Temporary)?;
                self.emit(format!("{} {}, {}, {}", mnemonic(*op), dest, lhs, rhs));
            }
            Instruction::Assign { dest, src } => self.lower_assign(dest, src)?,
            Instruction::IfGoto { pred, label } => {
                let pred = self.in_register(pred)?;
                self.emit(format!("beqz {}, {}", pred, label));
            }
            Instruction::Label { name } => self.emit(format!("{}:", name)),
            Instruction::Call { dest, label } => {
                let dest = self.destination(dest, RegPool::Temporary)?;
                let lines = self.convention.call(label.as_str(), self.pending_args, &dest);
                self.pending_args = 0;
                self.emit_all(lines);
            }
            Instruction::Arg { value } => {
                let reg = match self.resolve(value)? {
                    Source::Register(reg) => reg,
                    Source::Immediate(constant) => {
                        let reg = self.allocate(RegPool::Argument, value)?;
                        self.emit(format!("li {}, {}", reg, constant));
                        reg.to_string()
                    }
                };
                self.pending_args += 1;
                let lines = self.convention.push_arg(&reg);
                self.emit_all(lines);
            }
            Instruction::Return { value } => {
                let source = self.resolve(value)?;
                let lines = self.convention.ret(&source);
                self.emit_all(lines);
            }
            Instruction::Print { value } => {
                let source = self.resolve(value)?;
                let lines = self.convention.print(&source);
                self.emit_all(lines);
            }
        }
        Ok(())
    }

    fn lower_assign(&mut self, dest: &Operand, src: &Operand) -> CompileResult<()> {
        let source = self.resolve(src)?;

        if let (Source::Immediate(value), Operand::Temporary(index)) = (&source, dest) {
            let key = BindingKey::Temporary(*index);
            if self.bindings.get(&key).is_none() {
                self.bindings.bind(key, Binding::Immediate(*value));
                return Ok(());
            }
        }

        let pool = if dest.is_identifier() {
            RegPool::Saved
        } else {
            RegPool::Temporary
        };
        let dest = self.destination(dest, pool)?;
        match source {
            Source::Immediate(value) => self.emit(format!("li {}, {}", dest, value)),
            Source::Register(reg) => self.emit(format!("move {}, {}", dest, reg)),
        }
        Ok(())
    }

    /// Finish generation and wrap the body in the program entry and exit.
    pub fn finish(self) -> Program {
        let mut lines = Vec::with_capacity(self.body.len() + 7);
        if self.bootstrap {
            lines.extend(self.convention.bootstrap());
        }
        lines.extend(self.body);
        if self.bootstrap {
            lines.extend(self.convention.exit());
        }
        log::debug!(
            "generated {} assembly lines ({} bindings)",
            lines.len(),
            self.bindings.len()
        );
        Program::new(lines, self.registers)
    }

    fn emit(&mut self, line: String) {
        self.body.push(line);
    }

    fn emit_all(&mut self, lines: Vec<String>) {
        self.body.extend(lines);
    }

    fn key_of(&self, operand: &Operand) -> Option<BindingKey> {
        match operand {
            Operand::Identifier(name) => Some(BindingKey::local(&self.current_function, name)),
            Operand::Temporary(index) => Some(BindingKey::Temporary(*index)),
            _ => None,
        }
    }

    /// Where the value of `operand` currently is.
    fn resolve(&self, operand: &Operand) -> CompileResult<Source> {
        match operand {
            Operand::Constant(value) => Ok(Source::Immediate(*value)),
            Operand::Identifier(_) | Operand::Temporary(_) => {
                let binding = self
                    .key_of(operand)
                    .and_then(|key| self.bindings.get(&key))
                    .ok_or_else(|| CompileError::UndefinedIdentifier {
                        name: operand.to_string(),
                    })?;
                Ok(match binding {
                    Binding::Register(reg) => Source::Register(reg.to_string()),
                    Binding::Immediate(value) => Source::Immediate(value),
                })
            }
            Operand::Saved(index) => Ok(Source::Register(format!("$s{}", index))),
            Operand::Argument(index) => Ok(Source::Register(format!("$a{}", index))),
            Operand::Literal(raw) => Ok(Source::Register(raw.clone())),
        }
    }

    /// Register holding `operand`, loading an immediate into a fresh
    /// temporary if needed. The binding itself is left unchanged.
    fn in_register(&mut self, operand: &Operand) -> CompileResult<String> {
        match self.resolve(operand)? {
            Source::Register(reg) => Ok(reg),
            Source::Immediate(value) => {
                let reg = self.allocate(RegPool::Temporary, operand)?;
                self.emit(format!("li {}, {}", reg, value));
                Ok(reg.to_string())
            }
        }
    }

    /// Register that receives a write to `dest`: its existing register, or a
    /// new one from `pool`.
    fn destination(&mut self, dest: &Operand, pool: RegPool) -> CompileResult<String> {
        let Some(key) = self.key_of(dest) else {
            return match dest {
                Operand::Saved(index) => Ok(format!("$s{}", index)),
                Operand::Argument(index) => Ok(format!("$a{}", index)),
                other => Err(CompileError::malformed(format!(
                    "'{}' cannot be assigned to",
                    other
                ))),
            };
        };
        if let Some(reg) = self.bindings.register_of(&key) {
            return Ok(reg.to_string());
        }
        let reg = self.allocate(pool, dest)?;
        self.bindings.bind(key, Binding::Register(reg));
        Ok(reg.to_string())
    }

    fn allocate(&mut self, pool: RegPool, operand: &Operand) -> CompileResult<AsmReg> {
        self.registers
            .allocate(pool)
            .map_err(|RegAllocError::PoolExhausted(pool)| CompileError::RegisterExhausted {
                pool: pool.name(),
                name: operand.to_string(),
            })
    }
}
