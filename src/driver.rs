//! End-to-end compilation: AST text in, TAC and assembly out.
//!
//! Each call to [`compile`] owns its own arena, session and counters, so
//! compilations are independent and the same input always yields the same
//! output. The first error from any stage aborts the run; nothing partial is
//! returned.

use crate::ast::{parse_ast, ParseConfig};
use crate::core::{CompilationSession, CompileResult, RegPool, SessionStats};
use crate::mips::{generate, CodegenConfig, Program};
use crate::opt::{optimize, OptimizerConfig};
use crate::tac::{build_tac, Instruction};
use bumpalo::Bump;

/// Settings for a whole compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub parse: ParseConfig,
    pub optimizer: OptimizerConfig,
    pub codegen: CodegenConfig,
    /// Stop after lowering (and optimizing); no assembly is generated.
    pub tac_only: bool,
}

/// Everything a compilation produced.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Final TAC list, after optimization when it ran.
    pub tac: Vec<Instruction>,
    /// Assembly, unless `tac_only` was set.
    pub program: Option<Program>,
    pub stats: SessionStats,
}

impl CompileOutput {
    pub fn tac_lines(&self) -> Vec<String> {
        crate::tac::render(&self.tac)
    }
}

/// Compile indented-text AST into TAC and, unless disabled, MIPS assembly.
pub fn compile(ast_text: &str, options: &CompileOptions) -> CompileResult<CompileOutput> {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);

    let root = parse_ast(&session, ast_text, &options.parse)?;
    let mut tac = build_tac(root)?;
    session.record_lowered(tac.len());

    if options.optimizer.enabled {
        let optimized = optimize(tac, &options.optimizer);
        session.record_optimized(optimized.instructions.len(), optimized.rounds);
        tac = optimized.instructions;
    }

    let program = if options.tac_only {
        None
    } else {
        let program = generate(&tac, &options.codegen)?;
        session.record_asm_lines(program.lines().len());
        for pool in RegPool::ALL {
            session.record_pool_usage(pool, program.pool_usage(pool).0);
        }
        Some(program)
    };

    let stats = session.stats();
    log::debug!("compilation finished: {} TAC instructions", tac.len());
    Ok(CompileOutput {
        tac,
        program,
        stats,
    })
}
