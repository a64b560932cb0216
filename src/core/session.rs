// This module provides the per-compilation session. CompilationSession owns a reference to
// the bumpalo arena that holds the parsed AST (nodes and their lexemes) so that the whole
// tree shares one lifetime and is released in one go once lowering is done. It also keeps
// SessionStats: how many TAC instructions the lowering produced, how many survived the
// optimizer and in how many rounds, how many assembly lines were emitted and how many
// registers each pool handed out. Nothing in a session outlives its compilation; there is
// no global state shared between compilation units.

//! Arena-based compilation session management.

use crate::core::register_file::RegPool;
use bumpalo::Bump;
use std::cell::RefCell;
use std::fmt;

/// Arena-based compilation session.
pub struct CompilationSession<'arena> {
    /// Arena allocator for AST nodes.
    arena: &'arena Bump,

    /// Session statistics.
    stats: RefCell<SessionStats>,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
        }
    }

    /// Allocate an object in the session arena.
    pub fn alloc<T>(&self, value: T) -> &'arena mut T {
        self.arena.alloc(value)
    }

    /// Copy a string into the session arena.
    pub fn alloc_str(&self, s: &str) -> &'arena str {
        self.arena.alloc_str(s)
    }

    pub fn record_ast_nodes(&self, count: usize) {
        self.stats.borrow_mut().ast_nodes = count;
    }

    pub fn record_lowered(&self, count: usize) {
        self.stats.borrow_mut().tac_lowered = count;
    }

    pub fn record_optimized(&self, count: usize, rounds: usize) {
        let mut stats = self.stats.borrow_mut();
        stats.tac_optimized = Some(count);
        stats.optimizer_rounds = rounds;
    }

    pub fn record_asm_lines(&self, count: usize) {
        self.stats.borrow_mut().asm_lines = count;
    }

    pub fn record_pool_usage(&self, pool: RegPool, used: u32) {
        let mut stats = self.stats.borrow_mut();
        match pool {
            RegPool::Temporary => stats.temporaries_allocated = used,
            RegPool::Saved => stats.saved_allocated = used,
            RegPool::Argument => stats.arguments_allocated = used,
        }
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Nodes in the parsed AST.
    pub ast_nodes: usize,
    /// TAC instructions produced by lowering.
    pub tac_lowered: usize,
    /// TAC instructions left after optimization, if the optimizer ran.
    pub tac_optimized: Option<usize>,
    /// Optimizer rounds until the fixpoint.
    pub optimizer_rounds: usize,
    /// Assembly lines emitted.
    pub asm_lines: usize,
    pub temporaries_allocated: u32,
    pub saved_allocated: u32,
    pub arguments_allocated: u32,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  AST nodes: {}", self.ast_nodes)?;
        writeln!(f, "  TAC instructions lowered: {}", self.tac_lowered)?;
        if let Some(optimized) = self.tac_optimized {
            writeln!(
                f,
                "  TAC instructions after optimization: {} ({} rounds)",
                optimized, self.optimizer_rounds
            )?;
        }
        writeln!(f, "  Assembly lines: {}", self.asm_lines)?;
        writeln!(
            f,
            "  Registers allocated: {} temporary, {} saved, {} argument",
            self.temporaries_allocated, self.saved_allocated, self.arguments_allocated
        )?;
        Ok(())
    }
}
