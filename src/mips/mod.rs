//! MIPS (SPIM) back end.
//!
//! [`generate`] turns a TAC list into a [`Program`]: one assembly line per
//! entry, labels ending in `:`, comments starting with `#`.

pub mod calling_convention;
pub mod codegen;

pub use calling_convention::SpimConvention;
pub use codegen::{generate, mnemonic, CodeGenerator};

use crate::core::{RegPool, RegisterFile};
use std::fmt;

/// Code generator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Registers per pool, in [temporary, saved, argument] order. The
    /// default hands out `$t0-$t8`, `$s0-$s6` and `$a0-$a3`.
    pub pool_sizes: [u8; 3],
    /// Bytes allocated for each activation record.
    pub frame_size: u32,
    /// Wrap the output in the program entry (`jal main`) and exit sequence.
    pub bootstrap: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            pool_sizes: [9, 7, 4],
            frame_size: 48,
            bootstrap: true,
        }
    }
}

/// Generated assembly.
#[derive(Debug, Clone)]
pub struct Program {
    lines: Vec<String>,
    registers: RegisterFile,
}

impl Program {
    pub(crate) fn new(lines: Vec<String>, registers: RegisterFile) -> Self {
        Self { lines, registers }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// (used, total) registers of `pool` after generation.
    pub fn pool_usage(&self, pool: RegPool) -> (u32, u32) {
        self.registers.pool_usage(pool)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
