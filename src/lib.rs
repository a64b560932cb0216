//! cmmc - middle and back end of a small C-- compiler.
//!
//! cmmc reads the indented-text syntax tree printed by the C-- front end,
//! lowers it to three-address code, optionally optimizes that code to a
//! fixpoint and emits SPIM-flavoured MIPS assembly.
//!
//! # Primary Usage
//!
//! ```
//! use cmmc::{compile, CompileOptions};
//!
//! let ast = "apply\n  print\n  +\n    1\n    2\n";
//! let mut options = CompileOptions::default();
//! options.optimizer.enabled = true;
//!
//! let output = compile(ast, &options)?;
//! assert_eq!(output.tac_lines(), vec!["t0 := 3", "print t0"]);
//! # Ok::<(), cmmc::CompileError>(())
//! ```
//!
//! # Architecture
//!
//! - [`ast`] - Indented-text parser and syntax tree
//! - [`tac`] - Three-address code and the lowering from the tree
//! - [`opt`] - Peephole, dead code and copy propagation passes
//! - [`mips`] - Register allocation and assembly emission
//! - [`core`] - Shared infrastructure (errors, session, registers, bindings)
//! - [`driver`] - The whole pipeline
//! - [`filecheck`] - Golden-file test runner

pub mod ast;
pub mod core;
pub mod driver;
pub mod filecheck;
pub mod mips;
pub mod opt;
pub mod tac;

pub use crate::core::{CompilationSession, CompileError, CompileResult, SessionStats};
pub use ast::{parse_ast, ParseConfig};
pub use driver::{compile, CompileOptions, CompileOutput};
pub use mips::{generate, CodegenConfig, Program};
pub use opt::{optimize, OptimizerConfig, Optimized};
pub use tac::{build_tac, BinaryOp, Instruction, Label, Operand};
