// This module is the hub for the infrastructure shared by every stage of cmmc: the
// compilation session (AST arena and statistics), the register file with its three
// exhaustible pools, the name-to-register binding table used by the code generator, and
// the CompileError type that every stage reports through.

//! Core cmmc infrastructure.
//!
//! # Key Components
//!
//! ## Session Management (`session`)
//! - Arena allocation of the AST using `bumpalo`
//! - Per-compilation statistics
//!
//! ## Register Allocation (`register_file`)
//! - Temporary, saved and argument pools, consumed in order
//! - No reuse, no spilling: exhaustion is an error
//!
//! ## Bindings (`value_assignment`)
//! - Function-scoped identifiers, global temporaries
//! - Register or deferred-immediate locations

pub mod error;
pub mod register_file;
pub mod session;
pub mod value_assignment;

pub use error::{CompileError, CompileResult};

pub use register_file::{AsmReg, RegAllocError, RegBitSet, RegPool, RegisterFile};

pub use session::{CompilationSession, SessionStats};

pub use value_assignment::{Binding, BindingKey, ValueAssignmentManager};
