//! MiniJava Compiler - Code Generation Backend
//!
//! This crate turns per-procedure IR fragments into SPARC assembly. It
//! includes:
//!
//! - Instruction selection against a pluggable [`Target`]
//! - Textual lifetime analysis
//! - A peephole optimizer run to fixpoint
//! - First-fit register allocation without spilling
//! - The phase driver and assembly emission

pub mod asm;
pub mod emit;
pub mod fragment;
pub mod lifetime;
pub mod peephole;
pub mod pipeline;
pub mod regalloc;
pub mod samples;
pub mod select;
pub mod target;

pub use asm::{Instruction, Operand};
pub use emit::{emit_fragment, emit_program, write_program};
pub use fragment::CodeFragment;
pub use lifetime::{Lifetime, LifetimeMap};
pub use pipeline::Backend;
pub use regalloc::{Allocation, RegAllocError, RegisterMap, RegisterPool};
pub use select::CodegenError;
pub use target::{OffsetSign, OpKind, Sparc, Target, TargetError};

#[cfg(test)]
mod tests;
