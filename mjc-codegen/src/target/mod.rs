//! Target Descriptor
//!
//! A [`Target`] answers every architecture question the backend asks: frame
//! layout, register classes, how IR accesses map onto machine registers, the
//! instruction templates the selector emits, and how the optimizer should
//! classify opcodes. The selector, optimizer and allocator are written only
//! against this trait, so adding an architecture means adding one `impl`.

pub mod sparc;

pub use sparc::Sparc;

use crate::asm::{Instruction, Operand};
use crate::fragment::CodeFragment;
use crate::peephole;
use crate::select::{self, CodegenError};
use mjc_common::ArchType;
use mjc_ir::{BinaryOp, Exp, IrFragment, Label, RelOp, Temp};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetError {
    #[error("Too many arguments: {0} (maximum: {1})")]
    TooManyArguments(usize, usize),

    #[error("No local register {0} (only {1} available)")]
    NoSuchLocalRegister(usize, usize),
}

/// What an instruction does, as far as the optimizer cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Sub,
    /// Unconditional branch
    Jump,
    /// Conditional branch
    Branch,
    Call,
    LoadImmediate,
    Move,
    Load,
    Store,
    Compare,
    Nop,
    Other,
}

impl OpKind {
    /// The IR operator this kind computes, for arithmetic kinds
    pub fn operator(&self) -> Option<BinaryOp> {
        match self {
            OpKind::Add => Some(BinaryOp::Plus),
            OpKind::Sub => Some(BinaryOp::Minus),
            _ => None,
        }
    }
}

/// Direction of a base+offset address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSign {
    Plus,
    Minus,
}

impl OffsetSign {
    pub fn symbol(&self) -> char {
        match self {
            OffsetSign::Plus => '+',
            OffsetSign::Minus => '-',
        }
    }
}

pub trait Target {
    fn name(&self) -> &'static str;

    // ===== Frame layout and register classes =====

    /// Bytes per machine word
    fn word_size(&self) -> usize;

    /// Bytes to reserve for a frame holding `locals` stack locals
    fn stack_frame_size(&self, locals: usize) -> usize;

    /// Does this name denote a machine register?
    fn is_physical_register(&self, temp: &Temp) -> bool;

    /// The `this` pointer inside a method
    fn self_access(&self) -> Exp;

    /// Where a procedure leaves its return value
    fn return_access_as_callee(&self) -> Exp;

    /// Where a caller finds the return value after a call
    fn return_access_as_caller(&self) -> Exp;

    fn stack_access(&self) -> Exp;

    fn frame_access(&self) -> Exp;

    /// Address of the `index`th stack local
    fn local_access(&self, index: usize) -> Exp;

    /// How many arguments travel in registers
    fn argument_register_count(&self) -> usize;

    fn formal_access_as_callee(&self, index: usize) -> Result<Exp, TargetError>;

    fn formal_access_as_caller(&self, index: usize) -> Result<Exp, TargetError>;

    fn local_register_access(&self, index: usize) -> Result<Exp, TargetError>;

    /// The allocatable register pool, in preference order
    fn local_registers(&self) -> Vec<Temp>;

    // ===== Instruction templates =====

    fn load_immediate(&self, value: i64, dst: Temp) -> Instruction;

    fn load_address(&self, label: Label, dst: Temp) -> Instruction;

    /// `None` when the operator has no instruction on this target
    fn binary(&self, op: BinaryOp, left: Operand, right: Operand, dst: Temp) -> Option<Instruction>;

    fn compare(&self, left: Operand, right: Operand) -> Instruction;

    /// Conditional branch taken when the last comparison satisfied `op`
    fn branch(&self, op: RelOp, target: Label) -> Instruction;

    fn jump(&self, target: Label) -> Instruction;

    fn call(&self, target: Label) -> Instruction;

    /// Instruction placed after a delayed branch, if the target has delay slots
    fn delay_slot_filler(&self) -> Option<Instruction>;

    fn load(&self, addr: Operand, dst: Operand) -> Instruction;

    fn store(&self, src: Operand, addr: Operand) -> Instruction;

    fn move_register(&self, src: Operand, dst: Operand) -> Instruction;

    /// Load from `[base ± offset]`
    fn offset_load(&self, base: Operand, offset: Operand, sign: OffsetSign, dst: Operand) -> Instruction;

    /// Store to `[base ± offset]`
    fn offset_store(&self, src: Operand, base: Operand, offset: Operand, sign: OffsetSign) -> Instruction;

    /// Instructions that open a procedure (starting with its entry label)
    fn prologue(&self, fragment: &CodeFragment) -> Vec<Instruction>;

    /// Instructions that close a procedure (starting with its epilogue label)
    fn epilogue(&self, fragment: &CodeFragment) -> Vec<Instruction>;

    // ===== Optimizer hooks =====

    fn classify(&self, insn: &Instruction) -> OpKind;

    /// Can this kind of instruction take an immediate in its last source slot?
    fn accepts_immediate(&self, kind: OpKind) -> bool;

    /// Does the value fit the immediate field?
    fn immediate_fits(&self, value: i64) -> bool;

    // ===== Entry points =====

    /// Tile one IR fragment into instructions
    fn select(&self, fragment: IrFragment, procedure_frames: bool) -> Result<CodeFragment, CodegenError> {
        select::select_fragment(self, fragment, procedure_frames)
    }

    /// One peephole pass; true if anything changed
    fn optimize_pass(&self, fragment: &mut CodeFragment) -> bool {
        peephole::optimize_pass(self, fragment)
    }
}

/// Look up the target for an architecture
pub fn for_arch(arch: ArchType) -> Box<dyn Target> {
    match arch {
        ArchType::Sparc => Box::new(Sparc::new()),
    }
}

/// Register named by an access expression, if it is a bare `TEMP`
pub fn access_register(exp: &Exp) -> Option<&Temp> {
    match exp {
        Exp::Temp(temp) => Some(temp),
        _ => None,
    }
}
