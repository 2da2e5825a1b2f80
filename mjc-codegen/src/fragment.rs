//! Code fragments: one procedure's selected instructions

use crate::asm::Instruction;
use crate::lifetime::LifetimeMap;
use crate::regalloc::RegisterMap;
use mjc_common::concat_names;
use mjc_ir::{IrFragment, TempManager};
use std::fmt;

/// Instructions of one procedure plus everything derived from them
#[derive(Debug, Clone)]
pub struct CodeFragment {
    pub class_name: String,
    pub method_name: String,
    pub is_entry: bool,
    pub locals: usize,
    pub code: Vec<Instruction>,
    /// Owner of every virtual register in `code`
    pub temps: TempManager,
    /// Recomputed wholesale whenever `code` changes shape
    pub lifetimes: LifetimeMap,
    /// Present once register allocation has run
    pub registers: Option<RegisterMap>,
}

impl CodeFragment {
    /// Wrap selected instructions, taking over the IR fragment's identity
    /// and temp manager
    pub fn new(ir: IrFragment, code: Vec<Instruction>) -> Self {
        Self {
            class_name: ir.class_name,
            method_name: ir.method_name,
            is_entry: ir.is_entry,
            locals: ir.locals,
            code,
            temps: ir.temps,
            lifetimes: LifetimeMap::default(),
            registers: None,
        }
    }

    /// Qualified name, `Class$method`
    pub fn name(&self) -> String {
        concat_names(&[self.class_name.as_str(), self.method_name.as_str()])
    }

    /// Label that starts the epilogue, `Class$method$epilogueBegin`
    pub fn epilogue_label(&self) -> String {
        concat_names(&[self.name().as_str(), "epilogueBegin"])
    }

    /// Recompute lifetimes from the current instruction list
    pub fn update_lifetimes(&mut self) {
        self.lifetimes = LifetimeMap::analyze(&self.code, &self.temps);
    }

    /// Number of instructions that are not labels or comments
    pub fn operation_count(&self) -> usize {
        self.code.iter().filter(|insn| !insn.is_marker()).count()
    }
}

impl fmt::Display for CodeFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        writeln!(f, "! Procedure fragment for {}", name)?;
        for insn in &self.code {
            if !insn.is_label() {
                write!(f, "    ")?;
            }
            writeln!(f, "{}", insn.format(self.registers.as_ref()))?;
        }
        writeln!(f, "! End fragment for {}", name)
    }
}
