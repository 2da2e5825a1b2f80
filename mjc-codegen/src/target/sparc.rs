//! SPARC V8 target
//!
//! Register usage:
//! - %i0-%i5: incoming arguments (%i0 is `this`, and the callee's return value)
//! - %o0-%o5: outgoing arguments (%o0 holds the result after a call)
//! - %l0-%l7: locals, the allocatable pool
//! - %g0-%g7: globals, never allocated
//! - %sp, %fp: stack and frame pointer
//!
//! Every branch and call has a delay slot, which the selector fills with `nop`.

use super::{OffsetSign, OpKind, Target, TargetError};
use crate::asm::{Instruction, Operand};
use crate::fragment::CodeFragment;
use mjc_ir::{BinaryOp, Exp, Label, RelOp, Temp};

/// SPARC register windows with delayed branches
#[derive(Debug, Clone, Copy, Default)]
pub struct Sparc;

impl Sparc {
    /// Registers per window group (%i, %o, %l, %g)
    pub const GROUP_SIZE: usize = 8;

    /// Arguments passed in %o0-%o5 / %i0-%i5
    pub const MAX_REG_ARGS: usize = 6;

    /// Words every frame reserves besides locals: 16 for the register
    /// window save area, 1 for the struct-return pointer, 6 for the
    /// callee's argument spill slots
    pub const FRAME_OVERHEAD_WORDS: usize = 16 + 1 + 6;

    /// Signed 13-bit immediate field
    pub const SIMM13_MIN: i64 = -4096;
    pub const SIMM13_MAX: i64 = 4095;

    pub fn new() -> Self {
        Sparc
    }

    fn register(group: char, index: usize) -> Temp {
        Temp::new(format!("%{}{}", group, index))
    }

    fn argument_register(&self, group: char, index: usize) -> Result<Exp, TargetError> {
        if index >= Self::MAX_REG_ARGS {
            return Err(TargetError::TooManyArguments(index + 1, Self::MAX_REG_ARGS));
        }
        Ok(Exp::Temp(Self::register(group, index)))
    }

    fn nop() -> Instruction {
        Instruction::new_oper("nop", vec![], vec![]).with_annotation("(do nothing in delay slot)")
    }

    fn branch_mnemonic(op: RelOp) -> &'static str {
        match op {
            RelOp::Eq => "be",
            RelOp::Ne => "bne",
            RelOp::Lt => "bl",
            RelOp::Gt => "bg",
            RelOp::Le => "ble",
            RelOp::Ge => "bge",
            RelOp::Ult => "blu",
            RelOp::Ugt => "bgu",
            RelOp::Ule => "bleu",
            RelOp::Uge => "bgeu",
        }
    }

    const CONDITIONAL_BRANCHES: [&'static str; 10] =
        ["be", "bne", "bl", "bg", "ble", "bge", "blu", "bgu", "bleu", "bgeu"];
}

impl Target for Sparc {
    fn name(&self) -> &'static str {
        "sparc"
    }

    fn word_size(&self) -> usize {
        4
    }

    fn stack_frame_size(&self, locals: usize) -> usize {
        let bytes = (locals + Self::FRAME_OVERHEAD_WORDS) * self.word_size();
        // Double-word align
        (bytes + 7) & !7
    }

    fn is_physical_register(&self, temp: &Temp) -> bool {
        let name = temp.name();
        if name == "%sp" || name == "%fp" {
            return true;
        }

        let bytes = name.as_bytes();
        bytes.len() == 3
            && bytes[0] == b'%'
            && matches!(bytes[1], b'i' | b'o' | b'l' | b'g')
            && (b'0'..=b'7').contains(&bytes[2])
    }

    fn self_access(&self) -> Exp {
        Exp::temp("%i0")
    }

    fn return_access_as_callee(&self) -> Exp {
        Exp::temp("%i0")
    }

    fn return_access_as_caller(&self) -> Exp {
        Exp::temp("%o0")
    }

    fn stack_access(&self) -> Exp {
        Exp::temp("%sp")
    }

    fn frame_access(&self) -> Exp {
        Exp::temp("%fp")
    }

    fn local_access(&self, index: usize) -> Exp {
        // Skip one word of padding below the frame pointer
        let offset = (index + 1) * self.word_size();
        Exp::binop(BinaryOp::Minus, self.frame_access(), Exp::constant(offset as i32))
    }

    fn argument_register_count(&self) -> usize {
        Self::MAX_REG_ARGS
    }

    fn formal_access_as_callee(&self, index: usize) -> Result<Exp, TargetError> {
        self.argument_register('i', index)
    }

    fn formal_access_as_caller(&self, index: usize) -> Result<Exp, TargetError> {
        self.argument_register('o', index)
    }

    fn local_register_access(&self, index: usize) -> Result<Exp, TargetError> {
        if index >= Self::GROUP_SIZE {
            return Err(TargetError::NoSuchLocalRegister(index, Self::GROUP_SIZE));
        }
        Ok(Exp::Temp(Self::register('l', index)))
    }

    fn local_registers(&self) -> Vec<Temp> {
        (0..Self::GROUP_SIZE).map(|i| Self::register('l', i)).collect()
    }

    fn load_immediate(&self, value: i64, dst: Temp) -> Instruction {
        Instruction::new_oper("set `s0, `d0", vec![dst.into()], vec![Operand::Imm(value)])
    }

    fn load_address(&self, label: Label, dst: Temp) -> Instruction {
        Instruction::new_oper("set `s0, `d0", vec![dst.into()], vec![Operand::Name(label)])
    }

    fn binary(&self, op: BinaryOp, left: Operand, right: Operand, dst: Temp) -> Option<Instruction> {
        let mnemonic = match op {
            BinaryOp::Plus => "add",
            BinaryOp::Minus => "sub",
            BinaryOp::Mul => "smul",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::LShift => "sll",
            BinaryOp::RShift => "srl",
            BinaryOp::ARShift => "sra",
            // sdiv needs %y set up first
            BinaryOp::Div => return None,
        };
        Some(Instruction::new_oper(
            format!("{} `s0, `s1, `d0", mnemonic),
            vec![dst.into()],
            vec![left, right],
        ))
    }

    fn compare(&self, left: Operand, right: Operand) -> Instruction {
        Instruction::new_oper("cmp `s0, `s1", vec![], vec![left, right])
    }

    fn branch(&self, op: RelOp, target: Label) -> Instruction {
        Instruction::new_oper(format!("{} `j0", Self::branch_mnemonic(op)), vec![], vec![])
            .with_jumps(vec![target])
    }

    fn jump(&self, target: Label) -> Instruction {
        Instruction::new_oper("ba `j0", vec![], vec![]).with_jumps(vec![target])
    }

    fn call(&self, target: Label) -> Instruction {
        Instruction::new_oper("call `j0", vec![], vec![]).with_jumps(vec![target])
    }

    fn delay_slot_filler(&self) -> Option<Instruction> {
        Some(Self::nop())
    }

    fn load(&self, addr: Operand, dst: Operand) -> Instruction {
        Instruction::new_oper("ld [`s0], `d0", vec![dst], vec![addr])
    }

    fn store(&self, src: Operand, addr: Operand) -> Instruction {
        // The address is listed as a definition so its lifetime reaches the store
        Instruction::new_oper("st `s0, [`d0]", vec![addr], vec![src])
    }

    fn move_register(&self, src: Operand, dst: Operand) -> Instruction {
        Instruction::new_move("mov `s0, `d0", dst, src)
    }

    fn offset_load(&self, base: Operand, offset: Operand, sign: OffsetSign, dst: Operand) -> Instruction {
        Instruction::new_oper(
            format!("ld [`s0{}`s1], `d0", sign.symbol()),
            vec![dst],
            vec![base, offset],
        )
    }

    fn offset_store(&self, src: Operand, base: Operand, offset: Operand, sign: OffsetSign) -> Instruction {
        Instruction::new_oper(
            format!("st `s0, [`d0{}`d1]", sign.symbol()),
            vec![base, offset],
            vec![src],
        )
    }

    fn prologue(&self, fragment: &CodeFragment) -> Vec<Instruction> {
        let mut code = vec![Instruction::Label(Label::new(fragment.name()))];

        if fragment.is_entry {
            code.push(Instruction::Comment("Main function does not have a stack frame.".to_string()));
            code.push(Instruction::Comment("As a result, the prologue is empty.".to_string()));
        } else {
            let size = self.stack_frame_size(fragment.locals);
            code.push(
                Instruction::new_oper(format!("save %sp, -{}, %sp", size), vec![], vec![])
                    .with_annotation(format!("{} locals", fragment.locals)),
            );
        }

        code
    }

    fn epilogue(&self, fragment: &CodeFragment) -> Vec<Instruction> {
        let mut code = vec![Instruction::Label(Label::new(fragment.epilogue_label()))];

        if fragment.is_entry {
            // Main has to call exit so buffered output gets flushed
            code.push(Instruction::new_oper("clr %o0", vec![], vec![]));
            code.push(self.call(Label::new("exit")));
            code.push(Self::nop());
        } else {
            code.push(Instruction::new_oper("ret", vec![], vec![]));
            code.push(Instruction::new_oper("restore", vec![], vec![]).with_annotation("(utilize delay slot)"));
        }

        code
    }

    fn classify(&self, insn: &Instruction) -> OpKind {
        let opcode = match insn.opcode() {
            Some(opcode) => opcode,
            None => return OpKind::Other,
        };

        match opcode {
            "add" => OpKind::Add,
            "sub" => OpKind::Sub,
            "ba" => OpKind::Jump,
            "call" => OpKind::Call,
            "set" => OpKind::LoadImmediate,
            "mov" => OpKind::Move,
            "ld" => OpKind::Load,
            "st" => OpKind::Store,
            "cmp" => OpKind::Compare,
            "nop" => OpKind::Nop,
            op if Self::CONDITIONAL_BRANCHES.iter().any(|branch| *branch == op) => OpKind::Branch,
            _ => OpKind::Other,
        }
    }

    fn accepts_immediate(&self, kind: OpKind) -> bool {
        matches!(kind, OpKind::Add | OpKind::Sub | OpKind::Compare)
    }

    fn immediate_fits(&self, value: i64) -> bool {
        (Self::SIMM13_MIN..=Self::SIMM13_MAX).contains(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mjc_ir::IrFragment;
    use pretty_assertions::assert_eq;

    fn fragment(is_entry: bool, locals: usize) -> CodeFragment {
        let mut ir = IrFragment::new("Fac", "ComputeFac").with_locals(locals);
        ir.is_entry = is_entry;
        CodeFragment::new(ir, Vec::new())
    }

    fn render(code: &[Instruction]) -> Vec<String> {
        code.iter().map(|insn| insn.to_string()).collect()
    }

    #[test]
    fn test_stack_frame_size_is_double_word_aligned() {
        let sparc = Sparc::new();
        assert_eq!(sparc.stack_frame_size(0), 96);
        assert_eq!(sparc.stack_frame_size(1), 96);
        assert_eq!(sparc.stack_frame_size(2), 104);
        for locals in 0..20 {
            assert_eq!(sparc.stack_frame_size(locals) % 8, 0);
        }
    }

    #[test]
    fn test_physical_register_recognition() {
        let sparc = Sparc::new();
        for name in ["%i0", "%o5", "%l7", "%g0", "%sp", "%fp"] {
            assert!(sparc.is_physical_register(&Temp::new(name)), "{}", name);
        }
        for name in ["t0000", "%l8", "%x1", "%i10", "l0", "%"] {
            assert!(!sparc.is_physical_register(&Temp::new(name)), "{}", name);
        }
    }

    #[test]
    fn test_access_expressions() {
        let sparc = Sparc::new();
        assert_eq!(sparc.self_access(), Exp::temp("%i0"));
        assert_eq!(sparc.return_access_as_caller(), Exp::temp("%o0"));
        assert_eq!(sparc.formal_access_as_callee(2), Ok(Exp::temp("%i2")));
        assert_eq!(sparc.formal_access_as_caller(5), Ok(Exp::temp("%o5")));
        assert_eq!(
            sparc.local_access(1),
            Exp::binop(BinaryOp::Minus, Exp::temp("%fp"), Exp::constant(8))
        );
        assert_eq!(sparc.local_register_access(7), Ok(Exp::temp("%l7")));
        assert_eq!(sparc.local_registers().len(), 8);
    }

    #[test]
    fn test_register_class_overflow() {
        let sparc = Sparc::new();
        assert_eq!(
            sparc.formal_access_as_caller(6),
            Err(TargetError::TooManyArguments(7, 6))
        );
        assert_eq!(
            sparc.local_register_access(8),
            Err(TargetError::NoSuchLocalRegister(8, 8))
        );
    }

    #[test]
    fn test_division_is_refused() {
        let sparc = Sparc::new();
        let t = Temp::new("t0000");
        assert!(sparc
            .binary(BinaryOp::Div, Operand::Imm(1), Operand::Imm(2), t.clone())
            .is_none());
        let mul = sparc.binary(BinaryOp::Mul, t.clone().into(), Operand::Imm(2), t).unwrap();
        assert_eq!(mul.to_string(), "smul t0000, 2, t0000");
    }

    #[test]
    fn test_classification() {
        let sparc = Sparc::new();
        let t = Temp::new("t0000");
        assert_eq!(sparc.classify(&sparc.load_immediate(1, t.clone())), OpKind::LoadImmediate);
        assert_eq!(sparc.classify(&sparc.branch(RelOp::Le, Label::new("x"))), OpKind::Branch);
        assert_eq!(sparc.classify(&sparc.jump(Label::new("x"))), OpKind::Jump);
        assert_eq!(sparc.classify(&Sparc::nop()), OpKind::Nop);
        assert_eq!(
            sparc.classify(&sparc.move_register(t.clone().into(), t.into())),
            OpKind::Move
        );
        assert_eq!(sparc.classify(&Instruction::Label(Label::new("x"))), OpKind::Other);
    }

    #[test]
    fn test_immediate_range() {
        let sparc = Sparc::new();
        assert!(sparc.immediate_fits(-4096));
        assert!(sparc.immediate_fits(4095));
        assert!(!sparc.immediate_fits(4096));
        assert!(!sparc.immediate_fits(-4097));
        assert!(sparc.accepts_immediate(OpKind::Compare));
        assert!(!sparc.accepts_immediate(OpKind::Load));
    }

    #[test]
    fn test_offset_addressing_templates() {
        let sparc = Sparc::new();
        let fp: Operand = Temp::new("%fp").into();
        let ld = sparc.offset_load(fp.clone(), Operand::Imm(8), OffsetSign::Minus, Temp::new("t0001").into());
        assert_eq!(ld.to_string(), "ld [%fp-8], t0001");

        let st = sparc.offset_store(Temp::new("t0002").into(), fp, Operand::Imm(4), OffsetSign::Plus);
        assert_eq!(st.to_string(), "st t0002, [%fp+4]");
    }

    #[test]
    fn test_method_prologue_and_epilogue() {
        let sparc = Sparc::new();
        let frag = fragment(false, 2);
        assert_eq!(
            render(&sparc.prologue(&frag)),
            vec!["Fac$ComputeFac:", "save %sp, -104, %sp ! 2 locals"]
        );
        assert_eq!(
            render(&sparc.epilogue(&frag)),
            vec!["Fac$ComputeFac$epilogueBegin:", "ret", "restore ! (utilize delay slot)"]
        );
    }

    #[test]
    fn test_entry_prologue_and_epilogue() {
        let sparc = Sparc::new();
        let frag = fragment(true, 0);
        assert_eq!(
            render(&sparc.prologue(&frag)),
            vec![
                "Fac$ComputeFac:",
                "! Main function does not have a stack frame.",
                "! As a result, the prologue is empty.",
            ]
        );
        assert_eq!(
            render(&sparc.epilogue(&frag)),
            vec![
                "Fac$ComputeFac$epilogueBegin:",
                "clr %o0",
                "call exit",
                "nop ! (do nothing in delay slot)",
            ]
        );
    }
}
