//! Instruction Selection
//!
//! Maximal-munch tiling of a linearized IR fragment. Every expression is
//! munched bottom-up and yields the operand holding its value; statements
//! emit instructions and yield nothing. The parent of each node is passed
//! down as a [`Context`] because a few tiles (memory loads, call results)
//! depend on how the value is consumed.

use crate::asm::{Instruction, Operand};
use crate::fragment::CodeFragment;
use crate::target::{access_register, Target, TargetError};
use log::trace;
use mjc_ir::{BinaryOp, Exp, IrFragment, Stm, Temp, TempManager};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("Bad MOVE destination in IR: {0}")]
    BadMoveDestination(String),

    #[error("Bad MEM child in IR: {0}")]
    BadMemChild(String),

    #[error("Call target is not a NAME: {0}")]
    BadCallTarget(String),

    #[error("RELOP node used as a value in IR: {0}")]
    RelopAsValue(String),

    #[error("Operator {0} is not supported by the {1} target")]
    UnsupportedOperator(BinaryOp, &'static str),

    #[error("Access expression is not a register: {0}")]
    BadAccess(String),

    #[error(transparent)]
    Target(#[from] TargetError),
}

/// How the parent node consumes an expression's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    MoveSource,
    MoveDestination,
    BinaryOperand,
    Comparison,
    CallArgument,
    MemAddress,
    /// Value of an expression statement; thrown away
    Discard,
}

impl Context {
    /// Does a `MEM` in this position need its contents, or just its address?
    fn loads_memory(self) -> bool {
        matches!(
            self,
            Context::MoveSource
                | Context::BinaryOperand
                | Context::Comparison
                | Context::CallArgument
                | Context::MemAddress
        )
    }
}

/// Tile `ir` into a code fragment.
///
/// Registers named in the IR that are not machine registers are adopted by
/// the fragment's temp manager first; registers minted during selection are
/// owned by it as well. With `procedure_frames` the target's prologue and
/// epilogue wrap the body.
pub fn select_fragment<T: Target + ?Sized>(
    target: &T,
    mut ir: IrFragment,
    procedure_frames: bool,
) -> Result<CodeFragment, CodegenError> {
    adopt_ir_temps(target, &mut ir);

    let body = std::mem::take(&mut ir.body);
    let mut muncher = Muncher {
        target,
        temps: &mut ir.temps,
        code: Vec::new(),
    };
    for stm in &body {
        muncher.munch_stm(stm)?;
    }
    let code = muncher.code;

    let mut fragment = CodeFragment::new(ir, Vec::new());
    if procedure_frames {
        let mut framed = target.prologue(&fragment);
        framed.extend(code);
        framed.extend(target.epilogue(&fragment));
        fragment.code = framed;
    } else {
        fragment.code = code;
    }

    Ok(fragment)
}

fn adopt_ir_temps<T: Target + ?Sized>(target: &T, ir: &mut IrFragment) {
    let mut found = Vec::new();
    for stm in &ir.body {
        stm.collect_temps(&mut found);
    }
    let adopt: Vec<Temp> = found
        .into_iter()
        .filter(|temp| !target.is_physical_register(temp))
        .cloned()
        .collect();
    for temp in adopt {
        ir.temps.adopt(temp);
    }
}

struct Muncher<'a, T: Target + ?Sized> {
    target: &'a T,
    temps: &'a mut TempManager,
    code: Vec<Instruction>,
}

impl<'a, T: Target + ?Sized> Muncher<'a, T> {
    fn emit(&mut self, insn: Instruction) {
        trace!("emit {}", insn);
        self.code.push(insn);
    }

    fn emit_delay_slot(&mut self) {
        if let Some(filler) = self.target.delay_slot_filler() {
            self.emit(filler);
        }
    }

    fn register(&self, access: Exp) -> Result<Temp, CodegenError> {
        match access_register(&access) {
            Some(temp) => Ok(temp.clone()),
            None => Err(CodegenError::BadAccess(access.to_string())),
        }
    }

    fn munch_stm(&mut self, stm: &Stm) -> Result<(), CodegenError> {
        trace!("munch {}", stm);
        match stm {
            Stm::CJump {
                op,
                left,
                right,
                if_true,
                if_false,
            } => {
                let left = self.munch_exp(left, Context::Comparison)?;
                let right = self.munch_exp(right, Context::Comparison)?;
                let annotation = format!("compare ({}, {})", left, right);
                let cmp = self.target.compare(left, right).with_annotation(annotation);
                self.emit(cmp);

                // Both branches are always emitted; the optimizer drops the
                // unconditional one when its target falls through
                self.emit(self.target.branch(*op, if_true.clone()));
                self.emit_delay_slot();
                self.emit(self.target.jump(if_false.clone()));
                self.emit_delay_slot();
            }
            Stm::Eval(exp) => {
                self.munch_exp(exp, Context::Discard)?;
            }
            Stm::Jump(label) => {
                self.emit(self.target.jump(label.clone()));
                self.emit_delay_slot();
            }
            Stm::Label(label) => self.emit(Instruction::Label(label.clone())),
            Stm::Move { dst, src } => self.munch_move(stm, dst, src)?,
            Stm::Seq(first, second) => {
                self.munch_stm(first)?;
                self.munch_stm(second)?;
            }
        }
        Ok(())
    }

    fn munch_move(&mut self, stm: &Stm, dst: &Exp, src: &Exp) -> Result<(), CodegenError> {
        let value = self.munch_exp(src, Context::MoveSource)?;

        match dst {
            Exp::Temp(_) => {
                let dst = self.munch_exp(dst, Context::MoveDestination)?;
                let annotation = format!("{} -> {}", value, dst);
                self.emit(self.target.move_register(value, dst).with_annotation(annotation));
            }
            Exp::Mem(_) => {
                let addr = self.munch_exp(dst, Context::MoveDestination)?;
                let annotation = format!("{} -> *({})", value, addr);
                self.emit(self.target.store(value, addr).with_annotation(annotation));
            }
            _ => return Err(CodegenError::BadMoveDestination(stm.to_string())),
        }
        Ok(())
    }

    fn munch_exp(&mut self, exp: &Exp, context: Context) -> Result<Operand, CodegenError> {
        match exp {
            Exp::BinOp { op, left, right } => {
                let left = self.munch_exp(left, Context::BinaryOperand)?;
                let right = self.munch_exp(right, Context::BinaryOperand)?;
                let dst = self.temps.create();
                let annotation = format!("({} {} {}) -> {}", left, symbol(*op), right, dst);
                let insn = self
                    .target
                    .binary(*op, left, right, dst.clone())
                    .ok_or(CodegenError::UnsupportedOperator(*op, self.target.name()))?;
                self.emit(insn.with_annotation(annotation));
                Ok(Operand::Temp(dst))
            }
            Exp::Call { func, args } => self.munch_call(func, args, context),
            Exp::Const(value) => {
                let dst = self.temps.create();
                let annotation = format!("{} -> {}", value, dst);
                self.emit(
                    self.target
                        .load_immediate(i64::from(*value), dst.clone())
                        .with_annotation(annotation),
                );
                Ok(Operand::Temp(dst))
            }
            Exp::Mem(addr) => self.munch_mem(exp, addr, context),
            Exp::Name(label) => {
                let dst = self.temps.create();
                let annotation = format!("&{} -> {}", label, dst);
                self.emit(
                    self.target
                        .load_address(label.clone(), dst.clone())
                        .with_annotation(annotation),
                );
                Ok(Operand::Temp(dst))
            }
            Exp::ResultOf { stm, exp } => {
                // The value is consumed by whatever consumes this node
                self.munch_stm(stm)?;
                self.munch_exp(exp, context)
            }
            Exp::Temp(temp) => Ok(Operand::Temp(temp.clone())),
            Exp::Relop { .. } => Err(CodegenError::RelopAsValue(exp.to_string())),
        }
    }

    fn munch_mem(&mut self, exp: &Exp, addr: &Exp, context: Context) -> Result<Operand, CodegenError> {
        if !matches!(addr, Exp::Temp(_) | Exp::BinOp { .. } | Exp::Mem(_)) {
            return Err(CodegenError::BadMemChild(exp.to_string()));
        }

        let addr = self.munch_exp(addr, Context::MemAddress)?;
        if !context.loads_memory() {
            return Ok(addr);
        }

        let dst = self.temps.create();
        let annotation = format!("*({}) -> {}", addr, dst);
        self.emit(
            self.target
                .load(addr, Operand::Temp(dst.clone()))
                .with_annotation(annotation),
        );
        Ok(Operand::Temp(dst))
    }

    fn munch_call(&mut self, func: &Exp, args: &[Exp], context: Context) -> Result<Operand, CodegenError> {
        let name = match func {
            Exp::Name(label) => label.clone(),
            other => return Err(CodegenError::BadCallTarget(other.to_string())),
        };

        let max = self.target.argument_register_count();
        if args.len() > max {
            return Err(TargetError::TooManyArguments(args.len(), max).into());
        }

        // Nested calls overwrite the outgoing registers, so every argument
        // is evaluated before any of them is staged
        let values = args
            .iter()
            .map(|arg| self.munch_exp(arg, Context::CallArgument))
            .collect::<Result<Vec<_>, _>>()?;

        for (index, value) in values.into_iter().enumerate() {
            let register = self.register(self.target.formal_access_as_caller(index)?)?;
            let annotation = format!("{} -> {}", value, register);
            self.emit(
                self.target
                    .move_register(value, Operand::Temp(register))
                    .with_annotation(annotation),
            );
        }

        self.emit(self.target.call(name));
        self.emit_delay_slot();

        let result = self.register(self.target.return_access_as_caller())?;
        if context == Context::Discard {
            // Nobody reads the result: no copy, no fresh register
            return Ok(Operand::Temp(result));
        }

        let dst = self.temps.create();
        let annotation = format!("{} -> {}", result, dst);
        self.emit(
            self.target
                .move_register(Operand::Temp(result), Operand::Temp(dst.clone()))
                .with_annotation(annotation),
        );
        Ok(Operand::Temp(dst))
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::And => "&",
        BinaryOp::Or => "|",
        BinaryOp::Xor => "^",
        BinaryOp::LShift => "<<",
        BinaryOp::RShift => ">>>",
        BinaryOp::ARShift => ">>",
    }
}
