//! IR statement and expression trees
//!
//! Trees are immutable as far as the backend is concerned. They serialize to
//! externally tagged JSON (`{"move": {"dst": ..., "src": ...}}`) and display
//! in a compact prefix form used by diagnostics and verbose dumps.

use crate::{BinaryOp, Label, RelOp, Temp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// IR statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stm {
    /// Branch to `if_true` when `left op right`, else to `if_false`
    #[serde(rename = "cjump")]
    CJump {
        op: RelOp,
        left: Box<Exp>,
        right: Box<Exp>,
        if_true: Label,
        if_false: Label,
    },

    /// Evaluate for side effects, discarding the value
    Eval(Box<Exp>),

    Jump(Label),

    Label(Label),

    /// Store `src` into a register (`TEMP`) or memory cell (`MEM`)
    Move { dst: Box<Exp>, src: Box<Exp> },

    Seq(Box<Stm>, Box<Stm>),
}

/// IR expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exp {
    BinOp {
        op: BinaryOp,
        left: Box<Exp>,
        right: Box<Exp>,
    },

    /// Call a named procedure
    Call { func: Box<Exp>, args: Vec<Exp> },

    Const(i32),

    /// Memory cell at the given address
    Mem(Box<Exp>),

    Name(Label),

    /// Execute `stm`, then yield `exp`
    ResultOf { stm: Box<Stm>, exp: Box<Exp> },

    Temp(Temp),

    /// Comparison producing a value; only valid under a conditional jump
    Relop {
        op: RelOp,
        left: Box<Exp>,
        right: Box<Exp>,
    },
}

impl Stm {
    pub fn mov(dst: Exp, src: Exp) -> Self {
        Stm::Move {
            dst: Box::new(dst),
            src: Box::new(src),
        }
    }

    pub fn eval(exp: Exp) -> Self {
        Stm::Eval(Box::new(exp))
    }

    pub fn jump(label: impl Into<Label>) -> Self {
        Stm::Jump(label.into())
    }

    pub fn label(label: impl Into<Label>) -> Self {
        Stm::Label(label.into())
    }

    pub fn cjump(
        op: RelOp,
        left: Exp,
        right: Exp,
        if_true: impl Into<Label>,
        if_false: impl Into<Label>,
    ) -> Self {
        Stm::CJump {
            op,
            left: Box::new(left),
            right: Box::new(right),
            if_true: if_true.into(),
            if_false: if_false.into(),
        }
    }

    /// Right-nested sequence of the given statements, `None` if empty
    pub fn seq(stms: Vec<Stm>) -> Option<Self> {
        stms.into_iter()
            .rev()
            .reduce(|rest, stm| Stm::Seq(Box::new(stm), Box::new(rest)))
    }

    /// Every register mentioned in this statement, in tree order
    pub fn collect_temps<'a>(&'a self, out: &mut Vec<&'a Temp>) {
        match self {
            Stm::CJump { left, right, .. } => {
                left.collect_temps(out);
                right.collect_temps(out);
            }
            Stm::Eval(exp) => exp.collect_temps(out),
            Stm::Jump(_) | Stm::Label(_) => {}
            Stm::Move { dst, src } => {
                dst.collect_temps(out);
                src.collect_temps(out);
            }
            Stm::Seq(first, second) => {
                first.collect_temps(out);
                second.collect_temps(out);
            }
        }
    }
}

impl Exp {
    pub fn temp(name: impl Into<Temp>) -> Self {
        Exp::Temp(name.into())
    }

    pub fn constant(value: i32) -> Self {
        Exp::Const(value)
    }

    pub fn name(label: impl Into<Label>) -> Self {
        Exp::Name(label.into())
    }

    pub fn mem(addr: Exp) -> Self {
        Exp::Mem(Box::new(addr))
    }

    pub fn binop(op: BinaryOp, left: Exp, right: Exp) -> Self {
        Exp::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(func: impl Into<Label>, args: Vec<Exp>) -> Self {
        Exp::Call {
            func: Box::new(Exp::Name(func.into())),
            args,
        }
    }

    pub fn result_of(stm: Stm, exp: Exp) -> Self {
        Exp::ResultOf {
            stm: Box::new(stm),
            exp: Box::new(exp),
        }
    }

    pub fn collect_temps<'a>(&'a self, out: &mut Vec<&'a Temp>) {
        match self {
            Exp::BinOp { left, right, .. } | Exp::Relop { left, right, .. } => {
                left.collect_temps(out);
                right.collect_temps(out);
            }
            Exp::Call { func, args } => {
                func.collect_temps(out);
                for arg in args {
                    arg.collect_temps(out);
                }
            }
            Exp::Const(_) | Exp::Name(_) => {}
            Exp::Mem(addr) => addr.collect_temps(out),
            Exp::ResultOf { stm, exp } => {
                stm.collect_temps(out);
                exp.collect_temps(out);
            }
            Exp::Temp(temp) => out.push(temp),
        }
    }
}

impl fmt::Display for Stm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stm::CJump {
                op,
                left,
                right,
                if_true,
                if_false,
            } => write!(f, "CJUMP({}, {}, {}, {}, {})", op, left, right, if_true, if_false),
            Stm::Eval(exp) => write!(f, "EXP({})", exp),
            Stm::Jump(label) => write!(f, "JUMP({})", label),
            Stm::Label(label) => write!(f, "LABEL {}", label),
            Stm::Move { dst, src } => write!(f, "MOVE({}, {})", dst, src),
            Stm::Seq(first, second) => write!(f, "SEQ({}, {})", first, second),
        }
    }
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exp::BinOp { op, left, right } => write!(f, "BINOP({}, {}, {})", op, left, right),
            Exp::Call { func, args } => {
                write!(f, "CALL({}, [", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "])")
            }
            Exp::Const(value) => write!(f, "CONST {}", value),
            Exp::Mem(addr) => write!(f, "MEM({})", addr),
            Exp::Name(label) => write!(f, "NAME {}", label),
            Exp::ResultOf { stm, exp } => write!(f, "ESEQ({}, {})", stm, exp),
            Exp::Temp(temp) => write!(f, "TEMP {}", temp),
            Exp::Relop { op, left, right } => write!(f, "RELOP({}, {}, {})", op, left, right),
        }
    }
}
