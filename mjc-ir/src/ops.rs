//! IR Operations
//!
//! Defines the arithmetic and relational operators available in the IR.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operations in IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    // Arithmetic
    Plus, Minus, Mul, Div,

    // Bitwise
    And, Or, Xor,
    LShift, RShift, ARShift, // Logical/arithmetic shift right
}

impl BinaryOp {
    /// Whether `a op b == b op a`
    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            BinaryOp::Plus | BinaryOp::Mul | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Plus => "PLUS",
            BinaryOp::Minus => "MINUS",
            BinaryOp::Mul => "MUL",
            BinaryOp::Div => "DIV",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::LShift => "LSHIFT",
            BinaryOp::RShift => "RSHIFT",
            BinaryOp::ARShift => "ARSHIFT",
        };
        write!(f, "{op_str}")
    }
}

/// Relational operations, used by conditional jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelOp {
    Eq, Ne,
    Lt, Gt, Le, Ge,     // Signed comparisons
    Ult, Ugt, Ule, Uge, // Unsigned comparisons
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            RelOp::Eq => "EQ",
            RelOp::Ne => "NE",
            RelOp::Lt => "LT",
            RelOp::Gt => "GT",
            RelOp::Le => "LE",
            RelOp::Ge => "GE",
            RelOp::Ult => "ULT",
            RelOp::Ugt => "UGT",
            RelOp::Ule => "ULE",
            RelOp::Uge => "UGE",
        };
        write!(f, "{op_str}")
    }
}
