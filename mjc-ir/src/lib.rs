//! Tree Intermediate Representation for MiniJava
//!
//! The front end lowers every method body into a list of IR statements. This
//! crate holds those trees together with the naming machinery the backend
//! needs to extend them.
//!
//! ## Architecture
//!
//! - `ops` - Binary and relational operators
//! - `tree` - Statement and expression trees
//! - `temp` - Virtual registers and the per-procedure temp manager
//! - `label` - Jump targets and the program-wide label manager
//! - `fragment` - One procedure's IR plus the program container

pub use self::fragment::{IrFragment, IrProgram};
pub use self::label::{Label, LabelManager};
pub use self::ops::{BinaryOp, RelOp};
pub use self::temp::{Temp, TempManager};
pub use self::tree::{Exp, Stm};

mod fragment;
mod label;
mod ops;
mod temp;
mod tree;

#[cfg(test)]
mod tests;
