//! MiniJava Compiler - Common Types and Utilities
//! 
//! This crate contains the error definitions, the diagnostic log and the
//! compiler configuration shared by every phase of the backend.

pub mod error;
pub mod config;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use config::{ArchType, CompilerConfig, OptLevel};

/// Join identifier tokens with the `$` delimiter used for qualified names
/// (`Class$method`) and generated labels (`if$then0000`).
pub fn concat_names<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .join("$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_names() {
        assert_eq!(concat_names(&["Fac", "ComputeFac"]), "Fac$ComputeFac");
        assert_eq!(concat_names(&["if", "then"]), "if$then");
        assert_eq!(concat_names::<&str>(&[]), "");
    }
}
