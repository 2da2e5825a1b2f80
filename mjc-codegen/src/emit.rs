//! Assembly Emission
//!
//! Renders finished code fragments as assembly text.

use crate::fragment::CodeFragment;
use mjc_common::CompilerError;
use std::path::Path;

/// First line of every emitted file
pub const HEADER: &str = "! Generated by the MiniJava compiler (mjc)";

/// One fragment, banners included
pub fn emit_fragment(fragment: &CodeFragment) -> String {
    fragment.to_string()
}

/// A complete program: header, the `start` entry symbol, then every
/// fragment followed by a blank line
pub fn emit_program(fragments: &[CodeFragment]) -> String {
    let mut output = String::new();

    output.push_str(HEADER);
    output.push_str("\n\n");
    output.push_str(".global start\n");
    output.push_str("start:\n");
    output.push('\n');

    for fragment in fragments {
        output.push_str(&emit_fragment(fragment));
        output.push('\n');
    }

    output
}

/// Write a complete program to `path`
pub fn write_program(fragments: &[CodeFragment], path: &Path) -> Result<(), CompilerError> {
    std::fs::write(path, emit_program(fragments)).map_err(|err| CompilerError::IoError {
        message: format!("Unable to write assembly file {}: {}", path.display(), err),
    })
}
