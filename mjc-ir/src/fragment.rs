//! Procedure fragments and whole programs

use crate::{Stm, TempManager};
use mjc_common::{concat_names, CompilerError};
use serde::{Deserialize, Serialize};

/// The IR of one method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrFragment {
    pub class_name: String,
    pub method_name: String,
    /// The program's `main` method
    #[serde(default)]
    pub is_entry: bool,
    /// Number of stack-allocated locals
    #[serde(default)]
    pub locals: usize,
    pub body: Vec<Stm>,
    /// Owner of the fragment's virtual registers; rebuilt by the selector
    #[serde(skip)]
    pub temps: TempManager,
}

impl IrFragment {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            is_entry: false,
            locals: 0,
            body: Vec::new(),
            temps: TempManager::new(),
        }
    }

    pub fn as_entry(mut self) -> Self {
        self.is_entry = true;
        self
    }

    pub fn with_locals(mut self, locals: usize) -> Self {
        self.locals = locals;
        self
    }

    pub fn with_body(mut self, body: Vec<Stm>) -> Self {
        self.body = body;
        self
    }

    /// Qualified name, `Class$method`
    pub fn name(&self) -> String {
        concat_names(&[self.class_name.as_str(), self.method_name.as_str()])
    }
}

/// All fragments of a compilation unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrProgram {
    pub fragments: Vec<IrFragment>,
}

impl IrProgram {
    pub fn new(fragments: Vec<IrFragment>) -> Self {
        Self { fragments }
    }

    pub fn from_json(text: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(text).map_err(|e| CompilerError::input(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, CompilerError> {
        serde_json::to_string_pretty(self).map_err(|e| CompilerError::InternalError {
            message: e.to_string(),
        })
    }
}
