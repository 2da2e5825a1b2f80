//! Compiler configuration
//!
//! Options that steer the backend phases. The driver builds a
//! [`CompilerConfig`] from its command line; library users can start from
//! `CompilerConfig::default()` and override fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("\"{value}\" is not a valid {kind} (expected one of: {expected})")]
pub struct ConfigError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Target architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchType {
    /// SPARC V8: register windows, delayed branches
    #[default]
    Sparc,
}

impl fmt::Display for ArchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchType::Sparc => write!(f, "sparc"),
        }
    }
}

impl FromStr for ArchType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sparc" => Ok(ArchType::Sparc),
            _ => Err(ConfigError {
                kind: "architecture",
                value: s.to_string(),
                expected: "sparc",
            }),
        }
    }
}

/// Optimization level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum OptLevel {
    /// No peephole optimization
    O0,
    /// Peephole optimization to fixpoint
    #[default]
    O1,
}

impl OptLevel {
    /// Whether the peephole optimizer runs at this level
    pub fn runs_peephole(&self) -> bool {
        *self >= OptLevel::O1
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptLevel::O0 => write!(f, "O0"),
            OptLevel::O1 => write!(f, "O1"),
        }
    }
}

impl FromStr for OptLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "O0" | "0" => Ok(OptLevel::O0),
            "O1" | "1" => Ok(OptLevel::O1),
            _ => Err(ConfigError {
                kind: "optimization level",
                value: s.to_string(),
                expected: "O0, O1",
            }),
        }
    }
}

/// Options for the backend pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub arch: ArchType,
    pub opt_level: OptLevel,
    /// Wrap every procedure in the target's prologue/epilogue
    pub procedure_frames: bool,
    /// Dump intermediate fragments and optimizer decisions
    pub verbose: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            arch: ArchType::Sparc,
            opt_level: OptLevel::O1,
            procedure_frames: true,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.arch, ArchType::Sparc);
        assert_eq!(config.opt_level, OptLevel::O1);
        assert!(config.procedure_frames);
        assert!(!config.verbose);
    }

    #[test]
    fn test_opt_level_parsing() {
        assert_eq!("o0".parse::<OptLevel>().unwrap(), OptLevel::O0);
        assert_eq!("O1".parse::<OptLevel>().unwrap(), OptLevel::O1);
        assert_eq!("1".parse::<OptLevel>().unwrap(), OptLevel::O1);

        let err = "O3".parse::<OptLevel>().unwrap_err();
        assert_eq!(err.value, "O3");
        assert!(err.to_string().contains("optimization level"));
    }

    #[test]
    fn test_opt_level_gates_peephole() {
        assert!(!OptLevel::O0.runs_peephole());
        assert!(OptLevel::O1.runs_peephole());
    }

    #[test]
    fn test_arch_parsing() {
        assert_eq!("SPARC".parse::<ArchType>().unwrap(), ArchType::Sparc);
        assert!("powerpc".parse::<ArchType>().is_err());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: CompilerConfig = serde_json::from_str(r#"{ "opt_level": "O0" }"#).unwrap();
        assert_eq!(config.opt_level, OptLevel::O0);
        assert!(config.procedure_frames);
    }
}
