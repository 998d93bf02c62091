//! @dose
//! purpose: Typed errors for every optionset operation. Fatal kinds abort a command before
//!     anything is written; the remaining kinds are collected into the `issues` list of a
//!     scan, report or rewrite result so one bad file never stops a tree-wide command.
//!
//! when-editing:
//!     - !Variants must stay Clone + Serialize; keep I/O causes as strings
//!     - `is_fatal_for_exit` decides the CLI exit status, update it with new write-side kinds
//!
//! invariants:
//!     - Every variant that concerns a file carries the path relative to the scanned root
//!     - Line numbers are 1-based

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptionsetError {
    #[error("root directory does not exist: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("invalid grammar: {message}")]
    InvalidGrammar { message: String },

    #[error("invalid option name '{input}': expected one or more symbol characters followed by [A-Za-z0-9._+-]+")]
    InvalidOption { input: String },

    #[error("invalid setting name '{input}': expected [A-Za-z0-9._+-]+")]
    InvalidSetting { input: String },

    #[error("invalid value for variable option '{option}': {message}")]
    InvalidValue { option: String, message: String },

    #[error("invalid option pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown option '{option}'")]
    UnknownOption { option: String },

    #[error("unknown setting '{setting}' for option '{option}' (available: {})", available.join(", "))]
    UnknownSetting {
        option: String,
        setting: String,
        available: Vec<String>,
    },

    #[error("option '{option}' already exists")]
    OptionExists { option: String },

    #[error("setting '{setting}' already exists for option '{option}'")]
    SettingExists { option: String, setting: String },

    #[error("option '{option}' has several active settings in {}: {}", file.display(), settings.join(", "))]
    AmbiguousActivation {
        option: String,
        file: PathBuf,
        settings: Vec<String>,
    },

    #[error("malformed macro at {}:{line}: {reason}", file.display())]
    MalformedMacro {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("cannot read {}: {reason}", file.display())]
    UnreadableFile { file: PathBuf, reason: String },

    #[error("cannot write {}: {reason}", file.display())]
    UnwritableFile { file: PathBuf, reason: String },

    #[error("rewrite stopped partway: {} file(s) modified, {} file(s) left untouched", written.len(), untouched.len())]
    PartialRewrite {
        written: Vec<PathBuf>,
        untouched: Vec<PathBuf>,
    },
}

impl OptionsetError {
    pub(crate) fn malformed(file: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedMacro {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Whether an issue collected during a command should turn the exit status into a failure.
    pub fn is_fatal_for_exit(&self) -> bool {
        matches!(
            self,
            Self::UnwritableFile { .. } | Self::PartialRewrite { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OptionsetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_setting_lists_available() {
        let err = OptionsetError::UnknownSetting {
            option: "~nu".to_string(),
            setting: "oil".to_string(),
            available: vec!["air".to_string(), "water".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown setting 'oil' for option '~nu' (available: air, water)"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = OptionsetError::malformed("system/controlDict", 7, "unterminated variable pattern");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "malformed_macro");
        assert_eq!(json["line"], 7);
    }

    #[test]
    fn test_exit_fatality() {
        let err = OptionsetError::UnwritableFile {
            file: PathBuf::from("a.dat"),
            reason: "permission denied".to_string(),
        };
        assert!(err.is_fatal_for_exit());
        assert!(!OptionsetError::malformed("a.dat", 1, "x").is_fatal_for_exit());
    }
}
