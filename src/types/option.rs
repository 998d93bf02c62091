//! @dose
//! purpose: Core value types shared by the registry, the rewriter and the report: the
//!     activation state of a tagged line, the kind of an option, the aggregated state of a
//!     setting, and the before/after record of a rewritten line.
//!
//! invariants:
//!     - Variable options never carry an Inactive occurrence
//!     - LineChange.line is 1-based and LineChange.file is relative to the scanned root
//!
//! gotchas:
//!     - SettingState::Both covers two situations: a setting that is active in one place and
//!       inactive in another, and a setting active alongside a sibling in the same file

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Whether a tagged line's functional content is live or commented out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    Active,
    Inactive,
}

impl LineState {
    pub fn is_active(self) -> bool {
        self == LineState::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Mutually exclusive named settings toggled by commenting.
    Discrete,
    /// A single free-form value captured by a regex group.
    Variable,
}

/// Aggregated state of one setting across the scanned tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingState {
    Inactive,
    Active,
    Both,
    Variable,
}

impl SettingState {
    /// Left and right markers used by the text report.
    pub fn markers(self) -> (&'static str, &'static str) {
        match self {
            SettingState::Inactive => (" ", " "),
            SettingState::Active => (">", "<"),
            SettingState::Both => ("?", "?"),
            SettingState::Variable => ("=", "="),
        }
    }
}

impl fmt::Display for SettingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingState::Inactive => "inactive",
            SettingState::Active => "active",
            SettingState::Both => "both",
            SettingState::Variable => "variable",
        };
        f.write_str(name)
    }
}

/// One rewritten line, kept for verbose output and audit logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    pub file: PathBuf,
    pub line: usize,
    pub before: String,
    pub after: String,
}

impl fmt::Display for LineChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{:>4} ]{}", self.line, self.before)?;
        write!(f, "[{:>4}']{}", self.line, self.after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(SettingState::Active.markers(), (">", "<"));
        assert_eq!(SettingState::Inactive.markers(), (" ", " "));
        assert_eq!(SettingState::Both.markers(), ("?", "?"));
        assert_eq!(SettingState::Variable.markers(), ("=", "="));
    }

    #[test]
    fn test_line_change_display() {
        let change = LineChange {
            file: PathBuf::from("constant/transportProperties"),
            line: 12,
            before: "//nu = 1e-6; // ~nu water".to_string(),
            after: "nu = 1e-6; // ~nu water".to_string(),
        };
        assert_eq!(
            change.to_string(),
            "[  12 ]//nu = 1e-6; // ~nu water\n[  12']nu = 1e-6; // ~nu water"
        );
    }
}
