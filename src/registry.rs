//! @dose
//! purpose: In-memory index of every option seen in a scan: option -> setting -> occurrences.
//!     Answers listing (glob filtered), validation of a requested option/setting pair,
//!     per-setting aggregated state and the files associated with an option.
//!
//! when-editing:
//!     - !Built fresh on every invocation, never cached or persisted
//!     - Block interior lines are not occurrences; only lines with their own macro count
//!
//! invariants:
//!     - An option has exactly one kind; a conflicting occurrence is reported and dropped
//!     - Variable options are keyed by their currently captured value
//!     - Options and settings iterate in lexical order (BTreeMap)
//!
//! gotchas:
//!     - Ambiguity is per file: `~a x` active in one file and `~a y` active in another is
//!       fine, both active in the same file is AmbiguousActivation

use crate::error::{OptionsetError, Result};
use crate::parser::{MacroValue, ParsedFile};
use crate::types::{LineState, OptionKind, SettingState};
use glob::Pattern;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub file: PathBuf,
    pub line: usize,
    pub state: LineState,
    pub boundary: bool,
    /// Variable pattern source, for variable options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SettingEntry {
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone)]
pub struct OptionEntry {
    pub name: String,
    pub kind: OptionKind,
    pub settings: BTreeMap<String, SettingEntry>,
}

#[derive(Debug, Default)]
pub struct Registry {
    options: BTreeMap<String, OptionEntry>,
    ambiguities: Vec<OptionsetError>,
    issues: Vec<OptionsetError>,
}

impl Registry {
    pub fn build(files: &[ParsedFile]) -> Self {
        let mut registry = Registry::default();

        for file in files {
            // option -> active discrete settings in this file
            let mut active: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

            for (idx, tagged) in file.tagged() {
                let line = idx + 1;
                let macro_line = &tagged.macro_line;
                let (kind, key, pattern) = match &macro_line.value {
                    MacroValue::Setting(setting) => (OptionKind::Discrete, setting.clone(), None),
                    MacroValue::Variable(pattern) => (
                        OptionKind::Variable,
                        tagged.captured.clone().unwrap_or_default(),
                        Some(pattern.source.clone()),
                    ),
                };

                let entry = registry
                    .options
                    .entry(macro_line.option.clone())
                    .or_insert_with(|| OptionEntry {
                        name: macro_line.option.clone(),
                        kind,
                        settings: BTreeMap::new(),
                    });
                if entry.kind != kind {
                    registry.issues.push(OptionsetError::malformed(
                        &file.relative,
                        line,
                        format!(
                            "'{}' is used both as a variable and a discrete option",
                            macro_line.option
                        ),
                    ));
                    continue;
                }

                entry.settings.entry(key).or_default().occurrences.push(Occurrence {
                    file: file.relative.clone(),
                    line,
                    state: tagged.state,
                    boundary: macro_line.block_boundary,
                    pattern,
                });

                if let (OptionKind::Discrete, Some(setting)) = (kind, macro_line.setting()) {
                    if tagged.state.is_active() {
                        active.entry(&macro_line.option).or_default().insert(setting);
                    }
                }
            }

            for (option, settings) in active {
                let discrete = registry
                    .options
                    .get(option)
                    .is_some_and(|entry| entry.kind == OptionKind::Discrete);
                if discrete && settings.len() > 1 {
                    registry.ambiguities.push(OptionsetError::AmbiguousActivation {
                        option: option.to_string(),
                        file: file.relative.clone(),
                        settings: settings.into_iter().map(str::to_string).collect(),
                    });
                }
            }
        }

        registry
    }

    /// Options whose name matches a glob pattern (`*` lists everything).
    pub fn list(&self, pattern: &str) -> Result<Vec<&OptionEntry>> {
        let glob = Pattern::new(pattern).map_err(|e| OptionsetError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(self
            .options
            .values()
            .filter(|entry| glob.matches(&entry.name))
            .collect())
    }

    pub fn get(&self, option: &str) -> Option<&OptionEntry> {
        self.options.get(option)
    }

    pub fn occurrences_of(&self, option: &str, setting: &str) -> &[Occurrence] {
        self.options
            .get(option)
            .and_then(|entry| entry.settings.get(setting))
            .map(|s| s.occurrences.as_slice())
            .unwrap_or(&[])
    }

    /// Fail unless some macro in the tree declares this pair. Any value is accepted for a
    /// variable option.
    pub fn validate(&self, option: &str, setting: &str) -> Result<&OptionEntry> {
        let entry = self.get(option).ok_or_else(|| OptionsetError::UnknownOption {
            option: option.to_string(),
        })?;
        if entry.kind == OptionKind::Discrete && !entry.settings.contains_key(setting) {
            return Err(OptionsetError::UnknownSetting {
                option: option.to_string(),
                setting: setting.to_string(),
                available: entry.settings.keys().cloned().collect(),
            });
        }
        Ok(entry)
    }

    pub fn setting_state(&self, option: &str, setting: &str) -> Option<SettingState> {
        let entry = self.get(option)?;
        if entry.kind == OptionKind::Variable {
            return Some(SettingState::Variable);
        }
        let occurrences = &entry.settings.get(setting)?.occurrences;
        let ambiguous = self.ambiguities_for(option).any(|err| match err {
            OptionsetError::AmbiguousActivation { settings, .. } => {
                settings.iter().any(|s| s == setting)
            }
            _ => false,
        });
        let any_active = occurrences.iter().any(|o| o.state.is_active());
        let any_inactive = occurrences.iter().any(|o| !o.state.is_active());
        Some(match (ambiguous, any_active, any_inactive) {
            (true, _, _) | (false, true, true) => SettingState::Both,
            (false, true, false) => SettingState::Active,
            _ => SettingState::Inactive,
        })
    }

    pub fn ambiguities(&self) -> &[OptionsetError] {
        &self.ambiguities
    }

    pub fn ambiguities_for<'a>(&'a self, option: &'a str) -> impl Iterator<Item = &'a OptionsetError> {
        self.ambiguities.iter().filter(move |err| {
            matches!(err, OptionsetError::AmbiguousActivation { option: o, .. } if o == option)
        })
    }

    /// Sorted, de-duplicated files declaring `option`.
    pub fn files_of(&self, option: &str) -> Vec<PathBuf> {
        let files: BTreeSet<PathBuf> = self
            .get(option)
            .into_iter()
            .flat_map(|entry| entry.settings.values())
            .flat_map(|setting| setting.occurrences.iter().map(|o| o.file.clone()))
            .collect();
        files.into_iter().collect()
    }

    pub fn issues(&self) -> &[OptionsetError] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_file, Grammar, SourceFile};

    fn registry(files: &[(&str, &str)]) -> Registry {
        let grammar = Grammar::default();
        let parsed: Vec<ParsedFile> = files
            .iter()
            .map(|(name, content)| parse_file(SourceFile::from_text(*name, *name, content), &grammar))
            .collect();
        Registry::build(&parsed)
    }

    const TRANSPORT: &str =
        "nu = 1.5e-5; // air [m^2/s] ~nu air\n//nu = 1e-6; // water [m^2/s] ~nu water\n";

    #[test]
    fn test_states() {
        let registry = registry(&[("transportProperties", TRANSPORT)]);
        assert_eq!(registry.setting_state("~nu", "air"), Some(SettingState::Active));
        assert_eq!(registry.setting_state("~nu", "water"), Some(SettingState::Inactive));
        assert_eq!(registry.setting_state("~nu", "oil"), None);
        assert!(registry.ambiguities().is_empty());
    }

    #[test]
    fn test_list_glob() {
        let registry = registry(&[(
            "a",
            "x // ~nu air\ny // ~nuTilda low\nz // ~anu one\nw // @other on\n",
        )]);
        let names: Vec<_> = registry
            .list("~nu*")
            .unwrap()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["~nu", "~nuTilda"]);
        assert_eq!(registry.list("*").unwrap().len(), 4);
        assert_eq!(registry.list("~nu").unwrap().len(), 1);
        assert!(matches!(
            registry.list("[").unwrap_err(),
            OptionsetError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_validate() {
        let registry = registry(&[("a", TRANSPORT), ("b", "rho 1; // ~rho ='rho (.*);'\n")]);
        assert!(registry.validate("~nu", "water").is_ok());
        assert!(matches!(
            registry.validate("~mu", "water").unwrap_err(),
            OptionsetError::UnknownOption { .. }
        ));
        match registry.validate("~nu", "oil").unwrap_err() {
            OptionsetError::UnknownSetting { available, .. } => {
                assert_eq!(available, vec!["air", "water"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        // Any value goes for a variable option
        assert!(registry.validate("~rho", "1025").is_ok());
    }

    #[test]
    fn test_ambiguity_is_per_file() {
        let registry = registry(&[
            ("a", "x // ~m one\ny // ~m two\n"),
            ("b", "x // ~n one\n//y // ~n two\n"),
            ("c", "//x // ~n one\ny // ~n two\n"),
        ]);
        assert_eq!(registry.ambiguities().len(), 1);
        assert_eq!(registry.setting_state("~m", "one"), Some(SettingState::Both));
        // Disagreement across files is also Both
        assert_eq!(registry.setting_state("~n", "one"), Some(SettingState::Both));
        assert_eq!(registry.setting_state("~n", "two"), Some(SettingState::Both));
    }

    #[test]
    fn test_variable_keyed_by_value() {
        let registry = registry(&[("a", "rho = 1.225; // ~density ='rho = (.*);'\n")]);
        let entry = registry.get("~density").unwrap();
        assert_eq!(entry.kind, OptionKind::Variable);
        assert!(entry.settings.contains_key("1.225"));
        assert_eq!(
            registry.setting_state("~density", "1.225"),
            Some(SettingState::Variable)
        );
    }

    #[test]
    fn test_kind_conflict() {
        let registry = registry(&[("a", "x // ~k one\nrho 1; // ~k ='rho (.*);'\n")]);
        assert_eq!(registry.issues().len(), 1);
        assert_eq!(registry.get("~k").unwrap().kind, OptionKind::Discrete);
    }

    #[test]
    fn test_files_of() {
        let registry = registry(&[("b", TRANSPORT), ("a", TRANSPORT), ("c", "x // @y z\n")]);
        assert_eq!(
            registry.files_of("~nu"),
            vec![PathBuf::from("a"), PathBuf::from("b")]
        );
        assert!(registry.files_of("~missing").is_empty());
    }
}
