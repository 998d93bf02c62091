//! @dose
//! purpose: Render registry contents for people and machines: the availability listing
//!     (every option matching a glob with each setting's state), the per-line diff of a
//!     rewrite and the file list of an option. JSON output serializes the same structs.
//!
//! when-editing:
//!     - The text listing keeps the long-standing layout (header, legend, two-space option
//!       lines, tab-indented settings) so scripts grepping it keep working
//!
//! invariants:
//!     - Discrete options are listed before variable options, each group in lexical order
//!     - Settings are listed in lexical order
//!     - Building a report has no side effects

use crate::error::{OptionsetError, Result};
use crate::registry::{Occurrence, Registry};
use crate::types::{LineChange, OptionKind, SettingState};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

pub const LEGEND: &str = "('  inactive  ', '> active <', '? both ?', '= variable =')";

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub pattern: String,
    pub options: Vec<OptionReport>,
    pub warnings: Vec<OptionsetError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionReport {
    pub name: String,
    pub kind: OptionKind,
    pub settings: Vec<SettingReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingReport {
    pub name: String,
    pub state: SettingState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Occurrence>,
}

/// Files declaring one option.
#[derive(Debug, Clone, Serialize)]
pub struct FilesReport {
    pub option: String,
    pub files: Vec<PathBuf>,
}

/// Build the availability report for options matching `pattern`. Scan issues are passed
/// in and kept as warnings alongside the ambiguities of the listed options.
pub fn build_report(
    registry: &Registry,
    pattern: &str,
    show_files: bool,
    issues: &[OptionsetError],
) -> Result<AvailabilityReport> {
    let mut entries = registry.list(pattern)?;
    // Discrete options first, then variables; lexical within each group
    entries.sort_by_key(|entry| entry.kind == OptionKind::Variable);

    let mut warnings: Vec<OptionsetError> = issues.to_vec();
    let mut options = Vec::with_capacity(entries.len());
    for entry in entries {
        warnings.extend(registry.ambiguities_for(&entry.name).cloned());
        let settings = entry
            .settings
            .iter()
            .map(|(name, setting)| SettingReport {
                name: name.clone(),
                state: registry
                    .setting_state(&entry.name, name)
                    .unwrap_or(SettingState::Inactive),
                locations: if show_files {
                    setting.occurrences.clone()
                } else {
                    Vec::new()
                },
            })
            .collect();
        options.push(OptionReport {
            name: entry.name.clone(),
            kind: entry.kind,
            settings,
        });
    }

    Ok(AvailabilityReport {
        pattern: pattern.to_string(),
        options,
        warnings,
    })
}

pub fn render_report(report: &AvailabilityReport) -> String {
    let mut out = String::new();
    if report.options.is_empty() {
        let _ = writeln!(
            out,
            "No available options and settings matching '{}'",
            report.pattern
        );
    } else {
        let _ = writeln!(
            out,
            "Showing available options and settings matching '{}'",
            report.pattern
        );
        let _ = writeln!(out, "{}", LEGEND);
        for option in &report.options {
            let _ = writeln!(out, "  {}", option.name);
            for setting in &option.settings {
                let (left, right) = setting.state.markers();
                let _ = writeln!(out, "\t{} {} {}", left, setting.name, right);
                for location in &setting.locations {
                    let _ = writeln!(out, "\t    {}:{}", location.file.display(), location.line);
                }
            }
        }
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {}", warning);
    }
    out
}

/// Verbose before/after listing of rewritten lines, grouped by file.
pub fn render_changes(changes: &[LineChange]) -> String {
    let mut out = String::new();
    let mut current: Option<&PathBuf> = None;
    for change in changes {
        if current != Some(&change.file) {
            let _ = writeln!(out, "{}", change.file.display());
            current = Some(&change.file);
        }
        let _ = writeln!(out, "{}", change);
    }
    out
}

pub fn render_files(report: &FilesReport) -> String {
    report
        .files
        .iter()
        .map(|f| format!("{}\n", f.display()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_file, Grammar, ParsedFile, SourceFile};

    fn registry(content: &str) -> Registry {
        let parsed: Vec<ParsedFile> = vec![parse_file(
            SourceFile::from_text("constant/transportProperties", "constant/transportProperties", content),
            &Grammar::default(),
        )];
        Registry::build(&parsed)
    }

    const CASE: &str = concat!(
        "nu = 1.5e-5; // air [m^2/s] ~nu air\n",
        "//nu = 1e-6; // water [m^2/s] ~nu water\n",
        "rho = 1.225; // ~density ='rho = (.*);'\n",
    );

    #[test]
    fn test_render_listing() {
        let registry = registry(CASE);
        let report = build_report(&registry, "*", false, &[]).unwrap();
        assert_eq!(
            render_report(&report),
            concat!(
                "Showing available options and settings matching '*'\n",
                "('  inactive  ', '> active <', '? both ?', '= variable =')\n",
                "  ~nu\n",
                "\t> air <\n",
                "\t  water  \n",
                "  ~density\n",
                "\t= 1.225 =\n",
            )
        );
    }

    #[test]
    fn test_render_empty_listing() {
        let registry = registry(CASE);
        let report = build_report(&registry, "@missing*", false, &[]).unwrap();
        assert!(report.options.is_empty());
        assert_eq!(
            render_report(&report),
            "No available options and settings matching '@missing*'\n"
        );
    }

    #[test]
    fn test_show_files_and_json() {
        let registry = registry(CASE);
        let report = build_report(&registry, "~nu", true, &[]).unwrap();
        let text = render_report(&report);
        assert!(text.contains("\t    constant/transportProperties:1\n"));
        assert!(text.contains("\t    constant/transportProperties:2\n"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["options"][0]["name"], "~nu");
        assert_eq!(json["options"][0]["settings"][0]["state"], "active");
        assert_eq!(json["options"][0]["settings"][1]["locations"][0]["line"], 2);
    }

    #[test]
    fn test_ambiguity_warning() {
        let registry = registry("a // ~m one\nb // ~m two\n");
        let report = build_report(&registry, "*", false, &[]).unwrap();
        assert_eq!(report.warnings.len(), 1);
        let text = render_report(&report);
        assert!(text.contains("\t? one ?\n"));
        assert!(text.contains("warning: option '~m' has several active settings"));
    }

    #[test]
    fn test_render_changes() {
        let changes = vec![LineChange {
            file: PathBuf::from("system/controlDict"),
            line: 3,
            before: "application pimpleFoam; // @simulation transient".to_string(),
            after: "//application pimpleFoam; // @simulation transient".to_string(),
        }];
        assert_eq!(
            render_changes(&changes),
            concat!(
                "system/controlDict\n",
                "[   3 ]application pimpleFoam; // @simulation transient\n",
                "[   3']//application pimpleFoam; // @simulation transient\n",
            )
        );
    }
}
