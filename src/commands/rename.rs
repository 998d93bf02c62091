//! @dose
//! purpose: The rename-option and rename-setting commands. Only the option or setting token
//!     inside each matching macro changes; content, comments and activation stay as they were.
//!
//! invariants:
//!     - Renaming onto a name already in use is refused before any write
//!     - Block boundaries are renamed with the rest, so blocks stay paired

use super::set::report_outcome;
use super::{open_workspace, Output};
use crate::cli::{RenameOptionArgs, RenameSettingArgs};
use crate::error::{OptionsetError, Result};
use crate::registry::Registry;
use crate::rewrite::{apply_edits, edit_for_rename, Rename, RewriteOutcome};
use crate::types::OptionKind;
use crate::workspace::Workspace;
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

fn apply_rename(workspace: &Workspace, registry_check: impl FnOnce(&Registry) -> Result<Rename>) -> Result<RewriteOutcome> {
    let scan = workspace.scan()?;
    let registry = Registry::build(&scan.files);
    let rename = registry_check(&registry)?;

    let edits: Vec<_> = scan
        .files
        .par_iter()
        .filter_map(|file| edit_for_rename(file, &rename))
        .collect();
    let mut outcome = apply_edits(edits, false);
    info!("{:?}: {} line(s) in {} file(s)", rename, outcome.modified_lines(), outcome.modified_files());

    let mut issues = scan.issues;
    issues.extend(registry.issues().iter().cloned());
    issues.append(&mut outcome.issues);
    outcome.issues = issues;
    Ok(outcome)
}

pub fn rename_option(workspace: &Workspace, old: &str, new: &str) -> Result<RewriteOutcome> {
    let grammar = workspace.grammar();
    let from = grammar.parse_option_name(old)?;
    let to = grammar.parse_option_name(new)?;

    apply_rename(workspace, |registry| {
        if registry.get(&from).is_none() {
            return Err(OptionsetError::UnknownOption { option: from });
        }
        if registry.get(&to).is_some() {
            return Err(OptionsetError::OptionExists { option: to });
        }
        Ok(Rename::Option { from, to })
    })
}

pub fn rename_setting(workspace: &Workspace, option: &str, old: &str, new: &str) -> Result<RewriteOutcome> {
    let grammar = workspace.grammar();
    let option = grammar.parse_option_name(option)?;
    grammar.validate_setting_name(old)?;
    grammar.validate_setting_name(new)?;

    apply_rename(workspace, |registry| {
        let entry = registry.validate(&option, old)?;
        if entry.kind == OptionKind::Variable {
            return Err(OptionsetError::InvalidValue {
                option,
                message: "variable options have no named settings".to_string(),
            });
        }
        if entry.settings.contains_key(new) {
            return Err(OptionsetError::SettingExists {
                option,
                setting: new.to_string(),
            });
        }
        Ok(Rename::Setting {
            option,
            from: old.to_string(),
            to: new.to_string(),
        })
    })
}

pub fn run_rename_option(args: &RenameOptionArgs, root: &Path, output: Output) -> anyhow::Result<()> {
    let workspace = open_workspace(root, &args.scan)?;
    let outcome = rename_option(&workspace, &args.old, &args.new)?;
    report_outcome(&outcome, output, "Nothing to rename")
}

pub fn run_rename_setting(args: &RenameSettingArgs, root: &Path, output: Output) -> anyhow::Result<()> {
    let workspace = open_workspace(root, &args.scan)?;
    let outcome = rename_setting(&workspace, &args.option, &args.old, &args.new)?;
    report_outcome(&outcome, output, "Nothing to rename")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONTROL: &str = concat!(
        "application pimpleFoam; // @simulation transient\n",
        "//application simpleFoam; // @simulation steady\n",
        "functions // *@forces on\n",
        "{}        // *@forces on\n",
    );

    fn case() -> (TempDir, Workspace) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("controlDict"), CONTROL).unwrap();
        let workspace = Workspace::open(temp_dir.path()).unwrap();
        (temp_dir, workspace)
    }

    fn read(workspace: &Workspace) -> String {
        fs::read_to_string(workspace.root().join("controlDict")).unwrap()
    }

    #[test]
    fn test_rename_option() {
        let (_temp, workspace) = case();
        let outcome = rename_option(&workspace, "*@forces", "@loads").unwrap();
        assert_eq!(outcome.modified_lines(), 2);
        assert_eq!(
            read(&workspace),
            CONTROL.replace("*@forces", "*@loads")
        );
    }

    #[test]
    fn test_rename_setting() {
        let (_temp, workspace) = case();
        rename_setting(&workspace, "@simulation", "steady", "steadyState").unwrap();
        assert_eq!(
            read(&workspace),
            CONTROL.replace("@simulation steady", "@simulation steadyState")
        );
    }

    #[test]
    fn test_rename_conflicts() {
        let (_temp, workspace) = case();
        assert!(matches!(
            rename_option(&workspace, "@simulation", "@forces").unwrap_err(),
            OptionsetError::OptionExists { .. }
        ));
        assert!(matches!(
            rename_option(&workspace, "@missing", "@other").unwrap_err(),
            OptionsetError::UnknownOption { .. }
        ));
        assert!(matches!(
            rename_setting(&workspace, "@simulation", "steady", "transient").unwrap_err(),
            OptionsetError::SettingExists { .. }
        ));
        assert!(matches!(
            rename_setting(&workspace, "@simulation", "laminar", "rans").unwrap_err(),
            OptionsetError::UnknownSetting { .. }
        ));
        assert_eq!(read(&workspace), CONTROL);
    }
}
