//! @dose
//! purpose: The set command: make one setting of an option active everywhere (commenting
//!     out its siblings), or write a new value into every line of a variable option.
//!
//! when-editing:
//!     - !Validate against the registry before computing any edit; a typo must never
//!       turn into a silent no-op or a partial write
//!
//! invariants:
//!     - After success each file declaring the option has exactly the target setting active
//!     - Pre-existing ambiguous activations are resolved and returned, not refused
//!
//! gotchas:
//!     - Variable values are free text but must stay on one line

use super::{open_workspace, Output};
use crate::cli::SetArgs;
use crate::error::{OptionsetError, Result};
use crate::formatter::render_changes;
use crate::registry::Registry;
use crate::rewrite::{apply_edits, edit_for_target, RewriteOutcome, Target};
use crate::types::OptionKind;
use crate::workspace::Workspace;
use anyhow::bail;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Set `option` to `value` across the workspace.
pub fn set_option(workspace: &Workspace, option: &str, value: &str, dry_run: bool) -> Result<RewriteOutcome> {
    let grammar = workspace.grammar();
    let option = grammar.parse_option_name(option)?;

    let scan = workspace.scan()?;
    let registry = Registry::build(&scan.files);

    let kind = registry
        .get(&option)
        .map(|entry| entry.kind)
        .ok_or_else(|| OptionsetError::UnknownOption {
            option: option.clone(),
        })?;
    let target = match kind {
        OptionKind::Discrete => {
            grammar.validate_setting_name(value)?;
            Target::Setting(value.to_string())
        }
        OptionKind::Variable => {
            if value.contains(['\r', '\n']) {
                return Err(OptionsetError::InvalidValue {
                    option,
                    message: "value must be a single line".to_string(),
                });
            }
            Target::Value(value.to_string())
        }
    };
    registry.validate(&option, value)?;

    let resolved: Vec<OptionsetError> = registry.ambiguities_for(&option).cloned().collect();
    for ambiguity in &resolved {
        warn!("resolving {}", ambiguity);
    }

    let edits: Vec<_> = scan
        .files
        .par_iter()
        .filter_map(|file| edit_for_target(file, grammar, &option, &target))
        .collect();

    let mut outcome = apply_edits(edits, dry_run);
    info!(
        "{} '{}' = '{}': {} line(s) in {} file(s)",
        if dry_run { "planned" } else { "set" },
        option,
        value,
        outcome.modified_lines(),
        outcome.modified_files()
    );
    outcome.resolved_ambiguities = resolved;

    let mut issues = scan.issues;
    issues.extend(registry.issues().iter().cloned());
    issues.append(&mut outcome.issues);
    outcome.issues = issues;
    Ok(outcome)
}

pub(crate) fn report_outcome(outcome: &RewriteOutcome, output: Output, nothing: &str) -> anyhow::Result<()> {
    if output.verbose {
        output.print(&render_changes(&outcome.changes));
    }
    if outcome.changes.is_empty() {
        output.println(nothing);
    } else {
        output.println(&format!(
            "{} {} line(s) in {} file(s)",
            if outcome.dry_run { "Would modify" } else { "Modified" },
            outcome.modified_lines(),
            outcome.modified_files()
        ));
    }
    if outcome.has_failures() {
        let failed: Vec<String> = outcome
            .issues
            .iter()
            .filter(|issue| issue.is_fatal_for_exit())
            .map(ToString::to_string)
            .collect();
        bail!("{}", failed.join("; "));
    }
    Ok(())
}

pub fn run_set(args: &SetArgs, root: &Path, output: Output) -> anyhow::Result<()> {
    let workspace = open_workspace(root, &args.scan)?;
    let outcome = set_option(&workspace, &args.option, &args.value, args.dry_run)?;
    report_outcome(
        &outcome,
        output,
        &format!("'{}' is already set to '{}'", args.option, args.value),
    )
}
