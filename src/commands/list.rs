//! @dose
//! purpose: The list command: report every option matching a glob pattern with the state of
//!     each of its settings, optionally with file:line locations, as text or JSON.
//!
//! invariants:
//!     - Read-only; never writes to the scanned tree
//!
//! flows:
//!     - Workspace::scan -> Registry::build -> build_report -> render_report / JSON

use super::{open_workspace, Output};
use crate::cli::ListArgs;
use crate::error::Result;
use crate::formatter::{build_report, render_report, AvailabilityReport};
use crate::registry::Registry;
use crate::workspace::Workspace;
use std::path::Path;

/// Availability report for options matching `pattern` (`*` for all).
pub fn list_available(workspace: &Workspace, pattern: &str, show_files: bool) -> Result<AvailabilityReport> {
    let scan = workspace.scan()?;
    let registry = Registry::build(&scan.files);
    let mut issues = scan.issues;
    issues.extend(registry.issues().iter().cloned());
    build_report(&registry, pattern, show_files, &issues)
}

pub fn run_list(args: &ListArgs, root: &Path, output: Output) -> anyhow::Result<()> {
    let workspace = open_workspace(root, &args.scan)?;
    let report = list_available(&workspace, &args.pattern, args.show_files)?;

    if args.json {
        output.println(&serde_json::to_string_pretty(&report)?);
    } else {
        output.print(&render_report(&report));
    }
    Ok(())
}
