//! The files command: list the files that declare an option.

use super::{open_workspace, Output};
use crate::cli::FilesArgs;
use crate::error::{OptionsetError, Result};
use crate::formatter::{render_files, FilesReport};
use crate::registry::Registry;
use crate::workspace::Workspace;
use std::path::Path;

pub fn option_files(workspace: &Workspace, option: &str) -> Result<FilesReport> {
    let option = workspace.grammar().parse_option_name(option)?;
    let scan = workspace.scan()?;
    let registry = Registry::build(&scan.files);
    if registry.get(&option).is_none() {
        return Err(OptionsetError::UnknownOption { option });
    }
    let files = registry.files_of(&option);
    Ok(FilesReport { option, files })
}

pub fn run_files(args: &FilesArgs, root: &Path, output: Output) -> anyhow::Result<()> {
    let workspace = open_workspace(root, &args.scan)?;
    let report = option_files(&workspace, &args.option)?;
    if args.json {
        output.println(&serde_json::to_string_pretty(&report)?);
    } else {
        output.print(&render_files(&report));
    }
    Ok(())
}
