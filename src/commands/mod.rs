mod files;
mod list;
mod rename;
mod set;

pub use files::*;
pub use list::*;
pub use rename::*;
pub use set::*;

use crate::cli::ScanOptions;
use crate::workspace::Workspace;
use anyhow::Result;
use std::path::Path;

/// Presentation flags shared by every command. They never change what a command does.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub verbose: bool,
    pub quiet: bool,
}

impl Output {
    pub fn print(&self, text: &str) {
        if !self.quiet {
            print!("{}", text);
        }
    }

    pub fn println(&self, text: &str) {
        if !self.quiet {
            println!("{}", text);
        }
    }
}

fn open_workspace(root: &Path, scan: &ScanOptions) -> Result<Workspace> {
    Ok(Workspace::open(root)?.with_cli_exclusions(&scan.exclude, scan.no_gitignore))
}
