//! The scanned root together with everything resolved from it once per invocation:
//! config, grammar and exclusion rules.

use crate::config::Config;
use crate::error::{OptionsetError, Result};
use crate::exclusion::ExclusionConfig;
use crate::parser::Grammar;
use crate::scan::{scan_tree, ScanLimits, ScanResult};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
    grammar: Grammar,
    exclusion: ExclusionConfig,
}

impl Workspace {
    /// Open `root`, loading optionset.toml from it when present.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(OptionsetError::RootNotFound {
                path: root.to_path_buf(),
            });
        }
        Self::with_config(root, Config::load(root))
    }

    pub fn with_config(root: &Path, config: Config) -> Result<Self> {
        let grammar = config.grammar()?;
        let exclusion = config.exclusion(&[], false);
        Ok(Self {
            root: root.to_path_buf(),
            config,
            grammar,
            exclusion,
        })
    }

    /// Merge --exclude / --no-gitignore over the file configuration.
    pub fn with_cli_exclusions(mut self, patterns: &[String], no_gitignore: bool) -> Self {
        self.exclusion = self.config.exclusion(patterns, no_gitignore);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn limits(&self) -> ScanLimits {
        ScanLimits {
            max_lines: self.config.max_lines,
            max_bytes: self.config.max_file_bytes(),
        }
    }

    pub fn scan(&self) -> Result<ScanResult> {
        scan_tree(&self.root, &self.grammar, &self.exclusion, &self.limits())
    }
}
