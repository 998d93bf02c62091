//! @dose
//! purpose: This module defines the command-line interface for optionset using the clap derive
//!     macros. It specifies all commands (list, set, files, rename-option, rename-setting) and
//!     their arguments.
//!
//! when-editing:
//!     - !Each command struct must derive Args and be added to the Commands enum
//!     - !Global flags (root, verbose, quiet, debug) are defined on Cli and propagate to all
//!       subcommands
//!
//! invariants:
//!     - The Cli struct is the root parser that clap uses to parse command-line arguments
//!     - Presentation flags never change what a command does to the files
//!
//! gotchas:
//!     - Option names start with symbols such as `~` or `@`; shells may need them quoted
//!     - The --root flag is global but optional; defaults to current directory in main.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optionset")]
#[command(author, version, about = "Toggle options embedded as comment macros in text dictionary files")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory to scan (defaults to current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Print every changed line before and after the rewrite
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress standard output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show available options and settings, optionally filtered by a glob pattern
    List(ListArgs),

    /// Activate a setting of an option, or set the value of a variable option
    Set(SetArgs),

    /// Show the files that declare an option
    Files(FilesArgs),

    /// Rename an option everywhere it is declared
    RenameOption(RenameOptionArgs),

    /// Rename one setting of an option everywhere it is declared
    RenameSetting(RenameSettingArgs),
}

/// File selection options shared by every command
#[derive(Args, Clone, Default)]
pub struct ScanOptions {
    /// Exclude files/directories matching glob pattern (can be repeated)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Don't respect .gitignore files
    #[arg(long)]
    pub no_gitignore: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Glob pattern matched against option names
    #[arg(default_value = "*")]
    pub pattern: String,

    /// Show the file and line of every setting
    #[arg(short = 'f', long)]
    pub show_files: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub scan: ScanOptions,
}

#[derive(Args)]
pub struct SetArgs {
    /// Option name, e.g. '~nu' or '@simulation'
    pub option: String,

    /// Setting to activate, or the new value of a variable option
    #[arg(allow_hyphen_values = true)]
    pub value: String,

    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub scan: ScanOptions,
}

#[derive(Args)]
pub struct FilesArgs {
    pub option: String,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub scan: ScanOptions,
}

#[derive(Args)]
pub struct RenameOptionArgs {
    pub old: String,
    pub new: String,

    #[command(flatten)]
    pub scan: ScanOptions,
}

#[derive(Args)]
pub struct RenameSettingArgs {
    pub option: String,
    pub old: String,
    pub new: String,

    #[command(flatten)]
    pub scan: ScanOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list() {
        // Default values
        let cli = Cli::try_parse_from(["optionset", "list"]).unwrap();
        let Commands::List(args) = cli.command else {
            panic!("Expected List")
        };
        assert_eq!(args.pattern, "*");
        assert!(!args.show_files);
        assert!(!args.json);

        let cli = Cli::try_parse_from(["optionset", "list", "~nu*", "-f", "--json"]).unwrap();
        let Commands::List(args) = cli.command else {
            panic!("Expected List")
        };
        assert_eq!(args.pattern, "~nu*");
        assert!(args.show_files);
        assert!(args.json);
    }

    #[test]
    fn test_parse_set() {
        let cli = Cli::try_parse_from(["optionset", "set", "~nu", "water"]).unwrap();
        let Commands::Set(args) = cli.command else {
            panic!("Expected Set")
        };
        assert_eq!(args.option, "~nu");
        assert_eq!(args.value, "water");
        assert!(!args.dry_run);

        let cli = Cli::try_parse_from([
            "optionset",
            "set",
            "~density",
            "1025",
            "--dry-run",
            "--exclude",
            "0/**",
            "--exclude",
            "*.orig",
            "--no-gitignore",
        ])
        .unwrap();
        let Commands::Set(args) = cli.command else {
            panic!("Expected Set")
        };
        assert!(args.dry_run);
        assert_eq!(args.scan.exclude, vec!["0/**", "*.orig"]);
        assert!(args.scan.no_gitignore);
    }

    #[test]
    fn test_parse_files_and_renames() {
        let cli = Cli::try_parse_from(["optionset", "files", "@forces", "--json"]).unwrap();
        let Commands::Files(args) = cli.command else {
            panic!("Expected Files")
        };
        assert_eq!(args.option, "@forces");
        assert!(args.json);

        let cli = Cli::try_parse_from(["optionset", "rename-option", "@forces", "@loads"]).unwrap();
        let Commands::RenameOption(args) = cli.command else {
            panic!("Expected RenameOption")
        };
        assert_eq!((args.old.as_str(), args.new.as_str()), ("@forces", "@loads"));

        let cli = Cli::try_parse_from(["optionset", "rename-setting", "~nu", "air", "gas"]).unwrap();
        let Commands::RenameSetting(args) = cli.command else {
            panic!("Expected RenameSetting")
        };
        assert_eq!(args.option, "~nu");
        assert_eq!(args.old, "air");
        assert_eq!(args.new, "gas");
    }

    /// Test global flags (-v, -q, -d, -r)
    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["optionset", "-v", "-q", "-d", "list"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.quiet);
        assert!(cli.debug);

        let cli = Cli::try_parse_from(["optionset", "-r", "/tmp/case", "list"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/case")));

        // Flags after command
        let cli = Cli::try_parse_from(["optionset", "set", "~nu", "air", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_error_cases() {
        assert!(Cli::try_parse_from(["optionset"]).is_err()); // Missing command
        assert!(Cli::try_parse_from(["optionset", "invalid"]).is_err());
        assert!(Cli::try_parse_from(["optionset", "set", "~nu"]).is_err()); // Missing value
        assert!(Cli::try_parse_from(["optionset", "rename-setting", "~nu", "air"]).is_err());
    }

    #[test]
    fn test_help_output() {
        let mut cmd = Cli::command();
        let help = format!("{}", cmd.render_help());
        for command in ["list", "set", "files", "rename-option", "rename-setting"] {
            assert!(help.contains(command), "{}", command);
        }
    }
}
