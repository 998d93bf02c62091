//! @dose
//! purpose: This is the library crate root for optionset, exposing the public API for use as
//!     both a CLI tool and a library. It re-exports the operations (list, set, files, rename)
//!     and the types they return.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - The grammar is always passed explicitly; no module reads it from a global
//!
//! gotchas:
//!     - The lib.rs is separate from main.rs - library consumers get lib, CLI gets main

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod formatter;
pub mod logging;
pub mod parser;
pub mod registry;
pub mod rewrite;
pub mod scan;
pub mod types;
pub mod workspace;

// Re-export main types for convenience
pub use commands::{list_available, option_files, rename_option, rename_setting, set_option};
pub use config::Config;
pub use error::{OptionsetError, Result};
pub use formatter::{AvailabilityReport, FilesReport, OptionReport, SettingReport};
pub use parser::{classify_line, Classification, Grammar, ParsedFile};
pub use registry::{Occurrence, Registry};
pub use rewrite::{RewriteOutcome, Target};
pub use types::{LineChange, LineState, OptionKind, SettingState};
pub use workspace::Workspace;
