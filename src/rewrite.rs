//! @dose
//! purpose: Compute and persist line edits. Given parsed files and a target (a setting or
//!     a variable value) it toggles comment tokens on tagged lines and block interiors, or
//!     splices a new value into the captured span. Renames rewrite only the option or
//!     setting token bytes. Files are written atomically and only when something changed.
//!
//! when-editing:
//!     - !Planning is pure; only `commit` touches the filesystem
//!     - Uncommenting removes the first token after leading whitespace (at the line's depth),
//!       commenting inserts the option's token at column 0 (or after the depth prefix)
//!     - Keep original line endings, edits only ever change `SourceLine::text`
//!
//! invariants:
//!     - Applying the same target twice yields no edits the second time
//!     - A file whose block structure is broken for the option is never edited for it
//!     - Each file is written by exactly one worker
//!
//! gotchas:
//!     - Rewrites are not transactional across files; a failed write after successful ones
//!       is reported as PartialRewrite with both file lists
//!     - Read-only files are refused explicitly, privileged users would otherwise replace them

use crate::error::OptionsetError;
use crate::parser::{BlockRole, Grammar, MacroValue, ParsedFile, Tagged};
use crate::types::{LineChange, LineState};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Setting(String),
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rename {
    Option { from: String, to: String },
    Setting { option: String, from: String, to: String },
}

/// New content for one file plus the lines that changed.
#[derive(Debug, Clone)]
pub struct FileEdit {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub changes: Vec<LineChange>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteOutcome {
    pub changes: Vec<LineChange>,
    /// Files whose content changed (or would change, in a dry run).
    pub files_changed: Vec<PathBuf>,
    pub files_written: Vec<PathBuf>,
    pub dry_run: bool,
    /// Ambiguous activations present before the rewrite.
    pub resolved_ambiguities: Vec<OptionsetError>,
    pub issues: Vec<OptionsetError>,
}

impl RewriteOutcome {
    pub fn modified_lines(&self) -> usize {
        self.changes.len()
    }

    pub fn modified_files(&self) -> usize {
        self.files_changed.len()
    }

    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(OptionsetError::is_fatal_for_exit)
    }
}

/// Remove one comment token after `depth` levels, if one is there.
fn uncomment(grammar: &Grammar, text: &str, depth: usize) -> Option<String> {
    let (offset, _) = grammar.skip_levels(text, depth);
    let (ws, token) = grammar.leading_token(&text[offset..])?;
    let start = offset + ws;
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&text[start + token.len()..]);
    Some(out)
}

/// Insert `token` after `depth` levels.
fn comment(grammar: &Grammar, text: &str, depth: usize, token: &str) -> String {
    let (offset, _) = grammar.skip_levels(text, depth);
    let mut out = String::with_capacity(text.len() + token.len());
    out.push_str(&text[..offset]);
    out.push_str(token);
    out.push_str(&text[offset..]);
    out
}

fn toggle(grammar: &Grammar, text: &str, tagged: &Tagged, want: LineState, token: &str) -> Option<String> {
    if tagged.state == want {
        return None;
    }
    match want {
        LineState::Active => uncomment(grammar, text, tagged.depth),
        LineState::Inactive => Some(comment(grammar, text, tagged.depth, token)),
    }
}

fn splice(text: &str, span: std::ops::Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..span.start]);
    out.push_str(replacement);
    out.push_str(&text[span.end..]);
    out
}

fn finish_edit(parsed: &ParsedFile, edited: Vec<(usize, String)>) -> Option<FileEdit> {
    if edited.is_empty() {
        return None;
    }
    let mut lines = parsed.lines.clone();
    let mut changes = Vec::with_capacity(edited.len());
    for (idx, after) in edited {
        changes.push(LineChange {
            file: parsed.relative.clone(),
            line: idx + 1,
            before: lines[idx].text.clone(),
            after: after.clone(),
        });
        lines[idx].text = after;
    }
    let content = lines
        .iter()
        .flat_map(|line| [line.text.as_str(), line.ending.as_str()])
        .collect();
    Some(FileEdit {
        path: parsed.path.clone(),
        relative: parsed.relative.clone(),
        changes,
        content,
    })
}

/// Edits that make `target` the state of `option` in one file.
pub fn edit_for_target(
    parsed: &ParsedFile,
    grammar: &Grammar,
    option: &str,
    target: &Target,
) -> Option<FileEdit> {
    if !parsed.mentions(option) {
        return None;
    }
    if parsed.is_poisoned(option) {
        warn!(
            "skipping {} for '{}': malformed block structure",
            parsed.relative.display(),
            option
        );
        return None;
    }

    let token = parsed.comment_token_for(grammar, option);
    let mut edited = Vec::new();

    for (idx, (line, info)) in parsed.lines.iter().zip(&parsed.info).enumerate() {
        let text = &line.text;
        let own = info.tagged.as_ref().filter(|t| t.macro_line.option == option);

        let after = if let Some(tagged) = own {
            match (&tagged.macro_line.value, target) {
                (MacroValue::Setting(setting), Target::Setting(wanted)) => {
                    let want = if setting == wanted {
                        LineState::Active
                    } else {
                        LineState::Inactive
                    };
                    toggle(grammar, text, tagged, want, &token)
                }
                (MacroValue::Variable(_), Target::Value(value)) => tagged
                    .macro_line
                    .variable_span(grammar, text, tagged.depth)
                    .filter(|span| text[span.clone()] != *value)
                    .map(|span| splice(text, span, value)),
                _ => None,
            }
        } else {
            match (&info.block, target) {
                (Some(block), Target::Setting(wanted))
                    if block.role == BlockRole::Interior && block.key.option == option =>
                {
                    match (block.key.setting == *wanted, block.opened_state) {
                        (true, LineState::Inactive) => uncomment(grammar, text, 0),
                        (false, LineState::Active) => Some(comment(grammar, text, 0, &token)),
                        _ => None,
                    }
                }
                _ => None,
            }
        };

        if let Some(after) = after.filter(|after| after != text) {
            edited.push((idx, after));
        }
    }

    let edit = finish_edit(parsed, edited);
    if let Some(edit) = &edit {
        debug!(
            "{}: {} line(s) to change for '{}'",
            edit.relative.display(),
            edit.changes.len(),
            option
        );
    }
    edit
}

/// Edits that rename an option or setting token in one file.
pub fn edit_for_rename(parsed: &ParsedFile, rename: &Rename) -> Option<FileEdit> {
    let mut edited = Vec::new();
    for (idx, tagged) in parsed.tagged() {
        let text = &parsed.lines[idx].text;
        let macro_line = &tagged.macro_line;
        let after = match rename {
            Rename::Option { from, to } if macro_line.option == *from => {
                Some(splice(text, macro_line.option_span.clone(), to))
            }
            Rename::Setting { option, from, to }
                if macro_line.option == *option && macro_line.setting() == Some(from.as_str()) =>
            {
                Some(splice(text, macro_line.value_span.clone(), to))
            }
            _ => None,
        };
        if let Some(after) = after {
            edited.push((idx, after));
        }
    }
    finish_edit(parsed, edited)
}

/// Replace `path` with `content` via a temporary file next to the real file. Symlinks are
/// resolved first so the shared target is updated and the link stays a link.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let target = fs::canonicalize(path)?;
    let path = target.as_path();
    let metadata = fs::metadata(path)?;
    let permissions = metadata.permissions();
    if permissions.readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "file is read-only",
        ));
    }

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write every edit, in parallel, one worker per file.
pub fn commit(edits: &[FileEdit]) -> (Vec<PathBuf>, Vec<OptionsetError>) {
    let results: Vec<(PathBuf, io::Result<()>)> = edits
        .par_iter()
        .map(|edit| (edit.relative.clone(), write_atomic(&edit.path, &edit.content)))
        .collect();

    let mut written = Vec::new();
    let mut failed = Vec::new();
    let mut issues = Vec::new();
    for (relative, result) in results {
        match result {
            Ok(()) => {
                info!("modified {}", relative.display());
                written.push(relative);
            }
            Err(e) => {
                let err = OptionsetError::UnwritableFile {
                    file: relative.clone(),
                    reason: e.to_string(),
                };
                warn!("{}", err);
                issues.push(err);
                failed.push(relative);
            }
        }
    }

    if !written.is_empty() && !failed.is_empty() {
        issues.push(OptionsetError::PartialRewrite {
            written: written.clone(),
            untouched: failed,
        });
    }
    (written, issues)
}

/// Persist (unless `dry_run`) and summarize a set of edits.
pub fn apply_edits(edits: Vec<FileEdit>, dry_run: bool) -> RewriteOutcome {
    let mut outcome = RewriteOutcome {
        dry_run,
        files_changed: edits.iter().map(|e| e.relative.clone()).collect(),
        ..RewriteOutcome::default()
    };
    if !dry_run {
        let (written, issues) = commit(&edits);
        outcome.files_written = written;
        outcome.issues = issues;
    }
    outcome.changes = edits.into_iter().flat_map(|e| e.changes).collect();
    outcome
}
