//! @dose
//! purpose: Turn one source file into a `ParsedFile`: every line annotated with the macro it
//!     carries (if any), the comment depth it is evaluated at, and the multi-line block it
//!     belongs to. Per-file problems are collected as issues; options whose blocks are
//!     broken in a file are marked poisoned so the rewriter leaves them alone there.
//!
//! when-editing:
//!     - !Keep `classify_line` pure; all cross-line state lives in `BlockTracker`
//!     - Block interior lines are tagged for toggling only, the registry never counts them
//!
//! invariants:
//!     - `info.len() == lines.len()`
//!     - A poisoned option has at least one MalformedMacro issue in the same file
//!     - Macros nested in an inactive block are evaluated at depth 1, everything else at 0
//!
//! flows:
//!     - Scan: scan::read_source -> parse_file -> registry::Registry::build
//!     - Rewrite: ParsedFile -> rewrite::edit_for_target / edit_for_rename

mod classify;
pub mod grammar;
mod source;
mod tracker;

pub use classify::{classify_line, content_state, Classification, MacroLine, MacroValue, VariablePattern};
pub use grammar::Grammar;
pub use source::{split_lines, LineEnding, SourceFile, SourceLine};
pub use tracker::{BlockKey, BlockTracker, BoundaryEvent, OpenBlock};

use crate::error::OptionsetError;
use crate::types::LineState;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A line that carries its own macro.
#[derive(Debug, Clone)]
pub struct Tagged {
    pub macro_line: MacroLine,
    /// Comment levels owned by an enclosing block.
    pub depth: usize,
    pub state: LineState,
    /// Current value of a variable option.
    pub captured: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Open,
    Interior,
    Close,
}

#[derive(Debug, Clone)]
pub struct BlockMember {
    pub key: BlockKey,
    pub role: BlockRole,
    /// State of the opening boundary, which decides how interior lines shift.
    pub opened_state: LineState,
}

#[derive(Debug, Clone, Default)]
pub struct LineInfo {
    pub tagged: Option<Tagged>,
    pub block: Option<BlockMember>,
}

#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub lines: Vec<SourceLine>,
    pub info: Vec<LineInfo>,
    pub issues: Vec<OptionsetError>,
    pub poisoned: BTreeSet<String>,
}

impl ParsedFile {
    /// Tagged lines with their 0-based index.
    pub fn tagged(&self) -> impl Iterator<Item = (usize, &Tagged)> {
        self.info
            .iter()
            .enumerate()
            .filter_map(|(idx, info)| info.tagged.as_ref().map(|t| (idx, t)))
    }

    pub fn mentions(&self, option: &str) -> bool {
        self.tagged().any(|(_, t)| t.macro_line.option == option)
    }

    pub fn is_poisoned(&self, option: &str) -> bool {
        self.poisoned.contains(option)
    }

    /// Comment token used when commenting out lines of `option` in this file: the token
    /// already commenting out one of its lines, else the token its macros live behind.
    pub fn comment_token_for(&self, grammar: &Grammar, option: &str) -> String {
        let mut fallback = None;
        for (idx, tagged) in self.tagged() {
            if tagged.macro_line.option != option {
                continue;
            }
            if tagged.state == LineState::Inactive {
                let text = &self.lines[idx].text;
                let (offset, _) = grammar.skip_levels(text, tagged.depth);
                if let Some((_, token)) = grammar.leading_token(&text[offset..]) {
                    return token.to_string();
                }
            }
            if fallback.is_none() {
                fallback = Some(tagged.macro_line.comment_token.clone());
            }
        }
        fallback.unwrap_or_else(|| grammar.default_token().to_string())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(line.ending.as_str());
        }
        out
    }
}

fn interior(open: &OpenBlock) -> BlockMember {
    BlockMember {
        key: open.key.clone(),
        role: BlockRole::Interior,
        opened_state: open.state,
    }
}

pub fn parse_file(source: SourceFile, grammar: &Grammar) -> ParsedFile {
    let SourceFile {
        path,
        relative,
        lines,
    } = source;

    let mut info = Vec::with_capacity(lines.len());
    let mut issues = Vec::new();
    let mut poisoned = BTreeSet::new();
    let mut tracker = BlockTracker::default();

    for (idx, line) in lines.iter().enumerate() {
        let number = idx + 1;
        let open = tracker.open_block().cloned();
        let mut entry = LineInfo::default();
        let mut malformed = |reason: String| {
            warn!("{}:{}: {}", relative.display(), number, reason);
            issues.push(OptionsetError::malformed(&relative, number, reason));
        };

        match classify_line(grammar, &line.text) {
            Classification::NoMacro => {}
            Classification::Malformed(reason) => malformed(reason),
            Classification::Macro(macro_line) if macro_line.block_boundary => {
                let state = macro_line.state(grammar, &line.text, 0);
                let key = BlockKey {
                    option: macro_line.option.clone(),
                    setting: macro_line.setting().unwrap_or_default().to_string(),
                };
                match tracker.boundary(key.clone(), number, state) {
                    BoundaryEvent::Opened => {
                        entry.block = Some(BlockMember {
                            key,
                            role: BlockRole::Open,
                            opened_state: state,
                        });
                        entry.tagged = Some(Tagged {
                            macro_line,
                            depth: 0,
                            state,
                            captured: None,
                        });
                    }
                    BoundaryEvent::Closed(opened) => {
                        entry.block = Some(BlockMember {
                            key,
                            role: BlockRole::Close,
                            opened_state: opened.state,
                        });
                        entry.tagged = Some(Tagged {
                            macro_line,
                            depth: 0,
                            state,
                            captured: None,
                        });
                    }
                    BoundaryEvent::Mismatch { open } => {
                        malformed(format!(
                            "block marker for '{} {}' while '{} {}' from line {} is still open",
                            key.option, key.setting, open.key.option, open.key.setting, open.line
                        ));
                        poisoned.insert(key.option);
                        poisoned.insert(open.key.option);
                    }
                }
            }
            Classification::Macro(macro_line) => {
                let depth = match &open {
                    Some(block) if block.key.option == macro_line.option => {
                        malformed(format!(
                            "macro for '{}' inside its own block from line {}",
                            macro_line.option, block.line
                        ));
                        None
                    }
                    Some(block) if block.state == LineState::Inactive => Some(1),
                    _ => Some(0),
                };
                if let Some(depth) = depth {
                    let state = macro_line.state(grammar, &line.text, depth);
                    let captured = macro_line
                        .variable_span(grammar, &line.text, depth)
                        .map(|span| line.text[span].to_string());
                    if macro_line.is_variable() && captured.is_none() {
                        malformed(format!(
                            "variable pattern for '{}' does not match the line",
                            macro_line.option
                        ));
                    } else {
                        entry.tagged = Some(Tagged {
                            macro_line,
                            depth,
                            state,
                            captured,
                        });
                    }
                }
            }
        }

        if entry.block.is_none() {
            entry.block = open.as_ref().map(interior);
        }
        info.push(entry);
    }

    if let Some(open) = tracker.finish() {
        warn!(
            "{}:{}: block for '{} {}' is never closed",
            relative.display(),
            open.line,
            open.key.option,
            open.key.setting
        );
        issues.push(OptionsetError::malformed(
            &relative,
            open.line,
            format!(
                "block marker for '{} {}' has no matching close",
                open.key.option, open.key.setting
            ),
        ));
        poisoned.insert(open.key.option);
    }

    debug!(
        "parsed {}: {} lines, {} tagged, {} issues",
        relative.display(),
        lines.len(),
        info.iter().filter(|i| i.tagged.is_some()).count(),
        issues.len()
    );

    ParsedFile {
        path,
        relative,
        lines,
        info,
        issues,
        poisoned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ParsedFile {
        parse_file(SourceFile::from_text("f", "f", content), &Grammar::default())
    }

    #[test]
    fn test_simple_file() {
        let parsed = parse(
            "nu = 1.5e-5; // air [m^2/s] ~nu air\n//nu = 1e-6; // water [m^2/s] ~nu water\nrest\n",
        );
        assert_eq!(parsed.info.len(), 3);
        let tagged: Vec<_> = parsed.tagged().collect();
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[0].1.state, LineState::Active);
        assert_eq!(tagged[1].1.state, LineState::Inactive);
        assert!(parsed.issues.is_empty());
        assert!(parsed.mentions("~nu"));
        assert!(!parsed.mentions("~n"));
    }

    #[test]
    fn test_block_membership() {
        let parsed = parse(concat!(
            "functions        // *@forces on\n",
            "{\n",
            "#include \"forces\"\n",
            "}                // *@forces on\n",
            "//               // @forces off\n",
        ));
        let roles: Vec<_> = parsed
            .info
            .iter()
            .map(|i| i.block.as_ref().map(|b| b.role))
            .collect();
        assert_eq!(
            roles,
            vec![
                Some(BlockRole::Open),
                Some(BlockRole::Interior),
                Some(BlockRole::Interior),
                Some(BlockRole::Close),
                None
            ]
        );
        assert!(parsed.issues.is_empty());
        assert!(parsed.poisoned.is_empty());
    }

    #[test]
    fn test_nested_macro_depth() {
        let parsed = parse(concat!(
            "//solvers        // *@solver gamg\n",
            "//  nCorr 2;     // ~corr two\n",
            "////nCorr 3;     // ~corr three\n",
            "//}              // *@solver gamg\n",
        ));
        let two = parsed.info[1].tagged.as_ref().unwrap();
        assert_eq!(two.depth, 1);
        assert_eq!(two.state, LineState::Active);
        let three = parsed.info[2].tagged.as_ref().unwrap();
        assert_eq!(three.state, LineState::Inactive);
    }

    #[test]
    fn test_unclosed_block_poisons_option() {
        let parsed = parse("a // *@forces on\nb\n");
        assert!(parsed.is_poisoned("@forces"));
        assert!(matches!(
            parsed.issues[0],
            OptionsetError::MalformedMacro { line: 1, .. }
        ));
    }

    #[test]
    fn test_mismatched_boundary() {
        let parsed = parse("a // *@a on\nb // *@b on\nc // *@a on\n");
        assert!(parsed.is_poisoned("@a"));
        assert!(parsed.is_poisoned("@b"));
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(
            parsed.info[1].block.as_ref().map(|b| b.role),
            Some(BlockRole::Interior)
        );
    }

    #[test]
    fn test_same_option_inside_own_block() {
        let parsed = parse("a // *@a on\nb // @a on\nc // *@a on\n");
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.info[1].tagged.is_none());
        assert!(!parsed.is_poisoned("@a"));
    }

    #[test]
    fn test_variable_capture_and_mismatch() {
        let parsed = parse("rho = 1.225; // ~density ='rho = (.*);'\nmu 2; // ~mu ='nu = (.*);'\n");
        let rho = parsed.info[0].tagged.as_ref().unwrap();
        assert_eq!(rho.captured.as_deref(), Some("1.225"));
        assert!(parsed.info[1].tagged.is_none());
        assert_eq!(parsed.issues.len(), 1);
    }

    #[test]
    fn test_comment_token_for() {
        let grammar = Grammar::default();
        let parsed = parse("a 1; # @x one\n#a 2; # @x two\n");
        assert_eq!(parsed.comment_token_for(&grammar, "@x"), "#");
        let parsed = parse("a 1; % @x one\n");
        assert_eq!(parsed.comment_token_for(&grammar, "@x"), "%");
        assert_eq!(parsed.comment_token_for(&grammar, "@missing"), "//");
    }

    #[test]
    fn test_render_round_trip() {
        let content = "a 1; // @x one\r\n//a 2; // @x two\r\nend";
        assert_eq!(parse(content).render(), content);
    }
}
