//! @dose
//! purpose: Classify one line of text against the grammar: no macro, exactly one macro
//!     (option plus setting or variable pattern, with an optional block marker), or a
//!     malformed macro. Pure; multi-line context is layered on by `parser::parse_file`.
//!
//! when-editing:
//!     - The content/comment split is the last comment token *before* the macro token, so
//!       tokens inside a variable pattern or unit text never move it
//!     - Spans are byte offsets into the original line; rewrites splice them directly
//!
//! invariants:
//!     - A `Macro` always has its option token inside a comment
//!     - A variable pattern always compiles and has exactly one capturing group
//!     - Variable macros never carry the block marker
//!
//! gotchas:
//!     - Whitespace-only content counts as active (an empty alternative), so
//!       `         // @forces off` is the live form of `//         // @forces off`
//!     - A macro with nothing but comment tokens before it sits in a plain comment
//!       (`//nu 1; ~nu water`, `# e.g. ~nu water`) and is not a macro at all

use super::grammar::Grammar;
use crate::types::LineState;
use regex::{Captures, Regex};
use std::ops::Range;

#[derive(Debug, Clone)]
pub enum Classification {
    NoMacro,
    Macro(MacroLine),
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct VariablePattern {
    pub source: String,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub enum MacroValue {
    Setting(String),
    Variable(VariablePattern),
}

#[derive(Debug, Clone)]
pub struct MacroLine {
    /// Option name including its symbols, without the block marker.
    pub option: String,
    pub value: MacroValue,
    pub block_boundary: bool,
    /// Byte offset of the comment token that separates content from the macro comment.
    pub comment_start: usize,
    pub comment_token: String,
    pub option_span: Range<usize>,
    /// Setting name, or the pattern text between its quotes.
    pub value_span: Range<usize>,
}

impl MacroLine {
    pub fn setting(&self) -> Option<&str> {
        match &self.value {
            MacroValue::Setting(s) => Some(s),
            MacroValue::Variable(_) => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.value, MacroValue::Variable(_))
    }

    /// Content part of the line (everything before the separating comment token).
    pub fn content<'t>(&self, text: &'t str) -> &'t str {
        &text[..self.comment_start]
    }

    /// Activation state of the line evaluated `depth` comment levels deep.
    pub fn state(&self, grammar: &Grammar, text: &str, depth: usize) -> LineState {
        if self.is_variable() {
            return LineState::Active;
        }
        content_state(grammar, self.content(text), depth)
    }

    /// Byte range of the text captured by a variable pattern, searched in the content
    /// after `depth` comment levels.
    pub fn variable_span(&self, grammar: &Grammar, text: &str, depth: usize) -> Option<Range<usize>> {
        let MacroValue::Variable(pattern) = &self.value else {
            return None;
        };
        let content = self.content(text);
        let (offset, _) = grammar.skip_levels(content, depth);
        let group = pattern.regex.captures(&content[offset..])?.get(1)?;
        Some(group.start() + offset..group.end() + offset)
    }
}

/// Active unless a comment token leads the content once `depth` levels are peeled off.
pub fn content_state(grammar: &Grammar, content: &str, depth: usize) -> LineState {
    let (offset, _) = grammar.skip_levels(content, depth);
    if grammar.leading_token(&content[offset..]).is_some() {
        LineState::Inactive
    } else {
        LineState::Active
    }
}

/// True when `content` holds only comment tokens (or nothing), so the macro after it is
/// part of an ordinary comment.
fn comment_only(grammar: &Grammar, content: &str) -> bool {
    let (offset, _) = grammar.skip_levels(content, usize::MAX);
    offset == content.len()
}

/// Start of the macro token, including the block marker when present.
fn macro_start(caps: &Captures<'_>) -> usize {
    caps.name("marker")
        .or_else(|| caps.name("option"))
        .map(|m| m.start())
        .unwrap_or(0)
}

pub fn classify_line(grammar: &Grammar, text: &str) -> Classification {
    let candidates: Vec<Captures<'_>> = grammar.macro_regex().captures_iter(text).collect();

    let Some(caps) = candidates.last() else {
        // A half-written variable macro inside a comment is still worth reporting
        let commented = grammar.unterminated_regex().find_iter(text).any(|m| {
            let lead = m.as_str().len() - m.as_str().trim_start().len();
            grammar
                .last_token_before(text, m.start() + lead)
                .is_some_and(|(start, _)| !comment_only(grammar, &text[..start]))
        });
        if commented {
            return Classification::Malformed("unterminated variable pattern".to_string());
        }
        return Classification::NoMacro;
    };

    let start = macro_start(caps);
    let Some((comment_start, comment_end)) = grammar.last_token_before(text, start) else {
        return Classification::NoMacro;
    };
    if comment_only(grammar, &text[..comment_start]) {
        return Classification::NoMacro;
    }

    let in_comment: Vec<&Captures<'_>> = candidates
        .iter()
        .filter(|c| macro_start(c) >= comment_end)
        .collect();
    if in_comment.len() > 1 {
        return Classification::Malformed("more than one macro in a single comment".to_string());
    }

    let spans: Vec<Range<usize>> = in_comment
        .iter()
        .filter_map(|c| c.get(0))
        .map(|m| m.range())
        .collect();
    let dangling = grammar
        .unterminated_regex()
        .find_iter(&text[comment_end..])
        .map(|m| m.start() + comment_end)
        .any(|pos| !spans.iter().any(|span| span.contains(&pos)));
    if dangling {
        return Classification::Malformed("unterminated variable pattern".to_string());
    }

    let Some(option) = caps.name("option") else {
        return Classification::NoMacro;
    };
    let block_boundary = caps.name("marker").is_some();

    let (value, value_span) = if let Some(setting) = caps.name("setting") {
        (MacroValue::Setting(setting.as_str().to_string()), setting.range())
    } else if let Some(source) = caps.name("sq").or_else(|| caps.name("dq")) {
        if block_boundary {
            return Classification::Malformed(
                "variable options cannot span multiple lines".to_string(),
            );
        }
        let regex = match Regex::new(source.as_str()) {
            Ok(regex) => regex,
            Err(e) => {
                return Classification::Malformed(format!("invalid variable pattern: {}", e));
            }
        };
        if regex.captures_len() != 2 {
            return Classification::Malformed(format!(
                "variable pattern must have exactly one capturing group, found {}",
                regex.captures_len() - 1
            ));
        }
        let pattern = VariablePattern {
            source: source.as_str().to_string(),
            regex,
        };
        (MacroValue::Variable(pattern), source.range())
    } else {
        return Classification::NoMacro;
    };

    Classification::Macro(MacroLine {
        option: option.as_str().to_string(),
        value,
        block_boundary,
        comment_start,
        comment_token: text[comment_start..comment_end].to_string(),
        option_span: option.range(),
        value_span,
    })
}
