//! @dose
//! purpose: The macro grammar as an explicit, immutable value: recognized comment tokens,
//!     the symbol set that prefixes option names, the name character class, the variable
//!     pattern syntax `='<regex>'` and the multi-line block marker. All regexes derived from
//!     the grammar are compiled once in `Grammar::new` and threaded through scanning,
//!     classification and rewriting.
//!
//! when-editing:
//!     - !Never read grammar values from globals; callers pass a `&Grammar`
//!     - Comment tokens are matched longest-first so `//` wins over a configured `/`
//!
//! invariants:
//!     - The block marker, quotes and name characters are never valid symbols
//!     - `default_token` is the first token in configured order

use crate::error::{OptionsetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_COMMENT_TOKENS: &[&str] = &["//", "#", "%", "!", "--"];
pub const DEFAULT_SYMBOLS: &str = "~@$^&=|?";
pub const DEFAULT_BLOCK_MARKER: char = '*';

/// Character class shared by option names (after the symbols) and setting names.
const NAME_CLASS: &str = r"[A-Za-z0-9._+\-]";

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._+\-]+$").unwrap());

pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')
}

/// True if `s` is a valid setting name (or option name without its symbols).
pub fn is_valid_name(s: &str) -> bool {
    NAME_RE.is_match(s)
}

#[derive(Debug, Clone)]
pub struct Grammar {
    /// Sorted longest-first for matching.
    comment_tokens: Vec<String>,
    default_token: String,
    symbols: Vec<char>,
    block_marker: char,
    token_re: Regex,
    macro_re: Regex,
    unterminated_re: Regex,
    option_input_re: Regex,
}

impl Grammar {
    pub fn new<S: AsRef<str>>(comment_tokens: &[S], symbols: &str, block_marker: char) -> Result<Self> {
        let invalid = |message: String| OptionsetError::InvalidGrammar { message };

        if comment_tokens.is_empty() {
            return Err(invalid("at least one comment token is required".to_string()));
        }
        let mut tokens: Vec<String> = Vec::with_capacity(comment_tokens.len());
        for token in comment_tokens {
            let token = token.as_ref();
            if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
                return Err(invalid(format!("invalid comment token '{}'", token)));
            }
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        let default_token = tokens[0].clone();

        if block_marker.is_whitespace() || is_name_char(block_marker) || block_marker == '\'' || block_marker == '"' {
            return Err(invalid(format!("invalid block marker '{}'", block_marker)));
        }

        let mut symbol_set: Vec<char> = Vec::new();
        for c in symbols.chars() {
            if c.is_whitespace() || is_name_char(c) || c == block_marker || c == '\'' || c == '"' {
                return Err(invalid(format!("invalid option symbol '{}'", c)));
            }
            if !symbol_set.contains(&c) {
                symbol_set.push(c);
            }
        }
        if symbol_set.is_empty() {
            return Err(invalid("at least one option symbol is required".to_string()));
        }

        // Longest first; stable sort keeps configured order among equal lengths.
        tokens.sort_by(|a, b| b.len().cmp(&a.len()));

        let token_alt = tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let sym_class: String = symbol_set
            .iter()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        let marker = regex::escape(&block_marker.to_string());
        let option = format!("[{sym_class}]+{NAME_CLASS}+");

        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| invalid(format!("failed to compile grammar: {}", e)))
        };

        Ok(Self {
            token_re: compile(format!("(?:{token_alt})"))?,
            macro_re: compile(format!(
                r#"(?:^|\s)(?P<marker>{marker})?(?P<option>{option})[ \t]+(?:=(?:'(?P<sq>[^\r\n]+)'|"(?P<dq>[^\r\n]+)")|(?P<setting>{NAME_CLASS}+))"#
            ))?,
            unterminated_re: compile(format!(r#"(?:^|\s){marker}?{option}[ \t]+=['"]"#))?,
            option_input_re: compile(format!(r"^{marker}?(?P<option>{option})$"))?,
            comment_tokens: tokens,
            default_token,
            symbols: symbol_set,
            block_marker,
        })
    }

    pub fn comment_tokens(&self) -> &[String] {
        &self.comment_tokens
    }

    pub fn default_token(&self) -> &str {
        &self.default_token
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn block_marker(&self) -> char {
        self.block_marker
    }

    pub(crate) fn macro_regex(&self) -> &Regex {
        &self.macro_re
    }

    pub(crate) fn unterminated_regex(&self) -> &Regex {
        &self.unterminated_re
    }

    /// Comment token starting exactly at byte `pos`, if any.
    pub fn token_at<'g>(&'g self, text: &str, pos: usize) -> Option<&'g str> {
        let rest = text.get(pos..)?;
        self.comment_tokens
            .iter()
            .find(|t| rest.starts_with(t.as_str()))
            .map(String::as_str)
    }

    /// First comment token after leading whitespace, as (byte offset, token).
    pub fn leading_token<'g>(&'g self, text: &str) -> Option<(usize, &'g str)> {
        let offset = text.len() - text.trim_start().len();
        self.token_at(text, offset).map(|t| (offset, t))
    }

    /// Byte offset just past up to `depth` leading comment levels, and the number found.
    pub fn skip_levels(&self, text: &str, depth: usize) -> (usize, usize) {
        let mut offset = 0;
        let mut found = 0;
        while found < depth {
            match self.leading_token(&text[offset..]) {
                Some((ws, token)) => {
                    offset += ws + token.len();
                    found += 1;
                }
                None => break,
            }
        }
        (offset, found)
    }

    /// Start and end of the last comment token found before byte `end`.
    pub fn last_token_before(&self, text: &str, end: usize) -> Option<(usize, usize)> {
        self.token_re
            .find_iter(&text[..end])
            .last()
            .map(|m| (m.start(), m.end()))
    }

    /// Validate a user-supplied option name, stripping a leading block marker.
    pub fn parse_option_name(&self, input: &str) -> Result<String> {
        self.option_input_re
            .captures(input.trim())
            .map(|caps| caps["option"].to_string())
            .ok_or_else(|| OptionsetError::InvalidOption {
                input: input.to_string(),
            })
    }

    pub fn validate_setting_name(&self, input: &str) -> Result<()> {
        if is_valid_name(input) {
            Ok(())
        } else {
            Err(OptionsetError::InvalidSetting {
                input: input.to_string(),
            })
        }
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new(DEFAULT_COMMENT_TOKENS, DEFAULT_SYMBOLS, DEFAULT_BLOCK_MARKER)
            .expect("built-in grammar is valid")
    }
}
