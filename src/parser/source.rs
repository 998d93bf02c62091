//! Raw file text split into lines with their original terminators, so a file can be
//! written back byte-for-byte when nothing changed.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline.
    None,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,
    pub ending: LineEnding,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as walked (usable for I/O).
    pub path: PathBuf,
    /// Path relative to the scanned root (used in reports).
    pub relative: PathBuf,
    pub lines: Vec<SourceLine>,
}

impl SourceFile {
    pub fn from_text(path: impl Into<PathBuf>, relative: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            lines: split_lines(content),
        }
    }

    /// Reassemble the file, exactly as read.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(line.ending.as_str());
        }
        out
    }
}

pub fn split_lines(content: &str) -> Vec<SourceLine> {
    content
        .split_inclusive('\n')
        .map(|raw| {
            let (text, ending) = if let Some(text) = raw.strip_suffix("\r\n") {
                (text, LineEnding::CrLf)
            } else if let Some(text) = raw.strip_suffix('\n') {
                (text, LineEnding::Lf)
            } else {
                (raw, LineEnding::None)
            };
            SourceLine {
                text: text.to_string(),
                ending,
            }
        })
        .collect()
}
