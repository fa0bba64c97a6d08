//! The analysis-file format: one delimited block per slide.
//!
//! Each record is written as
//!
//! ```text
//!
//! ==================================================
//! SLIDE 3
//! ==================================================
//!
//! <analysis text, verbatim>
//!
//! ```
//!
//! The text is not escaped, so it must not itself contain a separator block.
//!
//! Decoding splits on separator blocks and keeps the fragments in file order.
//! The `SLIDE n` label is written for humans and is deliberately not parsed
//! back: a hand-reordered file decodes in physical order, not label order.

use crate::error::SlidesError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Width of the `=` rule above and below each label.
pub const SEPARATOR_WIDTH: usize = 50;

static RE_SEPARATOR_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"={50,}\nSLIDE \d+\n={50,}\n\n").unwrap());

/// Analysis result for one slide.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SlideRecord {
    /// 1-based position of the slide in the deck.
    pub index: usize,
    /// Analysis text as returned by the model.
    pub text: String,
}

impl SlideRecord {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Serialise this record into its on-disk block.
    pub fn encode(&self) -> String {
        encode_record(self.index, &self.text)
    }
}

/// Serialise one record: blank line, rule, label, rule, blank line, text, two newlines.
pub fn encode_record(index: usize, text: &str) -> String {
    let rule = "=".repeat(SEPARATOR_WIDTH);
    format!("\n{rule}\nSLIDE {index}\n{rule}\n\n{text}\n\n")
}

/// Append `record` to the analysis file at `path`, creating it if absent.
pub fn append_record(path: &Path, record: &SlideRecord) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(record.encode().as_bytes())?;
    file.flush()
}

/// Decode analysis-file content into record texts, in file order.
///
/// Fragments are trimmed of surrounding whitespace, then of one leading and
/// one trailing `"`; fragments that end up empty are dropped.
pub fn parse_records(content: &str) -> Vec<String> {
    let normalised;
    let content = if content.contains("\r\n") {
        normalised = content.replace("\r\n", "\n");
        normalised.as_str()
    } else {
        content
    };

    RE_SEPARATOR_BLOCK
        .split(content)
        .map(clean_fragment)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and decode the analysis file at `path`.
pub fn parse_file(path: &Path) -> Result<Vec<String>, SlidesError> {
    let content = std::fs::read_to_string(path).map_err(|source| SlidesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_records(&content))
}

fn clean_fragment(fragment: &str) -> &str {
    let s = fragment.trim();
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}
