//! # Userscript Documents
//!
//! A userscript starts with a metadata block wrapped in sentinel comments:
//!
//! ```text
//! // ==UserScript==
//! // @name          Example
//! // @version       20240101.1200000
//! // ==/UserScript==
//! ```
//!
//! This module splits a script into that block and the remaining body
//! ([`parse`]) and writes it back in the canonical layout ([`serialize`]).
//!
//! ```
//! use userscript_build::script::{parse, serialize};
//!
//! let text = "// ==UserScript==\n// @name Demo\n// ==/UserScript==\nalert(1);\n";
//! let doc = parse(Some(text)).unwrap().unwrap();
//! assert_eq!(doc.metadata.get("@name"), Some("Demo"));
//! assert_eq!(doc.body, vec!["alert(1);".to_string()]);
//! assert!(serialize(&doc).starts_with("// ==UserScript==\n// @name          Demo\n"));
//! ```

use crate::error::{Error, Result};

/// First line of a metadata block.
pub const BLOCK_OPEN: &str = "// ==UserScript==";
/// Last line of a metadata block.
pub const BLOCK_CLOSE: &str = "// ==/UserScript==";
/// Key holding the script version.
pub const VERSION_KEY: &str = "@version";
/// Key used for dependency entries.
pub const REQUIRE_KEY: &str = "@require";

const COMMENT_PREFIX: &str = "//";
const OPEN_MARKER: &str = "==UserScript==";
const CLOSE_MARKER: &str = "==/UserScript==";
const KEY_MARKER: char = '@';
const KEY_COLUMN_WIDTH: usize = 15;

/// Spaces placed between a key and its value so values line up.
pub fn key_padding(key: &str) -> String {
    " ".repeat(KEY_COLUMN_WIDTH.saturating_sub(key.chars().count()).max(1))
}

/// Ordered `(key, value)` pairs of a metadata block.
///
/// Keys may repeat (`@require`, `@match`, ...). Lookups return the first
/// matching entry; iteration yields every entry in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the first entry with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Index of the first entry with `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Every value stored under `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn insert_front(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(0, (key.into(), value.into()));
    }

    /// Overwrite the value of the first entry with `key`, or append a new
    /// entry when there is none.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        match self.position(key) {
            Some(i) => self.entries[i].1 = value.into(),
            None => self.entries.push((key.to_string(), value.into())),
        }
    }

    /// Replace the value at `index`.
    pub fn set_at(&mut self, index: usize, value: impl Into<String>) {
        self.entries[index].1 = value.into();
    }

    /// Drop every entry with `key` except the first one.
    pub fn retain_first(&mut self, key: &str) {
        let mut seen = false;
        self.entries.retain(|(k, _)| {
            if k != key {
                return true;
            }
            let keep = !seen;
            seen = true;
            keep
        });
    }

    /// Stable sort by `key + padding + value`, the same text a serialized
    /// line would carry.
    pub fn sort(&mut self) {
        self.entries
            .sort_by_cached_key(|(k, v)| format!("{}{}{}\n", k, key_padding(k), v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A parsed userscript: its metadata block and the lines that follow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub metadata: Metadata,
    /// Body lines without terminators; no leading or trailing blank lines.
    pub body: Vec<String>,
}

impl Document {
    /// Build a document, trimming blank lines at either end of `body`.
    pub fn new(metadata: Metadata, body: Vec<String>) -> Self {
        Self {
            metadata,
            body: trim_blank_lines(body),
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.get(VERSION_KEY)
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.metadata.set(VERSION_KEY, version);
    }

    /// Structural equality that disregards the value of `@version`.
    ///
    /// Keys are still compared position by position, so a document that
    /// lacks a version entry never matches one that has it.
    pub fn equals_ignoring_version(&self, other: &Document) -> bool {
        self.body == other.body
            && self.metadata.len() == other.metadata.len()
            && self
                .metadata
                .iter()
                .zip(other.metadata.iter())
                .all(|((sk, sv), (ok, ov))| sk == ok && (sk == VERSION_KEY || sv == ov))
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn trim_blank_lines(mut lines: Vec<String>) -> Vec<String> {
    let Some(start) = lines.iter().position(|l| !is_blank(l)) else {
        return Vec::new();
    };
    let end = lines.iter().rposition(|l| !is_blank(l)).map_or(0, |i| i + 1);
    lines.truncate(end);
    lines.drain(..start);
    lines
}

/// Split a `// @key value` line into its key and value.
fn parse_key_line(trimmed: &str, line_no: usize) -> Result<Option<(String, String)>> {
    let Some(start) = trimmed.find(KEY_MARKER) else {
        return Ok(None);
    };
    let rest = &trimmed[start..];
    let Some(end) = rest.find(' ') else {
        return Err(Error::MetadataParse {
            line: line_no,
            message: format!("expected a value after '{}'", rest),
        });
    };
    Ok(Some((rest[..end].to_string(), rest[end..].trim().to_string())))
}

/// Parse script text into a [`Document`].
///
/// Returns `Ok(None)` for absent or empty input. Lines inside the metadata
/// block that carry no `@key` are dropped; a key with no value after it is
/// rejected with [`Error::MetadataParse`].
pub fn parse(text: Option<&str>) -> Result<Option<Document>> {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let mut in_block = false;
    let mut metadata = Metadata::new();
    let mut body = Vec::new();

    for (i, line) in text.split('\n').enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with(COMMENT_PREFIX) {
            if trimmed.contains(CLOSE_MARKER) {
                in_block = false;
                continue;
            } else if trimmed.contains(OPEN_MARKER) {
                in_block = true;
            } else if in_block {
                if let Some((key, value)) = parse_key_line(trimmed, i + 1)? {
                    metadata.push(key, value);
                }
            }
        }
        if !in_block {
            body.push(line.strip_suffix('\r').unwrap_or(line).to_string());
        }
    }

    Ok(Some(Document::new(metadata, body)))
}

/// Render a [`Document`] in the canonical artifact layout.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(BLOCK_OPEN);
    out.push('\n');
    for (key, value) in doc.metadata.iter() {
        out.push_str(&format!("// {}{}{}\n", key, key_padding(key), value));
    }
    out.push_str(BLOCK_CLOSE);
    out.push('\n');
    out.push_str("\n\n");
    for line in &doc.body {
        out.push_str(line);
        out.push('\n');
    }
    out
}
