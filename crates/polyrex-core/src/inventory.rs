//! Inventory records emitted by the static extractors.
//!
//! One [`FileInventory`] per source file, printed as a single NDJSON line.
//! Pattern and flag text at a construction site is either statically known
//! or not; the two-state enums below keep that distinction typed internally
//! and collapse to the `DYNAMIC-*` sentinel strings on the wire.

use serde::{Deserialize, Serialize};

use crate::wire::intbool;

/// Wire sentinel for a pattern built at runtime (variable, concatenation,
/// interpolation).
pub const DYNAMIC_PATTERN: &str = "DYNAMIC-PATTERN";

/// Wire sentinel for flags built at runtime.
pub const DYNAMIC_FLAGS: &str = "DYNAMIC-FLAGS";

/// Pattern text at a construction site: known at parse time, or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PatternText {
    Static(String),
    Dynamic,
}

impl PatternText {
    pub fn is_static(&self) -> bool {
        matches!(self, PatternText::Static(_))
    }
}

impl From<PatternText> for String {
    fn from(text: PatternText) -> String {
        match text {
            PatternText::Static(s) => s,
            PatternText::Dynamic => DYNAMIC_PATTERN.to_string(),
        }
    }
}

impl From<String> for PatternText {
    fn from(s: String) -> PatternText {
        if s == DYNAMIC_PATTERN {
            PatternText::Dynamic
        } else {
            PatternText::Static(s)
        }
    }
}

/// Flags text at a construction site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FlagsText {
    Static(String),
    Dynamic,
}

impl From<FlagsText> for String {
    fn from(text: FlagsText) -> String {
        match text {
            FlagsText::Static(s) => s,
            FlagsText::Dynamic => DYNAMIC_FLAGS.to_string(),
        }
    }
}

impl From<String> for FlagsText {
    fn from(s: String) -> FlagsText {
        if s == DYNAMIC_FLAGS {
            FlagsText::Dynamic
        } else {
            FlagsText::Static(s)
        }
    }
}

/// How a regex came to exist in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    /// A regex literal (`/pat/flags`, `%r{pat}flags`).
    Literal,
    /// A constructor or library call (`new RegExp(...)`, `Regexp.new(...)`,
    /// `preg_match(...)`).
    Constructor,
}

/// One regex construction site discovered in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexSite {
    pub kind: SiteKind,
    pub pattern: PatternText,
    pub flags: FlagsText,
    /// 1-indexed source line.
    pub line: usize,
}

impl RegexSite {
    pub fn literal(pattern: PatternText, flags: FlagsText, line: usize) -> Self {
        RegexSite {
            kind: SiteKind::Literal,
            pattern,
            flags,
            line,
        }
    }

    pub fn constructor(pattern: PatternText, flags: FlagsText, line: usize) -> Self {
        RegexSite {
            kind: SiteKind::Constructor,
            pattern,
            flags,
            line,
        }
    }
}

/// The wire projection of a [`RegexSite`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexRecord {
    pub pattern: PatternText,
    pub flags: FlagsText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

impl From<RegexSite> for RegexRecord {
    fn from(site: RegexSite) -> RegexRecord {
        RegexRecord {
            pattern: site.pattern,
            flags: site.flags,
            line_number: Some(site.line),
        }
    }
}

/// Per-file extraction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInventory {
    pub file_name: String,
    pub language: String,
    /// 0 iff the source failed to parse, in which case `regexes` is empty.
    #[serde(with = "intbool")]
    pub could_parse: bool,
    pub regexes: Vec<RegexRecord>,
}

impl FileInventory {
    /// Iterate the statically-known pattern strings in this record.
    pub fn static_patterns(&self) -> impl Iterator<Item = &str> {
        self.regexes.iter().filter_map(|r| match &r.pattern {
            PatternText::Static(s) => Some(s.as_str()),
            PatternText::Dynamic => None,
        })
    }
}
