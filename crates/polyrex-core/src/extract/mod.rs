//! Static regex extraction from source files.
//!
//! Each language driver parses the file with its tree-sitter grammar and
//! matches a small closed set of construction-site shapes: regex literals,
//! and constructor/library calls that take a pattern argument. Pattern or
//! flag text that cannot be read off the tree (a variable, a concatenation,
//! an interpolation) is recorded as dynamic rather than guessed at.

pub mod delimited;
mod javascript;
mod php;
mod ruby;

use std::ffi::OsStr;
use std::path::Path;

use arborium::tree_sitter::Node;
use eyre::{Result, WrapErr};

use crate::inventory::{FileInventory, RegexSite};

/// Source languages the extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
    Php,
    Ruby,
}

impl Language {
    /// Detect from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "php" => Some(Language::Php),
            "rb" => Some(Language::Ruby),
            _ => None,
        }
    }

    /// Detect from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse a user-supplied language name (CLI override).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "php" => Some(Language::Php),
            "ruby" | "rb" => Some(Language::Ruby),
            _ => None,
        }
    }

    /// The wire name used in inventory records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Php => "PHP",
            Language::Ruby => "Ruby",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File extensions the extractors know how to scan.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "js",  // JavaScript
    "jsx", // JavaScript JSX
    "mjs", // JavaScript module
    "cjs", // CommonJS
    "ts",  // TypeScript
    "tsx", // TypeScript JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
    "php", // PHP
    "rb",  // Ruby
];

/// Check if a file extension is supported for scanning
pub fn is_supported_extension(ext: &OsStr) -> bool {
    ext.to_str()
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Extract every statically discoverable regex site from `source`.
///
/// A file the grammar cannot make sense of yields a `couldParse = 0` record
/// with no sites - a reportable outcome, not an error.
pub fn extract(path: &Path, language: Language, source: &str) -> FileInventory {
    let sites = match language {
        Language::JavaScript | Language::TypeScript => javascript::sites(source),
        Language::Php => php::sites(source),
        Language::Ruby => ruby::sites(source),
    };

    match sites {
        Some(sites) => FileInventory {
            file_name: path.display().to_string(),
            language: language.as_str().to_string(),
            could_parse: true,
            regexes: sites.into_iter().map(Into::into).collect(),
        },
        None => FileInventory {
            file_name: path.display().to_string(),
            language: language.as_str().to_string(),
            could_parse: false,
            regexes: Vec::new(),
        },
    }
}

/// Extract from a file on disk, detecting the language from its extension.
pub fn extract_file(path: &Path) -> Result<FileInventory> {
    let language = Language::from_path(path)
        .ok_or_else(|| eyre::eyre!("Unsupported file type: {}", path.display()))?;
    let source = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    Ok(extract(path, language, &source))
}

fn collect_sites<F>(source: &str, node: Node, sites: &mut Vec<RegexSite>, site_at: F)
where
    F: Fn(&str, Node) -> Option<RegexSite> + Copy,
{
    if let Some(site) = site_at(source, node) {
        sites.push(site);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_sites(source, child, sites, site_at);
    }
}
