//! polyrex-core - Core library for cross-language regex research
//!
//! This crate provides the building blocks for:
//! - Evaluating a regex query (one pattern, many subject strings) against
//!   the Rust regex engine and reporting per-input match results
//! - Statically extracting regex literals and constructions from
//!   JavaScript, TypeScript, PHP, and Ruby sources
//! - Walking source trees to inventory every regex in a project
//!
//! # Features
//!
//! - `walk` - Enable [`WalkSources`] for gitignore-aware directory walking
//!   (brings in `ignore` and `globset`)
//! - `parallel` - Enable parallel extraction (brings in `rayon`)
//!
//! # Evaluating a query
//!
//! A query document pairs a pattern with subject strings; the response is
//! the same document with `validPattern` and per-input `results` attached.
//! Fields the evaluator doesn't know about pass through untouched, so
//! responses from different host languages stay diffable.
//!
//! ```
//! use polyrex_core::{Query, evaluate};
//!
//! let query: Query =
//!     serde_json::from_str(r#"{"pattern": "(a)|(b)", "inputs": ["b", "zzz"]}"#).unwrap();
//! let response = evaluate(query);
//!
//! assert!(response.valid_pattern);
//! assert_eq!(response.results.len(), 2);
//! // Unused capture groups normalize to "" for cross-host comparison
//! assert_eq!(response.results[0].match_contents.capture_groups, ["", "b"]);
//! ```
//!
//! # Extracting regexes from source
//!
//! ```
//! use polyrex_core::{MemorySources, Sources};
//!
//! let records = MemorySources::new()
//!     .add("app.js", "var re = /ab+c/i;")
//!     .add("check.rb", "Regexp.new('x\\d', Regexp::IGNORECASE)")
//!     .extract()
//!     .unwrap();
//!
//! assert_eq!(records.len(), 2);
//! assert!(records.iter().all(|r| r.could_parse));
//! ```

pub mod extract;
pub mod inventory;
pub mod query;
pub mod sources;
mod wire;

pub use extract::{Language, SUPPORTED_EXTENSIONS, is_supported_extension};
pub use inventory::{
    DYNAMIC_FLAGS, DYNAMIC_PATTERN, FileInventory, FlagsText, PatternText, RegexRecord, RegexSite,
    SiteKind,
};
pub use query::{MatchContents, MatchResult, Query, Response, evaluate};
pub use sources::{MemorySources, PathSources, Sources};

#[cfg(feature = "walk")]
pub use sources::WalkSources;
