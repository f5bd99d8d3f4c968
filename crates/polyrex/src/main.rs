//! polyrex - compare regex behavior and usage across language ecosystems
//!
//! polyrex is the Rust host of a cross-language regex corpus: `query`
//! evaluates a pattern against subject strings with Rust's regex engine,
//! `extract`/`scan` inventory the regexes statically declared in
//! JavaScript/TypeScript/PHP/Ruby sources, and `uniq` reduces inventories
//! to their unique patterns.
//!
//! Stdout carries nothing but the JSON contract; progress and diagnostics
//! go to stderr.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use polyrex_core::{FileInventory, Language, Query, Sources, WalkSources, evaluate, extract};
use serde::Serialize;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "polyrex", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a regex query document against the Rust regex engine
    Query {
        /// Path to the query file ({"pattern": ..., "inputs": [...]})
        file: PathBuf,
    },

    /// Extract statically-declared regexes from a source file
    Extract {
        /// Source file to analyze
        file: PathBuf,

        /// Override language detection (javascript, typescript, php, ruby)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Walk a directory and extract regexes from every supported source file
    Scan {
        /// Root directory to walk
        root: PathBuf,

        /// Glob patterns for files to include (default: all supported)
        #[arg(long)]
        include: Vec<String>,

        /// Glob patterns to exclude (default: target/**, node_modules/**)
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Reduce extractor output (NDJSON) to the set of unique static patterns
    Uniq {
        /// Inventory files produced by `extract` or `scan`
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Query { file } => run_query(&file),
        Command::Extract { file, language } => run_extract(&file, language.as_deref()),
        Command::Scan {
            root,
            include,
            exclude,
        } => run_scan(&root, include, exclude),
        Command::Uniq { files } => run_uniq(&files),
    }
}

fn run_query(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;

    // A missing pattern/inputs is a caller contract violation, reported as a
    // process failure - not as validPattern = 0
    let query: Query = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Malformed query document {}", path.display()))?;

    for input in &query.inputs {
        eprintln!(
            "matching: pattern /{}/ input: length {}",
            query.pattern,
            input.len()
        );
    }

    let response = evaluate(query);

    if !response.valid_pattern {
        eprintln!(
            "{} pattern rejected by the engine",
            "!".yellow().bold()
        );
    }

    emit(&response)
}

fn run_extract(path: &Path, language: Option<&str>) -> Result<()> {
    let inventory = match language {
        Some(name) => {
            let language = Language::from_name(name)
                .ok_or_else(|| eyre::eyre!("Unknown language: {}", name))?;
            let source = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            extract::extract(path, language, &source)
        }
        None => extract::extract_file(path)?,
    };

    if !inventory.could_parse {
        eprintln!(
            "{} {} failed to parse",
            "!".yellow().bold(),
            path.display()
        );
    } else {
        eprintln!(
            "   Found {} regexes in {}",
            inventory.regexes.len().to_string().green(),
            path.display()
        );
    }

    emit(&inventory)
}

fn run_scan(root: &Path, include: Vec<String>, exclude: Vec<String>) -> Result<()> {
    let exclude = if exclude.is_empty() {
        vec!["target/**".to_string(), "node_modules/**".to_string()]
    } else {
        exclude
    };

    eprintln!("{} Scanning {}...", "->".blue().bold(), root.display());

    let records = WalkSources::new(root)
        .include(include)
        .exclude(exclude)
        .extract()?;

    let n_regexes: usize = records.iter().map(|r| r.regexes.len()).sum();
    let n_unparsed = records.iter().filter(|r| !r.could_parse).count();
    eprintln!(
        "   Found {} regexes across {} files",
        n_regexes.to_string().green(),
        records.len().to_string().green()
    );
    if n_unparsed > 0 {
        eprintln!(
            "{} {} files failed to parse",
            "!".yellow().bold(),
            n_unparsed
        );
    }

    for record in &records {
        emit(record)?;
    }
    Ok(())
}

/// One line of `uniq` output.
#[derive(Debug, Serialize)]
struct UniquePattern<'a> {
    pattern: &'a str,
}

fn run_uniq(paths: &[PathBuf]) -> Result<()> {
    let mut unique: BTreeSet<String> = BTreeSet::new();
    let mut n_records = 0usize;

    for path in paths {
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("Failed to open {}", path.display()))?;

        let mut in_file: BTreeSet<String> = BTreeSet::new();
        for line in BufReader::new(file).lines() {
            let line = line.wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }

            let inventory: FileInventory = serde_json::from_str(&line)
                .wrap_err_with(|| format!("Malformed inventory line in {}", path.display()))?;
            n_records += 1;
            in_file.extend(inventory.static_patterns().map(str::to_string));
        }

        eprintln!(
            "   {} unique patterns in {}",
            in_file.len().to_string().green(),
            path.display()
        );
        unique.extend(in_file);
    }

    eprintln!(
        "{} {} unique patterns across {} records",
        "->".blue().bold(),
        unique.len().to_string().green(),
        n_records
    );

    for pattern in &unique {
        emit(&UniquePattern { pattern })?;
    }
    Ok(())
}

/// Print one JSON document + newline to stdout.
fn emit<T: Serialize>(document: &T) -> Result<()> {
    let json = serde_json::to_string(document).wrap_err("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
