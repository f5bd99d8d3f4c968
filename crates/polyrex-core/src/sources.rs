//! Source providers for static extraction.

use std::path::PathBuf;

use eyre::Result;

use crate::extract::{self, Language};
use crate::inventory::FileInventory;

/// Trait for providing source files to extract regexes from.
pub trait Sources {
    /// Extract an inventory record from every provided source file.
    fn extract(self) -> Result<Vec<FileInventory>>;
}

/// Sources from an explicit list of file paths.
///
/// Records come back in input order. Files whose language cannot be
/// detected are an error; callers that want filtering should filter first.
pub struct PathSources(Vec<PathBuf>);

impl PathSources {
    /// Create from an iterator of paths
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl Sources for PathSources {
    fn extract(self) -> Result<Vec<FileInventory>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.0
                .par_iter()
                .map(|path| extract::extract_file(path))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.0
                .iter()
                .map(|path| extract::extract_file(path))
                .collect()
        }
    }
}

/// In-memory sources (useful for testing, WASM, etc.)
pub struct MemorySources(Vec<(PathBuf, String)>);

impl MemorySources {
    /// Create empty memory sources
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a file with content
    pub fn add(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.0.push((path.into(), content.into()));
        self
    }
}

impl Default for MemorySources {
    fn default() -> Self {
        Self::new()
    }
}

impl Sources for MemorySources {
    fn extract(self) -> Result<Vec<FileInventory>> {
        let mut records = Vec::new();
        for (path, content) in self.0 {
            let Some(language) = Language::from_path(&path) else {
                continue;
            };
            records.push(extract::extract(&path, language, &content));
        }
        Ok(records)
    }
}

/// Gitignore-aware directory walker.
#[cfg(feature = "walk")]
pub struct WalkSources {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

#[cfg(feature = "walk")]
impl WalkSources {
    /// Create a walker for the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Add include patterns (e.g., `["**/*.js"]`). No patterns means every
    /// supported file.
    pub fn include(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add exclude patterns (e.g., `["node_modules/**"]`)
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    fn glob_set(patterns: &[String]) -> Result<globset::GlobSet> {
        let mut builder = globset::GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(globset::Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

#[cfg(feature = "walk")]
impl Sources for WalkSources {
    fn extract(self) -> Result<Vec<FileInventory>> {
        use ignore::WalkBuilder;
        use std::sync::Mutex;

        use crate::extract::is_supported_extension;

        let include = Self::glob_set(&self.include)?;
        let exclude = Self::glob_set(&self.exclude)?;
        let records = Mutex::new(Vec::new());

        let walker = WalkBuilder::new(&self.root)
            .follow_links(true)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build_parallel();

        walker.run(|| {
            let records_ref = &records;
            let include = &include;
            let exclude = &exclude;
            let root = self.root.clone();

            Box::new(move |entry| {
                let Ok(entry) = entry else {
                    return ignore::WalkState::Continue;
                };
                let path = entry.path();

                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    return ignore::WalkState::Continue;
                }

                // Only supported file extensions
                if path
                    .extension()
                    .is_none_or(|ext| !is_supported_extension(ext))
                {
                    return ignore::WalkState::Continue;
                }

                let relative = path.strip_prefix(&root).unwrap_or(path);
                if !include.is_empty() && !include.is_match(relative) {
                    return ignore::WalkState::Continue;
                }
                if exclude.is_match(relative) {
                    return ignore::WalkState::Continue;
                }

                if let Ok(record) = extract::extract_file(path) {
                    records_ref.lock().unwrap().push(record);
                }

                ignore::WalkState::Continue
            })
        });

        let mut records = records.into_inner().unwrap();
        // The parallel walker visits files in nondeterministic order
        records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(records)
    }
}
