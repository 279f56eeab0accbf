//! Project source loading.
//!
//! Walks a project directory for `.rs` files, parses each one with `syn` and records the
//! module path it contributes (`src/models/user.rs` → `models::user`). Files that fail to
//! parse are reported as warnings and skipped so that one broken file does not stop
//! generation for the rest of the project.

use crate::error::{Error, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A parsed Rust source file
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Module path of the file relative to its crate root (empty for `lib.rs`/`main.rs`)
    pub module_path: Vec<String>,
    pub syntax_tree: syn::File,
}

impl SourceFile {
    /// Parse source text held in memory
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let syntax_tree = syn::parse_file(content).map_err(|e| Error::ParseError {
            file: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            module_path: module_path_for(&path),
            path,
            syntax_tree,
        })
    }

    /// Read and parse a file on disk
    pub fn read(path: &Path) -> Result<Self> {
        debug!("Parsing file: {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }
}

/// All parsed files of a project, in path order
#[derive(Debug, Default)]
pub struct SourceTree {
    pub files: Vec<SourceFile>,
    /// Files that were found but could not be read or parsed
    pub warnings: Vec<String>,
}

impl SourceTree {
    pub fn from_files(files: Vec<SourceFile>) -> Self {
        Self {
            files,
            warnings: Vec::new(),
        }
    }

    /// Scan `root` recursively, skipping `target` and hidden directories
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Project path is not a directory: {}", root.display());
        }

        let mut paths = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(root).sort_by_file_name().into_iter();
        for entry in walker.filter_entry(|e| e.path() == root || !is_skipped_dir(e.path())) {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file()
                        && path.extension().and_then(|e| e.to_str()) == Some("rs")
                    {
                        paths.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let message = format!("Failed to access entry: {}", e);
                    warn!("{}", message);
                    warnings.push(message);
                }
            }
        }

        debug!("Found {} Rust files under {}", paths.len(), root.display());

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            match SourceFile::read(path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    let message = format!("Skipping {}: {:#}", path.display(), e);
                    warn!("{}", message);
                    warnings.push(message);
                }
            }
        }

        Ok(Self { files, warnings })
    }
}

fn is_skipped_dir(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    path.is_dir() && (name.starts_with('.') || name == "target")
}

/// Derive the module path from a file path: everything after the last `src` component,
/// without crate roots, `mod.rs` and the `.rs` extension.
fn module_path_for(path: &Path) -> Vec<String> {
    let components: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let start = components
        .iter()
        .rposition(|c| c == "src")
        .map(|i| i + 1)
        .unwrap_or_else(|| components.len().saturating_sub(1));

    let mut module: Vec<String> = components[start..].to_vec();
    if let Some(last) = module.pop() {
        let stem = last.trim_end_matches(".rs");
        if !matches!(stem, "lib" | "main" | "mod") {
            module.push(stem.to_string());
        }
    }
    module
}
