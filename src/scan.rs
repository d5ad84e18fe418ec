//! Filesystem scanning: project inventories and learn-repo project discovery

use crate::ir::ProjectFiles;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Excludes a directory and everything below it
pub const SKIP_MARKER: &str = ".circuitpython.skip-screenshot";
/// Excludes a directory's own files but still visits its subdirectories
pub const SKIP_HERE_MARKER: &str = ".circuitpython.skip-screenshot-here";
/// Handles a directory's own files without visiting its subdirectories
pub const SKIP_SUB_MARKER: &str = ".circuitpython.skip-screenshot-sub";

/// Folder holding libraries the project ships itself
pub const LIB_DIR: &str = "lib";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Extensions of project files drawn in the tree
    pub shown_extensions: Vec<String>,
    /// Extensions drawn for library examples, where sibling scripts are other examples
    pub example_extensions: Vec<String>,
    /// Folders with more entries than this are drawn without children
    pub subdirectory_entry_limit: usize,
}

fn default_shown_extensions() -> Vec<String> {
    [
        "py", "mpy", "txt", "toml", "html", "bmp", "png", "jpg", "svg", "wav", "mp3", "mid", "pcf",
        "bdf", "csv", "json", "license",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ScanOptions {
    fn default() -> Self {
        let shown_extensions = default_shown_extensions();
        let example_extensions = shown_extensions.iter().filter(|e| *e != "py").cloned().collect();
        Self {
            shown_extensions,
            example_extensions,
            subdirectory_entry_limit: 9,
        }
    }
}

/// Text after the last `.`, if the name has one
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn has_shown_extension(name: &str, extensions: &[String]) -> bool {
    extension(name).is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Direct children of `dir`, sorted by name
fn read_entries(dir: &Path) -> Result<Vec<Entry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| -> Result<Entry> {
            let entry = entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
            Ok(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path().to_path_buf(),
                is_dir: entry.file_type().is_dir(),
            })
        })
        .collect()
}

fn subtree_has_marker(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| entry.file_name() == SKIP_MARKER)
}

fn vendored_libs(lib_dir: &Path) -> Result<BTreeSet<String>> {
    Ok(read_entries(lib_dir)?
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| !is_hidden(name))
        .collect())
}

/// Inventory of a learn guide project directory
pub fn files_for_project(project_dir: &Path, options: &ScanOptions) -> Result<ProjectFiles> {
    let mut files = ProjectFiles::default();

    for entry in read_entries(project_dir)? {
        if !entry.is_dir {
            if has_shown_extension(&entry.name, &options.shown_extensions) {
                files.insert_file(entry.name);
            }
            continue;
        }
        if is_hidden(&entry.name) {
            continue;
        }
        if entry.name == LIB_DIR {
            files.vendored_libs = vendored_libs(&entry.path)?;
            continue;
        }
        if subtree_has_marker(&entry.path) {
            debug!(folder = %entry.path.display(), "Skipping marked folder");
            continue;
        }

        let mut children: Vec<String> = read_entries(&entry.path)?
            .into_iter()
            .map(|child| child.name)
            .filter(|name| !is_hidden(name))
            .collect();
        if children.len() > options.subdirectory_entry_limit {
            debug!(folder = %entry.name, entries = children.len(), "Too many entries, collapsing");
            children.clear();
        }
        files.insert_directory(entry.name, children);
    }

    Ok(files)
}

/// Inventory for a single library example script.
///
/// The example is copied to the board as `code.py`, so that name is always
/// present; other scripts next to it are separate examples and are not shown.
pub fn files_for_example(example_path: &Path, options: &ScanOptions) -> Result<ProjectFiles> {
    let example_dir = match example_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let extensions = &options.example_extensions;

    let mut files = ProjectFiles::default();
    files.insert_file("code.py");

    for entry in read_entries(example_dir)? {
        if !entry.is_dir {
            if has_shown_extension(&entry.name, extensions) {
                files.insert_file(entry.name);
            }
            continue;
        }
        if is_hidden(&entry.name) {
            continue;
        }
        if entry.name == LIB_DIR {
            files.vendored_libs = vendored_libs(&entry.path)?;
            continue;
        }
        if subtree_has_marker(&entry.path) {
            continue;
        }

        let children: Vec<String> = read_entries(&entry.path)?
            .into_iter()
            .filter(|child| !is_hidden(&child.name))
            .filter(|child| child.is_dir || has_shown_extension(&child.name, extensions))
            .map(|child| child.name)
            .collect();
        if !children.is_empty() {
            files.insert_directory(entry.name, children);
        }
    }

    Ok(files)
}

/// All CircuitPython projects in a learn guide repository, as `/`-separated
/// paths relative to `repo_root`.
pub fn discover_projects(repo_root: &Path) -> Result<Vec<String>> {
    let mut projects = Vec::new();
    let mut walker = WalkDir::new(repo_root).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry =
            entry.with_context(|| format!("Failed to walk repository: {}", repo_root.display()))?;
        if !entry.file_type().is_dir() || entry.depth() == 0 {
            continue;
        }
        if is_hidden(&entry.file_name().to_string_lossy()) {
            walker.skip_current_dir();
            continue;
        }

        let file_names: Vec<String> = read_entries(entry.path())?
            .into_iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name)
            .collect();
        let has = |marker: &str| file_names.iter().any(|name| name == marker);

        if has(SKIP_MARKER) {
            walker.skip_current_dir();
            continue;
        }
        if has(SKIP_HERE_MARKER) {
            continue;
        }
        if has(SKIP_SUB_MARKER) {
            walker.skip_current_dir();
        }

        if file_names.iter().any(|name| name.ends_with(".py")) {
            projects.push(relative_project_name(repo_root, entry.path()));
        }
    }

    projects.sort();
    Ok(projects)
}

fn relative_project_name(repo_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(repo_root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
