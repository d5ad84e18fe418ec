// Maps a project's Python imports onto bundle library names

use crate::bundle::LibraryIndex;
use crate::parser::{find_imports, ImportedName};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bundle libraries imported by the scripts directly inside `project_dir`.
///
/// `from pkg.mod import *` is followed one level: if `pkg/mod.py` exists in the
/// project, its imports are checked too.
pub fn libs_for_project(project_dir: &Path, index: &LibraryIndex) -> Result<BTreeSet<String>> {
    let mut libs = BTreeSet::new();

    for script in top_level_scripts(project_dir)? {
        for import in imports_in_file(&script)? {
            collect_root(&import, &mut libs, |root| index.contains(root));

            let Some(module) = import.wildcard_module() else {
                continue;
            };
            let module_file = module_path(project_dir, module);
            if module_file.is_file() {
                for nested in imports_in_file(&module_file)? {
                    collect_root(&nested, &mut libs, |root| index.contains(root));
                }
            }
        }
    }

    Ok(libs)
}

/// Libraries from the primary bundle imported by a single example script
pub fn libs_for_example(example_path: &Path, index: &LibraryIndex) -> Result<BTreeSet<String>> {
    let mut libs = BTreeSet::new();
    for import in imports_in_file(example_path)? {
        collect_root(&import, &mut libs, |root| index.contains_primary(root));
    }
    Ok(libs)
}

fn collect_root(import: &ImportedName, libs: &mut BTreeSet<String>, known: impl Fn(&str) -> bool) {
    if let Some(root) = import.root() {
        if known(root) {
            libs.insert(root.to_string());
        }
    }
}

pub fn imports_in_file(path: &Path) -> Result<Vec<ImportedName>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read script: {}", path.display()))?;
    let source = String::from_utf8_lossy(&bytes);
    find_imports(&source).with_context(|| format!("Failed to parse {}", path.display()))
}

/// `*.py` files directly inside `dir`, sorted
pub fn top_level_scripts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(".py") {
            scripts.push(entry.into_path());
        }
    }
    Ok(scripts)
}

/// Source file for a dotted module inside the project: `a.b` -> `a/b.py`
pub fn module_path(project_dir: &Path, module: &str) -> PathBuf {
    let mut path = project_dir.to_path_buf();
    for segment in module.split('.') {
        path.push(segment);
    }
    path.set_extension("py");
    path
}
