//! Transitive library requirements
//!
//! Starting from the libraries a project imports, dependencies are followed
//! breadth-first through the bundle index. Each library lands in exactly one of
//! two sets: packages (drawn as folders) or single files (drawn as `.mpy`).

use crate::bundle::LibraryIndex;
use crate::ir::LibraryClosure;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

const MPY_SUFFIX: &str = ".mpy";
const SOURCE_SUFFIXES: [&str; 2] = [MPY_SUFFIX, ".py"];

/// Resolve `seeds` and everything they depend on.
///
/// Names missing from the index are classified by their shape: a name with a
/// file extension is a file, anything else a package. A `.py` or `.mpy` name
/// whose stem is a known library is treated as that library.
pub fn resolve_closure<'a, I>(seeds: I, index: &LibraryIndex) -> LibraryClosure
where
    I: IntoIterator<Item = &'a str>,
{
    let mut closure = LibraryClosure::default();
    let mut queue: VecDeque<String> = seeds.into_iter().map(str::to_string).collect();
    let mut expanded: HashSet<String> = HashSet::new();

    while let Some(name) = queue.pop_front() {
        let name = canonical_name(&name, index);
        if !expanded.insert(name.clone()) {
            continue;
        }

        match index.get(&name) {
            Some(entry) => {
                queue.extend(entry.dependencies.iter().cloned());
                if entry.is_package {
                    closure.packages.insert(name);
                } else {
                    closure.files.insert(format!("{}{}", name, MPY_SUFFIX));
                }
            }
            None if has_extension(&name) => {
                debug!(library = %name, "Not in any bundle, keeping as file");
                closure.files.insert(name);
            }
            None => {
                debug!(library = %name, "Not in any bundle, keeping as package");
                closure.packages.insert(name);
            }
        }
    }

    closure
}

/// Map `foo.py` / `foo.mpy` back to `foo` when `foo` is in the index
fn canonical_name(name: &str, index: &LibraryIndex) -> String {
    SOURCE_SUFFIXES
        .iter()
        .filter_map(|suffix| name.strip_suffix(suffix))
        .find(|stem| index.contains(stem))
        .unwrap_or(name)
        .to_string()
}

fn has_extension(name: &str) -> bool {
    name.contains('.')
}
