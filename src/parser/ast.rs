// Abstract syntax for Python import statements

/// One parsed import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatement {
    /// `import a.b as c, d`
    Import { modules: Vec<String> },
    /// `from ..a.b import x, y` or `from a import *`
    From {
        /// Number of leading dots (0 for absolute imports)
        level: usize,
        module: Option<String>,
        targets: ImportTargets,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTargets {
    Wildcard,
    /// Imported names, aliases dropped
    Names(Vec<String>),
}

/// A fully qualified imported name: `a.b`, `a.b.x` or `a.b.*`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportedName {
    pub name: String,
    pub relative: bool,
}

impl ImportedName {
    pub fn absolute(name: impl Into<String>) -> Self {
        Self { name: name.into(), relative: false }
    }

    /// First dotted segment; relative imports have no root module
    pub fn root(&self) -> Option<&str> {
        if self.relative {
            return None;
        }
        self.name.split('.').next().filter(|root| !root.is_empty())
    }

    /// Module named by a wildcard import (`a.b` for `from a.b import *`)
    pub fn wildcard_module(&self) -> Option<&str> {
        if self.relative {
            return None;
        }
        self.name.strip_suffix(".*")
    }
}

impl ImportStatement {
    pub fn imported_names(&self) -> Vec<ImportedName> {
        match self {
            ImportStatement::Import { modules } => {
                modules.iter().map(ImportedName::absolute).collect()
            }
            ImportStatement::From { level, module, targets } => {
                let mut base = ".".repeat(*level);
                if let Some(module) = module {
                    base.push_str(module);
                }
                let relative = *level > 0;
                let join = |leaf: &str| {
                    let name = if base.is_empty() || base.ends_with('.') {
                        format!("{}{}", base, leaf)
                    } else {
                        format!("{}.{}", base, leaf)
                    };
                    ImportedName { name, relative }
                };
                match targets {
                    ImportTargets::Wildcard => vec![join("*")],
                    ImportTargets::Names(names) => names.iter().map(|n| join(n)).collect(),
                }
            }
        }
    }
}
