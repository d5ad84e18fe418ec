use crate::theme::IconPalette;
use plotters::style::RGBColor;
use std::collections::BTreeSet;

/// Scripts the board runs on boot. The tree always shows `code.py` as a fixed
/// header row, so neither name is drawn as a project file.
pub const ENTRY_SCRIPTS: [&str; 2] = ["code.py", "main.py"];

// =============================================================================
// Phase 1: Inventory
// =============================================================================

/// A top-level entry of a project directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileEntry {
    File(String),
    /// A folder listed one level deep; `children` is sorted
    Directory { name: String, children: Vec<String> },
}

impl FileEntry {
    /// Number of tree rows this entry occupies
    pub fn row_count(&self) -> usize {
        match self {
            FileEntry::File(_) => 1,
            FileEntry::Directory { children, .. } => 1 + children.len(),
        }
    }
}

/// Everything the scanner found for one project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFiles {
    pub entries: BTreeSet<FileEntry>,
    /// Contents of the project's own `lib/` folder, merged into the library closure
    pub vendored_libs: BTreeSet<String>,
}

impl ProjectFiles {
    pub fn insert_file(&mut self, name: impl Into<String>) {
        self.entries.insert(FileEntry::File(name.into()));
    }

    pub fn insert_directory(&mut self, name: impl Into<String>, mut children: Vec<String>) {
        children.sort();
        self.entries.insert(FileEntry::Directory {
            name: name.into(),
            children,
        });
    }

    /// Plain files in sorted order
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            FileEntry::File(name) => Some(name.as_str()),
            FileEntry::Directory { .. } => None,
        })
    }

    /// Folders and their children in sorted order
    pub fn directories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().filter_map(|entry| match entry {
            FileEntry::Directory { name, children } => Some((name.as_str(), children.as_slice())),
            FileEntry::File(_) => None,
        })
    }

    pub fn row_count(&self) -> usize {
        self.entries.iter().map(FileEntry::row_count).sum()
    }
}

// =============================================================================
// Phase 2: Library closure
// =============================================================================

/// Transitive library requirements, split by how the library is distributed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryClosure {
    /// Multi-file libraries, drawn as folders
    pub packages: BTreeSet<String>,
    /// Single-file modules, already carrying their file suffix
    pub files: BTreeSet<String>,
}

impl LibraryClosure {
    /// Packages alphabetically, then files alphabetically
    pub fn ordered(&self) -> Vec<String> {
        self.packages.iter().chain(self.files.iter()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.files.is_empty()
    }
}

// =============================================================================
// Phase 3: Layout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Folder,
    CodeFile,
    EmptyFile,
    Image,
    Music,
    Font,
}

/// Expand/collapse triangle drawn left of a row's icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    /// Points right
    Collapsed,
    /// Points down
    Expanded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub label: String,
    pub indent: u32,
    pub icon: IconKind,
    pub disclosure: Option<Disclosure>,
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    pub rows: Vec<LayoutRow>,
}

impl TreeLayout {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    pub fn row(&self, label: &str) -> Option<&LayoutRow> {
        self.rows.iter().find(|row| row.label == label)
    }
}

// =============================================================================
// Phase 4: Compilation (Scene Graph)
// =============================================================================

/// A list of primitive drawing commands.
/// The backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub font_family: String,
    pub font_size: f64,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    FillRect {
        // Top-Left, Bottom-Right
        tl: (i32, i32),
        br: (i32, i32),
        color: RGBColor,
    },
    Triangle {
        origin: (i32, i32),
        size: i32,
        disclosure: Disclosure,
        color: RGBColor,
    },
    Icon {
        origin: (i32, i32),
        size: i32,
        kind: IconKind,
        palette: IconPalette,
    },
    Text {
        // Left edge, vertical centre
        anchor: (i32, i32),
        text: String,
        color: RGBColor,
    },
}
