//! Row layout of the CIRCUITPY drive tree
//!
//! The tree always starts with the files a freshly mounted board shows,
//! followed by the project's own files and folders, the `lib` folder with every
//! required library, and the `sd` mount point. Rows are produced in drawing
//! order; the compiler only assigns coordinates.

use crate::ir::{Disclosure, IconKind, LayoutRow, LibraryClosure, ProjectFiles, TreeLayout, ENTRY_SCRIPTS};
use crate::scan::extension;
use crate::settings::{settings_required, SETTINGS_FILE};
use crate::RenderOptions;

const ROOT_INDENT: u32 = 1;
const TOP_INDENT: u32 = 2;
const NESTED_INDENT: u32 = 3;

/// Icon for a project file, by extension
pub fn icon_for_extension(ext: &str) -> IconKind {
    match ext {
        "py" | "mpy" | "json" => IconKind::CodeFile,
        "txt" | "license" | "toml" | "csv" | "html" => IconKind::EmptyFile,
        "bmp" | "png" | "jpg" | "svg" => IconKind::Image,
        "wav" | "mp3" | "mid" => IconKind::Music,
        "pcf" | "bdf" => IconKind::Font,
        _ => IconKind::EmptyFile,
    }
}

/// Icon guessed from the shape of a name alone
pub fn default_icon(name: &str) -> IconKind {
    if name.ends_with(".py") || name.ends_with(".mpy") {
        return IconKind::CodeFile;
    }
    let tail_start = name.char_indices().rev().nth(4).map_or(0, |(i, _)| i);
    if name[tail_start..].contains('.') {
        IconKind::EmptyFile
    } else {
        IconKind::Folder
    }
}

/// Accumulates rows while the layout steps run
#[derive(Default)]
struct LayoutBuilder {
    rows: Vec<LayoutRow>,
}

impl LayoutBuilder {
    fn row(&mut self, label: &str, indent: u32, icon: IconKind, disclosure: Option<Disclosure>) {
        self.rows.push(LayoutRow {
            label: label.to_string(),
            indent,
            icon,
            disclosure,
            hidden: false,
        });
    }

    fn hidden_row(&mut self, label: &str, icon: IconKind, disclosure: Option<Disclosure>) {
        self.rows.push(LayoutRow {
            label: label.to_string(),
            indent: TOP_INDENT,
            icon,
            disclosure,
            hidden: true,
        });
    }

    fn folder(&mut self, label: &str, indent: u32, disclosure: Disclosure) {
        self.row(label, indent, IconKind::Folder, Some(disclosure));
    }

    fn header(&mut self, needs_settings: bool) {
        self.folder("CIRCUITPY", ROOT_INDENT, Disclosure::Expanded);
        self.hidden_row(".fseventsd", IconKind::Folder, Some(Disclosure::Collapsed));
        self.hidden_row(".metadata_never_index", IconKind::EmptyFile, None);
        self.hidden_row(".Trashes", IconKind::EmptyFile, None);
        self.row("boot_out.txt", TOP_INDENT, default_icon("boot_out.txt"), None);
        self.row("code.py", TOP_INDENT, IconKind::CodeFile, None);
        if needs_settings {
            self.row(SETTINGS_FILE, TOP_INDENT, icon_for_extension("toml"), None);
        }
    }

    fn project_files(&mut self, files: &ProjectFiles) {
        for name in files.file_names().filter(|name| !ENTRY_SCRIPTS.contains(name)) {
            let icon = extension(name).map_or(IconKind::EmptyFile, icon_for_extension);
            self.row(name, TOP_INDENT, icon, None);
        }
    }

    fn project_folders(&mut self, files: &ProjectFiles) {
        for (name, children) in files.directories() {
            self.folder(name, TOP_INDENT, Disclosure::Expanded);
            for child in children {
                match extension(child) {
                    Some(ext) => self.row(child, NESTED_INDENT, icon_for_extension(ext), None),
                    None => self.folder(child, NESTED_INDENT, Disclosure::Collapsed),
                }
            }
        }
    }

    fn libraries(&mut self, closure: &LibraryClosure) {
        self.folder("lib", TOP_INDENT, Disclosure::Expanded);
        for package in &closure.packages {
            self.folder(package, NESTED_INDENT, Disclosure::Collapsed);
        }
        for file in &closure.files {
            let icon = default_icon(file);
            let disclosure = (icon == IconKind::Folder).then_some(Disclosure::Collapsed);
            self.row(file, NESTED_INDENT, icon, disclosure);
        }
    }

    fn footer(&mut self) {
        self.folder("sd", TOP_INDENT, Disclosure::Collapsed);
    }

    fn finish(self) -> TreeLayout {
        TreeLayout { rows: self.rows }
    }
}

/// Whether the tree gets a `settings.toml` row
pub fn needs_settings(files: &ProjectFiles, closure: &LibraryClosure, settings_libraries: &[String]) -> bool {
    let libraries = closure.ordered();
    let names = libraries.iter().map(String::as_str).chain(files.file_names());
    settings_required(names, settings_libraries)
}

pub fn build_layout(
    files: &ProjectFiles,
    closure: &LibraryClosure,
    settings_libraries: &[String],
) -> TreeLayout {
    let mut builder = LayoutBuilder::default();
    builder.header(needs_settings(files, closure, settings_libraries));
    builder.project_files(files);
    builder.project_folders(files);
    builder.libraries(closure);
    builder.footer();
    builder.finish()
}

pub fn canvas_height(layout: &TreeLayout, options: &RenderOptions) -> u32 {
    2 * options.padding + layout.row_count() as u32 * options.line_spacing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_settings_libraries;

    fn closure(packages: &[&str], files: &[&str]) -> LibraryClosure {
        LibraryClosure {
            packages: packages.iter().map(|s| s.to_string()).collect(),
            files: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn project() -> ProjectFiles {
        let mut files = ProjectFiles::default();
        files.insert_file("code.py");
        files.insert_file("main.py");
        files.insert_file("wave.wav");
        files.insert_file("data.json");
        files.insert_directory("fonts", vec!["small.pcf".to_string(), "extra".to_string()]);
        files.insert_directory("assets", vec![]);
        files
    }

    #[test]
    fn test_default_icon() {
        assert_eq!(default_icon("neopixel.mpy"), IconKind::CodeFile);
        assert_eq!(default_icon("local.py"), IconKind::CodeFile);
        assert_eq!(default_icon("boot_out.txt"), IconKind::EmptyFile);
        assert_eq!(default_icon("adafruit_display_text"), IconKind::Folder);
        assert_eq!(default_icon("archive.backup"), IconKind::Folder);
        assert_eq!(default_icon("ab"), IconKind::Folder);
    }

    #[test]
    fn test_icon_for_extension() {
        assert_eq!(icon_for_extension("json"), IconKind::CodeFile);
        assert_eq!(icon_for_extension("bmp"), IconKind::Image);
        assert_eq!(icon_for_extension("mid"), IconKind::Music);
        assert_eq!(icon_for_extension("bdf"), IconKind::Font);
        assert_eq!(icon_for_extension("csv"), IconKind::EmptyFile);
        assert_eq!(icon_for_extension("xyz"), IconKind::EmptyFile);
    }

    #[test]
    fn test_row_order() {
        let layout = build_layout(
            &project(),
            &closure(&["adafruit_display_text"], &["neopixel.mpy"]),
            &default_settings_libraries(),
        );
        assert_eq!(
            layout.labels(),
            vec![
                "CIRCUITPY",
                ".fseventsd",
                ".metadata_never_index",
                ".Trashes",
                "boot_out.txt",
                "code.py",
                "data.json",
                "wave.wav",
                "assets",
                "fonts",
                "extra",
                "small.pcf",
                "lib",
                "adafruit_display_text",
                "neopixel.mpy",
                "sd",
            ]
        );
    }

    #[test]
    fn test_row_attributes() {
        let layout = build_layout(
            &project(),
            &closure(&["adafruit_display_text"], &["neopixel.mpy"]),
            &default_settings_libraries(),
        );

        let root = layout.row("CIRCUITPY").unwrap();
        assert_eq!((root.indent, root.disclosure), (1, Some(Disclosure::Expanded)));

        let fseventsd = layout.row(".fseventsd").unwrap();
        assert!(fseventsd.hidden);
        assert_eq!(fseventsd.disclosure, Some(Disclosure::Collapsed));

        assert_eq!(layout.row("wave.wav").unwrap().icon, IconKind::Music);
        assert_eq!(layout.row("data.json").unwrap().icon, IconKind::CodeFile);

        let extra = layout.row("extra").unwrap();
        assert_eq!((extra.indent, extra.icon), (3, IconKind::Folder));
        assert_eq!(extra.disclosure, Some(Disclosure::Collapsed));
        assert_eq!(layout.row("small.pcf").unwrap().icon, IconKind::Font);

        let package = layout.row("adafruit_display_text").unwrap();
        assert_eq!((package.indent, package.disclosure), (3, Some(Disclosure::Collapsed)));
        let file = layout.row("neopixel.mpy").unwrap();
        assert_eq!((file.icon, file.disclosure), (IconKind::CodeFile, None));

        let sd = layout.row("sd").unwrap();
        assert_eq!((sd.indent, sd.disclosure), (2, Some(Disclosure::Collapsed)));
    }

    #[test]
    fn test_entry_scripts_not_dynamic_rows() {
        let layout = build_layout(&project(), &LibraryClosure::default(), &[]);
        let labels = layout.labels();
        assert_eq!(labels.iter().filter(|l| **l == "code.py").count(), 1);
        assert!(!labels.contains(&"main.py"));
    }

    #[test]
    fn test_row_count_formula() {
        let files = project();
        let libs = closure(&["adafruit_display_text"], &["neopixel.mpy", "adafruit_ticks.mpy"]);
        let layout = build_layout(&files, &libs, &[]);
        // 7 fixed + 2 files + (1 + 0) + (1 + 2) + 3 libraries + sd
        assert_eq!(layout.row_count(), 7 + 2 + 1 + 3 + 3 + 1);
    }

    #[test]
    fn test_settings_row_adds_exactly_one_row() {
        let files = project();
        let without = build_layout(&files, &closure(&[], &["neopixel.mpy"]), &default_settings_libraries());
        let with = build_layout(
            &files,
            &closure(&["adafruit_requests"], &["adafruit_connection_manager.mpy"]),
            &default_settings_libraries(),
        );
        assert!(without.row(SETTINGS_FILE).is_none());
        assert_eq!(with.row_count(), without.row_count() + 1);
        assert_eq!(with.labels()[6], "settings.toml");
    }

    #[test]
    fn test_project_settings_file_suppresses_row() {
        let mut files = project();
        files.insert_file("settings.toml");
        let layout = build_layout(&files, &closure(&["adafruit_requests"], &[]), &default_settings_libraries());
        assert_eq!(layout.labels().iter().filter(|l| **l == "settings.toml").count(), 1);
        assert_eq!(layout.labels()[6], "data.json");
    }

    #[test]
    fn test_canvas_height() {
        let layout = build_layout(&ProjectFiles::default(), &LibraryClosure::default(), &[]);
        assert_eq!(layout.row_count(), 8);
        assert_eq!(canvas_height(&layout, &RenderOptions::default()), 2 * 20 + 8 * 28);
    }
}
