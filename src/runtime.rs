// Per-project render pipeline and the batch driver

use crate::bundle::LibraryIndex;
use crate::closure::resolve_closure;
use crate::compiler::compile_scene;
use crate::config::Config;
use crate::graph::render_scene;
use crate::ir::{ProjectFiles, SceneGraph};
use crate::layout::build_layout;
use crate::resolve::{libs_for_example, libs_for_project};
use crate::scan::{files_for_example, files_for_project, ScanOptions};
use crate::theme::Theme;
use crate::RenderOptions;
use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Path components dropped from library example image names
const EXAMPLE_NAME_SKIP: [&str; 4] = ["libraries", "drivers", "helpers", "examples"];

/// Everything a worker needs; shared read-only across the pool
pub struct RenderContext {
    pub index: LibraryIndex,
    pub render: RenderOptions,
    pub scan: ScanOptions,
    pub theme: Theme,
    pub settings_libraries: Vec<String>,
    pub output_dir: PathBuf,
}

impl RenderContext {
    pub fn from_config(config: &Config, index: LibraryIndex) -> Self {
        Self {
            index,
            render: config.render.clone(),
            scan: config.scan.clone(),
            theme: config.theme.resolve(),
            settings_libraries: config.settings_libraries.clone(),
            output_dir: config.output_dir.clone(),
        }
    }
}

// =============================================================================
// Single image
// =============================================================================

/// Scene for one project's files and directly imported libraries
pub fn requirement_scene(ctx: &RenderContext, files: ProjectFiles, libs: &BTreeSet<String>) -> SceneGraph {
    let seeds = libs.iter().chain(files.vendored_libs.iter()).map(String::as_str);
    let closure = resolve_closure(seeds, &ctx.index);
    debug!(libraries = closure.len(), files = files.row_count(), "Resolved requirements");

    let layout = build_layout(&files, &closure, &ctx.settings_libraries);
    compile_scene(&layout, &ctx.render, &ctx.theme)
}

pub fn learn_project_scene(ctx: &RenderContext, repo_root: &Path, project: &str) -> Result<SceneGraph> {
    let project_dir = repo_root.join(project);
    let libs = libs_for_project(&project_dir, &ctx.index)?;
    let files = files_for_project(&project_dir, &ctx.scan)?;
    Ok(requirement_scene(ctx, files, &libs))
}

pub fn library_example_scene(ctx: &RenderContext, example_path: &Path) -> Result<SceneGraph> {
    let libs = libs_for_example(example_path, &ctx.index)?;
    let files = files_for_example(example_path, &ctx.scan)?;
    Ok(requirement_scene(ctx, files, &libs))
}

/// Render one learn guide project to `<output_dir>/<project with / as _>.png`
pub fn render_learn_project(ctx: &RenderContext, repo_root: &Path, project: &str) -> Result<PathBuf> {
    let scene = learn_project_scene(ctx, repo_root, project)
        .with_context(|| format!("Failed to analyse project {}", project))?;
    let png = render_scene(&scene).with_context(|| format!("Failed to render project {}", project))?;
    write_image(&ctx.output_dir, &learn_image_name(project), &png)
}

/// Render one library example script
pub fn render_library_example(ctx: &RenderContext, example_path: &str) -> Result<PathBuf> {
    let scene = library_example_scene(ctx, Path::new(example_path))
        .with_context(|| format!("Failed to analyse example {}", example_path))?;
    let png = render_scene(&scene).with_context(|| format!("Failed to render example {}", example_path))?;
    write_image(&ctx.output_dir, &example_image_name(example_path), &png)
}

pub fn learn_image_name(project: &str) -> String {
    project.replace('/', "_")
}

pub fn example_image_name(example_path: &str) -> String {
    example_path
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .filter(|part| !EXAMPLE_NAME_SKIP.contains(part))
        .collect::<Vec<_>>()
        .join("_")
}

pub fn write_image(output_dir: &Path, name: &str, png: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    let path = output_dir.join(format!("{}.png", name));
    fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

// =============================================================================
// Batch driver
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub item: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<BatchFailure>,
}

/// Map `render` over `items` on a pool of `jobs` threads.
///
/// A failing item is logged and recorded; it never stops the others.
pub fn run_batch<F>(items: &[String], jobs: usize, render: F) -> Result<BatchReport>
where
    F: Fn(&str) -> Result<PathBuf> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to start worker pool")?;

    let results: Vec<(&String, Result<PathBuf>)> =
        pool.install(|| items.par_iter().map(|item| (item, render(item.as_str()))).collect());

    let mut report = BatchReport::default();
    for (item, result) in results {
        match result {
            Ok(path) => {
                info!(item = %item, output = %path.display(), "Rendered");
                report.rendered.push(path);
            }
            Err(err) => {
                error!(item = %item, "{:#}", err);
                report.failed.push(BatchFailure {
                    item: item.clone(),
                    error: format!("{:#}", err),
                });
            }
        }
    }
    Ok(report)
}
