use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use cptree::bundle::LibraryIndex;
use cptree::config::Config;
use cptree::fetch::{ensure_latest_bundle, HttpReleaseClient, LatestTag};
use cptree::runtime::{render_learn_project, render_library_example, run_batch, BatchReport, RenderContext};
use cptree::scan::discover_projects;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "cptree")]
#[command(about = "Render CIRCUITPY drive screenshots listing a project's files and required libraries", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Learn guide repository checkout
    #[arg(long, env = "LEARN_GUIDE_REPO", global = true)]
    repo: Option<PathBuf>,

    /// Directory the PNG files are written to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory holding the cached bundle data
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Use the cached bundle data without checking for a newer release
    #[arg(long, global = true)]
    offline: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render images for a learn guide repository (default)
    Learn {
        /// Render a single project, relative to the repository root
        #[arg(long)]
        project: Option<String>,
    },
    /// Render images for library example scripts
    Bundle {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List the projects that would be rendered
    List,
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(repo) = &cli.repo {
        config.learn_repo = repo.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(cache_dir) = &cli.cache_dir {
        config.cache_dir = cache_dir.clone();
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }
    Ok(config)
}

/// Refresh the bundle cache (unless offline) and load the library index
fn prepare(config: &Config, offline: bool) -> Result<RenderContext> {
    if offline {
        info!("Offline, using cached bundle data");
    } else {
        fs::create_dir_all(&config.cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", config.cache_dir.display()))?;
        let client = HttpReleaseClient::new()?;
        for source in &config.bundles {
            ensure_latest_bundle(source, &LatestTag::new(), &client, &config.cache_dir)?;
        }
    }

    let index = LibraryIndex::load(&config.bundles, &config.cache_dir)?;
    info!(libraries = index.library_count(), "Loaded library index");
    Ok(RenderContext::from_config(config, index))
}

fn print_summary(report: &BatchReport) {
    println!(
        "Rendered {} image(s), {} failed",
        report.rendered.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        println!("FAILED {}: {}", failure.item, failure.error);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let command = cli.command.unwrap_or(Commands::Learn { project: None });

    match command {
        Commands::List => {
            for project in discover_projects(&config.learn_repo)? {
                println!("PROJECT {}", project);
            }
        }
        Commands::Learn { project } => {
            let ctx = prepare(&config, cli.offline)?;
            let projects = match project {
                Some(project) => vec![project],
                None => discover_projects(&config.learn_repo)?,
            };
            let report = run_batch(&projects, config.jobs(), |project| {
                render_learn_project(&ctx, &config.learn_repo, project)
            })?;
            print_summary(&report);
        }
        Commands::Bundle { paths } => {
            let ctx = prepare(&config, cli.offline)?;
            let report = run_batch(&paths, config.jobs(), |path| render_library_example(&ctx, path))?;
            print_summary(&report);
        }
    }

    Ok(())
}
