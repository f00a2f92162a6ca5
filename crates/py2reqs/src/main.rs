use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, trace};
use py2reqs::{
    collector::DependencyCollector,
    config::Config,
    import_graph::ImportGraph,
    requirements::{DependencyReport, render_requirements, write_output},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One third-party package per line
    Requirements,
    /// Full report of every visited file and classification
    Toml,
}

#[derive(Parser, Debug)]
#[command(name = "py2reqs")]
#[command(about = "Generate requirements.txt from the imports of a Python entry file")]
#[command(version)]
struct Cli {
    /// Entry Python files or package directories
    #[arg(required = true)]
    entries: Vec<PathBuf>,

    /// Application directory containing first-party code (repeatable)
    #[arg(short = 'a', long = "app-dir")]
    app_dirs: Vec<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Requirements)]
    format: OutputFormat,

    /// Module treated as first-party regardless of location (repeatable)
    #[arg(long)]
    known_first_party: Vec<String>,

    /// Module treated as third-party regardless of location (repeatable)
    #[arg(long)]
    known_third_party: Vec<String>,

    /// Target Python version, e.g. py310
    #[arg(long)]
    target_version: Option<String>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = load_config(&cli)?;
    debug!("Configuration: {config:?}");

    let mut collector =
        DependencyCollector::from_config(&config).context("Invalid application directories")?;
    for entry in &cli.entries {
        collector
            .collect_dependencies(entry)
            .with_context(|| format!("Failed to collect dependencies of {}", entry.display()))?;
    }

    let graph = ImportGraph::from_collector(&collector);
    if log::log_enabled!(log::Level::Trace) {
        for file in collector.dependencies().keys() {
            for target in graph.imports_of(file) {
                trace!("{} imports {}", file.display(), target.display());
            }
        }
    }
    for cycle in graph.cycles() {
        let files: Vec<String> = cycle.iter().map(|file| file.display().to_string()).collect();
        info!("Import cycle: {}", files.join(" -> "));
    }

    let rendered = match cli.format {
        OutputFormat::Requirements => render_requirements(collector.third_party()),
        OutputFormat::Toml => DependencyReport::from_collector(&collector).to_toml()?,
    };
    emit(cli.output.as_deref(), &rendered)
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => None,
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    };

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if !cli.app_dirs.is_empty() {
        config.src.clone_from(&cli.app_dirs);
    }
    config
        .known_first_party
        .extend(cli.known_first_party.iter().cloned());
    config
        .known_third_party
        .extend(cli.known_third_party.iter().cloned());
    if let Some(version) = &cli.target_version {
        config.target_version.clone_from(version);
    }
    Ok(config)
}

fn emit(output: Option<&Path>, rendered: &str) -> Result<()> {
    match output {
        Some(path) => {
            write_output(path, rendered)?;
            info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")
        }
    }
}
