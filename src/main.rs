//! @ai:module:intent CLI entry point for the scopetrace scanner
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on config, registry, scanner, project, output

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scopetrace::{
    output, scan_file, scan_paths, MarkerSyntax, OutputFormat, Registry, ScanConfig, ScanContext,
    ScanOptions,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "scopetrace")]
#[command(author, version, about = "Validate traceability scope markers against a specification registry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan files or directories and validate every marker
    Scan {
        /// Files or directories to scan (defaults to the configured paths)
        paths: Vec<PathBuf>,

        /// Registry file (.json or .toml) listing known specification entries
        #[arg(long, short)]
        registry: Option<PathBuf>,

        /// Path to configuration file
        #[arg(long, short, default_value = "scopetrace.toml")]
        config: PathBuf,

        /// Marker namespace, e.g. `cpt` for `@cpt-begin`
        #[arg(long)]
        namespace: Option<String>,

        /// Fail when a registry entry has no scope in any scanned file
        #[arg(long, default_value = "false")]
        fail_on_gaps: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show the markers and scope tree of one file
    Markers {
        /// Path to file
        path: PathBuf,

        /// Marker namespace, e.g. `cpt` for `@cpt-begin`
        #[arg(long)]
        namespace: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

struct ScanArgs {
    paths: Vec<PathBuf>,
    registry: Option<PathBuf>,
    config: PathBuf,
    namespace: Option<String>,
    fail_on_gaps: bool,
    format: Format,
}

fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "scopetrace=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            paths,
            registry,
            config,
            namespace,
            fail_on_gaps,
            format,
        } => run_scan(ScanArgs {
            paths,
            registry,
            config,
            namespace,
            fail_on_gaps,
            format,
        }),
        Commands::Markers {
            path,
            namespace,
            format,
        } => run_markers(path, namespace, format),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// @ai:intent Load config and registry, scan, print the report
/// @ai:post Ok(passed) once scanning ran; Err for precondition failures only
/// @ai:effects fs:read, io
fn run_scan(args: ScanArgs) -> Result<bool> {
    let mut config = if args.config.exists() {
        ScanConfig::load(&args.config)
            .with_context(|| format!("loading config {}", args.config.display()))?
    } else {
        ScanConfig::default()
    };

    if let Some(registry) = args.registry {
        config.registry = Some(registry);
    }
    if let Some(namespace) = args.namespace {
        config.markers = MarkerSyntax::with_namespace(namespace);
    }
    if args.fail_on_gaps {
        config.scan.fail_on_gaps = true;
    }
    if !args.paths.is_empty() {
        config.scan.paths = args.paths;
    }

    let registry = match &config.registry {
        Some(path) => Registry::load(path)?,
        None => {
            tracing::warn!("No registry configured; every marker will be reported as unknown");
            Registry::default()
        }
    };

    let ctx = ScanContext::new(config.profile_table()?, config.marker_syntax(), registry)?;
    let options = ScanOptions {
        exclude: config.scan.exclude.clone(),
        fail_on_gaps: config.scan.fail_on_gaps,
    };

    let report = scan_paths(&config.scan.paths, &options, &ctx)?;
    println!("{}", output::format_project_report(&report, args.format.into()));
    Ok(report.passed())
}

/// @ai:intent Print the lexed scope tree of one file without a registry
/// @ai:effects fs:read, io
fn run_markers(path: PathBuf, namespace: Option<String>, format: Format) -> Result<bool> {
    let syntax = namespace.map(MarkerSyntax::with_namespace).unwrap_or_default();
    let ctx = ScanContext::new(Default::default(), syntax, Registry::default())?;

    let file = scan_file(&path, &ctx)?;
    println!("{}", output::format_file_report(&file, format.into()));
    Ok(file.structural_errors.is_empty() && file.parse_errors.is_empty())
}
