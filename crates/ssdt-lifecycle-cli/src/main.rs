//! ssdt-lifecycle CLI - versioned deployment scripts for SQL Server database projects.

use clap::{Parser, Subcommand};
use ssdt_lifecycle::logging::PrefixedLineFormat;
use ssdt_lifecycle::{
    Configuration, ConfigurationStore, DeploymentService, DotnetBuildService, LifecycleError,
    LocalFileSystem, Project, RunStatus, RunSummary, SqlPackageEngine, Version,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Exit code for a run stopped by a signal.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "ssdt-lifecycle")]
#[command(about = "Versioned deployment scripts for SQL Server database projects")]
#[command(version)]
struct Cli {
    /// Path to the database project file (.sqlproj)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Path to a configuration file (JSON or YAML) [default: ssdtlifecycle.json next to the project]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long, global = true)]
    output_json: bool,

    /// Log format: text, json or plain
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info", global = true)]
    verbosity: String,

    /// Print progress updates to stderr
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the current build output as the first version
    Scaffold {
        /// Version to store the build output under (e.g. 1.0.0.0)
        #[arg(long = "version", value_name = "VERSION")]
        target_version: Version,
    },

    /// Create the deploy script from a previous version to the current build
    CreateScript {
        /// Version to compare against
        #[arg(long)]
        previous: Version,

        /// Write to the `latest` directory instead of the configured version
        #[arg(long)]
        latest: bool,
    },

    /// Check the configuration and list every problem found
    ValidateConfig,

    /// Write the default configuration next to the project
    InitConfig {
        /// Overwrite an existing configuration file
        #[arg(long, short)]
        force: bool,
    },

    /// List the versions present in the artifacts directory, newest first
    Versions,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<u8, LifecycleError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(LifecycleError::Config)?;

    match &cli.command {
        Commands::ValidateConfig => {
            let config = load_configuration(&cli)?;
            config.ensure_valid()?;
            println!("Configuration is valid");
            Ok(0)
        }

        Commands::InitConfig { force } => {
            let project = require_project(&cli)?;
            let path = ConfigurationStore::path_for(&project);
            if path.exists() && !force {
                return Err(LifecycleError::config(format!(
                    "{:?} already exists (use --force to overwrite)",
                    path
                )));
            }
            let config = match &cli.config {
                Some(source) => Configuration::load(source)?,
                None => Configuration::default(),
            };
            ConfigurationStore::new().save(&project, &config)?;
            println!("Wrote {}", path.display());
            Ok(0)
        }

        Commands::Versions => {
            let project = require_project(&cli)?;
            let config = load_configuration(&cli)?;
            let service = deployment_service(&cli, &config);
            let versions = service.available_versions(&project, &config).await?;

            if cli.output_json {
                let names: Vec<String> = versions.iter().map(ToString::to_string).collect();
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else if versions.is_empty() {
                println!("No versions found");
            } else {
                for version in &versions {
                    println!("{}", version);
                }
            }
            Ok(0)
        }

        Commands::Scaffold { target_version } => {
            let project = require_project(&cli)?;
            let config = load_configuration(&cli)?;
            info!("Loaded configuration for {}", project.name);

            let cancel_token = setup_signal_handler();
            let service = deployment_service(&cli, &config);
            let summary = service
                .scaffold(project, config, *target_version, &cancel_token)
                .await?;
            report(&cli, &summary)
        }

        Commands::CreateScript { previous, latest } => {
            let project = require_project(&cli)?;
            let config = load_configuration(&cli)?;
            info!("Loaded configuration for {}", project.name);

            let cancel_token = setup_signal_handler();
            let service = deployment_service(&cli, &config);
            let summary = service
                .create_script(project, config, *previous, *latest, &cancel_token)
                .await?;
            report(&cli, &summary)
        }
    }
}

fn require_project(cli: &Cli) -> Result<Project, LifecycleError> {
    cli.project
        .as_ref()
        .map(Project::from_path)
        .ok_or_else(|| LifecycleError::config("--project is required for this command"))
}

/// `--config` wins; otherwise the file stored next to the project, or defaults.
fn load_configuration(cli: &Cli) -> Result<Configuration, LifecycleError> {
    if let Some(path) = &cli.config {
        return Configuration::load(path);
    }
    let project = require_project(cli).map_err(|_| {
        LifecycleError::config("either --config or --project is required for this command")
    })?;
    ConfigurationStore::new().load_or_default(&project)
}

fn deployment_service(cli: &Cli, config: &Configuration) -> DeploymentService {
    let service = DeploymentService::new(
        Arc::new(LocalFileSystem),
        Arc::new(DotnetBuildService::new()),
        Arc::new(SqlPackageEngine::new(config.sql_package_path.clone())),
    );
    if cli.progress {
        service.with_progress(Arc::new(|text: &str| eprintln!("[progress] {}", text)))
    } else {
        service
    }
}

fn report(cli: &Cli, summary: &RunSummary) -> Result<u8, LifecycleError> {
    if cli.output_json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        let status_msg = match summary.status {
            RunStatus::Succeeded => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "was cancelled",
        };
        println!("\n{} {}", summary.kind, status_msg);
        println!("  Run ID: {}", summary.run_id);
        println!("  Duration: {:.2}s", summary.duration_seconds);
        if let Some(version) = &summary.target_version {
            println!("  Version: {}", version);
        }
        if let Some(dir) = &summary.artifacts_directory {
            println!("  Artifacts: {}", dir.display());
        }
        if let Some(script) = &summary.deploy_script_path {
            println!("  Deploy script: {}", script.display());
        }
        if let Some(report) = &summary.deploy_report_path {
            println!("  Deploy report: {}", report.display());
        }
        if let Some(error) = &summary.error {
            println!("  Error: {}", error);
        }
    }

    Ok(match summary.status {
        RunStatus::Succeeded => 0,
        RunStatus::Failed => 1,
        RunStatus::Cancelled => EXIT_CANCELLED,
    })
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    match format {
        "json" => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        "plain" => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .event_format(PrefixedLineFormat)
            .init(),
        "text" => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        other => return Err(format!("Unknown log format '{}'", other)),
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        match signal(kind) {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    stream.recv().await;
                    eprintln!("\nReceived {}. Cancelling the run...", name);
                    token.cancel();
                });
            }
            Err(e) => warn!("Failed to install {} handler: {}", name, e),
        }
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\nReceived Ctrl-C. Cancelling the run...");
                token.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl-C handler: {}", e),
        }
    });

    cancel_token
}
