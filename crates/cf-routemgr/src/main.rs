//! cf-routemgr - route target planning tool
//!
//! Validates desired route descriptions and shows the mapping changes that
//! applying them to a recorded route state would make. Nothing is sent to
//! the Cloud Controller.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use cf_routemgr::config::DEFAULT_CONFIG_PATH;
use cf_routemgr::report::build_plan_report;
use cf_routemgr::{DesiredRoute, RouteAddress, RouteMgrConfig, RoutePlan, RouteSpec, RouteState};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Cloud Foundry route manager
#[derive(Parser, Debug)]
#[command(name = "cf-routemgr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the changes a desired route description would make
    Plan {
        /// Desired route description (TOML)
        desired: PathBuf,

        /// Recorded route state (JSON); omit for a route that does not exist yet
        #[arg(short = 's', long)]
        state: Option<PathBuf>,
    },

    /// Validate the configuration file and print the effective settings
    CheckConfig,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match RouteMgrConfig::load_or_default(&args.config).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cf-routemgr: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, config.logging.thread_ids);
    debug!("Loaded configuration from {}", args.config.display());

    match run(args.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &RouteMgrConfig) -> anyhow::Result<()> {
    match command {
        Command::Plan { desired, state } => {
            let spec = DesiredRoute::load(&desired)
                .and_then(|d| d.into_spec(config.targets.default_app_port))
                .with_context(|| format!("Invalid route description {}", desired.display()))?;
            let prior = state.as_deref().map(load_state).transpose()?;

            let plan = RoutePlan::compute(prior.as_ref(), &spec);
            info!("Planned {} for {}", plan.action, desired.display());

            let label = match &prior {
                Some(prior) => prior.id.clone(),
                None => address_label(&spec),
            };
            for line in build_plan_report(&label, &plan) {
                println!("{}", line);
            }
        }
        Command::CheckConfig => {
            let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
            print!("{}", rendered);
        }
    }
    Ok(())
}

fn load_state(path: &Path) -> anyhow::Result<RouteState> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read route state {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse route state {}", path.display()))
}

fn address_label(spec: &RouteSpec) -> String {
    match &spec.address {
        RouteAddress::Host { hostname, path: Some(path) } => format!("{}/{}", hostname, path),
        RouteAddress::Host { hostname, path: None } => hostname.clone(),
        RouteAddress::Port(port) => format!(":{}", port),
        RouteAddress::RandomPort => ":<random>".to_string(),
    }
}

fn init_logging(level: &str, thread_ids: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(thread_ids)
        .with_writer(std::io::stderr)
        .init();
}
