//! wildroute command line.
//!
//! ```text
//! wildroute --config routes.toml resolve /news/show/7 /user/42
//! wildroute --config routes.toml check
//! wildroute --config routes.toml watch /news/show/7
//! ```

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wildroute::config::validation::validate_config;
use wildroute::config::watcher::ConfigWatcher;
use wildroute::config::{parse_config, RouterConfig};
use wildroute::observability::logging::init_logging;
use wildroute::RouterHandle;

#[derive(Parser)]
#[command(name = "wildroute")]
#[command(about = "Resolve request paths against a wildcard route table", long_about = None)]
struct Cli {
    /// Route file (TOML). Without it the catch-all default table is used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured base prefix.
    #[arg(short, long)]
    base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve paths and print each descriptor as JSON
    Resolve { paths: Vec<String> },
    /// Validate the route file and list its routes
    Check,
    /// Resolve paths again after every change to the route file
    Watch { paths: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let content = match &cli.config {
        Some(path) => Some(fs::read_to_string(path)?),
        None => None,
    };

    // Logging first, so warnings raised while loading routes are visible.
    let observability = content
        .as_deref()
        .and_then(|c| toml::from_str::<RouterConfig>(c).ok())
        .map(|c| c.observability)
        .unwrap_or_default();
    init_logging(&observability)?;

    let mut config = match content.as_deref() {
        Some(content) => parse_config(content)?,
        None => RouterConfig::default(),
    };
    apply_base(&mut config, &cli.base);

    let handle = RouterHandle::from_config(&config);
    tracing::info!(
        routes = handle.load().table().len(),
        base = ?config.router.base,
        "Route table loaded"
    );

    match cli.command {
        Commands::Resolve { paths } => print_resolved(&handle, &paths)?,
        Commands::Check => check(&config, &handle)?,
        Commands::Watch { paths } => {
            let path = cli.config.ok_or("watch requires --config")?;
            let (watcher, mut updates) = ConfigWatcher::new(&path);
            let _watcher = watcher.run()?;

            print_resolved(&handle, &paths)?;
            loop {
                tokio::select! {
                    update = updates.recv() => {
                        let Some(mut config) = update else { break };
                        apply_base(&mut config, &cli.base);
                        match handle.reload(&config) {
                            Ok(()) => print_resolved(&handle, &paths)?,
                            Err(e) => tracing::error!("Rejected route file: {}. Keeping current routes.", e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn apply_base(config: &mut RouterConfig, base: &Option<String>) {
    if let Some(base) = base {
        config.router.base = Some(base.clone());
    }
}

fn print_resolved(handle: &RouterHandle, paths: &[String]) -> Result<(), serde_json::Error> {
    for path in paths {
        let mut resolver = handle.resolver();
        let descriptor = resolver.resolve(path);
        println!("{} {}", path, serde_json::to_string(&descriptor)?);
    }
    Ok(())
}

fn check(config: &RouterConfig, handle: &RouterHandle) -> Result<(), Box<dyn std::error::Error>> {
    let router = handle.load();
    for route in router.table().routes() {
        match route.pattern() {
            Some(pattern) => println!("{:<24} {}", route.key(), pattern.regex()),
            None => println!("{:<24} (synthetic)", route.key()),
        }
    }

    if let Err(errors) = validate_config(config) {
        for error in &errors {
            eprintln!("error: {}", error);
        }
        return Err(format!("{} problem(s) in route table", errors.len()).into());
    }

    println!("ok: {} route(s)", router.table().len());
    Ok(())
}
