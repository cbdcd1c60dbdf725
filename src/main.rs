//! route-registry command line.
//!
//! ```text
//! route-registry [-c config.toml] serve
//! route-registry [-c config.toml] dispatch /home /about
//! route-registry [-c config.toml] exec get /home
//! route-registry [-c config.toml] routes --json
//! route-registry demo
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use route_registry::config::{load_config, watcher::ConfigWatcher, RouterConfig};
use route_registry::observability::{logging, metrics};
use route_registry::routing::{Handler, NamedHandler, RouteRegistry, StaticText};
use route_registry::{HttpServer, Shutdown};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "route-registry")]
#[command(about = "Route registry with dynamic handler dispatch", long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configured routes over HTTP
    Serve,
    /// Dispatch each path and print the results, one per line
    Dispatch {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Run a named action ("add"/"register" or "get"/"dispatch")
    Exec {
        action: String,
        path: String,
        /// Body for the registered route
        body: Option<String>,
    },
    /// List registered paths
    Routes {
        #[arg(long)]
        json: bool,
    },
    /// Two independent registries answering the same paths
    Demo,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    match cli.command {
        Commands::Serve => serve(config, cli.config.as_deref()).await,
        Commands::Dispatch { paths } => {
            let registry = one_shot_registry(&config);
            for path in paths {
                println!("{}", registry.dispatch(&path));
            }
            Ok(())
        }
        Commands::Exec { action, path, body } => {
            let mut registry = one_shot_registry(&config);
            let handler = body.map(|b| Arc::new(StaticText::new(b)) as Arc<dyn Handler>);
            match registry.call(&action, &path, handler)? {
                Some(result) => println!("{result}"),
                None => println!("Registered {path}"),
            }
            Ok(())
        }
        Commands::Routes { json } => {
            let registry = one_shot_registry(&config);
            if json {
                let routes: Vec<serde_json::Value> = registry
                    .routes()
                    .iter()
                    .map(|r| serde_json::json!({ "path": r.path, "handler": r.handler.name() }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&routes)?);
            } else {
                for path in registry.paths() {
                    println!("{path}");
                }
            }
            Ok(())
        }
        Commands::Demo => {
            quiet_logging(&config);
            demo();
            Ok(())
        }
    }
}

/// One-shot commands only report problems.
fn quiet_logging(config: &RouterConfig) {
    let mut quiet = config.observability.clone();
    quiet.log_level = "warn".to_string();
    logging::init_logging(&quiet);
}

fn one_shot_registry(config: &RouterConfig) -> RouteRegistry {
    quiet_logging(config);
    RouteRegistry::from_config(&config.routes)
}

async fn serve(config: RouterConfig, config_path: Option<&Path>) -> CliResult {
    logging::init_logging(&config.observability);
    tracing::info!("route-registry v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        fallback = ?config.fallback.mode,
        files_enabled = config.files.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // The watcher must outlive the server.
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => (None, tokio::sync::mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_ctrl_c());

    HttpServer::new(config)
        .run(listener, config_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo() {
    let mut router = RouteRegistry::new();
    let router2 = RouteRegistry::new();

    router.register("/home", NamedHandler::new("homepage", || "Strona główna".to_string()));
    router.register("/about", NamedHandler::new("about", || "O nas".to_string()));
    router.register("/contact", NamedHandler::new("contact", || "Kontakt".to_string()));

    for path in ["/home", "/about", "/contact", "/xxx"] {
        println!("{}", router.dispatch(path));
    }

    println!("{}", router2.dispatch("/home"));
    println!("{}", router.dispatch("/contact"));
}
