use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use webgate::config::GatewayConfig;
use webgate::discovery::{Discovery, RegistryDiscovery, StaticDiscovery};
use webgate::proxy::HttpProxy;
use webgate::resolve::PathResolver;
use webgate::server::{self, GatewayState};

/// webgate — path-routed micro-service gateway
#[derive(Parser)]
#[command(name = "webgate", version, about)]
struct Cli {
    /// Path to configuration file (.hcl)
    #[arg(short, long, default_value = "gateway.hcl")]
    config: String,

    /// Override listen address (e.g., 0.0.0.0:8000)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file without starting the gateway
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long, default_value = "gateway.hcl")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> webgate::Result<()> {
    let cli = Cli::parse();

    // Handle validate subcommand early
    if let Some(Commands::Validate { config: config_path }) = &cli.command {
        return validate_config(config_path).await;
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    tracing::info!("webgate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = if std::path::Path::new(&cli.config).exists() {
        tracing::info!(config = cli.config, "Loading configuration");
        GatewayConfig::from_file(&cli.config).await?
    } else {
        tracing::warn!("Config file not found, using defaults");
        GatewayConfig::default()
    };

    // Override listen address if provided
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }

    config.validate()?;

    let addr: SocketAddr = config.listen.parse().map_err(|e| {
        webgate::GatewayError::Config(format!(
            "Invalid listen address '{}': {}",
            config.listen, e
        ))
    })?;

    // Registry discovery wins when both are configured
    let discovery: Arc<dyn Discovery> = match &config.discovery {
        Some(registry) => {
            tracing::info!(registry = registry.registry_url, "Using registry discovery");
            Arc::new(RegistryDiscovery::new(registry))
        }
        None => {
            tracing::info!(services = config.services.len(), "Using static discovery");
            Arc::new(StaticDiscovery::from_config(
                &config.services,
                &config.namespace,
            )?)
        }
    };

    let state = Arc::new(GatewayState {
        resolver: PathResolver::new(discovery, config.namespace.clone()),
        http_proxy: HttpProxy::new(),
    });

    let (_addr, server) = server::start(addr, state).await?;

    tracing::info!("Gateway ready — press Ctrl+C to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
        _ = server => {
            tracing::error!("Server task exited unexpectedly");
        }
    }

    Ok(())
}

/// Validate a configuration file and print diagnostics
async fn validate_config(path: &str) -> webgate::Result<()> {
    use std::path::Path;

    if !Path::new(path).exists() {
        eprintln!("✗ Config file not found: {}", path);
        std::process::exit(1);
    }

    let config = match GatewayConfig::from_file(path).await {
        Ok(c) => {
            println!("✓ Config parsed successfully ({})", path);
            c
        }
        Err(e) => {
            eprintln!("✗ Parse error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("✗ Validation error: {}", e);
        std::process::exit(1);
    }

    println!("✓ Configuration is valid");
    println!();
    println!("  Listen:    {}", config.listen);
    println!("  Namespace: {}", config.namespace);
    println!("  Services:  {}", config.services.len());
    for (name, svc) in &config.services {
        println!("    - {} ({} endpoints)", name, svc.endpoints.len());
    }
    match &config.discovery {
        Some(d) => println!("  Discovery: registry ({})", d.registry_url),
        None => println!("  Discovery: static"),
    }

    Ok(())
}
