//! ImageGate - Image Gateway for the Service-Request Tracker
//!
//! Accepts image uploads and listing requests and proxies them to the
//! configured object store.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imagegate::api::{HttpServer, MAX_PAYLOAD_BYTES};
use imagegate::config::{ImageGateConfig, StoreBackend};
use imagegate::error::Result;
use imagegate::images::ImageService;
use imagegate::store::{self, PUBLIC_PREFIX};

/// ImageGate - Image Gateway for the Service-Request Tracker
#[derive(Parser)]
#[command(name = "imagegate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "imagegate.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API on the configured address
    Serve,

    /// Run under the AWS Lambda runtime (API Gateway proxy events)
    Lambda,

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "imagegate.toml")]
        output: PathBuf,

        /// Bucket name to write into the file
        #[arg(long)]
        bucket: Option<String>,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output, bucket } => run_init(output, bucket),
        Commands::Validate => run_validate(cli.config),
        Commands::Serve => {
            let config = load_config(&cli.config)?;
            init_logging(&config, cli.log_level.as_deref());
            run_serve(config).await
        }
        Commands::Lambda => {
            let config = load_config(&cli.config)?;
            init_logging(&config, cli.log_level.as_deref());
            run_lambda(config).await
        }
    }
}

/// Initialize logging
fn init_logging(config: &ImageGateConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&config.logging.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let (pretty, json) = if config.logging.format == "json" {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .init();
}

/// Load the config file, or defaults when there is none (Lambda deployments
/// are configured through the environment)
fn load_config(path: &Path) -> Result<ImageGateConfig> {
    if !path.exists() {
        let config = ImageGateConfig::default();
        config.validate()?;
        return Ok(config);
    }

    ImageGateConfig::from_file(path).map_err(|e| {
        eprintln!("Failed to load configuration from {:?}: {}", path, e);
        e
    })
}

/// Build the server and its store client
fn build_server(config: &ImageGateConfig) -> Result<HttpServer> {
    let bucket = config.bucket_name();
    let store = store::from_config(&config.store, bucket.clone())?;
    tracing::info!(
        "Using {:?} store, bucket {:?}, prefix {}",
        config.store.backend,
        bucket,
        PUBLIC_PREFIX
    );

    let images = ImageService::new(store, PUBLIC_PREFIX);
    Ok(HttpServer::new(config.server.clone(), images))
}

/// Serve the HTTP API
async fn run_serve(config: ImageGateConfig) -> Result<()> {
    tracing::info!("Starting ImageGate v{}", env!("CARGO_PKG_VERSION"));
    let server = build_server(&config)?;
    server.start().await
}

/// Serve Lambda invocations
async fn run_lambda(config: ImageGateConfig) -> Result<()> {
    tracing::info!("Starting ImageGate v{} on Lambda", env!("CARGO_PKG_VERSION"));
    let server = build_server(&config)?;
    server.run_lambda().await
}

/// Write a default configuration file
fn run_init(output: PathBuf, bucket: Option<String>) -> Result<()> {
    let bucket_line = match bucket {
        Some(b) => format!("bucket = \"{}\"", b),
        None => "# bucket = \"image-bucket-dev\"".to_string(),
    };

    let config_content = format!(r#"# ImageGate Configuration
# Generated configuration file

[server]
bind_address = "0.0.0.0:8080"
cors_enabled = true

[store]
# s3 or memory
backend = "s3"
# The BUCKET_NAME environment variable overrides this
{bucket_line}
region = "us-east-1"
# endpoint = "http://localhost:9000"
# path_style = true

[logging]
level = "info"
# pretty or json
format = "pretty"
"#);

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the file to configure your bucket and region.");
    println!("Then start with: imagegate --config {} serve", output.display());

    Ok(())
}

/// Validate configuration
fn run_validate(config_path: PathBuf) -> Result<()> {
    match ImageGateConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!();
            println!("  Bind address:  {}", config.server.bind_address);
            println!("  CORS:          {}", if config.server.cors_enabled { "enabled" } else { "disabled" });
            println!("  Payload limit: {} bytes", MAX_PAYLOAD_BYTES);
            println!("  Store:         {:?}", config.store.backend);

            let bucket = config.bucket_name();
            if bucket.is_empty() && config.store.backend == StoreBackend::S3 {
                println!("  Bucket:        (not set; requests will fail until BUCKET_NAME is provided)");
            } else {
                println!("  Bucket:        {}", bucket);
            }
            println!("  Prefix:        {}", PUBLIC_PREFIX);
            println!("  Log level:     {} ({})", config.logging.level, config.logging.format);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration is invalid: {}", e);
            Err(e)
        }
    }
}
