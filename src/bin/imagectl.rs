//! ImageCtl - Command line client for an ImageGate endpoint
//!
//! Usage:
//!   imagectl upload photo.jpg     - Upload an image
//!   imagectl list                 - List uploaded image URLs

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ImageGate Control Tool
#[derive(Parser)]
#[command(name = "imagectl")]
#[command(about = "Upload and list images through an ImageGate endpoint", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "imagegate.toml")]
    config: PathBuf,

    /// API endpoint to connect to (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Token passed in the Authorization header
    #[arg(short, long, env = "IMAGEGATE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image file
    Upload {
        /// Image file to upload
        path: PathBuf,
        /// Name to store the image under (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List uploaded images
    List,
}

// ============ API Types ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    action: &'static str,
    file_name: &'a str,
    image_data: String,
}

/// Gateway envelope; `statusCode` is ignored in favour of the HTTP status,
/// which is also set when something in front of the gateway answers
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<T> {
    #[serde(default)]
    message: String,
    data: Option<T>,
}

// ============ Config ============

#[derive(Debug, Deserialize)]
struct Config {
    #[serde(default)]
    server: ServerConfig,
}

#[derive(Debug, Deserialize, Default)]
struct ServerConfig {
    #[serde(default = "default_server_bind")]
    bind_address: String,
}

fn default_server_bind() -> String {
    "0.0.0.0:8080".to_string()
}

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

fn endpoint_from_config(path: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(path) else {
        return DEFAULT_ENDPOINT.to_string();
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => {
            // Convert bind address to localhost if it's 0.0.0.0
            let addr = config.server.bind_address;
            if addr.starts_with("0.0.0.0") {
                format!("http://127.0.0.1:{}", addr.split(':').nth(1).unwrap_or("8080"))
            } else {
                format!("http://{}", addr)
            }
        }
        Err(_) => DEFAULT_ENDPOINT.to_string(),
    }
}

// ============ Main ============

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let endpoint = cli
        .endpoint
        .clone()
        .unwrap_or_else(|| endpoint_from_config(&cli.config));
    let endpoint = endpoint.trim_end_matches('/');

    let result = match &cli.command {
        Commands::Upload { path, name } => upload(endpoint, cli.token.as_deref(), path, name.as_deref()).await,
        Commands::List => list(endpoint, cli.token.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ============ Commands ============

fn api_error<T>(status: reqwest::StatusCode, result: &ApiResponse<T>) -> String {
    format!("API error {}: {}", status, result.message)
}

fn with_token(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => request.header(reqwest::header::AUTHORIZATION, token),
        None => request,
    }
}

async fn upload(
    endpoint: &str,
    token: Option<&str>,
    path: &Path,
    name: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_name = match name {
        Some(n) => n.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or("cannot derive a file name from the path; pass --name")?,
    };

    let bytes = std::fs::read(path)?;
    let body = UploadRequest {
        action: "UPLOAD",
        file_name: &file_name,
        image_data: STANDARD.encode(&bytes),
    };

    let url = format!("{}/img", endpoint);
    let client = reqwest::Client::new();
    let response = with_token(client.post(&url), token).json(&body).send().await?;

    let status = response.status();
    let result: ApiResponse<serde_json::Value> = response.json().await?;
    if !status.is_success() {
        return Err(api_error(status, &result).into());
    }

    println!("{} ({} bytes as {})", result.message, bytes.len(), file_name);
    Ok(())
}

async fn list(endpoint: &str, token: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/img", endpoint);
    let client = reqwest::Client::new();
    let response = with_token(client.get(&url), token)
        .query(&[("action", "LIST")])
        .send()
        .await?;

    let status = response.status();
    let result: ApiResponse<Vec<String>> = response.json().await?;
    if !status.is_success() {
        return Err(api_error(status, &result).into());
    }

    let urls = result.data.unwrap_or_default();
    println!();
    println!("Images ({})", urls.len());
    println!("{}", "=".repeat(40));
    for url in &urls {
        println!("{}", url);
    }
    println!();

    Ok(())
}
