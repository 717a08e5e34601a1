use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use spool_gate::config::load_config;
use spool_gate::security::client_ip::{normalize_client_ip, X_FORWARDED_FOR, X_REAL_IP};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Operator CLI for the spool-gate login throttle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration file, then print the effective settings
    CheckConfig {
        path: PathBuf,
    },
    /// Show the rate-limit key derived from proxy headers
    ClientKey {
        #[arg(long)]
        forwarded_for: Option<String>,
        #[arg(long)]
        real_ip: Option<String>,
    },
    /// Query a running gate's health endpoint
    Status {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { path } => {
            let config = load_config(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::ClientKey { forwarded_for, real_ip } => {
            let mut headers: Vec<(&str, &str)> = Vec::new();
            if let Some(v) = forwarded_for.as_deref() {
                headers.push((X_FORWARDED_FOR, v));
            }
            if let Some(v) = real_ip.as_deref() {
                headers.push((X_REAL_IP, v));
            }
            println!("{}", normalize_client_ip(headers.as_slice()));
        }
        Commands::Status { url } => {
            let res = reqwest::get(format!("{}/healthz", url.trim_end_matches('/'))).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gate returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
