use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod dashboard;
mod error;
mod ml;
mod web;

use crate::config::Config;
use crate::dashboard::DashboardForm;
use crate::ml::PricingEngine;
use crate::web::ApiServer;

#[derive(Parser)]
#[command(name = "house-price-service")]
#[command(about = "House price prediction API and terminal dashboard")]
struct Cli {
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the model and serve the prediction API (default)
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ask a running service for a price and print it
    Predict {
        #[command(flatten)]
        form: DashboardForm,

        /// Service base URL, overrides `client.base_url`
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the dashboard output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }

            info!("Starting house price service");

            // Loaded once, read-only for the life of the process.
            let engine = Arc::new(PricingEngine::new(&config.model).await?);
            ApiServer::new(engine, &config.server).start().await?;

            Ok(ExitCode::SUCCESS)
        }
        Command::Predict { form, url } => {
            if let Some(url) = url {
                config.client.base_url = url;
            }

            if dashboard::run(&config.client, &form).await {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
