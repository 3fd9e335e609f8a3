//! Crop Recommender CLI
//!
//! A command-line tool for requesting crop recommendations and checking
//! the status of the crop server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{predict, status};

/// Crop Recommender CLI
#[derive(Parser)]
#[command(name = "crop")]
#[command(author, version, about = "CLI for the Crop Recommender", long_about = None)]
pub struct Cli {
    /// API endpoint URL (falls back to the config file, then http://localhost:8000)
    #[arg(long, env = "CROP_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get the four most suitable crops for soil and weather readings
    #[command(allow_negative_numbers = true)]
    Predict {
        /// Nitrogen content
        #[arg(long = "n")]
        n: f64,

        /// Phosphorus content
        #[arg(long = "p")]
        p: f64,

        /// Potassium content (raw, not log-transformed)
        #[arg(long = "k")]
        k: f64,

        /// Temperature in °C
        #[arg(long)]
        temperature: f64,

        /// Relative humidity in %
        #[arg(long)]
        humidity: f64,

        /// Soil pH
        #[arg(long)]
        ph: f64,

        /// Rainfall in mm
        #[arg(long)]
        rainfall: f64,
    },

    /// Show the model loaded by the server
    Model,

    /// Show server health and readiness
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = config::Config::load().unwrap_or_else(|e| {
        output::print_warning(&format!("Ignoring config file: {:#}", e));
        config::Config::default()
    });

    let format = cli
        .format
        .or_else(|| {
            file_config
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_name)
        })
        .unwrap_or_default();

    let client = client::ApiClient::new(&file_config.api_url(cli.api_url))?;

    match cli.command {
        Commands::Predict {
            n,
            p,
            k,
            temperature,
            humidity,
            ph,
            rainfall,
        } => {
            let request = client::PredictRequest {
                n,
                p,
                k,
                temperature,
                humidity,
                ph,
                rainfall,
            };
            predict::predict(&client, &request, format).await?;
        }
        Commands::Model => {
            predict::show_model(&client, format).await?;
        }
        Commands::Health => {
            if !status::show_health(&client, format).await? {
                anyhow::bail!("crop server is not ready");
            }
        }
    }

    Ok(())
}
