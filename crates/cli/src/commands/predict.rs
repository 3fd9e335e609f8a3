//! Crop prediction commands

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, CropRecommendation, PredictRequest};
use crate::output::{color_probability, print_json, print_warning, OutputFormat};

/// Row for the recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Crop")]
    crop: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

fn rows(recommendations: &[CropRecommendation]) -> Vec<RecommendationRow> {
    recommendations
        .iter()
        .enumerate()
        .map(|(i, r)| RecommendationRow {
            rank: i + 1,
            crop: r.crop.clone(),
            probability: color_probability(r.probability),
        })
        .collect()
}

/// Request and print the top crops for one set of readings
pub async fn predict(client: &ApiClient, request: &PredictRequest, format: OutputFormat) -> Result<()> {
    let recommendations = client.predict(request).await?;

    match format {
        OutputFormat::Json => print_json(&recommendations)?,
        OutputFormat::Table => {
            if recommendations.is_empty() {
                print_warning("No recommendations returned");
                return Ok(());
            }

            println!("{}", "Crop Recommendations".bold());
            println!(
                "N={} P={} K={} T={}°C H={}% pH={} rain={}mm",
                request.n,
                request.p,
                request.k,
                request.temperature,
                request.humidity,
                request.ph,
                request.rainfall
            );
            println!();

            let table = Table::new(rows(&recommendations))
                .with(Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

/// Show the model the server has loaded
pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let model = client.model().await?;

    match format {
        OutputFormat::Json => print_json(&model)?,
        OutputFormat::Table => {
            println!("{}", "Loaded Model".bold());
            println!("{}", "=".repeat(40));
            println!("Kind:     {}", model.kind.cyan());
            println!("Features: {}", model.feature_names.join(", "));
            println!("Classes:  {}", model.classes.len());
            for class in &model.classes {
                println!("  - {}", class);
            }
        }
    }

    Ok(())
}
