//! Server health and readiness commands

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use crate::client::{ApiClient, HealthStatus, ReadinessStatus};
use crate::output::{color_status, print_error, print_json, print_success, OutputFormat};

/// Show server health and readiness. Returns false if the server is not ready.
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<bool> {
    let (_, health): (bool, HealthStatus) = client.fetch_status("healthz").await?;
    let (ready, readiness): (bool, ReadinessStatus) = client.fetch_status("readyz").await?;

    match format {
        OutputFormat::Json => print_json(&json!({ "health": health, "readiness": readiness }))?,
        OutputFormat::Table => {
            println!("{}", "Server Status".bold());
            println!("{}", "=".repeat(40));
            println!("Health: {}", color_status(&health.status));

            let mut names: Vec<_> = health.components.keys().collect();
            names.sort();
            for name in names {
                let component = &health.components[name];
                match &component.message {
                    Some(message) => println!(
                        "  {:<10} {} ({})",
                        name,
                        color_status(&component.status),
                        message
                    ),
                    None => println!("  {:<10} {}", name, color_status(&component.status)),
                }
            }
            println!();

            if ready {
                print_success("Server is ready");
            } else {
                print_error(&format!(
                    "Server is not ready: {}",
                    readiness.reason.as_deref().unwrap_or("unknown")
                ));
            }
        }
    }

    Ok(ready)
}
