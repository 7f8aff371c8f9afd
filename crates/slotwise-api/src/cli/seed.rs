//! `slotctl seed`: register providers from a roster.

use std::path::Path;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use slotwise_infra::seed::{default_roster, load_roster, seed_providers};

use crate::state::AppState;

pub async fn seed(state: &AppState, file: Option<&Path>, json: bool) -> Result<()> {
    let roster = match file {
        Some(path) => load_roster(path, state.config.engine.default_total_slots).await?,
        None => default_roster(),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Registering {} providers...", roster.len()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = seed_providers(state.booking_service.lifecycle().registry(), roster).await;
    spinner.finish_and_clear();
    let report = result?;

    if json {
        let created: Vec<_> = report.created.iter().map(|p| &p.profile.name).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "created": created,
                "skipped": report.skipped,
            }))?
        );
        return Ok(());
    }

    println!();
    for provider in &report.created {
        println!(
            "  {} {} ({})",
            style("+").green().bold(),
            style(&provider.profile.name).cyan(),
            provider.slot_text()
        );
    }
    for name in &report.skipped {
        println!("  {} {} already registered", style("=").dim(), style(name).dim());
    }
    println!();
    println!(
        "  {} created, {} skipped",
        style(report.created.len()).green().bold(),
        style(report.skipped.len()).bold()
    );
    println!();

    Ok(())
}
