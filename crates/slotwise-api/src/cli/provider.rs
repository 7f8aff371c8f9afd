//! Provider CLI commands: list, show, capacity.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use slotwise_types::error::SlotError;
use slotwise_types::provider::{ProviderId, ProviderView};

use crate::state::AppState;

/// Look up a provider by id, falling back to a case-insensitive name match.
pub async fn resolve_provider(state: &AppState, key: &str) -> Result<ProviderView> {
    if let Ok(id) = key.parse::<ProviderId>() {
        match state.booking_service.get_provider(&id).await {
            Ok(provider) => return Ok(provider),
            Err(SlotError::ProviderNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let providers = state.booking_service.list_providers().await?;
    let mut matches = providers
        .into_iter()
        .filter(|p| p.provider.profile.name.eq_ignore_ascii_case(key.trim()));

    match (matches.next(), matches.next()) {
        (Some(provider), None) => Ok(provider),
        (Some(_), Some(_)) => bail!("more than one provider is named '{key}', use the id"),
        (None, _) => bail!("no provider matches '{key}'"),
    }
}

/// List all providers in a table.
pub async fn list_providers(state: &AppState, json: bool) -> Result<()> {
    let providers = state.booking_service.list_providers().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    if providers.is_empty() {
        println!();
        println!(
            "  {} No providers yet. Load the workshop roster with: {}",
            style("i").blue().bold(),
            style("slotctl seed").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Specialization").fg(Color::White),
        Cell::new("Shift").fg(Color::White),
        Cell::new("Slots").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for view in &providers {
        let p = &view.provider;
        let status_cell = if view.is_available {
            Cell::new(format!("● {}", view.status_text)).fg(Color::Green)
        } else {
            Cell::new(format!("○ {}", view.status_text)).fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(&p.profile.name).fg(Color::Cyan),
            Cell::new(&p.profile.specialization),
            Cell::new(&p.profile.shift).fg(Color::DarkGrey),
            Cell::new(&view.slot_text),
            status_cell,
        ]);
    }

    let available: u32 = providers.iter().map(|v| v.provider.available_slots).sum();
    let total: u32 = providers.iter().map(|v| v.provider.total_slots).sum();

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} provider{}, {} of {} slots free",
        style(providers.len()).bold(),
        if providers.len() == 1 { "" } else { "s" },
        style(available).green().bold(),
        total
    );
    println!();

    Ok(())
}

/// Show a provider's full profile.
pub async fn show_provider(state: &AppState, key: &str, json: bool) -> Result<()> {
    let view = resolve_provider(state, key).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let p = &view.provider;
    println!();
    println!("  {}", style(&p.profile.name).cyan().bold());
    println!("  {}", style(&p.profile.specialization).dim());
    println!();

    println!("  {}", style("── Slots ──").dim());
    println!("  {}     {}", style("Status:").bold(), format_availability(&view));
    println!("  {}     {}", style("Booked:").bold(), view.booked_slots);
    if let Some(flag) = p.available_override {
        println!(
            "  {}   {}",
            style("Override:").bold(),
            if flag { "forced available" } else { "forced unavailable" }
        );
    }
    println!();

    println!("  {}", style("── Profile ──").dim());
    if !p.profile.email.is_empty() {
        println!("  {}      {}", style("Email:").bold(), p.profile.email);
    }
    if !p.profile.contact.is_empty() {
        println!("  {}    {}", style("Contact:").bold(), p.profile.contact);
    }
    println!("  {} {} years", style("Experience:").bold(), p.profile.experience_years);
    println!("  {}      {}", style("Shift:").bold(), p.profile.shift);
    println!("  {}       ${:.2}/h", style("Rate:").bold(), p.profile.hourly_rate);
    println!("  {}         {}", style("ID:").bold(), style(p.id.to_string()).dim());
    println!();

    Ok(())
}

/// Change a provider's total slots.
pub async fn set_capacity(state: &AppState, key: &str, total_slots: u32, json: bool) -> Result<()> {
    let view = resolve_provider(state, key).await?;
    let updated = state
        .booking_service
        .set_capacity(&view.provider.id, total_slots)
        .await?;
    let updated = ProviderView::from(updated);

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
        return Ok(());
    }

    println!(
        "  {} {} now has {}",
        style("✓").green().bold(),
        style(&updated.provider.profile.name).cyan(),
        updated.slot_text
    );

    Ok(())
}

pub(crate) fn format_availability(view: &ProviderView) -> String {
    if view.is_available {
        format!("{}", style(&view.slot_text).green())
    } else {
        format!("{}", style(&view.slot_text).red())
    }
}
