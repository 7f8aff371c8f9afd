//! Booking CLI commands: book, list, show, transition, reschedule, sweep.

use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Input, Select};

use slotwise_core::repository::SortOrder;
use slotwise_core::repository::booking::BookingFilter;
use slotwise_types::booking::{Booking, BookingId, BookingStatus, CreateBookingRequest};
use slotwise_types::provider::ProviderView;

use crate::cli::provider::{format_availability, resolve_provider};
use crate::http::extractors::query::parse_statuses;
use crate::state::AppState;

/// Values for a new booking as given on the command line.
#[derive(Default)]
pub struct BookArgs {
    pub provider: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub license: Option<String>,
    pub engine: Option<String>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn prompt(label: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(label).interact_text()?),
    }
}

async fn pick_provider(state: &AppState) -> Result<ProviderView> {
    let open: Vec<ProviderView> = state
        .booking_service
        .list_providers()
        .await?
        .into_iter()
        .filter(|v| v.provider.available_slots > 0)
        .collect();

    if open.is_empty() {
        bail!("every provider is fully booked");
    }

    let labels: Vec<String> = open
        .iter()
        .map(|v| {
            format!(
                "{} ({}, {})",
                v.provider.profile.name, v.provider.profile.specialization, v.slot_text
            )
        })
        .collect();

    let choice = Select::new()
        .with_prompt("Mechanic")
        .items(labels.as_slice())
        .default(0)
        .interact()?;

    open.into_iter()
        .nth(choice)
        .ok_or_else(|| anyhow!("no provider selected"))
}

/// Book a slot. Any detail not given as a flag is prompted for.
///
/// # Examples
///
/// ```bash
/// # Interactive
/// slotctl book
///
/// # One-shot
/// slotctl book --provider "David Wilson" --name "Aisha Rahman" \
///     --phone 0123456789 --address "12 Jalan Ampang" \
///     --license WXY1234 --engine K20A991 --date 2030-01-15
/// ```
pub async fn book(state: &AppState, args: BookArgs, json: bool) -> Result<()> {
    let provider = match &args.provider {
        Some(key) => resolve_provider(state, key).await?,
        None => pick_provider(state).await?,
    };

    let appointment_date = match args.date {
        Some(d) => d,
        None => {
            let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
            let raw = Input::<String>::new()
                .with_prompt("Appointment date (YYYY-MM-DD)")
                .default(tomorrow.to_string())
                .interact_text()?;
            raw.trim()
                .parse::<NaiveDate>()
                .map_err(|e| anyhow!("invalid date '{raw}': {e}"))?
        }
    };

    let request = CreateBookingRequest {
        provider_id: provider.provider.id,
        client_name: prompt("Client name", args.name)?,
        client_phone: prompt("Client phone", args.phone)?,
        client_address: prompt("Client address", args.address)?,
        car_license: prompt("Car licence plate", args.license)?,
        car_engine: prompt("Car engine number", args.engine)?,
        appointment_date,
        notes: args.notes,
    };

    let booking = state.booking_service.create_booking(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&booking)?);
        return Ok(());
    }

    let after = state.booking_service.get_provider(&provider.provider.id).await?;

    println!();
    println!("  {} Booking created", style("✓").green().bold());
    println!();
    println!(
        "  {}  {}",
        style("Mechanic:").bold(),
        style(&after.provider.profile.name).cyan()
    );
    println!("  {}      {}", style("Date:").bold(), booking.details.appointment_date);
    println!("  {}    {}", style("Status:").bold(), format_status(booking.status));
    println!("  {}     {}", style("Slots:").bold(), format_availability(&after));
    println!(
        "  {}        {}",
        style("ID:").bold(),
        style(booking.id.to_string()).dim()
    );
    println!();

    Ok(())
}

/// List bookings in a table, newest first.
pub async fn list_bookings(
    state: &AppState,
    status: Option<String>,
    provider: Option<String>,
    phone: Option<String>,
    date: Option<NaiveDate>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let statuses = match status {
        Some(raw) => parse_statuses(&raw).map_err(|e| anyhow!(e))?,
        None => Vec::new(),
    };
    let provider_id = match provider {
        Some(key) => Some(resolve_provider(state, &key).await?.provider.id),
        None => None,
    };

    let filter = BookingFilter {
        statuses,
        provider_id,
        client_phone: phone,
        appointment_date: date,
        sort_order: Some(SortOrder::Desc),
        limit: Some(limit),
        ..Default::default()
    };

    let bookings = state.booking_service.list_bookings(filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bookings)?);
        return Ok(());
    }

    if bookings.is_empty() {
        println!();
        println!(
            "  {} No bookings found. Create one with: {}",
            style("i").blue().bold(),
            style("slotctl book").yellow()
        );
        println!();
        return Ok(());
    }

    let names: std::collections::HashMap<_, _> = state
        .booking_service
        .list_providers()
        .await?
        .into_iter()
        .map(|v| (v.provider.id, v.provider.profile.name))
        .collect();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Client").fg(Color::White),
        Cell::new("Car").fg(Color::White),
        Cell::new("Mechanic").fg(Color::White),
        Cell::new("Date").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for booking in &bookings {
        let mechanic = names
            .get(&booking.provider_id)
            .cloned()
            .unwrap_or_else(|| booking.provider_id.to_string());
        table.add_row(vec![
            Cell::new(short_id(&booking.id)).fg(Color::DarkGrey),
            Cell::new(&booking.details.client_name).fg(Color::Cyan),
            Cell::new(&booking.details.car_license),
            Cell::new(mechanic),
            Cell::new(booking.details.appointment_date),
            status_cell(booking.status),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} booking{}",
        style(bookings.len()).bold(),
        if bookings.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one booking in full.
pub async fn show_booking(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id = parse_booking_id(id)?;
    let booking = state.booking_service.get_booking(&id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&booking)?);
        return Ok(());
    }

    let provider = state.booking_service.get_provider(&booking.provider_id).await?;
    print_booking(&booking, &provider);
    Ok(())
}

/// Move a booking to a new status.
pub async fn transition(state: &AppState, id: &str, status: &str, json: bool) -> Result<()> {
    let id = parse_booking_id(id)?;
    let status: BookingStatus = status.parse().map_err(|e: String| anyhow!(e))?;

    let booking = state.booking_service.transition_booking(&id, status).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&booking)?);
        return Ok(());
    }

    let provider = state.booking_service.get_provider(&booking.provider_id).await?;
    println!(
        "  {} Booking {} is now {}",
        style("✓").green().bold(),
        style(short_id(&booking.id)).dim(),
        format_status(booking.status)
    );
    if booking.status.is_terminal() {
        println!(
            "  {} {}",
            style(&provider.provider.profile.name).cyan(),
            format_availability(&provider)
        );
    }

    Ok(())
}

/// Move an active booking to another date.
pub async fn reschedule(state: &AppState, id: &str, date: NaiveDate, json: bool) -> Result<()> {
    let id = parse_booking_id(id)?;
    let booking = state.booking_service.reschedule_booking(&id, date).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&booking)?);
        return Ok(());
    }

    println!(
        "  {} Booking {} moved to {}",
        style("✓").green().bold(),
        style(short_id(&booking.id)).dim(),
        style(booking.details.appointment_date).bold()
    );

    Ok(())
}

/// Run the pending-expiry sweep once.
pub async fn sweep(state: &AppState, json: bool) -> Result<()> {
    let Some(ttl) = state.booking_service.pending_ttl() else {
        if json {
            println!("{}", serde_json::json!({"enabled": false, "cancelled": []}));
        } else {
            println!(
                "  {} Pending expiry is off. Set {} in config.toml to enable it.",
                style("i").blue().bold(),
                style("engine.pending_ttl_secs").yellow()
            );
        }
        return Ok(());
    };

    let sweep = state.booking_service.expire_stale_pending(Utc::now()).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "enabled": true,
                "cancelled": sweep.cancelled,
                "skipped": sweep.skipped,
                "busy": sweep.busy,
                "failed": sweep.failed,
            })
        );
        return Ok(());
    }

    let cancelled = sweep.cancelled.len();
    println!(
        "  {} Cancelled {} pending booking{} older than {}s",
        style("✓").green().bold(),
        style(cancelled).bold(),
        if cancelled == 1 { "" } else { "s" },
        ttl.as_secs()
    );
    if sweep.busy + sweep.failed > 0 {
        println!(
            "  {} {} left for the next sweep ({} busy, {} failed)",
            style("!").yellow().bold(),
            sweep.busy + sweep.failed,
            sweep.busy,
            sweep.failed
        );
    }

    Ok(())
}

fn print_booking(booking: &Booking, provider: &ProviderView) {
    let d = &booking.details;
    println!();
    println!("  {}", style(&d.client_name).cyan().bold());
    println!("  {}", style(booking.id.to_string()).dim());
    println!();

    println!("  {}", style("── Booking ──").dim());
    println!("  {}    {}", style("Status:").bold(), format_status(booking.status));
    println!("  {}      {}", style("Slot:").bold(), booking.slot);
    println!("  {}      {}", style("Date:").bold(), d.appointment_date);
    println!(
        "  {}  {} ({})",
        style("Mechanic:").bold(),
        style(&provider.provider.profile.name).cyan(),
        provider.provider.profile.specialization
    );
    println!();

    println!("  {}", style("── Client ──").dim());
    println!("  {}     {}", style("Phone:").bold(), d.client_phone);
    println!("  {}   {}", style("Address:").bold(), d.client_address);
    println!("  {}   {}", style("Licence:").bold(), d.car_license);
    println!("  {}    {}", style("Engine:").bold(), d.car_engine);
    if !d.notes.is_empty() {
        println!("  {}     {}", style("Notes:").bold(), d.notes);
    }
    println!();

    println!("  {}", style("── Timestamps ──").dim());
    println!(
        "  {}   {}",
        style("Created:").bold(),
        booking.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  {}   {}",
        style("Updated:").bold(),
        booking.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
}

// --- Formatting helpers ---

fn parse_booking_id(raw: &str) -> Result<BookingId> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("invalid booking id '{raw}'"))
}

fn short_id(id: &BookingId) -> String {
    id.to_string().chars().take(8).collect()
}

fn format_status(status: BookingStatus) -> String {
    match status {
        BookingStatus::Pending => format!("{}", style("◌ pending").yellow()),
        BookingStatus::Confirmed => format!("{}", style("● confirmed").blue()),
        BookingStatus::InProgress => format!("{}", style("● in-progress").cyan()),
        BookingStatus::Completed => format!("{}", style("✓ completed").green()),
        BookingStatus::Cancelled => format!("{}", style("○ cancelled").dim()),
    }
}

fn status_cell(status: BookingStatus) -> Cell {
    match status {
        BookingStatus::Pending => Cell::new("◌ pending").fg(Color::Yellow),
        BookingStatus::Confirmed => Cell::new("● confirmed").fg(Color::Blue),
        BookingStatus::InProgress => Cell::new("● in-progress").fg(Color::Cyan),
        BookingStatus::Completed => Cell::new("✓ completed").fg(Color::Green),
        BookingStatus::Cancelled => Cell::new("○ cancelled").fg(Color::DarkGrey),
    }
}
