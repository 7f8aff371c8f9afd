//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display slot totals, booking counts by status, and where data lives.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let stats = state.booking_service.stats().await?;
    let engine = &state.config.engine;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "stats": stats,
            "lock_timeout_ms": engine.lock_timeout_ms,
            "pending_ttl_secs": engine.pending_ttl_secs,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Slotwise v{}",
        style("⚙").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Slots ──").dim());
    println!("  Providers: {}", style(stats.providers).bold());
    println!("  Total:     {}", stats.total_slots);
    println!("  Free:      {}", style(stats.available_slots).green());
    println!("  Booked:    {}", style(stats.booked_slots).yellow());
    println!();

    println!("  {}", style("── Bookings ──").dim());
    println!("  Pending:     {}", style(stats.pending).yellow());
    println!("  Confirmed:   {}", stats.confirmed);
    println!("  In progress: {}", style(stats.in_progress).cyan());
    println!("  Completed:   {}", style(stats.completed).green());
    if stats.cancelled > 0 {
        println!("  Cancelled:   {}", style(stats.cancelled).dim());
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir:      {}", style(state.data_dir.display()).dim());
    println!("  Database:      {}", style("SQLite (WAL mode)").dim());
    println!("  Lock timeout:  {} ms", engine.lock_timeout_ms);
    match engine.pending_ttl_secs {
        Some(ttl) => println!("  Pending TTL:   {ttl}s"),
        None => println!("  Pending TTL:   {}", style("off").dim()),
    }
    println!();

    Ok(())
}
