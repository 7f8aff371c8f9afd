//! Slotwise CLI and REST API entry point.
//!
//! Binary name: `slotctl`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use chrono::Utc;
use clap::Parser;
use clap_complete::generate;

use cli::booking::BookArgs;
use cli::{Cli, Commands, ListResource, ShowResource};
use slotwise_observe::tracing_setup::{directives_for, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(directives_for(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "slotctl", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = run(cli, &state).await;

    state.db_pool.close().await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: &AppState) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::List { resource } => match resource {
            ListResource::Providers => {
                cli::provider::list_providers(state, json).await?;
            }
            ListResource::Bookings {
                status,
                provider,
                phone,
                date,
                limit,
            } => {
                cli::booking::list_bookings(state, status, provider, phone, date, limit, json)
                    .await?;
            }
        },

        Commands::Show { resource } => match resource {
            ShowResource::Provider { provider } => {
                cli::provider::show_provider(state, &provider, json).await?;
            }
            ShowResource::Booking { id } => {
                cli::booking::show_booking(state, &id, json).await?;
            }
        },

        Commands::Book {
            provider,
            name,
            phone,
            address,
            license,
            engine,
            date,
            notes,
        } => {
            let args = BookArgs {
                provider,
                name,
                phone,
                address,
                license,
                engine,
                date,
                notes,
            };
            cli::booking::book(state, args, json).await?;
        }

        Commands::Transition { id, status } => {
            cli::booking::transition(state, &id, &status, json).await?;
        }

        Commands::Capacity {
            provider,
            total_slots,
        } => {
            cli::provider::set_capacity(state, &provider, total_slots, json).await?;
        }

        Commands::Reschedule { id, date } => {
            cli::booking::reschedule(state, &id, date, json).await?;
        }

        Commands::Seed { file } => {
            cli::seed::seed(state, file.as_deref(), json).await?;
        }

        Commands::Sweep => {
            cli::booking::sweep(state, json).await?;
        }

        Commands::Status => {
            cli::status::status(state, json).await?;
        }

        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            let sweeper = spawn_sweeper(state);

            println!(
                "  {} Slotwise API listening on {}",
                console::style("⚙").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());
            tracing::info!(%addr, "REST API started");

            let router = http::router::build_router(state.clone());

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if let Some(handle) = sweeper {
                handle.abort();
            }
            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Run the pending-expiry sweep on an interval while the server is up.
/// Nothing is spawned when no TTL is configured.
fn spawn_sweeper(state: &AppState) -> Option<tokio::task::JoinHandle<()>> {
    if state.booking_service.pending_ttl().is_none() {
        return None;
    }

    let service = state.booking_service.clone();
    let period = state.config.engine.sweep_interval();
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = service.expire_stale_pending(Utc::now()).await {
                tracing::warn!(error = %e, "pending expiry sweep failed");
            }
        }
    }))
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
