//! Application state wiring the engine to its storage.
//!
//! AppState holds the concrete service instance used by both CLI and REST API.
//! The booking service is generic over repository traits, but AppState pins it
//! to the SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use slotwise_core::engine::lifecycle::BookingLifecycle;
use slotwise_core::engine::registry::ProviderRegistry;
use slotwise_core::service::booking::BookingService;
use slotwise_infra::config::load_config;
use slotwise_infra::filesystem::resolve_data_dir;
use slotwise_infra::sqlite::booking::SqliteBookingRepository;
use slotwise_infra::sqlite::pool::{DatabasePool, database_url};
use slotwise_infra::sqlite::provider::SqliteProviderRepository;
use slotwise_types::config::SlotwiseConfig;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteBookingService = BookingService<SqliteProviderRepository, SqliteBookingRepository>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers. Cloning is cheap; the
/// service and its lock tables are shared.
#[derive(Clone)]
pub struct AppState {
    pub booking_service: Arc<ConcreteBookingService>,
    pub config: Arc<SlotwiseConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state from the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        Self::open(resolve_data_dir()).await
    }

    /// Connect to `{data_dir}/slotwise.db`, load `config.toml`, wire services.
    pub async fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        let lock_timeout = config.engine.lock_timeout();
        let registry =
            ProviderRegistry::new(SqliteProviderRepository::new(db_pool.clone()), lock_timeout);
        let lifecycle = BookingLifecycle::new(
            registry,
            SqliteBookingRepository::new(db_pool.clone()),
            lock_timeout,
        );
        let booking_service = BookingService::new(lifecycle, config.engine.pending_ttl());

        Ok(Self {
            booking_service: Arc::new(booking_service),
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
