//! SQLite provider repository implementation.
//!
//! Implements `ProviderRepository` from `slotwise-core` using sqlx with split
//! read/write pools. Updates are compare-and-swap on the `version` column.

use slotwise_core::repository::provider::ProviderRepository;
use slotwise_types::error::RepositoryError;
use slotwise_types::provider::{Provider, ProviderId, ProviderProfile};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, to_u32, to_u64};

/// SQLite-backed implementation of `ProviderRepository`.
#[derive(Clone)]
pub struct SqliteProviderRepository {
    pool: DatabasePool,
}

impl SqliteProviderRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Provider.
struct ProviderRow {
    id: String,
    name: String,
    email: String,
    contact: String,
    specialization: String,
    experience_years: i64,
    shift: String,
    hourly_rate: f64,
    total_slots: i64,
    available_slots: i64,
    available_override: Option<bool>,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl ProviderRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            contact: row.try_get("contact")?,
            specialization: row.try_get("specialization")?,
            experience_years: row.try_get("experience_years")?,
            shift: row.try_get("shift")?,
            hourly_rate: row.try_get("hourly_rate")?,
            total_slots: row.try_get("total_slots")?,
            available_slots: row.try_get("available_slots")?,
            available_override: row.try_get("available_override")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_provider(self) -> Result<Provider, RepositoryError> {
        let id = self
            .id
            .parse::<ProviderId>()
            .map_err(|e| RepositoryError::Query(format!("invalid provider id: {e}")))?;

        Ok(Provider {
            id,
            profile: ProviderProfile {
                name: self.name,
                email: self.email,
                contact: self.contact,
                specialization: self.specialization,
                experience_years: to_u32("experience_years", self.experience_years)?,
                shift: self.shift,
                hourly_rate: self.hourly_rate,
            },
            total_slots: to_u32("total_slots", self.total_slots)?,
            available_slots: to_u32("available_slots", self.available_slots)?,
            available_override: self.available_override,
            version: to_u64("version", self.version)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl ProviderRepository for SqliteProviderRepository {
    async fn insert(&self, provider: &Provider) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO providers (id, name, email, contact, specialization, experience_years, shift, hourly_rate, total_slots, available_slots, available_override, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(provider.id.to_string())
        .bind(&provider.profile.name)
        .bind(&provider.profile.email)
        .bind(&provider.profile.contact)
        .bind(&provider.profile.specialization)
        .bind(provider.profile.experience_years as i64)
        .bind(&provider.profile.shift)
        .bind(provider.profile.hourly_rate)
        .bind(provider.total_slots as i64)
        .bind(provider.available_slots as i64)
        .bind(provider.available_override)
        .bind(provider.version as i64)
        .bind(format_datetime(&provider.created_at))
        .bind(format_datetime(&provider.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "provider '{}' already exists",
                    provider.profile.name
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get(&self, id: &ProviderId) -> Result<Option<Provider>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM providers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let provider_row = ProviderRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(provider_row.into_provider()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Provider>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM providers ORDER BY name ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut providers = Vec::with_capacity(rows.len());
        for row in &rows {
            let provider_row =
                ProviderRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            providers.push(provider_row.into_provider()?);
        }
        Ok(providers)
    }

    async fn update(&self, provider: &Provider, expected_version: u64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE providers SET name = ?, email = ?, contact = ?, specialization = ?, experience_years = ?, shift = ?, hourly_rate = ?, total_slots = ?, available_slots = ?, available_override = ?, version = ?, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(&provider.profile.name)
        .bind(&provider.profile.email)
        .bind(&provider.profile.contact)
        .bind(&provider.profile.specialization)
        .bind(provider.profile.experience_years as i64)
        .bind(&provider.profile.shift)
        .bind(provider.profile.hourly_rate)
        .bind(provider.total_slots as i64)
        .bind(provider.available_slots as i64)
        .bind(provider.available_override)
        .bind(provider.version as i64)
        .bind(format_datetime(&provider.updated_at))
        .bind(provider.id.to_string())
        .bind(expected_version as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing matched: either the row is gone or someone else wrote first.
        match self.get(&provider.id).await? {
            None => Err(RepositoryError::NotFound),
            Some(stored) => Err(RepositoryError::Conflict(format!(
                "expected version {expected_version}, found {}",
                stored.version
            ))),
        }
    }
}
