//! SQLite booking repository implementation.
//!
//! Implements `BookingRepository` from `slotwise-core`. Filter values are
//! always bound as parameters; only the whitelisted sort direction is spliced
//! into the SQL text.

use chrono::NaiveDate;
use slotwise_core::repository::SortOrder;
use slotwise_core::repository::booking::{BookingFilter, BookingRepository};
use slotwise_types::booking::{Booking, BookingDetails, BookingId, BookingStatus, SlotHold};
use slotwise_types::error::RepositoryError;
use slotwise_types::provider::ProviderId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, to_u32, to_u64};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed implementation of `BookingRepository`.
#[derive(Clone)]
pub struct SqliteBookingRepository {
    pool: DatabasePool,
}

impl SqliteBookingRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Booking.
struct BookingRow {
    id: String,
    provider_id: String,
    status: String,
    slot: String,
    client_name: String,
    client_phone: String,
    client_address: String,
    car_license: String,
    car_engine: String,
    appointment_date: String,
    notes: String,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl BookingRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            provider_id: row.try_get("provider_id")?,
            status: row.try_get("status")?,
            slot: row.try_get("slot")?,
            client_name: row.try_get("client_name")?,
            client_phone: row.try_get("client_phone")?,
            client_address: row.try_get("client_address")?,
            car_license: row.try_get("car_license")?,
            car_engine: row.try_get("car_engine")?,
            appointment_date: row.try_get("appointment_date")?,
            notes: row.try_get("notes")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_booking(self) -> Result<Booking, RepositoryError> {
        let id = self
            .id
            .parse::<BookingId>()
            .map_err(|e| RepositoryError::Query(format!("invalid booking id: {e}")))?;
        let provider_id = self
            .provider_id
            .parse::<ProviderId>()
            .map_err(|e| RepositoryError::Query(format!("invalid provider id: {e}")))?;
        let status: BookingStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let slot: SlotHold = self
            .slot
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let appointment_date = NaiveDate::parse_from_str(&self.appointment_date, DATE_FORMAT)
            .map_err(|e| RepositoryError::Query(format!("invalid appointment date: {e}")))?;

        Ok(Booking {
            id,
            provider_id,
            status,
            slot,
            details: BookingDetails {
                client_name: self.client_name,
                client_phone: self.client_phone,
                client_address: self.client_address,
                car_license: self.car_license,
                car_engine: self.car_engine,
                appointment_date,
                notes: self.notes,
            },
            version: to_u64("version", self.version)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Build the WHERE clause for `filter` and the values to bind, in order.
fn where_clause(filter: &BookingFilter) -> (String, Vec<String>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if !filter.statuses.is_empty() {
        let placeholders = vec!["?"; filter.statuses.len()].join(", ");
        conditions.push(format!("status IN ({placeholders})"));
        binds.extend(filter.statuses.iter().map(|s| s.to_string()));
    }
    if let Some(provider_id) = filter.provider_id {
        conditions.push("provider_id = ?".to_string());
        binds.push(provider_id.to_string());
    }
    if let Some(ref phone) = filter.client_phone {
        conditions.push("client_phone = ?".to_string());
        binds.push(phone.clone());
    }
    if let Some(date) = filter.appointment_date {
        conditions.push("appointment_date = ?".to_string());
        binds.push(format_date(&date));
    }
    if let Some(cutoff) = filter.created_before {
        conditions.push("created_at < ?".to_string());
        binds.push(format_datetime(&cutoff));
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), binds)
    }
}

impl BookingRepository for SqliteBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO bookings (id, provider_id, status, slot, client_name, client_phone, client_address, car_license, car_engine, appointment_date, notes, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id.to_string())
        .bind(booking.provider_id.to_string())
        .bind(booking.status.to_string())
        .bind(booking.slot.to_string())
        .bind(&booking.details.client_name)
        .bind(&booking.details.client_phone)
        .bind(&booking.details.client_address)
        .bind(&booking.details.car_license)
        .bind(&booking.details.car_engine)
        .bind(format_date(&booking.details.appointment_date))
        .bind(&booking.details.notes)
        .bind(booking.version as i64)
        .bind(format_datetime(&booking.created_at))
        .bind(format_datetime(&booking.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("booking {} already exists", booking.id)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let booking_row =
                    BookingRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(booking_row.into_booking()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        let (where_sql, binds) = where_clause(&filter);
        let order = match filter.sort_order.unwrap_or_default() {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let mut sql = format!("SELECT * FROM bookings{where_sql} ORDER BY created_at {order}");

        // SQLite needs a LIMIT before an OFFSET; -1 means unbounded.
        if filter.limit.is_some() || filter.offset.is_some() {
            sql.push_str(&format!(" LIMIT {}", filter.limit.unwrap_or(-1)));
        }
        if let Some(offset) = filter.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let mut q = sqlx::query(&sql);
        for value in binds {
            q = q.bind(value);
        }
        let rows = q
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            let booking_row =
                BookingRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            bookings.push(booking_row.into_booking()?);
        }
        Ok(bookings)
    }

    async fn update(&self, booking: &Booking, expected_version: u64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, slot = ?, client_name = ?, client_phone = ?, client_address = ?, car_license = ?, car_engine = ?, appointment_date = ?, notes = ?, version = ?, updated_at = ?
             WHERE id = ? AND version = ?",
        )
        .bind(booking.status.to_string())
        .bind(booking.slot.to_string())
        .bind(&booking.details.client_name)
        .bind(&booking.details.client_phone)
        .bind(&booking.details.client_address)
        .bind(&booking.details.car_license)
        .bind(&booking.details.car_engine)
        .bind(format_date(&booking.details.appointment_date))
        .bind(&booking.details.notes)
        .bind(booking.version as i64)
        .bind(format_datetime(&booking.updated_at))
        .bind(booking.id.to_string())
        .bind(expected_version as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.get(&booking.id).await? {
            None => Err(RepositoryError::NotFound),
            Some(stored) => Err(RepositoryError::Conflict(format!(
                "expected version {expected_version}, found {}",
                stored.version
            ))),
        }
    }

    async fn count_active(&self, provider_id: &ProviderId) -> Result<u32, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE provider_id = ? AND status IN (?, ?, ?)",
        )
        .bind(provider_id.to_string())
        .bind(BookingStatus::Pending.to_string())
        .bind(BookingStatus::Confirmed.to_string())
        .bind(BookingStatus::InProgress.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        to_u32("active booking count", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::provider::SqliteProviderRepository;
    use chrono::{Duration, Utc};
    use slotwise_core::repository::provider::ProviderRepository;
    use slotwise_types::provider::{NewProvider, ProviderProfile};

    async fn test_pool() -> (DatabasePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (pool, dir)
    }

    async fn seeded_provider(pool: &DatabasePool) -> ProviderId {
        let provider = NewProvider {
            profile: ProviderProfile::named("Robert Brown"),
            total_slots: 4,
            available_slots: None,
            available_override: None,
        }
        .into_provider(Utc::now())
        .unwrap();
        SqliteProviderRepository::new(pool.clone())
            .insert(&provider)
            .await
            .unwrap();
        provider.id
    }

    fn make_booking(provider_id: ProviderId, phone: &str, day: u32) -> Booking {
        Booking::pending(
            provider_id,
            BookingDetails {
                client_name: "Tom Reyes".into(),
                client_phone: phone.into(),
                client_address: "9 Mill Lane".into(),
                car_license: "KLM4455".into(),
                car_engine: "1.6 GDI".into(),
                appointment_date: NaiveDate::from_ymd_opt(2031, 6, day).unwrap(),
                notes: "brakes squeal".into(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (pool, _dir) = test_pool().await;
        let provider_id = seeded_provider(&pool).await;
        let repo = SqliteBookingRepository::new(pool);
        let booking = make_booking(provider_id, "555-2000", 1);

        repo.insert(&booking).await.unwrap();
        let fetched = repo.get(&booking.id).await.unwrap().unwrap();
        assert_eq!(fetched, booking);
    }

    #[tokio::test]
    async fn test_insert_unknown_provider_fails() {
        let (pool, _dir) = test_pool().await;
        let repo = SqliteBookingRepository::new(pool);
        let err = repo
            .insert(&make_booking(ProviderId::new(), "555-2001", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[tokio::test]
    async fn test_update_compare_and_swap() {
        let (pool, _dir) = test_pool().await;
        let provider_id = seeded_provider(&pool).await;
        let repo = SqliteBookingRepository::new(pool);
        let booking = make_booking(provider_id, "555-2002", 2);
        repo.insert(&booking).await.unwrap();

        let confirmed = booking.with_status(BookingStatus::Confirmed, Utc::now());
        repo.update(&confirmed, booking.version).await.unwrap();

        let stale = booking.with_status(BookingStatus::Cancelled, Utc::now());
        let err = repo.update(&stale, booking.version).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let stored = repo.get(&booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(stored.slot, SlotHold::Held);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (pool, _dir) = test_pool().await;
        let provider_id = seeded_provider(&pool).await;
        let repo = SqliteBookingRepository::new(pool);

        let a = make_booking(provider_id, "555-2003", 3);
        let b = make_booking(provider_id, "555-2003", 4);
        let c = make_booking(provider_id, "555-2004", 3);
        for booking in [&a, &b, &c] {
            repo.insert(booking).await.unwrap();
        }
        let done = c.with_status(BookingStatus::Completed, Utc::now());
        repo.update(&done, c.version).await.unwrap();

        let by_phone = repo
            .list(BookingFilter {
                client_phone: Some("555-2003".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_phone.len(), 2);

        let active_on_day_3 = repo
            .list(BookingFilter {
                statuses: BookingStatus::ACTIVE.to_vec(),
                appointment_date: NaiveDate::from_ymd_opt(2031, 6, 3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active_on_day_3.len(), 1);
        assert_eq!(active_on_day_3[0].id, a.id);

        let completed = repo
            .list(BookingFilter {
                statuses: vec![BookingStatus::Completed],
                provider_id: Some(provider_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].slot, SlotHold::Released);
    }

    #[tokio::test]
    async fn test_list_sort_and_paginate() {
        let (pool, _dir) = test_pool().await;
        let provider_id = seeded_provider(&pool).await;
        let repo = SqliteBookingRepository::new(pool);

        let mut ids = Vec::new();
        for day in 1..=4 {
            let mut booking = make_booking(provider_id, &format!("555-21{day:02}"), day);
            booking.created_at = Utc::now() - Duration::minutes(10 - day as i64);
            repo.insert(&booking).await.unwrap();
            ids.push(booking.id);
        }

        let newest_first = repo.list(BookingFilter::default()).await.unwrap();
        assert_eq!(newest_first[0].id, ids[3]);

        let page = repo
            .list(BookingFilter {
                sort_order: Some(SortOrder::Asc),
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.iter().map(|b| b.id).collect::<Vec<_>>(), vec![ids[1], ids[2]]);

        let skipped = repo
            .list(BookingFilter {
                offset: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(skipped.len(), 1);

        let before = repo
            .list(BookingFilter {
                created_before: Some(Utc::now() - Duration::seconds(450)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(before.len(), 2);
    }

    #[tokio::test]
    async fn test_count_active() {
        let (pool, _dir) = test_pool().await;
        let provider_id = seeded_provider(&pool).await;
        let repo = SqliteBookingRepository::new(pool);

        let a = make_booking(provider_id, "555-2200", 5);
        let b = make_booking(provider_id, "555-2201", 5);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();
        assert_eq!(repo.count_active(&provider_id).await.unwrap(), 2);

        let cancelled = a.with_status(BookingStatus::Cancelled, Utc::now());
        repo.update(&cancelled, a.version).await.unwrap();
        assert_eq!(repo.count_active(&provider_id).await.unwrap(), 1);
        assert_eq!(repo.count_active(&ProviderId::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_version_is_rejected() {
        let (pool, _dir) = test_pool().await;
        let provider_id = seeded_provider(&pool).await;
        let repo = SqliteBookingRepository::new(pool.clone());
        let booking = make_booking(provider_id, "555-2100", 4);
        repo.insert(&booking).await.unwrap();

        sqlx::query("UPDATE bookings SET version = -1 WHERE id = ?")
            .bind(booking.id.to_string())
            .execute(&pool.writer)
            .await
            .unwrap();

        let err = repo.get(&booking.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(msg) if msg.contains("version out of range")));
    }
}
