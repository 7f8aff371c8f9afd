//! In-memory repositories for engine tests.
//!
//! Both honour the compare-and-swap contract of the real repositories and
//! expose switches for injecting storage failures.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use slotwise_types::booking::{Booking, BookingDetails, BookingId};
use slotwise_types::error::RepositoryError;
use slotwise_types::provider::{NewProvider, Provider, ProviderId, ProviderProfile};

use crate::repository::SortOrder;
use crate::repository::booking::{BookingFilter, BookingRepository};
use crate::repository::provider::ProviderRepository;

pub fn new_provider(name: &str, total: u32, available: u32) -> NewProvider {
    NewProvider {
        profile: ProviderProfile::named(name),
        total_slots: total,
        available_slots: Some(available),
        available_override: None,
    }
}

pub fn details(phone: &str, date: NaiveDate) -> BookingDetails {
    BookingDetails {
        client_name: "Ana Lima".into(),
        client_phone: phone.into(),
        client_address: "12 Harbour Rd".into(),
        car_license: "WXY1234".into(),
        car_engine: "2.0 TDI".into(),
        appointment_date: date,
        notes: String::new(),
    }
}

#[derive(Default)]
pub struct MemoryProviders {
    rows: Mutex<HashMap<ProviderId, Provider>>,
    conflict_next: AtomicBool,
}

impl MemoryProviders {
    /// Make the next `update` fail as if another process had written first.
    pub fn conflict_next_update(&self) {
        self.conflict_next.store(true, Ordering::SeqCst);
    }
}

impl ProviderRepository for MemoryProviders {
    async fn insert(&self, provider: &Provider) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&provider.id) {
            return Err(RepositoryError::Conflict(format!(
                "provider {} already exists",
                provider.id
            )));
        }
        rows.insert(provider.id, provider.clone());
        Ok(())
    }

    async fn get(&self, id: &ProviderId) -> Result<Option<Provider>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Provider>, RepositoryError> {
        let mut all: Vec<Provider> = self.rows.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.profile.name.cmp(&b.profile.name));
        Ok(all)
    }

    async fn update(&self, provider: &Provider, expected_version: u64) -> Result<(), RepositoryError> {
        if self.conflict_next.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::Conflict("version changed".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let stored = rows.get_mut(&provider.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Conflict(format!(
                "expected version {expected_version}, found {}",
                stored.version
            )));
        }
        *stored = provider.clone();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBookings {
    rows: Mutex<HashMap<BookingId, Booking>>,
    fail_writes: AtomicBool,
}

impl MemoryBookings {
    /// Make every subsequent insert and update fail until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(RepositoryError::Query("disk I/O error".into()))
        } else {
            Ok(())
        }
    }
}

impl BookingRepository for MemoryBookings {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.rows.lock().unwrap().insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>, RepositoryError> {
        let mut matched: Vec<Booking> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        matched.sort_by_key(|b| b.created_at);
        if filter.sort_order.unwrap_or_default() == SortOrder::Desc {
            matched.reverse();
        }
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(&self, booking: &Booking, expected_version: u64) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let stored = rows.get_mut(&booking.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Conflict(format!(
                "expected version {expected_version}, found {}",
                stored.version
            )));
        }
        *stored = booking.clone();
        Ok(())
    }

    async fn count_active(&self, provider_id: &ProviderId) -> Result<u32, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.provider_id == *provider_id && b.status.holds_slot())
            .count() as u32)
    }
}
