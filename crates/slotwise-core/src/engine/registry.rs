//! Provider registry: the only component that changes slot counts.
//!
//! Every mutation runs inside the provider's exclusive region, re-reads the
//! stored record there, and writes back with compare-and-swap on `version`.
//! No caller ever computes a new count from a stale read.

use std::time::Duration;

use chrono::Utc;
use slotwise_types::error::{RepositoryError, SlotError};
use slotwise_types::provider::{NewProvider, Provider, ProviderId};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error};

use super::lock::LockTable;
use super::storage_error;
use crate::repository::provider::ProviderRepository;

/// Registry of providers and their slot counts.
pub struct ProviderRegistry<P: ProviderRepository> {
    repo: P,
    locks: LockTable<ProviderId>,
}

impl<P: ProviderRepository> ProviderRegistry<P> {
    /// Create a registry over `repo`. Lock waits are bounded by `lock_timeout`.
    pub fn new(repo: P, lock_timeout: Duration) -> Self {
        Self {
            repo,
            locks: LockTable::new("provider", lock_timeout),
        }
    }

    pub fn repo(&self) -> &P {
        &self.repo
    }

    /// Snapshot of a provider.
    pub async fn get(&self, id: &ProviderId) -> Result<Provider, SlotError> {
        self.repo
            .get(id)
            .await
            .map_err(|e| SlotError::Storage(e.to_string()))?
            .ok_or(SlotError::ProviderNotFound(*id))
    }

    /// All providers ordered by name.
    pub async fn list(&self) -> Result<Vec<Provider>, SlotError> {
        self.repo
            .list()
            .await
            .map_err(|e| SlotError::Storage(e.to_string()))
    }

    /// Add a provider from seed or import data.
    pub async fn register(&self, new_provider: NewProvider) -> Result<Provider, SlotError> {
        let provider = new_provider.into_provider(Utc::now())?;
        self.repo
            .insert(&provider)
            .await
            .map_err(|e| storage_error("provider", e))?;
        debug!(provider_id = %provider.id, name = %provider.profile.name, slots = %provider.slot_text(), "provider registered");
        Ok(provider)
    }

    /// Enter the provider's exclusive region.
    ///
    /// Fails with `ProviderNotFound` if the provider does not exist and with
    /// `Busy` if the region stays held past the lock timeout.
    pub async fn lock(&self, id: &ProviderId) -> Result<ProviderGuard<'_, P>, SlotError> {
        let guard = self.locks.acquire(id).await?;
        let locked = ProviderGuard {
            registry: self,
            id: *id,
            _guard: guard,
        };
        match locked.current().await {
            Ok(_) => Ok(locked),
            Err(err) => {
                drop(locked);
                self.locks.prune(id);
                Err(err)
            }
        }
    }

    /// Consume one slot. Fails with `SlotsExhausted` when none remain.
    pub async fn try_reserve(&self, id: &ProviderId) -> Result<Provider, SlotError> {
        self.lock(id).await?.try_reserve().await
    }

    /// Return one slot. Fails with `CapacityExceeded` when the provider is
    /// already at full capacity.
    pub async fn release(&self, id: &ProviderId) -> Result<Provider, SlotError> {
        self.lock(id).await?.release().await
    }
}

/// A held provider region. Slot operations on the guard are serialized with
/// every other operation on the same provider until it is dropped.
pub struct ProviderGuard<'a, P: ProviderRepository> {
    registry: &'a ProviderRegistry<P>,
    id: ProviderId,
    _guard: OwnedMutexGuard<()>,
}

impl<P: ProviderRepository> ProviderGuard<'_, P> {
    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// Fresh read of the provider inside the region.
    pub async fn current(&self) -> Result<Provider, SlotError> {
        self.registry.get(&self.id).await
    }

    pub async fn try_reserve(&self) -> Result<Provider, SlotError> {
        let provider = self.apply(|p| p.reserved(Utc::now())).await?;
        debug!(provider_id = %self.id, available = provider.available_slots, "slot reserved");
        Ok(provider)
    }

    pub async fn release(&self) -> Result<Provider, SlotError> {
        match self.apply(|p| p.released(Utc::now())).await {
            Ok(provider) => {
                debug!(provider_id = %self.id, available = provider.available_slots, "slot released");
                Ok(provider)
            }
            Err(err) => {
                if err.is_integrity_violation() {
                    error!(provider_id = %self.id, error = %err, "slot release rejected at full capacity");
                }
                Err(err)
            }
        }
    }

    /// Resize the provider's capacity. `active_bookings` must be counted
    /// while this guard is held.
    pub async fn set_capacity(
        &self,
        total_slots: u32,
        active_bookings: u32,
    ) -> Result<Provider, SlotError> {
        let provider = self
            .apply(|p| p.resized(total_slots, active_bookings, Utc::now()))
            .await?;
        debug!(provider_id = %self.id, slots = %provider.slot_text(), "capacity changed");
        Ok(provider)
    }

    async fn apply<F>(&self, change: F) -> Result<Provider, SlotError>
    where
        F: FnOnce(&Provider) -> Result<Provider, SlotError>,
    {
        let current = self.current().await?;
        let next = change(&current)?;
        self.registry
            .repo
            .update(&next, current.version)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => SlotError::ProviderNotFound(self.id),
                other => storage_error(&format!("provider {}", self.id), other),
            })?;
        Ok(next)
    }
}
