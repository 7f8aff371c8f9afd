use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::SlotError;

/// Unique identifier for a provider, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub Uuid);

impl ProviderId {
    /// Create a new ProviderId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a ProviderId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProviderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Display attributes of a provider. Opaque to the slot engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default = "default_specialization")]
    pub specialization: String,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default = "default_shift")]
    pub shift: String,
    #[serde(default)]
    pub hourly_rate: f64,
}

fn default_specialization() -> String {
    "General Repair".to_string()
}

fn default_shift() -> String {
    "Full Day".to_string()
}

impl ProviderProfile {
    /// Profile with only a name; everything else takes its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: String::new(),
            contact: String::new(),
            specialization: default_specialization(),
            experience_years: 0,
            shift: default_shift(),
            hourly_rate: 0.0,
        }
    }
}

/// A service provider (mechanic) with a fixed daily slot capacity.
///
/// `available_slots` is the only field contended over by concurrent callers;
/// it is mutated exclusively through the registry's locked operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    #[serde(flatten)]
    pub profile: ProviderProfile,
    /// Daily capacity. Always positive.
    pub total_slots: u32,
    /// Remaining capacity, `0..=total_slots`.
    pub available_slots: u32,
    /// Explicit availability flag; overrides the slot-derived value when set.
    pub available_override: Option<bool>,
    /// Bumped on every write; storage uses it for compare-and-swap.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// Whether the provider is shown as bookable.
    pub fn is_available(&self) -> bool {
        self.available_override
            .unwrap_or(self.available_slots > 0)
    }

    /// Slots currently held by active bookings.
    pub fn booked_slots(&self) -> u32 {
        self.total_slots.saturating_sub(self.available_slots)
    }

    /// Availability in the display convention, e.g. `"3/4 slots available"`.
    pub fn slot_text(&self) -> String {
        format!("{}/{} slots available", self.available_slots, self.total_slots)
    }

    /// Short status label for listings.
    pub fn status_text(&self) -> &'static str {
        if self.available_slots > 0 {
            "Available"
        } else {
            "Fully Booked"
        }
    }

    /// Check `0 < total_slots` and `available_slots <= total_slots`.
    pub fn check_invariant(&self) -> Result<(), SlotError> {
        if self.total_slots == 0 {
            return Err(SlotError::Validation(format!(
                "provider {} has zero total slots",
                self.id
            )));
        }
        if self.available_slots > self.total_slots {
            return Err(SlotError::CapacityExceeded {
                provider_id: self.id,
                total_slots: self.total_slots,
            });
        }
        Ok(())
    }

    /// Snapshot with one slot consumed.
    pub fn reserved(&self, now: DateTime<Utc>) -> Result<Provider, SlotError> {
        if self.available_slots == 0 {
            return Err(SlotError::SlotsExhausted {
                provider_id: self.id,
                total_slots: self.total_slots,
            });
        }
        let next = Provider {
            available_slots: self.available_slots - 1,
            ..self.bumped(now)
        };
        next.check_invariant()?;
        Ok(next)
    }

    /// Snapshot with one slot returned. Never clamps: releasing at full
    /// capacity is an accounting defect.
    pub fn released(&self, now: DateTime<Utc>) -> Result<Provider, SlotError> {
        if self.available_slots >= self.total_slots {
            return Err(SlotError::CapacityExceeded {
                provider_id: self.id,
                total_slots: self.total_slots,
            });
        }
        let next = Provider {
            available_slots: self.available_slots + 1,
            ..self.bumped(now)
        };
        next.check_invariant()?;
        Ok(next)
    }

    /// Snapshot resized to `total_slots`, given the number of slots held by
    /// active bookings. Consumption already on the books (including load
    /// seeded without booking records) carries over to the new capacity.
    pub fn resized(
        &self,
        total_slots: u32,
        active_bookings: u32,
        now: DateTime<Utc>,
    ) -> Result<Provider, SlotError> {
        if total_slots == 0 {
            return Err(SlotError::Validation(
                "total slots must be positive".to_string(),
            ));
        }
        if total_slots < active_bookings {
            return Err(SlotError::CapacityBelowActive {
                requested: total_slots,
                active: active_bookings,
            });
        }
        let booked = self.booked_slots().max(active_bookings);
        let next = Provider {
            total_slots,
            available_slots: total_slots.saturating_sub(booked),
            ..self.bumped(now)
        };
        next.check_invariant()?;
        Ok(next)
    }

    fn bumped(&self, now: DateTime<Utc>) -> Provider {
        Provider {
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// A provider as supplied by seed data or import.
///
/// `available_slots` defaults to `total_slots`; a lower value models
/// pre-existing load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProvider {
    #[serde(flatten)]
    pub profile: ProviderProfile,
    pub total_slots: u32,
    #[serde(default)]
    pub available_slots: Option<u32>,
    #[serde(default)]
    pub available_override: Option<bool>,
}

impl NewProvider {
    /// Build the stored record, validating the slot invariant.
    pub fn into_provider(self, now: DateTime<Utc>) -> Result<Provider, SlotError> {
        let provider = Provider {
            id: ProviderId::new(),
            available_slots: self.available_slots.unwrap_or(self.total_slots),
            total_slots: self.total_slots,
            profile: self.profile,
            available_override: self.available_override,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        if provider.available_slots > provider.total_slots {
            return Err(SlotError::Validation(format!(
                "available slots {} exceed total slots {}",
                provider.available_slots, provider.total_slots
            )));
        }
        provider.check_invariant()?;
        Ok(provider)
    }
}

/// Request body for an administrative capacity change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCapacityRequest {
    pub total_slots: u32,
}

/// Provider enriched with the derived display values served to presentation
/// collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderView {
    #[serde(flatten)]
    pub provider: Provider,
    pub booked_slots: u32,
    pub is_available: bool,
    pub slot_text: String,
    pub status_text: &'static str,
}

impl From<Provider> for ProviderView {
    fn from(provider: Provider) -> Self {
        Self {
            booked_slots: provider.booked_slots(),
            is_available: provider.is_available(),
            slot_text: provider.slot_text(),
            status_text: provider.status_text(),
            provider,
        }
    }
}
