use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::provider::ProviderId;

/// Unique identifier for a booking, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub Uuid);

impl BookingId {
    /// Create a new BookingId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a BookingId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Booking lifecycle states.
///
/// ```text
/// (create) -> Pending -> Confirmed -> InProgress
///              |           |            |
///              +-----------+------------+--> Completed | Cancelled
/// ```
///
/// Pending, Confirmed and InProgress hold a slot; Completed and Cancelled are
/// terminal and do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    /// Statuses that hold one of the provider's slots.
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
    ];

    /// Completed and Cancelled accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Whether a booking in this status holds a slot.
    pub fn holds_slot(self) -> bool {
        !self.is_terminal()
    }

    /// Legal successors of this status.
    pub fn successors(self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ],
            BookingStatus::Confirmed => &[
                BookingStatus::InProgress,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ],
            BookingStatus::InProgress => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::Completed | BookingStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::InProgress => write!(f, "in-progress"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in-progress" | "in_progress" | "inprogress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(format!(
                "invalid booking status: '{other}' (expected one of: pending, confirmed, in-progress, completed, cancelled)"
            )),
        }
    }
}

/// Which slot adjustment has been applied for a booking.
///
/// `Held` from creation until the booking reaches a terminal status, then
/// `Released`. Guards against releasing the same slot twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotHold {
    Held,
    Released,
}

impl fmt::Display for SlotHold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotHold::Held => write!(f, "held"),
            SlotHold::Released => write!(f, "released"),
        }
    }
}

impl FromStr for SlotHold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "held" => Ok(SlotHold::Held),
            "released" => Ok(SlotHold::Released),
            other => Err(format!("invalid slot hold: '{other}'")),
        }
    }
}

/// Client and vehicle details attached to a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub client_name: String,
    pub client_phone: String,
    pub client_address: String,
    /// Upper-cased licence plate.
    pub car_license: String,
    /// Upper-cased engine number.
    pub car_engine: String,
    pub appointment_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

/// A request to consume one of a provider's slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    /// Fixed at creation.
    pub provider_id: ProviderId,
    pub status: BookingStatus,
    pub slot: SlotHold,
    #[serde(flatten)]
    pub details: BookingDetails,
    /// Bumped on every write; storage uses it for compare-and-swap.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    /// Time of the last transition.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A freshly created booking: Pending, holding its slot.
    pub fn pending(provider_id: ProviderId, details: BookingDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: BookingId::new(),
            provider_id,
            status: BookingStatus::Pending,
            slot: SlotHold::Held,
            details,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot moved to `status`, with the slot marked released when the
    /// status is terminal. Edge legality is checked by the lifecycle manager.
    pub fn with_status(&self, status: BookingStatus, now: DateTime<Utc>) -> Booking {
        Booking {
            status,
            slot: if status.is_terminal() {
                SlotHold::Released
            } else {
                self.slot
            },
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Request body for creating a booking. Fields are validated and normalized
/// by the booking service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub provider_id: ProviderId,
    pub client_name: String,
    pub client_phone: String,
    pub client_address: String,
    pub car_license: String,
    pub car_engine: String,
    pub appointment_date: NaiveDate,
    pub notes: Option<String>,
}

/// Request body for a status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: BookingStatus,
}

/// Request body for moving a booking to another date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub appointment_date: NaiveDate,
}

/// Aggregate counts for dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStats {
    pub providers: u32,
    pub total_slots: u32,
    pub available_slots: u32,
    pub booked_slots: u32,
    pub pending: u32,
    pub confirmed: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub cancelled: u32,
}

impl SlotStats {
    pub fn record(&mut self, status: BookingStatus) {
        match status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Confirmed => self.confirmed += 1,
            BookingStatus::InProgress => self.in_progress += 1,
            BookingStatus::Completed => self.completed += 1,
            BookingStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_id_display() {
        let id = BookingId::new();
        let parsed: BookingId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_status_wire_names() {
        for status in BookingStatus::ALL {
            let s = status.to_string();
            let parsed: BookingStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
        assert_eq!(
            "In_Progress".parse::<BookingStatus>().unwrap(),
            BookingStatus::InProgress
        );
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(Confirmed));
        for active in BookingStatus::ACTIVE {
            assert!(active.can_transition_to(Completed));
            assert!(active.can_transition_to(Cancelled));
            assert!(!active.can_transition_to(active));
        }
        for terminal in [Completed, Cancelled] {
            assert!(terminal.successors().is_empty());
            assert!(!terminal.holds_slot());
        }
    }

    #[test]
    fn test_with_status_releases_on_terminal() {
        let details = BookingDetails {
            client_name: "Ana".into(),
            client_phone: "0123".into(),
            client_address: "1 Main St".into(),
            car_license: "ABC123".into(),
            car_engine: "V8".into(),
            appointment_date: NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(),
            notes: String::new(),
        };
        let booking = Booking::pending(ProviderId::new(), details, Utc::now());
        let confirmed = booking.with_status(BookingStatus::Confirmed, Utc::now());
        assert_eq!(confirmed.slot, SlotHold::Held);
        assert_eq!(confirmed.version, 1);
        let done = confirmed.with_status(BookingStatus::Completed, Utc::now());
        assert_eq!(done.slot, SlotHold::Released);
        assert_eq!(done.version, 2);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = SlotStats::default();
        stats.record(BookingStatus::Pending);
        stats.record(BookingStatus::Pending);
        stats.record(BookingStatus::Cancelled);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.cancelled, 1);
    }
}
