//! Provider seed data.
//!
//! The engine never invents providers; they come from here. Either the
//! built-in five-mechanic roster or a TOML roster file:
//!
//! ```toml
//! [[providers]]
//! name = "Ana Costa"
//! specialization = "Hybrid Systems"
//! total_slots = 6        # optional, falls back to engine.default_total_slots
//! available_slots = 5    # optional, models pre-existing load
//! ```
//!
//! Seeding is idempotent by name: providers that already exist are skipped,
//! never overwritten, so live slot counts survive a re-seed.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use slotwise_core::engine::registry::ProviderRegistry;
use slotwise_core::repository::provider::ProviderRepository;
use slotwise_types::error::SlotError;
use slotwise_types::provider::{NewProvider, Provider, ProviderProfile};
use thiserror::Error;

/// Errors from loading or applying a roster.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read roster {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid roster {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("roster contains '{0}' more than once")]
    DuplicateName(String),

    #[error(transparent)]
    Engine(#[from] SlotError),
}

/// Result of a seeding run.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub created: Vec<Provider>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    providers: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    #[serde(flatten)]
    profile: ProviderProfile,
    total_slots: Option<u32>,
    available_slots: Option<u32>,
    available: Option<bool>,
}

impl RosterEntry {
    fn into_new_provider(self, default_total_slots: u32) -> NewProvider {
        NewProvider {
            profile: self.profile,
            total_slots: self.total_slots.unwrap_or(default_total_slots),
            available_slots: self.available_slots,
            available_override: self.available,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn mechanic(
    name: &str,
    email: &str,
    contact: &str,
    specialization: &str,
    experience_years: u32,
    shift: &str,
    hourly_rate: f64,
    available_slots: u32,
) -> NewProvider {
    NewProvider {
        profile: ProviderProfile {
            name: name.to_string(),
            email: email.to_string(),
            contact: contact.to_string(),
            specialization: specialization.to_string(),
            experience_years,
            shift: shift.to_string(),
            hourly_rate,
        },
        total_slots: 4,
        available_slots: Some(available_slots),
        available_override: None,
    }
}

/// The built-in workshop roster. David Wilson starts at 3/4 to model an
/// existing booking; everyone else is fully available.
pub fn default_roster() -> Vec<NewProvider> {
    vec![
        mechanic(
            "David Wilson",
            "david.wilson@autofix.com",
            "0134567890",
            "Transmission & Drivetrain",
            10,
            "Full Day",
            85.0,
            3,
        ),
        mechanic(
            "James Davis",
            "james.davis@autofix.com",
            "0156789012",
            "General Maintenance & Oil Change",
            5,
            "Morning",
            65.0,
            4,
        ),
        mechanic(
            "John Smith",
            "john.smith@autofix.com",
            "0987654321",
            "Brake Systems & Suspension",
            6,
            "Afternoon",
            70.0,
            4,
        ),
        mechanic(
            "Mike Johnson",
            "mike.johnson@autofix.com",
            "0123456789",
            "Engine Repair & Diagnostics",
            8,
            "Morning",
            75.0,
            4,
        ),
        mechanic(
            "Robert Brown",
            "robert.brown@autofix.com",
            "0145678901",
            "Electrical Systems & A/C",
            7,
            "Evening",
            80.0,
            4,
        ),
    ]
}

/// Parse a TOML roster. Entries without `total_slots` get
/// `default_total_slots`.
pub fn parse_roster(
    content: &str,
    origin: &str,
    default_total_slots: u32,
) -> Result<Vec<NewProvider>, SeedError> {
    let file: RosterFile = toml::from_str(content).map_err(|source| SeedError::Parse {
        path: origin.to_string(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut roster = Vec::with_capacity(file.providers.len());
    for entry in file.providers {
        if !seen.insert(entry.profile.name.clone()) {
            return Err(SeedError::DuplicateName(entry.profile.name));
        }
        roster.push(entry.into_new_provider(default_total_slots));
    }
    Ok(roster)
}

/// Read and parse a TOML roster file.
pub async fn load_roster(path: &Path, default_total_slots: u32) -> Result<Vec<NewProvider>, SeedError> {
    let origin = path.display().to_string();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: origin.clone(),
            source,
        })?;
    parse_roster(&content, &origin, default_total_slots)
}

/// Register every roster entry whose name is not already present.
///
/// Each entry is validated by the registry; the first invalid entry aborts
/// the run, leaving earlier entries registered.
pub async fn seed_providers<P: ProviderRepository>(
    registry: &ProviderRegistry<P>,
    roster: Vec<NewProvider>,
) -> Result<SeedReport, SeedError> {
    let existing: HashSet<String> = registry
        .list()
        .await?
        .into_iter()
        .map(|p| p.profile.name)
        .collect();

    let mut report = SeedReport::default();
    for entry in roster {
        if existing.contains(&entry.profile.name) {
            tracing::debug!(name = %entry.profile.name, "provider already present, skipping");
            report.skipped.push(entry.profile.name);
            continue;
        }
        report.created.push(registry.register(entry).await?);
    }

    tracing::info!(
        created = report.created.len(),
        skipped = report.skipped.len(),
        "provider roster applied"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use crate::sqlite::provider::SqliteProviderRepository;
    use std::time::Duration;

    async fn registry() -> (ProviderRegistry<SqliteProviderRepository>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("seed.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (
            ProviderRegistry::new(SqliteProviderRepository::new(pool), Duration::from_secs(1)),
            dir,
        )
    }

    #[test]
    fn default_roster_shape() {
        let roster = default_roster();
        assert_eq!(roster.len(), 5);
        let david = &roster[0];
        assert_eq!(david.profile.name, "David Wilson");
        assert_eq!((david.total_slots, david.available_slots), (4, Some(3)));
        assert!(roster[1..].iter().all(|p| p.available_slots == Some(4)));
    }

    #[test]
    fn parse_roster_applies_defaults() {
        let roster = parse_roster(
            r#"
[[providers]]
name = "Ana Costa"
specialization = "Hybrid Systems"
total_slots = 6
available_slots = 5

[[providers]]
name = "Ben Okafor"
available = false
"#,
            "roster.toml",
            3,
        )
        .unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].total_slots, 6);
        assert_eq!(roster[0].available_slots, Some(5));
        assert_eq!(roster[1].total_slots, 3);
        assert_eq!(roster[1].profile.shift, "Full Day");
        assert_eq!(roster[1].available_override, Some(false));
    }

    #[test]
    fn parse_roster_rejects_duplicates() {
        let err = parse_roster(
            "[[providers]]\nname = \"A\"\n[[providers]]\nname = \"A\"\n",
            "dup.toml",
            4,
        )
        .unwrap_err();
        assert!(matches!(err, SeedError::DuplicateName(name) if name == "A"));
    }

    #[test]
    fn parse_roster_reports_origin() {
        let err = parse_roster("[[providers]]\ntotal_slots = 4\n", "broken.toml", 4).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[tokio::test]
    async fn load_roster_missing_file() {
        let err = load_roster(Path::new("/nonexistent/roster.toml"), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let (registry, _dir) = registry().await;

        let first = seed_providers(&registry, default_roster()).await.unwrap();
        assert_eq!(first.created.len(), 5);
        assert!(first.skipped.is_empty());

        let david = first
            .created
            .iter()
            .find(|p| p.profile.name == "David Wilson")
            .unwrap();
        registry.try_reserve(&david.id).await.unwrap();

        let second = seed_providers(&registry, default_roster()).await.unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 5);
        assert_eq!(registry.get(&david.id).await.unwrap().available_slots, 2);
    }

    #[tokio::test]
    async fn seed_rejects_invalid_entry() {
        let (registry, _dir) = registry().await;
        let roster = parse_roster("[[providers]]\nname = \"Zero\"\ntotal_slots = 0\n", "zero.toml", 4)
            .unwrap();
        let err = seed_providers(&registry, roster).await.unwrap_err();
        assert!(matches!(err, SeedError::Engine(SlotError::Validation(_))));
    }
}
