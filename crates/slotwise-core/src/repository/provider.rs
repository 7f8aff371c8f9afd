//! Provider repository trait definition.

use slotwise_types::error::RepositoryError;
use slotwise_types::provider::{Provider, ProviderId};

/// Repository trait for provider persistence.
///
/// Implementations live in slotwise-infra (e.g., SqliteProviderRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ProviderRepository: Send + Sync {
    /// Store a new provider. Returns `Conflict` if the id already exists.
    fn insert(
        &self,
        provider: &Provider,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a provider by its unique ID.
    fn get(
        &self,
        id: &ProviderId,
    ) -> impl std::future::Future<Output = Result<Option<Provider>, RepositoryError>> + Send;

    /// List all providers ordered by name.
    fn list(&self)
    -> impl std::future::Future<Output = Result<Vec<Provider>, RepositoryError>> + Send;

    /// Replace the stored record with `provider` if the stored version equals
    /// `expected_version`. Returns `Conflict` on a version mismatch and
    /// `NotFound` if the provider does not exist.
    fn update(
        &self,
        provider: &Provider,
        expected_version: u64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
