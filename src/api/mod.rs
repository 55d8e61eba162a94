pub mod client;
pub mod error;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::error::ApiError;
use crate::api::models::{Contact, ContactId, ContactPayload};

/// Result of a request that the caller may abort. Cancellation is not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

/// The contacts resource. Each method maps one user intent to one request.
#[async_trait]
pub trait ContactApi: Send + Sync {
    /// List contacts, optionally filtered by `search`. Returns
    /// [`Outcome::Cancelled`] if `cancel` fires before the response is read.
    async fn list(
        &self,
        search: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<Outcome<Vec<Contact>>, ApiError>;

    async fn get(&self, id: &ContactId) -> Result<Contact, ApiError>;

    async fn create(&self, payload: &ContactPayload) -> Result<Contact, ApiError>;

    async fn update(&self, id: &ContactId, payload: &ContactPayload) -> Result<Contact, ApiError>;

    async fn delete(&self, id: &ContactId) -> Result<(), ApiError>;
}
