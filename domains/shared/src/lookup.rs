//! Postal-code address lookup collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use navegar_validation::PostalCode;

/// Address fields returned for a postal code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state_code: String,
}

/// Lookup failures are non-blocking notices; the form stays submittable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("postal code must have {} digits", PostalCode::DIGITS)]
    MalformedPostalCode,
    #[error("postal code {0} not found")]
    NotFound(PostalCode),
    #[error("address lookup unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, postal_code: &PostalCode) -> Result<ResolvedAddress, LookupError>;
}
