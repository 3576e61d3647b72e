//! Acting user and owning clinic.
//!
//! Orchestrators resolve the organization once per submit through an
//! injected [`SessionProvider`] instead of reaching for an ambient client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::store::StoreError;
use crate::types::EntityId;

/// The authenticated user and the clinic their profile belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: EntityId,
    pub organization_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no authenticated session")]
    NoSession,
    #[error("user {0} is not linked to a clinic")]
    NoOrganization(EntityId),
    #[error("could not resolve session: {0}")]
    Lookup(StoreError),
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, StoreError>;
}

/// Resolve the clinic that owns writes made in this session.
pub async fn resolve_organization<P>(provider: &P) -> Result<EntityId, AuthError>
where
    P: SessionProvider + ?Sized,
{
    let session = provider
        .current_session()
        .await
        .map_err(AuthError::Lookup)?
        .ok_or(AuthError::NoSession)?;

    session
        .organization_id
        .ok_or(AuthError::NoOrganization(session.user_id))
}

/// A fixed session, for embedding callers that authenticate elsewhere.
#[derive(Clone, Debug, Default)]
pub struct StaticSession {
    session: Option<Session>,
}

impl StaticSession {
    pub fn signed_in(user_id: &str, organization_id: &str) -> Self {
        Self {
            session: Some(Session {
                user_id: EntityId::from(user_id),
                organization_id: Some(EntityId::from(organization_id)),
            }),
        }
    }

    pub fn without_clinic(user_id: &str) -> Self {
        Self {
            session: Some(Session { user_id: EntityId::from(user_id), organization_id: None }),
        }
    }

    pub fn signed_out() -> Self {
        Self { session: None }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_clinic() {
        let provider = StaticSession::signed_in("u1", "clinic-1");
        assert_eq!(resolve_organization(&provider).await, Ok(EntityId::from("clinic-1")));
    }

    #[tokio::test]
    async fn test_missing_session_or_clinic() {
        assert_eq!(
            resolve_organization(&StaticSession::signed_out()).await,
            Err(AuthError::NoSession)
        );
        assert_eq!(
            resolve_organization(&StaticSession::without_clinic("u1")).await,
            Err(AuthError::NoOrganization(EntityId::from("u1")))
        );
    }
}
