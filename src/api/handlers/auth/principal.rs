//! Authenticated principal extraction.
//!
//! The security middleware resolves the session token into a `Principal` and
//! inserts it into request extensions for protected routes.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;

use super::session::authenticate_session;
use super::storage::SessionRecord;

/// Operator identity derived from a valid session.
#[derive(Clone, Debug)]
pub struct Principal {
    pub operator_id: uuid::Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl Principal {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|granted| granted == role)
    }
}

impl From<SessionRecord> for Principal {
    fn from(record: SessionRecord) -> Self {
        Self {
            operator_id: record.operator_id,
            username: record.username,
            roles: record.roles,
        }
    }
}

/// Resolve the session token in `headers` into a principal.
///
/// `Ok(None)` means no valid session; `Err` is reserved for database
/// failures.
pub(crate) async fn resolve_principal(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Option<Principal>, StatusCode> {
    match authenticate_session(headers, pool).await {
        Ok(Some(record)) => Ok(Some(Principal::from(record))),
        Ok(None) => Ok(None),
        Err(status) => Err(status),
    }
}
