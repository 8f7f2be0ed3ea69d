//! Request/response types for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::OperatorRecord;

/// Form payload for `POST /doLogin`.
#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub code: String,
}

/// Operator record as echoed to clients.
///
/// The `password` field is kept so the payload shape matches the stored
/// model, but it always serializes as `null`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct OperatorProfile {
    pub id: String,
    pub username: String,
    pub name: String,
    pub phone: Option<String>,
    pub telephone: Option<String>,
    pub address: Option<String>,
    pub enabled: bool,
    #[serde(rename = "userface")]
    pub user_face: Option<String>,
    pub remark: Option<String>,
    pub password: Option<String>,
    pub roles: Vec<String>,
}

impl From<OperatorRecord> for OperatorProfile {
    fn from(record: OperatorRecord) -> Self {
        Self {
            id: record.id.to_string(),
            username: record.username,
            name: record.name,
            phone: record.phone,
            telephone: record.telephone,
            address: record.address,
            enabled: record.enabled,
            user_face: record.user_face,
            remark: record.remark,
            // The stored hash never leaves the service.
            password: None,
            roles: record.roles,
        }
    }
}
