//! Uniform JSON envelope shared by auth outcomes and CRUD mutations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Response body `{status, msg, obj}`.
///
/// `status` is 200 for success and 500 for failure, independently of the HTTP
/// status carrying it: business failures ride on HTTP 200, auth outcomes on
/// 401/403.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Envelope {
    pub status: u16,
    pub msg: String,
    #[schema(value_type = Object)]
    pub obj: Value,
}

impl Envelope {
    #[must_use]
    pub fn ok(msg: &str) -> Self {
        Self {
            status: 200,
            msg: msg.to_string(),
            obj: Value::Null,
        }
    }

    #[must_use]
    pub fn ok_with(msg: &str, obj: Value) -> Self {
        Self {
            status: 200,
            msg: msg.to_string(),
            obj,
        }
    }

    #[must_use]
    pub fn error(msg: &str) -> Self {
        Self {
            status: 500,
            msg: msg.to_string(),
            obj: Value::Null,
        }
    }
}
