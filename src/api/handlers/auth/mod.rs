//! Auth handlers and supporting modules.
//!
//! Login is a form `POST /doLogin` guarded by a one-time verification code
//! (`GET /verifyCode`). Successful logins are backed by a session row whose
//! token travels in an `HttpOnly` cookie or an `Authorization: Bearer`
//! header; only the SHA-256 hash of the token is stored.

pub(crate) mod login;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;
pub(crate) mod verify_code;

pub use principal::Principal;
pub use state::{AuthConfig, AuthState};
pub use types::OperatorProfile;

pub(crate) use utils::generate_session_token;
