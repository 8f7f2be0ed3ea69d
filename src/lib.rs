//! # VHR (HR Management Backend)
//!
//! `vhr` manages operator ("Hr") records behind a session-based
//! authentication and authorization layer.
//!
//! ## Authentication
//!
//! Login is a form `POST /doLogin` guarded by a one-time verification code
//! issued by `GET /verifyCode`. Passwords are verified with bcrypt; unknown
//! usernames are verified against a fallback hash so the response and timing
//! stay uniform with a wrong password. Account flags are checked in a fixed
//! order (locked, credentials expired, account expired, disabled) and the
//! first failure wins.
//!
//! Successful logins store only the SHA-256 hash of a random session token;
//! the raw token travels in an `HttpOnly` cookie (or an
//! `Authorization: Bearer` header).
//!
//! ## Authorization
//!
//! Request paths are matched against the `permission_rules` table
//! (Ant-style patterns, first match wins). The required roles are
//! intersected with the session's granted roles. Unauthenticated requests
//! answer `401`, authenticated requests without the role answer `403`;
//! unmatched non-public paths require any authenticated principal.
//!
//! ## Responses
//!
//! Every auth outcome and CRUD mutation answers with a uniform envelope
//! `{status, msg, obj}`; collection reads return bare JSON arrays.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
