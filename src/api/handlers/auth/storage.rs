//! Database helpers for operators and sessions.

use anyhow::{anyhow, Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

/// Operator row with granted role names, as read at login.
pub(super) struct OperatorRecord {
    pub(super) id: Uuid,
    pub(super) username: String,
    pub(super) name: String,
    pub(super) phone: Option<String>,
    pub(super) telephone: Option<String>,
    pub(super) address: Option<String>,
    pub(super) user_face: Option<String>,
    pub(super) remark: Option<String>,
    pub(super) password_hash: String,
    pub(super) enabled: bool,
    pub(super) locked: bool,
    pub(super) account_expired: bool,
    pub(super) credentials_expired: bool,
    pub(super) roles: Vec<String>,
}

/// Minimal data returned for a valid session token.
pub(crate) struct SessionRecord {
    pub(crate) operator_id: Uuid,
    pub(crate) username: String,
    pub(crate) roles: Vec<String>,
}

/// Look up an operator and its granted roles by username.
pub(super) async fn lookup_operator(
    pool: &PgPool,
    username: &str,
) -> Result<Option<OperatorRecord>> {
    let query = r"
        SELECT o.id, o.username, o.name, o.phone, o.telephone, o.address,
               o.user_face, o.remark, o.password_hash, o.enabled, o.locked,
               o.account_expired, o.credentials_expired,
               COALESCE(array_agg(r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
        FROM operators o
        LEFT JOIN operator_roles orl ON orl.operator_id = o.id
        LEFT JOIN roles r ON r.id = orl.role_id
        WHERE o.username = $1
        GROUP BY o.id
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup operator")?;

    Ok(row.map(|row| OperatorRecord {
        id: row.get("id"),
        username: row.get("username"),
        name: row.get("name"),
        phone: row.get("phone"),
        telephone: row.get("telephone"),
        address: row.get("address"),
        user_face: row.get("user_face"),
        remark: row.get("remark"),
        password_hash: row.get("password_hash"),
        enabled: row.get("enabled"),
        locked: row.get("locked"),
        account_expired: row.get("account_expired"),
        credentials_expired: row.get("credentials_expired"),
        roles: row.get("roles"),
    }))
}

pub(super) async fn insert_session(
    pool: &PgPool,
    operator_id: Uuid,
    ttl_seconds: i64,
) -> Result<String> {
    // Generate a random token, store only its hash, and return the raw value
    // so the caller can set the session cookie.
    let query = r"
        INSERT INTO operator_sessions (operator_id, session_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(operator_id)
            .bind(token_hash)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

pub(super) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    // Only accept enabled operators and unexpired sessions.
    let query = r"
        SELECT o.id, o.username,
               COALESCE(array_agg(r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
        FROM operator_sessions s
        JOIN operators o ON o.id = s.operator_id
        LEFT JOIN operator_roles orl ON orl.operator_id = o.id
        LEFT JOIN roles r ON r.id = orl.role_id
        WHERE s.session_hash = $1
          AND s.expires_at > NOW()
          AND o.enabled
        GROUP BY o.id
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    if row.is_none() {
        return Ok(None);
    }

    // Record activity for audit visibility without extending the session TTL.
    let query = r"
        UPDATE operator_sessions
        SET last_seen_at = NOW()
        WHERE session_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update session last_seen_at")?;

    Ok(row.map(|row| SessionRecord {
        operator_id: row.get("id"),
        username: row.get("username"),
        roles: row.get("roles"),
    }))
}

pub(super) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM operator_sessions WHERE session_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}
