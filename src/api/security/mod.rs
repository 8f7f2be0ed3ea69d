//! Security pipeline run in front of the router: public-path check, session
//! authentication, permission resolution, and the access decision.

mod pattern;
mod resolver;

pub use resolver::PermissionTable;
pub(crate) use resolver::RequiredAccess;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::{Arc, OnceLock};

use crate::api::envelope::Envelope;
use crate::api::handlers::auth::principal::{resolve_principal, Principal};
use pattern::UrlPattern;

/// Paths that bypass the security pipeline entirely.
const PUBLIC_PATTERNS: &[&str] = &[
    "/",
    "/health",
    "/doLogin",
    "/login",
    "/logout",
    "/verifyCode",
    "/favicon.ico",
    "/index.html",
    "/css/**",
    "/js/**",
    "/img/**",
    "/fonts/**",
    "/swagger-ui/**",
    "/v2/api-docs",
];

fn public_patterns() -> &'static Vec<UrlPattern> {
    static PATTERNS: OnceLock<Vec<UrlPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        PUBLIC_PATTERNS
            .iter()
            .map(|pattern| UrlPattern::parse(pattern))
            .collect()
    })
}

pub(crate) fn is_public(path: &str) -> bool {
    public_patterns()
        .iter()
        .any(|pattern| pattern.matches(path))
}

/// Outcome of the access decision.
#[derive(Debug, PartialEq, Eq)]
enum Access {
    Granted,
    LoginRequired,
    Forbidden,
}

/// Compare required access against the (optional) principal.
fn decide(required: &RequiredAccess, principal: Option<&Principal>) -> Access {
    let Some(principal) = principal else {
        return Access::LoginRequired;
    };
    match required {
        RequiredAccess::Authenticated => Access::Granted,
        RequiredAccess::Roles(roles) => {
            if roles.iter().any(|role| principal.has_role(role)) {
                Access::Granted
            } else {
                Access::Forbidden
            }
        }
    }
}

/// Shared state for the security middleware.
#[derive(Clone)]
pub struct SecurityContext {
    pub pool: PgPool,
    pub permissions: Arc<PermissionTable>,
}

/// Middleware guarding every route.
///
/// Public paths skip the pipeline. Everything else resolves the session into
/// a principal, resolves the path's required roles, and decides: 401 for
/// missing sessions, 403 for missing roles. Granted requests carry the
/// principal in their extensions.
pub async fn enforce(
    State(context): State<SecurityContext>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_public(&path) {
        return next.run(request).await;
    }

    let principal = match resolve_principal(&headers, &context.pool).await {
        Ok(principal) => principal,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Envelope::error("请求失败，请联系管理员！")),
            )
                .into_response();
        }
    };

    let required = context.permissions.required_for(&path).await;
    match decide(&required, principal.as_ref()) {
        Access::Granted => {
            if let Some(principal) = principal {
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        }
        Access::LoginRequired => (
            StatusCode::UNAUTHORIZED,
            Json(Envelope::error("尚未登录，请登录")),
        )
            .into_response(),
        Access::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(Envelope::error("权限不足，请联系管理员")),
        )
            .into_response(),
    }
}
