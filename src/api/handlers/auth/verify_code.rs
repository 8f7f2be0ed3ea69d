//! Verification code endpoint and challenge cookie helpers.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, CONTENT_TYPE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{state::AuthState, utils::generate_verify_code};

const CHALLENGE_COOKIE_NAME: &str = "vhr_verify";

#[utoipa::path(
    get,
    path = "/verifyCode",
    responses(
        (status = 200, description = "SVG rendering of a fresh verification code", content_type = "image/svg+xml")
    ),
    tag = "auth"
)]
pub async fn verify_code(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let code = generate_verify_code();
    let challenge_id = auth_state.verify_codes().store_code(code.clone()).await;

    let mut headers = HeaderMap::new();
    match challenge_cookie(&auth_state, challenge_id) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build challenge cookie: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));

    (StatusCode::OK, headers, render_code_svg(&code)).into_response()
}

/// Bind the browser to its issued code via a random challenge id. The code
/// itself never travels to the client in readable form.
fn challenge_cookie(
    auth_state: &AuthState,
    challenge_id: Uuid,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = auth_state.config().session_cookie_secure();
    let mut cookie =
        format!("{CHALLENGE_COOKIE_NAME}={challenge_id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the challenge id set by `GET /verifyCode` from the request cookies.
pub(super) fn extract_challenge_id(headers: &HeaderMap) -> Option<Uuid> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == CHALLENGE_COOKIE_NAME {
            return Uuid::parse_str(val).ok();
        }
    }
    None
}

/// Render the code as a small SVG tile.
///
/// The code alphabet is alphanumeric, so glyphs can be inlined without
/// escaping. Each glyph is tilted by an angle derived from the glyph itself,
/// keeping the rendering deterministic.
fn render_code_svg(code: &str) -> String {
    let glyphs: String = code
        .chars()
        .enumerate()
        .map(|(position, glyph)| {
            let x = 14 + position * 20;
            let angle = i64::from(u32::from(glyph) % 21) - 10;
            format!(
                r##"<text x="{x}" y="28" font-family="monospace" font-size="24" fill="#365" transform="rotate({angle} {x} 20)">{glyph}</text>"##
            )
        })
        .collect();
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="40"><rect width="100" height="40" fill="#eef"/>{glyphs}</svg>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::api::handlers::auth::utils::CODE_LENGTH;

    #[test]
    fn extract_challenge_id_parses_cookie() {
        let challenge_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        let value = format!("lang=zh; vhr_verify={challenge_id}");
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&value).unwrap(),
        );
        assert_eq!(extract_challenge_id(&headers), Some(challenge_id));
    }

    #[test]
    fn extract_challenge_id_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("vhr_verify=not-a-uuid"),
        );
        assert_eq!(extract_challenge_id(&headers), None);

        let headers = HeaderMap::new();
        assert_eq!(extract_challenge_id(&headers), None);
    }

    #[test]
    fn challenge_cookie_is_http_only() {
        let state = AuthState::new(
            AuthConfig::new("http://localhost:8080".to_string()),
            "$2b$04$fallback".to_string(),
        );
        let cookie = challenge_cookie(&state, Uuid::nil());
        let value = cookie.ok().and_then(|c| c.to_str().ok().map(String::from));
        let value = value.unwrap_or_default();
        assert!(value.starts_with("vhr_verify="));
        assert!(value.contains("HttpOnly"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn render_code_svg_inlines_glyphs() {
        let svg = render_code_svg("aB3x");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<text").count(), CODE_LENGTH);
        for glyph in "aB3x".chars() {
            assert!(svg.contains(&format!(">{glyph}</text>")));
        }
    }
}
