use axum::response::IntoResponse;

use crate::APP_USER_AGENT;

/// `GET /` answers the service banner, useful as a liveness probe.
pub async fn root() -> impl IntoResponse {
    APP_USER_AGENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn root_answers_banner() -> Result<()> {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(bytes, APP_USER_AGENT.as_bytes());
        Ok(())
    }
}
