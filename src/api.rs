//! HTTP surface: the Telegram webhook, a health probe, and a token-gated
//! diagnostics endpoint.
//!
//! The webhook always acknowledges with 200 — Telegram redelivers on
//! anything else, and a redelivery storm is worse than a dropped update.
//! Processing failures are logged, never surfaced to the transport.

use crate::engine::ConversationEngine;
use crate::telegram::{TelegramClient, Update};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state behind every handler.
pub struct ApiState {
    pub engine: ConversationEngine,
    pub telegram: TelegramClient,
    /// Token gating `/debug/webhook`. Unset disables the endpoint.
    pub admin_token: Option<String>,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(health).post(webhook))
        .route("/debug/webhook", get(debug_webhook))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK - Bot server running"
}

/// Inbound update handler. Parses leniently: a malformed body or an update
/// without a usable message is acknowledged and dropped.
async fn webhook(State(state): State<Arc<ApiState>>, body: Bytes) -> StatusCode {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(error) => {
            tracing::debug!(%error, "ignoring malformed update payload");
            return StatusCode::OK;
        }
    };

    let Some(message) = update.message() else {
        tracing::debug!(update_id = update.update_id, "update carries no message");
        return StatusCode::OK;
    };
    let Some(chat_id) = message.chat_id() else {
        tracing::debug!(update_id = update.update_id, "message carries no chat id");
        return StatusCode::OK;
    };

    let actions = state.engine.handle(chat_id, message.text_or_caption()).await;
    for action in &actions {
        // Send failures are logged and skipped; the remaining actions still
        // go out and the webhook still acknowledges.
        if let Err(error) = state.telegram.deliver(chat_id, action).await {
            tracing::error!(chat_id, %error, "failed to deliver reply");
        }
    }

    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct DebugQuery {
    token: Option<String>,
}

/// Read-only diagnostics: proxies Telegram's `getWebhookInfo` so an
/// operator can check webhook registration without holding the bot token.
async fn debug_webhook(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<DebugQuery>,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return (StatusCode::FORBIDDEN, "admin token not configured").into_response();
    };
    if query.token.as_deref() != Some(expected) {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    match state.telegram.get_webhook_info().await {
        Ok(info) => Json(info).into_response(),
        Err(error) => {
            tracing::warn!(%error, "getWebhookInfo failed");
            (StatusCode::BAD_GATEWAY, "telegram api error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerateError, Result};
    use crate::llm::ScriptGenerator;
    use crate::store::InMemoryUserStore;
    use crate::{ContentType, Language};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt as _;

    /// Stub that must never be reached by these tests.
    struct UnusedGenerator;

    #[async_trait]
    impl ScriptGenerator for UnusedGenerator {
        async fn generate(&self, _: ContentType, _: Language) -> Result<String> {
            Err(GenerateError::EmptyCompletion.into())
        }
    }

    fn test_router(admin_token: Option<&str>) -> Router {
        let engine = ConversationEngine::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(UnusedGenerator),
        );
        let telegram = TelegramClient::new("test-token").unwrap();
        router(Arc::new(ApiState {
            engine,
            telegram,
            admin_token: admin_token.map(str::to_owned),
        }))
    }

    fn post_update(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = test_router(None)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_update_is_acknowledged() {
        let response = test_router(None)
            .oneshot(post_update("this is not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn update_without_message_is_acknowledged() {
        let response = test_router(None)
            .oneshot(post_update(r#"{"update_id": 12}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn message_without_chat_id_is_acknowledged() {
        let response = test_router(None)
            .oneshot(post_update(r#"{"message": {"text": "/trend"}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn debug_endpoint_is_forbidden_without_configured_token() {
        let response = test_router(None)
            .oneshot(
                Request::builder()
                    .uri("/debug/webhook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn debug_endpoint_rejects_wrong_token() {
        let response = test_router(Some("secret"))
            .oneshot(
                Request::builder()
                    .uri("/debug/webhook?token=wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
