//! HTTP gateway for seomagic.
//!
//! Exposes the chat endpoint backing the Telegram Mini App, thin pass-through
//! endpoints over the remote task API, a health check and static assets.
//!
//! Built on Axum.

pub mod api;
pub mod frontend;

use axum::Router;
use axum::http::HeaderValue;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use seomagic_agent::AgentLoop;
use seomagic_config::AppConfig;
use seomagic_store::InMemoryConversationStore;
use seomagic_tools::{CatalogError, TaskApiClient, TaskToolkit};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub store: Arc<InMemoryConversationStore>,
    /// Present only when both the model key and the task API key are set
    pub agent: Option<Arc<AgentLoop>>,
    /// Present when the task API key is set
    pub toolkit: Option<Arc<TaskToolkit>>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(
        config: AppConfig,
        store: Arc<InMemoryConversationStore>,
        agent: Option<Arc<AgentLoop>>,
        toolkit: Option<Arc<TaskToolkit>>,
    ) -> Self {
        Self {
            config,
            store,
            agent,
            toolkit,
        }
    }

    /// Build every subsystem from config. Missing keys disable the parts
    /// that need them instead of failing startup.
    pub fn from_config(config: AppConfig) -> Result<Self, CatalogError> {
        let store = Arc::new(InMemoryConversationStore::with_limit(
            config.agent.history_limit,
        ));

        let toolkit = TaskApiClient::from_config(&config.remote)
            .map(TaskToolkit::new)
            .transpose()?
            .map(Arc::new);

        let provider = seomagic_providers::build_from_config(&config);
        let agent = match (provider, &toolkit) {
            (Some(provider), Some(toolkit)) => Some(Arc::new(AgentLoop::from_config(
                &config,
                provider,
                toolkit.clone(),
                store.clone(),
            ))),
            _ => None,
        };

        Ok(Self::new(config, store, agent, toolkit))
    }
}

/// Build the router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);
    let static_dir = state.config.gateway.static_dir.clone();

    Router::new()
        .merge(api::api_router())
        .merge(frontend::frontend_router(&static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `"*"` allows any origin; otherwise only the listed origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(GatewayState::from_config(config)?);
    if !state.config.has_model_key() {
        warn!("ANTHROPIC_API_KEY not configured; /api/chat will fail");
    }
    if state.toolkit.is_none() {
        warn!("JUSTMAGIC_API_KEY not configured; task endpoints will fail");
    }

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use seomagic_core::error::ProviderError;
    use seomagic_core::message::ContentBlock;
    use seomagic_core::provider::{ModelRequest, ModelResponse, Provider, StopReason};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
            let last = request.turns.last().map(|t| t.text()).unwrap_or_default();
            Ok(ModelResponse {
                content: vec![ContentBlock::Text {
                    text: format!("echo: {last}"),
                }],
                stop_reason: StopReason::EndTurn,
                model: "mock-model".into(),
                usage: None,
            })
        }
    }

    fn toolkit(url: &str) -> Arc<TaskToolkit> {
        let client = TaskApiClient::new(url, "k", Duration::from_secs(5));
        Arc::new(TaskToolkit::new(client).unwrap())
    }

    fn state_with(url: Option<&str>) -> SharedState {
        let mut config = AppConfig::default();
        config.anthropic_api_key = Some("test-key".into());
        let store = Arc::new(InMemoryConversationStore::new());
        let toolkit = url.map(toolkit);
        let agent = toolkit.as_ref().map(|t| {
            Arc::new(AgentLoop::new(
                Arc::new(EchoProvider),
                t.clone(),
                store.clone(),
                "mock-model",
            ))
        });
        Arc::new(GatewayState::new(config, store, agent, toolkit))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(state_with(None));

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["anthropic_configured"], true);
        assert_eq!(json["justmagic_configured"], false);
        assert_eq!(json["telegram_configured"], false);
    }

    #[tokio::test]
    async fn chat_without_task_key_is_500() {
        let app = build_router(state_with(None));

        let response = app
            .oneshot(post_json("/api/chat", json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "JUSTMAGIC_API_KEY not configured");
    }

    #[tokio::test]
    async fn chat_generates_conversation_id() {
        let app = build_router(state_with(Some("http://127.0.0.1:9")));

        let response = app
            .oneshot(post_json("/api/chat", json!({"message": "hello", "user_id": "42"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["response"], "echo: hello");
        assert!(json["tool_calls"].is_null());
        assert!(json["conversation_id"].as_str().unwrap().starts_with("conv_42_"));
    }

    #[tokio::test]
    async fn chat_continues_conversation_and_clear_resets_it() {
        let state = state_with(Some("http://127.0.0.1:9"));
        let id = seomagic_core::message::ConversationId::from("conv_test");

        let app = build_router(state.clone());
        let response = app
            .oneshot(post_json(
                "/api/chat",
                json!({"message": "first", "conversation_id": "conv_test"}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["conversation_id"], "conv_test");

        use seomagic_core::store::ConversationStore;
        assert_eq!(state.store.get(&id).await.unwrap().len(), 2);

        let app = build_router(state.clone());
        let req = Request::builder()
            .method("POST")
            .uri("/api/clear?conversation_id=conv_test")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
        assert!(state.store.get(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let app = build_router(state_with(Some("http://127.0.0.1:9")));
        let response = app
            .oneshot(post_json("/api/chat", json!({"message": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "schema_error");
    }

    #[tokio::test]
    async fn list_tasks_passes_clamped_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("name=\"limit\"\r\n\r\n100\r\n"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"err": 0, "tasks": [{"tid": 1}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let app = build_router(state_with(Some(&server.uri())));
        let req = Request::builder()
            .uri("/api/tasks?limit=500")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["tasks"][0]["tid"], 1);
    }

    #[tokio::test]
    async fn get_task_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("name=\"tid\"\r\n\r\n4821\r\n"))
            .and(body_string_contains("name=\"mode\"\r\n\r\ninfo\r\n"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"err": 0, "status": "done"})),
            )
            .mount(&server)
            .await;

        let app = build_router(state_with(Some(&server.uri())));
        let req = Request::builder()
            .uri("/api/tasks/4821")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "done");
    }

    #[tokio::test]
    async fn account_remote_error_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"err": 1, "errtxt": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let app = build_router(state_with(Some(&server.uri())));
        let req = Request::builder()
            .uri("/api/account")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["kind"], "api_error");
        assert_eq!(json["error"], "Invalid API key");
    }

    #[test]
    fn from_config_without_keys_disables_subsystems() {
        let state = GatewayState::from_config(AppConfig::default()).unwrap();
        assert!(state.agent.is_none());
        assert!(state.toolkit.is_none());
    }

    #[test]
    fn cors_accepts_explicit_origins() {
        // Invalid origins are skipped rather than failing startup.
        let _layer = cors_layer(&["https://t.me".into(), "bad\norigin".into()]);
    }
}
