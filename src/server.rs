//! HTTP service for front ends that capture speech in the browser.
//!
//! ## Endpoints
//!
//! - `POST /api/tts`: `{ text }` in, `audio/mpeg` bytes out
//! - `POST /api/chat`: utterance plus dialogue context in, one resolved action out
//! - `GET /api/health`: liveness

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ConfigError, RenderError};
use crate::kernel::event::{stringify_form, ResolvedAction};
use crate::kernel::state::{HistoryEntry, Language, View};
use crate::services::llm::provider::http_client;
use crate::services::llm::resolver::apology_action;
use crate::services::llm::{IntentResolver, ResolutionContext};
use crate::services::tts::{ElevenLabsSynthesizer, SpeechSynthesizer};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    #[serde(default)]
    pub view: Option<String>,
    /// Raw JSON values; numbers and booleans are stringified, nulls dropped.
    #[serde(default)]
    pub form_data: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub context: ChatContext,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl ChatRequest {
    fn resolution_context(&self) -> ResolutionContext {
        let view = match self.context.view.as_deref() {
            Some(raw) => raw.parse::<View>().unwrap_or_else(|()| {
                warn!(view = raw, "unknown view in chat context; assuming default");
                View::default()
            }),
            None => View::default(),
        };
        let language = self
            .lang
            .as_deref()
            .and_then(|raw| raw.parse::<Language>().ok())
            .unwrap_or_default();

        ResolutionContext {
            view,
            language,
            form_data: stringify_form(self.context.form_data.clone()),
            history: self.history.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Collaborators are built once; a missing credential is kept as the error
/// and reported on every request that needs it.
#[derive(Clone)]
pub struct AppState {
    resolver: Result<Arc<IntentResolver>, ConfigError>,
    synthesizer: Result<Arc<dyn SpeechSynthesizer>, ConfigError>,
}

impl AppState {
    pub fn new(
        resolver: Result<IntentResolver, ConfigError>,
        synthesizer: Result<Arc<dyn SpeechSynthesizer>, ConfigError>,
    ) -> Self {
        Self {
            resolver: resolver.map(Arc::new),
            synthesizer,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let resolver = IntentResolver::from_config(config);
        if let Err(e) = &resolver {
            warn!(error = %e, "chat endpoint will reject requests until configured");
        }

        let synthesizer = ElevenLabsSynthesizer::new(http_client(config.provider_timeout), &config.tts)
            .map(|s| Arc::new(s) as Arc<dyn SpeechSynthesizer>);
        if let Err(e) = &synthesizer {
            warn!(error = %e, "tts endpoint will reject requests until configured");
        }

        Self::new(resolver, synthesizer)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/tts", post(handle_tts))
        .route("/api/chat", post(handle_chat))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// ApiServer
// ---------------------------------------------------------------------------

pub struct ApiServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Binds `bind_addr` (port `0` picks a free port) and serves in a
    /// background task.
    pub async fn start(state: AppState, bind_addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let app = router(state);

        info!("API server listening on http://{addr}/api");

        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(token.cancelled_owned());
            if let Err(e) = serve.await {
                error!("API server error: {e}");
            }
        });

        Ok(Self {
            addr,
            shutdown,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Err(e) = (&mut self.handle).await {
            warn!("API server task ended abnormally: {e}");
        }
    }

    /// Resolves when the serve task exits on its own. Do not call
    /// [`shutdown`](Self::shutdown) afterwards.
    pub async fn wait(&mut self) {
        if let Err(e) = (&mut self.handle).await {
            warn!("API server task ended abnormally: {e}");
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/tts`
async fn handle_tts(State(state): State<AppState>, Json(request): Json<TtsRequest>) -> Response {
    let Some(text) = request.text.filter(|t| !t.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Text is required" }))).into_response();
    };

    let synthesizer = match &state.synthesizer {
        Ok(s) => Arc::clone(s),
        Err(e) => {
            error!(error = %e, "tts request without credentials");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Server configuration error", "details": e.to_string() })),
            )
                .into_response();
        }
    };

    // The multilingual voice model does not need the locale.
    match synthesizer.synthesize(&text, Language::default()).await {
        Ok(audio) => ([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response(),
        Err(RenderError::Status { status, body }) => {
            error!(status, "upstream TTS error");
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (code, Json(json!({ "error": "TTS Failed", "details": body }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "server TTS error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal Server Error" })),
            )
                .into_response()
        }
    }
}

/// `POST /api/chat`
async fn handle_chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let ctx = request.resolution_context();

    let resolver = match &state.resolver {
        Ok(r) => Arc::clone(r),
        Err(e) => {
            error!(error = %e, "chat request without credentials");
            let action = ResolvedAction::error(
                crate::outputs::phrases::apology(ctx.language),
                "Server configuration error: Missing API Key",
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(action)).into_response();
        }
    };

    match resolver.resolve(&request.transcript, &ctx).await {
        Ok(resolved) => Json(resolved).into_response(),
        Err(e) => {
            error!(error = %e, "chat resolution failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(apology_action(&ctx))).into_response()
        }
    }
}
