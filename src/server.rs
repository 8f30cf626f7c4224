//! HTTP server for the chat UI and its JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Chat UI |
//! | `GET`  | `/static/script.js` | Chat UI script |
//! | `POST` | `/chat` | Route a message: `{message}` → `{chat: [turn, ...]}` |
//! | `POST` | `/upload` | Multipart PDF in field `pdf` → `{status, message}` |
//! | `POST` | `/clear` | Reset conversation and document → `{status: "cleared"}` |
//! | `GET`  | `/history` | Full conversation log and document status |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! `/chat` rejects bodies that are not JSON with status 400:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "..." } }
//! ```
//!
//! `/upload` always answers 200 with `status: "error"` and a readable
//! message when the file is refused, so the UI can show it as a chat line.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};
use crate::models::ChatTurn;
use crate::router::ChatRouter;

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPT_JS: &str = include_str!("../static/script.js");

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    router: Arc<ChatRouter>,
    /// Directory with UI overrides; built-in assets are used when `None`.
    static_dir: Option<Arc<PathBuf>>,
}

/// Starts the HTTP server on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let router = Arc::new(ChatRouter::from_config(config)?);
    let app = build_app(router, &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        model = %config.llm.model,
        "doc-chat listening on http://{}",
        config.server.bind
    );
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the axum application around an existing router.
pub fn build_app(router: Arc<ChatRouter>, server: &ServerConfig) -> Router {
    let state = AppState {
        router,
        static_dir: server.static_dir.clone().map(Arc::new),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/static/script.js", get(handle_script))
        .route("/chat", post(handle_chat))
        .route("/upload", post(handle_upload))
        .route("/clear", post(handle_clear))
        .route("/history", get(handle_history))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ UI ============

/// Reads `name` from the static override directory, falling back to the
/// built-in copy.
async fn static_asset(state: &AppState, name: &str, builtin: &'static str) -> String {
    if let Some(dir) = &state.static_dir {
        match tokio::fs::read_to_string(dir.join(name)).await {
            Ok(content) => return content,
            Err(e) => tracing::debug!(asset = name, error = %e, "using built-in asset"),
        }
    }
    builtin.to_string()
}

async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(static_asset(&state, "index.html", INDEX_HTML).await)
}

async fn handle_script(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        static_asset(&state, "script.js", SCRIPT_JS).await,
    )
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    chat: Vec<ChatTurn>,
}

async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;
    let reply = state.router.handle(&request.message).await;
    Ok(Json(ChatResponse { chat: reply.turns }))
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    message: String,
}

impl UploadResponse {
    fn success() -> Self {
        Self {
            status: "success",
            message: "📄 PDF uploaded and processed.".to_string(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

/// Pulls the `pdf` field out of the form as `(filename, bytes)`.
async fn read_pdf_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, Vec<u8>)>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("pdf") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some((filename, bytes.to_vec())));
    }
    Ok(None)
}

async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<UploadResponse> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => return Json(UploadResponse::error(format!("Upload failed: {}", e.body_text()))),
    };

    let (filename, bytes) = match read_pdf_field(&mut multipart).await {
        Ok(Some(field)) => field,
        Ok(None) => return Json(UploadResponse::error("Only PDF files are accepted.")),
        Err(e) => return Json(UploadResponse::error(format!("Upload failed: {}", e.body_text()))),
    };

    match state.router.upload(&filename, bytes).await {
        Ok(()) => Json(UploadResponse::success()),
        Err(e) => Json(UploadResponse::error(e.to_string())),
    }
}

// ============ POST /clear ============

#[derive(Serialize)]
struct ClearResponse {
    status: &'static str,
}

async fn handle_clear(State(state): State<AppState>) -> Json<ClearResponse> {
    state.router.clear().await;
    Json(ClearResponse { status: "cleared" })
}

// ============ GET /history ============

#[derive(Serialize)]
struct HistoryResponse {
    chat: Vec<ChatTurn>,
    document: &'static str,
}

async fn handle_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let chat = state.router.history().await;
    let document = state.router.document().await.status();
    Json(HistoryResponse { chat, document })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
