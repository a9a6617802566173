//! Axum-based HTTP server with OpenAPI (utoipa) and Swagger UI
//!
//! Translates the DOM-boundary events of the viewer (mode toggle, manual
//! angle submit, model dropdown) into panel commands, exposes the panel
//! snapshot, and streams redraw frames to the rendering layer over SSE.

use crate::config::Config;
use crate::panel::{PanelCommand, PanelSnapshot, UpdateMode};
use crate::phase;
use axum::response::Redirect;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, get_service, post},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::StreamExt;
use tower_http::services::ServeDir;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
pub struct AppState {
    /// Command channel into the panel driver
    pub commands: mpsc::UnboundedSender<PanelCommand>,

    /// Latest published panel snapshot
    pub snapshot_rx: watch::Receiver<Arc<PanelSnapshot>>,

    /// Redraw frame stream (SSE fan-out)
    pub frames: broadcast::Sender<String>,

    /// Loaded configuration
    pub config: Arc<Config>,
}

#[derive(Deserialize, ToSchema)]
pub struct ModeBody {
    pub mode: UpdateMode,
}

/// The manual input field submits raw text; numbers are accepted too
#[derive(Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AngleValue {
    Number(f64),
    Text(String),
}

impl AngleValue {
    fn as_raw(&self) -> String {
        match self {
            AngleValue::Number(n) => n.to_string(),
            AngleValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AngleBody {
    pub angle: AngleValue,
}

#[derive(Deserialize, ToSchema)]
pub struct ModelBody {
    pub id: String,
}

#[utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
))]
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("APP_VERSION"),
        })),
    )
}

#[utoipa::path(get, path = "/api/status", responses(
    (status = 200, description = "Current panel snapshot")
))]
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json((*snapshot).clone())
}

#[utoipa::path(get, path = "/api/phase", responses(
    (status = 200, description = "Latest reading in the upstream wire shape")
))]
async fn phase_value(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json(serde_json::json!({ "angle": snapshot.angle }))
}

#[utoipa::path(post, path = "/api/mode", request_body = ModeBody, responses((status = 200)))]
async fn set_mode(State(state): State<AppState>, Json(body): Json<ModeBody>) -> impl IntoResponse {
    let _ = state.commands.send(PanelCommand::SetMode(body.mode));
    (StatusCode::OK, Json(serde_json::json!({"ok": true})))
}

#[utoipa::path(post, path = "/api/angle", request_body = AngleBody, responses(
    (status = 200, description = "Angle accepted"),
    (status = 409, description = "Panel is not in manual mode"),
    (status = 422, description = "Input is not a finite number"),
))]
async fn submit_angle(
    State(state): State<AppState>,
    Json(body): Json<AngleBody>,
) -> impl IntoResponse {
    let raw = body.angle.as_raw();

    let parsed = match phase::parse_angle(&raw) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({"error": e.to_string()})),
            );
        }
    };

    // The driver re-checks on apply; this check gives the submitter an
    // immediate answer instead of a silently dropped command.
    let mode = state.snapshot_rx.borrow().mode;
    if mode != UpdateMode::Manual {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "Panel is in automatic mode"})),
        );
    }

    let _ = state.commands.send(PanelCommand::SubmitAngle(raw));
    (
        StatusCode::OK,
        Json(serde_json::json!({"ok": true, "angle": parsed})),
    )
}

#[utoipa::path(get, path = "/api/models", responses(
    (status = 200, description = "Model catalog and active selection")
))]
async fn models(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.snapshot_rx.borrow().model.clone();
    Json(serde_json::json!({
        "models": state.config.models.items,
        "default_model": state.config.models.default_model,
        "active": active,
    }))
}

#[utoipa::path(post, path = "/api/model", request_body = ModelBody, responses(
    (status = 200, description = "Selection queued"),
    (status = 404, description = "Unknown model id"),
))]
async fn select_model(
    State(state): State<AppState>,
    Json(body): Json<ModelBody>,
) -> impl IntoResponse {
    if !state.config.models.items.iter().any(|m| m.id == body.id) {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("Unknown model '{}'", body.id)})),
        );
    }
    let _ = state.commands.send(PanelCommand::SelectModel(body.id));
    (StatusCode::OK, Json(serde_json::json!({"ok": true})))
}

#[utoipa::path(get, path = "/api/config", responses((status = 200)))]
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let json = serde_json::to_value(state.config.as_ref())
        .unwrap_or(serde_json::json!({"error": "serialization"}));
    Json(json)
}

#[utoipa::path(get, path = "/api/config/schema", responses((status = 200)))]
async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error": "schema"})))
}

#[utoipa::path(get, path = "/api/events", responses(
    (status = 200, description = "SSE stream of panel redraw frames")
))]
async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.frames.subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok::<Event, std::convert::Infallible>(
            Event::default().event("panel").data(payload),
        )),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health, status, phase_value, set_mode, submit_angle,
        models, select_model, get_config, get_config_schema, events,
    ),
    components(schemas(ModeBody, AngleBody, AngleValue, ModelBody, UpdateMode)),
    tags((name = "orrery", description = "Orrery digital twin viewer API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let openapi = ApiDoc::openapi();
    let ui_dir = state.config.web.ui_dir.clone();

    Router::new()
        .route("/", get(|| async { Redirect::to("/ui/index.html") }))
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/phase", get(phase_value))
        .route("/api/mode", post(set_mode))
        .route("/api/angle", post(submit_angle))
        .route("/api/models", get(models))
        .route("/api/model", post(select_model))
        .route("/api/config", get(get_config))
        .route("/api/config/schema", get(get_config_schema))
        .route("/api/events", get(events))
        .nest_service(
            "/ui",
            get_service(ServeDir::new(ui_dir).append_index_html_on_directories(true)),
        )
        .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let (addr, parsed_ok): (SocketAddr, bool) = match host.parse::<IpAddr>() {
        Ok(ip) => (SocketAddr::new(ip, port), true),
        Err(_) => (([127, 0, 0, 1], port).into(), false),
    };
    if !parsed_ok {
        logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
    }

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (UI /ui, API /api, docs /docs)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
