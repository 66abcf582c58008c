use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    engine::{Action, Engine, EngineError},
    farm::FarmError,
    persistence::PersistenceError,
    render::{catalog_cards, CardView, FarmView},
};

const INDEX_HTML: &str = include_str!("assets/index.html");
const STYLES_CSS: &str = include_str!("assets/styles.css");
const APP_JS: &str = include_str!("assets/app.js");

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<Engine>>,
    broadcaster: broadcast::Sender<String>,
}

pub struct WebServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Serialize)]
struct ActionResponse {
    message: String,
    state: FarmView,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct SelectRequest {
    id: String,
}

#[derive(Deserialize)]
struct ResetRequest {
    #[serde(default)]
    confirm: bool,
}

struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        ApiError(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::Farm(FarmError::IndexOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            EngineError::Farm(_) => StatusCode::CONFLICT,
            EngineError::UnknownCreature(_) => StatusCode::NOT_FOUND,
            EngineError::ResetNotConfirmed => StatusCode::BAD_REQUEST,
            EngineError::Persistence(PersistenceError::StorageUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("[web] {}", self.0);
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<ActionResponse>, ApiError>;

fn app_state(mut engine: Engine) -> AppState {
    let (tx, _) = broadcast::channel::<String>(64);
    let rules = *engine.rules();
    let tx_for_hook = tx.clone();
    engine.add_hook(move |state| {
        let view = FarmView::new(state, &rules);
        if let Ok(payload) = serde_json::to_string(&view) {
            let _ = tx_for_hook.send(payload);
        }
    });
    AppState {
        engine: Arc::new(Mutex::new(engine)),
        broadcaster: tx,
    }
}

pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(current_state))
        .route("/api/catalog", get(catalog))
        .route("/api/select", post(select))
        .route("/api/tap/:index", post(tap))
        .route("/api/advance", post(advance_day))
        .route("/api/save", post(save))
        .route("/api/reset", post(reset))
        .route("/api/events", get(stream_events))
        .with_state(Arc::new(app_state(engine)))
}

pub async fn run(engine: Engine, config: WebServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid address {}:{}", config.host, config.port))?;

    let router = router(engine);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    println!(
        "🌱 DigiFarm live at http://{}:{} (Ctrl+C to stop)",
        config.host, config.port
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("[web] shutting down");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    )
}

fn apply(state: &AppState, action: Action) -> ApiResult {
    let mut engine = state.engine.lock().expect("engine lock poisoned");
    let outcome = engine.apply(action)?;
    Ok(Json(ActionResponse {
        message: outcome.to_string(),
        state: FarmView::new(engine.state(), engine.rules()),
    }))
}

async fn current_state(State(state): State<Arc<AppState>>) -> Json<FarmView> {
    let engine = state.engine.lock().expect("engine lock poisoned");
    Json(FarmView::new(engine.state(), engine.rules()))
}

async fn catalog(State(state): State<Arc<AppState>>) -> Json<Vec<CardView>> {
    let engine = state.engine.lock().expect("engine lock poisoned");
    Json(catalog_cards(engine.catalog()))
}

async fn select(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> ApiResult {
    apply(&state, Action::Select { id: request.id })
}

async fn tap(State(state): State<Arc<AppState>>, Path(index): Path<usize>) -> ApiResult {
    apply(&state, Action::Tap { index })
}

async fn advance_day(State(state): State<Arc<AppState>>) -> ApiResult {
    apply(&state, Action::AdvanceDay)
}

async fn save(State(state): State<Arc<AppState>>) -> ApiResult {
    apply(&state, Action::Save)
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetRequest>,
) -> ApiResult {
    apply(
        &state,
        Action::Reset {
            confirmed: request.confirm,
        },
    )
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
