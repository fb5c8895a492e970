use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tipster_db::LedgerRepository;
use tipster_models::{Ledger, ScoredMatch, TipsterError, WorkerRecord};
use tipster_services::{
    AccuracyReport, PipelineMetrics, ReconcileReport, ResultReconciler, Selection, SelectionService,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub selection: Arc<SelectionService>,
    pub reconciler: Arc<ResultReconciler>,
    pub ledger: Arc<LedgerRepository>,
    pub metrics: Arc<PipelineMetrics>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        selection: Arc<SelectionService>,
        reconciler: Arc<ResultReconciler>,
        ledger: Arc<LedgerRepository>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            selection,
            reconciler,
            ledger,
            metrics,
            started_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    fn ok_with(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus {
    Ok,
    NoData,
}

#[derive(Serialize)]
pub struct MatchesPayload {
    pub status: SelectionStatus,
    pub league: String,
    pub provider: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub from_cache: bool,
    pub matches: Vec<ScoredMatch>,
    pub worker: Option<WorkerRecord>,
}

impl MatchesPayload {
    fn no_data(league: String) -> Self {
        Self {
            status: SelectionStatus::NoData,
            league,
            provider: None,
            fetched_at: None,
            from_cache: false,
            matches: Vec::new(),
            worker: None,
        }
    }
}

impl From<Selection> for MatchesPayload {
    fn from(selection: Selection) -> Self {
        Self {
            status: SelectionStatus::Ok,
            league: selection.league,
            provider: Some(selection.provider),
            fetched_at: Some(selection.fetched_at),
            from_cache: selection.from_cache,
            matches: selection.matches,
            worker: selection.worker,
        }
    }
}

#[derive(Serialize)]
pub struct LeagueSummary {
    pub id: String,
    pub name: String,
    pub sport: tipster_models::Sport,
}

#[derive(Deserialize)]
pub struct SelectLeagueRequest {
    pub league_id: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub league_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct RefreshOutcome {
    pub league: String,
    pub status: String,
    pub matches: usize,
    pub provider: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ReconcileRequest {
    pub league_id: Option<String>,
}

#[derive(Serialize)]
pub struct KillAllResponse {
    pub ok: bool,
    pub killed: usize,
}

/// Error side of a handler. `NoDataForLeague` never gets here: handlers turn it into a
/// successful `no_data` payload.
#[derive(Debug)]
pub enum ApiError {
    Tipster(TipsterError),
    BadRequest(String),
    Internal(String),
}

impl From<TipsterError> for ApiError {
    fn from(err: TipsterError) -> Self {
        ApiError::Tipster(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Tipster(err) => match err {
                TipsterError::NoDataForLeague { .. } => StatusCode::NOT_FOUND,
                TipsterError::SelectionSuperseded { .. } => StatusCode::CONFLICT,
                TipsterError::Config(_) | TipsterError::InvalidOdds(_) | TipsterError::InvalidLeagueId(_) => {
                    StatusCode::BAD_REQUEST
                }
                e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Tipster(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ Request failed: {}", self.message());
        }
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            message: Some(self.message()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health and metrics
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))

        // League selection
        .route("/api/v1/leagues", get(list_leagues))
        .route("/api/v1/select-league", post(select_league))
        .route("/api/v1/matches/:league_id", get(get_matches))
        .route("/api/v1/refresh", post(refresh_leagues))

        // Workers
        .route("/api/v1/workers", get(list_workers))
        .route("/api/v1/kill-all", post(kill_all))

        // Ledger and grading
        .route("/api/v1/ledger/:league_id", get(get_ledger))
        .route("/api/v1/accuracy", get(get_accuracy))
        .route("/api/v1/reconcile", post(reconcile))
}

/// Routes plus request tracing and permissive CORS.
pub fn create_app(state: AppState) -> Router {
    create_routes()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now() - state.started_at;
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: format!("{}s", uptime.num_seconds()),
    })
}

async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(format!("metrics encoding failed: {e}")))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

async fn list_leagues(State(state): State<AppState>) -> Json<ApiResponse<Vec<LeagueSummary>>> {
    let leagues = state
        .selection
        .leagues()
        .into_iter()
        .map(|l| LeagueSummary {
            id: l.id,
            name: l.name,
            sport: l.sport,
        })
        .collect();
    ApiResponse::ok(leagues)
}

fn selection_response(league: &str, result: tipster_models::Result<Selection>) -> ApiResult<MatchesPayload> {
    match result {
        Ok(selection) => {
            let count = selection.matches.len();
            Ok(ApiResponse::ok_with(
                MatchesPayload::from(selection),
                format!("{count} matches"),
            ))
        }
        Err(TipsterError::NoDataForLeague { league: normalized }) => Ok(ApiResponse::ok_with(
            MatchesPayload::no_data(normalized),
            format!("No data available for {league}"),
        )),
        Err(e) => Err(e.into()),
    }
}

async fn select_league(
    State(state): State<AppState>,
    Json(request): Json<SelectLeagueRequest>,
) -> ApiResult<MatchesPayload> {
    if request.league_id.trim().is_empty() {
        return Err(ApiError::BadRequest("league_id must not be empty".to_string()));
    }
    info!("🎯 Select league requested: {}", request.league_id);
    let result = state.selection.select(&request.league_id).await;
    selection_response(&request.league_id, result)
}

async fn get_matches(
    Path(league_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<MatchesPayload> {
    let result = state.selection.matches_for(&league_id).await;
    selection_response(&league_id, result)
}

async fn refresh_leagues(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Vec<RefreshOutcome>> {
    let outcomes = state
        .selection
        .select_many(&request.league_ids)
        .await
        .into_iter()
        .map(|(league, result)| match result {
            Ok(selection) => RefreshOutcome {
                league,
                status: "ok".to_string(),
                matches: selection.matches.len(),
                provider: Some(selection.provider),
                error: None,
            },
            Err(TipsterError::NoDataForLeague { .. }) => RefreshOutcome {
                league,
                status: "no_data".to_string(),
                matches: 0,
                provider: None,
                error: None,
            },
            Err(e) => RefreshOutcome {
                league,
                status: "error".to_string(),
                matches: 0,
                provider: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    Ok(ApiResponse::ok(outcomes))
}

async fn list_workers(State(state): State<AppState>) -> Json<ApiResponse<Vec<WorkerRecord>>> {
    ApiResponse::ok(state.selection.workers())
}

async fn kill_all(State(state): State<AppState>) -> Json<KillAllResponse> {
    let killed = state.selection.kill_all().await;
    Json(KillAllResponse { ok: true, killed })
}

/// The ledger exactly as persisted: match day → records.
async fn get_ledger(
    Path(league_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Ledger>, ApiError> {
    let league = tipster_services::normalize_league_id(&league_id);
    Ok(Json(state.ledger.snapshot(&league).await?))
}

async fn get_accuracy(State(state): State<AppState>) -> ApiResult<AccuracyReport> {
    Ok(ApiResponse::ok(state.reconciler.accuracy().await?))
}

async fn reconcile(
    State(state): State<AppState>,
    body: Option<Json<ReconcileRequest>>,
) -> ApiResult<ReconcileReport> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let now = Utc::now();
    let report = match request.league_id {
        Some(league) => {
            let league = tipster_services::normalize_league_id(&league);
            state.reconciler.run_for_league(&league, now).await?
        }
        None => state.reconciler.run(now).await?,
    };
    Ok(ApiResponse::ok(report))
}
