use crate::analytics::{
    bucketize, compute_statistics, sector_breakdown, IncidentStatistics, Interval, SectorSummary,
    TimeBucket,
};
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{gather_metrics, INCIDENTS_INGESTED_TOTAL, STATUS_TRANSITIONS_TOTAL};
use crate::models::*;
use crate::query::{paginate, FilterParams, IncidentFilter, PageRequest};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.storage.clone(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub uptime_seconds: u64,
}

/// Prometheus metrics endpoint
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Envelope for single-record responses
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Ingest an incident from the detection pipeline
pub async fn create_incident(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewIncident>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Incident>>)> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    request.validate()?;

    let incident = Incident::from_request(request, Utc::now());
    state.store.save_incident(&incident).await?;

    INCIDENTS_INGESTED_TOTAL
        .with_label_values(&[
            incident.incident_type.to_string().as_str(),
            incident.severity.to_string().as_str(),
        ])
        .inc();

    tracing::info!(
        incident_id = %incident.id,
        incident_type = %incident.incident_type,
        severity = %incident.severity,
        sector = %incident.sector,
        "Incident recorded"
    );

    Ok((StatusCode::CREATED, DataResponse::ok(incident)))
}

#[derive(Debug, Deserialize)]
pub struct ListIncidentsQuery {
    #[serde(flatten)]
    pub filter: FilterParams,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IncidentListResponse {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub data: Vec<Incident>,
}

/// List incidents, newest first, one page at a time
pub async fn list_incidents(
    State(state): State<AppState>,
    _actor: Actor,
    query: std::result::Result<Query<ListIncidentsQuery>, QueryRejection>,
) -> Result<Json<IncidentListResponse>> {
    let Query(query) = query.map_err(query_error)?;
    let filter = IncidentFilter::from_params(&query.filter)?;
    let request = PageRequest::parse(query.page.as_deref(), query.limit.as_deref(), &state.api)?;

    let page = paginate(state.store.as_ref(), &filter, request).await?;

    Ok(Json(IncidentListResponse {
        success: true,
        count: page.count(),
        total: page.total,
        page: page.page,
        pages: page.pages,
        data: page.items,
    }))
}

/// Malformed query strings get the standard error body
fn query_error(rejection: QueryRejection) -> AppError {
    AppError::InvalidFilter(rejection.body_text())
}

/// Path ids that are not UUIDs cannot name an existing incident
fn incident_id(path: std::result::Result<Path<Uuid>, PathRejection>) -> Result<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("Incident not found".to_string()))
}

async fn load_incident(state: &AppState, id: &Uuid) -> Result<Incident> {
    state
        .store
        .get_incident(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))
}

/// Get incident by ID
pub async fn get_incident(
    State(state): State<AppState>,
    _actor: Actor,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DataResponse<Incident>>> {
    let id = incident_id(path)?;
    let incident = load_incident(&state, &id).await?;
    Ok(DataResponse::ok(incident))
}

/// Update status and resolution notes
pub async fn update_incident(
    State(state): State<AppState>,
    actor: Actor,
    path: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<IncidentUpdate>, JsonRejection>,
) -> Result<Json<DataResponse<Incident>>> {
    actor.require(UserRole::Operator)?;

    let id = incident_id(path)?;
    let Json(update) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    update.validate()?;

    let mut incident = load_incident(&state, &id).await?;
    let transition = incident.apply_update(update, &actor.user_id, Utc::now());
    state.store.update_incident(&incident).await?;

    if let Some(transition) = transition {
        STATUS_TRANSITIONS_TOTAL
            .with_label_values(&[
                transition.from.to_string().as_str(),
                transition.to.to_string().as_str(),
            ])
            .inc();

        tracing::info!(
            incident_id = %incident.id,
            user_id = %actor.user_id,
            from = %transition.from,
            to = %transition.to,
            resolution_stamped = transition.resolution_stamped,
            "Incident status changed"
        );
    }

    Ok(DataResponse::ok(incident))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Remove an incident permanently
pub async fn delete_incident(
    State(state): State<AppState>,
    actor: Actor,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    actor.require(UserRole::Admin)?;

    let id = incident_id(path)?;
    load_incident(&state, &id).await?;
    state.store.delete_incident(&id).await?;

    tracing::info!(incident_id = %id, user_id = %actor.user_id, "Incident removed");

    Ok(Json(MessageResponse {
        success: true,
        message: "Incident removed".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub sector: Option<String>,
}

impl StatsQuery {
    fn filter(&self) -> Result<IncidentFilter> {
        IncidentFilter::from_params(&FilterParams {
            from: self.from.clone(),
            to: self.to.clone(),
            sector: self.sector.clone(),
            ..Default::default()
        })
    }
}

/// Overall counts and percentages
pub async fn get_statistics(
    State(state): State<AppState>,
    _actor: Actor,
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<DataResponse<IncidentStatistics>>> {
    let Query(query) = query.map_err(query_error)?;
    let filter = query.filter()?;
    let stats = compute_statistics(state.store.as_ref(), &filter).await?;
    Ok(DataResponse::ok(stats))
}

#[derive(Debug, Deserialize)]
pub struct SectorQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SectorBreakdownResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<SectorSummary>,
}

/// Per-sector counts, busiest sector first
pub async fn get_sector_breakdown(
    State(state): State<AppState>,
    _actor: Actor,
    query: std::result::Result<Query<SectorQuery>, QueryRejection>,
) -> Result<Json<SectorBreakdownResponse>> {
    let Query(query) = query.map_err(query_error)?;
    let filter = IncidentFilter::from_params(&FilterParams {
        from: query.from,
        to: query.to,
        ..Default::default()
    })?;

    let sectors = sector_breakdown(state.store.as_ref(), &filter).await?;

    Ok(Json(SectorBreakdownResponse {
        success: true,
        count: sectors.len(),
        data: sectors,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    pub interval: Option<String>,
    #[serde(flatten)]
    pub range: StatsQuery,
}

#[derive(Debug, Serialize)]
pub struct TimeSeriesResponse {
    pub success: bool,
    pub interval: Interval,
    pub count: usize,
    pub data: Vec<TimeBucket>,
}

/// Incident counts per calendar bucket, oldest bucket first
pub async fn get_time_series(
    State(state): State<AppState>,
    _actor: Actor,
    query: std::result::Result<Query<TimeSeriesQuery>, QueryRejection>,
) -> Result<Json<TimeSeriesResponse>> {
    let Query(query) = query.map_err(query_error)?;
    // Reject a bad interval before touching the store
    let interval = Interval::parse(query.interval.as_deref())?;
    let filter = query.range.filter()?;

    let buckets = bucketize(state.store.as_ref(), &filter, interval).await?;

    Ok(Json(TimeSeriesResponse {
        success: true,
        interval,
        count: buckets.len(),
        data: buckets,
    }))
}
