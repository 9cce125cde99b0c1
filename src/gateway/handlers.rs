//! Transfer endpoints
//!
//! Thin wrappers: parse the path and actor, call the coordinator, wrap the
//! result in the response envelope.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;

use super::state::AppState;
use super::types::{
    ActorHeader, ApiError, ApiResult, HealthResponse, PayslipData, ok, parse_transfer_id,
};
use crate::gratuity::GratuityBreakdown;
use crate::models::PostedEntry;
use crate::transfer::{Actor, LeaveSummary, TransferDraft, TransferId, TransferRequest};

/// Lifecycle actions reachable through `POST /transfers/{id}/{action}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferAction {
    Submit,
    Approve,
    Reject,
    Cancel,
    Execute,
    Reverse,
    Draft,
    Probation,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check() -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        timestamp_ms: Utc::now().timestamp_millis(),
    })
}

/// Draft a transfer request
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body(content = String, description = "Transfer draft: employee_id, kind, mode, dates, destination", content_type = "application/json"),
    responses(
        (status = 200, description = "Transfer drafted", content_type = "application/json"),
        (status = 400, description = "Invalid dates or destination"),
        (status = 401, description = "Actor headers missing"),
        (status = 422, description = "Employee record incomplete")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    ActorHeader(actor): ActorHeader,
    Json(draft): Json<TransferDraft>,
) -> ApiResult<TransferRequest> {
    ok(state.coordinator.create(draft, &actor).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}",
    params(("id" = String, Path, description = "Transfer id (ULID)")),
    responses(
        (status = 200, description = "Transfer request", content_type = "application/json"),
        (status = 400, description = "Invalid transfer id"),
        (status = 401, description = "Actor headers missing"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    ActorHeader(actor): ActorHeader,
    Path(id): Path<String>,
) -> ApiResult<TransferRequest> {
    let id = parse_transfer_id(&id)?;
    log_read(id, &actor, "transfer");
    ok(state.coordinator.get(id).await?)
}

/// Run a lifecycle transition
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/{action}",
    params(
        ("id" = String, Path, description = "Transfer id (ULID)"),
        ("action" = String, Path, description = "submit | approve | reject | cancel | execute | reverse | draft | probation")
    ),
    responses(
        (status = 200, description = "Transfer after the transition", content_type = "application/json"),
        (status = 400, description = "Business rule violated"),
        (status = 403, description = "Actor not allowed"),
        (status = 404, description = "Transfer not found"),
        (status = 409, description = "Transition not allowed from the current state")
    ),
    tag = "Transfer"
)]
pub async fn transfer_action(
    State(state): State<Arc<AppState>>,
    ActorHeader(actor): ActorHeader,
    Path((id, action)): Path<(String, String)>,
) -> ApiResult<TransferRequest> {
    let id = parse_transfer_id(&id)?;
    let action: TransferAction =
        serde_json::from_value(serde_json::Value::String(action.clone()))
            .map_err(|_| ApiError::bad_request(format!("Unknown action: {action}")))?;
    tracing::debug!(transfer_id = %id, ?action, user_id = actor.user_id, "Transfer action");

    let c = &state.coordinator;
    let request = match action {
        TransferAction::Submit => c.submit(id, &actor).await?,
        TransferAction::Approve => c.approve(id, &actor).await?,
        TransferAction::Reject => c.reject(id, &actor).await?,
        TransferAction::Cancel => c.cancel(id, &actor).await?,
        TransferAction::Execute => c.execute_transfer(id, &actor).await?,
        TransferAction::Reverse => c.reverse_transfer(id, &actor).await?,
        TransferAction::Draft => c.set_draft(id).await?,
        TransferAction::Probation => c.notify_probation(id).await?,
    };
    ok(request)
}

/// Generate the source company's closing payslip
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/payslip",
    params(("id" = String, Path, description = "Transfer id (ULID)")),
    responses(
        (status = 200, description = "Payslip created and computed", body = PayslipData, content_type = "application/json"),
        (status = 403, description = "HR role required"),
        (status = 409, description = "Transfer not in effect")
    ),
    tag = "Transfer"
)]
pub async fn generate_payslip(
    State(state): State<Arc<AppState>>,
    ActorHeader(actor): ActorHeader,
    Path(id): Path<String>,
) -> ApiResult<PayslipData> {
    let id = parse_transfer_id(&id)?;
    let payslip_id = state
        .coordinator
        .generate_transfer_payslip(id, &actor)
        .await?;
    ok(PayslipData { payslip_id })
}

#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}/leave",
    params(("id" = String, Path, description = "Transfer id (ULID)")),
    responses(
        (status = 200, description = "Leave balance of the employee", content_type = "application/json"),
        (status = 401, description = "Actor headers missing"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfer"
)]
pub async fn leave_summary(
    State(state): State<Arc<AppState>>,
    ActorHeader(actor): ActorHeader,
    Path(id): Path<String>,
) -> ApiResult<LeaveSummary> {
    let id = parse_transfer_id(&id)?;
    log_read(id, &actor, "leave");
    ok(state.coordinator.leave_summary(id).await?)
}

/// Gratuity the transfer would book on its effective date
#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}/gratuity",
    params(("id" = String, Path, description = "Transfer id (ULID)")),
    responses(
        (status = 200, description = "Gratuity breakdown", content_type = "application/json"),
        (status = 401, description = "Actor headers missing"),
        (status = 404, description = "Transfer not found"),
        (status = 422, description = "Joining date or contract missing")
    ),
    tag = "Transfer"
)]
pub async fn gratuity_preview(
    State(state): State<Arc<AppState>>,
    ActorHeader(actor): ActorHeader,
    Path(id): Path<String>,
) -> ApiResult<GratuityBreakdown> {
    let id = parse_transfer_id(&id)?;
    log_read(id, &actor, "gratuity");
    ok(state.coordinator.preview_gratuity(id).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}/entries",
    params(("id" = String, Path, description = "Transfer id (ULID)")),
    responses(
        (status = 200, description = "Journal entries booked for the transfer", content_type = "application/json"),
        (status = 401, description = "Actor headers missing"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfer"
)]
pub async fn gratuity_entries(
    State(state): State<Arc<AppState>>,
    ActorHeader(actor): ActorHeader,
    Path(id): Path<String>,
) -> ApiResult<Vec<PostedEntry>> {
    let id = parse_transfer_id(&id)?;
    log_read(id, &actor, "entries");
    ok(state.coordinator.gratuity_entries(id).await?)
}

fn log_read(id: TransferId, actor: &Actor, resource: &'static str) {
    tracing::debug!(transfer_id = %id, user_id = actor.user_id, resource, "Transfer read");
}
