//! API envelope, errors and request extractors
//!
//! - `ApiResponse<T>`: unified `{code, msg, data}` wrapper
//! - `ApiError`: error response carrying HTTP status and envelope code
//! - `ActorHeader`: caller identity from `X-Actor-*` headers

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::PayslipId;
use crate::transfer::{Actor, ErrorKind, Role, TransferError, TransferId};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
pub const ACTOR_ROLES_HEADER: &str = "x-actor-roles";

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload (success only)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const VALIDATION_FAILED: i32 = 1002;
    pub const INVALID_STATE: i32 = 1003;

    // Auth errors (2xxx)
    pub const MISSING_ACTOR: i32 = 2001;
    pub const FORBIDDEN: i32 = 2003;

    // Resource errors (4xxx)
    pub const TRANSFER_NOT_FOUND: i32 = 4004;
    pub const DATA_INTEGRITY: i32 = 4220;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn missing_actor(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::MISSING_ACTOR, msg)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match (&e, e.kind()) {
            (TransferError::TransferNotFound(_), _) => error_codes::TRANSFER_NOT_FOUND,
            (TransferError::InvalidStateTransition { .. } | TransferError::NotInEffect { .. }, _) => {
                error_codes::INVALID_STATE
            }
            (_, ErrorKind::Validation) => error_codes::VALIDATION_FAILED,
            (_, ErrorKind::Authorization) => error_codes::FORBIDDEN,
            (_, ErrorKind::DataIntegrity) => error_codes::DATA_INTEGRITY,
            (_, ErrorKind::System) => error_codes::INTERNAL_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, code = e.code(), "Transfer operation failed");
        }
        Self::new(status, code, format!("{}: {}", e.code(), e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// The acting user, read from `X-Actor-Id`, `X-Actor-Email` and
/// `X-Actor-Roles` (comma separated)
#[derive(Debug, Clone)]
pub struct ActorHeader(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for ActorHeader {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_id = header(ACTOR_ID_HEADER)
            .ok_or_else(|| ApiError::missing_actor("X-Actor-Id header required"))?
            .parse()
            .map_err(|_| ApiError::bad_request("X-Actor-Id must be a positive integer"))?;

        let mut actor = Actor::new(user_id);
        if let Some(email) = header(ACTOR_EMAIL_HEADER) {
            actor = actor.with_email(email);
        }
        if let Some(roles) = header(ACTOR_ROLES_HEADER) {
            for role in roles.split(',').filter(|r| !r.trim().is_empty()) {
                let role: Role = role.parse().map_err(ApiError::bad_request)?;
                actor = actor.with_role(role);
            }
        }
        Ok(ActorHeader(actor))
    }
}

pub fn parse_transfer_id(raw: &str) -> Result<TransferId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid transfer id: {raw}")))
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PayslipData {
    pub payslip_id: PayslipId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferState;

    #[test]
    fn test_transfer_error_mapping() {
        let e = ApiError::from(TransferError::HrRoleRequired("reverse the transfer"));
        assert_eq!(e.status, StatusCode::FORBIDDEN);
        assert_eq!(e.code, error_codes::FORBIDDEN);
        assert!(e.msg.starts_with("HR_ROLE_REQUIRED"));

        let e = ApiError::from(TransferError::InvalidStateTransition {
            reference: "INTRA/00003".into(),
            from: TransferState::Cancel,
            to: TransferState::Submit,
        });
        assert_eq!(e.status, StatusCode::CONFLICT);
        assert_eq!(e.code, error_codes::INVALID_STATE);

        let e = ApiError::from(TransferError::EndBeforeStart);
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, error_codes::VALIDATION_FAILED);
    }

    #[test]
    fn test_parse_transfer_id() {
        assert!(parse_transfer_id("not-a-ulid").is_err());
        let id = TransferId::new();
        assert_eq!(parse_transfer_id(&id.to_string()).unwrap(), id);
    }
}
