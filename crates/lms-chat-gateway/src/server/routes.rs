//! HTTP query routes

use crate::events::PresenceStatus;
use crate::server::GatewayState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lms_chat_common::{AppError, ErrorResponse};
use lms_chat_core::{DomainError, UserId};

/// Error returned from HTTP routes
#[derive(Debug)]
pub struct HttpError(AppError);

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for HttpError {
    fn from(err: DomainError) -> Self {
        Self(AppError::Domain(err))
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_server_error() {
            tracing::error!(error = ?self.0, "Server error occurred");
        }

        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Presence snapshot for one user
pub async fn presence(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceStatus>, HttpError> {
    let user_id = UserId::parse(&user_id)?;
    Ok(Json(state.tracker().presence(&user_id)))
}
