use crate::engine::ErrorCode;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: &'static str,
    details: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    // Common error constructors
    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

/// Un codice nuovo in `ErrorCode` non compila finché non ha il suo status qui
impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        let status = match code {
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::TripNotFound
            | ErrorCode::UserNotFound
            | ErrorCode::FriendInvitationNotFound
            | ErrorCode::AddFriendReceiverNotFound => StatusCode::NOT_FOUND,
            ErrorCode::TripMemberAlreadyExists
            | ErrorCode::TripInvitationAlreadyExists
            | ErrorCode::AddFriendInvitationAlreadyExists
            | ErrorCode::AddFriendAlreadyFriend => StatusCode::CONFLICT,
            ErrorCode::AddFriendInCooldown => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::NotificationFailed => StatusCode::BAD_GATEWAY,
            ErrorCode::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorCode::DbDown => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, code.as_str())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        ErrorCode::from(err).into()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::bad_request("VALIDATION_ERROR").with_details(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorResponse {
            error: self.message,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}
