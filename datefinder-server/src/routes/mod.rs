pub mod availability;
pub mod confirmations;
pub mod ws;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use datefinder_core::{DateFinderError, UserId};

use crate::state::AppState;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert domain and internal errors to HTTP responses
pub enum AppError {
    Domain(DateFinderError),
    Internal(anyhow::Error),
}

impl From<DateFinderError> for AppError {
    fn from(err: DateFinderError) -> Self {
        AppError::Domain(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Domain(err) => {
                let status = match &err {
                    DateFinderError::PastDate(_) | DateFinderError::NotEligible(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    DateFinderError::AlreadyConfirmed(_) => StatusCode::CONFLICT,
                    DateFinderError::NotConfirmed(_) => StatusCode::NOT_FOUND,
                    DateFinderError::UnknownUser(_) => StatusCode::UNAUTHORIZED,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            AppError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// The authenticated caller, taken from the `x-user-id` header the auth
/// proxy in front of us injects. Rejects ids that are not on the roster.
pub struct CurrentUser(pub UserId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Domain(DateFinderError::UnknownUser("<missing>".to_string()))
            })?;

        let user = UserId::new(id);
        if !state.roster.contains(&user) {
            return Err(AppError::Domain(DateFinderError::UnknownUser(
                id.to_string(),
            )));
        }

        Ok(CurrentUser(user))
    }
}
