//! Confirmation endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;

use datefinder_core::{ConfirmedDate, DateAggregate};

use crate::routes::{AppError, CurrentUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/candidates", get(list_candidates))
        .route("/confirmed", get(list_confirmed))
        .route("/confirmed/{date}", post(confirm).delete(unconfirm))
}

/// GET /candidates - Future dates with enough responses to confirm
async fn list_candidates(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<DateAggregate>>, AppError> {
    Ok(Json(state.availability.candidate_dates()))
}

/// GET /confirmed - All confirmed dates, ascending
async fn list_confirmed(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<ConfirmedDate>>, AppError> {
    Ok(Json(state.confirmations.list_confirmed()))
}

/// Request body for confirming a date
#[derive(Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub description: String,
}

/// POST /confirmed/:date - Confirm a date
async fn confirm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(date): Path<NaiveDate>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmedDate>, AppError> {
    let entry = state
        .confirmations
        .confirm(date, &req.description, Some(&user))?;

    Ok(Json(entry))
}

/// DELETE /confirmed/:date - Remove a date's confirmation
async fn unconfirm(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(date): Path<NaiveDate>,
) -> Result<(), AppError> {
    state.confirmations.unconfirm(date)?;
    Ok(())
}
