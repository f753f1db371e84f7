//! Availability endpoints

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use datefinder_core::{AvailabilityState, DateAggregate, UserId};

use crate::routes::{AppError, CurrentUser};
use crate::state::AppState;

fn default_window_days() -> u64 {
    90
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/availability", get(list_availability))
        .route("/availability/{date}", get(get_availability))
        .route("/availability/{date}/toggle", post(toggle_availability))
}

#[derive(Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_window_days")]
    pub days: u64,
}

/// Full-state snapshot a viewer fetches on connect
#[derive(Serialize)]
pub struct AvailabilityOverview {
    pub current_user: UserId,
    pub data: BTreeMap<NaiveDate, DateAggregate>,
}

/// GET /availability - Aggregates for upcoming dates with responses
async fn list_availability(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<AvailabilityOverview>, AppError> {
    Ok(Json(AvailabilityOverview {
        current_user: user,
        data: state.availability.upcoming(query.days),
    }))
}

/// GET /availability/:date - Aggregate for a single date
async fn get_availability(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DateAggregate>, AppError> {
    Ok(Json(state.availability.aggregate(date)))
}

/// Response to a toggle, echoing the fresh aggregate
#[derive(Serialize)]
pub struct ToggleResponse {
    pub date: NaiveDate,
    pub user_state: Option<AvailabilityState>,
    pub aggregate: DateAggregate,
}

/// POST /availability/:date/toggle - Advance the caller's marker
async fn toggle_availability(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ToggleResponse>, AppError> {
    let user_state = state.availability.toggle(&user, date)?;

    Ok(Json(ToggleResponse {
        date,
        user_state,
        aggregate: state.availability.aggregate(date),
    }))
}
