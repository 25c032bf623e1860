//! Activity endpoints: vehicle entry/exit, reports, tickets, summaries.

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use parkline_core::state::{
    ActivityDetails, ActivityId, EntryTicket, LocationId, ParkingActivity, ParkingSummary,
    VehicleId,
};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for recording a vehicle entry.
#[derive(Debug, Deserialize)]
pub struct RecordEntryRequest {
    /// The vehicle entering.
    pub vehicle_id: VehicleId,
    /// The location entered.
    pub location_id: LocationId,
}

/// Date range query parameters for the reports.
#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    /// Range start (inclusive).
    pub start: DateTime<Utc>,
    /// Range end (inclusive).
    pub end: DateTime<Utc>,
}

impl DateRangeParams {
    fn validated(self) -> Result<Self, ApiError> {
        if self.start > self.end {
            return Err(ApiError::validation("start must not be after end"));
        }
        Ok(self)
    }
}

/// `POST /activities/entry`
pub async fn record_entry(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<RecordEntryRequest>,
) -> Result<(StatusCode, Json<ParkingActivity>), ApiError> {
    let activity = state
        .activities
        .record_entry(body.vehicle_id, body.location_id, identity.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// `POST /activities/:id/exit`
pub async fn record_exit(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ParkingActivity>, ApiError> {
    Ok(Json(state.activities.record_exit(ActivityId(id)).await?))
}

/// `GET /activities/:id`
pub async fn get_activity(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ActivityDetails>, ApiError> {
    Ok(Json(state.activities.get(ActivityId(id)).await?))
}

/// `GET /activities/active` (admin) — vehicles currently inside.
pub async fn list_active(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<ActivityDetails>>, ApiError> {
    identity.require_admin()?;
    Ok(Json(state.activities.list_active().await?))
}

/// `GET /activities/reports/entries?start=..&end=..` (admin)
pub async fn entries_report(
    State(state): State<AppState>,
    identity: Identity,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<Vec<ActivityDetails>>, ApiError> {
    identity.require_admin()?;
    let range = range.validated()?;
    Ok(Json(
        state
            .activities
            .list_by_entry_range(range.start, range.end)
            .await?,
    ))
}

/// `GET /activities/reports/exits?start=..&end=..` (admin)
pub async fn exits_report(
    State(state): State<AppState>,
    identity: Identity,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<Vec<ActivityDetails>>, ApiError> {
    identity.require_admin()?;
    let range = range.validated()?;
    Ok(Json(
        state
            .activities
            .list_completed_by_exit_range(range.start, range.end)
            .await?,
    ))
}

/// `GET /activities/:id/ticket`
pub async fn entry_ticket(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryTicket>, ApiError> {
    Ok(Json(
        state.activities.generate_entry_ticket(ActivityId(id)).await?,
    ))
}

/// `GET /activities/:id/summary`
pub async fn parking_summary(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ParkingSummary>, ApiError> {
    Ok(Json(
        state.activities.generate_summary(ActivityId(id)).await?,
    ))
}
