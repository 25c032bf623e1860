//! Booking endpoints.

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use parkline_core::state::{
    Booking, BookingAdminView, BookingDetails, BookingId, SlotId, VehicleId,
};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for creating a booking.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// The slot to book.
    pub slot_id: SlotId,
    /// The caller's vehicle to book it for.
    pub vehicle_id: VehicleId,
    /// When the reservation begins.
    pub start_time: DateTime<Utc>,
}

/// Request body for extending a booking.
#[derive(Debug, Deserialize)]
pub struct ExtendBookingRequest {
    /// Hours to add to the expected end.
    pub additional_hours: u32,
}

/// `POST /bookings`
pub async fn create_booking(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking = state
        .bookings
        .create(identity.user_id, body.slot_id, body.vehicle_id, body.start_time)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `POST /bookings/:id/cancel`
pub async fn cancel_booking(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.bookings.cancel(BookingId(id)).await?))
}

/// `POST /bookings/:id/extend`
pub async fn extend_booking(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<ExtendBookingRequest>,
) -> Result<Json<Booking>, ApiError> {
    if body.additional_hours == 0 {
        return Err(ApiError::validation("additional_hours must be positive"));
    }
    Ok(Json(
        state
            .bookings
            .extend(BookingId(id), body.additional_hours)
            .await?,
    ))
}

/// `POST /bookings/:id/release` (admin: attendant checks the car out)
pub async fn release_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    identity.require_admin()?;
    Ok(Json(state.bookings.release(BookingId(id)).await?))
}

/// `GET /bookings/:id`
pub async fn get_booking(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetails>, ApiError> {
    Ok(Json(state.bookings.get(BookingId(id)).await?))
}

/// `GET /bookings` — the caller's own bookings.
pub async fn list_my_bookings(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<BookingDetails>>, ApiError> {
    Ok(Json(state.bookings.list_for_user(identity.user_id).await?))
}

/// `GET /bookings/all` (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<BookingAdminView>>, ApiError> {
    identity.require_admin()?;
    Ok(Json(state.bookings.list_all().await?))
}
