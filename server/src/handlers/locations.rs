//! Parking location endpoints.

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use parkline_core::providers::{LocationUpdate, NewLocation};
use parkline_core::state::{LocationId, ParkingLocation};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for creating a location.
#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    /// Unique short code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Total capacity.
    pub total_spaces: i32,
    /// Hourly fee.
    pub fee_per_hour: f64,
}

/// Request body for updating a location.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateLocationRequest {
    /// New code.
    pub code: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New street address.
    pub address: Option<String>,
    /// New hourly fee.
    pub fee_per_hour: Option<f64>,
}

/// `POST /locations` (admin)
pub async fn create_location(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<ParkingLocation>), ApiError> {
    identity.require_admin()?;
    if body.total_spaces <= 0 {
        return Err(ApiError::validation("total_spaces must be positive"));
    }
    if body.fee_per_hour < 0.0 {
        return Err(ApiError::validation("fee_per_hour must not be negative"));
    }
    let location = state
        .space_counter
        .create_location(NewLocation {
            code: body.code,
            name: body.name,
            address: body.address,
            total_spaces: body.total_spaces,
            fee_per_hour: body.fee_per_hour,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// `GET /locations`
pub async fn list_locations(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<ParkingLocation>>, ApiError> {
    Ok(Json(state.space_counter.list_locations().await?))
}

/// `GET /locations/:id`
pub async fn get_location(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ParkingLocation>, ApiError> {
    Ok(Json(state.space_counter.get_location(LocationId(id)).await?))
}

/// `GET /locations/code/:code`
pub async fn get_location_by_code(
    State(state): State<AppState>,
    _identity: Identity,
    Path(code): Path<String>,
) -> Result<Json<ParkingLocation>, ApiError> {
    Ok(Json(state.space_counter.get_location_by_code(&code).await?))
}

/// `PUT /locations/:id` (admin)
pub async fn update_location(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLocationRequest>,
) -> Result<Json<ParkingLocation>, ApiError> {
    identity.require_admin()?;
    if body.fee_per_hour.is_some_and(|fee| fee < 0.0) {
        return Err(ApiError::validation("fee_per_hour must not be negative"));
    }
    let location = state
        .space_counter
        .update_location(
            LocationId(id),
            LocationUpdate {
                code: body.code,
                name: body.name,
                address: body.address,
                fee_per_hour: body.fee_per_hour,
            },
        )
        .await?;
    Ok(Json(location))
}

/// `DELETE /locations/:id` (admin)
pub async fn delete_location(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    state.space_counter.delete_location(LocationId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
