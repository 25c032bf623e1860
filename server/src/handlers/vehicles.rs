//! Vehicle registry endpoints.

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use parkline_core::providers::{NewVehicle, VehicleStore};
use parkline_core::state::{UserId, Vehicle, VehicleId, VehicleType};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for registering a vehicle.
#[derive(Debug, Deserialize)]
pub struct RegisterVehicleRequest {
    /// License plate.
    pub plate_number: String,
    /// Kind of vehicle.
    pub vehicle_type: VehicleType,
    /// Owner override; admins may register on behalf of another user.
    pub owner_id: Option<UserId>,
}

/// `POST /vehicles`
pub async fn register_vehicle(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<RegisterVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    if body.plate_number.trim().len() < 2 {
        return Err(ApiError::validation(
            "plate_number must be at least 2 characters",
        ));
    }
    let owner_id = match body.owner_id {
        Some(other) if other != identity.user_id => {
            identity.require_admin()?;
            other
        }
        _ => identity.user_id,
    };
    let vehicle = state
        .vehicles
        .insert(NewVehicle {
            plate_number: body.plate_number,
            vehicle_type: body.vehicle_type,
            owner_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// `GET /vehicles` — the caller's own vehicles.
pub async fn list_my_vehicles(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    Ok(Json(state.vehicles.list_for_user(identity.user_id).await?))
}

/// `GET /vehicles/:id`
pub async fn get_vehicle(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
    let vehicle = state.vehicles.get(VehicleId(id)).await?;
    if vehicle.owner_id != identity.user_id {
        identity.require_admin()?;
    }
    Ok(Json(vehicle))
}
