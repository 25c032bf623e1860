//! Slot endpoints.

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use parkline_core::providers::NewSlot;
use parkline_core::state::ParkingSlot;
use serde::{Deserialize, Serialize};

/// Request body for creating a slot.
#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    /// Unique slot number.
    pub number: String,
    /// Floor the slot is on.
    pub floor: i32,
    /// Initial availability; defaults to available.
    #[serde(default = "default_available")]
    pub is_available: bool,
}

const fn default_available() -> bool {
    true
}

/// Request body for bulk slot creation.
#[derive(Debug, Deserialize)]
pub struct CreateBulkRequest {
    /// Slots to create, all-or-nothing.
    pub slots: Vec<CreateSlotRequest>,
}

/// Response body for bulk slot creation.
#[derive(Debug, Serialize)]
pub struct BulkCreated {
    /// Number of slots created.
    pub count: u64,
}

/// `POST /slots` (admin)
pub async fn create_slot(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<ParkingSlot>), ApiError> {
    identity.require_admin()?;
    if body.number.trim().is_empty() {
        return Err(ApiError::validation("slot number must not be empty"));
    }
    let slot = state
        .slot_ledger
        .create(body.number, body.floor, body.is_available)
        .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// `POST /slots/bulk` (admin)
pub async fn create_bulk(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateBulkRequest>,
) -> Result<(StatusCode, Json<BulkCreated>), ApiError> {
    identity.require_admin()?;
    if body.slots.is_empty() {
        return Err(ApiError::validation("slots must not be empty"));
    }
    let slots = body
        .slots
        .into_iter()
        .map(|s| NewSlot {
            number: s.number,
            floor: s.floor,
            is_available: s.is_available,
        })
        .collect();
    let count = state.slot_ledger.create_bulk(slots).await?;
    Ok((StatusCode::CREATED, Json(BulkCreated { count })))
}

/// `GET /slots`
pub async fn list_slots(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<ParkingSlot>>, ApiError> {
    Ok(Json(state.slot_ledger.list().await?))
}

/// `GET /slots/available`
pub async fn list_available(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<ParkingSlot>>, ApiError> {
    Ok(Json(state.slot_ledger.list_available().await?))
}
