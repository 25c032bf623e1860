//! Store traits — the seams between the engines and the transactional store.
//!
//! Every check-then-act sequence the engines rely on is a single trait
//! method, so each implementation is forced to execute it as one conditional
//! update or one transaction. Two callers racing for the same slot or the
//! last space resolve to exactly one winner; the loser sees a normal error
//! outcome, not a partial write.

mod activities;
mod bookings;
mod locations;
mod slots;
mod vehicles;

pub use activities::ActivityStore;
pub use bookings::BookingStore;
pub use locations::LocationStore;
pub use slots::SlotStore;
pub use vehicles::VehicleStore;

use crate::state::{LocationId, SlotId, UserId, VehicleId, VehicleType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields for creating a parking slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    /// Unique human-visible slot number.
    pub number: String,
    /// Floor the slot is on.
    pub floor: i32,
    /// Initial availability; defaults to available.
    pub is_available: bool,
}

impl NewSlot {
    /// A new available slot.
    #[must_use]
    pub const fn new(number: String, floor: i32) -> Self {
        Self {
            number,
            floor,
            is_available: true,
        }
    }
}

/// Fields for creating a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    /// The slot to claim.
    pub slot_id: SlotId,
    /// The vehicle the slot is claimed for.
    pub vehicle_id: VehicleId,
    /// When the reservation begins.
    pub start_time: DateTime<Utc>,
}

/// Fields for creating a parking location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    /// Unique short code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-text street address.
    pub address: String,
    /// Total capacity; `available_spaces` starts equal to this.
    pub total_spaces: i32,
    /// Hourly parking fee.
    pub fee_per_hour: f64,
}

/// Updatable fields of a parking location. Capacity is deliberately not
/// here: resizing a facility with vehicles inside has no defined meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// New code, re-checked for uniqueness.
    pub code: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New street address.
    pub address: Option<String>,
    /// New hourly fee.
    pub fee_per_hour: Option<f64>,
}

/// Fields for creating an activity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    /// The vehicle entering.
    pub vehicle_id: VehicleId,
    /// The location entered.
    pub location_id: LocationId,
    /// The user recording the entry.
    pub recorded_by: UserId,
    /// Pre-generated unique ticket number.
    pub ticket_number: String,
    /// Entry timestamp.
    pub entry_time: DateTime<Utc>,
}

/// Fields for registering a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVehicle {
    /// License plate, unique across the registry.
    pub plate_number: String,
    /// Kind of vehicle.
    pub vehicle_type: VehicleType,
    /// Owning user.
    pub owner_id: UserId,
}
