//! Vehicle repository trait.

use super::NewVehicle;
use crate::error::Result;
use crate::state::{UserId, Vehicle, VehicleId};

/// Repository for registered vehicles.
pub trait VehicleStore: Send + Sync {
    /// Register a vehicle.
    ///
    /// # Errors
    ///
    /// Returns `DuplicatePlate` if the plate number is already registered.
    async fn insert(&self, vehicle: NewVehicle) -> Result<Vehicle>;

    /// Get a vehicle by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the vehicle does not exist.
    async fn get(&self, id: VehicleId) -> Result<Vehicle>;

    /// All vehicles owned by the user, ordered by plate number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_for_user(&self, owner_id: UserId) -> Result<Vec<Vehicle>>;
}
