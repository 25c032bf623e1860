//! Space counter: the parking-location registry and its aggregate
//! capacity counters.

use crate::error::Result;
use crate::providers::{LocationStore, LocationUpdate, NewLocation};
use crate::state::{LocationId, ParkingLocation};
use std::sync::Arc;

/// Owns `ParkingLocation` records and their `available_spaces` counter.
///
/// The activity tracker never calls [`increment`](SpaceCounter::increment)
/// or [`decrement`](SpaceCounter::decrement) directly: its store pairs the
/// counter move with the activity write in one transaction. These methods
/// exist for administrative correction and defend the bounds anyway.
#[derive(Debug, Clone)]
pub struct SpaceCounter<L> {
    locations: Arc<L>,
}

impl<L: LocationStore> SpaceCounter<L> {
    /// Create a space counter over the given store.
    #[must_use]
    pub const fn new(locations: Arc<L>) -> Self {
        Self { locations }
    }

    /// Create a location; it opens fully empty, with every space free.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is already taken.
    pub async fn create_location(&self, location: NewLocation) -> Result<ParkingLocation> {
        self.locations.insert(location).await
    }

    /// Get a location by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist.
    pub async fn get_location(&self, id: LocationId) -> Result<ParkingLocation> {
        self.locations.get(id).await
    }

    /// Get a location by its unique code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no location has the code.
    pub async fn get_location_by_code(&self, code: &str) -> Result<ParkingLocation> {
        self.locations.get_by_code(code).await
    }

    /// All locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_locations(&self) -> Result<Vec<ParkingLocation>> {
        self.locations.list().await
    }

    /// Apply a partial update to a location.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, or
    /// `DuplicateCode` if the new code is taken by another location.
    pub async fn update_location(
        &self,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<ParkingLocation> {
        self.locations.update(id, update).await
    }

    /// Delete a location with no vehicle currently inside.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, or
    /// `InvalidState` while any activity there has a null exit time.
    pub async fn delete_location(&self, id: LocationId) -> Result<()> {
        self.locations.delete(id).await
    }

    /// Free one space (a car leaving).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, or `BoundsError`
    /// if the counter is already at `total_spaces`.
    pub async fn increment(&self, id: LocationId) -> Result<ParkingLocation> {
        self.locations.adjust_spaces(id, 1).await
    }

    /// Take one space (a car entering).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, or `NoCapacity`
    /// if no space is left.
    pub async fn decrement(&self, id: LocationId) -> Result<ParkingLocation> {
        self.locations.adjust_spaces(id, -1).await
    }
}
