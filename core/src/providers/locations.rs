//! Parking location repository trait.

use super::{LocationUpdate, NewLocation};
use crate::error::Result;
use crate::state::{LocationId, ParkingLocation};

/// Repository for parking locations and their space counters.
///
/// The space counter exclusively owns `available_spaces`; only
/// [`adjust_spaces`](LocationStore::adjust_spaces) moves it, and only
/// within `0..=total_spaces`.
pub trait LocationStore: Send + Sync {
    /// Insert a location; `available_spaces` starts at `total_spaces`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is already taken.
    async fn insert(&self, location: NewLocation) -> Result<ParkingLocation>;

    /// Get a location by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist.
    async fn get(&self, id: LocationId) -> Result<ParkingLocation>;

    /// Get a location by its unique code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no location has the code.
    async fn get_by_code(&self, code: &str) -> Result<ParkingLocation>;

    /// All locations, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list(&self) -> Result<Vec<ParkingLocation>>;

    /// Apply a partial update. A code change is re-checked for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, or
    /// `DuplicateCode` if the new code is taken by another location.
    async fn update(&self, id: LocationId, update: LocationUpdate) -> Result<ParkingLocation>;

    /// Delete a location, rejected while any activity there has a null
    /// exit time. The check and the delete run in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, or
    /// `InvalidState` while vehicles are inside.
    async fn delete(&self, id: LocationId) -> Result<()>;

    /// Move `available_spaces` by `delta` (±1 in practice) as a single
    /// conditional update that keeps `0 <= available_spaces <= total_spaces`.
    ///
    /// Two concurrent decrements racing for the last space resolve to one
    /// winner; the loser sees `NoCapacity`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, `NoCapacity` if
    /// a decrement would go below zero, or `BoundsError` if an increment
    /// would exceed `total_spaces`.
    async fn adjust_spaces(&self, id: LocationId, delta: i32) -> Result<ParkingLocation>;
}
