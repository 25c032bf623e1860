//! Parking activity repository trait.

use super::NewActivity;
use crate::error::Result;
use crate::state::{ActivityDetails, ActivityId, ParkingActivity, VehicleId};
use chrono::{DateTime, Utc};

/// Repository for entry/exit activities.
///
/// Entry and exit each pair an activity write with the location's counter
/// mutation in one transaction, so counts and activities can never drift
/// apart across a crash.
pub trait ActivityStore: Send + Sync {
    /// Take one space at the location and insert an ACTIVE activity,
    /// atomically. The decrement is conditional on `available_spaces > 0`;
    /// losing the race for the last space rolls the insert back. The
    /// one-active-activity-per-vehicle rule is enforced inside the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the location does not exist, `NoCapacity`
    /// when no space is left, `InvalidState` if the vehicle already has an
    /// active activity, or `DuplicateTicket` when the pre-generated ticket
    /// number collides (the caller retries with a fresh number).
    async fn insert_active_taking_space(&self, activity: NewActivity) -> Result<ParkingActivity>;

    /// Complete an ACTIVE activity and return its space, atomically. The
    /// status update is conditional on the activity still being ACTIVE.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the activity does not exist, `InvalidState`
    /// if the vehicle has already exited, or `BoundsError` if the counter
    /// would exceed `total_spaces` (a corrupted ledger, not a user error).
    async fn complete_returning_space(
        &self,
        id: ActivityId,
        exit_time: DateTime<Utc>,
        duration_hours: f64,
    ) -> Result<ParkingActivity>;

    /// Get an activity row by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the activity does not exist.
    async fn get(&self, id: ActivityId) -> Result<ParkingActivity>;

    /// Get an activity with vehicle, location, and recording user resolved
    /// in the same read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the activity does not exist.
    async fn get_detailed(&self, id: ActivityId) -> Result<ActivityDetails>;

    /// The vehicle's ACTIVE activity, if it is currently inside a location.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<ParkingActivity>>;

    /// All ACTIVE activities, newest entry first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_active(&self) -> Result<Vec<ActivityDetails>>;

    /// Activities whose entry time falls inside `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_by_entry_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>>;

    /// COMPLETED activities whose exit time falls inside `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_completed_by_exit_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>>;
}
