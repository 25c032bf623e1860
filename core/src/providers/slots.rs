//! Slot repository trait.

use super::NewSlot;
use crate::error::Result;
use crate::state::{ParkingSlot, SlotId, VehicleId};

/// Repository for numbered parking slots.
///
/// The slot ledger exclusively owns `is_available` and `vehicle_id`;
/// [`claim`](SlotStore::claim) and [`release`](SlotStore::release) are the
/// only writers of those fields.
pub trait SlotStore: Send + Sync {
    /// Insert a single slot.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNumber` if the number is already taken.
    async fn insert(&self, slot: NewSlot) -> Result<ParkingSlot>;

    /// Insert a batch of slots, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNumber` listing every colliding number; no slot in
    /// the batch is created in that case.
    async fn insert_bulk(&self, slots: Vec<NewSlot>) -> Result<u64>;

    /// Get a slot by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the slot does not exist.
    async fn get(&self, id: SlotId) -> Result<ParkingSlot>;

    /// All slots, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list(&self) -> Result<Vec<ParkingSlot>>;

    /// Slots currently available, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_available(&self) -> Result<Vec<ParkingSlot>>;

    /// Claim the slot for a vehicle: a single conditional update that
    /// succeeds only while `is_available` is still `true`.
    ///
    /// Returns `false` when a concurrent claim won; the caller reports that
    /// as `Unavailable`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the slot does not exist.
    async fn claim(&self, id: SlotId, vehicle_id: VehicleId) -> Result<bool>;

    /// Release the slot: set it available and clear the occupying vehicle.
    ///
    /// Idempotent; releasing an already-available slot is a no-op. Callers
    /// enforce that a release corresponds to a real booking.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the slot does not exist.
    async fn release(&self, id: SlotId) -> Result<()>;
}
