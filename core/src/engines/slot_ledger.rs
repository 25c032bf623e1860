//! Slot ledger: administrative ownership of numbered slots.
//!
//! Claim/release during the booking lifecycle happens through
//! [`SlotStore`] from inside the booking engine's transactions; this
//! service covers creation and the read side.

use crate::error::Result;
use crate::providers::{NewSlot, SlotStore};
use crate::state::{ParkingSlot, SlotId};
use std::sync::Arc;

/// Owns `ParkingSlot` records and their occupancy flag.
#[derive(Debug, Clone)]
pub struct SlotLedger<S> {
    slots: Arc<S>,
}

impl<S: SlotStore> SlotLedger<S> {
    /// Create a slot ledger over the given store.
    #[must_use]
    pub const fn new(slots: Arc<S>) -> Self {
        Self { slots }
    }

    /// Create a single slot.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNumber` if the number is already taken.
    pub async fn create(
        &self,
        number: String,
        floor: i32,
        is_available: bool,
    ) -> Result<ParkingSlot> {
        self.slots
            .insert(NewSlot {
                number,
                floor,
                is_available,
            })
            .await
    }

    /// Create a batch of slots, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNumber` listing every colliding number; no slot
    /// in the batch is created in that case.
    pub async fn create_bulk(&self, slots: Vec<NewSlot>) -> Result<u64> {
        self.slots.insert_bulk(slots).await
    }

    /// Get a slot by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the slot does not exist.
    pub async fn get(&self, id: SlotId) -> Result<ParkingSlot> {
        self.slots.get(id).await
    }

    /// All slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<ParkingSlot>> {
        self.slots.list().await
    }

    /// Slots currently available for booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_available(&self) -> Result<Vec<ParkingSlot>> {
        self.slots.list_available().await
    }
}
