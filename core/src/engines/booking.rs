//! Booking engine: create, cancel, extend, and complete slot reservations.

use crate::environment::Clock;
use crate::error::{ParkingError, Result};
use crate::providers::{BookingStore, NewBooking, SlotStore, VehicleStore};
use crate::state::{
    Booking, BookingAdminView, BookingDetails, BookingId, BookingStatus, SlotId, UserId,
    VehicleId,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Creates and transitions time-boxed bookings against slots.
///
/// One ACTIVE booking per slot at any time; the claim that enforces it is
/// part of the store's insert transaction, so a lost race surfaces as
/// `Unavailable` and nothing is written.
#[derive(Debug, Clone)]
pub struct BookingEngine<B, S, V, C> {
    bookings: Arc<B>,
    slots: Arc<S>,
    vehicles: Arc<V>,
    clock: Arc<C>,
}

impl<B, S, V, C> BookingEngine<B, S, V, C>
where
    B: BookingStore,
    S: SlotStore,
    V: VehicleStore,
    C: Clock,
{
    /// Create a booking engine over the given stores and clock.
    #[must_use]
    pub const fn new(bookings: Arc<B>, slots: Arc<S>, vehicles: Arc<V>, clock: Arc<C>) -> Self {
        Self {
            bookings,
            slots,
            vehicles,
            clock,
        }
    }

    /// Book a slot for one of the user's vehicles, starting at
    /// `start_time`.
    ///
    /// Availability is pre-checked for a fast, friendly failure, but the
    /// authoritative check is the conditional claim inside the store's
    /// insert transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the slot or vehicle is missing,
    /// `InvalidOwnership` if the vehicle belongs to someone else, or
    /// `Unavailable` if the slot is occupied or was claimed concurrently.
    pub async fn create(
        &self,
        user_id: UserId,
        slot_id: SlotId,
        vehicle_id: VehicleId,
        start_time: DateTime<Utc>,
    ) -> Result<Booking> {
        let slot = self.slots.get(slot_id).await?;
        if !slot.is_available {
            return Err(ParkingError::Unavailable);
        }

        let vehicle = self.vehicles.get(vehicle_id).await?;
        if vehicle.owner_id != user_id {
            return Err(ParkingError::InvalidOwnership);
        }

        self.bookings
            .insert_active_claiming_slot(NewBooking {
                slot_id,
                vehicle_id,
                start_time,
            })
            .await
    }

    /// Cancel an ACTIVE booking and release its slot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking is missing, or `InvalidState` if
    /// it is not ACTIVE.
    pub async fn cancel(&self, id: BookingId) -> Result<Booking> {
        let booking = self.bookings.get(id).await?;
        if booking.status != BookingStatus::Active {
            return Err(ParkingError::InvalidState(
                "only active bookings can be cancelled",
            ));
        }

        self.bookings
            .finish_releasing_slot(id, BookingStatus::Cancelled, self.clock.now())
            .await
    }

    /// Push the booking's expected end out by `additional_hours`, from the
    /// current expected end or from now if none is set yet.
    ///
    /// Extending a booking that is no longer ACTIVE is rejected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking is missing, or `InvalidState` if
    /// it is not ACTIVE.
    pub async fn extend(&self, id: BookingId, additional_hours: u32) -> Result<Booking> {
        let booking = self.bookings.get(id).await?;
        if booking.status != BookingStatus::Active {
            return Err(ParkingError::InvalidState(
                "only active bookings can be extended",
            ));
        }

        let base = booking.expected_end_time.unwrap_or_else(|| self.clock.now());
        let expected_end = base + Duration::hours(i64::from(additional_hours));
        self.bookings.set_expected_end(id, expected_end).await
    }

    /// Complete an ACTIVE booking (attendant checks the car out) and
    /// release its slot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking is missing, or `InvalidState` if
    /// it is not ACTIVE.
    pub async fn release(&self, id: BookingId) -> Result<Booking> {
        let booking = self.bookings.get(id).await?;
        if booking.status != BookingStatus::Active {
            return Err(ParkingError::InvalidState(
                "only active bookings can be completed",
            ));
        }

        self.bookings
            .finish_releasing_slot(id, BookingStatus::Completed, self.clock.now())
            .await
    }

    /// Get a booking with its slot and vehicle resolved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist.
    pub async fn get(&self, id: BookingId) -> Result<BookingDetails> {
        self.bookings.get_detailed(id).await
    }

    /// The user's bookings, newest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingDetails>> {
        self.bookings.list_for_user(user_id).await
    }

    /// All bookings with vehicle owners resolved, newest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all(&self) -> Result<Vec<BookingAdminView>> {
        self.bookings.list_all_admin().await
    }
}
