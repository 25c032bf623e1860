//! Booking repository trait.

use super::NewBooking;
use crate::error::Result;
use crate::state::{Booking, BookingAdminView, BookingDetails, BookingId, BookingStatus, UserId};
use chrono::{DateTime, Utc};

/// Repository for bookings.
///
/// The two lifecycle writes that also touch the slot row are single
/// methods, so implementations run them in one transaction: a crash or a
/// lost race can never leave a booking without its claim, or a released
/// slot with an active booking.
pub trait BookingStore: Send + Sync {
    /// Insert an ACTIVE booking and claim its slot, atomically.
    ///
    /// The claim is conditional on the slot still being available inside
    /// the transaction; losing that race rolls the insert back.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the slot was claimed concurrently, or
    /// `NotFound` if the slot does not exist.
    async fn insert_active_claiming_slot(&self, booking: NewBooking) -> Result<Booking>;

    /// Move an ACTIVE booking to a terminal status, stamp its actual end,
    /// and release its slot, atomically.
    ///
    /// The status update is conditional on the booking still being ACTIVE,
    /// so two concurrent terminal transitions resolve to one winner.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist, or `InvalidState`
    /// if it is no longer ACTIVE.
    async fn finish_releasing_slot(
        &self,
        id: BookingId,
        status: BookingStatus,
        ended_at: DateTime<Utc>,
    ) -> Result<Booking>;

    /// Persist a new expected end time, conditional on the booking being
    /// ACTIVE.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist, or `InvalidState`
    /// if it is no longer ACTIVE.
    async fn set_expected_end(
        &self,
        id: BookingId,
        expected_end: DateTime<Utc>,
    ) -> Result<Booking>;

    /// Get a booking row by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist.
    async fn get(&self, id: BookingId) -> Result<Booking>;

    /// Get a booking with its slot and vehicle resolved in the same read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist.
    async fn get_detailed(&self, id: BookingId) -> Result<BookingDetails>;

    /// Bookings whose vehicle belongs to the user, newest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingDetails>>;

    /// All bookings with owner profiles resolved, newest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_all_admin(&self) -> Result<Vec<BookingAdminView>>;

    /// ACTIVE bookings whose expected end is before `now`, oldest expiry
    /// first, at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_expired_active(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Booking>>;

    /// Transition one booking ACTIVE→OVERSTAY, conditional on it still
    /// being ACTIVE. The slot is not released; overstay signals billing,
    /// not vacancy.
    ///
    /// Returns `false` when the booking was no longer ACTIVE, which makes
    /// repeated sweeps idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    async fn mark_overstayed(&self, id: BookingId) -> Result<bool>;
}
