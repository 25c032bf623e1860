//! # parkline-core
//!
//! Inventory ledger and booking/activity lifecycle engine for physical
//! parking under concurrent traffic.
//!
//! Two parallel inventory models share verbs but not code paths:
//!
//! - **Slots + bookings**: numbered [`ParkingSlot`](state::ParkingSlot)s
//!   claimed exclusively by time-boxed [`Booking`](state::Booking)s, owned
//!   by the [`SlotLedger`](engines::SlotLedger) and
//!   [`BookingEngine`](engines::BookingEngine).
//! - **Locations + activities**: aggregate space counters on
//!   [`ParkingLocation`](state::ParkingLocation)s moved by entry/exit
//!   [`ParkingActivity`](state::ParkingActivity) records, owned by the
//!   [`SpaceCounter`](engines::SpaceCounter) and
//!   [`ActivityTracker`](engines::ActivityTracker).
//!
//! Every check-then-act sequence (claim a slot, take the last space) is a
//! single method on a store trait, so implementations execute it as one
//! conditional update or transaction: two concurrent requests for the same
//! resource resolve to exactly one winner and one explicit
//! [`Unavailable`](error::ParkingError::Unavailable)/
//! [`NoCapacity`](error::ParkingError::NoCapacity) outcome. The
//! [`OverstaySweeper`](engines::OverstaySweeper) runs alongside request
//! traffic and flags expired active bookings.
//!
//! The crate performs no request parsing, authentication, or HTTP I/O;
//! identity and pre-parsed temporal values are supplied by the caller.

// Public modules
pub mod config;
pub mod engines;
pub mod environment;
pub mod error;
pub mod providers;
pub mod state;
pub mod ticket;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use config::{SweeperConfig, TicketConfig};
pub use engines::{ActivityTracker, BookingEngine, OverstaySweeper, SlotLedger, SpaceCounter};
pub use environment::{Clock, SystemClock};
pub use error::{ParkingError, Result};
