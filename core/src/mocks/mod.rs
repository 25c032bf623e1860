//! In-memory store doubles for testing.
//!
//! [`MemoryDb`] implements every store trait over one set of tables behind
//! a single mutex, which is what makes the composite operations (insert a
//! booking + claim its slot, take a space + insert an activity) atomic the
//! same way a database transaction would be. Concurrent engine calls
//! serialize on the lock and resolve to exactly one winner.

mod clock;
mod db;

pub use clock::TestClock;
pub use db::{
    MemoryActivityStore, MemoryBookingStore, MemoryDb, MemoryLocationStore, MemorySlotStore,
    MemoryVehicleStore,
};
