//! Application state shared across HTTP handlers.

use parkline_core::config::TicketConfig;
use parkline_core::engines::{ActivityTracker, BookingEngine, SlotLedger, SpaceCounter};
use parkline_core::environment::SystemClock;
use parkline_postgres::{
    PostgresActivityStore, PostgresBookingStore, PostgresLocationStore, PostgresSlotStore,
    PostgresVehicleStore,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Booking engine over the PostgreSQL stores.
pub type PgBookingEngine =
    BookingEngine<PostgresBookingStore, PostgresSlotStore, PostgresVehicleStore, SystemClock>;
/// Activity tracker over the PostgreSQL stores.
pub type PgActivityTracker =
    ActivityTracker<PostgresActivityStore, PostgresLocationStore, PostgresVehicleStore, SystemClock>;

/// Engines shared with every handler. Cloning is cheap; everything inside
/// is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Slot ledger.
    pub slot_ledger: Arc<SlotLedger<PostgresSlotStore>>,
    /// Booking engine.
    pub bookings: Arc<PgBookingEngine>,
    /// Space counter / location registry.
    pub space_counter: Arc<SpaceCounter<PostgresLocationStore>>,
    /// Activity tracker.
    pub activities: Arc<PgActivityTracker>,
    /// Vehicle registry.
    pub vehicles: Arc<PostgresVehicleStore>,
}

impl AppState {
    /// Wire the engines over one connection pool.
    #[must_use]
    pub fn new(pool: PgPool, ticket: TicketConfig) -> Self {
        let slots = Arc::new(PostgresSlotStore::new(pool.clone()));
        let bookings = Arc::new(PostgresBookingStore::new(pool.clone()));
        let locations = Arc::new(PostgresLocationStore::new(pool.clone()));
        let activities = Arc::new(PostgresActivityStore::new(pool.clone()));
        let vehicles = Arc::new(PostgresVehicleStore::new(pool));
        let clock = Arc::new(SystemClock);

        Self {
            slot_ledger: Arc::new(SlotLedger::new(Arc::clone(&slots))),
            bookings: Arc::new(BookingEngine::new(
                bookings,
                Arc::clone(&slots),
                Arc::clone(&vehicles),
                Arc::clone(&clock),
            )),
            space_counter: Arc::new(SpaceCounter::new(Arc::clone(&locations))),
            activities: Arc::new(ActivityTracker::new(
                activities,
                locations,
                Arc::clone(&vehicles),
                clock,
                ticket,
            )),
            vehicles,
        }
    }
}
