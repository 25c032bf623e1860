//! Activity lifecycle tests: entry/exit recording, space counting,
//! tickets, and billing summaries.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use parkline_core::config::TicketConfig;
use parkline_core::engines::{ActivityTracker, SpaceCounter};
use parkline_core::environment::Clock;
use parkline_core::error::ParkingError;
use parkline_core::mocks::{
    MemoryActivityStore, MemoryDb, MemoryLocationStore, MemoryVehicleStore, TestClock,
};
use parkline_core::providers::{
    ActivityStore, LocationStore, NewActivity, NewLocation, NewVehicle, VehicleStore,
};
use parkline_core::state::{
    ActivityDetails, ActivityId, ActivityStatus, LocationId, ParkingActivity, ParkingLocation,
    Role, UserId, UserProfile, Vehicle, VehicleId, VehicleType,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

type Tracker =
    ActivityTracker<MemoryActivityStore, MemoryLocationStore, MemoryVehicleStore, TestClock>;

struct Harness {
    vehicles: Arc<MemoryVehicleStore>,
    clock: Arc<TestClock>,
    tracker: Tracker,
    counter: SpaceCounter<MemoryLocationStore>,
    user: UserId,
}

fn setup() -> Harness {
    let db = MemoryDb::new();
    let locations = Arc::new(db.locations());
    let vehicles = Arc::new(db.vehicles());
    let clock = Arc::new(TestClock::new(
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).single().unwrap(),
    ));
    let tracker = ActivityTracker::new(
        Arc::new(db.activities()),
        Arc::clone(&locations),
        Arc::clone(&vehicles),
        Arc::clone(&clock),
        TicketConfig::default(),
    );
    let counter = SpaceCounter::new(Arc::clone(&locations));

    let user = UserId::new();
    db.seed_user(UserProfile {
        id: user,
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        role: Role::Admin,
    })
    .unwrap();

    Harness {
        vehicles,
        clock,
        tracker,
        counter,
        user,
    }
}

async fn register_vehicle(h: &Harness, plate: &str) -> Vehicle {
    h.vehicles
        .insert(NewVehicle {
            plate_number: plate.to_string(),
            vehicle_type: VehicleType::Car,
            owner_id: h.user,
        })
        .await
        .unwrap()
}

async fn create_location(h: &Harness, code: &str, total_spaces: i32) -> ParkingLocation {
    h.counter
        .create_location(NewLocation {
            code: code.to_string(),
            name: format!("{code} garage"),
            address: "1 Main St".to_string(),
            total_spaces,
            fee_per_hour: 2.5,
        })
        .await
        .unwrap()
}

async fn available_spaces(h: &Harness, id: LocationId) -> i32 {
    h.counter.get_location(id).await.unwrap().available_spaces
}

#[tokio::test]
async fn entry_then_exit_round_trips_the_counter() {
    let h = setup();
    let vehicle = register_vehicle(&h, "GH-001").await;
    let location = create_location(&h, "P1", 5).await;
    assert_eq!(location.available_spaces, 5);

    let activity = h
        .tracker
        .record_entry(vehicle.id, location.id, h.user)
        .await
        .unwrap();
    assert_eq!(activity.status, ActivityStatus::Active);
    assert!(activity.ticket_number.starts_with("TICKET-"));
    let suffix = &activity.ticket_number["TICKET-".len()..];
    assert_eq!(suffix.len(), 8);
    assert!(
        suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    );
    assert_eq!(available_spaces(&h, location.id).await, 4);

    h.clock.advance(Duration::hours(2));
    let completed = h.tracker.record_exit(activity.id).await.unwrap();
    assert_eq!(completed.status, ActivityStatus::Completed);
    assert_eq!(completed.exit_time, Some(h.clock.now()));
    let duration = completed.duration_hours.unwrap();
    assert!((duration - 2.0).abs() < 1e-9);
    assert_eq!(available_spaces(&h, location.id).await, 5);
}

#[tokio::test]
async fn entry_is_rejected_when_full() {
    let h = setup();
    let first = register_vehicle(&h, "GH-001").await;
    let second = register_vehicle(&h, "GH-002").await;
    let location = create_location(&h, "P1", 1).await;

    h.tracker
        .record_entry(first.id, location.id, h.user)
        .await
        .unwrap();
    let err = h
        .tracker
        .record_entry(second.id, location.id, h.user)
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::NoCapacity);
    assert_eq!(available_spaces(&h, location.id).await, 0);
}

#[tokio::test]
async fn a_vehicle_cannot_be_inside_two_locations() {
    let h = setup();
    let vehicle = register_vehicle(&h, "GH-001").await;
    let garage_a = create_location(&h, "P1", 5).await;
    let garage_b = create_location(&h, "P2", 5).await;

    h.tracker
        .record_entry(vehicle.id, garage_a.id, h.user)
        .await
        .unwrap();
    let err = h
        .tracker
        .record_entry(vehicle.id, garage_b.id, h.user)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ParkingError::InvalidState("vehicle is already parked in another location")
    );
    // The losing entry took nothing from the second garage.
    assert_eq!(available_spaces(&h, garage_b.id).await, 5);
}

#[tokio::test]
async fn exit_twice_is_rejected() {
    let h = setup();
    let vehicle = register_vehicle(&h, "GH-001").await;
    let location = create_location(&h, "P1", 5).await;

    let activity = h
        .tracker
        .record_entry(vehicle.id, location.id, h.user)
        .await
        .unwrap();
    h.tracker.record_exit(activity.id).await.unwrap();

    let err = h.tracker.record_exit(activity.id).await.unwrap_err();
    assert_eq!(err, ParkingError::InvalidState("vehicle has already exited"));
    // The second attempt did not double-increment the counter.
    assert_eq!(available_spaces(&h, location.id).await, 5);
}

#[tokio::test]
async fn missing_references_are_not_found() {
    let h = setup();
    let vehicle = register_vehicle(&h, "GH-001").await;
    let location = create_location(&h, "P1", 5).await;

    let err = h
        .tracker
        .record_entry(VehicleId::new(), location.id, h.user)
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::NotFound("vehicle"));

    let err = h
        .tracker
        .record_entry(vehicle.id, LocationId::new(), h.user)
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::NotFound("parking location"));
}

#[tokio::test]
async fn entry_ticket_projects_activity_vehicle_and_location() {
    let h = setup();
    let vehicle = register_vehicle(&h, "GH-001").await;
    let location = create_location(&h, "P1", 5).await;
    let activity = h
        .tracker
        .record_entry(vehicle.id, location.id, h.user)
        .await
        .unwrap();

    let ticket = h.tracker.generate_entry_ticket(activity.id).await.unwrap();
    assert_eq!(ticket.ticket_number, activity.ticket_number);
    assert_eq!(ticket.plate_number, "GH-001");
    assert_eq!(ticket.vehicle_type, VehicleType::Car);
    assert_eq!(ticket.entry_time, activity.entry_time);
    assert_eq!(ticket.location_code, "P1");
    assert_eq!(ticket.location_name, "P1 garage");
    assert_eq!(ticket.address, "1 Main St");
    assert!((ticket.fee_per_hour - 2.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn summary_estimates_until_exit() {
    let h = setup();
    let vehicle = register_vehicle(&h, "GH-001").await;
    let location = create_location(&h, "P1", 5).await;
    let activity = h
        .tracker
        .record_entry(vehicle.id, location.id, h.user)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(90));
    let preview = h.tracker.generate_summary(activity.id).await.unwrap();
    assert!(preview.is_estimate);
    assert_eq!(preview.exit_time, h.clock.now());
    assert!((preview.duration_hours - 1.5).abs() < 1e-9);

    h.clock.advance(Duration::minutes(30));
    h.tracker.record_exit(activity.id).await.unwrap();

    let settled = h.tracker.generate_summary(activity.id).await.unwrap();
    assert!(!settled.is_estimate);
    assert!((settled.duration_hours - 2.0).abs() < 1e-9);

    // The stored duration no longer moves with the clock.
    h.clock.advance(Duration::hours(4));
    let later = h.tracker.generate_summary(activity.id).await.unwrap();
    assert!((later.duration_hours - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn listings_filter_by_status_and_date_ranges() {
    let h = setup();
    let first = register_vehicle(&h, "GH-001").await;
    let second = register_vehicle(&h, "GH-002").await;
    let location = create_location(&h, "P1", 5).await;

    let entered_first = h.clock.now();
    let activity_first = h
        .tracker
        .record_entry(first.id, location.id, h.user)
        .await
        .unwrap();

    h.clock.advance(Duration::hours(1));
    let entered_second = h.clock.now();
    h.tracker
        .record_entry(second.id, location.id, h.user)
        .await
        .unwrap();

    h.clock.advance(Duration::hours(1));
    h.tracker.record_exit(activity_first.id).await.unwrap();
    let exited_first = h.clock.now();

    let active = h.tracker.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].vehicle.id, second.id);
    assert_eq!(active[0].location.id, location.id);
    assert_eq!(active[0].recorded_by.id, h.user);

    let entries = h
        .tracker
        .list_by_entry_range(entered_first, entered_second)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    // Newest entry first.
    assert_eq!(entries[0].vehicle.id, second.id);

    let only_first = h
        .tracker
        .list_by_entry_range(entered_first, entered_first)
        .await
        .unwrap();
    assert_eq!(only_first.len(), 1);

    let exits = h
        .tracker
        .list_completed_by_exit_range(exited_first, exited_first)
        .await
        .unwrap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].vehicle.id, first.id);

    let none = h
        .tracker
        .list_completed_by_exit_range(
            exited_first + Duration::hours(1),
            exited_first + Duration::hours(2),
        )
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn location_registry_guards_codes_and_occupancy() {
    let h = setup();
    let vehicle = register_vehicle(&h, "GH-001").await;
    let garage_a = create_location(&h, "P1", 5).await;
    let garage_b = create_location(&h, "P2", 5).await;

    // Duplicate code on create.
    let err = h
        .counter
        .create_location(NewLocation {
            code: "P1".to_string(),
            name: "other".to_string(),
            address: "2 Main St".to_string(),
            total_spaces: 3,
            fee_per_hour: 1.0,
        })
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::DuplicateCode("P1".to_string()));

    // Duplicate code on update.
    let err = h
        .counter
        .update_location(
            garage_b.id,
            parkline_core::providers::LocationUpdate {
                code: Some("P1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::DuplicateCode("P1".to_string()));

    // Lookup by code.
    let by_code = h.counter.get_location_by_code("P2").await.unwrap();
    assert_eq!(by_code.id, garage_b.id);

    // Deletion is rejected while a vehicle is inside, allowed after exit.
    let activity = h
        .tracker
        .record_entry(vehicle.id, garage_a.id, h.user)
        .await
        .unwrap();
    let err = h.counter.delete_location(garage_a.id).await.unwrap_err();
    assert!(matches!(err, ParkingError::InvalidState(_)));

    h.tracker.record_exit(activity.id).await.unwrap();
    h.counter.delete_location(garage_a.id).await.unwrap();
    let err = h.counter.get_location(garage_a.id).await.unwrap_err();
    assert_eq!(err, ParkingError::NotFound("parking location"));
}

/// Delegates to the in-memory store but rejects the first `failures` entry
/// inserts with a ticket collision, recording every number it was offered.
struct CollidingActivityStore {
    inner: MemoryActivityStore,
    failures: AtomicU32,
    offered: Mutex<Vec<String>>,
}

impl CollidingActivityStore {
    fn new(inner: MemoryActivityStore, failures: u32) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(failures),
            offered: Mutex::new(Vec::new()),
        }
    }

    fn offered(&self) -> Vec<String> {
        self.offered.lock().unwrap().clone()
    }
}

impl ActivityStore for CollidingActivityStore {
    async fn insert_active_taking_space(
        &self,
        activity: NewActivity,
    ) -> parkline_core::error::Result<ParkingActivity> {
        self.offered
            .lock()
            .unwrap()
            .push(activity.ticket_number.clone());
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ParkingError::DuplicateTicket);
        }
        self.inner.insert_active_taking_space(activity).await
    }

    async fn complete_returning_space(
        &self,
        id: ActivityId,
        exit_time: DateTime<Utc>,
        duration_hours: f64,
    ) -> parkline_core::error::Result<ParkingActivity> {
        self.inner
            .complete_returning_space(id, exit_time, duration_hours)
            .await
    }

    async fn get(&self, id: ActivityId) -> parkline_core::error::Result<ParkingActivity> {
        self.inner.get(id).await
    }

    async fn get_detailed(&self, id: ActivityId) -> parkline_core::error::Result<ActivityDetails> {
        self.inner.get_detailed(id).await
    }

    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> parkline_core::error::Result<Option<ParkingActivity>> {
        self.inner.find_active_for_vehicle(vehicle_id).await
    }

    async fn list_active(&self) -> parkline_core::error::Result<Vec<ActivityDetails>> {
        self.inner.list_active().await
    }

    async fn list_by_entry_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> parkline_core::error::Result<Vec<ActivityDetails>> {
        self.inner.list_by_entry_range(start, end).await
    }

    async fn list_completed_by_exit_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> parkline_core::error::Result<Vec<ActivityDetails>> {
        self.inner.list_completed_by_exit_range(start, end).await
    }
}

fn colliding_tracker(
    db: &MemoryDb,
    failures: u32,
    ticket: TicketConfig,
) -> (
    Arc<CollidingActivityStore>,
    ActivityTracker<CollidingActivityStore, MemoryLocationStore, MemoryVehicleStore, TestClock>,
) {
    let store = Arc::new(CollidingActivityStore::new(db.activities(), failures));
    let tracker = ActivityTracker::new(
        Arc::clone(&store),
        Arc::new(db.locations()),
        Arc::new(db.vehicles()),
        Arc::new(TestClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).single().unwrap(),
        )),
        ticket,
    );
    (store, tracker)
}

/// Seed a user, vehicle, and five-space location into a fresh database.
async fn seed_colliding_fixture(db: &MemoryDb) -> (UserId, Vehicle, ParkingLocation) {
    let user = UserId::new();
    db.seed_user(UserProfile {
        id: user,
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        role: Role::Admin,
    })
    .unwrap();
    let vehicle = db
        .vehicles()
        .insert(NewVehicle {
            plate_number: "GH-001".to_string(),
            vehicle_type: VehicleType::Car,
            owner_id: user,
        })
        .await
        .unwrap();
    let location = db
        .locations()
        .insert(NewLocation {
            code: "P1".to_string(),
            name: "P1 garage".to_string(),
            address: "1 Main St".to_string(),
            total_spaces: 5,
            fee_per_hour: 2.5,
        })
        .await
        .unwrap();
    (user, vehicle, location)
}

#[tokio::test]
async fn ticket_collisions_are_retried_with_fresh_numbers() {
    let db = MemoryDb::new();
    let (user, vehicle, location) = seed_colliding_fixture(&db).await;

    let (store, tracker) = colliding_tracker(&db, 2, TicketConfig::default());
    let activity = tracker
        .record_entry(vehicle.id, location.id, user)
        .await
        .unwrap();

    // Two collisions, then a fresh number landed; one space taken in total.
    let offered = store.offered();
    assert_eq!(offered.len(), 3);
    assert_eq!(offered[2], activity.ticket_number);
    for ticket in &offered {
        assert!(ticket.starts_with("TICKET-"));
    }
    // Each retry drew a fresh number rather than resubmitting the old one.
    assert_ne!(offered[0], offered[1]);
    assert_ne!(offered[1], offered[2]);
    assert_eq!(
        db.locations().get(location.id).await.unwrap().available_spaces,
        4
    );
}

#[tokio::test]
async fn ticket_retry_gives_up_after_the_configured_bound() {
    let db = MemoryDb::new();
    let (user, vehicle, location) = seed_colliding_fixture(&db).await;

    let (store, tracker) = colliding_tracker(
        &db,
        u32::MAX,
        TicketConfig::default().with_max_attempts(3),
    );
    let err = tracker
        .record_entry(vehicle.id, location.id, user)
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::DuplicateTicket);
    assert_eq!(store.offered().len(), 3);

    // The failed attempts took nothing from the counter.
    assert_eq!(
        db.locations().get(location.id).await.unwrap().available_spaces,
        5
    );
}

#[tokio::test]
async fn counter_primitives_defend_their_bounds() {
    let h = setup();
    let location = create_location(&h, "P1", 2).await;

    // Increment past total is refused.
    let err = h.counter.increment(location.id).await.unwrap_err();
    assert_eq!(err, ParkingError::BoundsError);

    // Decrement below zero is refused.
    h.counter.decrement(location.id).await.unwrap();
    h.counter.decrement(location.id).await.unwrap();
    let err = h.counter.decrement(location.id).await.unwrap_err();
    assert_eq!(err, ParkingError::NoCapacity);

    let row = h.counter.get_location(location.id).await.unwrap();
    assert_eq!(row.available_spaces, 0);

    h.counter.increment(location.id).await.unwrap();
    assert_eq!(available_spaces(&h, location.id).await, 1);
}
