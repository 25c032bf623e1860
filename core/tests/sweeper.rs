//! Overstay sweeper tests: expiry detection, idempotence, per-row error
//! isolation, and the run loop's shutdown signal.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::{Duration, TimeZone, Utc};
use parkline_core::config::SweeperConfig;
use parkline_core::engines::{BookingEngine, OverstaySweeper};
use parkline_core::environment::Clock;
use parkline_core::mocks::{
    MemoryBookingStore, MemoryDb, MemorySlotStore, MemoryVehicleStore, TestClock,
};
use parkline_core::providers::{BookingStore, NewSlot, NewVehicle, SlotStore, VehicleStore};
use parkline_core::state::{Booking, BookingStatus, Role, UserId, UserProfile, VehicleType};
use std::sync::Arc;
use tokio::sync::watch;

type Engine = BookingEngine<MemoryBookingStore, MemorySlotStore, MemoryVehicleStore, TestClock>;
type Sweeper = OverstaySweeper<MemoryBookingStore, TestClock>;

struct Harness {
    db: MemoryDb,
    clock: Arc<TestClock>,
    engine: Engine,
    sweeper: Sweeper,
    user: UserId,
}

fn setup() -> Harness {
    let db = MemoryDb::new();
    let clock = Arc::new(TestClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap(),
    ));
    let engine = BookingEngine::new(
        Arc::new(db.bookings()),
        Arc::new(db.slots()),
        Arc::new(db.vehicles()),
        Arc::clone(&clock),
    );
    let sweeper = OverstaySweeper::new(
        Arc::new(db.bookings()),
        Arc::clone(&clock),
        SweeperConfig::default(),
    );

    let user = UserId::new();
    db.seed_user(UserProfile {
        id: user,
        first_name: "Alan".to_string(),
        last_name: "Turing".to_string(),
        email: "alan@example.com".to_string(),
        role: Role::User,
    })
    .unwrap();

    Harness {
        db,
        clock,
        engine,
        sweeper,
        user,
    }
}

/// Book a fresh slot and give the booking an expected end `hours` from now.
async fn booked_with_expected_end(h: &Harness, tag: &str, hours: u32) -> Booking {
    let slot = h
        .db
        .slots()
        .insert(NewSlot::new(format!("S-{tag}"), 1))
        .await
        .unwrap();
    let vehicle = h
        .db
        .vehicles()
        .insert(NewVehicle {
            plate_number: format!("PL-{tag}"),
            vehicle_type: VehicleType::Car,
            owner_id: h.user,
        })
        .await
        .unwrap();
    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();
    h.engine.extend(booking.id, hours).await.unwrap()
}

#[tokio::test]
async fn expired_active_bookings_become_overstay() {
    let h = setup();
    let expired = booked_with_expected_end(&h, "a", 1).await;
    let current = booked_with_expected_end(&h, "b", 5).await;

    h.clock.advance(Duration::hours(2));
    let transitioned = h.sweeper.sweep_once().await.unwrap();
    assert_eq!(transitioned, 1);

    let expired = h.db.bookings().get(expired.id).await.unwrap();
    assert_eq!(expired.status, BookingStatus::Overstay);
    // The expected end stays put as the overstay evidence.
    assert!(expired.expected_end_time.is_some());
    assert!(expired.actual_end_time.is_none());

    let current = h.db.bookings().get(current.id).await.unwrap();
    assert_eq!(current.status, BookingStatus::Active);

    // Overstay signals billing, not vacancy: the slot stays claimed.
    let slot = h.db.slots().get(expired.slot_id).await.unwrap();
    assert!(!slot.is_available);
}

#[tokio::test]
async fn second_sweep_finds_nothing_new() {
    let h = setup();
    booked_with_expected_end(&h, "a", 1).await;

    h.clock.advance(Duration::hours(2));
    assert_eq!(h.sweeper.sweep_once().await.unwrap(), 1);
    assert_eq!(h.sweeper.sweep_once().await.unwrap(), 0);
}

#[tokio::test]
async fn open_ended_bookings_are_never_swept() {
    let h = setup();
    let slot = h
        .db
        .slots()
        .insert(NewSlot::new("S-open".to_string(), 1))
        .await
        .unwrap();
    let vehicle = h
        .db
        .vehicles()
        .insert(NewVehicle {
            plate_number: "PL-open".to_string(),
            vehicle_type: VehicleType::Car,
            owner_id: h.user,
        })
        .await
        .unwrap();
    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();

    h.clock.advance(Duration::days(30));
    assert_eq!(h.sweeper.sweep_once().await.unwrap(), 0);
    let row = h.db.bookings().get(booking.id).await.unwrap();
    assert_eq!(row.status, BookingStatus::Active);
}

#[tokio::test]
async fn one_failing_row_does_not_block_the_batch() {
    let h = setup();
    let poisoned = booked_with_expected_end(&h, "a", 1).await;
    let healthy = booked_with_expected_end(&h, "b", 1).await;
    h.db.fail_next_overstay_mark(poisoned.id).unwrap();

    h.clock.advance(Duration::hours(2));
    let transitioned = h.sweeper.sweep_once().await.unwrap();
    assert_eq!(transitioned, 1);

    let healthy = h.db.bookings().get(healthy.id).await.unwrap();
    assert_eq!(healthy.status, BookingStatus::Overstay);

    // The failed row is untouched and gets picked up by the next run.
    let poisoned_row = h.db.bookings().get(poisoned.id).await.unwrap();
    assert_eq!(poisoned_row.status, BookingStatus::Active);
    assert_eq!(h.sweeper.sweep_once().await.unwrap(), 1);
    let poisoned_row = h.db.bookings().get(poisoned.id).await.unwrap();
    assert_eq!(poisoned_row.status, BookingStatus::Overstay);
}

#[tokio::test]
async fn batch_limit_defers_the_tail_to_the_next_run() {
    let h = setup();
    let sweeper = OverstaySweeper::new(
        Arc::new(h.db.bookings()),
        Arc::clone(&h.clock),
        SweeperConfig::default().with_batch_limit(2),
    );
    for tag in ["a", "b", "c"] {
        booked_with_expected_end(&h, tag, 1).await;
    }

    h.clock.advance(Duration::hours(2));
    assert_eq!(sweeper.sweep_once().await.unwrap(), 2);
    assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
    assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
}

#[tokio::test]
async fn run_loop_sweeps_and_stops_on_shutdown() {
    let h = setup();
    let booking = booked_with_expected_end(&h, "a", 1).await;
    h.clock.advance(Duration::hours(2));

    let sweeper = OverstaySweeper::new(
        Arc::new(h.db.bookings()),
        Arc::clone(&h.clock),
        SweeperConfig::new(std::time::Duration::from_millis(10)),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(sweeper.run(shutdown_rx));

    // The first tick fires immediately; give it a moment to land.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let row = h.db.bookings().get(booking.id).await.unwrap();
    assert_eq!(row.status, BookingStatus::Overstay);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}
