//! Booking lifecycle tests: create, cancel, extend, release, and the
//! slot/booking consistency invariant.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::{Duration, TimeZone, Utc};
use parkline_core::engines::BookingEngine;
use parkline_core::environment::Clock;
use parkline_core::error::ParkingError;
use parkline_core::mocks::{
    MemoryBookingStore, MemoryDb, MemorySlotStore, MemoryVehicleStore, TestClock,
};
use parkline_core::providers::{NewSlot, NewVehicle, SlotStore, VehicleStore};
use parkline_core::state::{
    BookingStatus, ParkingSlot, Role, SlotId, UserId, UserProfile, Vehicle, VehicleId,
    VehicleType,
};
use std::sync::Arc;

type Engine = BookingEngine<MemoryBookingStore, MemorySlotStore, MemoryVehicleStore, TestClock>;

struct Harness {
    slots: Arc<MemorySlotStore>,
    vehicles: Arc<MemoryVehicleStore>,
    clock: Arc<TestClock>,
    engine: Engine,
    user: UserId,
}

fn setup() -> Harness {
    let db = MemoryDb::new();
    let slots = Arc::new(db.slots());
    let vehicles = Arc::new(db.vehicles());
    let clock = Arc::new(TestClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).single().unwrap(),
    ));
    let engine = BookingEngine::new(
        Arc::new(db.bookings()),
        Arc::clone(&slots),
        Arc::clone(&vehicles),
        Arc::clone(&clock),
    );

    let user = UserId::new();
    db.seed_user(UserProfile {
        id: user,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::User,
    })
    .unwrap();

    Harness {
        slots,
        vehicles,
        clock,
        engine,
        user,
    }
}

async fn register_vehicle(h: &Harness, plate: &str, owner: UserId) -> Vehicle {
    h.vehicles
        .insert(NewVehicle {
            plate_number: plate.to_string(),
            vehicle_type: VehicleType::Car,
            owner_id: owner,
        })
        .await
        .unwrap()
}

async fn create_slot(h: &Harness, number: &str) -> ParkingSlot {
    h.slots
        .insert(NewSlot::new(number.to_string(), 1))
        .await
        .unwrap()
}

#[tokio::test]
async fn booking_claims_the_slot() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot = create_slot(&h, "S1").await;
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).single().unwrap();

    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, start)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Active);
    assert_eq!(booking.start_time, start);
    assert!(booking.expected_end_time.is_none());
    assert!(booking.actual_end_time.is_none());

    let slot = h.slots.get(slot.id).await.unwrap();
    assert!(!slot.is_available);
    assert_eq!(slot.vehicle_id, Some(vehicle.id));
}

#[tokio::test]
async fn second_booking_on_claimed_slot_is_unavailable() {
    let h = setup();
    let first = register_vehicle(&h, "AB-123", h.user).await;
    let second = register_vehicle(&h, "CD-456", h.user).await;
    let slot = create_slot(&h, "S1").await;
    let start = h.clock.now();

    h.engine
        .create(h.user, slot.id, first.id, start)
        .await
        .unwrap();
    let err = h
        .engine
        .create(h.user, slot.id, second.id, start)
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::Unavailable);
}

#[tokio::test]
async fn booking_someone_elses_vehicle_is_rejected() {
    let h = setup();
    let stranger = UserId::new();
    let vehicle = register_vehicle(&h, "AB-123", stranger).await;
    let slot = create_slot(&h, "S1").await;

    let err = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::InvalidOwnership);

    // The failed precondition left the slot untouched.
    let slot = h.slots.get(slot.id).await.unwrap();
    assert!(slot.is_available);
}

#[tokio::test]
async fn missing_references_are_not_found() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot = create_slot(&h, "S1").await;

    let err = h
        .engine
        .create(h.user, SlotId::new(), vehicle.id, h.clock.now())
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::NotFound("parking slot"));

    let err = h
        .engine
        .create(h.user, slot.id, VehicleId::new(), h.clock.now())
        .await
        .unwrap_err();
    assert_eq!(err, ParkingError::NotFound("vehicle"));
}

#[tokio::test]
async fn cancel_releases_the_slot_once() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot = create_slot(&h, "S1").await;
    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(30));
    let cancelled = h.engine.cancel(booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.actual_end_time, Some(h.clock.now()));

    let slot_row = h.slots.get(slot.id).await.unwrap();
    assert!(slot_row.is_available);
    assert_eq!(slot_row.vehicle_id, None);

    // Second cancel is rejected and the slot stays released.
    let err = h.engine.cancel(booking.id).await.unwrap_err();
    assert!(matches!(err, ParkingError::InvalidState(_)));
    let slot_row = h.slots.get(slot.id).await.unwrap();
    assert!(slot_row.is_available);
}

#[tokio::test]
async fn release_completes_the_booking() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot = create_slot(&h, "S1").await;
    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();

    h.clock.advance(Duration::hours(3));
    let completed = h.engine.release(booking.id).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert_eq!(completed.actual_end_time, Some(h.clock.now()));
    assert!(h.slots.get(slot.id).await.unwrap().is_available);
}

#[tokio::test]
async fn slot_frees_up_for_the_next_booking_after_release() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot = create_slot(&h, "S1").await;

    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();
    h.engine.release(booking.id).await.unwrap();

    // The same slot can be booked again now.
    let second = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();
    assert_eq!(second.status, BookingStatus::Active);
}

#[tokio::test]
async fn extend_moves_the_expected_end() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot = create_slot(&h, "S1").await;
    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();

    // No expected end yet: the extension counts from now.
    let extended = h.engine.extend(booking.id, 2).await.unwrap();
    let first_end = h.clock.now() + Duration::hours(2);
    assert_eq!(extended.expected_end_time, Some(first_end));
    // The actual end is untouched by extensions.
    assert!(extended.actual_end_time.is_none());

    // A second extension counts from the current expected end.
    let extended = h.engine.extend(booking.id, 1).await.unwrap();
    assert_eq!(
        extended.expected_end_time,
        Some(first_end + Duration::hours(1))
    );
}

#[tokio::test]
async fn extend_rejects_terminal_bookings() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot = create_slot(&h, "S1").await;
    let booking = h
        .engine
        .create(h.user, slot.id, vehicle.id, h.clock.now())
        .await
        .unwrap();
    h.engine.cancel(booking.id).await.unwrap();

    let err = h.engine.extend(booking.id, 2).await.unwrap_err();
    assert_eq!(
        err,
        ParkingError::InvalidState("only active bookings can be extended")
    );
}

#[tokio::test]
async fn listings_resolve_relations_and_order_by_start_desc() {
    let h = setup();
    let vehicle = register_vehicle(&h, "AB-123", h.user).await;
    let slot_a = create_slot(&h, "S1").await;
    let slot_b = create_slot(&h, "S2").await;

    let early = h.clock.now();
    let booking_a = h
        .engine
        .create(h.user, slot_a.id, vehicle.id, early)
        .await
        .unwrap();
    h.engine.release(booking_a.id).await.unwrap();

    h.clock.advance(Duration::hours(1));
    let late = h.clock.now();
    h.engine
        .create(h.user, slot_b.id, vehicle.id, late)
        .await
        .unwrap();

    let mine = h.engine.list_for_user(h.user).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].booking.start_time, late);
    assert_eq!(mine[1].booking.start_time, early);
    assert_eq!(mine[0].vehicle.id, vehicle.id);
    assert_eq!(mine[0].slot.id, slot_b.id);

    let all = h.engine.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].owner.id, h.user);
    assert_eq!(all[0].owner.email, "ada@example.com");

    let one = h.engine.get(booking_a.id).await.unwrap();
    assert_eq!(one.slot.id, slot_a.id);

    // Another user sees none of these bookings.
    let other = h.engine.list_for_user(UserId::new()).await.unwrap();
    assert!(other.is_empty());
}
