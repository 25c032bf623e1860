//! Shared-table in-memory store.

use crate::error::{ParkingError, Result};
use crate::providers::{
    ActivityStore, BookingStore, LocationStore, LocationUpdate, NewActivity, NewBooking,
    NewLocation, NewSlot, NewVehicle, SlotStore, VehicleStore,
};
use crate::state::{
    ActivityDetails, ActivityId, ActivityStatus, Booking, BookingAdminView, BookingDetails,
    BookingId, BookingStatus, LocationId, ParkingActivity, ParkingLocation, ParkingSlot, SlotId,
    UserId, UserProfile, Vehicle, VehicleId,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    slots: HashMap<SlotId, ParkingSlot>,
    bookings: HashMap<BookingId, Booking>,
    locations: HashMap<LocationId, ParkingLocation>,
    activities: HashMap<ActivityId, ParkingActivity>,
    vehicles: HashMap<VehicleId, Vehicle>,
    users: HashMap<UserId, UserProfile>,
    // Booking ids whose next overstay transition fails, for testing the
    // sweeper's per-row error isolation.
    overstay_failures: HashSet<BookingId>,
}

type Shared = Arc<Mutex<Tables>>;

fn lock(shared: &Shared) -> Result<MutexGuard<'_, Tables>> {
    shared
        .lock()
        .map_err(|_| ParkingError::Database("store lock poisoned".to_string()))
}

/// In-memory database handing out per-concern store handles.
///
/// All handles share one set of tables behind a single mutex; each store
/// method takes the lock once, so the composite operations (insert a
/// booking + claim its slot, take a space + insert an activity) are atomic
/// the way a database transaction would be, and concurrent callers observe
/// exactly one winner.
#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    inner: Shared,
}

impl MemoryDb {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot store handle.
    #[must_use]
    pub fn slots(&self) -> MemorySlotStore {
        MemorySlotStore {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Booking store handle.
    #[must_use]
    pub fn bookings(&self) -> MemoryBookingStore {
        MemoryBookingStore {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Location store handle.
    #[must_use]
    pub fn locations(&self) -> MemoryLocationStore {
        MemoryLocationStore {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Activity store handle.
    #[must_use]
    pub fn activities(&self) -> MemoryActivityStore {
        MemoryActivityStore {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Vehicle store handle.
    #[must_use]
    pub fn vehicles(&self) -> MemoryVehicleStore {
        MemoryVehicleStore {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Seed a user profile so owner/recording-user joins resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn seed_user(&self, user: UserProfile) -> Result<()> {
        lock(&self.inner)?.users.insert(user.id, user);
        Ok(())
    }

    /// Make the next overstay transition of `id` fail once, to exercise
    /// the sweeper's per-row error isolation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn fail_next_overstay_mark(&self, id: BookingId) -> Result<()> {
        lock(&self.inner)?.overstay_failures.insert(id);
        Ok(())
    }
}

fn booking_details(tables: &Tables, booking: &Booking) -> Result<BookingDetails> {
    let slot = tables
        .slots
        .get(&booking.slot_id)
        .cloned()
        .ok_or(ParkingError::NotFound("parking slot"))?;
    let vehicle = tables
        .vehicles
        .get(&booking.vehicle_id)
        .cloned()
        .ok_or(ParkingError::NotFound("vehicle"))?;
    Ok(BookingDetails {
        booking: booking.clone(),
        slot,
        vehicle,
    })
}

fn activity_details(tables: &Tables, activity: &ParkingActivity) -> Result<ActivityDetails> {
    let vehicle = tables
        .vehicles
        .get(&activity.vehicle_id)
        .cloned()
        .ok_or(ParkingError::NotFound("vehicle"))?;
    let location = tables
        .locations
        .get(&activity.location_id)
        .cloned()
        .ok_or(ParkingError::NotFound("parking location"))?;
    let recorded_by = tables
        .users
        .get(&activity.recorded_by)
        .cloned()
        .ok_or(ParkingError::NotFound("user"))?;
    Ok(ActivityDetails {
        activity: activity.clone(),
        vehicle,
        location,
        recorded_by,
    })
}

/// In-memory [`SlotStore`].
#[derive(Debug, Clone)]
pub struct MemorySlotStore {
    inner: Shared,
}

impl SlotStore for MemorySlotStore {
    async fn insert(&self, slot: NewSlot) -> Result<ParkingSlot> {
        let mut tables = lock(&self.inner)?;
        if tables.slots.values().any(|s| s.number == slot.number) {
            return Err(ParkingError::DuplicateNumber(vec![slot.number]));
        }
        let created = ParkingSlot {
            id: SlotId::new(),
            number: slot.number,
            floor: slot.floor,
            is_available: slot.is_available,
            vehicle_id: None,
        };
        tables.slots.insert(created.id, created.clone());
        Ok(created)
    }

    async fn insert_bulk(&self, slots: Vec<NewSlot>) -> Result<u64> {
        let mut tables = lock(&self.inner)?;
        let mut collisions = Vec::new();
        let mut seen = HashSet::new();
        for slot in &slots {
            let exists = tables.slots.values().any(|s| s.number == slot.number);
            if exists || !seen.insert(slot.number.clone()) {
                collisions.push(slot.number.clone());
            }
        }
        if !collisions.is_empty() {
            return Err(ParkingError::DuplicateNumber(collisions));
        }
        let count = slots.len() as u64;
        for slot in slots {
            let created = ParkingSlot {
                id: SlotId::new(),
                number: slot.number,
                floor: slot.floor,
                is_available: slot.is_available,
                vehicle_id: None,
            };
            tables.slots.insert(created.id, created);
        }
        Ok(count)
    }

    async fn get(&self, id: SlotId) -> Result<ParkingSlot> {
        lock(&self.inner)?
            .slots
            .get(&id)
            .cloned()
            .ok_or(ParkingError::NotFound("parking slot"))
    }

    async fn list(&self) -> Result<Vec<ParkingSlot>> {
        let tables = lock(&self.inner)?;
        let mut slots: Vec<_> = tables.slots.values().cloned().collect();
        slots.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(slots)
    }

    async fn list_available(&self) -> Result<Vec<ParkingSlot>> {
        let tables = lock(&self.inner)?;
        let mut slots: Vec<_> = tables
            .slots
            .values()
            .filter(|s| s.is_available)
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(slots)
    }

    async fn claim(&self, id: SlotId, vehicle_id: VehicleId) -> Result<bool> {
        let mut tables = lock(&self.inner)?;
        let slot = tables
            .slots
            .get_mut(&id)
            .ok_or(ParkingError::NotFound("parking slot"))?;
        if !slot.is_available {
            return Ok(false);
        }
        slot.is_available = false;
        slot.vehicle_id = Some(vehicle_id);
        Ok(true)
    }

    async fn release(&self, id: SlotId) -> Result<()> {
        let mut tables = lock(&self.inner)?;
        let slot = tables
            .slots
            .get_mut(&id)
            .ok_or(ParkingError::NotFound("parking slot"))?;
        slot.is_available = true;
        slot.vehicle_id = None;
        Ok(())
    }
}

/// In-memory [`BookingStore`].
#[derive(Debug, Clone)]
pub struct MemoryBookingStore {
    inner: Shared,
}

impl BookingStore for MemoryBookingStore {
    async fn insert_active_claiming_slot(&self, booking: NewBooking) -> Result<Booking> {
        let mut tables = lock(&self.inner)?;
        let slot = tables
            .slots
            .get_mut(&booking.slot_id)
            .ok_or(ParkingError::NotFound("parking slot"))?;
        if !slot.is_available {
            return Err(ParkingError::Unavailable);
        }
        slot.is_available = false;
        slot.vehicle_id = Some(booking.vehicle_id);

        let created = Booking {
            id: BookingId::new(),
            slot_id: booking.slot_id,
            vehicle_id: booking.vehicle_id,
            start_time: booking.start_time,
            expected_end_time: None,
            actual_end_time: None,
            status: BookingStatus::Active,
        };
        tables.bookings.insert(created.id, created.clone());
        Ok(created)
    }

    async fn finish_releasing_slot(
        &self,
        id: BookingId,
        status: BookingStatus,
        ended_at: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut tables = lock(&self.inner)?;
        let booking = tables
            .bookings
            .get_mut(&id)
            .ok_or(ParkingError::NotFound("booking"))?;
        if booking.status != BookingStatus::Active {
            return Err(ParkingError::InvalidState("booking is not active"));
        }
        booking.status = status;
        booking.actual_end_time = Some(ended_at);
        let finished = booking.clone();

        if let Some(slot) = tables.slots.get_mut(&finished.slot_id) {
            slot.is_available = true;
            slot.vehicle_id = None;
        }
        Ok(finished)
    }

    async fn set_expected_end(
        &self,
        id: BookingId,
        expected_end: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut tables = lock(&self.inner)?;
        let booking = tables
            .bookings
            .get_mut(&id)
            .ok_or(ParkingError::NotFound("booking"))?;
        if booking.status != BookingStatus::Active {
            return Err(ParkingError::InvalidState("booking is not active"));
        }
        booking.expected_end_time = Some(expected_end);
        Ok(booking.clone())
    }

    async fn get(&self, id: BookingId) -> Result<Booking> {
        lock(&self.inner)?
            .bookings
            .get(&id)
            .cloned()
            .ok_or(ParkingError::NotFound("booking"))
    }

    async fn get_detailed(&self, id: BookingId) -> Result<BookingDetails> {
        let tables = lock(&self.inner)?;
        let booking = tables
            .bookings
            .get(&id)
            .ok_or(ParkingError::NotFound("booking"))?;
        booking_details(&tables, booking)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingDetails>> {
        let tables = lock(&self.inner)?;
        let mut details = Vec::new();
        for booking in tables.bookings.values() {
            let owned = tables
                .vehicles
                .get(&booking.vehicle_id)
                .is_some_and(|v| v.owner_id == user_id);
            if owned {
                details.push(booking_details(&tables, booking)?);
            }
        }
        details.sort_by(|a, b| b.booking.start_time.cmp(&a.booking.start_time));
        Ok(details)
    }

    async fn list_all_admin(&self) -> Result<Vec<BookingAdminView>> {
        let tables = lock(&self.inner)?;
        let mut views = Vec::new();
        for booking in tables.bookings.values() {
            let details = booking_details(&tables, booking)?;
            let owner = tables
                .users
                .get(&details.vehicle.owner_id)
                .cloned()
                .ok_or(ParkingError::NotFound("user"))?;
            views.push(BookingAdminView {
                booking: details.booking,
                slot: details.slot,
                vehicle: details.vehicle,
                owner,
            });
        }
        views.sort_by(|a, b| b.booking.start_time.cmp(&a.booking.start_time));
        Ok(views)
    }

    async fn list_expired_active(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Booking>> {
        let tables = lock(&self.inner)?;
        let mut expired: Vec<_> = tables
            .bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Active
                    && b.expected_end_time.is_some_and(|end| end < now)
            })
            .cloned()
            .collect();
        expired.sort_by(|a, b| a.expected_end_time.cmp(&b.expected_end_time));
        expired.truncate(limit as usize);
        Ok(expired)
    }

    async fn mark_overstayed(&self, id: BookingId) -> Result<bool> {
        let mut tables = lock(&self.inner)?;
        if tables.overstay_failures.remove(&id) {
            return Err(ParkingError::Database("injected failure".to_string()));
        }
        match tables.bookings.get_mut(&id) {
            Some(booking) if booking.status == BookingStatus::Active => {
                booking.status = BookingStatus::Overstay;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// In-memory [`LocationStore`].
#[derive(Debug, Clone)]
pub struct MemoryLocationStore {
    inner: Shared,
}

impl LocationStore for MemoryLocationStore {
    async fn insert(&self, location: NewLocation) -> Result<ParkingLocation> {
        let mut tables = lock(&self.inner)?;
        if tables.locations.values().any(|l| l.code == location.code) {
            return Err(ParkingError::DuplicateCode(location.code));
        }
        let created = ParkingLocation {
            id: LocationId::new(),
            code: location.code,
            name: location.name,
            address: location.address,
            total_spaces: location.total_spaces,
            available_spaces: location.total_spaces,
            fee_per_hour: location.fee_per_hour,
        };
        tables.locations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: LocationId) -> Result<ParkingLocation> {
        lock(&self.inner)?
            .locations
            .get(&id)
            .cloned()
            .ok_or(ParkingError::NotFound("parking location"))
    }

    async fn get_by_code(&self, code: &str) -> Result<ParkingLocation> {
        lock(&self.inner)?
            .locations
            .values()
            .find(|l| l.code == code)
            .cloned()
            .ok_or(ParkingError::NotFound("parking location"))
    }

    async fn list(&self) -> Result<Vec<ParkingLocation>> {
        let tables = lock(&self.inner)?;
        let mut locations: Vec<_> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(locations)
    }

    async fn update(&self, id: LocationId, update: LocationUpdate) -> Result<ParkingLocation> {
        let mut tables = lock(&self.inner)?;
        if let Some(code) = &update.code {
            let taken = tables
                .locations
                .values()
                .any(|l| l.id != id && l.code == *code);
            if taken {
                return Err(ParkingError::DuplicateCode(code.clone()));
            }
        }
        let location = tables
            .locations
            .get_mut(&id)
            .ok_or(ParkingError::NotFound("parking location"))?;
        if let Some(code) = update.code {
            location.code = code;
        }
        if let Some(name) = update.name {
            location.name = name;
        }
        if let Some(address) = update.address {
            location.address = address;
        }
        if let Some(fee) = update.fee_per_hour {
            location.fee_per_hour = fee;
        }
        Ok(location.clone())
    }

    async fn delete(&self, id: LocationId) -> Result<()> {
        let mut tables = lock(&self.inner)?;
        if !tables.locations.contains_key(&id) {
            return Err(ParkingError::NotFound("parking location"));
        }
        let occupied = tables
            .activities
            .values()
            .any(|a| a.location_id == id && a.exit_time.is_none());
        if occupied {
            return Err(ParkingError::InvalidState(
                "cannot delete a parking location with vehicles inside",
            ));
        }
        tables.locations.remove(&id);
        Ok(())
    }

    async fn adjust_spaces(&self, id: LocationId, delta: i32) -> Result<ParkingLocation> {
        let mut tables = lock(&self.inner)?;
        let location = tables
            .locations
            .get_mut(&id)
            .ok_or(ParkingError::NotFound("parking location"))?;
        let next = location.available_spaces + delta;
        if next < 0 {
            return Err(ParkingError::NoCapacity);
        }
        if next > location.total_spaces {
            return Err(ParkingError::BoundsError);
        }
        location.available_spaces = next;
        Ok(location.clone())
    }
}

/// In-memory [`ActivityStore`].
#[derive(Debug, Clone)]
pub struct MemoryActivityStore {
    inner: Shared,
}

impl ActivityStore for MemoryActivityStore {
    async fn insert_active_taking_space(&self, activity: NewActivity) -> Result<ParkingActivity> {
        let mut tables = lock(&self.inner)?;
        let already_inside = tables
            .activities
            .values()
            .any(|a| a.vehicle_id == activity.vehicle_id && a.status == ActivityStatus::Active);
        if already_inside {
            return Err(ParkingError::InvalidState(
                "vehicle is already parked in another location",
            ));
        }
        let ticket_taken = tables
            .activities
            .values()
            .any(|a| a.ticket_number == activity.ticket_number);
        if ticket_taken {
            return Err(ParkingError::DuplicateTicket);
        }

        let location = tables
            .locations
            .get_mut(&activity.location_id)
            .ok_or(ParkingError::NotFound("parking location"))?;
        if location.available_spaces <= 0 {
            return Err(ParkingError::NoCapacity);
        }
        location.available_spaces -= 1;

        let created = ParkingActivity {
            id: ActivityId::new(),
            vehicle_id: activity.vehicle_id,
            location_id: activity.location_id,
            recorded_by: activity.recorded_by,
            ticket_number: activity.ticket_number,
            entry_time: activity.entry_time,
            exit_time: None,
            duration_hours: None,
            status: ActivityStatus::Active,
        };
        tables.activities.insert(created.id, created.clone());
        Ok(created)
    }

    async fn complete_returning_space(
        &self,
        id: ActivityId,
        exit_time: DateTime<Utc>,
        duration_hours: f64,
    ) -> Result<ParkingActivity> {
        let mut tables = lock(&self.inner)?;
        let activity = tables
            .activities
            .get(&id)
            .ok_or(ParkingError::NotFound("parking activity"))?;
        if activity.status != ActivityStatus::Active {
            return Err(ParkingError::InvalidState("vehicle has already exited"));
        }
        let location_id = activity.location_id;

        let location = tables
            .locations
            .get_mut(&location_id)
            .ok_or(ParkingError::NotFound("parking location"))?;
        if location.available_spaces >= location.total_spaces {
            return Err(ParkingError::BoundsError);
        }
        location.available_spaces += 1;

        let activity = tables
            .activities
            .get_mut(&id)
            .ok_or(ParkingError::NotFound("parking activity"))?;
        activity.exit_time = Some(exit_time);
        activity.duration_hours = Some(duration_hours);
        activity.status = ActivityStatus::Completed;
        Ok(activity.clone())
    }

    async fn get(&self, id: ActivityId) -> Result<ParkingActivity> {
        lock(&self.inner)?
            .activities
            .get(&id)
            .cloned()
            .ok_or(ParkingError::NotFound("parking activity"))
    }

    async fn get_detailed(&self, id: ActivityId) -> Result<ActivityDetails> {
        let tables = lock(&self.inner)?;
        let activity = tables
            .activities
            .get(&id)
            .ok_or(ParkingError::NotFound("parking activity"))?;
        activity_details(&tables, activity)
    }

    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<ParkingActivity>> {
        Ok(lock(&self.inner)?
            .activities
            .values()
            .find(|a| a.vehicle_id == vehicle_id && a.status == ActivityStatus::Active)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<ActivityDetails>> {
        let tables = lock(&self.inner)?;
        let mut details = Vec::new();
        for activity in tables.activities.values() {
            if activity.status == ActivityStatus::Active {
                details.push(activity_details(&tables, activity)?);
            }
        }
        details.sort_by(|a, b| b.activity.entry_time.cmp(&a.activity.entry_time));
        Ok(details)
    }

    async fn list_by_entry_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>> {
        let tables = lock(&self.inner)?;
        let mut details = Vec::new();
        for activity in tables.activities.values() {
            if activity.entry_time >= start && activity.entry_time <= end {
                details.push(activity_details(&tables, activity)?);
            }
        }
        details.sort_by(|a, b| b.activity.entry_time.cmp(&a.activity.entry_time));
        Ok(details)
    }

    async fn list_completed_by_exit_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>> {
        let tables = lock(&self.inner)?;
        let mut details = Vec::new();
        for activity in tables.activities.values() {
            let in_range = activity.status == ActivityStatus::Completed
                && activity
                    .exit_time
                    .is_some_and(|exit| exit >= start && exit <= end);
            if in_range {
                details.push(activity_details(&tables, activity)?);
            }
        }
        details.sort_by(|a, b| b.activity.entry_time.cmp(&a.activity.entry_time));
        Ok(details)
    }
}

/// In-memory [`VehicleStore`].
#[derive(Debug, Clone)]
pub struct MemoryVehicleStore {
    inner: Shared,
}

impl VehicleStore for MemoryVehicleStore {
    async fn insert(&self, vehicle: NewVehicle) -> Result<Vehicle> {
        let mut tables = lock(&self.inner)?;
        if tables
            .vehicles
            .values()
            .any(|v| v.plate_number == vehicle.plate_number)
        {
            return Err(ParkingError::DuplicatePlate(vehicle.plate_number));
        }
        let created = Vehicle {
            id: VehicleId::new(),
            plate_number: vehicle.plate_number,
            vehicle_type: vehicle.vehicle_type,
            owner_id: vehicle.owner_id,
        };
        tables.vehicles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: VehicleId) -> Result<Vehicle> {
        lock(&self.inner)?
            .vehicles
            .get(&id)
            .cloned()
            .ok_or(ParkingError::NotFound("vehicle"))
    }

    async fn list_for_user(&self, owner_id: UserId) -> Result<Vec<Vehicle>> {
        let tables = lock(&self.inner)?;
        let mut vehicles: Vec<_> = tables
            .vehicles
            .values()
            .filter(|v| v.owner_id == owner_id)
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.plate_number.cmp(&b.plate_number));
        Ok(vehicles)
    }
}
