//! Domain state types for the parking inventory.
//!
//! Two independent inventory models live side by side: numbered slots that a
//! booking claims exclusively, and per-location space counters that entry/exit
//! activities move. The types here are plain data; every mutation goes through
//! the engines and their store traits.

use crate::error::{ParkingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Unique identifier for a numbered parking slot.
    SlotId
);
id_type!(
    /// Unique identifier for a booking.
    BookingId
);
id_type!(
    /// Unique identifier for a parking location.
    LocationId
);
id_type!(
    /// Unique identifier for an entry/exit activity.
    ActivityId
);
id_type!(
    /// Unique identifier for a vehicle.
    VehicleId
);
id_type!(
    /// Unique identifier for a user.
    UserId
);

// ═══════════════════════════════════════════════════════════════════════
// Slots and Bookings
// ═══════════════════════════════════════════════════════════════════════

/// A single numbered physical parking space.
///
/// A slot with `vehicle_id` set is never available; the vehicle is the one
/// on the slot's currently active booking. Slots may also be created
/// administratively unavailable with no vehicle. Only the claim/release
/// primitives move these two fields afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSlot {
    /// Slot identifier.
    pub id: SlotId,
    /// Human-visible slot number, unique across the facility.
    pub number: String,
    /// Floor the slot is on.
    pub floor: i32,
    /// Whether the slot can currently be claimed.
    pub is_available: bool,
    /// Vehicle occupying the slot, set iff an active booking holds it.
    pub vehicle_id: Option<VehicleId>,
}

/// Lifecycle status of a [`Booking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    /// The booking holds its slot.
    Active,
    /// Cancelled by the owner before completion.
    Cancelled,
    /// Checked out normally.
    Completed,
    /// Expected end passed while still active; billing/alerting signal.
    Overstay,
}

impl BookingStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
            Self::Overstay => "OVERSTAY",
        }
    }

    /// Parse from the database string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            "OVERSTAY" => Ok(Self::Overstay),
            _ => Err(ParkingError::Database(format!(
                "invalid booking status: {s}"
            ))),
        }
    }

    /// Whether the status is terminal (never transitions further).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// A reservation of one slot for one vehicle over a time window.
///
/// The planned end (moved by extensions, read by the overstay sweeper) and
/// the actual end (stamped on every terminal transition) are deliberately
/// separate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier.
    pub id: BookingId,
    /// The slot this booking claims.
    pub slot_id: SlotId,
    /// The vehicle the slot is claimed for.
    pub vehicle_id: VehicleId,
    /// When the reservation begins.
    pub start_time: DateTime<Utc>,
    /// Planned end, if the booking has been given one by an extension.
    pub expected_end_time: Option<DateTime<Utc>>,
    /// When the booking actually ended; set on every terminal transition.
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Current lifecycle status.
    pub status: BookingStatus,
}

// ═══════════════════════════════════════════════════════════════════════
// Locations and Activities
// ═══════════════════════════════════════════════════════════════════════

/// A named parking facility with aggregate capacity.
///
/// `0 <= available_spaces <= total_spaces` holds at all times; only the
/// space counter moves `available_spaces`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLocation {
    /// Location identifier.
    pub id: LocationId,
    /// Short unique code, e.g. printed on signage.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-text street address.
    pub address: String,
    /// Total number of spaces at the facility.
    pub total_spaces: i32,
    /// Spaces currently free.
    pub available_spaces: i32,
    /// Hourly parking fee.
    pub fee_per_hour: f64,
}

/// Lifecycle status of a [`ParkingActivity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    /// The vehicle is inside the location.
    Active,
    /// The vehicle has exited; terminal.
    Completed,
}

impl ActivityStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parse from the database string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ParkingError::Database(format!(
                "invalid activity status: {s}"
            ))),
        }
    }
}

/// One entry-to-exit visit of a vehicle at a location.
///
/// Independent of slot bookings. A vehicle can have at most one activity
/// with status [`ActivityStatus::Active`] across all locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingActivity {
    /// Activity identifier.
    pub id: ActivityId,
    /// The vehicle that entered.
    pub vehicle_id: VehicleId,
    /// The location entered.
    pub location_id: LocationId,
    /// The user who recorded the entry (attendant or owner).
    pub recorded_by: UserId,
    /// Generated, unique, human-presentable ticket number.
    pub ticket_number: String,
    /// When the vehicle entered.
    pub entry_time: DateTime<Utc>,
    /// When the vehicle exited, if it has.
    pub exit_time: Option<DateTime<Utc>>,
    /// Stay length in fractional hours, computed at exit.
    pub duration_hours: Option<f64>,
    /// Current lifecycle status.
    pub status: ActivityStatus,
}

// ═══════════════════════════════════════════════════════════════════════
// Vehicles and Users
// ═══════════════════════════════════════════════════════════════════════

/// Kind of vehicle, used for ticket presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    /// Passenger car.
    Car,
    /// Motorcycle.
    Motorcycle,
    /// Van.
    Van,
    /// Truck.
    Truck,
}

impl VehicleType {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "CAR",
            Self::Motorcycle => "MOTORCYCLE",
            Self::Van => "VAN",
            Self::Truck => "TRUCK",
        }
    }

    /// Parse from the database string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a known type.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "CAR" => Ok(Self::Car),
            "MOTORCYCLE" => Ok(Self::Motorcycle),
            "VAN" => Ok(Self::Van),
            "TRUCK" => Ok(Self::Truck),
            _ => Err(ParkingError::Database(format!(
                "invalid vehicle type: {s}"
            ))),
        }
    }
}

/// A registered vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// License plate, unique across the registry.
    pub plate_number: String,
    /// Kind of vehicle.
    pub vehicle_type: VehicleType,
    /// Owning user.
    pub owner_id: UserId,
}

/// Caller role, supplied as an already-verified fact by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Regular vehicle owner.
    User,
    /// Facility administrator / attendant.
    Admin,
}

impl Role {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse from the database string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a known role.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(ParkingError::Database(format!("invalid role: {s}"))),
        }
    }
}

/// Public profile fields of a user, resolved for admin views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: Role,
}

// ═══════════════════════════════════════════════════════════════════════
// Joined Query Shapes
// ═══════════════════════════════════════════════════════════════════════

/// A booking with its slot and vehicle resolved in the same read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    /// The booking row.
    pub booking: Booking,
    /// The slot it references.
    pub slot: ParkingSlot,
    /// The vehicle it references.
    pub vehicle: Vehicle,
}

/// A booking with its slot, vehicle, and the vehicle owner's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAdminView {
    /// The booking row.
    pub booking: Booking,
    /// The slot it references.
    pub slot: ParkingSlot,
    /// The vehicle it references.
    pub vehicle: Vehicle,
    /// Public profile of the vehicle owner.
    pub owner: UserProfile,
}

/// An activity with its vehicle, location, and recording user resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetails {
    /// The activity row.
    pub activity: ParkingActivity,
    /// The vehicle that visited.
    pub vehicle: Vehicle,
    /// The location visited.
    pub location: ParkingLocation,
    /// Public profile of the user who recorded the entry.
    pub recorded_by: UserProfile,
}

/// Printable projection of an activity's entry ticket. No state behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTicket {
    /// Ticket number shown to the vehicle owner.
    pub ticket_number: String,
    /// License plate of the vehicle.
    pub plate_number: String,
    /// Kind of vehicle.
    pub vehicle_type: VehicleType,
    /// When the vehicle entered.
    pub entry_time: DateTime<Utc>,
    /// Location display name.
    pub location_name: String,
    /// Location code.
    pub location_code: String,
    /// Location street address.
    pub address: String,
    /// Hourly fee at the location.
    pub fee_per_hour: f64,
}

/// Billing inputs for a stay, final or estimated.
///
/// While the vehicle is still inside, `exit_time` and `duration_hours` are
/// computed against the current time and `is_estimate` is `true`, so a bill
/// can be previewed before exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSummary {
    /// Ticket number of the stay.
    pub ticket_number: String,
    /// License plate of the vehicle.
    pub plate_number: String,
    /// Kind of vehicle.
    pub vehicle_type: VehicleType,
    /// When the vehicle entered.
    pub entry_time: DateTime<Utc>,
    /// Actual exit time, or the preview time for an ongoing stay.
    pub exit_time: DateTime<Utc>,
    /// Stay length in fractional hours.
    pub duration_hours: f64,
    /// Location display name.
    pub location_name: String,
    /// Location code.
    pub location_code: String,
    /// Hourly fee at the location.
    pub fee_per_hour: f64,
    /// `true` when the vehicle has not exited yet.
    pub is_estimate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_status_roundtrip() {
        for status in &[
            BookingStatus::Active,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::Overstay,
        ] {
            let parsed = BookingStatus::parse(status.as_str());
            assert_eq!(parsed, Ok(*status));
        }
    }

    #[test]
    fn booking_status_invalid() {
        assert!(BookingStatus::parse("PENDING").is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!BookingStatus::Active.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Overstay.is_terminal());
    }

    #[test]
    fn activity_status_roundtrip() {
        for status in &[ActivityStatus::Active, ActivityStatus::Completed] {
            assert_eq!(ActivityStatus::parse(status.as_str()), Ok(*status));
        }
        assert!(ActivityStatus::parse("OPEN").is_err());
    }

    #[test]
    fn vehicle_type_roundtrip() {
        for ty in &[
            VehicleType::Car,
            VehicleType::Motorcycle,
            VehicleType::Van,
            VehicleType::Truck,
        ] {
            assert_eq!(VehicleType::parse(ty.as_str()), Ok(*ty));
        }
        assert!(VehicleType::parse("BICYCLE").is_err());
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(SlotId::new(), SlotId::new());
        assert_ne!(BookingId::new(), BookingId::new());
    }
}
