//! Error taxonomy for the parking engines.
//!
//! Every engine failure is a synchronous result outcome carrying one of
//! these kinds plus a human-readable message. Lost races on a claim or a
//! counter decrement are normal outcomes under concurrent traffic, never
//! panics, and nothing here is retried automatically (except ticket-number
//! regeneration, which the activity tracker owns).

use thiserror::Error;

/// Result type alias for parking operations.
pub type Result<T> = std::result::Result<T, ParkingError>;

/// Failure kinds shared by all engines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParkingError {
    // ═══════════════════════════════════════════════════════════
    // Missing references
    // ═══════════════════════════════════════════════════════════

    /// A referenced row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    // ═══════════════════════════════════════════════════════════
    // Contention and capacity
    // ═══════════════════════════════════════════════════════════

    /// The slot is occupied, or a concurrent claim won the race.
    #[error("parking slot is not available")]
    Unavailable,

    /// The location has no remaining spaces, or a concurrent entry took
    /// the last one.
    #[error("no available parking spaces")]
    NoCapacity,

    // ═══════════════════════════════════════════════════════════
    // Lifecycle and ownership
    // ═══════════════════════════════════════════════════════════

    /// The row is not in the status the operation requires.
    #[error("{0}")]
    InvalidState(&'static str),

    /// The vehicle does not belong to the requesting user.
    #[error("vehicle does not belong to the user")]
    InvalidOwnership,

    // ═══════════════════════════════════════════════════════════
    // Administrative uniqueness
    // ═══════════════════════════════════════════════════════════

    /// One or more submitted slot numbers are already taken.
    #[error("slot numbers already exist: {}", .0.join(", "))]
    DuplicateNumber(Vec<String>),

    /// The location code is already taken.
    #[error("parking location with code {0} already exists")]
    DuplicateCode(String),

    /// The plate number is already registered.
    #[error("vehicle with plate {0} already exists")]
    DuplicatePlate(String),

    /// A generated ticket number collided with an existing one. The
    /// activity tracker retries this with a fresh number.
    #[error("ticket number already exists")]
    DuplicateTicket,

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════

    /// A counter mutation would leave `available_spaces` outside
    /// `0..=total_spaces`.
    #[error("available spaces cannot exceed total spaces")]
    BoundsError,

    /// The underlying store failed.
    #[error("database error: {0}")]
    Database(String),
}

impl ParkingError {
    /// Returns `true` for outcomes expected under concurrent traffic:
    /// lost claim races, exhausted capacity, and rows already past the
    /// required status.
    #[must_use]
    pub const fn is_contention(&self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::NoCapacity | Self::InvalidState(_)
        )
    }

    /// Returns `true` if the error is a uniqueness violation on an
    /// administrative create.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateNumber(_)
                | Self::DuplicateCode(_)
                | Self::DuplicatePlate(_)
                | Self::DuplicateTicket
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contention_classifier() {
        assert!(ParkingError::Unavailable.is_contention());
        assert!(ParkingError::NoCapacity.is_contention());
        assert!(ParkingError::InvalidState("already exited").is_contention());
        assert!(!ParkingError::NotFound("booking").is_contention());
        assert!(!ParkingError::Database("boom".to_string()).is_contention());
    }

    #[test]
    fn duplicate_classifier() {
        assert!(ParkingError::DuplicateCode("P1".to_string()).is_duplicate());
        assert!(!ParkingError::Unavailable.is_duplicate());
    }

    #[test]
    fn duplicate_numbers_listed_in_message() {
        let err = ParkingError::DuplicateNumber(vec!["A-1".to_string(), "A-2".to_string()]);
        assert_eq!(err.to_string(), "slot numbers already exist: A-1, A-2");
    }

    #[test]
    fn not_found_names_the_resource() {
        assert_eq!(
            ParkingError::NotFound("parking location").to_string(),
            "parking location not found"
        );
    }
}
