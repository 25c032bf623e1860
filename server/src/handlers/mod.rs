//! HTTP handlers: thin wrappers mapping requests onto engine calls.
//!
//! Argument shapes are validated here; the engines receive already-parsed
//! values and report failures as typed outcomes that [`crate::error`]
//! translates to status codes.

pub mod activities;
pub mod bookings;
pub mod health;
pub mod locations;
pub mod slots;
pub mod vehicles;
