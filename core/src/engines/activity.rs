//! Activity tracker: timestamped vehicle entry/exit at locations.

use crate::config::TicketConfig;
use crate::environment::Clock;
use crate::error::{ParkingError, Result};
use crate::providers::{ActivityStore, LocationStore, NewActivity, VehicleStore};
use crate::state::{
    ActivityDetails, ActivityId, ActivityStatus, EntryTicket, LocationId, ParkingActivity,
    ParkingSummary, UserId, VehicleId,
};
use crate::ticket::generate_ticket_number;
use chrono::{DateTime, Utc};
use std::sync::Arc;

fn hours_between(entry: DateTime<Utc>, exit: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)] // stays exact far beyond any stay length
    let millis = (exit - entry).num_milliseconds() as f64;
    millis / 3_600_000.0
}

/// Records visits, issues tickets, and computes billing inputs.
///
/// One ACTIVE activity per vehicle across all locations; the store
/// re-enforces the rule inside the entry transaction, so the pre-check
/// here only shapes the error message.
#[derive(Debug, Clone)]
pub struct ActivityTracker<A, L, V, C> {
    activities: Arc<A>,
    locations: Arc<L>,
    vehicles: Arc<V>,
    clock: Arc<C>,
    ticket: TicketConfig,
}

impl<A, L, V, C> ActivityTracker<A, L, V, C>
where
    A: ActivityStore,
    L: LocationStore,
    V: VehicleStore,
    C: Clock,
{
    /// Create an activity tracker over the given stores and clock.
    #[must_use]
    pub const fn new(
        activities: Arc<A>,
        locations: Arc<L>,
        vehicles: Arc<V>,
        clock: Arc<C>,
        ticket: TicketConfig,
    ) -> Self {
        Self {
            activities,
            locations,
            vehicles,
            clock,
            ticket,
        }
    }

    /// Record a vehicle entering a location: take one space and open an
    /// ACTIVE activity with a fresh ticket number.
    ///
    /// Ticket generation is retried on a uniqueness collision, bounded by
    /// the configured attempt count.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the vehicle or location is missing,
    /// `NoCapacity` when no space is left, or `InvalidState` if the
    /// vehicle is already parked somewhere.
    pub async fn record_entry(
        &self,
        vehicle_id: VehicleId,
        location_id: LocationId,
        user_id: UserId,
    ) -> Result<ParkingActivity> {
        self.vehicles.get(vehicle_id).await?;
        let location = self.locations.get(location_id).await?;
        if location.available_spaces <= 0 {
            return Err(ParkingError::NoCapacity);
        }
        if self
            .activities
            .find_active_for_vehicle(vehicle_id)
            .await?
            .is_some()
        {
            return Err(ParkingError::InvalidState(
                "vehicle is already parked in another location",
            ));
        }

        let mut attempts = 0;
        loop {
            let activity = NewActivity {
                vehicle_id,
                location_id,
                recorded_by: user_id,
                ticket_number: generate_ticket_number(&self.ticket.prefix),
                entry_time: self.clock.now(),
            };
            match self.activities.insert_active_taking_space(activity).await {
                Err(ParkingError::DuplicateTicket) if attempts + 1 < self.ticket.max_attempts => {
                    attempts += 1;
                    metrics::counter!("parking.ticket.collisions").increment(1);
                }
                other => return other,
            }
        }
    }

    /// Record the vehicle exiting: stamp the exit time, compute the stay's
    /// duration in fractional hours, and return the space.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the activity is missing, or `InvalidState` if
    /// the vehicle has already exited.
    pub async fn record_exit(&self, id: ActivityId) -> Result<ParkingActivity> {
        let activity = self.activities.get(id).await?;
        if activity.status != ActivityStatus::Active {
            return Err(ParkingError::InvalidState("vehicle has already exited"));
        }

        let exit_time = self.clock.now();
        let duration = hours_between(activity.entry_time, exit_time);
        self.activities
            .complete_returning_space(id, exit_time, duration)
            .await
    }

    /// Get an activity with vehicle, location, and recording user resolved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the activity does not exist.
    pub async fn get(&self, id: ActivityId) -> Result<ActivityDetails> {
        self.activities.get_detailed(id).await
    }

    /// Vehicles currently inside any location.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active(&self) -> Result<Vec<ActivityDetails>> {
        self.activities.list_active().await
    }

    /// Activities that entered inside `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_by_entry_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>> {
        self.activities.list_by_entry_range(start, end).await
    }

    /// Completed activities that exited inside `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_completed_by_exit_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>> {
        self.activities
            .list_completed_by_exit_range(start, end)
            .await
    }

    /// Printable projection of the entry ticket. No state change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the activity does not exist.
    pub async fn generate_entry_ticket(&self, id: ActivityId) -> Result<EntryTicket> {
        let details = self.activities.get_detailed(id).await?;
        Ok(EntryTicket {
            ticket_number: details.activity.ticket_number,
            plate_number: details.vehicle.plate_number,
            vehicle_type: details.vehicle.vehicle_type,
            entry_time: details.activity.entry_time,
            location_name: details.location.name,
            location_code: details.location.code,
            address: details.location.address,
            fee_per_hour: details.location.fee_per_hour,
        })
    }

    /// Billing inputs for the stay. While the vehicle is still inside, the
    /// duration is estimated against the current time and the summary is
    /// marked as an estimate, so the bill can be previewed before exit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the activity does not exist.
    pub async fn generate_summary(&self, id: ActivityId) -> Result<ParkingSummary> {
        let details = self.activities.get_detailed(id).await?;
        let activity = &details.activity;

        let (exit_time, duration_hours, is_estimate) = match activity.exit_time {
            Some(exit) => (
                exit,
                activity
                    .duration_hours
                    .unwrap_or_else(|| hours_between(activity.entry_time, exit)),
                false,
            ),
            None => {
                let preview = self.clock.now();
                (preview, hours_between(activity.entry_time, preview), true)
            }
        };

        Ok(ParkingSummary {
            ticket_number: activity.ticket_number.clone(),
            plate_number: details.vehicle.plate_number,
            vehicle_type: details.vehicle.vehicle_type,
            entry_time: activity.entry_time,
            exit_time,
            duration_hours,
            location_name: details.location.name,
            location_code: details.location.code,
            fee_per_hour: details.location.fee_per_hour,
            is_estimate,
        })
    }
}
