//! PostgreSQL parking activity store.
//!
//! Entry pairs the space decrement with the activity insert, and exit
//! pairs the conditional completion with the increment, each in one
//! transaction. Uniqueness of tickets and the one-active-activity-per-
//! vehicle rule are enforced by the database's unique indexes and mapped
//! back to typed errors by constraint name.

use crate::db_err;
use parkline_core::error::{ParkingError, Result};
use parkline_core::providers::{ActivityStore, NewActivity};
use parkline_core::state::{
    ActivityDetails, ActivityId, ActivityStatus, LocationId, ParkingActivity, Role, UserId,
    UserProfile, Vehicle, VehicleId, VehicleType,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const ACTIVITY_COLUMNS: &str = "id, vehicle_id, location_id, recorded_by, ticket_number, \
     entry_time, exit_time, duration_hours, status";

const DETAILED_SELECT: &str = r"
    SELECT
        a.id AS a_id, a.vehicle_id AS a_vehicle_id, a.location_id AS a_location_id,
        a.recorded_by AS a_recorded_by, a.ticket_number AS a_ticket_number,
        a.entry_time AS a_entry_time, a.exit_time AS a_exit_time,
        a.duration_hours AS a_duration_hours, a.status AS a_status,
        v.id AS v_id, v.plate_number AS v_plate_number,
        v.vehicle_type AS v_vehicle_type, v.owner_id AS v_owner_id,
        p.id AS p_id, p.code AS p_code, p.name AS p_name, p.address AS p_address,
        p.total_spaces AS p_total_spaces, p.available_spaces AS p_available_spaces,
        p.fee_per_hour AS p_fee_per_hour,
        u.id AS u_id, u.first_name AS u_first_name, u.last_name AS u_last_name,
        u.email AS u_email, u.role AS u_role
    FROM parking_activities a
    JOIN vehicles v ON v.id = a.vehicle_id
    JOIN parking_locations p ON p.id = a.location_id
    JOIN users u ON u.id = a.recorded_by
";

const TICKET_CONSTRAINT: &str = "parking_activities_ticket_number_key";
const ONE_ACTIVE_CONSTRAINT: &str = "parking_activities_one_active_per_vehicle";

fn row_to_activity(row: &PgRow) -> Result<ParkingActivity> {
    let status: String = row.get("status");
    Ok(ParkingActivity {
        id: ActivityId(row.get("id")),
        vehicle_id: VehicleId(row.get("vehicle_id")),
        location_id: LocationId(row.get("location_id")),
        recorded_by: UserId(row.get("recorded_by")),
        ticket_number: row.get("ticket_number"),
        entry_time: row.get("entry_time"),
        exit_time: row.get("exit_time"),
        duration_hours: row.get("duration_hours"),
        status: ActivityStatus::parse(&status)?,
    })
}

fn row_to_details(row: &PgRow) -> Result<ActivityDetails> {
    let status: String = row.get("a_status");
    let vehicle_type: String = row.get("v_vehicle_type");
    let role: String = row.get("u_role");
    Ok(ActivityDetails {
        activity: ParkingActivity {
            id: ActivityId(row.get("a_id")),
            vehicle_id: VehicleId(row.get("a_vehicle_id")),
            location_id: LocationId(row.get("a_location_id")),
            recorded_by: UserId(row.get("a_recorded_by")),
            ticket_number: row.get("a_ticket_number"),
            entry_time: row.get("a_entry_time"),
            exit_time: row.get("a_exit_time"),
            duration_hours: row.get("a_duration_hours"),
            status: ActivityStatus::parse(&status)?,
        },
        vehicle: Vehicle {
            id: VehicleId(row.get("v_id")),
            plate_number: row.get("v_plate_number"),
            vehicle_type: VehicleType::parse(&vehicle_type)?,
            owner_id: UserId(row.get("v_owner_id")),
        },
        location: parkline_core::state::ParkingLocation {
            id: LocationId(row.get("p_id")),
            code: row.get("p_code"),
            name: row.get("p_name"),
            address: row.get("p_address"),
            total_spaces: row.get("p_total_spaces"),
            available_spaces: row.get("p_available_spaces"),
            fee_per_hour: row.get("p_fee_per_hour"),
        },
        recorded_by: UserProfile {
            id: UserId(row.get("u_id")),
            first_name: row.get("u_first_name"),
            last_name: row.get("u_last_name"),
            email: row.get("u_email"),
            role: Role::parse(&role)?,
        },
    })
}

/// PostgreSQL-backed [`ActivityStore`].
#[derive(Debug, Clone)]
pub struct PostgresActivityStore {
    pool: PgPool,
}

impl PostgresActivityStore {
    /// Create an activity store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ActivityStore for PostgresActivityStore {
    async fn insert_active_taking_space(&self, activity: NewActivity) -> Result<ParkingActivity> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to start transaction", &e))?;

        // Conditional decrement first: of two concurrent entries racing
        // for the last space, the loser sees zero rows affected.
        let decremented = sqlx::query(
            r"
            UPDATE parking_locations
            SET available_spaces = available_spaces - 1
            WHERE id = $1 AND available_spaces > 0
            ",
        )
        .bind(activity.location_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("failed to take space", &e))?;

        if decremented.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM parking_locations WHERE id = $1)",
            )
            .bind(activity.location_id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_err("failed to check location", &e))?;
            let _ = tx.rollback().await;
            if exists {
                tracing::debug!(
                    location_id = %activity.location_id,
                    "entry lost the race for the last space"
                );
                metrics::counter!("parking.activities.capacity_conflicts").increment(1);
            }
            return Err(if exists {
                ParkingError::NoCapacity
            } else {
                ParkingError::NotFound("parking location")
            });
        }

        let id = ActivityId::new();
        sqlx::query(
            r"
            INSERT INTO parking_activities
                (id, vehicle_id, location_id, recorded_by, ticket_number, entry_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'ACTIVE')
            ",
        )
        .bind(id.0)
        .bind(activity.vehicle_id.0)
        .bind(activity.location_id.0)
        .bind(activity.recorded_by.0)
        .bind(&activity.ticket_number)
        .bind(activity.entry_time)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return match db.constraint() {
                        Some(TICKET_CONSTRAINT) => ParkingError::DuplicateTicket,
                        Some(ONE_ACTIVE_CONSTRAINT) => ParkingError::InvalidState(
                            "vehicle is already parked in another location",
                        ),
                        _ => db_err("unexpected uniqueness violation", &e),
                    };
                }
            }
            db_err("failed to insert activity", &e)
        })?;

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit entry", &e))?;

        Ok(ParkingActivity {
            id,
            vehicle_id: activity.vehicle_id,
            location_id: activity.location_id,
            recorded_by: activity.recorded_by,
            ticket_number: activity.ticket_number,
            entry_time: activity.entry_time,
            exit_time: None,
            duration_hours: None,
            status: ActivityStatus::Active,
        })
    }

    async fn complete_returning_space(
        &self,
        id: ActivityId,
        exit_time: DateTime<Utc>,
        duration_hours: f64,
    ) -> Result<ParkingActivity> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to start transaction", &e))?;

        let row = sqlx::query(&format!(
            r"
            UPDATE parking_activities
            SET exit_time = $2, duration_hours = $3, status = 'COMPLETED'
            WHERE id = $1 AND status = 'ACTIVE'
            RETURNING {ACTIVITY_COLUMNS}
            "
        ))
        .bind(id.0)
        .bind(exit_time)
        .bind(duration_hours)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_err("failed to complete activity", &e))?;

        let Some(row) = row else {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM parking_activities WHERE id = $1)",
            )
            .bind(id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_err("failed to check activity", &e))?;
            let _ = tx.rollback().await;
            return Err(if exists {
                ParkingError::InvalidState("vehicle has already exited")
            } else {
                ParkingError::NotFound("parking activity")
            });
        };
        let completed = row_to_activity(&row)?;

        let incremented = sqlx::query(
            r"
            UPDATE parking_locations
            SET available_spaces = available_spaces + 1
            WHERE id = $1 AND available_spaces < total_spaces
            ",
        )
        .bind(completed.location_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("failed to return space", &e))?;

        if incremented.rows_affected() == 0 {
            // A full counter with an active activity means the ledger was
            // corrupted out of band; refuse to make it worse.
            let _ = tx.rollback().await;
            return Err(ParkingError::BoundsError);
        }

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit exit", &e))?;
        Ok(completed)
    }

    async fn get(&self, id: ActivityId) -> Result<ParkingActivity> {
        let row = sqlx::query(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM parking_activities WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get activity", &e))?
        .ok_or(ParkingError::NotFound("parking activity"))?;

        row_to_activity(&row)
    }

    async fn get_detailed(&self, id: ActivityId) -> Result<ActivityDetails> {
        let row = sqlx::query(&format!("{DETAILED_SELECT} WHERE a.id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("failed to get activity", &e))?
            .ok_or(ParkingError::NotFound("parking activity"))?;

        row_to_details(&row)
    }

    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<ParkingActivity>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {ACTIVITY_COLUMNS} FROM parking_activities
            WHERE vehicle_id = $1 AND status = 'ACTIVE'
            "
        ))
        .bind(vehicle_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to find active activity", &e))?;

        row.as_ref().map(row_to_activity).transpose()
    }

    async fn list_active(&self) -> Result<Vec<ActivityDetails>> {
        let rows = sqlx::query(&format!(
            "{DETAILED_SELECT} WHERE a.status = 'ACTIVE' ORDER BY a.entry_time DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list active activities", &e))?;

        rows.iter().map(row_to_details).collect()
    }

    async fn list_by_entry_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>> {
        let rows = sqlx::query(&format!(
            r"
            {DETAILED_SELECT}
            WHERE a.entry_time >= $1 AND a.entry_time <= $2
            ORDER BY a.entry_time DESC
            "
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list activities by entry range", &e))?;

        rows.iter().map(row_to_details).collect()
    }

    async fn list_completed_by_exit_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityDetails>> {
        let rows = sqlx::query(&format!(
            r"
            {DETAILED_SELECT}
            WHERE a.status = 'COMPLETED'
              AND a.exit_time >= $1 AND a.exit_time <= $2
            ORDER BY a.entry_time DESC
            "
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list activities by exit range", &e))?;

        rows.iter().map(row_to_details).collect()
    }
}
