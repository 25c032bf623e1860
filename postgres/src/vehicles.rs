//! PostgreSQL vehicle store.

use crate::db_err;
use parkline_core::error::{ParkingError, Result};
use parkline_core::providers::{NewVehicle, VehicleStore};
use parkline_core::state::{UserId, Vehicle, VehicleId, VehicleType};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const VEHICLE_COLUMNS: &str = "id, plate_number, vehicle_type, owner_id";

fn row_to_vehicle(row: &PgRow) -> Result<Vehicle> {
    let vehicle_type: String = row.get("vehicle_type");
    Ok(Vehicle {
        id: VehicleId(row.get("id")),
        plate_number: row.get("plate_number"),
        vehicle_type: VehicleType::parse(&vehicle_type)?,
        owner_id: UserId(row.get("owner_id")),
    })
}

/// PostgreSQL-backed [`VehicleStore`].
#[derive(Debug, Clone)]
pub struct PostgresVehicleStore {
    pool: PgPool,
}

impl PostgresVehicleStore {
    /// Create a vehicle store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl VehicleStore for PostgresVehicleStore {
    async fn insert(&self, vehicle: NewVehicle) -> Result<Vehicle> {
        let id = VehicleId::new();
        sqlx::query(
            r"
            INSERT INTO vehicles (id, plate_number, vehicle_type, owner_id)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id.0)
        .bind(&vehicle.plate_number)
        .bind(vehicle.vehicle_type.as_str())
        .bind(vehicle.owner_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ParkingError::DuplicatePlate(vehicle.plate_number.clone());
                }
            }
            db_err("failed to insert vehicle", &e)
        })?;

        Ok(Vehicle {
            id,
            plate_number: vehicle.plate_number,
            vehicle_type: vehicle.vehicle_type,
            owner_id: vehicle.owner_id,
        })
    }

    async fn get(&self, id: VehicleId) -> Result<Vehicle> {
        let row = sqlx::query(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to get vehicle", &e))?
        .ok_or(ParkingError::NotFound("vehicle"))?;

        row_to_vehicle(&row)
    }

    async fn list_for_user(&self, owner_id: UserId) -> Result<Vec<Vehicle>> {
        let rows = sqlx::query(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE owner_id = $1 ORDER BY plate_number"
        ))
        .bind(owner_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list vehicles", &e))?;

        rows.iter().map(row_to_vehicle).collect()
    }
}
