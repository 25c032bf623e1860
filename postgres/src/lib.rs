//! # parkline-postgres
//!
//! PostgreSQL implementations of the `parkline-core` store traits.
//!
//! Every composite operation a trait declares atomic runs as one
//! transaction here, and every check-then-act step is a conditional
//! `UPDATE ... WHERE` so that concurrent callers racing for the same slot
//! or the last space resolve to exactly one winner under the store's
//! default READ COMMITTED isolation. No in-process lock is involved; the
//! database is the source of truth for mutual exclusion, which keeps the
//! semantics correct across any number of server processes.
//!
//! # Example
//!
//! ```no_run
//! use parkline_postgres::{run_migrations, PostgresSlotStore};
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/parkline").await?;
//! run_migrations(&pool).await?;
//! let slots = PostgresSlotStore::new(pool);
//! # Ok(())
//! # }
//! ```

mod activities;
mod bookings;
mod locations;
mod slots;
mod vehicles;

pub use activities::PostgresActivityStore;
pub use bookings::PostgresBookingStore;
pub use locations::PostgresLocationStore;
pub use slots::PostgresSlotStore;
pub use vehicles::PostgresVehicleStore;

use parkline_core::error::{ParkingError, Result};
use sqlx::PgPool;

/// Run the embedded database migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ParkingError::Database(format!("migration failed: {e}")))?;
    Ok(())
}

pub(crate) fn db_err(context: &str, e: &sqlx::Error) -> ParkingError {
    ParkingError::Database(format!("{context}: {e}"))
}
