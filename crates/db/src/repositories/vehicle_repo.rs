//! Read-only repository for the `vehicles` table.

use recon_core::vehicle::Vehicle;
use sqlx::PgPool;

use crate::models::vehicle::VehicleRow;

/// Column list for `vehicles` SELECT queries.
const COLUMNS: &str = "\
    id, vin, make, model, year, \
    through_shop, detail_complete, photo_complete, \
    shop_done, detail_done, photo_done, in_inventory";

/// Provides query operations for vehicles.
pub struct VehicleRepo;

impl VehicleRepo {
    /// Every vehicle that has not finished all three stages, oldest arrival first.
    pub async fn list_in_progress(pool: &PgPool) -> Result<Vec<Vehicle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vehicles \
             WHERE NOT (through_shop AND detail_complete AND photo_complete) \
             ORDER BY in_inventory ASC NULLS LAST, id ASC"
        );
        let rows = sqlx::query_as::<_, VehicleRow>(&query)
            .fetch_all(pool)
            .await?;
        tracing::debug!(count = rows.len(), "Loaded in-progress vehicles");
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }
}
