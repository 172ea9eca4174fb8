//! Vehicle entity model.

use recon_core::types::{DbId, Timestamp};
use recon_core::vehicle::Vehicle;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `vehicles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VehicleRow {
    pub id: DbId,
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub through_shop: bool,
    pub detail_complete: bool,
    pub photo_complete: bool,
    pub shop_done: Option<Timestamp>,
    pub detail_done: Option<Timestamp>,
    pub photo_done: Option<Timestamp>,
    pub in_inventory: Option<Timestamp>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Vehicle {
            id: row.id,
            vin: row.vin,
            make: row.make,
            model: row.model,
            year: row.year,
            through_shop: row.through_shop,
            detail_complete: row.detail_complete,
            photo_complete: row.photo_complete,
            shop_done: row.shop_done,
            detail_done: row.detail_done,
            photo_done: row.photo_done,
            in_inventory: row.in_inventory,
        }
    }
}
