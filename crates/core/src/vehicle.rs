//! The slice of a vehicle record the timeline engine reads.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;
use crate::types::{DbId, Timestamp};

/// A vehicle moving through shop, detail and photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
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
    /// Arrival into inventory; the shop and total clocks start here.
    pub in_inventory: Option<Timestamp>,
}

impl Vehicle {
    /// `"{year} {make} {model}"`, as shown in alerts.
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    /// All three stages are done.
    pub fn is_complete(&self) -> bool {
        self.through_shop && self.detail_complete && self.photo_complete
    }

    /// Whether the vehicle has started but not finished `stage`.
    ///
    /// Stages run in order: detail opens once the shop is done and photo
    /// opens once detail is done. `Total` is open until the vehicle is
    /// complete.
    pub fn is_stage_active(&self, stage: Stage) -> bool {
        match stage {
            Stage::Shop => !self.through_shop,
            Stage::Detail => self.through_shop && !self.detail_complete,
            Stage::Photo => self.detail_complete && !self.photo_complete,
            Stage::Total => !self.is_complete(),
        }
    }

    /// When the clock for `stage` started, if known.
    pub fn stage_started_at(&self, stage: Stage) -> Option<Timestamp> {
        match stage {
            Stage::Shop | Stage::Total => self.in_inventory,
            Stage::Detail => self.shop_done,
            Stage::Photo => self.detail_done,
        }
    }
}
