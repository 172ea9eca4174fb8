//! Reconditioning stages tracked by the timeline engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A sequential reconditioning step, plus `Total` for end-to-end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Shop,
    Detail,
    Photo,
    Total,
}

impl Stage {
    /// Every stage, in evaluation order.
    pub const ALL: [Stage; 4] = [Stage::Shop, Stage::Detail, Stage::Photo, Stage::Total];

    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Shop => "shop",
            Stage::Detail => "detail",
            Stage::Photo => "photo",
            Stage::Total => "total",
        }
    }

    /// Human-readable label used in notification text.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Shop => "Shop",
            Stage::Detail => "Detail",
            Stage::Photo => "Photo",
            Stage::Total => "Total",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shop" => Ok(Stage::Shop),
            "detail" => Ok(Stage::Detail),
            "photo" => Ok(Stage::Photo),
            "total" => Ok(Stage::Total),
            other => Err(CoreError::Validation(format!("Unknown stage: {other}"))),
        }
    }
}
