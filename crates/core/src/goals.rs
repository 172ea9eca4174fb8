//! Per-stage timeline goals.
//!
//! Each stage has a target number of days and a warning percentage of that
//! target after which an open vehicle is flagged as at risk.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::stage::Stage;

/// Default warning percentage for every stage.
pub const DEFAULT_WARNING_PERCENT: i64 = 80;

/// Target and warning percentage for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StageGoal {
    /// Goal number of days for the stage.
    #[validate(range(min = 1, max = 365))]
    pub target: i64,
    /// Percentage of `target` at which a warning is raised.
    #[validate(range(min = 1, max = 100))]
    pub warning: i64,
}

impl StageGoal {
    pub fn new(target: i64, warning: i64) -> Self {
        Self { target, warning }
    }

    /// `ceil(target * warning / 100)` in whole days.
    pub fn warning_threshold(&self) -> i64 {
        (self.target * self.warning + 99) / 100
    }
}

/// Goals for every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TimelineGoals {
    #[validate(nested)]
    pub shop: StageGoal,
    #[validate(nested)]
    pub detail: StageGoal,
    #[validate(nested)]
    pub photo: StageGoal,
    #[validate(nested)]
    pub total: StageGoal,
}

impl TimelineGoals {
    pub fn get(&self, stage: Stage) -> StageGoal {
        match stage {
            Stage::Shop => self.shop,
            Stage::Detail => self.detail,
            Stage::Photo => self.photo,
            Stage::Total => self.total,
        }
    }

    pub fn set(&mut self, stage: Stage, goal: StageGoal) {
        match stage {
            Stage::Shop => self.shop = goal,
            Stage::Detail => self.detail = goal,
            Stage::Photo => self.photo = goal,
            Stage::Total => self.total = goal,
        }
    }

    /// Validate ranges, returning a [`CoreError::Validation`] on failure.
    pub fn validated(self) -> Result<Self, CoreError> {
        self.validate()?;
        Ok(self)
    }
}

impl Default for TimelineGoals {
    fn default() -> Self {
        Self {
            shop: StageGoal::new(3, DEFAULT_WARNING_PERCENT),
            detail: StageGoal::new(2, DEFAULT_WARNING_PERCENT),
            photo: StageGoal::new(1, DEFAULT_WARNING_PERCENT),
            total: StageGoal::new(7, DEFAULT_WARNING_PERCENT),
        }
    }
}
