//! Timeline evaluation engine.
//!
//! Pure logic, no I/O. The caller fetches vehicles and goals and passes them
//! in together with the evaluation instant.

use serde::Serialize;

use crate::alert::{AlertKey, AlertType, NewAlert};
use crate::dates::days_since;
use crate::goals::{StageGoal, TimelineGoals};
use crate::stage::Stage;
use crate::types::Timestamp;
use crate::vehicle::Vehicle;

/// Outcome of one evaluation pass over a batch of vehicles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Alerts that should replace whatever is stored for their key.
    pub alerts: Vec<NewAlert>,
    /// Keys whose stage is no longer active; stored alerts for them are stale.
    pub resolved: Vec<AlertKey>,
}

/// Classify `elapsed_days` against a stage goal.
///
/// Returns `None` while the vehicle is below the warning threshold or has
/// no elapsed time at all.
pub fn classify(goal: &StageGoal, elapsed_days: i64) -> Option<AlertType> {
    if elapsed_days <= 0 {
        return None;
    }
    if elapsed_days >= goal.target {
        Some(AlertType::Overdue)
    } else if elapsed_days >= goal.warning_threshold() {
        Some(AlertType::Warning)
    } else {
        None
    }
}

/// Elapsed days in `stage` at `now`, or 0 when the stage has no start date.
pub fn stage_elapsed_days(vehicle: &Vehicle, stage: Stage, now: Timestamp) -> i64 {
    vehicle
        .stage_started_at(stage)
        .map(|start| days_since(start, Some(now)))
        .unwrap_or(0)
}

/// Evaluate a single vehicle across every stage.
pub fn evaluate_vehicle(vehicle: &Vehicle, goals: &TimelineGoals, now: Timestamp) -> Evaluation {
    let mut out = Evaluation::default();

    for stage in Stage::ALL {
        if !vehicle.is_stage_active(stage) {
            out.resolved.push(AlertKey::new(vehicle.id, stage));
            continue;
        }

        let goal = goals.get(stage);
        let elapsed = stage_elapsed_days(vehicle, stage, now);
        let Some(alert_type) = classify(&goal, elapsed) else {
            continue;
        };

        out.alerts.push(NewAlert {
            vehicle_id: vehicle.id,
            vehicle_info: vehicle.display_name(),
            vin: vehicle.vin.clone(),
            step: stage,
            alert_type,
            current_days: elapsed,
            target_days: goal.target,
            message: alert_message(stage, alert_type, elapsed, goal.target),
        });
    }

    out
}

/// Evaluate a batch of vehicles.
pub fn evaluate(vehicles: &[Vehicle], goals: &TimelineGoals, now: Timestamp) -> Evaluation {
    let mut out = Evaluation::default();
    for vehicle in vehicles {
        let mut one = evaluate_vehicle(vehicle, goals, now);
        out.alerts.append(&mut one.alerts);
        out.resolved.append(&mut one.resolved);
    }
    out
}

fn alert_message(stage: Stage, alert_type: AlertType, current: i64, target: i64) -> String {
    match alert_type {
        AlertType::Overdue => {
            let over = current - target;
            format!(
                "{} stage is {over} {} over the {target}-day target",
                stage.label(),
                plural_days(over)
            )
        }
        AlertType::Warning => format!(
            "{} stage approaching deadline: {current} of {target} days used",
            stage.label()
        ),
    }
}

fn plural_days(n: i64) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

// ---------------------------------------------------------------------------
// Dashboard summary
// ---------------------------------------------------------------------------

/// Per-stage counts for the timeline dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub target_days: i64,
    /// Vehicles currently in this stage.
    pub active: usize,
    pub on_track: usize,
    pub at_risk: usize,
    pub overdue: usize,
    /// Mean elapsed days across active vehicles, 0.0 when none are active.
    pub average_days: f64,
}

/// Dashboard snapshot across all stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSummary {
    pub generated_at: Timestamp,
    pub vehicle_count: usize,
    pub stages: Vec<StageSummary>,
}

/// Summarize how active vehicles stand against their goals.
pub fn summarize(vehicles: &[Vehicle], goals: &TimelineGoals, now: Timestamp) -> TimelineSummary {
    let stages = Stage::ALL
        .iter()
        .map(|&stage| {
            let goal = goals.get(stage);
            let mut summary = StageSummary {
                stage,
                target_days: goal.target,
                active: 0,
                on_track: 0,
                at_risk: 0,
                overdue: 0,
                average_days: 0.0,
            };
            let mut total_days = 0i64;

            for vehicle in vehicles.iter().filter(|v| v.is_stage_active(stage)) {
                let elapsed = stage_elapsed_days(vehicle, stage, now);
                summary.active += 1;
                total_days += elapsed;
                match classify(&goal, elapsed) {
                    Some(AlertType::Overdue) => summary.overdue += 1,
                    Some(AlertType::Warning) => summary.at_risk += 1,
                    None => summary.on_track += 1,
                }
            }

            if summary.active > 0 {
                summary.average_days = total_days as f64 / summary.active as f64;
            }
            summary
        })
        .collect();

    TimelineSummary {
        generated_at: now,
        vehicle_count: vehicles.len(),
        stages,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
