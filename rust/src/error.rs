//! Errors reported by the schedulers.

use std::fmt;
use thiserror::Error;

/// Duration field missing from an activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationField {
    Duration,
    ActualDuration,
    RemainingDuration,
}

impl fmt::Display for DurationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DurationField::Duration => "duration",
            DurationField::ActualDuration => "actual duration",
            DurationField::RemainingDuration => "remaining duration",
        })
    }
}

/// Work field missing from a resource assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkField {
    Work,
    ActualWork,
    RemainingWork,
}

impl fmt::Display for WorkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkField::Work => "work",
            WorkField::ActualWork => "actual work",
            WorkField::RemainingWork => "remaining work",
        })
    }
}

/// Caller-data problems that stop a schedule run. A run that fails leaves
/// the project's computed dates as they were before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CpmError {
    #[error("Circular dependency detected at activity {activity}")]
    CircularDependency { activity: String },

    #[error("Activity {activity} has no {field} and no resource assignments supplying one")]
    MissingDuration { activity: String, field: DurationField },

    #[error("Activity {activity} has resource assignments without {field}")]
    MissingWork { activity: String, field: WorkField },

    #[error("Activity {activity} has no activity type")]
    MissingActivityType { activity: String },
}

pub type Result<T> = std::result::Result<T, CpmError>;
