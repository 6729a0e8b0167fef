//! Configuration types for the scheduling system.

use chrono::NaiveDateTime;

use crate::duration::TimeConversion;
use crate::logging::VERBOSITY_SILENT;

/// Calendar used to add and remove relation lag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RelationshipLagCalendar {
    #[default]
    Predecessor,
    Successor,
    ProjectDefault,
    TwentyFourHour,
}

/// How total slack is derived from start and finish slack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TotalSlackCalculation {
    /// The smaller of start and finish slack.
    #[default]
    Smallest,
    StartSlack,
    FinishSlack,
}

/// Project-level properties read by the schedulers.
#[derive(Clone, Debug, Default)]
pub struct ProjectProperties {
    /// Data date splitting actual progress from remaining work.
    pub status_date: Option<NaiveDateTime>,
    /// Latest acceptable project finish.
    pub must_finish_by: Option<NaiveDateTime>,
    pub relationship_lag_calendar: RelationshipLagCalendar,
    pub total_slack_calculation: TotalSlackCalculation,
    pub time_conversion: TimeConversion,
}

impl ProjectProperties {
    pub fn with_status_date(mut self, status_date: NaiveDateTime) -> Self {
        self.status_date = Some(status_date);
        self
    }

    pub fn with_lag_calendar(mut self, policy: RelationshipLagCalendar) -> Self {
        self.relationship_lag_calendar = policy;
        self
    }
}

/// Which engine's date rules to reproduce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Engine {
    #[default]
    Microsoft,
    Primavera,
}

/// Configuration for a scheduling run.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub engine: Engine,
    /// Logging verbosity (0-3), see [`crate::logging`].
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Microsoft,
            verbosity: VERBOSITY_SILENT,
        }
    }
}

impl SchedulerConfig {
    pub fn microsoft() -> Self {
        Self::default()
    }

    pub fn primavera() -> Self {
        Self {
            engine: Engine::Primavera,
            ..Self::default()
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.engine, Engine::Microsoft);
        assert_eq!(config.verbosity, 0);

        let props = ProjectProperties::default();
        assert_eq!(props.relationship_lag_calendar, RelationshipLagCalendar::Predecessor);
        assert_eq!(props.total_slack_calculation, TotalSlackCalculation::Smallest);
        assert_eq!(props.time_conversion.minutes_per_day, 480.0);
        assert!(props.status_date.is_none());
    }

    #[test]
    fn test_builders() {
        let config = SchedulerConfig::primavera().with_verbosity(2);
        assert_eq!(config.engine, Engine::Primavera);
        assert_eq!(config.verbosity, 2);
    }
}
