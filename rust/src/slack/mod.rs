//! Slack (float) calculations over a scheduled project.
//!
//! Each engine flavour has its own calculator. Start, finish and total slack
//! compare an activity's early and late dates; free slack looks at the gap to
//! each successor.

mod microsoft;
mod primavera;

pub use microsoft::MicrosoftSlackCalculator;
pub use primavera::PrimaveraSlackCalculator;

use std::cmp::Ordering;

use crate::config::TotalSlackCalculation;
use crate::duration::{Duration, TimeUnit};
use crate::models::{ActivityId, Relation};
use crate::project::Project;

/// Slack queries for one engine flavour.
pub trait SlackCalculator {
    fn start_slack(&self, project: &Project, id: ActivityId) -> Option<Duration>;

    fn finish_slack(&self, project: &Project, id: ActivityId) -> Option<Duration>;

    /// Slack before the nearest successor is affected.
    fn free_slack(&self, project: &Project, id: ActivityId) -> Duration;

    /// Start slack, finish slack, or the smaller of the two, per the project setting.
    /// Once an activity has started only its finish slack counts.
    fn total_slack(&self, project: &Project, id: ActivityId) -> Option<Duration> {
        let start = self.start_slack(project, id);
        let finish = self.finish_slack(project, id);
        match project.properties.total_slack_calculation {
            TotalSlackCalculation::StartSlack => start,
            TotalSlackCalculation::FinishSlack => finish,
            TotalSlackCalculation::Smallest => {
                if project.activity(id).actual_start.is_some() {
                    return finish;
                }
                match (start, finish) {
                    (Some(s), Some(f)) => {
                        let conversion = &project.properties.time_conversion;
                        Some(if f.compare(&s, conversion) == Ordering::Less { f } else { s })
                    }
                    (s, None) => s,
                    (None, f) => f,
                }
            }
        }
    }

    /// No positive total slack, and not yet complete.
    fn is_critical(&self, project: &Project, id: ActivityId) -> bool {
        let complete = project.activity(id).is_complete();
        match self.total_slack(project, id) {
            Some(slack) => slack.value <= 0.0 && !complete,
            None => false,
        }
    }
}

/// Store total slack and the critical flag on an activity.
pub(crate) fn refresh(calculator: &dyn SlackCalculator, project: &mut Project, id: ActivityId) {
    let total = calculator.total_slack(project, id);
    let critical = calculator.is_critical(project, id);
    let activity = project.activity_mut(id);
    activity.total_slack = total;
    activity.critical = Some(critical);
}

/// Units slack is reported in: the activity's duration units, else hours.
fn slack_units(project: &Project, id: ActivityId) -> TimeUnit {
    project
        .activity(id)
        .duration
        .map(|d| d.units)
        .filter(|u| !u.is_percent())
        .unwrap_or(TimeUnit::Hours)
}

/// Lag of `relation` expressed in `units` of the predecessor's calendar,
/// resolving percentages against the predecessor's duration.
fn lag_in(project: &Project, relation: &Relation, units: TimeUnit) -> Duration {
    let predecessor = project.activity(relation.predecessor);
    let calendar = project.effective_calendar(relation.predecessor);
    relation
        .lag
        .percent_of(predecessor.duration_or_zero())
        .convert_units(units, calendar.time_conversion())
}

/// Working time from `from` to `to` on the predecessor's calendar, less the relation's lag.
fn relation_variance(
    project: &Project,
    relation: &Relation,
    from: Option<chrono::NaiveDateTime>,
    to: Option<chrono::NaiveDateTime>,
) -> Duration {
    let units = slack_units(project, relation.predecessor);
    let (Some(from), Some(to)) = (from, to) else {
        return Duration::zero(units);
    };
    let variance = project
        .effective_calendar(relation.predecessor)
        .work_between(from, to, units);
    let lag = lag_in(project, relation, units);
    Duration::new(variance.value - lag.value, units)
}

/// Smallest of a set of durations.
fn minimum(project: &Project, values: impl Iterator<Item = Duration>) -> Option<Duration> {
    let conversion = &project.properties.time_conversion;
    values.min_by(|a, b| a.compare(b, conversion))
}
