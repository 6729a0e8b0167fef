//! Date arithmetic for the Primavera-style engine.
//!
//! Results are rounded to the nearest minute. Lag is measured on the
//! calendar chosen by the project's relationship lag policy.

use chrono::{NaiveDateTime, Timelike};

use crate::calendar::Calendar;
use crate::config::RelationshipLagCalendar;
use crate::duration::{Duration, TimeUnit};
use crate::models::{ActivityId, ActivityType, Relation, ResourceAssignment, ResourceType};
use crate::scheduler::{equivalent_next_work_start, equivalent_previous_work_finish, work_assignments};

use super::Run;

/// Which part of an activity's duration or work to move by.
#[derive(Clone, Copy, Debug)]
pub(super) enum Portion {
    Total,
    Remaining,
}

/// `calendar.add_duration`, rounded to the nearest minute. Exactly thirty
/// seconds rounds up going forwards and down going backwards.
pub(super) fn rounded_date(calendar: &dyn Calendar, date: NaiveDateTime, duration: Duration) -> NaiveDateTime {
    let result = calendar.add_duration(date, duration);
    let seconds = result.second();
    if seconds == 0 {
        return result;
    }
    let round_up = if duration.is_negative() { seconds > 30 } else { seconds >= 30 };
    let truncated = result - chrono::Duration::seconds(i64::from(seconds));
    if round_up {
        truncated + chrono::Duration::minutes(1)
    } else {
        truncated
    }
}

/// Move `date` by `work` performed at `units` percent.
pub(super) fn date_from_work(calendar: &dyn Calendar, units: f64, date: NaiveDateTime, work: Duration) -> NaiveDateTime {
    if units == 0.0 {
        return date;
    }
    let work = if units == 100.0 {
        work
    } else {
        Duration::new(work.value * 100.0 / units, work.units)
    };
    rounded_date(calendar, date, work)
}

impl Run<'_> {
    pub(super) fn lag_calendar(&self, relation: &Relation) -> &dyn Calendar {
        match self.project.properties.relationship_lag_calendar {
            RelationshipLagCalendar::Predecessor => self.project.effective_calendar(relation.predecessor),
            RelationshipLagCalendar::Successor => self.project.effective_calendar(relation.successor),
            RelationshipLagCalendar::ProjectDefault => self.project.default_calendar(),
            RelationshipLagCalendar::TwentyFourHour => &self.twenty_four_hour,
        }
    }

    /// The relation's lag, with percentages resolved against the predecessor's duration.
    pub(super) fn lag(&self, relation: &Relation) -> Duration {
        relation
            .lag
            .percent_of(self.activity(relation.predecessor).duration_or_zero())
    }

    fn hours(&self, duration: Duration) -> f64 {
        duration
            .convert_units(TimeUnit::Hours, &self.project.properties.time_conversion)
            .value
    }

    pub(super) fn add_lag(&self, relation: &Relation, date: NaiveDateTime) -> NaiveDateTime {
        self.add_lag_of(relation, date, self.lag(relation))
    }

    /// Add `lag` on the lag calendar. A lead never pulls a date before the data date.
    pub(super) fn add_lag_of(&self, relation: &Relation, date: NaiveDateTime, lag: Duration) -> NaiveDateTime {
        let result = rounded_date(self.lag_calendar(relation), date, lag);
        if lag.is_negative() && result < self.data_date {
            self.data_date
        } else {
            result
        }
    }

    pub(super) fn remove_lag(&self, relation: &Relation, date: NaiveDateTime) -> NaiveDateTime {
        self.remove_lag_of(relation, date, self.lag(relation))
    }

    pub(super) fn remove_lag_of(&self, relation: &Relation, date: NaiveDateTime, lag: Duration) -> NaiveDateTime {
        rounded_date(self.lag_calendar(relation), date, lag.negate())
    }

    /// Lag still to run once the working time from `since` to the data date
    /// has been taken off. `None` when the lag has fully elapsed.
    pub(super) fn unexpired_lag(&self, relation: &Relation, since: NaiveDateTime) -> Option<Duration> {
        let elapsed = if since > self.data_date {
            0.0
        } else {
            self.lag_calendar(relation)
                .work_between(since, self.data_date, TimeUnit::Hours)
                .value
        };
        let lag = self.hours(self.lag(relation));
        (lag > elapsed).then(|| Duration::hours(lag - elapsed))
    }

    /// Lag still to run once the predecessor's actual duration is taken off.
    pub(super) fn lag_beyond_progress(&self, relation: &Relation) -> Option<Duration> {
        let lag = self.hours(self.lag(relation));
        let actual = self.hours(self.activity(relation.predecessor).actual_or_zero());
        (actual < lag).then(|| Duration::hours(lag - actual))
    }

    pub(super) fn lag_hours(&self, relation: &Relation) -> f64 {
        self.hours(self.lag(relation))
    }

    pub(super) fn actual_hours(&self, id: ActivityId) -> f64 {
        self.hours(self.activity(id).actual_or_zero())
    }

    // Task calendar or resource work

    /// Dates come from the task calendar unless a resource-dependent activity
    /// has work resources assigned.
    pub(super) fn use_task_calendar(&self, id: ActivityId) -> bool {
        let activity = self.activity(id);
        !activity.is_type(ActivityType::ResourceDependent)
            || !activity
                .assignments
                .iter()
                .any(|a| a.resource.is_some_and(|r| self.project.resource(r).kind == ResourceType::Work))
    }

    fn work_calendar(&self, id: ActivityId, assignment: &ResourceAssignment) -> &dyn Calendar {
        match assignment.resource {
            Some(resource) => self.project.resource_calendar(resource),
            None => self.project.effective_calendar(id),
        }
    }

    /// Calendar driving an assignment's remaining dates.
    pub(super) fn assignment_work_calendar(&self, id: ActivityId, assignment: &ResourceAssignment) -> &dyn Calendar {
        if self.activity(id).is_type(ActivityType::ResourceDependent) {
            self.work_calendar(id, assignment)
        } else {
            self.project.assignment_calendar(id, assignment)
        }
    }

    /// Move `date` forwards or backwards by a portion of the activity's
    /// duration, or of its assignments' work.
    pub(super) fn shift(&self, id: ActivityId, date: NaiveDateTime, portion: Portion, forward: bool) -> NaiveDateTime {
        let directed = |d: Duration| if forward { d } else { d.negate() };
        let activity = self.activity(id);

        if self.use_task_calendar(id) {
            let duration = match portion {
                Portion::Total => activity.duration_or_zero(),
                Portion::Remaining => activity.remaining_or_zero(),
            };
            return rounded_date(self.project.effective_calendar(id), date, directed(duration));
        }

        let dates = work_assignments(self.project, id).map(|assignment| {
            let work = match portion {
                Portion::Total => assignment.work,
                Portion::Remaining => assignment.remaining_work,
            }
            .unwrap_or_else(|| Duration::zero(TimeUnit::Hours));
            date_from_work(self.work_calendar(id, assignment), assignment.units, date, directed(work))
        });
        let result = if forward { dates.max() } else { dates.min() };
        result.unwrap_or(date)
    }

    pub(super) fn next_work_start(&self, id: ActivityId, date: NaiveDateTime) -> NaiveDateTime {
        if self.use_task_calendar(id) {
            return self.project.effective_calendar(id).next_work_start(date);
        }
        work_assignments(self.project, id)
            .map(|a| self.project.assignment_calendar(id, a).next_work_start(date))
            .min()
            .unwrap_or(date)
    }

    pub(super) fn equivalent_previous_work_finish(&self, id: ActivityId, date: NaiveDateTime) -> NaiveDateTime {
        if self.use_task_calendar(id) {
            return equivalent_previous_work_finish(self.project.effective_calendar(id), date);
        }
        work_assignments(self.project, id)
            .map(|a| equivalent_previous_work_finish(self.project.assignment_calendar(id, a), date))
            .max()
            .unwrap_or(date)
    }

    pub(super) fn equivalent_next_work_start(&self, id: ActivityId, date: NaiveDateTime) -> NaiveDateTime {
        if self.use_task_calendar(id) {
            return equivalent_next_work_start(self.project.effective_calendar(id), date);
        }
        work_assignments(self.project, id)
            .map(|a| equivalent_next_work_start(self.project.assignment_calendar(id, a), date))
            .min()
            .unwrap_or(date)
    }

    pub(super) fn has_remaining_duration(&self, id: ActivityId) -> bool {
        if self.use_task_calendar(id) {
            return !self.activity(id).remaining_or_zero().is_zero();
        }
        work_assignments(self.project, id).any(|a| a.remaining_work.is_some_and(|w| !w.is_zero()))
    }

    pub(super) fn has_actual_duration(&self, id: ActivityId) -> bool {
        if self.use_task_calendar(id) {
            return !self.activity(id).actual_or_zero().is_zero();
        }
        work_assignments(self.project, id).any(|a| a.actual_work.is_some_and(|w| !w.is_zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WorkingCalendar;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_rounding_to_nearest_minute() {
        let cal = WorkingCalendar::twenty_four_hour();
        let forward = Duration::new(30.0, TimeUnit::ElapsedMinutes);
        // 29.5 minutes forward lands on 30 seconds and rounds up
        let half = Duration::new(29.5, TimeUnit::ElapsedMinutes);
        assert_eq!(rounded_date(&cal, at(1, 8, 0, 0), forward), at(1, 8, 30, 0));
        assert_eq!(rounded_date(&cal, at(1, 8, 0, 0), half), at(1, 8, 30, 0));
        // backwards, exactly thirty seconds rounds down
        assert_eq!(rounded_date(&cal, at(1, 8, 0, 0), half.negate()), at(1, 7, 30, 0));
    }

    #[test]
    fn test_date_from_work_scales_by_units() {
        let cal = WorkingCalendar::standard("Standard");
        let work = Duration::hours(8.0);
        assert_eq!(date_from_work(&cal, 100.0, at(1, 8, 0, 0), work), at(1, 17, 0, 0));
        assert_eq!(date_from_work(&cal, 50.0, at(1, 8, 0, 0), work), at(2, 17, 0, 0));
        assert_eq!(date_from_work(&cal, 0.0, at(1, 8, 0, 0), work), at(1, 8, 0, 0));
    }
}
