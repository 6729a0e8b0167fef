//! Level of effort activities.
//!
//! A level of effort activity has no duration of its own. It stretches from
//! the earliest date its predecessors allow to the latest date its
//! successors need, and is marked started or finished when those
//! neighbours already are.

use chrono::NaiveDateTime;

use crate::annotated::AnnotatedDateTime;
use crate::duration::TimeUnit;
use crate::models::{ActivityId, RelationType};
use crate::scheduler::equivalent_previous_work_finish;
use crate::log_checks;

use super::Run;

/// Candidate bounds gathered from one side of the activity.
#[derive(Debug, Default)]
struct Bounds {
    early_start: Option<AnnotatedDateTime>,
    early_finish: Option<AnnotatedDateTime>,
    late_start: Option<AnnotatedDateTime>,
    late_finish: Option<AnnotatedDateTime>,
}

fn tagged(value: Option<NaiveDateTime>, actual: bool) -> Option<AnnotatedDateTime> {
    value.map(|v| if actual { AnnotatedDateTime::actual(v) } else { AnnotatedDateTime::planned(v) })
}

impl Run<'_> {
    pub(super) fn level_of_effort(&mut self, id: ActivityId) {
        {
            let activity = self.project.activity_mut(id);
            activity.actual_start = None;
            activity.actual_finish = None;
        }

        let from_predecessors = self.predecessor_bounds(id);
        let from_successors = self.successor_bounds(id);

        let mut early_start = AnnotatedDateTime::earliest(from_successors.early_start, from_predecessors.early_start)
            .unwrap_or_else(|| AnnotatedDateTime::planned(self.next_work_start(id, self.data_date)));
        let mut early_finish = AnnotatedDateTime::latest(from_predecessors.early_finish, from_successors.early_finish)
            .unwrap_or(early_start);
        let late_finish = AnnotatedDateTime::latest(from_predecessors.late_finish, from_successors.late_finish)
            .unwrap_or_else(|| AnnotatedDateTime::planned(self.project_finish));
        let mut late_start =
            AnnotatedDateTime::earliest(from_successors.late_start, from_predecessors.late_start).unwrap_or(late_finish);

        let mut start = early_start;
        let mut actual_start = None;
        if early_start.is_before_date(self.data_date) {
            if early_start.actual {
                early_start = AnnotatedDateTime::actual(self.data_date);
            } else {
                early_start = AnnotatedDateTime::planned(self.next_work_start(id, self.data_date));
                start = AnnotatedDateTime::actual(start.value);
                actual_start = Some(start.value);
            }
        }

        if !early_finish.actual {
            if early_finish.is_before_date(self.data_date) {
                early_finish = AnnotatedDateTime::planned(self.data_date);
            }
            if early_finish.is_before(&early_start) {
                early_finish = early_start;
            }
        }
        if late_start.is_after(&late_finish) {
            late_start = late_finish;
        }

        let start_date = if start.actual { start.value } else { early_start.value };
        let finish_date = early_finish.value;

        let calendar = self.project.effective_calendar(id);
        let worked_up_to = |date: NaiveDateTime| calendar.work_between(self.data_date, date, TimeUnit::Hours).value <= 0.0;
        let mut actual_finish = None;
        if early_start.actual && worked_up_to(start_date) {
            actual_start = Some(start_date);
        }
        if (early_finish.actual || late_finish.actual) && worked_up_to(finish_date) {
            actual_start = Some(start_date);
            actual_finish = Some(finish_date);
        }
        let snapped_early_start = calendar.next_work_start(early_start.value);
        let snapped_late_start = calendar.next_work_start(late_start.value);

        log_checks!(
            self.verbosity,
            "{}: level of effort {} to {}",
            self.activity(id).name,
            start_date,
            finish_date
        );

        let activity = self.project.activity_mut(id);
        activity.actual_start = actual_start;
        activity.actual_finish = actual_finish;
        activity.dates.start = Some(start_date);
        activity.dates.finish = Some(finish_date);
        activity.dates.early_start = Some(snapped_early_start);
        activity.dates.early_finish = Some(early_finish.value);
        activity.dates.late_start = Some(snapped_late_start);
        activity.dates.late_finish = Some(late_finish.value);
        if actual_start.is_none() {
            activity.planned_start = Some(start_date);
            activity.planned_finish = Some(finish_date);
        }
        if actual_start.is_none() || actual_finish.is_none() {
            activity.dates.remaining_early_start = Some(early_start.value);
            activity.dates.remaining_early_finish = Some(early_finish.value);
            activity.dates.remaining_late_start = Some(late_start.value);
            activity.dates.remaining_late_finish = Some(late_finish.value);
        }
        self.update_assignment_dates(id);
    }

    fn predecessor_bounds(&self, id: ActivityId) -> Bounds {
        let mut bounds = Bounds::default();
        for relation in self.project.predecessors(id) {
            let predecessor = self.activity(relation.predecessor);
            let dates = &predecessor.dates;
            let lagged = |date: Option<NaiveDateTime>| date.map(|d| self.add_lag(relation, d));

            match relation.kind {
                RelationType::StartStart => {
                    let (early, late) = match predecessor.actual_start {
                        Some(actual) => {
                            let value = tagged(Some(self.add_lag(relation, actual)), true);
                            (value, tagged(lagged(dates.late_start), false))
                        }
                        None => (tagged(lagged(dates.early_start), false), tagged(lagged(dates.late_start), false)),
                    };
                    bounds.early_start = AnnotatedDateTime::earliest(bounds.early_start, early);
                    bounds.late_start = AnnotatedDateTime::earliest(bounds.late_start, late);
                }
                RelationType::FinishStart => {
                    let (early, late) = match predecessor.actual_finish {
                        Some(actual) => {
                            let value = tagged(Some(self.add_lag(relation, actual)), true);
                            (value, value)
                        }
                        None => (
                            tagged(lagged(dates.early_finish), false),
                            tagged(lagged(dates.late_finish), false),
                        ),
                    };
                    bounds.early_start = AnnotatedDateTime::earliest(bounds.early_start, early);
                    bounds.late_start = AnnotatedDateTime::earliest(bounds.late_start, late);
                }
                RelationType::StartFinish => {
                    let (early, late) = match predecessor.actual_start {
                        Some(actual) => {
                            let value = tagged(Some(self.add_lag(relation, actual)), true);
                            (value, value)
                        }
                        None => (
                            tagged(lagged(dates.early_start).map(|d| self.adjust_finish(id, d)), false),
                            tagged(lagged(dates.late_start).map(|d| self.adjust_finish(id, d)), false),
                        ),
                    };
                    bounds.early_finish = AnnotatedDateTime::latest(bounds.early_finish, early);
                    bounds.late_finish = AnnotatedDateTime::latest(bounds.late_finish, late);
                }
                RelationType::FinishFinish => {
                    let (early, late) = match predecessor.actual_finish {
                        Some(actual) => {
                            let value = tagged(Some(self.add_lag(relation, actual)), true);
                            (value, value)
                        }
                        None => (
                            tagged(lagged(dates.early_finish).map(|d| self.adjust_finish(id, d)), false),
                            tagged(lagged(dates.late_finish).map(|d| self.adjust_finish(id, d)), false),
                        ),
                    };
                    bounds.early_finish = AnnotatedDateTime::latest(bounds.early_finish, early);
                    bounds.late_finish = AnnotatedDateTime::latest(bounds.late_finish, late);
                }
            }
        }
        bounds
    }

    fn successor_bounds(&self, id: ActivityId) -> Bounds {
        let mut bounds = Bounds::default();
        for relation in self.project.successors(id) {
            let successor = self.activity(relation.successor);
            let dates = &successor.dates;
            let unlagged = |date: Option<NaiveDateTime>| date.map(|d| self.remove_lag(relation, d));

            match relation.kind {
                RelationType::StartStart => {
                    let (early, late) = match successor.actual_start {
                        Some(actual) => {
                            let value = tagged(Some(self.remove_lag(relation, actual)), true);
                            (value, value)
                        }
                        None => (
                            tagged(unlagged(dates.early_start), false),
                            tagged(unlagged(dates.late_start), false),
                        ),
                    };
                    bounds.early_start = AnnotatedDateTime::earliest(bounds.early_start, early);
                    bounds.late_start = AnnotatedDateTime::earliest(bounds.late_start, late);
                }
                RelationType::FinishStart => {
                    let (early, late) = match successor.actual_start {
                        Some(actual) => {
                            let value = tagged(Some(self.remove_lag(relation, actual)), true);
                            (value, value)
                        }
                        None => (
                            tagged(unlagged(dates.early_start).map(|d| self.adjust_finish(id, d)), false),
                            tagged(unlagged(dates.late_start).map(|d| self.adjust_finish(id, d)), false),
                        ),
                    };
                    bounds.early_finish = AnnotatedDateTime::latest(bounds.early_finish, early);
                    bounds.late_finish = AnnotatedDateTime::latest(bounds.late_finish, late);
                }
                RelationType::StartFinish => {
                    let (early, late) = match successor.actual_finish {
                        Some(actual) => {
                            let value = tagged(Some(self.remove_lag(relation, actual)), true);
                            (value, value)
                        }
                        None => (
                            tagged(unlagged(dates.early_finish), false),
                            tagged(unlagged(dates.late_finish), false),
                        ),
                    };
                    bounds.early_start = AnnotatedDateTime::earliest(bounds.early_start, early);
                    bounds.late_start = AnnotatedDateTime::earliest(bounds.late_start, late);
                }
                RelationType::FinishFinish => {
                    let (early, late) = match successor.actual_finish {
                        Some(actual) => {
                            let value = tagged(Some(self.remove_lag(relation, actual)), true);
                            (value, value)
                        }
                        None => (
                            tagged(unlagged(dates.early_finish).map(|d| self.adjust_finish(id, d)), false),
                            tagged(unlagged(dates.late_finish).map(|d| self.adjust_finish(id, d)), false),
                        ),
                    };
                    bounds.early_finish = AnnotatedDateTime::latest(bounds.early_finish, early);
                    bounds.late_finish = AnnotatedDateTime::latest(bounds.late_finish, late);
                }
            }
        }
        bounds
    }

    /// A finish falling on the start of a working period belongs to the previous one.
    fn adjust_finish(&self, id: ActivityId, date: NaiveDateTime) -> NaiveDateTime {
        equivalent_previous_work_finish(self.project.effective_calendar(id), date)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::duration::Duration;
    use crate::models::{Activity, ActivityType, Relation, RelationType};
    use crate::project::Project;
    use crate::scheduler::{PrimaveraScheduler, Scheduler};

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn task(name: &str, days: f64) -> Activity {
        Activity::new(name).with_duration(Duration::days(days))
    }

    fn level_of_effort() -> Activity {
        task("LOE", 0.0).with_type(ActivityType::LevelOfEffort)
    }

    #[test]
    fn test_spans_from_predecessor_start_to_successor_finish() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 2.0));
        let b = project.add_activity(task("B", 3.0));
        let loe = project.add_activity(level_of_effort());
        project.add_relation(Relation::finish_start(a, b));
        project.add_relation(Relation::new(a, loe, RelationType::StartStart, Duration::days(0.0)));
        project.add_relation(Relation::new(loe, b, RelationType::FinishFinish, Duration::days(0.0)));
        let mut scheduler = PrimaveraScheduler::new(0);
        scheduler.schedule(&mut project, dt(1, 8)).unwrap();

        assert!(!scheduler.sorted_activities().contains(&loe));
        let loe = project.activity(loe);
        assert_eq!(loe.dates.early_start, Some(dt(1, 8)));
        assert_eq!(loe.dates.early_finish, Some(dt(5, 17)));
        assert_eq!(loe.dates.start, Some(dt(1, 8)));
        assert_eq!(loe.dates.finish, Some(dt(5, 17)));
        assert_eq!(loe.actual_start, None);
        assert_eq!(loe.planned_start, Some(dt(1, 8)));
    }

    #[test]
    fn test_started_predecessor_marks_level_of_effort_started() {
        let mut project = Project::with_standard_calendar();
        project.properties.status_date = Some(dt(3, 8));
        let a = project.add_activity(task("A", 4.0).with_progress(dt(1, 8), Duration::days(2.0)));
        let loe = project.add_activity(level_of_effort());
        project.add_relation(Relation::new(a, loe, RelationType::StartStart, Duration::days(0.0)));
        project.add_relation(Relation::new(a, loe, RelationType::FinishFinish, Duration::days(0.0)));
        PrimaveraScheduler::new(0).schedule(&mut project, dt(1, 8)).unwrap();

        let loe = project.activity(loe);
        assert_eq!(loe.actual_start, Some(dt(1, 8)));
        assert_eq!(loe.actual_finish, None);
        assert_eq!(loe.dates.start, Some(dt(1, 8)));
        assert_eq!(loe.dates.early_start, Some(dt(3, 8)));
        assert_eq!(loe.dates.finish, Some(dt(4, 17)));
    }

    #[test]
    fn test_isolated_level_of_effort_sits_at_data_date() {
        let mut project = Project::with_standard_calendar();
        project.add_activity(task("A", 2.0));
        let loe = project.add_activity(level_of_effort());
        PrimaveraScheduler::new(0).schedule(&mut project, dt(1, 8)).unwrap();

        let loe = project.activity(loe);
        assert_eq!(loe.dates.early_start, Some(dt(1, 8)));
        assert_eq!(loe.dates.early_finish, Some(dt(1, 8)));
        assert_eq!(loe.dates.late_finish, Some(dt(2, 17)));
    }
}
