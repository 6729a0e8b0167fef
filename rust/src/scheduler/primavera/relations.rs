//! Per-relation date rules for the Primavera-style passes.
//!
//! Cells are keyed on the relation kind, the progress at either end and the
//! sign of the lag. A lag that started running against a completed
//! predecessor only counts the part still ahead of the data date.

use chrono::NaiveDateTime;

use crate::models::{ActivityId, Progress, Relation, RelationType};
use crate::scheduler::LagSign;

use super::{Portion, Run};

impl Run<'_> {
    /// Earliest start the relation allows its successor.
    pub(super) fn early_start_for(&self, relation: &Relation) -> Option<NaiveDateTime> {
        use LagSign::{Negative, Positive, Zero};
        use Progress::{Finished, InProgress, NotStarted};

        let predecessor = self.activity(relation.predecessor);
        let successor = self.activity(relation.successor);
        let state = (
            predecessor.progress(),
            successor.progress(),
            LagSign::of(relation.lag),
        );
        let succ = relation.successor;

        let date = match relation.kind {
            RelationType::FinishStart => {
                let finish = predecessor.dates.early_finish?;
                match state {
                    (NotStarted, NotStarted, Zero) => finish,
                    (NotStarted, _, _) => self.add_lag(relation, finish),
                    (Finished, NotStarted, Positive) => {
                        match self.unexpired_lag(relation, predecessor.actual_finish?) {
                            Some(lag) => self.add_lag_of(relation, finish, lag),
                            None => finish,
                        }
                    }
                    (Finished, _, _) => finish,
                    (InProgress, _, _) => self.add_lag(relation, finish),
                }
            }

            RelationType::StartStart => {
                let start = predecessor.dates.early_start?;
                match state {
                    (NotStarted, NotStarted, Zero) => self.lag_calendar(relation).next_work_start(start),
                    (NotStarted, _, _) => self.add_lag(relation, start),
                    (Finished, NotStarted, Zero | Positive) | (Finished, InProgress, Positive) => {
                        let lagged = self.add_lag(relation, predecessor.actual_start?);
                        if lagged < self.data_date {
                            start
                        } else {
                            lagged
                        }
                    }
                    (Finished, NotStarted, Negative) => self.add_lag(relation, predecessor.actual_start?),
                    (Finished, InProgress, Zero | Negative) => start,
                    (Finished, Finished, _) => start,
                    (InProgress, NotStarted, _) => {
                        if self.actual_hours(relation.predecessor) == 0.0 || self.lag_hours(relation) <= 0.0 {
                            start
                        } else {
                            match self.lag_beyond_progress(relation) {
                                Some(lag) => self.add_lag_of(relation, start, lag),
                                None => start,
                            }
                        }
                    }
                    (InProgress, InProgress, _) => {
                        if self.lag_hours(relation) <= 0.0 {
                            start
                        } else {
                            match self.lag_beyond_progress(relation) {
                                Some(lag) => self.add_lag_of(relation, start, lag),
                                None => start,
                            }
                        }
                    }
                    (InProgress, Finished, _) => start,
                }
            }

            RelationType::FinishFinish => {
                let finish = predecessor.dates.early_finish?;
                let from_finish = |date: NaiveDateTime| {
                    self.shift(succ, date, Portion::Remaining, false)
                        .max(self.project_start)
                };
                match state {
                    (NotStarted | InProgress, _, Zero) => from_finish(finish),
                    (NotStarted | InProgress, _, _) => from_finish(self.add_lag(relation, finish)),
                    (Finished, NotStarted, Zero) | (Finished, InProgress, Zero) => {
                        from_finish(predecessor.actual_finish?)
                    }
                    (Finished, NotStarted, Positive) => {
                        if self.lag_hours(relation) > self.actual_hours(relation.predecessor) {
                            from_finish(self.add_lag(relation, predecessor.actual_finish?))
                        } else {
                            from_finish(self.add_lag(relation, self.add_lag(relation, finish)))
                        }
                    }
                    (Finished, NotStarted, Negative) => {
                        from_finish(self.add_lag(relation, self.add_lag(relation, finish)))
                    }
                    (Finished, InProgress, _) => from_finish(self.add_lag(relation, predecessor.actual_finish?)),
                    (Finished, Finished, _) => self.data_date,
                }
            }

            RelationType::StartFinish => {
                let start = predecessor.dates.early_start?;
                let from_finish_total = |date: NaiveDateTime| self.shift(succ, date, Portion::Total, false);
                let from_finish_remaining = |date: NaiveDateTime| self.shift(succ, date, Portion::Remaining, false);
                let unexpired = || -> Option<NaiveDateTime> {
                    Some(match self.unexpired_lag(relation, predecessor.actual_start?) {
                        Some(lag) => from_finish_remaining(self.add_lag_of(relation, start, lag)),
                        None => start,
                    })
                };
                match state {
                    (NotStarted, NotStarted, _) | (Finished, NotStarted, _) => {
                        self.add_lag(relation, from_finish_total(start))
                    }
                    (NotStarted, InProgress, Zero | Negative) => {
                        let finish = self.shift(succ, successor.actual_start?, Portion::Total, true);
                        from_finish_remaining(finish)
                    }
                    (NotStarted, InProgress, Positive) => from_finish_remaining(self.add_lag(relation, start)),
                    (NotStarted, Finished, Zero) | (Finished, Finished, Zero) | (InProgress, Finished, Zero) => start,
                    (NotStarted, Finished, _) => self.add_lag(relation, start),
                    (Finished, InProgress, _) | (InProgress, InProgress, _) => unexpired()?,
                    (Finished, Finished, _) => self.add_lag(relation, start).min(self.data_date),
                    (InProgress, NotStarted, _) => self
                        .add_lag(relation, from_finish_total(start))
                        .min(self.data_date),
                    (InProgress, Finished, _) => self.equivalent_next_work_start(succ, self.data_date),
                }
            }
        };
        Some(date)
    }

    /// Latest finish the relation allows its predecessor.
    pub(super) fn late_finish_for(&self, relation: &Relation) -> Option<NaiveDateTime> {
        use LagSign::{Negative, Positive, Zero};
        use Progress::{Finished, InProgress, NotStarted};

        let predecessor = self.activity(relation.predecessor);
        let successor = self.activity(relation.successor);
        let state = (
            predecessor.progress(),
            successor.progress(),
            LagSign::of(relation.lag),
        );
        let pred = relation.predecessor;
        let from_start = |date: NaiveDateTime, portion: Portion| self.shift(pred, date, portion, true);
        let remove_unexpired = |date: NaiveDateTime, since: Option<NaiveDateTime>| -> Option<NaiveDateTime> {
            Some(match self.unexpired_lag(relation, since?) {
                Some(lag) => self.remove_lag_of(relation, date, lag),
                None => date,
            })
        };

        let late_finish = match relation.kind {
            RelationType::StartStart => {
                let late_start = successor.dates.late_start?;
                let start = match state {
                    (NotStarted, NotStarted, Zero) => {
                        let start = self.next_work_start(pred, late_start);
                        let finish = from_start(start, Portion::Remaining);
                        let successor_finish = successor.dates.late_finish?;
                        return Some(self.limit_to_project_finish(
                            pred,
                            if !self.project.has_successors(relation.successor) && successor_finish < finish {
                                successor_finish
                            } else {
                                finish
                            },
                        ));
                    }
                    (NotStarted, NotStarted, _) => self.next_work_start(pred, self.remove_lag(relation, late_start)),
                    (NotStarted, _, _) => self.remove_lag(relation, late_start),
                    (Finished, NotStarted, Positive) | (Finished, Finished, Positive) => {
                        remove_unexpired(late_start, predecessor.actual_start)?
                    }
                    (Finished, _, _) => late_start,
                    (InProgress, NotStarted | InProgress, Positive) => match self.lag_beyond_progress(relation) {
                        Some(lag) => self.remove_lag_of(relation, late_start, lag),
                        None => late_start,
                    },
                    (InProgress, _, _) => late_start,
                };
                from_start(start, Portion::Remaining)
            }

            RelationType::FinishFinish => {
                let finish = successor.dates.late_finish?;
                match state {
                    (NotStarted | InProgress, _, _) => self.remove_lag(relation, finish),
                    (Finished, NotStarted | Finished, Positive) => remove_unexpired(finish, predecessor.actual_finish)?,
                    (Finished, _, _) => finish,
                }
            }

            RelationType::StartFinish => {
                let finish = successor.dates.late_finish?;
                match state {
                    (NotStarted, _, _) | (Finished, NotStarted | InProgress, _) | (InProgress, InProgress, _) => {
                        self.remove_lag(relation, from_start(finish, Portion::Total))
                    }
                    (Finished, Finished, _) => finish,
                    (InProgress, NotStarted, _) => from_start(finish, Portion::Remaining),
                    (InProgress, Finished, Positive) => {
                        match self.unexpired_lag(relation, predecessor.actual_start?) {
                            Some(lag) => self.remove_lag_of(relation, from_start(finish, Portion::Total), lag),
                            None => from_start(finish, Portion::Remaining),
                        }
                    }
                    (InProgress, Finished, Zero | Negative) => from_start(finish, Portion::Remaining),
                }
            }

            RelationType::FinishStart => {
                let late_start = successor.dates.late_start?;
                let successor_underway = !successor.actual_or_zero().is_zero();
                match state {
                    (NotStarted, NotStarted | InProgress, _) => self.remove_lag(relation, late_start),
                    (NotStarted, Finished, _) => late_start,
                    (Finished, NotStarted | Finished, Positive) => {
                        remove_unexpired(late_start, predecessor.actual_finish)?
                    }
                    (Finished, NotStarted | Finished, _) => late_start,
                    (Finished, InProgress, Zero) => late_start,
                    (Finished, InProgress, _) | (InProgress, InProgress, _) => {
                        if successor_underway {
                            late_start
                        } else {
                            self.remove_lag(relation, late_start)
                        }
                    }
                    (InProgress, NotStarted, _) => self.remove_lag(relation, late_start),
                    (InProgress, Finished, _) => late_start,
                }
            }
        };
        Some(self.limit_to_project_finish(pred, late_finish))
    }

    fn limit_to_project_finish(&self, id: ActivityId, late_finish: NaiveDateTime) -> NaiveDateTime {
        if late_finish > self.project_finish {
            self.equivalent_previous_work_finish(id, self.project_finish)
        } else {
            late_finish
        }
    }

    /// Early start an ALAP predecessor may move out to without delaying
    /// this successor. Start-finish relations place no bound.
    pub(super) fn alap_early_start(&self, relation: &Relation) -> Option<NaiveDateTime> {
        let predecessor = self.activity(relation.predecessor);
        let successor = self.activity(relation.successor);
        let pred = relation.predecessor;

        match relation.kind {
            RelationType::StartStart => Some(self.remove_lag(relation, successor.dates.early_start?)),
            RelationType::FinishStart => match (predecessor.progress(), successor.progress()) {
                (Progress::NotStarted | Progress::InProgress, _) => {
                    let start = self.shift(pred, successor.dates.early_start?, Portion::Remaining, false);
                    Some(self.remove_lag(relation, start))
                }
                (Progress::Finished, Progress::Finished) => Some(self.data_date),
                (Progress::Finished, _) => Some(self.equivalent_next_work_start(pred, self.data_date)),
            },
            RelationType::FinishFinish => {
                let finish = self.remove_lag(relation, successor.dates.early_finish?);
                Some(self.shift(pred, finish, Portion::Remaining, false))
            }
            RelationType::StartFinish => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;
    use crate::models::Activity;
    use crate::project::Project;
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn pair(kind: RelationType, lag: Duration) -> (Project, Relation) {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(Activity::new("A").with_duration(Duration::days(4.0)));
        let b = project.add_activity(Activity::new("B").with_duration(Duration::days(1.0)));
        let relation = Relation::new(a, b, kind, lag);
        project.add_relation(relation);
        (project, relation)
    }

    fn set_early(project: &mut Project, id: ActivityId, start: NaiveDateTime, finish: NaiveDateTime) {
        let dates = &mut project.activity_mut(id).dates;
        dates.early_start = Some(start);
        dates.early_finish = Some(finish);
    }

    fn set_late(project: &mut Project, id: ActivityId, start: NaiveDateTime, finish: NaiveDateTime) {
        let dates = &mut project.activity_mut(id).dates;
        dates.late_start = Some(start);
        dates.late_finish = Some(finish);
    }

    #[test]
    fn test_start_start_zero_lag_snaps_to_work() {
        let (mut project, relation) = pair(RelationType::StartStart, Duration::days(0.0));
        set_early(&mut project, relation.predecessor, dt(1, 12), dt(5, 12));
        let run = Run::new(&mut project, 0, dt(1, 8), dt(1, 8));
        assert_eq!(run.early_start_for(&relation), Some(dt(1, 13)));
    }

    #[test]
    fn test_in_progress_start_start_counts_actual_duration() {
        let (mut project, relation) = pair(RelationType::StartStart, Duration::days(3.0));
        set_early(&mut project, relation.predecessor, dt(3, 8), dt(4, 17));
        {
            let a = project.activity_mut(relation.predecessor);
            a.actual_start = Some(dt(1, 8));
            a.actual_duration = Some(Duration::days(2.0));
        }
        let run = Run::new(&mut project, 0, dt(1, 8), dt(3, 8));
        // one day of lag is left after two days of progress
        assert_eq!(run.early_start_for(&relation), Some(dt(3, 17)));
    }

    #[test]
    fn test_finished_finish_finish_pair_uses_data_date() {
        let (mut project, relation) = pair(RelationType::FinishFinish, Duration::days(1.0));
        set_early(&mut project, relation.predecessor, dt(1, 8), dt(4, 17));
        for id in [relation.predecessor, relation.successor] {
            let activity = project.activity_mut(id);
            activity.actual_start = Some(dt(1, 8));
            activity.actual_finish = Some(dt(2, 17));
        }
        let run = Run::new(&mut project, 0, dt(1, 8), dt(8, 8));
        assert_eq!(run.early_start_for(&relation), Some(dt(8, 8)));
    }

    #[test]
    fn test_negative_lag_stops_at_data_date() {
        let (mut project, relation) = pair(RelationType::FinishStart, Duration::days(-3.0));
        set_early(&mut project, relation.predecessor, dt(2, 8), dt(3, 17));
        let run = Run::new(&mut project, 0, dt(1, 8), dt(2, 8));
        assert_eq!(run.early_start_for(&relation), Some(dt(2, 8)));
    }

    #[test]
    fn test_finish_start_late_finish_removes_lag() {
        let (mut project, relation) = pair(RelationType::FinishStart, Duration::days(1.0));
        set_late(&mut project, relation.successor, dt(10, 8), dt(10, 17));
        let mut run = Run::new(&mut project, 0, dt(1, 8), dt(1, 8));
        run.project_finish = dt(12, 17);
        assert_eq!(run.late_finish_for(&relation), Some(dt(9, 8)));
    }

    #[test]
    fn test_late_finish_beyond_project_finish_is_pulled_back() {
        let (mut project, relation) = pair(RelationType::FinishFinish, Duration::days(-1.0));
        set_late(&mut project, relation.successor, dt(10, 8), dt(10, 17));
        let mut run = Run::new(&mut project, 0, dt(1, 8), dt(1, 8));
        run.project_finish = dt(10, 17);
        assert_eq!(run.late_finish_for(&relation), Some(dt(10, 17)));
    }

    #[test]
    fn test_start_finish_places_no_alap_bound() {
        let (mut project, relation) = pair(RelationType::StartFinish, Duration::days(0.0));
        set_early(&mut project, relation.successor, dt(5, 8), dt(5, 17));
        let run = Run::new(&mut project, 0, dt(1, 8), dt(1, 8));
        assert_eq!(run.alap_early_start(&relation), None);
    }

    #[test]
    fn test_alap_finish_start_backs_off_remaining_duration() {
        let (mut project, relation) = pair(RelationType::FinishStart, Duration::days(0.0));
        set_early(&mut project, relation.successor, dt(8, 8), dt(8, 17));
        let run = Run::new(&mut project, 0, dt(1, 8), dt(1, 8));
        // four days back from Monday 8th
        assert_eq!(run.alap_early_start(&relation), Some(dt(2, 8)));
    }
}
