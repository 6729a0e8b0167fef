//! Per-relation date rules for the Microsoft-style passes.
//!
//! Each rule is a match over the relation kind and the progress of the
//! activities at either end. Several cells give the same answer; they are
//! kept apart so a single cell can change without touching its neighbours.

use chrono::NaiveDateTime;

use crate::models::{Progress, Relation, RelationType};

use super::{Portion, Run};

impl Run<'_> {
    /// Predecessor dates feed from its late dates once the backward pass has
    /// run, if it is ALAP and the successor is not.
    pub(super) fn is_alap(&self, relation: &Relation) -> bool {
        self.backward_pass_done
            && self.activity(relation.predecessor).is_alap()
            && !self.activity(relation.successor).is_alap()
    }

    pub(super) fn add_lag(&self, relation: &Relation, date: NaiveDateTime) -> NaiveDateTime {
        if relation.lag.is_zero() {
            return date;
        }
        let lag = relation
            .lag
            .percent_of(self.activity(relation.predecessor).duration_or_zero());
        self.project
            .effective_calendar(relation.successor)
            .add_duration(date, lag)
    }

    pub(super) fn remove_lag(&self, relation: &Relation, date: NaiveDateTime) -> NaiveDateTime {
        if relation.lag.is_zero() {
            return date;
        }
        let lag = relation
            .lag
            .percent_of(self.activity(relation.predecessor).duration_or_zero());
        self.project
            .effective_calendar(relation.successor)
            .add_duration(date, lag.negate())
    }

    /// Earliest start the relation allows its successor. `None` when the
    /// predecessor has no dates to offer, as with external activities.
    pub(super) fn early_start_for(&self, relation: &Relation) -> Option<NaiveDateTime> {
        let predecessor = self.activity(relation.predecessor);
        let (start, finish) = if self.is_alap(relation) {
            (predecessor.dates.late_start, predecessor.dates.late_finish)
        } else {
            (predecessor.dates.early_start, predecessor.dates.early_finish)
        };
        let successor = relation.successor;

        let date = match (relation.kind, predecessor.progress()) {
            (RelationType::FinishStart, Progress::NotStarted) => self.add_lag(relation, finish?),
            (RelationType::FinishStart, Progress::InProgress) => self.add_lag(relation, finish?),
            (RelationType::FinishStart, Progress::Finished) => self.add_lag(relation, finish?),

            (RelationType::StartStart, Progress::NotStarted) => self.add_lag(relation, start?),
            (RelationType::StartStart, Progress::InProgress) => self.add_lag(relation, start?),
            (RelationType::StartStart, Progress::Finished) => self.add_lag(relation, predecessor.actual_start?),

            (RelationType::StartFinish, Progress::NotStarted)
            | (RelationType::StartFinish, Progress::InProgress)
            | (RelationType::StartFinish, Progress::Finished) => {
                let start = self.shift(successor, start?, Portion::Total, false);
                self.add_lag(relation, start)
            }

            (RelationType::FinishFinish, Progress::NotStarted) | (RelationType::FinishFinish, Progress::InProgress) => {
                let start = self.shift(successor, finish?, Portion::Remaining, false);
                self.add_lag(relation, start).max(self.project_start)
            }
            (RelationType::FinishFinish, Progress::Finished) => {
                let start = self.shift(successor, predecessor.actual_finish?, Portion::Remaining, false);
                self.add_lag(relation, start).max(self.project_start)
            }
        };
        Some(date)
    }

    /// Latest finish the relation allows its predecessor, never later than
    /// the project finish.
    pub(super) fn late_finish_for(&self, relation: &Relation) -> Option<NaiveDateTime> {
        let predecessor = self.activity(relation.predecessor);
        let successor = self.activity(relation.successor);
        let successor_is_last = !self.project.has_successors(relation.successor);

        let late_finish = match (relation.kind, predecessor.progress(), successor.progress()) {
            (RelationType::StartStart, Progress::NotStarted, Progress::NotStarted) => {
                if predecessor.is_manual() && successor_is_last {
                    successor.dates.late_finish?
                } else if predecessor.is_manual() {
                    self.project_finish
                } else {
                    let next = self
                        .project
                        .effective_calendar(relation.predecessor)
                        .next_work_start(successor.dates.late_start?);
                    let late_start = self.remove_lag(relation, next);
                    self.shift(relation.predecessor, late_start, Portion::Total, true)
                }
            }
            (RelationType::StartStart, Progress::NotStarted, Progress::InProgress | Progress::Finished) => {
                if successor_is_last {
                    self.project_finish
                } else {
                    let late_start = self.shift(relation.successor, successor.actual_start?, Portion::Actual, true);
                    self.shift(relation.predecessor, late_start, Portion::Total, true)
                }
            }
            (RelationType::StartStart, Progress::InProgress | Progress::Finished, _) => self.project_finish,

            (RelationType::FinishFinish, Progress::NotStarted, Progress::NotStarted)
            | (RelationType::FinishFinish, Progress::NotStarted, Progress::InProgress | Progress::Finished) => {
                self.remove_lag(relation, successor.dates.late_finish?)
            }
            (RelationType::FinishFinish, Progress::InProgress | Progress::Finished, _) => {
                self.remove_lag(relation, successor.dates.late_finish?)
            }

            (RelationType::FinishStart, Progress::NotStarted, _) => {
                self.remove_lag(relation, self.successor_late_start(relation)?)
            }
            (RelationType::FinishStart, Progress::InProgress | Progress::Finished, _) => {
                self.remove_lag(relation, self.successor_late_start(relation)?)
            }

            (RelationType::StartFinish, Progress::NotStarted, _) => {
                let finish = self.shift(relation.predecessor, successor.dates.late_finish?, Portion::Total, true);
                self.remove_lag(relation, finish)
            }
            (RelationType::StartFinish, Progress::InProgress | Progress::Finished, _) => {
                let finish = self.shift(relation.predecessor, successor.dates.late_finish?, Portion::Total, true);
                self.remove_lag(relation, finish)
            }
        };
        Some(late_finish.min(self.project_finish))
    }

    /// Late start as calculated from remaining duration, before actual
    /// dates replaced it.
    fn successor_late_start(&self, relation: &Relation) -> Option<NaiveDateTime> {
        self.calculated_late_start
            .get(&relation.successor)
            .copied()
            .or(self.activity(relation.successor).dates.late_start)
    }
}
