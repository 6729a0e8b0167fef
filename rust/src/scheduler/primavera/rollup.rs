//! Hierarchy rollup and WBS summary activities.

use crate::duration::{Duration, TimeUnit};
use crate::models::{ActivityId, ActivityType, PercentCompleteType, ScheduleDates};
use crate::scheduler::{earliest, latest, leaf_descendants, post_order};
use crate::slack::{PrimaveraSlackCalculator, SlackCalculator};

use super::Run;

impl Run<'_> {
    /// Roll dates, durations and progress up through every parent, children first.
    pub(super) fn rollup(&mut self) {
        let roots = self.project.top_level();
        for id in post_order(&*self.project, &roots) {
            if !self.activity(id).children().is_empty() {
                self.rollup_activity(id);
            }
        }
    }

    fn rollup_activity(&mut self, id: ActivityId) {
        let parent = self.activity(id);
        let mut rolled = parent.clone();
        let mut finished = 0;
        let mut critical = false;

        for &child_id in parent.children() {
            let child = self.activity(child_id);
            rolled.dates.start = earliest(rolled.dates.start, child.dates.start);
            rolled.dates.finish = latest(rolled.dates.finish, child.dates.finish);
            rolled.planned_start = earliest(rolled.planned_start, child.planned_start);
            rolled.planned_finish = latest(rolled.planned_finish, child.planned_finish);
            rolled.actual_start = earliest(rolled.actual_start, child.actual_start);
            rolled.actual_finish = latest(rolled.actual_finish, child.actual_finish);
            rolled.baseline_start = earliest(rolled.baseline_start, child.baseline_start);
            rolled.baseline_finish = latest(rolled.baseline_finish, child.baseline_finish);

            // a finished level of effort no longer bounds the remaining work
            if !(child.is_type(ActivityType::LevelOfEffort) && child.actual_finish.is_some()) {
                let (dates, child_dates) = (&mut rolled.dates, &child.dates);
                dates.early_start = earliest(dates.early_start, child_dates.early_start);
                dates.early_finish = latest(dates.early_finish, child_dates.early_finish);
                dates.remaining_early_start = earliest(dates.remaining_early_start, child_dates.remaining_early_start);
                dates.remaining_early_finish = latest(dates.remaining_early_finish, child_dates.remaining_early_finish);
                dates.late_start = earliest(dates.late_start, child_dates.late_start);
                dates.late_finish = latest(dates.late_finish, child_dates.late_finish);
                dates.remaining_late_start = earliest(dates.remaining_late_start, child_dates.remaining_late_start);
                dates.remaining_late_finish = latest(dates.remaining_late_finish, child_dates.remaining_late_finish);
            }

            if child.actual_finish.is_some() {
                finished += 1;
            }
            critical |= child.critical.unwrap_or(false);
        }
        let all_finished = finished == parent.children().len();
        if !all_finished {
            rolled.actual_finish = parent.actual_finish;
        }

        let calendar = self.project.effective_calendar(id);
        let work = |start, finish| calendar.work_between(start, finish, TimeUnit::Hours);

        if let (Some(start), Some(finish)) = (rolled.planned_start, rolled.planned_finish) {
            rolled.planned_duration = Some(work(start, finish));
        }

        let (actual, remaining) = if all_finished {
            let actual = match (rolled.actual_start, rolled.actual_finish) {
                (Some(start), Some(finish)) => Some(work(start, finish)),
                _ => None,
            };
            (actual, Some(Duration::hours(0.0)))
        } else {
            let dates = &rolled.dates;
            let task_start = dates
                .remaining_early_start
                .or(dates.early_start)
                .or(rolled.planned_start);
            let task_finish = dates
                .remaining_early_finish
                .or(dates.early_finish)
                .or(rolled.planned_finish);
            let actual = match (rolled.actual_start, task_start) {
                (Some(actual_start), Some(start)) => Some(work(actual_start, start)),
                _ => None,
            };
            let remaining = match (task_start, task_finish) {
                (Some(start), Some(finish)) => Some(work(start, finish)),
                _ => None,
            };
            (actual, remaining)
        };
        let actual = actual.filter(|d| !d.is_negative());
        let remaining = remaining.filter(|d| !d.is_negative());

        rolled.actual_duration = actual;
        rolled.remaining_duration = remaining;
        rolled.duration = match (actual, remaining) {
            (Some(a), Some(r)) => Some(a.add(r, &self.project.properties.time_conversion)),
            (a, None) => a,
            (None, r) => r,
        };

        if let (Some(planned), Some(remaining)) = (rolled.planned_duration, remaining) {
            if !planned.is_zero() {
                let percent = (planned.value - remaining.value) / planned.value * 100.0;
                rolled.percent_complete = Some(percent.clamp(0.0, 100.0));
                rolled.percent_complete_type = Some(PercentCompleteType::Duration);
            }
        }
        rolled.critical = Some(critical);

        *self.project.activity_mut(id) = rolled;
        let total_slack = PrimaveraSlackCalculator.total_slack(&*self.project, id);
        self.project.activity_mut(id).total_slack = total_slack;
    }

    /// Each WBS summary activity spans the unfinished work under its parent
    /// and shares the parent's start, finish and actual dates.
    pub(super) fn wbs_summaries(&mut self) {
        let summaries: Vec<ActivityId> = self
            .project
            .activities()
            .filter(|a| a.is_type(ActivityType::WbsSummary))
            .map(|a| a.id)
            .collect();

        for id in summaries {
            let Some(wbs) = self.activity(id).parent() else {
                continue;
            };
            let leaves = leaf_descendants(&*self.project, wbs, |a| {
                !a.is_type(ActivityType::WbsSummary) && a.actual_finish.is_none()
            });

            let parent = self.activity(wbs);
            let mut dates = ScheduleDates {
                start: parent.dates.start,
                finish: parent.dates.finish,
                ..Default::default()
            };
            let (actual_start, actual_finish) = (parent.actual_start, parent.actual_finish);

            for &leaf in &leaves {
                let leaf = &self.activity(leaf).dates;
                dates.early_start = earliest(dates.early_start, leaf.early_start);
                dates.early_finish = latest(dates.early_finish, leaf.early_finish);
                dates.remaining_early_start = earliest(dates.remaining_early_start, leaf.remaining_early_start);
                dates.remaining_early_finish = latest(dates.remaining_early_finish, leaf.remaining_early_finish);
                dates.late_start = earliest(dates.late_start, leaf.late_start);
                dates.late_finish = latest(dates.late_finish, leaf.late_finish);
                dates.remaining_late_start = earliest(dates.remaining_late_start, leaf.remaining_late_start);
                dates.remaining_late_finish = latest(dates.remaining_late_finish, leaf.remaining_late_finish);
            }

            let activity = self.project.activity_mut(id);
            activity.dates = dates;
            activity.actual_start = actual_start;
            activity.actual_finish = actual_finish;
        }
    }
}
