//! Slack as reported by the Primavera-style engine.
//!
//! Float is measured on remaining dates where they exist. Completed
//! activities have no float.

use chrono::NaiveDateTime;

use crate::duration::Duration;
use crate::models::{ActivityId, ActivityType, Relation, RelationType};
use crate::project::Project;

use super::{minimum, relation_variance, slack_units, SlackCalculator};

#[derive(Clone, Copy, Debug, Default)]
pub struct PrimaveraSlackCalculator;

impl PrimaveraSlackCalculator {
    fn free_slack_for(&self, project: &Project, relation: &Relation) -> Duration {
        let predecessor = &project.activity(relation.predecessor).dates;
        let successor = &project.activity(relation.successor).dates;
        match relation.kind {
            RelationType::FinishStart => {
                relation_variance(project, relation, predecessor.early_finish, successor.early_start)
            }
            RelationType::StartStart => {
                relation_variance(project, relation, predecessor.early_start, successor.early_start)
            }
            RelationType::FinishFinish => {
                relation_variance(project, relation, predecessor.early_finish, successor.early_finish)
            }
            RelationType::StartFinish => {
                relation_variance(project, relation, predecessor.early_start, successor.early_finish)
            }
        }
    }

    fn variance(
        &self,
        project: &Project,
        id: ActivityId,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Option<Duration> {
        if project.activity(id).actual_finish.is_some() {
            return None;
        }
        let (from, to) = (from?, to?);
        Some(
            project
                .effective_calendar(id)
                .work_between(from, to, slack_units(project, id)),
        )
    }
}

impl SlackCalculator for PrimaveraSlackCalculator {
    fn start_slack(&self, project: &Project, id: ActivityId) -> Option<Duration> {
        let dates = &project.activity(id).dates;
        self.variance(
            project,
            id,
            dates.remaining_early_start.or(dates.early_start),
            dates.remaining_late_start.or(dates.late_start),
        )
    }

    fn finish_slack(&self, project: &Project, id: ActivityId) -> Option<Duration> {
        let dates = &project.activity(id).dates;
        self.variance(
            project,
            id,
            dates.remaining_early_finish.or(dates.early_finish),
            dates.remaining_late_finish.or(dates.late_finish),
        )
    }

    fn free_slack(&self, project: &Project, id: ActivityId) -> Duration {
        let activity = project.activity(id);
        let units = slack_units(project, id);
        if activity.is_complete()
            || activity.summary
            || activity.is_type(ActivityType::WbsSummary)
            || activity.is_type(ActivityType::LevelOfEffort)
        {
            return Duration::zero(units);
        }

        minimum(
            project,
            project
                .successors(id)
                .filter(|r| project.activity(r.successor).actual_finish.is_none())
                .map(|r| self.free_slack_for(project, r)),
        )
        .unwrap_or_else(|| {
            match (activity.dates.early_finish, project.finish_date()) {
                (Some(finish), Some(project_finish)) => project
                    .effective_calendar(id)
                    .work_between(finish, project_finish, units),
                _ => Duration::zero(units),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Activity;
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn scheduled(name: &str, es: NaiveDateTime, ef: NaiveDateTime, ls: NaiveDateTime, lf: NaiveDateTime) -> Activity {
        let mut a = Activity::new(name).with_duration(Duration::days(1.0));
        a.dates.early_start = Some(es);
        a.dates.early_finish = Some(ef);
        a.dates.late_start = Some(ls);
        a.dates.late_finish = Some(lf);
        a
    }

    #[test]
    fn test_remaining_dates_take_precedence() {
        let mut project = Project::with_standard_calendar();
        let mut a = scheduled("A", dt(1, 8), dt(1, 17), dt(2, 8), dt(2, 17));
        a.dates.remaining_early_finish = Some(dt(1, 17));
        a.dates.remaining_late_finish = Some(dt(4, 17));
        let a = project.add_activity(a);

        let calc = PrimaveraSlackCalculator;
        assert_eq!(calc.finish_slack(&project, a), Some(Duration::days(3.0)));
        assert_eq!(calc.start_slack(&project, a), Some(Duration::days(1.0)));
        assert_eq!(calc.total_slack(&project, a), Some(Duration::days(1.0)));
    }

    #[test]
    fn test_free_slack_falls_back_to_project_finish() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(scheduled("A", dt(1, 8), dt(1, 17), dt(2, 8), dt(2, 17)));
        let b = project.add_activity(scheduled("B", dt(2, 8), dt(2, 17), dt(2, 8), dt(2, 17)));
        project.set_finish_date(Some(dt(2, 17)));

        let calc = PrimaveraSlackCalculator;
        assert_eq!(calc.free_slack(&project, a), Duration::days(1.0));
        assert_eq!(calc.free_slack(&project, b), Duration::days(0.0));
    }

    #[test]
    fn test_start_finish_uses_successor_early_finish() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(scheduled("A", dt(1, 8), dt(1, 17), dt(1, 8), dt(1, 17)));
        let b = project.add_activity(scheduled("B", dt(2, 8), dt(3, 17), dt(2, 8), dt(3, 17)));
        project.add_relation(Relation::new(a, b, RelationType::StartFinish, Duration::days(1.0)));

        let calc = PrimaveraSlackCalculator;
        // Mon 08:00 to Wed 17:00 is three days, less one day of lag
        assert_eq!(calc.free_slack(&project, a), Duration::days(2.0));
    }

    #[test]
    fn test_level_of_effort_has_no_free_slack() {
        let mut project = Project::with_standard_calendar();
        let loe = project.add_activity(
            scheduled("LOE", dt(1, 8), dt(1, 17), dt(4, 8), dt(4, 17)).with_type(ActivityType::LevelOfEffort),
        );
        assert!(PrimaveraSlackCalculator.free_slack(&project, loe).is_zero());
    }
}
