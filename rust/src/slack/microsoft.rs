//! Slack as reported by the Microsoft-style engine.

use crate::duration::{Duration, TimeUnit};
use crate::models::{ActivityId, Relation, RelationType};
use crate::project::Project;

use super::{minimum, relation_variance, slack_units, SlackCalculator};

#[derive(Clone, Copy, Debug, Default)]
pub struct MicrosoftSlackCalculator;

impl MicrosoftSlackCalculator {
    fn free_slack_for(&self, project: &Project, relation: &Relation) -> Duration {
        let predecessor = project.activity(relation.predecessor);
        let successor = project.activity(relation.successor);

        let (pred_start, pred_finish) = if predecessor.is_alap() {
            (predecessor.dates.late_start, predecessor.dates.late_finish)
        } else {
            (predecessor.dates.early_start, predecessor.dates.early_finish)
        };
        let (succ_start, succ_finish) = if successor.is_alap() {
            (successor.dates.late_start, successor.dates.late_finish)
        } else {
            (successor.dates.early_start, successor.dates.early_finish)
        };

        match relation.kind {
            RelationType::FinishStart => relation_variance(project, relation, pred_finish, succ_start),
            RelationType::StartStart => relation_variance(project, relation, pred_start, succ_start),
            RelationType::FinishFinish => relation_variance(project, relation, pred_finish, succ_finish),
            RelationType::StartFinish => self
                .total_slack(project, relation.predecessor)
                .unwrap_or_else(|| Duration::zero(slack_units(project, relation.predecessor))),
        }
    }

    fn variance(
        &self,
        project: &Project,
        id: ActivityId,
        from: Option<chrono::NaiveDateTime>,
        to: Option<chrono::NaiveDateTime>,
    ) -> Option<Duration> {
        let activity = project.activity(id);
        let duration = activity.duration?;
        if activity.is_alap() {
            return Some(Duration::zero(duration.units));
        }
        let (from, to) = (from?, to?);
        Some(project.effective_calendar(id).work_between(from, to, duration.units))
    }
}

impl SlackCalculator for MicrosoftSlackCalculator {
    fn start_slack(&self, project: &Project, id: ActivityId) -> Option<Duration> {
        let dates = &project.activity(id).dates;
        self.variance(project, id, dates.early_start, dates.late_start)
    }

    fn finish_slack(&self, project: &Project, id: ActivityId) -> Option<Duration> {
        let dates = &project.activity(id).dates;
        self.variance(project, id, dates.early_finish, dates.late_finish)
    }

    fn free_slack(&self, project: &Project, id: ActivityId) -> Duration {
        let activity = project.activity(id);
        let units = slack_units(project, id);
        if activity.actual_finish.is_some() || activity.summary {
            return Duration::zero(units);
        }

        let slack = minimum(
            project,
            project
                .successors(id)
                .filter(|r| {
                    let successor = project.activity(r.successor);
                    successor.active && !successor.null && successor.actual_finish.is_none()
                })
                .map(|r| self.free_slack_for(project, r)),
        )
        .or_else(|| self.total_slack(project, id));

        match slack {
            Some(s) if !s.is_negative() => s,
            _ => Duration::zero(TimeUnit::Hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{WorkingCalendar, WorkingRange};
    use crate::duration::TimeConversion;
    use crate::models::{Activity, Constraint};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn scheduled(name: &str, days: f64, es: NaiveDateTime, ef: NaiveDateTime, ls: NaiveDateTime, lf: NaiveDateTime) -> Activity {
        let mut a = Activity::new(name).with_duration(Duration::days(days));
        a.dates.early_start = Some(es);
        a.dates.early_finish = Some(ef);
        a.dates.late_start = Some(ls);
        a.dates.late_finish = Some(lf);
        a
    }

    #[test]
    fn test_start_and_finish_slack() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(scheduled("A", 1.0, dt(1, 8), dt(1, 17), dt(3, 8), dt(3, 17)));
        let calc = MicrosoftSlackCalculator;
        assert_eq!(calc.start_slack(&project, a), Some(Duration::days(2.0)));
        assert_eq!(calc.finish_slack(&project, a), Some(Duration::days(2.0)));
        assert_eq!(calc.total_slack(&project, a), Some(Duration::days(2.0)));
        assert!(!calc.is_critical(&project, a));
    }

    #[test]
    fn test_alap_has_no_slack() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(
            scheduled("A", 1.0, dt(1, 8), dt(1, 17), dt(3, 8), dt(3, 17))
                .with_constraint(Constraint::AsLateAsPossible),
        );
        let calc = MicrosoftSlackCalculator;
        assert_eq!(calc.total_slack(&project, a), Some(Duration::days(0.0)));
        assert!(calc.is_critical(&project, a));
    }

    #[test]
    fn test_free_slack_to_successor() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(scheduled("A", 1.0, dt(1, 8), dt(1, 17), dt(2, 8), dt(2, 17)));
        let b = project.add_activity(scheduled("B", 1.0, dt(3, 8), dt(3, 17), dt(3, 8), dt(3, 17)));
        project.add_relation(Relation::finish_start(a, b));

        let calc = MicrosoftSlackCalculator;
        assert_eq!(calc.free_slack(&project, a), Duration::days(1.0));
        assert_eq!(calc.free_slack(&project, b), Duration::days(0.0));
    }

    #[test]
    fn test_lag_uses_predecessor_calendar_conversion() {
        let mut project = Project::with_standard_calendar();
        let hour = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let morning = || vec![WorkingRange::new(hour(8), hour(12))];
        let mornings = WorkingCalendar::new(
            "Mornings",
            [morning(), morning(), morning(), morning(), morning(), Vec::new(), Vec::new()],
        )
        .with_conversion(TimeConversion {
            minutes_per_day: 240.0,
            minutes_per_week: 1200.0,
            days_per_month: 20.0,
        });
        let mornings = project.add_calendar(mornings);
        let a = project.add_activity(
            scheduled("A", 1.0, dt(1, 8), dt(1, 12), dt(1, 8), dt(1, 12)).with_calendar(mornings),
        );
        let b = project.add_activity(scheduled("B", 1.0, dt(3, 8), dt(3, 17), dt(3, 8), dt(3, 17)));
        project.add_relation(Relation::new(a, b, RelationType::FinishStart, Duration::hours(4.0)));

        // one four-hour morning between A and B, all of it taken by the lag
        let calc = MicrosoftSlackCalculator;
        assert_eq!(calc.free_slack(&project, a), Duration::days(0.0));
    }

    #[test]
    fn test_start_finish_free_slack_is_total_slack() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(scheduled("A", 1.0, dt(1, 8), dt(1, 17), dt(4, 8), dt(4, 17)));
        let b = project.add_activity(scheduled("B", 1.0, dt(1, 8), dt(1, 17), dt(1, 8), dt(1, 17)));
        project.add_relation(Relation::new(a, b, RelationType::StartFinish, Duration::days(0.0)));

        let calc = MicrosoftSlackCalculator;
        assert_eq!(calc.free_slack(&project, a), Duration::days(3.0));
    }

    #[test]
    fn test_finished_and_summary_have_zero_free_slack() {
        let mut project = Project::with_standard_calendar();
        let done = project.add_activity(
            scheduled("Done", 1.0, dt(1, 8), dt(1, 17), dt(3, 8), dt(3, 17))
                .with_progress(dt(1, 8), Duration::days(1.0))
                .with_actual_finish(dt(1, 17)),
        );
        let summary = project.add_activity(
            scheduled("Summary", 1.0, dt(1, 8), dt(1, 17), dt(3, 8), dt(3, 17)).as_summary(),
        );
        let calc = MicrosoftSlackCalculator;
        assert!(calc.free_slack(&project, done).is_zero());
        assert!(calc.free_slack(&project, summary).is_zero());
        assert!(!calc.is_critical(&project, done));
    }
}
