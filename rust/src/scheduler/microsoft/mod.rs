//! Microsoft-style forward/backward pass scheduler.
//!
//! Summary tasks are excluded from the passes. When they carry relations of
//! their own, those relations are expanded into virtual leaf-to-leaf
//! relations that live only for the duration of the run.

mod relations;
mod summary;

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

use crate::calendar::Calendar;
use crate::duration::{Duration, TimeUnit};
use crate::error::{CpmError, DurationField, Result};
use crate::models::{Activity, ActivityId, Constraint, Relation, ResourceAssignment, ScheduleDates, TaskType};
use crate::project::Project;
use crate::scheduler::{equivalent_previous_work_finish, work_assignments, Scheduler};
use crate::slack::{self, MicrosoftSlackCalculator};
use crate::sorting;
use crate::{log_changes, log_checks};

/// Microsoft-style scheduler. Holds only the order from the last run.
#[derive(Debug, Default)]
pub struct MicrosoftScheduler {
    verbosity: u8,
    sorted: Vec<ActivityId>,
}

impl MicrosoftScheduler {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            sorted: Vec::new(),
        }
    }
}

impl Scheduler for MicrosoftScheduler {
    fn schedule(&mut self, project: &mut Project, start: NaiveDateTime) -> Result<()> {
        self.sorted = sorting::sort(project, is_task)?;
        if self.sorted.is_empty() {
            log_changes!(self.verbosity, "No activities to schedule");
            return Ok(());
        }

        let mut run = Run::new(project, self.verbosity, start);
        run.validate(&self.sorted)?;
        let previous = run.computed_fields();
        run.clear_dates();

        log_changes!(self.verbosity, "Forward pass over {} activities from {}", self.sorted.len(), start);
        run.forward_pass(&self.sorted);

        if run.summary_tasks_have_logic() {
            run.build_summary_relations();
            let resorted = {
                let run = &run;
                sorting::sort_with(&*run.project, is_task, |id| run.successor_ids(id))
            };
            // summary logic can close a cycle the plain relations do not
            self.sorted = match resorted {
                Ok(sorted) => sorted,
                Err(err) => {
                    run.restore(previous);
                    return Err(err);
                }
            };
            log_changes!(self.verbosity, "Summary logic added, repeating forward pass");
            run.forward_pass(&self.sorted);
        }

        run.project_finish = run.max_early_finish(&self.sorted);
        log_changes!(self.verbosity, "Project finish {}", run.project_finish);

        run.backward_pass(&self.sorted);
        run.backward_pass_done = true;

        if self.sorted.iter().any(|&id| run.activity(id).is_alap()) {
            log_changes!(self.verbosity, "ALAP activities present, repeating forward pass");
            run.forward_pass(&self.sorted);
        }

        run.derive_start_finish(&self.sorted);
        for &id in &self.sorted {
            slack::refresh(&MicrosoftSlackCalculator, run.project, id);
        }
        run.rollup();
        run.project.set_finish_date(Some(run.project_finish));
        Ok(())
    }

    fn sorted_activities(&self) -> &[ActivityId] {
        &self.sorted
    }
}

/// Activities that take part in the passes: active, not null, and not a
/// summary unless it stands in for an external project.
fn is_task(activity: &Activity) -> bool {
    !(activity.summary && !activity.external) && activity.active && !activity.null
}

/// Which part of an activity's duration or work to move by.
#[derive(Clone, Copy, Debug)]
enum Portion {
    Total,
    Remaining,
    Actual,
}

/// An activity's computed fields, kept so a failed run can put them back.
struct ComputedFields {
    id: ActivityId,
    dates: ScheduleDates,
    critical: Option<bool>,
    total_slack: Option<Duration>,
}

/// State for one schedule run.
struct Run<'p> {
    project: &'p mut Project,
    verbosity: u8,
    project_start: NaiveDateTime,
    project_finish: NaiveDateTime,
    backward_pass_done: bool,
    calculated_late_start: FxHashMap<ActivityId, NaiveDateTime>,
    summary_predecessors: FxHashMap<ActivityId, Vec<Relation>>,
    summary_successors: FxHashMap<ActivityId, Vec<Relation>>,
}

impl<'p> Run<'p> {
    fn new(project: &'p mut Project, verbosity: u8, project_start: NaiveDateTime) -> Self {
        Self {
            project,
            verbosity,
            project_start,
            project_finish: project_start,
            backward_pass_done: false,
            calculated_late_start: FxHashMap::default(),
            summary_predecessors: FxHashMap::default(),
            summary_successors: FxHashMap::default(),
        }
    }

    fn activity(&self, id: ActivityId) -> &Activity {
        self.project.activity(id)
    }

    fn validate(&self, sorted: &[ActivityId]) -> Result<()> {
        for &id in sorted {
            let activity = self.activity(id);
            let has_work = |work: fn(&ResourceAssignment) -> bool| {
                self.qualifying_assignments(id).any(work)
            };
            let checks = [
                (activity.duration.is_none(), has_work(|a| a.work.is_some()), DurationField::Duration),
                (
                    activity.actual_duration.is_none(),
                    has_work(|a| a.actual_work.is_some()),
                    DurationField::ActualDuration,
                ),
                (
                    activity.remaining_duration.is_none(),
                    has_work(|a| a.remaining_work.is_some()),
                    DurationField::RemainingDuration,
                ),
            ];
            for (missing, from_work, field) in checks {
                let fixed_duration = activity.task_type == TaskType::FixedDuration;
                if missing && (fixed_duration || !from_work) {
                    return Err(CpmError::MissingDuration {
                        activity: activity.label(),
                        field,
                    });
                }
            }
        }
        Ok(())
    }

    fn clear_dates(&mut self) {
        for activity in self.project.activities_mut() {
            if activity.external || !activity.active || activity.is_manual() {
                continue;
            }
            activity.dates.clear();
            activity.critical = None;
            activity.total_slack = None;
        }
    }

    fn computed_fields(&self) -> Vec<ComputedFields> {
        self.project
            .activities()
            .map(|a| ComputedFields {
                id: a.id,
                dates: a.dates,
                critical: a.critical,
                total_slack: a.total_slack,
            })
            .collect()
    }

    fn restore(&mut self, previous: Vec<ComputedFields>) {
        log_changes!(self.verbosity, "Restoring dates of {} activities", previous.len());
        for fields in previous {
            let activity = self.project.activity_mut(fields.id);
            activity.dates = fields.dates;
            activity.critical = fields.critical;
            activity.total_slack = fields.total_slack;
        }
    }

    fn max_early_finish(&self, sorted: &[ActivityId]) -> NaiveDateTime {
        sorted
            .iter()
            .filter_map(|&id| self.activity(id).dates.early_finish)
            .max()
            .unwrap_or(self.project_start)
    }

    // Forward pass

    fn forward_pass(&mut self, sorted: &[ActivityId]) {
        for &id in sorted {
            self.forward_pass_activity(id);
        }
    }

    fn forward_pass_activity(&mut self, id: ActivityId) {
        let activity = self.activity(id);
        if activity.is_manual() {
            let (start, finish) = (activity.dates.start, activity.dates.finish);
            let dates = &mut self.project.activity_mut(id).dates;
            dates.early_start = start;
            dates.early_finish = finish;
            return;
        }
        if activity.external {
            return;
        }

        let mut early_finish = None;
        let early_start = match activity.actual_start {
            None => {
                let predecessors = self.predecessors(id);
                let mut early_start = if predecessors.is_empty() {
                    match activity.constraint {
                        Some(Constraint::StartNoEarlierThan(date)) => date,
                        Some(Constraint::FinishNoEarlierThan(date)) => {
                            early_finish = Some(date);
                            self.shift(id, date, Portion::Total, false)
                        }
                        _ => {
                            let start = self.project.effective_calendar(id).next_work_start(self.project_start);
                            self.add_leveling_delay(id, start)
                        }
                    }
                } else {
                    predecessors
                        .iter()
                        .filter_map(|r| self.early_start_for(r))
                        .max()
                        .unwrap_or(self.project_start)
                };

                early_start = self.next_work_start(id, early_start);

                match activity.constraint {
                    Some(Constraint::StartNoEarlierThan(date)) if early_start < date => early_start = date,
                    Some(Constraint::FinishNoLaterThan(date)) => {
                        let latest = self.shift(id, date, Portion::Total, false);
                        if early_start > latest {
                            early_start = latest;
                        }
                    }
                    Some(Constraint::FinishNoEarlierThan(date)) => {
                        let earliest = self.shift(id, date, Portion::Total, false);
                        if early_start < earliest {
                            early_start = earliest;
                        }
                    }
                    Some(Constraint::StartNoLaterThan(date)) if early_start > date => early_start = date,
                    Some(Constraint::MustStartOn(date)) | Some(Constraint::StartOn(date)) => early_start = date,
                    Some(Constraint::MustFinishOn(date)) | Some(Constraint::FinishOn(date)) => {
                        early_finish = Some(date);
                        early_start = self.shift(id, date, Portion::Total, false);
                    }
                    _ => {}
                }
                early_start
            }
            Some(actual_start) => {
                if activity.constraint.is_some() && activity.actual_finish.is_none() {
                    let mut finish = self.shift(id, actual_start, Portion::Total, true);
                    if let Some(Constraint::FinishNoEarlierThan(date)) = activity.constraint {
                        if finish < date {
                            finish = date;
                        }
                    }
                    early_finish = Some(finish);
                }
                actual_start
            }
        };

        let early_finish = early_finish
            .or(activity.actual_finish)
            .unwrap_or_else(|| self.shift(id, early_start, Portion::Total, true));

        log_checks!(
            self.verbosity,
            "{}: early start {} early finish {}",
            activity.name,
            early_start,
            early_finish
        );
        let dates = &mut self.project.activity_mut(id).dates;
        dates.early_start = Some(early_start);
        dates.early_finish = Some(early_finish);
    }

    fn add_leveling_delay(&self, id: ActivityId, date: NaiveDateTime) -> NaiveDateTime {
        match self.activity(id).leveling_delay {
            Some(delay) if !delay.is_zero() => {
                let delay = Duration::new(delay.value, delay.units.to_elapsed());
                let calendar = self.project.effective_calendar(id);
                calendar.add_duration(calendar.next_work_start(date), delay)
            }
            _ => date,
        }
    }

    // Backward pass

    fn backward_pass(&mut self, sorted: &[ActivityId]) {
        for &id in sorted.iter().rev() {
            self.backward_pass_activity(id);
        }
    }

    fn backward_pass_activity(&mut self, id: ActivityId) {
        let activity = self.activity(id);
        if activity.external {
            return;
        }

        let late_finish = match activity.actual_finish {
            None => {
                let successors = self.successors(id);
                let zero_milestone = activity.milestone && activity.duration_or_zero().is_zero();
                let mut late_finish = match activity.actual_start {
                    _ if successors.is_empty() => self.project_finish,
                    Some(start) if zero_milestone => start,
                    _ => successors
                        .iter()
                        .filter_map(|r| self.late_finish_for(r))
                        .min()
                        .unwrap_or(self.project_finish),
                };

                match activity.constraint {
                    Some(Constraint::MustStartOn(date)) => {
                        late_finish = self.shift(id, date, Portion::Total, true);
                    }
                    Some(Constraint::FinishOn(date)) | Some(Constraint::MustFinishOn(date)) => late_finish = date,
                    Some(Constraint::StartNoLaterThan(date)) => {
                        late_finish = late_finish.min(self.shift(id, date, Portion::Total, true));
                    }
                    Some(Constraint::FinishNoLaterThan(date)) => late_finish = late_finish.min(date),
                    _ => {}
                }
                match activity.secondary_constraint {
                    Some(Constraint::StartNoLaterThan(date)) => {
                        late_finish = late_finish.min(self.shift(id, date, Portion::Total, true));
                    }
                    Some(Constraint::FinishNoLaterThan(date)) => late_finish = late_finish.min(date),
                    _ => {}
                }
                if let Some(deadline) = activity.deadline {
                    late_finish = late_finish.min(deadline);
                }
                self.equivalent_previous_work_finish(id, late_finish)
            }
            Some(actual_finish) => actual_finish,
        };

        let (late_start, calculated) = if activity.is_manual() {
            let calculated = self.shift(id, late_finish, Portion::Total, false);
            match activity.actual_finish {
                None => (calculated, calculated),
                Some(_) => (activity.actual_start.unwrap_or(calculated), calculated),
            }
        } else {
            let calculated = self.shift(id, late_finish, Portion::Remaining, false);
            (activity.actual_start.unwrap_or(calculated), calculated)
        };

        log_checks!(
            self.verbosity,
            "{}: late start {} late finish {}",
            activity.name,
            late_start,
            late_finish
        );
        self.calculated_late_start.insert(id, calculated);
        let dates = &mut self.project.activity_mut(id).dates;
        dates.late_start = Some(late_start);
        dates.late_finish = Some(late_finish);
    }

    /// Start and finish from actual, early, or (for ALAP) late dates.
    fn derive_start_finish(&mut self, sorted: &[ActivityId]) {
        for &id in sorted {
            let activity = self.activity(id);
            if activity.external || activity.is_manual() {
                continue;
            }
            let dates = activity.dates;
            let (start, finish) = if activity.is_alap() {
                (dates.late_start, dates.late_finish)
            } else {
                (dates.early_start, dates.early_finish)
            };
            let start = activity.actual_start.or(start);
            let finish = activity.actual_finish.or(finish);

            let duration = match (start, finish) {
                (Some(s), Some(f)) if !self.use_task_calendar(id) => Some(
                    self.project
                        .effective_calendar(id)
                        .work_between(s, f, TimeUnit::Days),
                ),
                _ => None,
            };

            let activity = self.project.activity_mut(id);
            activity.dates.start = start;
            activity.dates.finish = finish;
            if duration.is_some() {
                activity.duration = duration;
            }
        }
    }

    // Neighbours

    fn predecessors(&self, id: ActivityId) -> Vec<Relation> {
        let mut relations: Vec<Relation> = self
            .project
            .predecessors(id)
            .filter(|r| is_task(self.activity(r.predecessor)))
            .copied()
            .collect();
        if let Some(virtual_relations) = self.summary_predecessors.get(&id) {
            relations.extend(virtual_relations.iter().copied());
        }
        relations
    }

    fn successors(&self, id: ActivityId) -> Vec<Relation> {
        let mut relations: Vec<Relation> = self
            .project
            .successors(id)
            .filter(|r| {
                let successor = self.activity(r.successor);
                is_task(successor) && successor.actual_finish.is_none()
            })
            .copied()
            .collect();
        if let Some(virtual_relations) = self.summary_successors.get(&id) {
            relations.extend(virtual_relations.iter().copied());
        }
        relations
    }

    /// Successor ids seen by the sorter, virtual relations included.
    fn successor_ids(&self, id: ActivityId) -> Vec<ActivityId> {
        let mut ids: Vec<ActivityId> = self.project.successors(id).map(|r| r.successor).collect();
        if let Some(virtual_relations) = self.summary_successors.get(&id) {
            ids.extend(virtual_relations.iter().map(|r| r.successor));
        }
        ids
    }

    // Date arithmetic through the task calendar or its resource assignments

    fn qualifying_assignments(&self, id: ActivityId) -> impl Iterator<Item = &ResourceAssignment> {
        work_assignments(self.project, id)
    }

    /// Whether dates come from the task calendar rather than assignment work.
    fn use_task_calendar(&self, id: ActivityId) -> bool {
        self.activity(id).task_type == TaskType::FixedDuration || self.qualifying_assignments(id).next().is_none()
    }

    /// Move `date` by a portion of the activity's duration, forwards or
    /// backwards. With work assignments the latest (forwards) or earliest
    /// (backwards) assignment date wins.
    fn shift(&self, id: ActivityId, date: NaiveDateTime, portion: Portion, forward: bool) -> NaiveDateTime {
        let activity = self.activity(id);
        let directed = |d: Duration| if forward { d } else { d.negate() };

        if self.use_task_calendar(id) {
            let duration = match portion {
                Portion::Total => activity.duration_or_zero(),
                Portion::Remaining => activity.remaining_or_zero(),
                Portion::Actual => activity.actual_or_zero(),
            };
            return self.project.effective_calendar(id).add_duration(date, directed(duration));
        }

        let dates = self.qualifying_assignments(id).map(|assignment| {
            let work = match portion {
                Portion::Total => assignment.work,
                Portion::Remaining => assignment.remaining_work,
                Portion::Actual => assignment.actual_work,
            }
            .unwrap_or_else(|| Duration::hours(0.0));
            let scaled = if assignment.units == 100.0 {
                work
            } else {
                Duration::new(work.value * 100.0 / assignment.units, work.units)
            };
            self.project
                .assignment_calendar(id, assignment)
                .add_duration(date, directed(scaled))
        });
        let result = if forward { dates.max() } else { dates.min() };
        result.unwrap_or(date)
    }

    fn next_work_start(&self, id: ActivityId, date: NaiveDateTime) -> NaiveDateTime {
        let milestone = self.activity(id).milestone;
        let adjust = |calendar: &dyn Calendar| {
            let next = calendar.next_work_start(date);
            if next > date && milestone && calendar.previous_work_finish(date) == date {
                date
            } else {
                next
            }
        };

        if self.use_task_calendar(id) {
            return adjust(self.project.effective_calendar(id));
        }
        self.qualifying_assignments(id)
            .map(|a| adjust(self.project.assignment_calendar(id, a)))
            .min()
            .unwrap_or(date)
    }

    fn equivalent_previous_work_finish(&self, id: ActivityId, date: NaiveDateTime) -> NaiveDateTime {
        if self.use_task_calendar(id) {
            return equivalent_previous_work_finish(self.project.effective_calendar(id), date);
        }
        self.qualifying_assignments(id)
            .map(|a| equivalent_previous_work_finish(self.project.assignment_calendar(id, a), date))
            .max()
            .unwrap_or(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RelationType, Resource, ResourceType, TaskMode};
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        // January 2024, the 1st is a Monday
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn task(name: &str, days: f64) -> Activity {
        Activity::new(name).with_duration(Duration::days(days))
    }

    fn run(project: &mut Project) -> MicrosoftScheduler {
        let mut scheduler = MicrosoftScheduler::new(0);
        scheduler.schedule(project, dt(1, 8)).unwrap();
        scheduler
    }

    #[test]
    fn test_finish_start_chain() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 2.0));
        let b = project.add_activity(task("B", 1.0));
        project.add_relation(Relation::finish_start(a, b));
        run(&mut project);

        let (a, b) = (project.activity(a), project.activity(b));
        assert_eq!(a.dates.early_finish, Some(dt(2, 17)));
        assert_eq!(b.dates.early_start, Some(dt(3, 8)));
        assert_eq!(b.dates.early_finish, Some(dt(3, 17)));
        assert_eq!(b.dates.late_finish, Some(dt(3, 17)));
        assert_eq!(a.dates.late_finish, Some(dt(2, 17)));
        assert_eq!(a.critical, Some(true));
        assert_eq!(project.finish_date(), Some(dt(3, 17)));
    }

    #[test]
    fn test_parallel_branch_has_slack() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 3.0));
        let b = project.add_activity(task("B", 1.0));
        let c = project.add_activity(task("C", 1.0));
        project.add_relation(Relation::finish_start(a, c));
        project.add_relation(Relation::finish_start(b, c));
        run(&mut project);

        let b = project.activity(b);
        assert_eq!(b.dates.early_start, Some(dt(1, 8)));
        assert_eq!(b.dates.late_start, Some(dt(3, 8)));
        assert_eq!(b.total_slack, Some(Duration::days(2.0)));
        assert_eq!(b.critical, Some(false));
    }

    #[test]
    fn test_start_start_with_lag() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 3.0));
        let b = project.add_activity(task("B", 1.0));
        project.add_relation(Relation::new(a, b, RelationType::StartStart, Duration::days(1.0)));
        run(&mut project);
        assert_eq!(project.activity(b).dates.early_start, Some(dt(2, 8)));
    }

    #[test]
    fn test_finish_finish_and_start_finish() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 3.0));
        let b = project.add_activity(task("B", 1.0));
        let c = project.add_activity(task("C", 1.0));
        project.add_relation(Relation::new(a, b, RelationType::FinishFinish, Duration::days(0.0)));
        project.add_relation(Relation::new(a, c, RelationType::StartFinish, Duration::days(2.0)));
        run(&mut project);

        // B finishes with A on Wednesday
        assert_eq!(project.activity(b).dates.early_finish, Some(dt(3, 17)));
        // C must finish two days after A starts
        assert_eq!(project.activity(c).dates.early_finish, Some(dt(2, 17)));
    }

    #[test]
    fn test_start_no_earlier_than() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 1.0).with_constraint(Constraint::StartNoEarlierThan(dt(4, 8))));
        run(&mut project);
        assert_eq!(project.activity(a).dates.early_start, Some(dt(4, 8)));
        assert_eq!(project.activity(a).dates.early_finish, Some(dt(4, 17)));
    }

    #[test]
    fn test_must_finish_on() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 2.0).with_constraint(Constraint::MustFinishOn(dt(5, 17))));
        run(&mut project);
        let a = project.activity(a);
        assert_eq!(a.dates.early_finish, Some(dt(5, 17)));
        assert_eq!(a.dates.early_start, Some(dt(4, 8)));
    }

    #[test]
    fn test_alap_uses_late_dates() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 3.0));
        let b = project.add_activity(task("B", 1.0).with_constraint(Constraint::AsLateAsPossible));
        let c = project.add_activity(task("C", 1.0));
        project.add_relation(Relation::finish_start(a, c));
        project.add_relation(Relation::finish_start(b, c));
        run(&mut project);

        let b = project.activity(b);
        assert_eq!(b.dates.start, Some(dt(3, 8)));
        assert_eq!(b.dates.finish, Some(dt(3, 17)));
        assert_eq!(b.dates.early_start, Some(dt(1, 8)));
    }

    #[test]
    fn test_in_progress_activity_keeps_actual_start() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(task("A", 2.0).with_progress(dt(2, 8), Duration::days(1.0)));
        let b = project.add_activity(task("B", 1.0));
        project.add_relation(Relation::finish_start(a, b));
        run(&mut project);

        let a = project.activity(a);
        assert_eq!(a.dates.early_start, Some(dt(2, 8)));
        assert_eq!(a.dates.early_finish, Some(dt(3, 17)));
        assert_eq!(a.dates.late_start, Some(dt(2, 8)));
        assert_eq!(a.dates.start, Some(dt(2, 8)));
    }

    #[test]
    fn test_manual_activity_keeps_its_dates() {
        let mut project = Project::with_standard_calendar();
        let mut manual = task("M", 1.0);
        manual.mode = TaskMode::ManuallyScheduled;
        manual.dates.start = Some(dt(2, 8));
        manual.dates.finish = Some(dt(2, 17));
        let m = project.add_activity(manual);
        let b = project.add_activity(task("B", 1.0));
        project.add_relation(Relation::finish_start(m, b));
        run(&mut project);

        assert_eq!(project.activity(m).dates.start, Some(dt(2, 8)));
        assert_eq!(project.activity(m).dates.early_finish, Some(dt(2, 17)));
        assert_eq!(project.activity(b).dates.early_start, Some(dt(3, 8)));
    }

    #[test]
    fn test_deadline_clamps_late_finish() {
        let mut project = Project::with_standard_calendar();
        project.add_activity(task("A", 3.0));
        let mut b = task("B", 1.0);
        b.deadline = Some(dt(2, 17));
        let b = project.add_activity(b);
        run(&mut project);
        assert_eq!(project.activity(b).dates.late_finish, Some(dt(2, 17)));
        assert_eq!(project.activity(b).dates.late_start, Some(dt(2, 8)));
    }

    #[test]
    fn test_assignment_work_drives_dates() {
        let mut project = Project::with_standard_calendar();
        let worker = project.add_resource(Resource::new("Worker", ResourceType::Work));
        let a = project.add_activity(
            task("A", 1.0).with_assignment(ResourceAssignment::new(worker, 50.0, Duration::hours(8.0))),
        );
        run(&mut project);

        let a = project.activity(a);
        // 8 hours at 50% takes two working days
        assert_eq!(a.dates.early_finish, Some(dt(2, 17)));
        assert_eq!(a.duration, Some(Duration::days(2.0)));
    }

    #[test]
    fn test_missing_duration_is_rejected() {
        let mut project = Project::with_standard_calendar();
        project.add_activity(Activity::new("A"));
        let err = MicrosoftScheduler::new(0).schedule(&mut project, dt(1, 8)).unwrap_err();
        assert!(matches!(
            err,
            CpmError::MissingDuration {
                field: DurationField::Duration,
                ..
            }
        ));
    }

    #[test]
    fn test_summary_logic_cycle_leaves_dates_alone() {
        let mut project = Project::with_standard_calendar();
        let summary = project.add_activity(Activity::new("S").as_summary());
        let child = project.add_activity(task("C", 1.0).with_parent(summary));
        let other = project.add_activity(task("X", 1.0));
        project.add_relation(Relation::finish_start(child, other));
        run(&mut project);
        let before: Vec<_> = project.activities().map(|x| (x.dates, x.critical, x.total_slack)).collect();

        // X -> S binds to C, closing C -> X -> C
        project.add_relation(Relation::finish_start(other, summary));
        let err = MicrosoftScheduler::new(0).schedule(&mut project, dt(2, 8)).unwrap_err();
        assert!(matches!(err, CpmError::CircularDependency { .. }));
        let after: Vec<_> = project.activities().map(|x| (x.dates, x.critical, x.total_slack)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_leveling_delay_is_elapsed() {
        let mut project = Project::with_standard_calendar();
        let mut a = task("A", 1.0);
        a.leveling_delay = Some(Duration::days(1.0));
        let a = project.add_activity(a);
        run(&mut project);
        // One elapsed day from Monday 08:00
        assert_eq!(project.activity(a).dates.early_start, Some(dt(2, 8)));
    }
}
