//! Primavera-style forward/backward pass scheduler.
//!
//! Progress is measured against the project's data date. Level-of-effort
//! activities are fitted around their neighbours once the main passes are
//! done, and WBS summary activities mirror the unfinished work beneath
//! their parent.

mod arithmetic;
mod level_of_effort;
mod relations;
mod rollup;

use chrono::{NaiveDateTime, NaiveTime};

use crate::calendar::WorkingCalendar;
use crate::error::{CpmError, DurationField, Result, WorkField};
use crate::models::{Activity, ActivityId, ActivityType, Constraint, Progress, Relation, ResourceAssignment, ResourceType};
use crate::project::Project;
use crate::scheduler::{equivalent_previous_work_finish, work_assignments, Scheduler};
use crate::slack::{self, PrimaveraSlackCalculator};
use crate::sorting;
use crate::{log_changes, log_checks};

use arithmetic::{date_from_work, Portion};

/// Primavera-style scheduler. Holds only the order from the last run.
#[derive(Debug, Default)]
pub struct PrimaveraScheduler {
    verbosity: u8,
    sorted: Vec<ActivityId>,
}

impl PrimaveraScheduler {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            sorted: Vec::new(),
        }
    }
}

impl Scheduler for PrimaveraScheduler {
    fn schedule(&mut self, project: &mut Project, start: NaiveDateTime) -> Result<()> {
        self.sorted = sorting::sort(project, is_activity)?;
        let level_of_effort = sorting::sort(project, |a| a.is_type(ActivityType::LevelOfEffort))?;
        if self.sorted.is_empty() {
            log_changes!(self.verbosity, "No activities to schedule");
            return Ok(());
        }

        let data_date = project.properties.status_date.unwrap_or(start);
        let mut run = Run::new(project, self.verbosity, start, data_date);
        run.validate(&self.sorted)?;
        run.clear_dates();

        log_changes!(
            self.verbosity,
            "Forward pass over {} activities from {}, data date {}",
            self.sorted.len(),
            run.project_start,
            run.data_date
        );
        for &id in &self.sorted {
            run.forward_pass_activity(id);
        }

        run.project_finish = run.project_finish(&self.sorted);
        log_changes!(self.verbosity, "Project finish {}", run.project_finish);

        for &id in self.sorted.iter().rev() {
            run.backward_pass_activity(id);
        }

        for &id in &self.sorted {
            run.update_dates(id);
            slack::refresh(&PrimaveraSlackCalculator, run.project, id);
        }

        if !level_of_effort.is_empty() {
            log_changes!(self.verbosity, "Fitting {} level of effort activities", level_of_effort.len());
        }
        for &id in &level_of_effort {
            run.level_of_effort(id);
            slack::refresh(&PrimaveraSlackCalculator, run.project, id);
        }

        run.rollup();
        run.wbs_summaries();
        run.project.set_finish_date(Some(run.project_finish));
        Ok(())
    }

    fn sorted_activities(&self) -> &[ActivityId] {
        &self.sorted
    }
}

/// Activities that take part in the main passes. Summaries, level of effort
/// and WBS summary activities get their dates afterwards.
fn is_activity(activity: &Activity) -> bool {
    !(activity.summary
        || activity.is_type(ActivityType::LevelOfEffort)
        || activity.is_type(ActivityType::WbsSummary))
}

/// State for one schedule run.
struct Run<'p> {
    project: &'p mut Project,
    verbosity: u8,
    data_date: NaiveDateTime,
    project_start: NaiveDateTime,
    project_finish: NaiveDateTime,
    twenty_four_hour: WorkingCalendar,
}

impl<'p> Run<'p> {
    /// Work cannot be scheduled before the data date.
    fn new(project: &'p mut Project, verbosity: u8, start: NaiveDateTime, data_date: NaiveDateTime) -> Self {
        let project_start = start.max(data_date);
        Self {
            project,
            verbosity,
            data_date,
            project_start,
            project_finish: project_start,
            twenty_four_hour: WorkingCalendar::twenty_four_hour(),
        }
    }

    fn activity(&self, id: ActivityId) -> &Activity {
        self.project.activity(id)
    }

    fn validate(&self, sorted: &[ActivityId]) -> Result<()> {
        for &id in sorted {
            let activity = self.activity(id);
            if activity.activity_type.is_none() {
                return Err(CpmError::MissingActivityType {
                    activity: activity.label(),
                });
            }

            let missing_work = |field: WorkField, work: fn(&ResourceAssignment) -> bool| {
                if work_assignments(self.project, id).all(work) {
                    Ok(())
                } else {
                    Err(CpmError::MissingWork {
                        activity: activity.label(),
                        field,
                    })
                }
            };
            let missing_duration = |field: DurationField, present: bool| {
                if present {
                    Ok(())
                } else {
                    Err(CpmError::MissingDuration {
                        activity: activity.label(),
                        field,
                    })
                }
            };

            if activity.is_type(ActivityType::ResourceDependent) && work_assignments(self.project, id).next().is_some() {
                missing_work(WorkField::Work, |a| a.work.is_some())?;
                missing_work(WorkField::RemainingWork, |a| a.remaining_work.is_some())?;
            } else {
                missing_duration(DurationField::Duration, activity.duration.is_some())?;
                missing_duration(DurationField::RemainingDuration, activity.remaining_duration.is_some())?;
            }
        }
        Ok(())
    }

    fn clear_dates(&mut self) {
        for activity in self.project.activities_mut() {
            activity.dates.clear();
            activity.critical = None;
            activity.total_slack = None;
        }
    }

    /// Latest early finish, pushed out to the must-finish-by date when that is later.
    fn project_finish(&self, sorted: &[ActivityId]) -> NaiveDateTime {
        let finish = sorted
            .iter()
            .filter_map(|&id| self.activity(id).dates.early_finish)
            .max()
            .unwrap_or(self.project_start);
        match self.project.properties.must_finish_by {
            Some(must_finish_by) if must_finish_by > finish => must_finish_by,
            _ => finish,
        }
    }

    fn predecessors(&self, id: ActivityId) -> Vec<Relation> {
        self.project
            .predecessors(id)
            .filter(|r| is_activity(self.activity(r.predecessor)))
            .copied()
            .collect()
    }

    fn successors(&self, id: ActivityId) -> Vec<Relation> {
        self.project
            .successors(id)
            .filter(|r| is_activity(self.activity(r.successor)))
            .copied()
            .collect()
    }

    // Forward pass

    fn forward_pass_activity(&mut self, id: ActivityId) {
        let predecessors = self.predecessors(id);
        let from_predecessors = predecessors.iter().filter_map(|r| self.early_start_for(r)).max();
        let activity = self.activity(id);

        let mut early_finish = None;
        let mut early_start = match activity.progress() {
            Progress::NotStarted => {
                let mut early_start = match from_predecessors {
                    Some(date) => date,
                    None => match activity.constraint {
                        Some(Constraint::StartNoEarlierThan(date)) => date.max(self.data_date),
                        Some(Constraint::FinishNoEarlierThan(date)) => {
                            early_finish = Some(date);
                            self.shift(id, date, Portion::Total, false)
                        }
                        _ => self.project_start,
                    },
                };

                match activity.constraint {
                    Some(Constraint::StartNoEarlierThan(date))
                        if early_start < date || early_start.date() == date.date() =>
                    {
                        early_start = early_start.max(self.start_no_earlier_than(id, early_start, date));
                    }
                    Some(Constraint::FinishNoEarlierThan(date)) => {
                        early_start = early_start.max(self.shift(id, date, Portion::Total, false));
                    }
                    Some(Constraint::MustStartOn(date)) => early_start = date,
                    Some(Constraint::StartOn(date)) if early_start < date => {
                        early_start = self.next_work_start(id, date);
                    }
                    Some(Constraint::MustFinishOn(date)) => {
                        early_finish = Some(date);
                        early_start = self.shift(id, date, Portion::Total, false);
                    }
                    Some(Constraint::FinishOn(date)) => {
                        let start_on = self.shift(id, date, Portion::Total, false);
                        if start_on > early_start {
                            early_finish = Some(date);
                            early_start = start_on;
                        }
                    }
                    _ => {}
                }

                if !activity.is_type(ActivityType::FinishMilestone) {
                    early_start = self.next_work_start(id, early_start);
                }
                early_start
            }

            Progress::InProgress => match from_predecessors {
                Some(date) => {
                    let early_start = self.next_work_start(id, date);
                    early_finish = Some(self.shift(id, early_start, Portion::Remaining, true));
                    early_start
                }
                None if !self.has_actual_duration(id) => {
                    let early_start = self.next_work_start(id, self.data_date);
                    early_finish = Some(self.shift(id, early_start, Portion::Total, true));
                    early_start
                }
                None if self.has_remaining_duration(id) => {
                    let actual_start = activity.actual_start.unwrap_or(self.data_date);
                    let finish = self.shift(id, actual_start, Portion::Total, true);
                    early_finish = Some(finish);
                    self.shift(id, finish, Portion::Remaining, false)
                }
                None => {
                    let early_start = self.next_work_start(id, self.data_date);
                    early_finish = Some(early_start);
                    early_start
                }
            },

            Progress::Finished => match from_predecessors {
                Some(date) => {
                    early_finish = Some(self.shift(id, date, Portion::Remaining, true));
                    date
                }
                None => {
                    early_finish = Some(self.data_date);
                    self.data_date
                }
            },
        };

        if let Some(external) = activity.external_early_start {
            if external > early_start {
                early_start = external;
                early_finish = None;
            }
        }

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
        self.set_remaining_early_dates(id);
    }

    /// A midnight constraint date takes the time of day of the calculated
    /// start when that time is still a working time on the constraint day.
    fn start_no_earlier_than(&self, id: ActivityId, early_start: NaiveDateTime, date: NaiveDateTime) -> NaiveDateTime {
        if date.time() == NaiveTime::MIN && early_start.time() != NaiveTime::MIN {
            let adjusted = date.date().and_time(early_start.time());
            if self.next_work_start(id, adjusted).date() == adjusted.date() {
                return adjusted;
            }
        }
        date
    }

    fn set_remaining_early_dates(&mut self, id: ActivityId) {
        let activity = self.activity(id);
        if activity.actual_finish.is_some() {
            return;
        }
        let Some(start) = activity.dates.early_start else {
            panic!("{}: early start missing after forward pass", activity.label());
        };
        let finish = self.shift(id, start, Portion::Remaining, true);
        let dates = &mut self.project.activity_mut(id).dates;
        dates.remaining_early_start = Some(start);
        dates.remaining_early_finish = Some(finish);
    }

    // Backward pass

    fn backward_pass_activity(&mut self, id: ActivityId) {
        let successors = self.successors(id);
        let from_successors = successors.iter().filter_map(|r| self.late_finish_for(r)).min();
        let activity = self.activity(id);
        let must_finish_by = self.project.properties.must_finish_by;

        let mut late_finish = if activity.actual_finish.is_none() {
            let mut late_finish = from_successors.unwrap_or_else(|| {
                activity
                    .external_late_finish
                    .or(must_finish_by)
                    .unwrap_or(self.project_finish)
            });
            let not_started = activity.actual_start.is_none();

            match activity.constraint {
                Some(Constraint::StartOn(date)) if not_started => {
                    late_finish = late_finish.min(self.shift(id, date, Portion::Total, true));
                }
                Some(Constraint::MustStartOn(date)) if not_started => {
                    late_finish = self.shift(id, date, Portion::Total, true);
                }
                Some(Constraint::MustFinishOn(date)) => late_finish = date,
                Some(Constraint::StartNoLaterThan(date)) => {
                    late_finish = late_finish.min(self.shift(id, date, Portion::Total, true));
                }
                Some(Constraint::FinishOn(date)) | Some(Constraint::FinishNoLaterThan(date)) => {
                    late_finish = late_finish.min(date);
                }
                _ => {}
            }
            match activity.secondary_constraint {
                Some(Constraint::StartNoLaterThan(date)) => {
                    late_finish = late_finish.min(self.shift(id, date, Portion::Total, true));
                }
                Some(Constraint::FinishNoLaterThan(date)) => late_finish = late_finish.min(date),
                _ => {}
            }
            self.equivalent_previous_work_finish(id, late_finish)
        } else {
            from_successors.unwrap_or_else(|| must_finish_by.unwrap_or(self.project_finish))
        };

        if let Some(external) = activity.external_late_finish {
            if external < late_finish {
                late_finish = external;
            }
        }

        let mut late_start = self.shift(id, late_finish, Portion::Remaining, false);
        if activity.is_type(ActivityType::StartMilestone)
            || (!activity.is_type(ActivityType::FinishMilestone) && self.has_remaining_duration(id))
        {
            late_start = self.next_work_start(id, late_start);
        }

        log_checks!(
            self.verbosity,
            "{}: late start {} late finish {}",
            activity.name,
            late_start,
            late_finish
        );
        let alap = activity.is_alap();
        let finished = activity.actual_finish.is_some();
        let dates = &mut self.project.activity_mut(id).dates;
        dates.late_start = Some(late_start);
        dates.late_finish = Some(late_finish);
        if !finished {
            dates.remaining_late_start = Some(late_start);
            dates.remaining_late_finish = Some(late_finish);
        }

        if alap {
            self.alap_adjust(id);
        }
    }

    /// Pull an ALAP activity's early dates as late as its successors allow,
    /// never earlier than the forward pass placed it.
    fn alap_adjust(&mut self, id: ActivityId) {
        let successors = self.successors(id);
        let latest = successors.iter().filter_map(|r| self.alap_early_start(r)).min();
        let forward_start = self.activity(id).dates.early_start;

        let (early_start, early_finish) = match latest {
            Some(date) => {
                let start = forward_start.map_or(date, |forward| date.max(forward));
                (start, self.shift(id, start, Portion::Remaining, true))
            }
            None => {
                let finish = self.project_finish;
                (self.shift(id, finish, Portion::Remaining, false), finish)
            }
        };

        log_checks!(
            self.verbosity,
            "{}: as late as possible, early start {}",
            self.activity(id).name,
            early_start
        );
        let dates = &mut self.project.activity_mut(id).dates;
        dates.early_start = Some(early_start);
        dates.early_finish = Some(early_finish);
        self.set_remaining_early_dates(id);
    }

    // Start, finish, planned and assignment dates

    fn update_dates(&mut self, id: ActivityId) {
        let activity = self.activity(id);
        let start = activity.actual_start.or(activity.dates.early_start);
        let finish = activity.actual_finish.or(activity.dates.early_finish);
        let not_started = activity.actual_start.is_none();

        let activity = self.project.activity_mut(id);
        activity.dates.start = start;
        activity.dates.finish = finish;
        if not_started {
            activity.planned_start = start;
            activity.planned_finish = finish;
        }
        self.update_assignment_dates(id);
    }

    fn update_assignment_dates(&mut self, id: ActivityId) {
        for index in 0..self.activity(id).assignments.len() {
            let mut assignment = self.activity(id).assignments[index].clone();
            self.update_assignment(id, &mut assignment);
            self.project.activity_mut(id).assignments[index] = assignment;
        }
    }

    fn update_assignment(&self, id: ActivityId, assignment: &mut ResourceAssignment) {
        let activity = self.activity(id);
        if activity.actual_finish.is_some() {
            let dates = &mut assignment.dates;
            dates.remaining_early_start = None;
            dates.remaining_early_finish = None;
            dates.remaining_late_start = None;
            dates.remaining_late_finish = None;
            return;
        }

        let not_started = activity.actual_start.is_none();
        let remaining_early_start = match (not_started, assignment.planned_start, activity.dates.remaining_early_start) {
            (true, Some(planned), Some(early)) if planned > early => Some(planned),
            (_, _, early) => early,
        };
        let remaining_late_finish = activity.dates.remaining_late_finish;

        let follows_activity = activity.is_type(ActivityType::LevelOfEffort)
            || assignment
                .resource
                .is_some_and(|r| self.project.resource(r).kind == ResourceType::Material);
        let remaining_work = assignment.remaining_work.filter(|w| !w.is_zero());

        let (remaining_early_finish, remaining_late_start) = match remaining_work {
            _ if follows_activity => (
                activity.dates.remaining_early_finish,
                activity.dates.remaining_late_start,
            ),
            None if assignment.actual_finish.is_none() => (
                activity.dates.remaining_early_finish,
                activity.dates.remaining_late_start,
            ),
            None => (remaining_early_start, remaining_late_finish),
            Some(work) => {
                let calendar = self.assignment_work_calendar(id, assignment);
                let units = assignment.effective_remaining_units();
                let finish = remaining_early_start.map(|start| {
                    equivalent_previous_work_finish(calendar, date_from_work(calendar, units, start, work))
                });
                let start = remaining_late_finish
                    .map(|finish| date_from_work(calendar, assignment.units, finish, work.negate()));
                (finish, start)
            }
        };

        if not_started {
            let moved = match (assignment.planned_start, remaining_early_start) {
                (None, _) => true,
                (Some(planned), Some(early)) => early > planned,
                (Some(_), None) => false,
            };
            if moved {
                assignment.planned_start = remaining_early_start;
                assignment.planned_finish = remaining_early_finish;
            }
        }

        let dates = &mut assignment.dates;
        dates.remaining_early_start = remaining_early_start;
        dates.remaining_early_finish = remaining_early_finish;
        dates.remaining_late_start = remaining_late_start;
        dates.remaining_late_finish = remaining_late_finish;
        dates.start = assignment.actual_start.or(remaining_early_start);
        dates.finish = assignment.actual_finish.or(remaining_early_finish);
    }
}
