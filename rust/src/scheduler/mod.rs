//! Critical path schedulers.
//!
//! Two engines reproduce the date rules of the Microsoft-style and
//! Primavera-style tools. Both follow the same outline: sort, validate,
//! clear computed dates, forward pass, project finish, backward pass,
//! engine-specific follow-up passes, and finally the hierarchy rollup.

mod microsoft;
mod primavera;

pub use microsoft::MicrosoftScheduler;
pub use primavera::PrimaveraScheduler;

use chrono::NaiveDateTime;
use rustc_hash::FxHashSet;

use crate::calendar::Calendar;
use crate::config::{Engine, SchedulerConfig};
use crate::duration::{Duration, TimeUnit};
use crate::error::Result;
use crate::models::{Activity, ActivityId, ResourceAssignment, ResourceType};
use crate::project::Project;

/// A forward/backward pass scheduler.
pub trait Scheduler {
    /// Recompute every computed date in `project`, starting no earlier than `start`.
    fn schedule(&mut self, project: &mut Project, start: NaiveDateTime) -> Result<()>;

    /// Topological order used by the last run.
    fn sorted_activities(&self) -> &[ActivityId];
}

/// Entry point selecting an engine from [`SchedulerConfig`].
#[derive(Debug)]
pub struct CpmScheduler {
    engine: Box<dyn EngineScheduler>,
}

/// Object-safe bound for the engines held by [`CpmScheduler`].
trait EngineScheduler: Scheduler + std::fmt::Debug {}
impl<T: Scheduler + std::fmt::Debug> EngineScheduler for T {}

impl CpmScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        let engine: Box<dyn EngineScheduler> = match config.engine {
            Engine::Microsoft => Box::new(MicrosoftScheduler::new(config.verbosity)),
            Engine::Primavera => Box::new(PrimaveraScheduler::new(config.verbosity)),
        };
        Self { engine }
    }
}

impl Scheduler for CpmScheduler {
    fn schedule(&mut self, project: &mut Project, start: NaiveDateTime) -> Result<()> {
        self.engine.schedule(project, start)
    }

    fn sorted_activities(&self) -> &[ActivityId] {
        self.engine.sorted_activities()
    }
}

/// Schedule `project` once with the engine named in `config`.
pub fn schedule(project: &mut Project, start: NaiveDateTime, config: &SchedulerConfig) -> Result<()> {
    CpmScheduler::new(config).schedule(project, start)
}

/// Sign of a relation's lag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LagSign {
    Zero,
    Positive,
    Negative,
}

impl LagSign {
    pub(crate) fn of(lag: Duration) -> Self {
        if lag.value > 0.0 {
            LagSign::Positive
        } else if lag.value < 0.0 {
            LagSign::Negative
        } else {
            LagSign::Zero
        }
    }
}

/// The previous work finish when no working time separates it from `date`,
/// otherwise `date` itself.
pub(crate) fn equivalent_previous_work_finish(calendar: &dyn Calendar, date: NaiveDateTime) -> NaiveDateTime {
    let previous = calendar.previous_work_finish(date);
    if calendar.work_between(previous, date, TimeUnit::Hours).is_zero() {
        previous
    } else {
        date
    }
}

/// The next work start when no working time separates it from `date`,
/// otherwise `date` itself.
pub(crate) fn equivalent_next_work_start(calendar: &dyn Calendar, date: NaiveDateTime) -> NaiveDateTime {
    let next = calendar.next_work_start(date);
    if calendar.work_between(date, next, TimeUnit::Minutes).is_zero() {
        next
    } else {
        date
    }
}

/// Every activity beneath `roots`, children before parents.
///
/// Each node is visited once, so a malformed parent/child cycle ends the
/// walk instead of looping.
pub(crate) fn post_order(project: &Project, roots: &[ActivityId]) -> Vec<ActivityId> {
    let mut visited: FxHashSet<ActivityId> = FxHashSet::default();
    let mut order = Vec::new();
    let mut stack: Vec<(ActivityId, bool)> = roots.iter().rev().map(|&id| (id, false)).collect();

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        if !visited.insert(id) {
            continue;
        }
        stack.push((id, true));
        for &child in project.activity(id).children().iter().rev() {
            if !visited.contains(&child) {
                stack.push((child, false));
            }
        }
    }
    order
}

/// Leaf activities beneath `id`, recursing through summary children.
pub(crate) fn leaf_descendants<F>(project: &Project, id: ActivityId, accept: F) -> Vec<ActivityId>
where
    F: Fn(&Activity) -> bool,
{
    let mut visited: FxHashSet<ActivityId> = FxHashSet::default();
    let mut leaves = Vec::new();
    let mut stack: Vec<ActivityId> = project.activity(id).children().iter().rev().copied().collect();

    while let Some(child) = stack.pop() {
        if !visited.insert(child) {
            continue;
        }
        let activity = project.activity(child);
        if activity.summary {
            stack.extend(activity.children().iter().rev().copied());
        } else if accept(activity) {
            leaves.push(child);
        }
    }
    leaves
}

/// Assignments whose work drives dates: a work resource at non-zero units.
pub(crate) fn work_assignments(project: &Project, id: ActivityId) -> impl Iterator<Item = &ResourceAssignment> {
    project.activity(id).assignments.iter().filter(move |a| {
        a.units > 0.0
            && a
                .resource
                .is_some_and(|r| project.resource(r).kind == ResourceType::Work)
    })
}

/// Minimum and maximum of optional dates, ignoring missing values.
pub(crate) fn earliest(current: Option<NaiveDateTime>, candidate: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

pub(crate) fn latest(current: Option<NaiveDateTime>, candidate: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
