//! Core data types for the activity network.

use chrono::NaiveDateTime;
use std::fmt;

use crate::duration::{Duration, TimeUnit};

/// Index of an activity within its [`Project`](crate::project::Project).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(pub u32);

/// Index of a calendar within its project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CalendarId(pub u32);

/// Index of a resource within its project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u32);

impl ActivityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dependency type between two activities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationType {
    FinishStart,
    StartStart,
    FinishFinish,
    StartFinish,
}

/// A precedence relation. Virtual relations built during scheduling are
/// plain copies and never stored in the project.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Relation {
    pub predecessor: ActivityId,
    pub successor: ActivityId,
    pub kind: RelationType,
    pub lag: Duration,
}

impl Relation {
    pub fn new(predecessor: ActivityId, successor: ActivityId, kind: RelationType, lag: Duration) -> Self {
        Self {
            predecessor,
            successor,
            kind,
            lag,
        }
    }

    /// Finish-start relation with no lag.
    pub fn finish_start(predecessor: ActivityId, successor: ActivityId) -> Self {
        Self::new(predecessor, successor, RelationType::FinishStart, Duration::zero(TimeUnit::Days))
    }

    /// Same relation kind and lag between a different pair of activities.
    pub fn rebind(&self, predecessor: ActivityId, successor: ActivityId) -> Self {
        Self {
            predecessor,
            successor,
            ..*self
        }
    }
}

/// Scheduling constraint. Dated kinds carry their date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    AsSoonAsPossible,
    AsLateAsPossible,
    StartNoEarlierThan(NaiveDateTime),
    StartNoLaterThan(NaiveDateTime),
    FinishNoEarlierThan(NaiveDateTime),
    FinishNoLaterThan(NaiveDateTime),
    MustStartOn(NaiveDateTime),
    MustFinishOn(NaiveDateTime),
    StartOn(NaiveDateTime),
    FinishOn(NaiveDateTime),
}

/// Primavera activity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityType {
    TaskDependent,
    ResourceDependent,
    StartMilestone,
    FinishMilestone,
    LevelOfEffort,
    WbsSummary,
}

/// Microsoft task type. Only fixed duration changes scheduling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TaskType {
    #[default]
    FixedUnits,
    FixedDuration,
    FixedWork,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TaskMode {
    #[default]
    AutoScheduled,
    ManuallyScheduled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PercentCompleteType {
    #[default]
    Duration,
    Physical,
    Units,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResourceType {
    #[default]
    Work,
    Material,
    Cost,
}

/// Progress of an activity relative to its actual dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    NotStarted,
    InProgress,
    Finished,
}

/// Computed dates. Cleared and rebuilt on every schedule run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleDates {
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    pub early_start: Option<NaiveDateTime>,
    pub early_finish: Option<NaiveDateTime>,
    pub late_start: Option<NaiveDateTime>,
    pub late_finish: Option<NaiveDateTime>,
    pub remaining_early_start: Option<NaiveDateTime>,
    pub remaining_early_finish: Option<NaiveDateTime>,
    pub remaining_late_start: Option<NaiveDateTime>,
    pub remaining_late_finish: Option<NaiveDateTime>,
}

impl ScheduleDates {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Computed dates for a resource assignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssignmentDates {
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    pub remaining_early_start: Option<NaiveDateTime>,
    pub remaining_early_finish: Option<NaiveDateTime>,
    pub remaining_late_start: Option<NaiveDateTime>,
    pub remaining_late_finish: Option<NaiveDateTime>,
}

#[derive(Clone, Debug)]
pub struct Resource {
    pub name: String,
    pub kind: ResourceType,
    pub calendar: Option<CalendarId>,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: ResourceType) -> Self {
        Self {
            name: name.into(),
            kind,
            calendar: None,
        }
    }

    pub fn with_calendar(mut self, calendar: CalendarId) -> Self {
        self.calendar = Some(calendar);
        self
    }
}

/// Work of one resource on one activity.
#[derive(Clone, Debug)]
pub struct ResourceAssignment {
    pub resource: Option<ResourceId>,
    /// Percentage allocation. Zero units take no part in scheduling.
    pub units: f64,
    pub remaining_units: Option<f64>,
    pub work: Option<Duration>,
    pub actual_work: Option<Duration>,
    pub remaining_work: Option<Duration>,
    pub calendar: Option<CalendarId>,
    pub actual_start: Option<NaiveDateTime>,
    pub actual_finish: Option<NaiveDateTime>,
    pub planned_start: Option<NaiveDateTime>,
    pub planned_finish: Option<NaiveDateTime>,
    pub dates: AssignmentDates,
}

impl ResourceAssignment {
    /// Assignment at `units` percent with all of `work` remaining.
    pub fn new(resource: ResourceId, units: f64, work: Duration) -> Self {
        Self {
            resource: Some(resource),
            units,
            remaining_units: None,
            work: Some(work),
            actual_work: Some(Duration::zero(work.units)),
            remaining_work: Some(work),
            calendar: None,
            actual_start: None,
            actual_finish: None,
            planned_start: None,
            planned_finish: None,
            dates: AssignmentDates::default(),
        }
    }

    pub fn effective_remaining_units(&self) -> f64 {
        self.remaining_units.unwrap_or(self.units)
    }
}

/// A node in the activity network.
#[derive(Clone, Debug)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub active: bool,
    pub null: bool,
    pub summary: bool,
    pub external: bool,
    pub milestone: bool,
    pub mode: TaskMode,
    pub task_type: TaskType,
    pub activity_type: Option<ActivityType>,

    pub duration: Option<Duration>,
    pub actual_duration: Option<Duration>,
    pub remaining_duration: Option<Duration>,
    pub planned_duration: Option<Duration>,

    pub constraint: Option<Constraint>,
    pub secondary_constraint: Option<Constraint>,
    pub deadline: Option<NaiveDateTime>,
    pub calendar: Option<CalendarId>,
    pub leveling_delay: Option<Duration>,
    pub percent_complete: Option<f64>,
    pub percent_complete_type: Option<PercentCompleteType>,

    pub actual_start: Option<NaiveDateTime>,
    pub actual_finish: Option<NaiveDateTime>,
    pub planned_start: Option<NaiveDateTime>,
    pub planned_finish: Option<NaiveDateTime>,
    pub baseline_start: Option<NaiveDateTime>,
    pub baseline_finish: Option<NaiveDateTime>,
    /// Dates imposed by activities in other projects.
    pub external_early_start: Option<NaiveDateTime>,
    pub external_late_finish: Option<NaiveDateTime>,

    pub assignments: Vec<ResourceAssignment>,
    pub dates: ScheduleDates,
    pub critical: Option<bool>,
    pub total_slack: Option<Duration>,

    pub(crate) parent: Option<ActivityId>,
    pub(crate) children: Vec<ActivityId>,
}

impl Activity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActivityId(0),
            name: name.into(),
            active: true,
            null: false,
            summary: false,
            external: false,
            milestone: false,
            mode: TaskMode::AutoScheduled,
            task_type: TaskType::FixedUnits,
            activity_type: Some(ActivityType::TaskDependent),
            duration: None,
            actual_duration: None,
            remaining_duration: None,
            planned_duration: None,
            constraint: None,
            secondary_constraint: None,
            deadline: None,
            calendar: None,
            leveling_delay: None,
            percent_complete: None,
            percent_complete_type: None,
            actual_start: None,
            actual_finish: None,
            planned_start: None,
            planned_finish: None,
            baseline_start: None,
            baseline_finish: None,
            external_early_start: None,
            external_late_finish: None,
            assignments: Vec::new(),
            dates: ScheduleDates::default(),
            critical: None,
            total_slack: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set duration and remaining duration to `duration`, with no actual work.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self.remaining_duration = Some(duration);
        self.actual_duration = Some(Duration::zero(duration.units));
        self
    }

    /// Record progress: the actual portion is taken out of the remaining duration.
    pub fn with_progress(mut self, actual_start: NaiveDateTime, actual: Duration) -> Self {
        self.actual_start = Some(actual_start);
        self.actual_duration = Some(actual);
        if let Some(duration) = self.duration {
            self.remaining_duration = Some(Duration::new(
                (duration.value - actual.value).max(0.0),
                duration.units,
            ));
        }
        self
    }

    pub fn with_actual_finish(mut self, actual_finish: NaiveDateTime) -> Self {
        self.actual_finish = Some(actual_finish);
        if let Some(duration) = self.duration {
            self.actual_duration = Some(duration);
            self.remaining_duration = Some(Duration::zero(duration.units));
        }
        self.percent_complete = Some(100.0);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_calendar(mut self, calendar: CalendarId) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_type(mut self, activity_type: ActivityType) -> Self {
        self.activity_type = Some(activity_type);
        self
    }

    pub fn with_parent(mut self, parent: ActivityId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_assignment(mut self, assignment: ResourceAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Mark as a summary node with no duration of its own.
    pub fn as_summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn as_milestone(mut self) -> Self {
        self.milestone = true;
        self.with_duration(Duration::zero(TimeUnit::Days))
    }

    pub fn parent(&self) -> Option<ActivityId> {
        self.parent
    }

    pub fn children(&self) -> &[ActivityId] {
        &self.children
    }

    pub fn progress(&self) -> Progress {
        match (self.actual_start, self.actual_finish) {
            (None, _) => Progress::NotStarted,
            (Some(_), None) => Progress::InProgress,
            (Some(_), Some(_)) => Progress::Finished,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.mode == TaskMode::ManuallyScheduled
    }

    pub fn is_alap(&self) -> bool {
        self.constraint == Some(Constraint::AsLateAsPossible)
    }

    pub fn is_type(&self, activity_type: ActivityType) -> bool {
        self.activity_type == Some(activity_type)
    }

    /// Complete by actual finish or by percent complete.
    pub fn is_complete(&self) -> bool {
        self.actual_finish.is_some() || self.percent_complete == Some(100.0)
    }

    pub fn duration_or_zero(&self) -> Duration {
        self.duration.unwrap_or(Duration::zero(TimeUnit::Days))
    }

    pub fn remaining_or_zero(&self) -> Duration {
        self.remaining_duration
            .unwrap_or_else(|| Duration::zero(self.duration_or_zero().units))
    }

    pub fn actual_or_zero(&self) -> Duration {
        self.actual_duration
            .unwrap_or_else(|| Duration::zero(self.duration_or_zero().units))
    }

    /// Name and id, used in error messages.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}
