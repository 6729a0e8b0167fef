//! Critical path scheduling for activity networks.
//!
//! Two engines compute early, late and remaining dates, slack and critical
//! flags for a [`Project`]: [`MicrosoftScheduler`] reproduces the date rules
//! of a Microsoft-style planner and [`PrimaveraScheduler`] those of a
//! Primavera-style planner. Both work against a [`Calendar`] per activity
//! and roll dates up through the activity hierarchy.
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use cpm_rust::{schedule, Activity, Duration, Project, Relation, SchedulerConfig};
//!
//! let mut project = Project::with_standard_calendar();
//! let a = project.add_activity(Activity::new("Design").with_duration(Duration::days(3.0)));
//! let b = project.add_activity(Activity::new("Build").with_duration(Duration::days(5.0)));
//! project.add_relation(Relation::finish_start(a, b));
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! schedule(&mut project, start, &SchedulerConfig::primavera()).unwrap();
//! assert!(project.activity(b).dates.early_start.is_some());
//! ```

pub mod annotated;
pub mod calendar;
pub mod config;
pub mod duration;
pub mod error;
pub mod logging;
pub mod models;
pub mod project;
pub mod scheduler;
pub mod slack;
pub mod sorting;

pub use annotated::AnnotatedDateTime;
pub use calendar::{Calendar, WorkingCalendar};
pub use config::{Engine, ProjectProperties, RelationshipLagCalendar, SchedulerConfig, TotalSlackCalculation};
pub use duration::{Duration, TimeConversion, TimeUnit};
pub use error::{CpmError, Result};
pub use models::{
    Activity, ActivityId, ActivityType, Constraint, Progress, Relation, RelationType, Resource, ResourceAssignment,
    ResourceType, ScheduleDates,
};
pub use project::Project;
pub use scheduler::{schedule, CpmScheduler, MicrosoftScheduler, PrimaveraScheduler, Scheduler};
pub use slack::{MicrosoftSlackCalculator, PrimaveraSlackCalculator, SlackCalculator};
