#![allow(dead_code)]

use std::sync::Once;

use chrono::{NaiveDate, NaiveDateTime};
use cpm_rust::{Activity, ActivityId, Duration, Project, Relation, RelationType, SchedulerConfig};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Output is captured per test and only shown for failures. Pick the level
/// with e.g. `RUST_LOG=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// January 2024. The 1st is a Monday.
pub fn dt(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn task(name: &str, days: f64) -> Activity {
    Activity::new(name).with_duration(Duration::days(days))
}

/// Both engines at full verbosity so failures come with a trace.
pub fn engines() -> [SchedulerConfig; 2] {
    [
        SchedulerConfig::microsoft().with_verbosity(3),
        SchedulerConfig::primavera().with_verbosity(3),
    ]
}

/// Builds a network of day-duration activities joined by relations.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    activities: Vec<(String, f64)>,
    relations: Vec<(usize, usize, RelationType, Duration)>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(mut self, name: &str, days: f64) -> Self {
        self.activities.push((name.to_string(), days));
        self
    }

    pub fn finish_start(self, predecessor: usize, successor: usize) -> Self {
        self.relation(predecessor, successor, RelationType::FinishStart, Duration::days(0.0))
    }

    pub fn relation(mut self, predecessor: usize, successor: usize, kind: RelationType, lag: Duration) -> Self {
        self.relations.push((predecessor, successor, kind, lag));
        self
    }

    pub fn build(self) -> (Project, Vec<ActivityId>) {
        let mut project = Project::with_standard_calendar();
        let ids: Vec<ActivityId> = self
            .activities
            .iter()
            .map(|(name, days)| project.add_activity(task(name, *days)))
            .collect();
        for (predecessor, successor, kind, lag) in self.relations {
            project.add_relation(Relation::new(ids[predecessor], ids[successor], kind, lag));
        }
        (project, ids)
    }
}
