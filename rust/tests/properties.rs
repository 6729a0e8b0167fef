mod common;

use common::{dt, NetworkBuilder};
use cpm_rust::{
    CpmScheduler, MicrosoftSlackCalculator, PrimaveraSlackCalculator, Project, Scheduler, SchedulerConfig,
    SlackCalculator,
};
use proptest::prelude::*;

// Acyclic by construction: activity i only ever precedes activities after it.
fn network_strategy(max_activities: usize) -> impl Strategy<Value = NetworkBuilder> {
    (1..=max_activities).prop_flat_map(|count| {
        (
            proptest::collection::vec(1..=5u32, count),
            proptest::collection::vec((any::<usize>(), any::<usize>()), 0..count * 2),
        )
            .prop_map(move |(durations, edges)| {
                let mut builder = NetworkBuilder::new();
                for (i, days) in durations.iter().enumerate() {
                    builder = builder.activity(&format!("T{}", i), f64::from(*days));
                }
                let mut seen = std::collections::HashSet::new();
                for (a, b) in edges {
                    let (from, to) = (a % count, b % count);
                    if from < to && seen.insert((from, to)) {
                        builder = builder.finish_start(from, to);
                    }
                }
                builder
            })
    })
}

fn configs() -> [(SchedulerConfig, &'static dyn SlackCalculator); 2] {
    [
        (SchedulerConfig::microsoft(), &MicrosoftSlackCalculator),
        (SchedulerConfig::primavera(), &PrimaveraSlackCalculator),
    ]
}

fn position(order: &[cpm_rust::ActivityId], id: cpm_rust::ActivityId) -> Option<usize> {
    order.iter().position(|&x| x == id)
}

proptest! {
    #[test]
    fn predecessors_sort_first(network in network_strategy(12)) {
        let (mut project, _) = network.build();
        for (config, _) in configs() {
            let mut scheduler = CpmScheduler::new(&config);
            scheduler.schedule(&mut project, dt(1, 8)).unwrap();
            let order = scheduler.sorted_activities();
            for relation in project.relations() {
                prop_assert!(position(order, relation.predecessor) < position(order, relation.successor));
            }
        }
    }

    #[test]
    fn early_and_late_dates_are_consistent(network in network_strategy(12)) {
        let (mut project, ids) = network.build();
        for (config, calculator) in configs() {
            CpmScheduler::new(&config).schedule(&mut project, dt(1, 8)).unwrap();
            for &id in &ids {
                let dates = project.activity(id).dates;
                let (es, ef) = (dates.early_start.unwrap(), dates.early_finish.unwrap());
                let (ls, lf) = (dates.late_start.unwrap(), dates.late_finish.unwrap());
                prop_assert!(es <= ef);
                prop_assert!(ls <= lf);
                prop_assert!(es <= ls);
                if !project.has_predecessors(id) {
                    prop_assert!(es >= dt(1, 8));
                }
                if es == ls && ef == lf {
                    prop_assert!(calculator.free_slack(&project, id).is_zero());
                }
            }
        }
    }

    #[test]
    fn scheduling_twice_changes_nothing(network in network_strategy(10)) {
        let (mut project, _) = network.build();
        for (config, _) in configs() {
            let snapshot = |project: &Project| -> Vec<_> {
                project.activities().map(|a| (a.dates, a.critical, a.total_slack)).collect()
            };
            CpmScheduler::new(&config).schedule(&mut project, dt(1, 8)).unwrap();
            let first = snapshot(&project);
            CpmScheduler::new(&config).schedule(&mut project, dt(1, 8)).unwrap();
            prop_assert_eq!(first, snapshot(&project));
        }
    }
}
