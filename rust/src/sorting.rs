//! Topological ordering of activities with cycle detection.
//!
//! Depth-first post-order over successor edges. Successors come from a
//! caller-supplied provider so that temporary relations can take part in the
//! ordering without being written into the project.

use crate::error::{CpmError, Result};
use crate::models::{Activity, ActivityId};
use crate::project::Project;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Temporary,
    Permanent,
}

/// Sort the activities accepted by `include` so every predecessor precedes
/// its successors.
pub fn sort<I>(project: &Project, include: I) -> Result<Vec<ActivityId>>
where
    I: Fn(&Activity) -> bool,
{
    sort_with(project, include, |id| {
        project.successors(id).map(|r| r.successor).collect()
    })
}

/// As [`sort`], with successors supplied by `successors`.
///
/// `include` is applied to every successor before it is visited. A successor
/// reached again while still on the current path is a cycle, and no partial
/// order is returned.
pub fn sort_with<I, S>(project: &Project, include: I, successors: S) -> Result<Vec<ActivityId>>
where
    I: Fn(&Activity) -> bool,
    S: Fn(ActivityId) -> Vec<ActivityId>,
{
    let mut marks = vec![Mark::Unvisited; project.activities().count()];
    let mut order = Vec::new();
    let included = |id: &ActivityId| include(project.activity(*id));

    for root in project.activity_ids().filter(|id| included(id)) {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }

        marks[root.index()] = Mark::Temporary;
        let mut stack: Vec<(ActivityId, Vec<ActivityId>, usize)> = vec![(
            root,
            successors(root).into_iter().filter(|id| included(id)).collect(),
            0,
        )];

        while let Some((node, next, cursor)) = stack.last_mut() {
            if let Some(&successor) = next.get(*cursor) {
                *cursor += 1;
                match marks[successor.index()] {
                    Mark::Permanent => {}
                    Mark::Temporary => {
                        return Err(CpmError::CircularDependency {
                            activity: project.activity(successor).label(),
                        });
                    }
                    Mark::Unvisited => {
                        marks[successor.index()] = Mark::Temporary;
                        let children = successors(successor)
                            .into_iter()
                            .filter(|id| included(id))
                            .collect();
                        stack.push((successor, children, 0));
                    }
                }
            } else {
                let node = *node;
                marks[node.index()] = Mark::Permanent;
                order.push(node);
                stack.pop();
            }
        }
    }

    order.reverse();
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Relation;
    use rustc_hash::FxHashMap;

    fn position(order: &[ActivityId], id: ActivityId) -> usize {
        order.iter().position(|&x| x == id).unwrap()
    }

    #[test]
    fn test_predecessors_come_first() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(Activity::new("A"));
        let b = project.add_activity(Activity::new("B"));
        let c = project.add_activity(Activity::new("C"));
        let d = project.add_activity(Activity::new("D"));
        project.add_relation(Relation::finish_start(c, b));
        project.add_relation(Relation::finish_start(b, a));
        project.add_relation(Relation::finish_start(c, d));

        let order = sort(&project, |_| true).unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(&order, c) < position(&order, b));
        assert!(position(&order, b) < position(&order, a));
        assert!(position(&order, c) < position(&order, d));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(Activity::new("A"));
        let b = project.add_activity(Activity::new("B"));
        let c = project.add_activity(Activity::new("C"));
        project.add_relation(Relation::finish_start(a, b));
        project.add_relation(Relation::finish_start(b, c));
        project.add_relation(Relation::finish_start(c, a));

        let err = sort(&project, |_| true).unwrap_err();
        assert!(matches!(err, CpmError::CircularDependency { .. }));
    }

    #[test]
    fn test_excluded_activities_break_cycles() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(Activity::new("A"));
        let mut inactive = Activity::new("B");
        inactive.active = false;
        let b = project.add_activity(inactive);
        project.add_relation(Relation::finish_start(a, b));
        project.add_relation(Relation::finish_start(b, a));

        let order = sort(&project, |act| act.active).unwrap();
        assert_eq!(order, vec![a]);
    }

    #[test]
    fn test_successor_provider_adds_edges() {
        let mut project = Project::with_standard_calendar();
        let a = project.add_activity(Activity::new("A"));
        let b = project.add_activity(Activity::new("B"));

        let mut extra: FxHashMap<ActivityId, Vec<ActivityId>> = FxHashMap::default();
        extra.insert(b, vec![a]);
        let order = sort_with(&project, |_| true, |id| extra.get(&id).cloned().unwrap_or_default()).unwrap();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut project = Project::with_standard_calendar();
        let ids: Vec<ActivityId> = (0..20_000)
            .map(|i| project.add_activity(Activity::new(format!("T{i}"))))
            .collect();
        for pair in ids.windows(2) {
            project.add_relation(Relation::finish_start(pair[0], pair[1]));
        }
        let order = sort(&project, |_| true).unwrap();
        assert_eq!(order, ids);
    }
}
