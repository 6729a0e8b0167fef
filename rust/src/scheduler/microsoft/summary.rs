//! Summary task logic and the hierarchy rollup.

use crate::duration::TimeUnit;
use crate::models::{ActivityId, RelationType};
use crate::scheduler::{earliest, latest, leaf_descendants, post_order};
use crate::log_debug;
use crate::slack::{MicrosoftSlackCalculator, SlackCalculator};

use super::Run;

impl Run<'_> {
    pub(super) fn summary_tasks_have_logic(&self) -> bool {
        self.project.activities().any(|activity| {
            activity.summary
                && (self.project.has_predecessors(activity.id) || self.project.has_successors(activity.id))
        })
    }

    /// Expand relations touching summary tasks into virtual relations
    /// between their leaf activities.
    ///
    /// A start-start or start-finish relation from a summary binds to its
    /// earliest leaf. Every other end binds to all leaves.
    pub(super) fn build_summary_relations(&mut self) {
        let relations: Vec<_> = self
            .project
            .relations()
            .iter()
            .filter(|r| self.activity(r.predecessor).summary || self.activity(r.successor).summary)
            .copied()
            .collect();

        for relation in relations {
            let predecessors = if self.activity(relation.predecessor).summary {
                let leaves = leaf_descendants(&*self.project, relation.predecessor, |a| a.active);
                match relation.kind {
                    RelationType::StartStart | RelationType::StartFinish => self.earliest_leaf(&leaves),
                    RelationType::FinishStart | RelationType::FinishFinish => leaves,
                }
            } else {
                vec![relation.predecessor]
            };
            let successors = if self.activity(relation.successor).summary {
                leaf_descendants(&*self.project, relation.successor, |a| a.active)
            } else {
                vec![relation.successor]
            };

            for &predecessor in &predecessors {
                for &successor in &successors {
                    if predecessor == successor {
                        continue;
                    }
                    let virtual_relation = relation.rebind(predecessor, successor);
                    log_debug!(
                        self.verbosity,
                        "Virtual {:?} relation {} -> {}",
                        relation.kind,
                        predecessor,
                        successor
                    );
                    self.summary_predecessors
                        .entry(successor)
                        .or_default()
                        .push(virtual_relation);
                    self.summary_successors
                        .entry(predecessor)
                        .or_default()
                        .push(virtual_relation);
                }
            }
        }
    }

    fn earliest_leaf(&self, leaves: &[ActivityId]) -> Vec<ActivityId> {
        leaves
            .iter()
            .copied()
            .filter(|&id| self.activity(id).dates.early_start.is_some())
            .min_by_key(|&id| self.activity(id).dates.early_start)
            .into_iter()
            .collect()
    }

    /// Roll dates up through every summary, children first.
    pub(super) fn rollup(&mut self) {
        let roots = self.project.top_level();
        for id in post_order(&*self.project, &roots) {
            if !self.activity(id).children().is_empty() {
                self.rollup_activity(id);
            }
        }
    }

    fn rollup_activity(&mut self, id: ActivityId) {
        let parent = self.activity(id);
        let mut dates = parent.dates;
        let mut actual_start = parent.actual_start;
        let mut actual_finish = parent.actual_finish;
        let mut finished = 0;
        let mut critical = false;

        for &child_id in parent.children() {
            let child = self.activity(child_id);
            if child.external {
                continue;
            }
            dates.start = earliest(dates.start, child.dates.start);
            dates.finish = latest(dates.finish, child.dates.finish);
            actual_start = earliest(actual_start, child.actual_start);
            actual_finish = latest(actual_finish, child.actual_finish);

            let (early_start, early_finish) = if child.is_alap() {
                (child.dates.late_start, child.dates.late_finish)
            } else {
                (child.dates.early_start, child.dates.early_finish)
            };
            dates.early_start = earliest(dates.early_start, early_start);
            dates.early_finish = latest(dates.early_finish, early_finish);

            let (late_start, late_finish) = if child.is_manual() {
                (child.dates.early_start, child.dates.early_finish)
            } else {
                (child.dates.late_start, child.dates.late_finish)
            };
            dates.late_start = earliest(dates.late_start, late_start);
            dates.late_finish = latest(dates.late_finish, late_finish);

            if child.actual_finish.is_some() {
                finished += 1;
            }
            critical |= child.critical.unwrap_or(false);
        }
        let all_finished = finished == parent.children().len();

        let duration = match (dates.start, dates.finish) {
            (Some(start), Some(finish)) => Some(
                self.project
                    .effective_calendar(id)
                    .work_between(start, finish, TimeUnit::Days),
            ),
            _ => None,
        };

        let activity = self.project.activity_mut(id);
        activity.dates = dates;
        activity.actual_start = actual_start;
        if all_finished {
            activity.actual_finish = actual_finish;
        }
        activity.critical = Some(critical);
        if duration.is_some() {
            activity.duration = duration;
        }
        let total_slack = MicrosoftSlackCalculator.total_slack(&*self.project, id);
        self.project.activity_mut(id).total_slack = total_slack;
    }
}
