//! The activity network: activities, relations, resources and calendars.

use chrono::NaiveDateTime;

use crate::calendar::{Calendar, WorkingCalendar};
use crate::config::ProjectProperties;
use crate::models::{
    Activity, ActivityId, CalendarId, Relation, Resource, ResourceAssignment, ResourceId,
};

/// A project network as supplied by the caller.
///
/// Activities are stored in insertion order and addressed by [`ActivityId`].
/// Relations are indexed by both ends so neighbour lookups are cheap.
#[derive(Debug)]
pub struct Project {
    pub properties: ProjectProperties,
    activities: Vec<Activity>,
    relations: Vec<Relation>,
    predecessors: Vec<Vec<usize>>,
    successors: Vec<Vec<usize>>,
    resources: Vec<Resource>,
    calendars: Vec<Box<dyn Calendar>>,
    default_calendar: CalendarId,
    finish_date: Option<NaiveDateTime>,
}

impl Project {
    /// Create an empty project. `default_calendar` becomes calendar 0.
    pub fn new(properties: ProjectProperties, default_calendar: impl Calendar + 'static) -> Self {
        Self {
            properties,
            activities: Vec::new(),
            relations: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            resources: Vec::new(),
            calendars: vec![Box::new(default_calendar)],
            default_calendar: CalendarId(0),
            finish_date: None,
        }
    }

    /// Project with default properties and the standard working calendar.
    pub fn with_standard_calendar() -> Self {
        Self::new(ProjectProperties::default(), WorkingCalendar::standard("Standard"))
    }

    pub fn add_calendar(&mut self, calendar: impl Calendar + 'static) -> CalendarId {
        self.calendars.push(Box::new(calendar));
        CalendarId(self.calendars.len() as u32 - 1)
    }

    pub fn add_resource(&mut self, resource: Resource) -> ResourceId {
        self.resources.push(resource);
        ResourceId(self.resources.len() as u32 - 1)
    }

    /// Add an activity, linking it under its parent if one is set.
    pub fn add_activity(&mut self, mut activity: Activity) -> ActivityId {
        let id = ActivityId(self.activities.len() as u32);
        activity.id = id;
        activity.children.clear();
        if let Some(parent) = activity.parent {
            self.activities[parent.index()].children.push(id);
        }
        self.activities.push(activity);
        self.predecessors.push(Vec::new());
        self.successors.push(Vec::new());
        id
    }

    pub fn add_relation(&mut self, relation: Relation) {
        let index = self.relations.len();
        self.predecessors[relation.successor.index()].push(index);
        self.successors[relation.predecessor.index()].push(index);
        self.relations.push(relation);
    }

    /// Move `child` under `parent`.
    pub fn set_parent(&mut self, child: ActivityId, parent: ActivityId) {
        if let Some(old) = self.activities[child.index()].parent {
            self.activities[old.index()].children.retain(|&c| c != child);
        }
        self.activities[child.index()].parent = Some(parent);
        self.activities[parent.index()].children.push(child);
    }

    pub fn activity(&self, id: ActivityId) -> &Activity {
        &self.activities[id.index()]
    }

    pub fn activity_mut(&mut self, id: ActivityId) -> &mut Activity {
        &mut self.activities[id.index()]
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn activities_mut(&mut self) -> impl Iterator<Item = &mut Activity> {
        self.activities.iter_mut()
    }

    pub fn activity_ids(&self) -> impl Iterator<Item = ActivityId> {
        (0..self.activities.len() as u32).map(ActivityId)
    }

    /// Activities with no parent.
    pub fn top_level(&self) -> Vec<ActivityId> {
        self.activities
            .iter()
            .filter(|a| a.parent.is_none())
            .map(|a| a.id)
            .collect()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Relations in which `id` is the successor.
    pub fn predecessors(&self, id: ActivityId) -> impl Iterator<Item = &Relation> {
        self.predecessors[id.index()].iter().map(|&i| &self.relations[i])
    }

    /// Relations in which `id` is the predecessor.
    pub fn successors(&self, id: ActivityId) -> impl Iterator<Item = &Relation> {
        self.successors[id.index()].iter().map(|&i| &self.relations[i])
    }

    pub fn has_predecessors(&self, id: ActivityId) -> bool {
        !self.predecessors[id.index()].is_empty()
    }

    pub fn has_successors(&self, id: ActivityId) -> bool {
        !self.successors[id.index()].is_empty()
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0 as usize]
    }

    pub fn calendar(&self, id: CalendarId) -> &dyn Calendar {
        self.calendars[id.0 as usize].as_ref()
    }

    pub fn default_calendar(&self) -> &dyn Calendar {
        self.calendar(self.default_calendar)
    }

    /// The activity's own calendar, falling back to the project default.
    pub fn effective_calendar(&self, id: ActivityId) -> &dyn Calendar {
        self.calendar(self.activity(id).calendar.unwrap_or(self.default_calendar))
    }

    /// The resource's calendar, falling back to the project default.
    pub fn resource_calendar(&self, id: ResourceId) -> &dyn Calendar {
        self.calendar(self.resource(id).calendar.unwrap_or(self.default_calendar))
    }

    /// Calendar for an assignment: its own, then its resource's, then the activity's.
    pub fn assignment_calendar(&self, activity: ActivityId, assignment: &ResourceAssignment) -> &dyn Calendar {
        if let Some(calendar) = assignment.calendar {
            return self.calendar(calendar);
        }
        match assignment.resource.and_then(|r| self.resource(r).calendar) {
            Some(calendar) => self.calendar(calendar),
            None => self.effective_calendar(activity),
        }
    }

    /// Project finish computed by the last schedule run.
    pub fn finish_date(&self) -> Option<NaiveDateTime> {
        self.finish_date
    }

    pub(crate) fn set_finish_date(&mut self, finish: Option<NaiveDateTime>) {
        self.finish_date = finish;
    }
}
