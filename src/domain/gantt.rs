//! Entities owned by a journey: the task tree plus its flat satellite
//! collections. Tasks reference each other (parent links, dependency
//! endpoints, assignment targets) through the client-visible external id,
//! never through storage-internal keys.

pub type MemberId = u64;
pub type JourneyId = u64;

/// Status a freshly created task starts in.
pub const DEFAULT_TASK_STATUS: &str = "Todo";

/// A member's plan of record, root aggregate for everything below.
#[derive(Debug, Clone)]
pub struct Journey {
    pub id: JourneyId,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub owners: Vec<MemberId>,
}

/// One node in the journey's rooted task forest.
///
/// `parent` holds the parent's external id; `None` marks a root. Children are
/// derived by reverse lookup, so the tree itself stores no child lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub external_id: String,
    pub name: String,
    pub duration: i64,
    pub expanded: bool,
    pub percent_done: f64,
    pub start_date: String,
    pub end_date: String,
    pub constraint_type: String,
    pub status: String,
    pub event_color: Option<String>,
    pub parent: Option<String>,
    pub journey: JourneyId,
}

impl Task {
    /// A task with every field at its creation default, ready for a patch.
    pub fn blank(external_id: String, journey: JourneyId) -> Self {
        Self {
            external_id,
            name: String::new(),
            duration: 0,
            expanded: true,
            percent_done: 0.0,
            start_date: String::new(),
            end_date: String::new(),
            constraint_type: String::new(),
            status: DEFAULT_TASK_STATUS.to_string(),
            event_color: None,
            parent: None,
            journey,
        }
    }
}

/// Partial update over the recognized task field set. Absent fields leave the
/// stored value untouched; `event_color` distinguishes "absent" from an
/// explicit null (clear the color).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub expanded: Option<bool>,
    pub duration: Option<i64>,
    pub percent_done: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub constraint_type: Option<String>,
    pub event_color: Option<Option<String>>,
    pub status: Option<String>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(expanded) = self.expanded {
            task.expanded = expanded;
        }
        if let Some(duration) = self.duration {
            task.duration = duration;
        }
        if let Some(percent_done) = self.percent_done {
            task.percent_done = percent_done;
        }
        if let Some(start_date) = &self.start_date {
            task.start_date = start_date.clone();
        }
        if let Some(end_date) = &self.end_date {
            task.end_date = end_date.clone();
        }
        if let Some(constraint_type) = &self.constraint_type {
            task.constraint_type = constraint_type.clone();
        }
        if let Some(event_color) = &self.event_color {
            task.event_color = event_color.clone();
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
    }
}

/// A role-tagged actor assignable to tasks. The id is client-chosen but only
/// meaningful inside its journey.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub role: String,
    pub journey: JourneyId,
}

/// Binds one resource to one task within a journey.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub resource_id: String,
    pub event: String,
    pub journey: JourneyId,
}

/// Directed edge between two tasks, with an integer lag offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub id: String,
    pub from_event: String,
    pub to_event: String,
    pub lag: i64,
    pub journey: JourneyId,
}
