//! Projects a persisted journey back into the widget's nested wire format.

use crate::application::dto::{
    AssignmentView, DependencyView, ProjectEnvelope, ProjectMeta, ResourceView, TaskView,
    default_calendars,
};
use crate::domain::errors::DomainError;
use crate::domain::gantt::{Journey, JourneyId, Task};
use crate::domain::template::Rows;
use crate::storage::GanttState;

/// Parent links are only written at creation time today, but nothing in the
/// data model structurally forbids a future cycle, so recursion is bounded
/// instead of trusted.
const MAX_TREE_DEPTH: usize = 64;

pub fn project_envelope(
    state: &GanttState,
    journey: &Journey,
) -> Result<ProjectEnvelope, DomainError> {
    Ok(ProjectEnvelope {
        project: ProjectMeta {
            calendar: "general".to_string(),
            start_date: journey.start_date.clone(),
        },
        calendars: default_calendars(),
        tasks: Rows {
            rows: serialize_forest(state, journey.id)?,
        },
        resources: Rows {
            rows: state
                .resources_of(journey.id)
                .into_iter()
                .map(ResourceView::from)
                .collect(),
        },
        assignments: Rows {
            rows: state
                .assignments_of(journey.id)
                .into_iter()
                .map(AssignmentView::from)
                .collect(),
        },
        dependencies: Rows {
            rows: state
                .dependencies_of(journey.id)
                .into_iter()
                .map(DependencyView::from)
                .collect(),
        },
    })
}

pub fn serialize_forest(
    state: &GanttState,
    journey: JourneyId,
) -> Result<Vec<TaskView>, DomainError> {
    state
        .root_tasks(journey)
        .into_iter()
        .map(|task| serialize_task(state, journey, task, 0))
        .collect()
}

fn serialize_task(
    state: &GanttState,
    journey: JourneyId,
    task: &Task,
    depth: usize,
) -> Result<TaskView, DomainError> {
    if depth >= MAX_TREE_DEPTH {
        return Err(DomainError::internal(format!(
            "task tree deeper than {MAX_TREE_DEPTH} levels at '{}'",
            task.external_id
        )));
    }

    let children = state
        .children_of(journey, &task.external_id)
        .into_iter()
        .map(|child| serialize_task(state, journey, child, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskView {
        id: task.external_id.clone(),
        name: task.name.clone(),
        duration: task.duration,
        percent_done: task.percent_done,
        expanded: task.expanded,
        start_date: task.start_date.clone(),
        end_date: task.end_date.clone(),
        constraint_type: task.constraint_type.clone(),
        event_color: task.event_color.clone(),
        status: task.status.clone(),
        children,
    })
}
