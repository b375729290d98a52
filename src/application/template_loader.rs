//! One-time seeding of a new journey from a preset template.
//!
//! Task external ids are namespaced by appending the owning member's numeric
//! id to the template task id, so any number of members can share one
//! template id space without colliding. Runs inside a store mutation, so a
//! failure anywhere leaves no half-seeded journey.

use tracing::warn;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::gantt::{Assignment, Dependency, JourneyId, MemberId, Resource, Task};
use crate::domain::template::{TemplateDocument, TemplateTask};
use crate::storage::GanttState;

const SEED_TITLE: &str = "My Journey";
const SEED_DESCRIPTION: &str = "My journey description";

pub fn seed(
    state: &mut GanttState,
    member: MemberId,
    template: &TemplateDocument,
    start_date: String,
) -> Result<JourneyId, DomainError> {
    let journey = state.create_journey(
        SEED_TITLE.to_string(),
        SEED_DESCRIPTION.to_string(),
        start_date,
        member,
    );

    for node in &template.tasks.rows {
        materialize_task(state, journey, member, node, None)?;
    }

    for resource in &template.resources.rows {
        state.insert_resource(Resource {
            id: resource.id.clone(),
            name: resource.name.clone(),
            role: resource.role.clone(),
            journey,
        })?;
    }

    for assignment in &template.assignments.rows {
        let event = namespaced(&assignment.event_id, member);
        if state.task_in_journey(journey, &event).is_none() {
            return Err(DomainError::not_found(format!(
                "template assignment targets unknown task '{}'",
                assignment.event_id
            )));
        }
        if state
            .resource_in_journey(journey, &assignment.resource_id)
            .is_none()
        {
            warn!(
                resource = %assignment.resource_id,
                event = %assignment.event_id,
                "template assignment references unknown resource, skipping"
            );
            continue;
        }
        state.insert_assignment(Assignment {
            id: Uuid::new_v4().to_string(),
            resource_id: assignment.resource_id.clone(),
            event,
            journey,
        })?;
    }

    for dependency in &template.dependencies.rows {
        let from_event = namespaced(&dependency.from_event, member);
        let to_event = namespaced(&dependency.to_event, member);
        // Seeding stays resilient: one malformed edge in a template must not
        // abort the whole journey.
        if state.task_in_journey(journey, &from_event).is_none()
            || state.task_in_journey(journey, &to_event).is_none()
        {
            warn!(
                from = %dependency.from_event,
                to = %dependency.to_event,
                "template dependency endpoint missing, skipping edge"
            );
            continue;
        }
        state.insert_dependency(Dependency {
            id: dependency
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            from_event,
            to_event,
            lag: dependency.lag,
            journey,
        })?;
    }

    Ok(journey)
}

fn namespaced(template_id: &str, member: MemberId) -> String {
    format!("{template_id}{member}")
}

fn materialize_task(
    state: &mut GanttState,
    journey: JourneyId,
    member: MemberId,
    node: &TemplateTask,
    parent: Option<&str>,
) -> Result<(), DomainError> {
    let external_id = namespaced(&node.id, member);
    let task = Task {
        external_id: external_id.clone(),
        name: node.name.clone(),
        duration: node.duration,
        expanded: node.expanded,
        percent_done: node.percent_done,
        start_date: String::new(),
        end_date: String::new(),
        constraint_type: String::new(),
        status: node.status.clone(),
        event_color: node.event_color.clone(),
        parent: parent.map(str::to_string),
        journey,
    };
    state.insert_task(task)?;

    for child in &node.children {
        materialize_task(state, journey, member, child, Some(&external_id))?;
    }
    Ok(())
}
