//! Applies one client sync batch against the entity store.
//!
//! Section order is fixed and significant: tasks are created first so that
//! the phantom map is ready by the time dependency edges resolve their
//! endpoints. The caller runs the whole thing inside
//! [`JourneyStore::mutate`](crate::storage::JourneyStore::mutate), so any
//! error here rolls back every section.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::application::dto::SyncRequest;
use crate::domain::errors::DomainError;
use crate::domain::gantt::{Assignment, Dependency, JourneyId, MemberId, Resource, Task};
use crate::storage::GanttState;

/// Batch-scoped map from a client `$PhantomId` to the external id of the
/// task created for it. Dropped with the batch.
type PhantomTasks = HashMap<String, String>;

pub fn apply_batch(
    state: &mut GanttState,
    journey: JourneyId,
    member: MemberId,
    batch: &SyncRequest,
) -> Result<(), DomainError> {
    let phantoms = apply_added_tasks(state, journey, member, batch)?;
    apply_updated_tasks(state, journey, member, batch)?;
    apply_removed_tasks(state, journey, member, batch);

    apply_resources(state, journey, batch)?;
    apply_assignments(state, journey, member, batch)?;
    apply_dependencies(state, journey, member, batch, &phantoms)?;

    Ok(())
}

/// Resolves a client task reference inside the member's journey.
///
/// Tries the id verbatim first, then with the member suffix appended: a
/// first-session client still holds unsuffixed template ids, because seeding
/// echoes the raw template document instead of re-serializing the store.
fn resolve_task_id(
    state: &GanttState,
    journey: JourneyId,
    member: MemberId,
    id: &str,
) -> Option<String> {
    if state.task_in_journey(journey, id).is_some() {
        return Some(id.to_string());
    }
    let namespaced = format!("{id}{member}");
    state
        .task_in_journey(journey, &namespaced)
        .is_some()
        .then_some(namespaced)
}

/// Task reference resolution for dependency endpoints: storage first, then
/// the phantom map, so an edge can target a task created earlier in the same
/// batch.
fn resolve_endpoint(
    state: &GanttState,
    journey: JourneyId,
    member: MemberId,
    phantoms: &PhantomTasks,
    id: &str,
) -> Result<String, DomainError> {
    resolve_task_id(state, journey, member, id)
        .or_else(|| phantoms.get(id).cloned())
        .ok_or_else(|| DomainError::not_found(format!("task '{id}' not found for dependency")))
}

fn apply_added_tasks(
    state: &mut GanttState,
    journey: JourneyId,
    member: MemberId,
    batch: &SyncRequest,
) -> Result<PhantomTasks, DomainError> {
    let mut phantoms = PhantomTasks::new();

    for added in &batch.tasks.added {
        // Parents must already exist; phantom parents are not supported.
        let parent = match &added.parent_id {
            Some(parent_id) => Some(
                resolve_task_id(state, journey, member, parent_id.as_str()).ok_or_else(|| {
                    DomainError::not_found(format!(
                        "parent task '{}' not found",
                        parent_id.as_str()
                    ))
                })?,
            ),
            None => None,
        };

        let external_id = Uuid::new_v4().to_string();
        let mut task = Task::blank(external_id.clone(), journey);
        task.parent = parent;
        if let Some(name) = &added.name {
            task.name = name.clone();
        }
        if let Some(duration) = added.duration {
            task.duration = duration;
        }
        if let Some(expanded) = added.expanded {
            task.expanded = expanded;
        }
        if let Some(status) = &added.status {
            task.status = status.clone();
        }
        task.event_color = added.event_color.clone();
        if let Some(percent_done) = added.percent_done {
            task.percent_done = percent_done;
        }
        if let Some(start_date) = &added.start_date {
            task.start_date = start_date.clone();
        }
        if let Some(end_date) = &added.end_date {
            task.end_date = end_date.clone();
        }
        if let Some(constraint_type) = &added.constraint_type {
            task.constraint_type = constraint_type.clone();
        }
        state.insert_task(task)?;

        if let Some(phantom_id) = &added.phantom_id {
            phantoms.insert(phantom_id.as_str().to_string(), external_id);
        }
    }

    Ok(phantoms)
}

fn apply_updated_tasks(
    state: &mut GanttState,
    journey: JourneyId,
    member: MemberId,
    batch: &SyncRequest,
) -> Result<(), DomainError> {
    for update in &batch.tasks.updated {
        let patch = update.to_patch();
        match resolve_task_id(state, journey, member, update.id.as_str()) {
            Some(external_id) => {
                let task = state
                    .task_in_journey_mut(journey, &external_id)
                    .ok_or_else(|| DomainError::internal("resolved task disappeared"))?;
                patch.apply(task);
            }
            None => {
                // Upsert semantics: an unknown id materializes a new task
                // carrying only the patched fields.
                let mut task = Task::blank(update.id.as_str().to_string(), journey);
                patch.apply(&mut task);
                state.insert_task(task)?;
            }
        }
    }
    Ok(())
}

fn apply_removed_tasks(
    state: &mut GanttState,
    journey: JourneyId,
    member: MemberId,
    batch: &SyncRequest,
) {
    for removed in &batch.tasks.removed {
        match resolve_task_id(state, journey, member, removed.id.as_str()) {
            Some(external_id) => {
                state.remove_task_cascade(journey, &external_id);
            }
            None => debug!(id = removed.id.as_str(), "removed task already absent"),
        }
    }
}

fn apply_resources(
    state: &mut GanttState,
    journey: JourneyId,
    batch: &SyncRequest,
) -> Result<(), DomainError> {
    for added in &batch.resources.added {
        state.insert_resource(Resource {
            id: added.id.as_str().to_string(),
            name: added.name.clone().unwrap_or_default(),
            role: added.role.clone().unwrap_or_default(),
            journey,
        })?;
    }

    for update in &batch.resources.updated {
        match state.resource_in_journey_mut(journey, update.id.as_str()) {
            Some(resource) => {
                if let Some(name) = &update.name {
                    resource.name = name.clone();
                }
                if let Some(role) = &update.role {
                    resource.role = role.clone();
                }
            }
            None => {
                state.insert_resource(Resource {
                    id: update.id.as_str().to_string(),
                    name: update.name.clone().unwrap_or_default(),
                    role: update.role.clone().unwrap_or_default(),
                    journey,
                })?;
            }
        }
    }

    for removed in &batch.resources.removed {
        state.remove_resource(journey, removed.id.as_str());
    }

    Ok(())
}

fn apply_assignments(
    state: &mut GanttState,
    journey: JourneyId,
    member: MemberId,
    batch: &SyncRequest,
) -> Result<(), DomainError> {
    for added in &batch.assignments.added {
        if state
            .resource_in_journey(journey, added.resource_id.as_str())
            .is_none()
        {
            return Err(DomainError::not_found(format!(
                "resource '{}' not found",
                added.resource_id.as_str()
            )));
        }
        let event = resolve_task_id(state, journey, member, added.event_id.as_str())
            .ok_or_else(|| {
                DomainError::not_found(format!("task '{}' not found", added.event_id.as_str()))
            })?;

        state.insert_assignment(Assignment {
            id: Uuid::new_v4().to_string(),
            resource_id: added.resource_id.as_str().to_string(),
            event,
            journey,
        })?;
    }

    for update in &batch.assignments.updated {
        let resource_id = update.resource_id.as_ref().ok_or_else(|| {
            DomainError::validation("assignment update requires a resourceId")
        })?;
        if state
            .resource_in_journey(journey, resource_id.as_str())
            .is_none()
        {
            return Err(DomainError::not_found(format!(
                "resource '{}' not found",
                resource_id.as_str()
            )));
        }

        let assignment = state
            .assignment_in_journey_mut(journey, update.id.as_str())
            .ok_or_else(|| {
                DomainError::not_found(format!("assignment '{}' not found", update.id.as_str()))
            })?;
        assignment.resource_id = resource_id.as_str().to_string();
    }

    for removed in &batch.assignments.removed {
        state.remove_assignment(journey, removed.id.as_str());
    }

    Ok(())
}

fn apply_dependencies(
    state: &mut GanttState,
    journey: JourneyId,
    member: MemberId,
    batch: &SyncRequest,
    phantoms: &PhantomTasks,
) -> Result<(), DomainError> {
    for added in &batch.dependencies.added {
        let from_event =
            resolve_endpoint(state, journey, member, phantoms, added.from_event.as_str())?;
        let to_event =
            resolve_endpoint(state, journey, member, phantoms, added.to_event.as_str())?;

        let id = added
            .id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        state.insert_dependency(Dependency {
            id,
            from_event,
            to_event,
            lag: added.lag.unwrap_or(0),
            journey,
        })?;
    }

    for update in &batch.dependencies.updated {
        // Resolve before taking the mutable borrow; lag and endpoint land in
        // one update to the record.
        let from_event = match &update.from_event {
            Some(id) => Some(resolve_endpoint(state, journey, member, phantoms, id.as_str())?),
            None => None,
        };

        let dependency = state
            .dependency_in_journey_mut(journey, update.id.as_str())
            .ok_or_else(|| {
                DomainError::not_found(format!("dependency '{}' not found", update.id.as_str()))
            })?;
        if let Some(lag) = update.lag {
            dependency.lag = lag;
        }
        if let Some(from_event) = from_event {
            dependency.from_event = from_event;
        }
    }

    for removed in &batch.dependencies.removed {
        state.remove_dependency(journey, removed.id.as_str());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(value: serde_json::Value) -> SyncRequest {
        serde_json::from_value(value).expect("batch should parse")
    }

    fn seeded_state() -> (GanttState, JourneyId) {
        let mut state = GanttState::new();
        let journey = state.create_journey("j".into(), "".into(), "".into(), 42);
        // Mirrors a template-seeded pair: template ids "t1"/"t2", member 42.
        for id in ["t142", "t242"] {
            let mut task = Task::blank(id.to_string(), journey);
            task.name = format!("seeded {id}");
            state.insert_task(task).unwrap();
        }
        (state, journey)
    }

    #[test]
    fn added_task_gets_fresh_id_and_phantom_entry() {
        let (mut state, journey) = seeded_state();
        let request = batch(json!({
            "tasks": { "added": [
                { "$PhantomId": "p1", "name": "New step", "duration": 4 }
            ]}
        }));

        apply_batch(&mut state, journey, 42, &request).unwrap();

        assert_eq!(state.task_count(journey), 3);
        let created = state
            .root_tasks(journey)
            .into_iter()
            .find(|t| t.name == "New step")
            .expect("created task");
        assert_ne!(created.external_id, "p1");
        assert_eq!(created.duration, 4);
        assert_eq!(created.status, "Todo");
    }

    #[test]
    fn added_task_resolves_parent_through_member_suffix() {
        let (mut state, journey) = seeded_state();
        let request = batch(json!({
            "tasks": { "added": [
                { "$PhantomId": "p1", "name": "Child", "parentId": "t1" }
            ]}
        }));

        apply_batch(&mut state, journey, 42, &request).unwrap();

        let children = state.children_of(journey, "t142");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Child");
    }

    #[test]
    fn added_task_with_missing_parent_fails() {
        let (mut state, journey) = seeded_state();
        let request = batch(json!({
            "tasks": { "added": [
                { "$PhantomId": "p1", "name": "Orphan", "parentId": "ghost" }
            ]}
        }));

        let err = apply_batch(&mut state, journey, 42, &request).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn dependency_resolves_phantom_endpoint_in_same_batch() {
        let (mut state, journey) = seeded_state();
        let request = batch(json!({
            "tasks": { "added": [
                { "$PhantomId": "p1", "name": "Brand new" }
            ]},
            "dependencies": { "added": [
                { "id": "d1", "fromEvent": "p1", "toEvent": "t242" }
            ]}
        }));

        apply_batch(&mut state, journey, 42, &request).unwrap();

        let dependency = state
            .dependency_in_journey(journey, "d1")
            .expect("dependency");
        assert_eq!(dependency.to_event, "t242");
        assert!(state.task_in_journey(journey, &dependency.from_event).is_some());
        assert_eq!(dependency.lag, 0);
    }

    #[test]
    fn dependency_with_unresolvable_endpoint_fails_not_found() {
        let (mut state, journey) = seeded_state();
        let request = batch(json!({
            "dependencies": { "added": [
                { "id": "d1", "fromEvent": "nowhere", "toEvent": "t242" }
            ]}
        }));

        let err = apply_batch(&mut state, journey, 42, &request).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(state.dependency_in_journey(journey, "d1").is_none());
    }

    #[test]
    fn task_update_is_partial_and_idempotent() {
        let (mut state, journey) = seeded_state();
        let request = batch(json!({
            "tasks": { "updated": [
                { "id": "t142", "percentDone": 80.0, "status": "Doing" }
            ]}
        }));

        apply_batch(&mut state, journey, 42, &request).unwrap();
        let once = state.task_in_journey(journey, "t142").unwrap().clone();
        assert_eq!(once.name, "seeded t142");
        assert_eq!(once.percent_done, 80.0);
        assert_eq!(once.status, "Doing");

        apply_batch(&mut state, journey, 42, &request).unwrap();
        let twice = state.task_in_journey(journey, "t142").unwrap();
        assert_eq!(*twice, once);
    }

    #[test]
    fn task_update_upserts_unknown_id() {
        let (mut state, journey) = seeded_state();
        let request = batch(json!({
            "tasks": { "updated": [
                { "id": "imported", "name": "From elsewhere" }
            ]}
        }));

        apply_batch(&mut state, journey, 42, &request).unwrap();
        let task = state.task_in_journey(journey, "imported").expect("upserted");
        assert_eq!(task.name, "From elsewhere");
    }

    #[test]
    fn removing_a_task_drops_dependent_edges() {
        let (mut state, journey) = seeded_state();
        state
            .insert_dependency(Dependency {
                id: "d1".into(),
                from_event: "t142".into(),
                to_event: "t242".into(),
                lag: 0,
                journey,
            })
            .unwrap();

        let request = batch(json!({
            "tasks": { "removed": [ { "id": "t142" } ] }
        }));
        apply_batch(&mut state, journey, 42, &request).unwrap();

        assert!(state.task_in_journey(journey, "t142").is_none());
        assert!(state.dependency_in_journey(journey, "d1").is_none());
    }

    #[test]
    fn assignment_add_resolves_resource_and_suffixed_event() {
        let (mut state, journey) = seeded_state();
        state
            .insert_resource(Resource {
                id: "r1".into(),
                name: "Clinic".into(),
                role: "clinic".into(),
                journey,
            })
            .unwrap();

        let request = batch(json!({
            "assignments": { "added": [
                { "resourceId": "r1", "eventId": "t2" }
            ]}
        }));
        apply_batch(&mut state, journey, 42, &request).unwrap();

        let assignments = state.assignments_of(journey);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].event, "t242");
    }

    #[test]
    fn assignment_update_repoints_resource_only() {
        let (mut state, journey) = seeded_state();
        for id in ["r1", "r2"] {
            state
                .insert_resource(Resource {
                    id: id.into(),
                    name: id.into(),
                    role: String::new(),
                    journey,
                })
                .unwrap();
        }
        state
            .insert_assignment(Assignment {
                id: "a1".into(),
                resource_id: "r1".into(),
                event: "t142".into(),
                journey,
            })
            .unwrap();

        let request = batch(json!({
            "assignments": { "updated": [ { "id": "a1", "resourceId": "r2" } ] }
        }));
        apply_batch(&mut state, journey, 42, &request).unwrap();

        let assignment = state.assignment_in_journey(journey, "a1").unwrap();
        assert_eq!(assignment.resource_id, "r2");
        assert_eq!(assignment.event, "t142");
    }

    #[test]
    fn dependency_update_patches_lag_and_endpoint_together() {
        let (mut state, journey) = seeded_state();
        state
            .insert_dependency(Dependency {
                id: "d1".into(),
                from_event: "t142".into(),
                to_event: "t242".into(),
                lag: 0,
                journey,
            })
            .unwrap();

        let request = batch(json!({
            "dependencies": { "updated": [
                { "id": "d1", "lag": 3, "fromEvent": "t2" }
            ]}
        }));
        apply_batch(&mut state, journey, 42, &request).unwrap();

        let dependency = state.dependency_in_journey(journey, "d1").unwrap();
        assert_eq!(dependency.lag, 3);
        assert_eq!(dependency.from_event, "t242");
    }

    #[test]
    fn duplicate_resource_id_in_journey_is_a_conflict() {
        let (mut state, journey) = seeded_state();
        state
            .insert_resource(Resource {
                id: "r1".into(),
                name: "Clinic".into(),
                role: String::new(),
                journey,
            })
            .unwrap();

        let request = batch(json!({
            "resources": { "added": [ { "id": "r1", "name": "Other" } ] }
        }));
        let err = apply_batch(&mut state, journey, 42, &request).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
