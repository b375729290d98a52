use std::collections::{BTreeMap, HashSet};

use crate::domain::errors::DomainError;
use crate::domain::gantt::{
    Assignment, Dependency, Journey, JourneyId, MemberId, Resource, Task,
};

/// The whole entity store as one plain value.
///
/// Collections are keyed by a monotonically increasing insertion key, so
/// iteration order is creation order; that ordering is what the tree
/// serializer relies on for child sequences. Cross-entity references go
/// through client-visible ids, which are resolved by scan (collections are
/// journey-sized, not database-sized).
///
/// `GanttState` is `Clone` on purpose: the store stages every mutation on a
/// clone and swaps it in only when the mutation succeeds.
#[derive(Debug, Clone, Default)]
pub struct GanttState {
    next_key: u64,
    journeys: BTreeMap<JourneyId, Journey>,
    tasks: BTreeMap<u64, Task>,
    resources: BTreeMap<u64, Resource>,
    assignments: BTreeMap<u64, Assignment>,
    dependencies: BTreeMap<u64, Dependency>,
}

impl GanttState {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_key(&mut self) -> u64 {
        self.next_key += 1;
        self.next_key
    }

    // ------------------------------------------------------------------
    // Journeys
    // ------------------------------------------------------------------

    pub fn create_journey(
        &mut self,
        title: String,
        description: String,
        start_date: String,
        owner: MemberId,
    ) -> JourneyId {
        let id = self.next_key();
        self.journeys.insert(
            id,
            Journey {
                id,
                title,
                description,
                start_date,
                owners: vec![owner],
            },
        );
        id
    }

    /// First journey owned by the member, or none. Absence is a normal
    /// result; it is what routes a member into seeding.
    pub fn journey_for_member(&self, member: MemberId) -> Option<&Journey> {
        self.journeys
            .values()
            .find(|journey| journey.owners.contains(&member))
    }

    pub fn journey(&self, id: JourneyId) -> Option<&Journey> {
        self.journeys.get(&id)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Inserts a task, enforcing store-wide external id uniqueness.
    pub fn insert_task(&mut self, task: Task) -> Result<(), DomainError> {
        if self.task_by_external_id(&task.external_id).is_some() {
            return Err(DomainError::conflict(format!(
                "task id '{}' already exists",
                task.external_id
            )));
        }
        let key = self.next_key();
        self.tasks.insert(key, task);
        Ok(())
    }

    pub fn task_by_external_id(&self, external_id: &str) -> Option<&Task> {
        self.tasks
            .values()
            .find(|task| task.external_id == external_id)
    }

    /// Journey-scoped lookup: references submitted by a member only ever
    /// resolve against that member's own journey.
    pub fn task_in_journey(&self, journey: JourneyId, external_id: &str) -> Option<&Task> {
        self.tasks
            .values()
            .find(|task| task.journey == journey && task.external_id == external_id)
    }

    pub fn task_in_journey_mut(
        &mut self,
        journey: JourneyId,
        external_id: &str,
    ) -> Option<&mut Task> {
        self.tasks
            .values_mut()
            .find(|task| task.journey == journey && task.external_id == external_id)
    }

    pub fn root_tasks(&self, journey: JourneyId) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|task| task.journey == journey && task.parent.is_none())
            .collect()
    }

    pub fn children_of(&self, journey: JourneyId, parent_external_id: &str) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|task| {
                task.journey == journey && task.parent.as_deref() == Some(parent_external_id)
            })
            .collect()
    }

    /// Removes a task and its whole subtree, then sweeps assignments and
    /// dependencies that referenced any removed task. Returns false when the
    /// task was not present in the journey (a no-op, not an error).
    pub fn remove_task_cascade(&mut self, journey: JourneyId, external_id: &str) -> bool {
        if self.task_in_journey(journey, external_id).is_none() {
            return false;
        }

        let mut doomed: HashSet<String> = HashSet::new();
        let mut frontier = vec![external_id.to_string()];
        while let Some(id) = frontier.pop() {
            for child in self.children_of(journey, &id) {
                frontier.push(child.external_id.clone());
            }
            doomed.insert(id);
        }

        self.tasks.retain(|_, task| !doomed.contains(&task.external_id));
        self.assignments
            .retain(|_, assignment| !doomed.contains(&assignment.event));
        self.dependencies.retain(|_, dependency| {
            !doomed.contains(&dependency.from_event) && !doomed.contains(&dependency.to_event)
        });
        true
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub fn insert_resource(&mut self, resource: Resource) -> Result<(), DomainError> {
        if self.resource_in_journey(resource.journey, &resource.id).is_some() {
            return Err(DomainError::conflict(format!(
                "resource id '{}' already exists in this journey",
                resource.id
            )));
        }
        let key = self.next_key();
        self.resources.insert(key, resource);
        Ok(())
    }

    pub fn resource_in_journey(&self, journey: JourneyId, id: &str) -> Option<&Resource> {
        self.resources
            .values()
            .find(|resource| resource.journey == journey && resource.id == id)
    }

    pub fn resource_in_journey_mut(
        &mut self,
        journey: JourneyId,
        id: &str,
    ) -> Option<&mut Resource> {
        self.resources
            .values_mut()
            .find(|resource| resource.journey == journey && resource.id == id)
    }

    pub fn remove_resource(&mut self, journey: JourneyId, id: &str) -> bool {
        let before = self.resources.len();
        self.resources
            .retain(|_, resource| !(resource.journey == journey && resource.id == id));
        self.resources.len() != before
    }

    pub fn resources_of(&self, journey: JourneyId) -> Vec<&Resource> {
        self.resources
            .values()
            .filter(|resource| resource.journey == journey)
            .collect()
    }

    // ------------------------------------------------------------------
    // Assignments
    // ------------------------------------------------------------------

    pub fn insert_assignment(&mut self, assignment: Assignment) -> Result<(), DomainError> {
        if self
            .assignment_in_journey(assignment.journey, &assignment.id)
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "assignment id '{}' already exists in this journey",
                assignment.id
            )));
        }
        let key = self.next_key();
        self.assignments.insert(key, assignment);
        Ok(())
    }

    pub fn assignment_in_journey(&self, journey: JourneyId, id: &str) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|assignment| assignment.journey == journey && assignment.id == id)
    }

    pub fn assignment_in_journey_mut(
        &mut self,
        journey: JourneyId,
        id: &str,
    ) -> Option<&mut Assignment> {
        self.assignments
            .values_mut()
            .find(|assignment| assignment.journey == journey && assignment.id == id)
    }

    pub fn remove_assignment(&mut self, journey: JourneyId, id: &str) -> bool {
        let before = self.assignments.len();
        self.assignments
            .retain(|_, assignment| !(assignment.journey == journey && assignment.id == id));
        self.assignments.len() != before
    }

    pub fn assignments_of(&self, journey: JourneyId) -> Vec<&Assignment> {
        self.assignments
            .values()
            .filter(|assignment| assignment.journey == journey)
            .collect()
    }

    // ------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------

    pub fn insert_dependency(&mut self, dependency: Dependency) -> Result<(), DomainError> {
        if self
            .dependency_in_journey(dependency.journey, &dependency.id)
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "dependency id '{}' already exists in this journey",
                dependency.id
            )));
        }
        let key = self.next_key();
        self.dependencies.insert(key, dependency);
        Ok(())
    }

    pub fn dependency_in_journey(&self, journey: JourneyId, id: &str) -> Option<&Dependency> {
        self.dependencies
            .values()
            .find(|dependency| dependency.journey == journey && dependency.id == id)
    }

    pub fn dependency_in_journey_mut(
        &mut self,
        journey: JourneyId,
        id: &str,
    ) -> Option<&mut Dependency> {
        self.dependencies
            .values_mut()
            .find(|dependency| dependency.journey == journey && dependency.id == id)
    }

    pub fn remove_dependency(&mut self, journey: JourneyId, id: &str) -> bool {
        let before = self.dependencies.len();
        self.dependencies
            .retain(|_, dependency| !(dependency.journey == journey && dependency.id == id));
        self.dependencies.len() != before
    }

    pub fn dependencies_of(&self, journey: JourneyId) -> Vec<&Dependency> {
        self.dependencies
            .values()
            .filter(|dependency| dependency.journey == journey)
            .collect()
    }

    pub fn task_count(&self, journey: JourneyId) -> usize {
        self.tasks
            .values()
            .filter(|task| task.journey == journey)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(journey: JourneyId, id: &str, parent: Option<&str>) -> Task {
        let mut task = Task::blank(id.to_string(), journey);
        task.parent = parent.map(str::to_string);
        task
    }

    #[test]
    fn duplicate_external_id_is_a_conflict() {
        let mut state = GanttState::new();
        let journey = state.create_journey("j".into(), "".into(), "".into(), 1);
        state.insert_task(task(journey, "t1", None)).unwrap();

        let err = state.insert_task(task(journey, "t1", None)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn children_come_back_in_creation_order() {
        let mut state = GanttState::new();
        let journey = state.create_journey("j".into(), "".into(), "".into(), 1);
        state.insert_task(task(journey, "root", None)).unwrap();
        for id in ["a", "b", "c"] {
            state.insert_task(task(journey, id, Some("root"))).unwrap();
        }

        let order: Vec<_> = state
            .children_of(journey, "root")
            .iter()
            .map(|t| t.external_id.clone())
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn cascade_removal_takes_subtree_and_references() {
        let mut state = GanttState::new();
        let journey = state.create_journey("j".into(), "".into(), "".into(), 1);
        state.insert_task(task(journey, "root", None)).unwrap();
        state.insert_task(task(journey, "child", Some("root"))).unwrap();
        state
            .insert_task(task(journey, "grandchild", Some("child")))
            .unwrap();
        state.insert_task(task(journey, "bystander", None)).unwrap();

        state
            .insert_resource(Resource {
                id: "r1".into(),
                name: "Coordinator".into(),
                role: "agency".into(),
                journey,
            })
            .unwrap();
        state
            .insert_assignment(Assignment {
                id: "a1".into(),
                resource_id: "r1".into(),
                event: "grandchild".into(),
                journey,
            })
            .unwrap();
        state
            .insert_dependency(Dependency {
                id: "d1".into(),
                from_event: "child".into(),
                to_event: "bystander".into(),
                lag: 0,
                journey,
            })
            .unwrap();

        assert!(state.remove_task_cascade(journey, "root"));

        assert_eq!(state.task_count(journey), 1);
        assert!(state.task_in_journey(journey, "bystander").is_some());
        assert!(state.assignments_of(journey).is_empty());
        assert!(state.dependencies_of(journey).is_empty());
    }

    #[test]
    fn removing_missing_task_is_a_noop() {
        let mut state = GanttState::new();
        let journey = state.create_journey("j".into(), "".into(), "".into(), 1);
        assert!(!state.remove_task_cascade(journey, "ghost"));
    }

    #[test]
    fn resource_ids_are_scoped_per_journey() {
        let mut state = GanttState::new();
        let first = state.create_journey("a".into(), "".into(), "".into(), 1);
        let second = state.create_journey("b".into(), "".into(), "".into(), 2);

        let resource = |journey| Resource {
            id: "r1".into(),
            name: "Clinic".into(),
            role: "clinic".into(),
            journey,
        };
        state.insert_resource(resource(first)).unwrap();
        state.insert_resource(resource(second)).unwrap();

        assert!(state.remove_resource(first, "r1"));
        assert!(state.resource_in_journey(first, "r1").is_none());
        assert!(state.resource_in_journey(second, "r1").is_some());
    }
}
