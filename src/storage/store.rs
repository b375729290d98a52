use tokio::sync::RwLock;

use crate::domain::errors::DomainError;
use crate::domain::gantt::{Journey, MemberId};
use crate::storage::state::GanttState;

/// Shared handle over the entity store.
///
/// Writers stage their changes on a clone of the state and the clone is only
/// swapped in when the whole mutation succeeds, so a failed batch (or a
/// failed seed) leaves nothing behind. The write lock also serializes
/// concurrent batches, which covers the "no two batches for the same journey
/// interleave" requirement with room to spare.
#[derive(Debug, Default)]
pub struct JourneyStore {
    state: RwLock<GanttState>,
}

impl JourneyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read<T>(&self, f: impl FnOnce(&GanttState) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    /// Runs `f` against a staged copy of the state; commits only on `Ok`.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut GanttState) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let value = f(&mut staged)?;
        *state = staged;
        Ok(value)
    }

    pub async fn journey_for_member(&self, member: MemberId) -> Option<Journey> {
        self.read(|state| state.journey_for_member(member).cloned())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gantt::Task;

    #[tokio::test]
    async fn failed_mutation_leaves_state_untouched() {
        let store = JourneyStore::new();

        let journey = store
            .mutate(|state| {
                let journey = state.create_journey("j".into(), "".into(), "".into(), 7);
                state.insert_task(Task::blank("keep".into(), journey))?;
                Ok(journey)
            })
            .await
            .unwrap();

        let result = store
            .mutate(|state| {
                state.insert_task(Task::blank("doomed".into(), journey))?;
                Err::<(), _>(DomainError::not_found("forced failure"))
            })
            .await;
        assert!(result.is_err());

        let (kept, doomed) = store
            .read(|state| {
                (
                    state.task_in_journey(journey, "keep").is_some(),
                    state.task_in_journey(journey, "doomed").is_some(),
                )
            })
            .await;
        assert!(kept);
        assert!(!doomed);
    }

    #[tokio::test]
    async fn resolver_returns_first_journey_or_none() {
        let store = JourneyStore::new();
        assert!(store.journey_for_member(1).await.is_none());

        store
            .mutate(|state| {
                state.create_journey("first".into(), "".into(), "".into(), 1);
                state.create_journey("second".into(), "".into(), "".into(), 1);
                Ok(())
            })
            .await
            .unwrap();

        let journey = store.journey_for_member(1).await.expect("journey");
        assert_eq!(journey.title, "first");
    }
}
