use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::dto::{ProjectEnvelope, SyncRequest};
use crate::application::{reconciler, serializer, template_loader};
use crate::domain::errors::DomainError;
use crate::domain::gantt::MemberId;
use crate::infrastructure::TemplateCatalog;
use crate::storage::JourneyStore;

/// What the load endpoint hands back: the raw template document right after
/// seeding, or the serialized store once a journey exists.
pub enum LoadOutcome {
    Seeded(serde_json::Value),
    Existing(Box<ProjectEnvelope>),
}

#[derive(Clone)]
pub struct GanttService {
    store: Arc<JourneyStore>,
    templates: Arc<TemplateCatalog>,
}

impl GanttService {
    pub fn new(store: Arc<JourneyStore>, templates: Arc<TemplateCatalog>) -> Self {
        Self { store, templates }
    }

    /// Initial load: resolve the member's journey, seeding one from the
    /// preset template when none exists yet.
    pub async fn load(
        &self,
        member: MemberId,
        preset: Option<&str>,
    ) -> Result<LoadOutcome, DomainError> {
        if let Some(journey) = self.store.journey_for_member(member).await {
            let envelope = self
                .store
                .read(|state| serializer::project_envelope(state, &journey))
                .await?;
            return Ok(LoadOutcome::Existing(Box::new(envelope)));
        }

        let template = self.templates.select(preset);
        let document = template.document.clone();
        let raw = template.raw.clone();
        let start_date = Utc::now().date_naive().to_string();
        let journey = self
            .store
            .mutate(move |state| template_loader::seed(state, member, &document, start_date))
            .await?;
        info!(member, journey, preset = preset.unwrap_or("default"), "journey seeded");

        Ok(LoadOutcome::Seeded(raw))
    }

    /// Applies one sync batch for the member's journey, all or nothing.
    pub async fn sync(&self, member: MemberId, batch: SyncRequest) -> Result<(), DomainError> {
        let journey = self
            .store
            .journey_for_member(member)
            .await
            .ok_or_else(|| DomainError::not_found("member has no journey to sync"))?;

        self.store
            .mutate(|state| reconciler::apply_batch(state, journey.id, member, &batch))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> GanttService {
        GanttService::new(
            Arc::new(JourneyStore::new()),
            Arc::new(TemplateCatalog::builtin().expect("builtin template")),
        )
    }

    #[tokio::test]
    async fn first_load_seeds_and_echoes_the_template() {
        let service = service();

        match service.load(5, None).await.unwrap() {
            LoadOutcome::Seeded(raw) => {
                assert!(raw.get("tasks").is_some());
            }
            LoadOutcome::Existing(_) => panic!("expected a seeded journey"),
        }

        match service.load(5, None).await.unwrap() {
            LoadOutcome::Existing(envelope) => {
                assert!(!envelope.tasks.rows.is_empty());
                // Seeded ids carry the member namespace.
                assert!(envelope.tasks.rows[0].id.ends_with('5'));
            }
            LoadOutcome::Seeded(_) => panic!("second load must serialize the store"),
        }
    }

    #[tokio::test]
    async fn sync_without_a_journey_is_not_found() {
        let service = service();
        let err = service.sync(5, SyncRequest::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_batch_commits_nothing() {
        let service = service();
        service.load(5, None).await.unwrap();

        let batch: SyncRequest = serde_json::from_value(json!({
            "tasks": { "added": [ { "$PhantomId": "p1", "name": "kept?" } ] },
            "dependencies": { "added": [
                { "id": "dx", "fromEvent": "p1", "toEvent": "nowhere" }
            ]}
        }))
        .unwrap();

        let err = service.sync(5, batch).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        match service.load(5, None).await.unwrap() {
            LoadOutcome::Existing(envelope) => {
                let mut names = Vec::new();
                fn collect(views: &[crate::application::dto::TaskView], out: &mut Vec<String>) {
                    for view in views {
                        out.push(view.name.clone());
                        collect(&view.children, out);
                    }
                }
                collect(&envelope.tasks.rows, &mut names);
                assert!(!names.contains(&"kept?".to_string()));
            }
            LoadOutcome::Seeded(_) => panic!("journey should exist"),
        }
    }

    #[tokio::test]
    async fn phantom_dependency_survives_via_sync() {
        let service = service();
        service.load(5, None).await.unwrap();

        let batch: SyncRequest = serde_json::from_value(json!({
            "tasks": { "added": [ { "$PhantomId": "p1", "name": "New milestone" } ] },
            "dependencies": { "added": [
                { "id": "dnew", "fromEvent": "p1", "toEvent": "m1" }
            ]}
        }))
        .unwrap();
        service.sync(5, batch).await.unwrap();

        match service.load(5, None).await.unwrap() {
            LoadOutcome::Existing(envelope) => {
                let edge = envelope
                    .dependencies
                    .rows
                    .iter()
                    .find(|d| d.id == "dnew")
                    .expect("persisted dependency");
                assert_eq!(edge.to_event, "m15");
            }
            LoadOutcome::Seeded(_) => panic!("journey should exist"),
        }
    }
}
