//! Wire types for the load/sync endpoints and the preset resolver.
//!
//! The scheduling widget sends record ids as either JSON strings or numbers
//! depending on whether the record was server-loaded or client-created, so
//! everything id-shaped deserializes through [`ClientId`].

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::domain::gantt::{Assignment, Dependency, Resource, TaskPatch};
use crate::domain::preset::MemberRole;
use crate::domain::template::Rows;

/// A client-visible record id: accepts `"t142"` and `42` alike, normalized
/// to its string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ClientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ClientId;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a string or integer record id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ClientId, E> {
                Ok(ClientId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ClientId, E> {
                Ok(ClientId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ClientId, E> {
                Ok(ClientId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

// ----------------------------------------------------------------------
// Load response
// ----------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub name: String,
    pub duration: i64,
    pub percent_done: f64,
    pub expanded: bool,
    pub start_date: String,
    pub end_date: String,
    pub constraint_type: String,
    pub event_color: Option<String>,
    pub status: String,
    pub children: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct ResourceView {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl From<&Resource> for ResourceView {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.clone(),
            name: resource.name.clone(),
            role: resource.role.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub id: String,
    pub resource_id: String,
    pub event_id: String,
}

impl From<&Assignment> for AssignmentView {
    fn from(assignment: &Assignment) -> Self {
        Self {
            id: assignment.id.clone(),
            resource_id: assignment.resource_id.clone(),
            event_id: assignment.event.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyView {
    pub id: String,
    pub from_event: String,
    pub to_event: String,
    pub lag: i64,
}

impl From<&Dependency> for DependencyView {
    fn from(dependency: &Dependency) -> Self {
        Self {
            id: dependency.id.clone(),
            from_event: dependency.from_event.clone(),
            to_event: dependency.to_event.clone(),
            lag: dependency.lag,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub calendar: String,
    pub start_date: String,
}

/// Envelope returned when a journey already exists.
#[derive(Debug, Serialize)]
pub struct ProjectEnvelope {
    pub project: ProjectMeta,
    pub calendars: serde_json::Value,
    pub tasks: Rows<TaskView>,
    pub resources: Rows<ResourceView>,
    pub assignments: Rows<AssignmentView>,
    pub dependencies: Rows<DependencyView>,
}

/// The static working calendar the widget expects alongside project data.
pub fn default_calendars() -> serde_json::Value {
    serde_json::json!({
        "rows": [
            {
                "id": "general",
                "name": "General",
                "intervals": [
                    {
                        "recurrentStartDate": "on Sat at 0:00",
                        "recurrentEndDate": "on Mon at 0:00",
                        "isWorking": true
                    }
                ]
            }
        ]
    })
}

// ----------------------------------------------------------------------
// Sync request
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct SyncRequest {
    #[serde(default)]
    pub tasks: ChangeSet<AddedTask, TaskUpdate>,
    #[serde(default)]
    pub resources: ChangeSet<ResourceRow, ResourceRow>,
    #[serde(default)]
    pub assignments: ChangeSet<AddedAssignment, AssignmentUpdate>,
    #[serde(default)]
    pub dependencies: ChangeSet<AddedDependency, DependencyUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeSet<A, U> {
    #[serde(default = "Vec::new")]
    pub added: Vec<A>,
    #[serde(default = "Vec::new")]
    pub updated: Vec<U>,
    #[serde(default = "Vec::new")]
    pub removed: Vec<RemovedRow>,
}

impl<A, U> Default for ChangeSet<A, U> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RemovedRow {
    pub id: ClientId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedTask {
    #[serde(rename = "$PhantomId", default)]
    pub phantom_id: Option<ClientId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub expanded: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub event_color: Option<String>,
    #[serde(default)]
    pub parent_id: Option<ClientId>,
    #[serde(default)]
    pub percent_done: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub constraint_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub id: ClientId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub expanded: Option<bool>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub percent_done: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub constraint_type: Option<String>,
    // Distinguishes an explicit `"eventColor": null` (clear) from absence.
    #[serde(default, deserialize_with = "double_option")]
    pub event_color: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TaskUpdate {
    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            name: self.name.clone(),
            expanded: self.expanded,
            duration: self.duration,
            percent_done: self.percent_done,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            constraint_type: self.constraint_type.clone(),
            event_color: self.event_color.clone(),
            status: self.status.clone(),
        }
    }
}

/// Resource rows look the same on add and update.
#[derive(Debug, Deserialize)]
pub struct ResourceRow {
    pub id: ClientId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedAssignment {
    pub resource_id: ClientId,
    pub event_id: ClientId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentUpdate {
    pub id: ClientId,
    #[serde(default)]
    pub resource_id: Option<ClientId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedDependency {
    #[serde(default)]
    pub id: Option<ClientId>,
    pub from_event: ClientId,
    pub to_event: ClientId,
    #[serde(default)]
    pub lag: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyUpdate {
    pub id: ClientId,
    #[serde(default)]
    pub from_event: Option<ClientId>,
    #[serde(default)]
    pub lag: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ----------------------------------------------------------------------
// Preset resolution
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PresetRequest {
    pub role: MemberRole,
    pub answers: [String; 3],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetResponse {
    pub preset_id: Option<String>,
    pub template_ready: bool,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
