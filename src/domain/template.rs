//! Static preset template documents.
//!
//! A template is the JSON document a brand-new journey is seeded from: a
//! nested task forest plus flat resource/assignment/dependency lists, all in
//! the scheduling widget's wire vocabulary (camelCase, `rows` envelopes).

use serde::{Deserialize, Serialize};

use crate::domain::gantt::DEFAULT_TASK_STATUS;

/// The `{ "rows": [...] }` envelope the widget wraps every collection in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rows<T> {
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
}

impl<T> Default for Rows<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDocument {
    #[serde(default)]
    pub tasks: Rows<TemplateTask>,
    #[serde(default)]
    pub resources: Rows<TemplateResource>,
    #[serde(default)]
    pub assignments: Rows<TemplateAssignment>,
    #[serde(default)]
    pub dependencies: Rows<TemplateDependency>,
}

impl TemplateDocument {
    /// Total number of task nodes in the forest, children included.
    pub fn task_count(&self) -> usize {
        fn count(tasks: &[TemplateTask]) -> usize {
            tasks.iter().map(|t| 1 + count(&t.children)).sum()
        }
        count(&self.tasks.rows)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default = "default_expanded")]
    pub expanded: bool,
    #[serde(default)]
    pub event_color: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub percent_done: f64,
    #[serde(default)]
    pub children: Vec<TemplateTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAssignment {
    pub resource_id: String,
    pub event_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDependency {
    #[serde(default)]
    pub id: Option<String>,
    pub from_event: String,
    pub to_event: String,
    #[serde(default)]
    pub lag: i64,
}

fn default_expanded() -> bool {
    true
}

fn default_status() -> String {
    DEFAULT_TASK_STATUS.to_string()
}
