use std::sync::Arc;

use crate::application::GanttService;

#[derive(Clone)]
pub struct AppState {
    pub gantt_service: Arc<GanttService>,
}

impl AppState {
    pub fn new(gantt_service: Arc<GanttService>) -> Self {
        Self { gantt_service }
    }
}
