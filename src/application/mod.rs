pub mod dto;
pub mod gantt_service;
pub mod reconciler;
pub mod serializer;
pub mod template_loader;

pub use gantt_service::{GanttService, LoadOutcome};
