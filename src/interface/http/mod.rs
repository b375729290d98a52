pub mod gantt_handler;
pub mod problem;
