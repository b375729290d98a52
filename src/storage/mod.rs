pub mod state;
pub mod store;

pub use state::GanttState;
pub use store::JourneyStore;
