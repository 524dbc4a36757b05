//! State module for the crawl's two lifecycles
//!
//! # Components
//!
//! - `TaskState`: lifecycle of a single fetch task (started, running, done, failed)
//! - `CoordinatorState`: lifecycle of the coordinator (idle, active, stopped)

mod coordinator_state;
mod task_state;

// Re-export main types
pub use coordinator_state::CoordinatorState;
pub use task_state::TaskState;
