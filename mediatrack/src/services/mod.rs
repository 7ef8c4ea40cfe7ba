//! Services module
//!
//! Business logic that coordinates between the presentation layer, the
//! repository and the query cache.

pub mod edit_session;
pub mod entries;
pub mod form;
pub mod progress;
pub mod seed;

pub use edit_session::EditSession;
pub use entries::EntriesService;
pub use form::EntryForm;
pub use progress::{group_by_status, overall_progress, GroupedEntries};
pub use seed::seed_sample_library;
