//! Task module
//!
//! Cleaning task records, their paginated listings and the typed mutations
//! that can be applied to them.

mod intent;
mod model;
mod page;

pub use intent::{FinalizeRequest, MutationIntent, RemoteCall, TaskUpdate, MAX_NOTES_LEN};
pub use model::*;
pub use page::{CachePage, PageMeta, TaskListResponse, TaskResponse};
