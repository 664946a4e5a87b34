//! Synchronization core
//!
//! Keeps a cached, filtered, paginated view of cleaning tasks in step with
//! the remote service while mutations are applied optimistically.

mod cache;
mod executor;
mod guard;
mod query;
mod selection;
mod session;
mod signature;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStore, FetchSeq, Patched, ReplaceOutcome, RestoreOutcome, Snapshot};
pub use executor::MutationExecutor;
pub use guard::BusySet;
pub use query::{Freshness, QueryController, SortDirection, SortKey, SortSpec};
pub use selection::SelectionSet;
pub use session::{TaskListSession, TaskListView};
pub use signature::{DateRange, FilterPatch, FilterSignature, TaskFilter};
