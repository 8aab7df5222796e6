//! Owner-scoped business operations on top of [`Db`](crate::Db).
//!
//! Persistence reports absence as `None`/`false`; the services turn that into
//! [`Error::NotFound`](crate::Error::NotFound) so callers see one taxonomy.

mod subtasks;
mod tasks;
mod workspaces;

pub use subtasks::SubtaskService;
pub use tasks::TaskService;
pub use workspaces::{WorkspaceService, generate_share_token};
