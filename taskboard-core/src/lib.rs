//! Domain model, validation, persistence and services for taskboard.
//!
//! The HTTP surface lives in `taskboard-server`; everything here is usable
//! without it, which is how the integration tests drive the services.

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{Authenticator, RequestCredentials, SessionAuthenticator};
pub use db::Db;
pub use error::{Error, Result};
pub use models::*;
pub use service::{SubtaskService, TaskService, WorkspaceService};
pub use validation::{FieldError, Validate, ValidationErrors, validate};
