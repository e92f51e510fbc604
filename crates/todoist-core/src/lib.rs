//! Todoist client, caches, and the household GTD operations behind the
//! MCP tools. The taxonomy is deliberately hard-coded to one household's
//! setup; this is not a general-purpose Todoist library.

pub mod cache;
pub mod client;
pub mod directory;
pub mod error;
pub mod filters;
pub mod models;
pub mod service;
pub mod taxonomy;

pub use cache::{DiskCache, TaskNameCache};
pub use client::{IdKind, TodoistClient};
pub use directory::Directory;
pub use error::{Error, Result};
pub use service::{CreateTaskArgs, Todoist, UpdateTaskArgs};
