//! Core library for HalalTrack.
//!
//! This crate provides the certification workflow models, the stage/SLA
//! rules, the view-model state and the database operations, independent of
//! any transport layer (HTTP, MCP, terminal).
//!
//! # Usage
//!
//! ```no_run
//! use chrono::Utc;
//! use halaltrack_core::db::Database;
//! use halaltrack_core::models::*;
//! use halaltrack_core::workflow;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let sla = db.get_sla_config()?;
//! let overdue: Vec<Task> = db
//!     .get_all_tasks()?
//!     .into_iter()
//!     .filter(|task| workflow::is_overdue(task, &sla, Utc::now()))
//!     .collect();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod models;
pub mod state;
pub mod workflow;

// Re-export commonly used types at crate root
pub use db::Database;
pub use state::{reduce, Action, AppState, View};
