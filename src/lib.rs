//! HalalTrack: halal certification workflow tracker.
//!
//! The binary serves the HTTP API, runs the MCP stdio server, manages
//! accounts and prints board/table/stats views. Domain logic and storage
//! live in `halaltrack-core`.

pub mod ai;
pub mod api;
pub mod config;
pub mod mcp;
pub mod views;

pub use halaltrack_core::{db, models, state, workflow};
