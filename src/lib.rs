//! Inbox Copilot - simulated customer messaging workspace
//!
//! A conversation inbox with read tracking, and an assistant panel that
//! answers questions from a canned-response catalog with a staged typing
//! animation.

pub mod clock;
pub mod config;
pub mod copilot;
pub mod draft;
pub mod inbox;
pub mod runtime;
pub mod state_machine;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use workspace::{Workspace, WorkspaceError};
