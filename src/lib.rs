//! Client-side core for a kanban-style project management backend:
//! session storage, a typed resource client, board move reconciliation,
//! and pagination bookkeeping. The `taskdeck` binary wires these into a
//! CLI.

pub mod board;
pub mod client;
pub mod config;
pub mod models;
pub mod page;
pub mod session;
pub mod view;
