//! Core library components.
//!
//! Everything that touches the host lives here: key validation, ownership
//! and mode enforcement, account and sudo management, and the engine that
//! orchestrates them. Nothing here prints; the CLI renders results.

pub mod account;
pub mod config;
pub mod constants;
pub mod engine;
pub mod keys;
pub mod perms;
pub mod repo;
pub mod source;
pub mod sudo;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
