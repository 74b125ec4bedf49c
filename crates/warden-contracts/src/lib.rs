//! # warden-contracts
//!
//! Shared types, schemas, and contracts for the WARDEN orchestration engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate beyond the tool-call state machine, which must travel with the
//! `ToolCall` type so no other crate can bypass it.

pub mod agent;
pub mod audit;
pub mod error;
pub mod permission;
pub mod run;
pub mod schema;
pub mod tool;
