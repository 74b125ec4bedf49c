//! # warden-verify
//!
//! Structural validation for the WARDEN runtime.
//!
//! This crate provides [`engine::SubsetValidator`], which implements the
//! [`warden_core::traits::SchemaValidator`] trait, plus the free functions
//! [`engine::validate`] and [`engine::check_schema`] used at catalog load.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use warden_verify::engine::validate;
//!
//! let result = validate(&json!({ "status": "done" }), &task_update_schema);
//! assert!(result.contains("$.taskId: required field missing"));
//! ```

pub mod engine;

pub use engine::{check_schema, validate, SubsetValidator};
