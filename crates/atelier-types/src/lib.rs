//! Shared domain types for Atelier.
//!
//! This crate contains the core domain types used across the Atelier
//! workshop tracker: workflow catalog definitions, service pipelines, work
//! items with their stage history, activity log records, and engine
//! configuration.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod item;
pub mod workflow;
