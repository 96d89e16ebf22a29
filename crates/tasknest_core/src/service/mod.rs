//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep outer surfaces (CLI, UI bindings) decoupled from storage details.

pub mod bucket_service;
pub mod task_service;
