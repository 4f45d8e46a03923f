//! Core library for the workforce portal's posting and application lifecycle.
//!
//! The [`lifecycle`] module owns the domain model and the transition
//! authority; [`config`], [`telemetry`], and [`error`] carry the ambient
//! concerns shared with the API service.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod telemetry;
