// Infrastructure (shared components)
pub mod config;
pub mod error;
pub mod telemetry;

// Domain
pub mod catalog;
pub mod template;
pub mod validation;
