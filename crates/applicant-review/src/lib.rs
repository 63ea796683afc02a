//! Applicant review rounds: intake, reviewer allocation, scoring, and analytics.

pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod repository;
pub mod telemetry;
pub mod workflows;
