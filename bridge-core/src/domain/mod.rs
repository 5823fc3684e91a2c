//! Core domain types
//!
//! This module contains the domain structures shared between the server
//! (for persistence) and the client/CLI (for display).

pub mod aggregate;
pub mod deployment;
pub mod step;

pub use aggregate::{aggregate, aggregate_statuses};
pub use deployment::{Deployment, DeploymentStatus};
pub use step::{DeploymentStep, StepName, StepStatus};
