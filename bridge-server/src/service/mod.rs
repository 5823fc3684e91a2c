//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between the store and the provisioner.

pub mod deployment;
pub mod locks;

pub use deployment::{DeploymentError, DeploymentService};
