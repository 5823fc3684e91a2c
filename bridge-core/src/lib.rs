//! Bridge Core
//!
//! Core types for the Bridge deployment tracking service.
//!
//! This crate contains:
//! - Domain types: Deployment, DeploymentStep and their statuses
//! - Status aggregation: how a deployment's status follows its steps
//! - DTOs: request/response bodies shared by the server, client and CLI

pub mod domain;
pub mod dto;
