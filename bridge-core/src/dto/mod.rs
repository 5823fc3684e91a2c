//! Data Transfer Objects
//!
//! Request and response bodies of the Bridge HTTP API. The server produces
//! them, the client crate consumes them.

pub mod callback;
pub mod deployment;
pub mod health;
