//! Shared domain model, wire codec, and configuration for the MTC client
//!
//! This crate is pure: no I/O and no async. The `mtc-engine` crate layers
//! the transport and the stateful services on top of these types.

pub mod config;
pub mod dto;
pub mod error;
pub mod models;

pub use error::{Error, Result};
