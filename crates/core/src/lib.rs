//! Core library for the housekeeping task list
//!
//! This crate contains:
//! - Cleaning task model and typed mutation intents
//! - The remote task service gateway
//! - The optimistic synchronization core (cache, busy guard, query and
//!   selection state)

pub mod config;
pub mod error;
pub mod gateway;
pub mod sync;
pub mod task;

pub use error::{Error, ErrorKind};
pub type Result<T> = std::result::Result<T, Error>;
