//! Storage abstraction and implementations for waypoint.
//!
//! This crate provides a trait-based persistence interface for targets and
//! their evaluation history, with a JSON-file reference implementation.

#![warn(missing_docs)]

pub mod json_storage;
pub mod trait_;

pub use json_storage::JsonStorage;
pub use trait_::{Result, Storage, StorageError};
