//! Storage module for file management
//!
//! Provides local filesystem storage for uploaded files and their
//! generated derivatives, with collision-safe naming.

mod local_storage;

pub use local_storage::{split_extension, LocalStorage, StorageError};
