//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the local file storage and the external image tool integration.

pub mod imaging;
pub mod storage;
