//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the generative provider client and the local file cache.

pub mod provider;
pub mod storage;
