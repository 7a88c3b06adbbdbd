//! Data models for receipts and pipeline configuration.

pub mod config;
pub mod invoice;
