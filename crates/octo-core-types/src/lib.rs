//! Core types shared across octocore facilities
//!
//! This crate provides the foundational constants used by both the error
//! facility and the logging facility:
//!
//! - **Schema constants**: Canonical field keys and event names

pub mod schema;
