//! Test helper modules for integration tests

#![allow(dead_code)]

pub mod sync_harness;

pub use sync_harness::*;
