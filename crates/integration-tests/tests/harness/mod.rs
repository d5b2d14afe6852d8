//! Shared fixtures for cross-crate scenarios
//!
//! Each test binary compiles this module separately and uses a subset.

#![allow(dead_code)]

pub mod catalog;
pub mod engine;
pub mod stores;
