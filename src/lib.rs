//! # xmlguard
//!
//! XML external entity (XXE) resolution guard. Re-exports the core crate so
//! applications depend on a single name.

pub use xmlguard_core::*;
