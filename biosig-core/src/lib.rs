//! Shared error types and numeric helpers for the `biosig` signal engine.
#![no_std]

extern crate alloc;

mod error;
pub use error::*;

/// Small numpy-style helpers shared across crates.
pub mod num_rs;
