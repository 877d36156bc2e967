//! Security Module
//!
//! Secret containers and constant-time helpers.

pub mod secure_memory;

pub use secure_memory::*;
