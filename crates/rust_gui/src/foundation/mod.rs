//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the toolkit:
//! - Math types (vectors, colours, rectangles)
//! - Synchronization primitives for cross-thread handoff
//! - Logging utilities

pub mod math;
pub mod sync;
pub mod logging;
