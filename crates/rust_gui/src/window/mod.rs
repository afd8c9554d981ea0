//! Window module
//!
//! Portable windows and the thread that owns their native handles:
//! - style: the stable window style bitmask
//! - window: `Window` and its lifecycle
//! - manager: the cross-thread load/unload protocol
//! - error: window errors

pub mod style;
pub mod error;
pub mod manager;
#[allow(clippy::module_inception)]
pub mod window;

pub use style::WindowStyle;
pub use error::WindowError;
pub use manager::WindowManager;
pub use window::{Window, WindowPhase};
