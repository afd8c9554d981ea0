//! Platform windowing layer
//!
//! The boundary between the window manager and the operating system's
//! window API.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Window (any thread)          │
//! └──────────────┬───────────────┘
//!                │ load / commands
//!       ┌────────▼────────┐
//!       │ WindowManager   │ ← owns the manager thread
//!       └────────┬────────┘
//!                │ runs on manager thread only
//!       ┌────────▼────────┐
//!       │ dyn Platform    │ ← headless.rs, glfw.rs
//!       └─────────────────┘
//! ```
//!
//! A [`Platform`] is created on the manager thread by a
//! [`PlatformFactory`] and never leaves it, so backends whose handles are
//! not `Send` (GLFW) fit. The only piece that crosses threads is the
//! [`Waker`], which breaks the manager out of its blocking event wait.

pub mod headless;
#[cfg(feature = "glfw-backend")]
pub mod glfw;

pub use headless::{HeadlessController, HeadlessPlatformFactory, NativeOp};

use crate::window::WindowStyle;
use std::sync::Arc;
use thiserror::Error;

/// Identifier of a native window, shared by the manager and the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(pub u64);

/// Everything the platform needs to create a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeWindowDesc {
    /// Registered window class to create the window from
    pub class: String,
    /// Title bar text
    pub title: String,
    /// Client area width
    pub width: u32,
    /// Client area height
    pub height: u32,
    /// Initial decorations
    pub style: WindowStyle,
}

/// Events delivered by the platform's event wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The wait was interrupted by a [`Waker`]
    Wake,
    /// The window needs repainting
    Paint(NativeId),
    /// The client area changed size
    Resized {
        /// Window that changed
        id: NativeId,
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
    /// The user asked to close the window
    CloseRequested(NativeId),
}

/// Platform errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The windowing system could not be initialised
    #[error("Platform initialization failed: {0}")]
    InitializationFailed(String),

    /// Registering the window class failed
    #[error("Window class registration failed: {0}")]
    ClassRegistrationFailed(String),

    /// Creating the native window failed
    #[error("Window creation failed: {0}")]
    CreationFailed(String),

    /// The id does not name a live native window
    #[error("Unknown native window {0:?}")]
    UnknownWindow(NativeId),
}

/// Thread-safe handle that interrupts the platform's event wait
pub trait Waker: Send + Sync {
    /// Make the current or next `wait_events` call return promptly
    fn wake(&self);
}

/// Native windowing backend
///
/// Lives on the window manager thread for its whole life. Every native
/// handle is created, changed and destroyed through this trait on that
/// thread.
pub trait Platform {
    /// Register the class windows are created from
    fn register_window_class(&mut self, name: &str) -> Result<(), PlatformError>;

    /// Unregister a class registered earlier
    fn unregister_window_class(&mut self, name: &str);

    /// Create a hidden native window
    fn create_window(&mut self, id: NativeId, desc: &NativeWindowDesc) -> Result<(), PlatformError>;

    /// Destroy a native window; unknown ids are ignored
    fn destroy_window(&mut self, id: NativeId);

    /// Show or hide a window
    fn set_visible(&mut self, id: NativeId, visible: bool);

    /// Change the title bar text
    fn set_title(&mut self, id: NativeId, title: &str);

    /// Change the client area size
    fn set_size(&mut self, id: NativeId, width: u32, height: u32);

    /// Apply a style change; `changed` holds exactly the bits that flipped
    fn apply_style(&mut self, id: NativeId, style: WindowStyle, changed: WindowStyle);

    /// Block until at least one event is available and append what arrived
    fn wait_events(&mut self, events: &mut Vec<PlatformEvent>);

    /// Interrupt handle for [`Platform::wait_events`]
    fn waker(&self) -> Arc<dyn Waker>;
}

/// Creates the platform on the manager thread
pub trait PlatformFactory: Send + Sync {
    /// Build a fresh platform instance
    fn create(&self) -> Result<Box<dyn Platform>, PlatformError>;
}
