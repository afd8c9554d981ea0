//! Window errors

use crate::platform::PlatformError;
use thiserror::Error;

/// Errors raised by windows and the window manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// The platform failed to start or to create the native window
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A second load reached the manager while one was in flight
    #[error("Window handoff slot already occupied")]
    HandoffOccupied,

    /// The manager thread answered without taking the pending load
    #[error("Window handoff slot not consumed by the manager thread")]
    HandoffNotConsumed,

    /// The manager thread is not running or exited mid-request
    #[error("Window manager thread unavailable")]
    ManagerUnavailable,

    /// The manager thread could not be spawned
    #[error("Failed to spawn window manager thread: {0}")]
    ThreadSpawn(String),

    /// The window was closed
    #[error("Window has been destroyed")]
    Destroyed,
}
