//! # Rust GUI
//!
//! Core of a desktop GUI toolkit: a control tree, portable windows and a
//! single thread that owns every native window handle.
//!
//! ## Features
//!
//! - **Control tree**: arena-owned controls with parent ownership, Planes,
//!   vertical grids and the Empty/Single/Grid collapsing child adapter
//! - **Windows**: lazily loaded windows with a stable style bitmask and
//!   minimal native style updates
//! - **Window manager thread**: cross-thread load/unload handoff, native
//!   calls confined to one thread, failures returned to the caller
//! - **Pluggable rendering**: renderer and skin traits with a
//!   command-recording renderer and a flat skin as defaults
//! - **Platforms**: headless backend for tests and tools, GLFW behind the
//!   `glfw-backend` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_gui::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut context, _controller) = Context::headless(ToolkitConfig::default());
//!     let id = context.create_window()?;
//!
//!     let window = context.window_mut(id).ok_or("window missing")?;
//!     window.with_controls(|tree| {
//!         let root = tree.root();
//!         tree.insert_button(root, "OK", Index::LAST)
//!     })?;
//!     window.show()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod controls;
pub mod render;
pub mod platform;
pub mod window;

mod context;

pub use context::{Context, ContextError, WindowId};

/// Common imports for toolkit users
pub mod prelude {
    pub use crate::{
        Context, ContextError, WindowId,
        config::{Config, ConfigError, ManagerConfig, SkinConfig, ToolkitConfig, WindowSettings},
        controls::{
            CollapseState, Control, ControlError, ControlId, ControlKind, ControlSize, ControlTree,
            ControlType, Extent, Index, IndexType,
        },
        foundation::{
            math::{Color, Rect, Vec2, Vec4},
            sync::Semaphore,
        },
        platform::{HeadlessController, HeadlessPlatformFactory, NativeId, PlatformError, PlatformFactory},
        render::{
            Bitmap, CommandRenderer, FlatSkin, RenderCommand, RenderError, RenderInterface, Renderer,
            Skin, SkinItem, SkinState, TextureHandle,
        },
        window::{Window, WindowError, WindowManager, WindowPhase, WindowStyle},
    };

    #[cfg(feature = "glfw-backend")]
    pub use crate::platform::glfw::GlfwPlatformFactory;
}
