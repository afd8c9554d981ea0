//! Rendering module
//!
//! Backend-agnostic rendering boundary of the toolkit:
//! - renderer: `Renderer`/`RenderInterface` traits, textures, the default
//!   command-recording renderer
//! - skin: themed chunks and layout metrics
//! - paint: walking the control tree into draw calls

pub mod renderer;
pub mod skin;
pub mod paint;

pub use renderer::{
    Bitmap, CommandRenderer, RenderCommand, RenderError, RenderInterface, Renderer, TextureHandle,
};
pub use skin::{Chunk, FlatSkin, Skin, SkinItem, SkinState};
pub use paint::{paint_tree, paint_window};
