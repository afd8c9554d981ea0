//! Renderer abstraction and the default command-recording renderer
//!
//! The toolkit core only needs a renderer that can be cloned for a new
//! window, loaded on the manager thread, turn bitmaps into textures, and
//! hand out a [`RenderInterface`] for the duration of a frame.

use crate::foundation::math::{Color, Rect};
use slotmap::SlotMap;
use thiserror::Error;

slotmap::new_key_type! {
    /// Opaque handle to a texture owned by a renderer
    pub struct TextureHandle;
}

/// Renderer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Renderer could not be initialised
    #[error("Renderer load failed: {0}")]
    LoadFailed(String),

    /// Bitmap dimensions do not match its pixel buffer
    #[error("Invalid bitmap: {width}x{height} with {len} bytes")]
    InvalidBitmap {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
        /// Actual buffer length
        len: usize,
    },
}

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major RGBA bytes
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a bitmap filled with one RGBA value
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: rgba.repeat(count),
        }
    }

    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// A single draw call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Solid rectangle
    Rect {
        /// Target rectangle
        rect: Rect,
        /// Fill colour
        color: Color,
    },
    /// Textured rectangle
    Texture {
        /// Texture to sample
        texture: TextureHandle,
        /// Target rectangle
        rect: Rect,
        /// Colour multiplied into the texture
        tint: Color,
    },
    /// A run of text
    Text {
        /// Content
        text: String,
        /// Layout box
        rect: Rect,
        /// Text colour
        color: Color,
    },
}

/// Sink for draw calls during a frame
pub trait RenderInterface {
    /// Draw a solid rectangle
    fn draw_rect(&mut self, rect: Rect, color: Color);

    /// Draw a texture stretched over `rect`
    fn draw_texture(&mut self, texture: TextureHandle, rect: Rect, tint: Color);

    /// Draw text laid out in `rect`
    fn draw_text(&mut self, text: &str, rect: Rect, color: Color);
}

/// Backend-agnostic renderer
///
/// Renderers are window-local: each window gets its own instance from
/// [`Renderer::allocate_new`], and all calls on it happen on the window
/// manager thread once the window is loaded.
pub trait Renderer: Send {
    /// Create a fresh, unloaded renderer of the same kind
    fn allocate_new(&self) -> Box<dyn Renderer>;

    /// Acquire backend resources
    fn load(&mut self) -> Result<(), RenderError>;

    /// Whether `load` has succeeded
    fn is_loaded(&self) -> bool;

    /// Start recording a frame covering `viewport`
    fn begin_frame(&mut self, viewport: Rect);

    /// Finish the current frame
    fn end_frame(&mut self);

    /// Draw-call sink for the current frame
    fn interface(&mut self) -> &mut dyn RenderInterface;

    /// Upload a bitmap and return its texture handle
    fn create_texture(&mut self, bitmap: &Bitmap) -> Result<TextureHandle, RenderError>;
}

#[derive(Debug, Clone, Copy)]
struct TextureInfo {
    width: u32,
    height: u32,
}

/// Renderer that records draw calls as [`RenderCommand`]s
///
/// The default renderer for a context. It keeps the commands of the last
/// finished frame so callers (and tests) can inspect what was drawn.
#[derive(Debug, Default)]
pub struct CommandRenderer {
    loaded: bool,
    viewport: Option<Rect>,
    frame: Vec<RenderCommand>,
    last_frame: Vec<RenderCommand>,
    frames: u64,
    textures: SlotMap<TextureHandle, TextureInfo>,
}

impl CommandRenderer {
    /// Create an unloaded renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the last finished frame
    pub fn last_frame(&self) -> &[RenderCommand] {
        &self.last_frame
    }

    /// Number of finished frames
    pub const fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Viewport of the last started frame
    pub const fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    /// Size of a texture created by this renderer
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture).map(|info| (info.width, info.height))
    }
}

impl RenderInterface for CommandRenderer {
    fn draw_rect(&mut self, rect: Rect, color: Color) {
        self.frame.push(RenderCommand::Rect { rect, color });
    }

    fn draw_texture(&mut self, texture: TextureHandle, rect: Rect, tint: Color) {
        if !self.textures.contains_key(texture) {
            log::warn!("draw_texture: unknown texture {:?}, skipping", texture);
            return;
        }
        self.frame.push(RenderCommand::Texture { texture, rect, tint });
    }

    fn draw_text(&mut self, text: &str, rect: Rect, color: Color) {
        self.frame.push(RenderCommand::Text {
            text: text.to_owned(),
            rect,
            color,
        });
    }
}

impl Renderer for CommandRenderer {
    fn allocate_new(&self) -> Box<dyn Renderer> {
        Box::new(Self::new())
    }

    fn load(&mut self) -> Result<(), RenderError> {
        self.loaded = true;
        log::debug!("CommandRenderer loaded");
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn begin_frame(&mut self, viewport: Rect) {
        self.viewport = Some(viewport);
        self.frame.clear();
    }

    fn end_frame(&mut self) {
        self.last_frame = std::mem::take(&mut self.frame);
        self.frames += 1;
        log::trace!("frame {} finished with {} commands", self.frames, self.last_frame.len());
    }

    fn interface(&mut self) -> &mut dyn RenderInterface {
        self
    }

    fn create_texture(&mut self, bitmap: &Bitmap) -> Result<TextureHandle, RenderError> {
        if bitmap.pixels.len() != bitmap.expected_len() {
            return Err(RenderError::InvalidBitmap {
                width: bitmap.width,
                height: bitmap.height,
                len: bitmap.pixels.len(),
            });
        }
        Ok(self.textures.insert(TextureInfo {
            width: bitmap.width,
            height: bitmap.height,
        }))
    }
}
