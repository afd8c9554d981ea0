//! Skins
//!
//! A skin draws themed "chunks" for an (item, state) pair into a
//! rectangle and supplies the metrics layout uses for framed controls.

use crate::config::SkinConfig;
use crate::controls::LayoutMetrics;
use crate::foundation::math::{color_from_array, Color, Rect};
use super::RenderInterface;
use std::collections::HashMap;

/// Skinnable element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkinItem {
    /// Window background
    Window,
    /// Button frame
    Button,
    /// Custom control frame
    Custom,
}

/// Visual state of a skinnable element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkinState {
    /// Normal resting state
    #[default]
    Normal,
    /// Pointer is over the element
    Hovered,
    /// Element is being pressed
    Pressed,
    /// Element is disabled
    Disabled,
}

/// Theme used when painting the control tree
pub trait Skin: Send + Sync {
    /// Draw the chunk for `item` in `state` over `rect`
    fn render_chunk(&self, item: SkinItem, state: SkinState, rect: Rect, out: &mut dyn RenderInterface);

    /// Colour for text drawn on top of an element in `state`
    fn text_color(&self, state: SkinState) -> Color;

    /// Metrics layout uses for framed controls
    fn metrics(&self) -> LayoutMetrics;
}

/// Fill and border of one chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk {
    /// Interior colour
    pub fill: Color,
    /// Frame colour
    pub border: Color,
    /// Frame width in pixels (0 = no frame)
    pub border_width: f32,
}

/// Skin made of solid chunks with an optional border
#[derive(Debug, Clone)]
pub struct FlatSkin {
    chunks: HashMap<(SkinItem, SkinState), Chunk>,
    text: Color,
    disabled_text: Color,
    metrics: LayoutMetrics,
}

impl FlatSkin {
    /// Build the skin from its configuration
    pub fn from_config(config: &SkinConfig) -> Self {
        let border = color_from_array(config.border_color);
        let framed = |fill: [f32; 4]| Chunk {
            fill: color_from_array(fill),
            border,
            border_width: config.border_width,
        };

        let mut chunks = HashMap::new();
        chunks.insert(
            (SkinItem::Window, SkinState::Normal),
            Chunk {
                fill: color_from_array(config.window_background),
                border,
                border_width: 0.0,
            },
        );
        chunks.insert((SkinItem::Button, SkinState::Normal), framed(config.button_normal));
        chunks.insert((SkinItem::Button, SkinState::Hovered), framed(config.button_hovered));
        chunks.insert((SkinItem::Button, SkinState::Pressed), framed(config.button_pressed));
        chunks.insert((SkinItem::Button, SkinState::Disabled), framed(config.button_disabled));
        chunks.insert((SkinItem::Custom, SkinState::Normal), framed(config.custom_fill));

        Self {
            chunks,
            text: color_from_array(config.text_color),
            disabled_text: color_from_array(config.disabled_text_color),
            metrics: LayoutMetrics {
                line_height: config.line_height,
                padding: config.padding,
                ..LayoutMetrics::default()
            },
        }
    }

    /// Override one chunk
    pub fn set_chunk(&mut self, item: SkinItem, state: SkinState, chunk: Chunk) {
        self.chunks.insert((item, state), chunk);
    }

    /// Chunk for `(item, state)`, falling back to the item's normal state
    pub fn chunk(&self, item: SkinItem, state: SkinState) -> Option<&Chunk> {
        self.chunks
            .get(&(item, state))
            .or_else(|| self.chunks.get(&(item, SkinState::Normal)))
    }
}

impl Default for FlatSkin {
    fn default() -> Self {
        Self::from_config(&SkinConfig::default())
    }
}

impl Skin for FlatSkin {
    fn render_chunk(&self, item: SkinItem, state: SkinState, rect: Rect, out: &mut dyn RenderInterface) {
        let Some(chunk) = self.chunk(item, state) else {
            return;
        };
        if chunk.border_width > 0.0 {
            out.draw_rect(rect, chunk.border);
            out.draw_rect(rect.inset(chunk.border_width), chunk.fill);
        } else {
            out.draw_rect(rect, chunk.fill);
        }
    }

    fn text_color(&self, state: SkinState) -> Color {
        match state {
            SkinState::Disabled => self.disabled_text,
            _ => self.text,
        }
    }

    fn metrics(&self) -> LayoutMetrics {
        self.metrics
    }
}
