//! Control descriptions
//!
//! A [`Control`] is what a caller hands to the tree: its kind, requested
//! size and visual state. Once inserted, the tree owns it and addresses it
//! by [`ControlId`](super::ControlId).

use crate::render::SkinState;

/// Polymorphic type tag of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlType {
    /// Clickable button; hosts its label through the collapsing adapter
    Button,
    /// Unordered multi-child container, used as a window root
    Plane,
    /// Text label (leaf)
    Text,
    /// Ordered container stacking children top-to-bottom
    VerticalGrid,
    /// Application-defined control drawn by the skin
    Custom,
}

/// Kind-specific data of a control
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// Clickable button
    Button,
    /// Unordered container
    Plane,
    /// Text label with its content
    Text(String),
    /// Vertical stacking container
    VerticalGrid,
    /// Application-defined control, identified by name
    Custom(String),
}

impl ControlKind {
    /// The type tag for this kind
    pub const fn control_type(&self) -> ControlType {
        match self {
            Self::Button => ControlType::Button,
            Self::Plane => ControlType::Plane,
            Self::Text(_) => ControlType::Text,
            Self::VerticalGrid => ControlType::VerticalGrid,
            Self::Custom(_) => ControlType::Custom,
        }
    }
}

/// Requested extent along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    /// Exact size in pixels
    Fixed(f32),
    /// As small as the content allows
    Fit,
    /// As large as the parent allows
    Max,
}

/// Requested size of a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSize {
    /// Horizontal extent
    pub width: Extent,
    /// Vertical extent
    pub height: Extent,
}

impl ControlSize {
    /// Shrink to content on both axes
    pub const FIT: Self = Self { width: Extent::Fit, height: Extent::Fit };
    /// Fill the parent on both axes
    pub const MAX: Self = Self { width: Extent::Max, height: Extent::Max };

    /// Exact size in pixels
    pub const fn fixed(width: f32, height: f32) -> Self {
        Self {
            width: Extent::Fixed(width),
            height: Extent::Fixed(height),
        }
    }

    /// Combine two extents
    pub const fn new(width: Extent, height: Extent) -> Self {
        Self { width, height }
    }
}

/// A control node as stored in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    /// What this control is
    pub kind: ControlKind,
    /// Requested size
    pub size: ControlSize,
    /// Visual state passed to the skin
    pub state: SkinState,
}

impl Control {
    /// Build a control of the given kind with its default size
    pub fn new(kind: ControlKind) -> Self {
        let size = match kind {
            ControlKind::Plane | ControlKind::VerticalGrid => ControlSize::MAX,
            ControlKind::Button | ControlKind::Text(_) | ControlKind::Custom(_) => {
                ControlSize::new(Extent::Max, Extent::Fit)
            }
        };
        Self {
            kind,
            size,
            state: SkinState::Normal,
        }
    }

    /// A button with no content yet
    pub fn button() -> Self {
        Self::new(ControlKind::Button)
    }

    /// An empty plane
    pub fn plane() -> Self {
        Self::new(ControlKind::Plane)
    }

    /// A text label
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(ControlKind::Text(content.into()))
    }

    /// An empty vertical grid
    pub fn vertical_grid() -> Self {
        Self::new(ControlKind::VerticalGrid)
    }

    /// An application-defined control
    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(ControlKind::Custom(name.into()))
    }

    /// Replace the requested size (builder style)
    #[must_use]
    pub fn with_size(mut self, size: ControlSize) -> Self {
        self.size = size;
        self
    }

    /// The type tag
    pub const fn control_type(&self) -> ControlType {
        self.kind.control_type()
    }
}
