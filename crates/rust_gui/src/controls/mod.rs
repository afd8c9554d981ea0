//! Control tree module
//!
//! Architecture:
//! - index: child addressing (ordinal with first/last sentinels, or cell)
//! - control: control kinds, type tags and requested sizes
//! - children: per-node hosting policies, including the collapsing adapter
//! - tree: arena that owns every control and enforces parent ownership
//! - layout: measuring and vertical stacking

pub mod index;
pub mod control;
pub mod children;
pub mod tree;
pub mod layout;

pub use index::{Index, IndexType};
pub use control::{Control, ControlKind, ControlSize, ControlType, Extent};
pub use children::CollapseState;
pub use tree::{ControlError, ControlId, ControlTree};
pub use layout::{Layout, LayoutMetrics};
