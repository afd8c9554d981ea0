//! Layout calculations
//!
//! Measures controls and stacks vertical-grid rows inside a rectangle.
//! Planes never subdivide space; each of their children gets the plane's
//! full rectangle.

use super::children::{Children, Collapse};
use super::{ControlId, ControlKind, ControlTree, Extent};
use crate::foundation::math::Rect;

/// Sizes the skin imposes on layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Height of one line of text
    pub line_height: f32,
    /// Space between a framed control's edge and its content
    pub padding: f32,
    /// Height used for a custom control with no content
    pub custom_height: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            padding: 4.0,
            custom_height: 24.0,
        }
    }
}

/// Layout calculator for the control tree
pub struct Layout;

impl Layout {
    /// Height `id` needs when its requested height is `Fit`
    pub fn measure_height(tree: &ControlTree, id: ControlId, metrics: &LayoutMetrics) -> f32 {
        let Some(node) = tree.node(id) else {
            return 0.0;
        };
        if let Extent::Fixed(height) = node.control.size.height {
            return height;
        }
        match (&node.control.kind, &node.children) {
            (ControlKind::Text(_), _) => metrics.line_height,
            (ControlKind::Plane, Children::Unordered(ids)) => ids
                .iter()
                .map(|child| Self::measure_height(tree, *child, metrics))
                .fold(0.0, f32::max),
            (ControlKind::VerticalGrid, Children::Ordered(ids)) => ids
                .iter()
                .map(|child| Self::measure_height(tree, *child, metrics))
                .sum(),
            (kind, Children::Collapsing(collapse)) => {
                let content = match collapse {
                    Collapse::Empty if matches!(kind, ControlKind::Custom(_)) => {
                        metrics.custom_height
                    }
                    Collapse::Empty => metrics.line_height,
                    Collapse::Single(child) | Collapse::Grid(child) => {
                        Self::measure_height(tree, *child, metrics)
                    }
                };
                content + metrics.padding * 2.0
            }
            _ => 0.0,
        }
    }

    /// Split `area` into one row per child, top to bottom
    ///
    /// `Fixed` rows keep their height, `Fit` rows get their measured
    /// height and `Max` rows share whatever is left equally. Rows that run
    /// past the bottom edge are kept; clipping is the renderer's job.
    pub fn stack_vertical(
        tree: &ControlTree,
        children: &[ControlId],
        area: Rect,
        metrics: &LayoutMetrics,
    ) -> Vec<(ControlId, Rect)> {
        let mut heights = Vec::with_capacity(children.len());
        let mut used = 0.0;
        let mut flexible = 0_u16;

        for child in children {
            let Some(node) = tree.node(*child) else {
                heights.push(None);
                continue;
            };
            let height = match node.control.size.height {
                Extent::Fixed(height) => Some(height),
                Extent::Fit => Some(Self::measure_height(tree, *child, metrics)),
                Extent::Max => None,
            };
            match height {
                Some(height) => used += height,
                None => flexible += 1,
            }
            heights.push(height);
        }

        let share = if flexible == 0 {
            0.0
        } else {
            (area.height() - used).max(0.0) / f32::from(flexible)
        };

        let mut y = area.y();
        children
            .iter()
            .zip(heights)
            .map(|(child, height)| {
                let height = height.unwrap_or(share);
                let width = Self::resolve_width(tree, *child, area.width());
                let row = Rect::new(area.x(), y, width, height);
                y += height;
                (*child, row)
            })
            .collect()
    }

    /// Width of `id` inside a parent `available` pixels wide
    pub fn resolve_width(tree: &ControlTree, id: ControlId, available: f32) -> f32 {
        match tree.control(id).map(|control| control.size.width) {
            Some(Extent::Fixed(width)) => width.min(available),
            _ => available,
        }
    }
}
