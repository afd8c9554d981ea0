//! Painting the control tree
//!
//! Walks a [`ControlTree`] from a given control and emits draw calls
//! through a [`RenderInterface`]. Runs on the window manager thread when
//! a window receives a paint event.

use super::{RenderInterface, Renderer, Skin, SkinItem, SkinState};
use crate::controls::children::{Children, Collapse};
use crate::controls::{ControlId, ControlKind, ControlTree, Layout, LayoutMetrics};
use crate::foundation::math::Rect;

/// Paint a whole window: background chunk, then the tree from its root
pub fn paint_window(tree: &ControlTree, viewport: Rect, renderer: &mut dyn Renderer, skin: &dyn Skin) {
    renderer.begin_frame(viewport);
    let out = renderer.interface();
    skin.render_chunk(SkinItem::Window, SkinState::Normal, viewport, out);
    paint_tree(tree, tree.root(), viewport, skin, out);
    renderer.end_frame();
}

/// Paint `id` and its subtree into `rect`
pub fn paint_tree(tree: &ControlTree, id: ControlId, rect: Rect, skin: &dyn Skin, out: &mut dyn RenderInterface) {
    let metrics = skin.metrics();
    paint_node(tree, id, rect, skin, &metrics, out);
}

fn paint_node(
    tree: &ControlTree,
    id: ControlId,
    rect: Rect,
    skin: &dyn Skin,
    metrics: &LayoutMetrics,
    out: &mut dyn RenderInterface,
) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let state = node.control.state;

    match (&node.control.kind, &node.children) {
        (ControlKind::Text(text), _) => {
            out.draw_text(text, rect, skin.text_color(state));
        }
        (ControlKind::Plane, Children::Unordered(ids)) => {
            for child in ids {
                paint_node(tree, *child, rect, skin, metrics, out);
            }
        }
        (ControlKind::VerticalGrid, Children::Ordered(ids)) => {
            for (child, row) in Layout::stack_vertical(tree, ids, rect, metrics) {
                paint_node(tree, child, row, skin, metrics, out);
            }
        }
        (kind, Children::Collapsing(collapse)) => {
            let item = if matches!(kind, ControlKind::Custom(_)) {
                SkinItem::Custom
            } else {
                SkinItem::Button
            };
            skin.render_chunk(item, state, rect, out);
            let content = rect.inset(metrics.padding);
            match collapse {
                Collapse::Empty => {}
                Collapse::Single(child) | Collapse::Grid(child) => {
                    paint_node(tree, *child, content, skin, metrics, out);
                }
            }
        }
        (kind, _) => {
            log::warn!("paint: {:?} has an unexpected child policy", kind.control_type());
        }
    }
}
