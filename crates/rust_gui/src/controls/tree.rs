//! Control tree
//!
//! Arena of control nodes addressed by [`ControlId`]. A parent owns the
//! children it accepts: removing a child from its parent destroys the
//! child's whole subtree, and every node is freed exactly once.
//!
//! Buttons and custom controls host children through the collapsing
//! adapter:
//!
//! ```text
//!   Empty --add--> Single --add--> Grid (internal VerticalGrid, >= 2 children)
//!     ^              |               |
//!     +---remove-----+               |
//!     +------- remove to zero -------+
//! ```
//!
//! The internal grid is a real node in the arena (so layout and painting
//! treat it like any other vertical grid) but it is never reported as a
//! child: children added through a button report the button as their
//! parent.

use super::children::{self, Children, Collapse, CollapseState};
use super::{Control, ControlKind, ControlSize, Index};
use crate::render::SkinState;
use slotmap::SlotMap;
use thiserror::Error;

slotmap::new_key_type! {
    /// Stable handle to a control in a [`ControlTree`]
    pub struct ControlId;
}

/// Control tree contract violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The id does not name a live control
    #[error("Control {0:?} does not exist")]
    InvalidControl(ControlId),

    /// The parent cannot host children
    #[error("Control {0:?} cannot host children")]
    NotAParent(ControlId),

    /// The child is the parent or one of its ancestors
    #[error("Adding {child:?} to {parent:?} would create a cycle")]
    WouldCycle {
        /// Requested parent
        parent: ControlId,
        /// Requested child
        child: ControlId,
    },

    /// The root plane is owned by the tree itself
    #[error("The root control cannot be attached to a parent")]
    RootNotAttachable,
}

/// A stored control plus its links
#[derive(Debug, Clone)]
pub(crate) struct ControlNode {
    pub(crate) control: Control,
    /// Logical parent; never an internal grid
    pub(crate) parent: Option<ControlId>,
    pub(crate) children: Children,
    /// True for grids created by a collapsing adapter
    pub(crate) internal: bool,
}

impl ControlNode {
    fn new(control: Control) -> Self {
        let children = Children::for_kind(&control.kind);
        Self {
            control,
            parent: None,
            children,
            internal: false,
        }
    }
}

/// Arena-backed tree of controls rooted at a Plane
#[derive(Debug, Clone)]
pub struct ControlTree {
    nodes: SlotMap<ControlId, ControlNode>,
    root: ControlId,
}

impl ControlTree {
    /// Create a tree holding only its root plane
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(ControlNode::new(Control::plane()));
        Self { nodes, root }
    }

    /// The root plane
    pub const fn root(&self) -> ControlId {
        self.root
    }

    /// Number of nodes in the arena, internal grids included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root is left
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Whether `id` names a live control
    pub fn contains(&self, id: ControlId) -> bool {
        self.nodes.contains_key(id)
    }

    /// The control stored under `id`
    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.nodes.get(id).map(|node| &node.control)
    }

    /// Logical parent of `id`, `None` for the root and detached controls
    pub fn parent(&self, id: ControlId) -> Option<ControlId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Create a detached control owned by the tree until it is attached
    pub fn create(&mut self, control: Control) -> ControlId {
        self.nodes.insert(ControlNode::new(control))
    }

    /// Create a control and attach it to `parent` at `index`
    pub fn insert(
        &mut self,
        parent: ControlId,
        control: Control,
        index: Index,
    ) -> Result<ControlId, ControlError> {
        if !self.nodes.contains_key(parent) {
            return Err(ControlError::InvalidControl(parent));
        }
        let child = self.create(control);
        match self.add(parent, child, index) {
            Ok(true) => Ok(child),
            Ok(false) => {
                self.free_subtree(child);
                Err(ControlError::InvalidControl(child))
            }
            Err(err) => {
                self.free_subtree(child);
                Err(err)
            }
        }
    }

    /// Create a button whose content is a single text label
    pub fn insert_button(
        &mut self,
        parent: ControlId,
        label: &str,
        index: Index,
    ) -> Result<ControlId, ControlError> {
        let button = self.insert(parent, Control::button(), index)?;
        self.insert(button, Control::text(label), Index::LAST)?;
        Ok(button)
    }

    /// Attach `child` to `parent` at `index`
    ///
    /// Returns `Ok(false)` when the parent refuses the child: it is already
    /// attached somewhere, including an exact duplicate in this parent.
    pub fn add(
        &mut self,
        parent: ControlId,
        child: ControlId,
        index: Index,
    ) -> Result<bool, ControlError> {
        if !self.nodes.contains_key(parent) {
            log::error!("add: parent {:?} does not exist", parent);
            return Err(ControlError::InvalidControl(parent));
        }
        let Some(child_node) = self.nodes.get(child) else {
            log::error!("add: child {:?} does not exist", child);
            return Err(ControlError::InvalidControl(child));
        };
        if child == self.root {
            return Err(ControlError::RootNotAttachable);
        }
        if child_node.parent.is_some() {
            log::debug!("add: {:?} already has a parent, refusing", child);
            return Ok(false);
        }
        if matches!(self.nodes[parent].children, Children::Leaf) {
            return Err(ControlError::NotAParent(parent));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(ControlError::WouldCycle { parent, child });
        }

        let inserted = self.attach(parent, child, index);
        if inserted {
            self.nodes[child].parent = Some(parent);
        }
        Ok(inserted)
    }

    /// Remove `child` from `parent` and destroy its subtree
    ///
    /// Returns `false` if either id is stale or `child` is not a child of
    /// `parent`.
    pub fn remove(&mut self, parent: ControlId, child: ControlId) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return false;
        }
        if !self.detach(parent, child) {
            return false;
        }
        // Clear the back-reference first so teardown never walks back up
        self.nodes[child].parent = None;
        let destroyed = self.free_subtree(child);
        log::trace!("removed {:?} from {:?}, {} node(s) destroyed", child, parent, destroyed);
        true
    }

    /// Remove the child of `parent` named by `index` and destroy it
    pub fn remove_at(&mut self, parent: ControlId, index: Index) -> bool {
        match self.child_at(parent, index) {
            Some(child) => self.remove(parent, child),
            None => false,
        }
    }

    /// Destroy a control wherever it is: detached, or attached to a parent
    ///
    /// The root cannot be destroyed.
    pub fn destroy(&mut self, id: ControlId) -> bool {
        if id == self.root || !self.nodes.contains_key(id) {
            return false;
        }
        match self.nodes[id].parent {
            Some(parent) => self.remove(parent, id),
            None => {
                if self.nodes[id].internal {
                    return false;
                }
                self.free_subtree(id);
                true
            }
        }
    }

    /// Logical children of `id` in order
    pub fn children(&self, id: ControlId) -> Vec<ControlId> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        match &node.children {
            Children::Leaf | Children::Collapsing(Collapse::Empty) => Vec::new(),
            Children::Unordered(ids) | Children::Ordered(ids) => ids.clone(),
            Children::Collapsing(Collapse::Single(only)) => vec![*only],
            Children::Collapsing(Collapse::Grid(grid)) => self.children(*grid),
        }
    }

    /// Number of logical children of `id`
    pub fn child_count(&self, id: ControlId) -> usize {
        let Some(node) = self.nodes.get(id) else {
            return 0;
        };
        match &node.children {
            Children::Leaf | Children::Collapsing(Collapse::Empty) => 0,
            Children::Unordered(ids) | Children::Ordered(ids) => ids.len(),
            Children::Collapsing(Collapse::Single(_)) => 1,
            Children::Collapsing(Collapse::Grid(grid)) => self.child_count(*grid),
        }
    }

    /// Child of `parent` named by `index`
    pub fn child_at(&self, parent: ControlId, index: Index) -> Option<ControlId> {
        match &self.nodes.get(parent)?.children {
            Children::Leaf | Children::Collapsing(Collapse::Empty) => None,
            Children::Unordered(ids) | Children::Ordered(ids) => children::sequence_at(ids, index),
            Children::Collapsing(Collapse::Single(only)) => index.resolve(1).map(|_| *only),
            Children::Collapsing(Collapse::Grid(grid)) => self.child_at(*grid, index),
        }
    }

    /// State of the collapsing adapter of `id`, if it has one
    pub fn collapse_state(&self, id: ControlId) -> Option<CollapseState> {
        match &self.nodes.get(id)?.children {
            Children::Collapsing(collapse) => Some(collapse.state()),
            _ => None,
        }
    }

    /// Change the requested size of a control
    pub fn set_size(&mut self, id: ControlId, size: ControlSize) -> bool {
        self.nodes.get_mut(id).map_or(false, |node| {
            node.control.size = size;
            true
        })
    }

    /// Change the content of a text control
    pub fn set_text(&mut self, id: ControlId, content: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(ControlNode { control: Control { kind: ControlKind::Text(text), .. }, .. }) => {
                content.clone_into(text);
                true
            }
            _ => false,
        }
    }

    /// Change the visual state passed to the skin
    pub fn set_state(&mut self, id: ControlId, state: SkinState) -> bool {
        self.nodes.get_mut(id).map_or(false, |node| {
            node.control.state = state;
            true
        })
    }

    pub(crate) fn node(&self, id: ControlId) -> Option<&ControlNode> {
        self.nodes.get(id)
    }

    /// True if `ancestor` is on the logical parent chain of `id`
    fn is_ancestor(&self, ancestor: ControlId, id: ControlId) -> bool {
        let mut current = self.nodes.get(id).and_then(|node| node.parent);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.nodes.get(candidate).and_then(|node| node.parent);
        }
        false
    }

    /// Variant-specific insertion; does not touch the child's parent link
    fn attach(&mut self, parent: ControlId, child: ControlId, index: Index) -> bool {
        match &mut self.nodes[parent].children {
            Children::Leaf => false,
            Children::Unordered(ids) | Children::Ordered(ids) => {
                children::sequence_insert(ids, child, index)
            }
            Children::Collapsing(Collapse::Empty) => {
                self.nodes[parent].children = Children::Collapsing(Collapse::Single(child));
                true
            }
            Children::Collapsing(Collapse::Single(existing)) => {
                let existing = *existing;
                let grid = self.promote(parent, existing);
                self.attach(grid, child, index)
            }
            Children::Collapsing(Collapse::Grid(grid)) => {
                let grid = *grid;
                self.attach(grid, child, index)
            }
        }
    }

    /// Move a Single adapter's child into a new internal grid
    fn promote(&mut self, owner: ControlId, existing: ControlId) -> ControlId {
        let mut grid_node = ControlNode::new(Control::vertical_grid());
        grid_node.parent = Some(owner);
        grid_node.internal = true;
        let grid = self.nodes.insert(grid_node);

        // The single child sits at position 0 of the new grid
        self.attach(grid, existing, Index::FIRST);
        self.nodes[owner].children = Children::Collapsing(Collapse::Grid(grid));
        log::trace!("promoted {:?} to grid {:?}", owner, grid);
        grid
    }

    /// Variant-specific removal; does not touch the child's parent link
    fn detach(&mut self, parent: ControlId, child: ControlId) -> bool {
        match &mut self.nodes[parent].children {
            Children::Leaf | Children::Collapsing(Collapse::Empty) => false,
            Children::Unordered(ids) | Children::Ordered(ids) => children::sequence_remove(ids, child),
            Children::Collapsing(Collapse::Single(only)) => {
                if *only != child {
                    return false;
                }
                self.nodes[parent].children = Children::Collapsing(Collapse::Empty);
                true
            }
            Children::Collapsing(Collapse::Grid(grid)) => {
                let grid = *grid;
                if !self.detach(grid, child) {
                    return false;
                }
                if self.child_count(grid) == 0 {
                    self.nodes.remove(grid);
                    self.nodes[parent].children = Children::Collapsing(Collapse::Empty);
                    log::trace!("collapsed {:?} back to empty", parent);
                }
                true
            }
        }
    }

    /// Free `id` and everything it owns; returns the number of nodes freed
    fn free_subtree(&mut self, id: ControlId) -> usize {
        let mut pending = vec![id];
        let mut freed = 0;
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(current) {
                pending.extend(node.children.owned());
                freed += 1;
            } else {
                log::warn!("control {:?} was already destroyed", current);
            }
        }
        freed
    }
}

impl Default for ControlTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_button() -> (ControlTree, ControlId) {
        let mut tree = ControlTree::new();
        let root = tree.root();
        let button = tree.insert(root, Control::button(), Index::LAST).unwrap();
        (tree, button)
    }

    #[test]
    fn test_empty_to_single_to_grid() {
        let (mut tree, button) = tree_with_button();
        assert_eq!(tree.collapse_state(button), Some(CollapseState::Empty));

        let x = tree.insert(button, Control::text("x"), Index::LAST).unwrap();
        assert_eq!(tree.collapse_state(button), Some(CollapseState::Single));
        assert_eq!(tree.children(button), vec![x]);

        let y = tree.insert(button, Control::text("y"), Index::LAST).unwrap();
        assert_eq!(tree.collapse_state(button), Some(CollapseState::Grid));
        assert_eq!(tree.children(button), vec![x, y]);
        assert_eq!(tree.parent(x), Some(button));
        assert_eq!(tree.parent(y), Some(button));
    }

    #[test]
    fn test_grid_drains_to_empty() {
        let (mut tree, button) = tree_with_button();
        let x = tree.insert(button, Control::text("x"), Index::LAST).unwrap();
        let y = tree.insert(button, Control::text("y"), Index::LAST).unwrap();

        assert!(tree.remove(button, x));
        assert_eq!(tree.collapse_state(button), Some(CollapseState::Grid));
        assert_eq!(tree.children(button), vec![y]);

        assert!(tree.remove(button, y));
        assert_eq!(tree.collapse_state(button), Some(CollapseState::Empty));
        assert!(!tree.contains(x));
        assert!(!tree.contains(y));
    }

    #[test]
    fn test_no_grid_leaks_after_any_sequence() {
        let (mut tree, button) = tree_with_button();
        let baseline = tree.len();

        let a = tree.insert(button, Control::text("a"), Index::LAST).unwrap();
        let b = tree.insert(button, Control::text("b"), Index::FIRST).unwrap();
        let c = tree.insert(button, Control::text("c"), Index::new(1)).unwrap();
        assert!(tree.remove(button, b));
        let d = tree.insert(button, Control::text("d"), Index::LAST).unwrap();
        assert!(tree.remove_at(button, Index::FIRST));
        assert!(tree.remove(button, a));
        assert!(tree.remove(button, d));
        assert!(!tree.contains(c));

        assert_eq!(tree.collapse_state(button), Some(CollapseState::Empty));
        assert_eq!(tree.len(), baseline);
    }

    #[test]
    fn test_promotion_matches_direct_grid_order() {
        let (mut tree, button) = tree_with_button();
        let root = tree.root();
        let grid = tree.insert(root, Control::vertical_grid(), Index::LAST).unwrap();

        let a1 = tree.insert(button, Control::text("a"), Index::LAST).unwrap();
        let b1 = tree.insert(button, Control::text("b"), Index::FIRST).unwrap();
        let a2 = tree.insert(grid, Control::text("a"), Index::LAST).unwrap();
        let b2 = tree.insert(grid, Control::text("b"), Index::FIRST).unwrap();

        let via_adapter: Vec<_> = tree
            .children(button)
            .into_iter()
            .map(|id| tree.control(id).unwrap().kind.clone())
            .collect();
        let direct: Vec<_> = tree
            .children(grid)
            .into_iter()
            .map(|id| tree.control(id).unwrap().kind.clone())
            .collect();
        assert_eq!(via_adapter, direct);
        assert_eq!(tree.children(button), vec![b1, a1]);
        assert_eq!(tree.children(grid), vec![b2, a2]);
    }

    #[test]
    fn test_remove_from_empty_adapter_is_noop() {
        let (mut tree, button) = tree_with_button();
        let stray = tree.create(Control::text("stray"));
        assert!(!tree.remove(button, stray));
        assert!(!tree.remove_at(button, Index::FIRST));
        assert!(tree.contains(stray));
    }

    #[test]
    fn test_remove_by_index_on_single() {
        let (mut tree, button) = tree_with_button();
        let only = tree.insert(button, Control::text("only"), Index::LAST).unwrap();
        assert!(!tree.remove_at(button, Index::new(1)));
        assert!(tree.contains(only));
        assert!(tree.remove_at(button, Index::LAST));
        assert_eq!(tree.collapse_state(button), Some(CollapseState::Empty));
    }

    #[test]
    fn test_plane_refuses_duplicates_and_bad_indices() {
        let mut tree = ControlTree::new();
        let root = tree.root();
        let label = tree.insert(root, Control::text("a"), Index::LAST).unwrap();

        assert_eq!(tree.add(root, label, Index::LAST), Ok(false));
        assert_eq!(tree.child_count(root), 1);
        assert!(!tree.remove_at(root, Index::new(1)));
        assert!(!tree.remove_at(root, Index::new(-1)));
        assert_eq!(tree.child_count(root), 1);
        assert!(tree.remove_at(root, Index::new(0)));
        assert_eq!(tree.child_count(root), 0);
    }

    #[test]
    fn test_contract_violations() {
        let mut tree = ControlTree::new();
        let root = tree.root();
        let label = tree.insert(root, Control::text("leaf"), Index::LAST).unwrap();
        let stale = tree.create(Control::button());
        assert!(tree.destroy(stale));

        assert_eq!(
            tree.add(root, stale, Index::LAST),
            Err(ControlError::InvalidControl(stale))
        );
        let orphan = tree.create(Control::button());
        assert_eq!(tree.add(label, orphan, Index::LAST), Err(ControlError::NotAParent(label)));
        assert_eq!(tree.add(orphan, root, Index::LAST), Err(ControlError::RootNotAttachable));
        assert_eq!(
            tree.add(orphan, orphan, Index::LAST),
            Err(ControlError::WouldCycle { parent: orphan, child: orphan })
        );
    }

    #[test]
    fn test_cycle_through_descendant() {
        let mut tree = ControlTree::new();
        let outer = tree.create(Control::vertical_grid());
        let inner = tree.insert(outer, Control::button(), Index::LAST).unwrap();
        assert_eq!(
            tree.add(inner, outer, Index::LAST),
            Err(ControlError::WouldCycle { parent: inner, child: outer })
        );
    }

    #[test]
    fn test_subtree_destroyed_exactly_once() {
        let mut tree = ControlTree::new();
        let root = tree.root();
        let panel = tree.insert(root, Control::vertical_grid(), Index::LAST).unwrap();
        let ok = tree.insert_button(panel, "OK", Index::LAST).unwrap();
        let cancel = tree.insert_button(panel, "Cancel", Index::LAST).unwrap();
        tree.insert(cancel, Control::text("(esc)"), Index::LAST).unwrap();

        let mut descendants = vec![panel];
        let mut frontier = vec![panel];
        while let Some(id) = frontier.pop() {
            for child in tree.children(id) {
                descendants.push(child);
                frontier.push(child);
            }
        }
        // panel, 2 buttons, 3 labels
        assert_eq!(descendants.len(), 6);
        // plus the root and cancel's internal grid
        assert_eq!(tree.len(), 8);

        assert!(tree.remove(root, panel));
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        for id in descendants {
            assert!(!tree.contains(id));
        }
        assert!(!tree.contains(ok));
        assert!(!tree.remove(root, panel));
    }

    #[test]
    fn test_reattach_after_parent_cleared() {
        let mut tree = ControlTree::new();
        let root = tree.root();
        let detached = tree.create(Control::text("floating"));
        assert_eq!(tree.parent(detached), None);
        assert_eq!(tree.add(root, detached, Index::LAST), Ok(true));
        assert_eq!(tree.parent(detached), Some(root));

        let other = tree.insert(root, Control::vertical_grid(), Index::LAST).unwrap();
        assert_eq!(tree.add(other, detached, Index::LAST), Ok(false));
    }

    #[test]
    fn test_destroy_root_refused() {
        let mut tree = ControlTree::new();
        let root = tree.root();
        assert!(!tree.destroy(root));
        assert!(tree.contains(root));
    }

    #[test]
    fn test_set_text_only_on_text() {
        let mut tree = ControlTree::new();
        let root = tree.root();
        let button = tree.insert_button(root, "Go", Index::LAST).unwrap();
        let label = tree.children(button)[0];
        assert!(tree.set_text(label, "Stop"));
        assert_eq!(tree.control(label).unwrap().kind, ControlKind::Text("Stop".into()));
        assert!(!tree.set_text(button, "nope"));
    }
}
