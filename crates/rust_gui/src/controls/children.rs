//! Child-hosting policies
//!
//! Every node in the tree carries one [`Children`] policy chosen from its
//! kind when it is created. Sequences (`Unordered` for planes, `Ordered`
//! for vertical grids) hold child ids directly. `Collapsing` is the
//! Empty/Single/Grid adapter used by buttons and custom controls; the
//! promotion and demotion that touch the arena live in
//! [`ControlTree`](super::ControlTree).

use super::{ControlId, ControlKind, Index};

/// State of a collapsing adapter, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollapseState {
    /// No child
    Empty,
    /// Exactly one directly owned child
    Single,
    /// Children live in an internal vertical grid
    Grid,
}

/// Internal collapsing adapter state
///
/// Never holds a direct child and a grid at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Collapse {
    Empty,
    Single(ControlId),
    Grid(ControlId),
}

impl Collapse {
    pub(crate) const fn state(&self) -> CollapseState {
        match self {
            Self::Empty => CollapseState::Empty,
            Self::Single(_) => CollapseState::Single,
            Self::Grid(_) => CollapseState::Grid,
        }
    }
}

/// How a node hosts children
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Children {
    /// Cannot host children
    Leaf,
    /// Plane: insertion order kept for painting only
    Unordered(Vec<ControlId>),
    /// Vertical grid: order is layout order
    Ordered(Vec<ControlId>),
    /// Button/custom: Empty, Single or Grid
    Collapsing(Collapse),
}

impl Children {
    /// Policy for a freshly created node of `kind`
    pub(crate) const fn for_kind(kind: &ControlKind) -> Self {
        match kind {
            ControlKind::Text(_) => Self::Leaf,
            ControlKind::Plane => Self::Unordered(Vec::new()),
            ControlKind::VerticalGrid => Self::Ordered(Vec::new()),
            ControlKind::Button | ControlKind::Custom(_) => Self::Collapsing(Collapse::Empty),
        }
    }

    /// Ids directly owned by this node, internal grid included
    pub(crate) fn owned(&self) -> Vec<ControlId> {
        match self {
            Self::Leaf | Self::Collapsing(Collapse::Empty) => Vec::new(),
            Self::Unordered(ids) | Self::Ordered(ids) => ids.clone(),
            Self::Collapsing(Collapse::Single(id) | Collapse::Grid(id)) => vec![*id],
        }
    }
}

/// Insert `child` into a sequence at `index`, refusing exact duplicates
pub(crate) fn sequence_insert(ids: &mut Vec<ControlId>, child: ControlId, index: Index) -> bool {
    if ids.contains(&child) {
        return false;
    }
    let position = index.insert_position(ids.len());
    ids.insert(position, child);
    true
}

/// Remove `child` from a sequence
pub(crate) fn sequence_remove(ids: &mut Vec<ControlId>, child: ControlId) -> bool {
    match ids.iter().position(|id| *id == child) {
        Some(position) => {
            ids.remove(position);
            true
        }
        None => false,
    }
}

/// Child named by `index` in a sequence
pub(crate) fn sequence_at(ids: &[ControlId], index: Index) -> Option<ControlId> {
    index.resolve(ids.len()).map(|position| ids[position])
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(count: usize) -> Vec<ControlId> {
        let mut keys: SlotMap<ControlId, ()> = SlotMap::with_key();
        (0..count).map(|_| keys.insert(())).collect()
    }

    #[test]
    fn test_policy_per_kind() {
        assert_eq!(Children::for_kind(&ControlKind::Text("a".into())), Children::Leaf);
        assert_eq!(
            Children::for_kind(&ControlKind::Button),
            Children::Collapsing(Collapse::Empty)
        );
        assert_eq!(Children::for_kind(&ControlKind::Plane), Children::Unordered(Vec::new()));
        assert_eq!(Children::for_kind(&ControlKind::VerticalGrid), Children::Ordered(Vec::new()));
    }

    #[test]
    fn test_sequence_refuses_duplicates() {
        let keys = ids(2);
        let mut sequence = Vec::new();
        assert!(sequence_insert(&mut sequence, keys[0], Index::LAST));
        assert!(!sequence_insert(&mut sequence, keys[0], Index::LAST));
        assert!(sequence_insert(&mut sequence, keys[1], Index::FIRST));
        assert_eq!(sequence, vec![keys[1], keys[0]]);
    }

    #[test]
    fn test_sequence_remove_and_lookup() {
        let keys = ids(3);
        let mut sequence = keys.clone();
        assert_eq!(sequence_at(&sequence, Index::new(1)), Some(keys[1]));
        assert_eq!(sequence_at(&sequence, Index::new(3)), None);
        assert!(sequence_remove(&mut sequence, keys[1]));
        assert!(!sequence_remove(&mut sequence, keys[1]));
        assert_eq!(sequence_at(&sequence, Index::LAST), Some(keys[2]));
    }
}
