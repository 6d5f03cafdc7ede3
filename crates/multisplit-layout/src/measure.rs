//! Preferred-size resolution.
//!
//! A leaf or divider measures as its bound widget's preferred size (zero when
//! unbound). A split sums its children along its main axis and takes the
//! largest child across it. Nothing here touches node bounds.

use multisplit_core::Size;
use rustc_hash::FxHashMap;

use crate::node::{NodeId, Orientation, SplitNodeKind, SplitTree};
use crate::widget::{SplitWidget, WidgetTable};

/// Preferred size of one node, recomputed from scratch.
#[must_use]
pub fn preferred_size<W: SplitWidget>(
    tree: &SplitTree,
    widgets: &WidgetTable<W>,
    id: NodeId,
) -> Size {
    let Some(node) = tree.node(id) else {
        return Size::ZERO;
    };
    match node.kind() {
        SplitNodeKind::Leaf(leaf) => widgets.preferred_size(&leaf.name),
        SplitNodeKind::Divider(divider) => widgets.preferred_size(&divider.name),
        SplitNodeKind::Split(branch) => combine(
            branch.orientation,
            branch
                .children
                .iter()
                .map(|child| preferred_size(tree, widgets, *child)),
        ),
    }
}

fn combine(orientation: Orientation, sizes: impl Iterator<Item = Size>) -> Size {
    sizes.fold(Size::ZERO, |acc, size| match orientation {
        Orientation::Row => Size::new(
            acc.width.saturating_add(size.width),
            acc.height.max(size.height),
        ),
        Orientation::Column => Size::new(
            acc.width.max(size.width),
            acc.height.saturating_add(size.height),
        ),
    })
}

/// Preferred sizes for a whole subtree, memoized for one layout pass.
#[derive(Debug, Clone, Default)]
pub struct PreferredSizes {
    sizes: FxHashMap<NodeId, Size>,
}

impl PreferredSizes {
    /// Measure `root` and everything below it in one bottom-up pass.
    #[must_use]
    pub fn measure<W: SplitWidget>(tree: &SplitTree, widgets: &WidgetTable<W>, root: NodeId) -> Self {
        let mut sizes = FxHashMap::default();
        for id in tree.descendants(root).into_iter().rev() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            let size = match node.kind() {
                SplitNodeKind::Leaf(leaf) => widgets.preferred_size(&leaf.name),
                SplitNodeKind::Divider(divider) => widgets.preferred_size(&divider.name),
                SplitNodeKind::Split(branch) => combine(
                    branch.orientation,
                    branch
                        .children
                        .iter()
                        .map(|child| sizes.get(child).copied().unwrap_or_default()),
                ),
            };
            let _ = sizes.insert(id, size);
        }
        Self { sizes }
    }

    /// Memoized size, zero for nodes outside the measured subtree.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Size {
        self.sizes.get(&id).copied().unwrap_or_default()
    }

    /// Memoized size along `orientation`'s main axis.
    #[must_use]
    pub fn main(&self, id: NodeId, orientation: Orientation) -> i32 {
        orientation.size_main(self.get(id))
    }
}
