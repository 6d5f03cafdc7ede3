//! Split-tree node model.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Parent links are plain ids, so
//! a split and its children never own each other; the arena owns everything.
//!
//! Three node kinds exist:
//!
//! - **Leaf**: names an externally owned widget.
//! - **Divider**: names the separator widget between two siblings.
//! - **Split**: an ordered run of children along one axis, either in the
//!   alternating form `child, divider, child, ...` distributed by weight, or
//!   the binary form `first, divider, second` distributed by a ratio.
//!
//! Construction is bottom-up: create leaves and dividers, group them with
//! [`SplitTree::row`] / [`SplitTree::column`] / [`SplitTree::ratio_split`],
//! then mark the outermost node with [`SplitTree::set_root`].

use std::collections::{BTreeMap, BTreeSet};

use multisplit_core::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::error::SplitModelError;

/// Stable identifier for split-tree nodes.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Lowest valid node ID.
    pub const MIN: Self = Self(1);

    /// Create a node ID, rejecting 0.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    fn checked_next(self) -> Result<Self, SplitModelError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(SplitModelError::NodeIdOverflow)
    }
}

/// Axis along which a split arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Children laid out left to right.
    #[default]
    Row,
    /// Children laid out top to bottom.
    Column,
}

impl Orientation {
    /// Leading coordinate of `rect` along the main axis.
    #[inline]
    #[must_use]
    pub const fn main_start(self, rect: Rect) -> i32 {
        match self {
            Self::Row => rect.x,
            Self::Column => rect.y,
        }
    }

    /// Extent of `rect` along the main axis.
    #[inline]
    #[must_use]
    pub const fn main_extent(self, rect: Rect) -> i32 {
        match self {
            Self::Row => rect.width,
            Self::Column => rect.height,
        }
    }

    /// Trailing (exclusive) coordinate of `rect` along the main axis.
    #[inline]
    #[must_use]
    pub const fn main_end(self, rect: Rect) -> i32 {
        self.main_start(rect).saturating_add(self.main_extent(rect))
    }

    /// Extent of `rect` along the cross axis.
    #[inline]
    #[must_use]
    pub const fn cross_extent(self, rect: Rect) -> i32 {
        match self {
            Self::Row => rect.height,
            Self::Column => rect.width,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size_main(self, size: Size) -> i32 {
        match self {
            Self::Row => size.width,
            Self::Column => size.height,
        }
    }

    /// Pointer coordinate along the main axis.
    #[inline]
    #[must_use]
    pub const fn pointer_main(self, x: i32, y: i32) -> i32 {
        match self {
            Self::Row => x,
            Self::Column => y,
        }
    }

    /// Rectangle starting at `start` with `extent` along the main axis and
    /// covering `area` across it.
    #[inline]
    #[must_use]
    pub const fn span(self, area: Rect, start: i32, extent: i32) -> Rect {
        match self {
            Self::Row => Rect::new(start, area.y, extent, area.height),
            Self::Column => Rect::new(area.x, start, area.width, extent),
        }
    }

    /// `rect` moved so its main-axis leading edge sits at `start`.
    #[inline]
    #[must_use]
    pub const fn with_main_start(self, rect: Rect, start: i32) -> Rect {
        match self {
            Self::Row => Rect::new(start, rect.y, rect.width, rect.height),
            Self::Column => Rect::new(rect.x, start, rect.width, rect.height),
        }
    }
}

/// Ratio of a binary split: share of the free main-axis extent given to the
/// first child, kept inside `[min, max] ⊆ [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatio {
    value: f64,
    min: f64,
    max: f64,
}

impl SplitRatio {
    /// Ratio with the full `[0, 1]` range.
    pub fn new(value: f64) -> Result<Self, SplitModelError> {
        Self::with_range(value, 0.0, 1.0)
    }

    /// Ratio with an explicit range.
    pub fn with_range(value: f64, min: f64, max: f64) -> Result<Self, SplitModelError> {
        let range_ok = (0.0..=1.0).contains(&min) && (0.0..=1.0).contains(&max) && min <= max;
        if !range_ok || !(min..=max).contains(&value) {
            return Err(SplitModelError::InvalidRatio {
                ratio: value,
                min,
                max,
            });
        }
        Ok(Self { value, min, max })
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.value
    }

    #[must_use]
    pub const fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub const fn max(self) -> f64 {
        self.max
    }

    /// Replace the value, rejecting anything outside the range.
    pub fn set(&mut self, value: f64) -> Result<(), SplitModelError> {
        *self = Self::with_range(value, self.min, self.max)?;
        Ok(())
    }

    /// Replace the value, clamping into the range. NaN keeps the old value.
    pub fn set_clamped(&mut self, value: f64) -> f64 {
        if !value.is_nan() {
            self.value = value.clamp(self.min, self.max);
        }
        self.value
    }
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self {
            value: 0.5,
            min: 0.0,
            max: 1.0,
        }
    }
}

/// Leaf payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLeaf {
    /// Name of the widget this leaf lays out.
    pub name: String,
}

/// Divider payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDivider {
    /// Name of the separator widget.
    pub name: String,
}

/// Split payload with child references.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitBranch {
    pub orientation: Orientation,
    pub children: Vec<NodeId>,
    /// `Some` for the binary ratio form.
    pub ratio: Option<SplitRatio>,
}

/// Node payload variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitNodeKind {
    Leaf(SplitLeaf),
    Divider(SplitDivider),
    Split(SplitBranch),
}

/// One arena slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitNodeRecord {
    id: NodeId,
    parent: Option<NodeId>,
    weight: f64,
    bounds: Rect,
    kind: SplitNodeKind,
}

impl SplitNodeRecord {
    fn new(id: NodeId, kind: SplitNodeKind) -> Self {
        Self {
            id,
            parent: None,
            weight: 0.0,
            bounds: Rect::default(),
            kind,
        }
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Copy of the last computed bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    #[must_use]
    pub const fn kind(&self) -> &SplitNodeKind {
        &self.kind
    }

    #[must_use]
    pub const fn is_divider(&self) -> bool {
        matches!(self.kind, SplitNodeKind::Divider(_))
    }

    /// Widget name for leaves and dividers.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            SplitNodeKind::Leaf(leaf) => Some(&leaf.name),
            SplitNodeKind::Divider(divider) => Some(&divider.name),
            SplitNodeKind::Split(_) => None,
        }
    }

    #[must_use]
    pub const fn branch(&self) -> Option<&SplitBranch> {
        match &self.kind {
            SplitNodeKind::Split(branch) => Some(branch),
            _ => None,
        }
    }
}

/// Arena-backed split tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitTree {
    root: Option<NodeId>,
    next_id: NodeId,
    nodes: BTreeMap<NodeId, SplitNodeRecord>,
}

impl Default for SplitTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitTree {
    /// Empty arena without a root.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            next_id: NodeId::MIN,
            nodes: BTreeMap::new(),
        }
    }

    fn insert(&mut self, kind: SplitNodeKind) -> Result<NodeId, SplitModelError> {
        let id = self.next_id;
        self.next_id = id.checked_next()?;
        let _ = self.nodes.insert(id, SplitNodeRecord::new(id, kind));
        Ok(id)
    }

    /// Create a detached leaf.
    pub fn leaf(&mut self, name: impl Into<String>) -> Result<NodeId, SplitModelError> {
        self.insert(SplitNodeKind::Leaf(SplitLeaf { name: name.into() }))
    }

    /// Create a detached divider.
    pub fn divider(&mut self, name: impl Into<String>) -> Result<NodeId, SplitModelError> {
        self.insert(SplitNodeKind::Divider(SplitDivider { name: name.into() }))
    }

    /// Create an alternating split owning `children`.
    ///
    /// The shape rules (three or more children, alternating dividers) are
    /// checked when the tree is installed, not here.
    pub fn split(
        &mut self,
        orientation: Orientation,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, SplitModelError> {
        self.branch(orientation, children.into_iter().collect(), None)
    }

    /// Shorthand for a [`Orientation::Row`] split.
    pub fn row(
        &mut self,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, SplitModelError> {
        self.split(Orientation::Row, children)
    }

    /// Shorthand for a [`Orientation::Column`] split.
    pub fn column(
        &mut self,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, SplitModelError> {
        self.split(Orientation::Column, children)
    }

    /// Create a binary split distributed by `ratio`.
    pub fn ratio_split(
        &mut self,
        orientation: Orientation,
        first: NodeId,
        divider: NodeId,
        second: NodeId,
        ratio: SplitRatio,
    ) -> Result<NodeId, SplitModelError> {
        self.branch(orientation, vec![first, divider, second], Some(ratio))
    }

    fn branch(
        &mut self,
        orientation: Orientation,
        children: Vec<NodeId>,
        ratio: Option<SplitRatio>,
    ) -> Result<NodeId, SplitModelError> {
        let id = self.insert(SplitNodeKind::Split(SplitBranch {
            orientation,
            children: Vec::new(),
            ratio,
        }))?;
        if let Err(err) = self.set_children(id, children) {
            let _ = self.nodes.remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    /// Mark a detached node as the root.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), SplitModelError> {
        let record = self.record(id)?;
        if let Some(parent) = record.parent {
            return Err(SplitModelError::AlreadyAttached { child: id, parent });
        }
        self.root = Some(id);
        Ok(())
    }

    /// Root node ID.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Lookup a node by ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SplitNodeRecord> {
        self.nodes.get(&id)
    }

    /// Iterate nodes in ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &SplitNodeRecord> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn record(&self, id: NodeId) -> Result<&SplitNodeRecord, SplitModelError> {
        self.nodes
            .get(&id)
            .ok_or(SplitModelError::UnknownNode { node: id })
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut SplitNodeRecord, SplitModelError> {
        self.nodes
            .get_mut(&id)
            .ok_or(SplitModelError::UnknownNode { node: id })
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|record| record.parent)
    }

    /// Children of a split; empty for leaves, dividers, and unknown ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .and_then(SplitNodeRecord::branch)
            .map(|branch| branch.children.as_slice())
            .unwrap_or(&[])
    }

    fn sibling(&self, id: NodeId, forward: bool) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|child| *child == id)?;
        if forward {
            siblings.get(index + 1).copied()
        } else {
            index.checked_sub(1).and_then(|i| siblings.get(i).copied())
        }
    }

    /// Next child in the parent's order.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling(id, true)
    }

    /// Previous child in the parent's order.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling(id, false)
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Replace the children of `split`.
    ///
    /// Every new child is checked before anything changes; on error the tree
    /// is untouched. Old children become detached.
    pub fn set_children(
        &mut self,
        split: NodeId,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), SplitModelError> {
        let children: Vec<NodeId> = children.into_iter().collect();
        if self.record(split)?.branch().is_none() {
            return Err(SplitModelError::NotASplit { node: split });
        }
        let mut seen = BTreeSet::new();
        for &child in &children {
            if !seen.insert(child) {
                return Err(SplitModelError::DuplicateChild { split, child });
            }
            let record = self.record(child)?;
            if self.is_ancestor_or_self(child, split) {
                return Err(SplitModelError::CycleDetected { split, child });
            }
            if self.root == Some(child) {
                return Err(SplitModelError::ChildIsRoot { child });
            }
            if let Some(parent) = record.parent
                && parent != split
            {
                return Err(SplitModelError::AlreadyAttached { child, parent });
            }
        }

        let old = self.children(split).to_vec();
        for child in old {
            if let Some(record) = self.nodes.get_mut(&child) {
                record.parent = None;
            }
        }
        for &child in &children {
            if let Some(record) = self.nodes.get_mut(&child) {
                record.parent = Some(split);
            }
        }
        if let Some(SplitNodeKind::Split(branch)) =
            self.nodes.get_mut(&split).map(|record| &mut record.kind)
        {
            branch.children = children;
        }
        Ok(())
    }

    #[must_use]
    pub fn weight(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(&id).map(SplitNodeRecord::weight)
    }

    /// Set a node's share of extra/deficit space.
    ///
    /// Rejects anything outside `[0, 1]`, NaN included, and keeps the
    /// previous weight. The per-split total is checked on install.
    pub fn set_weight(&mut self, id: NodeId, weight: f64) -> Result<(), SplitModelError> {
        let record = self.record_mut(id)?;
        if !(0.0..=1.0).contains(&weight) {
            return Err(SplitModelError::InvalidWeight { node: id, weight });
        }
        record.weight = weight;
        Ok(())
    }

    /// Copy of a node's bounds.
    #[must_use]
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(&id).map(SplitNodeRecord::bounds)
    }

    /// Store a copy of `bounds` on a node. Negative extents are rejected.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) -> Result<(), SplitModelError> {
        let record = self.record_mut(id)?;
        if !bounds.is_well_formed() {
            return Err(SplitModelError::InvalidBounds { node: id, bounds });
        }
        record.bounds = bounds;
        Ok(())
    }

    /// Bounds writer for computed rectangles; extents are floored at zero.
    pub(crate) fn store_bounds(&mut self, id: NodeId, bounds: Rect) {
        debug_assert!(bounds.is_well_formed(), "computed bounds went negative");
        if let Some(record) = self.nodes.get_mut(&id) {
            record.bounds = Rect::new(
                bounds.x,
                bounds.y,
                bounds.width.max(0),
                bounds.height.max(0),
            );
        }
    }

    #[must_use]
    pub fn orientation(&self, id: NodeId) -> Option<Orientation> {
        self.nodes
            .get(&id)
            .and_then(SplitNodeRecord::branch)
            .map(|branch| branch.orientation)
    }

    #[must_use]
    pub fn ratio(&self, id: NodeId) -> Option<SplitRatio> {
        self.nodes
            .get(&id)
            .and_then(SplitNodeRecord::branch)
            .and_then(|branch| branch.ratio)
    }

    fn ratio_mut(&mut self, id: NodeId) -> Result<&mut SplitRatio, SplitModelError> {
        match &mut self.record_mut(id)?.kind {
            SplitNodeKind::Split(SplitBranch {
                ratio: Some(ratio), ..
            }) => Ok(ratio),
            SplitNodeKind::Split(_) => Err(SplitModelError::NotARatioSplit { node: id }),
            _ => Err(SplitModelError::NotASplit { node: id }),
        }
    }

    /// Set the ratio of a binary split, rejecting values outside its range.
    pub fn set_ratio(&mut self, id: NodeId, value: f64) -> Result<(), SplitModelError> {
        self.ratio_mut(id)?.set(value)
    }

    /// Set the ratio of a binary split, clamping into its range.
    /// Returns the value actually stored.
    pub fn set_ratio_clamped(&mut self, id: NodeId, value: f64) -> Result<f64, SplitModelError> {
        Ok(self.ratio_mut(id)?.set_clamped(value))
    }

    #[must_use]
    pub fn is_divider(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(SplitNodeRecord::is_divider)
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(SplitNodeRecord::name)
    }

    /// `id` and everything below it, parents before children.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Leaf and divider names in layout order, starting at the root.
    #[must_use]
    pub fn widget_names(&self) -> Vec<&str> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        self.descendants(root)
            .into_iter()
            .filter_map(|id| self.name(id))
            .collect()
    }

    /// Drop a detached node together with its subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SplitModelError> {
        let record = self.record(id)?;
        if record.parent.is_some() || self.root == Some(id) {
            return Err(SplitModelError::NodeAttached { node: id });
        }
        for node in self.descendants(id) {
            let _ = self.nodes.remove(&node);
        }
        Ok(())
    }

    /// Drop every node unreachable from the root. Returns how many went.
    pub fn collect_garbage(&mut self) -> usize {
        let reachable: BTreeSet<NodeId> = self
            .root
            .map(|root| self.descendants(root).into_iter().collect())
            .unwrap_or_default();
        let before = self.nodes.len();
        self.nodes.retain(|id, _| reachable.contains(id));
        before - self.nodes.len()
    }
}
