//! Divider hit-testing and the pointer drag lifecycle.
//!
//! ```text
//! Idle -> Dragging -> Idle
//!    \-> Idle (press that misses a usable divider)
//! ```
//!
//! The controller only moves the dragged divider (or the ratio of a binary
//! split). Re-layout is requested through [`DragTransition::relayout`] and
//! left to the owner of the widget table.

use multisplit_core::Rect;
use serde::{Deserialize, Serialize};

use crate::allocate::ratio_extents;
use crate::node::{NodeId, Orientation, SplitNodeKind, SplitTree};

/// Divider under `(x, y)`, descending from the root through whichever child
/// contains the point.
#[must_use]
pub fn divider_at(tree: &SplitTree, x: i32, y: i32) -> Option<NodeId> {
    let mut cursor = tree.root()?;
    loop {
        let node = tree.node(cursor)?;
        match node.kind() {
            SplitNodeKind::Divider(_) => {
                return node.bounds().contains(x, y).then_some(cursor);
            }
            SplitNodeKind::Leaf(_) => return None,
            SplitNodeKind::Split(branch) => {
                cursor = branch
                    .children
                    .iter()
                    .copied()
                    .find(|child| tree.bounds(*child).is_some_and(|b| b.contains(x, y)))?;
            }
        }
    }
}

/// How an active drag maps pointer motion onto the tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragKind {
    /// Alternating split: the divider's leading edge follows the pointer.
    Position { offset: i32, min: i32, max: i32 },
    /// Binary split: pointer travel changes the ratio.
    Ratio {
        origin: i32,
        start_ratio: f64,
        span: i32,
    },
}

/// Drag lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        divider: NodeId,
        split: NodeId,
        orientation: Orientation,
        kind: DragKind,
    },
}

/// Why an input was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    NoDividerHit,
    DividerWithoutNeighbors,
    IdleWithoutActiveDrag,
    DragAlreadyInProgress,
    DividerMissing,
}

/// Effect of one lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started { divider: NodeId, split: NodeId },
    Moved { divider: NodeId, leading: i32 },
    RatioChanged { split: NodeId, ratio: f64 },
    Released { divider: NodeId },
    Canceled { divider: NodeId },
    Noop { reason: DragNoopReason },
}

/// One lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTransition {
    pub from: DragState,
    pub to: DragState,
    pub effect: DragEffect,
    /// The owner should run a layout pass now.
    pub relayout: bool,
    /// Region to repaint, if any.
    pub damage: Option<Rect>,
}

impl DragTransition {
    pub(crate) fn noop(state: DragState, reason: DragNoopReason) -> Self {
        Self {
            from: state,
            to: state,
            effect: DragEffect::Noop { reason },
            relayout: false,
            damage: None,
        }
    }

    /// Whether the step changed anything.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.effect, DragEffect::Noop { .. })
    }
}

/// Pointer drag state machine for dividers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragController {
    state: DragState,
    continuous: bool,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DragController {
    /// Controller that re-lays out on every move when `continuous` is set,
    /// and only on release otherwise.
    #[must_use]
    pub const fn new(continuous: bool) -> Self {
        Self {
            state: DragState::Idle,
            continuous,
        }
    }

    #[must_use]
    pub const fn state(&self) -> DragState {
        self.state
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    #[must_use]
    pub const fn continuous(&self) -> bool {
        self.continuous
    }

    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    /// Divider being dragged, if any.
    #[must_use]
    pub const fn active_divider(&self) -> Option<NodeId> {
        match self.state {
            DragState::Dragging { divider, .. } => Some(divider),
            DragState::Idle => None,
        }
    }

    /// Start a drag when `(x, y)` hits a divider with neighbours on both
    /// sides.
    pub fn press(&mut self, tree: &SplitTree, x: i32, y: i32) -> DragTransition {
        let from = self.state;
        if self.is_active() {
            return DragTransition::noop(from, DragNoopReason::DragAlreadyInProgress);
        }
        let Some(divider) = divider_at(tree, x, y) else {
            return DragTransition::noop(from, DragNoopReason::NoDividerHit);
        };
        let (Some(split), Some(previous), Some(next)) = (
            tree.parent(divider),
            tree.previous_sibling(divider),
            tree.next_sibling(divider),
        ) else {
            return DragTransition::noop(from, DragNoopReason::DividerWithoutNeighbors);
        };
        let Some(orientation) = tree.orientation(split) else {
            return DragTransition::noop(from, DragNoopReason::DividerMissing);
        };

        let bounds = tree.bounds(divider).unwrap_or_default();
        let pointer = orientation.pointer_main(x, y);
        let extent = orientation.main_extent(bounds);
        let kind = match tree.ratio(split) {
            Some(ratio) => DragKind::Ratio {
                origin: pointer,
                start_ratio: ratio.value(),
                span: tree
                    .bounds(split)
                    .map_or(0, |b| orientation.main_extent(b).saturating_sub(extent)),
            },
            None => {
                let min = tree
                    .bounds(previous)
                    .map_or(0, |b| orientation.main_start(b));
                let max = tree
                    .bounds(next)
                    .map_or(min, |b| orientation.main_end(b).saturating_sub(extent));
                DragKind::Position {
                    offset: pointer.saturating_sub(orientation.main_start(bounds)),
                    min,
                    max: max.max(min),
                }
            }
        };

        self.state = DragState::Dragging {
            divider,
            split,
            orientation,
            kind,
        };
        tracing::debug!(divider = divider.get(), split = split.get(), ?kind, "drag started");
        DragTransition {
            from,
            to: self.state,
            effect: DragEffect::Started { divider, split },
            relayout: false,
            damage: None,
        }
    }

    /// Follow the pointer with the active divider.
    pub fn drag(&mut self, tree: &mut SplitTree, x: i32, y: i32) -> DragTransition {
        let from = self.state;
        let DragState::Dragging {
            divider,
            split,
            orientation,
            kind,
        } = self.state
        else {
            return DragTransition::noop(from, DragNoopReason::IdleWithoutActiveDrag);
        };
        let Some(old) = tree.bounds(divider) else {
            self.state = DragState::Idle;
            return DragTransition::noop(from, DragNoopReason::DividerMissing);
        };
        let pointer = orientation.pointer_main(x, y);

        let (new, effect, range) = match kind {
            DragKind::Position { offset, min, max } => {
                let leading = pointer.saturating_sub(offset).clamp(min, max);
                let new = orientation.with_main_start(old, leading);
                let reach = max.saturating_sub(min).saturating_add(orientation.main_extent(old));
                let range = orientation.span(old, min, reach);
                (new, DragEffect::Moved { divider, leading }, range)
            }
            DragKind::Ratio {
                origin,
                start_ratio,
                span,
            } => {
                let requested = if span > 0 {
                    start_ratio + (f64::from(pointer) - f64::from(origin)) / f64::from(span)
                } else {
                    start_ratio
                };
                let Ok(ratio) = tree.set_ratio_clamped(split, requested) else {
                    self.state = DragState::Idle;
                    return DragTransition::noop(from, DragNoopReason::DividerMissing);
                };
                let area = tree.bounds(split).unwrap_or_default();
                let [first, _, _] = ratio_extents(
                    orientation.main_extent(area),
                    orientation.main_extent(old),
                    ratio,
                );
                let leading = orientation.main_start(area).saturating_add(first);
                let new = orientation.with_main_start(old, leading);
                (new, DragEffect::RatioChanged { split, ratio }, area)
            }
        };

        tree.store_bounds(divider, new);
        tracing::trace!(divider = divider.get(), ?effect, "drag moved");
        DragTransition {
            from,
            to: self.state,
            effect,
            relayout: self.continuous,
            damage: Some(if self.continuous { range } else { old.union(&new) }),
        }
    }

    /// Finish the active drag. Pointer coordinates are not consulted; the
    /// divider stays where the last move put it.
    pub fn release(&mut self, tree: &SplitTree, _x: i32, _y: i32) -> DragTransition {
        let from = self.state;
        let DragState::Dragging { divider, split, .. } = self.state else {
            return DragTransition::noop(from, DragNoopReason::IdleWithoutActiveDrag);
        };
        self.state = DragState::Idle;
        tracing::debug!(divider = divider.get(), "drag released");
        DragTransition {
            from,
            to: self.state,
            effect: DragEffect::Released { divider },
            relayout: !self.continuous,
            damage: (!self.continuous)
                .then(|| tree.bounds(split))
                .flatten(),
        }
    }

    /// Abandon the active drag without another layout pass.
    pub fn cancel(&mut self) -> Option<DragTransition> {
        let from = self.state;
        let DragState::Dragging { divider, .. } = self.state else {
            return None;
        };
        self.state = DragState::Idle;
        tracing::debug!(divider = divider.get(), "drag canceled");
        Some(DragTransition {
            from,
            to: self.state,
            effect: DragEffect::Canceled { divider },
            relayout: false,
            damage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SplitRatio;

    /// Row `a | d | b` with a 10px divider at x = 150 inside 0..310.
    fn placed_row() -> (SplitTree, [NodeId; 4]) {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let row = tree.row([a, d, b]).expect("row");
        tree.set_root(row).expect("root");
        tree.set_bounds(row, Rect::new(0, 0, 310, 50)).expect("bounds");
        tree.set_bounds(a, Rect::new(0, 0, 150, 50)).expect("bounds");
        tree.set_bounds(d, Rect::new(150, 0, 10, 50)).expect("bounds");
        tree.set_bounds(b, Rect::new(160, 0, 150, 50)).expect("bounds");
        (tree, [row, a, d, b])
    }

    #[test]
    fn hit_test_finds_divider_only() {
        let (tree, [_, _, d, _]) = placed_row();
        assert_eq!(divider_at(&tree, 155, 10), Some(d));
        assert_eq!(divider_at(&tree, 10, 10), None);
        assert_eq!(divider_at(&tree, 500, 10), None);
    }

    #[test]
    fn press_outside_divider_stays_idle() {
        let (tree, _) = placed_row();
        let mut drag = DragController::default();
        let step = drag.press(&tree, 20, 20);
        assert_eq!(
            step.effect,
            DragEffect::Noop {
                reason: DragNoopReason::NoDividerHit
            }
        );
        assert!(!drag.is_active());
    }

    #[test]
    fn drag_clamps_to_neighbour_range() {
        let (mut tree, [row, _, d, _]) = placed_row();
        let mut drag = DragController::new(false);
        let started = drag.press(&tree, 152, 5);
        assert_eq!(started.effect, DragEffect::Started { divider: d, split: row });

        let step = drag.drag(&mut tree, 502, 5);
        assert_eq!(
            step.effect,
            DragEffect::Moved {
                divider: d,
                leading: 300
            }
        );
        assert_eq!(tree.bounds(d), Some(Rect::new(300, 0, 10, 50)));
        assert!(!step.relayout);
        assert_eq!(step.damage, Some(Rect::new(150, 0, 160, 50)));

        let step = drag.drag(&mut tree, -40, 5);
        assert_eq!(
            step.effect,
            DragEffect::Moved {
                divider: d,
                leading: 0
            }
        );

        let released = drag.release(&tree, 0, 0);
        assert!(released.relayout);
        assert_eq!(released.damage, Some(Rect::new(0, 0, 310, 50)));
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn continuous_drag_damages_full_range() {
        let (mut tree, _) = placed_row();
        let mut drag = DragController::new(true);
        let _ = drag.press(&tree, 150, 0);
        let step = drag.drag(&mut tree, 200, 0);
        assert!(step.relayout);
        assert_eq!(step.damage, Some(Rect::new(0, 0, 310, 50)));
        let released = drag.release(&tree, 200, 0);
        assert!(!released.relayout);
        assert_eq!(released.damage, None);
    }

    #[test]
    fn ratio_drag_moves_ratio_within_range() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let ratio = SplitRatio::with_range(0.5, 0.2, 0.8).expect("ratio");
        let split = tree
            .ratio_split(Orientation::Column, a, d, b, ratio)
            .expect("split");
        tree.set_root(split).expect("root");
        tree.set_bounds(split, Rect::new(0, 0, 40, 110)).expect("bounds");
        tree.set_bounds(a, Rect::new(0, 0, 40, 50)).expect("bounds");
        tree.set_bounds(d, Rect::new(0, 50, 40, 10)).expect("bounds");
        tree.set_bounds(b, Rect::new(0, 60, 40, 50)).expect("bounds");

        let mut drag = DragController::default();
        let _ = drag.press(&tree, 5, 55);
        let step = drag.drag(&mut tree, 5, 65);
        assert_eq!(step.effect, DragEffect::RatioChanged { split, ratio: 0.6 });
        assert_eq!(tree.bounds(d), Some(Rect::new(0, 60, 40, 10)));

        let step = drag.drag(&mut tree, 5, 500);
        assert_eq!(step.effect, DragEffect::RatioChanged { split, ratio: 0.8 });
    }

    #[test]
    fn cancel_discards_state() {
        let (tree, _) = placed_row();
        let mut drag = DragController::default();
        assert!(drag.cancel().is_none());
        let _ = drag.press(&tree, 155, 1);
        assert!(drag.is_active());
        let canceled = drag.cancel().expect("active drag");
        assert!(matches!(canceled.effect, DragEffect::Canceled { .. }));
        assert!(!drag.is_active());
    }

    #[test]
    fn second_press_is_ignored_while_dragging() {
        let (tree, _) = placed_row();
        let mut drag = DragController::default();
        let _ = drag.press(&tree, 155, 1);
        let step = drag.press(&tree, 155, 1);
        assert!(step.is_noop());
    }

    #[test]
    fn state_serializes_with_tags() {
        let json = serde_json::to_string(&DragState::Idle).expect("serialize");
        assert_eq!(json, r#"{"state":"idle"}"#);
    }
}
