//! The split-pane container: one installed model, its widget bindings, and
//! the drag lifecycle.

use std::sync::mpsc;

use multisplit_core::{Rect, Sides, Size};

use crate::allocate::{AllocationReport, PlacementMode, allocate};
use crate::animation::{RatioTick, RatioTransition, TransitionHandle, spawn_ratio_transition};
use crate::config::{SplitPaneConfig, ValidationPolicy};
use crate::drag::{self, DragController, DragEffect, DragNoopReason, DragState, DragTransition};
use crate::error::SplitModelError;
use crate::measure;
use crate::node::{NodeId, SplitTree};
use crate::validate::validate;
use crate::widget::{SplitWidget, WidgetTable};

/// Lays out named widgets according to an installed [`SplitTree`].
///
/// The pane only ever holds a tree that passed validation. Installing a new
/// one is all-or-nothing: a rejected tree leaves the previous model, its
/// bounds, and the drag state untouched.
#[derive(Debug)]
pub struct SplitPane<W> {
    model: Option<SplitTree>,
    widgets: WidgetTable<W>,
    config: SplitPaneConfig,
    floating_dividers: bool,
    drag: DragController,
    last_container: Option<Rect>,
}

impl<W> Default for SplitPane<W> {
    fn default() -> Self {
        Self::with_config(SplitPaneConfig::default())
    }
}

impl<W> SplitPane<W> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: SplitPaneConfig) -> Self {
        let config = config.validated();
        Self {
            model: None,
            widgets: WidgetTable::new(),
            config,
            floating_dividers: config.floating_dividers,
            drag: DragController::new(config.continuous_layout),
            last_container: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SplitPaneConfig {
        &self.config
    }

    /// Installed model, if any.
    #[must_use]
    pub const fn model(&self) -> Option<&SplitTree> {
        self.model.as_ref()
    }

    /// Validate `tree` and install it in place of the current model.
    ///
    /// Unreachable nodes are dropped, any drag in progress is abandoned, and
    /// the next layout starts from preferred sizes again (unless floating
    /// dividers were turned off in the config).
    pub fn set_model(&mut self, mut tree: SplitTree) -> Result<(), SplitModelError> {
        let _span = tracing::debug_span!("install_model", nodes = tree.len()).entered();
        if let Err(err) = validate(&tree) {
            tracing::warn!(error = %err, "model rejected");
            return Err(err);
        }
        let dropped = tree.collect_garbage();
        let _ = self.drag.cancel();
        self.floating_dividers = self.config.floating_dividers;
        self.model = Some(tree);
        tracing::debug!(dropped, "model installed");
        Ok(())
    }

    /// Edit a copy of the model and install it if it still validates.
    ///
    /// Starts from an empty tree when nothing is installed yet. On any error,
    /// from `edit` or from validation, the installed model is unchanged.
    pub fn update_model<T>(
        &mut self,
        edit: impl FnOnce(&mut SplitTree) -> Result<T, SplitModelError>,
    ) -> Result<T, SplitModelError> {
        let mut draft = self.model.clone().unwrap_or_default();
        let out = edit(&mut draft)?;
        self.set_model(draft)?;
        Ok(out)
    }

    /// Remove and return the installed model.
    pub fn take_model(&mut self) -> Option<SplitTree> {
        let _ = self.drag.cancel();
        self.model.take()
    }

    /// Bind `widget` to `name`, returning the widget it replaces.
    pub fn bind_widget(&mut self, name: impl Into<String>, widget: W) -> Option<W> {
        self.widgets.bind(name, widget)
    }

    pub fn unbind_widget(&mut self, name: &str) -> Option<W> {
        self.widgets.unbind(name)
    }

    #[must_use]
    pub const fn widgets(&self) -> &WidgetTable<W> {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetTable<W> {
        &mut self.widgets
    }

    /// Whether the next layout derives positions from preferred sizes.
    #[must_use]
    pub const fn floating_dividers(&self) -> bool {
        self.floating_dividers
    }

    pub fn set_floating_dividers(&mut self, floating: bool) {
        self.floating_dividers = floating;
    }

    #[must_use]
    pub const fn continuous_layout(&self) -> bool {
        self.drag.continuous()
    }

    pub fn set_continuous_layout(&mut self, continuous: bool) {
        self.drag.set_continuous(continuous);
    }

    #[must_use]
    pub const fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Container rectangle of the last layout pass.
    #[must_use]
    pub const fn last_container(&self) -> Option<Rect> {
        self.last_container
    }

    /// Divider under `(x, y)` in the last computed layout.
    #[must_use]
    pub fn divider_at(&self, x: i32, y: i32) -> Option<NodeId> {
        self.model
            .as_ref()
            .and_then(|tree| drag::divider_at(tree, x, y))
    }

    /// Abandon the active drag, if any.
    pub fn cancel_drag(&mut self) -> Option<DragTransition> {
        self.drag.cancel()
    }
}

impl<W: SplitWidget> SplitPane<W> {
    /// Preferred size of the whole model; zero without one.
    #[must_use]
    pub fn preferred_size(&self) -> Size {
        self.model
            .as_ref()
            .and_then(|tree| {
                tree.root()
                    .map(|root| measure::preferred_size(tree, &self.widgets, root))
            })
            .unwrap_or_default()
    }

    /// Preferred size plus the container's own padding.
    #[must_use]
    pub fn preferred_size_with_padding(&self, padding: Sides) -> Size {
        self.preferred_size().padded(padding)
    }

    /// Lay out the model inside `container` and push the results to every
    /// bound widget.
    pub fn layout(&mut self, container: Rect) -> Result<AllocationReport, SplitModelError> {
        if !container.is_well_formed() {
            return Err(SplitModelError::InvalidContainer { bounds: container });
        }
        let Some(tree) = self.model.as_mut() else {
            return Ok(AllocationReport::default());
        };
        if self.config.validation == ValidationPolicy::EveryLayout {
            validate(tree)?;
        }
        self.last_container = Some(container);
        Ok(allocate(
            tree,
            &mut self.widgets,
            container,
            PlacementMode::from_floating(self.floating_dividers),
        ))
    }

    /// Repeat the last layout pass. Does nothing before the first one.
    pub fn relayout(&mut self) -> Result<AllocationReport, SplitModelError> {
        match self.last_container {
            Some(container) => self.layout(container),
            None => Ok(AllocationReport::default()),
        }
    }

    fn relayout_quietly(&mut self) {
        if let Err(err) = self.relayout() {
            tracing::warn!(error = %err, "layout after drag failed");
        }
    }

    /// Pointer pressed: start dragging the divider under it, if any.
    pub fn pointer_down(&mut self, x: i32, y: i32) -> DragTransition {
        let Some(tree) = self.model.as_ref() else {
            return DragTransition::noop(self.drag.state(), DragNoopReason::NoDividerHit);
        };
        let step = self.drag.press(tree, x, y);
        if matches!(step.effect, DragEffect::Started { .. }) {
            self.floating_dividers = false;
        }
        step
    }

    /// Pointer moved: follow it with the dragged divider.
    pub fn pointer_move(&mut self, x: i32, y: i32) -> DragTransition {
        let Some(tree) = self.model.as_mut() else {
            return DragTransition::noop(self.drag.state(), DragNoopReason::IdleWithoutActiveDrag);
        };
        let step = self.drag.drag(tree, x, y);
        if step.relayout {
            self.relayout_quietly();
        }
        step
    }

    /// Pointer released: end the drag.
    pub fn pointer_up(&mut self, x: i32, y: i32) -> DragTransition {
        let Some(tree) = self.model.as_ref() else {
            return DragTransition::noop(self.drag.state(), DragNoopReason::IdleWithoutActiveDrag);
        };
        let step = self.drag.release(tree, x, y);
        if step.relayout {
            self.relayout_quietly();
        }
        step
    }

    fn model_mut(&mut self) -> Result<&mut SplitTree, SplitModelError> {
        self.model.as_mut().ok_or(SplitModelError::InvalidModel {
            node: None,
            reason: crate::error::InvalidModelReason::MissingRoot,
        })
    }

    /// Set a binary split's ratio and re-layout. Out-of-range values are
    /// rejected and leave the ratio unchanged.
    pub fn set_ratio(&mut self, split: NodeId, ratio: f64) -> Result<(), SplitModelError> {
        self.model_mut()?.set_ratio(split, ratio)?;
        self.relayout().map(|_| ())
    }

    /// Snap a binary split to its minimum ratio.
    pub fn collapse(&mut self, split: NodeId) -> Result<f64, SplitModelError> {
        let tree = self.model_mut()?;
        let range = tree
            .ratio(split)
            .ok_or(SplitModelError::NotARatioSplit { node: split })?;
        let ratio = tree.set_ratio_clamped(split, range.min())?;
        tracing::debug!(split = split.get(), ratio, "split collapsed");
        self.relayout()?;
        Ok(ratio)
    }

    /// Snap a binary split to its maximum ratio.
    pub fn expand(&mut self, split: NodeId) -> Result<f64, SplitModelError> {
        let tree = self.model_mut()?;
        let range = tree
            .ratio(split)
            .ok_or(SplitModelError::NotARatioSplit { node: split })?;
        let ratio = tree.set_ratio_clamped(split, range.max())?;
        tracing::debug!(split = split.get(), ratio, "split expanded");
        self.relayout()?;
        Ok(ratio)
    }

    /// Apply one transition tick without re-laying out. Returns the ratio
    /// actually stored after clamping.
    pub fn apply_ratio_tick(&mut self, tick: RatioTick) -> Result<f64, SplitModelError> {
        let ratio = self.model_mut()?.set_ratio_clamped(tick.split, tick.ratio)?;
        tracing::trace!(split = tick.split.get(), ratio, "ratio tick applied");
        Ok(ratio)
    }

    /// Apply every pending tick, then re-layout once if any landed.
    /// Ticks for splits that are no longer in the model are skipped.
    pub fn drain_ratio_ticks(
        &mut self,
        ticks: &mpsc::Receiver<RatioTick>,
    ) -> Result<usize, SplitModelError> {
        let mut applied = 0;
        for tick in ticks.try_iter() {
            match self.apply_ratio_tick(tick) {
                Ok(_) => applied += 1,
                Err(err) => {
                    tracing::trace!(split = tick.split.get(), error = %err, "ratio tick skipped");
                }
            }
        }
        if applied > 0 {
            self.relayout()?;
        }
        Ok(applied)
    }

    /// Animate a binary split towards `target` (clamped into its range)
    /// using the configured step count and interval.
    pub fn start_ratio_transition(
        &self,
        split: NodeId,
        target: f64,
        sender: mpsc::Sender<RatioTick>,
    ) -> Result<TransitionHandle, SplitModelError> {
        let tree = self.model.as_ref().ok_or(SplitModelError::InvalidModel {
            node: None,
            reason: crate::error::InvalidModelReason::MissingRoot,
        })?;
        if !tree.contains(split) {
            return Err(SplitModelError::UnknownNode { node: split });
        }
        let current = tree
            .ratio(split)
            .ok_or(SplitModelError::NotARatioSplit { node: split })?;
        let mut goal = current;
        let to = goal.set_clamped(target);
        Ok(spawn_ratio_transition(
            RatioTransition::new(split, current.value(), to, self.config.transition_steps),
            self.config.transition_interval(),
            sender,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Orientation, SplitRatio};

    #[derive(Debug, Clone, Copy, Default)]
    struct Probe {
        preferred: Size,
        bounds: Rect,
    }

    impl SplitWidget for Probe {
        fn preferred_size(&self) -> Size {
            self.preferred
        }

        fn apply_bounds(&mut self, bounds: Rect) {
            self.bounds = bounds;
        }
    }

    fn probe(width: i32, height: i32) -> Probe {
        Probe {
            preferred: Size::new(width, height),
            bounds: Rect::default(),
        }
    }

    fn ratio_model() -> (SplitTree, NodeId) {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let ratio = SplitRatio::with_range(0.5, 0.1, 0.9).expect("ratio");
        let split = tree
            .ratio_split(Orientation::Row, a, d, b, ratio)
            .expect("split");
        tree.set_root(split).expect("root");
        (tree, split)
    }

    #[test]
    fn empty_pane_lays_out_nothing() {
        let mut pane: SplitPane<Probe> = SplitPane::new();
        assert_eq!(pane.preferred_size(), Size::ZERO);
        assert_eq!(
            pane.layout(Rect::from_size(10, 10)),
            Ok(AllocationReport::default())
        );
        assert!(pane.pointer_down(1, 1).is_noop());
    }

    #[test]
    fn negative_container_is_rejected() {
        let mut pane: SplitPane<Probe> = SplitPane::new();
        let bounds = Rect::new(0, 0, -1, 5);
        assert_eq!(
            pane.layout(bounds),
            Err(SplitModelError::InvalidContainer { bounds })
        );
    }

    #[test]
    fn padding_adds_to_preferred_size() {
        let (tree, _) = ratio_model();
        let mut pane = SplitPane::new();
        pane.set_model(tree).expect("install");
        let _ = pane.bind_widget("a", probe(10, 5));
        let _ = pane.bind_widget("d", probe(2, 1));
        let _ = pane.bind_widget("b", probe(10, 7));
        assert_eq!(pane.preferred_size(), Size::new(22, 7));
        assert_eq!(
            pane.preferred_size_with_padding(Sides::all(1)),
            Size::new(24, 9)
        );
    }

    #[test]
    fn collapse_and_expand_snap_to_range() {
        let (tree, split) = ratio_model();
        let mut pane = SplitPane::new();
        pane.set_model(tree).expect("install");
        let _ = pane.bind_widget("d", probe(10, 1));
        pane.layout(Rect::from_size(110, 20)).expect("layout");

        assert_eq!(pane.collapse(split), Ok(0.1));
        let first = pane.model().and_then(|m| m.children(split).first().copied());
        let first_bounds = first.and_then(|id| pane.model().and_then(|m| m.bounds(id)));
        assert_eq!(first_bounds, Some(Rect::new(0, 0, 10, 20)));

        assert_eq!(pane.expand(split), Ok(0.9));
        let first_bounds = first.and_then(|id| pane.model().and_then(|m| m.bounds(id)));
        assert_eq!(first_bounds, Some(Rect::new(0, 0, 90, 20)));
    }

    #[test]
    fn set_ratio_rejects_out_of_range() {
        let (tree, split) = ratio_model();
        let mut pane: SplitPane<Probe> = SplitPane::new();
        pane.set_model(tree).expect("install");
        assert!(matches!(
            pane.set_ratio(split, 0.95),
            Err(SplitModelError::InvalidRatio { .. })
        ));
        assert_eq!(
            pane.model().and_then(|m| m.ratio(split)).map(SplitRatio::value),
            Some(0.5)
        );
        assert_eq!(pane.set_ratio(split, 0.25), Ok(()));
    }

    #[test]
    fn ticks_are_clamped_and_applied_once() {
        let (tree, split) = ratio_model();
        let mut pane: SplitPane<Probe> = SplitPane::new();
        pane.set_model(tree).expect("install");
        pane.layout(Rect::from_size(100, 10)).expect("layout");

        let (tx, rx) = crate::animation::ratio_channel();
        tx.send(RatioTick { split, ratio: 0.7 }).expect("send");
        tx.send(RatioTick { split, ratio: 2.0 }).expect("send");
        assert_eq!(pane.drain_ratio_ticks(&rx), Ok(2));
        assert_eq!(
            pane.model().and_then(|m| m.ratio(split)).map(SplitRatio::value),
            Some(0.9)
        );
        assert_eq!(pane.drain_ratio_ticks(&rx), Ok(0));
    }

    #[test]
    fn update_model_is_transactional() {
        let (tree, split) = ratio_model();
        let mut pane: SplitPane<Probe> = SplitPane::new();
        pane.set_model(tree).expect("install");
        let before = pane.model().cloned();

        let result = pane.update_model(|draft| {
            let extra = draft.leaf("c")?;
            let children = draft.children(split).to_vec();
            draft.set_children(split, children.into_iter().chain([extra]))
        });
        assert!(result.is_err());
        assert_eq!(pane.model().cloned(), before);

        let renamed = pane.update_model(|draft| {
            let a = draft.children(split)[0];
            draft.set_weight(a, 0.5)?;
            Ok(a)
        });
        assert!(renamed.is_ok());
    }
}
