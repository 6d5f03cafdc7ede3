#![forbid(unsafe_code)]

//! Split-tree layout with draggable dividers.
//!
//! A [`SplitTree`] arranges named widgets in nested rows and columns separated
//! by dividers. [`SplitPane`] owns one validated tree, measures the bound
//! widgets, hands each one its rectangle, and moves dividers under the
//! pointer.
//!
//! ```
//! use multisplit_layout::{Rect, Size, SplitPane, SplitTree, SplitWidget};
//!
//! struct Panel(Size, Rect);
//!
//! impl SplitWidget for Panel {
//!     fn preferred_size(&self) -> Size { self.0 }
//!     fn apply_bounds(&mut self, bounds: Rect) { self.1 = bounds; }
//! }
//!
//! let mut tree = SplitTree::new();
//! let left = tree.leaf("left")?;
//! let bar = tree.divider("bar")?;
//! let right = tree.leaf("right")?;
//! let row = tree.row([left, bar, right])?;
//! tree.set_root(row)?;
//! tree.set_weight(right, 1.0)?;
//!
//! let mut pane = SplitPane::new();
//! pane.bind_widget("left", Panel(Size::new(20, 5), Rect::default()));
//! pane.bind_widget("bar", Panel(Size::new(1, 1), Rect::default()));
//! pane.bind_widget("right", Panel(Size::new(20, 5), Rect::default()));
//! pane.set_model(tree)?;
//! pane.layout(Rect::from_size(80, 24))?;
//!
//! let right_bounds = pane.widgets().get("right").map(|panel| panel.1);
//! assert_eq!(right_bounds, Some(Rect::new(21, 0, 59, 24)));
//! # Ok::<(), multisplit_layout::SplitModelError>(())
//! ```

pub mod allocate;
pub mod animation;
pub mod config;
pub mod drag;
pub mod error;
pub mod measure;
pub mod node;
pub mod pane;
pub mod validate;
pub mod widget;

pub use allocate::{AllocationReport, PlacementMode, allocate};
pub use animation::{
    RatioTick, RatioTransition, TransitionHandle, ratio_channel, spawn_ratio_transition,
};
pub use config::{ConfigError, SplitPaneConfig, ValidationPolicy};
pub use drag::{
    DragController, DragEffect, DragKind, DragNoopReason, DragState, DragTransition, divider_at,
};
pub use error::{InvalidModelReason, SplitModelError};
pub use measure::{PreferredSizes, preferred_size};
pub use multisplit_core::{Rect, Sides, Size};
pub use node::{
    NodeId, Orientation, SplitBranch, SplitDivider, SplitLeaf, SplitNodeKind, SplitNodeRecord,
    SplitRatio, SplitTree,
};
pub use pane::SplitPane;
pub use validate::{WEIGHT_SUM_TOLERANCE, validate, validate_node};
pub use widget::{SplitWidget, WidgetTable};
