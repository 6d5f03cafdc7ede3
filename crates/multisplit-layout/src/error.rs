//! Error types for the split-tree model.

use std::fmt;

use multisplit_core::Rect;

use crate::node::NodeId;

/// Why a tree was rejected as a layout model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidModelReason {
    /// The tree has no root node.
    MissingRoot,
    /// A divider cannot be the root of a model.
    DividerRoot,
    /// An alternating split holds fewer than three children.
    TooFewChildren { count: usize },
    /// A ratio split must hold exactly `first, divider, second`.
    BinaryShape { count: usize },
    /// An odd-indexed child is not a divider.
    ExpectedDivider { index: usize },
    /// An even-indexed child is a divider.
    UnexpectedDivider { index: usize },
    /// Child weights of one split add up to more than 1.0.
    WeightOverflow { total: f64 },
    /// A child's parent pointer does not name the split that lists it.
    ParentMismatch {
        child: NodeId,
        actual: Option<NodeId>,
    },
}

impl fmt::Display for InvalidModelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot => write!(f, "model has no root"),
            Self::DividerRoot => write!(f, "a divider cannot be the model root"),
            Self::TooFewChildren { count } => {
                write!(f, "split cannot hold less than 3 nodes (has {count})")
            }
            Self::BinaryShape { count } => write!(
                f,
                "ratio split must hold exactly first, divider, second (has {count})"
            ),
            Self::ExpectedDivider { index } => write!(f, "expected divider at index {index}"),
            Self::UnexpectedDivider { index } => {
                write!(f, "expected leaf or split at index {index}")
            }
            Self::WeightOverflow { total } => {
                write!(f, "total children weight {total} exceeds 1.0")
            }
            Self::ParentMismatch { child, actual } => write!(
                f,
                "child {} has parent {:?}",
                child.get(),
                actual.map(NodeId::get)
            ),
        }
    }
}

/// Errors raised by split-tree construction, mutation, and installation.
///
/// Every variant is a rejected input: the operation that produced it left the
/// tree exactly as it was before the call.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitModelError {
    /// The tree is structurally unusable as a layout model.
    InvalidModel {
        node: Option<NodeId>,
        reason: InvalidModelReason,
    },
    /// Weight outside `[0, 1]`.
    InvalidWeight { node: NodeId, weight: f64 },
    /// Bounds with a negative extent.
    InvalidBounds { node: NodeId, bounds: Rect },
    /// Container rectangle with a negative extent.
    InvalidContainer { bounds: Rect },
    /// Ratio outside its range, or a range outside `[0, 1]`.
    InvalidRatio { ratio: f64, min: f64, max: f64 },
    /// Node id not present in the arena.
    UnknownNode { node: NodeId },
    /// Operation requires a split node.
    NotASplit { node: NodeId },
    /// Ratio operation on a split that has no ratio.
    NotARatioSplit { node: NodeId },
    /// Child already belongs to another split.
    AlreadyAttached { child: NodeId, parent: NodeId },
    /// The current root cannot become a child.
    ChildIsRoot { child: NodeId },
    /// Attaching the child would make a split its own ancestor.
    CycleDetected { split: NodeId, child: NodeId },
    /// The same child listed twice.
    DuplicateChild { split: NodeId, child: NodeId },
    /// Only detached nodes can be removed.
    NodeAttached { node: NodeId },
    /// Node id space exhausted.
    NodeIdOverflow,
}

impl SplitModelError {
    pub(crate) const fn invalid(node: NodeId, reason: InvalidModelReason) -> Self {
        Self::InvalidModel {
            node: Some(node),
            reason,
        }
    }

    /// The node the error refers to, when there is one.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::InvalidModel { node, .. } => *node,
            Self::InvalidWeight { node, .. }
            | Self::InvalidBounds { node, .. }
            | Self::UnknownNode { node }
            | Self::NotASplit { node }
            | Self::NotARatioSplit { node }
            | Self::NodeAttached { node } => Some(*node),
            Self::AlreadyAttached { child, .. } | Self::ChildIsRoot { child } => Some(*child),
            Self::CycleDetected { split, .. } | Self::DuplicateChild { split, .. } => Some(*split),
            Self::InvalidContainer { .. } | Self::InvalidRatio { .. } | Self::NodeIdOverflow => {
                None
            }
        }
    }

    /// Whether this is a structural (model-shape) failure.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::InvalidModel { .. })
    }
}

impl fmt::Display for SplitModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidModel {
                node: Some(node),
                reason,
            } => write!(f, "invalid model at node {}: {reason}", node.get()),
            Self::InvalidModel { node: None, reason } => write!(f, "invalid model: {reason}"),
            Self::InvalidWeight { node, weight } => write!(
                f,
                "invalid weight {weight} for node {} (expected 0.0..=1.0)",
                node.get()
            ),
            Self::InvalidBounds { node, bounds } => write!(
                f,
                "invalid bounds {}x{} for node {}",
                bounds.width,
                bounds.height,
                node.get()
            ),
            Self::InvalidContainer { bounds } => write!(
                f,
                "invalid container bounds {}x{}",
                bounds.width, bounds.height
            ),
            Self::InvalidRatio { ratio, min, max } => {
                write!(f, "invalid ratio {ratio} (expected {min}..={max})")
            }
            Self::UnknownNode { node } => write!(f, "node {} not found", node.get()),
            Self::NotASplit { node } => write!(f, "node {} is not a split", node.get()),
            Self::NotARatioSplit { node } => {
                write!(f, "split {} has no ratio", node.get())
            }
            Self::AlreadyAttached { child, parent } => write!(
                f,
                "node {} is already attached to split {}",
                child.get(),
                parent.get()
            ),
            Self::ChildIsRoot { child } => {
                write!(f, "root node {} cannot become a child", child.get())
            }
            Self::CycleDetected { split, child } => write!(
                f,
                "attaching node {} to split {} would create a cycle",
                child.get(),
                split.get()
            ),
            Self::DuplicateChild { split, child } => write!(
                f,
                "split {} lists child {} twice",
                split.get(),
                child.get()
            ),
            Self::NodeAttached { node } => {
                write!(f, "node {} is still attached to the tree", node.get())
            }
            Self::NodeIdOverflow => write!(f, "node id space exhausted"),
        }
    }
}

impl std::error::Error for SplitModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).expect("test id must be non-zero")
    }

    #[test]
    fn display_names_node_and_reason() {
        let err = SplitModelError::invalid(id(7), InvalidModelReason::TooFewChildren { count: 2 });
        assert_eq!(
            err.to_string(),
            "invalid model at node 7: split cannot hold less than 3 nodes (has 2)"
        );
        assert!(err.is_structural());
        assert_eq!(err.node(), Some(id(7)));
    }

    #[test]
    fn parameter_errors_are_not_structural() {
        let err = SplitModelError::InvalidWeight {
            node: id(3),
            weight: 1.5,
        };
        assert!(!err.is_structural());
        assert!(err.to_string().contains("1.5"));
        let ratio = SplitModelError::InvalidRatio {
            ratio: 2.0,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(ratio.node(), None);
    }
}
