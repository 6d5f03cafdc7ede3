//! Structural validation of a split tree before it is used as a model.

use crate::error::{InvalidModelReason, SplitModelError};
use crate::node::{NodeId, SplitNodeKind, SplitTree};

/// Slack allowed on the per-split weight total so that sums like
/// `0.1 + 0.2 + 0.7` are not rejected for binary rounding.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Validate the whole tree reachable from its root.
///
/// Rules, per split:
/// - the alternating form holds at least three children;
/// - the ratio form holds exactly `first, divider, second`;
/// - even positions hold leaves or splits, odd positions hold dividers;
/// - child weights add up to at most 1.0;
/// - every child points back at the split.
///
/// The root must exist and must not be a divider.
pub fn validate(tree: &SplitTree) -> Result<(), SplitModelError> {
    let Some(root) = tree.root() else {
        return Err(SplitModelError::InvalidModel {
            node: None,
            reason: InvalidModelReason::MissingRoot,
        });
    };
    let Some(record) = tree.node(root) else {
        return Err(SplitModelError::UnknownNode { node: root });
    };
    if record.is_divider() {
        return Err(SplitModelError::invalid(root, InvalidModelReason::DividerRoot));
    }
    validate_node(tree, root)
}

/// Validate the subtree rooted at `id`.
pub fn validate_node(tree: &SplitTree, id: NodeId) -> Result<(), SplitModelError> {
    let Some(record) = tree.node(id) else {
        return Err(SplitModelError::UnknownNode { node: id });
    };
    let SplitNodeKind::Split(branch) = record.kind() else {
        return Ok(());
    };

    let count = branch.children.len();
    if branch.ratio.is_some() {
        if count != 3 {
            return Err(SplitModelError::invalid(
                id,
                InvalidModelReason::BinaryShape { count },
            ));
        }
    } else if count < 3 {
        return Err(SplitModelError::invalid(
            id,
            InvalidModelReason::TooFewChildren { count },
        ));
    }

    let mut total = 0.0;
    for (index, &child) in branch.children.iter().enumerate() {
        let Some(child_record) = tree.node(child) else {
            return Err(SplitModelError::UnknownNode { node: child });
        };
        if child_record.parent() != Some(id) {
            return Err(SplitModelError::invalid(
                id,
                InvalidModelReason::ParentMismatch {
                    child,
                    actual: child_record.parent(),
                },
            ));
        }
        let divider = child_record.is_divider();
        if index % 2 == 0 && divider {
            return Err(SplitModelError::invalid(
                id,
                InvalidModelReason::UnexpectedDivider { index },
            ));
        }
        if index % 2 == 1 && !divider {
            return Err(SplitModelError::invalid(
                id,
                InvalidModelReason::ExpectedDivider { index },
            ));
        }
        total += child_record.weight();
    }
    if total > 1.0 + WEIGHT_SUM_TOLERANCE {
        return Err(SplitModelError::invalid(
            id,
            InvalidModelReason::WeightOverflow { total },
        ));
    }

    for &child in &branch.children {
        if !tree.is_divider(child) {
            validate_node(tree, child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Orientation, SplitRatio};

    fn reason(result: Result<(), SplitModelError>) -> InvalidModelReason {
        match result {
            Err(SplitModelError::InvalidModel { reason, .. }) => reason,
            other => panic!("expected InvalidModel, got {other:?}"),
        }
    }

    #[test]
    fn accepts_alternating_row() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let row = tree.row([a, d, b]).expect("row");
        tree.set_root(row).expect("root");
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn single_leaf_root_is_valid() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        tree.set_root(a).expect("root");
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn rejects_missing_or_divider_root() {
        let mut tree = SplitTree::new();
        assert_eq!(reason(validate(&tree)), InvalidModelReason::MissingRoot);
        let d = tree.divider("d").expect("divider");
        tree.set_root(d).expect("root");
        assert_eq!(reason(validate(&tree)), InvalidModelReason::DividerRoot);
    }

    #[test]
    fn rejects_two_children() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let row = tree.row([a, d]).expect("row");
        tree.set_root(row).expect("root");
        let err = validate(&tree).expect_err("too few children");
        assert_eq!(err.node(), Some(row));
        assert_eq!(
            reason(Err(err)),
            InvalidModelReason::TooFewChildren { count: 2 }
        );
    }

    #[test]
    fn rejects_broken_alternation() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let b = tree.leaf("b").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let row = tree.row([a, b, d]).expect("row");
        tree.set_root(row).expect("root");
        assert_eq!(
            reason(validate(&tree)),
            InvalidModelReason::ExpectedDivider { index: 1 }
        );

        tree.set_children(row, [d, a, b]).expect("reorder");
        assert_eq!(
            reason(validate(&tree)),
            InvalidModelReason::UnexpectedDivider { index: 0 }
        );
    }

    #[test]
    fn weight_total_tolerates_float_noise_but_not_overflow() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d1 = tree.divider("d1").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let d2 = tree.divider("d2").expect("divider");
        let c = tree.leaf("c").expect("leaf");
        let row = tree.row([a, d1, b, d2, c]).expect("row");
        tree.set_root(row).expect("root");
        tree.set_weight(a, 0.1).expect("weight");
        tree.set_weight(b, 0.2).expect("weight");
        tree.set_weight(c, 0.7).expect("weight");
        assert_eq!(validate(&tree), Ok(()));

        tree.set_weight(c, 0.75).expect("weight");
        assert!(matches!(
            reason(validate(&tree)),
            InvalidModelReason::WeightOverflow { .. }
        ));
    }

    #[test]
    fn recurses_into_nested_splits() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d1 = tree.divider("d1").expect("divider");
        let inner = tree.column([a, d1]).expect("inner");
        let d2 = tree.divider("d2").expect("divider");
        let c = tree.leaf("c").expect("leaf");
        let outer = tree.row([inner, d2, c]).expect("outer");
        tree.set_root(outer).expect("root");
        let err = validate(&tree).expect_err("inner too small");
        assert_eq!(err.node(), Some(inner));
    }

    #[test]
    fn ratio_split_needs_exactly_three() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let split = tree
            .ratio_split(Orientation::Row, a, d, b, SplitRatio::default())
            .expect("split");
        tree.set_root(split).expect("root");
        assert_eq!(validate(&tree), Ok(()));

        let d2 = tree.divider("d2").expect("divider");
        let c = tree.leaf("c").expect("leaf");
        tree.set_children(split, [a, d, b, d2, c]).expect("grow");
        assert_eq!(
            reason(validate(&tree)),
            InvalidModelReason::BinaryShape { count: 5 }
        );
    }
}
