//! Two-phase bounds allocation.
//!
//! **Phase 1** walks the tree top-down and places every child provisionally:
//! either at its preferred extent, packed one after another (floating
//! dividers), or in the gaps between dividers that keep their current
//! position (fixed dividers). Each split records the extent it actually
//! consumed. With floating dividers that can be smaller or larger than the
//! space it was offered; with fixed dividers it never exceeds it, so a
//! nested split absorbs its own deficit and the dividers around it stay put.
//!
//! **Phase 2** walks the tree again and fits each split's children to the
//! split's final extent:
//!
//! - Grow: weighted children receive `rint(weight * extra)` each and the
//!   last weighted child takes whatever is left, so the children always add
//!   up to the target exactly. Without weights the last child takes it all.
//! - Shrink: weighted children give up space down to their preferred
//!   extent. When that is not enough, every child shrinks in proportion to
//!   its current extent, still floored at its preferred extent. When even
//!   that is not enough (target below the sum of minimums), every child,
//!   dividers included, shrinks in proportion to its extent, floored at 0.
//!
//! Leaves and dividers receive their final rectangle in phase 2, both on the
//! node and on the bound widget.
//!
//! Ratio splits skip both strategies: the ratio alone places the divider.

use multisplit_core::Rect;

use crate::measure::PreferredSizes;
use crate::node::{NodeId, Orientation, SplitNodeKind, SplitTree};
use crate::widget::{SplitWidget, WidgetTable};

/// How phase 1 positions dividers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// Derive every position from preferred sizes.
    #[default]
    FloatingDividers,
    /// Keep dividers where they are; children fill the gaps.
    FixedDividers,
}

impl PlacementMode {
    #[must_use]
    pub const fn from_floating(floating_dividers: bool) -> Self {
        if floating_dividers {
            Self::FloatingDividers
        } else {
            Self::FixedDividers
        }
    }
}

/// Counters from one allocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationReport {
    /// Nodes that received final bounds.
    pub nodes_placed: usize,
    /// Widgets that received final bounds.
    pub widgets_applied: usize,
}

/// Lay out the tree inside `container` and push results to bound widgets.
///
/// Negative container extents are treated as zero.
pub fn allocate<W: SplitWidget>(
    tree: &mut SplitTree,
    widgets: &mut WidgetTable<W>,
    container: Rect,
    mode: PlacementMode,
) -> AllocationReport {
    let container = Rect::new(
        container.x,
        container.y,
        container.width.max(0),
        container.height.max(0),
    );
    let Some(root) = tree.root() else {
        return AllocationReport::default();
    };
    let _span = tracing::debug_span!(
        "allocate",
        width = container.width,
        height = container.height,
        ?mode
    )
    .entered();

    let sizes = PreferredSizes::measure(tree, widgets, root);
    let mut allocator = Allocator {
        tree,
        widgets,
        sizes: &sizes,
        mode,
        report: AllocationReport::default(),
    };
    allocator.place(root, container);
    allocator.reconcile(root, container);
    tracing::trace!(
        nodes = allocator.report.nodes_placed,
        widgets = allocator.report.widgets_applied,
        "allocation finished"
    );
    allocator.report
}

struct Allocator<'a, W> {
    tree: &'a mut SplitTree,
    widgets: &'a mut WidgetTable<W>,
    sizes: &'a PreferredSizes,
    mode: PlacementMode,
    report: AllocationReport,
}

impl<W: SplitWidget> Allocator<'_, W> {
    /// Phase 1: provisional placement inside `area`.
    fn place(&mut self, id: NodeId, area: Rect) {
        let Some(branch) = self.tree.node(id).and_then(|node| node.branch()).cloned() else {
            self.tree.store_bounds(id, area);
            return;
        };
        let orientation = branch.orientation;
        let children = branch.children;

        if let Some(ratio) = branch.ratio {
            let divider_extent = children
                .get(1)
                .map_or(0, |divider| self.sizes.main(*divider, orientation));
            let extents = ratio_extents(orientation.main_extent(area), divider_extent, ratio.value());
            let mut cursor = orientation.main_start(area);
            for (&child, extent) in children.iter().zip(extents) {
                self.place(child, orientation.span(area, cursor, extent));
                cursor = cursor.saturating_add(extent);
            }
            self.tree.store_bounds(id, area);
            return;
        }

        let start = orientation.main_start(area);
        let end = orientation.main_end(area);
        let mut cursor = start;
        for (index, &child) in children.iter().enumerate() {
            let rect = if self.tree.is_divider(child) {
                match self.mode {
                    PlacementMode::FloatingDividers => {
                        orientation.span(area, cursor, self.sizes.main(child, orientation))
                    }
                    PlacementMode::FixedDividers => {
                        self.fixed_divider(child, orientation, area, cursor)
                    }
                }
            } else {
                let extent = match self.mode {
                    PlacementMode::FloatingDividers => self.sizes.main(child, orientation),
                    PlacementMode::FixedDividers => {
                        let trailing = children
                            .get(index + 1)
                            .filter(|next| self.tree.is_divider(**next))
                            .map_or(end, |next| {
                                let rect = self.fixed_divider(*next, orientation, area, cursor);
                                orientation.main_start(rect)
                            });
                        trailing.saturating_sub(cursor).max(0)
                    }
                };
                orientation.span(area, cursor, extent)
            };
            self.place(child, rect);
            let placed = self.tree.bounds(child).unwrap_or(rect);
            cursor = orientation.main_end(placed);
        }
        let mut consumed = cursor.saturating_sub(start).max(0);
        if self.mode == PlacementMode::FixedDividers {
            consumed = consumed.min(orientation.main_extent(area).max(0));
        }
        self.tree
            .store_bounds(id, orientation.span(area, start, consumed));
    }

    /// Where a fixed divider goes in phase 1: its current position, pulled
    /// into `[cursor, end of area]` when the area has moved under it.
    fn fixed_divider(
        &self,
        divider: NodeId,
        orientation: Orientation,
        area: Rect,
        cursor: i32,
    ) -> Rect {
        let current = self.tree.bounds(divider).unwrap_or_default();
        let extent = orientation
            .main_extent(current)
            .clamp(0, orientation.main_extent(area).max(0));
        let latest = orientation
            .main_end(area)
            .saturating_sub(extent)
            .max(cursor);
        let leading = orientation.main_start(current).clamp(cursor, latest);
        orientation.span(area, leading, extent)
    }

    /// Phase 2: fit `id` to `target` and push final rectangles out.
    fn reconcile(&mut self, id: NodeId, target: Rect) {
        self.tree.store_bounds(id, target);
        self.report.nodes_placed += 1;
        let Some(kind) = self.tree.node(id).map(|node| node.kind().clone()) else {
            return;
        };
        let branch = match kind {
            SplitNodeKind::Leaf(leaf) => return self.apply(id, &leaf.name, target),
            SplitNodeKind::Divider(divider) => return self.apply(id, &divider.name, target),
            SplitNodeKind::Split(branch) => branch,
        };

        let orientation = branch.orientation;
        let main_target = orientation.main_extent(target);
        let extents: Vec<i32> = match branch.ratio {
            Some(ratio) => {
                let divider_extent = branch
                    .children
                    .get(1)
                    .map_or(0, |divider| self.sizes.main(*divider, orientation));
                ratio_extents(main_target, divider_extent, ratio.value()).to_vec()
            }
            None => {
                let mut tracks: Vec<Track> = branch
                    .children
                    .iter()
                    .map(|&child| self.track(child, orientation))
                    .collect();
                fit_tracks(&mut tracks, main_target);
                tracks.iter().map(|track| track.extent).collect()
            }
        };

        let mut cursor = orientation.main_start(target);
        for (&child, extent) in branch.children.iter().zip(extents) {
            self.reconcile(child, orientation.span(target, cursor, extent));
            cursor = cursor.saturating_add(extent);
        }
    }

    fn track(&self, child: NodeId, orientation: Orientation) -> Track {
        let node = self.tree.node(child);
        Track {
            extent: node.map_or(0, |node| orientation.main_extent(node.bounds())),
            minimum: self.sizes.main(child, orientation),
            weight: node.map_or(0.0, |node| node.weight()),
            divider: node.is_some_and(|node| node.is_divider()),
        }
    }

    fn apply(&mut self, id: NodeId, name: &str, bounds: Rect) {
        if self.widgets.apply(name, bounds) {
            self.report.widgets_applied += 1;
        }
        tracing::trace!(
            node = id.get(),
            name,
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            "placed"
        );
    }
}

/// `[first, divider, second]` extents of a ratio split along its main axis.
#[must_use]
pub fn ratio_extents(main: i32, divider_extent: i32, ratio: f64) -> [i32; 3] {
    let main = main.max(0);
    let divider = divider_extent.clamp(0, main);
    let available = main - divider;
    let first = rint(f64::from(available) * ratio).clamp(0, available);
    [first, divider, available - first]
}

/// Round half to even, saturating into `i32`.
fn rint(value: f64) -> i32 {
    value.round_ties_even() as i32
}

/// One child along a split's main axis during phase 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Track {
    pub extent: i32,
    /// Preferred extent; shrinking stops here unless the target is below
    /// the sum of all minimums.
    pub minimum: i32,
    pub weight: f64,
    pub divider: bool,
}

/// Resize `tracks` so their extents add up to `target` (floored at 0).
pub(crate) fn fit_tracks(tracks: &mut [Track], target: i32) {
    let target = i64::from(target.max(0));
    let consumed: i64 = tracks.iter().map(|track| i64::from(track.extent)).sum();
    if consumed <= target {
        // Both sides are in [0, i32::MAX] here.
        grow(tracks, i32::try_from(target - consumed).unwrap_or(i32::MAX));
    } else {
        shrink(tracks, consumed - target);
    }
}

fn grow(tracks: &mut [Track], extra: i32) {
    if extra == 0 {
        return;
    }
    let weighted: Vec<usize> = (0..tracks.len())
        .filter(|&i| !tracks[i].divider && tracks[i].weight > 0.0)
        .collect();
    let Some((&last, earlier)) = weighted.split_last() else {
        let absorber = tracks
            .iter()
            .rposition(|track| !track.divider)
            .or(tracks.len().checked_sub(1));
        if let Some(index) = absorber {
            tracks[index].extent += extra;
        }
        return;
    };

    let mut given = 0;
    for &index in earlier {
        let share = rint(tracks[index].weight * f64::from(extra)).clamp(0, extra - given);
        tracks[index].extent += share;
        given += share;
    }
    tracks[last].extent += extra - given;
}

fn shrink(tracks: &mut [Track], deficit: i64) {
    let content: Vec<usize> = (0..tracks.len()).filter(|&i| !tracks[i].divider).collect();
    let weighted: Vec<usize> = content
        .iter()
        .copied()
        .filter(|&i| tracks[i].weight > 0.0)
        .collect();
    let slack = |tracks: &[Track], members: &[usize]| -> i64 {
        members
            .iter()
            .map(|&i| (i64::from(tracks[i].extent) - i64::from(tracks[i].minimum)).max(0))
            .sum()
    };

    if !weighted.is_empty() && slack(tracks, &weighted) >= deficit {
        let total: f64 = weighted.iter().map(|&i| tracks[i].weight).sum();
        let shares: Vec<f64> = weighted.iter().map(|&i| tracks[i].weight / total).collect();
        cut(tracks, &weighted, &shares, deficit, Floor::Minimum);
    } else if slack(tracks, &content) >= deficit {
        let shares = extent_shares(tracks, &content);
        cut(tracks, &content, &shares, deficit, Floor::Minimum);
    } else {
        let all: Vec<usize> = (0..tracks.len()).collect();
        let shares = extent_shares(tracks, &all);
        cut(tracks, &all, &shares, deficit, Floor::Zero);
    }
}

#[derive(Clone, Copy)]
enum Floor {
    Minimum,
    Zero,
}

fn extent_shares(tracks: &[Track], members: &[usize]) -> Vec<f64> {
    let total: f64 = members.iter().map(|&i| f64::from(tracks[i].extent)).sum();
    members
        .iter()
        .map(|&i| {
            if total > 0.0 {
                f64::from(tracks[i].extent) / total
            } else {
                0.0
            }
        })
        .collect()
}

/// Take `deficit` out of `members`: first `rint(share * deficit)` each, then
/// the remainder from whoever still has room, last member first.
fn cut(tracks: &mut [Track], members: &[usize], shares: &[f64], deficit: i64, floor: Floor) {
    let room = |track: &Track| -> i32 {
        let floor = match floor {
            Floor::Minimum => track.minimum.max(0),
            Floor::Zero => 0,
        };
        (track.extent - floor).max(0)
    };

    let mut remaining = deficit;
    for (&index, &share) in members.iter().zip(shares) {
        let wanted = rint(share * deficit as f64).max(0);
        let take = wanted.min(room(&tracks[index])).min(clamp_i32(remaining));
        tracks[index].extent -= take;
        remaining -= i64::from(take);
    }
    for &index in members.iter().rev() {
        if remaining == 0 {
            break;
        }
        let take = room(&tracks[index]).min(clamp_i32(remaining));
        tracks[index].extent -= take;
        remaining -= i64::from(take);
    }
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisplit_core::Size;

    fn track(extent: i32, weight: f64) -> Track {
        Track {
            extent,
            minimum: extent,
            weight,
            divider: false,
        }
    }

    fn divider(extent: i32) -> Track {
        Track {
            extent,
            minimum: extent,
            weight: 0.0,
            divider: true,
        }
    }

    fn extents(tracks: &[Track]) -> Vec<i32> {
        tracks.iter().map(|t| t.extent).collect()
    }

    #[test]
    fn grow_last_weighted_takes_remainder() {
        // 0.3 * 10 = 3, 0.3 * 10 = 3, last weighted gets 10 - 6 = 4.
        let mut tracks = vec![
            track(10, 0.3),
            divider(2),
            track(10, 0.3),
            divider(2),
            track(10, 0.4),
        ];
        fit_tracks(&mut tracks, 44);
        assert_eq!(extents(&tracks), vec![13, 2, 13, 2, 14]);
    }

    #[test]
    fn grow_remainder_is_not_a_rounded_share() {
        // rint(1/3 * 7) = 2 for the first, the last weighted gets 7 - 2 = 5
        // even though its own weight would round to 2.
        let mut tracks = vec![track(0, 1.0 / 3.0), divider(1), track(0, 1.0 / 3.0)];
        fit_tracks(&mut tracks, 8);
        assert_eq!(extents(&tracks), vec![2, 1, 5]);
    }

    #[test]
    fn grow_without_weights_feeds_last_content_track() {
        let mut tracks = vec![track(5, 0.0), divider(1), track(5, 0.0)];
        fit_tracks(&mut tracks, 20);
        assert_eq!(extents(&tracks), vec![5, 1, 14]);
    }

    #[test]
    fn grow_caps_rounded_shares_at_extra() {
        // Each early share rounds up; the running total may not exceed extra.
        let mut tracks = vec![
            track(0, 0.3),
            divider(0),
            track(0, 0.3),
            divider(0),
            track(0, 0.3),
            divider(0),
            track(0, 0.1),
        ];
        fit_tracks(&mut tracks, 5);
        let result = extents(&tracks);
        assert_eq!(result.iter().sum::<i32>(), 5);
        assert!(result.iter().all(|&e| e >= 0));
    }

    #[test]
    fn shrink_takes_from_weighted_slack_first() {
        let mut tracks = vec![
            Track {
                extent: 100,
                minimum: 50,
                weight: 0.0,
                divider: false,
            },
            divider(10),
            Track {
                extent: 100,
                minimum: 50,
                weight: 1.0,
                divider: false,
            },
        ];
        fit_tracks(&mut tracks, 180);
        assert_eq!(extents(&tracks), vec![100, 10, 70]);
    }

    #[test]
    fn shrink_falls_back_to_extent_share_above_minimums() {
        let mut tracks = vec![
            Track {
                extent: 100,
                minimum: 20,
                weight: 0.0,
                divider: false,
            },
            divider(10),
            Track {
                extent: 100,
                minimum: 95,
                weight: 1.0,
                divider: false,
            },
        ];
        fit_tracks(&mut tracks, 150);
        let result = extents(&tracks);
        assert_eq!(result.iter().sum::<i32>(), 150);
        assert!(result[0] >= 20);
        assert!(result[2] >= 95);
        assert_eq!(result[1], 10);
    }

    #[test]
    fn shrink_below_minimums_degrades_proportionally() {
        let mut tracks = vec![track(100, 0.5), divider(10), track(100, 0.5)];
        fit_tracks(&mut tracks, 105);
        let result = extents(&tracks);
        assert_eq!(result.iter().sum::<i32>(), 105);
        assert!(result.iter().all(|&e| e >= 0));
        assert!(result[0] < 100 && result[2] < 100);
    }

    #[test]
    fn shrink_to_zero_never_goes_negative() {
        let mut tracks = vec![track(3, 0.0), divider(1), track(7, 0.0)];
        fit_tracks(&mut tracks, 0);
        assert_eq!(extents(&tracks), vec![0, 0, 0]);
        fit_tracks(&mut tracks, -5);
        assert_eq!(extents(&tracks), vec![0, 0, 0]);
    }

    #[test]
    fn ratio_extents_cover_main_exactly() {
        assert_eq!(ratio_extents(105, 5, 0.5), [50, 5, 50]);
        assert_eq!(ratio_extents(100, 10, 0.25), [22, 10, 68]);
        assert_eq!(ratio_extents(4, 10, 0.5), [0, 4, 0]);
        assert_eq!(ratio_extents(100, 0, 1.0), [100, 0, 0]);
    }

    struct Fixed(Size);

    impl SplitWidget for Fixed {
        fn preferred_size(&self) -> Size {
            self.0
        }

        fn apply_bounds(&mut self, _bounds: Rect) {}
    }

    #[test]
    fn floating_phase_one_packs_preferred_sizes() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let row = tree.row([a, d, b]).expect("row");
        tree.set_root(row).expect("root");
        let mut widgets = WidgetTable::new();
        let _ = widgets.bind("a", Fixed(Size::new(30, 10)));
        let _ = widgets.bind("d", Fixed(Size::new(4, 1)));
        let _ = widgets.bind("b", Fixed(Size::new(20, 10)));

        let report = allocate(
            &mut tree,
            &mut widgets,
            Rect::new(5, 5, 100, 40),
            PlacementMode::FloatingDividers,
        );
        assert_eq!(report.nodes_placed, 4);
        assert_eq!(report.widgets_applied, 3);
        assert_eq!(tree.bounds(a), Some(Rect::new(5, 5, 30, 40)));
        assert_eq!(tree.bounds(d), Some(Rect::new(35, 5, 4, 40)));
        // No weights: the last leaf absorbs the 46px of slack.
        assert_eq!(tree.bounds(b), Some(Rect::new(39, 5, 66, 40)));
        assert_eq!(tree.bounds(row), Some(Rect::new(5, 5, 100, 40)));
    }

    #[test]
    fn fixed_dividers_keep_their_position() {
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d = tree.divider("d").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let row = tree.row([a, d, b]).expect("row");
        tree.set_root(row).expect("root");
        tree.set_weight(a, 1.0).expect("weight");
        let mut widgets = WidgetTable::new();
        let _ = widgets.bind("d", Fixed(Size::new(4, 1)));

        let container = Rect::new(0, 0, 100, 20);
        let _ = allocate(
            &mut tree,
            &mut widgets,
            container,
            PlacementMode::FloatingDividers,
        );
        assert_eq!(tree.bounds(d), Some(Rect::new(96, 0, 4, 20)));

        tree.set_bounds(d, Rect::new(60, 0, 4, 20)).expect("move");
        let _ = allocate(&mut tree, &mut widgets, container, PlacementMode::FixedDividers);
        assert_eq!(tree.bounds(a), Some(Rect::new(0, 0, 60, 20)));
        assert_eq!(tree.bounds(d), Some(Rect::new(60, 0, 4, 20)));
        assert_eq!(tree.bounds(b), Some(Rect::new(64, 0, 36, 20)));
    }

    #[test]
    fn fixed_nested_split_absorbs_its_own_deficit() {
        // row[row[a | d1 | b] | d | c]: moving d into the inner row's space
        // must not push it back out.
        let mut tree = SplitTree::new();
        let a = tree.leaf("a").expect("leaf");
        let d1 = tree.divider("d1").expect("divider");
        let b = tree.leaf("b").expect("leaf");
        let inner = tree.row([a, d1, b]).expect("row");
        let d = tree.divider("d").expect("divider");
        let c = tree.leaf("c").expect("leaf");
        let outer = tree.row([inner, d, c]).expect("row");
        tree.set_root(outer).expect("root");
        let mut widgets = WidgetTable::new();
        for name in ["a", "b", "c"] {
            let _ = widgets.bind(name, Fixed(Size::new(50, 10)));
        }
        let _ = widgets.bind("d1", Fixed(Size::new(10, 10)));
        let _ = widgets.bind("d", Fixed(Size::new(10, 10)));

        let container = Rect::from_size(400, 50);
        let _ = allocate(
            &mut tree,
            &mut widgets,
            container,
            PlacementMode::FloatingDividers,
        );
        assert_eq!(tree.bounds(d), Some(Rect::new(110, 0, 10, 50)));

        tree.set_bounds(d, Rect::new(30, 0, 10, 50)).expect("move");
        let _ = allocate(&mut tree, &mut widgets, container, PlacementMode::FixedDividers);
        assert_eq!(tree.bounds(d), Some(Rect::new(30, 0, 10, 50)));
        assert_eq!(tree.bounds(inner), Some(Rect::new(0, 0, 30, 50)));
        assert_eq!(tree.bounds(c), Some(Rect::new(40, 0, 360, 50)));
        assert_eq!(tree.bounds(a), Some(Rect::new(0, 0, 20, 50)));
        assert_eq!(tree.bounds(d1), Some(Rect::new(20, 0, 10, 50)));
        assert_eq!(tree.bounds(b), Some(Rect::new(30, 0, 0, 50)));
    }

    #[test]
    fn fit_tracks_handles_extents_past_i32() {
        let mut tracks = vec![track(i32::MAX, 0.0), divider(10), track(i32::MAX, 0.0)];
        fit_tracks(&mut tracks, 100);
        let result = extents(&tracks);
        assert_eq!(result.iter().sum::<i32>(), 100);
        assert!(result.iter().all(|&e| e >= 0));
    }

    #[test]
    fn missing_root_is_a_no_op() {
        let mut tree = SplitTree::new();
        let mut widgets: WidgetTable<Fixed> = WidgetTable::new();
        let report = allocate(
            &mut tree,
            &mut widgets,
            Rect::from_size(10, 10),
            PlacementMode::default(),
        );
        assert_eq!(report, AllocationReport::default());
    }
}
