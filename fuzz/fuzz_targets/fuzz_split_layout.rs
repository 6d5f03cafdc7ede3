#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use multisplit_layout::{
    NodeId, Orientation, Rect, Size, SplitNodeKind, SplitPane, SplitTree, SplitWidget,
};

#[derive(Debug, Clone, Copy)]
struct Panel(Size);

impl SplitWidget for Panel {
    fn preferred_size(&self) -> Size {
        self.0
    }

    fn apply_bounds(&mut self, bounds: Rect) {
        assert!(bounds.is_well_formed(), "negative bounds applied: {bounds:?}");
    }
}

#[derive(Debug, Arbitrary)]
enum Shape {
    Leaf { width: u8, height: u8, weight: u8 },
    Split { column: bool, children: Vec<Shape>, weight: u8 },
}

#[derive(Debug, Arbitrary)]
enum Pointer {
    Down(i16, i16),
    Move(i16, i16),
    Up(i16, i16),
    Cancel,
    Relayout(u16, u16),
}

#[derive(Debug, Arbitrary)]
struct Input {
    shape: Shape,
    divider: u8,
    width: u16,
    height: u16,
    pointer: Vec<Pointer>,
}

fn build(
    shape: &Shape,
    tree: &mut SplitTree,
    pane: &mut SplitPane<Panel>,
    divider: i32,
    depth: usize,
    counter: &mut usize,
) -> Option<NodeId> {
    *counter += 1;
    let name = format!("n{counter}");
    match shape {
        Shape::Leaf {
            width,
            height,
            weight,
        } => {
            let _ = pane.bind_widget(
                name.as_str(),
                Panel(Size::new(i32::from(*width), i32::from(*height))),
            );
            let id = tree.leaf(name).ok()?;
            let _ = tree.set_weight(id, f64::from(*weight) / 4096.0);
            Some(id)
        }
        Shape::Split {
            column,
            children,
            weight,
        } => {
            if depth > 6 {
                return None;
            }
            let mut ids = Vec::new();
            for (index, child) in children.iter().take(9).enumerate() {
                if index > 0 {
                    *counter += 1;
                    let bar = format!("d{counter}");
                    let _ = pane.bind_widget(bar.as_str(), Panel(Size::new(divider, divider)));
                    ids.push(tree.divider(bar).ok()?);
                }
                ids.push(build(child, tree, pane, divider, depth + 1, counter)?);
            }
            let orientation = if *column {
                Orientation::Column
            } else {
                Orientation::Row
            };
            let id = tree.split(orientation, ids).ok()?;
            let _ = tree.set_weight(id, f64::from(*weight) / 4096.0);
            Some(id)
        }
    }
}

fn check_fit(tree: &SplitTree) {
    for node in tree.nodes() {
        assert!(node.bounds().is_well_formed(), "{node:?}");
        let SplitNodeKind::Split(branch) = node.kind() else {
            continue;
        };
        let main: i32 = branch
            .children
            .iter()
            .filter_map(|id| tree.bounds(*id))
            .map(|r| branch.orientation.main_extent(r))
            .sum();
        assert_eq!(main, branch.orientation.main_extent(node.bounds()));
    }
}

fuzz_target!(|input: Input| {
    let mut tree = SplitTree::new();
    let mut pane = SplitPane::new();
    let mut counter = 0;
    let divider = i32::from(input.divider % 16);
    let Some(root) = build(&input.shape, &mut tree, &mut pane, divider, 0, &mut counter) else {
        return;
    };
    if tree.set_root(root).is_err() || pane.set_model(tree).is_err() {
        return;
    }

    let container = Rect::new(0, 0, i32::from(input.width), i32::from(input.height));
    if pane.layout(container).is_err() {
        return;
    }
    if let Some(model) = pane.model() {
        check_fit(model);
    }

    for event in input.pointer.iter().take(64) {
        match *event {
            Pointer::Down(x, y) => {
                let _ = pane.pointer_down(i32::from(x), i32::from(y));
            }
            Pointer::Move(x, y) => {
                let _ = pane.pointer_move(i32::from(x), i32::from(y));
            }
            Pointer::Up(x, y) => {
                let _ = pane.pointer_up(i32::from(x), i32::from(y));
            }
            Pointer::Cancel => {
                let _ = pane.cancel_drag();
            }
            Pointer::Relayout(width, height) => {
                let _ = pane.layout(Rect::new(0, 0, i32::from(width), i32::from(height)));
            }
        }
    }
    let _ = pane.relayout();
    if let Some(model) = pane.model() {
        check_fit(model);
    }
});
