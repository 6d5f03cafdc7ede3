//! Name-to-widget bindings consulted by measurement and allocation.

use std::cell::RefCell;
use std::rc::Rc;

use multisplit_core::{Rect, Size};
use rustc_hash::FxHashMap;

/// Host widget laid out by a leaf or divider.
///
/// The host keeps ownership of its widgets; the table stores whatever handle
/// the host binds (a shared `Rc<RefCell<_>>`, a box, an index wrapper).
pub trait SplitWidget {
    /// Minimum-content size of the widget.
    fn preferred_size(&self) -> Size;

    /// Receive the final rectangle computed by a layout pass.
    fn apply_bounds(&mut self, bounds: Rect);
}

impl<T: SplitWidget + ?Sized> SplitWidget for Box<T> {
    fn preferred_size(&self) -> Size {
        (**self).preferred_size()
    }

    fn apply_bounds(&mut self, bounds: Rect) {
        (**self).apply_bounds(bounds);
    }
}

impl<T: SplitWidget + ?Sized> SplitWidget for Rc<RefCell<T>> {
    fn preferred_size(&self) -> Size {
        self.borrow().preferred_size()
    }

    fn apply_bounds(&mut self, bounds: Rect) {
        self.borrow_mut().apply_bounds(bounds);
    }
}

/// Widget bound to a name.
#[derive(Debug, Clone)]
pub struct WidgetTable<W> {
    widgets: FxHashMap<String, W>,
}

impl<W> Default for WidgetTable<W> {
    fn default() -> Self {
        Self {
            widgets: FxHashMap::default(),
        }
    }
}

impl<W> WidgetTable<W> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `widget` under `name`, returning the widget it replaces.
    pub fn bind(&mut self, name: impl Into<String>, widget: W) -> Option<W> {
        self.widgets.insert(name.into(), widget)
    }

    /// Remove the binding for `name`.
    pub fn unbind(&mut self, name: &str) -> Option<W> {
        self.widgets.remove(name)
    }

    /// Remove every binding whose widget matches `predicate`.
    /// Returns the names that were unbound.
    pub fn unbind_where(&mut self, mut predicate: impl FnMut(&W) -> bool) -> Vec<String> {
        let names: Vec<String> = self
            .widgets
            .iter()
            .filter(|(_, widget)| predicate(widget))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &names {
            let _ = self.widgets.remove(name);
        }
        names
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&W> {
        self.widgets.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut W> {
        self.widgets.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.widgets.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

impl<W: SplitWidget> WidgetTable<W> {
    /// Preferred size of the widget bound to `name`, zero when unbound.
    #[must_use]
    pub fn preferred_size(&self, name: &str) -> Size {
        match self.widgets.get(name) {
            Some(widget) => widget.preferred_size(),
            None => {
                tracing::trace!(name, "unbound widget measured as zero");
                Size::ZERO
            }
        }
    }

    /// Push `bounds` to the widget bound to `name`. Returns whether a widget
    /// received it.
    pub fn apply(&mut self, name: &str, bounds: Rect) -> bool {
        match self.widgets.get_mut(name) {
            Some(widget) => {
                widget.apply_bounds(bounds);
                true
            }
            None => false,
        }
    }
}
