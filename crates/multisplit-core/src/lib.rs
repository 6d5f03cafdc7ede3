#![forbid(unsafe_code)]

//! Geometry shared by the multisplit crates.
//!
//! Rectangles flow from the layout engine to host widgets; sizes flow back.
//! Every type here is `Copy`, so a rectangle read out of a layout tree is an
//! independent value.

pub mod geometry;

pub use geometry::{Rect, Sides, Size};
