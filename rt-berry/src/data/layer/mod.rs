//! 标量场水平层对象的操作.

mod core;

pub use core::{LayerView, LayerViewMut};
