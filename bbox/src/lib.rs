//! Safe bounding box types and functions.

mod common;

pub mod into_tlbr;
pub use into_tlbr::*;

pub use rect::*;
pub mod rect;

pub use hw::*;
pub mod hw;

pub use iou::*;
pub mod iou;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat, RectNum};
}
