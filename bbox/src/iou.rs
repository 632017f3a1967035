//! Pairwise overlap between box sets.

use crate::{common::*, rect::RectFloat, Rect, HW};

/// Compute the widened IoU between every pair of boxes.
///
/// The result has one row per box in `lhs` and one column per box in `rhs`.
/// See [RectFloat::widened_iou_with] for the widening rule.
pub fn pairwise_widened_iou<T, R>(lhs: &[R], rhs: &[R], margin: &HW<T>) -> Vec<Vec<T>>
where
    T: Float,
    R: Rect<Type = T>,
{
    lhs.iter()
        .map(|lrect| {
            rhs.iter()
                .map(|rrect| lrect.widened_iou_with(rrect, margin))
                .collect()
        })
        .collect()
}
