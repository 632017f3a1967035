use super::*;
use crate::geometry::pairwise_iou;

/// Mask region features in place and produce the region labels.
///
/// Only the first `num_boxes` rows are real regions, and one label is returned
/// for each of them. In span mode, a region drawn for masking also masks every
/// row overlapping it with IoU of at least [REGION_SPAN_IOU_THRESHOLD], and the
/// labels are derived afterwards from which rows became all zero.
pub fn mask_regions<R>(
    features: &mut Array2<f32>,
    locations: ArrayView2<'_, f32>,
    num_boxes: usize,
    image_size: &HW<f32>,
    policy: MaskPolicy,
    visualization: bool,
    rng: &mut R,
) -> Vec<i64>
where
    R: Rng + ?Sized,
{
    debug_assert!(num_boxes <= features.nrows());
    debug_assert_eq!(features.nrows(), locations.nrows());

    match policy {
        MaskPolicy::Conditional => vec![IGNORE_LABEL; num_boxes],
        MaskPolicy::Span => {
            let iou = pairwise_iou(locations, image_size);

            for index in 0..num_boxes {
                let prob: f64 = rng.gen();

                if prob < REGION_SPAN_MASK_PROB && !visualization {
                    iou.row(index)
                        .iter()
                        .positions(|&overlap| overlap >= REGION_SPAN_IOU_THRESHOLD)
                        .for_each(|other| features.row_mut(other).fill(0.0));
                }
            }

            features
                .outer_iter()
                .take(num_boxes)
                .map(|row| {
                    if row.iter().all(|&val| val == 0.0) {
                        MASKED_REGION_LABEL
                    } else {
                        IGNORE_LABEL
                    }
                })
                .collect()
        }
        MaskPolicy::Random => (0..num_boxes)
            .map(|index| {
                let prob: f64 = rng.gen();

                if prob < REGION_MASK_PROB && !visualization {
                    features.row_mut(index).fill(0.0);
                    MASKED_REGION_LABEL
                } else {
                    IGNORE_LABEL
                }
            })
            .collect(),
    }
}
