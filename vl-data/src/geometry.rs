//! Region box normalization and overlap.

use crate::common::*;
use bbox::pairwise_widened_iou;

/// The number of columns of a normalized location row.
pub const LOCATION_DIM: usize = 5;

/// Normalize a pixel box `[x1, y1, x2, y2]` into `[x1, y1, x2, y2, area]`.
///
/// Horizontal coordinates are divided by the image width and vertical ones by
/// the image height. The area is the product of the normalized height and
/// width.
pub fn normalize_location(xyxy: [f32; 4], image_size: &HW<f32>) -> [f32; LOCATION_DIM] {
    let rect = TLBR_::from_xyxy(xyxy).to_ratio(image_size);
    let [x1, y1, x2, y2] = rect.xyxy();
    [x1, y1, x2, y2, rect.area()]
}

/// Pairwise IoU among normalized location rows.
///
/// Every extent is widened by one pixel of the original image, so that
/// degenerate boxes, including zero padding rows, still overlap themselves.
pub fn pairwise_iou(locations: ArrayView2<'_, f32>, image_size: &HW<f32>) -> Array2<f32> {
    let num_rows = locations.nrows();
    let rects: Vec<_> = locations
        .outer_iter()
        .map(|row| TLBR_::from_xyxy([row[0], row[1], row[2], row[3]]))
        .collect();
    let iou = pairwise_widened_iou(&rects, &rects, &image_size.pixel_extent());

    Array2::from_shape_fn((num_rows, num_rows), |(row, col)| iou[row][col])
}
