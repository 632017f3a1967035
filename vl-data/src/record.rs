use crate::common::*;

/// One raw record of the region feature store.
///
/// The matrices hold one row per detected region. Boxes are in pixel units
/// with columns `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub image_feature: Array2<f32>,
    pub image_target: Array2<f32>,
    pub image_location: Array2<f32>,
    pub num_boxes: usize,
    pub image_h: f32,
    pub image_w: f32,
    pub image_id: String,
    pub caption: String,
}

impl RawRecord {
    /// The image size, rejecting negative or NaN extents.
    pub fn image_size(&self) -> Result<HW<f32>> {
        HW::try_from_hw([self.image_h, self.image_w]).with_context(|| {
            format!(
                "invalid size {}x{} of image '{}'",
                self.image_h, self.image_w, self.image_id
            )
        })
    }
}
