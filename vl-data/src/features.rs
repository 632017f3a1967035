//! The per-example containers passed between the pipeline stages.

use crate::common::*;

/// An example with padded regions and a tokenized caption, before masking.
///
/// The region blocks always have `region_len` rows. Only the first
/// `num_boxes` rows are populated and the rest are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct InputExample {
    pub image_feat: Array2<f32>,
    pub image_target: Array2<f32>,
    /// Normalized `[x1, y1, x2, y2, area]` rows.
    pub image_loc: Array2<f32>,
    pub caption: Vec<String>,
    /// 0 if the caption belongs to the image, 1 for a sampled negative.
    pub is_next: i64,
    pub num_boxes: usize,
    pub image_w: f32,
    pub image_h: f32,
}

impl InputExample {
    pub fn image_size(&self) -> Result<HW<f32>> {
        HW::try_from_hw([self.image_h, self.image_w])
    }
}

/// The fixed-shape encoding of one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFeatures {
    pub input_ids: Vec<i64>,
    pub input_mask: Vec<i64>,
    pub segment_ids: Vec<i64>,
    pub lm_label_ids: Vec<i64>,
    pub is_next: i64,
    pub image_feat: Array2<f32>,
    pub image_target: Array2<f32>,
    pub image_loc: Array2<f32>,
    pub image_label: Vec<i64>,
    pub image_mask: Vec<i64>,
    pub multimodal_mask: Vec<i64>,
}

/// The encoder output for one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedFeatures {
    Single(InputFeatures),
    /// Text-conditional pass and image-conditional pass of the same example.
    Conditional {
        text: InputFeatures,
        image: InputFeatures,
    },
}

impl EncodedFeatures {
    pub fn passes(&self) -> impl Iterator<Item = &InputFeatures> {
        let (first, second) = match self {
            Self::Single(features) => (features, None),
            Self::Conditional { text, image } => (text, Some(image)),
        };
        std::iter::once(first).chain(second)
    }
}

/// Encoded features tagged with their image identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedRecord {
    pub image_id: String,
    pub features: EncodedFeatures,
}
