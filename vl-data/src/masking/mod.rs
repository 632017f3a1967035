//! Self-supervised masking of caption tokens and image regions.

mod region;
mod token;

pub use region::*;
pub use token::*;

use crate::common::*;

/// The label of positions that are not prediction targets.
pub const IGNORE_LABEL: i64 = -1;
/// The label of masked regions.
pub const MASKED_REGION_LABEL: i64 = 1;

/// Probability that a token is selected in per-token masking.
pub const TOKEN_MASK_PROB: f64 = 0.15;
/// Probability that a region is selected in per-region masking.
pub const REGION_MASK_PROB: f64 = 0.15;
/// Probability that a region seeds an overlap group in span masking.
pub const REGION_SPAN_MASK_PROB: f64 = 0.1;
/// Regions overlapping a seed at least this much are masked together.
pub const REGION_SPAN_IOU_THRESHOLD: f32 = 0.4;
/// The maximum span length relative to the caption length.
pub const TOKEN_SPAN_RATIO: f64 = 0.3;
/// Cumulative probability to replace a selected token with the mask marker.
pub const REPLACE_WITH_MASK_PROB: f64 = 0.8;
/// Cumulative probability to replace a selected token with a random token.
pub const REPLACE_WITH_RANDOM_PROB: f64 = 0.9;

/// The masking strategy of a preprocessing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    /// Select tokens and regions independently.
    Token,
    /// Mask a contiguous token span and groups of overlapping regions.
    Span,
}

impl Default for MaskStrategy {
    fn default() -> Self {
        Self::Token
    }
}

/// The masking applied to one modality in one encoding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskPolicy {
    /// Independent selection per token or region.
    Random,
    /// Contiguous token span, or regions grouped by overlap.
    Span,
    /// No masking. The modality is kept intact to condition the other one.
    Conditional,
}

impl From<MaskStrategy> for MaskPolicy {
    fn from(from: MaskStrategy) -> Self {
        match from {
            MaskStrategy::Token => Self::Random,
            MaskStrategy::Span => Self::Span,
        }
    }
}
