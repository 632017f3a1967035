//! Dataset and preprocessing options.

use crate::{
    common::*,
    example::{DEFAULT_FEATURE_DIM, DEFAULT_REGION_LEN, DEFAULT_TARGET_DIM},
    masking::MaskStrategy,
};

/// The dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn caption_file_name(&self) -> &'static str {
        match self {
            Self::Train => "caption_train.json",
            Self::Val => "caption_val.json",
        }
    }
}

/// Dataset options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// The directory holding the caption files.
    pub corpus_dir: PathBuf,
    pub split: Split,
}

impl DatasetConfig {
    /// The path of the identifier to caption mapping of the split.
    pub fn caption_file(&self) -> PathBuf {
        self.corpus_dir.join(self.split.caption_file_name())
    }
}

/// Example preprocessing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// The token sequence length including the start and separator markers.
    pub seq_len: usize,
    #[serde(default = "default_region_len")]
    pub region_len: usize,
    #[serde(default = "default_feature_dim")]
    pub feature_dim: usize,
    #[serde(default = "default_target_dim")]
    pub target_dim: usize,
    #[serde(default)]
    pub mask_strategy: MaskStrategy,
    /// If set, every example is encoded twice, once conditioned on the full
    /// caption and once conditioned on the full image.
    #[serde(default)]
    pub cond_mask: bool,
    /// If set, captions are never swapped and only text spans are masked.
    #[serde(default)]
    pub visualization: bool,
    /// If set, the region target is the region feature itself.
    #[serde(default)]
    pub predict_feature: bool,
    /// The base seed of worker generators. Seeds from entropy if unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PreprocessorConfig {
    pub fn new(seq_len: usize) -> Self {
        Self {
            seq_len,
            region_len: DEFAULT_REGION_LEN,
            feature_dim: DEFAULT_FEATURE_DIM,
            target_dim: DEFAULT_TARGET_DIM,
            mask_strategy: MaskStrategy::default(),
            cond_mask: false,
            visualization: false,
            predict_feature: false,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.seq_len >= 2,
            "seq_len must be at least 2, but get {}",
            self.seq_len
        );
        ensure!(self.region_len > 0, "region_len must be positive");
        ensure!(self.feature_dim > 0, "feature_dim must be positive");
        ensure!(self.target_dim > 0, "target_dim must be positive");
        Ok(())
    }

    /// Check the options against the dataset they are applied to.
    pub fn validate_for(&self, dataset: &DatasetConfig) -> Result<()> {
        self.validate()?;

        if self.visualization && dataset.split == Split::Train {
            warn!("visualization is enabled on the train split, captions will never be swapped");
        }

        Ok(())
    }
}

fn default_region_len() -> usize {
    DEFAULT_REGION_LEN
}

fn default_feature_dim() -> usize {
    DEFAULT_FEATURE_DIM
}

fn default_target_dim() -> usize {
    DEFAULT_TARGET_DIM
}
