//! Turning raw records into examples.

use crate::{
    caption::CaptionPool,
    common::*,
    features::InputExample,
    geometry::{normalize_location, LOCATION_DIM},
    record::RawRecord,
    tokenizer::Tokenizer,
};

/// The default region capacity of an example.
pub const DEFAULT_REGION_LEN: usize = 36;
/// The default width of a region feature vector.
pub const DEFAULT_FEATURE_DIM: usize = 2048;
/// The default width of a region class distribution.
pub const DEFAULT_TARGET_DIM: usize = 1601;

/// Example assembler initializer.
#[derive(Debug, Clone)]
pub struct ExampleAssemblerInit {
    pub region_len: usize,
    pub feature_dim: usize,
    pub target_dim: usize,
    /// If set, the target block is a copy of the feature block.
    pub predict_feature: bool,
    /// If set, captions are never swapped.
    pub visualization: bool,
    pub captions: Arc<CaptionPool>,
}

impl ExampleAssemblerInit {
    pub fn build(self) -> Result<ExampleAssembler> {
        let Self {
            region_len,
            feature_dim,
            target_dim,
            predict_feature,
            visualization,
            captions,
        } = self;

        ensure!(region_len > 0, "region_len must be positive");
        ensure!(feature_dim > 0, "feature_dim must be positive");
        ensure!(target_dim > 0, "target_dim must be positive");

        Ok(ExampleAssembler {
            region_len,
            feature_dim,
            target_dim,
            predict_feature,
            visualization,
            captions,
        })
    }
}

/// Builds [InputExample]s from raw records.
#[derive(Debug, Clone, CopyGetters)]
pub struct ExampleAssembler {
    #[getset(get_copy = "pub")]
    region_len: usize,
    #[getset(get_copy = "pub")]
    feature_dim: usize,
    #[getset(get_copy = "pub")]
    target_dim: usize,
    #[getset(get_copy = "pub")]
    predict_feature: bool,
    #[getset(get_copy = "pub")]
    visualization: bool,
    captions: Arc<CaptionPool>,
}

impl ExampleAssembler {
    /// Pad the regions, normalize the boxes, choose and tokenize the caption.
    pub fn assemble<T, R>(&self, record: RawRecord, tokenizer: &T, rng: &mut R) -> Result<InputExample>
    where
        T: Tokenizer + ?Sized,
        R: Rng + ?Sized,
    {
        let image_size = record.image_size()?;
        let RawRecord {
            image_feature,
            image_target,
            image_location,
            num_boxes,
            image_h,
            image_w,
            image_id,
            caption,
        } = record;
        let region_len = self.region_len;

        ensure!(
            num_boxes <= region_len,
            "image '{}' has {} boxes, exceeding the region capacity {}",
            image_id,
            num_boxes,
            region_len
        );
        check_block(&image_feature, num_boxes, self.feature_dim, "feature", &image_id)?;
        check_block(&image_target, num_boxes, self.target_dim, "target", &image_id)?;
        check_block(&image_location, num_boxes, 4, "location", &image_id)?;

        let image_feat = pad_rows(&image_feature, num_boxes, region_len);
        let image_target = if self.predict_feature {
            image_feat.clone()
        } else {
            pad_rows(&image_target, num_boxes, region_len)
        };

        let mut image_loc = Array2::zeros((region_len, LOCATION_DIM));
        image_location
            .outer_iter()
            .take(num_boxes)
            .zip(image_loc.outer_iter_mut())
            .for_each(|(src, mut tgt)| {
                let loc = normalize_location([src[0], src[1], src[2], src[3]], &image_size);
                tgt.iter_mut().zip(loc).for_each(|(tgt, val)| *tgt = val);
            });

        let (caption, is_next) = self.random_cap(caption, &image_id, rng)?;
        let caption = tokenizer.tokenize(&caption)?;

        Ok(InputExample {
            image_feat,
            image_target,
            image_loc,
            caption,
            is_next,
            num_boxes,
            image_w,
            image_h,
        })
    }

    /// Keep the caption or swap it for a hard negative with equal chance.
    ///
    /// Returns the caption and the next-pair label, 0 for the true caption and
    /// 1 for a negative one. In visualization mode the caption is always kept.
    pub fn random_cap<R>(&self, caption: String, image_id: &str, rng: &mut R) -> Result<(String, i64)>
    where
        R: Rng + ?Sized,
    {
        if self.visualization {
            return Ok((caption, 0));
        }

        if rng.gen::<f64>() > 0.5 {
            Ok((caption, 0))
        } else {
            let (_, negative) = self.captions.sample_negative(image_id, rng)?;
            Ok((negative.to_string(), 1))
        }
    }
}

fn check_block(
    block: &Array2<f32>,
    num_boxes: usize,
    num_cols: usize,
    name: &str,
    image_id: &str,
) -> Result<()> {
    let (rows, cols) = block.dim();
    ensure!(
        rows >= num_boxes && cols == num_cols,
        "expect at least {} rows and exactly {} columns in the {} block of image '{}', but get {}x{}",
        num_boxes,
        num_cols,
        name,
        image_id,
        rows,
        cols
    );
    Ok(())
}

/// Copy the first `num_rows` rows into a zero block with `capacity` rows.
fn pad_rows(block: &Array2<f32>, num_rows: usize, capacity: usize) -> Array2<f32> {
    let mut padded = Array2::zeros((capacity, block.ncols()));
    padded
        .slice_mut(s![..num_rows, ..])
        .assign(&block.slice(s![..num_rows, ..]));
    padded
}
