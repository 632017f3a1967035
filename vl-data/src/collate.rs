//! Stacking encoded features into batches.

use crate::{common::*, features::InputFeatures, geometry::LOCATION_DIM};

/// The location of the global context region, covering the whole image.
pub const GLOBAL_LOCATION: [f32; LOCATION_DIM] = [0.0, 0.0, 1.0, 1.0, 1.0];

/// A batch of features with a global context region prepended to each image.
///
/// Region blocks have `region_len + 1` rows per example, with the global
/// region first. Region labels and targets are not extended.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub input_ids: Array2<i64>,
    pub input_mask: Array2<i64>,
    pub segment_ids: Array2<i64>,
    pub lm_label_ids: Array2<i64>,
    pub is_next: Array1<i64>,
    pub image_feat: Array3<f32>,
    pub image_target: Array3<f32>,
    pub image_loc: Array3<f32>,
    pub image_label: Array2<i64>,
    pub image_mask: Array2<i64>,
    pub multimodal_mask: Array2<i64>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.is_next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_next.is_empty()
    }
}

/// Collate features into a batch.
pub fn collate(features: &[InputFeatures]) -> Result<Batch> {
    let first = match features.first() {
        Some(first) => first,
        None => bail!("cannot collate an empty batch"),
    };

    let batch_size = features.len();
    let seq_len = first.input_ids.len();
    let (region_len, feature_dim) = first.image_feat.dim();
    let target_dim = first.image_target.ncols();

    features.iter().enumerate().try_for_each(|(index, feat)| {
        ensure!(
            feat.input_ids.len() == seq_len
                && feat.image_feat.dim() == (region_len, feature_dim)
                && feat.image_target.dim() == (region_len, target_dim)
                && feat.image_loc.dim() == (region_len, LOCATION_DIM)
                && feat.multimodal_mask.len() == region_len + seq_len,
            "the shape of features at index {} differs from the first one",
            index
        );
        Ok(())
    })?;

    let input_ids = stack_rows(features, seq_len, |feat| &feat.input_ids)?;
    let input_mask = stack_rows(features, seq_len, |feat| &feat.input_mask)?;
    let segment_ids = stack_rows(features, seq_len, |feat| &feat.segment_ids)?;
    let lm_label_ids = stack_rows(features, seq_len, |feat| &feat.lm_label_ids)?;
    let image_label = stack_rows(features, region_len, |feat| &feat.image_label)?;
    let is_next: Array1<i64> = features.iter().map(|feat| feat.is_next).collect();

    let image_mask: Vec<i64> = features
        .iter()
        .flat_map(|feat| iter::once(1).chain(feat.image_mask.iter().copied()))
        .collect();
    let image_mask = Array2::from_shape_vec((batch_size, region_len + 1), image_mask)?;

    let multimodal_mask: Vec<i64> = features
        .iter()
        .flat_map(|feat| iter::once(1).chain(feat.multimodal_mask.iter().copied()))
        .collect();
    let multimodal_mask =
        Array2::from_shape_vec((batch_size, region_len + seq_len + 1), multimodal_mask)?;

    let mut image_feat = Array3::zeros((batch_size, region_len + 1, feature_dim));
    let mut image_loc = Array3::zeros((batch_size, region_len + 1, LOCATION_DIM));
    let mut image_target = Array3::zeros((batch_size, region_len, target_dim));

    izip!(
        features,
        image_feat.outer_iter_mut(),
        image_loc.outer_iter_mut(),
        image_target.outer_iter_mut()
    )
    .for_each(|(feat, mut feat_block, mut loc_block, mut target_block)| {
        let num_present = feat.image_mask.iter().filter(|&&mask| mask == 1).count();
        let global_feat = feat.image_feat.sum_axis(Axis(0)) / num_present.max(1) as f32;

        feat_block.slice_mut(s![0, ..]).assign(&global_feat);
        feat_block.slice_mut(s![1.., ..]).assign(&feat.image_feat);
        loc_block
            .slice_mut(s![0, ..])
            .iter_mut()
            .zip(GLOBAL_LOCATION)
            .for_each(|(tgt, val)| *tgt = val);
        loc_block.slice_mut(s![1.., ..]).assign(&feat.image_loc);
        target_block.assign(&feat.image_target);
    });

    Ok(Batch {
        input_ids,
        input_mask,
        segment_ids,
        lm_label_ids,
        is_next,
        image_feat,
        image_target,
        image_loc,
        image_label,
        image_mask,
        multimodal_mask,
    })
}

fn stack_rows<F>(features: &[InputFeatures], len: usize, get: F) -> Result<Array2<i64>>
where
    F: Fn(&InputFeatures) -> &Vec<i64>,
{
    let values: Vec<i64> = features
        .iter()
        .flat_map(|feat| get(feat).iter().copied())
        .collect();
    let array = Array2::from_shape_vec((features.len(), len), values)?;
    Ok(array)
}

/// Collate conditional pairs into a text-conditional batch and an
/// image-conditional batch.
pub fn collate_pairs(pairs: &[(InputFeatures, InputFeatures)]) -> Result<(Batch, Batch)> {
    let (text, image): (Vec<_>, Vec<_>) = pairs.iter().cloned().unzip();
    Ok((collate(&text)?, collate(&image)?))
}
