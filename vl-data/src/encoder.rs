//! Masking, padding and id conversion of assembled examples.

use crate::{
    common::*,
    features::{EncodedFeatures, InputExample, InputFeatures},
    masking::{mask_regions, mask_tokens, MaskPolicy, MaskStrategy, IGNORE_LABEL},
    tokenizer::{Tokenizer, TokenizerExt, CLS_TOKEN, SEP_TOKEN},
};

/// Feature encoder initializer.
#[derive(Debug, Clone)]
pub struct FeatureEncoderInit {
    /// The fixed token sequence length, including the two markers.
    pub seq_len: usize,
    /// The fixed region capacity.
    pub region_len: usize,
    pub strategy: MaskStrategy,
    /// If set, per-token and per-region selection never happens, and region
    /// span seeds are never drawn.
    pub visualization: bool,
}

impl FeatureEncoderInit {
    pub fn build(self) -> Result<FeatureEncoder> {
        let Self {
            seq_len,
            region_len,
            strategy,
            visualization,
        } = self;

        ensure!(
            seq_len >= 2,
            "seq_len must leave room for {} and {}, but get {}",
            CLS_TOKEN,
            SEP_TOKEN,
            seq_len
        );
        ensure!(region_len > 0, "region_len must be positive");

        Ok(FeatureEncoder {
            seq_len,
            region_len,
            strategy,
            visualization,
        })
    }
}

/// Encodes [InputExample]s into fixed-shape [InputFeatures].
#[derive(Debug, Clone, CopyGetters)]
pub struct FeatureEncoder {
    #[getset(get_copy = "pub")]
    seq_len: usize,
    #[getset(get_copy = "pub")]
    region_len: usize,
    #[getset(get_copy = "pub")]
    strategy: MaskStrategy,
    #[getset(get_copy = "pub")]
    visualization: bool,
}

impl FeatureEncoder {
    /// Encode with the configured strategy on both modalities.
    pub fn encode<T, R>(&self, example: &InputExample, tokenizer: &T, rng: &mut R) -> Result<InputFeatures>
    where
        T: Tokenizer + ?Sized,
        R: Rng + ?Sized,
    {
        let policy = self.strategy.into();
        self.encode_with(example, policy, policy, tokenizer, rng)
    }

    /// Encode a text-conditional pass and an image-conditional pass.
    ///
    /// The text-conditional pass keeps the caption intact and masks regions.
    /// The image-conditional pass keeps the regions intact and masks the
    /// caption. Both passes start from the same unmasked example.
    pub fn encode_conditional<T, R>(
        &self,
        example: &InputExample,
        tokenizer: &T,
        rng: &mut R,
    ) -> Result<(InputFeatures, InputFeatures)>
    where
        T: Tokenizer + ?Sized,
        R: Rng + ?Sized,
    {
        let policy = self.strategy.into();
        let text = self.encode_with(example, MaskPolicy::Conditional, policy, tokenizer, rng)?;
        let image = self.encode_with(example, policy, MaskPolicy::Conditional, tokenizer, rng)?;
        Ok((text, image))
    }

    /// Encode one pass, in single or conditional mode.
    pub fn encode_features<T, R>(
        &self,
        example: &InputExample,
        cond_mask: bool,
        tokenizer: &T,
        rng: &mut R,
    ) -> Result<EncodedFeatures>
    where
        T: Tokenizer + ?Sized,
        R: Rng + ?Sized,
    {
        let features = if cond_mask {
            let (text, image) = self.encode_conditional(example, tokenizer, rng)?;
            EncodedFeatures::Conditional { text, image }
        } else {
            EncodedFeatures::Single(self.encode(example, tokenizer, rng)?)
        };
        Ok(features)
    }

    /// Encode an example with explicit masking policies per modality.
    ///
    /// # Panics
    /// Panics if any output array misses its fixed length.
    pub fn encode_with<T, R>(
        &self,
        example: &InputExample,
        text_policy: MaskPolicy,
        region_policy: MaskPolicy,
        tokenizer: &T,
        rng: &mut R,
    ) -> Result<InputFeatures>
    where
        T: Tokenizer + ?Sized,
        R: Rng + ?Sized,
    {
        let Self {
            seq_len,
            region_len,
            visualization,
            ..
        } = *self;
        let num_boxes = example.num_boxes;
        let image_size = example.image_size()?;

        ensure!(
            example.image_feat.nrows() == region_len
                && example.image_loc.nrows() == region_len
                && num_boxes <= region_len,
            "the example has {} of {} region rows populated, but the encoder expects {} rows",
            num_boxes,
            example.image_feat.nrows(),
            region_len
        );

        let mut caption = example.caption.clone();
        truncate_tokens(&mut caption, seq_len - 2);
        let caption_label = mask_tokens(&mut caption, tokenizer, text_policy, visualization, rng)?;

        let mut image_feat = example.image_feat.clone();
        let mut image_label = mask_regions(
            &mut image_feat,
            example.image_loc.view(),
            num_boxes,
            &image_size,
            region_policy,
            visualization,
            rng,
        );

        // single segment: [CLS] caption [SEP]
        let tokens: Vec<&str> = iter::once(CLS_TOKEN)
            .chain(caption.iter().map(String::as_str))
            .chain(iter::once(SEP_TOKEN))
            .collect();
        let mut segment_ids = vec![0; tokens.len()];
        let mut lm_label_ids: Vec<i64> = iter::once(IGNORE_LABEL)
            .chain(caption_label)
            .chain(iter::once(IGNORE_LABEL))
            .collect();

        let mut input_ids: Vec<i64> = tokenizer
            .convert_tokens_to_ids(&tokens)?
            .into_iter()
            .map(i64::from)
            .collect();
        let mut input_mask = vec![1; input_ids.len()];
        let mut image_mask = vec![1; num_boxes];

        debug!("tokens: {}", tokens.iter().join(" "));

        pad_to(&mut image_mask, region_len, 0);
        pad_to(&mut image_label, region_len, IGNORE_LABEL);
        pad_to(&mut input_ids, seq_len, 0);
        pad_to(&mut input_mask, seq_len, 0);
        pad_to(&mut segment_ids, seq_len, 0);
        pad_to(&mut lm_label_ids, seq_len, IGNORE_LABEL);

        let multimodal_mask: Vec<i64> = image_mask.iter().chain(&input_mask).copied().collect();

        assert_eq!(input_ids.len(), seq_len, "input_ids length mismatch");
        assert_eq!(input_mask.len(), seq_len, "input_mask length mismatch");
        assert_eq!(segment_ids.len(), seq_len, "segment_ids length mismatch");
        assert_eq!(lm_label_ids.len(), seq_len, "lm_label_ids length mismatch");
        assert_eq!(image_mask.len(), region_len, "image_mask length mismatch");
        assert_eq!(image_label.len(), region_len, "image_label length mismatch");
        assert_eq!(
            multimodal_mask.len(),
            region_len + seq_len,
            "multimodal_mask length mismatch"
        );

        Ok(InputFeatures {
            input_ids,
            input_mask,
            segment_ids,
            lm_label_ids,
            is_next: example.is_next,
            image_feat,
            image_target: example.image_target.clone(),
            image_loc: example.image_loc.clone(),
            image_label,
            image_mask,
            multimodal_mask,
        })
    }
}

/// Drop tokens from the tail until at most `max_len` remain.
pub fn truncate_tokens<T>(tokens: &mut Vec<T>, max_len: usize) {
    while tokens.len() > max_len {
        tokens.pop();
    }
}

/// Append `value` until `vec` has `len` elements. Never shortens `vec`.
fn pad_to<T>(vec: &mut Vec<T>, len: usize, value: T)
where
    T: Clone,
{
    if vec.len() < len {
        vec.resize(len, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::WordTokenizer;
    use ndarray::array;

    fn tokenizer() -> WordTokenizer {
        WordTokenizer::new(["a", "dog", "runs", "on", "the", "green", "grass", "fast"])
    }

    fn example(caption: &str) -> InputExample {
        let mut image_feat = Array2::zeros((4, 3));
        image_feat
            .slice_mut(s![..2, ..])
            .assign(&array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let mut image_loc = Array2::zeros((4, 5));
        image_loc
            .slice_mut(s![..2, ..])
            .assign(&array![[0.0, 0.0, 0.5, 0.5, 0.25], [0.5, 0.5, 1.0, 1.0, 0.25]]);

        InputExample {
            image_target: image_feat.clone(),
            image_feat,
            image_loc,
            caption: caption.split_whitespace().map(str::to_string).collect(),
            is_next: 0,
            num_boxes: 2,
            image_w: 640.0,
            image_h: 480.0,
        }
    }

    fn encoder(strategy: MaskStrategy, visualization: bool) -> FeatureEncoder {
        FeatureEncoderInit {
            seq_len: 10,
            region_len: 4,
            strategy,
            visualization,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn truncate_drops_tail() {
        let mut tokens = vec!["a", "b", "c", "d"];
        truncate_tokens(&mut tokens, 2);
        assert_eq!(tokens, vec!["a", "b"]);
        truncate_tokens(&mut tokens, 5);
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn fixed_shapes_and_markers() {
        let tokenizer = tokenizer();
        let encoder = encoder(MaskStrategy::Token, false);
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..100 {
            let features = encoder
                .encode(&example("a dog runs"), &tokenizer, &mut rng)
                .unwrap();

            assert_eq!(features.input_ids.len(), 10);
            assert_eq!(features.lm_label_ids.len(), 10);
            assert_eq!(features.image_label.len(), 4);
            assert_eq!(features.multimodal_mask.len(), 14);

            // [CLS] and [SEP] are never targets
            assert_eq!(features.input_ids[0], 1);
            assert_eq!(features.input_ids[4], 2);
            assert_eq!(features.lm_label_ids[0], IGNORE_LABEL);
            assert_eq!(features.lm_label_ids[4], IGNORE_LABEL);
            assert!(features.lm_label_ids[5..].iter().all(|&l| l == IGNORE_LABEL));

            // padding regions are never targets
            assert_eq!(features.image_label[2..], [IGNORE_LABEL, IGNORE_LABEL]);

            assert_eq!(features.input_mask, vec![1, 1, 1, 1, 1, 0, 0, 0, 0, 0]);
            assert_eq!(features.segment_ids, vec![0; 10]);
            assert_eq!(features.image_mask, vec![1, 1, 0, 0]);
            assert_eq!(
                features.multimodal_mask,
                [features.image_mask.clone(), features.input_mask.clone()].concat()
            );
            assert!(features.input_ids[5..].iter().all(|&id| id == 0));
        }
    }

    #[test]
    fn long_caption_is_truncated() {
        let tokenizer = tokenizer();
        let encoder = encoder(MaskStrategy::Span, false);
        let mut rng = StdRng::seed_from_u64(1);
        let caption = "a dog runs on the green grass fast a dog runs";

        let features = encoder
            .encode(&example(caption), &tokenizer, &mut rng)
            .unwrap();

        assert_eq!(features.input_mask, vec![1; 10]);
        assert_eq!(features.input_ids[9], 2);
    }

    #[test]
    fn conditional_passes_keep_their_modality() {
        let tokenizer = tokenizer();
        let encoder = encoder(MaskStrategy::Token, false);
        let mut rng = StdRng::seed_from_u64(2);
        let example = example("a dog runs on the grass");
        let plain_ids = tokenizer
            .convert_tokens_to_ids(&["[CLS]", "a", "dog", "runs", "on", "the", "grass", "[SEP]"])
            .unwrap();

        for _ in 0..100 {
            let (text, image) = encoder
                .encode_conditional(&example, &tokenizer, &mut rng)
                .unwrap();

            // text pass: caption intact
            assert!(text.lm_label_ids.iter().all(|&l| l == IGNORE_LABEL));
            assert!(izip!(&text.input_ids, &plain_ids).all(|(&lhs, &rhs)| lhs == rhs as i64));

            // image pass: regions intact
            assert!(image.image_label.iter().all(|&l| l == IGNORE_LABEL));
            assert_eq!(image.image_feat, example.image_feat);
        }
    }

    #[test]
    fn conditional_visualization_is_unmasked() {
        let tokenizer = tokenizer();
        let mut rng = StdRng::seed_from_u64(3);
        let example = example("a dog runs");

        let encoded = encoder(MaskStrategy::Token, true)
            .encode_features(&example, true, &tokenizer, &mut rng)
            .unwrap();
        assert!(matches!(encoded, EncodedFeatures::Conditional { .. }));

        for features in encoded.passes() {
            assert!(features.lm_label_ids.iter().all(|&l| l == IGNORE_LABEL));
            assert!(features.image_label.iter().all(|&l| l == IGNORE_LABEL));
            assert_eq!(features.image_feat, example.image_feat);
        }
    }

    #[test]
    fn same_seed_same_features() {
        let tokenizer = tokenizer();
        let encoder = encoder(MaskStrategy::Span, false);
        let example = example("a dog runs on the green grass");

        let lhs = encoder
            .encode(&example, &tokenizer, &mut StdRng::seed_from_u64(4))
            .unwrap();
        let rhs = encoder
            .encode(&example, &tokenizer, &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn reject_short_seq_len() {
        let result = FeatureEncoderInit {
            seq_len: 1,
            region_len: 4,
            strategy: MaskStrategy::Token,
            visualization: false,
        }
        .build();
        assert!(result.is_err());
    }
}
