//! The record to features pipeline.

use crate::{
    caption::CaptionPool,
    common::*,
    config::PreprocessorConfig,
    encoder::{FeatureEncoder, FeatureEncoderInit},
    example::{ExampleAssembler, ExampleAssemblerInit},
    features::EncodedRecord,
    record::RawRecord,
    tokenizer::Tokenizer,
};

/// Assembles and encodes raw records.
///
/// The preprocessor is read-only after construction and can be shared by
/// workers. Each worker brings its own random generator.
#[derive(Clone)]
pub struct Preprocessor {
    assembler: ExampleAssembler,
    encoder: FeatureEncoder,
    tokenizer: Arc<dyn Tokenizer>,
    cond_mask: bool,
}

impl Preprocessor {
    pub fn new(
        config: &PreprocessorConfig,
        captions: Arc<CaptionPool>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        config.validate()?;

        let PreprocessorConfig {
            seq_len,
            region_len,
            feature_dim,
            target_dim,
            mask_strategy,
            cond_mask,
            visualization,
            predict_feature,
            ..
        } = *config;

        let assembler = ExampleAssemblerInit {
            region_len,
            feature_dim,
            target_dim,
            predict_feature,
            visualization,
            captions,
        }
        .build()?;
        let encoder = FeatureEncoderInit {
            seq_len,
            region_len,
            strategy: mask_strategy,
            visualization,
        }
        .build()?;

        Ok(Self {
            assembler,
            encoder,
            tokenizer,
            cond_mask,
        })
    }

    pub fn assembler(&self) -> &ExampleAssembler {
        &self.assembler
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn cond_mask(&self) -> bool {
        self.cond_mask
    }

    /// Run one record through assembling and encoding.
    pub fn process<R>(&self, record: RawRecord, rng: &mut R) -> Result<EncodedRecord>
    where
        R: Rng + ?Sized,
    {
        let image_id = record.image_id.clone();
        let tokenizer = &*self.tokenizer;

        let example = self
            .assembler
            .assemble(record, tokenizer, rng)
            .with_context(|| format!("unable to assemble image '{}'", image_id))?;
        let features = self
            .encoder
            .encode_features(&example, self.cond_mask, tokenizer, rng)
            .with_context(|| format!("unable to encode image '{}'", image_id))?;

        debug!(
            "encoded image '{}' with {} boxes, is_next = {}",
            image_id, example.num_boxes, example.is_next
        );

        Ok(EncodedRecord { image_id, features })
    }
}

impl Debug for Preprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preprocessor")
            .field("assembler", &self.assembler)
            .field("encoder", &self.encoder)
            .field("vocab_size", &self.tokenizer.vocab_size())
            .field("cond_mask", &self.cond_mask)
            .finish()
    }
}

/// Create the random generator of a worker.
///
/// With a base seed, worker `index` is seeded with `seed + index`, so that
/// runs are reproducible per worker. Otherwise the generator is seeded from
/// entropy.
pub fn worker_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    }
}
