use anyhow::Result;
use approx::assert_abs_diff_eq;
use indexmap::IndexSet;
use ndarray::{array, Array2};
use rand::{rngs::StdRng, SeedableRng};
use std::{path::Path, sync::Arc};
use vl_data::{
    collate, collate_pairs, group_prefix, worker_rng, CaptionPool, DatasetConfig, EncodedFeatures,
    ExampleAssemblerInit, FeatureEncoderInit, MaskStrategy, Preprocessor, PreprocessorConfig,
    RawRecord, Split, Tokenizer, CLS_TOKEN, MASK_TOKEN, SEP_TOKEN, UNK_TOKEN,
};

struct Words {
    vocab: IndexSet<String>,
}

impl Words {
    fn new() -> Self {
        let vocab = [UNK_TOKEN, CLS_TOKEN, SEP_TOKEN, MASK_TOKEN]
            .into_iter()
            .chain("a dog runs on the grass brown lawn red car parked street".split(' '))
            .map(str::to_string)
            .collect();
        Self { vocab }
    }
}

impl Tokenizer for Words {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.vocab.get_index_of(token).map(|index| index as u32)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        self.vocab.get_index(id as usize).cloned()
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }
}

fn dataset() -> DatasetConfig {
    DatasetConfig {
        corpus_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("corpus"),
        split: Split::Val,
    }
}

fn record(image_id: &str, caption: &str) -> RawRecord {
    RawRecord {
        image_feature: Array2::from_shape_fn((2, 6), |(row, col)| (row * 6 + col) as f32),
        image_target: Array2::from_elem((2, 3), 0.25),
        image_location: array![[0.0, 0.0, 320.0, 240.0], [160.0, 120.0, 640.0, 480.0]],
        num_boxes: 2,
        image_h: 480.0,
        image_w: 640.0,
        image_id: image_id.into(),
        caption: caption.into(),
    }
}

fn config(seq_len: usize) -> PreprocessorConfig {
    PreprocessorConfig {
        region_len: 4,
        feature_dim: 6,
        target_dim: 3,
        seed: Some(0),
        ..PreprocessorConfig::new(seq_len)
    }
}

#[test]
fn load_caption_pool() -> Result<()> {
    let pool = CaptionPool::open(dataset().caption_file())?;
    assert_eq!(pool.len(), 4);
    assert_eq!(pool.num_groups(), 3);
    assert_eq!(pool.get("41230"), Some("a red car parked on the street"));

    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..200 {
        let (id, _) = pool.sample_negative("30001", &mut rng)?;
        assert_ne!(group_prefix(id), "3000");
    }

    Ok(())
}

#[test]
fn missing_caption_file_is_an_error() {
    let dataset = DatasetConfig {
        split: Split::Train,
        ..dataset()
    };
    assert!(CaptionPool::open(dataset.caption_file()).is_err());
}

/// Ten token slots and four region slots, two boxes and a three-token caption.
#[test]
fn end_to_end_fixed_shapes() -> Result<()> {
    let captions = Arc::new(CaptionPool::open(dataset().caption_file())?);
    let tokenizer = Words::new();
    let mut rng = StdRng::seed_from_u64(11);

    let assembler = ExampleAssemblerInit {
        region_len: 4,
        feature_dim: 6,
        target_dim: 3,
        predict_feature: false,
        visualization: true,
        captions,
    }
    .build()?;
    let encoder = FeatureEncoderInit {
        seq_len: 10,
        region_len: 4,
        strategy: MaskStrategy::Token,
        visualization: false,
    }
    .build()?;

    let example = assembler.assemble(record("30000", "a dog runs"), &tokenizer, &mut rng)?;
    assert_eq!(example.caption, vec!["a", "dog", "runs"]);
    assert_eq!(example.is_next, 0);
    let expect_loc: Array2<f32> = array![
        [0.0, 0.0, 0.5, 0.5, 0.25],
        [0.25, 0.25, 1.0, 1.0, 0.5625],
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0]
    ];
    example
        .image_loc
        .iter()
        .zip(&expect_loc)
        .for_each(|(lhs, rhs)| assert_abs_diff_eq!(*lhs, *rhs, epsilon = 1e-6));

    let features = encoder.encode(&example, &tokenizer, &mut rng)?;
    assert_eq!(features.input_ids.len(), 10);
    assert_eq!(features.input_ids[0], 1);
    assert_eq!(features.input_ids[4], 2);
    assert_eq!(features.input_mask, vec![1, 1, 1, 1, 1, 0, 0, 0, 0, 0]);
    assert_eq!(features.segment_ids, vec![0; 10]);
    assert_eq!(features.lm_label_ids[0], -1);
    assert_eq!(features.lm_label_ids[4], -1);
    assert!(features.lm_label_ids[5..].iter().all(|&label| label == -1));
    assert_eq!(features.image_label[2..], [-1, -1]);
    assert_eq!(features.image_mask, vec![1, 1, 0, 0]);
    assert_eq!(
        features.multimodal_mask,
        features
            .image_mask
            .iter()
            .chain(&features.input_mask)
            .copied()
            .collect::<Vec<_>>()
    );

    Ok(())
}

#[test]
fn preprocess_and_collate() -> Result<()> {
    let captions = Arc::new(CaptionPool::open(dataset().caption_file())?);
    let config = config(12);
    config.validate_for(&dataset())?;
    let preprocessor = Preprocessor::new(&config, captions, Arc::new(Words::new()))?;
    let mut rng = worker_rng(config.seed, 0);

    let features: Vec<_> = [
        record("30000", "a dog runs on the grass"),
        record("41230", "a red car parked on the street"),
    ]
    .into_iter()
    .map(|record| -> Result<_> {
        match preprocessor.process(record, &mut rng)?.features {
            EncodedFeatures::Single(features) => Ok(features),
            EncodedFeatures::Conditional { .. } => anyhow::bail!("unexpected conditional pair"),
        }
    })
    .collect::<Result<_>>()?;

    let batch = collate(&features)?;
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.input_ids.dim(), (2, 12));
    assert_eq!(batch.image_feat.dim(), (2, 5, 6));
    assert_eq!(batch.image_mask.row(0).to_vec(), vec![1, 1, 1, 0, 0]);
    assert_eq!(batch.multimodal_mask.dim(), (2, 17));

    Ok(())
}

#[test]
fn conditional_visualization_keeps_everything() -> Result<()> {
    let captions = Arc::new(CaptionPool::open(dataset().caption_file())?);
    let config = PreprocessorConfig {
        cond_mask: true,
        visualization: true,
        mask_strategy: MaskStrategy::Token,
        ..config(12)
    };
    let preprocessor = Preprocessor::new(&config, captions, Arc::new(Words::new()))?;
    let mut rng = worker_rng(config.seed, 3);

    let mut pairs = vec![];
    for _ in 0..20 {
        let record = record("30000", "a dog runs on the grass");
        let expect_feat = record.image_feature.clone();

        match preprocessor.process(record, &mut rng)?.features {
            EncodedFeatures::Conditional { text, image } => {
                for pass in [&text, &image] {
                    assert_eq!(pass.is_next, 0);
                    assert!(pass.lm_label_ids.iter().all(|&label| label == -1));
                    assert!(pass.image_label.iter().all(|&label| label == -1));
                    assert_eq!(pass.image_feat.slice(ndarray::s![..2, ..]), expect_feat);
                    assert!(!pass.input_ids.contains(&3));
                }
                pairs.push((text, image));
            }
            EncodedFeatures::Single(_) => anyhow::bail!("expect a conditional pair"),
        }
    }

    let (text, image) = collate_pairs(&pairs)?;
    assert_eq!(text.len(), 20);
    assert_eq!(image.len(), 20);

    Ok(())
}

#[test]
fn seeded_runs_are_identical() -> Result<()> {
    let captions = Arc::new(CaptionPool::open(dataset().caption_file())?);
    let config = PreprocessorConfig {
        mask_strategy: MaskStrategy::Span,
        seed: Some(1234),
        ..config(12)
    };
    let preprocessor = Preprocessor::new(&config, captions, Arc::new(Words::new()))?;

    let run = || -> Result<Vec<_>> {
        let mut rng = worker_rng(config.seed, 2);
        (0..10)
            .map(|_| preprocessor.process(record("30001", "a brown dog on a lawn"), &mut rng))
            .collect()
    };
    assert_eq!(run()?, run()?);

    Ok(())
}
