//! Example preparation for masked vision-language pretraining.
//!
//! A raw record (detected regions of an image plus a caption) goes through two
//! stages. The [ExampleAssembler](example::ExampleAssembler) pads the regions
//! to a fixed capacity, normalizes their boxes and picks the caption, either
//! the true one or a hard negative. The [FeatureEncoder](encoder::FeatureEncoder)
//! then masks tokens and regions and pads everything into fixed-shape
//! [InputFeatures](features::InputFeatures).

mod common;
pub mod caption;
pub mod collate;
pub mod config;
pub mod encoder;
pub mod example;
pub mod features;
pub mod geometry;
pub mod masking;
pub mod processor;
pub mod record;
pub mod tokenizer;

pub use caption::*;
pub use collate::*;
pub use config::*;
pub use encoder::*;
pub use example::*;
pub use features::*;
pub use masking::*;
pub use processor::*;
pub use record::*;
pub use tokenizer::*;
