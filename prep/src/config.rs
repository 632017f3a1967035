//! Preprocessing program configuration format.

use crate::common::*;
pub use vl_data::{DatasetConfig, PreprocessorConfig, Split};

/// The main preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub preprocessor: PreprocessorConfig,
    /// The serialized HuggingFace tokenizer file.
    pub tokenizer_file: PathBuf,
    #[serde(default)]
    pub workers: WorkerConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config: Self = json5::from_str(&text)?;
        config.preprocessor.validate_for(&config.dataset)?;
        Ok(config)
    }
}

/// Worker pool options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// The number of worker threads. Defaults to the number of CPUs.
    pub num_workers: Option<NonZeroUsize>,
    /// The capacity of the record and output channels. Defaults to twice the
    /// number of workers.
    pub channel_size: Option<NonZeroUsize>,
}

impl WorkerConfig {
    pub fn num_workers(&self) -> usize {
        self.num_workers
            .map(|num| num.get())
            .unwrap_or_else(num_cpus::get)
    }

    pub fn channel_size(&self) -> usize {
        self.channel_size
            .map(|size| size.get())
            .unwrap_or_else(|| self.num_workers() * 2)
    }
}
