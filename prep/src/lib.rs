//! The preprocessing program turning raw records into pretraining features.

mod common;
pub mod config;

use crate::{
    common::*,
    config::{Config, WorkerConfig},
};
use vl_data::{load_tokenizer, worker_rng, CaptionPool, Preprocessor, RawRecord};

const PROGRESS_INTERVAL: usize = 1000;

/// Counters of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// The number of raw records read.
    pub num_records: usize,
    /// The number of encoded passes written, two per record in conditional mode.
    pub num_passes: usize,
}

/// The entry of preprocessing program.
pub fn start(config: Arc<Config>, input: &Path, output: &Path) -> Result<Summary> {
    info!("loading captions");
    let captions = Arc::new(CaptionPool::open(config.dataset.caption_file())?);

    info!("loading tokenizer");
    let tokenizer = load_tokenizer(&config.tokenizer_file)?;
    let preprocessor = Preprocessor::new(&config.preprocessor, captions, tokenizer)?;

    let reader = BufReader::new(
        File::open(input)
            .with_context(|| format!("unable to open input file '{}'", input.display()))?,
    );
    let writer = BufWriter::new(
        File::create(output)
            .with_context(|| format!("unable to create output file '{}'", output.display()))?,
    );

    let summary = run(
        &preprocessor,
        config.preprocessor.seed,
        &config.workers,
        reader,
        writer,
    )?;
    info!(
        "wrote {} passes of {} records to '{}'",
        summary.num_passes,
        summary.num_records,
        output.display()
    );

    Ok(summary)
}

/// Process JSON lines records from `reader` and write JSON lines features to
/// `writer`.
///
/// Records are dispatched to worker threads, each owning a random generator
/// derived from `seed`. Output lines are written in completion order.
pub fn run<R, W>(
    preprocessor: &Preprocessor,
    seed: Option<u64>,
    workers: &WorkerConfig,
    reader: R,
    mut writer: W,
) -> Result<Summary>
where
    R: BufRead + Send,
    W: Write,
{
    let num_workers = workers.num_workers();
    let channel_size = workers.channel_size();
    info!("start {} workers", num_workers);

    thread::scope(|scope| -> Result<_> {
        let (record_tx, record_rx) = flume::bounded::<(usize, String)>(channel_size);
        let (output_tx, output_rx) = flume::bounded::<(usize, String)>(channel_size);

        // read lines
        let reader_handle = scope.spawn(move || -> Result<usize> {
            let mut num_records = 0;

            for (index, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                num_records += 1;

                if record_tx.send((index + 1, line)).is_err() {
                    break;
                }
            }

            Ok(num_records)
        });

        // encode records
        let worker_handles: Vec<_> = (0..num_workers)
            .map(|worker_index| {
                let record_rx = record_rx.clone();
                let output_tx = output_tx.clone();

                scope.spawn(move || -> Result<()> {
                    let mut rng = worker_rng(seed, worker_index);

                    for (line_number, line) in record_rx.iter() {
                        let record: RawRecord = serde_json::from_str(&line)
                            .with_context(|| format!("invalid record at line {}", line_number))?;
                        let encoded = preprocessor
                            .process(record, &mut rng)
                            .with_context(|| format!("failed at line {}", line_number))?;
                        let num_passes = encoded.features.passes().count();
                        let text = serde_json::to_string(&encoded)?;

                        if output_tx.send((num_passes, text)).is_err() {
                            break;
                        }
                    }

                    debug!("worker {} finished", worker_index);
                    Ok(())
                })
            })
            .collect();
        drop(record_rx);
        drop(output_tx);

        // write features
        let mut num_written = 0;
        let mut num_passes = 0;

        for (passes, text) in output_rx.iter() {
            writeln!(writer, "{}", text)?;
            num_written += 1;
            num_passes += passes;

            if num_written % PROGRESS_INTERVAL == 0 {
                info!("processed {} records", num_written);
            }
        }
        writer.flush()?;

        worker_handles.into_iter().try_for_each(|handle| {
            handle
                .join()
                .map_err(|_| format_err!("a worker thread panicked"))?
        })?;
        let num_records = reader_handle
            .join()
            .map_err(|_| format_err!("the reader thread panicked"))??;

        ensure!(
            num_written == num_records,
            "read {} records but wrote {}",
            num_records,
            num_written
        );

        Ok(Summary {
            num_records,
            num_passes,
        })
    })
}
