/*!
 * One file through detect, convert, translate, convert back and replace.
 *
 * The only write to the original path is the final atomic rename. The
 * translation pass appends translated rows to a UTF-8 work file next to the
 * source and advances the checkpoint after every flushed batch, so an
 * interrupted run resumes from the last committed batch.
 */

use log::{debug, error, info, trace, warn};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app_config::Config;
use crate::csv_codec::{repair_or_keep, LineEnding, LineLayout, Row, RowCodec, RowWriter};
use crate::encoding::decoder::{MixedEncodingDecoder, DEFAULT_MIN_CONFIDENCE};
use crate::encoding::script::lines_contain_cjk;
use crate::encoding::sniffer::{sniff_file, StatisticalSniffer, DEFAULT_SAMPLE_BYTES};
use crate::encoding::EncodingName;
use crate::errors::{PipelineError, PipelineStage};
use crate::file_utils::FileManager;
use crate::pipeline::state::{transition, Branch, PipelineEvent, PipelineState};
use crate::progress_store::{save_or_warn, ProgressStore};
use crate::translation::{ProgressObserver, TranslationContext, TranslationOrchestrator};

/// Shared flag raised by the interrupt handler
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    /// Create a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before the next file or batch
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tunables of the per-file pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Whole-file detection prefix
    pub sample_bytes: usize,
    /// Per-line confidence threshold
    pub min_confidence: f32,
    /// Rows per translation batch and checkpoint
    pub rows_per_batch: usize,
    /// Run the Latin-1/GBK cell repair before translation
    pub repair_mojibake: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sample_bytes: DEFAULT_SAMPLE_BYTES,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            rows_per_batch: 10,
            repair_mojibake: true,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            sample_bytes: config.sample_bytes,
            min_confidence: config.min_confidence,
            rows_per_batch: config.rows_per_batch.max(1),
            repair_mojibake: config.repair_mojibake,
        }
    }
}

/// Transient state of one file
#[derive(Debug, Clone)]
pub struct FileJob {
    /// File being processed; also the final output path
    pub source: PathBuf,
    /// Detected encoding
    pub encoding: EncodingName,
    /// Checkpointed row the translation pass starts from
    pub start_row: usize,
    /// Work file receiving translated rows
    pub work_path: PathBuf,
    /// 1-based position of the file in the run
    pub file_index: usize,
    /// Files in the run
    pub total_files: usize,
}

impl FileJob {
    /// Create a job for `source`, the `file_index`-th of `total_files`
    pub fn new(source: impl Into<PathBuf>, file_index: usize, total_files: usize) -> Self {
        let source = source.into();
        Self {
            work_path: FileManager::work_path(&source),
            source,
            encoding: EncodingName::Unknown,
            start_row: 0,
            file_index,
            total_files,
        }
    }
}

/// How a file's run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The original was replaced by the converted output
    Replaced {
        /// Whether a translation pass ran
        translated: bool,
        /// Rows written
        rows: usize,
        /// Characters replaced with `?` by the output encoding
        replaced_chars: usize,
    },
    /// The file was left untouched on purpose
    Skipped {
        /// Why it was skipped
        reason: String,
    },
    /// The run stopped during translation; the work file and checkpoint remain
    Interrupted {
        /// Rows committed to the work file
        rows_committed: usize,
    },
}

/// Collaborators owned by the run and lent to each file
pub struct RunContext<'a> {
    /// Translation orchestrator with the run-wide cache
    pub orchestrator: &'a mut TranslationOrchestrator,
    /// Checkpoints
    pub progress: &'a mut ProgressStore,
    /// Progress receiver
    pub observer: &'a dyn ProgressObserver,
    /// Interrupt flag
    pub shutdown: &'a ShutdownSignal,
}

/// Per-file pipeline
#[derive(Debug, Clone)]
pub struct FilePipeline {
    settings: PipelineSettings,
    decoder: MixedEncodingDecoder<StatisticalSniffer>,
}

struct StateTracker<'a> {
    path: &'a Path,
    state: PipelineState,
}

impl StateTracker<'_> {
    fn fire(&mut self, event: PipelineEvent) {
        match transition(&self.state, &event) {
            Some(next) => {
                trace!("{}: {} -> {}", self.path.display(), self.state, next);
                self.state = next;
            }
            None => error!(
                "{}: illegal pipeline event {:?} in state {}",
                self.path.display(),
                event,
                self.state
            ),
        }
    }
}

enum PassResult {
    Complete(Vec<Row>),
    Interrupted(usize),
}

impl FilePipeline {
    /// Create a pipeline with `settings`
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            decoder: MixedEncodingDecoder::new().with_min_confidence(settings.min_confidence),
        }
    }

    /// Settings in use
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run `job` to a terminal state
    ///
    /// Stage failures come back as `PipelineError` with the original untouched.
    pub async fn run(
        &self,
        mut job: FileJob,
        ctx: &mut RunContext<'_>,
    ) -> Result<FileOutcome, PipelineError> {
        let path = job.source.clone();
        let mut tracker = StateTracker {
            path: &path,
            state: PipelineState::Detected,
        };

        let result = self.drive(&mut job, &mut tracker, ctx).await;
        if result.is_err() || !tracker.state.is_terminal() {
            tracker.fire(PipelineEvent::Abandoned);
        }
        debug!("{} finished in state {}", path.display(), tracker.state);
        result
    }

    async fn drive(
        &self,
        job: &mut FileJob,
        tracker: &mut StateTracker<'_>,
        ctx: &mut RunContext<'_>,
    ) -> Result<FileOutcome, PipelineError> {
        let path = job.source.clone();

        // Detect
        job.encoding = sniff_file(&path, self.settings.sample_bytes, self.decoder.classifier());
        info!("Detected encoding for {}: {}", path.display(), job.encoding);
        tracker.fire(PipelineEvent::Classified(job.encoding.clone()));

        let Some(branch) = tracker.state.branch() else {
            warn!(
                "Unsupported encoding {} for file {}, skipping.",
                job.encoding,
                path.display()
            );
            return Ok(FileOutcome::Skipped {
                reason: format!("unsupported encoding {}", job.encoding),
            });
        };

        // Convert to UTF-8 rows
        let raw = fs::read(&path).map_err(|e| PipelineError::io(PipelineStage::Convert, &path, e))?;
        let line_ending = LineEnding::detect(&raw);
        let layout = LineLayout::scan(&raw);
        let lines = self.decoder.decode_bytes(&raw);
        drop(raw);
        debug!("Total lines in file {}: {}", path.display(), lines.len());
        let rows = RowCodec::new(line_ending)
            .parse_lines(&lines)
            .map_err(|e| PipelineError::codec(PipelineStage::Convert, &path, e))?;
        tracker.fire(PipelineEvent::Converted);

        // Script check
        let contains_cjk = lines_contain_cjk(&lines);
        tracker.fire(PipelineEvent::ScriptChecked { contains_cjk });

        // Translate
        let codec = RowCodec::new(line_ending);
        let output_encoding = branch.output_encoding();
        let row_count = rows.len();
        let encoded = if contains_cjk {
            drop(lines);
            info!("File {} contains Chinese text, translating.", path.display());
            let rows = match self.translate_pass(job, branch, rows, ctx).await? {
                PassResult::Complete(rows) => {
                    tracker.fire(PipelineEvent::TranslationFinished);
                    rows
                }
                PassResult::Interrupted(rows_committed) => {
                    info!(
                        "Interrupted {} after {} rows; progress saved.",
                        path.display(),
                        rows_committed
                    );
                    return Ok(FileOutcome::Interrupted { rows_committed });
                }
            };

            // Convert back
            codec
                .encode_rows(&rows, &output_encoding)
                .map_err(|e| PipelineError::codec(PipelineStage::ConvertBack, &path, e))?
        } else {
            debug!("No Chinese text in {}, converting only.", path.display());
            tracker.fire(PipelineEvent::TranslationSkipped);

            // Convert back line by line, keeping quoting and terminators
            codec.encode_lines(&lines, &layout, &output_encoding)
        };
        tracker.fire(PipelineEvent::ConvertedBack);

        // Replace
        FileManager::write_atomic(&path, &encoded.bytes).map_err(|source| {
            error!(
                "Failed to replace {}; the original file is unchanged: {}",
                path.display(),
                source
            );
            PipelineError::ReplaceFailed {
                path: path.clone(),
                source,
            }
        })?;
        tracker.fire(PipelineEvent::Replaced);
        debug!(
            "Replaced {} ({} -> {})",
            path.display(),
            branch.source_encoding(),
            output_encoding
        );

        // Cleanup
        if let Err(e) = ctx.progress.remove(&path) {
            warn!(
                "{} for {}: {}",
                PipelineStage::Cleanup,
                path.display(),
                e
            );
        }
        FileManager::remove_quietly(&job.work_path);

        Ok(FileOutcome::Replaced {
            translated: contains_cjk,
            rows: row_count,
            replaced_chars: encoded.replaced,
        })
    }

    /// Translate `rows` from the checkpoint on, committing every batch to the work file
    async fn translate_pass(
        &self,
        job: &mut FileJob,
        branch: Branch,
        rows: Vec<Row>,
        ctx: &mut RunContext<'_>,
    ) -> Result<PassResult, PipelineError> {
        let path = job.source.clone();
        let stage = PipelineStage::Translate;
        let total_rows = rows.len();

        let mut translated = self.resume_prefix(job, total_rows, ctx.progress);
        job.start_row = translated.len();
        if job.start_row > 0 {
            info!(
                "Resuming {} from row {} of {}",
                path.display(),
                job.start_row,
                total_rows
            );
        }

        let file = File::create(&job.work_path)
            .map_err(|e| PipelineError::io(stage, &job.work_path, e))?;
        let mut writer = RowWriter::new(RowCodec::new(LineEnding::Lf), BufWriter::new(file));
        for row in &translated {
            writer
                .write_row(row)
                .map_err(|e| PipelineError::codec(stage, &job.work_path, e))?;
        }
        writer
            .flush()
            .map_err(|e| PipelineError::io(stage, &job.work_path, e))?;

        let file_label = path.display().to_string();
        ctx.observer
            .file_started(&file_label, total_rows, job.start_row);

        let repair = self.settings.repair_mojibake && branch.allows_cell_repair();
        let batch_size = self.settings.rows_per_batch.max(1);
        let mut index = job.start_row;

        while index < total_rows {
            if ctx.shutdown.is_triggered() {
                ctx.observer.file_finished(&file_label);
                return Ok(PassResult::Interrupted(index));
            }

            let end = (index + batch_size).min(total_rows);
            let batch = &rows[index..end];

            let cells: Vec<String> = batch
                .iter()
                .flatten()
                .map(|cell| {
                    if repair {
                        repair_or_keep(cell.clone())
                    } else {
                        cell.clone()
                    }
                })
                .collect();

            let context = TranslationContext {
                file: file_label.clone(),
                encoding: branch.source_encoding().to_string(),
                file_index: job.file_index,
                total_files: job.total_files,
                rows_done: index,
                batch_rows: batch.len(),
                rows_total: total_rows,
            };
            let mut cells = ctx
                .orchestrator
                .translate_texts(&cells, &context, ctx.observer)
                .await
                .into_iter();

            for row in batch {
                let new_row: Row = cells.by_ref().take(row.len()).collect();
                writer
                    .write_row(&new_row)
                    .map_err(|e| PipelineError::codec(stage, &job.work_path, e))?;
                translated.push(new_row);
            }
            writer
                .flush()
                .map_err(|e| PipelineError::io(stage, &job.work_path, e))?;
            if let Err(e) = writer.get_ref().get_ref().sync_data() {
                debug!("sync of {} failed: {}", job.work_path.display(), e);
            }

            index = end;
            save_or_warn(ctx.progress, &path, index);
        }

        ctx.observer.file_finished(&file_label);
        Ok(PassResult::Complete(translated))
    }

    /// Rows already committed for `job`, or nothing when the checkpoint is stale
    fn resume_prefix(
        &self,
        job: &FileJob,
        total_rows: usize,
        progress: &ProgressStore,
    ) -> Vec<Row> {
        let checkpoint = progress.get(&job.source);
        if checkpoint == 0 {
            return Vec::new();
        }

        if checkpoint > total_rows {
            warn!(
                "Checkpoint {} for {} exceeds its {} rows, restarting from row 0",
                checkpoint,
                job.source.display(),
                total_rows
            );
            return Vec::new();
        }

        let committed = fs::read_to_string(&job.work_path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                let lines: Vec<&str> = text.split_terminator('\n').collect();
                RowCodec::default()
                    .parse_lines(&lines)
                    .map_err(|e| e.to_string())
            });

        match committed {
            Ok(mut rows) if rows.len() >= checkpoint => {
                rows.truncate(checkpoint);
                rows
            }
            Ok(rows) => {
                warn!(
                    "Work file {} holds {} rows, checkpoint says {}; restarting from row 0",
                    job.work_path.display(),
                    rows.len(),
                    checkpoint
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "Cannot read work file {} ({}); restarting from row 0",
                    job.work_path.display(),
                    e
                );
                Vec::new()
            }
        }
    }
}
