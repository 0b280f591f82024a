use anyhow::{anyhow, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::pipeline::{FileJob, FileOutcome, FilePipeline, PipelineSettings, RunContext, ShutdownSignal};
use crate::progress_store::ProgressStore;
use crate::providers::{build_backends, TranslationBackend};
use crate::translation::{
    CacheStats, ProgressObserver, ProgressUpdate, TranslationCache, TranslationOrchestrator,
};

// @module: Application controller for directory conversion runs

/// Totals of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Files found under the root
    pub total: usize,
    /// Files that reached a terminal outcome, failures included
    pub processed: usize,
    /// Files translated and replaced
    pub translated: usize,
    /// Files re-encoded without translation
    pub converted: usize,
    /// Files skipped on purpose (unsupported encoding)
    pub skipped: usize,
    /// Files abandoned after a stage failure
    pub failed: usize,
    /// Whether the run stopped on an interrupt
    pub interrupted: bool,
    /// Translation cache counters
    pub cache: CacheStats,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// Progress observer feeding the per-file row bar
struct RowBarObserver {
    bar: ProgressBar,
}

impl ProgressObserver for RowBarObserver {
    fn file_started(&self, file: &str, rows_total: usize, rows_done: usize) {
        self.bar.reset();
        self.bar.set_length(rows_total as u64);
        self.bar.set_position(rows_done as u64);
        self.bar.set_message(display_name(Path::new(file)));
    }

    fn progress(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.rows_done as u64);
        debug!("{}", update.status_line());
    }

    fn file_finished(&self, _file: &str) {
        self.bar.set_message("idle");
    }
}

/// Main application controller for directory conversion runs
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Per-file pipeline
    pipeline: FilePipeline,
    // @field: Translation with the run-wide cache
    orchestrator: TranslationOrchestrator,
    // @field: Checkpoints
    progress: ProgressStore,
    // @field: Interrupt flag
    shutdown: ShutdownSignal,
    // @field: Draw progress bars on stderr
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the backends named in the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let backends = build_backends(&config.translation)?;
        Ok(Self::with_backends(config, backends))
    }

    /// Create a controller using the given backends instead of the configured ones
    pub fn with_backends(config: Config, backends: Vec<Box<dyn TranslationBackend>>) -> Self {
        let cache = TranslationCache::new(config.translation.cache_enabled);
        let orchestrator = TranslationOrchestrator::from_config(&config, backends, cache);
        let progress = ProgressStore::open(&config.progress_file);
        let pipeline = FilePipeline::new(PipelineSettings::from(&config));

        Self {
            config,
            pipeline,
            orchestrator,
            progress,
            shutdown: ShutdownSignal::new(),
            show_progress: true,
        }
    }

    /// Share `signal` as the interrupt flag
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    /// Enable or disable the progress bars
    pub fn with_progress_bars(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// The interrupt flag used by this controller
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    fn bar_style(template: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    /// Convert every matching file under `root_dir`
    pub async fn run_folder<P: AsRef<Path>>(&mut self, root_dir: P) -> Result<RunSummary> {
        let start_time = Instant::now();
        let root_dir = root_dir.as_ref();

        if !FileManager::dir_exists(root_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", root_dir));
        }

        let files: Vec<PathBuf> = FileManager::find_files(root_dir, &self.config.file_extension)?;
        let total_files = files.len();
        info!(
            "Total {} files to process: {}",
            self.config.file_extension, total_files
        );

        let multi_progress = if self.show_progress {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let folder_pb = multi_progress.add(ProgressBar::new(total_files as u64));
        folder_pb.set_style(Self::bar_style(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}",
        ));
        let rows_pb = multi_progress.add(ProgressBar::new(0));
        rows_pb.set_style(Self::bar_style(
            "  [{bar:40.yellow/blue}] {pos}/{len} rows {msg}",
        ));
        let observer = RowBarObserver { bar: rows_pb };

        let mut summary = RunSummary {
            total: total_files,
            processed: 0,
            translated: 0,
            converted: 0,
            skipped: 0,
            failed: 0,
            interrupted: false,
            cache: self.orchestrator.cache().stats(),
            elapsed: Duration::ZERO,
        };

        for (index, file) in files.iter().enumerate() {
            if self.shutdown.is_triggered() {
                summary.interrupted = true;
                break;
            }

            let file_name = display_name(file);
            folder_pb.set_message(format!("Processing: {}", file_name));
            info!("Processing file {} of {}: {}", index + 1, total_files, file.display());

            let job = FileJob::new(file.clone(), index + 1, total_files);
            let mut ctx = RunContext {
                orchestrator: &mut self.orchestrator,
                progress: &mut self.progress,
                observer: &observer,
                shutdown: &self.shutdown,
            };

            match self.pipeline.run(job, &mut ctx).await {
                Ok(FileOutcome::Replaced {
                    translated,
                    rows,
                    replaced_chars,
                }) => {
                    summary.processed += 1;
                    if translated {
                        summary.translated += 1;
                    } else {
                        summary.converted += 1;
                    }
                    info!(
                        "Success: {} ({} rows{})",
                        file.display(),
                        rows,
                        if replaced_chars > 0 {
                            format!(", {} characters replaced", replaced_chars)
                        } else {
                            String::new()
                        }
                    );
                }
                Ok(FileOutcome::Skipped { reason }) => {
                    summary.processed += 1;
                    summary.skipped += 1;
                    warn!("Skipped {}: {}", file.display(), reason);
                }
                Ok(FileOutcome::Interrupted { rows_committed }) => {
                    summary.interrupted = true;
                    warn!(
                        "Stopped in {} after {} committed rows; rerun to resume.",
                        file.display(),
                        rows_committed
                    );
                    break;
                }
                Err(e) => {
                    summary.processed += 1;
                    summary.failed += 1;
                    error!("Error processing file {} at {} stage: {}", file_name, e.stage(), e);
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message(if summary.interrupted {
            "Interrupted"
        } else {
            "Folder processing complete"
        });
        observer.bar.finish_and_clear();

        summary.cache = self.orchestrator.cache().stats();
        summary.elapsed = start_time.elapsed();

        info!(
            "Folder processing completed: {} processed ({} translated, {} converted), {} skipped, {} errors in {}",
            summary.processed,
            summary.translated,
            summary.converted,
            summary.skipped,
            summary.failed,
            Self::format_duration(summary.elapsed)
        );
        info!(
            "Translation cache: {} hits, {} misses, {} entries ({:.1}% hit rate)",
            summary.cache.hits,
            summary.cache.misses,
            summary.cache.entries,
            summary.cache.hit_rate() * 100.0
        );
        if summary.interrupted {
            warn!("Run interrupted; progress saved to {}", self.progress.path().display());
        }

        Ok(summary)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
