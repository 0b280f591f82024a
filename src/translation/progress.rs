/*!
 * Progress reporting for the translation pass.
 *
 * The pipeline and orchestrator describe where they are with a
 * `TranslationContext`; observers turn the derived `ProgressUpdate` into bars
 * or log lines.
 */

use log::debug;

/// Position of the current translation call within the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationContext {
    /// File being translated
    pub file: String,
    /// Encoding name shown next to the file
    pub encoding: String,
    /// 1-based index of the file in the run
    pub file_index: usize,
    /// Files in the run
    pub total_files: usize,
    /// Rows of the file finished before this call
    pub rows_done: usize,
    /// Rows covered by this call
    pub batch_rows: usize,
    /// Rows in the file
    pub rows_total: usize,
}

impl TranslationContext {
    /// Share of the file's rows covered once this call completes
    pub fn file_percent(&self) -> u32 {
        percent(self.rows_done + self.batch_rows, self.rows_total)
    }

    /// Share of the run covered once this call completes
    pub fn total_percent(&self) -> u32 {
        if self.total_files == 0 {
            return 0;
        }
        let file_fraction = f64::from(self.file_percent()) / 100.0;
        let done = self.file_index.saturating_sub(1) as f64 + file_fraction;
        ((done / self.total_files as f64) * 100.0).clamp(0.0, 100.0) as u32
    }
}

/// Snapshot handed to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// File being translated
    pub file: String,
    /// Encoding name shown next to the file
    pub encoding: String,
    /// Rows of the file covered, in percent
    pub file_percent: u32,
    /// Chunks of the current call sent, in percent
    pub translation_percent: u32,
    /// Run covered, in percent
    pub total_percent: u32,
    /// Rows of the file covered
    pub rows_done: usize,
    /// Rows in the file
    pub rows_total: usize,
}

impl ProgressUpdate {
    /// Build an update for `context` after `chunks_done` of `chunks_total` chunks
    pub fn from_context(context: &TranslationContext, chunks_done: usize, chunks_total: usize) -> Self {
        Self {
            file: context.file.clone(),
            encoding: context.encoding.clone(),
            file_percent: context.file_percent(),
            translation_percent: if chunks_total == 0 {
                100
            } else {
                percent(chunks_done, chunks_total)
            },
            total_percent: context.total_percent(),
            rows_done: (context.rows_done + context.batch_rows).min(context.rows_total),
            rows_total: context.rows_total,
        }
    }

    /// Human-readable progress line
    pub fn status_line(&self) -> String {
        format!(
            "{} <encoding: {} {}%> <translation progress: {}%> <total progress: {}%>",
            self.file, self.encoding, self.file_percent, self.translation_percent, self.total_percent
        )
    }
}

/// Receiver of file and translation progress
pub trait ProgressObserver: Send + Sync {
    /// A file's translation pass starts, `rows_done` rows already committed
    fn file_started(&self, _file: &str, _rows_total: usize, _rows_done: usize) {}

    /// A chunk of a translation call completed
    fn progress(&self, update: &ProgressUpdate);

    /// A file's translation pass ended
    fn file_finished(&self, _file: &str) {}
}

/// Observer writing every update to the debug log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn progress(&self, update: &ProgressUpdate) {
        debug!("{}", update.status_line());
    }
}

fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as f64 / total as f64) * 100.0) as u32
}
