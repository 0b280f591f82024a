/*!
 * Per-file conversion pipeline.
 *
 * - `state`: routing branches, states and the transition table
 * - `file_pipeline`: the async driver running one file to a terminal state
 */

pub use self::file_pipeline::{
    FileJob, FileOutcome, FilePipeline, PipelineSettings, RunContext, ShutdownSignal,
};
pub use self::state::{transition, Branch, PipelineEvent, PipelineState};

pub mod file_pipeline;
pub mod state;
