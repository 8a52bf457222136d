//! Outlier-media analysis pipeline.
//!
//! Groups downloaded files into carousels, merges multi-image carousels into
//! PDFs, stages everything on a hosted file store, asks a generative model
//! for one structured analysis of the whole batch, salvages the model's JSON,
//! and joins it back to post metadata.

pub mod error;
pub mod gemini;
pub mod grouping;
pub mod merge;
pub mod pdf;
pub mod pipeline;
pub mod prepare;
pub mod prompt;
pub mod report;
pub mod salvage;
pub mod staging;
pub mod store;

pub use error::AnalysisError;
pub use gemini::GeminiClient;
pub use grouping::{group_media, MediaGroup};
pub use merge::merge_results;
pub use pipeline::{analyze_media_dir, AnalysisOptions, AnalysisSummary};
pub use prepare::{prepare_media, PreparedMedia};
pub use report::{generate_in_depth_report, ReportInputs};
pub use salvage::{salvage_entries, salvage_json};
pub use store::{FileState, FileStore, Generator, RemoteFile};
