//! Resume Analysis
//!
//! - `fallback`: offline keyword-overlap analyzer
//! - `pipeline`: model analysis with the fallback policy applied

pub mod fallback;
pub mod pipeline;

pub use fallback::FallbackAnalyzer;
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, AnalysisSource};
