pub mod analysis;
pub mod error;

pub use analysis::{
    AnalysisResult, AtsVerdict, MatchScore, RecruiterLens, RewriteSuggestions, Score, clamp_score,
};
pub use error::{
    ClassifiedFailure, ErrorClassifier, ExtractionError, FailureKind, FitError, Result,
    RetryPolicy,
};
