//! Analysis result model
//!
//! The fixed-shape record produced by the model (or the fallback analyzer)
//! and consumed by the report renderer. Keys are camelCase on the wire.
//!
//! Decoding is lenient: absent fields take their defaults, null scores read
//! as 0, and every score is rounded and clamped into `0..=100` so callers
//! never see an out-of-range value.

use serde::{Deserialize, Deserializer, Serialize};

/// Sub-score in `0..=100`
pub type Score = u8;

/// Round and clamp any number into a score
pub fn clamp_score(value: f64) -> Score {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as Score
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<Score, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(clamp_score).unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisResult {
    pub match_score: MatchScore,
    pub missing_keywords: Vec<String>,
    pub action_plan: Vec<String>,
    pub recruiter_lens: RecruiterLens,
    pub ats_verdict: AtsVerdict,
    pub rewrite_suggestions: RewriteSuggestions,
    pub cover_letter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchScore {
    #[serde(deserialize_with = "deserialize_score")]
    pub total: Score,
    #[serde(deserialize_with = "deserialize_score")]
    pub hard_skills: Score,
    #[serde(deserialize_with = "deserialize_score")]
    pub soft_skills: Score,
    #[serde(deserialize_with = "deserialize_score")]
    pub role_alignment: Score,
    #[serde(deserialize_with = "deserialize_score")]
    pub ats_compatibility: Score,
}

impl MatchScore {
    /// All sub-scores in declaration order
    pub fn all(&self) -> [Score; 5] {
        [
            self.total,
            self.hard_skills,
            self.soft_skills,
            self.role_alignment,
            self.ats_compatibility,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecruiterLens {
    pub positives: Vec<String>,
    pub red_flags: Vec<String>,
    #[serde(deserialize_with = "deserialize_score")]
    pub shortlist_probability: Score,
    pub verdict: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtsVerdict {
    pub will_auto_reject: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewriteSuggestions {
    pub headline: String,
    pub summary: String,
    pub experience_bullet: String,
}
