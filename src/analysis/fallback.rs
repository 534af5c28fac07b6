//! Offline Fallback Analyzer
//!
//! Deterministic lexical-overlap approximation of the model analysis. Used
//! when every transport failed for network reasons or the caller is offline.
//! Never fails and never touches the network.

use std::collections::HashSet;

use tracing::debug;

use crate::constants::fallback::{AUTO_REJECT_BELOW, HARD_SKILLS, MIN_TOKEN_LEN, SOFT_SKILLS};
use crate::types::{
    AnalysisResult, AtsVerdict, MatchScore, RecruiterLens, RewriteSuggestions, Score, clamp_score,
};

pub const COVER_LETTER_PLACEHOLDER: &str =
    "Please connect to the internet for AI-generated cover letter suggestions.";

/// Keyword-overlap analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAnalyzer;

/// Intermediate overlap figures
#[derive(Debug, Clone, PartialEq)]
struct Overlap {
    match_percentage: Score,
    found_hard: Vec<&'static str>,
    found_soft: Vec<&'static str>,
    missing_hard: Vec<&'static str>,
}

impl FallbackAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Approximate an analysis from the two texts
    pub fn analyze(&self, resume: &str, job_description: &str) -> AnalysisResult {
        let overlap = Self::overlap(resume, job_description);
        let m = f64::from(overlap.match_percentage);

        debug!(
            match_percentage = overlap.match_percentage,
            found_hard = overlap.found_hard.len(),
            missing_hard = overlap.missing_hard.len(),
            "Fallback analysis computed"
        );

        let shortlist_probability = clamp_score(m * 0.8);
        let will_auto_reject = overlap.match_percentage < AUTO_REJECT_BELOW;

        AnalysisResult {
            match_score: MatchScore {
                total: overlap.match_percentage,
                hard_skills: ratio_score(overlap.found_hard.len(), HARD_SKILLS.len()),
                soft_skills: ratio_score(overlap.found_soft.len(), SOFT_SKILLS.len()),
                role_alignment: clamp_score(m * 0.9),
                ats_compatibility: clamp_score(m * 0.7),
            },
            missing_keywords: overlap.missing_hard.iter().map(|s| s.to_string()).collect(),
            action_plan: action_plan(&overlap.missing_hard),
            recruiter_lens: RecruiterLens {
                positives: positives(&overlap),
                red_flags: red_flags(&overlap),
                shortlist_probability,
                verdict: verdict(shortlist_probability).to_string(),
            },
            ats_verdict: AtsVerdict {
                will_auto_reject,
                reason: if will_auto_reject {
                    "Low keyword match score may cause ATS rejection".to_string()
                } else {
                    "Good keyword match score, likely to pass ATS screening".to_string()
                },
            },
            rewrite_suggestions: RewriteSuggestions {
                headline: "Consider a more targeted professional headline".to_string(),
                summary: "Tailor your summary to highlight relevant experience for this role"
                    .to_string(),
                experience_bullet: "Focus on quantifiable achievements and relevant skills"
                    .to_string(),
            },
            cover_letter: COVER_LETTER_PLACEHOLDER.to_string(),
        }
    }

    fn overlap(resume: &str, job_description: &str) -> Overlap {
        let resume_lower = resume.to_lowercase();
        let job_lower = job_description.to_lowercase();

        let resume_tokens = keyword_tokens(&resume_lower);
        let job_tokens = keyword_tokens(&job_lower);

        let match_percentage = if job_tokens.is_empty() {
            0
        } else {
            let common = resume_tokens.intersection(&job_tokens).count();
            ratio_score(common, job_tokens.len())
        };

        let in_both =
            |skill: &&'static str| resume_lower.contains(*skill) && job_lower.contains(*skill);

        Overlap {
            match_percentage,
            found_hard: HARD_SKILLS.iter().copied().filter(|s| in_both(s)).collect(),
            found_soft: SOFT_SKILLS.iter().copied().filter(|s| in_both(s)).collect(),
            missing_hard: HARD_SKILLS
                .iter()
                .copied()
                .filter(|s| job_lower.contains(*s) && !resume_lower.contains(*s))
                .collect(),
        }
    }
}

/// Distinct whitespace tokens longer than the keyword threshold
fn keyword_tokens(lowered: &str) -> HashSet<&str> {
    lowered
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN)
        .collect()
}

fn ratio_score(part: usize, whole: usize) -> Score {
    if whole == 0 {
        return 0;
    }
    clamp_score(part as f64 / whole as f64 * 100.0)
}

fn verdict(shortlist_probability: Score) -> &'static str {
    if shortlist_probability > 70 {
        "Strong candidate with some improvements needed"
    } else if shortlist_probability > 40 {
        "Potential candidate with significant improvements needed"
    } else {
        "Needs substantial improvements to be competitive"
    }
}

fn action_plan(missing_hard: &[&str]) -> Vec<String> {
    let first = if missing_hard.is_empty() {
        "Mirror the job description's key terms in your skills section".to_string()
    } else {
        format!("Add missing skills: {}", missing_hard.join(", "))
    };

    vec![
        first,
        "Include more metrics and numbers in experience descriptions".to_string(),
        "Highlight transferable skills from previous roles".to_string(),
        "Consider obtaining certifications for missing technologies".to_string(),
    ]
}

fn positives(overlap: &Overlap) -> Vec<String> {
    vec![
        format!(
            "Matches {}% of job description keywords",
            overlap.match_percentage
        ),
        if overlap.found_hard.is_empty() {
            "Good foundational skills".to_string()
        } else {
            format!("Has {} required technical skills", overlap.found_hard.len())
        },
        if overlap.found_soft.is_empty() {
            "Shows potential for soft skills".to_string()
        } else {
            format!("Demonstrates {} soft skills", overlap.found_soft.len())
        },
    ]
}

fn red_flags(overlap: &Overlap) -> Vec<String> {
    vec![
        if overlap.missing_hard.is_empty() {
            "Could use more specific technical skills".to_string()
        } else {
            format!(
                "Missing {} key technical skills",
                overlap.missing_hard.len()
            )
        },
        "Consider adding more quantifiable achievements".to_string(),
        "Experience descriptions could be more tailored to the role".to_string(),
    ]
}
