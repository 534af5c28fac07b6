//! Analysis report rendering

use std::fmt::Write;

use crate::analysis::{AnalysisOutcome, AnalysisSource};

/// Render an outcome as a plain-text report
pub fn render_text(outcome: &AnalysisOutcome) -> String {
    let r = &outcome.result;
    let mut out = String::new();

    let source = match &outcome.source {
        AnalysisSource::Model { transport } => format!("model via {}", transport),
        AnalysisSource::Fallback { reason } => format!("offline estimate ({})", reason),
    };

    let _ = writeln!(out, "Resume Match Report");
    let _ = writeln!(out, "═══════════════════════════════════════");
    let _ = writeln!(out, "Source:       {}", source);
    let _ = writeln!(out, "Request:      {}", outcome.request_id);
    let _ = writeln!(out);

    let score = &r.match_score;
    let _ = writeln!(out, "Match Score:  {}/100", score.total);
    let _ = writeln!(out, "  Hard skills        {:>3}", score.hard_skills);
    let _ = writeln!(out, "  Soft skills        {:>3}", score.soft_skills);
    let _ = writeln!(out, "  Role alignment     {:>3}", score.role_alignment);
    let _ = writeln!(out, "  ATS compatibility  {:>3}", score.ats_compatibility);

    let ats = if r.ats_verdict.will_auto_reject {
        "likely rejected"
    } else {
        "likely passes"
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "ATS: {} ({})", ats, r.ats_verdict.reason);

    section(&mut out, "Missing Keywords", &r.missing_keywords);
    section(&mut out, "Action Plan", &r.action_plan);

    let lens = &r.recruiter_lens;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Recruiter Lens: {} (shortlist {}%)",
        lens.verdict, lens.shortlist_probability
    );
    section(&mut out, "Positives", &lens.positives);
    section(&mut out, "Red Flags", &lens.red_flags);

    let rewrite = &r.rewrite_suggestions;
    let _ = writeln!(out);
    let _ = writeln!(out, "Rewrite Suggestions");
    let _ = writeln!(out, "  Headline:   {}", rewrite.headline);
    let _ = writeln!(out, "  Summary:    {}", rewrite.summary);
    let _ = writeln!(out, "  Experience: {}", rewrite.experience_bullet);

    if !r.cover_letter.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Cover Letter");
        let _ = writeln!(out, "{}", r.cover_letter);
    }

    out
}

fn section(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fallback::COVER_LETTER_PLACEHOLDER;
    use crate::analysis::{AnalysisPipeline, FallbackAnalyzer};
    use crate::ai::provider::{ChainConfig, TransportChain};
    use crate::config::FallbackPolicy;

    fn offline_outcome() -> AnalysisOutcome {
        let pipeline = AnalysisPipeline::new(
            TransportChain::new(ChainConfig::default()),
            FallbackPolicy::Never,
        );
        pipeline
            .run_offline("python developer", "python sql developer")
            .unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        let outcome = offline_outcome();
        let text = render_text(&outcome);

        assert!(text.contains("Source:       offline estimate (offline)"));
        assert!(text.contains(&format!("Match Score:  {}/100", outcome.result.match_score.total)));
        assert!(text.contains("Missing Keywords\n  1. sql"));
        assert!(text.contains("Action Plan\n  1. Add missing skills: sql"));
        assert!(text.contains(COVER_LETTER_PLACEHOLDER));
    }

    #[test]
    fn test_empty_lists_marked() {
        let mut outcome = offline_outcome();
        outcome.result = FallbackAnalyzer::new().analyze("abcd", "wxyz");
        outcome.result.missing_keywords.clear();

        assert!(render_text(&outcome).contains("Missing Keywords\n  (none)"));
    }
}
