//! Prompt Builder System
//!
//! Standardized prompt construction for the resume analysis request.
//!
//! ## Sections
//!
//! 1. **Role Definition**: the reviewer persona
//! 2. **Structured Objectives**: numbered goals
//! 3. **Documents**: resume and job description, delimited
//! 4. **Focus Enforcement**: keep the model on the documents given
//! 5. **Anti-Patterns**: explicit bad examples
//! 6. **Output Schema**: the exact JSON shape expected back

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Delimited document body
    Document { label: String, content: String },
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Focus enforcement with restrictions
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
    /// Anti-patterns with good/bad examples
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add objectives section
    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Add a delimited document
    pub fn document(mut self, label: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Document {
            label: label.to_string(),
            content: content.trim().to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add focus enforcement section
    pub fn focus(mut self, target: &str, restrictions: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Add anti-patterns section
    pub fn anti_patterns(mut self, bad: Vec<&str>, good: Vec<&str>) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.into_iter().map(String::from).collect(),
            good: good.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Document { label, content } => {
                    let tag = label.to_uppercase().replace(' ', "_");
                    prompt.push_str(&format!("<{}>\n", tag));
                    prompt.push_str(&content);
                    prompt.push_str(&format!("\n</{}>\n\n", tag));
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("## ANTI-PATTERNS\n\n");
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n");
                    prompt.push_str("<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// JSON shape the model must answer with
const OUTPUT_SCHEMA: &str = r#"{
  "matchScore": {
    "total": 0,
    "hardSkills": 0,
    "softSkills": 0,
    "roleAlignment": 0,
    "atsCompatibility": 0
  },
  "missingKeywords": ["keyword"],
  "actionPlan": ["step"],
  "recruiterLens": {
    "positives": ["strength"],
    "redFlags": ["concern"],
    "shortlistProbability": 0,
    "verdict": "one sentence"
  },
  "atsVerdict": {
    "willAutoReject": false,
    "reason": "one sentence"
  },
  "rewriteSuggestions": {
    "headline": "rewritten headline",
    "summary": "rewritten summary",
    "experienceBullet": "one rewritten experience bullet"
  },
  "coverLetter": "short tailored cover letter"
}"#;

/// Preset prompt templates
pub struct PromptTemplates;

impl PromptTemplates {
    /// Resume against job description analysis
    pub fn resume_analysis(resume: &str, job_description: &str) -> String {
        PromptBuilder::new()
            .role(
                "technical recruiter and ATS specialist",
                "matching resumes to job descriptions",
            )
            .objectives(vec![
                "Score how well the resume matches the job description (0-100 per dimension)",
                "List the job's keywords and skills the resume is missing",
                "Give a prioritized action plan to close the gaps",
                "Judge the resume the way a recruiter skimming it would",
                "Predict whether an ATS would auto-reject it and why",
                "Suggest rewrites for the headline, summary and one experience bullet",
                "Draft a short cover letter tailored to the role",
            ])
            .document("resume", resume)
            .document("job description", job_description)
            .focus(
                "the resume and job description above",
                vec![
                    "Do NOT invent experience, employers or credentials the resume does not state",
                    "Do NOT repeat a keyword in missingKeywords",
                    "All scores are integers between 0 and 100",
                ],
            )
            .anti_patterns(
                vec![
                    "\"Improve your resume\" as an action plan step",
                    "Listing a skill as missing when the resume already mentions it",
                ],
                vec![
                    "\"Add a bullet quantifying the Kubernetes migration you led\"",
                    "Missing keywords taken verbatim from the job description",
                ],
            )
            .section(
                "Output",
                &format!(
                    "Respond ONLY with valid JSON using double-quoted keys, matching this structure:\n\n{}",
                    OUTPUT_SCHEMA
                ),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnalysisResult;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("recruiter", "engineering hiring")
            .objectives(vec!["Score the match", "List gaps"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("recruiter"));
        assert!(prompt.contains("<OBJECTIVES>"));
        assert!(prompt.contains("1. Score the match"));
        assert!(prompt.contains("2. List gaps"));
    }

    #[test]
    fn test_document_section() {
        let prompt = PromptBuilder::new()
            .document("job description", "  Rust engineer  ")
            .build();

        assert_eq!(prompt, "<JOB_DESCRIPTION>\nRust engineer\n</JOB_DESCRIPTION>");
    }

    #[test]
    fn test_anti_patterns() {
        let prompt = PromptBuilder::new()
            .anti_patterns(vec!["Vague advice"], vec!["Specific rewrites"])
            .build();

        assert!(prompt.contains("WRONG: Vague advice"));
        assert!(prompt.contains("CORRECT: Specific rewrites"));
    }

    #[test]
    fn test_resume_analysis_contains_documents() {
        let prompt = PromptTemplates::resume_analysis("Rust and Go", "Needs Kubernetes");

        assert!(prompt.contains("<RESUME>\nRust and Go\n</RESUME>"));
        assert!(prompt.contains("<JOB_DESCRIPTION>\nNeeds Kubernetes\n</JOB_DESCRIPTION>"));
        assert!(prompt.contains("\"willAutoReject\""));
    }

    #[test]
    fn test_output_schema_decodes() {
        let result: AnalysisResult = serde_json::from_str(OUTPUT_SCHEMA).unwrap();
        assert_eq!(result.missing_keywords, vec!["keyword".to_string()]);
        assert!(!result.ats_verdict.will_auto_reject);
    }
}
