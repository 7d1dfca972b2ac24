//! Prompt templates for the analysis and interview-question surfaces.
//!
//! These build LLM-targeted text referencing stored document URIs; the
//! server never calls a model itself.

/// Interview question style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStyle {
    Technical,
    Behavioral,
    Comprehensive,
}

impl InterviewStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "technical" => Some(Self::Technical),
            "behavioral" => Some(Self::Behavioral),
            "comprehensive" => Some(Self::Comprehensive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Behavioral => "behavioral",
            Self::Comprehensive => "comprehensive",
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            Self::Technical => {
                "Focus on technical skills, tools, methodologies, and domain-specific knowledge."
            }
            Self::Behavioral => {
                "Focus on soft skills, teamwork, problem-solving approach, and past experiences."
            }
            Self::Comprehensive => {
                "Balance technical and behavioral questions, covering both hard and soft skills."
            }
        }
    }
}

impl std::fmt::Display for InterviewStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the structured CV/JD fit-analysis prompt for the `analyze_fit`
/// MCP prompt.
pub fn build_analyze_fit_prompt(cv_uri: &str, jd_uri: &str) -> String {
    format!(
        r#"You are an expert career advisor and technical recruiter. Your task is to analyze the match between a candidate's CV and a job description, providing a structured assessment.

## Resources Available

Please use the following MCP resources to access the documents:
- CV: {cv_uri}
- Job Description: {jd_uri}

## Analysis Requirements

Provide your analysis in the following STRUCTURED format:

### 1. Match Percentage (0-100%)
Provide an overall match score with a brief rationale.

### 2. Technical Gap Analysis
List specific skills/technologies from the job description that are:
- **Missing from CV**: Skills mentioned in the job but not found in the CV
- **Partial Match**: Skills mentioned but with limited experience demonstrated
- **Strong Match**: Skills well-demonstrated in the CV

### 3. Evidence-Based Questions
List 3-5 questions that the hiring manager should ask the candidate to clarify:
- Gaps in experience
- Technical claims made in the CV
- Potential concerns based on the job requirements

### 4. Key Strengths
Highlight the candidate's strongest qualifications for this role based on the CV.

### 5. Recommendations
Provide 2-3 specific suggestions for:
- How the candidate can improve their CV for this role
- Skills to highlight or reframe
- Experience to emphasize

## Important Notes

- Use the cv:// and jd:// resources to read the actual content
- Be specific and cite evidence from the documents
- Detect the natural language of the job description and respond in that language
- Focus on objective analysis rather than subjective opinions

## Response Format

Your response should be clear and well-organized with markdown formatting. Use headings for each section above."#
    )
}

/// Builds the gap-driven interview-question prompt for the
/// `generate_interview_questions` tool.
pub fn build_interview_questions_prompt(
    cv_uri: &str,
    jd_uri: &str,
    style: InterviewStyle,
    count: u32,
) -> String {
    let style_instructions = style.instructions();
    format!(
        r#"You are an expert interviewer and career advisor. Your task is to generate targeted interview questions based on the gap analysis between a candidate's CV and a job description.

## Resources Available

Please use the following MCP resources to access the documents:
- CV: {cv_uri}
- Job Description: {jd_uri}

## Task

Generate {count} interview questions that will help assess the candidate's fit for the role. The questions should be based on:
1. Gaps between the CV and job requirements
2. Areas where the CV lacks detail or evidence
3. Skills mentioned in the job description but not prominently featured in the CV
4. Potential concerns or areas needing clarification

## Question Style: {style}

{style_instructions}

## Guidelines

- Questions should be specific and targeted, not generic
- Reference specific skills, technologies, or experiences from the job description
- Focus on areas where the CV shows gaps or limited experience
- For technical questions: ask about specific tools, frameworks, or methodologies
- For behavioral questions: use the STAR method (Situation, Task, Action, Result) as a framework
- Make questions open-ended to encourage detailed responses
- Avoid yes/no questions

## Response Format

Provide your questions in a numbered list with brief context for why each question is relevant. For example:

1. **Question text** - [Context: Why this question matters based on gap analysis]

## Important Notes

- Use the cv:// and jd:// resources to read the actual content
- Be specific and cite evidence from the documents
- Generate exactly {count} questions
- Detect the natural language of the job description and respond in that language"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_parses_known_values_only() {
        assert_eq!(InterviewStyle::parse("technical"), Some(InterviewStyle::Technical));
        assert_eq!(InterviewStyle::parse("behavioral"), Some(InterviewStyle::Behavioral));
        assert_eq!(
            InterviewStyle::parse("comprehensive"),
            Some(InterviewStyle::Comprehensive)
        );
        assert_eq!(InterviewStyle::parse("casual"), None);
        assert_eq!(InterviewStyle::parse("Technical"), None);
    }

    #[test]
    fn analyze_fit_prompt_cites_both_uris() {
        let prompt = build_analyze_fit_prompt("cv://abc", "jd://def");
        assert!(prompt.contains("cv://abc"));
        assert!(prompt.contains("jd://def"));
        assert!(prompt.contains("Match Percentage"));
        assert!(prompt.contains("Technical Gap Analysis"));
    }

    #[test]
    fn interview_prompt_embeds_count_and_style() {
        let prompt = build_interview_questions_prompt(
            "cv://abc",
            "jd://def",
            InterviewStyle::Technical,
            7,
        );
        assert!(prompt.contains("Generate 7 interview questions"));
        assert!(prompt.contains("Generate exactly 7 questions"));
        assert!(prompt.contains("## Question Style: technical"));
        assert!(prompt.contains("cv://abc"));
        assert!(prompt.contains("jd://def"));
    }
}
