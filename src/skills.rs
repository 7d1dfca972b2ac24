//! Dictionary-driven skill extraction.
//!
//! Tokenizes document text, looks each token up in the skill dictionary, and
//! attaches a confidence heuristic plus any years of experience mentioned
//! near the skill. Skills are never persisted; they exist only inside a
//! single analysis.

use serde::Serialize;

use crate::dictionary::SkillsDictionary;

/// A skill detected in a document.
#[derive(Debug, Clone, Serialize)]
pub struct Skill {
    /// Normalized (lowercase) skill name.
    pub name: String,
    /// Dictionary category, e.g. "Programming Languages".
    pub category: String,
    /// Years of experience mentioned near the skill; 0 when unspecified.
    pub experience_years: u32,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Context phrases that raise extraction confidence when they immediately
/// precede the skill.
const CONTEXT_PHRASES: [&str; 8] = [
    "experience with",
    "proficient in",
    "skilled in",
    "knowledge of",
    "worked with",
    "built using",
    "developed with",
    "implemented using",
];

const DELIMITERS: [char; 13] = [
    ',', ';', '.', ':', '(', ')', '[', ']', '{', '}', ' ', '\n', '\t',
];

const NOISE_WORDS: [&str; 53] = [
    "the", "and", "with", "for", "to", "in", "on", "of", "a", "an", "is", "are", "was", "were",
    "be", "been", "have", "has", "had", "do", "does", "did", "will", "would", "could", "should",
    "may", "might", "must", "can", "about", "from", "by", "as", "at", "that", "this", "it", "its",
    "their", "them", "they", "we", "our", "you", "your", "he", "she", "his", "her", "me", "my",
    "or",
];

/// Extracts all dictionary skills mentioned in `content`, ordered by
/// descending confidence, ties broken by name.
pub fn extract_skills(content: &str, dict: &SkillsDictionary) -> Vec<Skill> {
    let content = content.to_lowercase();
    let words = tokenize_content(&content);

    let mut seen = std::collections::HashSet::new();
    let mut skills = Vec::new();

    for word in &words {
        let Some(category) = dict.lookup(word) else {
            continue;
        };
        if !seen.insert(word.clone()) {
            continue;
        }
        skills.push(Skill {
            name: word.clone(),
            category: category.to_string(),
            experience_years: extract_experience(word, &content),
            confidence: calculate_confidence(word, &content),
        });
    }

    skills.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    skills
}

/// Splits content on the fixed delimiter set, dropping short tokens and
/// stop words.
pub fn tokenize_content(content: &str) -> Vec<String> {
    content
        .split(|c: char| DELIMITERS.contains(&c))
        .filter(|w| w.len() >= 2 && !NOISE_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Confidence heuristic: `clamp(0.5 + 0.1 * occurrences + 0.2 * context_bonus, 0, 1)`
/// where the context bonus counts phrases like "experience with <skill>".
fn calculate_confidence(skill: &str, content: &str) -> f64 {
    let mut confidence = 0.5;

    let occurrences = content.matches(skill).count();
    confidence += occurrences as f64 * 0.1;

    for phrase in CONTEXT_PHRASES {
        if content.contains(&format!("{phrase} {skill}")) {
            confidence += 0.2;
        }
    }

    confidence.clamp(0.0, 1.0)
}

/// Years of experience for a skill: on lines mentioning both the skill and
/// the substring "year", the first integer within five tokens before or
/// after the skill wins. 0 when nothing matches.
fn extract_experience(skill: &str, content: &str) -> u32 {
    for line in content.lines() {
        if !line.contains(skill) || !line.contains("year") {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        for (i, word) in words.iter().enumerate() {
            if *word != skill {
                continue;
            }
            let start = i.saturating_sub(5);
            for candidate in &words[start..i] {
                if let Some(years) = leading_integer(candidate) {
                    return years;
                }
            }
            let end = (i + 5).min(words.len());
            for candidate in &words[i + 1..end] {
                if let Some(years) = leading_integer(candidate) {
                    return years;
                }
            }
        }
    }
    0
}

/// First run of digits in a token, as an integer. `None` when absent or zero.
fn leading_integer(token: &str) -> Option<u32> {
    let digits: String = token
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => None,
    }
}

/// Compares CV skills against JD skills by exact name.
///
/// Returns the matched skills (JD category, CV experience, mean confidence)
/// and the JD skills missing from the CV.
pub fn match_skills(cv_skills: &[Skill], jd_skills: &[Skill]) -> (Vec<Skill>, Vec<Skill>) {
    let mut matches = Vec::new();
    let mut missing = Vec::new();

    for jd_skill in jd_skills {
        match cv_skills.iter().find(|s| s.name == jd_skill.name) {
            Some(cv_skill) => matches.push(Skill {
                name: jd_skill.name.clone(),
                category: jd_skill.category.clone(),
                experience_years: cv_skill.experience_years,
                confidence: (cv_skill.confidence + jd_skill.confidence) / 2.0,
            }),
            None => missing.push(jd_skill.clone()),
        }
    }

    (matches, missing)
}

/// Fraction of JD skills present in the CV; 0 when the JD mentions none.
pub fn skill_coverage(cv_skills: &[Skill], jd_skills: &[Skill]) -> f64 {
    if jd_skills.is_empty() {
        return 0.0;
    }
    let (matches, _) = match_skills(cv_skills, jd_skills);
    matches.len() as f64 / jd_skills.len() as f64
}
