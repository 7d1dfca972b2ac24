//! CV / job-description matching engine.
//!
//! Builds an ephemeral two-document BM25 index per analysis, derives term
//! overlap metrics from it, extracts dictionary skills from both documents,
//! and folds everything into a weighted aggregate score. The engine holds no
//! mutable state, so given identical inputs and the same dictionary the
//! output is bit-identical.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::bm25::InvertedIndex;
use crate::dictionary::SkillsDictionary;
use crate::errors::{Error, Result};
use crate::scoring::{self, ScoreBreakdown, ScoringWeights};
use crate::skills::{self, Skill};

/// Caps for the ranked output lists.
const TOP_SKILLS_LIMIT: usize = 10;
const MISSING_SKILLS_LIMIT: usize = 20;
const COMMON_TERMS_LIMIT: usize = 15;

/// A term with its BM25 match score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermScore {
    pub term: String,
    pub score: f64,
}

/// Structured output of a CV/JD analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub match_percentage: i32,
    pub weighted_score: i32,
    pub skill_coverage: f64,
    pub experience_match: f64,
    pub top_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub present_skills: Vec<String>,
    pub common_terms: Vec<TermScore>,
    pub scoring_breakdown: ScoreBreakdown,
}

/// The matching engine. Cheap to share: the dictionary is immutable and the
/// index is rebuilt per call.
pub struct AnalysisEngine {
    dictionary: Arc<SkillsDictionary>,
    weights: ScoringWeights,
}

impl AnalysisEngine {
    pub fn new(dictionary: Arc<SkillsDictionary>) -> Self {
        Self {
            dictionary,
            weights: ScoringWeights::default(),
        }
    }

    /// Overrides the scoring weights. Invalid sets are normalized at scoring
    /// time, so any non-degenerate weights are accepted here.
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Analyzes a CV against a JD. Both inputs must be non-empty after
    /// whitespace normalization.
    pub fn analyze(&self, cv_text: &str, jd_text: &str) -> Result<AnalysisResult> {
        let cv_clean = normalize_text(cv_text);
        let jd_clean = normalize_text(jd_text);

        if cv_clean.is_empty() {
            return Err(Error::validation("cv", "content must not be empty"));
        }
        if jd_clean.is_empty() {
            return Err(Error::validation("jd", "content must not be empty"));
        }

        let mut index = InvertedIndex::new();
        index.add_document(0, &cv_clean);
        index.add_document(1, &jd_clean);
        let cv_terms = index.term_weights(0);
        let jd_terms = index.term_weights(1);

        let mut common: BTreeMap<&str, f64> = BTreeMap::new();
        let mut missing: Vec<(&str, f64)> = Vec::new();
        let mut jd_total = 0.0;
        let mut common_total = 0.0;

        for (term, jd_weight) in &jd_terms {
            jd_total += jd_weight;
            match cv_terms.get(term) {
                Some(cv_weight) => {
                    let score = cv_weight.min(*jd_weight);
                    common.insert(term, score);
                    common_total += score;
                }
                None => missing.push((term, *jd_weight)),
            }
        }

        let match_percentage = if jd_total > 0.0 {
            ((common_total / jd_total) * 100.0).round() as i32
        } else {
            0
        }
        .clamp(0, 100);

        let top_skills = ranked_terms(common.iter().map(|(t, s)| (*t, *s)), TOP_SKILLS_LIMIT);
        let missing_skills = ranked_terms(missing.iter().copied(), MISSING_SKILLS_LIMIT);
        let common_terms = ranked_term_scores(common.iter().map(|(t, s)| (*t, *s)), COMMON_TERMS_LIMIT);

        let cv_skills = skills::extract_skills(&cv_clean, &self.dictionary);
        let jd_skills = skills::extract_skills(&jd_clean, &self.dictionary);
        let skill_coverage = skills::skill_coverage(&cv_skills, &jd_skills);
        let experience_match = scoring::experience_match(&cv_skills, &jd_skills);
        let present_skills: Vec<String> = cv_skills.iter().map(|s| s.name.clone()).collect();

        let term_similarity = f64::from(match_percentage) / 100.0;
        let (weighted_score, scoring_breakdown) = scoring::weighted_score(
            skill_coverage,
            experience_match,
            term_similarity,
            term_similarity,
            self.weights,
        );

        tracing::debug!(
            match_percentage,
            weighted_score,
            skill_coverage,
            experience_match,
            common_terms = common.len(),
            missing_terms = missing.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            match_percentage,
            weighted_score,
            skill_coverage,
            experience_match,
            top_skills,
            missing_skills,
            present_skills,
            common_terms,
            scoring_breakdown,
        })
    }

    /// Extracts skills from arbitrary text using the engine's dictionary.
    pub fn extract_skills(&self, content: &str) -> Vec<Skill> {
        skills::extract_skills(&normalize_text(content), &self.dictionary)
    }
}

/// Lowercases, collapses whitespace runs to single spaces, and trims.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Top `limit` terms by descending score; ties break lexicographically.
fn ranked_terms<'a>(terms: impl Iterator<Item = (&'a str, f64)>, limit: usize) -> Vec<String> {
    let mut scored: Vec<(&str, f64)> = terms.collect();
    sort_by_score(&mut scored);
    scored
        .into_iter()
        .take(limit)
        .map(|(t, _)| t.to_string())
        .collect()
}

fn ranked_term_scores<'a>(
    terms: impl Iterator<Item = (&'a str, f64)>,
    limit: usize,
) -> Vec<TermScore> {
    let mut scored: Vec<(&str, f64)> = terms.collect();
    sort_by_score(&mut scored);
    scored
        .into_iter()
        .take(limit)
        .map(|(term, score)| TermScore {
            term: term.to_string(),
            score,
        })
        .collect()
}

fn sort_by_score(scored: &mut [(&str, f64)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
}
