//! Weighted multi-factor aggregate scoring.
//!
//! Combines skill coverage, experience match, term similarity, and overall
//! match into a single 0–100 score. Weights default to 40/30/20/10 and are
//! normalized by their sum when a caller supplies a set that does not add up
//! to 1.0.

use serde::{Deserialize, Serialize};

use crate::skills::Skill;

/// Weights for the four scoring dimensions. Should sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill_coverage: f64,
    pub experience: f64,
    pub term_similarity: f64,
    pub overall_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill_coverage: 0.40,
            experience: 0.30,
            term_similarity: 0.20,
            overall_match: 0.10,
        }
    }
}

impl ScoringWeights {
    fn sum(&self) -> f64 {
        self.skill_coverage + self.experience + self.term_similarity + self.overall_match
    }

    /// Whether the weights sum to 1.0 within ±0.01.
    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() <= 0.01
    }

    /// Returns weights scaled to sum to 1.0. A zero sum falls back to the
    /// defaults.
    pub fn normalize(&self) -> Self {
        let sum = self.sum();
        if sum == 0.0 {
            return Self::default();
        }
        Self {
            skill_coverage: self.skill_coverage / sum,
            experience: self.experience / sum,
            term_similarity: self.term_similarity / sum,
            overall_match: self.overall_match / sum,
        }
    }
}

/// Per-dimension inputs plus the weighted total, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_coverage: f64,
    #[serde(rename = "experience_match")]
    pub experience: f64,
    pub term_similarity: f64,
    pub overall_match: f64,
    pub weighted_total: i32,
}

/// Computes the weighted 0–100 score from dimension inputs in `[0, 1]`.
///
/// Inputs are clamped, weights normalized; the result is rounded and clamped
/// to `[0, 100]`.
pub fn weighted_score(
    skill_coverage: f64,
    experience_match: f64,
    term_similarity: f64,
    overall_match: f64,
    weights: ScoringWeights,
) -> (i32, ScoreBreakdown) {
    let weights = weights.normalize();

    let skill_coverage = skill_coverage.clamp(0.0, 1.0);
    let experience_match = experience_match.clamp(0.0, 1.0);
    let term_similarity = term_similarity.clamp(0.0, 1.0);
    let overall_match = overall_match.clamp(0.0, 1.0);

    let total = skill_coverage * weights.skill_coverage
        + experience_match * weights.experience
        + term_similarity * weights.term_similarity
        + overall_match * weights.overall_match;

    let score = ((total * 100.0).round() as i32).clamp(0, 100);

    let breakdown = ScoreBreakdown {
        skill_coverage,
        experience: experience_match,
        term_similarity,
        overall_match,
        weighted_total: score,
    };
    (score, breakdown)
}

/// Experience match between CV and JD skill requirements, in `[0, 1]`.
///
/// For every JD skill matched in the CV: a JD that asks for `n > 0` years
/// contributes 1.0 when the CV meets it and `cv/n` when it partially does; a
/// JD without a year requirement contributes 0.8 when the CV shows any
/// experience and 0.5 otherwise. The contributions are averaged; no matches
/// means 0.
pub fn experience_match(cv_skills: &[Skill], jd_skills: &[Skill]) -> f64 {
    if jd_skills.is_empty() {
        return 0.0;
    }
    let (matches, _) = crate::skills::match_skills(cv_skills, jd_skills);
    if matches.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut possible = 0.0;

    for jd_skill in jd_skills {
        let Some(matched) = matches.iter().find(|m| m.name == jd_skill.name) else {
            continue;
        };
        if jd_skill.experience_years > 0 {
            if matched.experience_years >= jd_skill.experience_years {
                total += 1.0;
            } else if matched.experience_years > 0 {
                total += f64::from(matched.experience_years) / f64::from(jd_skill.experience_years);
            }
        } else if matched.experience_years > 0 {
            total += 0.8;
        } else {
            total += 0.5;
        }
        possible += 1.0;
    }

    if possible == 0.0 {
        0.0
    } else {
        total / possible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, years: u32) -> Skill {
        Skill {
            name: name.to_string(),
            category: "Languages".to_string(),
            experience_years: years,
            confidence: 0.8,
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!(ScoringWeights::default().is_valid());
    }

    #[test]
    fn full_coverage_alone_scores_forty() {
        let (score, breakdown) = weighted_score(1.0, 0.0, 0.0, 0.0, ScoringWeights::default());
        assert_eq!(score, 40);
        assert_eq!(breakdown.weighted_total, 40);
        assert_eq!(breakdown.skill_coverage, 1.0);
    }

    #[test]
    fn perfect_dimensions_score_one_hundred() {
        let (score, _) = weighted_score(1.0, 1.0, 1.0, 1.0, ScoringWeights::default());
        assert_eq!(score, 100);
    }

    #[test]
    fn inputs_are_clamped() {
        let (score, breakdown) = weighted_score(7.0, -3.0, 0.0, 0.0, ScoringWeights::default());
        assert_eq!(score, 40);
        assert_eq!(breakdown.experience, 0.0);
    }

    #[test]
    fn unbalanced_weights_are_normalized() {
        let weights = ScoringWeights {
            skill_coverage: 2.0,
            experience: 2.0,
            term_similarity: 0.0,
            overall_match: 0.0,
        };
        assert!(!weights.is_valid());
        let (score, _) = weighted_score(1.0, 0.0, 0.0, 0.0, weights);
        assert_eq!(score, 50);
    }

    #[test]
    fn zero_weights_fall_back_to_defaults() {
        let weights = ScoringWeights {
            skill_coverage: 0.0,
            experience: 0.0,
            term_similarity: 0.0,
            overall_match: 0.0,
        };
        let (score, _) = weighted_score(1.0, 0.0, 0.0, 0.0, weights);
        assert_eq!(score, 40);
    }

    #[test]
    fn experience_meets_requirement() {
        let cv = vec![skill("rust", 5)];
        let jd = vec![skill("rust", 3)];
        assert_eq!(experience_match(&cv, &jd), 1.0);
    }

    #[test]
    fn experience_partial_requirement_is_a_ratio() {
        let cv = vec![skill("rust", 2)];
        let jd = vec![skill("rust", 4)];
        assert_eq!(experience_match(&cv, &jd), 0.5);
    }

    #[test]
    fn experience_without_cv_years_scores_zero_against_requirement() {
        let cv = vec![skill("rust", 0)];
        let jd = vec![skill("rust", 4)];
        assert_eq!(experience_match(&cv, &jd), 0.0);
    }

    #[test]
    fn unspecified_jd_requirement_rewards_any_experience() {
        let some = experience_match(&[skill("rust", 2)], &[skill("rust", 0)]);
        assert_eq!(some, 0.8);
        let none = experience_match(&[skill("rust", 0)], &[skill("rust", 0)]);
        assert_eq!(none, 0.5);
    }

    #[test]
    fn averaged_over_matched_jd_skills() {
        let cv = vec![skill("rust", 5), skill("go", 1)];
        let jd = vec![skill("rust", 5), skill("go", 2), skill("java", 3)];
        // rust: 1.0, go: 0.5; java unmatched and excluded.
        assert_eq!(experience_match(&cv, &jd), 0.75);
    }

    #[test]
    fn no_matches_scores_zero() {
        assert_eq!(experience_match(&[skill("rust", 5)], &[skill("java", 2)]), 0.0);
        assert_eq!(experience_match(&[], &[]), 0.0);
    }
}
