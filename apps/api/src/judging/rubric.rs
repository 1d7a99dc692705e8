use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Highest score a judge can give in one category.
pub const MAX_SCORE: f64 = 10.0;

/// Weights of a rubric must add up to exactly this.
pub const TOTAL_WEIGHT: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RubricCategory {
    pub id: String,
    pub name: String,
    /// Percentage of the total score, 0–100.
    pub weight: u32,
    #[serde(default)]
    pub description: String,
}

pub fn default_rubric() -> Vec<RubricCategory> {
    [
        ("innovation", "Innovation", "Originality and creativity of the solution"),
        ("technical", "Technical Implementation", "Quality of code and technical execution"),
        ("design", "Design & UX", "User interface and user experience design"),
        ("presentation", "Presentation", "Clarity and effectiveness of the pitch"),
    ]
    .into_iter()
    .map(|(id, name, description)| RubricCategory {
        id: id.to_string(),
        name: name.to_string(),
        weight: 25,
        description: description.to_string(),
    })
    .collect()
}

/// A rubric is valid when it is non-empty, category ids are unique and
/// non-blank, and the weights sum to exactly 100.
pub fn validate_rubric(rubric: &[RubricCategory]) -> Result<(), AppError> {
    if rubric.is_empty() {
        return Err(AppError::Validation(
            "rubric must have at least one category".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for category in rubric {
        if category.id.trim().is_empty() || category.name.trim().is_empty() {
            return Err(AppError::Validation(
                "rubric categories need a non-empty id and name".to_string(),
            ));
        }
        if !seen.insert(category.id.as_str()) {
            return Err(AppError::Validation(format!(
                "duplicate rubric category '{}'",
                category.id
            )));
        }
        if category.weight > TOTAL_WEIGHT {
            return Err(AppError::Validation(format!(
                "weight of '{}' must be between 0 and {TOTAL_WEIGHT}",
                category.id
            )));
        }
    }

    let total: u32 = rubric.iter().map(|c| c.weight).sum();
    if total != TOTAL_WEIGHT {
        return Err(AppError::Validation(format!(
            "rubric weights must sum to {TOTAL_WEIGHT}, got {total}"
        )));
    }
    Ok(())
}

/// Checks one judge's submission against the rubric. Categories may be
/// left out; unknown categories and out-of-range scores are rejected.
pub fn validate_scores(
    rubric: &[RubricCategory],
    scores: &BTreeMap<String, f64>,
) -> Result<(), AppError> {
    for (category_id, score) in scores {
        if !rubric.iter().any(|c| &c.id == category_id) {
            return Err(AppError::Validation(format!(
                "'{category_id}' is not a rubric category"
            )));
        }
        if !score.is_finite() || *score < 0.0 || *score > MAX_SCORE {
            return Err(AppError::Validation(format!(
                "score for '{category_id}' must be between 0 and {MAX_SCORE}"
            )));
        }
    }
    Ok(())
}
