use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Balance,
    Separate,
    Exit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    Fast,
    Steady,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Fast => "FAST",
            PlanType::Steady => "STEADY",
        }
    }

    pub fn rules(&self) -> PlanRules {
        match self {
            PlanType::Fast => PlanRules {
                cut_percent: 0.22,
                max_categories: 6,
                joy_preserve: 0.05,
            },
            PlanType::Steady => PlanRules {
                cut_percent: 0.12,
                max_categories: 4,
                joy_preserve: 0.1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    ExitBuffer,
    PrivateBuffer,
    Fairness,
}

/// Parameter preset for one plan type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRules {
    /// Fraction removed from each selected category.
    pub cut_percent: f64,
    /// How many of the largest categories get cut.
    pub max_categories: usize,
    /// Damping factor for the baseline pass. Overwritten by the cut pass.
    pub joy_preserve: f64,
}

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Housing",
    "Food",
    "Transport",
    "Utilities",
    "Health",
    "Debt",
    "Subscriptions",
    "Personal Care",
    "Entertainment",
    "Savings",
];

/// Request body for plan generation.
///
/// Categories are held in a `BTreeMap`, so iteration is always by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub mode: Mode,
    pub goal_amount: f64,
    #[serde(default)]
    pub current_buffer: f64,
    pub monthly_income: f64,
    pub monthly_spend_by_category: BTreeMap<String, f64>,
}

impl PlanInput {
    /// Rejects non-positive goals, negative or non-finite amounts, and
    /// amounts above [`MAX_AMOUNT`].
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.goal_amount.is_finite() || self.goal_amount <= 0.0 {
            return Err(AppError::Validation(
                "goalAmount must be a positive number".to_string(),
            ));
        }
        require_amount("goalAmount", self.goal_amount)?;
        require_amount("currentBuffer", self.current_buffer)?;
        require_amount("monthlyIncome", self.monthly_income)?;
        for (category, amount) in &self.monthly_spend_by_category {
            require_amount(&format!("monthlySpendByCategory.{category}"), *amount)?;
        }
        Ok(())
    }
}

/// Upper bound for any single amount. Keeps sums across every category finite.
pub const MAX_AMOUNT: f64 = 1.0e9;

fn require_amount(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "{field} must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(goal: f64, buffer: f64, spend: &[(&str, f64)]) -> PlanInput {
        PlanInput {
            mode: Mode::Exit,
            goal_amount: goal,
            current_buffer: buffer,
            monthly_income: 4000.0,
            monthly_spend_by_category: spend
                .iter()
                .map(|(c, v)| (c.to_string(), *v))
                .collect(),
        }
    }

    #[test]
    fn test_preset_values() {
        let fast = PlanType::Fast.rules();
        assert_eq!(fast.cut_percent, 0.22);
        assert_eq!(fast.max_categories, 6);
        let steady = PlanType::Steady.rules();
        assert_eq!(steady.cut_percent, 0.12);
        assert_eq!(steady.max_categories, 4);
        assert_eq!(steady.joy_preserve, 0.1);
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(input(1000.0, 0.0, &[("Food", 400.0), ("Savings", 0.0)])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_zero_goal_rejected() {
        let err = input(0.0, 0.0, &[]).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("goalAmount")));
    }

    #[test]
    fn test_negative_spend_rejected() {
        let err = input(500.0, 0.0, &[("Food", -1.0)]).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Food")));
    }

    #[test]
    fn test_negative_buffer_rejected() {
        assert!(input(500.0, -10.0, &[]).validate().is_err());
    }

    #[test]
    fn test_nan_rejected() {
        assert!(input(f64::NAN, 0.0, &[]).validate().is_err());
    }

    #[test]
    fn test_huge_amounts_rejected() {
        let spend: Vec<(&str, f64)> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|c| (*c, 1.7e308))
            .collect();
        let err = input(1000.0, 0.0, &spend).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("must not exceed")));

        assert!(input(MAX_AMOUNT * 2.0, 0.0, &[]).validate().is_err());
        assert!(input(1000.0, 0.0, &[("Food", MAX_AMOUNT)]).validate().is_ok());
    }

    #[test]
    fn test_wire_format_defaults_buffer() {
        let parsed: PlanInput = serde_json::from_value(json!({
            "mode": "SEPARATE",
            "goalAmount": 2500,
            "monthlyIncome": 3200,
            "monthlySpendByCategory": { "Housing": 1200, "Food": 450 }
        }))
        .unwrap();
        assert_eq!(parsed.mode, Mode::Separate);
        assert_eq!(parsed.current_buffer, 0.0);
        assert_eq!(parsed.monthly_spend_by_category.len(), 2);
    }

    #[test]
    fn test_unknown_mode_rejected_by_serde() {
        let parsed = serde_json::from_value::<PlanInput>(json!({
            "mode": "RETIRE",
            "goalAmount": 1,
            "monthlyIncome": 1,
            "monthlySpendByCategory": {}
        }));
        assert!(parsed.is_err());
    }
}
