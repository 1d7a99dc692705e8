//! Plan Generator: turns a monthly spend profile into a savings plan.
//!
//! Pure and deterministic apart from `plan_id` and `created_at`. No I/O.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::planning::demo::DEMO_HOUSEHOLD_ID;
use crate::planning::rules::{Mode, PlanInput, PlanRules, PlanType};

/// Number of deltas turned into checklist items.
const CHECKLIST_LEN: usize = 4;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanDelta {
    pub category: String,
    pub before: f64,
    pub after: f64,
}

impl PlanDelta {
    pub fn saved(&self) -> f64 {
        self.before - self.after
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanChecklistItem {
    pub label: String,
    pub done: bool,
    pub rationale: String,
}

/// A generated plan. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub plan_id: String,
    pub household_id: String,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub monthly_savings: f64,
    /// 0 means the goal is unreachable with these cuts.
    pub months_to_goal: u64,
    pub deltas_by_category: Vec<PlanDelta>,
    pub weekly_checklist: Vec<PlanChecklistItem>,
    pub ai_summary: String,
    pub need: f64,
    pub goal_amount: f64,
    pub current_buffer: f64,
    pub created_at: DateTime<Utc>,
}

/// Both presets generated from the same input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanBundle {
    pub fast: PlanResult,
    pub steady: PlanResult,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Generates one plan. `input` must already be validated.
///
/// Steps:
/// 1. select the largest positive categories (ties by name)
/// 2. joy-preserve baseline, then the cut pass
/// 3. savings, need, months to goal
/// 4. checklist and summary text
pub fn generate_plan(input: &PlanInput, plan_type: PlanType) -> PlanResult {
    let rules = plan_type.rules();
    let need = (input.goal_amount - input.current_buffer).max(0.0);

    let baseline = top_categories(input, &rules);
    // apply_cuts recomputes `after` from `before`; the joy-preserve baseline
    // does not survive into the result.
    let deltas = apply_cuts(&baseline, rules.cut_percent);

    let monthly_savings: f64 = deltas.iter().map(PlanDelta::saved).sum();
    let months_to_goal = months_to_goal(need, monthly_savings);

    PlanResult {
        plan_id: format!("{}-{}", plan_type.as_str().to_lowercase(), Uuid::new_v4()),
        household_id: DEMO_HOUSEHOLD_ID.to_string(),
        plan_type,
        monthly_savings,
        months_to_goal,
        weekly_checklist: build_checklist(&deltas),
        ai_summary: summarize(input.mode, plan_type, monthly_savings, months_to_goal),
        deltas_by_category: deltas,
        need,
        goal_amount: input.goal_amount,
        current_buffer: input.current_buffer,
        created_at: Utc::now(),
    }
}

pub fn generate_bundle(input: &PlanInput) -> PlanBundle {
    PlanBundle {
        fast: generate_plan(input, PlanType::Fast),
        steady: generate_plan(input, PlanType::Steady),
    }
}

fn top_categories(input: &PlanInput, rules: &PlanRules) -> Vec<PlanDelta> {
    let mut spend: Vec<(&String, f64)> = input
        .monthly_spend_by_category
        .iter()
        .filter(|(_, amount)| **amount > 0.0)
        .map(|(category, amount)| (category, *amount))
        .collect();

    spend.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    spend
        .into_iter()
        .take(rules.max_categories)
        .map(|(category, before)| PlanDelta {
            category: category.clone(),
            before,
            after: (before * (1.0 - rules.joy_preserve)).max(0.0),
        })
        .collect()
}

fn apply_cuts(deltas: &[PlanDelta], cut_percent: f64) -> Vec<PlanDelta> {
    deltas
        .iter()
        .map(|d| PlanDelta {
            category: d.category.clone(),
            before: d.before,
            after: (d.before * (1.0 - cut_percent)).max(0.0),
        })
        .collect()
}

/// `0` when savings are not positive, otherwise at least one month.
fn months_to_goal(need: f64, monthly_savings: f64) -> u64 {
    if monthly_savings > 0.0 {
        (need / monthly_savings).ceil().max(1.0) as u64
    } else {
        0
    }
}

fn build_checklist(deltas: &[PlanDelta]) -> Vec<PlanChecklistItem> {
    deltas
        .iter()
        .take(CHECKLIST_LEN)
        .map(|d| PlanChecklistItem {
            label: format!("Cap {} at ${} this month", d.category, dollars(d.after)),
            done: false,
            rationale: format!(
                "Saves ${} without cutting essentials.",
                dollars(d.saved())
            ),
        })
        .collect()
}

fn summarize(mode: Mode, plan_type: PlanType, monthly_savings: f64, months_to_goal: u64) -> String {
    let tone = match plan_type {
        PlanType::Fast => "shortest timeline",
        PlanType::Steady => "gentler pace",
    };
    let mode_line = match mode {
        Mode::Exit => "moving fund ready",
        Mode::Separate => "personal buffer",
        Mode::Balance => "fair split cushion",
    };
    format!(
        "{} keeps you on a {tone} with ~${} freed each month to reach your {mode_line} in {months_to_goal} months.",
        plan_type.as_str(),
        dollars(monthly_savings)
    )
}

/// Whole dollars, half away from zero.
fn dollars(amount: f64) -> String {
    format!("{:.0}", amount.round())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::btree_map;
    use proptest::prelude::*;

    use crate::planning::rules::MAX_AMOUNT;

    fn make_input(mode: Mode, goal: f64, buffer: f64, spend: &[(&str, f64)]) -> PlanInput {
        PlanInput {
            mode,
            goal_amount: goal,
            current_buffer: buffer,
            monthly_income: 5000.0,
            monthly_spend_by_category: spend
                .iter()
                .map(|(c, v)| (c.to_string(), *v))
                .collect(),
        }
    }

    fn categories(plan: &PlanResult) -> Vec<&str> {
        plan.deltas_by_category
            .iter()
            .map(|d| d.category.as_str())
            .collect()
    }

    #[test]
    fn test_steady_takes_top_four_descending() {
        let input = make_input(
            Mode::Exit,
            1000.0,
            0.0,
            &[
                ("Housing", 1500.0),
                ("Food", 600.0),
                ("Transport", 300.0),
                ("Entertainment", 200.0),
                ("Subscriptions", 50.0),
                ("Health", 0.0),
            ],
        );
        let plan = generate_plan(&input, PlanType::Steady);
        assert_eq!(
            categories(&plan),
            vec!["Housing", "Food", "Transport", "Entertainment"]
        );
    }

    #[test]
    fn test_zero_spend_categories_skipped() {
        let input = make_input(Mode::Exit, 1000.0, 0.0, &[("Food", 0.0), ("Debt", 100.0)]);
        let plan = generate_plan(&input, PlanType::Fast);
        assert_eq!(categories(&plan), vec!["Debt"]);
    }

    #[test]
    fn test_ties_broken_by_category_name() {
        let input = make_input(
            Mode::Balance,
            1000.0,
            0.0,
            &[
                ("Utilities", 100.0),
                ("Food", 100.0),
                ("Health", 100.0),
                ("Debt", 100.0),
                ("Transport", 100.0),
            ],
        );
        let plan = generate_plan(&input, PlanType::Steady);
        assert_eq!(categories(&plan), vec!["Debt", "Food", "Health", "Transport"]);
    }

    #[test]
    fn test_cut_overrides_joy_preserve() {
        let input = make_input(Mode::Exit, 1000.0, 0.0, &[("Food", 1000.0)]);
        let fast = generate_plan(&input, PlanType::Fast);
        assert!((fast.deltas_by_category[0].after - 780.0).abs() < 1e-9);
        let steady = generate_plan(&input, PlanType::Steady);
        assert!((steady.deltas_by_category[0].after - 880.0).abs() < 1e-9);
    }

    #[test]
    fn test_savings_and_months() {
        // Steady: 12% of (1000 + 500) = 180 per month; need 1000 - 150 = 850 → 5 months
        let input = make_input(Mode::Exit, 1000.0, 150.0, &[("Housing", 1000.0), ("Food", 500.0)]);
        let plan = generate_plan(&input, PlanType::Steady);
        assert!((plan.monthly_savings - 180.0).abs() < 1e-9);
        assert_eq!(plan.need, 850.0);
        assert_eq!(plan.months_to_goal, 5);
    }

    #[test]
    fn test_largest_accepted_amounts_stay_finite() {
        let spend: Vec<(&str, f64)> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|c| (*c, MAX_AMOUNT))
            .collect();
        let input = make_input(Mode::Exit, MAX_AMOUNT, 0.0, &spend);
        assert!(input.validate().is_ok());
        let plan = generate_plan(&input, PlanType::Fast);
        assert!(plan.monthly_savings.is_finite());
        assert!(plan.monthly_savings > 0.0);
        assert_eq!(plan.months_to_goal, 1);
    }

    #[test]
    fn test_months_round_up() {
        // Fast: 22% of 1000 = 220; need 1000 → ceil(4.54) = 5
        let input = make_input(Mode::Exit, 1000.0, 0.0, &[("Housing", 1000.0)]);
        assert_eq!(generate_plan(&input, PlanType::Fast).months_to_goal, 5);
    }

    #[test]
    fn test_buffer_covers_goal_is_one_month() {
        let input = make_input(Mode::Separate, 500.0, 800.0, &[("Food", 300.0)]);
        let plan = generate_plan(&input, PlanType::Fast);
        assert_eq!(plan.need, 0.0);
        assert_eq!(plan.months_to_goal, 1);
    }

    #[test]
    fn test_no_spend_is_unreachable() {
        let input = make_input(Mode::Exit, 500.0, 0.0, &[]);
        let plan = generate_plan(&input, PlanType::Fast);
        assert_eq!(plan.monthly_savings, 0.0);
        assert_eq!(plan.months_to_goal, 0);
        assert!(plan.weekly_checklist.is_empty());
        assert!(plan.ai_summary.ends_with("in 0 months."));
    }

    #[test]
    fn test_checklist_limited_to_four() {
        let input = make_input(
            Mode::Exit,
            1000.0,
            0.0,
            &[
                ("A", 600.0),
                ("B", 500.0),
                ("C", 400.0),
                ("D", 300.0),
                ("E", 200.0),
                ("F", 100.0),
            ],
        );
        let plan = generate_plan(&input, PlanType::Fast);
        assert_eq!(plan.deltas_by_category.len(), 6);
        assert_eq!(plan.weekly_checklist.len(), 4);
        assert!(plan.weekly_checklist.iter().all(|i| !i.done));
    }

    #[test]
    fn test_checklist_text() {
        let input = make_input(Mode::Exit, 1000.0, 0.0, &[("Food", 450.0)]);
        let plan = generate_plan(&input, PlanType::Steady);
        // 450 * 0.88 = 396, saves 54
        assert_eq!(plan.weekly_checklist[0].label, "Cap Food at $396 this month");
        assert_eq!(
            plan.weekly_checklist[0].rationale,
            "Saves $54 without cutting essentials."
        );
    }

    #[test]
    fn test_summary_per_mode_and_type() {
        let input = make_input(Mode::Exit, 1000.0, 0.0, &[("Housing", 1000.0)]);
        let fast = generate_plan(&input, PlanType::Fast);
        assert_eq!(
            fast.ai_summary,
            "FAST keeps you on a shortest timeline with ~$220 freed each month to reach your moving fund ready in 5 months."
        );

        let balance = make_input(Mode::Balance, 1000.0, 0.0, &[("Housing", 1000.0)]);
        let steady = generate_plan(&balance, PlanType::Steady);
        assert!(steady.ai_summary.starts_with("STEADY keeps you on a gentler pace"));
        assert!(steady.ai_summary.contains("fair split cushion"));

        let separate = make_input(Mode::Separate, 1000.0, 0.0, &[("Housing", 1000.0)]);
        assert!(generate_plan(&separate, PlanType::Fast)
            .ai_summary
            .contains("personal buffer"));
    }

    #[test]
    fn test_plan_id_prefix_and_household() {
        let input = make_input(Mode::Exit, 100.0, 0.0, &[("Food", 10.0)]);
        let bundle = generate_bundle(&input);
        assert!(bundle.fast.plan_id.starts_with("fast-"));
        assert!(bundle.steady.plan_id.starts_with("steady-"));
        assert_ne!(bundle.fast.plan_id, bundle.steady.plan_id);
        assert_eq!(bundle.fast.household_id, "demo-household");
    }

    #[test]
    fn test_dollars_rounds_half_away_from_zero() {
        assert_eq!(dollars(2.5), "3");
        assert_eq!(dollars(0.4), "0");
        assert_eq!(dollars(395.5), "396");
    }

    #[test]
    fn test_wire_field_names() {
        let input = make_input(Mode::Exit, 100.0, 0.0, &[("Food", 10.0)]);
        let value = serde_json::to_value(generate_plan(&input, PlanType::Fast)).unwrap();
        assert_eq!(value["type"], "FAST");
        assert!(value.get("monthsToGoal").is_some());
        assert!(value.get("deltasByCategory").is_some());
        assert!(value.get("weeklyChecklist").is_some());
    }

    fn spend_strategy() -> impl Strategy<Value = std::collections::BTreeMap<String, f64>> {
        btree_map("[A-Za-z ]{1,12}", 0.0f64..10_000.0, 0..12)
    }

    proptest! {
        #[test]
        fn prop_after_never_exceeds_before(
            spend in spend_strategy(),
            goal in 1.0f64..100_000.0,
            buffer in 0.0f64..50_000.0,
        ) {
            let input = PlanInput {
                mode: Mode::Balance,
                goal_amount: goal,
                current_buffer: buffer,
                monthly_income: 0.0,
                monthly_spend_by_category: spend,
            };
            for plan_type in [PlanType::Fast, PlanType::Steady] {
                let plan = generate_plan(&input, plan_type);
                for delta in &plan.deltas_by_category {
                    prop_assert!(delta.after <= delta.before);
                    prop_assert!(delta.after >= 0.0);
                }
                prop_assert!(plan.monthly_savings >= 0.0);
                if plan.monthly_savings > 0.0 {
                    prop_assert!(plan.months_to_goal >= 1);
                } else {
                    prop_assert_eq!(plan.months_to_goal, 0);
                }
                prop_assert!(plan.deltas_by_category.len() <= plan_type.rules().max_categories);
            }
        }
    }
}
