//! Demo household data served while bank linking is simulated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::planning::rules::{GoalType, Mode, PlanType, DEFAULT_CATEGORIES};

pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_HOUSEHOLD_ID: &str = "demo-household";
const DEMO_ACCOUNT_LINK_ID: &str = "demo-checking";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub default_plan: Option<PlanType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: Option<String>,
    pub mode: Mode,
    pub household_id: String,
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub goal_id: String,
    pub household_id: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub target_amount: f64,
    pub current_buffer: f64,
}

/// `GET /v1/profile` body: the user plus what the plan form needs.
#[derive(Debug, Clone, Serialize)]
pub struct DemoProfile {
    #[serde(flatten)]
    pub user: User,
    pub goal: Goal,
    pub categories: &'static [&'static str],
}

/// Positive amounts are spend, negative amounts are income.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    pub household_id: String,
    pub account_link_id: String,
    pub amount: f64,
    pub merchant: String,
    pub category: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankConnection {
    pub account_link_id: Uuid,
    pub provider: &'static str,
    pub status: &'static str,
    pub message: &'static str,
}

pub fn demo_profile() -> DemoProfile {
    DemoProfile {
        user: User {
            user_id: DEMO_USER_ID.to_string(),
            email: Some("demo@breakeven.app".to_string()),
            mode: Mode::Exit,
            household_id: DEMO_HOUSEHOLD_ID.to_string(),
            preferences: UserPreferences {
                default_plan: Some(PlanType::Steady),
            },
        },
        goal: Goal {
            goal_id: "demo-goal".to_string(),
            household_id: DEMO_HOUSEHOLD_ID.to_string(),
            goal_type: GoalType::ExitBuffer,
            target_amount: 3000.0,
            current_buffer: 450.0,
        },
        categories: DEFAULT_CATEGORIES,
    }
}

pub fn demo_transactions() -> Vec<Transaction> {
    const ROWS: &[(&str, f64, &str, &str)] = &[
        ("Payroll", -3800.0, "Income", "2024-03-01T09:00:00Z"),
        ("Maple Court Apartments", 1450.0, "Housing", "2024-03-01T12:00:00Z"),
        ("City Power & Water", 165.0, "Utilities", "2024-03-03T15:20:00Z"),
        ("FreshMart", 212.4, "Food", "2024-03-05T18:42:00Z"),
        ("Metro Transit", 96.0, "Transport", "2024-03-06T08:10:00Z"),
        ("StreamBox", 17.99, "Subscriptions", "2024-03-07T00:00:00Z"),
        ("Corner Bistro", 64.5, "Food", "2024-03-09T20:15:00Z"),
        ("Cinema Six", 38.0, "Entertainment", "2024-03-10T19:30:00Z"),
        ("Campus Pharmacy", 22.75, "Health", "2024-03-12T11:05:00Z"),
        ("FreshMart", 187.3, "Food", "2024-03-19T17:55:00Z"),
        ("Card Services", 240.0, "Debt", "2024-03-20T10:00:00Z"),
        ("Glow Salon", 55.0, "Personal Care", "2024-03-23T14:00:00Z"),
    ];

    ROWS.iter()
        .enumerate()
        .map(|(i, (merchant, amount, category, timestamp))| Transaction {
            transaction_id: format!("demo-txn-{:03}", i + 1),
            household_id: DEMO_HOUSEHOLD_ID.to_string(),
            account_link_id: DEMO_ACCOUNT_LINK_ID.to_string(),
            amount: *amount,
            merchant: merchant.to_string(),
            category: category.to_string(),
            timestamp: timestamp.to_string(),
        })
        .collect()
}

/// Sums spend (positive amounts) per category. Income rows are ignored.
pub fn spend_by_category(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for txn in transactions.iter().filter(|t| t.amount > 0.0) {
        *totals.entry(txn.category.clone()).or_insert(0.0) += txn.amount;
    }
    totals
}

/// Simulated Nessie bank link; no external call is made.
pub fn connect_bank() -> BankConnection {
    BankConnection {
        account_link_id: Uuid::new_v4(),
        provider: "NESSIE",
        status: "connected",
        message: "Simulated Nessie connection established (demo mode).",
    }
}
