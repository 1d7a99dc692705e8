//! Score Aggregation: averages judge scorecards and ranks projects.
//!
//! Per category: mean of the submitted scores, 0 when nobody scored it.
//! Contribution: (average / 10) × weight. Total: sum of contributions,
//! which stays within 0–100 when the rubric weights sum to 100.

use std::cmp::Ordering;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::judging::models::{Project, Score};
use crate::judging::rubric::{RubricCategory, MAX_SCORE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub category_id: String,
    pub name: String,
    pub weight: u32,
    pub average: f64,
    pub contribution: f64,
    pub submissions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub categories: Vec<CategoryResult>,
    pub total_score: f64,
    pub judges_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub project_id: Uuid,
    pub project_name: String,
    pub category: String,
    #[serde(flatten)]
    pub scorecard: Scorecard,
}

/// Aggregates the scorecards submitted for one project.
pub fn aggregate(rubric: &[RubricCategory], submissions: &[&Score]) -> Scorecard {
    let categories: Vec<CategoryResult> = rubric
        .iter()
        .map(|category| {
            let submitted: Vec<f64> = submissions
                .iter()
                .filter_map(|s| s.scores.get(&category.id).copied())
                .collect();
            let average = if submitted.is_empty() {
                0.0
            } else {
                submitted.iter().sum::<f64>() / submitted.len() as f64
            };
            CategoryResult {
                category_id: category.id.clone(),
                name: category.name.clone(),
                weight: category.weight,
                average,
                contribution: (average / MAX_SCORE) * f64::from(category.weight),
                submissions: submitted.len(),
            }
        })
        .collect();

    let total_score = categories.iter().map(|c| c.contribution).sum();

    Scorecard {
        categories,
        total_score,
        judges_count: submissions.len(),
    }
}

/// Scores every project and ranks them by total, highest first.
///
/// The sort is stable, so tied projects keep their order in `projects`.
pub fn build_leaderboard(
    rubric: &[RubricCategory],
    projects: &[Project],
    scores: &[Score],
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = projects
        .iter()
        .map(|project| {
            let submissions: Vec<&Score> = scores
                .iter()
                .filter(|s| s.project_id == project.id)
                .collect();
            LeaderboardEntry {
                rank: 0,
                project_id: project.id,
                project_name: project.name.clone(),
                category: project.category.clone(),
                scorecard: aggregate(rubric, &submissions),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.scorecard
            .total_score
            .partial_cmp(&a.scorecard.total_score)
            .unwrap_or(Ordering::Equal)
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}

/// Renders the leaderboard as CSV, one column per rubric category.
pub fn leaderboard_csv(rubric: &[RubricCategory], entries: &[LeaderboardEntry]) -> String {
    let mut header = vec![
        "Rank".to_string(),
        "Project Name".to_string(),
        "Category".to_string(),
        "Total Score".to_string(),
    ];
    header.extend(rubric.iter().map(|c| csv_field(&c.name)));
    header.push("Judges Count".to_string());

    let mut out = header.join(",");
    out.push('\n');

    for entry in entries {
        let _ = write!(
            out,
            "{},{},{},{:.2}",
            entry.rank,
            quote(&entry.project_name),
            csv_field(&entry.category),
            entry.scorecard.total_score
        );
        for category in rubric {
            let average = entry
                .scorecard
                .categories
                .iter()
                .find(|c| c.category_id == category.id)
                .map(|c| c.average)
                .unwrap_or(0.0);
            let _ = write!(out, ",{average:.2}");
        }
        let _ = writeln!(out, ",{}", entry.scorecard.judges_count);
    }
    out
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Quotes only when the value would break the row.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quote(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judging::models::ProjectStatus;
    use crate::judging::rubric::default_rubric;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn make_project(name: &str) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            hackathon_id: Uuid::new_v4(),
            name: name.to_string(),
            category: "AI/ML".to_string(),
            description: "d".to_string(),
            status: ProjectStatus::Submitted,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_score(project_id: Uuid, scores: &[(&str, f64)]) -> Score {
        Score {
            project_id,
            judge_id: Uuid::new_v4(),
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            comments: BTreeMap::new(),
            general_comments: String::new(),
            submitted_at: Utc::now(),
        }
    }

    fn category(card: &Scorecard, id: &str) -> CategoryResult {
        card.categories
            .iter()
            .find(|c| c.category_id == id)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_average_per_category() {
        let pid = Uuid::new_v4();
        let a = make_score(pid, &[("innovation", 8.0), ("technical", 6.0)]);
        let b = make_score(pid, &[("innovation", 6.0)]);
        let card = aggregate(&default_rubric(), &[&a, &b]);

        assert_eq!(category(&card, "innovation").average, 7.0);
        // only one judge scored technical
        assert_eq!(category(&card, "technical").average, 6.0);
        assert_eq!(category(&card, "technical").submissions, 1);
        assert_eq!(card.judges_count, 2);
    }

    #[test]
    fn test_unscored_category_averages_zero() {
        let pid = Uuid::new_v4();
        let a = make_score(pid, &[("innovation", 10.0)]);
        let card = aggregate(&default_rubric(), &[&a]);
        let design = category(&card, "design");
        assert_eq!(design.average, 0.0);
        assert_eq!(design.contribution, 0.0);
        assert_eq!(design.submissions, 0);
    }

    #[test]
    fn test_no_submissions_totals_zero() {
        let card = aggregate(&default_rubric(), &[]);
        assert_eq!(card.total_score, 0.0);
        assert_eq!(card.judges_count, 0);
    }

    #[test]
    fn test_weighted_total() {
        // 8/10*25 + 6/10*25 + 10/10*25 + 4/10*25 = 20 + 15 + 25 + 10 = 70
        let pid = Uuid::new_v4();
        let a = make_score(
            pid,
            &[
                ("innovation", 8.0),
                ("technical", 6.0),
                ("design", 10.0),
                ("presentation", 4.0),
            ],
        );
        let card = aggregate(&default_rubric(), &[&a]);
        assert!((card.total_score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_scores_total_100() {
        let rubric = default_rubric();
        let mut a = make_score(Uuid::new_v4(), &[]);
        for c in &rubric {
            a.scores.insert(c.id.clone(), 10.0);
        }
        let card = aggregate(&rubric, &[&a]);
        assert!((card.total_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_leaderboard_ranked_descending() {
        let low = make_project("Low");
        let high = make_project("High");
        let scores = vec![
            make_score(low.id, &[("innovation", 2.0)]),
            make_score(high.id, &[("innovation", 9.0)]),
        ];
        let board = build_leaderboard(&default_rubric(), &[low, high], &scores);
        assert_eq!(board[0].project_name, "High");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].project_name, "Low");
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_leaderboard_ties_keep_input_order() {
        let projects = vec![make_project("First"), make_project("Second"), make_project("Third")];
        let board = build_leaderboard(&default_rubric(), &projects, &[]);
        let names: Vec<_> = board.iter().map(|e| e.project_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_scores_for_other_projects_ignored() {
        let project = make_project("Solo");
        let stray = make_score(Uuid::new_v4(), &[("innovation", 10.0)]);
        let board = build_leaderboard(&default_rubric(), &[project], &[stray]);
        assert_eq!(board[0].scorecard.judges_count, 0);
        assert_eq!(board[0].scorecard.total_score, 0.0);
    }

    #[test]
    fn test_csv_export() {
        let project = make_project("Smart, Campus \"Nav\"");
        let scores = vec![make_score(project.id, &[("innovation", 8.0), ("design", 7.5)])];
        let rubric = default_rubric();
        let board = build_leaderboard(&rubric, &[project], &scores);
        let csv = leaderboard_csv(&rubric, &board);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Rank,Project Name,Category,Total Score,Innovation,Technical Implementation,Design & UX,Presentation,Judges Count"
        );
        // 8/10*25 + 7.5/10*25 = 20 + 18.75 = 38.75
        assert_eq!(
            lines.next().unwrap(),
            "1,\"Smart, Campus \"\"Nav\"\"\",AI/ML,38.75,8.00,0.00,7.50,0.00,1"
        );
        assert!(lines.next().is_none());
    }

    proptest! {
        #[test]
        fn prop_total_within_0_and_100(
            judges in proptest::collection::vec(
                proptest::collection::vec(proptest::option::of(0.0f64..=10.0), 4),
                0..8,
            )
        ) {
            let rubric = default_rubric();
            let pid = Uuid::new_v4();
            let scores: Vec<Score> = judges
                .iter()
                .map(|row| {
                    let mut s = make_score(pid, &[]);
                    for (category, value) in rubric.iter().zip(row) {
                        if let Some(v) = value {
                            s.scores.insert(category.id.clone(), *v);
                        }
                    }
                    s
                })
                .collect();
            let refs: Vec<&Score> = scores.iter().collect();
            let card = aggregate(&rubric, &refs);
            prop_assert!(card.total_score >= 0.0);
            prop_assert!(card.total_score <= 100.0 + 1e-9);
        }
    }
}
