// Exercise planner: marker keywords -> conditional advice + baseline plan

use super::{render_recommendations, KeywordRule};

pub const EXERCISE_HEADER: &str = "Exercise Plan:";

const RULES: &[KeywordRule] = &[
    KeywordRule {
        markers: &["hemoglobin", "hgb"],
        qualifiers: &["low", "anemia"],
        advice: "Start with light exercise: walking, gentle yoga. Gradually increase intensity as iron levels improve",
    },
    KeywordRule {
        markers: &["cholesterol"],
        qualifiers: &["high", "elevated"],
        advice: "Cardiovascular exercise: 30 minutes moderate activity 5 days/week (walking, swimming, cycling)",
    },
    KeywordRule {
        markers: &["glucose"],
        qualifiers: &["high", "diabetes"],
        advice: "Blood sugar management: regular exercise, resistance training 2-3x/week, post-meal walks",
    },
];

/// Appended after any conditional advice, always.
pub const BASELINE: [&str; 3] = [
    "Strength training: 2-3 sessions per week targeting major muscle groups",
    "Flexibility: Daily stretching or yoga",
    "Cardio: 150 minutes moderate or 75 minutes vigorous activity per week",
];

pub fn analyze(report: &str) -> String {
    let lower = report.to_lowercase();
    let mut recommendations: Vec<&str> = RULES
        .iter()
        .filter(|rule| rule.fires(&lower))
        .map(|rule| rule.advice)
        .collect();
    recommendations.extend(BASELINE);

    render_recommendations(EXERCISE_HEADER, &recommendations)
}
