// Nutrition analyzer: marker keywords -> dietary recommendations

use super::{render_recommendations, KeywordRule};

pub const NUTRITION_HEADER: &str = "Nutrition Recommendations:";

pub const BALANCED_DIET: &str =
    "Maintain a balanced diet with variety of fruits, vegetables, lean proteins, and whole grains";

const RULES: &[KeywordRule] = &[
    KeywordRule {
        markers: &["hemoglobin", "hgb", "hb"],
        qualifiers: &["low", "below", "deficient"],
        advice: "Consider iron-rich foods: spinach, red meat, lentils, fortified cereals",
    },
    KeywordRule {
        markers: &["vitamin d", "vit d"],
        qualifiers: &["low", "deficient", "insufficient"],
        advice: "Increase vitamin D: fatty fish, fortified milk, sunlight exposure",
    },
    KeywordRule {
        markers: &["cholesterol"],
        qualifiers: &["high", "elevated"],
        advice: "Heart-healthy diet: reduce saturated fats, increase fiber, omega-3 fatty acids",
    },
    KeywordRule {
        markers: &["glucose", "blood sugar"],
        qualifiers: &["high", "elevated"],
        advice: "Blood sugar management: complex carbohydrates, regular meals, limit refined sugars",
    },
];

pub fn analyze(report: &str) -> String {
    let lower = report.to_lowercase();
    let mut recommendations: Vec<&str> = RULES
        .iter()
        .filter(|rule| rule.fires(&lower))
        .map(|rule| rule.advice)
        .collect();

    if recommendations.is_empty() {
        recommendations.push(BALANCED_DIET);
    }

    render_recommendations(NUTRITION_HEADER, &recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_hemoglobin_suggests_iron() {
        let output = analyze("Hemoglobin: 9.2 (Low)");
        assert!(output.starts_with(NUTRITION_HEADER));
        assert!(output.contains("• Consider iron-rich foods"));
        assert!(!output.contains(BALANCED_DIET));
    }

    #[test]
    fn test_no_markers_falls_back_to_balanced_diet() {
        let output = analyze("Patient name: Jane Doe\nSodium: 140 mmol/L");
        assert_eq!(output, format!("{}\n• {}", NUTRITION_HEADER, BALANCED_DIET));
    }

    #[test]
    fn test_rules_fire_in_table_order() {
        let output = analyze("Glucose HIGH\nCholesterol elevated\nVitamin D insufficient");
        let vitamin = output.find("Increase vitamin D").unwrap();
        let heart = output.find("Heart-healthy diet").unwrap();
        let sugar = output.find("Blood sugar management").unwrap();
        assert!(vitamin < heart && heart < sugar);
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_marker_without_qualifier_does_not_fire() {
        let output = analyze("Cholesterol: 150 mg/dL (normal)");
        assert!(!output.contains("Heart-healthy"));
        assert!(output.contains(BALANCED_DIET));
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let text = "HGB 10.1 low; LDL cholesterol high";
        assert_eq!(analyze(text), analyze(text));
    }
}
