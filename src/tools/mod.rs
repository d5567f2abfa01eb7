//! Agent Tools
//!
//! The closed set of tools agents may call:
//!
//! - **read_blood_test_report**: text of the run's uploaded PDF
//! - **analyze_nutrition**: keyword table -> dietary recommendations
//! - **plan_exercise**: keyword table -> exercise plan
//! - **search_web**: external reference lookup
//!
//! Tool failures never escape this module. [`ToolBox::run`] always returns
//! text; errors become a diagnostic line prefixed with the tool's failure
//! label so the calling agent can reason about them.

pub mod exercise;
pub mod nutrition;
pub mod pdf;

pub use pdf::{collapse_blank_lines, extract_text, ExtractionError, ExtractionResult};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::search::{KnowledgeLookup, SearchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ToolId {
    BloodTestReader = 0,
    NutritionAnalyzer = 1,
    ExercisePlanner = 2,
    WebSearch = 3,
}

impl ToolId {
    /// Registry order. Tool listings always follow it.
    pub const ALL: [ToolId; 4] = [
        ToolId::BloodTestReader,
        ToolId::NutritionAnalyzer,
        ToolId::ExercisePlanner,
        ToolId::WebSearch,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ToolId::BloodTestReader => "read_blood_test_report",
            ToolId::NutritionAnalyzer => "analyze_nutrition",
            ToolId::ExercisePlanner => "plan_exercise",
            ToolId::WebSearch => "search_web",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ToolId::BloodTestReader => {
                "Reads and extracts the text of the uploaded blood test PDF. Input: leave empty to read the uploaded report."
            }
            ToolId::NutritionAnalyzer => {
                "Analyzes blood test results and provides nutrition recommendations. Input: blood report text (empty = uploaded report)."
            }
            ToolId::ExercisePlanner => {
                "Creates exercise recommendations based on blood test results. Input: blood report text (empty = uploaded report)."
            }
            ToolId::WebSearch => {
                "Searches the web for medical reference information. Input: a search query."
            }
        }
    }

    /// Label used when the tool soft-fails.
    pub const fn failure_label(self) -> &'static str {
        match self {
            ToolId::BloodTestReader => "Error reading document",
            ToolId::NutritionAnalyzer => "Error in nutrition analysis",
            ToolId::ExercisePlanner => "Error in exercise planning",
            ToolId::WebSearch => "Error in web search",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of tools, usable in `const` items so capability relations can be
/// asserted at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolSet(u8);

impl ToolSet {
    pub const EMPTY: ToolSet = ToolSet(0);

    pub const fn of(tools: &[ToolId]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < tools.len() {
            bits |= tools[i].bit();
            i += 1;
        }
        ToolSet(bits)
    }

    pub const fn contains(self, tool: ToolId) -> bool {
        self.0 & tool.bit() != 0
    }

    pub const fn is_subset_of(self, other: ToolSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = ToolId> {
        ToolId::ALL.into_iter().filter(move |tool| self.contains(*tool))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(ToolId::name).collect()
    }
}

#[derive(Debug, Error)]
enum ToolError {
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    Search(#[from] SearchError),

    #[error("access is limited to the uploaded report ({0})")]
    OutsideDocument(String),

    #[error("background task failed: {0}")]
    Join(String),
}

/// A keyword rule: fires when any marker and any qualifier both appear in
/// the lowercased report.
pub struct KeywordRule {
    pub markers: &'static [&'static str],
    pub qualifiers: &'static [&'static str],
    pub advice: &'static str,
}

impl KeywordRule {
    pub fn fires(&self, lowercase_report: &str) -> bool {
        self.markers.iter().any(|m| lowercase_report.contains(m))
            && self.qualifiers.iter().any(|q| lowercase_report.contains(q))
    }
}

pub(crate) fn render_recommendations(header: &str, items: &[&str]) -> String {
    let bullets: Vec<String> = items.iter().map(|item| format!("• {}", item)).collect();
    format!("{}\n{}", header, bullets.join("\n"))
}

/// Executes tools on behalf of agents. Shared read-only by all runs.
pub struct ToolBox {
    lookup: Arc<dyn KnowledgeLookup>,
}

impl ToolBox {
    pub fn new(lookup: Arc<dyn KnowledgeLookup>) -> Self {
        Self { lookup }
    }

    /// Run `tool` with `input` for a run whose report lives at `document`.
    /// Never fails: errors come back as `"<failure label>: <cause>"`.
    pub async fn run(&self, tool: ToolId, input: &str, document: &Path) -> String {
        debug!(tool = %tool, input_len = input.len(), "Running tool");
        match self.try_run(tool, input, document).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %tool, error = %e, "Tool failed");
                format!("{}: {}", tool.failure_label(), e)
            }
        }
    }

    async fn try_run(&self, tool: ToolId, input: &str, document: &Path) -> Result<String, ToolError> {
        let input = input.trim();
        match tool {
            ToolId::BloodTestReader => {
                if !input.is_empty() && Path::new(input) != document {
                    return Err(ToolError::OutsideDocument(input.to_string()));
                }
                read_document(document).await
            }
            ToolId::NutritionAnalyzer => {
                let report = self.report_or_document(input, document).await?;
                Ok(nutrition::analyze(&report))
            }
            ToolId::ExercisePlanner => {
                let report = self.report_or_document(input, document).await?;
                Ok(exercise::analyze(&report))
            }
            ToolId::WebSearch => Ok(self.lookup.lookup(input).await?),
        }
    }

    async fn report_or_document(&self, input: &str, document: &Path) -> Result<String, ToolError> {
        if input.is_empty() {
            read_document(document).await
        } else {
            Ok(input.to_string())
        }
    }
}

async fn read_document(document: &Path) -> Result<String, ToolError> {
    let path: PathBuf = document.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extract_text(&path))
        .await
        .map_err(|e| ToolError::Join(e.to_string()))??;
    Ok(text)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;

    /// Lookup double that echoes the query, or fails when asked to.
    pub struct StaticLookup {
        pub fail: bool,
    }

    #[async_trait]
    impl KnowledgeLookup for StaticLookup {
        async fn lookup(&self, query: &str) -> Result<String, SearchError> {
            if self.fail {
                Err(SearchError::NoResults)
            } else {
                Ok(format!("Reference notes for {}", query))
            }
        }
    }

    pub fn toolbox() -> ToolBox {
        ToolBox::new(Arc::new(StaticLookup { fail: false }))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{toolbox, StaticLookup};
    use super::*;

    const READER_ONLY: ToolSet = ToolSet::of(&[ToolId::BloodTestReader]);
    const READER_AND_SEARCH: ToolSet = ToolSet::of(&[ToolId::WebSearch, ToolId::BloodTestReader]);

    #[test]
    fn test_tool_names_round_trip() {
        for tool in ToolId::ALL {
            assert_eq!(ToolId::from_name(tool.name()), Some(tool));
        }
        assert_eq!(ToolId::from_name("delete_everything"), None);
    }

    #[test]
    fn test_toolset_relations() {
        assert!(READER_ONLY.is_subset_of(READER_AND_SEARCH));
        assert!(!READER_AND_SEARCH.is_subset_of(READER_ONLY));
        assert!(ToolSet::EMPTY.is_empty());
        assert_eq!(READER_AND_SEARCH.len(), 2);
        // iteration follows registry order, not declaration order
        assert_eq!(
            READER_AND_SEARCH.names(),
            vec!["read_blood_test_report", "search_web"]
        );
    }

    #[tokio::test]
    async fn test_reader_missing_document_soft_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.pdf");
        let output = toolbox().run(ToolId::BloodTestReader, "", &missing).await;
        assert!(output.starts_with("Error reading document: file not found at path:"));
    }

    #[tokio::test]
    async fn test_reader_refuses_other_paths() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("report.pdf");
        let output = toolbox()
            .run(ToolId::BloodTestReader, "/etc/passwd", &document)
            .await;
        assert!(output.starts_with("Error reading document: access is limited"));
    }

    #[tokio::test]
    async fn test_nutrition_uses_supplied_text() {
        let output = toolbox()
            .run(ToolId::NutritionAnalyzer, "Hemoglobin: 9.2 (Low)", Path::new("unused.pdf"))
            .await;
        assert!(output.contains("iron-rich foods"));
    }

    #[tokio::test]
    async fn test_exercise_without_text_reports_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.pdf");
        let output = toolbox().run(ToolId::ExercisePlanner, "  ", &missing).await;
        assert!(output.starts_with("Error in exercise planning:"));
    }

    #[tokio::test]
    async fn test_nutrition_without_text_reports_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.pdf");
        let output = toolbox().run(ToolId::NutritionAnalyzer, "", &missing).await;
        assert!(output.starts_with("Error in nutrition analysis: file not found at path:"));
    }

    #[tokio::test]
    async fn test_search_failure_is_text() {
        let tools = ToolBox::new(Arc::new(StaticLookup { fail: true }));
        let output = tools.run(ToolId::WebSearch, "ferritin", Path::new("x.pdf")).await;
        assert_eq!(output, "Error in web search: No results found for query");
    }
}
