use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::ApiError;
use crate::models::{AnalyzeResponse, AppState, DEFAULT_ANALYSIS_TYPE, DEFAULT_QUERY, DISCLAIMER};
use crate::pipeline::{AnalysisMode, PipelineOutcome};

/// Room for multipart boundaries and the text fields on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.upload.max_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/analyze", post(analyze_blood_report))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    query: Option<String>,
    analysis_type: Option<String>,
}

#[derive(Debug)]
struct UploadedFile {
    name: String,
    content: Bytes,
}

/// Owns the persisted upload. Normal exits call [`UploadGuard::remove`];
/// if the handler future is dropped first, `Drop` removes the file on the
/// blocking pool.
struct UploadGuard {
    path: Option<PathBuf>,
}

impl UploadGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            log_removal(&path, tokio::fs::remove_file(&path).await);
        }
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    let result = std::fs::remove_file(&path);
                    log_removal(&path, result);
                });
            }
            Err(_) => {
                let result = std::fs::remove_file(&path);
                log_removal(&path, result);
            }
        }
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Removed uploaded report"),
        Err(e) => debug!(path = %path.display(), error = %e, "Could not remove uploaded report"),
    }
}

async fn analyze_blood_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let max_bytes = state.upload.max_bytes;
    let form = read_form(&mut multipart, max_bytes).await?;

    let file = form
        .file
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    if !file.name.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest("Only PDF files are supported".to_string()));
    }
    if file.content.len() > max_bytes {
        return Err(too_large(max_bytes));
    }
    if file.content.is_empty() {
        return Err(ApiError::BadRequest("Empty file uploaded".to_string()));
    }

    let query = form
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_QUERY)
        .to_string();
    let analysis_type = form
        .analysis_type
        .unwrap_or_else(|| DEFAULT_ANALYSIS_TYPE.to_string());
    let mode = AnalysisMode::resolve(&analysis_type);

    info!(
        file = %file.name,
        size = file.content.len(),
        analysis_type = %analysis_type,
        mode = %mode,
        "Blood report analysis requested"
    );

    tokio::fs::create_dir_all(&state.upload.dir)
        .await
        .map_err(|e| ApiError::Processing(format!("could not create upload directory: {}", e)))?;
    let upload = UploadGuard::new(
        state
            .upload
            .dir
            .join(format!("blood_test_report_{}.pdf", Uuid::new_v4())),
    );
    let result = store_and_analyze(&state, &file.content, mode, &query, upload.path()).await;
    upload.remove().await;
    let outcome = result?;

    Ok(Json(AnalyzeResponse {
        status: "success".to_string(),
        query,
        analysis_type,
        analysis: outcome.analysis,
        file_processed: file.name,
        disclaimer: DISCLAIMER.to_string(),
    }))
}

async fn store_and_analyze(
    state: &AppState,
    content: &[u8],
    mode: AnalysisMode,
    query: &str,
    path: &Path,
) -> Result<PipelineOutcome, ApiError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| ApiError::Processing(format!("could not store upload: {}", e)))?;

    state.orchestrator.run(mode, query, path).await.map_err(|e| {
        error!(error = %e, "Blood report analysis failed");
        ApiError::Processing(e.to_string())
    })
}

async fn read_form(multipart: &mut Multipart, max_bytes: usize) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await.map_err(|e| multipart_error(e, max_bytes))?;
                form.file = Some(UploadedFile {
                    name: file_name,
                    content,
                });
            }
            "query" => {
                form.query = Some(field.text().await.map_err(|e| multipart_error(e, max_bytes))?);
            }
            "analysis_type" => {
                form.analysis_type =
                    Some(field.text().await.map_err(|e| multipart_error(e, max_bytes))?);
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }
    Ok(form)
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        ApiError::BadRequest(format!("Invalid upload: {}", e.body_text()))
    }
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::BadRequest(format!(
        "File size too large. Maximum {}MB allowed",
        max_bytes / (1024 * 1024)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::test_support::{addressee, last_message, settings, ScriptedBackend};
    use crate::agents::{AgentRole, AgentRoster};
    use crate::config::UploadConfig;
    use crate::pipeline::{Orchestrator, TaskBook};
    use crate::tools::pdf::test_pdf::write_pdf;
    use crate::tools::test_support::toolbox;
    use crate::types::AppError;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "bloodwork-test-boundary";

    enum Part<'a> {
        File(&'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::File(name, content) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(content);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value)
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn app(backend: Arc<ScriptedBackend>, upload: UploadConfig) -> Router {
        let roster = AgentRoster::new(backend, settings(), toolbox()).unwrap();
        let orchestrator = Orchestrator::new(Arc::new(roster), Arc::new(TaskBook::new().unwrap()));
        router(AppState::new(Arc::new(orchestrator), upload))
    }

    fn upload_config(dir: &Path) -> UploadConfig {
        UploadConfig {
            dir: dir.to_path_buf(),
            ..UploadConfig::default()
        }
    }

    async fn post(app: Router, parts: &[Part<'_>]) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn blank_pdf() -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.pdf");
        write_pdf(&path, &[]);
        std::fs::read(&path).unwrap()
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    /// Doctor reads the report, then answers around whatever it saw.
    fn reading_doctor() -> Arc<ScriptedBackend> {
        Arc::new(ScriptedBackend::new(|request| {
            Ok(match (addressee(request), last_message(request).strip_prefix("Observation: ")) {
                (AgentRole::Doctor, None) => {
                    "Action: read_blood_test_report\nAction Input: ".to_string()
                }
                (AgentRole::Doctor, Some(obs)) => format!(
                    "Final Answer: I could not interpret your results. {} Please upload a readable report.",
                    obs
                ),
                (role, _) => format!("Final Answer: {} done", role),
            })
        }))
    }

    #[tokio::test]
    async fn test_non_pdf_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = reading_doctor();
        let app = app(Arc::clone(&backend), upload_config(dir.path()));

        let (status, body) = post(app, &[Part::File("results.txt", b"Hemoglobin: 9.2")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Only PDF files are supported");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = blank_pdf();
        let app = app(reading_doctor(), upload_config(dir.path()));

        let (status, body) = post(app, &[Part::File("REPORT.PDF", &pdf)]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file_processed"], "REPORT.PDF");
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(reading_doctor(), upload_config(dir.path()));

        let (status, body) = post(app, &[Part::File("report.pdf", b"")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Empty file uploaded");
    }

    #[tokio::test]
    async fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(reading_doctor(), upload_config(dir.path()));

        let (status, _) = post(app, &[Part::Text("query", "hello")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let upload = UploadConfig {
            dir: dir.path().to_path_buf(),
            max_bytes: 1024,
        };

        let just_over = vec![b'%'; 1025];
        let (status, body) = post(
            app(reading_doctor(), upload.clone()),
            &[Part::File("report.pdf", &just_over)],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("File size too large"));

        // past the body limit the multipart reader itself gives up
        let far_over = vec![b'%'; 1024 + MULTIPART_OVERHEAD + 1];
        let (status, _) = post(
            app(reading_doctor(), upload),
            &[Part::File("report.pdf", &far_over)],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_blank_pdf_medical_only_reports_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = blank_pdf();
        let backend = reading_doctor();
        let app = app(Arc::clone(&backend), upload_config(dir.path()));

        let (status, body) = post(
            app,
            &[
                Part::File("report.pdf", &pdf),
                Part::Text("query", "   "),
                Part::Text("analysis_type", "medical_only"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["query"], DEFAULT_QUERY);
        assert_eq!(body["analysis_type"], "medical_only");
        assert_eq!(body["disclaimer"], DISCLAIMER);
        let analysis = body["analysis"].as_str().unwrap();
        assert!(analysis.starts_with("I could not interpret your results."));
        assert!(analysis.contains("Error reading document: no content found in PDF"));
        assert_eq!(backend.call_count(), 2);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_comprehensive_returns_last_stage_output() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = blank_pdf();
        let backend = Arc::new(ScriptedBackend::new(|request| {
            Ok(format!("Final Answer: {} done", addressee(request)))
        }));
        let app = app(Arc::clone(&backend), upload_config(dir.path()));

        let (status, body) = post(
            app,
            &[
                Part::File("report.pdf", &pdf),
                Part::Text("query", "  Is my cholesterol ok?  "),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "Is my cholesterol ok?");
        assert_eq!(body["analysis_type"], "comprehensive");
        assert_eq!(body["analysis"], "exercise_specialist done");
        assert_eq!(backend.call_count(), 4);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_backend_failure_is_500_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = blank_pdf();
        let backend = Arc::new(ScriptedBackend::new(|_| {
            Err(AppError::LLMApi("upstream unavailable".to_string()))
        }));
        let app = app(backend, upload_config(dir.path()));

        let (status, body) = post(app, &[Part::File("report.pdf", &pdf)]).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Error processing blood report:"));
        assert!(detail.contains("upstream unavailable"));
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn test_guard_swallows_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never_written.pdf");
        drop(UploadGuard::new(path.clone()));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_guard_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blood_test_report_1.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        UploadGuard::new(path.clone()).remove().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_guard_dropped_inside_runtime_removes_on_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blood_test_report_2.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        drop(UploadGuard::new(path.clone()));
        for _ in 0..200 {
            if !path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(!path.exists());
    }
}
