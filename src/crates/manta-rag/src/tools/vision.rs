//! Vision-page retrieval tool.
//!
//! Fallback for corpora the text pipeline cannot read (scanned PDFs,
//! figures, tables rendered as images). Renders the first few pages of
//! the first PDF under the docs root and asks a vision-capable model to
//! answer from the images.
//!
//! "No PDFs" and "nothing rendered" are expected conditions and return
//! explanatory `CONTEXT (vision)` text. A failing render command or an
//! unreachable vision model is a real error and propagates, so the
//! caller can annotate its degraded answer.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

use manta_core::{ChatModel, ChatRequest, Message, Tool, ToolError};

use crate::config::RagConfig;
use crate::pdf::PageRenderer;

/// Registered name of the vision retrieval tool.
pub const VISION_TOOL: &str = "vision_pdf_search";

/// Instruction text prepended to the user's question in the multimodal
/// message.
pub const VISION_QUESTION_PREFIX: &str = "You are given page images from a PDF. \
Answer the question by reading the images. If unsure, say so. Question: ";

/// Sampling temperature for the vision model; low, because the task is
/// reading, not writing.
pub const VISION_TEMPERATURE: f32 = 0.2;

/// Answers questions by reading rendered PDF page images.
pub struct VisionPdfTool {
    docs_dir: PathBuf,
    image_dir: PathBuf,
    max_pages: usize,
    dpi: u32,
    temperature: f32,
    renderer: Arc<dyn PageRenderer>,
    model: Arc<dyn ChatModel>,
}

impl VisionPdfTool {
    pub fn new(
        config: &RagConfig,
        renderer: Arc<dyn PageRenderer>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            docs_dir: config.docs_dir.clone(),
            image_dir: config.image_dir.clone(),
            max_pages: config.max_pages,
            dpi: config.dpi,
            temperature: VISION_TEMPERATURE,
            renderer,
            model,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

fn find_pdfs(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }
    let mut pdfs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    pdfs.sort();
    pdfs
}

fn page_set(count: usize) -> String {
    let numbers: Vec<String> = (1..=count).map(|n| n.to_string()).collect();
    format!("{{{}}}", numbers.join(", "))
}

#[async_trait]
impl Tool for VisionPdfTool {
    fn name(&self) -> &str {
        VISION_TOOL
    }

    fn description(&self) -> &str {
        "Answer a question by reading rendered PDF page images with a vision model. \
         Useful when the documents are scanned and plain text search finds nothing."
    }

    async fn invoke(&self, args: &Value) -> Result<String, ToolError> {
        let query = args.get("query").and_then(Value::as_str).unwrap_or("");

        let pdfs = find_pdfs(&self.docs_dir);
        let Some(pdf) = pdfs.first() else {
            return Ok(format!(
                "CONTEXT (vision): No PDFs found under {}.",
                self.docs_dir.display()
            ));
        };

        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "pdf".to_string());
        let out_dir = self.image_dir.join(&stem);

        let pages = self
            .renderer
            .render_pages(pdf, &out_dir, self.max_pages, self.dpi)
            .await
            .map_err(|e| ToolError::execution_failed(VISION_TOOL, e.to_string()))?;

        if pages.is_empty() {
            return Ok("CONTEXT (vision): Could not render any pages from PDFs.".to_string());
        }
        info!(pdf = %pdf.display(), pages = pages.len(), "asking vision model");

        let question = format!("{}{}", VISION_QUESTION_PREFIX, query);
        let images: Vec<String> = pages
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let request = ChatRequest::new(vec![Message::user_with_images(question, images)])
            .with_temperature(self.temperature);

        let response = self
            .model
            .chat(request)
            .await
            .map_err(|e| ToolError::execution_failed(VISION_TOOL, e.to_string()))?;

        let answer = response.message.text().unwrap_or("").trim().to_string();
        debug!(answer_len = answer.len(), "vision model answered");

        let basename = pdf
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(stem);
        Ok(format!(
            "CONTEXT (vision from {} pages {}):\n{}",
            basename,
            page_set(pages.len()),
            answer
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use manta_core::{ChatResponse, MessageContent};
    use std::sync::Mutex;

    struct StubRenderer {
        pages: Vec<PathBuf>,
    }

    #[async_trait]
    impl PageRenderer for StubRenderer {
        async fn render_pages(
            &self,
            _pdf: &Path,
            _out_dir: &Path,
            _max_pages: usize,
            _dpi: u32,
        ) -> crate::error::Result<Vec<PathBuf>> {
            Ok(self.pages.clone())
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl PageRenderer for FailingRenderer {
        async fn render_pages(
            &self,
            _pdf: &Path,
            _out_dir: &Path,
            _max_pages: usize,
            _dpi: u32,
        ) -> crate::error::Result<Vec<PathBuf>> {
            Err(RagError::Pdf("pdftoppm not installed".to_string()))
        }
    }

    #[derive(Clone)]
    struct CapturingModel {
        answer: String,
        seen: Arc<Mutex<Option<ChatRequest>>>,
    }

    impl CapturingModel {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                seen: Arc::new(Mutex::new(None)),
            }
        }
    }

    #[async_trait]
    impl ChatModel for CapturingModel {
        async fn chat(&self, request: ChatRequest) -> manta_core::Result<ChatResponse> {
            *self.seen.lock().unwrap() = Some(request);
            Ok(ChatResponse::new(Message::assistant(self.answer.clone())))
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(self.clone())
        }
    }

    #[derive(Clone)]
    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn chat(&self, _request: ChatRequest) -> manta_core::Result<ChatResponse> {
            Err(manta_core::CoreError::model("connection refused"))
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(self.clone())
        }
    }

    fn docs_with_pdf() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("manual.pdf"), b"%PDF-fake").unwrap();
        dir
    }

    fn config_for(docs: &Path) -> RagConfig {
        RagConfig::new().with_docs_dir(docs).with_max_pages(3)
    }

    #[test]
    fn test_page_set_formatting() {
        assert_eq!(page_set(1), "{1}");
        assert_eq!(page_set(3), "{1, 2, 3}");
    }

    #[tokio::test]
    async fn test_no_pdfs_returns_text_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = VisionPdfTool::new(
            &config_for(dir.path()),
            Arc::new(StubRenderer { pages: vec![] }),
            Arc::new(CapturingModel::new("unused")),
        );
        let result = tool.invoke(&json!({"query": "q"})).await.unwrap();
        assert_eq!(
            result,
            format!("CONTEXT (vision): No PDFs found under {}.", dir.path().display())
        );
    }

    #[tokio::test]
    async fn test_zero_rendered_pages_returns_text() {
        let docs = docs_with_pdf();
        let tool = VisionPdfTool::new(
            &config_for(docs.path()),
            Arc::new(StubRenderer { pages: vec![] }),
            Arc::new(CapturingModel::new("unused")),
        );
        let result = tool.invoke(&json!({"query": "q"})).await.unwrap();
        assert_eq!(result, "CONTEXT (vision): Could not render any pages from PDFs.");
    }

    #[tokio::test]
    async fn test_success_tags_source_and_pages() {
        let docs = docs_with_pdf();
        let model = CapturingModel::new("The warranty lasts two years.");
        let tool = VisionPdfTool::new(
            &config_for(docs.path()),
            Arc::new(StubRenderer {
                pages: vec![PathBuf::from("/imgs/page-1.png"), PathBuf::from("/imgs/page-2.png")],
            }),
            Arc::new(model.clone()),
        );

        let result = tool
            .invoke(&json!({"query": "how long is the warranty?"}))
            .await
            .unwrap();
        assert_eq!(
            result,
            "CONTEXT (vision from manual.pdf pages {1, 2}):\nThe warranty lasts two years."
        );

        let request = model.seen.lock().unwrap().take().unwrap();
        assert_eq!(request.config.temperature, Some(VISION_TEMPERATURE));
        assert_eq!(request.messages.len(), 1);
        let text = request.messages[0].text().unwrap().to_string();
        assert!(text.starts_with(VISION_QUESTION_PREFIX));
        assert!(text.ends_with("how long is the warranty?"));
        match &request.messages[0].content {
            MessageContent::Parts(parts) => {
                let image_count = parts
                    .iter()
                    .filter(|p| matches!(p, manta_core::ContentPart::Image { .. }))
                    .count();
                assert_eq!(image_count, 2);
            }
            other => panic!("expected multimodal parts, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_render_failure_is_an_error() {
        let docs = docs_with_pdf();
        let tool = VisionPdfTool::new(
            &config_for(docs.path()),
            Arc::new(FailingRenderer),
            Arc::new(CapturingModel::new("unused")),
        );
        let err = tool.invoke(&json!({"query": "q"})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let docs = docs_with_pdf();
        let tool = VisionPdfTool::new(
            &config_for(docs.path()),
            Arc::new(StubRenderer {
                pages: vec![PathBuf::from("/imgs/page-1.png")],
            }),
            Arc::new(DownModel),
        );
        let err = tool.invoke(&json!({"query": "q"})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
