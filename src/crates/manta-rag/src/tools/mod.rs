//! Tool implementations over the retrieval pipeline.

pub mod rag_search;
pub mod vision;

pub use rag_search::{
    DocumentSearchTool, DOCUMENT_SEARCH_TOOL, NO_CONTEXT_MARKER, NO_CONTEXT_SENTINEL,
};
pub use vision::{VisionPdfTool, VISION_QUESTION_PREFIX, VISION_TEMPERATURE, VISION_TOOL};
