pub mod poppler;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::{TextFragment, ToolDiag};

/// Page-level access to a PDF. Pages are 1-based.
pub trait Engine {
    fn doctor(&self) -> Result<Vec<ToolDiag>>;
    fn page_count(&self, input: &Path) -> Result<u32>;
    fn text_fragments(&self, input: &Path, page: u32) -> Result<Vec<TextFragment>>;
    fn ocr_page(&self, input: &Path, page: u32, lang: &str) -> Result<String>;
}
