//! The capability the pipeline needs from a PDF library.

use anyhow::Result;

/// Opens PDF documents from raw bytes.
pub trait DocumentReader {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn Document + '_>>;
}

/// An opened document.
pub trait Document {
    fn page_count(&self) -> usize;

    /// Loads page `number`, counting from 1.
    fn page(&self, number: usize) -> Result<Box<dyn Page + '_>>;
}

/// One page of an opened document.
pub trait Page {
    /// The page's embedded text, as the PDF stores it.
    fn text_layer(&self) -> Result<String>;

    /// Renders the page at `scale` times its natural size and returns the
    /// image PNG-encoded.
    fn rasterize(&self, scale: f32) -> Result<Vec<u8>>;
}
