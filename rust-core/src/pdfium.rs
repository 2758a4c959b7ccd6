//! [`DocumentReader`] backed by PDFium through `pdfium-render`.

use anyhow::{anyhow, Context, Result};
use lectern_ocr_worker::encode_rgba_png;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;

use crate::document::{Document, DocumentReader, Page};

/// Lets the bound library live in a static.
///
/// Pdfium is not reentrant; the pipeline only touches documents from the
/// thread running the batch.
struct PdfiumWrapper(Pdfium);
unsafe impl Send for PdfiumWrapper {}
unsafe impl Sync for PdfiumWrapper {}

static PDFIUM: OnceCell<PdfiumWrapper> = OnceCell::new();

/// Binds and retrieves the process-wide Pdfium instance.
///
/// Attempts to bind to the system library first, falling back to a library
/// next to the working directory. Failure to bind is reported on every call
/// until a binding succeeds.
fn get_pdfium() -> Result<&'static Pdfium> {
    let wrapper = PDFIUM.get_or_try_init(|| -> Result<PdfiumWrapper> {
        let bindings = Pdfium::bind_to_system_library()
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            })
            .map_err(|e| anyhow!("Could not load Pdfium library: {e}"))?;
        Ok(PdfiumWrapper(Pdfium::new(bindings)))
    })?;
    Ok(&wrapper.0)
}

/// Renders a page into a bitmap at the given scale.
fn generate_bitmap<'a>(page: &'a PdfPage<'a>, scale: f32) -> Result<PdfBitmap<'a>> {
    let width = (page.width().value * scale) as i32;
    let height = (page.height().value * scale) as i32;

    let render_config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .rotate_if_landscape(PdfPageRenderRotation::None, true);

    page.render_with_config(&render_config)
        .map_err(|e| anyhow!("Failed to render page: {e}"))
}

/// Reads PDFs with the Pdfium library.
pub struct PdfiumReader {
    pdfium: &'static Pdfium,
}

impl PdfiumReader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pdfium: get_pdfium()?,
        })
    }
}

impl DocumentReader for PdfiumReader {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn Document + '_>> {
        let inner = self
            .pdfium
            .load_pdf_from_byte_vec(bytes.to_vec(), None)
            .map_err(|e| anyhow!("Failed to open PDF: {e}"))?;
        Ok(Box::new(PdfiumDocument { inner }))
    }
}

struct PdfiumDocument {
    inner: PdfDocument<'static>,
}

impl Document for PdfiumDocument {
    fn page_count(&self) -> usize {
        self.inner.pages().len() as usize
    }

    fn page(&self, number: usize) -> Result<Box<dyn Page + '_>> {
        let index = number
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .with_context(|| format!("Page {number} is out of range"))?;

        let page = self
            .inner
            .pages()
            .get(index)
            .map_err(|e| anyhow!("Failed to load page {number}: {e}"))?;
        Ok(Box::new(PdfiumPage { inner: page }))
    }
}

struct PdfiumPage {
    inner: PdfPage<'static>,
}

impl Page for PdfiumPage {
    fn text_layer(&self) -> Result<String> {
        let text = self
            .inner
            .text()
            .map_err(|e| anyhow!("Text Access Error: {e}"))?;
        Ok(text.all())
    }

    fn rasterize(&self, scale: f32) -> Result<Vec<u8>> {
        let bitmap = generate_bitmap(&self.inner, scale)?;
        let mut buffer = bitmap.as_raw_bytes().to_vec();

        // Pdfium renders BGRA.
        buffer.chunks_exact_mut(4).for_each(|pixel| pixel.swap(0, 2));

        encode_rgba_png(bitmap.width() as u32, bitmap.height() as u32, &buffer)
    }
}
