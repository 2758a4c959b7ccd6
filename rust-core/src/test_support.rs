//! In-memory doubles for the engine and PDF capabilities.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use lectern_ocr_worker::{EngineError, EngineFactory, Recognition, RecognitionEngine};

use crate::document::{Document, DocumentReader, Page};

#[derive(Debug, Default)]
pub struct EngineLog {
    pub initialized: usize,
    pub terminated: usize,
    pub languages: Vec<String>,
}

/// Engine answering from a table keyed by image bytes.
#[derive(Clone, Default)]
pub struct FakeEngine {
    responses: HashMap<Vec<u8>, Recognition>,
    progress: Vec<f32>,
    recognized: Rc<RefCell<Vec<Vec<u8>>>>,
    log: Rc<RefCell<EngineLog>>,
}

impl FakeEngine {
    pub fn respond(mut self, image: &[u8], text: &str, confidence: f32) -> Self {
        self.responses.insert(
            image.to_vec(),
            Recognition {
                text: text.to_string(),
                confidence,
            },
        );
        self
    }

    pub fn with_progress(mut self, steps: &[f32]) -> Self {
        self.progress = steps.to_vec();
        self
    }

    pub fn calls(&self) -> usize {
        self.recognized.borrow().len()
    }

    pub fn recognized(&self) -> Vec<Vec<u8>> {
        self.recognized.borrow().clone()
    }
}

impl RecognitionEngine for FakeEngine {
    fn recognize(
        &mut self,
        image: &[u8],
        progress: &mut dyn FnMut(f32),
    ) -> Result<Recognition, EngineError> {
        self.recognized.borrow_mut().push(image.to_vec());
        for step in &self.progress {
            progress(*step);
        }
        self.responses
            .get(image)
            .cloned()
            .ok_or_else(|| EngineError::Execution(format!("no text in {} byte image", image.len())))
    }

    fn terminate(&mut self) -> Result<(), EngineError> {
        self.log.borrow_mut().terminated += 1;
        Ok(())
    }
}

/// Hands out clones of one [`FakeEngine`] and records the engine lifecycle.
#[derive(Clone, Default)]
pub struct FakeFactory {
    engine: FakeEngine,
    fail: bool,
}

impl FakeFactory {
    pub fn new(engine: FakeEngine) -> Self {
        Self {
            engine,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            engine: FakeEngine::default(),
            fail: true,
        }
    }

    pub fn log(&self) -> std::cell::Ref<'_, EngineLog> {
        self.engine.log.borrow()
    }
}

impl EngineFactory for FakeFactory {
    type Engine = FakeEngine;

    fn initialize(&self, language: &str) -> Result<FakeEngine, EngineError> {
        let mut log = self.engine.log.borrow_mut();
        log.languages.push(language.to_string());
        if self.fail {
            return Err(EngineError::LanguageUnavailable(language.to_string()));
        }
        log.initialized += 1;
        Ok(self.engine.clone())
    }
}

/// A page whose rasterization yields the bytes `raster-<page number>`.
#[derive(Clone)]
pub struct FakePage {
    text: Result<String, String>,
    raster_error: Option<String>,
    missing: bool,
}

impl FakePage {
    pub fn text(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            raster_error: None,
            missing: false,
        }
    }

    pub fn text_failure() -> Self {
        Self {
            text: Err("corrupt content stream".to_string()),
            raster_error: None,
            missing: false,
        }
    }

    pub fn raster_failure(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            raster_error: Some("render failed".to_string()),
            missing: false,
        }
    }

    pub fn missing() -> Self {
        Self {
            text: Ok(String::new()),
            raster_error: None,
            missing: true,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeReader {
    pages: Vec<FakePage>,
    broken: bool,
}

impl FakeReader {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            broken: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            pages: Vec::new(),
            broken: true,
        }
    }
}

impl DocumentReader for FakeReader {
    fn open(&self, _bytes: &[u8]) -> Result<Box<dyn Document + '_>> {
        if self.broken {
            return Err(anyhow!("not a PDF"));
        }
        Ok(Box::new(FakeDocument { pages: &self.pages }))
    }
}

struct FakeDocument<'a> {
    pages: &'a [FakePage],
}

impl Document for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: usize) -> Result<Box<dyn Page + '_>> {
        let page = number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .filter(|p| !p.missing)
            .ok_or_else(|| anyhow!("page {number} not found"))?;
        Ok(Box::new(FakePageView { page, number }))
    }
}

struct FakePageView<'a> {
    page: &'a FakePage,
    number: usize,
}

impl Page for FakePageView<'_> {
    fn text_layer(&self) -> Result<String> {
        self.page.text.clone().map_err(|e| anyhow!(e))
    }

    fn rasterize(&self, _scale: f32) -> Result<Vec<u8>> {
        match &self.page.raster_error {
            Some(err) => Err(anyhow!(err.clone())),
            None => Ok(format!("raster-{}", self.number).into_bytes()),
        }
    }
}
