use crate::error::EngineError;

/// Text recognized from one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Mean word confidence, 0 to 100.
    pub confidence: f32,
}

/// A live recognition engine bound to one language configuration.
///
/// Engines are expensive to set up, so the pipeline initializes one per batch
/// and reuses it for every image and rasterized page in that batch.
pub trait RecognitionEngine {
    /// Recognizes text in an encoded image (PNG, JPEG, ...).
    ///
    /// Engines that can observe their own progress report it through
    /// `progress` as a fraction in `[0, 1]`. Engines that cannot simply never
    /// call it.
    fn recognize(
        &mut self,
        image: &[u8],
        progress: &mut dyn FnMut(f32),
    ) -> Result<Recognition, EngineError>;

    /// Releases whatever the engine holds. Calls to [`recognize`] after this
    /// fail with [`EngineError::Terminated`].
    ///
    /// [`recognize`]: RecognitionEngine::recognize
    fn terminate(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Produces engines for a language tag such as `eng` or `eng+deu`.
pub trait EngineFactory {
    type Engine: RecognitionEngine;

    fn initialize(&self, language: &str) -> Result<Self::Engine, EngineError>;
}
