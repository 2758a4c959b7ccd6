use tracing::warn;

use crate::cancel::CancelToken;
use crate::queue::{FileId, FileUpdate};

/// Forwards file updates to an external sink as `(file id, update JSON)`.
///
/// The first error returned by the sink is kept and cancels the batch; later
/// updates are dropped. [`UpdateRelay::finish`] hands the error back once the
/// batch has returned and its engine is released.
pub struct UpdateRelay<S, E> {
    sink: S,
    cancel: CancelToken,
    error: Option<E>,
}

impl<S, E> UpdateRelay<S, E>
where
    S: FnMut(String, String) -> Result<(), E>,
{
    pub fn new(cancel: CancelToken, sink: S) -> Self {
        Self {
            sink,
            cancel,
            error: None,
        }
    }

    pub fn send(&mut self, id: &FileId, update: &FileUpdate) {
        if self.error.is_some() {
            return;
        }
        let payload = match serde_json::to_string(update) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(file = %id, error = %err, "could not serialize update");
                return;
            }
        };
        if let Err(err) = (self.sink)(id.to_string(), payload) {
            warn!(file = %id, "update sink failed, cancelling batch");
            self.cancel.cancel();
            self.error = Some(err);
        }
    }

    pub fn finish(self) -> Result<(), E> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
