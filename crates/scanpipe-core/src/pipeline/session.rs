use tracing::debug;

use crate::backend::ImageBackend;

/// Scoped access to the backend for one scan.
///
/// Every image still registered when the session ends is closed, so no
/// stack from one scan survives into the next, whether the scan finished
/// or bailed out early with an error.
pub struct ScanSession<'a> {
    backend: &'a mut dyn ImageBackend,
}

impl<'a> ScanSession<'a> {
    pub fn new(backend: &'a mut dyn ImageBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&mut self) -> &mut (dyn ImageBackend + 'a) {
        &mut *self.backend
    }
}

impl Drop for ScanSession<'_> {
    fn drop(&mut self) {
        let open = self.backend.ids().len();
        if open > 0 {
            debug!(open, "Closing images left open by the scan");
            self.backend.close_all();
        }
    }
}
