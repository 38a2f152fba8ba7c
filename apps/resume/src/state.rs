use std::sync::Arc;

use tokio::sync::Mutex;

use crate::layout::PageConfig;
use crate::resume::controller::FormController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one editing session. Every operation takes this lock, so edits,
    /// commits and export starts are serialized.
    pub session: Arc<Mutex<FormController>>,
    /// Template geometry used by every export.
    pub page_config: PageConfig,
}

impl AppState {
    pub fn new(controller: FormController, page_config: PageConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(controller)),
            page_config,
        }
    }
}
