use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::AnalysisRequestor;
use crate::config::Settings;
use crate::coordinator::CoordinatorHandle;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Request interface to the recording coordinator
    pub coordinator: CoordinatorHandle,
    /// LLM analysis client
    pub requestor: Arc<AnalysisRequestor>,
    /// User settings (read-only here)
    pub settings: Settings,
    /// Where exports land
    pub export_dir: PathBuf,
}
