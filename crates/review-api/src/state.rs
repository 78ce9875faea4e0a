use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use crate::engine::AssignmentEngine;
use crate::error::ReviewError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub engine: AssignmentEngine,
}

impl AppStateInner {
    pub fn new(engine: AssignmentEngine) -> AppState {
        Arc::new(Self { engine })
    }
}

/// Run an engine call off the async runtime; every engine operation
/// ends in blocking SQLite work.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ReviewError>
where
    F: FnOnce(&AssignmentEngine) -> Result<T, ReviewError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.engine))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ReviewError::Internal(anyhow!("spawn_blocking join error: {}", e))
        })?
}
