//! Helpers shared by the pipeline runners

use std::sync::Arc;

use beehive_common::{Error, History, Result, SourceState};
use beehive_storage::Storage;
use tracing::warn;

/// Load prior state for a source; absence initializes an empty state, any
/// other retrieval error is fatal for the run.
pub(crate) async fn load_state(
    storage: &Arc<dyn Storage>,
    source_id: &str,
) -> Result<SourceState> {
    match storage.get_state(source_id).await {
        Ok(state) => Ok(state),
        Err(Error::NotFound { .. }) => Ok(SourceState::new(source_id)),
        Err(err) => Err(err),
    }
}

/// Persist the run outcome. Neither write may mask the primary result, so
/// failures are logged and swallowed.
pub(crate) async fn persist_outcome(
    storage: &Arc<dyn Storage>,
    state: SourceState,
    history: &History,
) {
    let source_id = state.source_id.clone();
    if let Err(err) = storage.save_state(state).await {
        warn!(%source_id, error = %err, "failed to save source state");
    }
    if let Err(err) = storage.save_history(history.clone()).await {
        warn!(%source_id, error = %err, "failed to save run history");
    }
}
