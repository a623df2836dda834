//! Best-effort persistence.
//!
//! Purging revoked credentials must never block or fail a connection
//! attempt. A save that cannot complete is reported and dropped, never
//! retried.

use serde::Serialize;

use crate::metrics::STORE_SAVE_DROPPED_TOTAL;
use crate::team::TeamRecord;

use super::backend::TeamStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    Dropped { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// Save `team`, swallowing any storage error.
pub async fn save_best_effort(store: &dyn TeamStore, team: &TeamRecord) -> SaveOutcome {
    match store.save(team).await {
        Ok(()) => SaveOutcome::Saved,
        Err(e) => {
            STORE_SAVE_DROPPED_TOTAL.inc();
            tracing::warn!(
                team_id = %team.id,
                backend = store.backend_type(),
                error = %e,
                "Best-effort save dropped"
            );
            SaveOutcome::Dropped {
                reason: e.to_string(),
            }
        }
    }
}
