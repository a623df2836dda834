//! Registry of teams that currently hold a live gateway session.
//!
//! The registry is owned by the [`Controller`](crate::controller::Controller)
//! and shared by reference; there is no process-global instance.
//!
//! Besides the live set it tracks two pieces of bookkeeping:
//! - teams with a connection attempt in flight, so a second attempt for the
//!   same team is refused instead of opening a duplicate session
//! - sessions whose reconnection was exhausted before their registration
//!   landed, so a late `add` for that session is dropped. Entries only exist
//!   while an attempt for the team is in flight.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use uuid::Uuid;

use crate::team::TeamId;

/// A registry entry for a team with a live session
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedTeam {
    pub team_id: TeamId,
    pub session_id: Uuid,
    pub connected_at: DateTime<Utc>,
}

/// Outcome of [`ConnectedTeams::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The session's reconnection was already reported exhausted
    Retired,
}

/// In-memory set of team IDs holding a live session
#[derive(Default)]
pub struct ConnectedTeams {
    teams: DashMap<TeamId, ConnectedTeam>,
    connecting: DashSet<TeamId>,
    retired: DashMap<Uuid, TeamId>,
}

impl ConnectedTeams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the team currently holds a live session
    pub fn contains(&self, team_id: &str) -> bool {
        self.teams.contains_key(team_id)
    }

    /// Register a live session for a team.
    ///
    /// A session already reported as failed is not registered; the failure
    /// wins over a registration that arrives after it.
    pub fn add(&self, team_id: &str, session_id: Uuid) -> AddOutcome {
        if self.retired.remove(&session_id).is_some() {
            tracing::debug!(
                team_id = %team_id,
                session_id = %session_id,
                "Session failed before registration, not registering"
            );
            return AddOutcome::Retired;
        }

        self.teams.insert(
            team_id.to_string(),
            ConnectedTeam {
                team_id: team_id.to_string(),
                session_id,
                connected_at: Utc::now(),
            },
        );
        AddOutcome::Added
    }

    /// Remove a team. Removing an absent team is a no-op.
    pub fn remove(&self, team_id: &str) -> Option<ConnectedTeam> {
        self.teams.remove(team_id).map(|(_, entry)| entry)
    }

    /// Mark a session as failed so a registration still in flight for it is
    /// dropped. Returns whether the session was retired; without an attempt
    /// in flight for the team there is nothing to retire.
    pub fn retire_session(&self, team_id: &str, session_id: Uuid) -> bool {
        if !self.is_connecting(team_id) {
            return false;
        }
        self.retired.insert(session_id, team_id.to_string());

        // The attempt may have released its claim in between
        if !self.is_connecting(team_id) {
            self.retired.remove(&session_id);
            return false;
        }
        true
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Claim the right to open a session for a team.
    ///
    /// Returns `None` when the team is already connected or another attempt
    /// for it is in flight. The claim is released when the returned guard is
    /// dropped, which the attempt does only after registering its outcome.
    pub fn begin_connect(self: &Arc<Self>, team_id: &str) -> Option<ConnectClaim> {
        // Insert first, then check: a finishing attempt registers before it
        // releases, so one of the two checks always sees it.
        if !self.connecting.insert(team_id.to_string()) {
            return None;
        }
        if self.contains(team_id) {
            self.connecting.remove(team_id);
            return None;
        }

        Some(ConnectClaim {
            registry: Arc::clone(self),
            team_id: team_id.to_string(),
        })
    }

    /// Whether an attempt for the team is in flight
    pub fn is_connecting(&self, team_id: &str) -> bool {
        self.connecting.contains(team_id)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn connecting_count(&self) -> usize {
        self.connecting.len()
    }

    /// Snapshot of all live entries, sorted by team ID
    pub fn snapshot(&self) -> Vec<ConnectedTeam> {
        let mut entries: Vec<_> = self.teams.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.team_id.cmp(&b.team_id));
        entries
    }
}

/// Guard for an in-flight connection attempt
pub struct ConnectClaim {
    registry: Arc<ConnectedTeams>,
    team_id: TeamId,
}

impl ConnectClaim {
    pub fn team_id(&self) -> &str {
        &self.team_id
    }
}

impl Drop for ConnectClaim {
    fn drop(&mut self) {
        // Release first: a retirement racing with us either sees the claim
        // gone or is cleared below
        self.registry.connecting.remove(&self.team_id);
        self.registry
            .retired
            .retain(|_, team_id| *team_id != self.team_id);
    }
}
