//! In-memory team store using DashMap.
//!
//! Records are lost on restart; useful for development and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::team::{TeamId, TeamRecord};

use super::backend::{StorageError, TeamStore};

#[derive(Default)]
pub struct MemoryTeamStore {
    teams: DashMap<TeamId, TeamRecord>,
}

impl MemoryTeamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given records
    pub fn with_teams(teams: impl IntoIterator<Item = TeamRecord>) -> Self {
        let store = Self::new();
        for team in teams {
            store.teams.insert(team.id.clone(), team);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[async_trait]
impl TeamStore for MemoryTeamStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn all(&self) -> Result<Vec<TeamRecord>, StorageError> {
        let mut teams: Vec<_> = self.teams.iter().map(|e| e.value().clone()).collect();
        teams.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(teams)
    }

    async fn get(&self, team_id: &str) -> Result<Option<TeamRecord>, StorageError> {
        Ok(self.teams.get(team_id).map(|e| e.value().clone()))
    }

    async fn save(&self, team: &TeamRecord) -> Result<(), StorageError> {
        self.teams.insert(team.id.clone(), team.clone());
        Ok(())
    }
}
