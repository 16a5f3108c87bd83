// Mock dataset store.
//
// A read-only catalog of raw player and team records, constructed once and
// shared by reference. Records keep whatever field names the dataset was
// written with; `normalize` is the only place that interprets them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::normalize::{self, PLAYER_IDENTITY_FIELDS, TEAM_IDENTITY_FIELDS};

/// A raw record as written in the dataset: field name to JSON value.
pub type RawRecord = Map<String, Value>;

const BUNDLED_DATASET: &str = include_str!("../data/mock_dataset.json");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to parse mock dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Raw entities
// ---------------------------------------------------------------------------

/// A player as stored: identity fields plus one raw record per season.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayer {
    #[serde(default)]
    pub seasons: BTreeMap<String, RawRecord>,
    #[serde(flatten)]
    pub identity: RawRecord,
}

impl RawPlayer {
    pub fn id(&self) -> Option<String> {
        normalize::text(&self.identity, PLAYER_IDENTITY_FIELDS, "player_id")
    }

    pub fn team_name(&self) -> Option<String> {
        normalize::text(&self.identity, PLAYER_IDENTITY_FIELDS, "team")
    }

    pub fn season(&self, season: &str) -> Option<&RawRecord> {
        self.seasons.get(season)
    }
}

/// A team as stored: identity fields plus one raw record per season.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTeam {
    #[serde(default)]
    pub seasons: BTreeMap<String, RawRecord>,
    #[serde(flatten)]
    pub identity: RawRecord,
}

impl RawTeam {
    pub fn id(&self) -> Option<String> {
        normalize::text(&self.identity, TEAM_IDENTITY_FIELDS, "team_id")
    }

    pub fn name(&self) -> Option<String> {
        normalize::text(&self.identity, TEAM_IDENTITY_FIELDS, "name")
    }

    pub fn conference(&self) -> Option<String> {
        normalize::text(&self.identity, TEAM_IDENTITY_FIELDS, "conference")
    }

    pub fn season(&self, season: &str) -> Option<&RawRecord> {
        self.seasons.get(season)
    }
}

#[derive(Debug, Deserialize)]
struct MockDataset {
    #[serde(default)]
    players: Vec<RawPlayer>,
    #[serde(default)]
    teams: Vec<RawTeam>,
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Immutable mock catalog with id indexes.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    players: Vec<RawPlayer>,
    teams: Vec<RawTeam>,
    player_index: HashMap<String, usize>,
    team_index: HashMap<String, usize>,
}

impl MockStore {
    /// Load the dataset compiled into the binary.
    pub fn bundled() -> Result<Self, StoreError> {
        Self::from_json(BUNDLED_DATASET)
    }

    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let dataset: MockDataset = serde_json::from_str(text)?;
        Ok(Self::from_records(dataset.players, dataset.teams))
    }

    /// Build a store from already-parsed records. Entries without an id are
    /// dropped; on duplicate ids the first entry wins.
    pub fn from_records(players: Vec<RawPlayer>, teams: Vec<RawTeam>) -> Self {
        let players: Vec<RawPlayer> = players
            .into_iter()
            .filter(|p| {
                let keep = p.id().is_some();
                if !keep {
                    warn!("skipping mock player without an id");
                }
                keep
            })
            .collect();
        let teams: Vec<RawTeam> = teams
            .into_iter()
            .filter(|t| {
                let keep = t.id().is_some();
                if !keep {
                    warn!("skipping mock team without an id");
                }
                keep
            })
            .collect();

        let mut player_index = HashMap::new();
        for (i, player) in players.iter().enumerate() {
            if let Some(id) = player.id() {
                if player_index.contains_key(&id) {
                    warn!("duplicate mock player id '{}', keeping first entry", id);
                    continue;
                }
                player_index.insert(id, i);
            }
        }

        let mut team_index = HashMap::new();
        for (i, team) in teams.iter().enumerate() {
            if let Some(id) = team.id() {
                if team_index.contains_key(&id) {
                    warn!("duplicate mock team id '{}', keeping first entry", id);
                    continue;
                }
                team_index.insert(id, i);
            }
        }

        debug!(
            players = players.len(),
            teams = teams.len(),
            "mock store constructed"
        );

        MockStore {
            players,
            teams,
            player_index,
            team_index,
        }
    }

    pub fn players(&self) -> &[RawPlayer] {
        &self.players
    }

    pub fn teams(&self) -> &[RawTeam] {
        &self.teams
    }

    pub fn player(&self, player_id: &str) -> Option<&RawPlayer> {
        self.player_index
            .get(player_id)
            .and_then(|&i| self.players.get(i))
    }

    pub fn team(&self, team_id: &str) -> Option<&RawTeam> {
        self.team_index.get(team_id).and_then(|&i| self.teams.get(i))
    }

    /// Find a team by display name (case-insensitive).
    pub fn team_by_name(&self, name: &str) -> Option<&RawTeam> {
        self.teams.iter().find(|t| {
            t.name()
                .is_some_and(|n| n.eq_ignore_ascii_case(name.trim()))
        })
    }

    /// Players with a record in the given season.
    pub fn players_in_season<'a>(
        &'a self,
        season: &'a str,
    ) -> impl Iterator<Item = (&'a RawPlayer, &'a RawRecord)> + 'a {
        self.players
            .iter()
            .filter_map(move |p| p.season(season).map(|rec| (p, rec)))
    }

    /// Teams with a record in the given season.
    pub fn teams_in_season<'a>(
        &'a self,
        season: &'a str,
    ) -> impl Iterator<Item = (&'a RawTeam, &'a RawRecord)> + 'a {
        self.teams
            .iter()
            .filter_map(move |t| t.season(season).map(|rec| (t, rec)))
    }

    /// Every season present anywhere in the dataset, chronologically.
    pub fn seasons(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self
            .players
            .iter()
            .flat_map(|p| p.seasons.keys())
            .chain(self.teams.iter().flat_map(|t| t.seasons.keys()))
            .collect();
        set.into_iter().cloned().collect()
    }
}
