// Source-resolving fetchers.
//
// Each fetch tries the live API under a per-resource timeout and, on any
// failure (transport error, non-2xx status, timeout, undecodable body),
// serves the normalized mock equivalent instead. Every result is tagged with
// the source that produced it. There is no retry and no circuit breaker:
// every call tries the network again.
//
// Timeouts drop the in-flight request future, which cancels the underlying
// HTTP request; a late response can never overwrite the fallback.

pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{debug, info, warn};

use courtvision_core::gamelog::{synthesize_player_games, synthesize_team_games};
use courtvision_core::leaderboard::{player_leaderboard, team_leaderboard, team_roster, PlayerFilter};
use courtvision_core::model::{
    PlayerGame, PlayerProfile, PlayerRow, RosterEntry, TeamGame, TeamProfile, TeamRow,
};
use courtvision_core::normalize::{
    normalize_player_profile, normalize_team_profile, rescale_player_game, rescale_player_stats,
    rescale_roster_entry, rescale_team_stats,
};
use courtvision_core::{MockStore, Season, Source};

use crate::config::{AppConfig, NotFoundPolicy, TimeoutConfig};

pub use transport::{HttpTransport, Transport, TransportError};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The seven resources the live API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Players,
    PlayerProfile,
    PlayerGames,
    Teams,
    TeamProfile,
    TeamRoster,
    TeamGames,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Players,
        ResourceKind::PlayerProfile,
        ResourceKind::PlayerGames,
        ResourceKind::Teams,
        ResourceKind::TeamProfile,
        ResourceKind::TeamRoster,
        ResourceKind::TeamGames,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Players => "players",
            ResourceKind::PlayerProfile => "player_profile",
            ResourceKind::PlayerGames => "player_games",
            ResourceKind::Teams => "teams",
            ResourceKind::TeamProfile => "team_profile",
            ResourceKind::TeamRoster => "team_roster",
            ResourceKind::TeamGames => "team_games",
        }
    }

    /// Single-entity lookups, where a 404 can be a real answer.
    pub fn is_profile(&self) -> bool {
        matches!(self, ResourceKind::PlayerProfile | ResourceKind::TeamProfile)
    }
}

// ---------------------------------------------------------------------------
// Resolved envelope
// ---------------------------------------------------------------------------

/// A payload type and the key it is published under in the envelope.
pub trait Payload: Serialize {
    const KEY: &'static str;

    /// The "nothing here" value: an empty list or a null entity.
    fn empty() -> Self;

    /// Bring percentage fields of a decoded API payload onto the 0-100 scale.
    fn rescale(&mut self);
}

impl Payload for Vec<PlayerRow> {
    const KEY: &'static str = "data";
    fn empty() -> Self {
        Vec::new()
    }
    fn rescale(&mut self) {
        self.iter_mut().for_each(|row| rescale_player_stats(&mut row.stats));
    }
}

impl Payload for Option<PlayerProfile> {
    const KEY: &'static str = "player";
    fn empty() -> Self {
        None
    }
    fn rescale(&mut self) {
        for season in self.iter_mut().flat_map(|p| p.stats.values_mut()) {
            rescale_player_stats(&mut season.stats);
        }
    }
}

impl Payload for Vec<PlayerGame> {
    const KEY: &'static str = "games";
    fn empty() -> Self {
        Vec::new()
    }
    fn rescale(&mut self) {
        self.iter_mut().for_each(rescale_player_game);
    }
}

impl Payload for Vec<TeamRow> {
    const KEY: &'static str = "data";
    fn empty() -> Self {
        Vec::new()
    }
    fn rescale(&mut self) {
        self.iter_mut().for_each(|row| rescale_team_stats(&mut row.stats));
    }
}

impl Payload for Option<TeamProfile> {
    const KEY: &'static str = "team";
    fn empty() -> Self {
        None
    }
    fn rescale(&mut self) {
        for season in self.iter_mut().flat_map(|t| t.stats.values_mut()) {
            rescale_team_stats(&mut season.stats);
        }
    }
}

impl Payload for Vec<RosterEntry> {
    const KEY: &'static str = "roster";
    fn empty() -> Self {
        Vec::new()
    }
    fn rescale(&mut self) {
        self.iter_mut().for_each(rescale_roster_entry);
    }
}

impl Payload for Vec<TeamGame> {
    const KEY: &'static str = "games";
    fn empty() -> Self {
        Vec::new()
    }
    // Team game columns are points and per-100 ratings, none of them percentages.
    fn rescale(&mut self) {}
}

/// A fetched value and where it came from. Serializes as
/// `{ "<key>": value, "source": "api" | "mock" }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub fn api(value: T) -> Self {
        Self {
            value,
            source: Source::Api,
        }
    }

    pub fn mock(value: T) -> Self {
        Self {
            value,
            source: Source::Mock,
        }
    }
}

impl<T: Payload> Serialize for Resolved<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(T::KEY, &self.value)?;
        map.serialize_entry("source", &self.source)?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

/// Why the live path was abandoned.
#[derive(Debug)]
enum LiveFailure {
    Disabled,
    Timeout(Duration),
    Transport(TransportError),
    Decode(String),
}

/// Resolves resources from the live API with mock fallback. Cheap to clone;
/// clones share the transport and the store.
#[derive(Clone)]
pub struct DataSource {
    transport: Option<Arc<dyn Transport>>,
    store: Arc<MockStore>,
    timeouts: TimeoutConfig,
    not_found: NotFoundPolicy,
}

impl DataSource {
    /// Build from config: an HTTP transport when `api.base_url` is set,
    /// mock-only otherwise.
    pub fn from_config(store: Arc<MockStore>, config: &AppConfig) -> Self {
        let transport = config
            .api
            .base_url
            .as_ref()
            .map(|url| Arc::new(HttpTransport::new(url.clone())) as Arc<dyn Transport>);
        Self::with_transport(store, transport, config)
    }

    pub fn with_transport(
        store: Arc<MockStore>,
        transport: Option<Arc<dyn Transport>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            transport,
            store,
            timeouts: config.timeouts.clone(),
            not_found: config.fallback.not_found,
        }
    }

    pub fn store(&self) -> &MockStore {
        &self.store
    }

    pub fn is_live(&self) -> bool {
        self.transport.is_some()
    }

    /// Run the live request for `kind` under its timeout and decode the body.
    async fn live<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, LiveFailure> {
        let Some(transport) = &self.transport else {
            return Err(LiveFailure::Disabled);
        };
        let limit = self.timeouts.for_resource(kind);
        debug!(resource = kind.name(), path, timeout_ms = limit.as_millis() as u64, "requesting");

        let body = tokio::time::timeout(limit, transport.get_json(path, query))
            .await
            .map_err(|_| LiveFailure::Timeout(limit))?
            .map_err(LiveFailure::Transport)?;
        serde_json::from_value(body).map_err(|e| LiveFailure::Decode(e.to_string()))
    }

    /// Shared resolution: live first, then `fallback` over the mock store.
    async fn resolve<T, F>(
        &self,
        kind: ResourceKind,
        path: &str,
        query: &[(&str, String)],
        fallback: F,
    ) -> Resolved<T>
    where
        T: Payload + DeserializeOwned,
        F: FnOnce(&MockStore) -> T,
    {
        match self.live::<T>(kind, path, query).await {
            Ok(mut value) => {
                value.rescale();
                info!(resource = kind.name(), source = %Source::Api, "resolved");
                return Resolved::api(value);
            }
            Err(LiveFailure::Disabled) => {
                debug!(resource = kind.name(), "no API configured");
            }
            Err(LiveFailure::Transport(e))
                if e.is_not_found()
                    && kind.is_profile()
                    && self.not_found == NotFoundPolicy::Authoritative =>
            {
                info!(resource = kind.name(), path, "API reports not found");
                return Resolved::api(T::empty());
            }
            Err(LiveFailure::Timeout(limit)) => {
                warn!(resource = kind.name(), path, "timed out after {:?}, using mock data", limit);
            }
            Err(LiveFailure::Transport(e)) => {
                warn!(resource = kind.name(), path, "{e}, using mock data");
            }
            Err(LiveFailure::Decode(e)) => {
                warn!(resource = kind.name(), path, "undecodable payload ({e}), using mock data");
            }
        }

        let value = fallback(&self.store);
        info!(resource = kind.name(), source = %Source::Mock, "resolved");
        Resolved::mock(value)
    }

    // -- players ------------------------------------------------------------

    pub async fn fetch_players(&self, season: &Season, filter: &PlayerFilter) -> Resolved<Vec<PlayerRow>> {
        let mut query = vec![("season", season.to_string())];
        query.extend(filter.query_pairs());
        let mut resolved = self
            .resolve(ResourceKind::Players, "/players", &query, |store| {
                player_leaderboard(store, season.as_str(), filter)
            })
            .await;
        for row in resolved.value.iter_mut().filter(|r| r.season.is_empty()) {
            row.season = season.to_string();
        }
        resolved
    }

    pub async fn fetch_player_profile(&self, player_id: &str) -> Resolved<Option<PlayerProfile>> {
        let path = format!("/players/{}", path_segment(player_id));
        self.resolve(ResourceKind::PlayerProfile, &path, &[], |store| {
            normalize_player_profile(store.player(player_id), store)
        })
        .await
    }

    pub async fn fetch_player_games(&self, player_id: &str, season: &Season) -> Resolved<Vec<PlayerGame>> {
        let path = format!("/players/{}/games", path_segment(player_id));
        let query = [("season", season.to_string())];
        self.resolve(ResourceKind::PlayerGames, &path, &query, |store| {
            synthesize_player_games(store, player_id, season)
        })
        .await
    }

    // -- teams --------------------------------------------------------------

    pub async fn fetch_teams(&self, season: &Season, conference: Option<&str>) -> Resolved<Vec<TeamRow>> {
        let mut query = vec![("season", season.to_string())];
        if let Some(conf) = conference {
            query.push(("conference", conf.to_string()));
        }
        let mut resolved = self
            .resolve(ResourceKind::Teams, "/teams", &query, |store| {
                team_leaderboard(store, season.as_str(), conference)
            })
            .await;
        for row in resolved.value.iter_mut().filter(|r| r.season.is_empty()) {
            row.season = season.to_string();
        }
        resolved
    }

    pub async fn fetch_team_profile(&self, team_id: &str) -> Resolved<Option<TeamProfile>> {
        let path = format!("/teams/{}", path_segment(team_id));
        self.resolve(ResourceKind::TeamProfile, &path, &[], |store| {
            normalize_team_profile(store.team(team_id), store)
        })
        .await
    }

    pub async fn fetch_team_roster(&self, team_id: &str, season: &Season) -> Resolved<Vec<RosterEntry>> {
        let path = format!("/teams/{}/roster", path_segment(team_id));
        let query = [("season", season.to_string())];
        self.resolve(ResourceKind::TeamRoster, &path, &query, |store| {
            team_roster(store, team_id, season.as_str())
        })
        .await
    }

    pub async fn fetch_team_games(&self, team_id: &str, season: &Season) -> Resolved<Vec<TeamGame>> {
        let path = format!("/teams/{}/games", path_segment(team_id));
        let query = [("season", season.to_string())];
        self.resolve(ResourceKind::TeamGames, &path, &query, |store| {
            synthesize_team_games(store, team_id, season)
        })
        .await
    }
}

/// Percent-encode an id for use as one URL path segment.
fn path_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_uses_resource_key() {
        let players: Resolved<Option<PlayerProfile>> = Resolved::mock(None);
        assert_eq!(
            serde_json::to_value(&players).unwrap(),
            json!({"player": null, "source": "mock"})
        );
        let roster: Resolved<Vec<RosterEntry>> = Resolved::api(Vec::new());
        assert_eq!(
            serde_json::to_value(&roster).unwrap(),
            json!({"roster": [], "source": "api"})
        );
    }

    #[test]
    fn path_segments_are_escaped() {
        assert_eq!(path_segment("caleb-ellis"), "caleb-ellis");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn every_resource_has_a_timeout() {
        let timeouts = TimeoutConfig::default();
        for kind in ResourceKind::ALL {
            assert!(timeouts.for_resource(kind) > Duration::ZERO, "{}", kind.name());
        }
        assert!(ResourceKind::TeamProfile.is_profile());
        assert!(!ResourceKind::TeamRoster.is_profile());
    }

    #[tokio::test]
    async fn mock_only_source_tags_mock() {
        let store = Arc::new(MockStore::bundled().unwrap());
        let source = DataSource::with_transport(store, None, &AppConfig::default());
        assert!(!source.is_live());

        let season = Season::parse("2023-24").unwrap();
        let players = source.fetch_players(&season, &PlayerFilter::default()).await;
        assert_eq!(players.source, Source::Mock);
        assert!(!players.value.is_empty());

        let missing = source.fetch_player_profile("nobody-1234").await;
        assert_eq!(missing, Resolved::mock(None));
    }
}
