// Page loaders and request-generation tracking.
//
// A page issues all of its fetches at once; each resource resolves and is
// tagged independently, so a slow roster never holds up the profile. When
// the user moves on before a load finishes, the late result must not land
// in the view: every load takes a ticket from the view's `RequestGeneration`
// and only the newest ticket may commit.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use courtvision_core::model::{PlayerGame, PlayerProfile, RosterEntry, TeamGame, TeamProfile};
use courtvision_core::Season;

use crate::fetch::{DataSource, Resolved};

// ---------------------------------------------------------------------------
// Request generations
// ---------------------------------------------------------------------------

/// Identifies one load request for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Hands out monotonically increasing tickets. Issuing a ticket supersedes
/// every ticket issued before it.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    current: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_ticket(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}

/// The committed state of one page view.
#[derive(Debug, Default)]
pub struct PageView<T> {
    generation: RequestGeneration,
    current: Option<T>,
}

impl<T> PageView<T> {
    pub fn new() -> Self {
        Self {
            generation: RequestGeneration::new(),
            current: None,
        }
    }

    /// Start a load, superseding any load still in flight.
    pub fn begin(&self) -> Ticket {
        self.generation.next_ticket()
    }

    /// Store `page` if `ticket` is still the newest. Returns whether it was
    /// stored; stale results are dropped.
    pub fn commit(&mut self, ticket: Ticket, page: T) -> bool {
        if !self.generation.is_current(ticket) {
            debug!(ticket = ticket.0, "discarding stale page result");
            return false;
        }
        self.current = Some(page);
        true
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPage {
    pub player: Resolved<Option<PlayerProfile>>,
    pub games: Resolved<Vec<PlayerGame>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPage {
    pub team: Resolved<Option<TeamProfile>>,
    pub roster: Resolved<Vec<RosterEntry>>,
    pub games: Resolved<Vec<TeamGame>>,
}

/// Fetch a player's profile and game log concurrently.
pub async fn load_player_page(source: &DataSource, player_id: &str, season: &Season) -> PlayerPage {
    let (player, games) = tokio::join!(
        source.fetch_player_profile(player_id),
        source.fetch_player_games(player_id, season),
    );
    PlayerPage { player, games }
}

/// Fetch a team's profile, roster and game log concurrently.
pub async fn load_team_page(source: &DataSource, team_id: &str, season: &Season) -> TeamPage {
    let (team, roster, games) = tokio::join!(
        source.fetch_team_profile(team_id),
        source.fetch_team_roster(team_id, season),
        source.fetch_team_games(team_id, season),
    );
    TeamPage { team, roster, games }
}
