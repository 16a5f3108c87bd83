// Season leaderboards and team rosters built from the mock store.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{PlayerRow, RosterEntry, TeamRow};
use crate::normalize::{normalize_player_row, normalize_roster_entry, normalize_team_row};
use crate::store::MockStore;

/// Optional filters for the player leaderboard. Empty means "everyone".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFilter {
    pub conference: Option<String>,
    /// Position prefix, so "G" matches both "G" and "G/F".
    pub position: Option<String>,
    pub min_mpg: Option<f64>,
}

impl PlayerFilter {
    pub fn matches(&self, row: &PlayerRow) -> bool {
        if let Some(conf) = &self.conference {
            if !row
                .conference
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(conf.trim()))
            {
                return false;
            }
        }
        if let Some(pos) = &self.position {
            let want = pos.trim().to_ascii_uppercase();
            if !row
                .position
                .as_deref()
                .is_some_and(|p| p.to_ascii_uppercase().starts_with(&want))
            {
                return false;
            }
        }
        if let Some(min) = self.min_mpg {
            if !row.stats.mpg.is_some_and(|m| m >= min) {
                return false;
            }
        }
        true
    }

    /// The same filters as HTTP query parameters.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(conf) = &self.conference {
            pairs.push(("conference", conf.clone()));
        }
        if let Some(pos) = &self.position {
            pairs.push(("position", pos.clone()));
        }
        if let Some(min) = self.min_mpg {
            pairs.push(("min_mpg", min.to_string()));
        }
        pairs
    }
}

/// Descending with missing values sorted after every present one.
fn desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Player leaderboard for a season, best `bpm` first.
pub fn player_leaderboard(store: &MockStore, season: &str, filter: &PlayerFilter) -> Vec<PlayerRow> {
    let mut rows: Vec<PlayerRow> = store
        .players()
        .iter()
        .filter_map(|p| normalize_player_row(p, season))
        .filter(|row| filter.matches(row))
        .collect();
    rows.sort_by(|a, b| desc_nulls_last(a.stats.bpm, b.stats.bpm));
    rows
}

/// Team leaderboard for a season, best `barthag` first.
pub fn team_leaderboard(store: &MockStore, season: &str, conference: Option<&str>) -> Vec<TeamRow> {
    let mut rows: Vec<TeamRow> = store
        .teams()
        .iter()
        .filter_map(|t| normalize_team_row(t, season))
        .filter(|row| match conference {
            Some(conf) => row
                .conference
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(conf.trim())),
            None => true,
        })
        .collect();
    rows.sort_by(|a, b| desc_nulls_last(a.stats.barthag, b.stats.barthag));
    rows
}

/// A team's players for a season, heaviest minutes first. Empty when the
/// team is unknown or has no record for that season.
pub fn team_roster(store: &MockStore, team_id: &str, season: &str) -> Vec<RosterEntry> {
    let Some(team) = store.team(team_id) else {
        return Vec::new();
    };
    if team.season(season).is_none() {
        return Vec::new();
    }
    let Some(team_name) = team.name() else {
        return Vec::new();
    };

    let mut roster: Vec<RosterEntry> = store
        .players()
        .iter()
        .filter(|p| {
            p.team_name()
                .is_some_and(|t| t.eq_ignore_ascii_case(&team_name))
        })
        .filter_map(|p| normalize_roster_entry(p, season))
        .collect();
    roster.sort_by(|a, b| desc_nulls_last(a.mpg, b.mpg));
    roster
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_orders_by_bpm_with_nulls_last() {
        let store = MockStore::bundled().unwrap();
        let rows = player_leaderboard(&store, "2023-24", &PlayerFilter::default());
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.season == "2023-24"));
        let bpms: Vec<Option<f64>> = rows.iter().map(|r| r.stats.bpm).collect();
        for pair in bpms.windows(2) {
            assert_ne!(desc_nulls_last(pair[0], pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn nulls_sort_after_values() {
        let mut v = vec![None, Some(1.0), Some(3.0), None, Some(2.0)];
        v.sort_by(|a, b| desc_nulls_last(*a, *b));
        assert_eq!(v, vec![Some(3.0), Some(2.0), Some(1.0), None, None]);
    }

    #[test]
    fn conference_filter_is_case_insensitive() {
        let store = MockStore::bundled().unwrap();
        let filter = PlayerFilter {
            conference: Some("sec".into()),
            ..Default::default()
        };
        let rows = player_leaderboard(&store, "2024-25", &filter);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.conference.as_deref() == Some("SEC")));
    }

    #[test]
    fn position_prefix_and_minutes_filters() {
        let store = MockStore::bundled().unwrap();
        let filter = PlayerFilter {
            position: Some("g".into()),
            min_mpg: Some(25.0),
            ..Default::default()
        };
        let rows = player_leaderboard(&store, "2024-25", &filter);
        assert!(!rows.is_empty());
        for r in &rows {
            assert!(r.position.as_deref().unwrap().starts_with('G'));
            assert!(r.stats.mpg.unwrap() >= 25.0);
        }
    }

    #[test]
    fn filter_query_pairs() {
        let filter = PlayerFilter {
            conference: Some("B12".into()),
            position: None,
            min_mpg: Some(20.5),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![("conference", "B12".to_string()), ("min_mpg", "20.5".to_string())]
        );
    }

    #[test]
    fn team_leaderboard_orders_by_barthag() {
        let store = MockStore::bundled().unwrap();
        let rows = team_leaderboard(&store, "2022-23", None);
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[0].team_id, "houston");
        let b12 = team_leaderboard(&store, "2024-25", Some("b12"));
        assert_eq!(b12.len(), 3);
    }

    #[test]
    fn roster_is_minutes_ordered_subset() {
        let store = MockStore::bundled().unwrap();
        let roster = team_roster(&store, "auburn", "2023-24");
        assert_eq!(roster.len(), 3);
        assert!(roster.iter().any(|p| p.player_id == "caleb-ellis"));
        for pair in roster.windows(2) {
            assert!(pair[0].mpg >= pair[1].mpg);
        }
    }

    #[test]
    fn roster_without_team_season_is_empty() {
        let store = MockStore::bundled().unwrap();
        assert!(team_roster(&store, "iowa-st", "2022-23").is_empty());
        assert!(team_roster(&store, "nobody", "2023-24").is_empty());
    }
}
