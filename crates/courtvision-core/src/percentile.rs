// Percentile ranking among same-season peers.
//
// percentile = round(100 * count_strictly_below / population), inverted for
// lower-is-better stats so that a higher percentile always means "better".
// Ties are not averaged: a peer equal to the query value does not count as
// below it, so heavily tied populations undercount. An empty population (or
// an unknown stat, which yields one) returns the neutral 50.

use tracing::trace;

use crate::model::{Percentiles, PlayerSeasonStats, TeamSeasonStats};
use crate::normalize::{normalize_player_stats, normalize_team_stats};
use crate::store::MockStore;

/// Returned when there is nothing to compare against.
pub const NEUTRAL_PERCENTILE: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

/// Which kind of peer a value is ranked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cohort {
    Players,
    Teams,
}

/// Stats ranked on player profiles, with their direction.
pub const PLAYER_RANKED_STATS: &[(&str, Direction)] = &[
    ("bpm", Direction::HigherIsBetter),
    ("obpm", Direction::HigherIsBetter),
    ("dbpm", Direction::HigherIsBetter),
    ("pts", Direction::HigherIsBetter),
    ("reb", Direction::HigherIsBetter),
    ("ast", Direction::HigherIsBetter),
    ("stl", Direction::HigherIsBetter),
    ("blk", Direction::HigherIsBetter),
    ("ts_pct", Direction::HigherIsBetter),
    ("usg_pct", Direction::HigherIsBetter),
    ("efg_pct", Direction::HigherIsBetter),
    ("ortg", Direction::HigherIsBetter),
    ("fg_pct", Direction::HigherIsBetter),
    ("three_pct", Direction::HigherIsBetter),
    ("ft_pct", Direction::HigherIsBetter),
    ("porpag", Direction::HigherIsBetter),
    ("mpg", Direction::HigherIsBetter),
    ("ws40", Direction::HigherIsBetter),
    ("per", Direction::HigherIsBetter),
    ("drtg", Direction::LowerIsBetter),
    ("tov", Direction::LowerIsBetter),
];

/// Stats ranked on team profiles, with their direction.
pub const TEAM_RANKED_STATS: &[(&str, Direction)] = &[
    ("ortg", Direction::HigherIsBetter),
    ("net_rtg", Direction::HigherIsBetter),
    ("efg_pct", Direction::HigherIsBetter),
    ("opp_tov_pct", Direction::HigherIsBetter),
    ("orb_pct", Direction::HigherIsBetter),
    ("drb_pct", Direction::HigherIsBetter),
    ("barthag", Direction::HigherIsBetter),
    ("wab", Direction::HigherIsBetter),
    ("pace", Direction::HigherIsBetter),
    ("drtg", Direction::LowerIsBetter),
    ("opp_efg_pct", Direction::LowerIsBetter),
    ("tov_pct", Direction::LowerIsBetter),
    ("ftr", Direction::LowerIsBetter),
    ("opp_ftr", Direction::LowerIsBetter),
];

/// The declared direction of a stat, defaulting to higher-is-better.
pub fn direction_for(cohort: Cohort, stat: &str) -> Direction {
    let table = match cohort {
        Cohort::Players => PLAYER_RANKED_STATS,
        Cohort::Teams => TEAM_RANKED_STATS,
    };
    table
        .iter()
        .find(|(name, _)| *name == stat)
        .map(|(_, d)| *d)
        .unwrap_or_default()
}

/// Rank `value` against `peers`. Non-finite peers are ignored.
pub fn rank_percentile<I>(peers: I, value: f64, direction: Direction) -> u8
where
    I: IntoIterator<Item = f64>,
{
    if !value.is_finite() {
        return NEUTRAL_PERCENTILE;
    }
    let mut population = 0usize;
    let mut below = 0usize;
    for peer in peers.into_iter().filter(|v| v.is_finite()) {
        population += 1;
        if peer < value {
            below += 1;
        }
    }
    if population == 0 {
        return NEUTRAL_PERCENTILE;
    }
    let raw = (100.0 * below as f64 / population as f64).round() as u8;
    match direction {
        Direction::HigherIsBetter => raw,
        Direction::LowerIsBetter => 100 - raw,
    }
}

// ---------------------------------------------------------------------------
// Season populations
// ---------------------------------------------------------------------------

/// Normalized peer records for one (cohort, season). Building one is the
/// expensive step; reuse it for every stat ranked in the same pass.
#[derive(Debug, Clone)]
pub enum SeasonPopulation {
    Players(Vec<PlayerSeasonStats>),
    Teams(Vec<TeamSeasonStats>),
}

impl SeasonPopulation {
    pub fn build(store: &MockStore, cohort: Cohort, season: &str) -> Self {
        let population = match cohort {
            Cohort::Players => SeasonPopulation::Players(
                store
                    .players_in_season(season)
                    .map(|(_, raw)| normalize_player_stats(raw))
                    .collect(),
            ),
            Cohort::Teams => SeasonPopulation::Teams(
                store
                    .teams_in_season(season)
                    .map(|(_, raw)| normalize_team_stats(raw))
                    .collect(),
            ),
        };
        trace!(season, size = population.len(), "built season population");
        population
    }

    pub fn len(&self) -> usize {
        match self {
            SeasonPopulation::Players(v) => v.len(),
            SeasonPopulation::Teams(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-null values of `stat` across the population.
    pub fn values(&self, stat: &str) -> Vec<f64> {
        match self {
            SeasonPopulation::Players(v) => v.iter().filter_map(|s| s.stat(stat)).collect(),
            SeasonPopulation::Teams(v) => v.iter().filter_map(|s| s.stat(stat)).collect(),
        }
    }

    /// Percentile of `value` for `stat`. `direction` defaults to
    /// higher-is-better when omitted.
    pub fn percentile(&self, stat: &str, value: f64, direction: Option<Direction>) -> u8 {
        rank_percentile(self.values(stat), value, direction.unwrap_or_default())
    }

    pub fn player_percentiles(&self, stats: &PlayerSeasonStats) -> Percentiles {
        PLAYER_RANKED_STATS
            .iter()
            .map(|(stat, direction)| {
                let pct = stats
                    .stat(stat)
                    .map(|value| self.percentile(stat, value, Some(*direction)));
                (stat.to_string(), pct)
            })
            .collect()
    }

    pub fn team_percentiles(&self, stats: &TeamSeasonStats) -> Percentiles {
        TEAM_RANKED_STATS
            .iter()
            .map(|(stat, direction)| {
                let pct = stats
                    .stat(stat)
                    .map(|value| self.percentile(stat, value, Some(*direction)));
                (stat.to_string(), pct)
            })
            .collect()
    }
}

/// On-demand percentile lookups over an injected store.
#[derive(Debug, Clone, Copy)]
pub struct PercentileEngine<'a> {
    store: &'a MockStore,
}

impl<'a> PercentileEngine<'a> {
    pub fn new(store: &'a MockStore) -> Self {
        Self { store }
    }

    pub fn population(&self, cohort: Cohort, season: &str) -> SeasonPopulation {
        SeasonPopulation::build(self.store, cohort, season)
    }

    /// Rank one value; rebuilds the season population on every call.
    pub fn percentile(
        &self,
        cohort: Cohort,
        stat: &str,
        value: f64,
        season: &str,
        direction: Option<Direction>,
    ) -> u8 {
        self.population(cohort, season)
            .percentile(stat, value, direction)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RawPlayer, RawRecord, RawTeam};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn fixture_player(id: &str, season: &str, stats: Value) -> RawPlayer {
        let mut seasons = BTreeMap::new();
        seasons.insert(season.to_string(), record(stats));
        RawPlayer {
            seasons,
            identity: record(json!({ "id": id, "name": id })),
        }
    }

    fn fixture_team(id: &str, season: &str, stats: Value) -> RawTeam {
        let mut seasons = BTreeMap::new();
        seasons.insert(season.to_string(), record(stats));
        RawTeam {
            seasons,
            identity: record(json!({ "id": id, "name": id })),
        }
    }

    #[test]
    fn distinct_population_boundaries() {
        let peers = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];
        let n = peers.len() as f64;
        let expected_max = (100.0 * (n - 1.0) / n).round() as u8;
        assert_eq!(rank_percentile(peers, 70.0, Direction::HigherIsBetter), expected_max);
        assert_eq!(rank_percentile(peers, 10.0, Direction::HigherIsBetter), 0);
    }

    #[test]
    fn lower_is_better_inverts() {
        let peers = [95.0, 100.0, 105.0, 110.0];
        assert_eq!(rank_percentile(peers, 95.0, Direction::LowerIsBetter), 100);
        assert_eq!(rank_percentile(peers, 110.0, Direction::LowerIsBetter), 25);
    }

    #[test]
    fn empty_population_is_neutral() {
        assert_eq!(rank_percentile([], 12.0, Direction::HigherIsBetter), 50);
        assert_eq!(rank_percentile([], 12.0, Direction::LowerIsBetter), 50);
    }

    #[test]
    fn single_entry_population_is_zero() {
        assert_eq!(rank_percentile([7.0], 7.0, Direction::HigherIsBetter), 0);
    }

    #[test]
    fn ties_do_not_count_as_below() {
        // Three players tied at the top all get 40, not 100.
        let peers = [1.0, 2.0, 5.0, 5.0, 5.0];
        assert_eq!(rank_percentile(peers, 5.0, Direction::HigherIsBetter), 40);
    }

    #[test]
    fn non_finite_query_is_neutral() {
        assert_eq!(rank_percentile([1.0, 2.0], f64::NAN, Direction::HigherIsBetter), 50);
    }

    #[test]
    fn null_peers_are_excluded() {
        let store = MockStore::from_records(
            vec![
                fixture_player("a", "2023-24", json!({"ppg": 10.0})),
                fixture_player("b", "2023-24", json!({"ppg": null})),
                fixture_player("c", "2023-24", json!({"ppg": 20.0})),
                fixture_player("d", "2023-24", json!({})),
            ],
            vec![],
        );
        let engine = PercentileEngine::new(&store);
        // Population is {10, 20}: one below 20 -> 50.
        assert_eq!(
            engine.percentile(Cohort::Players, "pts", 20.0, "2023-24", None),
            50
        );
        assert_eq!(engine.population(Cohort::Players, "2023-24").values("pts").len(), 2);
    }

    #[test]
    fn unknown_stat_is_neutral() {
        let store = MockStore::bundled().unwrap();
        let engine = PercentileEngine::new(&store);
        assert_eq!(
            engine.percentile(Cohort::Players, "not_a_stat", 3.0, "2023-24", None),
            50
        );
    }

    #[test]
    fn season_without_peers_is_neutral() {
        let store = MockStore::bundled().unwrap();
        let engine = PercentileEngine::new(&store);
        assert_eq!(
            engine.percentile(Cohort::Teams, "ortg", 110.0, "1999-00", None),
            50
        );
    }

    #[test]
    fn population_is_scoped_to_season() {
        let store = MockStore::from_records(
            vec![
                fixture_player("a", "2022-23", json!({"ppg": 30.0})),
                fixture_player("b", "2023-24", json!({"ppg": 10.0})),
                fixture_player("c", "2023-24", json!({"ppg": 12.0})),
            ],
            vec![],
        );
        let engine = PercentileEngine::new(&store);
        assert_eq!(
            engine.percentile(Cohort::Players, "pts", 12.0, "2023-24", None),
            50
        );
    }

    #[test]
    fn lowest_team_drtg_is_hundredth_percentile() {
        let store = MockStore::bundled().unwrap();
        let engine = PercentileEngine::new(&store);
        let houston_drtg = normalize_team_stats(store.team("houston").unwrap().season("2023-24").unwrap())
            .drtg
            .unwrap();
        let pct = engine.percentile(
            Cohort::Teams,
            "drtg",
            houston_drtg,
            "2023-24",
            Some(Direction::LowerIsBetter),
        );
        assert_eq!(pct, 100);
    }

    #[test]
    fn percentiles_are_scale_consistent_across_naming_conventions() {
        // One team uses fractions under legacy names, the other API names.
        let store = MockStore::from_records(
            vec![],
            vec![
                fixture_team("a", "2023-24", json!({"efg_o": 0.50})),
                fixture_team("b", "2023-24", json!({"efg_pct": 55.0})),
            ],
        );
        let population = SeasonPopulation::build(&store, Cohort::Teams, "2023-24");
        assert_eq!(population.values("efg_pct"), vec![50.0, 55.0]);
        assert_eq!(population.percentile("efg_pct", 55.0, None), 50);
    }

    #[test]
    fn reused_population_matches_fresh_computation() {
        let store = MockStore::bundled().unwrap();
        let engine = PercentileEngine::new(&store);
        let population = engine.population(Cohort::Players, "2023-24");
        for (stat, direction) in PLAYER_RANKED_STATS {
            for value in [0.0, 5.0, 15.0, 55.0, 105.0] {
                assert_eq!(
                    population.percentile(stat, value, Some(*direction)),
                    engine.percentile(Cohort::Players, stat, value, "2023-24", Some(*direction)),
                );
            }
        }
    }

    #[test]
    fn profile_percentile_sets_cover_declared_stats() {
        let population = SeasonPopulation::Teams(vec![TeamSeasonStats::default()]);
        let pct = population.team_percentiles(&TeamSeasonStats {
            drtg: Some(90.0),
            ..Default::default()
        });
        assert_eq!(pct.len(), TEAM_RANKED_STATS.len());
        // Only peer has no drtg: empty population -> neutral.
        assert_eq!(pct["drtg"], Some(50));
        assert_eq!(pct["ortg"], None);
    }

    #[test]
    fn declared_directions() {
        assert_eq!(direction_for(Cohort::Players, "drtg"), Direction::LowerIsBetter);
        assert_eq!(direction_for(Cohort::Players, "pts"), Direction::HigherIsBetter);
        assert_eq!(direction_for(Cohort::Teams, "opp_efg_pct"), Direction::LowerIsBetter);
        assert_eq!(direction_for(Cohort::Teams, "unknown"), Direction::HigherIsBetter);
    }
}
