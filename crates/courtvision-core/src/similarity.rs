// Player similarity: Euclidean distance over z-scored season stats.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::PlayerSeasonStats;
use crate::normalize::{self, normalize_player_stats, PLAYER_IDENTITY_FIELDS};
use crate::store::MockStore;

/// Stats compared when scoring similarity.
pub const SIMILARITY_STATS: &[&str] = &[
    "pts", "reb", "ast", "stl", "blk", "ts_pct", "usg_pct", "bpm", "ortg", "drtg",
];

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation for one stat across a season's players.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Population mean and standard deviation (N denominator). An empty slice
/// yields zeros.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Returns 0.0 when the pool has no spread.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPlayer {
    pub player_id: String,
    pub name: Option<String>,
    pub team: Option<String>,
    pub season: String,
    /// `100 / (1 + distance)`, one decimal.
    pub similarity: f64,
    pub distance: f64,
}

fn zscores(stats: &PlayerSeasonStats, pools: &BTreeMap<&str, PoolStats>) -> Vec<Option<f64>> {
    SIMILARITY_STATS
        .iter()
        .map(|stat| {
            let value = stats.stat(stat)?;
            Some(compute_zscore(value, pools.get(stat)?))
        })
        .collect()
}

/// Distance over the stats both players have. `None` when they share none.
fn distance(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let mut shared = 0;
    let mut sum = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        if let (Some(x), Some(y)) = (x, y) {
            shared += 1;
            sum += (x - y).powi(2);
        }
    }
    (shared > 0).then(|| sum.sqrt())
}

/// The `k` players closest to `player_id` in `season`, most similar first.
/// Empty when the player has no record for that season.
pub fn similar_players(store: &MockStore, player_id: &str, season: &str, k: usize) -> Vec<SimilarPlayer> {
    let Some(target_raw) = store.player(player_id).and_then(|p| p.season(season)) else {
        return Vec::new();
    };

    let population: Vec<(String, Option<String>, Option<String>, PlayerSeasonStats)> = store
        .players_in_season(season)
        .filter_map(|(p, raw)| {
            let id = p.id()?;
            let name = normalize::text(&p.identity, PLAYER_IDENTITY_FIELDS, "name");
            Some((id, name, p.team_name(), normalize_player_stats(raw)))
        })
        .collect();

    let pools: BTreeMap<&str, PoolStats> = SIMILARITY_STATS
        .iter()
        .map(|stat| {
            let values: Vec<f64> = population.iter().filter_map(|(.., s)| s.stat(stat)).collect();
            (*stat, compute_pool_stats(&values))
        })
        .collect();

    let target = zscores(&normalize_player_stats(target_raw), &pools);

    let mut scored: Vec<SimilarPlayer> = population
        .iter()
        .filter(|(id, ..)| id != player_id)
        .filter_map(|(id, name, team, stats)| {
            let d = distance(&target, &zscores(stats, &pools))?;
            Some(SimilarPlayer {
                player_id: id.clone(),
                name: name.clone(),
                team: team.clone(),
                season: season.to_string(),
                similarity: (1000.0 / (1.0 + d)).round() / 10.0,
                distance: d,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    scored.truncate(k);
    scored
}
