// Synthetic game logs for mock-backed seasons.
//
// The mock dataset only carries season aggregates, so individual games are
// derived from them. Every perturbation comes from a sinusoidal hash of the
// game index salted by the entity id and season, so a given (id, season)
// always yields the same log, across calls and across processes.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::model::{GameResult, Location, PlayerGame, TeamGame};
use crate::normalize::{normalize_player_stats, normalize_team_stats};
use crate::season::Season;
use crate::store::MockStore;

/// Upper bound on synthesized games per season.
pub const MAX_SYNTHETIC_GAMES: usize = 20;

/// Days between consecutive synthetic games.
const GAME_SPACING_DAYS: i64 = 4;

const DEFAULT_PACE: f64 = 68.0;
const DEFAULT_TEAM_ORTG: f64 = 105.0;
const MIN_TEAM_POINTS: u32 = 50;
const MAX_MARGIN: u32 = 18;

// ---------------------------------------------------------------------------
// Deterministic noise
// ---------------------------------------------------------------------------

/// Pseudo-random value in `[0, 1)` for a game index. Not an RNG: the same
/// inputs always produce the same output.
pub fn jitter(index: usize, salt: f64) -> f64 {
    let x = ((index as f64 + 1.0) * 12.9898 + salt * 78.233).sin() * 43758.5453;
    x - x.floor()
}

/// Stable salt for an entity-season key. Only uses the key's bytes, so it
/// does not depend on the process's hasher seed.
fn salt_for(key: &str) -> f64 {
    let h = key
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    f64::from(h % 10_000) / 100.0
}

/// `avg` moved by up to `spread` (as a fraction) in either direction.
fn perturb(avg: f64, index: usize, salt: f64, spread: f64) -> f64 {
    avg * (1.0 + spread * (2.0 * jitter(index, salt) - 1.0))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn whole(x: f64) -> u32 {
    x.round().max(0.0) as u32
}

// ---------------------------------------------------------------------------
// Results and schedule
// ---------------------------------------------------------------------------

/// Wins among `n` sampled games at the season's win rate.
pub fn scaled_wins(n: usize, wins: u32, losses: u32) -> usize {
    let total = wins + losses;
    if total == 0 {
        return n / 2;
    }
    let scaled = (n as f64 * f64::from(wins) / f64::from(total)).round() as usize;
    scaled.min(n)
}

/// Spread exactly `wins` W results evenly over `n` games.
pub fn distribute_results(n: usize, wins: usize) -> Vec<GameResult> {
    let wins = wins.min(n);
    (0..n)
        .map(|i| {
            if (i + 1) * wins / n > i * wins / n {
                GameResult::W
            } else {
                GameResult::L
            }
        })
        .collect()
}

/// First Wednesday of November in the season's start year.
pub fn season_opener(season: &Season) -> Option<NaiveDate> {
    let nov1 = NaiveDate::from_ymd_opt(season.start_year() as i32, 11, 1)?;
    let offset = (7 + Weekday::Wed.num_days_from_monday()
        - nov1.weekday().num_days_from_monday())
        % 7;
    Some(nov1 + Duration::days(i64::from(offset)))
}

fn game_dates(season: &Season, n: usize) -> Vec<String> {
    let Some(opener) = season_opener(season) else {
        return vec![String::new(); n];
    };
    (0..n)
        .map(|i| {
            (opener + Duration::days(GAME_SPACING_DAYS * i as i64))
                .format("%Y-%m-%d")
                .to_string()
        })
        .collect()
}

fn location(index: usize, salt: f64) -> Location {
    match jitter(index, salt + 3.0) {
        j if j < 0.45 => Location::H,
        j if j < 0.85 => Location::A,
        _ => Location::N,
    }
}

/// Opponent (name, conference) pairs: every other team, ordered by id.
fn opponent_pool(store: &MockStore, exclude_team_id: Option<&str>) -> Vec<(String, Option<String>)> {
    let mut teams: Vec<_> = store
        .teams()
        .iter()
        .filter(|t| t.id().as_deref() != exclude_team_id)
        .filter_map(|t| Some((t.id()?, t.name()?, t.conference())))
        .collect();
    teams.sort_by(|a, b| a.0.cmp(&b.0));
    teams.into_iter().map(|(_, name, conf)| (name, conf)).collect()
}

fn pick_opponent(
    pool: &[(String, Option<String>)],
    index: usize,
    salt: f64,
) -> (String, Option<String>) {
    if pool.is_empty() {
        return ("TBD".to_string(), None);
    }
    let offset = salt as usize;
    pool[(index + offset) % pool.len()].clone()
}

// ---------------------------------------------------------------------------
// Player logs
// ---------------------------------------------------------------------------

/// Synthesize a player's games for a season, newest first. Empty when the
/// player or the season record is missing.
pub fn synthesize_player_games(store: &MockStore, player_id: &str, season: &Season) -> Vec<PlayerGame> {
    let Some(player) = store.player(player_id) else {
        return Vec::new();
    };
    let Some(raw) = player.season(season.as_str()) else {
        return Vec::new();
    };
    let stats = normalize_player_stats(raw);
    let n = stats
        .games
        .map_or(MAX_SYNTHETIC_GAMES, |g| (g as usize).min(MAX_SYNTHETIC_GAMES));

    let team = player.team_name().and_then(|name| store.team_by_name(&name));
    let team_record = team
        .and_then(|t| t.season(season.as_str()))
        .map(normalize_team_stats);
    let wins = match team_record.as_ref().and_then(|r| Some((r.wins?, r.losses?))) {
        Some((w, l)) => scaled_wins(n, w, l),
        None => n / 2,
    };

    let salt = salt_for(&format!("{player_id}:{season}"));
    let results = distribute_results(n, wins);
    let dates = game_dates(season, n);
    let own_team_id = team.and_then(|t| t.id());
    let pool = opponent_pool(store, own_team_id.as_deref());

    let mut games: Vec<PlayerGame> = (0..n)
        .map(|i| {
            let count = |avg: Option<f64>, spread: f64, s: f64| {
                avg.map(|a| whole(perturb(a, i, salt + s, spread)))
            };
            let rating = |avg: Option<f64>, spread: f64, s: f64| {
                avg.map(|a| round1(perturb(a, i, salt + s, spread)))
            };

            let pts = count(stats.pts, 0.35, 0.0);
            let fg = pts.zip(stats.fg_pct).map(|(p, pct)| {
                let attempts = whole(f64::from(p) * 0.8).max(u32::from(p > 0));
                let made = whole(f64::from(attempts) * perturb(pct, i, salt + 9.0, 0.15) / 100.0)
                    .min(attempts);
                format!("{made}-{attempts}")
            });
            let (opponent, _) = pick_opponent(&pool, i, salt);

            PlayerGame {
                date: Some(dates[i].clone()),
                opponent: Some(opponent),
                result: Some(results[i]),
                location: Some(location(i, salt)),
                min: count(stats.mpg, 0.15, 1.0),
                pts,
                reb: count(stats.reb, 0.5, 2.0),
                ast: count(stats.ast, 0.5, 3.0),
                stl: count(stats.stl, 0.6, 4.0),
                blk: count(stats.blk, 0.6, 5.0),
                tov: count(stats.tov, 0.5, 6.0),
                fg,
                ortg: rating(stats.ortg, 0.2, 7.0),
                usg: rating(stats.usg_pct, 0.15, 8.0),
                efg: rating(stats.efg_pct, 0.15, 10.0),
                ts: rating(stats.ts_pct, 0.15, 11.0),
                bpm_game: stats
                    .bpm
                    .map(|b| round1(b + 8.0 * (2.0 * jitter(i, salt + 12.0) - 1.0))),
            }
        })
        .collect();
    games.reverse();

    debug!(player_id, season = %season, games = games.len(), "synthesized player games");
    games
}

// ---------------------------------------------------------------------------
// Team logs
// ---------------------------------------------------------------------------

/// Synthesize a team's games for a season, oldest first. Empty when the team
/// or the season record is missing.
pub fn synthesize_team_games(store: &MockStore, team_id: &str, season: &Season) -> Vec<TeamGame> {
    let Some(team) = store.team(team_id) else {
        return Vec::new();
    };
    let Some(raw) = team.season(season.as_str()) else {
        return Vec::new();
    };
    let stats = normalize_team_stats(raw);

    let (n, wins) = match (stats.wins, stats.losses) {
        (Some(w), Some(l)) => {
            let n = ((w + l) as usize).min(MAX_SYNTHETIC_GAMES);
            (n, scaled_wins(n, w, l))
        }
        _ => (MAX_SYNTHETIC_GAMES, MAX_SYNTHETIC_GAMES / 2),
    };

    let salt = salt_for(&format!("{team_id}:{season}"));
    let results = distribute_results(n, wins);
    let dates = game_dates(season, n);
    let pool = opponent_pool(store, Some(team_id));
    let pace = stats.pace.unwrap_or(DEFAULT_PACE);
    let ortg = stats.ortg.unwrap_or(DEFAULT_TEAM_ORTG);

    let games: Vec<TeamGame> = (0..n)
        .map(|i| {
            let result = results[i];
            let pos = round1(perturb(pace, i, salt + 1.0, 0.06)).max(1.0);
            let pts = whole(pos * perturb(ortg, i, salt + 2.0, 0.08) / 100.0).max(MIN_TEAM_POINTS);
            let gap = 1 + ((jitter(i, salt + 4.0) * MAX_MARGIN as f64) as u32).min(MAX_MARGIN - 1);
            let opp_pts = match result {
                GameResult::W => pts - gap,
                GameResult::L => pts + gap,
            };
            let margin = pts as i32 - opp_pts as i32;

            // Ratings in whole tenths so that net is exactly ortg - drtg.
            let ortg_tenths = (f64::from(pts) * 1000.0 / pos).round() as i64;
            let drtg_tenths = (f64::from(opp_pts) * 1000.0 / pos).round() as i64;
            let net_tenths = ortg_tenths - drtg_tenths;

            let (opponent, opp_conf) = pick_opponent(&pool, i, salt);

            TeamGame {
                date: Some(dates[i].clone()),
                game_type: Some("reg".to_string()),
                location: Some(location(i, salt)),
                result: Some(result),
                opponent: Some(opponent),
                opp_conf,
                pts: Some(pts),
                opp_pts: Some(opp_pts),
                score: Some(format!("{pts}-{opp_pts}")),
                margin: Some(margin),
                pos: Some(pos),
                game_ortg: Some(ortg_tenths as f64 / 10.0),
                game_drtg: Some(drtg_tenths as f64 / 10.0),
                game_net: Some(net_tenths as f64 / 10.0),
            }
        })
        .collect();

    debug!(team_id, season = %season, games = games.len(), "synthesized team games");
    games
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn season(s: &str) -> Season {
        Season::parse(s).unwrap()
    }

    fn wins_in<T>(games: &[T], result: impl Fn(&T) -> Option<GameResult>) -> usize {
        games.iter().filter(|g| result(g) == Some(GameResult::W)).count()
    }

    #[test]
    fn jitter_is_deterministic_and_bounded() {
        for i in 0..100 {
            let a = jitter(i, 17.5);
            assert_eq!(a, jitter(i, 17.5));
            assert!((0.0..1.0).contains(&a));
        }
        assert_ne!(jitter(0, 1.0), jitter(1, 1.0));
    }

    #[test]
    fn distribution_has_exact_win_count() {
        for n in 0..=20 {
            for wins in 0..=n {
                let results = distribute_results(n, wins);
                assert_eq!(results.len(), n);
                assert_eq!(wins_in(&results, |r| Some(*r)), wins);
            }
        }
    }

    #[test]
    fn scaled_wins_tracks_season_rate() {
        assert_eq!(scaled_wins(20, 31, 3), 18);
        assert_eq!(scaled_wins(20, 0, 30), 0);
        assert_eq!(scaled_wins(20, 30, 0), 20);
        assert_eq!(scaled_wins(10, 0, 0), 5);
    }

    #[test]
    fn opener_is_first_wednesday_of_november() {
        // 2023-11-01 was a Wednesday; 2024-11-01 a Friday.
        assert_eq!(
            season_opener(&season("2023-24")),
            NaiveDate::from_ymd_opt(2023, 11, 1)
        );
        assert_eq!(
            season_opener(&season("2024-25")),
            NaiveDate::from_ymd_opt(2024, 11, 6)
        );
    }

    #[test]
    fn thirty_nine_game_season_yields_twenty_entries() {
        let store = MockStore::bundled().unwrap();
        let games = synthesize_player_games(&store, "caleb-ellis", &season("2023-24"));
        assert_eq!(games.len(), 20);
    }

    #[test]
    fn player_log_is_byte_identical_across_calls() {
        let store = MockStore::bundled().unwrap();
        let s = season("2023-24");
        let a = serde_json::to_string(&synthesize_player_games(&store, "caleb-ellis", &s)).unwrap();
        let b = serde_json::to_string(&synthesize_player_games(&store, "caleb-ellis", &s)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn player_results_follow_team_record() {
        let store = MockStore::bundled().unwrap();
        // Auburn went 32-2 in 2023-24: round(20 * 32 / 34) = 19.
        let games = synthesize_player_games(&store, "caleb-ellis", &season("2023-24"));
        assert_eq!(wins_in(&games, |g| g.result), 19);
    }

    #[test]
    fn player_log_is_newest_first() {
        let store = MockStore::bundled().unwrap();
        let games = synthesize_player_games(&store, "caleb-ellis", &season("2023-24"));
        assert_eq!(games.last().unwrap().date.as_deref(), Some("2023-11-01"));
        assert!(games.windows(2).all(|w| w[0].date > w[1].date));
    }

    #[test]
    fn null_season_values_stay_null_per_game() {
        let store = MockStore::bundled().unwrap();
        let games = synthesize_player_games(&store, "andre-holloway", &season("2024-25"));
        assert!(!games.is_empty());
        assert!(games.iter().all(|g| g.pts.is_some()));
    }

    #[test]
    fn missing_player_or_season_is_empty() {
        let store = MockStore::bundled().unwrap();
        assert!(synthesize_player_games(&store, "nobody-1234", &season("2023-24")).is_empty());
        assert!(synthesize_player_games(&store, "caleb-ellis", &season("2019-20")).is_empty());
        assert!(synthesize_team_games(&store, "iowa-st", &season("2022-23")).is_empty());
    }

    #[test]
    fn team_log_is_consistent_with_record() {
        let store = MockStore::bundled().unwrap();
        let games = synthesize_team_games(&store, "houston", &season("2023-24"));
        assert_eq!(games.len(), 20);
        // Houston went 31-3: round(20 * 31 / 34) = 18.
        assert_eq!(wins_in(&games, |g| g.result), 18);

        for g in &games {
            let (pts, opp_pts, margin) = (g.pts.unwrap(), g.opp_pts.unwrap(), g.margin.unwrap());
            assert!(pts >= MIN_TEAM_POINTS);
            match g.result.unwrap() {
                GameResult::W => assert!(margin > 0),
                GameResult::L => assert!(margin < 0),
            }
            assert!(margin.unsigned_abs() <= MAX_MARGIN);
            assert_eq!(margin, pts as i32 - opp_pts as i32);
            assert_eq!(g.score.as_deref(), Some(format!("{pts}-{opp_pts}").as_str()));
            let (o, d, net) = (
                g.game_ortg.unwrap(),
                g.game_drtg.unwrap(),
                g.game_net.unwrap(),
            );
            assert!((o - d - net).abs() < 1e-9);
            assert_ne!(g.opponent.as_deref(), Some("Houston"));
        }
    }

    #[test]
    fn team_log_is_deterministic() {
        let store = MockStore::bundled().unwrap();
        let s = season("2024-25");
        let a = serde_json::to_string(&synthesize_team_games(&store, "purdue", &s)).unwrap();
        let b = serde_json::to_string(&synthesize_team_games(&store, "purdue", &s)).unwrap();
        assert_eq!(a, b);
    }
}
