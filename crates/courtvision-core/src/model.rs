// API-schema data model.
//
// Every type here serializes with the live API's field names and 0-100
// percentage scale. Mock data is normalized into these same types, so a
// consumer never sees which source produced a value except through `Source`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Which origin served a resolved resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Api,
    Mock,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Api => f.write_str("api"),
            Source::Mock => f.write_str("mock"),
        }
    }
}

/// Per-stat percentile ranks for one season. A `None` entry means the
/// subject has no value for that stat.
pub type Percentiles = BTreeMap<String, Option<u8>>;

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// One player's numbers for one season. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStats {
    pub games: Option<u32>,
    pub mpg: Option<f64>,
    pub pts: Option<f64>,
    pub reb: Option<f64>,
    pub ast: Option<f64>,
    pub stl: Option<f64>,
    pub blk: Option<f64>,
    pub tov: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub ts_pct: Option<f64>,
    pub efg_pct: Option<f64>,
    pub usg_pct: Option<f64>,
    pub ftr: Option<f64>,
    pub ortg: Option<f64>,
    pub drtg: Option<f64>,
    pub bpm: Option<f64>,
    pub obpm: Option<f64>,
    pub dbpm: Option<f64>,
    pub ws40: Option<f64>,
    pub per: Option<f64>,
    pub porpag: Option<f64>,
}

impl PlayerSeasonStats {
    /// Look up a stat by its API field name. Unknown names yield `None`.
    pub fn stat(&self, name: &str) -> Option<f64> {
        match name {
            "games" => self.games.map(f64::from),
            "mpg" => self.mpg,
            "pts" => self.pts,
            "reb" => self.reb,
            "ast" => self.ast,
            "stl" => self.stl,
            "blk" => self.blk,
            "tov" => self.tov,
            "fg_pct" => self.fg_pct,
            "three_pct" => self.three_pct,
            "ft_pct" => self.ft_pct,
            "ts_pct" => self.ts_pct,
            "efg_pct" => self.efg_pct,
            "usg_pct" => self.usg_pct,
            "ftr" => self.ftr,
            "ortg" => self.ortg,
            "drtg" => self.drtg,
            "bpm" => self.bpm,
            "obpm" => self.obpm,
            "dbpm" => self.dbpm,
            "ws40" => self.ws40,
            "per" => self.per,
            "porpag" => self.porpag,
            _ => None,
        }
    }

    /// Mutable access to a fractional stat by API field name. Whole-number
    /// fields and unknown names yield `None`.
    pub fn stat_mut(&mut self, name: &str) -> Option<&mut Option<f64>> {
        Some(match name {
            "mpg" => &mut self.mpg,
            "pts" => &mut self.pts,
            "reb" => &mut self.reb,
            "ast" => &mut self.ast,
            "stl" => &mut self.stl,
            "blk" => &mut self.blk,
            "tov" => &mut self.tov,
            "fg_pct" => &mut self.fg_pct,
            "three_pct" => &mut self.three_pct,
            "ft_pct" => &mut self.ft_pct,
            "ts_pct" => &mut self.ts_pct,
            "efg_pct" => &mut self.efg_pct,
            "usg_pct" => &mut self.usg_pct,
            "ftr" => &mut self.ftr,
            "ortg" => &mut self.ortg,
            "drtg" => &mut self.drtg,
            "bpm" => &mut self.bpm,
            "obpm" => &mut self.obpm,
            "dbpm" => &mut self.dbpm,
            "ws40" => &mut self.ws40,
            "per" => &mut self.per,
            "porpag" => &mut self.porpag,
            _ => return None,
        })
    }
}

/// A flat leaderboard row: identity plus one season's stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub player_id: String,
    pub name: Option<String>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub position: Option<String>,
    pub year_in_school: Option<String>,
    pub height: Option<String>,
    /// Filled in by the fetcher when an API row omits it.
    #[serde(default)]
    pub season: String,
    #[serde(flatten)]
    pub stats: PlayerSeasonStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfileSeason {
    #[serde(flatten)]
    pub stats: PlayerSeasonStats,
    pub percentiles: Percentiles,
}

/// A player's full career: identity plus every season with percentiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub name: Option<String>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub position: Option<String>,
    pub year_in_school: Option<String>,
    pub height: Option<String>,
    pub hometown: Option<String>,
    /// Season identifiers in chronological order.
    pub seasons: Vec<String>,
    pub stats: BTreeMap<String, PlayerProfileSeason>,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// One team's numbers for one season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub record: Option<String>,
    pub conf_record: Option<String>,
    pub ortg: Option<f64>,
    pub drtg: Option<f64>,
    pub net_rtg: Option<f64>,
    pub pace: Option<f64>,
    pub barthag: Option<f64>,
    pub wab: Option<f64>,
    pub efg_pct: Option<f64>,
    pub opp_efg_pct: Option<f64>,
    pub tov_pct: Option<f64>,
    pub opp_tov_pct: Option<f64>,
    pub orb_pct: Option<f64>,
    pub drb_pct: Option<f64>,
    pub ftr: Option<f64>,
    pub opp_ftr: Option<f64>,
    pub nc_sos: Option<f64>,
    pub ov_sos: Option<f64>,
    pub seed: Option<f64>,
    pub rank: Option<u32>,
}

impl TeamSeasonStats {
    /// Look up a numeric stat by its API field name. Text fields and unknown
    /// names yield `None`.
    pub fn stat(&self, name: &str) -> Option<f64> {
        match name {
            "wins" => self.wins.map(f64::from),
            "losses" => self.losses.map(f64::from),
            "ortg" => self.ortg,
            "drtg" => self.drtg,
            "net_rtg" => self.net_rtg,
            "pace" => self.pace,
            "barthag" => self.barthag,
            "wab" => self.wab,
            "efg_pct" => self.efg_pct,
            "opp_efg_pct" => self.opp_efg_pct,
            "tov_pct" => self.tov_pct,
            "opp_tov_pct" => self.opp_tov_pct,
            "orb_pct" => self.orb_pct,
            "drb_pct" => self.drb_pct,
            "ftr" => self.ftr,
            "opp_ftr" => self.opp_ftr,
            "nc_sos" => self.nc_sos,
            "ov_sos" => self.ov_sos,
            "seed" => self.seed,
            "rank" => self.rank.map(f64::from),
            _ => None,
        }
    }

    pub fn stat_mut(&mut self, name: &str) -> Option<&mut Option<f64>> {
        Some(match name {
            "ortg" => &mut self.ortg,
            "drtg" => &mut self.drtg,
            "net_rtg" => &mut self.net_rtg,
            "pace" => &mut self.pace,
            "barthag" => &mut self.barthag,
            "wab" => &mut self.wab,
            "efg_pct" => &mut self.efg_pct,
            "opp_efg_pct" => &mut self.opp_efg_pct,
            "tov_pct" => &mut self.tov_pct,
            "opp_tov_pct" => &mut self.opp_tov_pct,
            "orb_pct" => &mut self.orb_pct,
            "drb_pct" => &mut self.drb_pct,
            "ftr" => &mut self.ftr,
            "opp_ftr" => &mut self.opp_ftr,
            "nc_sos" => &mut self.nc_sos,
            "ov_sos" => &mut self.ov_sos,
            "seed" => &mut self.seed,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRow {
    pub team_id: String,
    pub name: Option<String>,
    pub conference: Option<String>,
    pub abbreviation: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub season: String,
    #[serde(flatten)]
    pub stats: TeamSeasonStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProfileSeason {
    #[serde(flatten)]
    pub stats: TeamSeasonStats,
    pub percentiles: Percentiles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub team_id: String,
    pub name: Option<String>,
    pub conference: Option<String>,
    pub abbreviation: Option<String>,
    pub color: Option<String>,
    pub seasons: Vec<String>,
    pub stats: BTreeMap<String, TeamProfileSeason>,
}

/// A roster line: the subset of player stats shown on a team page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Option<String>,
    pub year_in_school: Option<String>,
    pub height: Option<String>,
    pub games: Option<u32>,
    pub mpg: Option<f64>,
    pub pts: Option<f64>,
    pub reb: Option<f64>,
    pub ast: Option<f64>,
    pub stl: Option<f64>,
    pub blk: Option<f64>,
    pub tov: Option<f64>,
    pub bpm: Option<f64>,
    pub obpm: Option<f64>,
    pub dbpm: Option<f64>,
    pub ts_pct: Option<f64>,
    pub usg_pct: Option<f64>,
}

// ---------------------------------------------------------------------------
// Game logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    W,
    L,
}

/// Home, away or neutral site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    H,
    A,
    N,
}

/// One box-score line. Live rows can carry nulls in any column, so every
/// field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGame {
    pub date: Option<String>,
    pub opponent: Option<String>,
    pub result: Option<GameResult>,
    pub location: Option<Location>,
    pub min: Option<u32>,
    pub pts: Option<u32>,
    pub reb: Option<u32>,
    pub ast: Option<u32>,
    pub stl: Option<u32>,
    pub blk: Option<u32>,
    pub tov: Option<u32>,
    /// Field goals as "made-attempted".
    pub fg: Option<String>,
    pub ortg: Option<f64>,
    pub usg: Option<f64>,
    pub efg: Option<f64>,
    pub ts: Option<f64>,
    pub bpm_game: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGame {
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub game_type: Option<String>,
    pub location: Option<Location>,
    pub result: Option<GameResult>,
    pub opponent: Option<String>,
    pub opp_conf: Option<String>,
    pub pts: Option<u32>,
    pub opp_pts: Option<u32>,
    pub score: Option<String>,
    pub margin: Option<i32>,
    pub pos: Option<f64>,
    pub game_ortg: Option<f64>,
    pub game_drtg: Option<f64>,
    pub game_net: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Source::Api).unwrap(), "\"api\"");
        assert_eq!(serde_json::to_string(&Source::Mock).unwrap(), "\"mock\"");
    }

    #[test]
    fn missing_player_fields_deserialize_as_none() {
        let row: PlayerRow = serde_json::from_str(
            r#"{"player_id":"x","name":"X","season":"2023-24","pts":12.5}"#,
        )
        .unwrap();
        assert_eq!(row.stats.pts, Some(12.5));
        assert_eq!(row.stats.reb, None);
        assert_eq!(row.team, None);
    }

    #[test]
    fn flattened_stats_serialize_at_top_level() {
        let row = PlayerRow {
            player_id: "x".into(),
            name: None,
            team: None,
            conference: None,
            position: None,
            year_in_school: None,
            height: None,
            season: "2023-24".into(),
            stats: PlayerSeasonStats {
                pts: Some(20.0),
                ..Default::default()
            },
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["pts"], 20.0);
        // Absent values are explicit nulls, never zero.
        assert!(v["reb"].is_null());
        assert!(v.get("stats").is_none());
    }

    #[test]
    fn stat_lookup_by_name() {
        let stats = PlayerSeasonStats {
            games: Some(31),
            drtg: Some(97.5),
            ..Default::default()
        };
        assert_eq!(stats.stat("games"), Some(31.0));
        assert_eq!(stats.stat("drtg"), Some(97.5));
        assert_eq!(stats.stat("ppg"), None);
    }

    #[test]
    fn team_game_type_field_renamed() {
        let game = TeamGame {
            date: Some("2023-11-08".into()),
            game_type: Some("reg".into()),
            location: Some(Location::H),
            result: Some(GameResult::W),
            opponent: Some("Duke".into()),
            opp_conf: Some("ACC".into()),
            pts: Some(70),
            opp_pts: Some(60),
            score: Some("70-60".into()),
            margin: Some(10),
            pos: Some(66.0),
            game_ortg: Some(106.1),
            game_drtg: Some(90.9),
            game_net: Some(15.2),
        };
        let v = serde_json::to_value(&game).unwrap();
        assert_eq!(v["type"], "reg");
        assert_eq!(v["result"], "W");
        assert_eq!(v["location"], "H");
    }
}
