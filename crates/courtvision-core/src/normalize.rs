// Field-schema normalization.
//
// Mock records were written over time with two naming conventions: legacy
// short names (`ppg`, `adj_o`, `efg_o`, ...) with shooting numbers stored as
// 0-1 fractions, and the API's own names on the 0-100 scale. Each resource
// type declares a mapping table from API field to its legacy aliases; a field
// resolves to the first non-null value found under the API name, then each
// legacy alias in order, otherwise null.
//
// Percentage scale rule: a percentage value `v <= 1` is treated as a fraction
// and multiplied by 100; anything above 1 is already on the 0-100 scale. This
// only holds because no real basketball percentage sits between 0 and 1 on
// the 0-100 scale. It is not a general-purpose rule. Because the guard leaves
// scaled values alone, normalizing a normalized record is a no-op.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{
    PlayerGame, PlayerProfile, PlayerProfileSeason, PlayerRow, PlayerSeasonStats, RosterEntry,
    TeamProfile, TeamProfileSeason, TeamRow, TeamSeasonStats,
};
use crate::percentile::{Cohort, SeasonPopulation};
use crate::store::{MockStore, RawPlayer, RawRecord, RawTeam};

// ---------------------------------------------------------------------------
// Mapping tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Stored as-is.
    Raw,
    /// A percentage that may be stored as a 0-1 fraction.
    Percent,
}

/// One API field and the legacy names it may be stored under.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub api: &'static str,
    pub legacy: &'static [&'static str],
    pub scale: Scale,
}

const fn raw(api: &'static str, legacy: &'static [&'static str]) -> FieldMapping {
    FieldMapping {
        api,
        legacy,
        scale: Scale::Raw,
    }
}

const fn pct(api: &'static str, legacy: &'static [&'static str]) -> FieldMapping {
    FieldMapping {
        api,
        legacy,
        scale: Scale::Percent,
    }
}

pub const PLAYER_IDENTITY_FIELDS: &[FieldMapping] = &[
    raw("player_id", &["id"]),
    raw("name", &["player"]),
    raw("team", &[]),
    raw("conference", &["conf"]),
    raw("position", &["pos"]),
    raw("year_in_school", &["class", "exp"]),
    raw("height", &["ht", "hgt"]),
    raw("hometown", &[]),
];

pub const PLAYER_SEASON_FIELDS: &[FieldMapping] = &[
    raw("games", &["gp", "g"]),
    raw("mpg", &["min"]),
    raw("pts", &["ppg"]),
    raw("reb", &["rpg"]),
    raw("ast", &["apg"]),
    raw("stl", &["spg"]),
    raw("blk", &["bpg"]),
    raw("tov", &["topg"]),
    pct("fg_pct", &["fg"]),
    pct("three_pct", &["fg3"]),
    pct("ft_pct", &["ft"]),
    pct("ts_pct", &["ts"]),
    pct("efg_pct", &["efg"]),
    pct("usg_pct", &["usg"]),
    pct("ftr", &[]),
    raw("ortg", &[]),
    raw("drtg", &[]),
    raw("bpm", &[]),
    raw("obpm", &[]),
    raw("dbpm", &[]),
    raw("ws40", &["ws_40"]),
    raw("per", &[]),
    raw("porpag", &[]),
];

pub const TEAM_IDENTITY_FIELDS: &[FieldMapping] = &[
    raw("team_id", &["id"]),
    raw("name", &["team"]),
    raw("conference", &["conf"]),
    raw("abbreviation", &["abbr"]),
    raw("color", &[]),
];

pub const TEAM_SEASON_FIELDS: &[FieldMapping] = &[
    raw("wins", &["w"]),
    raw("losses", &["l"]),
    raw("record", &[]),
    raw("conf_record", &["conf_rec"]),
    raw("ortg", &["adj_o"]),
    raw("drtg", &["adj_d"]),
    raw("net_rtg", &[]),
    raw("pace", &["adj_t"]),
    raw("barthag", &[]),
    raw("wab", &[]),
    pct("efg_pct", &["efg_o"]),
    pct("opp_efg_pct", &["efg_d"]),
    pct("tov_pct", &["to_o"]),
    pct("opp_tov_pct", &["to_d"]),
    pct("orb_pct", &["or_o"]),
    pct("drb_pct", &["dr"]),
    pct("ftr", &["ftr_o"]),
    pct("opp_ftr", &["ftr_d"]),
    raw("nc_sos", &[]),
    raw("ov_sos", &["sos"]),
    raw("seed", &[]),
    raw("rank", &["ap_rank"]),
];

// ---------------------------------------------------------------------------
// Field resolution
// ---------------------------------------------------------------------------

fn mapping<'t>(table: &'t [FieldMapping], api: &str) -> Option<&'t FieldMapping> {
    table.iter().find(|m| m.api == api)
}

/// Resolve a field: API name first, then each legacy alias, skipping nulls.
pub fn resolve<'a>(record: &'a RawRecord, field: &FieldMapping) -> Option<&'a Value> {
    std::iter::once(field.api)
        .chain(field.legacy.iter().copied())
        .find_map(|key| record.get(key).filter(|v| !v.is_null()))
}

/// Apply the percentage scale rule to one value.
pub fn scale_percent(raw: f64) -> f64 {
    if raw <= 1.0 {
        // Round off float noise from the multiply (0.651 * 100 = 65.10000000000001).
        (raw * 100.0 * 1000.0).round() / 1000.0
    } else {
        raw
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Resolve a numeric field from `table` by API name, applying its scale.
pub fn number(record: &RawRecord, table: &[FieldMapping], api: &str) -> Option<f64> {
    let field = mapping(table, api)?;
    let n = as_number(resolve(record, field)?)?;
    Some(match field.scale {
        Scale::Raw => n,
        Scale::Percent => scale_percent(n),
    })
}

/// Resolve a non-negative whole-number field.
pub fn count(record: &RawRecord, table: &[FieldMapping], api: &str) -> Option<u32> {
    let n = number(record, table, api)?;
    (n >= 0.0).then(|| n.round() as u32)
}

/// Resolve a text field. Numbers are rendered as text.
pub fn text(record: &RawRecord, table: &[FieldMapping], api: &str) -> Option<String> {
    let field = mapping(table, api)?;
    match resolve(record, field)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Season records
// ---------------------------------------------------------------------------

pub fn normalize_player_stats(raw: &RawRecord) -> PlayerSeasonStats {
    let n = |api: &str| number(raw, PLAYER_SEASON_FIELDS, api);
    PlayerSeasonStats {
        games: count(raw, PLAYER_SEASON_FIELDS, "games"),
        mpg: n("mpg"),
        pts: n("pts"),
        reb: n("reb"),
        ast: n("ast"),
        stl: n("stl"),
        blk: n("blk"),
        tov: n("tov"),
        fg_pct: n("fg_pct"),
        three_pct: n("three_pct"),
        ft_pct: n("ft_pct"),
        ts_pct: n("ts_pct"),
        efg_pct: n("efg_pct"),
        usg_pct: n("usg_pct"),
        ftr: n("ftr"),
        ortg: n("ortg"),
        drtg: n("drtg"),
        bpm: n("bpm"),
        obpm: n("obpm"),
        dbpm: n("dbpm"),
        ws40: n("ws40"),
        per: n("per"),
        porpag: n("porpag"),
    }
}

/// Normalize a team season. `record` and `net_rtg` are derived from the
/// totals and ratings when the raw record lacks them.
pub fn normalize_team_stats(raw: &RawRecord) -> TeamSeasonStats {
    let n = |api: &str| number(raw, TEAM_SEASON_FIELDS, api);
    let wins = count(raw, TEAM_SEASON_FIELDS, "wins");
    let losses = count(raw, TEAM_SEASON_FIELDS, "losses");
    let ortg = n("ortg");
    let drtg = n("drtg");

    let record = text(raw, TEAM_SEASON_FIELDS, "record").or_else(|| match (wins, losses) {
        (Some(w), Some(l)) => Some(format!("{w}-{l}")),
        _ => None,
    });
    let net_rtg = n("net_rtg").or_else(|| match (ortg, drtg) {
        (Some(o), Some(d)) => Some(round1(o - d)),
        _ => None,
    });

    TeamSeasonStats {
        wins,
        losses,
        record,
        conf_record: text(raw, TEAM_SEASON_FIELDS, "conf_record"),
        ortg,
        drtg,
        net_rtg,
        pace: n("pace"),
        barthag: n("barthag"),
        wab: n("wab"),
        efg_pct: n("efg_pct"),
        opp_efg_pct: n("opp_efg_pct"),
        tov_pct: n("tov_pct"),
        opp_tov_pct: n("opp_tov_pct"),
        orb_pct: n("orb_pct"),
        drb_pct: n("drb_pct"),
        ftr: n("ftr"),
        opp_ftr: n("opp_ftr"),
        nc_sos: n("nc_sos"),
        ov_sos: n("ov_sos"),
        seed: n("seed"),
        rank: count(raw, TEAM_SEASON_FIELDS, "rank"),
    }
}

// ---------------------------------------------------------------------------
// Live payloads
// ---------------------------------------------------------------------------
//
// API rows arrive already typed but not always on the 0-100 scale (the
// shooting splits come back as fractions). These apply the same scale rule
// in place; values already on 0-100 are untouched.

fn rescale(slot: &mut Option<f64>) {
    if let Some(v) = slot.as_mut() {
        *v = scale_percent(*v);
    }
}

fn percent_fields(table: &'static [FieldMapping]) -> impl Iterator<Item = &'static str> {
    table
        .iter()
        .filter(|m| m.scale == Scale::Percent)
        .map(|m| m.api)
}

pub fn rescale_player_stats(stats: &mut PlayerSeasonStats) {
    for api in percent_fields(PLAYER_SEASON_FIELDS) {
        if let Some(slot) = stats.stat_mut(api) {
            rescale(slot);
        }
    }
}

pub fn rescale_team_stats(stats: &mut TeamSeasonStats) {
    for api in percent_fields(TEAM_SEASON_FIELDS) {
        if let Some(slot) = stats.stat_mut(api) {
            rescale(slot);
        }
    }
}

pub fn rescale_roster_entry(entry: &mut RosterEntry) {
    rescale(&mut entry.ts_pct);
    rescale(&mut entry.usg_pct);
}

pub fn rescale_player_game(game: &mut PlayerGame) {
    rescale(&mut game.usg);
    rescale(&mut game.efg);
    rescale(&mut game.ts);
}

// ---------------------------------------------------------------------------
// Flat rows
// ---------------------------------------------------------------------------

/// Leaderboard row for one player-season, or `None` if the player has no
/// record in that season.
pub fn normalize_player_row(player: &RawPlayer, season: &str) -> Option<PlayerRow> {
    let raw = player.season(season)?;
    let id = &player.identity;
    let t = |api: &str| text(id, PLAYER_IDENTITY_FIELDS, api);
    Some(PlayerRow {
        player_id: t("player_id")?,
        name: t("name"),
        team: t("team"),
        conference: t("conference"),
        position: t("position"),
        year_in_school: t("year_in_school"),
        height: t("height"),
        season: season.to_string(),
        stats: normalize_player_stats(raw),
    })
}

pub fn normalize_team_row(team: &RawTeam, season: &str) -> Option<TeamRow> {
    let raw = team.season(season)?;
    let id = &team.identity;
    let t = |api: &str| text(id, TEAM_IDENTITY_FIELDS, api);
    Some(TeamRow {
        team_id: t("team_id")?,
        name: t("name"),
        conference: t("conference"),
        abbreviation: t("abbreviation"),
        color: t("color"),
        season: season.to_string(),
        stats: normalize_team_stats(raw),
    })
}

pub fn normalize_roster_entry(player: &RawPlayer, season: &str) -> Option<RosterEntry> {
    let row = normalize_player_row(player, season)?;
    let s = row.stats;
    Some(RosterEntry {
        player_id: row.player_id,
        name: row.name,
        position: row.position,
        year_in_school: row.year_in_school,
        height: row.height,
        games: s.games,
        mpg: s.mpg,
        pts: s.pts,
        reb: s.reb,
        ast: s.ast,
        stl: s.stl,
        blk: s.blk,
        tov: s.tov,
        bpm: s.bpm,
        obpm: s.obpm,
        dbpm: s.dbpm,
        ts_pct: s.ts_pct,
        usg_pct: s.usg_pct,
    })
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Build a full player profile with per-season percentiles.
///
/// Returns `None` when `player` is absent, meaning "no profile found".
pub fn normalize_player_profile(
    player: Option<&RawPlayer>,
    store: &MockStore,
) -> Option<PlayerProfile> {
    let player = player?;
    let id = &player.identity;
    let t = |api: &str| text(id, PLAYER_IDENTITY_FIELDS, api);

    let mut stats = BTreeMap::new();
    for (season, raw) in &player.seasons {
        let season_stats = normalize_player_stats(raw);
        // One population per season, shared by every stat in it.
        let population = SeasonPopulation::build(store, Cohort::Players, season);
        let percentiles = population.player_percentiles(&season_stats);
        stats.insert(
            season.clone(),
            PlayerProfileSeason {
                stats: season_stats,
                percentiles,
            },
        );
    }

    Some(PlayerProfile {
        player_id: t("player_id")?,
        name: t("name"),
        team: t("team"),
        conference: t("conference"),
        position: t("position"),
        year_in_school: t("year_in_school"),
        height: t("height"),
        hometown: t("hometown"),
        seasons: stats.keys().cloned().collect(),
        stats,
    })
}

pub fn normalize_team_profile(team: Option<&RawTeam>, store: &MockStore) -> Option<TeamProfile> {
    let team = team?;
    let id = &team.identity;
    let t = |api: &str| text(id, TEAM_IDENTITY_FIELDS, api);

    let mut stats = BTreeMap::new();
    for (season, raw) in &team.seasons {
        let season_stats = normalize_team_stats(raw);
        let population = SeasonPopulation::build(store, Cohort::Teams, season);
        let percentiles = population.team_percentiles(&season_stats);
        stats.insert(
            season.clone(),
            TeamProfileSeason {
                stats: season_stats,
                percentiles,
            },
        );
    }

    Some(TeamProfile {
        team_id: t("team_id")?,
        name: t("name"),
        conference: t("conference"),
        abbreviation: t("abbreviation"),
        color: t("color"),
        seasons: stats.keys().cloned().collect(),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
