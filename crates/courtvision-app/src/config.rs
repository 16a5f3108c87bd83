// Configuration loading and parsing (courtvision.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use courtvision_core::Season;

use crate::fetch::ResourceKind;

/// Environment variable that replaces `api.base_url`. An empty value turns
/// the live API off.
pub const API_URL_ENV: &str = "COURTVISION_API_URL";

const CONFIG_FILE: &str = "courtvision.toml";
const BUILTIN_DEFAULTS: &str = include_str!("../defaults/courtvision.toml");

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub timeouts: TimeoutConfig,
    pub fallback: FallbackConfig,
    pub default_season: Season,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Live API root, e.g. `http://localhost:8000/api`. `None` runs on mock
    /// data only.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Per-resource request timeouts in milliseconds. List fetches are cheap;
/// multi-season profiles take longer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub players_ms: u64,
    pub player_profile_ms: u64,
    pub player_games_ms: u64,
    pub teams_ms: u64,
    pub team_profile_ms: u64,
    pub team_roster_ms: u64,
    pub team_games_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            players_ms: 3_000,
            player_profile_ms: 6_000,
            player_games_ms: 4_000,
            teams_ms: 3_000,
            team_profile_ms: 6_000,
            team_roster_ms: 4_000,
            team_games_ms: 4_000,
        }
    }
}

impl TimeoutConfig {
    pub fn for_resource(&self, kind: ResourceKind) -> Duration {
        let ms = match kind {
            ResourceKind::Players => self.players_ms,
            ResourceKind::PlayerProfile => self.player_profile_ms,
            ResourceKind::PlayerGames => self.player_games_ms,
            ResourceKind::Teams => self.teams_ms,
            ResourceKind::TeamProfile => self.team_profile_ms,
            ResourceKind::TeamRoster => self.team_roster_ms,
            ResourceKind::TeamGames => self.team_games_ms,
        };
        Duration::from_millis(ms)
    }

    fn fields(&self) -> [(&'static str, u64); 7] {
        [
            ("timeouts.players_ms", self.players_ms),
            ("timeouts.player_profile_ms", self.player_profile_ms),
            ("timeouts.player_games_ms", self.player_games_ms),
            ("timeouts.teams_ms", self.teams_ms),
            ("timeouts.team_profile_ms", self.team_profile_ms),
            ("timeouts.team_roster_ms", self.team_roster_ms),
            ("timeouts.team_games_ms", self.team_games_ms),
        ]
    }
}

/// What a 404 from the live API means for profile lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotFoundPolicy {
    /// The API is the source of truth: answer "not found" with `source: api`.
    #[default]
    Authoritative,
    /// Treat 404 like any other failure and consult the mock store.
    Mock,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackConfig {
    #[serde(default)]
    pub not_found: NotFoundPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            timeouts: TimeoutConfig::default(),
            fallback: FallbackConfig::default(),
            default_season: Season::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// courtvision.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api: ApiConfig,
    #[serde(default)]
    timeouts: TimeoutConfig,
    #[serde(default)]
    fallback: FallbackConfig,
    #[serde(default)]
    seasons: SeasonsSection,
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonsSection {
    default: String,
}

impl Default for SeasonsSection {
    fn default() -> Self {
        Self {
            default: Season::default().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/courtvision.toml` relative to `base_dir`,
/// applying the `COURTVISION_API_URL` override.
///
/// Does not copy defaults; `load_config` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let env_url = std::env::var(API_URL_ENV).ok();
    parse_config(&text, &path, env_url)
}

/// Parse, override and validate config text. `path` is only used in errors.
pub fn parse_config(
    text: &str,
    path: &Path,
    env_url: Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(url) = env_url {
        file.api.base_url = Some(url);
    }
    // A blank URL means "no API", not a malformed one.
    if file
        .api
        .base_url
        .as_deref()
        .is_some_and(|u| u.trim().is_empty())
    {
        file.api.base_url = None;
    }

    validate(&file)?;

    let default_season =
        Season::parse(&file.seasons.default).map_err(|e| ConfigError::ValidationError {
            field: "seasons.default".into(),
            message: e.to_string(),
        })?;

    Ok(AppConfig {
        api: file.api,
        timeouts: file.timeouts,
        fallback: file.fallback,
        default_season,
    })
}

/// The defaults shipped with the binary, for runs outside a project tree.
pub fn builtin_config() -> Result<AppConfig, ConfigError> {
    parse_config(
        BUILTIN_DEFAULTS,
        Path::new("<builtin>/courtvision.toml"),
        std::env::var(API_URL_ENV).ok(),
    )
}

/// Seed `config/courtvision.toml` from `defaults/` if it is missing.
/// Returns whether a copy was made; an existing config is never touched.
pub fn ensure_config_file(base_dir: &Path) -> Result<bool, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(false);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!("no {CONFIG_FILE} in config/ or defaults/ under {}", base_dir.display()),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_err)?;
    std::fs::copy(&source, &target).map_err(copy_err)?;
    Ok(true)
}

/// Copy the default config into `base_dir/config` if needed, then load it.
pub fn load_config(base_dir: &Path) -> Result<AppConfig, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(file: &ConfigFile) -> Result<(), ConfigError> {
    if let Some(url) = &file.api.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                field: "api.base_url".into(),
                message: format!("must start with http:// or https://, got {url:?}"),
            });
        }
    }

    for (name, ms) in file.timeouts.fields() {
        if ms == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be greater than 0".into(),
            });
        }
    }

    Ok(())
}
