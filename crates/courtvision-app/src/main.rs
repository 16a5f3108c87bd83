// courtvision entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries only JSON)
// 2. Load config (copying defaults on first run)
// 3. Load the bundled mock dataset
// 4. Build the data source (live API with mock fallback)
// 5. Run the requested command and print its envelope

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use courtvision_app::config::{self, AppConfig, ConfigError};
use courtvision_app::fetch::DataSource;
use courtvision_app::view::{load_player_page, load_team_page, PageView};
use courtvision_core::leaderboard::PlayerFilter;
use courtvision_core::percentile::{direction_for, Cohort, Direction, PercentileEngine};
use courtvision_core::similarity::similar_players;
use courtvision_core::{MockStore, Season, Source};

#[derive(Parser)]
#[command(name = "courtvision")]
#[command(about = "College basketball stats from the live API, with demo-data fallback")]
#[command(version)]
struct Cli {
    /// Directory containing config/ and defaults/ (defaults to the current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Player leaderboard for a season, best BPM first
    Players {
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
        /// Conference abbreviation, e.g. SEC
        #[arg(long)]
        conference: Option<String>,
        /// Position prefix, e.g. G
        #[arg(long)]
        position: Option<String>,
        /// Minimum minutes per game
        #[arg(long)]
        min_mpg: Option<f64>,
    },

    /// Full player profile with per-season percentiles
    Player { id: String },

    /// Player game log for a season
    PlayerGames {
        id: String,
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
    },

    /// Team leaderboard for a season, best Barthag first
    Teams {
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
        #[arg(long)]
        conference: Option<String>,
    },

    /// Full team profile with per-season percentiles
    Team { id: String },

    /// Team roster for a season
    Roster {
        id: String,
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
    },

    /// Team game log for a season
    TeamGames {
        id: String,
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
    },

    /// Players with the most similar statistical profile
    Similar {
        id: String,
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
        /// How many players to return
        #[arg(short, long, default_value = "5")]
        k: usize,
    },

    /// Rank a value against a season's players or teams
    Percentile {
        #[arg(value_enum)]
        cohort: CohortArg,
        stat: String,
        #[arg(allow_hyphen_values = true)]
        value: f64,
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
        /// Rank lower values as better, overriding the stat's declared direction
        #[arg(long)]
        lower_is_better: bool,
    },

    /// Player profile and game log, fetched together
    PlayerPage {
        id: String,
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
    },

    /// Team profile, roster and game log, fetched together
    TeamPage {
        id: String,
        #[arg(long, value_parser = Season::parse)]
        season: Option<Season>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CohortArg {
    Players,
    Teams,
}

impl From<CohortArg> for Cohort {
    fn from(arg: CohortArg) -> Self {
        match arg {
            CohortArg::Players => Cohort::Players,
            CohortArg::Teams => Cohort::Teams,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    let cli = Cli::parse();

    // 2. Load config
    let base_dir = match cli.config_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let config = load_config(&base_dir)?;
    info!(
        "Config loaded: api={}, default season {}",
        config.api.base_url.as_deref().unwrap_or("<none>"),
        config.default_season
    );

    // 3. Load the mock dataset
    let store = Arc::new(MockStore::bundled().context("failed to load bundled mock dataset")?);
    info!(
        "Mock dataset loaded: {} players, {} teams, seasons {:?}",
        store.players().len(),
        store.teams().len(),
        store.seasons()
    );

    // 4. Build the data source
    let source = DataSource::from_config(store, &config);
    if !source.is_live() {
        info!("No API configured, serving mock data only");
    }

    // 5. Run the command
    run(cli.command, &source, &config).await
}

async fn run(command: Command, source: &DataSource, config: &AppConfig) -> anyhow::Result<()> {
    let season_or_default = |season: Option<Season>| season.unwrap_or_else(|| config.default_season.clone());

    match command {
        Command::Players {
            season,
            conference,
            position,
            min_mpg,
        } => {
            let filter = PlayerFilter {
                conference,
                position,
                min_mpg,
            };
            emit(&source.fetch_players(&season_or_default(season), &filter).await)
        }
        Command::Player { id } => emit(&source.fetch_player_profile(&id).await),
        Command::PlayerGames { id, season } => {
            emit(&source.fetch_player_games(&id, &season_or_default(season)).await)
        }
        Command::Teams { season, conference } => emit(
            &source
                .fetch_teams(&season_or_default(season), conference.as_deref())
                .await,
        ),
        Command::Team { id } => emit(&source.fetch_team_profile(&id).await),
        Command::Roster { id, season } => {
            emit(&source.fetch_team_roster(&id, &season_or_default(season)).await)
        }
        Command::TeamGames { id, season } => {
            emit(&source.fetch_team_games(&id, &season_or_default(season)).await)
        }
        Command::Similar { id, season, k } => {
            let season = season_or_default(season);
            let similar = similar_players(source.store(), &id, season.as_str(), k);
            emit(&json!({ "data": similar, "source": Source::Mock }))
        }
        Command::Percentile {
            cohort,
            stat,
            value,
            season,
            lower_is_better,
        } => {
            let season = season_or_default(season);
            let cohort = Cohort::from(cohort);
            let direction = if lower_is_better {
                Direction::LowerIsBetter
            } else {
                direction_for(cohort, &stat)
            };
            let engine = PercentileEngine::new(source.store());
            let percentile = engine.percentile(cohort, &stat, value, season.as_str(), Some(direction));
            emit(&json!({
                "stat": stat,
                "value": value,
                "season": season,
                "lower_is_better": direction == Direction::LowerIsBetter,
                "percentile": percentile,
                "source": Source::Mock,
            }))
        }
        Command::PlayerPage { id, season } => {
            let season = season_or_default(season);
            let mut view = PageView::new();
            let ticket = view.begin();
            let page = load_player_page(source, &id, &season).await;
            view.commit(ticket, page);
            emit(&view.current())
        }
        Command::TeamPage { id, season } => {
            let season = season_or_default(season);
            let mut view = PageView::new();
            let ticket = view.begin();
            let page = load_team_page(source, &id, &season).await;
            view.commit(ticket, page);
            emit(&view.current())
        }
    }
}

/// Load config from `base_dir`, or the built-in defaults when it has
/// neither `config/` nor `defaults/`.
fn load_config(base_dir: &std::path::Path) -> anyhow::Result<AppConfig> {
    match config::load_config(base_dir) {
        Ok(config) => Ok(config),
        Err(ConfigError::DefaultsCopyError { message }) => {
            info!("{message}; using built-in defaults");
            config::builtin_config().context("failed to load built-in configuration")
        }
        Err(e) => Err(e).context("failed to load configuration"),
    }
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

/// Initialize tracing to stderr, leaving stdout for command output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtvision=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
