//! Explore a catalog of dinosaurs, their discovery decades and dig sites
//!
//! The catalog comes from the Chingu dinosaur API
//! <https://chinguapi.onrender.com/dinosaurs>, dig sites are located using
//! Mapbox geocoding, and news come from NewsAPI.

mod catalog;
mod config;
mod decade;
mod dig_sites;
mod filter;
mod geocode;
mod history;
mod news;
mod options;
mod progress;
mod render;

use crate::{
    catalog::{Catalog, DinoId, DinoRecord},
    config::Config,
    decade::DecadeFilter,
    filter::SearchFilters,
    geocode::{GeoCache, Geocoder},
    history::{Deletion, HistoryStore},
    news::NewsClient,
    options::FilterOptions,
    progress::ProgressReport,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Search dinosaurs, dig by decade of discovery, keep track of past searches
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}
//
impl Args {
    /// Decode and validate CLI arguments
    pub fn parse_and_check() -> Result<Self> {
        Args::parse().checked()
    }

    /// Normalize and validate decoded CLI arguments
    fn checked(mut self) -> Result<Self> {
        // Blank values are as good as missing ones
        let global = &mut self.global;
        global.mapbox_token = not_blank(global.mapbox_token.take());
        global.news_api_key = not_blank(global.news_api_key.take());
        global.user = not_blank(global.user.take());

        // Check that the services needed by the command are configured
        match &self.command {
            Command::DigSites { .. } => anyhow::ensure!(
                global.mapbox_token.is_some(),
                "locating dig sites requires a Mapbox access token (--mapbox-token or MAPBOX_ACCESS_TOKEN)"
            ),
            Command::News => anyhow::ensure!(
                global.news_api_key.is_some(),
                "fetching news requires a NewsAPI key (--news-api-key or NEWS_API_KEY)"
            ),
            Command::History { .. } => anyhow::ensure!(
                global.user.is_some(),
                "search history is kept per user, please tell who you are (--user or DINO_DIG_USER)"
            ),
            Command::Search { .. } | Command::Show { .. } | Command::Options => {}
        }
        Ok(self)
    }
}

/// Trim a textual argument, discarding it if nothing is left
fn not_blank(value: Option<Box<str>>) -> Option<Box<str>> {
    value
        .map(|value| value.trim().into())
        .filter(|value: &Box<str>| !value.is_empty())
}

/// Options shared by all commands
#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// Location of the dinosaur catalog
    #[arg(long, env = "DINO_CATALOG_URL", default_value = "https://chinguapi.onrender.com/dinosaurs")]
    catalog_url: Box<str>,

    /// Search history database
    ///
    /// Defaults to a file in the user's data directory.
    #[arg(long, env = "DINO_DIG_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Mapbox access token, needed to locate dig sites
    #[arg(long, env = "MAPBOX_ACCESS_TOKEN", hide_env_values = true)]
    mapbox_token: Option<Box<str>>,

    /// NewsAPI key, needed to fetch news
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<Box<str>>,

    /// E-mail address of the user whose searches should be saved
    ///
    /// Searches are not saved if no user is specified.
    #[arg(short, long, env = "DINO_DIG_USER", global = true)]
    user: Option<Box<str>>,

    /// Print JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

/// What the program should do
#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog
    ///
    /// Without any criterion, every dinosaur is listed. Searches with at least
    /// one criterion and one result are saved for the --user, if any.
    Search {
        #[command(flatten)]
        filters: SearchFilters,

        /// Re-run a saved search, as listed by the "history" command
        #[arg(long, conflicts_with_all = ["name", "found_in", "diet", "length", "weight", "decade"])]
        replay: Option<Box<str>>,
    },

    /// Show everything known about a dinosaur
    Show {
        /// Dinosaur identifier, as shown in search results
        id: DinoId,
    },

    /// List the values that each search criterion can take
    Options,

    /// Locate the places where dinosaurs were found
    DigSites {
        /// Only consider dinosaurs named in this decade, e.g. "1900s", or "N/A"
        /// for dinosaurs whose naming date is unknown
        #[arg(long, conflicts_with = "pick_decade")]
        decade: Option<DecadeFilter>,

        /// Interactively pick the decade of interest
        #[arg(long)]
        pick_decade: bool,
    },

    /// List or delete saved searches
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Show recent news about dinosaurs
    News,
}

/// What to do with the search history
#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List saved searches (default)
    List,

    /// Delete saved searches
    Delete {
        /// Saved search to delete, as listed by "history list"
        #[arg(required_unless_present = "all")]
        query: Option<Box<str>>,

        /// Delete every saved search
        #[arg(long, conflicts_with = "query")]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up logging
    if let Err(e) = setup_logging() {
        eprintln!("Logging is disabled because syslog is not available: {e}");
    }

    // Decode CLI arguments
    let Args { global, command } = Args::parse_and_check()?;
    let config = Config::new(global);
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("setting up the HTTP client")?;

    // Set up progress reporting
    let report = ProgressReport::new();

    // Run the command
    let output = match command {
        Command::Search { filters, replay } => {
            let filters = match replay {
                Some(query) => SearchFilters::from_query(&query)?,
                None => filters,
            };
            search(&config, &client, &report, filters).await?
        }
        Command::Show { id } => {
            let catalog = catalog::fetch(&client, &config.catalog_url, &report).await?;
            let dino = catalog
                .find(id)
                .with_context(|| format!("there is no dinosaur with identifier {id}"))?;
            emit(&config, dino, render::record)?
        }
        Command::Options => {
            let catalog = catalog::fetch(&client, &config.catalog_url, &report).await?;
            let options = FilterOptions::new(catalog.records());
            emit(&config, &options, render::options)?
        }
        Command::DigSites {
            decade,
            pick_decade,
        } => dig_sites(&config, &client, &report, decade, pick_decade).await?,
        Command::History { action } => history(&config, action.unwrap_or(HistoryAction::List)).await?,
        Command::News => {
            let api_key = config
                .news_api_key
                .as_deref()
                .context("fetching news requires a NewsAPI key")?;
            let news_client = Arc::new(NewsClient::new(client, news::NEWS_ENDPOINT, api_key)?);
            let articles = news::latest(news_client, &report).await;
            emit(&config, &articles, |articles| render::news(articles))?
        }
    };

    // Display the output
    {
        let stdout = tokio::io::stdout();
        let mut stdout = BufWriter::new(stdout);
        stdout.write_all(output.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Search the catalog, save the search if appropriate
async fn search(
    config: &Config,
    client: &reqwest::Client,
    report: &ProgressReport,
    filters: SearchFilters,
) -> Result<String> {
    let catalog = catalog::fetch(client, &config.catalog_url, report).await?;
    search_catalog(config, &catalog, filters).await
}

/// Search a previously fetched catalog, save the search if appropriate
async fn search_catalog(config: &Config, catalog: &Catalog, filters: SearchFilters) -> Result<String> {
    let results = filter::apply(&filters, catalog.records());

    // Saving the search is a convenience, failing to do so should not prevent
    // the user from seeing the results
    if let Err(e) = save_search(config, &filters, &results).await {
        log::warn!("Failed to save search: {e:#}");
    }

    emit(config, &results, |results| render::cards(results, &filters))
}

/// Record a search in the user's history, if it is worth remembering
///
/// Only searches by a known user, with at least one criterion and at least
/// one result, are saved. Returns truth that the search was saved.
async fn save_search(
    config: &Config,
    filters: &SearchFilters,
    results: &[&DinoRecord],
) -> Result<bool> {
    let Some(user) = config.user.as_deref() else {
        return Ok(false);
    };
    if filters.is_empty() || results.is_empty() {
        return Ok(false);
    }
    let store = HistoryStore::open(config.database()?).await?;
    store
        .record(user, &filters.to_query())
        .await
        .with_context(|| format!("saving search of user {user}"))?;
    store.close().await;
    Ok(true)
}

/// Aggregate the discovery locations of (some) dinosaurs into dig sites
async fn dig_sites(
    config: &Config,
    client: &reqwest::Client,
    report: &ProgressReport,
    decade: Option<DecadeFilter>,
    pick_decade: bool,
) -> Result<String> {
    let catalog = catalog::fetch(client, &config.catalog_url, report).await?;

    // Select the dinosaurs of interest
    let decade = if pick_decade {
        decade::prompt(&decade::decades(catalog.records())).context("picking a decade")?
    } else {
        decade
    };
    let records = catalog
        .records()
        .iter()
        .filter(|dino| decade.map_or(true, |decade| decade.matches(dino)))
        .collect::<Vec<_>>();

    // Locate the places where they were found
    let geocoder = Arc::new(Geocoder::new(
        client.clone(),
        geocode::MAPBOX_ENDPOINT,
        config
            .mapbox_token
            .as_deref()
            .context("locating dig sites requires a Mapbox access token")?,
    )?);
    let mut cache = match &config.geocoding_cache {
        Some(path) => GeoCache::load(path).await,
        None => GeoCache::in_memory(),
    };
    let locations = records
        .iter()
        .copied()
        .flat_map(DinoRecord::locations)
        .map(Box::from);
    let geocoded = geocode::geocode_all(geocoder, locations, &mut cache, report).await;
    if let Err(e) = cache.save().await {
        log::warn!("Failed to save the geocoding cache: {e:#}");
    }

    let sites = dig_sites::dig_sites(records.iter().copied(), &geocoded);
    emit(config, &sites, |sites| render::dig_sites(sites, decade, &catalog))
}

/// List or delete saved searches
async fn history(config: &Config, action: HistoryAction) -> Result<String> {
    let user = config
        .user
        .as_deref()
        .context("search history is kept per user")?;
    let store = HistoryStore::open(config.database()?).await?;
    let output = match action {
        HistoryAction::List => {
            let queries = store.list(user).await?;
            emit(config, &queries, |queries| render::history(user, queries.as_deref()))?
        }
        HistoryAction::Delete { query, all } => {
            let deletion = match query {
                Some(query) if !all => Deletion::Query(query),
                _ => Deletion::All,
            };
            let deleted = store.delete(user, &deletion).await?;
            let message = if deleted {
                "Deleted from search history\n"
            } else {
                "Nothing to delete\n"
            };
            emit(config, &deleted, |_| message.to_owned())?
        }
    };
    store.close().await;
    Ok(output)
}

/// Format some output as JSON or human-readable text, depending on the
/// configuration
fn emit<T: Serialize + ?Sized>(
    config: &Config,
    data: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<String> {
    if config.json {
        let mut json = serde_json::to_string_pretty(data).context("converting output to JSON")?;
        json.push('\n');
        Ok(json)
    } else {
        Ok(human(data))
    }
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}
