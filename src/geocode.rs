//! Translation of discovery locations into map coordinates
//!
//! Locations are looked up with Mapbox forward geocoding. Since the catalog
//! only mentions a few dozen distinct places, lookups are remembered in an
//! on-disk JSON cache across runs.

use crate::{
    progress::{ProgressConfig, ProgressReport, Work},
    Result,
};
use anyhow::Context;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, task::JoinSet};

/// Mapbox forward geocoding endpoint
pub const MAPBOX_ENDPOINT: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Position on the globe
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Outcome of geocoding a set of locations
///
/// Locations which the geocoder doesn't know about map to `None`.
pub type Geocoded = HashMap<Box<str>, Option<Coordinates>>;

/// Mapbox geocoding client
#[derive(Clone, Debug)]
pub struct Geocoder {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Box<str>,
}
//
impl Geocoder {
    /// Set up a geocoder
    pub fn new(client: reqwest::Client, endpoint: &str, access_token: &str) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)
                .with_context(|| format!("parsing geocoding endpoint {endpoint:?}"))?,
            access_token: access_token.into(),
        })
    }

    /// Look up the coordinates of a location
    pub async fn lookup(&self, location: &str) -> Result<Option<Coordinates>> {
        let url = self.lookup_url(location)?;
        let context = || format!("geocoding {location:?}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .with_context(context)?;
        let body = response.bytes().await.with_context(context)?;
        parse_response(&body).with_context(context)
    }

    /// URL of the lookup request for a certain location
    fn lookup_url(&self, location: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::format_err!("geocoding endpoint {} can't have a path", self.endpoint))?
            .pop_if_empty()
            .push(&format!("{location}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token);
        Ok(url)
    }
}

/// Extract the best match from a Mapbox geocoding response
pub fn parse_response(json: &[u8]) -> Result<Option<Coordinates>> {
    #[derive(Deserialize)]
    struct Response {
        features: Vec<Feature>,
    }
    #[derive(Deserialize)]
    struct Feature {
        geometry: Geometry,
    }
    #[derive(Deserialize)]
    struct Geometry {
        coordinates: Vec<f64>,
    }

    let response: Response =
        serde_json::from_slice(json).context("decoding the geocoding response")?;
    let Some(best) = response.features.into_iter().next() else {
        return Ok(None);
    };
    match best.geometry.coordinates[..] {
        [longitude, latitude, ..] => Ok(Some(Coordinates {
            longitude,
            latitude,
        })),
        _ => anyhow::bail!("geocoding result has fewer than two coordinates"),
    }
}

/// On-disk memory of previous geocoding lookups
#[derive(Debug, Default)]
pub struct GeoCache {
    /// Where the cache is saved, if anywhere
    path: Option<PathBuf>,

    /// Known locations
    entries: Geocoded,

    /// Truth that entries were added since loading
    dirty: bool,
}
//
impl GeoCache {
    /// Cache that lives in memory only
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache from disk, starting afresh if it's missing or unreadable
    pub async fn load(path: &Path) -> Self {
        let entries = match fs::read(path).await {
            Ok(json) => serde_json::from_slice(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt geocoding cache {}: {e}", path.display());
                Geocoded::new()
            }),
            Err(e) => {
                log::debug!("No geocoding cache at {}: {e}", path.display());
                Geocoded::new()
            }
        };
        Self {
            path: Some(path.to_owned()),
            entries,
            dirty: false,
        }
    }

    /// Previous lookup result, if the location was looked up before
    pub fn get(&self, location: &str) -> Option<Option<Coordinates>> {
        self.entries.get(location).copied()
    }

    /// Record a lookup result
    pub fn insert(&mut self, location: Box<str>, coordinates: Option<Coordinates>) {
        self.entries.insert(location, coordinates);
        self.dirty = true;
    }

    /// Save the cache to disk if it changed
    pub async fn save(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("setting up the cache directory")?;
        }
        let json = serde_json::to_vec_pretty(&self.entries)
            .context("converting geocoding cache to JSON")?;
        fs::write(path, json)
            .await
            .with_context(|| format!("saving geocoding cache to {}", path.display()))?;
        self.dirty = false;
        Ok(())
    }
}

/// Geocode a set of locations, using and updating the cache
///
/// Lookups that fail are logged and treated as unknown locations for this
/// run, but not cached so that they are retried next time.
pub async fn geocode_all(
    geocoder: Arc<Geocoder>,
    locations: impl IntoIterator<Item = Box<str>>,
    cache: &mut GeoCache,
    report: &ProgressReport,
) -> Geocoded {
    // Only query the locations that we don't know about yet
    let mut geocoded = Geocoded::new();
    let mut missing = Vec::new();
    for location in locations {
        if geocoded.contains_key(&location) {
            continue;
        }
        match cache.get(&location) {
            Some(coordinates) => {
                geocoded.insert(location, coordinates);
            }
            None if !missing.contains(&location) => missing.push(location),
            None => {}
        }
    }
    log::info!(
        "{} locations known from cache, {} to be geocoded",
        geocoded.len(),
        missing.len()
    );
    if missing.is_empty() {
        return geocoded;
    }

    // Start all lookups
    let lookups = report.add(
        "Geocoding dig sites",
        ProgressConfig::new(Work::Steps(missing.len())),
    );
    let mut requests = JoinSet::new();
    for location in missing {
        let geocoder = geocoder.clone();
        requests.spawn(async move {
            let result = geocoder.lookup(&location).await;
            (location, result)
        });
    }

    // Collect results as they come
    while let Some(outcome) = requests.join_next().await {
        lookups.make_progress(1);
        match outcome {
            Ok((location, Ok(coordinates))) => {
                if coordinates.is_none() {
                    log::info!("Geocoder doesn't know about {location:?}");
                }
                cache.insert(location.clone(), coordinates);
                geocoded.insert(location, coordinates);
            }
            Ok((location, Err(e))) => {
                log::warn!("Failed to geocode {location:?}: {e:#}");
                geocoded.insert(location, None);
            }
            Err(e) => log::error!("Geocoding task failed: {e}"),
        }
    }
    geocoded
}
