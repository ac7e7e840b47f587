//! Program configuration

use crate::{GlobalArgs, Result};
use anyhow::Context;
use directories::ProjectDirs;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Final process configuration
///
/// This is the result of combining digested [`GlobalArgs`] with platform
/// conventions. Please refer to [`GlobalArgs`] to know more about common
/// fields.
#[allow(missing_docs)]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    pub catalog_url: Box<str>,
    pub mapbox_token: Option<Box<str>>,
    pub news_api_key: Option<Box<str>>,
    pub user: Option<Box<str>>,
    pub json: bool,

    /// Location of the search history database, if one could be determined
    database: Option<PathBuf>,

    /// Location of the geocoding cache, if the platform has a cache directory
    pub geocoding_cache: Option<PathBuf>,
}
//
impl Config {
    /// Determine process configuration from command line arguments
    pub(crate) fn new(args: GlobalArgs) -> Arc<Self> {
        Self::with_dirs(args, ProjectDirs::from("", "", env!("CARGO_PKG_NAME")))
    }

    /// Determine process configuration, given where the platform wants us to
    /// store our files
    fn with_dirs(args: GlobalArgs, dirs: Option<ProjectDirs>) -> Arc<Self> {
        let GlobalArgs {
            catalog_url,
            database,
            mapbox_token,
            news_api_key,
            user,
            json,
        } = args;
        if dirs.is_none() {
            log::warn!("Could not determine the user's data and cache directories");
        }
        let database = database.or_else(|| {
            dirs.as_ref()
                .map(|dirs| dirs.data_dir().join("history.sqlite"))
        });
        let geocoding_cache = dirs
            .as_ref()
            .map(|dirs| dirs.cache_dir().join("geocoding.json"));
        Arc::new(Self {
            catalog_url,
            mapbox_token,
            news_api_key,
            user,
            json,
            database,
            geocoding_cache,
        })
    }

    /// Location of the search history database
    pub fn database(&self) -> Result<&Path> {
        self.database
            .as_deref()
            .context("no default location for the search history database, please use --database")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs {
            catalog_url: "http://localhost/dinosaurs".into(),
            database: None,
            mapbox_token: None,
            news_api_key: Some("key".into()),
            user: Some("alice@example.org".into()),
            json: false,
        }
    }

    #[test]
    fn default_locations() {
        let config = Config::with_dirs(args(), None);
        assert_eq!(config.mapbox_token, None);
        assert_eq!(config.news_api_key.as_deref(), Some("key"));
        assert_eq!(config.user.as_deref(), Some("alice@example.org"));
        assert!(config.database().is_err());
        assert!(config.geocoding_cache.is_none());
    }

    #[test]
    fn explicit_database_wins() {
        let mut args = args();
        args.database = Some("/tmp/history.sqlite".into());
        let config = Config::with_dirs(args, None);
        assert_eq!(config.database().unwrap(), Path::new("/tmp/history.sqlite"));
    }
}
