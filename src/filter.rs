//! Catalog search filters

use crate::{
    catalog::{DinoRecord, Measurement},
    decade::DecadeFilter,
    Result,
};
use anyhow::Context;
use clap::Args;
use reqwest::Url;
use serde::Serialize;

/// Criteria of a catalog search
///
/// Every criterion is optional, and empty criteria are ignored. A record
/// matches if it satisfies all the criteria that are set.
#[derive(Args, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Start of the dinosaur's name (case-insensitive)
    #[arg(short, long)]
    pub name: Option<Box<str>>,

    /// Part of a discovery location, e.g. "USA" (case-insensitive)
    #[arg(short, long)]
    pub found_in: Option<Box<str>>,

    /// Diet, e.g. "herbivorous" (case-insensitive)
    #[arg(short, long)]
    pub diet: Option<Box<str>>,

    /// Length in meters, as listed by the "options" command
    #[arg(short, long)]
    pub length: Option<Box<str>>,

    /// Weight in kilograms, as listed by the "options" command
    #[arg(short, long)]
    pub weight: Option<Box<str>>,

    /// Decade of discovery, e.g. "1900s", or "N/A" for undated dinosaurs
    #[arg(long)]
    pub decade: Option<DecadeFilter>,
}
//
impl SearchFilters {
    /// Names of the query string keys, in canonical order
    const KEYS: [&'static str; 6] = ["name", "foundIn", "diet", "length", "weight", "decade"];

    /// Truth that no criterion is set
    pub fn is_empty(&self) -> bool {
        self.text_criteria().iter().all(Option::is_none) && self.decade.is_none()
    }

    /// Truth that a record satisfies every criterion
    pub fn matches(&self, dino: &DinoRecord) -> bool {
        let [name, found_in, diet, length, weight] = self.text_criteria();
        name.map_or(true, |name| starts_with_ignore_case(&dino.name, name))
            && found_in.map_or(true, |location| contains_ignore_case(&dino.found_in, location))
            && diet.map_or(true, |diet| dino.diet.trim().eq_ignore_ascii_case(diet))
            && length.map_or(true, |length| measurement_matches(&dino.length, length))
            && weight.map_or(true, |weight| measurement_matches(&dino.weight, weight))
            && self.decade.map_or(true, |decade| decade.matches(dino))
    }

    /// Location to show on a search result card, if the search targets one
    pub fn found_in(&self) -> Option<&str> {
        active(&self.found_in)
    }

    /// Canonical query string, as saved in the search history
    pub fn to_query(&self) -> String {
        let mut url = base_url();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in Self::KEYS.into_iter().zip(self.text_criteria()) {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
            if let Some(decade) = self.decade {
                pairs.append_pair("decade", &decade.to_string());
            }
        }
        url.query().unwrap_or_default().to_owned()
    }

    /// Parse a query string produced by [`SearchFilters::to_query()`]
    ///
    /// A leading "?" is tolerated.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut url = base_url();
        url.set_query(Some(query.trim().trim_start_matches('?')));
        let mut filters = Self::default();
        for (key, value) in url.query_pairs() {
            let value: Option<Box<str>> = Some(value.trim().into());
            match &*key {
                "name" => filters.name = value,
                "foundIn" => filters.found_in = value,
                "diet" => filters.diet = value,
                "length" => filters.length = value,
                "weight" => filters.weight = value,
                "decade" => {
                    filters.decade = Some(
                        value
                            .as_deref()
                            .unwrap_or_default()
                            .parse()
                            .with_context(|| format!("parsing the decade of query {query:?}"))?,
                    )
                }
                other => anyhow::bail!("unknown search criterion {other:?} in query {query:?}"),
            }
        }
        Ok(filters)
    }

    /// Active free-text criteria, in canonical order
    fn text_criteria(&self) -> [Option<&str>; 5] {
        [
            active(&self.name),
            active(&self.found_in),
            active(&self.diet),
            active(&self.length),
            active(&self.weight),
        ]
    }
}

/// Records which satisfy every criterion, in catalog order
///
/// Without any criterion, the whole catalog is returned.
pub fn apply<'catalog>(
    filters: &SearchFilters,
    records: &'catalog [DinoRecord],
) -> Vec<&'catalog DinoRecord> {
    let matches = records
        .iter()
        .filter(|dino| filters.matches(dino))
        .collect::<Vec<_>>();
    log::debug!(
        "{} out of {} dinosaurs match {filters:?}",
        matches.len(),
        records.len()
    );
    matches
}

/// Non-empty criterion
fn active(criterion: &Option<Box<str>>) -> Option<&str> {
    criterion
        .as_deref()
        .map(str::trim)
        .filter(|criterion| !criterion.is_empty())
}

/// Dummy URL that hosts search query strings
fn base_url() -> Url {
    Url::parse("dino-dig://search").expect("the search base URL should be valid")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.to_lowercase().starts_with(&prefix.to_lowercase())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Truth that a measurement is the one a user asked for, either spelled the
/// same way or having the same numerical value
fn measurement_matches(measurement: &Measurement, wanted: &str) -> bool {
    measurement.to_string() == wanted
        || wanted
            .parse::<f64>()
            .is_ok_and(|wanted| measurement.value() == Some(wanted))
}
