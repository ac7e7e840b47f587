//! Values available to each search filter

use crate::{
    catalog::{DinoRecord, Measurement},
    decade::{self, DecadeFilter},
};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use unicase::UniCase;

/// Every value that each search filter can take on the current catalog
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub found_in: Vec<Box<str>>,
    pub diets: Vec<Box<str>>,
    pub lengths: Vec<f64>,
    pub weights: Vec<f64>,
    pub decades: Vec<DecadeFilter>,
}
//
impl FilterOptions {
    /// Collect filter values from catalog records
    pub fn new(records: &[DinoRecord]) -> Self {
        Self {
            found_in: locations(records),
            diets: diets(records),
            lengths: measurements(records.iter().map(|dino| &dino.length)),
            weights: measurements(records.iter().map(|dino| &dino.weight)),
            decades: decade::decades(records),
        }
    }
}

/// Every distinct discovery location, in alphabetical order
pub fn locations(records: &[DinoRecord]) -> Vec<Box<str>> {
    records
        .iter()
        .flat_map(DinoRecord::locations)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Box::from)
        .collect()
}

/// Every distinct diet, in alphabetical order
///
/// The API is not consistent about capitalization, so diets which only differ
/// by case are merged, keeping the first spelling.
pub fn diets(records: &[DinoRecord]) -> Vec<Box<str>> {
    let mut seen = HashSet::new();
    let mut diets: Vec<Box<str>> = records
        .iter()
        .map(|dino| dino.diet.trim())
        .filter(|diet| !diet.is_empty() && seen.insert(UniCase::new(*diet)))
        .map(Box::from)
        .collect();
    diets.sort_unstable_by(|a, b| UniCase::new(&**a).cmp(&UniCase::new(&**b)));
    diets
}

/// Every distinct known measurement, in increasing order
fn measurements<'a>(measurements: impl Iterator<Item = &'a Measurement>) -> Vec<f64> {
    let mut values = measurements
        .filter_map(Measurement::value)
        .collect::<Vec<_>>();
    values.sort_unstable_by(f64::total_cmp);
    values.dedup();
    values
}
