//! Dinosaur catalog from the upstream REST API

use crate::{
    progress::{ProgressConfig, ProgressReport, Work},
    Result,
};
use anyhow::Context;
use futures::stream::StreamExt;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used by the upstream API for unknown images and descriptions
pub const UNKNOWN: &str = "N/A";

/// Description shown in place of a missing one
pub const DEFAULT_DESCRIPTION: &str = "Dinosaurs, awe-inspiring giants from Earth's distant past, \
captivate with their colossal presence. These ancient reptiles roamed diverse ecosystems for \
millions of years, ranging from the towering sauropods to the swift and cunning velociraptors. \
Their fossilized remains unveil a world of remarkable biodiversity, revealing creatures adapted \
for various lifestyles, from herbivores peacefully grazing to ferocious predators hunting their \
prey.";

/// Identifier of a dinosaur record
pub type DinoId = u32;

/// One dinosaur species, as described by the upstream API
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DinoRecord {
    pub id: DinoId,
    pub name: Box<str>,
    pub image_src: Box<str>,
    pub type_of_dinosaur: Box<str>,
    pub length: Measurement,
    pub weight: Measurement,
    pub diet: Box<str>,
    pub when_lived: Box<str>,

    /// Comma-separated list of discovery locations
    pub found_in: Box<str>,

    pub taxonomy: Box<str>,

    /// Naming author(s), usually followed by the publication year
    pub named_by: Box<str>,

    pub type_species: Box<str>,
    pub description: Box<str>,
}
//
impl DinoRecord {
    /// Discovery locations, in the order where the API lists them
    pub fn locations(&self) -> impl Iterator<Item = &str> + '_ {
        self.found_in
            .split(',')
            .map(str::trim)
            .filter(|location| !location.is_empty())
    }

    /// Truth that this record comes with an actual picture
    pub fn has_image(&self) -> bool {
        !self.image_src.contains(UNKNOWN)
    }

    /// Description, or a generic one if the API doesn't have any
    pub fn description_or_default(&self) -> &str {
        if &*self.description == UNKNOWN {
            DEFAULT_DESCRIPTION
        } else {
            &self.description
        }
    }
}

/// Length or weight of a dinosaur
///
/// The API sends numbers when the quantity is known, and free text like "N/A"
/// otherwise.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measurement {
    Known(f64),
    Unknown(Box<str>),
}
//
impl Measurement {
    /// Numerical value, if any
    ///
    /// Free text that happens to hold a number counts as known.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Known(value) => Some(*value),
            Self::Unknown(text) => text.trim().parse::<f64>().ok(),
        };
        value.filter(|value| value.is_finite())
    }
}
//
impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => write!(f, "{value}"),
            Self::Unknown(text) => f.write_str(text),
        }
    }
}

/// Full list of dinosaurs known to the upstream API
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog(Box<[DinoRecord]>);
//
impl Catalog {
    /// Records, in API order
    pub fn records(&self) -> &[DinoRecord] {
        &self.0
    }

    /// Look up a record by identifier
    pub fn find(&self, id: DinoId) -> Option<&DinoRecord> {
        self.0.iter().find(|dino| dino.id == id)
    }

    /// Decode the JSON body of a catalog response
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let records: Vec<DinoRecord> =
            serde_json::from_slice(json).context("decoding the dinosaur catalog")?;
        Ok(Self(records.into()))
    }
}
//
impl From<Vec<DinoRecord>> for Catalog {
    fn from(records: Vec<DinoRecord>) -> Self {
        Self(records.into())
    }
}

/// Download the catalog
pub async fn fetch(client: &reqwest::Client, url: &str, report: &ProgressReport) -> Result<Catalog> {
    // Start the download
    let context = || format!("initiating download of {url}");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(Response::error_for_status)
        .with_context(context)?;

    // Track downloaded bytes, if the server tells us how many to expect
    let bytes = report.add(
        "Downloading the dinosaur catalog",
        ProgressConfig::new(Work::Bytes(0)).allow_adding_work(),
    );
    bytes.add_work(response.content_length().unwrap_or(0));
    bytes.done_adding_work();

    // Collect the body
    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.with_context(|| format!("downloading {url}"))?;
        bytes.make_progress(chunk.len() as u64);
        body.extend_from_slice(&chunk);
    }
    bytes.finish();
    log::debug!("Downloaded {} bytes of catalog data from {url}", body.len());

    let catalog = Catalog::from_json(&body)?;
    log::info!("Catalog lists {} dinosaurs", catalog.records().len());
    Ok(catalog)
}

/// Test fixtures shared by the other modules' tests
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a record with the fields that tests usually care about
    pub fn dino(id: DinoId, name: &str, found_in: &str, diet: &str, named_by: &str) -> DinoRecord {
        DinoRecord {
            id,
            name: name.into(),
            image_src: format!("https://img.example/{id}.jpg").into(),
            type_of_dinosaur: "theropod".into(),
            length: Measurement::Known(12.0),
            weight: Measurement::Known(7000.0),
            diet: diet.into(),
            when_lived: "Late Cretaceous".into(),
            found_in: found_in.into(),
            taxonomy: "Dinosauria".into(),
            named_by: named_by.into(),
            type_species: "rex".into(),
            description: "A big one".into(),
        }
    }

    /// Small catalog covering every filter
    pub fn catalog() -> Catalog {
        let mut stego = dino(2, "Stegosaurus", "USA, Portugal", "herbivorous", "Marsh (1877)");
        stego.length = Measurement::Known(9.0);
        stego.weight = Measurement::Unknown("N/A".into());
        stego.image_src = UNKNOWN.into();
        let mut compy = dino(3, "Compsognathus", "Germany, France", "Carnivorous", "Wagner (1859)");
        compy.length = Measurement::Known(0.65);
        compy.weight = Measurement::Known(3.0);
        let mut mystery = dino(4, "Tyrannotitan", "Argentina", "carnivorous", "N/A");
        mystery.description = UNKNOWN.into();
        vec![
            dino(1, "Tyrannosaurus", "USA, Canada", "carnivorous", "Osborn (1905)"),
            stego,
            compy,
            mystery,
        ]
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_json() {
        let json = br#"[{
            "id": 7,
            "name": "Aardonyx",
            "imageSrc": "https://example.org/aardonyx.jpg",
            "typeOfDinosaur": "prosauropod",
            "length": 8,
            "weight": "N/A",
            "diet": "herbivorous",
            "whenLived": "Early Jurassic, 200-190 million years ago",
            "foundIn": "South Africa, Lesotho ,",
            "taxonomy": "Dinosauria, Saurischia",
            "namedBy": "Yates, Bonnan, Neveling, Chinsamy and Blackbeard (2009)",
            "typeSpecies": "celestae",
            "description": "An early sauropodomorph"
        }]"#;
        let catalog = Catalog::from_json(json).unwrap();
        let dino = catalog.find(7).unwrap();
        assert_eq!(dino.length, Measurement::Known(8.0));
        assert_eq!(dino.weight, Measurement::Unknown("N/A".into()));
        assert_eq!(dino.locations().collect::<Vec<_>>(), ["South Africa", "Lesotho"]);
        assert!(catalog.find(8).is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Catalog::from_json(br#"{"error": "down"}"#).is_err());
    }

    #[test]
    fn measurement_text_form() {
        assert_eq!(Measurement::Known(12.0).to_string(), "12");
        assert_eq!(Measurement::Known(0.25).to_string(), "0.25");
        assert_eq!(Measurement::Unknown("N/A".into()).to_string(), "N/A");
        assert_eq!(Measurement::Unknown(" 4.5 ".into()).value(), Some(4.5));
        assert_eq!(Measurement::Unknown("N/A".into()).value(), None);
    }

    #[test]
    fn placeholders() {
        let catalog = fixtures::catalog();
        let stego = catalog.find(2).unwrap();
        assert!(!stego.has_image());
        let mystery = catalog.find(4).unwrap();
        assert_eq!(mystery.description_or_default(), DEFAULT_DESCRIPTION);
        assert_eq!(catalog.find(1).unwrap().description_or_default(), "A big one");
    }
}
