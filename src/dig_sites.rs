//! Aggregation of discovery locations into dig sites

use crate::{
    catalog::{DinoId, DinoRecord},
    geocode::{Coordinates, Geocoded},
};
use serde::Serialize;
use std::collections::{hash_map, HashMap, HashSet};

/// Place where fossils were found
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DigSite {
    /// Location name, as spelled in the catalog
    pub location: Box<str>,

    /// Position on the map, if the location could be geocoded
    pub coordinates: Option<Coordinates>,

    /// Number of dinosaurs found there
    pub count: usize,

    /// Dinosaur whose picture represents this site, if any is available
    pub showcase: Option<DinoId>,
}

/// Group the discovery locations of some dinosaurs into dig sites
///
/// Sites are listed in order of first appearance in the records. Showcase
/// dinosaurs are picked so that no picture is used twice.
pub fn dig_sites<'a>(
    records: impl IntoIterator<Item = &'a DinoRecord> + Clone,
    geocoded: &Geocoded,
) -> Vec<DigSite> {
    let mut sites = aggregate(records.clone(), geocoded);
    pick_showcases(&mut sites, records);
    sites
}

/// Count dinosaurs per location, in order of first appearance
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a DinoRecord>,
    geocoded: &Geocoded,
) -> Vec<DigSite> {
    let mut sites = Vec::<DigSite>::new();
    let mut site_indices = HashMap::<&str, usize>::new();
    for dino in records {
        for location in dino.locations() {
            match site_indices.entry(location) {
                hash_map::Entry::Occupied(o) => sites[*o.get()].count += 1,
                hash_map::Entry::Vacant(v) => {
                    v.insert(sites.len());
                    sites.push(DigSite {
                        location: location.into(),
                        coordinates: geocoded.get(location).copied().flatten(),
                        count: 1,
                        showcase: None,
                    });
                }
            }
        }
    }
    log::debug!("Aggregated discovery locations into {} dig sites", sites.len());
    sites
}

/// Pick a showcase dinosaur for each site
///
/// Each site gets, by order of preference, the first dinosaur found there
/// whose picture isn't used yet, or failing that any dinosaur whose picture
/// isn't used yet. Dinosaurs without a picture are never picked.
pub fn pick_showcases<'a>(
    sites: &mut [DigSite],
    records: impl IntoIterator<Item = &'a DinoRecord>,
) {
    let candidates = records
        .into_iter()
        .filter(|dino| dino.has_image())
        .collect::<Vec<_>>();
    let mut used_images = HashSet::<&str>::new();
    for site in sites {
        let unused = |dino: &&&DinoRecord| !used_images.contains(&*dino.image_src);
        let showcase = candidates
            .iter()
            .filter(unused)
            .find(|dino| dino.locations().any(|location| location == &*site.location))
            .or_else(|| candidates.iter().find(unused));
        site.showcase = showcase.map(|dino| {
            used_images.insert(&dino.image_src);
            dino.id
        });
        if site.showcase.is_none() {
            log::debug!("No picture left to showcase {}", site.location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{fixtures, UNKNOWN};

    #[test]
    fn counts_per_location() {
        let catalog = fixtures::catalog();
        let mut geocoded = Geocoded::new();
        let usa = Coordinates {
            longitude: -98.5,
            latitude: 39.8,
        };
        geocoded.insert("USA".into(), Some(usa));
        geocoded.insert("Canada".into(), None);

        let sites = aggregate(catalog.records(), &geocoded);
        let summary = sites
            .iter()
            .map(|site| (&*site.location, site.count))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            [
                ("USA", 2),
                ("Canada", 1),
                ("Portugal", 1),
                ("Germany", 1),
                ("France", 1),
                ("Argentina", 1)
            ]
        );
        assert_eq!(sites[0].coordinates, Some(usa));
        assert_eq!(sites[1].coordinates, None);
        assert_eq!(sites[2].coordinates, None);
    }

    #[test]
    fn showcases_avoid_reusing_pictures() {
        let catalog = fixtures::catalog();
        let sites = dig_sites(catalog.records(), &Geocoded::new());
        let showcases = sites
            .iter()
            .map(|site| (&*site.location, site.showcase))
            .collect::<Vec<_>>();
        // Stegosaurus has no picture, so Portugal borrows an unused one
        assert_eq!(
            showcases,
            [
                ("USA", Some(1)),
                ("Canada", Some(3)),
                ("Portugal", Some(4)),
                ("Germany", None),
                ("France", None),
                ("Argentina", None)
            ]
        );
    }

    #[test]
    fn shared_pictures_count_once() {
        let mut first = fixtures::dino(1, "A", "Spain", "unknown", "N/A");
        let mut second = fixtures::dino(2, "B", "Spain, Chile", "unknown", "N/A");
        first.image_src = "https://img.example/same.jpg".into();
        second.image_src = first.image_src.clone();
        let mut blank = fixtures::dino(3, "C", "Chile", "unknown", "N/A");
        blank.image_src = UNKNOWN.into();
        let records = [first, second, blank];

        let sites = dig_sites(&records, &Geocoded::new());
        assert_eq!(sites[0].showcase, Some(1));
        assert_eq!(sites[1].showcase, None);
    }
}
