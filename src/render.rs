//! Human-readable terminal output

use crate::{
    catalog::{Catalog, DinoRecord, Measurement},
    decade::DecadeFilter,
    dig_sites::DigSite,
    filter::SearchFilters,
    news::Article,
    options::FilterOptions,
};
use std::fmt::{self, Write};

/// Width of the text column
const WIDTH: usize = 76;

/// Number of description lines shown on a search result card
const CARD_LINES: usize = 4;

/// Search results, as a list of cards
pub fn cards(results: &[&DinoRecord], filters: &SearchFilters) -> String {
    render(|out| {
        if results.is_empty() {
            return writeln!(out, "No dinosaurs found");
        }
        let plural = if results.len() == 1 { "" } else { "s" };
        writeln!(out, "Discovered {} dinosaur{plural}\n", results.len())?;
        for dino in results {
            let location = filters
                .found_in()
                .or_else(|| dino.locations().next())
                .unwrap_or("unknown location");
            writeln!(out, "{} [{location}]", dino.name)?;
            let mut lines = wrap(dino.description_or_default(), WIDTH - 2);
            if lines.len() > CARD_LINES {
                lines.truncate(CARD_LINES);
                if let Some(last) = lines.last_mut() {
                    last.push_str("...");
                }
            }
            for line in lines {
                writeln!(out, "  {line}")?;
            }
            writeln!(out, "  -> dino-dig show {}\n", dino.id)?;
        }
        Ok(())
    })
}

/// Every detail about one dinosaur
pub fn record(dino: &DinoRecord) -> String {
    let decade = match DecadeFilter::of(dino) {
        DecadeFilter::Decade(decade) => decade.to_string(),
        DecadeFilter::Unknown => "unknown".to_owned(),
    };
    let fields = [
        ("Type", dino.type_of_dinosaur.to_string()),
        ("Length", measurement(&dino.length, "m")),
        ("Weight", measurement(&dino.weight, "kg")),
        ("Diet", dino.diet.to_string()),
        ("When lived", dino.when_lived.to_string()),
        ("Found in", dino.found_in.to_string()),
        ("Taxonomy", dino.taxonomy.to_string()),
        ("Named by", dino.named_by.to_string()),
        ("Decade named", decade),
        ("Type species", dino.type_species.to_string()),
    ];
    render(|out| {
        writeln!(out, "{} (#{})", dino.name, dino.id)?;
        for (label, value) in fields {
            writeln!(out, "  {label:<13}{value}")?;
        }
        if dino.has_image() {
            writeln!(out, "  {:<13}{}", "Picture", dino.image_src)?;
        }
        writeln!(out)?;
        for line in wrap(dino.description_or_default(), WIDTH) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    })
}

/// Measurement with its unit, if it is known
fn measurement(measurement: &Measurement, unit: &str) -> String {
    match measurement.value() {
        Some(_) => format!("{measurement} {unit}"),
        None => measurement.to_string(),
    }
}

/// Values that each search filter can take
pub fn options(options: &FilterOptions) -> String {
    let texts = |values: &[Box<str>]| -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    };
    let numbers = |values: &[f64]| -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    };
    let sections: [(&str, Vec<String>); 5] = [
        ("Locations (--found-in)", texts(&options.found_in)),
        ("Diets (--diet)", texts(&options.diets)),
        ("Lengths in meters (--length)", numbers(&options.lengths)),
        ("Weights in kilograms (--weight)", numbers(&options.weights)),
        (
            "Decades named (--decade)",
            options.decades.iter().map(ToString::to_string).collect(),
        ),
    ];
    render(|out| {
        for (title, values) in sections {
            writeln!(out, "{title}:")?;
            for line in wrap(&values.join(", "), WIDTH - 2) {
                writeln!(out, "  {line}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    })
}

/// Description of the set of dinosaurs whose dig sites are shown
pub fn decade_label(decade: Option<DecadeFilter>) -> String {
    match decade {
        None => "all dinosaurs".to_owned(),
        Some(DecadeFilter::Decade(decade)) => format!("dinosaurs named in the {decade}"),
        Some(DecadeFilter::Unknown) => "dinosaurs named in an unknown decade".to_owned(),
    }
}

/// Dig sites, with their position and showcased dinosaur
pub fn dig_sites(sites: &[DigSite], decade: Option<DecadeFilter>, catalog: &Catalog) -> String {
    render(|out| {
        writeln!(out, "Dig sites of {}\n", decade_label(decade))?;
        if sites.is_empty() {
            return writeln!(out, "No dig site found");
        }
        for site in sites {
            let plural = if site.count == 1 { "" } else { "s" };
            let position = match site.coordinates {
                Some(c) => format!("{:.4}, {:.4}", c.latitude, c.longitude),
                None => "not on the map".to_owned(),
            };
            writeln!(
                out,
                "{} ({position}): {} dinosaur{plural}",
                site.location, site.count
            )?;
            if let Some(dino) = site.showcase.and_then(|id| catalog.find(id)) {
                writeln!(out, "  showcasing {} <{}>", dino.name, dino.image_src)?;
            }
        }
        Ok(())
    })
}

/// Saved searches of a user
pub fn history(user: &str, queries: Option<&[String]>) -> String {
    render(|out| {
        let Some(queries) = queries else {
            return writeln!(out, "No saved search for {user}");
        };
        writeln!(out, "Saved searches of {user}:")?;
        for query in queries {
            writeln!(out, "  dino-dig search --replay '{query}'")?;
        }
        Ok(())
    })
}

/// News headlines
pub fn news(articles: &[Article]) -> String {
    render(|out| {
        if articles.is_empty() {
            return writeln!(out, "No news today");
        }
        for article in articles {
            let title = article.title.as_deref().unwrap_or_default().trim();
            writeln!(out, "{title}")?;
            let source = article.source.as_ref().and_then(|source| source.name.as_deref());
            let date = article
                .published_at
                .as_deref()
                .and_then(|date| date.get(..10));
            match (source, date) {
                (Some(source), Some(date)) => writeln!(out, "  {source}, {date}")?,
                (Some(byline), None) | (None, Some(byline)) => writeln!(out, "  {byline}")?,
                (None, None) => {}
            }
            if let Some(url) = &article.url {
                writeln!(out, "  <{url}>")?;
            }
            writeln!(out)?;
        }
        Ok(())
    })
}

/// Collect the text produced by some formatting code
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // Formatting into a String never fails
    let _ = write(&mut out);
    out
}

/// Greedy word wrapping
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::fixtures, geocode::Coordinates};

    #[test]
    fn wraps_words() {
        assert_eq!(wrap("a bb ccc dddd", 6), ["a bb", "ccc", "dddd"]);
        assert_eq!(wrap("  ", 6), Vec::<String>::new());
        assert_eq!(wrap("unbreakableword", 4), ["unbreakableword"]);
    }

    #[test]
    fn cards_show_searched_location() {
        let catalog = fixtures::catalog();
        let stego = catalog.find(2).unwrap();
        let text = cards(&[stego], &SearchFilters::default());
        assert!(text.starts_with("Discovered 1 dinosaur\n"));
        assert!(text.contains("Stegosaurus [USA]"));
        assert!(text.contains("dino-dig show 2"));

        let filters = SearchFilters {
            found_in: Some("Portugal".into()),
            ..Default::default()
        };
        assert!(cards(&[stego], &filters).contains("Stegosaurus [Portugal]"));
        assert_eq!(cards(&[], &filters), "No dinosaurs found\n");
    }

    #[test]
    fn cards_clamp_descriptions() {
        let mut dino = fixtures::dino(9, "Longus", "Chile", "unknown", "N/A");
        dino.description = "word ".repeat(200).into();
        let text = cards(&[&dino], &SearchFilters::default());
        assert_eq!(text.lines().filter(|line| line.starts_with("  word")).count(), CARD_LINES);
        assert!(text.contains("word..."));
    }

    #[test]
    fn full_record() {
        let catalog = fixtures::catalog();
        let text = record(catalog.find(1).unwrap());
        assert!(text.starts_with("Tyrannosaurus (#1)\n"));
        assert!(text.contains("Decade named 1900s"));
        assert!(text.contains("Length       12 m"));
        let text = record(catalog.find(2).unwrap());
        assert!(text.contains("Length       9 m\n"));
        assert!(text.contains("Weight       N/A\n"));
        assert!(!text.contains("Picture"));
    }

    #[test]
    fn dig_site_listing() {
        let catalog = fixtures::catalog();
        let sites = [
            DigSite {
                location: "USA".into(),
                coordinates: Some(Coordinates {
                    longitude: -98.5,
                    latitude: 39.8,
                }),
                count: 2,
                showcase: Some(1),
            },
            DigSite {
                location: "Atlantis".into(),
                coordinates: None,
                count: 1,
                showcase: None,
            },
        ];
        let text = dig_sites(&sites, Some(DecadeFilter::Unknown), &catalog);
        assert!(text.starts_with("Dig sites of dinosaurs named in an unknown decade"));
        assert!(text.contains("USA (39.8000, -98.5000): 2 dinosaurs"));
        assert!(text.contains("showcasing Tyrannosaurus"));
        assert!(text.contains("Atlantis (not on the map): 1 dinosaur\n"));
    }

    #[test]
    fn history_listing() {
        assert_eq!(history("a@b.c", None), "No saved search for a@b.c\n");
        let queries = ["name=Tyr".to_owned()];
        assert!(history("a@b.c", Some(&queries)).contains("--replay 'name=Tyr'"));
    }
}
