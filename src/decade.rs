//! Discovery decades, derived from the free-text "named by" attribution

use crate::{catalog::DinoRecord, Result};
use anyhow::Context;
use dialoguer::FuzzySelect;
use serde::{Serialize, Serializer};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// Year of the Gregorian calendar
pub type Year = u16;

/// Extract the publication year from a "named by" attribution
///
/// The year is expected at the end of the string, optionally within
/// parentheses, as in "Marsh (1877)" or "Owen, 1842".
pub fn discovery_year(named_by: &str) -> Option<Year> {
    let last_word = named_by.split_whitespace().last()?;
    let after_paren = last_word.rsplit('(').next()?;
    let year = after_paren.split(')').next()?;
    year.parse().ok()
}

/// Ten-year period, identified by its first year
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Decade(Year);
//
impl Decade {
    /// Decade which a year belongs to
    pub fn of(year: Year) -> Self {
        Self(year - year % 10)
    }

    /// First year of the decade
    pub fn start(self) -> Year {
        self.0
    }

    /// Truth that a year belongs to this decade
    pub fn contains(self, year: Year) -> bool {
        (self.0..self.0.saturating_add(10)).contains(&year)
    }
}
//
impl FromStr for Decade {
    type Err = anyhow::Error;

    /// Accepts "1900s" as well as any year of the decade, judging only by the
    /// first four characters
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let context = || format!("{s:?} does not start with a four-digit year");
        let year = s
            .get(..4)
            .with_context(context)?
            .parse::<Year>()
            .with_context(context)?;
        Ok(Self::of(year))
    }
}
//
impl fmt::Display for Decade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.start())
    }
}

/// Selection of records by discovery decade
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DecadeFilter {
    /// Records named within this decade
    Decade(Decade),

    /// Records whose attribution carries no recognizable year
    Unknown,
}
//
impl DecadeFilter {
    /// Truth that a record belongs to the selected decade
    pub fn matches(self, dino: &DinoRecord) -> bool {
        match (self, discovery_year(&dino.named_by)) {
            (Self::Decade(decade), Some(year)) => decade.contains(year),
            (Self::Unknown, None) => true,
            _ => false,
        }
    }

    /// Filter which a record belongs to
    pub fn of(dino: &DinoRecord) -> Self {
        discovery_year(&dino.named_by).map_or(Self::Unknown, |year| Self::Decade(Decade::of(year)))
    }
}
//
impl FromStr for DecadeFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("unknown") {
            Ok(Self::Unknown)
        } else {
            s.parse().map(Self::Decade)
        }
    }
}
//
impl fmt::Display for DecadeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decade(decade) => fmt::Display::fmt(decade, f),
            Self::Unknown => f.write_str("N/A"),
        }
    }
}
//
impl Serialize for DecadeFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decades that records were named in, oldest first, followed by
/// [`DecadeFilter::Unknown`] if some records can't be dated
pub fn decades<'a>(records: impl IntoIterator<Item = &'a DinoRecord>) -> Vec<DecadeFilter> {
    records
        .into_iter()
        .map(DecadeFilter::of)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Ask the user to pick a decade, or `None` for all dinosaurs
pub fn prompt(options: &[DecadeFilter]) -> dialoguer::Result<Option<DecadeFilter>> {
    let labels = std::iter::once("All dinosaurs".to_owned())
        .chain(options.iter().map(|option| match option {
            DecadeFilter::Decade(decade) => decade.to_string(),
            DecadeFilter::Unknown => "Unknown decade".to_owned(),
        }))
        .collect::<Vec<_>>();
    let choice = FuzzySelect::new()
        .with_prompt("Dig by decade discovered")
        .items(&labels)
        .default(0)
        .max_length(usize::MAX)
        .interact()?;
    Ok(choice.checked_sub(1).map(|idx| options[idx]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use rstest::rstest;

    #[rstest]
    #[case("Marsh (1877)", Some(1877))]
    #[case("Owen, 1842", Some(1842))]
    #[case("Yates, Bonnan, Neveling, Chinsamy and Blackbeard (2009)", Some(2009))]
    #[case("Osborn 1905", Some(1905))]
    #[case("(1999)", Some(1999))]
    #[case("N/A", None)]
    #[case("Smith (18xx)", None)]
    #[case("", None)]
    fn parses_discovery_year(#[case] named_by: &str, #[case] expected: Option<Year>) {
        assert_eq!(discovery_year(named_by), expected);
    }

    #[rstest]
    #[case("1900s", 1900)]
    #[case("1900", 1900)]
    #[case("1877", 1870)]
    #[case(" 2000s ", 2000)]
    fn parses_decade(#[case] input: &str, #[case] start: Year) {
        assert_eq!(input.parse::<Decade>().unwrap().start(), start);
    }

    #[test]
    fn rejects_garbage_decade() {
        assert!("19".parse::<Decade>().is_err());
        assert!("sometime".parse::<DecadeFilter>().is_err());
        assert_eq!("N/A".parse::<DecadeFilter>().unwrap(), DecadeFilter::Unknown);
        assert_eq!("unknown".parse::<DecadeFilter>().unwrap(), DecadeFilter::Unknown);
    }

    #[test]
    fn decade_bounds() {
        let decade = Decade::of(1905);
        assert!(decade.contains(1900));
        assert!(decade.contains(1909));
        assert!(!decade.contains(1910));
        assert!(!decade.contains(1899));
        assert_eq!(decade.to_string(), "1900s");
    }

    #[test]
    fn filters_records() {
        let catalog = fixtures::catalog();
        let nineteen_hundreds: DecadeFilter = "1900s".parse().unwrap();
        let names = |filter: DecadeFilter| {
            catalog
                .records()
                .iter()
                .filter(|dino| filter.matches(dino))
                .map(|dino| &*dino.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(nineteen_hundreds), ["Tyrannosaurus"]);
        assert_eq!(names(DecadeFilter::Unknown), ["Tyrannotitan"]);
    }

    #[test]
    fn lists_decades() {
        let catalog = fixtures::catalog();
        let listed = decades(catalog.records())
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(listed, ["1850s", "1870s", "1900s", "N/A"]);
    }
}
