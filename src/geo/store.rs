//! In-memory lookup over the export and distance datasets
//!
//! Both datasets are loaded once at startup and never mutated afterwards.
//! The two country sets are kept independent: the export dataset is the pool
//! secrets are drawn from, the distance dataset is the pool guesses are
//! measured against. A secret missing from the distance dataset simply yields
//! absent distances for every guess.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Compass direction between two countries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "NE")]
    NorthEast,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "SE")]
    SouthEast,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "SW")]
    SouthWest,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "NW")]
    NorthWest,
}

/// One ranked export category of a country
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub label: String,
    pub value: f64,
}

/// A country and its export records in rank order
#[derive(Debug, Clone)]
struct CountryExports {
    /// Name as it appears in the dataset
    name: String,
    exports: Vec<ExportRecord>,
}

/// Distance and direction from one country to another
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Leg {
    /// Kilometres
    pub distance: Option<f64>,
    pub direction: Option<Direction>,
}

#[derive(Deserialize)]
struct RawExportRecord {
    #[serde(rename = "HS4", alias = "name")]
    label: String,
    #[serde(rename = "Total Trade Value", alias = "value")]
    value: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLeg {
    Distance(f64),
    Full {
        #[serde(default)]
        distance: Option<f64>,
        #[serde(default)]
        direction: Option<Direction>,
    },
}

impl From<RawLeg> for Leg {
    fn from(raw: RawLeg) -> Self {
        match raw {
            RawLeg::Distance(distance) => Leg {
                distance: Some(distance),
                direction: None,
            },
            RawLeg::Full {
                distance,
                direction,
            } => Leg {
                distance,
                direction,
            },
        }
    }
}

type RawExports = BTreeMap<String, Vec<RawExportRecord>>;
type RawDistances = BTreeMap<String, BTreeMap<String, Option<RawLeg>>>;

/// Immutable country dataset
#[derive(Debug)]
pub struct GeoDataStore {
    /// Secret pool, sorted by name
    countries: Vec<CountryExports>,
    /// Case-folded name -> index into `countries`
    export_index: HashMap<String, usize>,
    /// Case-folded from -> case-folded to -> leg
    legs: HashMap<String, HashMap<String, Leg>>,
    /// Guessable names as they appear in the distance dataset, sorted
    guessable: Vec<String>,
}

impl GeoDataStore {
    /// Load both datasets from disk
    pub fn load(exports_path: &Path, distances_path: &Path) -> Result<Self, GeoError> {
        let exports = parse_dataset(exports_path, &read_file(exports_path)?)?;
        let distances = parse_dataset(distances_path, &read_file(distances_path)?)?;

        Ok(Self::from_raw(exports, distances))
    }

    /// Build the store from the raw JSON text of both datasets
    #[cfg(test)]
    pub fn from_json(exports: &str, distances: &str) -> Result<Self, GeoError> {
        let exports = parse_dataset(Path::new("data.json"), exports)?;
        let distances = parse_dataset(Path::new("country_distances.json"), distances)?;

        Ok(Self::from_raw(exports, distances))
    }

    fn from_raw(exports: RawExports, distances: RawDistances) -> Self {
        let mut countries = Vec::with_capacity(exports.len());
        let mut export_index = HashMap::with_capacity(exports.len());

        // Keys are visited in sorted order, so the first spelling wins a case clash
        for (name, records) in exports {
            match export_index.entry(fold(&name)) {
                Entry::Occupied(_) => {
                    warn!(country = %name, "Duplicate country in exports dataset, skipping");
                }
                Entry::Vacant(slot) => {
                    slot.insert(countries.len());
                    countries.push(CountryExports {
                        name,
                        exports: records
                            .into_iter()
                            .map(|r| ExportRecord {
                                label: r.label,
                                value: r.value,
                            })
                            .collect(),
                    });
                }
            }
        }

        let guessable: Vec<String> = distances.keys().cloned().collect();

        let legs = distances
            .into_iter()
            .map(|(from, targets)| {
                let targets = targets
                    .into_iter()
                    .map(|(to, leg)| (fold(&to), leg.map(Leg::from).unwrap_or_default()))
                    .collect();
                (fold(&from), targets)
            })
            .collect();

        Self {
            countries,
            export_index,
            legs,
            guessable,
        }
    }

    /// Ranked export records for a country, matched case-insensitively
    #[allow(dead_code)]
    pub fn exports_for(&self, country: &str) -> Option<&[ExportRecord]> {
        self.export_index
            .get(&fold(country))
            .map(|&idx| self.countries[idx].exports.as_slice())
    }

    /// Distance and direction between two countries.
    ///
    /// Both fields are absent when either name is unknown to the distance
    /// dataset.
    pub fn distance_and_direction(&self, from: &str, to: &str) -> Leg {
        self.legs
            .get(&fold(from))
            .and_then(|targets| targets.get(&fold(to)))
            .copied()
            .unwrap_or_default()
    }

    /// Pick a uniformly random country from the export dataset, with its
    /// ranked export records
    pub fn pick_secret<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&str, &[ExportRecord])> {
        self.countries
            .choose(rng)
            .map(|c| (c.name.as_str(), c.exports.as_slice()))
    }

    /// Countries a player can guess, as named in the distance dataset
    pub fn guessable_countries(&self) -> &[String] {
        &self.guessable
    }

    /// Size of the secret pool
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }
}

/// Case-fold a country name for comparison
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Parse one dataset, rejecting one without countries
fn parse_dataset<V: DeserializeOwned>(
    path: &Path,
    text: &str,
) -> Result<BTreeMap<String, V>, GeoError> {
    let dataset: BTreeMap<String, V> =
        serde_json::from_str(text).map_err(|source| GeoError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if dataset.is_empty() {
        return Err(GeoError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(dataset)
}

fn read_file(path: &Path) -> Result<String, GeoError> {
    fs::read_to_string(path).map_err(|source| GeoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Dataset loading errors
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed dataset {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Dataset {} contains no countries", path.display())]
    Empty { path: PathBuf },
}
