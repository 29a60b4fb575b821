// src/predict.rs
//! The prediction seam: features of one trip in, cheapest country and
//! expected savings out.
//!
//! Trained models live outside this crate. They plug in through
//! [`Classifier`] and [`Regressor`]; [`LookupModel`] is the in-crate stand-in
//! built straight from a processed table.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::NaiveDate;

use crate::config::consts::NO_SIGNIFICANT_DIFFERENCE;
use crate::error::{Error, Result};
use crate::store::DataSet;

pub const FEATURE_COLUMNS: [&str; 4] = [
    "departure_airport_code",
    "destination_airport_code",
    "Detected_Country",
    "days_until_departure",
];

/// What a model is trained to predict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Target {
    /// Country where the route is most often cheapest.
    Classification,
    /// Normalized mean savings, percent.
    Regression,
}

impl Target {
    pub fn column(self) -> &'static str {
        match self {
            Target::Classification => "Mode_Cheapest_Location_Journey",
            Target::Regression => "normalized_mean_savings",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Features {
    pub departure_code: String,
    pub destination_code: String,
    pub country: String,
    pub days_until_departure: i64,
}

impl Features {
    /// Features for a round trip asked about on `today`.
    pub fn for_trip(
        departure_code: &str,
        destination_code: &str,
        country: &str,
        depart: NaiveDate,
        return_on: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self> {
        if depart < today {
            return Err(Error::InvalidInput(format!("departure {depart} is in the past")));
        }
        if return_on < depart {
            return Err(Error::InvalidInput(format!(
                "return {return_on} is before departure {depart}"
            )));
        }
        Ok(Self {
            departure_code: departure_code.trim().to_ascii_uppercase(),
            destination_code: destination_code.trim().to_ascii_uppercase(),
            country: s!(country.trim()),
            days_until_departure: (depart - today).num_days(),
        })
    }
}

pub trait Classifier {
    fn classify(&self, features: &Features) -> String;
}

pub trait Regressor {
    fn regress(&self, features: &Features) -> f64;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub cheapest_location: String,
    /// Expected savings in percent; 0 when no country stands out.
    pub savings_pct: f64,
}

impl Prediction {
    pub fn has_difference(&self) -> bool {
        self.cheapest_location != NO_SIGNIFICANT_DIFFERENCE
    }
}

/// Classify first; the regressor only runs when a country stands out.
pub fn predict(classifier: &dyn Classifier, regressor: &dyn Regressor, features: &Features) -> Prediction {
    let cheapest_location = classifier.classify(features);
    let savings_pct = if cheapest_location == NO_SIGNIFICANT_DIFFERENCE {
        0.0
    } else {
        regressor.regress(features)
    };
    Prediction { cheapest_location, savings_pct }
}

type Key = (String, String, String);

fn key(dep: &str, dest: &str, country: &str) -> Key {
    (s!(dep.trim()), s!(dest.trim()), s!(country.trim()))
}

/// Per (departure, destination, country): the most frequent route-level
/// cheapest country (ties alphabetical) and the mean normalized savings.
#[derive(Clone, Debug, Default)]
pub struct LookupModel {
    labels: HashMap<Key, String>,
    savings: HashMap<Key, f64>,
}

impl LookupModel {
    pub fn from_table(ds: &DataSet, path: &Path) -> Result<Self> {
        let dep = ds.require_column(FEATURE_COLUMNS[0], path)?;
        let dest = ds.require_column(FEATURE_COLUMNS[1], path)?;
        let country = ds.require_column(FEATURE_COLUMNS[2], path)?;
        let label = ds.require_column(Target::Classification.column(), path)?;
        let target = ds.require_column(Target::Regression.column(), path)?;

        let mut counts: HashMap<Key, BTreeMap<String, usize>> = HashMap::new();
        let mut sums: HashMap<Key, (f64, usize)> = HashMap::new();
        for row in &ds.rows {
            let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
            let k = key(cell(dep), cell(dest), cell(country));

            let l = cell(label).trim();
            if !l.is_empty() {
                *counts.entry(k.clone()).or_default().entry(s!(l)).or_default() += 1;
            }
            if let Ok(v) = cell(target).trim().parse::<f64>() {
                if v.is_finite() {
                    let e = sums.entry(k).or_default();
                    e.0 += v;
                    e.1 += 1;
                }
            }
        }

        let labels = counts
            .into_iter()
            .filter_map(|(k, by_label)| {
                by_label
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                    .map(|(l, _)| (k, l))
            })
            .collect();
        let savings = sums
            .into_iter()
            .map(|(k, (sum, n))| (k, sum / n as f64))
            .collect();

        tracing::info!("lookup model built from {} rows", ds.rows.len());
        Ok(Self { labels, savings })
    }

    fn lookup(f: &Features) -> Key {
        key(&f.departure_code, &f.destination_code, &f.country)
    }
}

impl Classifier for LookupModel {
    fn classify(&self, features: &Features) -> String {
        self.labels
            .get(&Self::lookup(features))
            .cloned()
            .unwrap_or_else(|| s!(NO_SIGNIFICANT_DIFFERENCE))
    }
}

impl Regressor for LookupModel {
    fn regress(&self, features: &Features) -> f64 {
        self.savings.get(&Self::lookup(features)).copied().unwrap_or(0.0)
    }
}

/// The model input frame: the feature columns followed by the target.
pub fn training_frame(ds: &DataSet, target: Target, path: &Path) -> Result<DataSet> {
    let mut columns = FEATURE_COLUMNS.to_vec();
    columns.push(target.column());
    ds.project(&columns, path)
}
