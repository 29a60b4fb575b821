// src/aggregate/mod.rs
//! Batch price-variance engine.
//!
//! Takes the whole raw observation table and turns it into the processed
//! table in one pass of ordered stages:
//!
//! ```text
//! dedup → quality gate → USD → commute / days-until → country coverage
//!       → journey ids → flight + journey spreads → per-country spreads
//!       → cheapest country → mode cheapest country → savings aggregates
//! ```
//!
//! Every grouped statistic needs the full collection, so nothing here streams.
//! Rates, query date and thresholds come in through [`AggregateContext`].

pub mod identity;
pub mod row;
pub mod stats;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::config::consts::NO_SIGNIFICANT_DIFFERENCE;
use crate::config::AggregateOptions;
use crate::dates::{days_until, minutes_between, to_datetime};
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::record::Observation;

pub use row::{LocalSpread, PriceSpread, ProcessedRow, Savings};

/// Everything the engine needs besides the rows.
#[derive(Clone, Debug)]
pub struct AggregateContext<'a> {
    /// Currency code → USD multiplier.
    pub rates: &'a HashMap<String, f64>,
    pub query_date: NaiveDateTime,
    pub options: &'a AggregateOptions,
}

/// Run every stage over the batch. Fails only when an observed currency has no rate.
pub fn process(
    observations: Vec<Observation>,
    ctx: &AggregateContext,
    mut progress: Option<&mut dyn Progress>,
) -> Result<Vec<ProcessedRow>> {
    let opts = ctx.options;
    let total = observations.len();

    let unique = identity::dedup_observations(observations);
    note(&mut progress, format!("{} duplicate rows dropped", total - unique.len()));

    let priced = quality_gate(unique, opts.price_floor);
    note(&mut progress, format!("{} rows kept after the quality gate", priced.len()));

    let rows = priced
        .into_iter()
        .map(|(obs, price)| price_row(obs, price, ctx))
        .collect::<Result<Vec<_>>>()?;

    let before = rows.len();
    let mut rows = filter_coverage(rows, opts.min_countries);
    note(
        &mut progress,
        format!(
            "{} rows dropped for covering fewer than {} countries",
            before - rows.len(),
            opts.min_countries
        ),
    );

    flight_spreads(&mut rows);
    journey_spreads(&mut rows);
    local_spreads(&mut rows);
    cheapest_flight_location(&mut rows, opts.materiality_pct);
    cheapest_journey_location(&mut rows);

    let mut rng = StdRng::seed_from_u64(opts.seed);
    mode_cheapest_location(&mut rows, &mut rng);
    savings(&mut rows, opts.trim_proportion);

    note(&mut progress, format!("{} processed rows", rows.len()));
    Ok(rows)
}

fn note(progress: &mut Option<&mut dyn Progress>, msg: String) {
    tracing::info!("{msg}");
    if let Some(p) = progress.as_deref_mut() {
        p.log(&msg);
    }
}

/// Drop rows with no currency, country or numeric price, and prices under the floor.
pub fn quality_gate(obs: Vec<Observation>, price_floor: f64) -> Vec<(Observation, f64)> {
    obs.into_iter()
        .filter(|o| !o.meta.currency.trim().is_empty() && !o.meta.country.trim().is_empty())
        .filter_map(|o| {
            let price = o.record.price()?;
            (price >= price_floor).then_some((o, price))
        })
        .collect()
}

pub fn to_usd(price: f64, currency: &str, rates: &HashMap<String, f64>) -> Result<f64> {
    let rate = rates
        .get(currency.trim())
        .ok_or_else(|| Error::MissingRate { currency: s!(currency.trim()) })?;
    Ok(price * rate)
}

/// Stages that only look at one row: USD price, times, flight identity.
fn price_row(observation: Observation, price: f64, ctx: &AggregateContext) -> Result<ProcessedRow> {
    let price_usd = to_usd(price, &observation.meta.currency, ctx.rates)?;
    let r = &observation.record;
    let departure = to_datetime(&r.departure_date);
    let arrival = to_datetime(&r.arrival_date);

    Ok(ProcessedRow {
        flight_id: identity::flight_identity(r),
        route: identity::route(r),
        journey_id: identity::journey_identity(r),
        departure,
        arrival,
        price_usd,
        commute_minutes: departure.zip(arrival).map(|(d, a)| minutes_between(d, a)),
        query_date: ctx.query_date,
        days_until_departure: departure.map(|d| days_until(d, ctx.query_date)),
        observation,
        ..Default::default()
    })
}

/// Row indices grouped by key, groups in key order. Rows keyed `None` join
/// no group.
fn keyed_groups<'a, K: Ord>(
    rows: &'a [ProcessedRow],
    key: impl Fn(&'a ProcessedRow) -> Option<K>,
) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (i, r) in rows.iter().enumerate() {
        if let Some(k) = key(r) {
            groups.entry(k).or_default().push(i);
        }
    }
    groups.into_values().collect()
}

fn index_groups<'a, K: Ord>(
    rows: &'a [ProcessedRow],
    key: impl Fn(&'a ProcessedRow) -> K,
) -> Vec<Vec<usize>> {
    keyed_groups(rows, |r| Some(key(r)))
}

fn journey_groups(rows: &[ProcessedRow]) -> Vec<Vec<usize>> {
    keyed_groups(rows, |r| r.journey_id.as_deref())
}

/// (journey, country) groups.
fn journey_country_groups(rows: &[ProcessedRow]) -> Vec<Vec<usize>> {
    keyed_groups(rows, |r| r.journey_id.as_deref().map(|j| (j, country(r))))
}

fn country(r: &ProcessedRow) -> &str {
    &r.observation.meta.country
}

/// Keep flights seen from at least `min_countries` distinct countries.
pub fn filter_coverage(rows: Vec<ProcessedRow>, min_countries: usize) -> Vec<ProcessedRow> {
    let mut seen: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in &rows {
        seen.entry(r.flight_id.as_str()).or_default().insert(country(r));
    }
    let counts: HashMap<String, usize> = seen
        .into_iter()
        .map(|(id, countries)| (s!(id), countries.len()))
        .collect();

    rows.into_iter()
        .filter_map(|mut r| {
            let n = counts.get(&r.flight_id).copied().unwrap_or(0);
            r.flight_countries = n;
            (n >= min_countries).then_some(r)
        })
        .collect()
}

fn percent(part: f64, whole: f64) -> Option<f64> {
    stats::ratio(part * 100.0, whole)
}

/// Spread of `prices` and the position of `price` inside it.
pub fn spread(prices: &[f64], price: f64) -> PriceSpread {
    let min = stats::min(prices).unwrap_or(price);
    let max = stats::max(prices).unwrap_or(price);
    let rel_spread = percent(max - min, min);
    let rel_diff_to_min = percent(price - min, min);
    PriceSpread {
        min,
        max,
        abs_spread: max - min,
        rel_spread,
        abs_diff_to_min: price - min,
        rel_diff_to_min,
        rel_price_score: rel_diff_to_min
            .zip(rel_spread)
            .and_then(|(d, s)| stats::ratio(d, s)),
    }
}

fn group_spreads(
    rows: &mut [ProcessedRow],
    groups: Vec<Vec<usize>>,
    set: impl Fn(&mut ProcessedRow, PriceSpread),
) {
    for idx in groups {
        let prices: Vec<f64> = idx.iter().map(|&i| rows[i].price_usd).collect();
        for &i in &idx {
            let s = spread(&prices, rows[i].price_usd);
            set(&mut rows[i], s);
        }
    }
}

fn flight_spreads(rows: &mut [ProcessedRow]) {
    let groups = index_groups(rows, |r| r.flight_id.as_str());
    group_spreads(rows, groups, |r, s| r.flight = s);
}

fn journey_spreads(rows: &mut [ProcessedRow]) {
    let groups = journey_groups(rows);
    group_spreads(rows, groups, |r, s| r.journey = Some(s));
}

/// Per (journey, country) range against the journey-wide minimum.
fn local_spreads(rows: &mut [ProcessedRow]) {
    for idx in journey_country_groups(rows) {
        let prices: Vec<f64> = idx.iter().map(|&i| rows[i].price_usd).collect();
        let (Some(min), Some(max)) = (stats::min(&prices), stats::max(&prices)) else {
            continue;
        };
        for &i in &idx {
            let Some(global) = rows[i].journey.map(|j| j.min) else {
                continue;
            };
            rows[i].local = Some(LocalSpread {
                min,
                max,
                abs_spread: max - min,
                rel_spread: percent(max - min, min),
                gap_to_global_min: min - global,
                rel_gap_to_global_min: percent(min - global, global),
            });
        }
    }
}

/// Alphabetically first country quoting the group minimum.
fn cheapest_country(rows: &[ProcessedRow], idx: &[usize], min: f64) -> String {
    idx.iter()
        .map(|&i| &rows[i])
        .filter(|r| r.price_usd == min)
        .map(country)
        .min()
        .map(String::from)
        .unwrap_or_default()
}

fn cheapest_flight_location(rows: &mut [ProcessedRow], materiality_pct: f64) {
    let groups = index_groups(rows, |r| r.flight_id.as_str());
    for idx in groups {
        let flight = rows[idx[0]].flight;
        let material = flight.rel_spread.is_some_and(|s| s >= materiality_pct);
        let label = if material {
            cheapest_country(rows, &idx, flight.min)
        } else {
            s!(NO_SIGNIFICANT_DIFFERENCE)
        };
        for &i in &idx {
            rows[i].cheapest_location_flight = label.clone();
        }
    }
}

fn cheapest_journey_location(rows: &mut [ProcessedRow]) {
    for idx in journey_groups(rows) {
        let Some(journey) = rows[idx[0]].journey else {
            continue;
        };
        let label = cheapest_country(rows, &idx, journey.min);
        for &i in &idx {
            rows[i].cheapest_location_journey = label.clone();
        }
    }
}

/// Most frequent flight-level cheapest label among `idx`. Equal counts are
/// ordered by a seeded shuffle, then a stable sort by count.
fn mode_label(rows: &[ProcessedRow], idx: &[usize], rng: &mut StdRng) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &i in idx {
        *counts.entry(rows[i].cheapest_location_flight.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.shuffle(rng);
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.first().map(|(label, _)| s!(*label)).unwrap_or_default()
}

fn mode_cheapest_location(rows: &mut [ProcessedRow], rng: &mut StdRng) {
    let by_route = index_groups(rows, |r| (r.route.as_str(), country(r)));
    for idx in by_route {
        let label = mode_label(rows, &idx, rng);
        for &i in &idx {
            rows[i].mode_cheapest_location_route = label.clone();
        }
    }

    for idx in journey_country_groups(rows) {
        let label = mode_label(rows, &idx, rng);
        for &i in &idx {
            rows[i].mode_cheapest_location_journey = label.clone();
        }
    }
}

struct Summary {
    mean: Option<f64>,
    trimmed: Option<f64>,
    median: Option<f64>,
}

fn summarize(rows: &[ProcessedRow], idx: &[usize], trim: f64) -> Summary {
    let xs: Vec<f64> = idx.iter().filter_map(|&i| rows[i].flight.rel_diff_to_min).collect();
    Summary {
        mean: stats::mean(&xs),
        trimmed: stats::trim_mean(&xs, trim),
        median: stats::median(&xs),
    }
}

/// Savings of each country over the flight minimum, per journey and per route.
fn savings(rows: &mut [ProcessedRow], trim: f64) {
    for idx in journey_country_groups(rows) {
        let sum = summarize(rows, &idx, trim);
        for &i in &idx {
            let s = &mut rows[i].savings;
            s.journey_mean = sum.mean;
            s.journey_trimmed_mean = sum.trimmed;
            s.journey_median = sum.median;
            s.journey_log_mean = sum.mean.and_then(stats::ln_1p);
        }
    }

    let by_route = index_groups(rows, |r| (r.route.as_str(), country(r)));
    for idx in by_route {
        let sum = summarize(rows, &idx, trim);
        for &i in &idx {
            let s = &mut rows[i].savings;
            s.route_mean = sum.mean;
            s.route_trimmed_mean = sum.trimmed;
            s.route_median = sum.median;
            s.route_log_trimmed_mean = sum.trimmed.and_then(stats::ln_1p);
        }
    }

    for r in rows.iter_mut() {
        let s = &mut r.savings;
        let parts: Vec<f64> = [s.journey_mean, s.route_median].into_iter().flatten().collect();
        s.normalized_mean = stats::mean(&parts);
    }
}
