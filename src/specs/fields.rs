// src/specs/fields.rs
//! Positional field extractors.
//!
//! Each extractor reads one depth of a [`LevelMap`](super::tree::LevelMap) by
//! position and returns a small typed struct. The offsets follow the shape of
//! the captured responses; when a position is missing the field comes back
//! empty instead of failing the journey.

use crate::config::consts::{
    FALLBACK_CARRIER_OFFSET, LEG_WINDOW, MISSING, PLACEHOLDER_TOKENS, PRIMARY_CARRIER_OFFSET,
};
use crate::config::ExtractOptions;
use crate::core::sanitize::{clean_code, is_flight_code, unquote};

/// Token at `i`, or "" past the end.
fn at(tokens: &[String], i: usize) -> &str {
    tokens.get(i).map(String::as_str).unwrap_or("")
}

/* ---------------- Carrier & airports (depth 0) ---------------- */

/// Which offset triple the carrier/airport codes were read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AirportLayout {
    #[default]
    Primary,
    FallbackOffset18,
}

impl AirportLayout {
    pub fn offset(self) -> usize {
        match self {
            AirportLayout::Primary => PRIMARY_CARRIER_OFFSET,
            AirportLayout::FallbackOffset18 => FALLBACK_CARRIER_OFFSET,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarrierAirports {
    pub airline_code: String,
    pub departure_code: String,
    pub destination_code: String,
    pub layout: AirportLayout,
}

impl CarrierAirports {
    fn read(tokens: &[String], layout: AirportLayout) -> Self {
        let o = layout.offset();
        Self {
            airline_code: clean_code(at(tokens, o)),
            departure_code: clean_code(at(tokens, o + 1)),
            destination_code: clean_code(at(tokens, o + 2)),
            layout,
        }
    }
}

/// Decide which layout the depth-0 list uses.
pub fn airport_layout(tokens: &[String]) -> AirportLayout {
    let departure = clean_code(at(tokens, PRIMARY_CARRIER_OFFSET + 1));
    if departure.chars().count() == 3 {
        AirportLayout::Primary
    } else {
        AirportLayout::FallbackOffset18
    }
}

pub fn carrier_and_airports(tokens: &[String]) -> CarrierAirports {
    CarrierAirports::read(tokens, airport_layout(tokens))
}

/* ---------------- Fare & date spans (depth 1) ---------------- */

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FareSpan {
    pub selling_airline: String,
    pub ticket_price: String,
    pub departure_date: Vec<String>,
    pub arrival_date: Vec<String>,
}

/// Positions of 4-digit tokens inside the configured year window.
pub fn year_anchors(tokens: &[String], opts: &ExtractOptions) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit()))
        .filter(|(_, t)| t.parse::<i32>().is_ok_and(|y| opts.accepts_year(y)))
        .map(|(i, _)| i)
        .collect()
}

/// The first two year anchors start the departure and arrival spans; both
/// spans are as long as the distance between the anchors.
pub fn fare_and_dates(tokens: &[String], opts: &ExtractOptions) -> FareSpan {
    let anchors = year_anchors(tokens, opts);
    let (departure_date, arrival_date) = match anchors.as_slice() {
        &[first, second, ..] => {
            let len = second - first;
            let end = (second + len).min(tokens.len());
            (tokens[first..second].to_vec(), tokens[second..end].to_vec())
        }
        _ => (Vec::new(), Vec::new()),
    };

    FareSpan {
        selling_airline: unquote(at(tokens, 1)),
        ticket_price: tokens.last().cloned().unwrap_or_default(),
        departure_date,
        arrival_date,
    }
}

/* ---------------- Flight pair (depth 2) ---------------- */

/// `<code at 3>-<code at 6>`; missing positions read as empty, so a bare
/// depth gives `-`.
pub fn flight_pair(tokens: &[String]) -> String {
    let a = clean_code(at(tokens, 3));
    let b = clean_code(at(tokens, 6));
    join!(&a, "-", &b)
}

/* ---------------- Legs (depth 3) ---------------- */

/// One leg: `[departure_time, arrival_time, departure_date, arrival_date, airline_info]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegWindow {
    pub departure_time: String,
    pub arrival_time: String,
    pub departure_date: String,
    pub arrival_date: String,
    pub airline_info: String,
}

impl LegWindow {
    fn from_chunk(chunk: &[String]) -> Self {
        Self {
            departure_time: chunk[0].replace(',', ":"),
            arrival_time: chunk[1].replace(',', ":"),
            departure_date: chunk[2].clone(),
            arrival_date: chunk[3].clone(),
            airline_info: chunk[4].clone(),
        }
    }
}

/// Drop `null`/`true` placeholders and any trailing partial leg.
pub fn drop_placeholders(tokens: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = tokens
        .iter()
        .filter(|t| !PLACEHOLDER_TOKENS.contains(&t.as_str()))
        .cloned()
        .collect();
    kept.truncate(kept.len() - kept.len() % LEG_WINDOW);
    kept
}

pub fn leg_windows(tokens: &[String]) -> Vec<LegWindow> {
    drop_placeholders(tokens)
        .chunks_exact(LEG_WINDOW)
        .map(LegWindow::from_chunk)
        .collect()
}

/// Departure/arrival clock time carried into the record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegTimes {
    pub departure_time: String,
    pub arrival_time: String,
}

/// Times of the last complete leg. Earlier legs are not kept.
pub fn final_leg_times(tokens: &[String]) -> LegTimes {
    leg_windows(tokens)
        .pop()
        .map(|w| LegTimes { departure_time: w.departure_time, arrival_time: w.arrival_time })
        .unwrap_or_default()
}

/// First carrier+number token of the filtered leg list, glued to the token after it.
pub fn first_flight_code(tokens: &[String]) -> String {
    let legs = drop_placeholders(tokens);
    for (i, t) in legs.iter().enumerate() {
        let code = unquote(t);
        if is_flight_code(&code) {
            let next = legs.get(i + 1).map(|n| unquote(n)).unwrap_or_default();
            return join!(&code, &next);
        }
    }
    s!()
}

/* ---------------- Last flight (depth 4) ---------------- */

pub fn last_flight_code(tokens: &[String]) -> String {
    match tokens {
        [a, b, ..] => join!(&unquote(a), &unquote(b)),
        _ => s!(MISSING),
    }
}
