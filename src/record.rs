// src/record.rs
use std::path::Path;

use crate::error::Result;
use crate::specs::fields::AirportLayout;
use crate::specs::meta::PageMeta;
use crate::store::DataSet;

/// One journey as read out of a search response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlightRecord {
    pub airline_code: String,
    pub departure_airport_code: String,
    pub destination_airport_code: String,
    pub departure_date: Vec<String>,
    pub arrival_date: Vec<String>,
    pub ticket_price: String,
    pub flight_pair: String,
    pub first_flight_code: String,
    pub last_flight_code: String,
    pub selling_airline: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub layout: AirportLayout,
}

impl FlightRecord {
    /// Price as a number; `None` for anything non-numeric.
    pub fn price(&self) -> Option<f64> {
        self.ticket_price
            .replace('"', "")
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
    }
}

/// A record joined with the metadata of the page it came from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observation {
    pub source: String,
    pub record: FlightRecord,
    pub meta: PageMeta,
}

/// `[2024,3,15,8,30]`
pub fn format_span(span: &[String]) -> String {
    join!("[", &span.join(","), "]")
}

pub fn parse_span(cell: &str) -> Vec<String> {
    cell.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|t| t.trim().trim_matches('\'').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn layout_name(layout: AirportLayout) -> &'static str {
    match layout {
        AirportLayout::Primary => "primary",
        AirportLayout::FallbackOffset18 => "fallback18",
    }
}

fn parse_layout(cell: &str) -> AirportLayout {
    match cell {
        "fallback18" => AirportLayout::FallbackOffset18,
        _ => AirportLayout::Primary,
    }
}

impl Observation {
    pub fn headers() -> Vec<String> {
        headers![
            "source_file",
            "airline_code",
            "departure_airport_code",
            "destination_airport_code",
            "departure_date",
            "arrival_date",
            "ticket_price",
            "First_flight",
            "first_flight_code",
            "last_flight_code",
            "selling_airline",
            "departure_time",
            "arrival_time",
            "airport_layout",
            "Detected_Language",
            "Detected_Country",
            "Detected_Currency",
        ]
    }

    pub fn to_row(&self) -> Vec<String> {
        let r = &self.record;
        cells![
            self.source,
            r.airline_code,
            r.departure_airport_code,
            r.destination_airport_code,
            format_span(&r.departure_date),
            format_span(&r.arrival_date),
            r.ticket_price,
            r.flight_pair,
            r.first_flight_code,
            r.last_flight_code,
            r.selling_airline,
            r.departure_time,
            r.arrival_time,
            layout_name(r.layout),
            self.meta.language,
            self.meta.country,
            self.meta.currency,
        ]
    }

    /// Read a raw observation table back. Every column of [`Observation::headers`]
    /// must be present; extra columns are ignored.
    pub fn from_dataset(ds: &DataSet, path: &Path) -> Result<Vec<Observation>> {
        let cols = Self::headers()
            .iter()
            .map(|h| ds.require_column(h, path))
            .collect::<Result<Vec<usize>>>()?;

        let rows = ds.rows.iter().map(|row| {
            let cell = |i: usize| row.get(cols[i]).cloned().unwrap_or_default();
            Observation {
                source: cell(0),
                record: FlightRecord {
                    airline_code: cell(1),
                    departure_airport_code: cell(2),
                    destination_airport_code: cell(3),
                    departure_date: parse_span(&cell(4)),
                    arrival_date: parse_span(&cell(5)),
                    ticket_price: cell(6),
                    flight_pair: cell(7),
                    first_flight_code: cell(8),
                    last_flight_code: cell(9),
                    selling_airline: cell(10),
                    departure_time: cell(11),
                    arrival_time: cell(12),
                    layout: parse_layout(&cell(13)),
                },
                meta: PageMeta {
                    language: cell(14),
                    country: cell(15),
                    currency: cell(16),
                },
            }
        });
        Ok(rows.collect())
    }
}
