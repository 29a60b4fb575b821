// src/aggregate/identity.rs
//! Flight and journey identities, and the first-occurrence duplicate drop.

use std::collections::HashSet;

use crate::dates::{format_day, format_stamp, to_datetime};
use crate::record::{FlightRecord, Observation};

/// One priced itinerary as sold: carrier, airports, legs, times and seller.
/// Dates enter in normalized form so token noise does not split a flight.
pub fn flight_identity(r: &FlightRecord) -> String {
    let arrival = format_stamp(to_datetime(&r.arrival_date));
    let departure = format_stamp(to_datetime(&r.departure_date));
    [
        r.airline_code.as_str(),
        r.departure_airport_code.as_str(),
        r.destination_airport_code.as_str(),
        r.flight_pair.as_str(),
        r.last_flight_code.as_str(),
        arrival.as_str(),
        departure.as_str(),
        r.departure_time.as_str(),
        r.selling_airline.as_str(),
        r.arrival_time.as_str(),
        r.first_flight_code.as_str(),
    ]
    .join("-")
}

/// `MAD-LHR`
pub fn route(r: &FlightRecord) -> String {
    join!(r.departure_airport_code.as_str(), "-", &r.destination_airport_code)
}

/// `MAD-LHR: 15-03-2024 16-03-2024`. Only the calendar days count; without
/// both days there is no journey.
pub fn journey_identity(r: &FlightRecord) -> Option<String> {
    let departure = to_datetime(&r.departure_date)?;
    let arrival = to_datetime(&r.arrival_date)?;
    Some(format!(
        "{}: {} {}",
        route(r),
        format_day(Some(departure)),
        format_day(Some(arrival)),
    ))
}

fn duplicate_key(o: &Observation) -> (String, String, String, String) {
    (
        flight_identity(&o.record),
        o.meta.country.clone(),
        o.meta.language.clone(),
        s!(o.record.ticket_price.trim()),
    )
}

/// Keep the first observation of each (flight, country, language, price).
pub fn dedup_observations(obs: Vec<Observation>) -> Vec<Observation> {
    let mut seen = HashSet::new();
    obs.into_iter()
        .filter(|o| seen.insert(duplicate_key(o)))
        .collect()
}
