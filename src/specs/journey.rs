// src/specs/journey.rs
//! Response splitting and record assembly.
//!
//! ```text
//! response text → unescape → split on `[\"` → LevelMap per journey
//!               → extractors per depth → FlightRecord
//! ```

use crate::config::consts::{JOURNEY_DELIM, LEG_WINDOW};
use crate::config::ExtractOptions;
use crate::core::sanitize::unescape;
use crate::record::FlightRecord;

use super::fields;
use super::tree::LevelMap;

const CARRIER_DEPTH: i32 = 0;
const FARE_DEPTH: i32 = 1;
const PAIR_DEPTH: i32 = 2;
const LEG_DEPTH: i32 = 3;
const LAST_FLIGHT_DEPTH: i32 = 4;

/// Journey fragments of an already unescaped response. The piece before the
/// first delimiter and the piece after the last one are page framing.
pub fn split_journeys(unescaped: &str) -> Vec<&str> {
    let pieces: Vec<&str> = unescaped.split(JOURNEY_DELIM).collect();
    if pieces.len() < 3 {
        return Vec::new();
    }
    pieces[1..pieces.len() - 1].to_vec()
}

/// Synthesize the last-flight depth when the response left it out: the
/// trailing leg of the leg depth, or nothing.
pub fn ensure_last_flight_depth(map: &mut LevelMap) {
    if map.contains(LAST_FLIGHT_DEPTH) {
        return;
    }
    let legs = map.get(LEG_DEPTH);
    let tail = if legs.len() >= LEG_WINDOW {
        legs[legs.len() - LEG_WINDOW..].to_vec()
    } else {
        Vec::new()
    };
    map.insert(LAST_FLIGHT_DEPTH, tail);
}

/// Merge the per-depth extractor outputs into one record.
pub fn assemble(map: &LevelMap, opts: &ExtractOptions) -> FlightRecord {
    let carrier = fields::carrier_and_airports(map.get(CARRIER_DEPTH));
    let fare = fields::fare_and_dates(map.get(FARE_DEPTH), opts);
    let legs = map.get(LEG_DEPTH);
    let times = fields::final_leg_times(legs);

    FlightRecord {
        airline_code: carrier.airline_code,
        departure_airport_code: carrier.departure_code,
        destination_airport_code: carrier.destination_code,
        departure_date: fare.departure_date,
        arrival_date: fare.arrival_date,
        ticket_price: fare.ticket_price,
        flight_pair: fields::flight_pair(map.get(PAIR_DEPTH)),
        first_flight_code: fields::first_flight_code(legs),
        last_flight_code: fields::last_flight_code(map.get(LAST_FLIGHT_DEPTH)),
        selling_airline: fare.selling_airline,
        departure_time: times.departure_time,
        arrival_time: times.arrival_time,
        layout: carrier.layout,
    }
}

pub fn parse_journey(fragment: &str, opts: &ExtractOptions) -> FlightRecord {
    let mut map = LevelMap::parse(fragment);
    // negative depths are tails of the neighbouring journey
    map.remove(-1);
    map.remove(-2);
    ensure_last_flight_depth(&mut map);
    assemble(&map, opts)
}

/// Every journey of one captured response file.
pub fn parse_response(raw: &str, opts: &ExtractOptions) -> Vec<FlightRecord> {
    let text = unescape(raw);
    split_journeys(&text)
        .into_iter()
        .map(|fragment| parse_journey(fragment, opts))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::fields::AirportLayout;

    fn toks(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn split_drops_framing_pieces() {
        let text = r#"head[\"one[\"two[\"tail"#;
        assert_eq!(split_journeys(text), vec!["one", "two"]);
        assert!(split_journeys(r#"head[\"tail"#).is_empty());
        assert!(split_journeys("no delimiter").is_empty());
    }

    #[test]
    fn last_flight_depth_from_leg_tail() {
        let mut m = LevelMap::default();
        m.insert(LEG_DEPTH, toks(&["a", "b", "c", "d", "e", "f"]));
        ensure_last_flight_depth(&mut m);
        assert_eq!(m.get(LAST_FLIGHT_DEPTH), toks(&["b", "c", "d", "e", "f"]).as_slice());

        let mut short = LevelMap::default();
        short.insert(LEG_DEPTH, toks(&["a", "b"]));
        ensure_last_flight_depth(&mut short);
        assert!(short.contains(LAST_FLIGHT_DEPTH));
        assert!(short.get(LAST_FLIGHT_DEPTH).is_empty());

        let mut present = LevelMap::default();
        present.insert(LAST_FLIGHT_DEPTH, toks(&["LH", "1"]));
        present.insert(LEG_DEPTH, toks(&["a", "b", "c", "d", "e"]));
        ensure_last_flight_depth(&mut present);
        assert_eq!(present.get(LAST_FLIGHT_DEPTH), toks(&["LH", "1"]).as_slice());
    }

    // Shaped like one journey of a captured shopping response after unescaping.
    const JOURNEY: &str = concat!(
        r#"x","IB","MAD","LHR","#,
        r#"[x,"Iberia",2024,3,15,8,30,2024,3,16,10,0,129,"#,
        r#"[a,b,c,"IB",d,e,"3166","#,
        r#"[8,null,10,2024-03-15,true,2024-03-16,IB3166,"#,
        r#"["BA","7","#,
        r#"]]]]]"#,
    );

    #[test]
    fn assembles_one_journey() {
        let rec = parse_journey(JOURNEY, &ExtractOptions::default());
        assert_eq!(rec.layout, AirportLayout::Primary);
        assert_eq!(rec.airline_code, "IB");
        assert_eq!(rec.departure_airport_code, "MAD");
        assert_eq!(rec.destination_airport_code, "LHR");
        assert_eq!(rec.selling_airline, "Iberia");
        assert_eq!(rec.ticket_price, "129");
        assert_eq!(rec.departure_date, toks(&["2024", "3", "15", "8", "30"]));
        assert_eq!(rec.arrival_date, toks(&["2024", "3", "16", "10", "0"]));
        assert_eq!(rec.flight_pair, "IB-3166");
        assert_eq!(rec.first_flight_code, "IB3166");
        assert_eq!(rec.last_flight_code, "BA7");
        assert_eq!(rec.departure_time, "8");
        assert_eq!(rec.arrival_time, "10");
    }

    #[test]
    fn garbage_fragment_degrades_to_defaults() {
        let rec = parse_journey("]]]],,[", &ExtractOptions::default());
        assert_eq!(rec.layout, AirportLayout::FallbackOffset18);
        assert!(rec.departure_airport_code.is_empty());
        assert!(rec.departure_date.is_empty());
        assert_eq!(rec.last_flight_code, "missing");
    }

    #[test]
    fn response_is_unescaped_before_splitting() {
        let raw = format!(r#"head[\\\"{}[\\\"tail"#, JOURNEY.replace('"', r#"\""#));
        let recs = parse_response(&raw, &ExtractOptions::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].departure_airport_code, "MAD");
    }
}
