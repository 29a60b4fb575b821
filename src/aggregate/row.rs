// src/aggregate/row.rs
use chrono::NaiveDateTime;

use crate::dates::{format_day, format_stamp};
use crate::record::Observation;

/// Spread of USD prices inside one group, plus where this row sits in it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PriceSpread {
    pub min: f64,
    pub max: f64,
    pub abs_spread: f64,
    /// Percent of the group minimum.
    pub rel_spread: Option<f64>,
    pub abs_diff_to_min: f64,
    pub rel_diff_to_min: Option<f64>,
    /// `rel_diff_to_min / rel_spread`, in [0, 1]. `None` when nothing varies.
    pub rel_price_score: Option<f64>,
}

/// Prices of one journey as seen from one country, against the journey as a whole.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalSpread {
    pub min: f64,
    pub max: f64,
    pub abs_spread: f64,
    pub rel_spread: Option<f64>,
    pub gap_to_global_min: f64,
    pub rel_gap_to_global_min: Option<f64>,
}

/// Relative-savings aggregates (percent over the flight minimum).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Savings {
    pub journey_mean: Option<f64>,
    pub journey_trimmed_mean: Option<f64>,
    pub journey_median: Option<f64>,
    pub journey_log_mean: Option<f64>,
    pub route_mean: Option<f64>,
    pub route_trimmed_mean: Option<f64>,
    pub route_median: Option<f64>,
    pub route_log_trimmed_mean: Option<f64>,
    pub normalized_mean: Option<f64>,
}

/// One row of the processed table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessedRow {
    pub observation: Observation,
    pub flight_id: String,
    pub departure: Option<NaiveDateTime>,
    pub arrival: Option<NaiveDateTime>,
    pub price_usd: f64,
    pub commute_minutes: Option<f64>,
    pub query_date: NaiveDateTime,
    pub days_until_departure: Option<i64>,
    pub flight_countries: usize,
    pub route: String,
    /// `None` when either date is unreadable; such rows join no journey group.
    pub journey_id: Option<String>,
    pub flight: PriceSpread,
    pub journey: Option<PriceSpread>,
    pub local: Option<LocalSpread>,
    pub cheapest_location_flight: String,
    pub cheapest_location_journey: String,
    pub mode_cheapest_location_route: String,
    pub mode_cheapest_location_journey: String,
    pub savings: Savings,
}

fn num(v: f64) -> String {
    v.to_string()
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

impl ProcessedRow {
    pub fn headers() -> Vec<String> {
        let mut h = Observation::headers();
        h.extend(headers![
            "Flight_ID",
            "Price_in_USD",
            "commute_time",
            "query_date",
            "days_until_departure",
            "FlightID_in_Countries_Count",
            "departure_date_day",
            "arrival_date_day",
            "Journey_route",
            "Journey_ID",
            "max_price_FlightID",
            "min_price_FlightID",
            "max_price_diff_FlightID",
            "max_rel_price_diff_FlightID",
            "abs_diff_to_min_price_FlightID",
            "rel_diff_to_min_price_FlightID",
            "rel_price_score_FlightID",
            "max_price_JourneyID",
            "min_price_JourneyID",
            "max_abs_diff_JourneyID",
            "max_rel_diff_Journey",
            "abs_diff_to_min_price_JourneyID",
            "rel_diff_to_min_price_JourneyID",
            "rel_price_score_JourneyID",
            "Cheapest_Location_Flight",
            "Cheapest_Location_Journey",
            "max_journey_same_country",
            "min_journey_same_country",
            "max_abs_diff_perIDGroup_Journey_same_country",
            "max_rel_diff_perIDGroup_Journey_same_country",
            "price_diff_loc_to_glob_Journey_min",
            "rel_price_diff_loc_to_glob_Journey_min",
            "average_savings_for_Journey_route_in_Detected_Country",
            "Mode_Cheapest_Location_Journey",
            "Mode_Cheapest_Location_JourneyID",
            "mean_savings_for_JourneyID_in_Detected_Country",
            "trimmed_mean_savings_for_JourneyID_in_Detected_Country",
            "log_mean_savings_for_JourneyID_in_Detected_Country",
            "mean_savings_for_Journey_route_in_Detected_Country",
            "trimmed_mean_savings_for_Journey_route_in_Detected_Country",
            "log_mean_savings_for_Journey_route_in_Detected_Country",
            "median_savings_for_Journey_route_country",
            "median_savings_for_JourneyID_country",
            "normalized_mean_savings",
        ]);
        h
    }

    pub fn to_row(&self) -> Vec<String> {
        let mut row = self.observation.to_row();
        // dates leave as normalized stamps
        row[4] = format_stamp(self.departure);
        row[5] = format_stamp(self.arrival);

        let (f, s) = (&self.flight, &self.savings);
        let (j, l) = (self.journey.as_ref(), self.local.as_ref());
        row.extend(cells![
            self.flight_id,
            num(self.price_usd),
            opt(self.commute_minutes),
            format_stamp(Some(self.query_date)),
            opt(self.days_until_departure),
            self.flight_countries,
            format_day(self.departure),
            format_day(self.arrival),
            self.route,
            self.journey_id.clone().unwrap_or_default(),
            num(f.max),
            num(f.min),
            num(f.abs_spread),
            opt(f.rel_spread),
            num(f.abs_diff_to_min),
            opt(f.rel_diff_to_min),
            opt(f.rel_price_score),
            opt(j.map(|j| j.max)),
            opt(j.map(|j| j.min)),
            opt(j.map(|j| j.abs_spread)),
            opt(j.and_then(|j| j.rel_spread)),
            opt(j.map(|j| j.abs_diff_to_min)),
            opt(j.and_then(|j| j.rel_diff_to_min)),
            opt(j.and_then(|j| j.rel_price_score)),
            self.cheapest_location_flight,
            self.cheapest_location_journey,
            opt(l.map(|l| l.max)),
            opt(l.map(|l| l.min)),
            opt(l.map(|l| l.abs_spread)),
            opt(l.and_then(|l| l.rel_spread)),
            opt(l.map(|l| l.gap_to_global_min)),
            opt(l.and_then(|l| l.rel_gap_to_global_min)),
            opt(s.route_mean),
            self.mode_cheapest_location_route,
            self.mode_cheapest_location_journey,
            opt(s.journey_mean),
            opt(s.journey_trimmed_mean),
            opt(s.journey_log_mean),
            opt(s.route_mean),
            opt(s.route_trimmed_mean),
            opt(s.route_log_trimmed_mean),
            opt(s.route_median),
            opt(s.journey_median),
            opt(s.normalized_mean),
        ]);
        row
    }
}
