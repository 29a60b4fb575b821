// tests/pipeline_e2e.rs
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use fare_scrape::aggregate::{self, AggregateContext, ProcessedRow};
use fare_scrape::config::consts::NO_SIGNIFICANT_DIFFERENCE;
use fare_scrape::config::{AggregateOptions, ExtractOptions, PipelineConfig};
use fare_scrape::convert::{convert_dir, Skip};
use fare_scrape::dates::parse_query_date;
use fare_scrape::file::write_table_to;
use fare_scrape::predict::{self, Features, LookupModel, Target};
use fare_scrape::progress::Progress;
use fare_scrape::record::Observation;
use fare_scrape::store::{load_table, DataSet};

const COUNTRIES: [&str; 7] = ["Austria", "Brazil", "Chile", "Denmark", "Egypt", "France", "Germany"];

/// One journey fragment as it reads after unescaping.
fn journey(minute: u32, leg: &str, price: u32) -> String {
    format!(
        concat!(
            r#"x","IB","MAD","LHR","#,
            r#"[x,"Iberia",2024,3,15,8,{minute},2024,3,15,10,45,{price},"#,
            r#"[a,b,c,"IB",d,e,"3166","#,
            r#"[8,null,10,2024-03-15,true,2024-03-15,{leg},"#,
            r#"["BA","7","#,
            r#"]]]]]"#,
        ),
        minute = minute,
        leg = leg,
        price = price,
    )
}

/// Escaped response text holding the given journeys.
fn response(journeys: &[String]) -> String {
    let delim = r#"[\\\""#;
    let mut s = format!("head{delim}");
    for j in journeys {
        s.push_str(&j.replace('"', r#"\""#));
        s.push_str(delim);
    }
    s.push_str("tail");
    s
}

fn page(spans: &[&str]) -> String {
    let body: String = spans
        .iter()
        .map(|t| format!(r#"<span class="twocKe">{t}</span>"#))
        .collect();
    format!("<html><body><footer>{body}</footer></body></html>")
}

/// Seven vantage countries. Austria pays in EUR. Brazil is cheapest for
/// IB3166 (Austria's 100 EUR is 108 USD); IB9 costs the same everywhere it is
/// priced in USD; LH1 is only seen from three countries.
fn write_captures(root: &Path) {
    let responses = root.join("responses");
    let pages = root.join("pages");
    fs::create_dir_all(&responses).unwrap();
    fs::create_dir_all(&pages).unwrap();

    for (i, country) in COUNTRIES.iter().enumerate() {
        let cheap = match *country {
            "Austria" | "Brazil" => 100,
            _ => 120,
        };
        let mut journeys = vec![journey(30, "IB3166", cheap), journey(45, "IB9", 200)];
        if i < 3 {
            journeys.push(journey(0, "LH1", 150 + i as u32));
        }
        let currency = if *country == "Austria" { "EUR" } else { "USD" };
        fs::write(responses.join(format!("{country}.json")), response(&journeys)).unwrap();
        fs::write(pages.join(format!("{country}.html")), page(&["English", *country, currency])).unwrap();
    }

    // no page
    fs::write(responses.join("Zambia.json"), response(&[journey(30, "IB3166", 90)])).unwrap();
    // page without the currency span
    fs::write(responses.join("Yemen.json"), response(&[journey(30, "IB3166", 90)])).unwrap();
    fs::write(pages.join("Yemen.html"), page(&["English", "Yemen"])).unwrap();
}

#[derive(Default)]
struct Recorder {
    total: usize,
    done: Vec<String>,
    skipped: Vec<String>,
    finished: bool,
}

impl Progress for Recorder {
    fn begin(&mut self, total: usize) {
        self.total = total;
    }
    fn item_done(&mut self, name: &str, _records: usize) {
        self.done.push(name.to_string());
    }
    fn item_skipped(&mut self, name: &str, _reason: &str) {
        self.skipped.push(name.to_string());
    }
    fn finish(&mut self) {
        self.finished = true;
    }
}

fn rates() -> HashMap<String, f64> {
    HashMap::from([("USD".to_string(), 1.0), ("EUR".to_string(), 1.08)])
}

fn process(observations: Vec<Observation>) -> Vec<ProcessedRow> {
    let rates = rates();
    let options = AggregateOptions::default();
    let ctx = AggregateContext {
        rates: &rates,
        query_date: parse_query_date("2024-03-01").unwrap(),
        options: &options,
    };
    aggregate::process(observations, &ctx, None).unwrap()
}

fn processed_table(rows: &[ProcessedRow]) -> DataSet {
    DataSet::new(ProcessedRow::headers(), rows.iter().map(ProcessedRow::to_row).collect())
}

#[test]
fn convert_reports_skips_and_keeps_file_order() {
    let dir = tempfile::tempdir().unwrap();
    write_captures(dir.path());

    let mut rec = Recorder::default();
    let conversion = convert_dir(
        &dir.path().join("responses"),
        &dir.path().join("pages"),
        &ExtractOptions::default(),
        Some(&mut rec),
    )
    .unwrap();

    assert_eq!(conversion.files_read, 7);
    assert_eq!(conversion.observations.len(), 7 * 2 + 3);
    assert_eq!(
        conversion.skipped,
        vec![
            ("Yemen".to_string(), Skip::Metadata("Invalid input: expected 3 metadata spans, found 2".to_string())),
            ("Zambia.json".to_string(), Skip::NoPage),
        ]
    );

    let sources: Vec<_> = conversion.observations.iter().map(|o| o.source.as_str()).collect();
    let mut sorted = sources.clone();
    sorted.sort();
    assert_eq!(sources, sorted);

    assert_eq!(rec.total, 8);
    assert_eq!(rec.done.len(), 7);
    assert_eq!(rec.skipped.len(), 2);
    assert!(rec.finished);

    let first = &conversion.observations[0];
    assert_eq!(first.meta.currency, "EUR");
    assert_eq!(first.record.first_flight_code, "IB3166");
    assert_eq!(first.record.last_flight_code, "BA7");
}

#[test]
fn raw_table_reads_back_through_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_captures(dir.path());
    let conversion = convert_dir(
        &dir.path().join("responses"),
        &dir.path().join("pages"),
        &ExtractOptions::default(),
        None,
    )
    .unwrap();

    let raw = conversion.to_dataset();
    let path = dir.path().join("raw.csv");
    write_table_to(&path, raw.headers.as_deref(), &raw.rows, ',').unwrap();

    let back = load_table(&path, ',').unwrap();
    let observations = Observation::from_dataset(&back, &path).unwrap();
    assert_eq!(observations, conversion.observations);
}

#[test]
fn end_to_end_price_variance() {
    let dir = tempfile::tempdir().unwrap();
    write_captures(dir.path());
    let conversion = convert_dir(
        &dir.path().join("responses"),
        &dir.path().join("pages"),
        &ExtractOptions::default(),
        None,
    )
    .unwrap();

    let rows = process(conversion.observations);

    // LH1 was seen from three countries only
    assert_eq!(rows.len(), 14);
    assert!(rows.iter().all(|r| r.flight_countries == 7));
    assert!(rows.iter().all(|r| r.observation.record.first_flight_code != "LH1"));

    // same route and days, different minute and leg code
    let ib3166 = rows.iter().find(|r| r.observation.record.first_flight_code == "IB3166").unwrap();
    let ib9 = rows.iter().find(|r| r.observation.record.first_flight_code == "IB9").unwrap();
    assert_eq!(ib3166.journey_id.as_deref(), Some("MAD-LHR: 15-03-2024 15-03-2024"));
    assert_eq!(ib3166.journey_id, ib9.journey_id);
    assert_ne!(ib3166.flight_id, ib9.flight_id);

    // Austria's EUR fare
    assert!((ib3166.price_usd - 108.0).abs() < 1e-9);
    assert_eq!(ib3166.flight.min, 100.0);
    assert_eq!(ib3166.flight.max, 120.0);
    assert_eq!(ib3166.flight.rel_spread, Some(20.0));
    assert_eq!(ib3166.cheapest_location_flight, "Brazil");
    assert_eq!(ib3166.commute_minutes, Some(135.0));
    assert_eq!(ib3166.days_until_departure, Some(14));

    // IB9: 200 everywhere but 216 from Austria
    assert_eq!(ib9.cheapest_location_flight, "Brazil");
    assert_eq!(ib9.journey.map(|j| j.min), Some(100.0));
    assert_eq!(ib9.cheapest_location_journey, "Brazil");

    for r in &rows {
        assert_eq!(r.mode_cheapest_location_route, "Brazil");
        assert_ne!(r.cheapest_location_flight, NO_SIGNIFICANT_DIFFERENCE);
    }

    let brazil = rows.iter().find(|r| r.observation.meta.country == "Brazil").unwrap();
    assert_eq!(brazil.savings.journey_mean, Some(0.0));
    assert_eq!(brazil.savings.normalized_mean, Some(0.0));
    assert_eq!(brazil.local.map(|l| l.gap_to_global_min), Some(0.0));
}

#[test]
fn unmapped_currency_stops_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_captures(dir.path());
    fs::write(
        dir.path().join("pages/Chile.html"),
        page(&["Español", "Chile", "CLP"]),
    )
    .unwrap();
    let conversion = convert_dir(
        &dir.path().join("responses"),
        &dir.path().join("pages"),
        &ExtractOptions::default(),
        None,
    )
    .unwrap();

    let rates = rates();
    let options = AggregateOptions::default();
    let ctx = AggregateContext {
        rates: &rates,
        query_date: parse_query_date("2024-03-01").unwrap(),
        options: &options,
    };
    let err = aggregate::process(conversion.observations, &ctx, None).unwrap_err();
    assert!(err.to_string().contains("'CLP'"));
}

#[test]
fn config_file_drives_processing_and_prediction() {
    let dir = tempfile::tempdir().unwrap();
    write_captures(dir.path());
    fs::write(dir.path().join("rates.json"), r#"{"USD": 1.0, "EUR": 1.08}"#).unwrap();
    fs::write(
        dir.path().join("config.json"),
        r#"{
            "data_configurations": {
                "capture_run.csv": {"conversion_rate_file": "rates.json", "query_date": "2024-03-01"}
            },
            "aggregate": {"min_countries": 7}
        }"#,
    )
    .unwrap();

    let cfg = PipelineConfig::load(&dir.path().join("config.json")).unwrap();
    let entry = cfg.dataset("capture_run.csv").unwrap();
    let rates = cfg.load_rates(entry).unwrap();
    let conversion = convert_dir(
        &dir.path().join("responses"),
        &dir.path().join("pages"),
        &cfg.extract,
        None,
    )
    .unwrap();
    let ctx = AggregateContext {
        rates: &rates,
        query_date: parse_query_date(&entry.query_date).unwrap(),
        options: &cfg.aggregate,
    };
    let rows = aggregate::process(conversion.observations, &ctx, None).unwrap();

    let table = processed_table(&rows);
    let path = dir.path().join("Processed_capture_run.csv");
    write_table_to(&path, table.headers.as_deref(), &table.rows, ',').unwrap();
    let table = load_table(&path, ',').unwrap();
    assert_eq!(table.rows.len(), 14);

    let model = LookupModel::from_table(&table, &path).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let depart = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let features = Features::for_trip("MAD", "LHR", "Chile", depart, depart, today).unwrap();
    assert_eq!(features.days_until_departure, 14);

    let p = predict::predict(&model, &model, &features);
    assert_eq!(p.cheapest_location, "Brazil");
    assert!(p.savings_pct > 0.0);

    let frame = predict::training_frame(&table, Target::Classification, &path).unwrap();
    assert_eq!(frame.headers.as_ref().map(Vec::len), Some(5));
    assert!(frame.rows.iter().all(|r| r[4] == "Brazil"));
}
