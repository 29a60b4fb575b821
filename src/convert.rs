// src/convert.rs
//! Capture directory → raw observation table.
//!
//! Each response file is parsed with its companion page on a small pool of
//! worker threads; results are merged back in file-name order.

use std::{
    fs,
    path::Path,
    sync::{atomic::{AtomicUsize, Ordering}, mpsc, Arc},
    thread,
};

use thiserror::Error;

use crate::{
    config::consts::{PAGE_EXT, RAW_PRICE_FLOOR, RESPONSE_EXT, WORKERS},
    config::ExtractOptions,
    error::{Error, Result},
    file::{pair_captures, CapturePair},
    progress::Progress,
    record::Observation,
    specs::{journey, meta},
    store::DataSet,
};

/// Why a capture contributed no rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Skip {
    #[error("no companion page")]
    NoPage,
    #[error("unreadable: {0}")]
    Unreadable(String),
    #[error("no journeys in response")]
    NoJourneys,
    #[error("page metadata: {0}")]
    Metadata(String),
}

/// Observations read from a capture directory, plus what was skipped.
#[derive(Debug, Default)]
pub struct Conversion {
    pub observations: Vec<Observation>,
    pub files_read: usize,
    pub skipped: Vec<(String, Skip)>,
}

impl Conversion {
    pub fn to_dataset(&self) -> DataSet {
        DataSet::new(
            Observation::headers(),
            self.observations.iter().map(Observation::to_row).collect(),
        )
    }
}

/// Drop prices that are not numbers or are at most 2 units; those are page noise.
pub fn passes_raw_gate(o: &Observation) -> bool {
    o.record.price().is_some_and(|p| p > RAW_PRICE_FLOOR)
}

/// One response text and its page → observations.
pub fn convert_capture(
    source: &str,
    response: &str,
    page: &str,
    opts: &ExtractOptions,
) -> std::result::Result<Vec<Observation>, Skip> {
    let records = journey::parse_response(response, opts);
    if records.is_empty() {
        return Err(Skip::NoJourneys);
    }
    let page_meta = meta::extract(page).map_err(|e| Skip::Metadata(e.to_string()))?;

    Ok(records
        .into_iter()
        .map(|record| Observation { source: s!(source), record, meta: page_meta.clone() })
        .filter(passes_raw_gate)
        .collect())
}

fn convert_pair(pair: &CapturePair, opts: &ExtractOptions) -> std::result::Result<Vec<Observation>, Skip> {
    let read = |p: &Path| fs::read_to_string(p).map_err(|e| Skip::Unreadable(e.to_string()));
    let response = read(&pair.response)?;
    let page = read(&pair.page)?;
    convert_capture(&pair.stem, &response, &page, opts)
}

/// Convert every `*.json` response in `responses` that has a `*.html` page of
/// the same stem in `pages`.
pub fn convert_dir(
    responses: &Path,
    pages: &Path,
    opts: &ExtractOptions,
    mut progress: Option<&mut dyn Progress>,
) -> Result<Conversion> {
    let (pairs, orphans) = pair_captures(responses, pages, RESPONSE_EXT, PAGE_EXT)?;

    let mut out = Conversion::default();
    for orphan in orphans {
        let name = orphan.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        tracing::warn!("{name}: {}", Skip::NoPage);
        if let Some(p) = progress.as_deref_mut() {
            p.item_skipped(&name, &Skip::NoPage.to_string());
        }
        out.skipped.push((name, Skip::NoPage));
    }

    if let Some(p) = progress.as_deref_mut() {
        p.begin(pairs.len());
    }

    let pairs = Arc::new(pairs);
    let work_opts = opts.clone();
    let mut per_file: Vec<(usize, Vec<Observation>)> = Vec::new();
    let pooled = run_pool(Arc::clone(&pairs), move |pair| convert_pair(pair, &work_opts), |i, result| {
        let name = pairs[i].stem.as_str();
        match result {
            Ok(obs) => {
                tracing::debug!("{name}: {} observations", obs.len());
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(name, obs.len());
                }
                per_file.push((i, obs));
            }
            Err(skip) => {
                tracing::warn!("{name}: skipped, {skip}");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_skipped(name, &skip.to_string());
                }
                out.skipped.push((s!(name), skip));
            }
        }
    });
    pooled?;

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    out.files_read = per_file.len();
    per_file.sort_by_key(|(i, _)| *i);
    for (_, mut obs) in per_file {
        out.observations.append(&mut obs);
    }
    out.skipped.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::info!(
        "converted {} files into {} observations, {} skipped",
        out.files_read,
        out.observations.len(),
        out.skipped.len()
    );
    Ok(out)
}

/// Run `work` over `items` on up to `WORKERS` threads, handing each result
/// to `on_result` on the calling thread. Errors if a worker died before
/// every item was delivered.
fn run_pool<T, R, W>(items: Arc<Vec<T>>, work: W, mut on_result: impl FnMut(usize, R)) -> Result<()>
where
    T: Send + Sync + 'static,
    R: Send + 'static,
    W: Fn(&T) -> R + Send + Sync + 'static,
{
    let counter = Arc::new(AtomicUsize::new(0));
    let work = Arc::new(work);
    let (tx, rx) = mpsc::channel::<(usize, R)>();

    let workers = WORKERS.min(items.len()).max(1);
    for _ in 0..workers {
        let items = Arc::clone(&items);
        let idx = Arc::clone(&counter);
        let work = Arc::clone(&work);
        let tx = tx.clone();

        thread::spawn(move || {
            loop {
                let i = idx.fetch_add(1, Ordering::Relaxed);
                if i >= items.len() {
                    break;
                }
                let _ = tx.send((i, work(&items[i])));
            }
        });
    }
    drop(tx); // main thread is sole receiver now

    let mut received = 0usize;
    for (i, result) in rx {
        received += 1;
        on_result(i, result);
    }

    if received < items.len() {
        let msg = format!(
            "{} of {} captures were not converted, a worker stopped early",
            items.len() - received,
            items.len()
        );
        tracing::error!("{msg}");
        return Err(Error::InvalidInput(msg));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<div>
        <span class="twocKe">English</span>
        <span class="twocKe">Spain</span>
        <span class="twocKe">EUR</span>
    </div>"#;

    fn response(price: &str) -> String {
        let journey = format!(
            r#"x","IB","MAD","LHR",[x,"Iberia",2024,3,15,8,30,2024,3,16,10,0,{price},]"#
        );
        format!(r#"head[\\\"{journey}[\\\"tail"#)
    }

    #[test]
    fn capture_joins_page_metadata() {
        let obs = convert_capture("es_1", &response("129"), PAGE, &ExtractOptions::default()).unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].source, "es_1");
        assert_eq!(obs[0].meta.country, "Spain");
        assert_eq!(obs[0].record.departure_airport_code, "MAD");
        assert_eq!(obs[0].record.ticket_price, "129");
    }

    #[test]
    fn raw_gate_drops_noise_prices() {
        let opts = ExtractOptions::default();
        assert!(convert_capture("a", &response("2"), PAGE, &opts).unwrap().is_empty());
        assert!(convert_capture("a", &response("null"), PAGE, &opts).unwrap().is_empty());
        assert_eq!(convert_capture("a", &response("2.5"), PAGE, &opts).unwrap().len(), 1);
    }

    #[test]
    fn lost_worker_fails_the_batch() {
        let items = Arc::new((0..40).collect::<Vec<u32>>());
        let mut seen = Vec::new();
        let res = run_pool(
            items,
            |n: &u32| {
                if *n == 7 {
                    panic!("worker died");
                }
                n * 2
            },
            |i, v| seen.push((i, v)),
        );
        assert!(matches!(res, Err(Error::InvalidInput(_))));
        assert!(seen.len() < 40);
        assert!(seen.iter().all(|(i, v)| *v == *i as u32 * 2));
    }

    #[test]
    fn pool_delivers_every_item() {
        let items = Arc::new((0..100).collect::<Vec<u32>>());
        let mut seen = Vec::new();
        run_pool(items, |n: &u32| n + 1, |i, v| seen.push((i, v))).unwrap();
        seen.sort();
        assert_eq!(seen, (0..100).map(|i| (i as usize, i + 1)).collect::<Vec<_>>());
    }

    #[test]
    fn skips_are_reported() {
        let opts = ExtractOptions::default();
        assert_eq!(convert_capture("a", "no journeys here", PAGE, &opts), Err(Skip::NoJourneys));
        let bad_page = r#"<span class="twocKe">English</span>"#;
        assert!(matches!(
            convert_capture("a", &response("129"), bad_page, &opts),
            Err(Skip::Metadata(_))
        ));
    }
}
