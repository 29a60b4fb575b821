// src/cli.rs
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::{
    aggregate::{self, AggregateContext, ProcessedRow},
    config::consts::{DEFAULT_PROCESSED_PREFIX, DEFAULT_RAW_FILE},
    config::{ExportFormat, ExportOptions, PipelineConfig},
    convert::{self, Conversion},
    dates::parse_query_date,
    error::{Error, Result},
    file,
    predict::{self, Features, LookupModel, Target},
    progress::{ConsoleProgress, Progress},
    record::Observation,
    store::{self, DataSet},
};

#[derive(Parser, Debug)]
#[command(name = "fare_scrape", version, about = "Flight-search capture parser and price-variance preprocessor")]
pub struct Cli {
    /// No console progress output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse captured responses and pages into the raw observation table.
    Convert {
        #[command(flatten)]
        captures: Captures,
        #[command(flatten)]
        out: Output,
    },
    /// Run the price-variance engine over a raw observation table.
    Process {
        /// Raw table file name; also the key into the configuration file.
        filename: String,
        #[arg(short, long, env = "FARE_SCRAPE_CONFIG")]
        config: PathBuf,
        /// Directory holding the raw table.
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
        #[command(flatten)]
        out: Output,
    },
    /// Convert and process in one go.
    Run {
        #[command(flatten)]
        captures: Captures,
        #[arg(short, long, env = "FARE_SCRAPE_CONFIG")]
        config: PathBuf,
        /// Dataset key in the configuration file.
        #[arg(long)]
        dataset: String,
        #[command(flatten)]
        out: Output,
    },
    /// Cheapest country and expected savings for one trip.
    Predict {
        /// Processed table the lookup model is built from.
        #[arg(long)]
        table: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        country: String,
        /// Departure day, YYYY-MM-DD.
        #[arg(long)]
        depart: NaiveDate,
        /// Return day, YYYY-MM-DD.
        #[arg(long = "return")]
        return_on: NaiveDate,
    },
    /// Export the model input frame of a processed table.
    TrainingFrame {
        #[arg(long)]
        table: PathBuf,
        #[arg(long, value_enum)]
        target: Target,
        #[command(flatten)]
        out: Output,
    },
}

#[derive(Args, Debug)]
pub struct Captures {
    /// Directory of `*.json` response captures.
    #[arg(long)]
    pub responses: PathBuf,
    /// Directory of `*.html` pages named like the responses.
    #[arg(long)]
    pub pages: PathBuf,
}

#[derive(Args, Debug)]
pub struct Output {
    /// Output file; the extension follows --format.
    #[arg(short, long)]
    pub out: Option<String>,
    /// csv or tsv. Defaults to the extension of --out, else csv.
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,
    /// Leave out the header row.
    #[arg(long)]
    pub no_headers: bool,
}

impl Output {
    fn export(&self, default_stem: &str) -> ExportOptions {
        let mut opts = ExportOptions::with_stem(default_stem);
        if let Some(out) = &self.out {
            opts.set_path(out);
        }
        let typed = self
            .out
            .as_deref()
            .and_then(|o| Path::new(o).extension())
            .and_then(|e| ExportFormat::parse(&e.to_string_lossy()));
        opts.format = self.format.or(typed).unwrap_or_default();
        opts.include_headers = !self.no_headers;
        opts
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = crate::log::init(Path::new(".")) {
        tracing::debug!("logging to {}", path.display());
    }

    let mut console = ConsoleProgress::new();
    let progress: Option<&mut dyn Progress> = if cli.quiet { None } else { Some(&mut console) };

    match cli.command {
        Command::Convert { captures, out } => {
            let conversion = convert_captures(&captures, &PipelineConfig::default(), progress)?;
            let path = file::write_table(&out.export(DEFAULT_RAW_FILE), &conversion.to_dataset())?;
            println!("{}", path.display());
        }
        Command::Process { filename, config, data_dir, out } => {
            let cfg = PipelineConfig::load(&config)?;
            let input = data_dir.join(&filename);
            let raw = store::load_table(&input, store::sep_for(&input))?;
            let observations = Observation::from_dataset(&raw, &input)?;
            let ds = process_observations(observations, &cfg, &filename, progress)?;
            let path = file::write_table(&out.export(&processed_stem(&filename)), &ds)?;
            println!("{}", path.display());
        }
        Command::Run { captures, config, dataset, out } => {
            let cfg = PipelineConfig::load(&config)?;
            let ds = convert_and_process(&captures, &cfg, &dataset, progress)?;
            let path = file::write_table(&out.export(&processed_stem(&dataset)), &ds)?;
            println!("{}", path.display());
        }
        Command::Predict { table, from, to, country, depart, return_on } => {
            let ds = store::load_table(&table, store::sep_for(&table))?;
            let model = LookupModel::from_table(&ds, &table)?;
            let today = Local::now().date_naive();
            let features = Features::for_trip(&from, &to, &country, depart, return_on, today)?;
            let p = predict::predict(&model, &model, &features);
            if p.has_difference() {
                println!("Cheapest country: {} (expected savings {:.2}%)", p.cheapest_location, p.savings_pct);
            } else {
                println!("{}", p.cheapest_location);
            }
        }
        Command::TrainingFrame { table, target, out } => {
            let ds = store::load_table(&table, store::sep_for(&table))?;
            let frame = predict::training_frame(&ds, target, &table)?;
            let stem = join!("training_", target.column());
            let path = file::write_table(&out.export(&stem), &frame)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn processed_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| s!(filename));
    join!(DEFAULT_PROCESSED_PREFIX, &stem)
}

fn convert_captures(
    captures: &Captures,
    cfg: &PipelineConfig,
    progress: Option<&mut dyn Progress>,
) -> Result<Conversion> {
    let conversion = convert::convert_dir(&captures.responses, &captures.pages, &cfg.extract, progress)?;
    if conversion.observations.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no observations in {}",
            captures.responses.display()
        )));
    }
    Ok(conversion)
}

/// The `run` pipeline: captures to the processed table.
fn convert_and_process(
    captures: &Captures,
    cfg: &PipelineConfig,
    dataset: &str,
    mut progress: Option<&mut dyn Progress>,
) -> Result<DataSet> {
    let reborrowed = progress.as_mut().map(|p| &mut **p as &mut dyn Progress);
    let conversion = convert_captures(captures, cfg, reborrowed)?;
    process_observations(conversion.observations, cfg, dataset, progress)
}

fn process_observations(
    observations: Vec<Observation>,
    cfg: &PipelineConfig,
    dataset: &str,
    progress: Option<&mut dyn Progress>,
) -> Result<DataSet> {
    let entry = cfg.dataset(dataset)?;
    let rates = cfg.load_rates(entry)?;
    let ctx = AggregateContext {
        rates: &rates,
        query_date: parse_query_date(&entry.query_date)?,
        options: &cfg.aggregate,
    };
    let rows = aggregate::process(observations, &ctx, progress)?;
    Ok(DataSet::new(
        ProcessedRow::headers(),
        rows.iter().map(ProcessedRow::to_row).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from([
            "fare_scrape", "process", "Query_1502.csv", "--config", "cfg.json", "-o", "out/p.tsv",
        ])
        .unwrap();
        let Command::Process { filename, out, .. } = cli.command else {
            panic!("expected process");
        };
        assert_eq!(filename, "Query_1502.csv");
        let export = out.export("x");
        assert_eq!(export.format, ExportFormat::Tsv);
        assert!(export.out_path().ends_with("p.tsv"));

        let cli = Cli::try_parse_from([
            "fare_scrape", "predict", "--table", "p.csv", "--from", "MAD", "--to", "LHR",
            "--country", "Spain", "--depart", "2024-03-15", "--return", "2024-03-20",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Predict { .. }));

        assert!(Cli::try_parse_from(["fare_scrape", "training-frame", "--table", "p.csv", "--target", "nope"]).is_err());
    }

    #[derive(Default)]
    struct Counts {
        done: usize,
        logged: usize,
    }

    impl Progress for Counts {
        fn log(&mut self, _msg: &str) {
            self.logged += 1;
        }
        fn item_done(&mut self, _name: &str, _records: usize) {
            self.done += 1;
        }
    }

    #[test]
    fn run_converts_then_processes_with_one_progress() {
        let dir = tempfile::tempdir().unwrap();
        let responses = dir.path().join("responses");
        let pages = dir.path().join("pages");
        std::fs::create_dir_all(&responses).unwrap();
        std::fs::create_dir_all(&pages).unwrap();
        for (country, price) in [("Chile", 100), ("Spain", 130)] {
            let journey = format!(
                r#"x","IB","MAD","LHR",[x,"Iberia",2024,3,15,8,30,2024,3,16,10,0,{price},]"#
            );
            std::fs::write(
                responses.join(format!("{country}.json")),
                format!(r#"head[\\\"{journey}[\\\"tail"#),
            )
            .unwrap();
            let spans: String = ["English", country, "USD"]
                .iter()
                .map(|t| format!(r#"<span class="twocKe">{t}</span>"#))
                .collect();
            std::fs::write(pages.join(format!("{country}.html")), spans).unwrap();
        }
        std::fs::write(dir.path().join("rates.json"), r#"{"USD": 1.0}"#).unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"data_configurations": {"q.csv": {"conversion_rate_file": "rates.json", "query_date": "2024-03-01"}},
                "aggregate": {"min_countries": 2}}"#,
        )
        .unwrap();

        let cfg = PipelineConfig::load(&dir.path().join("config.json")).unwrap();
        let captures = Captures { responses, pages };
        let mut counts = Counts::default();
        let ds = convert_and_process(&captures, &cfg, "q.csv", Some(&mut counts)).unwrap();

        assert_eq!(ds.rows.len(), 2);
        assert_eq!(counts.done, 2);
        assert!(counts.logged > 0);
        let cheapest = ds.require_column("Cheapest_Location_Flight", Path::new("q.csv")).unwrap();
        assert!(ds.rows.iter().all(|r| r[cheapest] == "Chile"));
    }

    #[test]
    fn quiet_only_silences_progress() {
        use clap::CommandFactory;
        let cmd = Cli::command();
        let quiet = cmd.get_arguments().find(|a| a.get_id() == "quiet").unwrap();
        let help = quiet.get_help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("No console progress output"));

        let cli = Cli::try_parse_from(["fare_scrape", "-q", "convert", "--responses", "r", "--pages", "p"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn default_output_names() {
        assert_eq!(processed_stem("Query_1502.csv"), "Processed_Query_1502");
        let out = Output { out: None, format: None, no_headers: false };
        assert!(out.export("raw").out_path().ends_with("raw.csv"));
    }
}
