// src/config/consts.rs

// Raw responses
pub const JOURNEY_DELIM: &str = "[\\\"";
pub const RESPONSE_EXT: &str = "json";
pub const PAGE_EXT: &str = "html";

// Page metadata: <span class="twocKe"> × 3 (language, country, currency)
pub const META_SPAN_CLASS: &str = "twocKe";
pub const META_SPAN_COUNT: usize = 3;

// Extraction
pub const YEAR_MIN: i32 = 2024;
pub const YEAR_MAX: i32 = 2025;
pub const LEG_WINDOW: usize = 5;
pub const PRIMARY_CARRIER_OFFSET: usize = 1;
pub const FALLBACK_CARRIER_OFFSET: usize = 18;
pub const MISSING: &str = "missing";
pub const PLACEHOLDER_TOKENS: [&str; 2] = ["null", "true"];

// Converter noise gate: prices at or below this are dropped from the raw table
pub const RAW_PRICE_FLOOR: f64 = 2.0;

// Aggregation defaults
pub const PRICE_FLOOR: f64 = 10.0;
pub const MIN_COUNTRIES: usize = 7;
pub const MATERIALITY_PCT: f64 = 1.5;
pub const TRIM_PROPORTION: f64 = 0.1;
pub const SHUFFLE_SEED: u64 = 123;
pub const NO_SIGNIFICANT_DIFFERENCE: &str = "No Significant Difference Found";
pub const DAY_FORMAT: &str = "%d-%m-%Y";
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Local files
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = "debug.log";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_RAW_FILE: &str = "raw_observations";
pub const DEFAULT_PROCESSED_PREFIX: &str = "Processed_";

// Concurrency
pub const WORKERS: usize = 4;
