//! # Response-reading "specs"
//!
//! Everything that knows the *shape* of a captured search response or page:
//! where a field sits, which depth of the bracket tree carries it, and what
//! to fall back to when it is not there.
//!
//! ## Layers
//! - `tree` – one pass over an unescaped journey fragment, tokens grouped by
//!   bracket depth (`LevelMap`).
//! - `fields` – positional extractors over one depth's token list. Each owns
//!   a disjoint set of record fields and never fails; bad input degrades to
//!   empty values or the `"missing"` sentinel.
//! - `journey` – splitting a response into journeys and merging the
//!   extractor outputs into a `FlightRecord`.
//! - `meta` – the three footer spans (language, country, currency) of the
//!   saved page.
//!
//! ## Typical call chain
//! ```text
//! convert::convert_dir → journey::parse_response → tree::LevelMap::parse
//!                                               ↘ fields::* → FlightRecord
//!                      → meta::extract (companion page)
//! ```
//!
//! ## Conventions & invariants
//! - Depths −1 and −2 are the tails of a neighbouring journey and are ignored.
//! - Depth 4 (last flight) is synthesized from the tail of depth 3 when absent.
//! - Offsets are the only schema; `fields::AirportLayout` records which offset
//!   triple produced the airport codes so both layouts can be tested.
//!
//! In short: **`specs` knows how to read the captures.** Deduplication,
//! pricing and statistics live in `aggregate`.
pub mod fields;
pub mod journey;
pub mod meta;
pub mod tree;
