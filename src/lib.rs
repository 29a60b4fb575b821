// src/lib.rs

#[macro_use]
pub mod macros;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod specs;

pub mod aggregate;
pub mod convert;
pub mod csv;
pub mod dates;
pub mod file;
pub mod predict;
pub mod progress;
pub mod record;
pub mod store;

pub use error::{Error, Result};
