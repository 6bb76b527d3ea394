//! Command-line extractor for Spreadtrum PAC firmware containers.
//!
//! This crate is a thin layer over `spdpac-formats`:
//! - `config`: CLI arguments and environment variables
//! - `run`: listing, checksum verification and extraction with progress
//! - `error`: command-level errors
//!
//! # Example
//!
//! ```no_run
//! use spdpac_extract::{ExtractConfig, run};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ExtractConfig::from_args();
//!     run(&config, &mut std::io::stdout().lock())?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod run;

pub use config::ExtractConfig;
pub use error::CliError;
pub use run::{run, run_with, write_listing};
