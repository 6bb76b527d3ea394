//! Command configuration.
//!
//! Options come from CLI arguments, with environment variables as a fallback
//! for the switches that make sense to set once per shell:
//!
//! - `SPDPAC_DEBUG`
//! - `SPDPAC_CHECK_CRC`
//! - `SPDPAC_KEEP_GOING`
//! - `SPDPAC_CHUNK_SIZE`
//!
//! # Example
//!
//! ```no_run
//! use spdpac_extract::ExtractConfig;
//!
//! let config = ExtractConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Input: {}", config.input.display());
//! ```

use crate::error::CliError;
use clap::Parser;
use spdpac_formats::{DEFAULT_CHUNK_SIZE, DecodeMode, ExtractOptions, FailurePolicy};
use std::path::{Path, PathBuf};

/// Extractor configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spdpac-extract",
    about = "Unpack Spreadtrum/Unisoc PAC firmware containers",
    version
)]
pub struct ExtractConfig {
    /// PAC container to read
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving the partition images
    #[arg(value_name = "OUTPUT_DIR", required_unless_present = "list")]
    pub output_dir: Option<PathBuf>,

    /// Dump decoded header and descriptor fields
    #[arg(short, long, env = "SPDPAC_DEBUG")]
    pub debug: bool,

    /// Verify the CRC-16 checksums before extracting
    #[arg(short = 'c', long, env = "SPDPAC_CHECK_CRC")]
    pub check_crc: bool,

    /// Print the partition table and exit
    #[arg(short, long)]
    pub list: bool,

    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Continue with the next partition after a failure
    #[arg(long, env = "SPDPAC_KEEP_GOING")]
    pub keep_going: bool,

    /// Skip malformed partition records instead of aborting
    #[arg(long)]
    pub lenient: bool,

    /// Copy buffer size in bytes
    #[arg(long, env = "SPDPAC_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

impl ExtractConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if the chunk size is zero or no output
    /// directory was given outside listing mode.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.chunk_size == 0 {
            return Err(CliError::Config(
                "chunk size must be at least 1 byte".to_string(),
            ));
        }

        if !self.list && self.output_dir.is_none() {
            return Err(CliError::Config(
                "an output directory is required unless --list is given".to_string(),
            ));
        }

        Ok(())
    }

    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    /// Output directory, if one was given.
    #[must_use]
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Partition table decoding mode.
    #[must_use]
    pub const fn decode_mode(&self) -> DecodeMode {
        if self.lenient {
            DecodeMode::Lenient
        } else {
            DecodeMode::Strict
        }
    }

    /// Library-side extraction options.
    #[must_use]
    pub const fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            chunk_size: self.chunk_size,
            policy: if self.keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::FailFast
            },
        }
    }
}
