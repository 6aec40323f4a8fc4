//! Configuration management for the omepix CLI.
//!
//! The CLI is organized as subcommands, each with its own config struct:
//!
//! - `info` - print the series layout of a container
//! - `extract` - decode a plane or region and write it to disk
//! - `check` - validate that a container opens and decodes
//!
//! # Example
//!
//! ```ignore
//! use omepix::config::{Cli, Command};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! match cli.into_command() {
//!     Command::Info(config) => { /* ... */ }
//!     Command::Extract(config) => { /* ... */ }
//!     Command::Check(config) => { /* ... */ }
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OMEPIX_PLANE_CACHE` - Plane cache budget in bytes (default: 64MB)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cache::DEFAULT_PLANE_CACHE_CAPACITY;
use crate::format::Region;

// =============================================================================
// CLI Entry Point
// =============================================================================

/// omepix - A reader for OME-XML pixel containers.
///
/// Indexes XML documents with embedded base64 pixel data and decodes
/// planes and regions from them without loading the whole file.
#[derive(Parser, Debug, Clone)]
#[command(name = "omepix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Consume the parsed CLI and return the selected command.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the series layout of a container
    Info(InfoConfig),

    /// Decode a plane or region and write it to disk
    Extract(ExtractConfig),

    /// Validate that a container opens and decodes
    Check(CheckConfig),
}

// =============================================================================
// Info Command
// =============================================================================

/// Configuration for the `info` command.
#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// Path to the OME-XML container.
    pub file: PathBuf,

    /// Emit machine-readable JSON instead of the human-readable report.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Include the absolute byte offset of every pixel block.
    #[arg(long, default_value_t = false)]
    pub offsets: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Extract Command
// =============================================================================

/// Output format for extracted pixel data.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Autoscaled 8-bit grayscale PNG
    Png,
    /// Raw samples in file byte order
    Raw,
}

/// Configuration for the `extract` command.
#[derive(Args, Debug, Clone)]
pub struct ExtractConfig {
    /// Path to the OME-XML container.
    pub file: PathBuf,

    /// Series to read from.
    #[arg(short, long, default_value_t = 0)]
    pub series: usize,

    /// Plane to read within the series.
    #[arg(short, long, default_value_t = 0)]
    pub plane: usize,

    /// Left edge of the region, in pixels.
    ///
    /// The four region flags must be given together; without them the
    /// whole plane is extracted.
    #[arg(long)]
    pub x: Option<u32>,

    /// Top edge of the region, in pixels.
    #[arg(long)]
    pub y: Option<u32>,

    /// Region width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Region height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Where to write the extracted data.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,

    /// Plane cache budget in bytes. Zero disables caching.
    #[arg(long, default_value_t = DEFAULT_PLANE_CACHE_CAPACITY, env = "OMEPIX_PLANE_CACHE")]
    pub plane_cache: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ExtractConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let given = [self.x, self.y, self.width, self.height]
            .iter()
            .filter(|v| v.is_some())
            .count();

        if given != 0 && given != 4 {
            return Err(
                "Region flags --x, --y, --width and --height must be given together".to_string(),
            );
        }

        if self.width == Some(0) || self.height == Some(0) {
            return Err("Region width and height must be greater than 0".to_string());
        }

        Ok(())
    }

    /// The requested region, or `None` for the whole plane.
    ///
    /// Call [`validate`](ExtractConfig::validate) first; partial region
    /// flags are treated as no region here.
    pub fn region(&self) -> Option<Region> {
        match (self.x, self.y, self.width, self.height) {
            (Some(x), Some(y), Some(width), Some(height)) => {
                Some(Region::new(x, y, width, height))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

/// Configuration for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Path to the OME-XML container.
    pub file: PathBuf,

    /// Also decode every plane of every series, not just the index.
    #[arg(long, default_value_t = false)]
    pub deep: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
