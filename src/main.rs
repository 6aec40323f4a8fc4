//! omepix - A reader for OME-XML pixel containers.
//!
//! This binary dispatches the CLI subcommands.

use std::fs;
use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omepix::{
    config::{CheckConfig, Cli, Command, ExtractConfig, InfoConfig, OutputFormat},
    io::{ByteSource, FileSource},
    meta::SeriesTable,
    OmeXmlReader, PngRenderer, Series,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Info(config) => run_info(config),
        Command::Extract(config) => run_extract(config),
        Command::Check(config) => run_check(config),
    }
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(config: InfoConfig) -> ExitCode {
    init_logging(config.verbose);

    let source = match FileSource::open(&config.file) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to open {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let size = source.size();

    let reader = match OmeXmlReader::open(source) {
        Ok(reader) => reader,
        Err(e) => {
            error!("Failed to read {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        print_info_json(&reader, size, config.offsets);
    } else {
        print_info_report(&reader, size, config.offsets);
    }

    ExitCode::SUCCESS
}

fn print_info_json(reader: &OmeXmlReader<FileSource>, size: u64, offsets: bool) {
    let mut table = SeriesTable::new();
    reader.populate_store(&mut table);

    let mut json = serde_json::json!({
        "file": reader.identifier(),
        "size": size,
        "series": table.rows(),
    });

    if offsets {
        for (i, series) in reader.all_series().iter().enumerate() {
            json["series"][i]["offsets"] = serde_json::json!(series.offsets());
        }
    }

    println!("{}", serde_json::to_string_pretty(&json).unwrap());
}

fn print_info_report(reader: &OmeXmlReader<FileSource>, size: u64, offsets: bool) {
    println!("Container: {} ({})", reader.identifier(), format_size(size));
    println!("Series: {}", reader.series_count());

    for (i, series) in reader.all_series().iter().enumerate() {
        println!();
        println!("Series {}:", i);
        println!(
            "  Plane size: {} x {} ({}, {} bytes/sample, {})",
            series.width,
            series.height,
            series.pixel_type.name(),
            series.bytes_per_pixel(),
            series.byte_order.name()
        );
        println!(
            "  Dimensions: Z={} C={} T={} ({})",
            series.size_z, series.size_c, series.size_t, series.dimension_order
        );
        println!("  Compression: {}", series.compression.name());
        println!(
            "  Planes: {} of {} declared",
            series.plane_count(),
            series.declared_planes()
        );

        if offsets {
            println!("  Block offsets:");
            for (plane, offset) in series.offsets().iter().enumerate() {
                println!("    plane {}: {}", plane, offset);
            }
        } else if let Some(first) = series.offset(0) {
            println!("  First block: offset {}", first);
        }
    }
}

// =============================================================================
// Extract Command
// =============================================================================

fn run_extract(config: ExtractConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let source = match FileSource::open(&config.file) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to open {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let reader = match OmeXmlReader::open(source) {
        Ok(reader) => reader.with_plane_cache_capacity(config.plane_cache),
        Err(e) => {
            error!("Failed to read {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let Some(series) = reader.series(config.series) else {
        error!(
            "Series {} out of range: file has {} series",
            config.series,
            reader.series_count()
        );
        return ExitCode::FAILURE;
    };
    let (pixel_type, byte_order) = (series.pixel_type, series.byte_order);
    let bytes_per_pixel = series.bytes_per_pixel();

    // Decode the requested rectangle, or the whole plane without one.
    let (data, width, height) = match config.region() {
        Some(region) => {
            let mut dest = vec![0u8; region.byte_len(bytes_per_pixel)];
            if let Err(e) = reader.read_region(config.series, config.plane, region, &mut dest) {
                error!("Failed to read region: {}", e);
                return ExitCode::FAILURE;
            }
            (Bytes::from(dest), region.width, region.height)
        }
        None => {
            let (width, height) = (series.width, series.height);
            match reader.read_plane(config.series, config.plane) {
                Ok(data) => (data, width, height),
                Err(e) => {
                    error!("Failed to read plane: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let output = match config.format {
        OutputFormat::Png => {
            match PngRenderer::new().render(&data, width, height, pixel_type, byte_order) {
                Ok(png) => png,
                Err(e) => {
                    error!("Failed to render PNG: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        OutputFormat::Raw => data,
    };

    if let Err(e) = fs::write(&config.output, &output) {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {} ({} bytes, series {} plane {})",
        config.output.display(),
        output.len(),
        config.series,
        config.plane
    );

    ExitCode::SUCCESS
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(config: CheckConfig) -> ExitCode {
    // Initialize minimal logging for check command
    if config.verbose {
        init_logging(true);
    }

    println!("omepix container check");
    println!("══════════════════════");
    println!();

    let source = match FileSource::open(&config.file) {
        Ok(source) => {
            println!(
                "✓ File: {} ({})",
                config.file.display(),
                format_size(source.size())
            );
            source
        }
        Err(e) => {
            println!("✗ File: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let reader = match OmeXmlReader::open(source) {
        Ok(reader) => {
            println!("✓ Container: OME-XML, {} series", reader.series_count());
            reader
        }
        Err(e) => {
            println!("✗ Container: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for (i, series) in reader.all_series().iter().enumerate() {
        print_series_line(i, series);
    }

    if config.deep {
        println!();
        for series in 0..reader.series_count() {
            print!("Decoding series {}... ", series);

            let planes = reader
                .series(series)
                .map(|s| s.plane_count())
                .unwrap_or(0);
            let mut bytes = 0u64;

            for plane in 0..planes {
                match reader.read_plane(series, plane) {
                    Ok(data) => bytes += data.len() as u64,
                    Err(e) => {
                        println!("✗ plane {}: {}", plane, e);
                        return ExitCode::FAILURE;
                    }
                }
            }

            println!("✓ {} planes ({})", planes, format_size(bytes));
        }
    }

    println!();
    println!("══════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}

fn print_series_line(index: usize, series: &Series) {
    println!(
        "  Series {}: {}x{} {}, {} planes, {} compression, {}",
        index,
        series.width,
        series.height,
        series.pixel_type.name(),
        series.plane_count(),
        series.compression.name(),
        series.byte_order.name()
    );
    if series.plane_count() < series.declared_planes() {
        println!(
            "  ! Series {}: only {} of {} declared planes located",
            index,
            series.plane_count(),
            series.declared_planes()
        );
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose { "omepix=debug" } else { "omepix=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Format a byte count for display.
fn format_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1.0 {
        format!("{:.2} MB", mb)
    } else {
        format!("{} bytes", bytes)
    }
}
