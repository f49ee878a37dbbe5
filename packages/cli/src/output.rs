//! Rendering fetched collections to stdout.

use std::io::Write as _;

use clap::ValueEnum;
use groundwater_models::table::TableRecord;
use groundwater_models::{Feature, FeatureCollection};
use serde::Serialize;

/// How results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// The merged `GeoJSON` `FeatureCollection`.
    #[default]
    Json,
    /// One row per feature, sorted by the record's primary date.
    Csv,
}

/// Writes a collection in the requested format.
///
/// # Errors
///
/// Returns an error if serialization or writing to stdout fails.
pub fn collection<P: TableRecord + Serialize>(
    collection: &FeatureCollection<P>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, collection)?;
            writeln!(out)?;
        }
        Format::Csv => collection.to_sorted_table().write_csv(&mut out)?,
    }

    log::info!("Wrote {} features", collection.len());

    Ok(())
}

/// Writes one feature; CSV output gets a single-row table.
///
/// # Errors
///
/// Returns an error if serialization or writing to stdout fails.
pub fn feature<P: TableRecord + Serialize + Clone>(
    feature: &Feature<P>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        Format::Json => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, feature)?;
            writeln!(out)?;
            Ok(())
        }
        Format::Csv => collection(&FeatureCollection::single(feature.clone()), format),
    }
}
