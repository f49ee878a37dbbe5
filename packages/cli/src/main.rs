#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line access to the SGU groundwater APIs.
//!
//! Every subcommand maps onto one endpoint client call and prints the
//! (fully paginated) result as `GeoJSON` or CSV.

mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use groundwater_client::{
    Bbox, ClientConfig, GroundwaterClient, ItemsQuery, SortBy, StationName, StationNames,
    TimeRange,
};
use output::Format;

/// Query SGU groundwater levels and chemistry.
#[derive(Parser)]
#[command(name = "groundwater")]
#[command(about = "Query SGU groundwater levels and chemistry")]
struct Cli {
    /// TOML file with client settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the API root URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<f64>,

    /// Retries for transient failures.
    #[arg(long)]
    max_retries: Option<u32>,

    /// Log every request at debug level.
    #[arg(long)]
    debug: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by every listing subcommand.
#[derive(Args)]
struct ListArgs {
    /// Bounding box as `min_lon,min_lat,max_lon,max_lat`.
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<Bbox>,

    /// RFC 3339 instant or interval.
    #[arg(long)]
    datetime: Option<String>,

    /// Maximum number of features; larger results are paginated.
    #[arg(long)]
    limit: Option<u64>,

    /// CQL filter expression.
    #[arg(long)]
    filter: Option<String>,

    /// Sort expressions such as `-obsdatum` (repeatable).
    #[arg(long, allow_hyphen_values = true)]
    sortby: Vec<SortBy>,
}

impl ListArgs {
    fn query(&self) -> ItemsQuery {
        let mut query = ItemsQuery::new();
        if let Some(bbox) = self.bbox {
            query = query.with_bbox(bbox);
        }
        if let Some(datetime) = &self.datetime {
            query = query.with_datetime(datetime);
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        if let Some(filter) = &self.filter {
            query = query.with_filter(filter);
        }
        for sort in &self.sortby {
            query = query.with_sort(sort.clone());
        }
        query
    }
}

/// Selects stations or sites by code or by name; the two are exclusive.
#[derive(Args)]
#[group(multiple = false)]
struct SelectArgs {
    /// Site codes (`platsbeteckning`), e.g. `95_2`.
    #[arg(long = "code", num_args = 1..)]
    codes: Vec<String>,

    /// Human-readable site names.
    #[arg(long = "name", num_args = 1..)]
    names: Vec<String>,
}

impl SelectArgs {
    fn selection(&self) -> Option<StationNames> {
        if !self.codes.is_empty() {
            Some(StationNames::Codes(self.codes.clone()))
        } else if !self.names.is_empty() {
            Some(StationNames::Names(self.names.clone()))
        } else {
            None
        }
    }

    fn single(&self) -> Option<StationName> {
        match (self.codes.as_slice(), self.names.as_slice()) {
            ([code], []) => Some(StationName::Code(code.clone())),
            ([], [name]) => Some(StationName::Name(name.clone())),
            _ => None,
        }
    }
}

/// Sampling or observation window.
#[derive(Args)]
struct RangeArgs {
    /// Inclusive start, e.g. `2020-01-01`.
    #[arg(long)]
    from: Option<String>,

    /// Inclusive end.
    #[arg(long)]
    to: Option<String>,

    /// Maximum number of records.
    #[arg(long)]
    limit: Option<u64>,
}

impl RangeArgs {
    fn range(&self) -> TimeRange {
        TimeRange {
            tmin: self.from.as_deref().map(Into::into),
            tmax: self.to.as_deref().map(Into::into),
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List observed-level monitoring stations.
    Stations {
        #[command(flatten)]
        select: SelectArgs,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Show one monitoring station by feature id.
    Station {
        /// Feature id, e.g. `stationer.4086`.
        id: String,
    },

    /// Observed level measurements of one or more stations.
    Measurements {
        #[command(flatten)]
        select: SelectArgs,
        #[command(flatten)]
        range: RangeArgs,
    },

    /// List SGU-HYPE model areas.
    Areas {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Modeled groundwater levels by area id or by coordinates.
    Levels {
        /// Model area ids (`omrade_id`).
        #[arg(long = "area", num_args = 1.., conflicts_with_all = ["lat", "lon"])]
        areas: Vec<i64>,

        /// Latitude (WGS 84) of a point to search around.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude (WGS 84) of a point to search around.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Search radius in degrees around the point.
        #[arg(long, requires = "lat")]
        buffer: Option<f64>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// List chemistry sampling sites.
    Sites {
        #[command(flatten)]
        select: SelectArgs,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Chemistry analysis results by site and/or parameter.
    Results {
        /// Parameter short name, e.g. `PH` or `NITRATE`.
        #[arg(long)]
        parameter: Option<String>,

        #[command(flatten)]
        select: SelectArgs,
        #[command(flatten)]
        range: RangeArgs,
    },
}

fn parse_bbox(s: &str) -> Result<Bbox, String> {
    let parts = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("'{part}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [min_lon, min_lat, max_lon, max_lat] => {
            Ok(Bbox::new(*min_lon, *min_lat, *max_lon, *max_lat))
        }
        _ => Err(format!("expected 4 comma-separated numbers, got {}", parts.len())),
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            log::info!("Loading client config from {}", path.display());
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(timeout) = cli.timeout {
        config = config.with_timeout_secs(timeout);
    }
    if let Some(max_retries) = cli.max_retries {
        config = config.with_max_retries(max_retries);
    }
    if cli.debug {
        config = config.with_debug(true);
    }

    Ok(config)
}

/// `info` by default, `RUST_LOG` on top; `--debug` opens up the client's
/// request diagnostics.
fn init_logger(debug: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_env("RUST_LOG");
    if debug {
        builder.filter_module("groundwater_client", log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.debug);

    let client = GroundwaterClient::new(load_config(&cli)?)?;
    let format = cli.format;

    match &cli.command {
        Commands::Stations { select, list } => {
            let observed = client.observed();
            let stations = match select.selection() {
                Some(names) => observed.stations_by_names(&names, &list.query())?,
                None => observed.stations(&list.query())?,
            };
            output::collection(&stations, format)?;
        }
        Commands::Station { id } => {
            output::feature(&client.observed().station(id)?, format)?;
        }
        Commands::Measurements { select, range } => {
            let observed = client.observed();
            let measurements = if let Some(name) = select.single() {
                observed.measurements_by_name(&name, &range.range(), range.limit)?
            } else if let Some(names) = select.selection() {
                observed.measurements_by_names(&names, &range.range(), range.limit)?
            } else {
                return Err("measurements needs --code or --name".into());
            };
            output::collection(&measurements, format)?;
        }
        Commands::Areas { list } => {
            output::collection(&client.modeled().areas(&list.query())?, format)?;
        }
        Commands::Levels {
            areas,
            lat,
            lon,
            buffer,
            list,
        } => {
            let modeled = client.modeled();
            let levels = match (lat, lon) {
                (Some(lat), Some(lon)) => {
                    modeled.levels_by_coords(*lat, *lon, *buffer, &list.query())?
                }
                _ if !areas.is_empty() => modeled.levels_by_areas(areas, &list.query())?,
                _ => modeled.levels(&list.query())?,
            };
            output::collection(&levels, format)?;
        }
        Commands::Sites { select, list } => {
            let chemistry = client.chemistry();
            let sites = match select.selection() {
                Some(names) => chemistry.sampling_sites_by_names(&names, &list.query())?,
                None => chemistry.sampling_sites(&list.query())?,
            };
            output::collection(&sites, format)?;
        }
        Commands::Results {
            parameter,
            select,
            range,
        } => {
            let chemistry = client.chemistry();
            let results = match (parameter, select.single(), select.selection()) {
                (Some(parameter), _, _) if select.names.is_empty() => chemistry
                    .results_by_parameter(parameter, select.codes.as_slice(), &range.range(), range.limit)?,
                (Some(_), _, _) => {
                    return Err("--parameter filters by --code only".into());
                }
                (None, Some(site), _) => {
                    chemistry.results_by_site(&site, &range.range(), range.limit)?
                }
                (None, None, Some(sites)) => {
                    chemistry.results_by_sites(&sites, &range.range(), range.limit)?
                }
                (None, None, None) => {
                    return Err("results needs --parameter, --code or --name".into());
                }
            };
            output::collection(&results, format)?;
        }
    }

    Ok(())
}
