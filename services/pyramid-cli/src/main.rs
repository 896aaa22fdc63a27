//! Tile pyramid command line tool.
//!
//! Builds tile matrix sets from YAML requests or command line options and
//! prints them as a table, JSON or YAML.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use pyramid_cli::{render, OutputFormat, PyramidRequest};
use tile_matrix::{BuilderConfig, IterationPolicy, TileMatrixSet, TileMatrixSetBuilder};
use tms_common::{Crs, Envelope};

#[derive(Parser, Debug)]
#[command(name = "pyramid")]
#[command(about = "Build multi-resolution tile matrix sets")]
struct Args {
    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Print every tiling scheme instead of a summary
    #[arg(long, global = true)]
    full: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a pyramid anchored at a native resolution
    Build {
        /// YAML request file
        #[arg(short, long, conflicts_with_all = ["bbox", "resolution"])]
        request: Option<PathBuf>,

        /// Domain as comma separated min_x,min_y,max_x,max_y
        #[arg(long, requires = "resolution")]
        bbox: Option<String>,

        /// Native resolution per axis
        #[arg(long, value_delimiter = ',')]
        resolution: Option<Vec<f64>>,

        #[arg(long, default_value = "EPSG:4326")]
        crs: String,

        #[arg(long, value_delimiter = ',')]
        tile_size: Option<Vec<u32>>,

        /// Explicit scales, overriding the iteration policy
        #[arg(long, value_delimiter = ',')]
        scales: Option<Vec<f64>>,

        #[arg(long)]
        iteration: Option<IterationPolicy>,
    },

    /// Build a pyramid by halving an envelope a fixed number of times
    Subdivide {
        /// Domain as comma separated min_x,min_y,max_x,max_y
        #[arg(long)]
        bbox: String,

        #[arg(long, default_value = "EPSG:4326")]
        crs: String,

        /// Number of levels
        #[arg(short, long)]
        levels: usize,

        /// Axes to subdivide
        #[arg(long, value_delimiter = ',')]
        axes: Option<Vec<usize>>,

        #[arg(long, value_delimiter = ',')]
        tile_size: Option<Vec<u32>>,
    },

    /// List the tiles of one level that intersect a bounding box
    Tiles {
        /// YAML request file
        #[arg(short, long)]
        request: PathBuf,

        /// Tile matrix identifier
        #[arg(long)]
        level: String,

        /// Query as comma separated min_x,min_y,max_x,max_y
        #[arg(long)]
        bbox: String,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so stdout only carries the rendered pyramid
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = BuilderConfig::from_env();
    config.validate().context("Invalid TMS_* environment configuration")?;

    match args.command {
        Command::Build {
            request,
            bbox,
            resolution,
            crs,
            tile_size,
            scales,
            iteration,
        } => {
            let mut builder = match request {
                Some(path) => {
                    info!(path = %path.display(), "Loading pyramid request");
                    PyramidRequest::load(&path)?.to_builder(&config)?
                }
                None => {
                    let bbox = bbox.context("either --request or --bbox is required")?;
                    let resolution = resolution.context("--resolution is required with --bbox")?;
                    let envelope = parse_bbox(&bbox, &crs)?;
                    TileMatrixSetBuilder::with_config(&config).domain_envelope(envelope, resolution)
                }
            };
            if let Some(tile_size) = tile_size {
                builder = builder.tile_size(tile_size);
            }
            if let Some(scales) = scales {
                builder = builder.scales(scales);
            }
            if let Some(policy) = iteration {
                builder = builder.iteration(policy);
            }
            let set = builder.build()?;
            print(&set, args.format, args.full)
        }

        Command::Subdivide {
            bbox,
            crs,
            levels,
            axes,
            tile_size,
        } => {
            let mut builder = TileMatrixSetBuilder::from_top(parse_bbox(&bbox, &crs)?).subdivide(levels);
            if let Some(axes) = axes {
                builder = builder.axis(axes);
            }
            if let Some(tile_size) = tile_size {
                builder = builder.tile_size(tile_size);
            }
            let set = builder.build()?;
            print(&set, args.format, args.full)
        }

        Command::Tiles {
            request,
            level,
            bbox,
        } => {
            let request = PyramidRequest::load(&request)?;
            let set = request.to_builder(&config)?.build()?;
            let matrix = set
                .get(&level)
                .with_context(|| format!("No tile matrix '{}' in {}", level, set.identifier()))?;
            let query = parse_bbox(&bbox, &request.crs)?;
            let tiles = matrix.tiles_in_envelope(&query)?;
            println!("{}", tiles);
            Ok(())
        }
    }
}

fn parse_bbox(bbox: &str, crs: &str) -> Result<Envelope> {
    let crs = Crs::parse(crs).with_context(|| format!("Unsupported CRS: {}", crs))?;
    Envelope::parse_bbox(bbox, crs).with_context(|| format!("Invalid bbox: {}", bbox))
}

fn print(set: &TileMatrixSet, format: OutputFormat, full: bool) -> Result<()> {
    println!("{}", render(set, format, full)?);
    Ok(())
}
