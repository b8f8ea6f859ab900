//! CLI for tiledpoly - tile a polygon on a square grid and query it
//!
//! This is a thin wrapper around the tiledpoly-core library.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tiledpoly_core::coordsys::{reproject_polygon, CoordSys};
use tiledpoly_core::render::SvgDrawing;
use tiledpoly_core::wkt::{parse_polygon, polygon_to_wkt, polygons_to_wkt};
use tiledpoly_core::{BBox, TileId, TiledPolygon, TilingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "tiledpoly",
    about = "Tile a large polygon on a square grid and extract per-tile parts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Polygon as WKT text, or @path to a file holding it
    #[arg(value_name = "POLYGON")]
    input: String,

    /// JSON file with tile_size, resolution and range
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side length of a grid cell
    #[arg(long)]
    tile_size: Option<f64>,

    /// Smallest meaningful coordinate increment
    #[arg(long)]
    resolution: Option<f64>,

    /// Maximum absolute coordinate value
    #[arg(long)]
    range: Option<f64>,

    /// Coordinate system of the input (geo, wm, l93)
    #[arg(long, requires = "to")]
    from: Option<CoordSys>,

    /// Coordinate system to tile in (geo, wm, l93)
    #[arg(long, requires = "from")]
    to: Option<CoordSys>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the reconstructed polygon as WKT
    Polygon {
        #[command(flatten)]
        grid: GridArgs,
    },

    /// List the tiles touched by the polygon, one "ix,iy" per line
    Tiles {
        /// Only list tiles intersecting xmin,ymin,xmax,ymax
        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<BBox>,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Print the part of the polygon inside one tile as WKT
    Tile {
        #[arg(allow_negative_numbers = true)]
        ix: i32,
        #[arg(allow_negative_numbers = true)]
        iy: i32,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Draw the grid, the polygon and its per-tile parts as SVG
    Svg {
        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,

        /// Canvas width in pixels
        #[arg(long, default_value = "800")]
        width: u32,

        /// Canvas height in pixels
        #[arg(long, default_value = "800")]
        height: u32,

        #[command(flatten)]
        grid: GridArgs,
    },
}

impl Command {
    fn grid(&self) -> &GridArgs {
        match self {
            Command::Polygon { grid }
            | Command::Tiles { grid, .. }
            | Command::Tile { grid, .. }
            | Command::Svg { grid, .. } => grid,
        }
    }
}

fn parse_bbox(s: &str) -> Result<BBox> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid bbox '{}'", s))?;
    let [xmin, ymin, xmax, ymax] = values[..] else {
        bail!("Expected xmin,ymin,xmax,ymax, got '{}'", s);
    };
    Ok(BBox::new(
        geo::Coord { x: xmin, y: ymin },
        geo::Coord { x: xmax, y: ymax },
    ))
}

impl GridArgs {
    /// Config file values, overridden by explicit flags
    fn tiling_config(&self) -> Result<TilingConfig> {
        let base = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                let config: TilingConfig = serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?;
                Some(config)
            }
            None => None,
        };

        let pick = |flag: Option<f64>, from_file: Option<f64>, name: &str| {
            flag.or(from_file)
                .with_context(|| format!("Missing --{} (or a --config file)", name))
        };
        Ok(TilingConfig::new(
            pick(self.tile_size, base.map(|c| c.tile_size), "tile-size")?,
            pick(self.resolution, base.map(|c| c.resolution), "resolution")?,
            pick(self.range, base.map(|c| c.range), "range")?,
        ))
    }

    fn read_polygon(&self) -> Result<geo::Polygon<f64>> {
        let text = match self.input.strip_prefix('@') {
            Some(path) => {
                fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
            }
            None => self.input.clone(),
        };
        let polygon = parse_polygon(&text).context("Failed to parse input polygon")?;

        match (self.from, self.to) {
            (Some(from), Some(to)) => {
                log::info!("Reprojecting input from {} to {}", from, to);
                reproject_polygon(from, to, &polygon).context("Failed to reproject input")
            }
            _ => Ok(polygon),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let grid = cli.command.grid();
    let config = grid.tiling_config()?;
    let polygon = grid.read_polygon()?;
    let tiled = TiledPolygon::new(&config, &polygon).context("Failed to tile polygon")?;
    log::info!(
        "Tiled {} ring(s) into {} tile(s), {} fragment(s)",
        tiled.ring_count(),
        tiled.tile_count(),
        tiled.fragment_count()
    );

    match cli.command {
        Command::Polygon { .. } => {
            let polygon = tiled.polygon().context("Failed to rebuild polygon")?;
            println!("{}", polygon_to_wkt(&polygon)?);
        }
        Command::Tiles { bbox, .. } => {
            for id in tiled.tiles(bbox.as_ref()) {
                println!("{}", id);
            }
        }
        Command::Tile { ix, iy, .. } => {
            let id = TileId::new(ix, iy);
            let polygons = tiled
                .tile_polygons(id)
                .with_context(|| format!("Failed to rebuild tile {}", id))?;
            println!("{}", polygons_to_wkt(&polygons)?);
        }
        Command::Svg {
            output,
            width,
            height,
            ..
        } => {
            let mut world = BBox::from_coords(polygon.exterior().coords());
            for id in tiled.tiles(None) {
                world.expand(&tiled.grid().tile_bounds(id));
            }

            let mut drawing = SvgDrawing::new(&world, width, height)?;
            drawing.draw_grid(tiled.grid(), "#bbbbbb");
            for id in tiled.tiles(None) {
                for part in tiled.tile_polygons(id)? {
                    drawing.draw_polygon(&part, "#2060a0", "#a0c0e0");
                }
            }
            drawing.draw_line_string(polygon.exterior(), "#c03020", 1.5);
            for hole in polygon.interiors() {
                drawing.draw_line_string(hole, "#c03020", 1.5);
            }

            fs::write(&output, drawing.finish())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("✓ Wrote {}", output.display());
        }
    }

    Ok(())
}
