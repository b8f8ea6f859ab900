//! Core library for tiling very large polygons on a regular square grid.
//!
//! A [`TiledPolygon`] cuts the rings of a polygon into fragments, one per grid
//! cell they cross, and records where each ring crosses the grid. Once built it
//! can regenerate the complete polygon, or only the part of the polygon that
//! lies inside one tile, without scanning the whole boundary again.
//!
//! # Examples
//!
//! ```
//! use tiledpoly_core::{TiledPolygon, TileId, TilingConfig};
//!
//! let config = TilingConfig::new(10.0, 1.0, 1000.0);
//! let tiled = TiledPolygon::from_wkt(&config, "POLYGON((1 1,1 19,9 19,9 1,1 1))").unwrap();
//!
//! assert_eq!(tiled.tiles(None), vec![TileId::new(0, 0), TileId::new(0, 1)]);
//! assert_eq!(tiled.tile_polygons(TileId::new(0, 1)).unwrap().len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bbox;
pub mod coordsys;
pub mod fragment;
pub mod grid;
pub mod intersection;
pub mod render;
pub mod tile;
pub mod tiled_polygon;
pub mod validate;
pub mod wkt;

pub use bbox::BBox;
pub use grid::{Edge, Grid, TileId};
pub use tiled_polygon::{RingRef, TiledPolygon};

use crate::validate::InvalidReason;

/// Errors raised while building or querying a tiled polygon
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid tiling configuration: {0}")]
    Config(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid ring {ring}: {reason}")]
    InvalidRing { ring: usize, reason: InvalidReason },

    #[error("Degenerate geometry in ring {ring}: {reason}")]
    Degenerate { ring: usize, reason: String },

    #[error("Topology inconsistency: {0}")]
    Topology(String),

    #[error("Coordinate conversion failed: {0}")]
    CoordSys(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Cannot write output: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Grid parameters shared by every tile of a tiled polygon.
///
/// The values are checked by [`Grid::new`] before any tile is created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilingConfig {
    /// Side length of one grid cell
    pub tile_size: f64,
    /// Smallest meaningful coordinate increment
    pub resolution: f64,
    /// Maximum absolute coordinate magnitude
    pub range: f64,
}

impl TilingConfig {
    /// Create a config from its three grid parameters.
    pub fn new(tile_size: f64, resolution: f64, range: f64) -> Self {
        Self {
            tile_size,
            resolution,
            range,
        }
    }

    /// Set the tile size.
    pub fn with_tile_size(mut self, tile_size: f64) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the coordinate resolution.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the coordinate range.
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }
}
