//! Grid cell math and tile geometry
//!
//! The grid is an infinite lattice of square cells of side `tile_size` with a
//! cell corner at the origin. Points are assigned to cells with
//! [`Grid::stable_floor`], which snaps values sitting just below a grid line up
//! to the next cell so rounding noise cannot flip a point between two tiles.
//!
//! Ring crossings are computed against a copy of the grid shifted by a tiny
//! epsilon towards the south-west. No input vertex can lie exactly on a shifted
//! line, so every segment that changes tile crosses exactly one side of each
//! cell it enters or leaves.

use std::fmt;

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};

use crate::bbox::BBox;
use crate::{Error, Result, TilingConfig};

/// Relative precision used to derive the grid shift from the coordinate range
pub const EPSILON_FACTOR: f64 = 1e-13;

/// Ratio between the south and west shifts of the crossing grid
const SOUTH_SHIFT_RATIO: f64 = 1.11;

/// Integer coordinates of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub ix: i32,
    pub iy: i32,
}

impl TileId {
    pub fn new(ix: i32, iy: i32) -> Self {
        Self { ix, iy }
    }

    /// The cell across `edge`
    pub fn neighbor(&self, edge: Edge) -> Self {
        let (dx, dy) = edge.offset();
        Self::new(self.ix + dx, self.iy + dy)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.ix, self.iy)
    }
}

/// Side of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    North,
    East,
    South,
    West,
}

impl Edge {
    /// Order in which sides are probed when a segment skips over cells
    pub const PROBE_ORDER: [Edge; 4] = [Edge::South, Edge::East, Edge::North, Edge::West];

    /// Cell offset of the neighbour across this side
    pub fn offset(self) -> (i32, i32) {
        match self {
            Edge::North => (0, 1),
            Edge::East => (1, 0),
            Edge::South => (0, -1),
            Edge::West => (-1, 0),
        }
    }

    /// Side for a unit cell offset, `None` for anything but a direct neighbour
    pub fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, 1) => Some(Edge::North),
            (1, 0) => Some(Edge::East),
            (0, -1) => Some(Edge::South),
            (-1, 0) => Some(Edge::West),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Edge::North => Edge::South,
            Edge::East => Edge::West,
            Edge::South => Edge::North,
            Edge::West => Edge::East,
        }
    }

    /// Next side when walking the cell border clockwise
    pub fn clockwise(self) -> Self {
        match self {
            Edge::North => Edge::East,
            Edge::East => Edge::South,
            Edge::South => Edge::West,
            Edge::West => Edge::North,
        }
    }

    /// North and east sides are stored by the neighbouring cell, which sees
    /// them as its south and west sides.
    pub fn owned_by_neighbor(self) -> bool {
        matches!(self, Edge::North | Edge::East)
    }

    /// Check if positions along this side run in the x direction
    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::North | Edge::South)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Edge::North => "N",
            Edge::East => "E",
            Edge::South => "S",
            Edge::West => "W",
        };
        f.write_str(name)
    }
}

/// Corner of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    SouthWest,
    SouthEast,
    NorthEast,
    NorthWest,
}

impl Corner {
    fn offset(self) -> (i32, i32) {
        match self {
            Corner::SouthWest => (0, 0),
            Corner::SouthEast => (1, 0),
            Corner::NorthEast => (1, 1),
            Corner::NorthWest => (0, 1),
        }
    }

    /// Corner reached when the clockwise border walk turns onto `edge`
    pub fn before(edge: Edge) -> Self {
        match edge {
            Edge::East => Corner::NorthEast,
            Edge::South => Corner::SouthEast,
            Edge::West => Corner::SouthWest,
            Edge::North => Corner::NorthWest,
        }
    }
}

/// Validated grid parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    tile_size: f64,
    resolution: f64,
    range: f64,
    epsilon: f64,
}

impl Grid {
    /// Validate a tiling config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a parameter is not a positive finite
    /// number, when `range` is so large that the derived epsilon vanishes, or
    /// when the range spans more cells than a [`TileId`] can index.
    pub fn new(config: &TilingConfig) -> Result<Self> {
        let TilingConfig {
            tile_size,
            resolution,
            range,
        } = *config;

        for (name, value) in [
            ("tile_size", tile_size),
            ("resolution", resolution),
            ("range", range),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }

        let epsilon = range * EPSILON_FACTOR;
        if range + epsilon <= range || -range + epsilon <= -range {
            return Err(Error::Config(format!(
                "range {} is too large for an epsilon of {}",
                range, epsilon
            )));
        }

        if range / tile_size >= i32::MAX as f64 - 1.0 {
            return Err(Error::Config(format!(
                "range {} spans too many tiles of size {}",
                range, tile_size
            )));
        }

        log::debug!(
            "Grid: tile_size={}, resolution={}, range={}, epsilon={:e}",
            tile_size,
            resolution,
            range,
            epsilon
        );

        Ok(Self {
            tile_size,
            resolution,
            range,
            epsilon,
        })
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Floor of `x`, rounded up to the next integer when `x` is within a quarter
    /// of a resolution step (in tile units) below it.
    pub fn stable_floor(&self, x: f64) -> f64 {
        let floor = x.floor();
        if floor + 1.0 - x < self.resolution / self.tile_size / 4.0 {
            floor + 1.0
        } else {
            floor
        }
    }

    /// Cell holding `coord`
    pub fn tile_of(&self, coord: Coord<f64>) -> TileId {
        TileId::new(
            self.stable_floor(coord.x / self.tile_size) as i32,
            self.stable_floor(coord.y / self.tile_size) as i32,
        )
    }

    /// Unshifted corner of a cell
    pub fn corner(&self, tile: TileId, corner: Corner) -> Coord<f64> {
        let (dx, dy) = corner.offset();
        Coord {
            x: (tile.ix + dx) as f64 * self.tile_size,
            y: (tile.iy + dy) as f64 * self.tile_size,
        }
    }

    fn shifted_corner(&self, tile: TileId, corner: Corner) -> Coord<f64> {
        let c = self.corner(tile, corner);
        Coord {
            x: c.x - self.epsilon,
            y: c.y - self.epsilon * SOUTH_SHIFT_RATIO,
        }
    }

    /// Side of a cell on the shifted grid, oriented towards increasing x or y
    pub fn side(&self, tile: TileId, edge: Edge) -> Line<f64> {
        let (from, to) = match edge {
            Edge::South => (Corner::SouthWest, Corner::SouthEast),
            Edge::North => (Corner::NorthWest, Corner::NorthEast),
            Edge::West => (Corner::SouthWest, Corner::NorthWest),
            Edge::East => (Corner::SouthEast, Corner::NorthEast),
        };
        Line::new(
            self.shifted_corner(tile, from),
            self.shifted_corner(tile, to),
        )
    }

    /// Fractional position in `[0, 1)` where `segment` crosses the shifted
    /// `edge` of `tile`.
    ///
    /// Returns `None` when the segment misses the side or runs along it.
    pub fn crossing(&self, tile: TileId, edge: Edge, segment: Line<f64>) -> Option<f64> {
        let side = self.side(tile, edge);
        match line_intersection(segment, side)? {
            LineIntersection::SinglePoint { intersection, .. } => {
                let position = if edge.is_horizontal() {
                    (intersection.x - side.start.x) / self.tile_size
                } else {
                    (intersection.y - side.start.y) / self.tile_size
                };
                (0.0..1.0).contains(&position).then_some(position)
            }
            LineIntersection::Collinear { .. } => None,
        }
    }

    /// Point at `position` along the unshifted `edge` of `tile`
    pub fn edge_point(&self, tile: TileId, edge: Edge, position: f64) -> Coord<f64> {
        let offset = position * self.tile_size;
        match edge {
            Edge::North => self.corner(tile, Corner::NorthWest) + Coord { x: offset, y: 0.0 },
            Edge::South => self.corner(tile, Corner::SouthWest) + Coord { x: offset, y: 0.0 },
            Edge::West => self.corner(tile, Corner::SouthWest) + Coord { x: 0.0, y: offset },
            Edge::East => self.corner(tile, Corner::SouthEast) + Coord { x: 0.0, y: offset },
        }
    }

    /// Extent of a cell
    pub fn tile_bounds(&self, tile: TileId) -> BBox {
        BBox::new(
            self.corner(tile, Corner::SouthWest),
            self.corner(tile, Corner::NorthEast),
        )
    }

    /// Get all cells that intersect a bounding box
    ///
    /// # Arguments
    ///
    /// * `bbox` - Query box, inclusive on every side
    ///
    /// # Returns
    ///
    /// Iterator of TileId, row by row from the south-west cell. Empty when
    /// `bbox` is empty.
    pub fn tiles_for_bbox(&self, bbox: &BBox) -> impl Iterator<Item = TileId> {
        let (min_tile, max_tile) = match (bbox.min(), bbox.max()) {
            (Some(min), Some(max)) => (self.tile_of(min), self.tile_of(max)),
            _ => (TileId::new(0, 0), TileId::new(-1, -1)),
        };

        (min_tile.iy..=max_tile.iy).flat_map(move |iy| {
            (min_tile.ix..=max_tile.ix).map(move |ix| TileId::new(ix, iy))
        })
    }
}
