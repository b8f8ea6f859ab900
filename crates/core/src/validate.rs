//! Input ring validation.
//!
//! Rings are checked before any tile is built so the tiling walk only ever
//! sees closed rings with a non-zero area whose vertices lie inside the
//! configured coordinate range. Consecutive duplicate vertices are dropped
//! rather than rejected.
//!
//! # Usage
//!
//! ```
//! use tiledpoly_core::validate::validate_ring;
//! use tiledpoly_core::{Grid, TilingConfig};
//! use geo::{Coord, LineString};
//!
//! let grid = Grid::new(&TilingConfig::new(10.0, 1.0, 1000.0)).unwrap();
//! let ring = LineString::new(vec![
//!     Coord { x: 1.0, y: 1.0 },
//!     Coord { x: 1.0, y: 9.0 },
//!     Coord { x: 9.0, y: 9.0 },
//! ]);
//! let ring = validate_ring(&grid, 0, &ring).unwrap();
//! assert!(ring.is_closed());
//! ```

use geo::{Area, Coord, LineString, Polygon};

use crate::grid::Grid;
use crate::{Error, Result};

/// Minimum number of points for a valid ring (3 unique + closing = 4)
pub const MIN_RING_POINTS: usize = 4;

/// Reason why an input ring is rejected
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidReason {
    #[error("ring has {point_count} points, at least 4 are required")]
    TooFewPoints { point_count: usize },

    #[error("point {index} is not finite")]
    NonFinite { index: usize },

    #[error("point {index} ({x}, {y}) lies outside the coordinate range {range}")]
    OutOfRange {
        index: usize,
        x: f64,
        y: f64,
        range: f64,
    },

    #[error("ring has zero area")]
    ZeroArea,
}

/// Check a ring and return a cleaned, closed copy of it.
///
/// # Arguments
/// * `grid` - Grid whose range bounds the coordinates
/// * `ring_index` - Position of the ring in its polygon, used in errors
/// * `ring` - Ring to check, closed or not
///
/// # Returns
/// The ring without consecutive duplicate points, closed.
///
/// # Errors
/// [`Error::InvalidRing`] naming the first problem found.
pub fn validate_ring(
    grid: &Grid,
    ring_index: usize,
    ring: &LineString<f64>,
) -> Result<LineString<f64>> {
    let invalid = |reason| Error::InvalidRing {
        ring: ring_index,
        reason,
    };

    let range = grid.range();
    for (index, c) in ring.coords().enumerate() {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(invalid(InvalidReason::NonFinite { index }));
        }
        if c.x.abs() > range || c.y.abs() > range {
            return Err(invalid(InvalidReason::OutOfRange {
                index,
                x: c.x,
                y: c.y,
                range,
            }));
        }
    }

    let mut points: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len() + 1);
    let mut duplicates = 0;
    for c in ring.coords() {
        if points.last() == Some(c) {
            duplicates += 1;
        } else {
            points.push(*c);
        }
    }
    if duplicates > 0 {
        log::warn!(
            "Ring {}: dropped {} consecutive duplicate point(s)",
            ring_index,
            duplicates
        );
    }

    let mut cleaned = LineString::new(points);
    cleaned.close();

    if cleaned.0.len() < MIN_RING_POINTS {
        return Err(invalid(InvalidReason::TooFewPoints {
            point_count: cleaned.0.len(),
        }));
    }

    if Polygon::new(cleaned.clone(), vec![]).unsigned_area() == 0.0 {
        return Err(invalid(InvalidReason::ZeroArea));
    }

    Ok(cleaned)
}
