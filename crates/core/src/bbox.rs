//! Axis-aligned bounding boxes used for tile queries.
//!
//! A [`BBox`] starts empty and grows as coordinates are bounded into it. Both
//! bounds are inclusive, so a box touching a grid line selects the tiles on
//! both sides of it.

use geo::{Coord, Polygon, Rect};

/// Inclusive bounding box, possibly empty
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    rect: Option<Rect<f64>>,
}

impl BBox {
    /// Create a bounding box from two opposite corners, in any order
    pub fn new(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self {
            rect: Some(Rect::new(a, b)),
        }
    }

    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self { rect: None }
    }

    /// Smallest box containing every coordinate of `coords`
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Self {
        let mut bbox = Self::empty();
        for coord in coords {
            bbox.bound(*coord);
        }
        bbox
    }

    /// Check if the box has not bounded anything yet
    pub fn is_empty(&self) -> bool {
        self.rect.is_none()
    }

    /// Grow the box so it contains `coord`
    pub fn bound(&mut self, coord: Coord<f64>) {
        self.rect = Some(match self.rect {
            None => Rect::new(coord, coord),
            Some(rect) => Rect::new(
                Coord {
                    x: rect.min().x.min(coord.x),
                    y: rect.min().y.min(coord.y),
                },
                Coord {
                    x: rect.max().x.max(coord.x),
                    y: rect.max().y.max(coord.y),
                },
            ),
        });
    }

    /// Grow the box so it contains `other`
    pub fn expand(&mut self, other: &Self) {
        if let Some(rect) = other.rect {
            self.bound(rect.min());
            self.bound(rect.max());
        }
    }

    pub fn min(&self) -> Option<Coord<f64>> {
        self.rect.map(|rect| rect.min())
    }

    pub fn max(&self) -> Option<Coord<f64>> {
        self.rect.map(|rect| rect.max())
    }

    pub fn rect(&self) -> Option<Rect<f64>> {
        self.rect
    }

    /// Width of the box, zero when empty
    pub fn width(&self) -> f64 {
        self.rect.map_or(0.0, |rect| rect.width())
    }

    /// Height of the box, zero when empty
    pub fn height(&self) -> f64 {
        self.rect.map_or(0.0, |rect| rect.height())
    }

    /// Check if `coord` lies inside the box or on its border
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        self.rect.is_some_and(|rect| {
            coord.x >= rect.min().x
                && coord.x <= rect.max().x
                && coord.y >= rect.min().y
                && coord.y <= rect.max().y
        })
    }

    /// Check if two boxes share at least one point
    pub fn intersects(&self, other: &Self) -> bool {
        match (self.rect, other.rect) {
            (Some(a), Some(b)) => {
                a.min().x <= b.max().x
                    && b.min().x <= a.max().x
                    && a.min().y <= b.max().y
                    && b.min().y <= a.max().y
            }
            _ => false,
        }
    }

    /// Box outline as a polygon, `None` when empty
    pub fn to_polygon(&self) -> Option<Polygon<f64>> {
        self.rect.map(|rect| rect.to_polygon())
    }
}
