//! Pieces of a ring confined to a single tile.

use geo::Coord;

use crate::grid::{Edge, Grid, TileId};
use crate::intersection::{IntersectionArena, IntersectionId};
use crate::{Error, Result};

/// Where a fragment enters or leaves its tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    /// Side of the fragment's own tile
    pub edge: Edge,
    pub intersection: IntersectionId,
}

impl Crossing {
    pub fn new(edge: Edge, intersection: IntersectionId) -> Self {
        Self { edge, intersection }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Normal,
    InteriorLoop,
    PassThrough,
    InteriorSentinel,
}

/// Part of one ring inside one tile
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Consecutive ring vertices that enter and leave the tile
    Arc {
        start: Option<Crossing>,
        points: Vec<Coord<f64>>,
        end: Option<Crossing>,
    },
    /// A segment that crosses the tile without a vertex inside it
    PassThrough {
        start: Option<Crossing>,
        end: Option<Crossing>,
    },
    /// A closed ring that never leaves the tile. `exterior` is set when the
    /// ring is the polygon's exterior ring.
    InteriorLoop {
        points: Vec<Coord<f64>>,
        exterior: bool,
    },
    /// Marks a tile that lies entirely inside the polygon
    InteriorSentinel,
}

impl Fragment {
    /// Open arc whose crossings are linked afterwards
    pub fn arc(points: Vec<Coord<f64>>) -> Self {
        Fragment::Arc {
            start: None,
            points,
            end: None,
        }
    }

    pub fn pass_through() -> Self {
        Fragment::PassThrough {
            start: None,
            end: None,
        }
    }

    pub fn interior_loop(points: Vec<Coord<f64>>, exterior: bool) -> Self {
        Fragment::InteriorLoop { points, exterior }
    }

    pub fn kind(&self) -> FragmentKind {
        match self {
            Fragment::Arc { .. } => FragmentKind::Normal,
            Fragment::PassThrough { .. } => FragmentKind::PassThrough,
            Fragment::InteriorLoop { .. } => FragmentKind::InteriorLoop,
            Fragment::InteriorSentinel => FragmentKind::InteriorSentinel,
        }
    }

    /// Ring vertices held by the fragment, without crossing points
    pub fn points(&self) -> &[Coord<f64>] {
        match self {
            Fragment::Arc { points, .. } | Fragment::InteriorLoop { points, .. } => points,
            Fragment::PassThrough { .. } | Fragment::InteriorSentinel => &[],
        }
    }

    pub fn start(&self) -> Option<Crossing> {
        match self {
            Fragment::Arc { start, .. } | Fragment::PassThrough { start, .. } => *start,
            _ => None,
        }
    }

    pub fn end(&self) -> Option<Crossing> {
        match self {
            Fragment::Arc { end, .. } | Fragment::PassThrough { end, .. } => *end,
            _ => None,
        }
    }

    pub(crate) fn set_start(&mut self, crossing: Crossing) -> Result<()> {
        let kind = self.kind();
        match self {
            Fragment::Arc { start, .. } | Fragment::PassThrough { start, .. } if start.is_none() => {
                *start = Some(crossing);
                Ok(())
            }
            _ => Err(Error::Topology(format!(
                "cannot set start crossing on {:?} fragment",
                kind
            ))),
        }
    }

    pub(crate) fn set_end(&mut self, crossing: Crossing) -> Result<()> {
        let kind = self.kind();
        match self {
            Fragment::Arc { end, .. } | Fragment::PassThrough { end, .. } if end.is_none() => {
                *end = Some(crossing);
                Ok(())
            }
            _ => Err(Error::Topology(format!(
                "cannot set end crossing on {:?} fragment",
                kind
            ))),
        }
    }

    /// Put the tail of a closed ring in front of this arc. The last point of
    /// `tail` repeats the ring's first vertex and is dropped.
    pub(crate) fn prepend_points(&mut self, mut tail: Vec<Coord<f64>>) -> Result<()> {
        let kind = self.kind();
        match self {
            Fragment::Arc { points, .. } => {
                tail.pop();
                tail.append(points);
                *points = tail;
                Ok(())
            }
            _ => Err(Error::Topology(format!(
                "cannot prepend points to {:?} fragment",
                kind
            ))),
        }
    }

    /// Points of the fragment framed by its two crossing points.
    ///
    /// Loops return their points unchanged and sentinels return nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Topology`] for an arc or pass-through missing a crossing.
    pub fn complete_points(
        &self,
        tile: TileId,
        grid: &Grid,
        intersections: &IntersectionArena,
    ) -> Result<Vec<Coord<f64>>> {
        match self {
            Fragment::Arc { .. } | Fragment::PassThrough { .. } => {
                let (Some(start), Some(end)) = (self.start(), self.end()) else {
                    return Err(Error::Topology(format!(
                        "unlinked {:?} fragment in tile {}",
                        self.kind(),
                        tile
                    )));
                };
                let mut points = Vec::with_capacity(self.points().len() + 2);
                points.push(crossing_point(grid, intersections, tile, start));
                points.extend_from_slice(self.points());
                points.push(crossing_point(grid, intersections, tile, end));
                Ok(points)
            }
            Fragment::InteriorLoop { points, .. } => Ok(points.clone()),
            Fragment::InteriorSentinel => Ok(Vec::new()),
        }
    }
}

/// Location of a crossing on the unshifted side of `tile`
pub fn crossing_point(
    grid: &Grid,
    intersections: &IntersectionArena,
    tile: TileId,
    crossing: Crossing,
) -> Coord<f64> {
    let position = intersections.get(crossing.intersection).position;
    grid.edge_point(tile, crossing.edge, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::{FragmentRef, GridIntersection};
    use crate::TilingConfig;
    use geo::coord;

    #[test]
    fn test_kind_and_points() {
        let arc = Fragment::arc(vec![coord! { x: 1.0, y: 1.0 }]);
        assert_eq!(arc.kind(), FragmentKind::Normal);
        assert_eq!(arc.points().len(), 1);
        assert!(Fragment::pass_through().points().is_empty());
        assert_eq!(Fragment::InteriorSentinel.kind(), FragmentKind::InteriorSentinel);
        assert_eq!(
            Fragment::interior_loop(vec![], true).kind(),
            FragmentKind::InteriorLoop
        );
    }

    #[test]
    fn test_prepend_points_drops_repeated_vertex() {
        let mut arc = Fragment::arc(vec![coord! { x: 1.0, y: 1.0 }, coord! { x: 1.0, y: 9.0 }]);
        arc.prepend_points(vec![
            coord! { x: 9.0, y: 1.0 },
            coord! { x: 1.0, y: 1.0 },
        ])
        .unwrap();

        assert_eq!(
            arc.points(),
            &[
                coord! { x: 9.0, y: 1.0 },
                coord! { x: 1.0, y: 1.0 },
                coord! { x: 1.0, y: 9.0 },
            ]
        );
        assert!(Fragment::InteriorSentinel.prepend_points(vec![]).is_err());
    }

    #[test]
    fn test_crossings_are_set_once() {
        let mut arena = IntersectionArena::new();
        let mut head = None;
        let id = arena.insert_sorted(
            &mut head,
            GridIntersection::new(0.5, FragmentRef::forward(0), FragmentRef::forward(0)),
        );

        let mut fragment = Fragment::pass_through();
        fragment.set_end(Crossing::new(Edge::North, id)).unwrap();
        assert!(fragment.set_end(Crossing::new(Edge::North, id)).is_err());
        assert!(Fragment::interior_loop(vec![], false)
            .set_start(Crossing::new(Edge::South, id))
            .is_err());
    }

    #[test]
    fn test_complete_points() {
        let grid = Grid::new(&TilingConfig::new(10.0, 1.0, 1000.0)).unwrap();
        let mut arena = IntersectionArena::new();
        let mut head = None;
        let south = arena.insert_sorted(
            &mut head,
            GridIntersection::new(0.2, FragmentRef::forward(0), FragmentRef::forward(0)),
        );
        let east = arena.insert_sorted(
            &mut head,
            GridIntersection::new(0.7, FragmentRef::forward(0), FragmentRef::forward(0)),
        );

        let mut arc = Fragment::arc(vec![coord! { x: 15.0, y: 15.0 }]);
        assert!(arc.complete_points(TileId::new(1, 1), &grid, &arena).is_err());

        arc.set_start(Crossing::new(Edge::South, south)).unwrap();
        arc.set_end(Crossing::new(Edge::East, east)).unwrap();
        let points = arc.complete_points(TileId::new(1, 1), &grid, &arena).unwrap();

        assert_eq!(points.len(), 3);
        assert!((points[0].x - 12.0).abs() < 1e-9 && points[0].y == 10.0);
        assert!(points[2].x == 20.0 && (points[2].y - 17.0).abs() < 1e-9);
    }
}
