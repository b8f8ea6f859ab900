//! One grid cell of a tiled polygon.
//!
//! A [`PolygonTile`] owns the fragments of every ring that passes through its
//! cell and the heads of two intersection lists: crossings of its south side
//! (`axis_x`, sorted west to east) and of its west side (`axis_y`, sorted south
//! to north). Crossings of its north and east sides live in the lists of the
//! northern and eastern neighbours.
//!
//! Rings are expected clockwise for the exterior and counter-clockwise for
//! holes, which keeps the polygon interior on the right-hand side of every
//! fragment.

use geo::{Contains, Coord, LineString, Point, Polygon};

use crate::fragment::{Crossing, Fragment, FragmentKind};
use crate::grid::{Corner, Edge, Grid, TileId};
use crate::intersection::{IntersectionArena, IntersectionId};
use crate::{Error, Result};

/// Address of a fragment: the tile holding it and its index in that tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingRef {
    pub tile: TileId,
    pub fragment: usize,
}

impl RingRef {
    pub fn new(tile: TileId, fragment: usize) -> Self {
        Self { tile, fragment }
    }
}

/// Read-only state a tile needs from the rest of the polygon to rebuild its
/// own geometry.
#[derive(Debug, Clone, Copy)]
pub struct TileContext<'a> {
    pub grid: &'a Grid,
    pub intersections: &'a IntersectionArena,
    /// `axis_x` head of the northern neighbour
    pub north_axis_x: Option<IntersectionId>,
    /// `axis_y` head of the eastern neighbour
    pub east_axis_y: Option<IntersectionId>,
}

#[derive(Debug, Clone)]
pub struct PolygonTile {
    id: TileId,
    fragments: Vec<Fragment>,
    axis_x: Option<IntersectionId>,
    axis_y: Option<IntersectionId>,
}

impl PolygonTile {
    pub fn new(id: TileId) -> Self {
        Self {
            id,
            fragments: Vec::new(),
            axis_x: None,
            axis_y: None,
        }
    }

    /// Tile lying entirely inside the polygon
    pub fn interior(id: TileId) -> Self {
        let mut tile = Self::new(id);
        tile.fragments.push(Fragment::InteriorSentinel);
        tile
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Head of the south side crossing list
    pub fn axis_x(&self) -> Option<IntersectionId> {
        self.axis_x
    }

    /// Head of the west side crossing list
    pub fn axis_y(&self) -> Option<IntersectionId> {
        self.axis_y
    }

    pub fn fragment(&self, index: usize) -> Result<&Fragment> {
        self.fragments.get(index).ok_or_else(|| {
            Error::Topology(format!("tile {} has no fragment {}", self.id, index))
        })
    }

    pub(crate) fn fragment_mut(&mut self, index: usize) -> Result<&mut Fragment> {
        let id = self.id;
        self.fragments
            .get_mut(index)
            .ok_or_else(|| Error::Topology(format!("tile {} has no fragment {}", id, index)))
    }

    /// Crossing list for one of the sides this tile owns
    pub(crate) fn axis_mut(&mut self, edge: Edge) -> Result<&mut Option<IntersectionId>> {
        match edge {
            Edge::South => Ok(&mut self.axis_x),
            Edge::West => Ok(&mut self.axis_y),
            Edge::North | Edge::East => Err(Error::Topology(format!(
                "tile {} does not own its {} side",
                self.id, edge
            ))),
        }
    }

    /// Add a fragment, replacing the interior sentinel if it is still there.
    pub(crate) fn push_fragment(&mut self, fragment: Fragment) -> usize {
        match self.fragments.first_mut() {
            Some(first) if first.kind() == FragmentKind::InteriorSentinel => {
                *first = fragment;
                0
            }
            _ => {
                self.fragments.push(fragment);
                self.fragments.len() - 1
            }
        }
    }

    /// Consume the run of `points` starting at `cursor` that stays in this
    /// tile and store it as a fragment.
    ///
    /// # Arguments
    ///
    /// * `cursor` - Index of the first point of the run, advanced past it
    /// * `first` - Fragment created by the ring's first cut, if any
    /// * `exterior` - Whether the ring is the polygon's exterior ring
    ///
    /// # Returns
    ///
    /// Index of the fragment that received the points. When the run reaches
    /// the end of the ring, the points either form a closed interior loop or
    /// are folded into the front of `first`.
    pub(crate) fn cut(
        &mut self,
        grid: &Grid,
        points: &[Coord<f64>],
        cursor: &mut usize,
        first: Option<usize>,
        exterior: bool,
    ) -> Result<usize> {
        let begin = *cursor;
        while *cursor < points.len() && grid.tile_of(points[*cursor]) == self.id {
            *cursor += 1;
        }
        if *cursor == begin {
            return Err(Error::Topology(format!(
                "cut in tile {} started on a point outside it",
                self.id
            )));
        }

        let run = points[begin..*cursor].to_vec();
        if *cursor < points.len() {
            return Ok(self.push_fragment(Fragment::arc(run)));
        }

        match first {
            None => {
                self.fragments.push(Fragment::interior_loop(run, exterior));
                Ok(self.fragments.len() - 1)
            }
            Some(index) => {
                self.fragment_mut(index)?.prepend_points(run)?;
                Ok(index)
            }
        }
    }

    /// Fragment that follows `index` along its ring.
    ///
    /// An interior loop is its own successor.
    pub fn next_ring_ref(&self, index: usize, intersections: &IntersectionArena) -> Result<RingRef> {
        let fragment = self.fragment(index)?;
        match (fragment.kind(), fragment.end()) {
            (FragmentKind::InteriorLoop, _) => Ok(RingRef::new(self.id, index)),
            (FragmentKind::Normal | FragmentKind::PassThrough, Some(end)) => {
                let gi = intersections.get(end.intersection);
                let next = if end.edge.owned_by_neighbor() {
                    gi.inside.if_forward()
                } else {
                    gi.outside.if_reversed()
                };
                let next = next.ok_or_else(|| {
                    Error::Topology(format!(
                        "crossing on {} side of tile {} points the wrong way",
                        end.edge, self.id
                    ))
                })?;
                Ok(RingRef::new(self.id.neighbor(end.edge), next))
            }
            (kind, _) => Err(Error::Topology(format!(
                "{:?} fragment {} of tile {} has no successor",
                kind, index, self.id
            ))),
        }
    }

    /// Polygons covering the part of the source polygon inside this tile
    pub fn reconstruct_polygons(&self, ctx: &TileContext<'_>) -> Result<Vec<Polygon<f64>>> {
        let mut exteriors: Vec<LineString<f64>> = Vec::new();
        let mut holes: Vec<LineString<f64>> = Vec::new();
        let mut visited = vec![false; self.fragments.len()];

        for (index, fragment) in self.fragments.iter().enumerate() {
            if visited[index] {
                continue;
            }
            match fragment {
                Fragment::InteriorSentinel => {
                    visited[index] = true;
                    exteriors.push(self.square(ctx.grid));
                }
                Fragment::InteriorLoop { points, exterior } => {
                    visited[index] = true;
                    let ring = LineString::new(points.clone());
                    if *exterior || self.fragments.len() == 1 {
                        exteriors.push(ring);
                    } else {
                        holes.push(ring);
                    }
                }
                Fragment::Arc { .. } | Fragment::PassThrough { .. } => {
                    exteriors.push(self.walk_border(ctx, index, &mut visited)?);
                }
            }
        }

        log::trace!(
            "Tile {}: {} exterior(s), {} hole(s)",
            self.id,
            exteriors.len(),
            holes.len()
        );

        self.assign_holes(exteriors, holes)
    }

    /// Whole cell, clockwise
    fn square(&self, grid: &Grid) -> LineString<f64> {
        LineString::new(vec![
            grid.corner(self.id, Corner::SouthWest),
            grid.corner(self.id, Corner::NorthWest),
            grid.corner(self.id, Corner::NorthEast),
            grid.corner(self.id, Corner::SouthEast),
            grid.corner(self.id, Corner::SouthWest),
        ])
    }

    /// Follow fragments and the tile border from `start` until the walk comes
    /// back to it.
    fn walk_border(
        &self,
        ctx: &TileContext<'_>,
        start: usize,
        visited: &mut [bool],
    ) -> Result<LineString<f64>> {
        let mut points = Vec::new();
        let mut index = start;

        for _ in 0..=self.fragments.len() {
            visited[index] = true;
            points.extend(
                self.fragment(index)?
                    .complete_points(self.id, ctx.grid, ctx.intersections)?,
            );

            index = self.next_fragment_inside(ctx, index, &mut points)?;
            if visited[index] {
                if index != start {
                    return Err(Error::Topology(format!(
                        "border walk in tile {} reached fragment {} instead of closing on {}",
                        self.id, index, start
                    )));
                }
                if let Some(&first) = points.first() {
                    points.push(first);
                }
                return Ok(LineString::new(points));
            }
        }

        Err(Error::Topology(format!(
            "border walk in tile {} from fragment {} did not close",
            self.id, start
        )))
    }

    /// Next fragment met when following the tile border clockwise from the
    /// end of fragment `index`. Corners passed on the way are appended to
    /// `points`.
    pub(crate) fn next_fragment_inside(
        &self,
        ctx: &TileContext<'_>,
        index: usize,
        points: &mut Vec<Coord<f64>>,
    ) -> Result<usize> {
        let Some(Crossing {
            mut edge,
            intersection,
        }) = self.fragment(index)?.end()
        else {
            return Err(Error::Topology(format!(
                "fragment {} of tile {} does not leave the tile",
                index, self.id
            )));
        };

        let arena = ctx.intersections;
        let current = arena.get(intersection);
        // clockwise means decreasing positions on the east and south sides
        let mut candidate = match edge {
            Edge::West | Edge::North => current.next(),
            Edge::East | Edge::South => current.prev(),
        };

        let mut rotations = 0;
        let found = loop {
            if let Some(found) = candidate {
                break found;
            }
            if rotations == 4 {
                return Err(Error::Topology(format!(
                    "no crossing found on the border of tile {}",
                    self.id
                )));
            }
            rotations += 1;
            edge = edge.clockwise();
            points.push(ctx.grid.corner(self.id, Corner::before(edge)));
            candidate = match edge {
                Edge::East => arena.last_of(ctx.east_axis_y),
                Edge::South => arena.last_of(self.axis_x),
                Edge::West => self.axis_y,
                Edge::North => ctx.north_axis_x,
            };
        };

        let gi = arena.get(found);
        let entering = if edge.owned_by_neighbor() {
            gi.outside.if_reversed()
        } else {
            gi.inside.if_forward()
        };
        entering.ok_or_else(|| {
            Error::Topology(format!(
                "crossing on {} side of tile {} leaves the tile where it should enter",
                edge, self.id
            ))
        })
    }

    /// Attach every hole to the exterior that contains it
    fn assign_holes(
        &self,
        mut exteriors: Vec<LineString<f64>>,
        holes: Vec<LineString<f64>>,
    ) -> Result<Vec<Polygon<f64>>> {
        if exteriors.len() == 1 {
            let exterior = exteriors.remove(0);
            return Ok(vec![Polygon::new(exterior, holes)]);
        }
        if holes.is_empty() {
            return Ok(exteriors
                .into_iter()
                .map(|exterior| Polygon::new(exterior, vec![]))
                .collect());
        }

        let shells: Vec<Polygon<f64>> = exteriors
            .iter()
            .map(|exterior| Polygon::new(exterior.clone(), vec![]))
            .collect();
        let mut grouped: Vec<Vec<LineString<f64>>> = vec![Vec::new(); exteriors.len()];

        for hole in holes {
            let owner = shells
                .iter()
                .position(|shell| hole.coords().any(|c| shell.contains(&Point::from(*c))))
                .ok_or_else(|| {
                    Error::Topology(format!(
                        "hole in tile {} lies outside every exterior",
                        self.id
                    ))
                })?;
            grouped[owner].push(hole);
        }

        Ok(exteriors
            .into_iter()
            .zip(grouped)
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect())
    }
}
