//! Polygon tiled on a regular grid.
//!
//! [`TiledPolygon`] is built once from the rings of a polygon and is read-only
//! afterwards. Building walks each ring, cutting it into per-tile fragments and
//! splicing consecutive fragments together through grid intersections. Queries
//! either follow the splices to rebuild whole rings, or walk one tile's
//! fragments and border to rebuild the part of the polygon inside that tile.

use std::collections::BTreeMap;

use geo::{Contains, Coord, Line, LineString, Point, Polygon, Winding};

use crate::bbox::BBox;
use crate::fragment::{Crossing, Fragment};
use crate::grid::{Edge, Grid, TileId};
use crate::intersection::{FragmentRef, GridIntersection, IntersectionArena};
use crate::tile::{PolygonTile, TileContext};
use crate::validate::validate_ring;
use crate::{wkt, Error, Result, TilingConfig};

pub use crate::tile::RingRef;

/// A polygon split into per-tile fragments
#[derive(Debug, Clone)]
pub struct TiledPolygon {
    grid: Grid,
    tiles: BTreeMap<TileId, PolygonTile>,
    intersections: IntersectionArena,
    ring_refs: Vec<RingRef>,
}

impl TiledPolygon {
    /// Tile a polygon.
    ///
    /// # Arguments
    ///
    /// * `config` - Grid parameters
    /// * `polygon` - Polygon to tile, in either orientation
    ///
    /// # Errors
    ///
    /// Any configuration, validation or construction error aborts the build.
    pub fn new(config: &TilingConfig, polygon: &Polygon<f64>) -> Result<Self> {
        let rings: Vec<LineString<f64>> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .cloned()
            .collect();
        Self::from_rings(config, &rings)
    }

    /// Tile a polygon given as rings, exterior first, then holes.
    pub fn from_rings(config: &TilingConfig, rings: &[LineString<f64>]) -> Result<Self> {
        let grid = Grid::new(config)?;
        if rings.is_empty() {
            return Err(Error::MalformedInput("polygon has no rings".to_string()));
        }

        let mut prepared = Vec::with_capacity(rings.len());
        for (index, ring) in rings.iter().enumerate() {
            let mut ring = validate_ring(&grid, index, ring)?;
            if index == 0 {
                ring.make_cw_winding();
            } else {
                ring.make_ccw_winding();
            }
            prepared.push(ring);
        }

        Self::build(grid, &prepared)
    }

    /// Tile a polygon given as WKT text.
    pub fn from_wkt(config: &TilingConfig, text: &str) -> Result<Self> {
        let polygon = wkt::parse_polygon(text)?;
        Self::new(config, &polygon)
    }

    fn build(grid: Grid, rings: &[LineString<f64>]) -> Result<Self> {
        let mut tiled = Self {
            grid,
            tiles: BTreeMap::new(),
            intersections: IntersectionArena::new(),
            ring_refs: Vec::with_capacity(rings.len()),
        };

        for (index, ring) in rings.iter().enumerate() {
            tiled.add_ring(index, &ring.0)?;
            if index == 0 {
                tiled.fill_interior_tiles(&ring.0);
            } else {
                tiled.clear_hole_tiles(&ring.0);
            }
        }

        log::debug!(
            "Built tiled polygon: {} ring(s), {} tile(s), {} fragment(s), {} intersection(s)",
            tiled.ring_refs.len(),
            tiled.tiles.len(),
            tiled.fragment_count(),
            tiled.intersections.len()
        );

        Ok(tiled)
    }

    /// Cut one closed ring into fragments and splice them together.
    fn add_ring(&mut self, ring: usize, points: &[Coord<f64>]) -> Result<()> {
        let grid = self.grid;
        let exterior = ring == 0;
        let mut cursor = 0;
        let mut first: Option<usize> = None;
        let mut previous: Option<RingRef> = None;

        while cursor < points.len() {
            let begin = cursor;
            let tile_id = grid.tile_of(points[cursor]);
            let fragment = self
                .tiles
                .entry(tile_id)
                .or_insert_with(|| PolygonTile::new(tile_id))
                .cut(&grid, points, &mut cursor, first, exterior)?;
            let current = RingRef::new(tile_id, fragment);

            match previous {
                None => {
                    self.ring_refs.push(current);
                    first = Some(fragment);
                }
                Some(previous) => {
                    self.splice(ring, points[begin - 1], points[begin], previous, current)?;
                }
            }
            previous = Some(current);
        }

        log::trace!("Ring {}: {} point(s) cut", ring, points.len());
        Ok(())
    }

    /// Link the end of `from` to the start of `to` across the segment `p0 -> p1`.
    fn splice(
        &mut self,
        ring: usize,
        p0: Coord<f64>,
        p1: Coord<f64>,
        from: RingRef,
        to: RingRef,
    ) -> Result<()> {
        let segment = Line::new(p0, p1);
        let dx = to.tile.ix - from.tile.ix;
        let dy = to.tile.iy - from.tile.iy;

        match Edge::from_offset(dx, dy) {
            Some(exit) => {
                let position = self.position_on(from.tile, exit, segment).ok_or_else(|| {
                    Error::Degenerate {
                        ring,
                        reason: format!(
                            "segment {:?} -> {:?} does not cross the {} side of tile {}",
                            p0, p1, exit, from.tile
                        ),
                    }
                })?;
                self.link(from, exit, to.fragment, position)
            }
            None => self.splice_multi_hop(ring, segment, from, to),
        }
    }

    /// Splice a segment that skips over one or more tiles, creating a
    /// pass-through fragment in each tile it crosses.
    fn splice_multi_hop(
        &mut self,
        ring: usize,
        segment: Line<f64>,
        from: RingRef,
        to: RingRef,
    ) -> Result<()> {
        let max_hops = (to.tile.ix - from.tile.ix).unsigned_abs()
            + (to.tile.iy - from.tile.iy).unsigned_abs()
            + 2;
        let mut current = from;
        let mut entered: Option<Edge> = None;

        for _ in 0..max_hops {
            if current.tile == to.tile {
                return Ok(());
            }

            let (exit, position) = Edge::PROBE_ORDER
                .into_iter()
                .filter(|edge| Some(*edge) != entered)
                .find_map(|edge| {
                    self.position_on(current.tile, edge, segment)
                        .map(|position| (edge, position))
                })
                .ok_or_else(|| Error::Degenerate {
                    ring,
                    reason: format!(
                        "segment {:?} -> {:?} leaves tile {} through no side",
                        segment.start, segment.end, current.tile
                    ),
                })?;

            let next_tile = current.tile.neighbor(exit);
            let next_fragment = if next_tile == to.tile {
                to.fragment
            } else {
                self.tiles
                    .entry(next_tile)
                    .or_insert_with(|| PolygonTile::new(next_tile))
                    .push_fragment(Fragment::pass_through())
            };

            self.link(current, exit, next_fragment, position)?;
            current = RingRef::new(next_tile, next_fragment);
            entered = Some(exit.opposite());
        }

        if current.tile == to.tile {
            Ok(())
        } else {
            Err(Error::Topology(format!(
                "segment {:?} -> {:?} did not reach tile {} within {} hops",
                segment.start, segment.end, to.tile, max_hops
            )))
        }
    }

    /// Crossing position of `segment` on a side of `tile`, measured on the
    /// tile that owns the side.
    fn position_on(&self, tile: TileId, edge: Edge, segment: Line<f64>) -> Option<f64> {
        if edge.owned_by_neighbor() {
            self.grid
                .crossing(tile.neighbor(edge), edge.opposite(), segment)
        } else {
            self.grid.crossing(tile, edge, segment)
        }
    }

    /// Record a crossing from `from` through its `exit` side into fragment
    /// `to_fragment` of the neighbouring tile.
    fn link(&mut self, from: RingRef, exit: Edge, to_fragment: usize, position: f64) -> Result<()> {
        let to_tile = from.tile.neighbor(exit);
        let (owner, owned_edge, inside, outside) = if exit.owned_by_neighbor() {
            (
                to_tile,
                exit.opposite(),
                FragmentRef::forward(to_fragment),
                FragmentRef::forward(from.fragment),
            )
        } else {
            (
                from.tile,
                exit,
                FragmentRef::backward(from.fragment),
                FragmentRef::backward(to_fragment),
            )
        };

        let owner_tile = self
            .tiles
            .entry(owner)
            .or_insert_with(|| PolygonTile::new(owner));
        let id = self.intersections.insert_sorted(
            owner_tile.axis_mut(owned_edge)?,
            GridIntersection::new(position, inside, outside),
        );

        self.tile_mut(from.tile)?
            .fragment_mut(from.fragment)?
            .set_end(Crossing::new(exit, id))?;
        self.tile_mut(to_tile)?
            .fragment_mut(to_fragment)?
            .set_start(Crossing::new(exit.opposite(), id))?;

        log::trace!(
            "Splice {}#{} -> {}#{} through {} side at {:.6}",
            from.tile,
            from.fragment,
            to_tile,
            to_fragment,
            exit,
            position
        );
        Ok(())
    }

    /// Ring coarsened to one point per tile, in tile index units, with the
    /// span of tile indices it covers
    fn coarse_ring(&self, points: &[Coord<f64>]) -> Option<(Polygon<f64>, TileId, TileId)> {
        let mut coarse: Vec<Coord<f64>> = Vec::new();
        let mut previous: Option<TileId> = None;
        for point in points {
            let id = self.grid.tile_of(*point);
            if previous != Some(id) {
                coarse.push(Coord {
                    x: id.ix as f64,
                    y: id.iy as f64,
                });
                previous = Some(id);
            }
        }

        let bbox = BBox::from_coords(&coarse);
        let (min, max) = (bbox.min()?, bbox.max()?);
        Some((
            Polygon::new(LineString::new(coarse), vec![]),
            TileId::new(min.x as i32, min.y as i32),
            TileId::new(max.x as i32, max.y as i32),
        ))
    }

    /// Tile indices strictly inside the coarsened ring
    fn tiles_inside(&self, points: &[Coord<f64>]) -> Vec<TileId> {
        let Some((coarse, min, max)) = self.coarse_ring(points) else {
            return Vec::new();
        };
        (min.ix..=max.ix)
            .flat_map(|ix| (min.iy..=max.iy).map(move |iy| TileId::new(ix, iy)))
            .filter(|id| coarse.contains(&Point::new(id.ix as f64, id.iy as f64)))
            .collect()
    }

    /// Create a sentinel tile for every absent tile lying inside the exterior
    /// ring.
    fn fill_interior_tiles(&mut self, points: &[Coord<f64>]) {
        let mut created = 0;
        for id in self.tiles_inside(points) {
            if !self.tiles.contains_key(&id) {
                self.tiles.insert(id, PolygonTile::interior(id));
                created += 1;
            }
        }

        log::debug!("Created {} interior tile(s)", created);
    }

    /// Drop the sentinel tiles that a hole ring encloses without crossing.
    fn clear_hole_tiles(&mut self, points: &[Coord<f64>]) {
        let mut removed = 0;
        for id in self.tiles_inside(points) {
            let sentinel_only = self.tiles.get(&id).is_some_and(|tile| {
                matches!(tile.fragments(), [Fragment::InteriorSentinel])
            });
            if sentinel_only {
                self.tiles.remove(&id);
                removed += 1;
            }
        }

        log::debug!("Removed {} tile(s) enclosed by a hole", removed);
    }

    fn tile_mut(&mut self, id: TileId) -> Result<&mut PolygonTile> {
        self.tiles
            .get_mut(&id)
            .ok_or_else(|| Error::Topology(format!("tile {} does not exist", id)))
    }

    fn require_tile(&self, id: TileId) -> Result<&PolygonTile> {
        self.tiles
            .get(&id)
            .ok_or_else(|| Error::Topology(format!("tile {} does not exist", id)))
    }

    /// Grid the polygon is tiled on
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Tile `id`, if the polygon reaches it
    pub fn tile(&self, id: TileId) -> Option<&PolygonTile> {
        self.tiles.get(&id)
    }

    /// Whether tile `id` was created
    pub fn contains_tile(&self, id: TileId) -> bool {
        self.tiles.contains_key(&id)
    }

    /// Number of tiles holding part of the polygon
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Number of input rings, exterior included
    pub fn ring_count(&self) -> usize {
        self.ring_refs.len()
    }

    /// Fragments over all tiles, sentinels included
    pub fn fragment_count(&self) -> usize {
        self.tiles.values().map(|tile| tile.fragments().len()).sum()
    }

    /// Grid crossings recorded while building
    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    /// Re-entry point of every ring, exterior first
    pub fn ring_refs(&self) -> &[RingRef] {
        &self.ring_refs
    }

    /// Rebuild one ring by following splices from `ring_ref` until the walk
    /// returns to it.
    ///
    /// The ring starts at the first vertex of the fragment named by
    /// `ring_ref` and is closed.
    pub fn reconstruct_ring(&self, ring_ref: RingRef) -> Result<LineString<f64>> {
        let mut points = self
            .require_tile(ring_ref.tile)?
            .fragment(ring_ref.fragment)?
            .points()
            .to_vec();
        let mut current = ring_ref;

        for _ in 0..=self.fragment_count() {
            let next = self
                .require_tile(current.tile)?
                .next_ring_ref(current.fragment, &self.intersections)?;
            if next == ring_ref {
                if let Some(&first) = points.first() {
                    if points.last() != Some(&first) {
                        points.push(first);
                    }
                }
                return Ok(LineString::new(points));
            }
            points.extend_from_slice(
                self.require_tile(next.tile)?
                    .fragment(next.fragment)?
                    .points(),
            );
            current = next;
        }

        Err(Error::Topology(format!(
            "ring starting at tile {} fragment {} does not close",
            ring_ref.tile, ring_ref.fragment
        )))
    }

    /// Every ring, exterior first
    pub fn rings(&self) -> Result<Vec<LineString<f64>>> {
        self.ring_refs
            .iter()
            .map(|ring_ref| self.reconstruct_ring(*ring_ref))
            .collect()
    }

    /// The whole polygon rebuilt from its fragments
    pub fn polygon(&self) -> Result<Polygon<f64>> {
        let mut rings = self.rings()?.into_iter();
        let exterior = rings
            .next()
            .ok_or_else(|| Error::Topology("tiled polygon has no rings".to_string()))?;
        Ok(Polygon::new(exterior, rings.collect()))
    }

    /// Ids of the tiles present, sorted, optionally restricted to those
    /// intersecting `bbox`
    pub fn tiles(&self, bbox: Option<&BBox>) -> Vec<TileId> {
        match bbox {
            None => self.tiles.keys().copied().collect(),
            Some(bbox) => {
                let mut ids: Vec<TileId> = self
                    .grid
                    .tiles_for_bbox(bbox)
                    .filter(|id| self.tiles.contains_key(id))
                    .collect();
                ids.sort();
                ids
            }
        }
    }

    /// Part of the polygon inside one tile.
    ///
    /// A tile that was never created lies entirely outside the polygon and
    /// yields no polygons.
    pub fn tile_polygons(&self, id: TileId) -> Result<Vec<Polygon<f64>>> {
        let Some(tile) = self.tiles.get(&id) else {
            return Ok(Vec::new());
        };
        let ctx = TileContext {
            grid: &self.grid,
            intersections: &self.intersections,
            north_axis_x: self
                .tiles
                .get(&id.neighbor(Edge::North))
                .and_then(|north| north.axis_x()),
            east_axis_y: self
                .tiles
                .get(&id.neighbor(Edge::East))
                .and_then(|east| east.axis_y()),
        };
        tile.reconstruct_polygons(&ctx)
    }

    /// Tile-local polygons for every tile intersecting `bbox`
    pub fn polygons_in(&self, bbox: &BBox) -> Result<Vec<(TileId, Vec<Polygon<f64>>)>> {
        self.tiles(Some(bbox))
            .into_iter()
            .map(|id| Ok((id, self.tile_polygons(id)?)))
            .collect()
    }
}
