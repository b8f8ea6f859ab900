//! End-to-end properties of polygon tiling on a 10-unit grid.
//!
//! Every fixture polygon is tiled and then checked for:
//! - full reconstruction: each ring comes back as the same cyclic sequence
//! - area conservation: the per-tile polygons add up to the input area
//! - locality: each per-tile polygon stays inside its tile
//! - containment: every per-tile hole lies inside its exterior
//! - idempotence: querying a tile twice gives the same answer

use geo::{Area, BoundingRect, Contains, Coord, LineString, Point, Polygon, Winding};
use tiledpoly_core::wkt::parse_polygon;
use tiledpoly_core::{BBox, TileId, TiledPolygon, TilingConfig};

const TOLERANCE: f64 = 1e-6;

/// Hand-made polygons covering loops, jumps over empty tiles, holes,
/// interior tiles, tiles inside holes, grid-aligned vertices and rings
/// returning to a tile.
const FIXTURES: &[(&str, &str)] = &[
    ("one tile", "POLYGON((1 1,1 9,9 9,9 1,1 1))"),
    ("two tiles", "POLYGON((1 1,1 19,9 19,9 1,1 1))"),
    ("two tiles, extra vertex", "POLYGON((1 1,1 9,1 19,9 19,9 1,1 1))"),
    ("four tiles", "POLYGON((1 1,1 9,1 19,9 19,15 18,17 9,9 1,1 1))"),
    ("jump over empty tile", "POLYGON((1 1,1 19,9 19,17 9,9 1,1 1))"),
    (
        "one hole",
        "POLYGON((1 1,1 9,1 19,9 19,15 18,17 9,9 1,1 1),(3 8,7 8,7 15,3 15,3 8))",
    ),
    (
        "two holes",
        "POLYGON((1 1,1 9,1 19,9 19,15 18,17 9,9 1,1 1),(3 8,7 8,7 15,3 15,3 8),(11 8,11 15,9 15,9 8,11 8))",
    ),
    (
        "two holes, jump",
        "POLYGON((1 1,1 9,1 19,9 19,17 9,9 1,1 1),(3 8,7 8,7 15,3 15,3 8),(11 8,11 15,9 15,9 8,11 8))",
    ),
    (
        "three holes, one inside a tile",
        "POLYGON((1 1,1 9,1 19,9 19,17 9,9 1,1 1),(2 2,4 2,4 4,2 4,2 2),(3 8,7 8,7 15,3 15,3 8),(11 8,11 15,9 15,9 8,11 8))",
    ),
    ("starts on a tile corner", "POLYGON((0 0,1 9,9 9,9 1,0 0))"),
    ("corner rotation", "POLYGON((-2 -2,-2 8,2 8,2 12,12 12,12 -2,-2 -2))"),
    (
        "returns to a tile",
        "POLYGON((2 2,2 18,6 18,6 6,12 6,12 16,16 16,16 2,2 2))",
    ),
    (
        "returns to a tile twice",
        "POLYGON((8 8,8 12,12 12,12 14,8 14,8 16,12 16,12 17,8 17,8 18,14 18,14 8,8 8))",
    ),
    ("vertices on the grid", "POLYGON((10 4,4 10,10 16,16 10,10 4))"),
    (
        "hole assignment",
        "POLYGON((1 1,1 19,9 19,9 1,6 1,6 16,4 16,4 1,1 1),(2 3,3 3,3 4,2 4,2 3),(2 7,3 7,3 8,2 8,2 7),(7 3,8 3,8 4,7 4,7 3),(7 7,8 7,8 8,7 8,7 7))",
    ),
    ("interior tile", "POLYGON((-1 -1,-1 11,11 11,11 -1,-1 -1))"),
    (
        "interior tile with hole",
        "POLYGON((-1 -1,-1 11,11 11,11 -1,-1 -1),(1 1,2 1,2 2,1 2,1 1))",
    ),
    (
        "interior tile beside exterior tile",
        "POLYGON((-1 -1,-1 21,1 21,11 11,11 -1,-1 -1))",
    ),
    (
        "interior tile with hole beside exterior tile",
        "POLYGON((-1 -1,-1 21,1 21,11 11,11 -1,-1 -1),(1 1,2 1,2 2,1 2,1 1))",
    ),
    (
        "hole inside and hole across tiles",
        "POLYGON((-1 -1,-1 21,1 21,15 15,15 -1,-1 -1),(1 1,2 1,2 2,1 2,1 1),(9 9,11 9,11 11,9 11,9 9))",
    ),
    (
        "hole across tiles",
        "POLYGON((-1 -1,-1 21,1 21,15 15,15 -1,-1 -1),(9 9,11 9,11 11,9 11,9 9))",
    ),
    (
        "hole enclosing whole tiles",
        "POLYGON((0 0,0 50,50 50,50 0,0 0),(5 5,45 5,45 45,5 45,5 5))",
    ),
    (
        "hole enclosing whole tiles, off grid",
        "POLYGON((5 5,5 95,95 95,95 5,5 5),(15 15,85 15,85 85,15 85,15 15))",
    ),
];

fn config() -> TilingConfig {
    TilingConfig::new(10.0, 1.0, 1000.0)
}

fn tile(wkt: &str) -> TiledPolygon {
    TiledPolygon::from_wkt(&config(), wkt)
        .unwrap_or_else(|e| panic!("failed to tile {}: {}", wkt, e))
}

fn close_to(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE
}

/// Check two closed rings describe the same cyclic point sequence
fn same_cycle(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let a = &a.0[..a.0.len().saturating_sub(1)];
    let b = &b.0[..b.0.len().saturating_sub(1)];
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }
    (0..b.len()).any(|offset| {
        a.iter()
            .enumerate()
            .all(|(i, c)| close_to(*c, b[(i + offset) % b.len()]))
    })
}

/// Input polygon with the orientation the tiler normalises to
fn normalised(polygon: &Polygon<f64>) -> Vec<LineString<f64>> {
    let mut exterior = polygon.exterior().clone();
    exterior.make_cw_winding();
    let mut rings = vec![exterior];
    for hole in polygon.interiors() {
        let mut hole = hole.clone();
        hole.make_ccw_winding();
        rings.push(hole);
    }
    rings
}

fn all_tile_polygons(tiled: &TiledPolygon) -> Vec<(TileId, Vec<Polygon<f64>>)> {
    tiled
        .tiles(None)
        .into_iter()
        .map(|id| (id, tiled.tile_polygons(id).unwrap()))
        .collect()
}

#[test]
fn test_full_polygon_round_trip() {
    for (name, wkt) in FIXTURES {
        let input = parse_polygon(wkt).unwrap();
        let tiled = tile(wkt);
        let rings = tiled.rings().unwrap();
        let expected = normalised(&input);

        assert_eq!(rings.len(), expected.len(), "{}: ring count", name);
        for (index, (actual, expected)) in rings.iter().zip(&expected).enumerate() {
            assert!(actual.is_closed(), "{}: ring {} not closed", name, index);
            assert!(
                same_cycle(actual, expected),
                "{}: ring {} differs\n  got      {:?}\n  expected {:?}",
                name,
                index,
                actual,
                expected
            );
        }

        let polygon = tiled.polygon().unwrap();
        assert!(
            (polygon.unsigned_area() - input.unsigned_area()).abs() < TOLERANCE,
            "{}: full polygon area",
            name
        );
    }
}

#[test]
fn test_area_conservation() {
    for (name, wkt) in FIXTURES {
        let input = parse_polygon(wkt).unwrap();
        let tiled = tile(wkt);

        let total: f64 = all_tile_polygons(&tiled)
            .iter()
            .flat_map(|(_, polygons)| polygons)
            .map(|polygon| polygon.unsigned_area())
            .sum();

        assert!(
            (total - input.unsigned_area()).abs() < TOLERANCE,
            "{}: tiles cover {} but polygon has {}",
            name,
            total,
            input.unsigned_area()
        );
    }
}

#[test]
fn test_tile_polygons_stay_in_their_tile() {
    for (name, wkt) in FIXTURES {
        let tiled = tile(wkt);
        let grid = *tiled.grid();

        for (id, polygons) in all_tile_polygons(&tiled) {
            let bounds = grid.tile_bounds(id);
            let (min, max) = (bounds.min().unwrap(), bounds.max().unwrap());
            for polygon in &polygons {
                let rect = polygon.bounding_rect().unwrap();
                assert!(
                    rect.min().x > min.x - TOLERANCE
                        && rect.min().y > min.y - TOLERANCE
                        && rect.max().x < max.x + TOLERANCE
                        && rect.max().y < max.y + TOLERANCE,
                    "{}: polygon of tile {} leaves it: {:?}",
                    name,
                    id,
                    rect
                );
                assert!(polygon.exterior().is_closed());
            }
        }
    }
}

#[test]
fn test_holes_inside_their_exterior() {
    for (name, wkt) in FIXTURES {
        let tiled = tile(wkt);
        for (id, polygons) in all_tile_polygons(&tiled) {
            for polygon in &polygons {
                let shell = Polygon::new(polygon.exterior().clone(), vec![]);
                for hole in polygon.interiors() {
                    assert!(
                        hole.coords().any(|c| shell.contains(&Point::from(*c))),
                        "{}: hole of tile {} outside its exterior",
                        name,
                        id
                    );
                }
            }
        }
    }
}

#[test]
fn test_tile_queries_are_idempotent() {
    for (name, wkt) in FIXTURES {
        let tiled = tile(wkt);
        for id in tiled.tiles(None) {
            assert_eq!(
                tiled.tile_polygons(id).unwrap(),
                tiled.tile_polygons(id).unwrap(),
                "{}: tile {}",
                name,
                id
            );
        }
        assert_eq!(tiled.rings().unwrap(), tiled.rings().unwrap());
    }
}

#[test]
fn test_hole_preserved_in_full_polygon() {
    let wkt = "POLYGON((1 1,1 19,9 19,15 18,17 9,9 1,1 1),(3 8,7 8,7 15,3 15,3 8))";
    let tiled = tile(wkt);
    let polygon = tiled.polygon().unwrap();

    assert_eq!(polygon.interiors().len(), 1);
    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    assert!(polygon.interiors()[0]
        .coords()
        .all(|c| shell.contains(&Point::from(*c))));
}

#[test]
fn test_hole_split_across_tiles_notches_tile_polygon() {
    let tiled = tile("POLYGON((1 1,1 19,9 19,15 18,17 9,9 1,1 1),(3 8,7 8,7 15,3 15,3 8))");
    let polygons = tiled.tile_polygons(TileId::new(0, 0)).unwrap();

    assert_eq!(polygons.len(), 1);
    let expected = LineString::from(vec![
        (10.0, 2.0),
        (9.0, 1.0),
        (1.0, 1.0),
        (1.0, 10.0),
        (3.0, 10.0),
        (3.0, 8.0),
        (7.0, 8.0),
        (7.0, 10.0),
        (10.0, 10.0),
        (10.0, 2.0),
    ]);
    assert!(
        same_cycle(polygons[0].exterior(), &expected),
        "{:?}",
        polygons[0].exterior()
    );
}

#[test]
fn test_interior_tile_is_full_square() {
    let tiled = tile("POLYGON((-1 -1,-1 11,11 11,11 -1,-1 -1))");
    let polygons = tiled.tile_polygons(TileId::new(0, 0)).unwrap();

    assert_eq!(polygons.len(), 1);
    let square = LineString::from(vec![
        (0.0, 0.0),
        (0.0, 10.0),
        (10.0, 10.0),
        (10.0, 0.0),
        (0.0, 0.0),
    ]);
    assert_eq!(polygons[0].exterior(), &square);

    // boundary tiles hold only the thin strip of the polygon
    let corner = tiled.tile_polygons(TileId::new(-1, -1)).unwrap();
    assert_eq!(corner.len(), 1);
    assert!((corner[0].unsigned_area() - 1.0).abs() < TOLERANCE);
}

#[test]
fn test_interior_tile_keeps_its_hole() {
    let tiled = tile("POLYGON((-1 -1,-1 11,11 11,11 -1,-1 -1),(1 1,2 1,2 2,1 2,1 1))");
    let polygons = tiled.tile_polygons(TileId::new(0, 0)).unwrap();

    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].interiors().len(), 1);
    assert!((polygons[0].unsigned_area() - 99.0).abs() < TOLERANCE);
}

#[test]
fn test_tiles_enclosed_by_hole_are_outside() {
    let tiled = tile("POLYGON((5 5,5 95,95 95,95 5,5 5),(15 15,85 15,85 85,15 85,15 15))");
    let listed = tiled.tiles(None);

    for ix in 2..=7 {
        for iy in 2..=7 {
            let id = TileId::new(ix, iy);
            assert!(!listed.contains(&id), "tile {} listed", id);
            assert!(tiled.tile_polygons(id).unwrap().is_empty());
        }
    }

    // tiles between the two rings stay interior
    let rim = tiled.tile_polygons(TileId::new(1, 5)).unwrap();
    assert_eq!(rim.len(), 1);
    assert!((rim[0].unsigned_area() - 50.0).abs() < TOLERANCE);
}

#[test]
fn test_holes_assigned_to_containing_exterior() {
    let tiled = tile(
        "POLYGON((1 1,1 19,9 19,9 1,6 1,6 16,4 16,4 1,1 1),(2 3,3 3,3 4,2 4,2 3),(2 7,3 7,3 8,2 8,2 7),(7 3,8 3,8 4,7 4,7 3),(7 7,8 7,8 8,7 8,7 7))",
    );
    let polygons = tiled.tile_polygons(TileId::new(0, 0)).unwrap();

    assert_eq!(polygons.len(), 2);
    for polygon in &polygons {
        assert_eq!(polygon.interiors().len(), 2);
        let legs_x = polygon.bounding_rect().unwrap();
        for hole in polygon.interiors() {
            let hole_rect = hole.bounding_rect().unwrap();
            assert!(hole_rect.min().x >= legs_x.min().x && hole_rect.max().x <= legs_x.max().x);
        }
    }
}

#[test]
fn test_grid_vertex_assignment_is_deterministic() {
    let wkt = "POLYGON((10 4,4 10,10 16,16 10,10 4))";
    let first = tile(wkt);
    let grid = *first.grid();

    assert_eq!(grid.tile_of(Coord { x: 10.0, y: 4.0 }), TileId::new(1, 0));
    assert_eq!(grid.tile_of(Coord { x: 4.0, y: 10.0 }), TileId::new(0, 1));

    for _ in 0..5 {
        let again = tile(wkt);
        assert_eq!(again.tiles(None), first.tiles(None));
        assert_eq!(again.rings().unwrap(), first.rings().unwrap());
    }
    assert_eq!(
        first.tiles(None),
        vec![
            TileId::new(0, 0),
            TileId::new(0, 1),
            TileId::new(1, 0),
            TileId::new(1, 1),
        ]
    );
}

#[test]
fn test_polygons_in_bbox_subset() {
    let tiled = tile("POLYGON((-1 -1,-1 21,1 21,11 11,11 -1,-1 -1))");
    let bbox = BBox::new(Coord { x: 0.5, y: 0.5 }, Coord { x: 5.0, y: 15.0 });

    let subset = tiled.polygons_in(&bbox).unwrap();
    let ids: Vec<TileId> = subset.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![TileId::new(0, 0), TileId::new(0, 1)]);
    assert!(subset.iter().all(|(_, polygons)| !polygons.is_empty()));
}

#[test]
fn test_large_coordinates() {
    let config = TilingConfig::new(1000.0, 0.01, 1e7);
    let wkt = "POLYGON((652000 6862000,652000 6866500,657500 6866500,657500 6862000,652000 6862000))";
    let input = parse_polygon(wkt).unwrap();
    let tiled = TiledPolygon::from_wkt(&config, wkt).unwrap();

    assert_eq!(tiled.tile_count(), 6 * 5);
    let total: f64 = tiled
        .tiles(None)
        .into_iter()
        .flat_map(|id| tiled.tile_polygons(id).unwrap())
        .map(|polygon| polygon.unsigned_area())
        .sum();
    assert!((total - input.unsigned_area()).abs() / input.unsigned_area() < 1e-8);
}
