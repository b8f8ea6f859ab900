// Benchmarks for building and querying a tiled polygon

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::{Coord, LineString, Polygon};
use tiledpoly_core::{BBox, TiledPolygon, TilingConfig};

const RADIUS: f64 = 4_000.0;

fn config() -> TilingConfig {
    TilingConfig::new(100.0, 0.01, 1e6)
}

/// Wavy circle so most tiles along the boundary get several fragments
fn wavy_circle(vertices: usize) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = (0..=vertices)
        .map(|i| {
            let angle = -(i % vertices) as f64 / vertices as f64 * std::f64::consts::TAU;
            let radius = RADIUS + 150.0 * (angle * 40.0).sin();
            Coord {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for vertices in [1_000, 10_000, 100_000] {
        let polygon = wavy_circle(vertices);
        group.bench_with_input(
            BenchmarkId::from_parameter(vertices),
            &polygon,
            |b, polygon| b.iter(|| TiledPolygon::new(&config(), black_box(polygon)).unwrap()),
        );
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let tiled = TiledPolygon::new(&config(), &wavy_circle(100_000)).unwrap();
    let window = BBox::new(
        Coord { x: 0.0, y: 0.0 },
        Coord {
            x: RADIUS * 1.2,
            y: RADIUS * 1.2,
        },
    );

    c.bench_function("tile_polygons_quadrant", |b| {
        b.iter(|| tiled.polygons_in(black_box(&window)).unwrap())
    });

    c.bench_function("reconstruct_rings", |b| b.iter(|| tiled.rings().unwrap()));
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
