//! WKT reading and writing through geozero.

use geo::{Geometry, MultiPolygon, Polygon};
use geozero::wkt::Wkt;
use geozero::{ToGeo, ToWkt};

use crate::{Error, Result};

/// Parse a `POLYGON` WKT string.
///
/// # Errors
///
/// [`Error::MalformedInput`] when the text does not parse, holds another
/// geometry type, or describes an empty polygon.
pub fn parse_polygon(text: &str) -> Result<Polygon<f64>> {
    let geometry = Wkt(text.trim())
        .to_geo()
        .map_err(|e| Error::MalformedInput(format!("cannot parse WKT: {}", e)))?;

    match geometry {
        Geometry::Polygon(polygon) if polygon.exterior().0.is_empty() => {
            Err(Error::MalformedInput("polygon is empty".to_string()))
        }
        Geometry::Polygon(polygon) => Ok(polygon),
        other => Err(Error::MalformedInput(format!(
            "expected POLYGON, found {}",
            geometry_name(&other)
        ))),
    }
}

/// Serialise a polygon as WKT.
///
/// # Errors
///
/// [`Error::Output`] when geozero cannot write the geometry.
pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> Result<String> {
    Geometry::Polygon(polygon.clone())
        .to_wkt()
        .map_err(write_error)
}

/// Serialise several polygons as one `MULTIPOLYGON`.
pub fn polygons_to_wkt(polygons: &[Polygon<f64>]) -> Result<String> {
    Geometry::MultiPolygon(MultiPolygon::new(polygons.to_vec()))
        .to_wkt()
        .map_err(write_error)
}

fn write_error(e: geozero::error::GeozeroError) -> Error {
    Error::Output(format!("cannot write WKT: {}", e))
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) | Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) => "RECT",
        Geometry::Triangle(_) => "TRIANGLE",
    }
}
