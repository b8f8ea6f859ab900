//! Coordinate system conversions
//!
//! Converts between geographic coordinates (longitude/latitude in degrees),
//! spherical Web Mercator (EPSG:3857) and Lambert-93 (EPSG:2154). Conversions
//! between two projections go through geographic coordinates.
//!
//! The tiling engine itself never reprojects; these helpers let callers bring
//! input into a planar system before tiling.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;
use std::str::FromStr;

use geo::{Coord, LineString, Polygon};

use crate::{Error, Result};

/// Earth radius used by Web Mercator, in metres
const WM_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of Web Mercator, in degrees
const WM_MAX_LAT: f64 = 85.051_128_779_806_59;

// Lambert-93 projection constants (IGN)
const L93_C: f64 = 11_754_255.426_096;
const L93_E: f64 = 0.081_819_191_042_815_8;
const L93_N: f64 = 0.725_607_765_053_267;
const L93_XS: f64 = 700_000.0;
const L93_YS: f64 = 12_655_612.049_876;
const L93_LON0: f64 = 3.0;

const LATITUDE_TOLERANCE: f64 = 1e-12;
const MAX_LATITUDE_ITERATIONS: usize = 50;

/// Supported coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordSys {
    /// Longitude/latitude in degrees (WGS84)
    Geo,
    /// Spherical Web Mercator, metres
    WebMercator,
    /// French Lambert-93 conic projection, metres
    Lambert93,
}

impl FromStr for CoordSys {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "geo" | "wgs84" | "epsg:4326" => Ok(CoordSys::Geo),
            "wm" | "webmercator" | "epsg:3857" => Ok(CoordSys::WebMercator),
            "l93" | "lambert93" | "epsg:2154" => Ok(CoordSys::Lambert93),
            other => Err(Error::CoordSys(format!(
                "unknown coordinate system '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CoordSys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordSys::Geo => "geo",
            CoordSys::WebMercator => "wm",
            CoordSys::Lambert93 => "l93",
        };
        f.write_str(name)
    }
}

/// Convert a point from `src` to `dst`.
///
/// # Arguments
///
/// * `src` - System of `x`, `y`
/// * `dst` - Target system
/// * `x` - Easting, or longitude in degrees
/// * `y` - Northing, or latitude in degrees
///
/// # Returns
///
/// The converted `(x, y)`; unchanged when `src == dst`.
pub fn convert(src: CoordSys, dst: CoordSys, x: f64, y: f64) -> Result<(f64, f64)> {
    if src == dst {
        return Ok((x, y));
    }
    if !x.is_finite() || !y.is_finite() {
        return Err(Error::CoordSys(format!("non-finite point ({}, {})", x, y)));
    }

    let (lon, lat) = match src {
        CoordSys::Geo => (x, y),
        CoordSys::WebMercator => web_mercator_to_geo(x, y),
        CoordSys::Lambert93 => lambert93_to_geo(x, y)?,
    };

    match dst {
        CoordSys::Geo => Ok((lon, lat)),
        CoordSys::WebMercator => geo_to_web_mercator(lon, lat),
        CoordSys::Lambert93 => geo_to_lambert93(lon, lat),
    }
}

/// Reproject every vertex of a polygon
pub fn reproject_polygon(
    src: CoordSys,
    dst: CoordSys,
    polygon: &Polygon<f64>,
) -> Result<Polygon<f64>> {
    let ring = |ring: &LineString<f64>| -> Result<LineString<f64>> {
        ring.coords()
            .map(|c| convert(src, dst, c.x, c.y).map(|(x, y)| Coord { x, y }))
            .collect::<Result<Vec<_>>>()
            .map(LineString::new)
    };

    let exterior = ring(polygon.exterior())?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(ring)
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn check_latitude(lat: f64, limit: f64) -> Result<()> {
    if lat.abs() > limit {
        return Err(Error::CoordSys(format!(
            "latitude {} is outside [-{}, {}]",
            lat, limit, limit
        )));
    }
    Ok(())
}

fn geo_to_web_mercator(lon: f64, lat: f64) -> Result<(f64, f64)> {
    check_latitude(lat, WM_MAX_LAT)?;
    let x = WM_RADIUS * lon.to_radians();
    let y = WM_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Ok((x, y))
}

fn web_mercator_to_geo(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / WM_RADIUS).to_degrees();
    let lat = (FRAC_PI_2 - 2.0 * (-y / WM_RADIUS).exp().atan()).to_degrees();
    (lon, lat)
}

fn geo_to_lambert93(lon: f64, lat: f64) -> Result<(f64, f64)> {
    check_latitude(lat, 90.0)?;
    if lat == -90.0 {
        return Err(Error::CoordSys(
            "the south pole has no Lambert-93 image".to_string(),
        ));
    }
    let sin_lat = lat.to_radians().sin();
    let isometric = sin_lat.atanh() - L93_E * (L93_E * sin_lat).atanh();
    let radius = L93_C * (-L93_N * isometric).exp();
    let gamma = (L93_N * (lon - L93_LON0)).to_radians();

    Ok((L93_XS + radius * gamma.sin(), L93_YS - radius * gamma.cos()))
}

fn lambert93_to_geo(x: f64, y: f64) -> Result<(f64, f64)> {
    let dx = x - L93_XS;
    let dy = y - L93_YS;
    let radius = dx.hypot(dy);
    if radius == 0.0 {
        return Ok((L93_LON0, 90.0));
    }

    let gamma = (-dx / dy).atan();
    let lon = gamma.to_degrees() / L93_N + L93_LON0;

    let isometric = (L93_C / radius).ln() / L93_N;
    let mut lat = 1.0_f64;
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let next = (isometric + L93_E * (L93_E * lat.sin()).atanh())
            .tanh()
            .asin();
        if (next - lat).abs() < LATITUDE_TOLERANCE {
            return Ok((lon, next.to_degrees()));
        }
        lat = next;
    }

    Err(Error::CoordSys(format!(
        "latitude did not converge for Lambert-93 point ({}, {})",
        x, y
    )))
}
