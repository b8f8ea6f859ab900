//! Minimal SVG output for inspecting tilings.
//!
//! World coordinates are mapped onto a fixed pixel canvas with the y axis
//! flipped so north is up.

use geo::{Coord, LineString, Polygon, Rect};

use crate::bbox::BBox;
use crate::grid::{Corner, Grid, TileId};
use crate::{Error, Result};

/// Grid lines are skipped when they would be closer than this many pixels
const MIN_GRID_SPACING: f64 = 2.0;

/// SVG document under construction
#[derive(Debug, Clone)]
pub struct SvgDrawing {
    world: Rect<f64>,
    width: f64,
    height: f64,
    body: String,
}

impl SvgDrawing {
    /// Start a drawing showing `world` on a `width` x `height` pixel canvas.
    ///
    /// # Errors
    ///
    /// [`Error::Render`] when the world box is empty or has no area, or the
    /// canvas has a zero dimension.
    pub fn new(world: &BBox, width: u32, height: u32) -> Result<Self> {
        let world = world
            .rect()
            .filter(|rect| rect.width() > 0.0 && rect.height() > 0.0)
            .ok_or_else(|| Error::Render("drawing extent has no area".to_string()))?;
        if width == 0 || height == 0 {
            return Err(Error::Render(format!(
                "canvas size {}x{} is empty",
                width, height
            )));
        }

        Ok(Self {
            world,
            width: width as f64,
            height: height as f64,
            body: String::new(),
        })
    }

    /// Pixel position of a world coordinate
    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.world.min().x) / self.world.width() * self.width,
            y: (self.world.max().y - c.y) / self.world.height() * self.height,
        }
    }

    /// Draw every grid line crossing the world box
    pub fn draw_grid(&mut self, grid: &Grid, stroke: &str) {
        let tile_size = grid.tile_size();
        if tile_size / self.world.width() * self.width < MIN_GRID_SPACING
            || tile_size / self.world.height() * self.height < MIN_GRID_SPACING
        {
            log::warn!("Grid too dense to draw at this scale, skipping");
            return;
        }

        let (min, max) = (self.world.min(), self.world.max());
        let lower = grid.tile_of(min);
        let upper = grid.tile_of(max);

        self.body.push_str(&format!(
            "  <g stroke=\"{}\" stroke-width=\"0.5\">\n",
            stroke
        ));
        for ix in lower.ix..=upper.ix {
            let x = grid.corner(TileId::new(ix, 0), Corner::SouthWest).x;
            let a = self.project(Coord { x, y: min.y });
            let b = self.project(Coord { x, y: max.y });
            self.push_line(a, b);
        }
        for iy in lower.iy..=upper.iy {
            let y = grid.corner(TileId::new(0, iy), Corner::SouthWest).y;
            let a = self.project(Coord { x: min.x, y });
            let b = self.project(Coord { x: max.x, y });
            self.push_line(a, b);
        }
        self.body.push_str("  </g>\n");
    }

    fn push_line(&mut self, a: Coord<f64>, b: Coord<f64>) {
        self.body.push_str(&format!(
            "    <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"/>\n",
            a.x, a.y, b.x, b.y
        ));
    }

    fn path_data(&self, ring: &LineString<f64>) -> String {
        let mut data = String::new();
        for (i, c) in ring.coords().enumerate() {
            let p = self.project(*c);
            let command = if i == 0 { 'M' } else { 'L' };
            data.push_str(&format!("{}{:.2},{:.2} ", command, p.x, p.y));
        }
        if ring.is_closed() {
            data.push('Z');
        }
        data.trim_end().to_string()
    }

    /// Draw an open or closed line
    pub fn draw_line_string(&mut self, line: &LineString<f64>, stroke: &str, stroke_width: f64) {
        if line.0.is_empty() {
            return;
        }
        let data = self.path_data(line);
        self.body.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
            data, stroke, stroke_width
        ));
    }

    /// Draw a polygon, holes cut out with the even-odd rule
    pub fn draw_polygon(&mut self, polygon: &Polygon<f64>, stroke: &str, fill: &str) {
        let data: Vec<String> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .filter(|ring| !ring.0.is_empty())
            .map(|ring| self.path_data(ring))
            .collect();
        if data.is_empty() {
            return;
        }
        self.body.push_str(&format!(
            "  <path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            data.join(" "),
            fill,
            stroke
        ));
    }

    /// Close the document and return its text
    pub fn finish(self) -> String {
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = self.width,
            h = self.height
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }
}
