use rayon::prelude::*;
use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, fill_polygon, PixelRing};
use crate::map::projection::Viewport;
use crate::map::shape::CountryShape;

/// Opacity applied to the hovered country's fill
const HOVER_OPACITY: f64 = 0.4;

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_outlines: bool,
    pub show_legend: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_outlines: true,
            show_legend: true,
        }
    }
}

/// Rendered braille layers, drawn back to front
pub struct MapLayers {
    /// One canvas per distinct fill color
    pub fills: Vec<(Color, BrailleCanvas)>,
    /// Hovered country, drawn faded over the fills
    pub hovered: Option<(Color, BrailleCanvas)>,
    /// Country outlines
    pub outlines: BrailleCanvas,
}

/// Map renderer over the joined country shapes
pub struct MapRenderer {
    pub shapes: Vec<CountryShape>,
    pub settings: DisplaySettings,
}

/// Projected polygons of one shape, or `None` when it is off screen
type Projected = Option<Vec<Vec<PixelRing>>>;

impl MapRenderer {
    pub fn new(shapes: Vec<CountryShape>) -> Self {
        Self {
            shapes,
            settings: DisplaySettings::default(),
        }
    }

    /// Render all shapes into braille layers of `width` x `height` characters
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        hovered: Option<usize>,
    ) -> MapLayers {
        let projected: Vec<Projected> = self
            .shapes
            .par_iter()
            .map(|shape| project_shape(shape, viewport))
            .collect();

        let mut fills: Vec<(Color, BrailleCanvas)> = Vec::new();
        let mut hovered_layer = None;
        let mut outlines = BrailleCanvas::new(width, height);

        for (idx, (shape, polygons)) in self.shapes.iter().zip(&projected).enumerate() {
            let Some(polygons) = polygons else {
                continue;
            };

            let canvas = if hovered == Some(idx) {
                let faded = fade(shape.fill, HOVER_OPACITY);
                &mut hovered_layer
                    .get_or_insert_with(|| (faded, BrailleCanvas::new(width, height)))
                    .1
            } else {
                layer_for(&mut fills, shape.fill, width, height)
            };

            for rings in polygons {
                fill_polygon(canvas, rings);
            }

            if self.settings.show_outlines {
                for ring in polygons.iter().flatten() {
                    draw_ring(&mut outlines, ring, viewport);
                }
            }
        }

        MapLayers {
            fills,
            hovered: hovered_layer,
            outlines,
        }
    }

    /// Index of the shape containing a geographic point
    pub fn hit_test(&self, lon: f64, lat: f64) -> Option<usize> {
        self.shapes.iter().position(|shape| shape.contains(lon, lat))
    }

    /// Check if any data is loaded
    pub fn has_data(&self) -> bool {
        !self.shapes.is_empty()
    }

    /// Toggle country outlines
    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }

    /// Toggle the color legend
    pub fn toggle_legend(&mut self) {
        self.settings.show_legend = !self.settings.show_legend;
    }
}

fn layer_for(
    fills: &mut Vec<(Color, BrailleCanvas)>,
    color: Color,
    width: usize,
    height: usize,
) -> &mut BrailleCanvas {
    let idx = match fills.iter().position(|(c, _)| *c == color) {
        Some(idx) => idx,
        None => {
            fills.push((color, BrailleCanvas::new(width, height)));
            fills.len() - 1
        }
    };
    &mut fills[idx].1
}

fn project_shape(shape: &CountryShape, viewport: &Viewport) -> Projected {
    let (min_lon, min_lat, max_lon, max_lat) = shape.bbox;
    let top_left = viewport.project_f(min_lon, max_lat);
    let bottom_right = viewport.project_f(max_lon, min_lat);
    if !viewport.bbox_might_be_visible(top_left, bottom_right) {
        return None;
    }

    Some(
        shape
            .polygons
            .iter()
            .map(|rings| {
                rings
                    .iter()
                    .map(|ring| {
                        ring.iter()
                            .map(|&(lon, lat)| viewport.project_f(lon, lat))
                            .collect()
                    })
                    .collect()
            })
            .collect(),
    )
}

/// Stroke a projected ring with viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &PixelRing, viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(x, y) in ring {
        let (px, py) = (x as i32, y as i32);

        if let Some((prev_x, prev_y)) = prev {
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

/// Scale an RGB color towards black, approximating opacity over a dark background
pub fn fade(color: Color, opacity: f64) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let scale = |c: u8| (c as f64 * opacity).round() as u8;
            Color::Rgb(scale(r), scale(g), scale(b))
        }
        _ => Color::DarkGray,
    }
}
