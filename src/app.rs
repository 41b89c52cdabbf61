use ratatui::style::Color;
use tracing::{debug, info};

use crate::data::{Atlas, Country};
use crate::error::VisaError;
use crate::map::{MapRenderer, Viewport};
use crate::search::Autocomplete;
use crate::visa::{decode, Dataset, NEUTRAL};

/// Rows taken by the search box above the map
pub const SEARCH_HEIGHT: u16 = 3;

/// Suggestions shown under the search box
const SUGGESTION_LIMIT: usize = 8;

/// Fill for a decoded kind that has no color
pub const UNDEFINED_FILL: Color = Color::Reset;

/// Top-left terminal cell of the map canvas (inside the border, below the search box)
const MAP_ORIGIN: (u16, u16) = (1, SEARCH_HEIGHT + 1);

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub dataset: Dataset,
    /// Countries offered by the search box
    pub countries: Vec<Country>,
    pub search: Autocomplete,
    /// Currently selected passport code
    pub passport: Option<String>,
    /// Index of the shape under the mouse
    pub hovered: Option<usize>,
    /// One-line message shown in the status bar
    pub message: Option<String>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for the tooltip
    pub mouse_pos: Option<(u16, u16)>,
}

/// Braille pixel size of the map canvas for a terminal of `width` x `height` cells
fn canvas_pixels(width: usize, height: usize) -> (usize, usize) {
    // Border on both sides, plus search box and status bar rows
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(2 + SEARCH_HEIGHT as usize + 1);
    (inner_width * 2, inner_height * 4)
}

/// Convert a terminal cell to braille pixel coordinates on the map canvas
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(MAP_ORIGIN.0) as i32) * 2;
    let py = (row.saturating_sub(MAP_ORIGIN.1) as i32) * 4;
    (px, py)
}

impl App {
    pub fn new(atlas: Atlas, width: usize, height: usize) -> Self {
        let (pixel_width, pixel_height) = canvas_pixels(width, height);

        Self {
            viewport: Viewport::world(pixel_width, pixel_height),
            map_renderer: MapRenderer::new(atlas.shapes),
            dataset: atlas.dataset,
            countries: atlas.countries,
            search: Autocomplete::new(1, SUGGESTION_LIMIT),
            passport: None,
            hovered: None,
            message: None,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
        }
    }

    /// Color every country by the requirement for holders of `code` passports.
    ///
    /// The passport's own country is painted neutral and has no detail.
    pub fn on_select(&mut self, code: &str) -> Result<(), VisaError> {
        let origin = code.to_ascii_uppercase();
        if !self.dataset.contains_origin(&origin) {
            return Err(VisaError::UnknownOrigin(origin));
        }

        for shape in &mut self.map_renderer.shapes {
            if shape.code == origin {
                shape.fill = NEUTRAL;
                shape.detail = None;
                continue;
            }

            let requirement = decode(&shape.code, &origin, &self.dataset)?;
            shape.fill = requirement.color().unwrap_or(UNDEFINED_FILL);
            shape.detail = requirement.detail();
        }

        info!(passport = %origin, shapes = self.map_renderer.shapes.len(), "applied passport");
        self.message = None;
        self.passport = Some(origin);
        Ok(())
    }

    /// Select the highlighted search suggestion
    pub fn accept_suggestion(&mut self) {
        let Some(code) = self.search.accept(&self.countries) else {
            return;
        };
        if let Err(e) = self.on_select(&code) {
            self.message = Some(e.to_string());
        }
    }

    /// Display name of the selected passport
    pub fn passport_name(&self) -> Option<&str> {
        let code = self.passport.as_deref()?;
        self.countries
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }

    /// Update hover state for the mouse at terminal cell (col, row)
    pub fn on_hover(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));

        // Only cells over the map canvas, not its border or the status bar
        let cols = self.viewport.width / 2;
        let rows = self.viewport.height / 4;
        let (map_col, map_row) = (col as usize, row as usize);
        let (left, top) = (MAP_ORIGIN.0 as usize, MAP_ORIGIN.1 as usize);
        if map_col < left || map_row < top || map_col >= left + cols || map_row >= top + rows {
            self.hovered = None;
            return;
        }

        // Sample the center of the braille cell
        let (px, py) = cell_to_pixel(col, row);
        let (lon, lat) = self.viewport.unproject_f(px as f64 + 1.0, py as f64 + 2.0);
        let hovered = self.map_renderer.hit_test(lon, lat);
        if hovered != self.hovered {
            debug!(?hovered, lon, lat, "hover changed");
        }
        self.hovered = hovered;
    }

    /// Tooltip text for the hovered country
    pub fn tooltip(&self) -> Option<String> {
        self.hovered
            .and_then(|idx| self.map_renderer.shapes.get(idx))
            .map(|shape| shape.tooltip())
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = canvas_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Back to the whole-world view
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::CountryShape;
    use crate::visa::VisaKind;

    fn square(code: &str, name: &str, lon: f64) -> CountryShape {
        CountryShape::new(
            code.into(),
            name.into(),
            vec![vec![vec![
                (lon, 0.0),
                (lon + 10.0, 0.0),
                (lon + 10.0, 10.0),
                (lon, 10.0),
                (lon, 0.0),
            ]]],
        )
    }

    fn app() -> App {
        let countries = [
            ("US", "United States"),
            ("GB", "United Kingdom"),
            ("FR", "France"),
            ("DE", "Germany"),
        ]
        .into_iter()
        .map(|(code, name)| Country {
            code: code.into(),
            name: name.into(),
        })
        .collect();
        let atlas = Atlas {
            countries,
            shapes: vec![
                square("US", "United States", -100.0),
                square("GB", "United Kingdom", -20.0),
                square("FR", "France", 0.0),
                square("DE", "Germany", 20.0),
            ],
            dataset: Dataset::from_blobs([
                ("US", "GB120FR410"),
                ("GB", "US103"),
                ("FR", ""),
                ("DE", ""),
            ]),
        };
        App::new(atlas, 100, 40)
    }

    fn shape<'a>(app: &'a App, code: &str) -> &'a CountryShape {
        app.map_renderer.shapes.iter().find(|s| s.code == code).unwrap()
    }

    #[test]
    fn test_select_colors_every_destination() {
        let mut app = app();
        app.on_select("us").unwrap();

        assert_eq!(app.passport.as_deref(), Some("US"));
        assert_eq!(app.passport_name(), Some("United States"));

        let gb = shape(&app, "GB");
        assert_eq!(gb.fill, VisaKind::VisaFree.color());
        assert_eq!(gb.detail.as_deref(), Some("eVisitors"));

        let fr = shape(&app, "FR");
        assert_eq!(fr.fill, VisaKind::VisaRequired.color());
        assert_eq!(fr.detail.as_deref(), Some("eVisa"));

        let de = shape(&app, "DE");
        assert_eq!(de.fill, VisaKind::VisaRequired.color());
        assert_eq!(de.tooltip(), "Germany: visa required");
    }

    #[test]
    fn test_self_selection_is_neutral() {
        let mut app = app();
        app.on_select("GB").unwrap();
        app.on_select("US").unwrap();
        let us = shape(&app, "US");
        assert_eq!(us.fill, NEUTRAL);
        assert_eq!(us.detail, None);
        assert_eq!(us.tooltip(), "United States");
    }

    #[test]
    fn test_reselect_replaces_previous_colors() {
        let mut app = app();
        app.on_select("US").unwrap();
        app.on_select("GB").unwrap();
        let us = shape(&app, "US");
        assert_eq!(us.fill, VisaKind::VisaFree.color());
        assert_eq!(us.detail.as_deref(), Some("visa free / 90 days"));
        assert_eq!(shape(&app, "GB").fill, NEUTRAL);
    }

    #[test]
    fn test_unknown_passport_is_rejected() {
        let mut app = app();
        assert_eq!(app.on_select("ZZ"), Err(VisaError::UnknownOrigin("ZZ".into())));
        assert_eq!(app.passport, None);
        assert!(app.map_renderer.shapes.iter().all(|s| s.fill == NEUTRAL));
    }

    #[test]
    fn test_search_selection_dispatches_on_select() {
        let mut app = app();
        app.search.focus();
        for c in "king".chars() {
            app.search.push_char(c, &app.countries);
        }
        app.accept_suggestion();
        assert_eq!(app.passport.as_deref(), Some("GB"));
        assert_eq!(app.search.query, "United Kingdom");
    }

    #[test]
    fn test_hover_over_country() {
        let mut app = app();
        app.viewport = Viewport::new(5.0, 5.0, 8.0, app.viewport.width, app.viewport.height);
        // Map canvas center
        let col = MAP_ORIGIN.0 + (app.viewport.width / 4) as u16;
        let row = MAP_ORIGIN.1 + (app.viewport.height / 8) as u16;
        app.on_hover(col, row);
        assert_eq!(app.tooltip().as_deref(), Some("France"));

        app.on_hover(0, 0);
        assert_eq!(app.tooltip(), None);
    }

    #[test]
    fn test_hover_outside_canvas_is_ignored() {
        let mut app = app();
        app.map_renderer.shapes = vec![CountryShape::new(
            "XX".into(),
            "Everywhere".into(),
            vec![vec![vec![
                (-180.0, -85.0),
                (180.0, -85.0),
                (180.0, 85.0),
                (-180.0, 85.0),
                (-180.0, -85.0),
            ]]],
        )];

        app.on_hover(50, 20);
        assert_eq!(app.hovered, Some(0));

        // Status bar row, bottom border and right border
        for (col, row) in [(50, 39), (50, 38), (99, 20)] {
            app.on_hover(col, row);
            assert_eq!(app.hovered, None, "cell ({col}, {row})");
            assert_eq!(app.tooltip(), None);
        }
    }
}
