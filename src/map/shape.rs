use ratatui::style::Color;

use crate::map::geometry::rings_contain;
use crate::visa::NEUTRAL;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Exterior ring followed by any holes
pub type Polygon = Vec<LineString>;

/// A rendered country with its current fill and tooltip detail
#[derive(Clone, Debug)]
pub struct CountryShape {
    pub code: String,
    pub name: String,
    pub polygons: Vec<Polygon>,
    /// (min_lon, min_lat, max_lon, max_lat)
    pub bbox: (f64, f64, f64, f64),
    pub fill: Color,
    /// Requirement detail for the current passport, e.g. "eVisa / 30 days"
    pub detail: Option<String>,
}

impl CountryShape {
    pub fn new(code: String, name: String, polygons: Vec<Polygon>) -> Self {
        let bbox = polygons.iter().flatten().flatten().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_lon, min_lat, max_lon, max_lat), &(lon, lat)| {
                (min_lon.min(lon), min_lat.min(lat), max_lon.max(lon), max_lat.max(lat))
            },
        );

        Self {
            code,
            name,
            polygons,
            bbox,
            fill: NEUTRAL,
            detail: None,
        }
    }

    /// Whether a geographic point lies inside any of the polygons
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let (min_lon, min_lat, max_lon, max_lat) = self.bbox;
        if lon < min_lon || lon > max_lon || lat < min_lat || lat > max_lat {
            return false;
        }
        self.polygons.iter().any(|rings| rings_contain(rings, lon, lat))
    }

    /// Hover text: the name, plus the requirement detail when there is one
    pub fn tooltip(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {}", self.name, detail),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> CountryShape {
        CountryShape::new(
            "FR".into(),
            "France".into(),
            vec![vec![vec![(0.0, 40.0), (8.0, 40.0), (8.0, 50.0), (0.0, 50.0), (0.0, 40.0)]]],
        )
    }

    #[test]
    fn test_bbox_and_contains() {
        let fr = shape();
        assert_eq!(fr.bbox, (0.0, 40.0, 8.0, 50.0));
        assert!(fr.contains(2.3, 48.9));
        assert!(!fr.contains(-3.7, 40.4));
    }

    #[test]
    fn test_tooltip() {
        let mut fr = shape();
        assert_eq!(fr.tooltip(), "France");
        fr.detail = Some("visa free / 90 days".into());
        assert_eq!(fr.tooltip(), "France: visa free / 90 days");
    }

    #[test]
    fn test_starts_neutral() {
        assert_eq!(shape().fill, NEUTRAL);
    }
}
