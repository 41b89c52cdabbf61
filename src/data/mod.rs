//! Loading the three input documents: the country list, the world geometry
//! and the visa requirement blobs.

mod topology;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use geojson::{GeoJson, Value};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::map::{CountryShape, LineString, Polygon};
use crate::visa::Dataset;

pub use topology::{ArcRefs, TopoGeometry, Topology, Transform, WorldFeature};

/// A passport/destination country offered by the search box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    /// Upper-case ISO 3166 alpha-2 code
    pub code: String,
    pub name: String,
}

/// Entry of the country list document
#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    pub alpha2: String,
    pub name: String,
    #[serde(default)]
    pub id: Option<RawId>,
}

/// Numeric topology id, written either as a number or a zero-padded string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    /// Canonical form used for joins: "004" and 4 both become "4"
    pub fn normalized(&self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => normalize_id(s),
        }
    }
}

fn normalize_id(raw: &str) -> String {
    match raw.trim().parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

/// Locations of the input documents
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub countries: PathBuf,
    pub world: PathBuf,
    pub visas: PathBuf,
}

impl DataPaths {
    /// Default file names inside a data directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            countries: dir.join("countries.json"),
            world: dir.join("world-110m.json"),
            visas: dir.join("data.json"),
        }
    }
}

/// Everything the map needs after the three documents are joined
pub struct Atlas {
    /// Countries that have requirement data, in document order
    pub countries: Vec<Country>,
    /// Renderable country shapes
    pub shapes: Vec<CountryShape>,
    pub dataset: Dataset,
}

/// Load all three documents in parallel. Any failure fails the whole load.
pub fn load_all(paths: &DataPaths) -> Result<Atlas, LoadError> {
    let ((countries, world), blobs) = rayon::join(
        || rayon::join(|| load_countries(&paths.countries), || load_world(&paths.world)),
        || load_blobs(&paths.visas),
    );

    let atlas = Atlas::join(countries?, world?, Dataset::from_blobs(blobs?));
    info!(
        countries = atlas.countries.len(),
        shapes = atlas.shapes.len(),
        passports = atlas.dataset.len(),
        "loaded map data"
    );
    Ok(atlas)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T>(path: &Path, bytes: &mut [u8]) -> Result<T, LoadError>
where
    T: for<'de> Deserialize<'de>,
{
    simd_json::serde::from_slice(bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the country list
pub fn load_countries(path: &Path) -> Result<Vec<CountryRecord>, LoadError> {
    let mut bytes = read_bytes(path)?;
    let records: Vec<CountryRecord> = parse_json(path, &mut bytes)?;
    debug!(path = %path.display(), count = records.len(), "read country list");
    Ok(records)
}

/// Load the `origin -> blob` requirement document
pub fn load_blobs(path: &Path) -> Result<HashMap<String, String>, LoadError> {
    let mut bytes = read_bytes(path)?;
    let blobs: HashMap<String, String> = parse_json(path, &mut bytes)?;
    debug!(path = %path.display(), count = blobs.len(), "read requirement data");
    Ok(blobs)
}

#[derive(Deserialize)]
struct Probe {
    #[serde(rename = "type")]
    kind: String,
}

/// Load world geometry from a TopoJSON topology or a GeoJSON feature collection
pub fn load_world(path: &Path) -> Result<Vec<WorldFeature>, LoadError> {
    let bytes = read_bytes(path)?;
    let features = parse_world(path, bytes)?;
    debug!(path = %path.display(), count = features.len(), "read world geometry");
    Ok(features)
}

fn parse_world(path: &Path, mut bytes: Vec<u8>) -> Result<Vec<WorldFeature>, LoadError> {
    // simd-json parses in place, so probe a copy
    let probe: Probe = parse_json(path, &mut bytes.clone())?;

    if probe.kind == "Topology" {
        let topology: Topology = parse_json(path, &mut bytes)?;
        return topology.features();
    }

    let content = String::from_utf8_lossy(&bytes);
    let geojson: GeoJson = content.parse()?;
    Ok(geojson_features(geojson))
}

/// Extract id-tagged geometries from GeoJSON
fn geojson_features(geojson: GeoJson) -> Vec<WorldFeature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc
            .features
            .into_iter()
            .filter_map(|feature| {
                let id = feature_id(&feature);
                feature.geometry.map(|g| WorldFeature { id, geometry: g.value })
            })
            .collect(),
        GeoJson::Feature(feature) => {
            let id = feature_id(&feature);
            feature
                .geometry
                .map(|g| WorldFeature { id, geometry: g.value })
                .into_iter()
                .collect()
        }
        GeoJson::Geometry(geometry) => vec![WorldFeature {
            id: None,
            geometry: geometry.value,
        }],
    }
}

fn feature_id(feature: &geojson::Feature) -> Option<String> {
    match &feature.id {
        Some(geojson::feature::Id::String(s)) => Some(normalize_id(s)),
        Some(geojson::feature::Id::Number(n)) => Some(normalize_id(&n.to_string())),
        None => feature.property("id").and_then(|v| {
            v.as_str()
                .map(normalize_id)
                .or_else(|| v.as_i64().map(|n| n.to_string()))
        }),
    }
}

/// Collect every polygon (all rings) of a geometry
fn collect_polygons(value: &Value, out: &mut Vec<Polygon>) {
    let ring = |coords: &Vec<Vec<f64>>| -> LineString {
        coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
    };

    match value {
        Value::Polygon(rings) => out.push(rings.iter().map(ring).collect()),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(rings.iter().map(ring).collect());
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(&g.value, out);
            }
        }
        _ => {}
    }
}

impl Atlas {
    /// Join the country list, world geometry and dataset.
    ///
    /// Countries without requirement data are dropped, and so are shapes
    /// whose id does not match a remaining country.
    pub fn join(records: Vec<CountryRecord>, world: Vec<WorldFeature>, dataset: Dataset) -> Self {
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut countries = Vec::new();

        for record in records {
            let code = record.alpha2.to_ascii_uppercase();
            if !dataset.contains_origin(&code) {
                continue;
            }
            if let Some(id) = &record.id {
                by_id.insert(id.normalized(), countries.len());
            }
            countries.push(Country {
                code,
                name: record.name,
            });
        }

        let mut shapes = Vec::new();
        let mut unmatched = 0usize;
        for feature in world {
            let Some(country) = feature
                .id
                .as_ref()
                .and_then(|id| by_id.get(id))
                .map(|&i| &countries[i])
            else {
                unmatched += 1;
                continue;
            };

            let mut polygons = Vec::new();
            collect_polygons(&feature.geometry, &mut polygons);
            if polygons.is_empty() {
                warn!(code = %country.code, "country has no polygon geometry");
                continue;
            }
            shapes.push(CountryShape::new(country.code.clone(), country.name.clone(), polygons));
        }

        if unmatched > 0 {
            debug!(unmatched, "skipped shapes without a matching country");
        }

        Self {
            countries,
            shapes,
            dataset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(alpha2: &str, name: &str, id: Option<RawId>) -> CountryRecord {
        CountryRecord {
            alpha2: alpha2.to_string(),
            name: name.to_string(),
            id,
        }
    }

    fn square(id: &str, x: f64) -> WorldFeature {
        WorldFeature {
            id: Some(id.to_string()),
            geometry: Value::Polygon(vec![vec![
                vec![x, 0.0],
                vec![x + 1.0, 0.0],
                vec![x + 1.0, 1.0],
                vec![x, 1.0],
                vec![x, 0.0],
            ]]),
        }
    }

    #[test]
    fn test_raw_id_normalization() {
        assert_eq!(RawId::Text("004".into()).normalized(), "4");
        assert_eq!(RawId::Number(4).normalized(), "4");
        assert_eq!(RawId::Text("-99".into()).normalized(), "-99");
        assert_eq!(RawId::Text("XK".into()).normalized(), "XK");
    }

    #[test]
    fn test_parse_country_list() {
        let mut json = br#"[
            {"alpha2": "fr", "alpha3": "fra", "name": "France", "id": "250"},
            {"alpha2": "us", "name": "United States", "id": 840},
            {"alpha2": "aq", "name": "Antarctica"}
        ]"#
        .to_vec();
        let records: Vec<CountryRecord> =
            parse_json(Path::new("countries.json"), &mut json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, Some(RawId::Text("250".into())));
        assert_eq!(records[1].id, Some(RawId::Number(840)));
        assert_eq!(records[2].id, None);
    }

    #[test]
    fn test_join_filters_by_dataset_and_id() {
        let records = vec![
            record("fr", "France", Some(RawId::Text("250".into()))),
            record("us", "United States", Some(RawId::Number(840))),
            record("aq", "Antarctica", Some(RawId::Number(10))),
        ];
        let world = vec![
            square("250", 0.0),
            square("840", 5.0),
            square("10", 10.0),
            square("999", 20.0),
        ];
        let dataset = Dataset::from_blobs([("FR", "US100"), ("US", "FR100")]);

        let atlas = Atlas::join(records, world, dataset);

        let codes: Vec<&str> = atlas.countries.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["FR", "US"]);
        let shapes: Vec<&str> = atlas.shapes.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(shapes, ["FR", "US"]);
        assert_eq!(atlas.shapes[1].name, "United States");
    }

    #[test]
    fn test_geojson_world() {
        let json = br#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "076", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
                {"type": "Feature", "properties": {"id": 32},
                 "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,2]]]]}}
            ]
        }"#
        .to_vec();
        let features = parse_world(Path::new("world.json"), json).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id.as_deref(), Some("76"));
        assert_eq!(features[1].id.as_deref(), Some("32"));
    }

    #[test]
    fn test_collect_polygons_keeps_holes() {
        let value = Value::Polygon(vec![
            vec![vec![0.0, 0.0], vec![4.0, 0.0], vec![4.0, 4.0], vec![0.0, 0.0]],
            vec![vec![1.0, 1.0], vec![2.0, 1.0], vec![2.0, 2.0], vec![1.0, 1.0]],
        ]);
        let mut polygons = Vec::new();
        collect_polygons(&value, &mut polygons);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_countries(Path::new("/nonexistent/countries.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
