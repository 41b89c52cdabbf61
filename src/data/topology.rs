//! TopoJSON decoding.
//!
//! Arcs are shared polylines, optionally quantized and delta-encoded.
//! Polygons reference arcs by index, with `!i` (`-i - 1`) meaning arc `i`
//! reversed.

use std::collections::HashMap;

use geojson::Value;
use serde::Deserialize;

use crate::data::RawId;
use crate::error::LoadError;

/// Object used when the topology has one named "countries"
const COUNTRIES_OBJECT: &str = "countries";

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub transform: Option<Transform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: HashMap<String, TopoGeometry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// Geometry object. `type` may be null for empty geometries.
#[derive(Debug, Deserialize)]
pub struct TopoGeometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub arcs: Option<ArcRefs>,
    #[serde(default)]
    pub geometries: Vec<TopoGeometry>,
}

/// Arc references, nested by geometry type
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ArcRefs {
    Polygons(Vec<Vec<Vec<i64>>>),
    Rings(Vec<Vec<i64>>),
    Line(Vec<i64>),
}

/// A decoded geometry with the id used to join it to the country list
#[derive(Debug, Clone)]
pub struct WorldFeature {
    pub id: Option<String>,
    pub geometry: Value,
}

type Position = Vec<f64>;

impl Topology {
    /// Decode the countries object into polygon features
    pub fn features(&self) -> Result<Vec<WorldFeature>, LoadError> {
        if self.kind != "Topology" {
            return Err(LoadError::Topology(format!("expected type Topology, got {}", self.kind)));
        }

        let object = self
            .objects
            .get(COUNTRIES_OBJECT)
            .or_else(|| self.objects.values().next())
            .ok_or_else(|| LoadError::Topology("topology has no objects".to_string()))?;

        let arcs = self.decode_arcs();
        let mut features = Vec::new();
        collect_features(object, &arcs, &mut features)?;
        Ok(features)
    }

    /// Absolute coordinates for every arc
    fn decode_arcs(&self) -> Vec<Vec<Position>> {
        self.arcs
            .iter()
            .map(|arc| match self.transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                        })
                        .collect()
                }
                None => arc.iter().filter(|p| p.len() >= 2).map(|p| vec![p[0], p[1]]).collect(),
            })
            .collect()
    }
}

fn collect_features(
    geometry: &TopoGeometry,
    arcs: &[Vec<Position>],
    out: &mut Vec<WorldFeature>,
) -> Result<(), LoadError> {
    let id = geometry.id.as_ref().map(RawId::normalized);

    match (geometry.kind.as_deref(), &geometry.arcs) {
        (Some("Polygon"), Some(ArcRefs::Rings(rings))) => {
            out.push(WorldFeature {
                id,
                geometry: Value::Polygon(polygon(rings, arcs)?),
            });
        }
        (Some("MultiPolygon"), Some(ArcRefs::Polygons(polygons))) => {
            let polygons = polygons
                .iter()
                .map(|rings| polygon(rings, arcs))
                .collect::<Result<Vec<_>, _>>()?;
            out.push(WorldFeature {
                id,
                geometry: Value::MultiPolygon(polygons),
            });
        }
        // `[]` and `[[]]` parse as the deepest variant
        (Some("Polygon"), Some(ArcRefs::Polygons(p))) if p.iter().all(Vec::is_empty) => {}
        (Some("GeometryCollection"), _) => {
            for g in &geometry.geometries {
                collect_features(g, arcs, out)?;
            }
        }
        (Some(kind @ ("Polygon" | "MultiPolygon")), _) => {
            return Err(LoadError::Topology(format!("{kind} has malformed arcs")));
        }
        _ => {}
    }
    Ok(())
}

fn polygon(rings: &[Vec<i64>], arcs: &[Vec<Position>]) -> Result<Vec<Vec<Position>>, LoadError> {
    rings.iter().map(|ring| stitch_ring(ring, arcs)).collect()
}

/// Join arcs into one ring, dropping the shared first point of each follow-on arc
fn stitch_ring(indices: &[i64], arcs: &[Vec<Position>]) -> Result<Vec<Position>, LoadError> {
    let mut ring: Vec<Position> = Vec::new();

    for (n, &index) in indices.iter().enumerate() {
        let (arc_idx, reversed) = if index >= 0 {
            (index as usize, false)
        } else {
            ((!index) as usize, true)
        };

        let arc = arcs
            .get(arc_idx)
            .ok_or_else(|| LoadError::Topology(format!("arc index {index} out of range")))?;

        let skip = if n > 0 { 1 } else { 0 };
        if reversed {
            ring.extend(arc.iter().rev().skip(skip).cloned());
        } else {
            ring.extend(arc.iter().skip(skip).cloned());
        }
    }

    Ok(ring)
}
