use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Boundary loading failure. Callers may continue without the boundary map.
#[derive(Debug, thiserror::Error)]
pub enum GeoLoadError {
    #[error("failed to read boundary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("boundary file is not valid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("boundary file must be a FeatureCollection, found '{0}'")]
    NotFeatureCollection(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Polygon,
    MultiPolygon,
}

/// Municipality outline. The geometry is carried through untouched for renderers.
#[derive(Debug, Clone, Serialize)]
pub struct MunicipalityBoundary {
    pub name: String,
    pub kind: GeometryKind,
    pub geometry: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum InvalidFeature {
    #[error("feature has no '{0}' name property")]
    MissingName(String),
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error("unsupported geometry type '{0}'")]
    UnsupportedGeometry(String),
    #[error("geometry has a malformed or open ring")]
    MalformedRing,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    boundaries: Vec<MunicipalityBoundary>,
    skipped: usize,
}

impl BoundarySet {
    pub fn from_path<P: AsRef<Path>>(path: P, name_field: &str) -> Result<Self, GeoLoadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let set = Self::from_reader(file, name_field)?;
        info!(
            path = %path.display(),
            boundaries = set.boundaries.len(),
            skipped = set.skipped,
            "municipality boundaries loaded"
        );
        Ok(set)
    }

    pub fn from_reader<R: Read>(reader: R, name_field: &str) -> Result<Self, GeoLoadError> {
        let collection: RawCollection = serde_json::from_reader(reader)?;
        if collection.kind != "FeatureCollection" {
            return Err(GeoLoadError::NotFeatureCollection(collection.kind));
        }

        let mut set = Self::default();
        for (ordinal, feature) in collection.features.into_iter().enumerate() {
            match boundary_from_feature(feature, name_field) {
                Ok(boundary) => set.boundaries.push(boundary),
                Err(reason) => {
                    set.skipped += 1;
                    warn!(feature = ordinal, %reason, "skipping invalid municipality geometry");
                }
            }
        }

        Ok(set)
    }

    pub fn boundaries(&self) -> &[MunicipalityBoundary] {
        &self.boundaries
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

fn boundary_from_feature(
    feature: RawFeature,
    name_field: &str,
) -> Result<MunicipalityBoundary, InvalidFeature> {
    let name = feature
        .properties
        .as_ref()
        .and_then(|properties| properties.get(name_field))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| InvalidFeature::MissingName(name_field.to_string()))?
        .to_string();

    let geometry = feature
        .geometry
        .filter(|geometry| !geometry.is_null())
        .ok_or(InvalidFeature::MissingGeometry)?;
    let kind = validate_geometry(&geometry)?;

    Ok(MunicipalityBoundary {
        name,
        kind,
        geometry,
    })
}

pub(crate) fn validate_geometry(geometry: &Value) -> Result<GeometryKind, InvalidFeature> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let coordinates = geometry.get("coordinates");

    match kind {
        "Polygon" => {
            validate_polygon(coordinates)?;
            Ok(GeometryKind::Polygon)
        }
        "MultiPolygon" => {
            let polygons = coordinates
                .and_then(Value::as_array)
                .filter(|polygons| !polygons.is_empty())
                .ok_or(InvalidFeature::MalformedRing)?;
            for polygon in polygons {
                validate_polygon(Some(polygon))?;
            }
            Ok(GeometryKind::MultiPolygon)
        }
        other => Err(InvalidFeature::UnsupportedGeometry(other.to_string())),
    }
}

fn validate_polygon(coordinates: Option<&Value>) -> Result<(), InvalidFeature> {
    let rings = coordinates
        .and_then(Value::as_array)
        .filter(|rings| !rings.is_empty())
        .ok_or(InvalidFeature::MalformedRing)?;

    for ring in rings {
        let positions = ring
            .as_array()
            .filter(|positions| positions.len() >= 4)
            .ok_or(InvalidFeature::MalformedRing)?;
        let points = positions
            .iter()
            .map(position)
            .collect::<Option<Vec<_>>>()
            .ok_or(InvalidFeature::MalformedRing)?;
        if points.first() != points.last() {
            return Err(InvalidFeature::MalformedRing);
        }
    }

    Ok(())
}

fn position(value: &Value) -> Option<(f64, f64)> {
    let pair = value.as_array().filter(|pair| pair.len() >= 2)?;
    let x = pair[0].as_f64().filter(|x| x.is_finite())?;
    let y = pair[1].as_f64().filter(|y| y.is_finite())?;
    Some((x, y))
}
