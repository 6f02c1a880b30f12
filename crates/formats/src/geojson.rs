use foundation::bounds::Aabb2;
use serde_json::{Map, Value};

use crate::error::FormatError;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

pub type Ring = Vec<GeoPoint>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Polygons as lists of rings (outer ring first). Empty for point geometries.
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Geometry::Polygon(rings) => vec![rings.as_slice()],
            Geometry::MultiPolygon(polys) => polys.iter().map(|p| p.as_slice()).collect(),
            Geometry::Point(_) | Geometry::MultiPoint(_) => Vec::new(),
        }
    }

    pub fn lon_lat_bounds(&self) -> Aabb2 {
        let mut b = Aabb2::empty();
        match self {
            Geometry::Point(p) => b.extend(p.lon_deg, p.lat_deg),
            Geometry::MultiPoint(ps) => {
                for p in ps {
                    b.extend(p.lon_deg, p.lat_deg);
                }
            }
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {
                for poly in self.polygons() {
                    // Holes never extend past the outer ring.
                    if let Some(outer) = poly.first() {
                        for p in outer {
                            b.extend(p.lon_deg, p.lat_deg);
                        }
                    }
                }
            }
        }
        b
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// `None` for null or unsupported geometries.
    pub geometry: Option<Geometry>,
}

impl GeoFeature {
    /// String view of a property; numbers are stringified.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<GeoFeature>,
}

impl FeatureCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, FormatError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| FormatError::Json(e.to_string()))?;
        Self::from_geojson_value(value)
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, FormatError> {
        let obj = value
            .as_object()
            .ok_or(FormatError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(FormatError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(FormatError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(FormatError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val.as_object().ok_or(FormatError::InvalidFeature {
                index,
                reason: "feature must be an object".to_string(),
            })?;

            let id = match feat_obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let geometry = match feat_obj.get("geometry") {
                None | Some(Value::Null) => None,
                Some(geometry_val) => parse_geometry(geometry_val)
                    .map_err(|reason| FormatError::InvalidFeature { index, reason })?,
            };

            features.push(GeoFeature {
                id,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }

    pub fn lon_lat_bounds(&self) -> Aabb2 {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .fold(Aabb2::empty(), |acc, g| acc.union(&g.lon_lat_bounds()))
    }
}

/// `Ok(None)` for geometry types the map does not draw (lines, collections).
fn parse_geometry(value: &Value) -> Result<Option<Geometry>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    let coords = match obj.get("coordinates") {
        Some(c) => c,
        None if ty == "GeometryCollection" => return Ok(None),
        None => return Err("geometry missing coordinates".to_string()),
    };

    match ty {
        "Point" => Ok(Some(Geometry::Point(parse_point(coords)?))),
        "MultiPoint" => Ok(Some(Geometry::MultiPoint(parse_points(coords)?))),
        "Polygon" => Ok(Some(Geometry::Polygon(parse_polygon(coords)?))),
        "MultiPolygon" => Ok(Some(Geometry::MultiPolygon(parse_multi_polygon(coords)?))),
        other => {
            tracing::debug!("skipping unsupported geometry type {other}");
            Ok(None)
        }
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("Point coordinates must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_polygon(coords: &Value) -> Result<Vec<Ring>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_points).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Ring>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}

#[cfg(test)]
mod tests {
    use super::{FeatureCollection, Geometry};
    use crate::error::FormatError;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": 392,
             "properties": {"ISO_A3": "JPN", "NAME": "Japan"},
             "geometry": {"type": "Polygon", "coordinates": [[[130,31],[142,31],[142,45],[130,45],[130,31]]]}},
            {"type": "Feature",
             "properties": {"name": "Null Island"},
             "geometry": null},
            {"type": "Feature",
             "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}}
        ]
    }"#;

    #[test]
    fn parses_polygons_and_tolerates_null_geometry() {
        let fc = FeatureCollection::from_geojson_str(SAMPLE).expect("parse");
        assert_eq!(fc.features.len(), 3);
        assert_eq!(fc.features[0].id.as_deref(), Some("392"));
        assert!(matches!(fc.features[0].geometry, Some(Geometry::Polygon(_))));
        assert!(fc.features[1].geometry.is_none());
        assert!(fc.features[2].geometry.is_none());
        assert_eq!(fc.features[0].property_str("ISO_A3").as_deref(), Some("JPN"));
    }

    #[test]
    fn bounds_cover_outer_rings() {
        let fc = FeatureCollection::from_geojson_str(SAMPLE).unwrap();
        let b = fc.lon_lat_bounds();
        assert_eq!(b.min, [130.0, 31.0]);
        assert_eq!(b.max, [142.0, 45.0]);
    }

    #[test]
    fn rejects_non_collections() {
        let err = FeatureCollection::from_geojson_str(r#"{"type":"Feature"}"#).unwrap_err();
        assert_eq!(err, FormatError::NotAFeatureCollection);
        assert!(matches!(
            FeatureCollection::from_geojson_str("not json"),
            Err(FormatError::Json(_))
        ));
    }

    #[test]
    fn reports_bad_coordinates_with_index() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":["a",1]}}]}"#;
        let err = FeatureCollection::from_geojson_str(payload).unwrap_err();
        assert!(matches!(err, FormatError::InvalidFeature { index: 0, .. }));
    }
}
