//! Per-row geometry resolution and GeoJSON feature parsing.
//!
//! A data row turns into a feature through one of two paths, in order:
//! an embedded geometry column (GeoJSON, as a string or an already
//! structured object), or a latitude/longitude column pair. Rows that
//! resolve to no geometry are dropped from their layer; nothing here
//! raises an error for bad data.

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{DataRow, LayerConfig, MapFormData};
use crate::proj;

/// One geographic entity plus the attribute map it was built from. The
/// attributes carry every original row field for tooltip and filter use.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub geometry: geo::Geometry,
    pub attributes: Map<String, Value>,
}

/// Column-name hints for geometry resolution. Layer-level hints win over
/// the form-level defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnHints<'a> {
    pub geometry: Option<&'a str>,
    pub latitude: Option<&'a str>,
    pub longitude: Option<&'a str>,
}

impl<'a> ColumnHints<'a> {
    pub fn for_layer(layer: &'a LayerConfig, form: &'a MapFormData) -> Self {
        Self {
            geometry: layer
                .geometry_column
                .as_deref()
                .or(form.geometry_column.as_deref()),
            latitude: layer
                .latitude_column
                .as_deref()
                .or(form.latitude_column.as_deref()),
            longitude: layer
                .longitude_column
                .as_deref()
                .or(form.longitude_column.as_deref()),
        }
    }
}

/// Resolve one row to a Web Mercator geometry, or `None` to drop the row.
///
/// A populated geometry column takes precedence; a parse failure there does
/// not fall back to the lat/lon pair.
pub fn resolve_geometry(row: &DataRow, hints: &ColumnHints) -> Option<geo::Geometry> {
    if let Some(col) = hints.geometry {
        if let Some(value) = row.get(col).filter(|v| has_content(v)) {
            return parse_geometry_value(value).map(proj::reproject);
        }
    }

    let lat_col = hints.latitude?;
    let lon_col = hints.longitude?;
    // Latitudes past the poles would project to a NaN coordinate
    let lat = numeric(row.get(lat_col)?).filter(|lat| lat.abs() <= 90.0)?;
    let lon = numeric(row.get(lon_col)?)?;
    Some(geo::Geometry::Point(proj::from_lon_lat(lon, lat).into()))
}

/// Convert query rows into features. Rows that yield no geometry are
/// dropped; every surviving feature carries the full row as attributes.
pub fn build_features(rows: &[DataRow], hints: &ColumnHints) -> Vec<Feature> {
    rows.iter()
        .filter_map(|row| {
            let geometry = resolve_geometry(row, hints)?;
            Some(Feature {
                geometry,
                attributes: row.clone(),
            })
        })
        .collect()
}

/// Parse a GeoJSON value (FeatureCollection, Feature, or bare geometry)
/// into reprojected features. Malformed data yields an empty list.
pub fn features_from_geojson(value: &Value) -> Vec<Feature> {
    match serde_json::from_value::<geojson::GeoJson>(value.clone()) {
        Ok(parsed) => features_from_parsed(parsed),
        Err(e) => {
            warn!("Failed to parse inline GeoJSON: {e}");
            Vec::new()
        }
    }
}

/// Same as [`features_from_geojson`], from raw text (fetched documents).
pub fn features_from_geojson_str(text: &str) -> Vec<Feature> {
    match text.parse::<geojson::GeoJson>() {
        Ok(parsed) => features_from_parsed(parsed),
        Err(e) => {
            warn!("Failed to parse fetched GeoJSON: {e}");
            Vec::new()
        }
    }
}

fn features_from_parsed(parsed: geojson::GeoJson) -> Vec<Feature> {
    match parsed {
        geojson::GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .filter_map(convert_feature)
            .collect(),
        geojson::GeoJson::Feature(feature) => convert_feature(feature).into_iter().collect(),
        geojson::GeoJson::Geometry(geometry) => geo::Geometry::try_from(geometry)
            .ok()
            .map(|g| Feature {
                geometry: proj::reproject(g),
                attributes: Map::new(),
            })
            .into_iter()
            .collect(),
    }
}

fn convert_feature(feature: geojson::Feature) -> Option<Feature> {
    let geometry = geo::Geometry::try_from(feature.geometry?).ok()?;
    Some(Feature {
        geometry: proj::reproject(geometry),
        attributes: feature.properties.unwrap_or_default(),
    })
}

fn parse_geometry_value(value: &Value) -> Option<geo::Geometry> {
    let parsed: geojson::Geometry = match value {
        Value::String(text) => match serde_json::from_str(text) {
            Ok(g) => g,
            Err(e) => {
                debug!("Failed to parse geometry column value: {e}");
                return None;
            }
        },
        Value::Object(_) => match serde_json::from_value(value.clone()) {
            Ok(g) => g,
            Err(e) => {
                debug!("Geometry column object is not a GeoJSON geometry: {e}");
                return None;
            }
        },
        _ => return None,
    };

    match geo::Geometry::try_from(parsed) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            debug!("Unsupported geometry in geometry column: {e}");
            None
        }
    }
}

/// A geometry column counts as populated only for non-null, non-empty values.
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> DataRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    fn latlon_hints() -> ColumnHints<'static> {
        ColumnHints {
            geometry: None,
            latitude: Some("lat"),
            longitude: Some("lon"),
        }
    }

    #[test]
    fn lat_lon_pair_resolves_to_a_reprojected_point() {
        let row = row(json!({"lat": 40.7128, "lon": -74.0060, "name": "nyc"}));
        let geometry = resolve_geometry(&row, &latlon_hints()).unwrap();
        let geo::Geometry::Point(point) = geometry else {
            panic!("expected a point");
        };
        let (lon, lat) = proj::to_lon_lat(point.0);
        assert!((lat - 40.7128).abs() < 1e-9);
        assert!((lon - -74.0060).abs() < 1e-9);
    }

    #[test]
    fn string_coordinates_are_parsed() {
        let row = row(json!({"lat": "40.7128", "lon": "-74.0060"}));
        assert!(resolve_geometry(&row, &latlon_hints()).is_some());
    }

    #[test]
    fn unparsable_coordinate_drops_the_row() {
        let bad = row(json!({"lat": "not-a-number", "lon": -74.0060}));
        assert!(resolve_geometry(&bad, &latlon_hints()).is_none());

        let with_null = row(json!({"lat": null, "lon": -74.0060}));
        assert!(resolve_geometry(&with_null, &latlon_hints()).is_none());
    }

    #[test]
    fn latitude_past_the_poles_drops_the_row() {
        let too_far_north = row(json!({"lat": 120.0, "lon": -74.0060}));
        assert!(resolve_geometry(&too_far_north, &latlon_hints()).is_none());

        let too_far_south = row(json!({"lat": -90.5, "lon": -74.0060}));
        assert!(resolve_geometry(&too_far_south, &latlon_hints()).is_none());

        let at_the_pole = row(json!({"lat": 90.0, "lon": 0.0}));
        assert!(resolve_geometry(&at_the_pole, &latlon_hints()).is_some());
    }

    #[test]
    fn geometry_column_takes_precedence_over_lat_lon() {
        let hints = ColumnHints {
            geometry: Some("geom"),
            latitude: Some("lat"),
            longitude: Some("lon"),
        };
        let row = row(json!({
            "geom": {"type": "Point", "coordinates": [10.0, 20.0]},
            "lat": 40.0,
            "lon": -74.0,
        }));
        let geo::Geometry::Point(point) = resolve_geometry(&row, &hints).unwrap() else {
            panic!("expected a point");
        };
        let (lon, lat) = proj::to_lon_lat(point.0);
        assert!((lon - 10.0).abs() < 1e-9);
        assert!((lat - 20.0).abs() < 1e-9);
    }

    #[test]
    fn geometry_column_accepts_json_strings() {
        let hints = ColumnHints {
            geometry: Some("geom"),
            ..Default::default()
        };
        let row = row(json!({
            "geom": r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}"#,
        }));
        assert!(matches!(
            resolve_geometry(&row, &hints),
            Some(geo::Geometry::Polygon(_))
        ));
    }

    #[test]
    fn malformed_geometry_does_not_fall_back_to_lat_lon() {
        let hints = ColumnHints {
            geometry: Some("geom"),
            latitude: Some("lat"),
            longitude: Some("lon"),
        };
        let row = row(json!({"geom": "not geojson", "lat": 40.0, "lon": -74.0}));
        assert!(resolve_geometry(&row, &hints).is_none());
    }

    #[test]
    fn empty_geometry_value_falls_through_to_lat_lon() {
        let hints = ColumnHints {
            geometry: Some("geom"),
            latitude: Some("lat"),
            longitude: Some("lon"),
        };
        let row = row(json!({"geom": "", "lat": 40.0, "lon": -74.0}));
        assert!(resolve_geometry(&row, &hints).is_some());
    }

    #[test]
    fn build_features_keeps_attributes_and_drops_bad_rows() {
        let rows = vec![
            row(json!({"lat": 40.7128, "lon": -74.0060, "city": "new york"})),
            row(json!({"lat": "oops", "lon": -0.1278, "city": "london"})),
            row(json!({"lat": 48.8566, "lon": 2.3522, "city": "paris"})),
        ];
        let features = build_features(&rows, &latlon_hints());
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].attributes.get("city"), Some(&json!("new york")));
        assert_eq!(features[1].attributes.get("city"), Some(&json!("paris")));
    }

    #[test]
    fn feature_collection_parses_with_properties() {
        let features = features_from_geojson(&json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [2.3522, 48.8566]},
                    "properties": {"name": "paris"}
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": {"name": "nowhere"}
                }
            ]
        }));
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].attributes.get("name"), Some(&json!("paris")));
    }

    #[test]
    fn malformed_geojson_yields_no_features() {
        assert!(features_from_geojson(&json!({"type": "Nope"})).is_empty());
        assert!(features_from_geojson_str("{{{").is_empty());
    }
}
