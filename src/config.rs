//! Chart form-data and layer configuration types.
//!
//! The layer list is stored by the host as either a structured array or a
//! JSON-encoded string. A known defect in the host's form-editing widget can
//! concatenate the serialized value with itself (`[...][...]`), so the string
//! path truncates to the first complete array before parsing. Any parse
//! failure resolves to an empty list; the caller renders that as "no layers
//! configured" rather than an error.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One query-result row: column name to scalar/geometry value.
pub type DataRow = Map<String, Value>;

/// Supported layer kinds. Wire names match the stored chart configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Point/feature data built from query rows
    Vector,
    /// Remote tiled imagery from a WMS service
    Wms,
    /// Static geometry collection, inline or fetched from a URL
    Geojson,
    /// Anything else; skipped at translation time
    #[serde(other)]
    Unknown,
}

/// Visual kind hint for a layer style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Icon,
    Path,
    Polygon,
    Circle,
}

/// Declarative style for one layer. Every field is optional; the resolver
/// in [`crate::style`] applies the documented defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    #[serde(rename = "type")]
    pub kind: Option<StyleKind>,
    pub icon_url: Option<String>,
    pub icon_scale: Option<f64>,
    pub color: Option<String>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub radius: Option<f64>,
    pub size: Option<f64>,
    pub opacity: Option<f64>,
    pub fill_opacity: Option<f64>,
    pub weight: Option<f64>,
}

/// WMS service parameters for tiled-imagery layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WmsParams {
    pub url: Option<String>,
    pub layers: Option<String>,
    /// Extra request parameters forwarded to the service verbatim.
    pub params: Map<String, Value>,
}

/// One layer description from the chart configuration.
///
/// Exactly one kind-specific field group is meaningful per `kind`; the
/// others are ignored. `id` should be unique within one rendering pass,
/// but uniqueness is the rendering surface's concern (last write wins
/// there) — the translator only tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// External dataset reference, by id or name. Not resolved here; a
    /// vector layer carrying one is skipped with a log line.
    #[serde(default, rename = "datasource_id")]
    pub datasource_id: Option<Value>,
    #[serde(default, rename = "datasource_name")]
    pub datasource_name: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub latitude_column: Option<String>,
    #[serde(default)]
    pub longitude_column: Option<String>,
    #[serde(default)]
    pub geometry_column: Option<String>,
    #[serde(default)]
    pub tooltip_columns: Option<Vec<String>>,
    #[serde(default)]
    pub style: Option<StyleConfig>,
    #[serde(default)]
    pub wms_params: Option<WmsParams>,
    /// Service URL for WMS layers, or source URL for remote GeoJSON layers.
    #[serde(default)]
    pub url: Option<String>,
    /// Inline GeoJSON for static-geometry layers.
    #[serde(default)]
    pub geojson_data: Option<Value>,
    #[serde(default)]
    pub z_index: Option<i64>,
}

fn default_visible() -> bool {
    true
}

impl LayerConfig {
    pub fn has_external_datasource(&self) -> bool {
        self.datasource_id.is_some() || self.datasource_name.is_some()
    }
}

/// The layer configuration value as stored by the host: already structured,
/// or a JSON-encoded string. Resolved once at the boundary; everything past
/// this type only sees the structured form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayersValue {
    List(Vec<LayerConfig>),
    Raw(String),
}

impl Default for LayersValue {
    fn default() -> Self {
        LayersValue::List(Vec::new())
    }
}

impl LayersValue {
    /// Structured layer list. A structured value is returned as-is; a string
    /// goes through [`parse_layer_list`].
    pub fn resolve(&self) -> Vec<LayerConfig> {
        match self {
            LayersValue::List(layers) => layers.clone(),
            LayersValue::Raw(raw) => parse_layer_list(raw),
        }
    }
}

/// Whole-chart form data supplied by the host. Column hints and tooltip
/// fields here are the fallback for layers that omit their own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapFormData {
    pub layers: LayersValue,
    pub latitude_column: Option<String>,
    pub longitude_column: Option<String>,
    pub geometry_column: Option<String>,
    pub tooltip_columns: Option<Vec<String>>,
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub zoom: Option<f64>,
    pub enable_cross_filter: bool,
    /// Whether deselecting down to an empty selection emits a clearing
    /// cross-filter payload. Off by default, matching the sticky-filter
    /// behavior of the original plugin.
    pub emit_empty_filter: bool,
}

/// One query's results as handed over by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryData {
    pub data: Vec<DataRow>,
    pub colnames: Vec<String>,
    pub error: Option<String>,
}

/// Parse a JSON-encoded layer list, tolerating the concatenation defect.
/// Never fails: malformed input yields an empty list.
pub fn parse_layer_list(raw: &str) -> Vec<LayerConfig> {
    let trimmed = raw.trim();

    // Truncate to the first array only when the remainder is empty or the
    // start of another array; other trailing garbage is left to fail the
    // parse below.
    let candidate = match first_array_span(trimmed) {
        Some(end) => {
            let rest = trimmed[end..].trim_start();
            if rest.is_empty() || rest.starts_with('[') {
                &trimmed[..end]
            } else {
                trimmed
            }
        }
        None => trimmed,
    };

    match serde_json::from_str(candidate) {
        Ok(layers) => layers,
        Err(e) => {
            warn!("Failed to parse layer configuration: {e}");
            Vec::new()
        }
    }
}

/// Byte offset just past the first complete top-level JSON array, if the
/// input starts with one. String-aware so brackets inside quoted values do
/// not count.
fn first_array_span(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
