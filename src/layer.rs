//! Translation of layer configuration into renderable layers.
//!
//! The translator builds fresh layers every pass and hands them to the
//! caller; it never touches a rendering surface itself and keeps no
//! references. A layer missing required fields, or of unknown kind, is
//! skipped with a log line while the rest of the pass continues.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{DataRow, LayerConfig, LayerKind, MapFormData, QueryData};
use crate::geometry::{self, ColumnHints, Feature};
use crate::style::{self, ResolvedStyle};

/// Where a renderable layer gets its content from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayerSource {
    /// In-memory features, already reprojected.
    Features { features: Vec<Feature> },
    /// Remote GeoJSON, loaded lazily by [`crate::fetch::RemoteFetcher`].
    RemoteGeojson { url: String },
    /// WMS tile service reference.
    TiledImagery {
        url: String,
        layers: String,
        params: Map<String, Value>,
        opacity: f64,
    },
}

/// One translated layer, ready for the rendering surface to own.
#[derive(Debug, Clone, Serialize)]
pub struct RenderableLayer {
    pub id: String,
    pub z_index: i64,
    pub visible: bool,
    pub source: LayerSource,
    /// `None` for tiled imagery, which only carries an opacity.
    pub style: Option<ResolvedStyle>,
}

impl RenderableLayer {
    /// Number of in-memory features, if this layer carries any.
    pub fn feature_count(&self) -> Option<usize> {
        match &self.source {
            LayerSource::Features { features } => Some(features.len()),
            _ => None,
        }
    }
}

/// Outcome of one full translation pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// The upstream query failed; the message is surfaced verbatim and
    /// replaces the map entirely.
    QueryError(String),
    /// Configuration yielded no layer descriptions.
    NoLayers,
    /// Translated layers, in configuration order.
    Layers(Vec<RenderableLayer>),
}

/// Translate one layer description. `position` is the 1-based index in the
/// configuration list, used as the z-index fallback. Returns `None` when
/// the layer cannot be built; the caller treats that as "no layer", not as
/// an error.
pub fn translate_layer(
    config: &LayerConfig,
    rows: &[DataRow],
    form: &MapFormData,
    position: usize,
) -> Option<RenderableLayer> {
    let source = match config.kind {
        LayerKind::Wms => wms_source(config)?,
        LayerKind::Geojson => geojson_source(config),
        LayerKind::Vector => {
            let hints = ColumnHints::for_layer(config, form);
            let features = geometry::build_features(rows, &hints);
            debug!(
                "Layer {}: {} of {} rows resolved to features",
                config.id,
                features.len(),
                rows.len()
            );
            LayerSource::Features { features }
        }
        LayerKind::Unknown => {
            warn!("Layer {} has an unknown kind, skipping", config.id);
            return None;
        }
    };

    let style = match config.kind {
        LayerKind::Wms => None,
        _ => Some(style::resolve_style(config.style.as_ref())),
    };

    Some(RenderableLayer {
        id: config.id.clone(),
        z_index: config.z_index.unwrap_or(position as i64),
        visible: config.visible,
        source,
        style,
    })
}

/// Run a full translation pass over the chart's form data and query results.
pub fn translate_pass(form: &MapFormData, queries: &[QueryData]) -> PassOutcome {
    if let Some(error) = queries.first().and_then(|q| q.error.clone()) {
        return PassOutcome::QueryError(error);
    }

    let configs = form.layers.resolve();
    if configs.is_empty() {
        return PassOutcome::NoLayers;
    }

    let main_rows: &[DataRow] = queries.first().map(|q| q.data.as_slice()).unwrap_or(&[]);

    let mut layers = Vec::new();
    for (index, config) in configs.iter().enumerate() {
        let rows: &[DataRow] = match config.kind {
            LayerKind::Vector if config.has_external_datasource() => {
                info!(
                    "Layer {} references an external dataset, skipping (not resolved here)",
                    config.id
                );
                continue;
            }
            LayerKind::Vector => main_rows,
            _ => &[],
        };

        if let Some(layer) = translate_layer(config, rows, form, index + 1) {
            layers.push(layer);
        }
    }

    PassOutcome::Layers(layers)
}

fn wms_source(config: &LayerConfig) -> Option<LayerSource> {
    let wms = config.wms_params.as_ref();
    let url = config
        .url
        .clone()
        .or_else(|| wms.and_then(|w| w.url.clone()));
    let layers = wms.and_then(|w| {
        w.layers.clone().or_else(|| {
            w.params
                .get("LAYERS")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
    });

    let (Some(url), Some(layers)) = (url, layers) else {
        warn!(
            "WMS layer {} requires a service URL and layer names, skipping",
            config.id
        );
        return None;
    };

    Some(LayerSource::TiledImagery {
        url,
        layers,
        params: wms.map(|w| w.params.clone()).unwrap_or_default(),
        opacity: config
            .style
            .as_ref()
            .and_then(|s| s.opacity)
            .unwrap_or(0.8),
    })
}

fn geojson_source(config: &LayerConfig) -> LayerSource {
    if let Some(url) = &config.url {
        LayerSource::RemoteGeojson { url: url.clone() }
    } else if let Some(data) = &config.geojson_data {
        LayerSource::Features {
            features: geometry::features_from_geojson(data),
        }
    } else {
        LayerSource::Features {
            features: Vec::new(),
        }
    }
}
