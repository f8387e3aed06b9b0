//! Hover tooltip content and cross-filter payloads.

use serde_json::{json, Value};

use crate::config::{LayerConfig, MapFormData};
use crate::geometry::Feature;

/// How many attributes the tooltip shows when no fields are configured.
const TOOLTIP_FALLBACK_FIELDS: usize = 5;

/// Tooltip fields for a layer: its own list wins, the form-level list is
/// the fallback. Mirrors [`crate::geometry::ColumnHints::for_layer`].
pub fn tooltip_fields<'a>(layer: &'a LayerConfig, form: &'a MapFormData) -> Option<&'a [String]> {
    layer
        .tooltip_columns
        .as_deref()
        .or(form.tooltip_columns.as_deref())
}

/// Ordered `field: value` pairs for the hover tooltip.
///
/// With configured fields, every field appears and missing values render as
/// `N/A`. Without them, the first attributes of the feature are shown,
/// capped at [`TOOLTIP_FALLBACK_FIELDS`]; a `geometry` attribute is never
/// shown.
pub fn tooltip_entries(feature: &Feature, fields: Option<&[String]>) -> Vec<(String, String)> {
    match fields {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .map(|field| {
                let value = feature
                    .attributes
                    .get(field)
                    .filter(|v| !v.is_null())
                    .map(display_value)
                    .unwrap_or_else(|| "N/A".to_string());
                (field.clone(), value)
            })
            .collect(),
        _ => feature
            .attributes
            .iter()
            .filter(|(key, _)| key.as_str() != "geometry")
            .take(TOOLTIP_FALLBACK_FIELDS)
            .map(|(key, value)| (key.clone(), display_value(value)))
            .collect(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cross-filter payload for the host's filter-state channel: the attribute
/// maps of all currently selected features.
///
/// Returns `None` when nothing should be emitted: cross-filtering is
/// disabled, or the selection is empty and `emit_empty_filter` is off (the
/// default, matching the host's sticky-filter behavior).
pub fn filter_payload(selected: &[Feature], form: &MapFormData) -> Option<Value> {
    if !form.enable_cross_filter {
        return None;
    }
    if selected.is_empty() && !form.emit_empty_filter {
        return None;
    }
    let filters: Vec<Value> = selected
        .iter()
        .map(|f| Value::Object(f.attributes.clone()))
        .collect();
    Some(json!({ "filters": filters }))
}
