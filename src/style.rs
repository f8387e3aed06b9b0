//! Resolution of declarative style configuration into concrete styles.
//!
//! Mirrors what the rendering surface needs to construct its fill, stroke,
//! and marker objects. Absent fields fall back to documented defaults; a
//! missing style description resolves to the translucent-blue default.

use serde::Serialize;

use crate::colors::with_opacity;
use crate::config::{StyleConfig, StyleKind};

const DEFAULT_BLUE: &str = "#007bff";
const WHITE: &str = "#ffffff";
const BLACK: &str = "#000000";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

/// How point features are drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Marker {
    Circle {
        radius: f64,
        fill: Fill,
        stroke: Stroke,
    },
    Icon {
        url: String,
        scale: f64,
    },
}

/// A fully resolved layer style. `fill` and `stroke` are only present when
/// the configuration asked for them; the marker always resolves since every
/// point feature needs one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStyle {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub marker: Marker,
}

/// Resolve an optional style configuration per the layer styling rules.
pub fn resolve_style(config: Option<&StyleConfig>) -> ResolvedStyle {
    let Some(cfg) = config else {
        return ResolvedStyle {
            fill: Some(Fill {
                color: "rgba(0, 123, 255, 0.3)".to_string(),
            }),
            stroke: Some(Stroke {
                color: DEFAULT_BLUE.to_string(),
                width: 2.0,
            }),
            marker: Marker::Circle {
                radius: 6.0,
                fill: Fill {
                    color: DEFAULT_BLUE.to_string(),
                },
                stroke: Stroke {
                    color: WHITE.to_string(),
                    width: 2.0,
                },
            },
        };
    };

    let fill = cfg.fill_color.as_ref().map(|color| {
        let opacity = cfg.fill_opacity.or(cfg.opacity).unwrap_or(1.0);
        Fill {
            color: with_opacity(color, opacity),
        }
    });

    let wants_stroke =
        cfg.stroke_color.is_some() || cfg.weight.is_some() || cfg.stroke_width.is_some();
    let stroke = wants_stroke.then(|| Stroke {
        color: cfg
            .stroke_color
            .clone()
            .or_else(|| cfg.color.clone())
            .unwrap_or_else(|| BLACK.to_string()),
        width: cfg.weight.or(cfg.stroke_width).unwrap_or(2.0),
    });

    let marker = match (cfg.kind, &cfg.icon_url) {
        (Some(StyleKind::Icon), Some(url)) => Marker::Icon {
            url: url.clone(),
            scale: cfg.icon_scale.unwrap_or(1.0),
        },
        _ => {
            let color = cfg
                .color
                .as_deref()
                .or(cfg.fill_color.as_deref())
                .unwrap_or(DEFAULT_BLUE);
            Marker::Circle {
                radius: cfg.size.or(cfg.radius).unwrap_or(6.0),
                fill: Fill {
                    color: with_opacity(color, cfg.opacity.unwrap_or(0.8)),
                },
                stroke: Stroke {
                    color: cfg.stroke_color.clone().unwrap_or_else(|| WHITE.to_string()),
                    width: cfg.stroke_width.unwrap_or(2.0),
                },
            }
        }
    };

    ResolvedStyle {
        fill,
        stroke,
        marker,
    }
}
