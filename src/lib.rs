//! Translation of declarative map-layer configuration into renderable layers.
//!
//! Chart configuration arrives as a layer list (JSON string or structured),
//! optionally with tabular query rows. Each layer description is translated
//! into a renderable layer: a source of geographic features (or a tile
//! service reference) plus a resolved visual style. Geometry is reprojected
//! from lon/lat (EPSG:4326) into Web Mercator (EPSG:3857) on the way in.
//!
//! Translation is deliberately forgiving: malformed configuration yields an
//! empty layer list, a bad row drops that row, and a layer missing required
//! fields is skipped with a log line. Nothing in here is fatal to the caller.

pub mod colors;
pub mod config;
pub mod fetch;
pub mod geometry;
pub mod interact;
pub mod layer;
pub mod proj;
pub mod style;
