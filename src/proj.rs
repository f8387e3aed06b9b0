//! Reprojection between geographic lon/lat (EPSG:4326) and the map's
//! planar Web Mercator reference (EPSG:3857), in meters.

use std::f64::consts::PI;

use geo::{Coord, Geometry, MapCoords};

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Project a lon/lat pair (degrees) into Web Mercator meters.
pub fn from_lon_lat(lon: f64, lat: f64) -> Coord {
    Coord {
        x: EARTH_RADIUS_M * lon.to_radians(),
        y: EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln(),
    }
}

/// Inverse transform, back to lon/lat degrees.
pub fn to_lon_lat(coord: Coord) -> (f64, f64) {
    let lon = (coord.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * ((coord.y / EARTH_RADIUS_M).exp().atan() - PI / 4.0)).to_degrees();
    (lon, lat)
}

/// Reproject every coordinate of a geometry from lon/lat into Web Mercator.
pub fn reproject(geometry: Geometry) -> Geometry {
    geometry.map_coords(|c| from_lon_lat(c.x, c.y))
}
