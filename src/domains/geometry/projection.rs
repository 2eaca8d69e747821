use super::types::{DisplayPoint, Point};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Sphere radius used by EPSG:3857.
pub const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;
/// Latitude at which Web Mercator becomes square.
pub const WEB_MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Maps between geodetic coordinates and the coordinates the map canvas draws in.
pub trait Projection: Send + Sync {
    fn code(&self) -> &'static str;
    fn to_display(&self, point: Point) -> DisplayPoint;
    fn to_geodetic(&self, point: DisplayPoint) -> Point;

    fn position_to_display(&self, position: [f64; 2]) -> [f64; 2] {
        let p = self.to_display(Point {
            lon: position[0],
            lat: position[1],
        });
        [p.x, p.y]
    }

    fn position_to_geodetic(&self, position: [f64; 2]) -> [f64; 2] {
        let p = self.to_geodetic(DisplayPoint {
            x: position[0],
            y: position[1],
        });
        [p.lon, p.lat]
    }
}

/// Spherical Web Mercator (EPSG:3857), the projection the map canvas renders in.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn code(&self) -> &'static str {
        "EPSG:3857"
    }

    fn to_display(&self, point: Point) -> DisplayPoint {
        let lat = point
            .lat
            .clamp(-WEB_MERCATOR_MAX_LATITUDE, WEB_MERCATOR_MAX_LATITUDE);
        DisplayPoint {
            x: WEB_MERCATOR_RADIUS * point.lon.to_radians(),
            y: WEB_MERCATOR_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
        }
    }

    fn to_geodetic(&self, point: DisplayPoint) -> Point {
        Point {
            lon: (point.x / WEB_MERCATOR_RADIUS).to_degrees(),
            lat: (2.0 * (point.y / WEB_MERCATOR_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
        }
    }
}

/// Identity projection for hosts that already render in lon/lat.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geodetic;

impl Projection for Geodetic {
    fn code(&self) -> &'static str {
        "EPSG:4326"
    }

    fn to_display(&self, point: Point) -> DisplayPoint {
        DisplayPoint {
            x: point.lon,
            y: point.lat,
        }
    }

    fn to_geodetic(&self, point: DisplayPoint) -> Point {
        Point {
            lon: point.x,
            lat: point.y,
        }
    }
}
