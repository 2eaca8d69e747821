use crate::domains::geometry::{Point, Polygon};
use geo::{Coord, LineString, Polygon as GeoPolygon};

/// Mean earth radius in meters.
pub const EARTH_MEAN_RADIUS: f64 = 6_371_008.8;

/// Bring a longitude or longitude difference into [-180, 180).
fn wrap_lon(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

fn span(lons: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    lons.fold(None, |acc, lon| match acc {
        None => Some((lon, lon)),
        Some((min, max)) => Some((min.min(lon), max.max(lon))),
    })
}

/// Middle of the narrower of the two readings of the longitude extent: as
/// given, or with western longitudes shifted past 180.
fn lon_center(points: &[Point]) -> Option<f64> {
    let direct = span(points.iter().map(|p| p.lon))?;
    let shifted = span(
        points
            .iter()
            .map(|p| if p.lon < 0.0 { p.lon + 360.0 } else { p.lon }),
    )?;
    let (min, max) = if shifted.1 - shifted.0 < direct.1 - direct.0 {
        shifted
    } else {
        direct
    };
    Some(wrap_lon((min + max) / 2.0))
}

fn lat_range(points: &[Point]) -> Option<(f64, f64)> {
    span(points.iter().map(|p| p.lat))
}

/// Local equirectangular frame in meters, centered on the area being routed.
///
/// Straight lines map to straight lines, so "segment touches polygon" answers
/// carry over between the planar and geodetic views of the same request.
/// Longitudes are measured the short way round from the origin, so an area
/// straddling the antimeridian stays contiguous.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    origin: Point,
    meters_per_degree_lon: f64,
    meters_per_degree_lat: f64,
}

impl LocalFrame {
    pub fn around(points: impl IntoIterator<Item = Point>) -> Self {
        let points: Vec<Point> = points.into_iter().collect();
        let origin = match (lon_center(&points), lat_range(&points)) {
            (Some(lon), Some((min_lat, max_lat))) => Point {
                lon,
                lat: (min_lat + max_lat) / 2.0,
            },
            _ => Point { lon: 0.0, lat: 0.0 },
        };
        let meters_per_degree_lat = EARTH_MEAN_RADIUS.to_radians();
        Self {
            origin,
            meters_per_degree_lon: (meters_per_degree_lat * origin.lat.to_radians().cos()).max(1e-6),
            meters_per_degree_lat,
        }
    }

    pub fn to_planar(&self, p: Point) -> Coord<f64> {
        Coord {
            x: wrap_lon(p.lon - self.origin.lon) * self.meters_per_degree_lon,
            y: (p.lat - self.origin.lat) * self.meters_per_degree_lat,
        }
    }

    pub fn to_geodetic(&self, c: Coord<f64>) -> Point {
        Point {
            lon: wrap_lon(self.origin.lon + c.x / self.meters_per_degree_lon),
            lat: self.origin.lat + c.y / self.meters_per_degree_lat,
        }
    }

    fn ring_to_planar(&self, ring: &[Point]) -> LineString<f64> {
        LineString::new(ring.iter().map(|p| self.to_planar(*p)).collect())
    }

    fn ring_to_geodetic(&self, ring: &LineString<f64>) -> Vec<Point> {
        ring.coords().map(|c| self.to_geodetic(*c)).collect()
    }

    pub fn polygon_to_planar(&self, polygon: &Polygon) -> GeoPolygon<f64> {
        GeoPolygon::new(
            self.ring_to_planar(&polygon.exterior),
            polygon
                .interiors
                .iter()
                .map(|r| self.ring_to_planar(r))
                .collect(),
        )
    }

    pub fn polygon_to_geodetic(&self, polygon: &GeoPolygon<f64>) -> Polygon {
        Polygon::new(
            self.ring_to_geodetic(polygon.exterior()),
            polygon
                .interiors()
                .iter()
                .map(|r| self.ring_to_geodetic(r))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64) -> Point {
        Point { lon, lat }
    }

    #[test]
    fn antimeridian_area_stays_contiguous() {
        let frame = LocalFrame::around([pt(179.9, 0.0), pt(-179.9, 0.0)]);
        let west = frame.to_planar(pt(179.9, 0.0));
        let east = frame.to_planar(pt(-179.9, 0.0));
        let metres = east.x - west.x;
        assert!(metres > 22_000.0 && metres < 22_400.0, "span = {}", metres);

        let back = frame.to_geodetic(east);
        assert!((back.lon + 179.9).abs() < 1e-9, "{:?}", back);
        assert!((frame.to_geodetic(west).lon - 179.9).abs() < 1e-9);
    }

    #[test]
    fn ordinary_area_keeps_plain_longitudes() {
        let frame = LocalFrame::around([pt(8.5, 53.5), pt(8.9, 53.6)]);
        let c = frame.to_planar(pt(8.7, 53.55));
        assert!(c.x.abs() < 1e-6 && c.y.abs() < 1e-6);
        assert!((frame.to_geodetic(frame.to_planar(pt(8.5, 53.5))).lon - 8.5).abs() < 1e-9);
    }
}
