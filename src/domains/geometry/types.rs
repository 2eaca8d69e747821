use crate::common::{DomainError, DomainResult};
use geojson::JsonObject;
use serde::{Deserialize, Serialize};

pub const MAX_LONGITUDE: f64 = 180.0;
pub const MAX_LATITUDE: f64 = 90.0;

/// A geodetic coordinate in degrees (EPSG:4326 axis order: lon, lat).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lon: f64, lat: f64) -> DomainResult<Self> {
        let point = Self { lon, lat };
        point.validate()?;
        Ok(point)
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && self.lon.abs() <= MAX_LONGITUDE
            && self.lat.abs() <= MAX_LATITUDE
    }

    pub fn validate(&self) -> DomainResult<()> {
        if !self.lon.is_finite() || !self.lat.is_finite() {
            return Err(DomainError::invalid(format!(
                "non-finite coordinate ({}, {})",
                self.lon, self.lat
            )));
        }
        if !self.is_valid() {
            return Err(DomainError::invalid(format!(
                "coordinate ({}, {}) is outside lon [-180, 180] / lat [-90, 90]",
                self.lon, self.lat
            )));
        }
        Ok(())
    }

    pub fn to_position(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

/// A coordinate in the display projection (Web Mercator meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

/// A closed obstacle boundary. The exterior ring comes first, holes follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub interiors: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>, interiors: Vec<Vec<Point>>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// Axis aligned rectangle, handy for tests and demos.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::new(
            vec![
                Point { lon: min.lon, lat: min.lat },
                Point { lon: max.lon, lat: min.lat },
                Point { lon: max.lon, lat: max.lat },
                Point { lon: min.lon, lat: max.lat },
                Point { lon: min.lon, lat: min.lat },
            ],
            Vec::new(),
        )
    }

    pub fn rings(&self) -> impl Iterator<Item = &[Point]> {
        std::iter::once(self.exterior.as_slice()).chain(self.interiors.iter().map(Vec::as_slice))
    }

    /// Rings need at least four positions, must be closed and finite.
    pub fn validate(&self) -> DomainResult<()> {
        for (index, ring) in self.rings().enumerate() {
            if ring.len() < 4 {
                return Err(DomainError::invalid(format!(
                    "ring {} has {} positions, at least 4 are required",
                    index,
                    ring.len()
                )));
            }
            if ring.iter().any(|p| !p.lon.is_finite() || !p.lat.is_finite()) {
                return Err(DomainError::invalid(format!(
                    "ring {} contains a non-finite coordinate",
                    index
                )));
            }
            if ring.first() != ring.last() {
                return Err(DomainError::invalid(format!("ring {} is not closed", index)));
            }
        }
        Ok(())
    }
}

/// An ordered polyline, start to end inclusive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinePath {
    pub points: Vec<Point>,
}

impl LinePath {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub polygon: Polygon,
    pub properties: Option<JsonObject>,
}

/// Immutable snapshot of the obstacles handed to one routing request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObstacleSet {
    pub obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon>) -> Self {
        Self {
            obstacles: polygons
                .into_iter()
                .map(|polygon| Obstacle {
                    polygon,
                    properties: None,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.obstacles.iter().map(|o| &o.polygon)
    }
}

/// Bounding box in whatever projection the coordinates came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn of_position(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}
