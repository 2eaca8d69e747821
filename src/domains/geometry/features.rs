//! Conversion between the typed geometry model and GeoJSON feature collections.
//!
//! The map canvas speaks GeoJSON in its display projection while the engine and
//! the wire format use geodetic coordinates; reprojection keeps the structure of
//! every geometry intact and only touches coordinates.

use super::projection::Projection;
use super::types::{Extent, LinePath, Obstacle, ObstacleSet, Point, Polygon};
use crate::common::{DomainError, DomainResult};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

pub fn parse_feature_collection(source: &str) -> DomainResult<FeatureCollection> {
    let geojson: GeoJson = source.parse()?;
    Ok(match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(f) => collection(vec![f]),
        GeoJson::Geometry(g) => collection(vec![feature(g, None)]),
    })
}

pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn feature(geometry: Geometry, properties: Option<JsonObject>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties,
        foreign_members: None,
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn position_to_point(position: &[f64]) -> DomainResult<Point> {
    match position {
        [lon, lat, ..] => Point::new(*lon, *lat),
        _ => Err(DomainError::invalid(format!(
            "position needs two coordinates, got {}",
            position.len()
        ))),
    }
}

pub fn point_to_geometry(point: Point) -> Geometry {
    Geometry::new(Value::Point(point.to_position()))
}

pub fn point_from_geometry(geometry: &Geometry) -> DomainResult<Point> {
    match &geometry.value {
        Value::Point(position) => position_to_point(position),
        other => Err(DomainError::invalid(format!(
            "expected a Point geometry, got {}",
            value_kind(other)
        ))),
    }
}

fn ring_to_points(ring: &[Vec<f64>]) -> DomainResult<Vec<Point>> {
    ring.iter().map(|p| position_to_point(p)).collect()
}

pub fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> DomainResult<Polygon> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| DomainError::invalid("polygon has no rings"))?;
    let polygon = Polygon::new(
        ring_to_points(exterior)?,
        interiors
            .iter()
            .map(|r| ring_to_points(r))
            .collect::<DomainResult<Vec<_>>>()?,
    );
    polygon.validate()?;
    Ok(polygon)
}

pub fn polygon_to_value(polygon: &Polygon) -> Value {
    Value::Polygon(
        polygon
            .rings()
            .map(|ring| ring.iter().map(|p| p.to_position()).collect())
            .collect(),
    )
}

pub fn obstacles_from_collection(fc: &FeatureCollection) -> DomainResult<ObstacleSet> {
    let mut obstacles = Vec::new();
    for (index, f) in fc.features.iter().enumerate() {
        let Some(geometry) = &f.geometry else {
            continue;
        };
        match &geometry.value {
            Value::Polygon(rings) => obstacles.push(Obstacle {
                polygon: polygon_from_rings(rings)?,
                properties: f.properties.clone(),
            }),
            Value::MultiPolygon(parts) => {
                for rings in parts {
                    obstacles.push(Obstacle {
                        polygon: polygon_from_rings(rings)?,
                        properties: f.properties.clone(),
                    });
                }
            }
            other => {
                return Err(DomainError::invalid(format!(
                    "obstacle feature {} must be a Polygon, got {}",
                    index,
                    value_kind(other)
                )))
            }
        }
    }
    Ok(ObstacleSet::new(obstacles))
}

pub fn obstacles_to_collection(obstacles: &ObstacleSet) -> FeatureCollection {
    collection(
        obstacles
            .obstacles
            .iter()
            .map(|o| feature(Geometry::new(polygon_to_value(&o.polygon)), o.properties.clone()))
            .collect(),
    )
}

pub fn polygons_to_collection(polygons: &[Polygon]) -> FeatureCollection {
    collection(
        polygons
            .iter()
            .map(|p| feature(Geometry::new(polygon_to_value(p)), None))
            .collect(),
    )
}

pub fn line_to_feature(path: &LinePath) -> Feature {
    feature(
        Geometry::new(Value::LineString(
            path.points.iter().map(|p| p.to_position()).collect(),
        )),
        None,
    )
}

pub fn line_from_feature(f: &Feature) -> DomainResult<LinePath> {
    match f.geometry.as_ref().map(|g| &g.value) {
        Some(Value::LineString(positions)) => Ok(LinePath::new(
            positions
                .iter()
                .map(|p| position_to_point(p))
                .collect::<DomainResult<Vec<_>>>()?,
        )),
        Some(other) => Err(DomainError::invalid(format!(
            "expected a LineString feature, got {}",
            value_kind(other)
        ))),
        None => Err(DomainError::invalid("path feature has no geometry")),
    }
}

pub fn points_to_collection(points: &[Point]) -> FeatureCollection {
    collection(
        points
            .iter()
            .map(|p| feature(point_to_geometry(*p), None))
            .collect(),
    )
}

fn map_position(position: &[f64], f: &dyn Fn([f64; 2]) -> [f64; 2]) -> Vec<f64> {
    if position.len() < 2 {
        return position.to_vec();
    }
    let [x, y] = f([position[0], position[1]]);
    let mut mapped = Vec::with_capacity(position.len());
    mapped.push(x);
    mapped.push(y);
    mapped.extend_from_slice(&position[2..]);
    mapped
}

fn map_positions(positions: &[Vec<f64>], f: &dyn Fn([f64; 2]) -> [f64; 2]) -> Vec<Vec<f64>> {
    positions.iter().map(|p| map_position(p, f)).collect()
}

fn map_rings(rings: &[Vec<Vec<f64>>], f: &dyn Fn([f64; 2]) -> [f64; 2]) -> Vec<Vec<Vec<f64>>> {
    rings.iter().map(|r| map_positions(r, f)).collect()
}

fn map_value(value: &Value, f: &dyn Fn([f64; 2]) -> [f64; 2]) -> Value {
    match value {
        Value::Point(p) => Value::Point(map_position(p, f)),
        Value::MultiPoint(ps) => Value::MultiPoint(map_positions(ps, f)),
        Value::LineString(ps) => Value::LineString(map_positions(ps, f)),
        Value::MultiLineString(ls) => Value::MultiLineString(map_rings(ls, f)),
        Value::Polygon(rs) => Value::Polygon(map_rings(rs, f)),
        Value::MultiPolygon(parts) => {
            Value::MultiPolygon(parts.iter().map(|rs| map_rings(rs, f)).collect())
        }
        Value::GeometryCollection(gs) => Value::GeometryCollection(
            gs.iter().map(|g| map_geometry(g, f)).collect(),
        ),
    }
}

fn map_geometry(geometry: &Geometry, f: &dyn Fn([f64; 2]) -> [f64; 2]) -> Geometry {
    Geometry {
        bbox: None,
        value: map_value(&geometry.value, f),
        foreign_members: geometry.foreign_members.clone(),
    }
}

/// Apply `f` to every coordinate pair, keeping feature structure and properties.
pub fn reproject_collection(
    fc: &FeatureCollection,
    f: &dyn Fn([f64; 2]) -> [f64; 2],
) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: fc
            .features
            .iter()
            .map(|feat| Feature {
                bbox: None,
                geometry: feat.geometry.as_ref().map(|g| map_geometry(g, f)),
                id: feat.id.clone(),
                properties: feat.properties.clone(),
                foreign_members: feat.foreign_members.clone(),
            })
            .collect(),
        foreign_members: fc.foreign_members.clone(),
    }
}

pub fn to_display_collection(fc: &FeatureCollection, projection: &dyn Projection) -> FeatureCollection {
    reproject_collection(fc, &|p| projection.position_to_display(p))
}

pub fn to_geodetic_collection(fc: &FeatureCollection, projection: &dyn Projection) -> FeatureCollection {
    reproject_collection(fc, &|p| projection.position_to_geodetic(p))
}

fn visit_positions(value: &Value, visit: &mut dyn FnMut(&[f64])) {
    match value {
        Value::Point(p) => visit(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().for_each(|p| visit(p)),
        Value::MultiLineString(rs) | Value::Polygon(rs) => {
            rs.iter().flatten().for_each(|p| visit(p))
        }
        Value::MultiPolygon(parts) => parts.iter().flatten().flatten().for_each(|p| visit(p)),
        Value::GeometryCollection(gs) => gs.iter().for_each(|g| visit_positions(&g.value, visit)),
    }
}

/// Bounding extent of all coordinates, `None` for an empty collection.
pub fn collection_extent(fc: &FeatureCollection) -> Option<Extent> {
    let mut extent: Option<Extent> = None;
    for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
        visit_positions(&geometry.value, &mut |p| {
            if p.len() < 2 {
                return;
            }
            match extent.as_mut() {
                Some(e) => e.extend(p[0], p[1]),
                None => extent = Some(Extent::of_position(p[0], p[1])),
            }
        });
    }
    extent
}
