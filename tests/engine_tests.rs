use geo::{Contains, Intersects, Line};
use waypoint_router::domains::geometry::{LinePath, ObstacleSet, Point, Polygon};
use waypoint_router::domains::path_planning::{
    CancelToken, EngineError, GridPathEngine, PathEngine, PathRequest, RoutingParams,
};

fn pt(lon: f64, lat: f64) -> Point {
    Point { lon, lat }
}

/// Square of roughly 2.2 km sitting on the equator between lon 0.04 and 0.06.
fn blocking_square() -> Polygon {
    Polygon::rectangle(pt(0.04, -0.01), pt(0.06, 0.01))
}

fn request(start: Point, end: Point, obstacles: Vec<Polygon>, resolution: f64, buffer: f64) -> PathRequest {
    PathRequest::new(
        1,
        start,
        end,
        ObstacleSet::from_polygons(obstacles),
        RoutingParams { resolution, buffer },
    )
}

fn crosses(path: &LinePath, polygon: &Polygon) -> bool {
    let shape = geo::Polygon::new(
        geo::LineString::from(
            polygon
                .exterior
                .iter()
                .map(|p| (p.lon, p.lat))
                .collect::<Vec<_>>(),
        ),
        Vec::new(),
    );
    path.segments().any(|(a, b)| {
        shape.intersects(&Line::new(
            geo::Coord { x: a.lon, y: a.lat },
            geo::Coord { x: b.lon, y: b.lat },
        ))
    })
}

#[test]
fn clear_route_is_the_direct_line() {
    let engine = GridPathEngine::default();
    let request = request(pt(0.0, 0.0), pt(1.0, 1.0), Vec::new(), 1000.0, 0.0);
    let path = engine.compute(&request, &CancelToken::new()).unwrap();
    assert_eq!(path.points, vec![pt(0.0, 0.0), pt(1.0, 1.0)]);
}

#[test]
fn route_detours_around_a_blocking_square() {
    let engine = GridPathEngine::default();
    let square = blocking_square();
    let request = request(pt(0.0, 0.0), pt(0.1, 0.0), vec![square.clone()], 200.0, 0.0);

    let path = engine.compute(&request, &CancelToken::new()).unwrap();
    assert!(path.len() > 2, "expected a detour, got {:?}", path.points);
    assert_eq!(path.first(), Some(&pt(0.0, 0.0)));
    assert_eq!(path.last(), Some(&pt(0.1, 0.0)));
    assert!(!crosses(&path, &square), "path cuts through the obstacle: {:?}", path.points);
}

#[test]
fn identical_requests_give_identical_paths() {
    let engine = GridPathEngine::default();
    let request = request(pt(0.0, 0.0), pt(0.1, 0.0), vec![blocking_square()], 200.0, 0.0);
    let first = engine.compute(&request, &CancelToken::new()).unwrap();
    for _ in 0..3 {
        assert_eq!(engine.compute(&request, &CancelToken::new()).unwrap(), first);
    }
}

#[test]
fn end_inside_an_obstacle_is_unreachable() {
    let engine = GridPathEngine::default();
    let request = request(pt(0.0, 0.0), pt(0.05, 0.0), vec![blocking_square()], 200.0, 0.0);
    assert_eq!(
        engine.compute(&request, &CancelToken::new()),
        Err(EngineError::NoPathFound)
    );
}

#[test]
fn enclosed_end_without_a_gap_is_unreachable() {
    // A ring-shaped wall around the end point, the hole is the end's pocket.
    let wall = Polygon::new(
        Polygon::rectangle(pt(0.08, -0.02), pt(0.12, 0.02)).exterior,
        vec![Polygon::rectangle(pt(0.095, -0.005), pt(0.105, 0.005)).exterior],
    );
    let engine = GridPathEngine::default();
    let request = request(pt(0.0, 0.0), pt(0.1, 0.0), vec![wall], 200.0, 0.0);
    assert_eq!(
        engine.compute(&request, &CancelToken::new()),
        Err(EngineError::NoPathFound)
    );
}

#[test]
fn non_positive_resolution_is_rejected() {
    let engine = GridPathEngine::default();
    for resolution in [0.0, -5.0, f64::NAN] {
        let request = request(pt(0.0, 0.0), pt(1.0, 1.0), Vec::new(), resolution, 0.0);
        match engine.compute(&request, &CancelToken::new()) {
            Err(EngineError::InvalidParameter(reason)) => assert!(reason.contains("resolution")),
            other => panic!("expected InvalidParameter for {}, got {:?}", resolution, other),
        }
    }
}

#[test]
fn negative_buffer_is_rejected() {
    let engine = GridPathEngine::default();
    let request = request(pt(0.0, 0.0), pt(1.0, 1.0), Vec::new(), 1000.0, -1.0);
    assert!(matches!(
        engine.compute(&request, &CancelToken::new()),
        Err(EngineError::InvalidParameter(_))
    ));
}

#[test]
fn malformed_obstacle_ring_is_rejected() {
    let open_ring = Polygon::new(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(0.0, 1.0)], Vec::new());
    let engine = GridPathEngine::default();
    let request = request(pt(-1.0, -1.0), pt(2.0, 2.0), vec![open_ring], 1000.0, 0.0);
    match engine.compute(&request, &CancelToken::new()) {
        Err(EngineError::InvalidParameter(reason)) => assert!(reason.starts_with("obstacle 0")),
        other => panic!("expected InvalidParameter, got {:?}", other),
    }
}

#[test]
fn grid_beyond_the_cell_limit_is_rejected() {
    let engine = GridPathEngine::new(1_000, 0.15);
    let request = request(pt(0.0, 0.0), pt(0.1, 0.0), vec![blocking_square()], 10.0, 0.0);
    match engine.compute(&request, &CancelToken::new()) {
        Err(EngineError::InvalidParameter(reason)) => assert!(reason.contains("grid cells")),
        other => panic!("expected InvalidParameter, got {:?}", other),
    }
}

#[test]
fn buffer_keeps_the_route_away_from_the_boundary() {
    let engine = GridPathEngine::default();
    let square = blocking_square();
    let obstacles = ObstacleSet::from_polygons(vec![square.clone()]);

    let stops = [pt(0.0, 0.0), pt(0.1, 0.0)];
    let grown = engine.preprocess(&obstacles, 500.0, &stops).unwrap();
    assert_eq!(grown.len(), 1);
    let max_lat = grown[0].exterior.iter().map(|p| p.lat).fold(f64::MIN, f64::max);
    // 500 m is about 0.0045 degrees of latitude.
    assert!(max_lat > 0.0140 && max_lat < 0.0150, "max_lat = {}", max_lat);

    let request = request(stops[0], stops[1], vec![square], 200.0, 500.0);
    let path = engine.compute(&request, &CancelToken::new()).unwrap();
    assert!(!crosses(&path, &grown[0]), "path enters the buffer: {:?}", path.points);

    // The display outline is drawn in the same frame as the route's stops.
    let far_north = engine
        .preprocess(&obstacles, 500.0, &[pt(0.0, 0.0), pt(0.1, 20.0)])
        .unwrap();
    assert_ne!(far_north, grown);
}

#[test]
fn zero_buffer_preprocessing_returns_obstacles_unchanged() {
    let engine = GridPathEngine::default();
    let obstacles = ObstacleSet::from_polygons(vec![blocking_square()]);
    assert_eq!(engine.preprocess(&obstacles, 0.0, &[]).unwrap(), vec![blocking_square()]);
    assert!(engine.preprocess(&obstacles, -3.0, &[]).is_err());
}

#[test]
fn via_points_are_visited_in_order() {
    let engine = GridPathEngine::default();
    let request = request(pt(0.0, 0.0), pt(0.1, 0.0), Vec::new(), 1000.0, 0.0)
        .with_via(vec![pt(0.05, 0.05)]);
    let path = engine.compute(&request, &CancelToken::new()).unwrap();
    assert_eq!(path.points, vec![pt(0.0, 0.0), pt(0.05, 0.05), pt(0.1, 0.0)]);
}

#[test]
fn via_leg_failure_fails_the_route() {
    let engine = GridPathEngine::default();
    let request = request(pt(0.0, 0.0), pt(0.1, 0.0), vec![blocking_square()], 200.0, 0.0)
        .with_via(vec![pt(0.05, 0.0)]);
    assert_eq!(
        engine.compute(&request, &CancelToken::new()),
        Err(EngineError::NoPathFound)
    );
}

#[test]
fn cancelled_token_stops_the_computation() {
    let engine = GridPathEngine::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let request = request(pt(0.0, 0.0), pt(0.1, 0.0), vec![blocking_square()], 200.0, 0.0);
    assert_eq!(engine.compute(&request, &cancel), Err(EngineError::Cancelled));
}

#[test]
fn concurrent_computations_do_not_interfere() {
    let engine = std::sync::Arc::new(GridPathEngine::default());
    let detour = request(pt(0.0, 0.0), pt(0.1, 0.0), vec![blocking_square()], 200.0, 0.0);
    let expected = engine.compute(&detour, &CancelToken::new()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = engine.clone();
            let detour = detour.clone();
            std::thread::spawn(move || {
                if i % 2 == 0 {
                    engine.compute(&detour, &CancelToken::new())
                } else {
                    let direct = request(pt(0.0, 0.0), pt(1.0, 1.0), Vec::new(), 1000.0, 0.0);
                    engine.compute(&direct, &CancelToken::new())
                }
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let path = handle.join().unwrap().unwrap();
        if i % 2 == 0 {
            assert_eq!(path, expected);
        } else {
            assert_eq!(path.len(), 2);
        }
    }
}

fn clockwise(polygon: Polygon) -> Polygon {
    let mut exterior = polygon.exterior;
    exterior.reverse();
    Polygon::new(exterior, Vec::new())
}

#[test]
fn clockwise_obstacle_is_still_buffered_and_avoided() {
    let engine = GridPathEngine::default();
    let square = clockwise(blocking_square());
    let stops = [pt(0.0, 0.0), pt(0.1, 0.0)];

    let grown = engine
        .preprocess(&ObstacleSet::from_polygons(vec![square.clone()]), 100.0, &stops)
        .unwrap();
    assert_eq!(grown.len(), 1);
    let max_lat = grown[0].exterior.iter().map(|p| p.lat).fold(f64::MIN, f64::max);
    assert!(max_lat > 0.01, "max_lat = {}", max_lat);

    let request = request(stops[0], stops[1], vec![square.clone()], 200.0, 100.0);
    let path = engine.compute(&request, &CancelToken::new()).unwrap();
    assert!(path.len() > 2, "expected a detour, got {:?}", path.points);
    assert!(!crosses(&path, &square), "path cuts through the obstacle: {:?}", path.points);
    assert!(!crosses(&path, &grown[0]), "path enters the buffer: {:?}", path.points);
}

#[test]
fn start_on_an_obstacle_edge_can_leave_it() {
    let engine = GridPathEngine::default();
    let square = blocking_square();
    let on_edge = pt(0.04, 0.0);

    let away = request(on_edge, pt(0.0, 0.0), vec![square.clone()], 200.0, 0.0);
    assert_eq!(
        engine.compute(&away, &CancelToken::new()).unwrap().points,
        vec![on_edge, pt(0.0, 0.0)]
    );

    let around = request(on_edge, pt(0.1, 0.0), vec![square.clone()], 200.0, 0.0);
    let path = engine.compute(&around, &CancelToken::new()).unwrap();
    assert_eq!(path.first(), Some(&on_edge));
    assert_eq!(path.last(), Some(&pt(0.1, 0.0)));
    let shape = geo::Polygon::new(
        geo::LineString::from(square.exterior.iter().map(|p| (p.lon, p.lat)).collect::<Vec<_>>()),
        Vec::new(),
    );
    for (a, b) in path.segments() {
        let mid = geo::Coord { x: (a.lon + b.lon) / 2.0, y: (a.lat + b.lat) / 2.0 };
        assert!(!shape.contains(&mid), "segment {:?} -> {:?} runs through the obstacle", a, b);
    }
}

#[test]
fn route_across_the_antimeridian_avoids_obstacles_there() {
    let engine = GridPathEngine::default();
    let wall = Polygon::rectangle(pt(179.99, -0.01), pt(180.0, 0.01));
    let request = request(pt(179.9, 0.0), pt(-179.9, 0.0), vec![wall], 200.0, 0.0);

    let path = engine.compute(&request, &CancelToken::new()).unwrap();
    assert!(path.len() > 2, "expected a detour, got {:?}", path.points);
    assert_eq!(path.first(), Some(&pt(179.9, 0.0)));
    assert_eq!(path.last(), Some(&pt(-179.9, 0.0)));
    for p in &path.points {
        assert!(p.lon.abs() >= 179.89, "route wandered away from the antimeridian: {:?}", p);
        assert!(p.lat.abs() <= 0.05, "{:?}", p);
    }
    assert!(
        path.points.iter().any(|p| p.lat.abs() >= 0.01),
        "route did not go around the wall: {:?}",
        path.points
    );
}
