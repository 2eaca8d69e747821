use serde_json::json;
use waypoint_router::domains::geometry::{ObstacleSet, Point, Polygon};
use waypoint_router::domains::path_planning::{
    handle_line, GridPathEngine, PathOutcome, PathRequest, RoutingParams, WorkerData, WorkerErrorKind,
    WorkerReply,
};

fn message(end: [f64; 2], extra: serde_json::Value) -> String {
    let mut value = json!({
        "start": { "type": "Point", "coordinates": [0.0, 0.0] },
        "end": { "type": "Point", "coordinates": end },
        "obstacles": {
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.04, -0.01], [0.06, -0.01], [0.06, 0.01], [0.04, 0.01], [0.04, -0.01]]]
                }
            }]
        }
    });
    if let (Some(target), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    value.to_string()
}

#[test]
fn optional_fields_fall_back_to_defaults() {
    let data: WorkerData = serde_json::from_str(&message([0.1, 0.0], json!({ "bufferValue": 50.0 }))).unwrap();
    let request = data.into_request(4).unwrap();
    assert_eq!(request.id, 4);
    assert_eq!(request.params, RoutingParams { resolution: 1000.0, buffer: 50.0 });
    assert_eq!(request.obstacles.len(), 1);
    assert!(request.via.is_empty());
}

#[test]
fn worker_answers_with_a_line_feature() {
    let engine = GridPathEngine::default();
    let reply = handle_line(&engine, &message([0.1, 0.0], json!({ "resolution": 200.0 })));

    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["path"]["type"], "Feature");
    assert_eq!(value["path"]["geometry"]["type"], "LineString");

    let reply: WorkerReply = serde_json::from_str(&reply).unwrap();
    match reply.into_result(9).outcome {
        PathOutcome::Found(path) => {
            assert!(path.len() > 2);
            assert_eq!(path.first(), Some(&Point { lon: 0.0, lat: 0.0 }));
            assert_eq!(path.last(), Some(&Point { lon: 0.1, lat: 0.0 }));
        }
        other => panic!("expected a path, got {:?}", other),
    }
}

#[test]
fn unreachable_end_is_reported_with_its_kind() {
    let engine = GridPathEngine::default();
    let reply: WorkerReply =
        serde_json::from_str(&handle_line(&engine, &message([0.05, 0.0], json!({ "resolution": 200.0 }))))
            .unwrap();
    match &reply {
        WorkerReply::Error(error) => assert_eq!(error.kind, WorkerErrorKind::NoPathFound),
        other => panic!("expected an error, got {:?}", other),
    }
    assert_eq!(reply.into_result(2).outcome, PathOutcome::NotFound);
}

#[test]
fn bad_resolution_and_garbage_are_invalid_parameters() {
    let engine = GridPathEngine::default();

    let reply = handle_line(&engine, &message([0.1, 0.0], json!({ "resolution": 0.0 })));
    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["kind"], "invalidParameter");
    assert!(value["error"].as_str().unwrap().contains("resolution"));

    let reply = handle_line(&engine, "{ \"start\": 1 }");
    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["kind"], "invalidParameter");
    assert!(value["error"].as_str().unwrap().starts_with("malformed worker message"));
}

#[test]
fn non_point_endpoints_are_rejected() {
    let raw = message([0.1, 0.0], json!({
        "start": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }
    }));
    let data: WorkerData = serde_json::from_str(&raw).unwrap();
    assert!(data.into_request(1).is_err());
}

#[test]
fn outgoing_messages_use_camel_case_and_skip_empty_via() {
    let request = PathRequest::new(
        1,
        Point { lon: 1.0, lat: 2.0 },
        Point { lon: 3.0, lat: 4.0 },
        ObstacleSet::from_polygons(vec![Polygon::rectangle(
            Point { lon: 1.5, lat: 2.5 },
            Point { lon: 2.0, lat: 3.0 },
        )]),
        RoutingParams { resolution: 250.0, buffer: 10.0 },
    );
    let value = serde_json::to_value(WorkerData::from_request(&request)).unwrap();
    assert_eq!(value["bufferValue"], 10.0);
    assert_eq!(value["resolution"], 250.0);
    assert!(value.get("via").is_none());
    assert_eq!(value["obstacles"]["features"].as_array().unwrap().len(), 1);

    let with_via = request.with_via(vec![Point { lon: 2.5, lat: 3.5 }]);
    let value = serde_json::to_value(WorkerData::from_request(&with_via)).unwrap();
    assert_eq!(value["via"].as_array().unwrap().len(), 1);
}
