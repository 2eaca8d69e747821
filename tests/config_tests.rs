use std::time::Duration;
use waypoint_router::domains::logger::LogLevel;
use waypoint_router::domains::map::FailurePolicy;
use waypoint_router::{ApplicationError, Config};

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.routing.resolution, 1000.0);
    assert_eq!(config.routing.buffer, 0.0);
    assert_eq!(config.routing.compute_timeout(), Duration::from_secs(30));
    assert_eq!(config.routing.max_grid_cells, 1_000_000);
    assert_eq!(config.routing.bbox_padding, 0.15);
    assert_eq!(config.map.padding(), [10.0, 10.0, 10.0, 10.0]);
    assert_eq!(config.map.failure_policy, FailurePolicy::ClearPath);
    assert_eq!(config.logging.file.as_deref(), Some("./waypoint-router.log"));
    assert!(config.validate().is_ok());
}

#[test]
fn partial_file_keeps_defaults_for_the_rest() {
    let config = Config::from_toml_str(
        r#"
        [routing]
        resolution = 250.0

        [map]
        failure_policy = "keep_path"
        fit_padding = [20.0, 10.0, 20.0, 10.0]

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();
    assert_eq!(config.routing.resolution, 250.0);
    assert_eq!(config.routing.buffer, 0.0);
    assert_eq!(config.map.failure_policy, FailurePolicy::KeepPath);
    assert_eq!(config.map.padding(), [20.0, 10.0, 20.0, 10.0]);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.settings().params.resolution, 250.0);
}

#[test]
fn empty_file_is_the_default_config() {
    assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
}

#[test]
fn invalid_values_are_configuration_errors() {
    let cases = [
        "[routing]\nresolution = 0.0",
        "[routing]\nresolution = -3.0",
        "[routing]\nbuffer = -1.0",
        "[routing]\ncompute_timeout_secs = 0",
        "[routing]\nmax_grid_cells = 0",
        "[routing]\nbbox_padding = -0.5",
        "[map]\nfit_padding = [10.0, 10.0, 10.0]",
        "[map]\nfit_padding = [10.0, -1.0, 10.0, 10.0]",
        "[map]\ncommand_capacity = 0",
    ];
    for case in cases {
        match Config::from_toml_str(case) {
            Err(ApplicationError::Configuration(_)) => {}
            other => panic!("{:?} should be rejected, got {:?}", case, other),
        }
    }
}

#[test]
fn unknown_policy_fails_to_parse() {
    assert!(matches!(
        Config::from_toml_str("[map]\nfailure_policy = \"sometimes\""),
        Err(ApplicationError::Configuration(_))
    ));
}

#[tokio::test]
async fn loads_from_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    tokio::fs::write(&path, "[routing]\nbuffer = 25.0\ncompute_timeout_secs = 5\n")
        .await
        .unwrap();

    let config = Config::from_file(&path).await.unwrap();
    assert_eq!(config.routing.buffer, 25.0);
    assert_eq!(config.routing.compute_timeout(), Duration::from_secs(5));

    let missing = Config::from_file(dir.path().join("missing.toml")).await;
    assert!(matches!(missing, Err(ApplicationError::Configuration(_))));
}
