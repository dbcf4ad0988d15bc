use crate::helpers::{observation_body, test_env, test_logger, two_stations};
use cwa_crawler::{run, CrawlError, Database, FetchError};
use cwa_weather_core::path_exists;
use serde_json::json;
use std::time::Duration;
use time::macros::datetime;
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn crawl_stores_valid_readings_and_registers_every_station() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .expect(1)
        .mount(&server)
        .await;
    let env = test_env(&server, two_stations());

    let summary = run(&env.cli, &test_logger()).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, 0);
    assert!(summary.is_success());

    let db = Database::connect(&env.data_dir(), test_logger())
        .await
        .unwrap();
    assert_eq!(db.station_count().await.unwrap(), 2);
    assert_eq!(db.observation_count().await.unwrap(), 1);
    let taipei = db.get_observation("466920").await.unwrap().unwrap();
    assert_eq!(taipei.temperature, 28.4);
    assert_eq!(taipei.pressure, Some(1008.2));
    assert_eq!(taipei.observed_at, datetime!(2024-05-01 12:30:00));
    // name missing from both the record and the list
    let unnamed = db.get_station("C0A520").await.unwrap().unwrap();
    assert_eq!(unnamed.name.as_deref(), Some("Unknown"));
}

#[tokio::test]
async fn second_crawl_overwrites_latest_observation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": {"Station": [{
                "StationId": "466920",
                "ObsTime": {"DateTime": "2024-05-01T13:30:00+08:00"},
                "WeatherElement": {"AirTemperature": "27.9", "AirPressure": "1008.9"}
            }]}
        })))
        .mount(&server)
        .await;
    let env = test_env(&server, two_stations());

    run(&env.cli, &test_logger()).await.unwrap();
    run(&env.cli, &test_logger()).await.unwrap();

    let db = Database::connect(&env.data_dir(), test_logger())
        .await
        .unwrap();
    assert_eq!(db.observation_count().await.unwrap(), 1);
    let taipei = db.get_observation("466920").await.unwrap().unwrap();
    assert_eq!(taipei.temperature, 27.9);
    assert_eq!(taipei.observed_at, datetime!(2024-05-01 13:30:00));
    let station = db.get_station("466920").await.unwrap().unwrap();
    assert_eq!(station.name.as_deref(), Some("Taipei"));
}

#[tokio::test]
async fn timeout_fails_the_run_before_the_database_is_opened() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(observation_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let env = test_env(&server, two_stations());

    let result = run(&env.cli, &test_logger()).await;

    assert!(matches!(
        result,
        Err(CrawlError::Fetch(FetchError::Timeout(_)))
    ));
    assert!(!path_exists(&env.database_file()));
}

#[tokio::test]
async fn missing_api_key_is_a_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .expect(0)
        .mount(&server)
        .await;
    let mut env = test_env(&server, two_stations());
    env.cli.api_key = None;

    let result = run(&env.cli, &test_logger()).await;

    assert!(matches!(result, Err(CrawlError::Config(_))));
}

#[tokio::test]
async fn empty_station_list_aborts_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .expect(0)
        .mount(&server)
        .await;
    let env = test_env(&server, json!([]));

    let result = run(&env.cli, &test_logger()).await;

    assert!(matches!(result, Err(CrawlError::NoStations(_))));
    assert!(!path_exists(&env.database_file()));
}

#[tokio::test]
async fn response_without_usable_records_is_not_a_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": {"Station": [{"StationName": "nameless"}]}
        })))
        .mount(&server)
        .await;
    let env = test_env(&server, two_stations());

    let summary = run(&env.cli, &test_logger()).await.unwrap();

    assert_eq!(summary.unidentified, 1);
    assert!(!summary.is_success());
}
