use crate::helpers::{fetch_settings, observation_body, test_logger, API_KEY, DATASET};
use cwa_crawler::{CrawlError, FetchError, JsonFetcher, WEATHER_ELEMENTS};
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

#[tokio::test]
async fn sends_key_station_filter_and_elements() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}", DATASET)))
        .and(query_param("Authorization", API_KEY))
        .and(query_param("StationId", "466920,C0A520"))
        .and(query_param("WeatherElement", WEATHER_ELEMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher =
        JsonFetcher::new(test_logger(), fetch_settings(&server, Duration::from_secs(5))).unwrap();
    let raw = fetcher
        .fetch(&["466920".to_string(), "C0A520".to_string()])
        .await
        .unwrap();

    assert_eq!(raw.records().len(), 2);
}

#[tokio::test]
async fn empty_station_list_never_reaches_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher =
        JsonFetcher::new(test_logger(), fetch_settings(&server, Duration::from_secs(5))).unwrap();
    let result = fetcher.fetch(&[]).await;

    assert!(matches!(result, Err(CrawlError::NoStations(_))));
}

#[tokio::test]
async fn non_success_status_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher =
        JsonFetcher::new(test_logger(), fetch_settings(&server, Duration::from_secs(5))).unwrap();
    let result = fetcher.fetch(&["466920".to_string()]).await;

    match result {
        Err(CrawlError::Fetch(FetchError::Status { status })) => assert_eq!(status.as_u16(), 401),
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(observation_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let fetcher = JsonFetcher::new(
        test_logger(),
        fetch_settings(&server, Duration::from_millis(300)),
    )
    .unwrap();
    let result = fetcher.fetch(&["466920".to_string()]).await;

    assert!(matches!(
        result,
        Err(CrawlError::Fetch(FetchError::Timeout(_)))
    ));
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let fetcher =
        JsonFetcher::new(test_logger(), fetch_settings(&server, Duration::from_secs(5))).unwrap();
    let result = fetcher.fetch(&["466920".to_string()]).await;

    assert!(matches!(result, Err(CrawlError::Fetch(FetchError::Decode(_)))));
}
