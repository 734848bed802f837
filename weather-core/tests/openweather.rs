//! HTTP-level tests for `OpenWeatherClient` against a mock server.

use std::time::Duration;

use weather_core::{OpenWeatherClient, QueryError, WeatherService};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new(
        format!("{}/data/2.5/weather", server.uri()),
        "TEST_KEY".to_string(),
        Duration::from_secs(2),
    )
    .expect("client builds")
}

fn paris_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Paris",
        "sys": { "country": "FR" },
        "visibility": 10000,
        "main": { "temp": 300.0, "humidity": 55 },
        "weather": [{ "description": "few clouds" }],
        "wind": { "speed": 4.1 },
        "dt": 1_700_000_000
    })
}

#[tokio::test]
async fn sends_location_and_key_and_normalizes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Paris"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).fetch_current("Paris").await.unwrap();

    assert_eq!(result.normalized.visibility_km, "10.00");
    assert_eq!(result.normalized.temp_c, "26.85");
    assert_eq!(result.temp_k, 300.0);
    assert_eq!(result.display_name(), "Paris, FR");
    assert_eq!(result.description(), Some("few clouds"));
}

#[tokio::test]
async fn location_with_spaces_is_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("q", "New York"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_body()))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).fetch_current(" New York ").await.is_ok());
}

#[tokio::test]
async fn not_found_is_its_own_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).fetch_current("Atlantis").await.unwrap_err();
    assert_eq!(err, QueryError::NotFound { location: "Atlantis".into() });
}

#[tokio::test]
async fn server_error_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_current("Paris").await.unwrap_err();
    match err {
        QueryError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_key_is_a_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_current("Paris").await.unwrap_err();
    assert!(matches!(err, QueryError::Status { status: 401, .. }));
    assert!(err.user_message().contains("API key"));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_current("Paris").await.unwrap_err();
    assert!(matches!(err, QueryError::Malformed(_)));
}

#[tokio::test]
async fn missing_fields_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Paris" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).fetch_current("Paris").await.unwrap_err();
    assert!(matches!(err, QueryError::Malformed(_)));
}

#[tokio::test]
async fn empty_location_never_hits_the_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paris_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server).fetch_current("   ").await.unwrap_err();
    assert_eq!(err, QueryError::EmptyLocation);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(paris_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(
        format!("{}/data/2.5/weather", server.uri()),
        "TEST_KEY".to_string(),
        Duration::from_millis(100),
    )
    .unwrap();

    let err = client.fetch_current("Paris").await.unwrap_err();
    assert_eq!(err, QueryError::Timeout);
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let client = OpenWeatherClient::new(
        "http://127.0.0.1:9/weather".to_string(),
        "TEST_KEY".to_string(),
        Duration::from_secs(2),
    )
    .unwrap();

    let err = client.fetch_current("Paris").await.unwrap_err();
    assert!(matches!(err, QueryError::Network(_)), "got {err:?}");
}
