//! IP resolver behaviour against a mock IP-echo service

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::IpSource;
use ddns_core::Error;
use ddns_ip_http::HttpIpSource;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(url: String) -> HttpIpSource {
    HttpIpSource::new(&IpSourceConfig {
        url,
        timeout: Duration::from_secs(2),
    })
    .expect("source builds")
}

#[tokio::test]
async fn body_is_trimmed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = source_for(format!("{}/", mock_server.uri()));
    assert_eq!(source.resolve().await.unwrap(), "203.0.113.7");
}

#[tokio::test]
async fn body_is_passed_through_unvalidated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  not-an-ip  "))
        .mount(&mock_server)
        .await;

    let source = source_for(format!("{}/ip", mock_server.uri()));
    assert_eq!(source.resolve().await.unwrap(), "not-an-ip");
}

#[tokio::test]
async fn error_status_is_network_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let source = source_for(mock_server.uri());
    let err = source.resolve().await.unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    // Bind and immediately drop a listener so the port is closed
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let uri = format!("http://127.0.0.1:{}", port);

    let source = source_for(uri);
    let err = source.resolve().await.unwrap_err();

    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn slow_service_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("203.0.113.7")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let source = HttpIpSource::new(&IpSourceConfig {
        url: mock_server.uri(),
        timeout: Duration::from_millis(200),
    })
    .unwrap();

    let err = source.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}
