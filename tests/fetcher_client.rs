use std::time::Duration;

use linkdigest::config::FetcherConfig;
use linkdigest::fetcher::client::DESKTOP_BROWSER_USER_AGENT;
use linkdigest::fetcher::{FetchError, FetchResult, HttpFetcher, PageResponse};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(FetcherConfig {
        backoff_base: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
        ..FetcherConfig::default()
    })
    .unwrap()
}

fn expect_page(result: FetchResult) -> PageResponse {
    match result {
        FetchResult::Success(page) => page,
        FetchResult::Failed { error, attempts } => {
            panic!("expected success, got {error} after {attempts} attempts")
        }
    }
}

fn expect_failure(result: FetchResult) -> (FetchError, u32) {
    match result {
        FetchResult::Failed { error, attempts } => (error, attempts),
        FetchResult::Success(page) => panic!("expected failure, got page {}", page.url_final),
    }
}

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(
                    "<html><head><title>Test</title></head><body>Hello World</body></html>"
                        .as_bytes(),
                )
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let page = expect_page(fetcher().fetch_with_retries(&url).await);

    assert!(page.status.is_success());
    assert!(page.body_utf8.contains("Hello World"));
    assert_eq!(page.url_final.as_str(), url);
    assert_eq!(page.encoding, "UTF-8");
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "digest-test/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<p>ok</p>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(FetcherConfig {
        user_agent: "digest-test/1.0".to_string(),
        ..FetcherConfig::default()
    })
    .unwrap();
    let result = fetcher
        .fetch_with_retries(&format!("{}/ua", mock_server.uri()))
        .await;
    assert!(result.is_success());
}

async fn mount_for_agent(server: &MockServer, route: &str, agent: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("user-agent", agent))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<p>ok</p>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_js_only_host_gets_desktop_user_agent() {
    let mock_server = MockServer::start().await;
    mount_for_agent(&mock_server, "/shell", DESKTOP_BROWSER_USER_AGENT).await;

    let fetcher = HttpFetcher::new(FetcherConfig {
        user_agent: "digest-test/1.0".to_string(),
        js_only_hosts: vec!["127.0.0.1".to_string()],
        ..FetcherConfig::default()
    })
    .unwrap();
    let result = fetcher
        .fetch_with_retries(&format!("{}/shell", mock_server.uri()))
        .await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_desktop_user_agent_does_not_leak_to_next_host() {
    let mock_server = MockServer::start().await;
    mount_for_agent(&mock_server, "/shell", DESKTOP_BROWSER_USER_AGENT).await;
    mount_for_agent(&mock_server, "/plain", "digest-test/1.0").await;

    let fetcher = HttpFetcher::new(FetcherConfig {
        user_agent: "digest-test/1.0".to_string(),
        js_only_hosts: vec!["localhost".to_string()],
        ..FetcherConfig::default()
    })
    .unwrap();
    let port = mock_server.address().port();

    let shell = fetcher
        .fetch_with_retries(&format!("http://localhost:{port}/shell"))
        .await;
    assert!(shell.is_success());

    let plain = fetcher
        .fetch_with_retries(&format!("http://127.0.0.1:{port}/plain"))
        .await;
    assert!(plain.is_success());
}

#[tokio::test]
async fn test_fetch_404_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let url = format!("{}/notfound", mock_server.uri());
    let (error, attempts) = expect_failure(fetcher().fetch_with_retries(&url).await);

    match error {
        FetchError::Http { status } => assert_eq!(status.as_u16(), 404),
        other => panic!("Expected HTTP 404 error, got {other}"),
    }
    assert_eq!(attempts, 3);
}

#[tokio::test]
async fn test_fetch_500_then_recovers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>Third time lucky</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let page = expect_page(fetcher().fetch_with_retries(&url).await);
    assert!(page.body_utf8.contains("Third time lucky"));
}

#[tokio::test]
async fn test_fetch_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redirect"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/final"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>Final page</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/redirect", mock_server.uri());
    let page = expect_page(fetcher().fetch_with_retries(&url).await);

    assert!(page.status.is_success());
    assert!(page.body_utf8.contains("Final page"));
    assert!(page.url_final.as_str().ends_with("/final"));
}

#[tokio::test]
async fn test_fetch_gzip_compression() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let html =
        "<html><head><title>Compressed</title></head><body>This content is gzipped!</body></html>";

    // Gzip the content
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(html.as_bytes()).unwrap();
    let compressed_data = encoder.finish().unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed_data)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/gzipped", mock_server.uri());
    let page = expect_page(fetcher().fetch_with_retries(&url).await);

    assert!(page.body_utf8.contains("This content is gzipped!"));
}

#[tokio::test]
async fn test_fetch_legacy_charset() {
    let mock_server = MockServer::start().await;

    // "café" in windows-1252
    let body = b"<html><body>caf\xe9</body></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("Content-Type", "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/latin", mock_server.uri());
    let page = expect_page(fetcher().fetch_with_retries(&url).await);
    assert!(page.body_utf8.contains("café"));
    assert_eq!(page.encoding, "windows-1252");
}

#[tokio::test]
async fn test_fetch_unsupported_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]) // JPEG header
                .insert_header("Content-Type", "image/jpeg"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/image", mock_server.uri());
    let (error, attempts) = expect_failure(fetcher().fetch_with_retries(&url).await);

    match error {
        FetchError::UnsupportedContentType(content_type) => {
            assert_eq!(content_type, "image/jpeg");
        }
        other => panic!("Expected UnsupportedContentType error, got {other}"),
    }
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_fetch_body_too_large() {
    let mock_server = MockServer::start().await;

    let large_body = "x".repeat(2048);

    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(large_body.as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(FetcherConfig {
        max_body_bytes: 1024,
        ..FetcherConfig::default()
    })
    .unwrap();
    let url = format!("{}/large", mock_server.uri());
    let (error, _) = expect_failure(fetcher.fetch_with_retries(&url).await);

    match error {
        FetchError::BodyTooLarge(size) => assert_eq!(size, 2048),
        other => panic!("Expected BodyTooLarge error, got {other}"),
    }
}

#[tokio::test]
async fn test_fetch_invalid_url() {
    let (error, attempts) = expect_failure(fetcher().fetch_with_retries("not-a-valid-url").await);
    assert!(matches!(error, FetchError::InvalidUrl(_)));
    assert_eq!(attempts, 0);

    let (error, _) = expect_failure(fetcher().fetch_with_retries("ftp://example.com/file").await);
    assert!(matches!(error, FetchError::UnsupportedScheme(_)));
}

#[tokio::test]
async fn test_connection_refused_is_a_value() {
    // Bind then drop so the port is closed
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (error, attempts) = expect_failure(
        fetcher()
            .fetch_with_retries(&format!("http://127.0.0.1:{port}/"))
            .await,
    );
    assert!(error.should_retry());
    assert_eq!(attempts, 3);
}

#[test]
fn test_error_retry_classification() {
    assert!(!FetchError::InvalidUrl(url::ParseError::EmptyHost).should_retry());
    assert!(!FetchError::BodyTooLarge(1000).should_retry());
    assert!(!FetchError::UnsupportedContentType("image/png".to_string()).should_retry());
    assert!(!FetchError::UnsupportedScheme("ftp".to_string()).should_retry());

    assert!(FetchError::Connect("refused".to_string()).should_retry());
    assert!(FetchError::ConnectTimeout.should_retry());
    assert!(FetchError::RequestTimeout.should_retry());
    assert!(
        FetchError::Http {
            status: reqwest::StatusCode::NOT_FOUND
        }
        .should_retry()
    );
    assert!(
        FetchError::Http {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR
        }
        .should_retry()
    );
}
