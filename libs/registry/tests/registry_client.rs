//! HTTP tests for the registry client against a mock registry.

use std::sync::Arc;
use std::time::Duration;

use hubsize_registry::{
    CrawlConfig, FetchError, PageFetcher, PageSource, PaginationDriver, RegistryClient,
    RegistryConfig, RetryPolicy, StopReason,
};
use hubsize_testing::{layered_tag_json, page_json, tag_json, RecordingSleeper, GB};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TAGS_PATH: &str = "/michadockermisha/backup/tags";

fn client(server: &MockServer) -> RegistryClient {
    RegistryClient::new(&RegistryConfig {
        registry_url: server.uri(),
        repository: "michadockermisha/backup".to_string(),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn page_request(page: u32) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path(TAGS_PATH))
        .and(query_param("page", page.to_string()))
        .and(query_param("page_size", "100"))
}

#[tokio::test]
async fn test_get_page_parses_listing() {
    let server = MockServer::start().await;
    page_request(1)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![tag_json("halo", 3_221_225_472), layered_tag_json("doom", &[GB, GB])],
            true,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server).get_page(1, 100).await.unwrap();

    assert_eq!(body.results.len(), 2);
    assert!(body.has_next());
    assert_eq!(body.results[1].effective_size(), 2 * GB);
}

#[tokio::test]
async fn test_get_page_reports_status() {
    let server = MockServer::start().await;
    page_request(1)
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).get_page(1, 100).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503 }));
}

#[tokio::test]
async fn test_get_page_reports_malformed_body() {
    let server = MockServer::start().await;
    page_request(1)
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let err = client(&server).get_page(1, 100).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
}

#[tokio::test]
async fn test_fetcher_recovers_from_server_errors() {
    let server = MockServer::start().await;
    page_request(1)
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    page_request(1)
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_json(vec![tag_json("a", GB)], false)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::new());
    let fetcher = PageFetcher::new(client(&server), RetryPolicy::default(), sleeper.clone());

    let body = fetcher.fetch(1, 100).await.unwrap();

    assert_eq!(body.results.len(), 1);
    assert_eq!(
        sleeper.slept(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
}

#[tokio::test]
async fn test_crawl_over_http() {
    let server = MockServer::start().await;
    page_request(1)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![tag_json("a", GB), tag_json("b", 0)],
            true,
        )))
        .expect(1)
        .mount(&server)
        .await;
    page_request(2)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![layered_tag_json("c", &[GB / 2, GB / 2])],
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;
    page_request(3)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], false)))
        .expect(0)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::new());
    let fetcher = PageFetcher::new(client(&server), RetryPolicy::default(), sleeper);
    let driver = PaginationDriver::new(fetcher, CrawlConfig::default());

    let outcome = driver.crawl().await;

    assert!(matches!(outcome.stop, StopReason::NoNext { page: 2 }));
    assert_eq!(outcome.sizes.get("a"), Some(&1.0));
    assert_eq!(outcome.sizes.get("c"), Some(&1.0));
    assert!(!outcome.sizes.contains_key("b"));
}

#[tokio::test]
async fn test_crawl_stops_on_persistent_failure() {
    let server = MockServer::start().await;
    page_request(1)
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_json(vec![tag_json("a", GB)], true)),
        )
        .mount(&server)
        .await;
    page_request(2)
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::new());
    let fetcher = PageFetcher::new(client(&server), RetryPolicy::default(), sleeper);
    let driver = PaginationDriver::new(fetcher, CrawlConfig::default());

    let outcome = driver.crawl().await;

    assert!(outcome.stop.is_failure());
    assert_eq!(outcome.sizes.len(), 1);
}
