//! Integration tests for seller lookups (API by id, detail-page scrape) using
//! wiremock HTTP mocks.

use adbot_acquire::scrape::DEFAULT_BROWSER_USER_AGENT;
use adbot_acquire::{
    AccessToken, AcquireError, ApiClient, Credentials, HttpClient, HttpSettings, Pacer,
    RetryPolicy, ScrapeClient, TokenManager, TokenSession,
};
use adbot_core::{AdRecord, AdSource, FailureKind};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/core/v1/items";

fn http() -> HttpClient {
    HttpClient::new(&HttpSettings {
        timeout_secs: 5,
        user_agent: "adbot-test".to_owned(),
        retry: RetryPolicy {
            max_retries: 1,
            backoff_base_ms: 1,
        },
    })
    .expect("client construction should not fail")
}

fn api_client(server: &MockServer) -> ApiClient {
    let tokens = TokenManager::new(
        http(),
        &format!("{}/token", server.uri()),
        Credentials::new("id", "secret", "seller:read"),
        300,
        5,
        Pacer::disabled(),
    )
    .unwrap();
    ApiClient::new(
        http(),
        tokens,
        &format!("{}{SEARCH_PATH}", server.uri()),
        &server.uri(),
        10,
        Pacer::disabled(),
    )
    .unwrap()
}

fn scrape_client(server: &MockServer) -> ScrapeClient {
    ScrapeClient::new(http(), &server.uri(), DEFAULT_BROWSER_USER_AGENT, Pacer::disabled())
        .unwrap()
}

fn valid_session() -> TokenSession {
    TokenSession::with_token(AccessToken::new("tok", Utc::now(), 86_400))
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
}

fn detail_page(seller: &str) -> String {
    format!(
        r#"<html><body><h1 data-marker="item-view/title-info">Офис</h1>
           <div data-marker="seller-info/name">{seller}</div></body></html>"#
    )
}

fn ad(server: &MockServer, slug: &str, seller: Option<&str>) -> AdRecord {
    AdRecord {
        title: slug.to_owned(),
        description: None,
        price: None,
        price_text: None,
        url: format!("{}/moskva/{slug}", server.uri()),
        source: AdSource::Scrape,
        external_id: None,
        seller: seller.map(str::to_owned),
    }
}

#[tokio::test]
async fn seller_lookup_uses_bearer_token_and_sibling_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/core/v1/sellers/98765"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 98765,
            "name": "  ООО Ромашка ",
            "is_company": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let profile = client
        .fetch_seller(&mut valid_session(), " 98765 ", &CancellationToken::new())
        .await
        .expect("lookup should succeed");

    assert_eq!(profile.id, "98765");
    assert_eq!(profile.name.as_deref(), Some("ООО Ромашка"));
    assert_eq!(profile.details.get("is_company"), Some(&serde_json::json!(true)));
}

#[tokio::test]
async fn seller_lookup_refreshes_a_missing_token_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "fresh", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core/v1/sellers/1"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let mut session = TokenSession::new();
    let profile = client
        .fetch_seller(&mut session, "1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(profile.name, None);
    assert_eq!(session.access_token(), Some("fresh"));
}

#[tokio::test]
async fn seller_lookup_honours_configured_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/accounts/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "ИП"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server)
        .with_sellers_url(&format!("{}/v2/accounts/", server.uri()))
        .unwrap();
    let profile = client
        .fetch_seller(&mut valid_session(), "7", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(profile.name.as_deref(), Some("ИП"));
}

#[tokio::test]
async fn seller_lookup_classifies_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/core/v1/sellers/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core/v1/sellers/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
        .mount(&server)
        .await;

    let client = api_client(&server);
    let cancel = CancellationToken::new();

    let err = client
        .fetch_seller(&mut valid_session(), "404", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::HttpStatus { status: 404, .. }), "{err:?}");

    let err = client
        .fetch_seller(&mut valid_session(), "list", &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedResponse, "{err:?}");

    let err = client
        .fetch_seller(&mut valid_session(), "  ", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::InvalidRequest(_)), "{err:?}");
}

#[tokio::test]
async fn seller_id_cannot_escape_the_endpoint_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/core/v1/sellers/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "x"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let profile = client
        .fetch_seller(&mut valid_session(), "a/b", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(profile.id, "a/b");
}

#[tokio::test]
async fn detail_page_yields_seller_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moskva/ofis_1"))
        .and(header("user-agent", DEFAULT_BROWSER_USER_AGENT))
        .respond_with(html(&detail_page("Агентство Квадрат")))
        .expect(1)
        .mount(&server)
        .await;

    let client = scrape_client(&server);
    let seller = client
        .fetch_seller_name("/moskva/ofis_1", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(seller.as_deref(), Some("Агентство Квадрат"));
}

#[tokio::test]
async fn enrich_fills_only_missing_sellers_and_survives_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moskva/ofis_1"))
        .respond_with(html(&detail_page("Первый")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moskva/ofis_2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moskva/ofis_3"))
        .respond_with(html(&detail_page("Третий")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moskva/ofis_4"))
        .respond_with(html("<html><body><h1>без продавца</h1></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let ads = vec![
        ad(&server, "ofis_1", None),
        ad(&server, "ofis_2", None),
        ad(&server, "ofis_3", Some("Уже известен")),
        ad(&server, "ofis_4", None),
    ];
    let enriched = scrape_client(&server)
        .enrich_sellers(ads, &CancellationToken::new())
        .await;

    let sellers: Vec<Option<&str>> = enriched.iter().map(|a| a.seller.as_deref()).collect();
    assert_eq!(sellers, vec![Some("Первый"), None, Some("Уже известен"), None]);
}

#[tokio::test]
async fn enrich_stops_when_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(&detail_page("x")))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let ads = vec![ad(&server, "ofis_1", None), ad(&server, "ofis_2", None)];
    let enriched = scrape_client(&server).enrich_sellers(ads, &cancel).await;

    assert_eq!(enriched.len(), 2);
    assert!(enriched.iter().all(|a| a.seller.is_none()));
}

#[tokio::test]
async fn foreign_listing_urls_are_not_fetched() {
    let server = MockServer::start().await;
    let client = scrape_client(&server);
    let err = client
        .fetch_seller_name("https://example.com/moskva/ofis_1", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AcquireError::InvalidRequest(_)), "{err:?}");
}
