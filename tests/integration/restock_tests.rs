use restock_watcher::models::{ProductRecord, StockStatus};
use restock_watcher::plugins::fetchers::{GraphqlFetcher, PageFetcher};
use restock_watcher::plugins::notifiers::{ConsoleNotifier, DiscordNotifier, DiscordTarget};
use restock_watcher::tracker::ProductTracker;
use restock_watcher::config::DEFAULT_BUTTON_SELECTOR;
use restock_watcher::FetchError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

struct Harness {
    shop: MockServer,
    discord: MockServer,
    fetcher: GraphqlFetcher,
    notifier: DiscordNotifier,
}

impl Harness {
    async fn start() -> Self {
        let shop = MockServer::start().await;
        let discord = MockServer::start().await;
        let endpoint = format!("{}/api/graphql/StockAvailability", shop.uri());
        let fetcher = GraphqlFetcher::new(endpoint, "GB");
        let notifier = DiscordNotifier::new(
            DiscordTarget::Bot {
                token: BOT_TOKEN.to_string(),
                channel_id: CHANNEL_ID.to_string(),
            },
            discord.uri(),
        )
        .unwrap();
        Self { shop, discord, fetcher, notifier }
    }

    /// Replace all stock answers for the next tick.
    async fn stock(&self, answers: &[(&str, Option<bool>)]) {
        self.shop.reset().await;
        for (sku, available) in answers {
            let response = match available {
                Some(available) => {
                    ResponseTemplate::new(200).set_body_json(availability_body(*available))
                }
                None => ResponseTemplate::new(500),
            };
            Mock::given(method("POST"))
                .and(body_partial_json(json!({ "variables": { "sku": sku } })))
                .respond_with(response)
                .mount(&self.shop)
                .await;
        }
    }

    async fn accept_messages(&self) {
        self.discord.reset().await;
        Mock::given(method("POST"))
            .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
            .mount(&self.discord)
            .await;
    }

    async fn messages(&self) -> Vec<String> {
        self.discord
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                body["content"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }

    async fn tick(&self, tracker: &mut ProductTracker) -> restock_watcher::TickReport {
        tracker.run_tick(&test_client(5), &self.fetcher, &self.notifier).await
    }
}

fn lego_tracker(products: &[(&str, &str)]) -> ProductTracker {
    ProductTracker::new(
        products.iter().map(|(name, sku)| lego_product(name, sku)).collect(),
        "LEGO ALERT!",
    )
}

#[tokio::test]
async fn test_restock_alert_fires_once() {
    let harness = Harness::start().await;
    let mut tracker = lego_tracker(&[("Tom & Jerry Figures", "40793")]);
    harness.accept_messages().await;

    // Baseline while out of stock
    harness.stock(&[("40793", Some(false))]).await;
    let report = harness.tick(&mut tracker).await;
    assert!(report.is_complete());
    assert_eq!(tracker.get("Tom & Jerry Figures").unwrap().last_status, StockStatus::Unavailable);
    assert!(harness.messages().await.is_empty());

    // Back in stock
    harness.stock(&[("40793", Some(true))]).await;
    harness.tick(&mut tracker).await;
    let messages = harness.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("https://www.lego.com/en-gb/product/40793"));
    assert_eq!(tracker.get("Tom & Jerry Figures").unwrap().last_status, StockStatus::Available);

    // Still in stock: nothing new
    harness.tick(&mut tracker).await;
    assert_eq!(harness.messages().await.len(), 1);
    assert_eq!(tracker.get("Tom & Jerry Figures").unwrap().last_status, StockStatus::Available);
}

#[tokio::test]
async fn test_in_stock_at_start_never_alerts() {
    let harness = Harness::start().await;
    let mut tracker = lego_tracker(&[("Lightning McQueen", "77255")]);
    harness.accept_messages().await;

    harness.stock(&[("77255", Some(true))]).await;
    harness.tick(&mut tracker).await;
    harness.tick(&mut tracker).await;

    assert!(harness.messages().await.is_empty());
}

#[tokio::test]
async fn test_sell_out_then_restock_alerts_again() {
    let harness = Harness::start().await;
    let mut tracker = lego_tracker(&[("Lightning McQueen", "77255")]);
    harness.accept_messages().await;

    for available in [true, false, true, false, true] {
        harness.stock(&[("77255", Some(available))]).await;
        harness.tick(&mut tracker).await;
    }

    // Baseline skipped, then two unavailable -> available transitions
    assert_eq!(harness.messages().await.len(), 2);
}

#[tokio::test]
async fn test_failing_product_aborts_rest_of_tick() {
    let harness = Harness::start().await;
    let mut tracker = lego_tracker(&[
        ("Tom & Jerry Figures", "40793"),
        ("Time Machine (Back to the Future)", "77256"),
        ("Lightning McQueen", "77255"),
    ]);
    harness.accept_messages().await;

    harness
        .stock(&[("40793", Some(false)), ("77256", None), ("77255", Some(false))])
        .await;
    let report = harness.tick(&mut tracker).await;

    let failure = report.failure.expect("tick should abort");
    assert_eq!(failure.product, "Time Machine (Back to the Future)");
    assert_eq!(failure.error, FetchError::BadStatus(500));
    assert_eq!(failure.skipped, 1);

    let requests = harness.shop.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(tracker.get("Tom & Jerry Figures").unwrap().last_status, StockStatus::Unavailable);
    assert_eq!(tracker.get("Lightning McQueen").unwrap().last_status, StockStatus::Unset);

    // The retained state lets the first product alert on the next tick
    harness
        .stock(&[("40793", Some(true)), ("77256", Some(false)), ("77255", Some(false))])
        .await;
    let report = harness.tick(&mut tracker).await;
    assert!(report.is_complete());
    assert_eq!(harness.messages().await.len(), 1);
}

#[tokio::test]
async fn test_discord_outage_does_not_stop_tracking() {
    let harness = Harness::start().await;
    let mut tracker = lego_tracker(&[("Lightning McQueen", "77255")]);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&harness.discord)
        .await;

    harness.stock(&[("77255", Some(false))]).await;
    harness.tick(&mut tracker).await;
    harness.stock(&[("77255", Some(true))]).await;
    let report = harness.tick(&mut tracker).await;

    assert!(report.is_complete());
    assert_eq!(report.notifications_sent(), 0);
    assert!(report.outcomes[0].notify_error.is_some());
    assert_eq!(tracker.get("Lightning McQueen").unwrap().last_status, StockStatus::Available);
}

#[tokio::test]
async fn test_page_scraping_restock() {
    let shop = MockServer::start().await;
    let page_url = format!("{}/en-gb/product/lightning-mcqueen-77255", shop.uri());
    let mut tracker = ProductTracker::new(
        vec![ProductRecord::new("Lightning McQueen", page_url.clone(), page_url)],
        "LEGO ALERT!",
    );
    let fetcher = PageFetcher::new(DEFAULT_BUTTON_SELECTOR).unwrap();
    let notifier = ConsoleNotifier::new();

    let pages = [
        product_page(r#"<button data-test="add-to-bag" disabled>Add to Bag</button>"#),
        product_page("<p>Sold out</p>"),
        product_page(r#"<button data-test="add-to-bag">Add to Bag</button>"#),
    ];
    let mut reports = Vec::new();
    for page in pages {
        shop.reset().await;
        Mock::given(method("GET"))
            .and(path("/en-gb/product/lightning-mcqueen-77255"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&shop)
            .await;
        reports.push(tracker.run_tick(&test_client(5), &fetcher, &notifier).await);
    }

    assert_eq!(reports[0].outcomes[0].observed, StockStatus::Unavailable);
    assert_eq!(reports[1].outcomes[0].observed, StockStatus::Unavailable);
    assert_eq!(reports[2].outcomes[0].observed, StockStatus::Available);
    assert_eq!(reports[2].notifications_sent(), 1);
}
