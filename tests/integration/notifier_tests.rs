use restock_watcher::plugins::notifiers::{DiscordNotifier, DiscordTarget};
use restock_watcher::plugins::traits::StockAlert;
use restock_watcher::plugins::NotifierPlugin;
use restock_watcher::NotifyError;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn bot_notifier(server: &MockServer) -> DiscordNotifier {
    DiscordNotifier::new(
        DiscordTarget::Bot {
            token: BOT_TOKEN.to_string(),
            channel_id: CHANNEL_ID.to_string(),
        },
        server.uri(),
    )
    .unwrap()
}

fn alert() -> StockAlert {
    StockAlert::new(
        "LEGO ALERT!",
        "Tom & Jerry Figures",
        "https://www.lego.com/en-gb/product/tom-jerry-figures-40793",
    )
}

#[tokio::test]
async fn test_bot_posts_to_channel_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(header("authorization", format!("Bot {}", BOT_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1001" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = bot_notifier(&server).notify(&alert()).await.unwrap();
    assert!(result.success);
    assert_eq!(result.message_id.as_deref(), Some("1001"));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("🚨 **LEGO ALERT!** 🚨"));
    assert!(content.contains("**Tom & Jerry Figures** is now **AVAILABLE**"));
    assert!(content.ends_with("https://www.lego.com/en-gb/product/tom-jerry-figures-40793"));
}

#[tokio::test]
async fn test_bot_rejected_token_is_bad_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "401: Unauthorized" })),
        )
        .mount(&server)
        .await;

    let err = bot_notifier(&server).notify(&alert()).await.unwrap_err();
    assert!(matches!(err, NotifyError::BadStatus(401)));
}

#[tokio::test]
async fn test_bot_connection_check_uses_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("authorization", format!("Bot {}", BOT_TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "7", "username": "restock-bot" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(bot_notifier(&server).test_connection().await.unwrap());
}

#[tokio::test]
async fn test_webhook_posts_content_and_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/123/secret"))
        .and(query_param("wait", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "2002" })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(
        DiscordTarget::Webhook {
            url: format!("{}/api/webhooks/123/secret", server.uri()),
        },
        "https://discord.com/api/v10",
    )
    .unwrap()
    .with_username(Some("Restock Bot".to_string()));

    let result = notifier.notify(&alert()).await.unwrap();
    assert_eq!(result.message_id.as_deref(), Some("2002"));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["username"], "Restock Bot");
}

#[tokio::test]
async fn test_webhook_without_message_body_still_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(
        DiscordTarget::Webhook {
            url: format!("{}/api/webhooks/123/secret", server.uri()),
        },
        server.uri(),
    )
    .unwrap();

    let result = notifier.notify(&alert()).await.unwrap();
    assert!(result.success);
    assert!(result.message_id.is_none());
}
