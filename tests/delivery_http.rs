// tests/delivery_http.rs
// Telegram delivery and link checks against a local HTTP stub.
mod common;

use common::{local_client, HttpStub};
use offer_curator::notify::{MessageDelivery, TelegramDelivery};
use offer_curator::sources::link::HttpLinkChecker;
use offer_curator::sources::LinkChecker;

const OK: &str = r#"{"ok":true,"result":{"message_id":1}}"#;

fn telegram(stub: &HttpStub) -> TelegramDelivery {
    TelegramDelivery::new(local_client(), "TOKEN".into(), "@canal".into())
        .with_api_base(stub.base.clone())
        .with_timeout(5)
}

#[tokio::test]
async fn short_caption_with_image_goes_as_photo() {
    let stub = HttpStub::start(|_, _| (200, OK.to_string())).await;

    let sent = telegram(&stub)
        .deliver("<b>Oferta</b>", Some("https://cf.shopee.com.br/file/a"))
        .await;

    assert!(sent);
    let reqs = stub.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].method, "POST");
    assert_eq!(reqs[0].path, "/botTOKEN/sendPhoto");
    assert!(reqs[0].body.contains(r#""photo":"https://cf.shopee.com.br/file/a""#));
    assert!(reqs[0].body.contains(r#""parse_mode":"HTML""#));
}

#[tokio::test]
async fn caption_over_limit_falls_back_to_text_message() {
    let stub = HttpStub::start(|_, _| (200, OK.to_string())).await;
    let long = "x".repeat(1025);

    assert!(telegram(&stub).deliver(&long, Some("https://cf.shopee.com.br/file/a")).await);
    assert_eq!(stub.requests()[0].path, "/botTOKEN/sendMessage");

    // exactly at the limit still fits a caption
    let at_limit = "é".repeat(1024);
    assert!(telegram(&stub).deliver(&at_limit, Some("https://cf.shopee.com.br/file/a")).await);
    assert_eq!(stub.requests()[1].path, "/botTOKEN/sendPhoto");
}

#[tokio::test]
async fn no_image_sends_text() {
    let stub = HttpStub::start(|_, _| (200, OK.to_string())).await;
    assert!(telegram(&stub).deliver("oi", None).await);
    assert_eq!(stub.requests()[0].path, "/botTOKEN/sendMessage");
}

#[tokio::test]
async fn api_refusal_is_a_failed_delivery() {
    let stub = HttpStub::start(|_, _| {
        (
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#.to_string(),
        )
    })
    .await;
    assert!(!telegram(&stub).deliver("oi", None).await);
}

#[tokio::test]
async fn unreachable_api_is_a_failed_delivery() {
    let tg = TelegramDelivery::new(local_client(), "T".into(), "1".into())
        .with_api_base("http://127.0.0.1:1")
        .with_timeout(2);
    assert!(!tg.deliver("oi", None).await);
}

#[tokio::test]
async fn link_check_retries_with_get_on_405() {
    let stub = HttpStub::start(|method, _| match method {
        "HEAD" => (405, String::new()),
        _ => (200, "ok".to_string()),
    })
    .await;
    let checker = HttpLinkChecker::new(local_client()).with_timeout(5);

    assert!(checker.is_live(&format!("{}/offer/1", stub.base)).await);
    let methods: Vec<_> = stub.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec!["HEAD", "GET"]);
}

#[tokio::test]
async fn link_check_status_classes() {
    let stub = HttpStub::start(|_, path| match path {
        "/moved" => (302, String::new()),
        "/gone" => (404, String::new()),
        _ => (200, String::new()),
    })
    .await;
    let checker = HttpLinkChecker::new(local_client()).with_timeout(5);

    assert!(checker.is_live(&format!("{}/fine", stub.base)).await);
    assert!(!checker.is_live(&format!("{}/gone", stub.base)).await);
    assert!(!checker.is_live("ftp://example.com/x").await);
    // only the HEAD is sent when it is not refused
    assert!(stub.requests().iter().all(|r| r.method == "HEAD"));
}
