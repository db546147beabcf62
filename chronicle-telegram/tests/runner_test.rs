//! Integration tests for [`chronicle_telegram::run_dispatcher`] shutdown handling.
//!
//! The bot points at a closed local port, so no request reaches Telegram.

use std::time::Duration;

use chronicle_telegram::run_dispatcher;
use handler_chain::HandlerChain;
use tokio_util::sync::CancellationToken;

fn offline_bot() -> teloxide::Bot {
    teloxide::Bot::new("123456:offline")
        .set_api_url(reqwest::Url::parse("http://127.0.0.1:1/").unwrap())
}

/// **Test: A shutdown requested before the dispatcher starts polling still stops it.**
#[tokio::test]
async fn test_cancel_before_dispatch_returns() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        run_dispatcher(offline_bot(), HandlerChain::new(), shutdown),
    )
    .await
    .expect("dispatcher kept running after shutdown");

    assert!(result.is_ok());
}
