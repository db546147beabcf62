//! Dispatcher runner: converts each teloxide message to core::Message and hands it to the HandlerChain.
//! Stops when the shutdown token is cancelled.

use std::time::Duration;

use anyhow::Result;
use chronicle_core::ToCoreMessage;
use handler_chain::HandlerChain;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::requests::Requester;
use teloxide::types::Update;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;

/// How often a shutdown request is repeated while the dispatcher has not started polling yet.
const SHUTDOWN_RETRY: Duration = Duration::from_millis(100);

/// Runs the update dispatcher until `shutdown` is cancelled. Each message goes through `handler_chain`;
/// chain errors are logged and never stop the dispatcher.
#[instrument(skip(bot, handler_chain, shutdown))]
pub async fn run_dispatcher(
    bot: teloxide::Bot,
    handler_chain: HandlerChain,
    shutdown: CancellationToken,
) -> Result<()> {
    match bot.get_me().await {
        Ok(me) => info!(username = ?me.user.username, "Connected to Telegram"),
        Err(e) => warn!(error = %e, "get_me failed; continuing"),
    }

    let handler = Update::filter_message().endpoint(
        move |msg: teloxide::types::Message| {
            let chain = handler_chain.clone();
            async move {
                let core_msg = TelegramMessageWrapper(&msg).to_core();
                debug!(
                    user_id = core_msg.user.id,
                    chat_id = core_msg.chat.id,
                    message_id = core_msg.id,
                    thread_id = ?core_msg.thread_id,
                    "Received message"
                );
                if let Err(e) = chain.handle(&core_msg).await {
                    error!(error = %e, message_id = core_msg.id, "Handler chain failed");
                }
                teloxide::respond(())
            }
        },
    );

    let mut dispatcher = Dispatcher::builder(bot, handler).build();
    let shutdown_token = dispatcher.shutdown_token();

    let cancelled = shutdown.clone();
    let stopper = tokio::spawn(async move {
        cancelled.cancelled().await;
        info!("Stopping Telegram dispatcher");
        loop {
            match shutdown_token.shutdown() {
                Ok(stopped) => break stopped.await,
                // Idle: cancelled before dispatch() started; ask again once it runs.
                Err(e) => {
                    debug!(error = %e, "Dispatcher not running yet");
                    tokio::time::sleep(SHUTDOWN_RETRY).await;
                }
            }
        }
    });

    if shutdown.is_cancelled() {
        info!("Shutdown requested before dispatching");
    } else {
        dispatcher.dispatch().await;
        info!("Telegram dispatcher stopped");
    }
    stopper.abort();

    Ok(())
}
