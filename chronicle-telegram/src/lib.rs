//! # chronicle-telegram
//!
//! Telegram layer: adapters, [`chronicle_core::Bot`] implementation, dispatcher runner.
//! Handles only Telegram connectivity and handler-chain execution; archiving and scheduling live
//! in chronicle-pipeline.

mod adapters;
mod bot_adapter;
mod runner;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::{build_teloxide_bot, TelegramBotAdapter};
pub use runner::run_dispatcher;
