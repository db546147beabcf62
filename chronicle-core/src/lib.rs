//! # chronicle-core
//!
//! Core types and traits for the chat chronicle bot: [`Bot`], [`Handler`], message and user types,
//! the [`AppConfig`] file format, and tracing initialization. Transport-agnostic; used by
//! chronicle-telegram, handler-chain and chronicle-pipeline.

pub mod bot;
pub mod config;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{Bot, Destination};
pub use config::AppConfig;
pub use error::{ChronicleError, Result};
pub use logger::init_tracing;
pub use types::{
    Chat, ChatKind, Handler, HandlerResponse, Message, ToCoreMessage, ToCoreUser, User,
};
