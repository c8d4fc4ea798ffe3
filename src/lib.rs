#![deny(missing_docs)]
//! Cosmo bot extension.
//!
//! A greetings command for the Telegram bot and a layer of cached fetchers
//! for the third-party APIs other commands rely on.

/// Telegram command handlers.
pub mod bot;
/// Configuration management.
pub mod config;
/// Cached wrappers around upstream HTTP APIs.
pub mod fetchers;
/// Telegram runtime entrypoint.
pub mod runner;
