//! pdzs: a Telegram channel bot that edits posts in place.
//!
//! Removes banned words from channel posts, appends a footer of links and
//! re-posts forwards with a source attribution, keeping every formatting
//! entity anchored to the right text.
//!
//! [`engine`] holds the pure text transformation; [`telegram`] wires it to
//! the Bot API; [`settings`] persists per-channel configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod logging;
pub mod settings;
pub mod telegram;
