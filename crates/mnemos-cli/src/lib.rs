//! Mnemos CLI library
//!
//! Deck storage, configuration and command handlers behind the `mnemos`
//! binary. Exposed as a library so the handlers can be tested directly.

pub mod app;
pub mod config;
pub mod deck;

pub use app::{App, Preview, ReviewReceipt, Seed};
pub use config::{Config, ConfigError};
pub use deck::{Card, Deck, DeckError};
