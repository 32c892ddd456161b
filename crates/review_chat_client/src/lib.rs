//! Phone reviews chat client library (config, HTTP API, chat session state, rendering).
//! Used by the `review-chat` terminal view.

pub mod client;
pub mod clipboard;
pub mod config;
pub mod messages;
pub mod prefs;
pub mod render;
pub mod session;
pub mod theme;

pub use client::{ApiClient, ClientError};
pub use clipboard::{ClipboardError, ClipboardSink, SystemClipboard};
pub use config::{default_config_path, ApiSection, Config, ConfigError, UiSection};
pub use messages::{ChatRequest, ChatResponse, Source, SourceMetadata};
pub use prefs::PrefStore;
pub use session::{ChatSession, Message, MessageId, PendingQuery, Role};
pub use theme::{Palette, Theme};
