//! Clipboard access for the "copy answer" action.

/// Clipboard write failure. Never fatal; surfaced as a session error string.
#[derive(Debug, thiserror::Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Anything that can receive copied text.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard. Opened per write; headless sessions fail here.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| {
            tracing::error!("Failed to initialize clipboard: {}", e);
            ClipboardError(e.to_string())
        })?;
        clipboard.set_text(text).map_err(|e| {
            tracing::error!("Failed to set clipboard text: {}", e);
            ClipboardError(e.to_string())
        })
    }
}
