use tracing::debug;

/// Text currently on the system clipboard, if one is reachable.
pub fn clipboard_text() -> Option<String> {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(error = %e, "clipboard unavailable");
            None
        }
    }
}
