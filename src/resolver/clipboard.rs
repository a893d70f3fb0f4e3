//! ClipboardProvider trait: system clipboard text read/write.

use super::ResolverError;

/// Reads and writes the system clipboard as text.
///
/// `Send + Sync` is required because dispatches run on blocking worker
/// threads while the provider is shared through an `Arc`.
pub trait ClipboardProvider: Send + Sync {
    /// Read the current clipboard text. An empty clipboard reads as `""`.
    fn read_text(&self) -> Result<String, ResolverError>;

    /// Replace the clipboard content with `text`.
    fn write_text(&self, text: &str) -> Result<(), ResolverError>;

    /// Empty the clipboard.
    fn clear(&self) -> Result<(), ResolverError> {
        self.write_text("")
    }
}
