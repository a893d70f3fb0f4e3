//! UrlOpener trait and the default-browser implementation.

use super::ResolverError;

/// Hands a URL to the OS "open with default handler" facility.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), ResolverError>;
}

/// Opens URLs with the desktop's default handler (`xdg-open` on Linux).
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), ResolverError> {
        open::that_detached(url).map_err(|e| ResolverError::Open(format!("{url}: {e}")))
    }
}
