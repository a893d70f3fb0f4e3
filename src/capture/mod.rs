//! Selection capture chain: obtain the text selected in the foreground
//! application.
//!
//! Strategies run in a fixed order and the first usable (non-blank)
//! result wins. Strategy errors are logged and treated as "nothing
//! captured"; the chain itself never fails. An empty result is an
//! ordinary outcome.
//!
//! The chain is synchronous. The daemon runs it on a blocking worker
//! thread inside a [`ClipboardGuard`] scope.

pub mod guard;
pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use crate::resolver::{ClipboardProvider, KeyInjector, ResolverError, SelectionSource};

pub use guard::ClipboardGuard;
pub use strategies::{DirectQuery, PassiveRead, SimulatedCopy};

/// Default clipboard poll interval after a simulated copy.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Default number of clipboard polls after a simulated copy.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 20;
/// Clipboard text at or above this many characters is not taken passively.
pub const DEFAULT_MAX_PASSIVE_CHARS: usize = 1000;

/// Timing and bounds for the capture chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub poll_interval: Duration,
    pub poll_attempts: u32,
    pub max_passive_chars: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            max_passive_chars: DEFAULT_MAX_PASSIVE_CHARS,
        }
    }
}

impl CaptureConfig {
    /// Upper bound on the time the simulated-copy strategy waits.
    pub fn max_wait(&self) -> Duration {
        self.poll_interval
            .checked_mul(self.poll_attempts)
            .unwrap_or(Duration::MAX)
    }
}

/// Result of one capture. Lives only for the duration of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Text(String),
    Empty,
}

impl CaptureResult {
    pub fn text(&self) -> Option<&str> {
        match self {
            CaptureResult::Text(text) => Some(text),
            CaptureResult::Empty => None,
        }
    }
}

/// One way of obtaining the selected text.
pub trait CaptureStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the strategy drives the foreground application with
    /// synthetic input.
    fn injects_input(&self) -> bool {
        false
    }

    /// `Ok(None)` when the strategy found nothing. Errors are absorbed
    /// by the chain.
    fn attempt(&self) -> Result<Option<String>, ResolverError>;
}

/// Ordered list of capture strategies.
pub struct CaptureChain {
    strategies: Vec<Box<dyn CaptureStrategy>>,
}

impl CaptureChain {
    pub fn new(strategies: Vec<Box<dyn CaptureStrategy>>) -> Self {
        Self { strategies }
    }

    /// Passive read, then simulated copy, then the direct selection query.
    pub fn standard(
        clipboard: Arc<dyn ClipboardProvider>,
        injector: Arc<dyn KeyInjector>,
        selection: Arc<dyn SelectionSource>,
        config: &CaptureConfig,
    ) -> Self {
        Self::new(vec![
            Box::new(PassiveRead::new(
                Arc::clone(&clipboard),
                config.max_passive_chars,
            )),
            Box::new(SimulatedCopy::new(clipboard, injector, config)),
            Box::new(DirectQuery::new(selection)),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order and return the first usable text.
    pub fn capture(&self) -> CaptureResult {
        self.run(true)
    }

    /// Like [`capture`](Self::capture), skipping strategies that inject
    /// input. Used when the foreground window is not the user's target,
    /// e.g. the terminal that sent a trigger request.
    pub fn capture_without_input(&self) -> CaptureResult {
        self.run(false)
    }

    fn run(&self, allow_input: bool) -> CaptureResult {
        for strategy in &self.strategies {
            if !allow_input && strategy.injects_input() {
                tracing::debug!(strategy = strategy.name(), "skipped, input injection not allowed");
                continue;
            }
            match strategy.attempt() {
                Ok(Some(text)) if is_usable(&text) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        chars = text.chars().count(),
                        "text captured"
                    );
                    return CaptureResult::Text(text);
                }
                Ok(_) => tracing::debug!(strategy = strategy.name(), "no text"),
                Err(e) => tracing::debug!(strategy = strategy.name(), error = %e, "strategy failed"),
            }
        }
        CaptureResult::Empty
    }
}

/// Non-empty after trimming whitespace.
pub(crate) fn is_usable(text: &str) -> bool {
    !text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClipboard, MockInjector, MockSelection};

    fn fast() -> CaptureConfig {
        CaptureConfig {
            poll_interval: Duration::ZERO,
            ..CaptureConfig::default()
        }
    }

    struct Failing;

    impl CaptureStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn attempt(&self) -> Result<Option<String>, ResolverError> {
            Err(ResolverError::Input("boom".into()))
        }
    }

    struct Fixed(&'static str);

    impl CaptureStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn attempt(&self) -> Result<Option<String>, ResolverError> {
            Ok(Some(self.0.to_string()))
        }
    }

    #[test]
    fn default_config_matches_documented_constants() {
        let config = CaptureConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.poll_attempts, 20);
        assert_eq!(config.max_passive_chars, 1000);
        assert_eq!(config.max_wait(), Duration::from_secs(2));
    }

    #[test]
    fn max_wait_saturates_instead_of_overflowing() {
        let config = CaptureConfig {
            poll_interval: Duration::from_secs(u64::MAX),
            poll_attempts: u32::MAX,
            ..CaptureConfig::default()
        };
        assert_eq!(config.max_wait(), Duration::MAX);
    }

    #[test]
    fn capture_without_input_never_injects() {
        let clipboard = MockClipboard::empty();
        let injector = MockInjector::new(clipboard.clone(), Some((0, "copied")));
        let selection = MockSelection::new(Some("from primary"));
        let chain = CaptureChain::standard(clipboard, injector.clone(), selection, &fast());

        assert_eq!(chain.capture_without_input().text(), Some("from primary"));
        assert!(injector.calls().is_empty());
    }

    #[test]
    fn standard_chain_order() {
        let clipboard = MockClipboard::empty();
        let chain = CaptureChain::standard(
            clipboard.clone(),
            MockInjector::new(clipboard, None),
            MockSelection::new(None),
            &fast(),
        );
        assert_eq!(
            chain.strategy_names(),
            vec!["passive_read", "simulated_copy", "direct_query"]
        );
    }

    #[test]
    fn passive_text_skips_injection() {
        let clipboard = MockClipboard::with_text("already copied");
        let injector = MockInjector::new(clipboard.clone(), Some((0, "other")));
        let selection = MockSelection::new(Some("primary"));
        let chain = CaptureChain::standard(
            clipboard.clone(),
            injector.clone(),
            selection.clone(),
            &fast(),
        );

        assert_eq!(
            chain.capture(),
            CaptureResult::Text("already copied".into())
        );
        assert_eq!(injector.copy_count(), 0);
        assert_eq!(selection.call_count(), 0);
    }

    #[test]
    fn falls_through_to_simulated_copy() {
        let clipboard = MockClipboard::empty();
        let injector = MockInjector::new(clipboard.clone(), Some((1, "copied")));
        let chain = CaptureChain::standard(
            clipboard.clone(),
            injector.clone(),
            MockSelection::new(None),
            &fast(),
        );

        assert_eq!(chain.capture().text(), Some("copied"));
        assert_eq!(injector.copy_count(), 1);
    }

    #[test]
    fn falls_through_to_direct_query_when_injection_fails() {
        let clipboard = MockClipboard::empty();
        let chain = CaptureChain::standard(
            clipboard.clone(),
            MockInjector::failing(clipboard),
            MockSelection::new(Some("from primary")),
            &fast(),
        );

        assert_eq!(chain.capture().text(), Some("from primary"));
    }

    #[test]
    fn all_strategies_empty_is_empty() {
        let clipboard = MockClipboard::empty();
        let chain = CaptureChain::standard(
            clipboard.clone(),
            MockInjector::new(clipboard.clone(), None),
            MockSelection::new(Some("   ")),
            &fast(),
        );

        assert_eq!(chain.capture(), CaptureResult::Empty);
        assert_eq!(clipboard.read_count(), 1 + 20);
    }

    #[test]
    fn errors_are_absorbed() {
        let clipboard = MockClipboard::empty();
        clipboard.fail_reads();
        let chain = CaptureChain::standard(
            clipboard.clone(),
            MockInjector::new(clipboard, None),
            MockSelection::failing(),
            &fast(),
        );

        assert_eq!(chain.capture(), CaptureResult::Empty);
    }

    #[test]
    fn first_usable_strategy_wins() {
        let chain = CaptureChain::new(vec![
            Box::new(Failing),
            Box::new(Fixed("  ")),
            Box::new(Fixed("winner")),
            Box::new(Fixed("never")),
        ]);
        assert_eq!(chain.capture(), CaptureResult::Text("winner".into()));
    }
}
