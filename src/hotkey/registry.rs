//! Hotkey registry: the live (hotkey → engine) binding table.
//!
//! The registry owns a [`HotkeyBackend`] and replaces its registrations
//! wholesale on every [`reconcile`](HotkeyRegistry::reconcile): every
//! active grab is released before the new generation is grabbed, so no
//! two generations are ever active together. Failures are recorded per
//! engine as [`BindingConflict`]s and never abort the pass.

use crate::engine::SearchEngine;
use crate::engine::hotkey::Hotkey;
use crate::resolver::HotkeyBackend;

use super::keybinding::{Binding, event_matches_binding};

/// A hotkey that is currently grabbed for an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBinding {
    pub engine_id: String,
    pub engine_name: String,
    pub hotkey: Hotkey,
    pub binding: Binding,
}

/// An engine whose hotkey could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConflict {
    pub engine_id: String,
    pub engine_name: String,
    /// Hotkey as specified by the engine (normalized when parseable).
    pub hotkey: String,
    pub reason: String,
}

/// Owns the OS-level hotkey registrations for the engine collection.
pub struct HotkeyRegistry<B: HotkeyBackend> {
    backend: B,
    active: Vec<ActiveBinding>,
    conflicts: Vec<BindingConflict>,
}

impl<B: HotkeyBackend> HotkeyRegistry<B> {
    /// Create an empty registry. Nothing is grabbed until the first
    /// [`reconcile`](Self::reconcile).
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Recompute all registrations from `engines`.
    ///
    /// Releases every active grab, then grabs one hotkey per bound engine
    /// in list order. Returns the conflicts of the new generation.
    pub fn reconcile(&mut self, engines: &[SearchEngine]) -> &[BindingConflict] {
        self.unregister_all();
        self.conflicts.clear();

        for engine in engines {
            let hotkey = match engine.parsed_hotkey() {
                Ok(Some(hotkey)) => hotkey,
                Ok(None) => continue,
                Err(e) => {
                    self.record_conflict(engine, engine.hotkey.clone(), e.to_string());
                    continue;
                }
            };

            if let Some(owner) = self.active.iter().find(|a| a.hotkey == hotkey) {
                let reason = format!("already bound to {:?}", owner.engine_name);
                self.record_conflict(engine, hotkey.to_string(), reason);
                continue;
            }

            match self.backend.grab(&hotkey) {
                Ok(binding) => {
                    tracing::info!(
                        engine = %engine.name,
                        hotkey = %hotkey,
                        keycode = binding.keycode,
                        "hotkey registered"
                    );
                    self.active.push(ActiveBinding {
                        engine_id: engine.id.clone(),
                        engine_name: engine.name.clone(),
                        hotkey,
                        binding,
                    });
                }
                Err(e) => self.record_conflict(engine, hotkey.to_string(), e.to_string()),
            }
        }

        tracing::debug!(
            active = self.active.len(),
            conflicts = self.conflicts.len(),
            "reconciled hotkeys"
        );
        &self.conflicts
    }

    /// Release every active grab. Idempotent.
    pub fn unregister_all(&mut self) {
        for active in self.active.drain(..) {
            self.backend.ungrab(&active.binding);
        }
    }

    /// Engine id bound to the key event, if any.
    pub fn resolve(&self, keycode: u8, state: u16) -> Option<&str> {
        let numlock_mask = self.backend.lock_mask();
        self.active
            .iter()
            .find(|a| event_matches_binding(keycode, state, &a.binding, numlock_mask))
            .map(|a| a.engine_id.as_str())
    }

    pub fn bindings(&self) -> &[ActiveBinding] {
        &self.active
    }

    pub fn conflicts(&self) -> &[BindingConflict] {
        &self.conflicts
    }

    fn record_conflict(&mut self, engine: &SearchEngine, hotkey: String, reason: String) {
        tracing::warn!(
            engine = %engine.name,
            hotkey = %hotkey,
            reason = %reason,
            "hotkey could not be registered"
        );
        self.conflicts.push(BindingConflict {
            engine_id: engine.id.clone(),
            engine_name: engine.name.clone(),
            hotkey,
            reason,
        });
    }
}

impl<B: HotkeyBackend> Drop for HotkeyRegistry<B> {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn engine(id: &str, name: &str, hotkey: &str) -> SearchEngine {
        SearchEngine {
            id: id.into(),
            name: name.into(),
            url: "https://example.com/?q={query}".into(),
            hotkey: hotkey.into(),
        }
    }

    fn ids<B: HotkeyBackend>(registry: &HotkeyRegistry<B>) -> Vec<String> {
        registry
            .bindings()
            .iter()
            .map(|a| a.engine_id.clone())
            .collect()
    }

    #[test]
    fn reconcile_grabs_bound_engines_only() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        let engines = vec![
            engine("g", "Google", "Ctrl+Alt+S"),
            engine("w", "Wikipedia", ""),
            engine("y", "YouTube", "Ctrl+Alt+Y"),
        ];

        let conflicts = registry.reconcile(&engines);
        assert!(conflicts.is_empty());
        assert_eq!(ids(&registry), vec!["g", "y"]);
        assert_eq!(backend.grab_count(), 2);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        let engines = vec![
            engine("g", "Google", "Ctrl+Alt+S"),
            engine("y", "YouTube", "Ctrl+Alt+Y"),
        ];

        registry.reconcile(&engines);
        let first = registry.bindings().to_vec();
        registry.reconcile(&engines);

        assert_eq!(registry.bindings(), first.as_slice());
        assert_eq!(backend.active_grabs(), 2);
    }

    #[test]
    fn reconcile_unregisters_previous_generation_first() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        let mut engines = vec![
            engine("g", "Google", "Ctrl+Alt+S"),
            engine("y", "YouTube", "Ctrl+Alt+Y"),
        ];
        registry.reconcile(&engines);
        let registered = backend.grab_count();

        engines.remove(0);
        registry.reconcile(&engines);

        assert_eq!(backend.ungrab_count(), registered);
        assert_eq!(backend.active_grabs(), 1);
        assert_eq!(ids(&registry), vec!["y"]);
    }

    #[test]
    fn deleted_engine_no_longer_resolves() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        let mut engines = vec![engine("g", "Google", "Ctrl+Alt+S")];
        registry.reconcile(&engines);

        let binding = registry.bindings()[0].binding.clone();
        assert_eq!(registry.resolve(binding.keycode, binding.modifiers), Some("g"));

        engines.clear();
        registry.reconcile(&engines);
        assert_eq!(registry.resolve(binding.keycode, binding.modifiers), None);
    }

    #[test]
    fn duplicate_hotkey_records_conflict_and_first_wins() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        let engines = vec![
            engine("g", "Google", "Ctrl+Alt+S"),
            engine("b", "Bing", "alt+ctrl+s"),
        ];

        let conflicts = registry.reconcile(&engines).to_vec();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].engine_id, "b");
        assert_eq!(conflicts[0].hotkey, "Ctrl+Alt+S");
        assert!(conflicts[0].reason.contains("Google"));

        let binding = registry.bindings()[0].binding.clone();
        assert_eq!(registry.resolve(binding.keycode, binding.modifiers), Some("g"));
        assert_eq!(backend.grab_count(), 1);
    }

    #[test]
    fn backend_failure_does_not_abort_pass() {
        let backend = MockBackend::new();
        backend.fail_on("Ctrl+Alt+S");
        let mut registry = HotkeyRegistry::new(backend.clone());
        let engines = vec![
            engine("g", "Google", "Ctrl+Alt+S"),
            engine("y", "YouTube", "Ctrl+Alt+Y"),
        ];

        let conflicts = registry.reconcile(&engines).to_vec();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].engine_id, "g");
        assert_eq!(ids(&registry), vec!["y"]);
    }

    #[test]
    fn malformed_hotkey_is_a_conflict() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        let engines = vec![
            engine("x", "Broken", "Ctrl+Hyper"),
            engine("y", "YouTube", "Ctrl+Alt+Y"),
        ];

        let conflicts = registry.reconcile(&engines).to_vec();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].hotkey, "Ctrl+Hyper");
        assert_eq!(ids(&registry), vec!["y"]);
    }

    #[test]
    fn conflicts_reset_each_generation() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        registry.reconcile(&[
            engine("g", "Google", "Ctrl+Alt+S"),
            engine("b", "Bing", "Ctrl+Alt+S"),
        ]);
        assert_eq!(registry.conflicts().len(), 1);

        registry.reconcile(&[engine("g", "Google", "Ctrl+Alt+S")]);
        assert!(registry.conflicts().is_empty());
    }

    #[test]
    fn resolve_ignores_lock_modifiers() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        registry.reconcile(&[engine("g", "Google", "Ctrl+Alt+S")]);

        let binding = registry.bindings()[0].binding.clone();
        let with_locks = binding.modifiers | 0x0002 | backend.lock_mask();
        assert_eq!(registry.resolve(binding.keycode, with_locks), Some("g"));
    }

    #[test]
    fn drop_releases_all_grabs() {
        let backend = MockBackend::new();
        {
            let mut registry = HotkeyRegistry::new(backend.clone());
            registry.reconcile(&[
                engine("g", "Google", "Ctrl+Alt+S"),
                engine("y", "YouTube", "Ctrl+Alt+Y"),
            ]);
            assert_eq!(backend.active_grabs(), 2);
        }
        assert_eq!(backend.active_grabs(), 0);
    }

    #[test]
    fn unregister_all_is_idempotent() {
        let backend = MockBackend::new();
        let mut registry = HotkeyRegistry::new(backend.clone());
        registry.reconcile(&[engine("g", "Google", "Ctrl+Alt+S")]);
        registry.unregister_all();
        registry.unregister_all();
        assert_eq!(backend.ungrab_count(), 1);
        assert!(registry.bindings().is_empty());
    }
}
