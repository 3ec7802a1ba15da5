//! Window and callback bookkeeping.
//!
//! The registry maps every open window to its callback table. The outer map
//! is behind an `RwLock`; each window's table has its own `Mutex`, so a
//! `bind()` on one window never waits for a dispatch on another. Callbacks
//! are reference counted and always invoked after every lock is released.

use crate::codec::Reply;
use crate::engine::{BindId, Engine, WindowId};
use crate::error::{Result, WebUiError};
use crate::event::Event;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A bound callback after its return type has been erased.
pub type Callback = Arc<dyn Fn(&Event) -> Result<Reply> + Send + Sync>;

struct WindowTable {
    generation: u64,
    callbacks: Mutex<HashMap<BindId, Callback>>,
}

/// Per-process table of windows and their bindings.
pub struct Registry {
    windows: RwLock<HashMap<WindowId, Arc<WindowTable>>>,
    next_generation: AtomicU64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Ask the engine for a new window and open an empty table for it.
    pub fn allocate_window(&self, engine: &dyn Engine) -> (WindowId, u64) {
        let window = engine.new_window();
        (window, self.open(window))
    }

    /// Open an empty table for `window` and return its generation.
    ///
    /// An id the engine recycled gets a fresh table and a fresh generation;
    /// handles to the previous window stay invalid.
    pub fn open(&self, window: WindowId) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let table = Arc::new(WindowTable {
            generation,
            callbacks: Mutex::new(HashMap::new()),
        });
        if self.windows.write().insert(window, table).is_some() {
            tracing::debug!(window = %window, "Replacing callback table of recycled window id");
        }
        tracing::debug!(window = %window, generation, "Opened window");
        generation
    }

    /// Register `element` with the engine and store `callback` under the
    /// bind id it returns.
    ///
    /// The window's table stays locked across the engine call, so no event
    /// can resolve the new bind id before its callback is stored. When the
    /// engine hands back an id that is already taken, the new callback
    /// replaces the old one.
    pub fn register(
        &self,
        engine: &dyn Engine,
        window: WindowId,
        element: &CStr,
        callback: Callback,
    ) -> Result<BindId> {
        let table = self
            .table(window)
            .ok_or_else(|| WebUiError::window_destroyed(window))?;

        let mut callbacks = table.callbacks.lock();
        let bind_id = engine.bind(window, element);
        if callbacks.insert(bind_id, callback).is_some() {
            tracing::debug!(
                window = %window,
                bind_id = %bind_id,
                element = %element.to_string_lossy(),
                "Engine reused bind id, replacing callback"
            );
        }
        Ok(bind_id)
    }

    /// Callback stored under `bind_id` for `window`.
    ///
    /// Failure means the engine and the binding disagree about what was
    /// registered.
    pub fn resolve(&self, window: WindowId, bind_id: BindId) -> Result<Callback> {
        self.lookup(window, bind_id).map(|(callback, _)| callback)
    }

    pub(crate) fn lookup(&self, window: WindowId, bind_id: BindId) -> Result<(Callback, u64)> {
        let table = self
            .table(window)
            .ok_or_else(|| WebUiError::unknown_binding(window, bind_id))?;
        let callback = table
            .callbacks
            .lock()
            .get(&bind_id)
            .cloned()
            .ok_or_else(|| WebUiError::unknown_binding(window, bind_id))?;
        Ok((callback, table.generation))
    }

    /// Drop the table of `window`. Returns false if it was not open.
    pub fn close_window(&self, window: WindowId) -> bool {
        let removed = self.windows.write().remove(&window).is_some();
        if removed {
            tracing::debug!(window = %window, "Dropped callback table");
        }
        removed
    }

    /// True while `window` is open under `generation`.
    pub fn is_live(&self, window: WindowId, generation: u64) -> bool {
        self.generation(window) == Some(generation)
    }

    pub fn generation(&self, window: WindowId) -> Option<u64> {
        self.windows.read().get(&window).map(|table| table.generation)
    }

    pub fn binding_count(&self, window: WindowId) -> usize {
        self.table(window)
            .map(|table| table.callbacks.lock().len())
            .unwrap_or(0)
    }

    pub fn window_count(&self) -> usize {
        self.windows.read().len()
    }

    pub fn windows(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.windows.read().keys().copied().collect();
        ids.sort();
        ids
    }

    fn table(&self, window: WindowId) -> Option<Arc<WindowTable>> {
        self.windows.read().get(&window).cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebUiErrorCode;
    use crate::testing::FakeEngine;
    use std::ffi::CString;

    fn noop() -> Callback {
        Arc::new(|_: &Event| Ok(Reply::Void))
    }

    fn element(name: &str) -> CString {
        CString::new(name).unwrap()
    }

    #[test]
    fn test_resolve_only_registered_ids() {
        let engine = FakeEngine::new();
        let registry = Registry::new();
        let (window, _) = registry.allocate_window(&*engine);

        let a = registry
            .register(&*engine, window, &element("a"), noop())
            .unwrap();
        let b = registry
            .register(&*engine, window, &element("b"), noop())
            .unwrap();
        assert_ne!(a, b);
        assert!(registry.resolve(window, a).is_ok());
        assert!(registry.resolve(window, b).is_ok());
        assert_eq!(registry.binding_count(window), 2);

        let err = registry.resolve(window, BindId(b.0 + 100)).err().unwrap();
        assert_eq!(err.code(), WebUiErrorCode::UnknownBinding as u32);
        assert!(err.is_internal());
    }

    #[test]
    fn test_bind_ids_do_not_cross_windows() {
        let engine = FakeEngine::new();
        let registry = Registry::new();
        let (first, _) = registry.allocate_window(&*engine);
        let (second, _) = registry.allocate_window(&*engine);

        let id = registry
            .register(&*engine, first, &element("a"), noop())
            .unwrap();
        assert!(registry.resolve(first, id).is_ok());
        assert!(registry.resolve(second, id).is_err());
    }

    #[test]
    fn test_same_element_coexists_when_engine_issues_new_ids() {
        let engine = FakeEngine::new();
        let registry = Registry::new();
        let (window, _) = registry.allocate_window(&*engine);

        let first = registry
            .register(&*engine, window, &element("save"), noop())
            .unwrap();
        let second = registry
            .register(&*engine, window, &element("save"), noop())
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.binding_count(window), 2);
    }

    #[test]
    fn test_same_element_replaces_when_engine_reuses_id() {
        let engine = FakeEngine::new();
        engine.reuse_bind_ids(true);
        let registry = Registry::new();
        let (window, _) = registry.allocate_window(&*engine);

        let first = registry
            .register(&*engine, window, &element("save"), noop())
            .unwrap();
        let second = registry
            .register(&*engine, window, &element("save"), noop())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.binding_count(window), 1);
    }

    #[test]
    fn test_close_window_invalidates_generation() {
        let engine = FakeEngine::new();
        let registry = Registry::new();
        let (window, generation) = registry.allocate_window(&*engine);
        let id = registry
            .register(&*engine, window, &element(""), noop())
            .unwrap();

        assert!(registry.is_live(window, generation));
        assert!(registry.close_window(window));
        assert!(!registry.close_window(window));
        assert!(!registry.is_live(window, generation));
        assert!(registry.resolve(window, id).is_err());

        let err = registry
            .register(&*engine, window, &element("late"), noop())
            .unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::WindowDestroyed as u32);

        // Reopening the same number yields a new generation.
        let reopened = registry.open(window);
        assert_ne!(reopened, generation);
        assert!(!registry.is_live(window, generation));
        assert_eq!(registry.windows(), vec![window]);
    }

    #[test]
    fn test_concurrent_register_and_resolve() {
        let engine = FakeEngine::new();
        let registry = Arc::new(Registry::new());
        let (window, _) = registry.allocate_window(&*engine);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let engine = engine.clone();
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let name = element(&format!("button-{n}"));
                    (0..50)
                        .map(|_| {
                            let id = registry
                                .register(&*engine, window, &name, noop())
                                .unwrap();
                            assert!(registry.resolve(window, id).is_ok());
                            id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        assert_eq!(all.len(), 400);
        assert_eq!(registry.binding_count(window), 400);
        for id in all {
            assert!(registry.resolve(window, id).is_ok());
        }
    }
}
