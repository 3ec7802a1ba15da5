//! Process-level entry point.

use crate::config::{Config, RuntimeConfig};
use crate::dispatch::Dispatcher;
use crate::engine::{Engine, WindowId};
use crate::error::{Result, WebUiError};
use crate::registry::Registry;
use crate::window::{c_string, Window};
use std::fmt;
use std::sync::Arc;

/// Engine and registry shared by every handle of one [`WebUi`].
pub(crate) struct Bridge {
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) registry: Arc<Registry>,
}

/// The binding: creates windows and runs the engine's event loop.
#[derive(Clone)]
pub struct WebUi {
    bridge: Arc<Bridge>,
}

impl WebUi {
    pub fn new<E: Engine>(engine: E) -> Self {
        Self::with_engine(Arc::new(engine))
    }

    pub fn with_engine(engine: Arc<dyn Engine>) -> Self {
        Self {
            bridge: Arc::new(Bridge {
                engine,
                registry: Arc::new(Registry::new()),
            }),
        }
    }

    /// The binding over the linked engine library.
    ///
    /// The engine has one event callback for the whole process, so every
    /// call returns a handle to the same instance.
    #[cfg(feature = "native")]
    pub fn native() -> Self {
        use std::sync::OnceLock;

        static NATIVE: OnceLock<WebUi> = OnceLock::new();
        NATIVE
            .get_or_init(|| {
                let ui = Self::new(crate::native::NativeEngine::new());
                crate::native::install(ui.dispatcher());
                tracing::debug!("Native engine ready");
                ui
            })
            .clone()
    }

    /// Event entry point for engines that deliver events themselves.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.bridge.clone())
    }

    pub fn registry(&self) -> &Registry {
        &self.bridge.registry
    }

    // ------------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------------

    pub fn new_window(&self) -> Window {
        let (id, generation) = self.bridge.registry.allocate_window(&*self.bridge.engine);
        Window::new(id, generation, self.bridge.clone())
    }

    /// Create a window under a number obtained from
    /// [`WebUi::new_window_id`]. Reusing the number of a destroyed window
    /// is allowed; handles to the old window stay invalid.
    pub fn new_window_with_id(&self, id: WindowId) -> Window {
        self.bridge.engine.new_window_with_id(id);
        let generation = self.bridge.registry.open(id);
        Window::new(id, generation, self.bridge.clone())
    }

    /// A free window number, not yet in use.
    pub fn new_window_id(&self) -> WindowId {
        self.bridge.engine.new_window_id()
    }

    /// Handle to an open window.
    pub fn window(&self, id: WindowId) -> Option<Window> {
        let generation = self.bridge.registry.generation(id)?;
        Some(Window::new(id, generation, self.bridge.clone()))
    }

    /// Handles to every open window, ordered by id.
    pub fn windows(&self) -> Vec<Window> {
        self.bridge
            .registry
            .windows()
            .into_iter()
            .filter_map(|id| self.window(id))
            .collect()
    }

    /// Create a window and apply the window section of `config` to it.
    pub fn window_from_config(&self, config: &Config) -> Result<Window> {
        self.apply(&config.runtime)?;
        let window = self.new_window();
        window.apply(&config.window)?;
        Ok(window)
    }

    // ------------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------------

    /// Block until every window is closed or [`WebUi::exit`] is called.
    pub fn wait(&self) {
        tracing::debug!("Waiting for windows to close");
        self.bridge.engine.wait();
    }

    /// [`WebUi::wait`] on tokio's blocking pool.
    pub async fn wait_async(&self) {
        let ui = self.clone();
        if let Err(err) = tokio::task::spawn_blocking(move || ui.wait()).await {
            std::panic::resume_unwind(err.into_panic());
        }
    }

    /// Close every window and make [`WebUi::wait`] return.
    pub fn exit(&self) {
        tracing::debug!("Exiting");
        self.bridge.engine.exit();
    }

    // ------------------------------------------------------------------------
    // Global settings
    // ------------------------------------------------------------------------

    /// Seconds to wait for a browser to connect; zero waits forever.
    pub fn set_timeout(&self, seconds: usize) {
        self.bridge.engine.set_timeout(seconds);
    }

    /// Web-server root folder for every window that does not set its own.
    pub fn set_default_root_folder(&self, path: &str) -> Result<()> {
        if !self
            .bridge
            .engine
            .set_default_root_folder(&c_string("root folder", path)?)
        {
            return Err(WebUiError::root_folder_rejected(path));
        }
        Ok(())
    }

    pub fn apply(&self, config: &RuntimeConfig) -> Result<()> {
        if let Some(seconds) = config.timeout {
            self.set_timeout(seconds);
        }
        if let Some(path) = &config.default_root_folder {
            self.set_default_root_folder(path)?;
        }
        Ok(())
    }

    /// Base64-encode `text` with the engine's encoder.
    pub fn encode(&self, text: &str) -> Result<String> {
        self.bridge
            .engine
            .encode(&c_string("text", text)?)
            .ok_or_else(|| WebUiError::transcode("encode"))
    }

    /// Decode base64 `text` with the engine's decoder.
    pub fn decode(&self, text: &str) -> Result<String> {
        self.bridge
            .engine
            .decode(&c_string("text", text)?)
            .ok_or_else(|| WebUiError::transcode("decode"))
    }
}

impl fmt::Debug for WebUi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebUi")
            .field("windows", &self.bridge.registry.windows())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
